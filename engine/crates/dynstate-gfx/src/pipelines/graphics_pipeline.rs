use std::{convert::identity, ffi::CStr, path::Path, rc::Rc};

use ash::vk;
use itertools::Itertools;

use crate::error::{GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};
use crate::pipelines::shader::{GfxShaderModuleCache, GfxShaderStageInfo};

pub struct GfxPipelineLayout {
    handle: vk::PipelineLayout,
    device: Rc<GfxDevice>,
}
impl GfxPipelineLayout {
    pub fn new(
        device: Rc<GfxDevice>,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
        debug_name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let pipeline_layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(descriptor_set_layouts)
            .push_constant_ranges(push_constant_ranges);
        let handle = unsafe {
            device.create_pipeline_layout(&pipeline_layout_create_info, None).vk_call("vkCreatePipelineLayout")?
        };
        let layout = GfxPipelineLayout { handle, device };
        layout.device.set_debug_name(&layout, debug_name);
        Ok(layout)
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}
impl Drop for GfxPipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.handle, None);
        }
    }
}
impl DebugType for GfxPipelineLayout {
    fn debug_type_name() -> &'static str {
        "GfxPipelineLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

pub struct GfxGraphicsPipeline {
    pipeline: vk::Pipeline,

    /// 因为多个 pipeline 可以使用同一个 pipeline layout，所以这里使用 Rc
    pipeline_layout: Rc<GfxPipelineLayout>,

    device: Rc<GfxDevice>,
}
impl GfxGraphicsPipeline {
    pub fn new(
        device: Rc<GfxDevice>,
        create_info: &GfxGraphicsPipelineCreateInfo,
        pipeline_layout: Rc<GfxPipelineLayout>,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxGraphicsPipeline::new");

        // dynamic rendering 需要的 framebuffer 信息
        let mut attach_info = vk::PipelineRenderingCreateInfo::default()
            .color_attachment_formats(&create_info.color_attach_formats)
            .depth_attachment_format(create_info.depth_attach_format)
            .stencil_attachment_format(create_info.stencil_attach_format);

        let mut shader_modules_cache = GfxShaderModuleCache::new(device.clone());
        let mut shader_stages_info = Vec::with_capacity(create_info.shader_stages.len());
        for stage in &create_info.shader_stages {
            let module = shader_modules_cache.get_or_load(stage.path())?.handle();
            shader_stages_info.push(
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(stage.stage)
                    .module(module)
                    .name(stage.entry_point),
            );
        }

        // 顶点在 vertex shader 中生成，不需要 vertex buffer
        let vertex_input_state_info = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly_info = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(create_info.primitive_topology)
            .primitive_restart_enable(false);

        // viewport 和 scissor 具体值由 dynamic 决定，但是数量由该 create info 决定
        let viewport_info = vk::PipelineViewportStateCreateInfo {
            viewport_count: 1,
            scissor_count: 1,
            ..Default::default()
        };

        // MSAA 配置
        let msaa_info = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(create_info.enable_sample_shading)
            .rasterization_samples(create_info.msaa_sample);

        // 混合设置：需要为每个 color attachment 分别指定
        let color_blend_info = create_info.blend_info.attachments(&create_info.color_attach_blend_states);

        let dynamic_state_info =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&create_info.dynamic_states);

        // =======================================
        // === 创建 pipeline

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .flags(create_info.pipeline_flags)
            .stages(&shader_stages_info)
            .vertex_input_state(&vertex_input_state_info)
            .input_assembly_state(&input_assembly_info)
            .viewport_state(&viewport_info)
            .rasterization_state(&create_info.rasterize_state_info)
            .multisample_state(&msaa_info)
            .color_blend_state(&color_blend_info)
            .depth_stencil_state(&create_info.depth_stencil_info)
            .layout(pipeline_layout.handle)
            .dynamic_state(&dynamic_state_info)
            .push_next(&mut attach_info);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .map_err(|(_, result)| result)
                .vk_call("vkCreateGraphicsPipelines")?
        };
        let pipeline = GfxGraphicsPipeline {
            pipeline: pipelines[0],
            pipeline_layout,
            device,
        };

        pipeline.device.set_debug_name(&pipeline, debug_name);

        // shader module 在 pipeline 创建后即可销毁
        drop(shader_modules_cache);

        Ok(pipeline)
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout.handle
    }
}
impl Drop for GfxGraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
    }
}
impl DebugType for GfxGraphicsPipeline {
    fn debug_type_name() -> &'static str {
        "GfxGraphicsPipeline"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.pipeline
    }
}

pub struct GfxGraphicsPipelineCreateInfo {
    /// dynamic render 需要的 framebuffer 信息
    color_attach_formats: Vec<vk::Format>,
    /// dynamic render 需要的 framebuffer 信息
    depth_attach_format: vk::Format,
    /// dynamic render 需要的 framebuffer 信息
    stencil_attach_format: vk::Format,

    shader_stages: Vec<GfxShaderStageInfo>,

    primitive_topology: vk::PrimitiveTopology,

    rasterize_state_info: vk::PipelineRasterizationStateCreateInfo<'static>,

    msaa_sample: vk::SampleCountFlags,
    enable_sample_shading: bool,

    color_attach_blend_states: Vec<vk::PipelineColorBlendAttachmentState>,
    blend_info: vk::PipelineColorBlendStateCreateInfo<'static>,

    depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,

    dynamic_states: Vec<vk::DynamicState>,

    pipeline_flags: vk::PipelineCreateFlags,
}
impl Default for GfxGraphicsPipelineCreateInfo {
    fn default() -> Self {
        Self {
            color_attach_formats: vec![],

            // format = undefined 表示不使用这个 attachment
            depth_attach_format: vk::Format::UNDEFINED,
            stencil_attach_format: vk::Format::UNDEFINED,

            shader_stages: vec![],

            primitive_topology: vk::PrimitiveTopology::TRIANGLE_LIST,

            rasterize_state_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::BACK)
                // 按照 OpenGL 的传统，将 CCW 视为 front face
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false),
            msaa_sample: vk::SampleCountFlags::TYPE_1,
            enable_sample_shading: false,

            color_attach_blend_states: vec![],
            blend_info: vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .blend_constants([0.0, 0.0, 0.0, 0.0]),

            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false),
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],

            pipeline_flags: vk::PipelineCreateFlags::empty(),
        }
    }
}
// builder
impl GfxGraphicsPipelineCreateInfo {
    /// builder
    #[inline]
    pub fn attach_info(
        &mut self,
        color_attach_formats: Vec<vk::Format>,
        depth_format: Option<vk::Format>,
        stencil_format: Option<vk::Format>,
    ) -> &mut Self {
        self.color_attach_formats = color_attach_formats;
        self.depth_attach_format = depth_format.unwrap_or(vk::Format::UNDEFINED);
        self.stencil_attach_format = stencil_format.unwrap_or(vk::Format::UNDEFINED);

        self
    }

    /// builder
    #[inline]
    pub fn vertex_shader_stage(&mut self, path: impl AsRef<Path>, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::VERTEX,
            entry_point,
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// builder
    #[inline]
    pub fn fragment_shader_stage(&mut self, path: impl AsRef<Path>, entry_point: &'static CStr) -> &mut Self {
        self.shader_stages.push(GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::FRAGMENT,
            entry_point,
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// 为每个 color attachment 指定 blend 操作
    #[inline]
    pub fn color_blend(
        &mut self,
        states: Vec<vk::PipelineColorBlendAttachmentState>,
        blend_constants: [f32; 4],
    ) -> &mut Self {
        self.color_attach_blend_states = states;
        self.blend_info.blend_constants = blend_constants;
        self.blend_info.logic_op_enable = vk::FALSE;
        self
    }

    /// 如果对应状态被声明为 dynamic，这里的值会被忽略
    #[inline]
    pub fn cull_mode(&mut self, mode: vk::CullModeFlags, front_face: vk::FrontFace) -> &mut Self {
        self.rasterize_state_info.cull_mode = mode;
        self.rasterize_state_info.front_face = front_face;
        self
    }

    #[inline]
    pub fn depth_test(
        &mut self,
        depth_test_op: Option<vk::CompareOp>,
        depth_write: bool,
        depth_bounds_test: bool,
    ) -> &mut Self {
        self.depth_stencil_info.depth_test_enable = depth_test_op.map_or(vk::FALSE, |_| vk::TRUE);
        self.depth_stencil_info.depth_compare_op = depth_test_op.map_or(vk::CompareOp::NEVER, identity);
        self.depth_stencil_info.depth_write_enable = if depth_write { vk::TRUE } else { vk::FALSE };
        self.depth_stencil_info.depth_bounds_test_enable = if depth_bounds_test { vk::TRUE } else { vk::FALSE };
        self
    }

    #[inline]
    pub fn dynamic_states(&mut self, states: Vec<vk::DynamicState>) -> &mut Self {
        self.dynamic_states = states;
        self
    }

    #[inline]
    pub fn pipeline_flags(&mut self, flags: vk::PipelineCreateFlags) -> &mut Self {
        self.pipeline_flags = flags;
        self
    }
}
// getters
impl GfxGraphicsPipelineCreateInfo {
    #[inline]
    pub fn get_dynamic_states(&self) -> &[vk::DynamicState] {
        &self.dynamic_states
    }

    #[inline]
    pub fn get_cull_mode(&self) -> vk::CullModeFlags {
        self.rasterize_state_info.cull_mode
    }

    #[inline]
    pub fn get_front_face(&self) -> vk::FrontFace {
        self.rasterize_state_info.front_face
    }

    #[inline]
    pub fn get_pipeline_flags(&self) -> vk::PipelineCreateFlags {
        self.pipeline_flags
    }

    #[inline]
    pub fn get_shader_stages(&self) -> &[GfxShaderStageInfo] {
        &self.shader_stages
    }

    #[inline]
    pub fn get_depth_compare_op(&self) -> Option<vk::CompareOp> {
        (self.depth_stencil_info.depth_test_enable == vk::TRUE).then_some(self.depth_stencil_info.depth_compare_op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bakes_back_face_culling() {
        let ci = GfxGraphicsPipelineCreateInfo::default();
        assert_eq!(ci.get_cull_mode(), vk::CullModeFlags::BACK);
        assert_eq!(ci.get_front_face(), vk::FrontFace::COUNTER_CLOCKWISE);
        assert!(ci.get_pipeline_flags().is_empty());
    }

    #[test]
    fn test_builder_setters() {
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        ci.vertex_shader_stage("a.vert.spv", c"main")
            .fragment_shader_stage("a.frag.spv", c"main")
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), true, false)
            .dynamic_states(vec![vk::DynamicState::LINE_WIDTH])
            .pipeline_flags(vk::PipelineCreateFlags::ALLOW_DERIVATIVES);

        assert_eq!(ci.get_shader_stages().len(), 2);
        assert_eq!(ci.get_shader_stages()[1].stage, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(ci.get_depth_compare_op(), Some(vk::CompareOp::LESS_OR_EQUAL));
        assert_eq!(ci.get_dynamic_states(), &[vk::DynamicState::LINE_WIDTH]);
        assert_eq!(ci.get_pipeline_flags(), vk::PipelineCreateFlags::ALLOW_DERIVATIVES);

        ci.depth_test(None, false, false);
        assert_eq!(ci.get_depth_compare_op(), None);
    }
}
