use std::path::Path;
use std::rc::Rc;

use ash::vk;
use dynstate_gfx::commands::barrier::GfxBarrierMask;
use dynstate_gfx::commands::recorder::GfxCommandRecorder;
use dynstate_gfx::dynamic_state::{
    DynamicAspectSet, DynamicStateDispatcher, DynamicStatePipeline, DynamicStatePipelineBuilder, StaticStateDefaults,
};
use dynstate_gfx::foundation::device::GfxDevice;
use dynstate_gfx::pipelines::graphics_pipeline::{GfxGraphicsPipelineCreateInfo, GfxPipelineLayout};
use dynstate_gfx::GfxResult;

use crate::frame_settings::FrameSettings;
use crate::geometry::SceneGeometry;
use crate::session::DynamicStateSession;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubePushConstants {
    pub mvp: glam::Mat4,
}

impl CubePushConstants {
    /// 从斜上方观察绕 y 轴旋转的立方体
    pub fn looking_at_cube(aspect_ratio: f32, rotation_deg: f32) -> Self {
        let projection = glam::Mat4::perspective_rh(60_f32.to_radians(), aspect_ratio, 0.1, 256.0);
        let view = glam::Mat4::look_at_rh(glam::vec3(2.5, 2.0, 3.5), glam::Vec3::ZERO, glam::Vec3::Y);
        let model = glam::Mat4::from_rotation_y(rotation_deg.to_radians());
        Self {
            mvp: projection * view * model,
        }
    }
}

/// 录制时需要的 pipeline 信息
#[derive(Clone, Copy)]
pub struct PipelineBinding<'a> {
    pub handle: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub aspects: &'a DynamicAspectSet,
}

/// 录制一次完整的绘制
///
/// 顺序：attachment barrier -> begin rendering -> viewport/scissor/line width -> 扩展 dynamic state
/// -> bind pipeline -> draw
pub fn record_scene<R: GfxCommandRecorder>(
    cmd: &R,
    rendering_info: &vk::RenderingInfo<'_>,
    pipeline: PipelineBinding<'_>,
    session: &DynamicStateSession,
    geometry: &dyn SceneGeometry,
    push_constants: &CubePushConstants,
) {
    let extent = rendering_info.render_area.extent;
    debug_assert!(
        pipeline.aspects.matches_dispatch(session.entry_points()),
        "pipeline dynamic states {:?} do not match resolved entry points {:?}",
        pipeline.aspects,
        session.entry_points()
    );

    // 所有 frame in flight 共用同一个 render target，需要等待之前提交的 pass 写完 attachment
    cmd.cmd_memory_barrier(GfxBarrierMask::ATTACHMENT_REUSE);

    cmd.cmd_begin_rendering(rendering_info);
    {
        // 翻转 y 轴，与 OpenGL 的 NDC 保持一致
        cmd.cmd_set_viewport(
            0,
            &[vk::Viewport {
                x: 0.0,
                y: extent.height as f32,
                width: extent.width as f32,
                height: -(extent.height as f32),
                min_depth: 0.0,
                max_depth: 1.0,
            }],
        );
        cmd.cmd_set_scissor(
            0,
            &[vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            }],
        );
        cmd.cmd_set_line_width(1.0);

        DynamicStateDispatcher::apply(cmd, session.entry_points(), session.values());

        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline.handle);
        cmd.cmd_push_constants(
            pipeline.layout,
            vk::ShaderStageFlags::VERTEX,
            0,
            bytemuck::bytes_of(push_constants),
        );

        geometry.bind_buffers(cmd);
        geometry.draw(cmd);
    }
    cmd.cmd_end_rendering();
}

/// 绘制立方体的 pass，持有根据探测结果创建的 pipeline
pub struct DynamicStatePass {
    pipeline: DynamicStatePipeline,
    _pipeline_layout: Rc<GfxPipelineLayout>,
}

impl DynamicStatePass {
    pub fn new(
        device: Rc<GfxDevice>,
        session: &DynamicStateSession,
        frame_settings: &FrameSettings,
        shader_dir: &Path,
    ) -> GfxResult<Self> {
        let pipeline_ci = Self::pipeline_ci(frame_settings, shader_dir);

        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .offset(0)
            .size(size_of::<CubePushConstants>() as u32);
        let pipeline_layout =
            Rc::new(GfxPipelineLayout::new(device.clone(), &[], &[push_constant_range], "dynamic-state")?);

        let pipeline = DynamicStatePipelineBuilder::new(session.capabilities(), session.entry_points())
            .static_defaults(StaticStateDefaults::default())
            .build(device, pipeline_ci, pipeline_layout.clone(), "dynamic-state-pipeline")?;

        Ok(Self {
            pipeline,
            _pipeline_layout: pipeline_layout,
        })
    }

    /// 除 dynamic state 以外的静态描述
    pub fn pipeline_ci(frame_settings: &FrameSettings, shader_dir: &Path) -> GfxGraphicsPipelineCreateInfo {
        let mut pipeline_ci = GfxGraphicsPipelineCreateInfo::default();
        pipeline_ci
            .vertex_shader_stage(shader_dir.join("cube.vert.spv"), c"main")
            .fragment_shader_stage(shader_dir.join("cube.frag.spv"), c"main")
            .attach_info(vec![frame_settings.color_format], Some(frame_settings.depth_format), None)
            .color_blend(
                vec![
                    vk::PipelineColorBlendAttachmentState::default()
                        .blend_enable(false)
                        .color_write_mask(vk::ColorComponentFlags::RGBA),
                ],
                [0.0; 4],
            )
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), true, false);
        pipeline_ci
    }

    #[inline]
    pub fn pipeline(&self) -> &DynamicStatePipeline {
        &self.pipeline
    }

    pub fn binding(&self) -> PipelineBinding<'_> {
        PipelineBinding {
            handle: self.pipeline.handle(),
            layout: self.pipeline.layout(),
            aspects: self.pipeline.aspects(),
        }
    }
}
