use std::ffi::CString;
use std::rc::Rc;

use ash::vk;

use crate::basic::color::LabelColor;
use crate::commands::{barrier::GfxBarrierMask, command_pool::GfxCommandPool, recorder::GfxCommandRecorder};
use crate::error::{GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// 命令缓冲封装
///
/// # 使用示例
/// ```ignore
/// let cmd = GfxCommandBuffer::new(&pool, "my-pass")?;
/// cmd.begin(vk::CommandBufferUsageFlags::empty(), "my-pass")?;
/// cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline);
/// // 绘制命令...
/// cmd.end()?;
/// ```
#[derive(Clone)]
pub struct GfxCommandBuffer {
    vk_handle: vk::CommandBuffer,
    device: Rc<GfxDevice>,
}
// new & init
impl GfxCommandBuffer {
    pub fn new(command_pool: &GfxCommandPool, debug_name: &str) -> GfxResult<Self> {
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool.handle())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let device = command_pool.device().clone();
        let command_buffers =
            unsafe { device.allocate_command_buffers(&info).vk_call("vkAllocateCommandBuffers")? };
        let cmd_buffer = GfxCommandBuffer {
            vk_handle: command_buffers[0],
            device,
        };
        cmd_buffer.device.set_debug_name(&cmd_buffer, debug_name);
        Ok(cmd_buffer)
    }
}
// Basic 命令
impl GfxCommandBuffer {
    /// 开始录制 command
    ///
    /// 自动设置 debug label
    #[inline]
    pub fn begin(&self, usage_flag: vk::CommandBufferUsageFlags, debug_label_name: &str) -> GfxResult<()> {
        unsafe {
            self.device
                .begin_command_buffer(self.vk_handle, &vk::CommandBufferBeginInfo::default().flags(usage_flag))
                .vk_call("vkBeginCommandBuffer")?;
        }
        self.begin_label(debug_label_name, LabelColor::COLOR_CMD);
        Ok(())
    }

    /// 结束录制 command
    ///
    /// 结束 debug label
    #[inline]
    pub fn end(&self) -> GfxResult<()> {
        self.end_label();
        unsafe { self.device.end_command_buffer(self.vk_handle).vk_call("vkEndCommandBuffer") }
    }
}
// getters
impl GfxCommandBuffer {
    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }
}
// 同步相关命令
impl GfxCommandBuffer {
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    #[inline]
    pub fn image_memory_barrier(
        &self,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barriers: &[vk::ImageMemoryBarrier],
    ) {
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.vk_handle,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                barriers,
            );
        }
    }
}
// debug 相关命令
impl GfxCommandBuffer {
    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn begin_label(&self, label_name: &str, label_color: glam::Vec4) {
        let Ok(name) = CString::new(label_name) else {
            return;
        };
        unsafe {
            self.device.debug_utils.cmd_begin_debug_utils_label(
                self.vk_handle,
                &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()).color(label_color.into()),
            );
        }
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn end_label(&self) {
        unsafe {
            self.device.debug_utils.cmd_end_debug_utils_label(self.vk_handle);
        }
    }
}

impl GfxCommandRecorder for GfxCommandBuffer {
    #[inline]
    fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }

    #[inline]
    fn cmd_memory_barrier(&self, mask: GfxBarrierMask) {
        unsafe {
            self.device.cmd_pipeline_barrier(
                self.vk_handle,
                mask.src_stage,
                mask.dst_stage,
                vk::DependencyFlags::empty(),
                &[mask.memory_barrier()],
                &[],
                &[],
            );
        }
    }

    #[inline]
    fn cmd_begin_rendering(&self, rendering_info: &vk::RenderingInfo<'_>) {
        unsafe {
            self.device.dynamic_rendering.cmd_begin_rendering(self.vk_handle, rendering_info);
        }
    }

    #[inline]
    fn cmd_end_rendering(&self) {
        unsafe {
            self.device.dynamic_rendering.cmd_end_rendering(self.vk_handle);
        }
    }

    #[inline]
    fn cmd_set_viewport(&self, first_viewport: u32, viewports: &[vk::Viewport]) {
        unsafe {
            self.device.cmd_set_viewport(self.vk_handle, first_viewport, viewports);
        }
    }

    #[inline]
    fn cmd_set_scissor(&self, first_scissor: u32, scissors: &[vk::Rect2D]) {
        unsafe {
            self.device.cmd_set_scissor(self.vk_handle, first_scissor, scissors);
        }
    }

    #[inline]
    fn cmd_set_line_width(&self, line_width: f32) {
        unsafe {
            self.device.cmd_set_line_width(self.vk_handle, line_width);
        }
    }

    #[inline]
    fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            self.device.cmd_bind_pipeline(self.vk_handle, bind_point, pipeline);
        }
    }

    #[inline]
    fn cmd_push_constants(
        &self,
        pipeline_layout: vk::PipelineLayout,
        stage: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            self.device.cmd_push_constants(self.vk_handle, pipeline_layout, stage, offset, data);
        }
    }

    #[inline]
    fn cmd_draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.device.cmd_draw(self.vk_handle, vertex_count, instance_count, first_vertex, first_instance);
        }
    }
}

impl DebugType for GfxCommandBuffer {
    fn debug_type_name() -> &'static str {
        "GfxCommandBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}
