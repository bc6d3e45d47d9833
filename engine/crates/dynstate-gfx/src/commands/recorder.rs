use ash::vk;

use crate::commands::barrier::GfxBarrierMask;

/// 录制一个绘制 pass 所需要的命令集合
///
/// [`GfxCommandBuffer`](crate::commands::command_buffer::GfxCommandBuffer) 直接转发到 Vulkan；
/// 测试中使用 `testing::RecordingCommandBuffer` 记录命令序列。
///
/// 可选的扩展命令（例如 vkCmdSetCullModeEXT）不在这里，
/// 而是通过 `DynamicStateEntryPoints` 中解析得到的函数指针调用，只需要 [`Self::vk_handle`]。
pub trait GfxCommandRecorder {
    fn vk_handle(&self) -> vk::CommandBuffer;

    /// 只包含全局的 memory barrier
    ///
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    fn cmd_memory_barrier(&self, mask: GfxBarrierMask);

    /// - command type: action, state
    /// - supported queue types: graphics
    fn cmd_begin_rendering(&self, rendering_info: &vk::RenderingInfo<'_>);

    /// - command type: action, state
    /// - supported queue types: graphics
    fn cmd_end_rendering(&self);

    /// - command type: state
    /// - supported queue types: graphics
    fn cmd_set_viewport(&self, first_viewport: u32, viewports: &[vk::Viewport]);

    /// - command type: state
    /// - supported queue types: graphics
    fn cmd_set_scissor(&self, first_scissor: u32, scissors: &[vk::Rect2D]);

    /// - command type: state
    /// - supported queue types: graphics
    fn cmd_set_line_width(&self, line_width: f32);

    /// - command type: state
    /// - supported queue types: graphics, compute
    fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline);

    /// - command type: state
    /// - supported queue types: graphics, compute
    fn cmd_push_constants(
        &self,
        pipeline_layout: vk::PipelineLayout,
        stage: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    );

    /// 不使用 index buffer 的绘制
    ///
    /// - command type: action
    /// - supported queue types: graphics
    fn cmd_draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
}
