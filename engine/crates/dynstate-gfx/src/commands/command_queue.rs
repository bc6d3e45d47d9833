use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::commands::{command_buffer::GfxCommandBuffer, fence::GfxFence};
use crate::error::{GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

#[derive(Clone, Debug)]
pub struct GfxQueueFamily {
    pub queue_family_index: u32,
    pub queue_flags: vk::QueueFlags,
}

/// # destroy
///
/// queue 在 device 销毁时会被销毁
pub struct GfxCommandQueue {
    pub(crate) vk_queue: vk::Queue,
    pub(crate) queue_family: GfxQueueFamily,
    pub(crate) device: Rc<GfxDevice>,
}
impl DebugType for GfxCommandQueue {
    fn debug_type_name() -> &'static str {
        "GfxCommandQueue"
    }
    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_queue
    }
}

// getter
impl GfxCommandQueue {
    #[inline]
    pub fn queue_family(&self) -> &GfxQueueFamily {
        &self.queue_family
    }

    #[inline]
    pub fn handle(&self) -> vk::Queue {
        self.vk_queue
    }
}

// tools
impl GfxCommandQueue {
    /// 提交一批 command buffer，不使用 semaphore
    pub fn submit(&self, command_buffers: &[&GfxCommandBuffer], fence: Option<&GfxFence>) -> GfxResult<()> {
        let cmd_handles = command_buffers.iter().map(|cmd| cmd.vk_handle()).collect_vec();
        let submit_info = vk::SubmitInfo::default().command_buffers(&cmd_handles);
        unsafe {
            self.device
                .queue_submit(
                    self.vk_queue,
                    std::slice::from_ref(&submit_info),
                    fence.map_or(vk::Fence::null(), |f| f.handle()),
                )
                .vk_call("vkQueueSubmit")
        }
    }

    /// 根据 specification，vkQueueWaitIdle 应该和 Fence 效率相同
    #[inline]
    pub fn wait_idle(&self) -> GfxResult<()> {
        unsafe { self.device.queue_wait_idle(self.vk_queue).vk_call("vkQueueWaitIdle") }
    }
}
