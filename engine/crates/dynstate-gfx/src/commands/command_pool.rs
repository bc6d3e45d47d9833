use std::rc::Rc;

use ash::vk;

use crate::commands::command_queue::GfxQueueFamily;
use crate::error::{GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// command pool 是和 queue family 绑定的，而不是和 queue 绑定的
///
/// pool 销毁时，从中分配的 command buffer 也会一并释放
pub struct GfxCommandPool {
    handle: vk::CommandPool,
    _queue_family: GfxQueueFamily,
    device: Rc<GfxDevice>,

    debug_name: String,
}
// init & destroy
impl GfxCommandPool {
    pub fn new(
        device: Rc<GfxDevice>,
        queue_family: GfxQueueFamily,
        flags: vk::CommandPoolCreateFlags,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let pool = unsafe {
            device
                .create_command_pool(
                    &vk::CommandPoolCreateInfo::default()
                        .queue_family_index(queue_family.queue_family_index)
                        .flags(flags),
                    None,
                )
                .vk_call("vkCreateCommandPool")?
        };

        let command_pool = Self {
            handle: pool,
            _queue_family: queue_family,
            device,
            debug_name: debug_name.to_string(),
        };
        command_pool.device.set_debug_name(&command_pool, debug_name);
        Ok(command_pool)
    }
}
impl Drop for GfxCommandPool {
    fn drop(&mut self) {
        log::info!("Dropping CommandPool: {}", self.debug_name);
        unsafe {
            self.device.destroy_command_pool(self.handle, None);
        }
    }
}

// getters
impl GfxCommandPool {
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.handle
    }

    #[inline]
    pub fn device(&self) -> &Rc<GfxDevice> {
        &self.device
    }
}
// tools
impl GfxCommandPool {
    /// 这个调用并不会释放资源，而是将 pool 内的 command buffer 设置到初始状态
    ///
    /// reset 之后，pool 内的 command buffer 又可以重新录制命令
    pub fn reset_all_buffers(&self) -> GfxResult<()> {
        unsafe {
            self.device
                .reset_command_pool(self.handle, vk::CommandPoolResetFlags::RELEASE_RESOURCES)
                .vk_call("vkResetCommandPool")
        }
    }
}

impl DebugType for GfxCommandPool {
    fn debug_type_name() -> &'static str {
        "GfxCommandPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
