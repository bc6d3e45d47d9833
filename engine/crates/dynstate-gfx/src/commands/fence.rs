use std::rc::Rc;

use ash::vk;

use crate::error::{GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

/// 用于等待某个 command buffer 执行完成，从而可以安全地重新录制
pub struct GfxFence {
    fence: vk::Fence,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxFence {
    fn debug_type_name() -> &'static str {
        "GfxFence"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.fence
    }
}

// 创建与销毁
impl GfxFence {
    /// # param
    /// * signaled - 是否创建时就 signaled
    pub fn new(device: Rc<GfxDevice>, signaled: bool, debug_name: &str) -> GfxResult<Self> {
        let fence_flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let fence = unsafe {
            device.create_fence(&vk::FenceCreateInfo::default().flags(fence_flags), None).vk_call("vkCreateFence")?
        };

        let fence = Self { fence, device };
        fence.device.set_debug_name(&fence, debug_name);
        Ok(fence)
    }
}
impl Drop for GfxFence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

// getters
impl GfxFence {
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

// tools
impl GfxFence {
    /// 阻塞等待 fence
    #[inline]
    pub fn wait(&self) -> GfxResult<()> {
        unsafe {
            self.device.wait_for_fences(std::slice::from_ref(&self.fence), true, u64::MAX).vk_call("vkWaitForFences")
        }
    }

    #[inline]
    pub fn reset(&self) -> GfxResult<()> {
        unsafe { self.device.reset_fences(std::slice::from_ref(&self.fence)).vk_call("vkResetFences") }
    }
}
