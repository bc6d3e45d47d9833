use std::ops::Deref;
use std::rc::Rc;

use ash::vk;

use crate::error::{GfxResult, VkResultExt};
use crate::foundation::device::GfxDevice;

/// vma 封装
///
/// vma 需要在其生命周期内保证 Instance 和 Device 有效，
/// 因此持有 `Rc<GfxDevice>`，确保 device 晚于 allocator 销毁
pub struct GfxMemAllocator {
    inner: vk_mem::Allocator,
    _device: Rc<GfxDevice>,
}

impl GfxMemAllocator {
    pub fn new(instance: &ash::Instance, pdevice: vk::PhysicalDevice, device: Rc<GfxDevice>) -> GfxResult<Self> {
        let mut vma_ci = vk_mem::AllocatorCreateInfo::new(instance, &device.device, pdevice);
        vma_ci.vulkan_api_version = vk::API_VERSION_1_3;

        let vma = unsafe { vk_mem::Allocator::new(vma_ci).vk_call("vmaCreateAllocator")? };

        Ok(Self {
            inner: vma,
            _device: device,
        })
    }
}

impl Deref for GfxMemAllocator {
    type Target = vk_mem::Allocator;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
