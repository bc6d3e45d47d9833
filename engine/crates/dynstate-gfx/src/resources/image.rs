use std::rc::Rc;

use ash::vk;
use vk_mem::Alloc;

use crate::error::{GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice, mem_allocator::GfxMemAllocator};

/// 由 vma 分配内存的 2D image，只有一个 mip level 和一个 layer
pub struct GfxImage2D {
    handle: vk::Image,
    allocation: vk_mem::Allocation,
    extent: vk::Extent2D,
    format: vk::Format,

    allocator: Rc<GfxMemAllocator>,
}
// 构建与销毁
impl GfxImage2D {
    pub fn new(
        device: &GfxDevice,
        allocator: Rc<GfxMemAllocator>,
        extent: vk::Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        let alloc_info = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            ..Default::default()
        };

        let (handle, allocation) =
            unsafe { allocator.create_image(&image_info, &alloc_info).vk_call("vmaCreateImage")? };
        let image = Self {
            handle,
            allocation,
            extent,
            format,
            allocator,
        };
        device.set_debug_name(&image, debug_name);
        Ok(image)
    }
}
impl Drop for GfxImage2D {
    fn drop(&mut self) {
        unsafe {
            self.allocator.destroy_image(self.handle, &mut self.allocation);
        }
    }
}
// getter
impl GfxImage2D {
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }
}
impl DebugType for GfxImage2D {
    fn debug_type_name() -> &'static str {
        "GfxImage2D"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

pub struct GfxImage2DView {
    handle: vk::ImageView,
    device: Rc<GfxDevice>,
}
impl GfxImage2DView {
    pub fn new(
        device: Rc<GfxDevice>,
        image: &GfxImage2D,
        aspect: vk::ImageAspectFlags,
        debug_name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        let info = vk::ImageViewCreateInfo::default()
            .image(image.handle())
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(image.format())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                level_count: 1,
                layer_count: 1,
                ..Default::default()
            });
        let handle = unsafe { device.create_image_view(&info, None).vk_call("vkCreateImageView")? };
        let view = Self { handle, device };
        view.device.set_debug_name(&view, debug_name);
        Ok(view)
    }

    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }
}
impl Drop for GfxImage2DView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.handle, None);
        }
    }
}
impl DebugType for GfxImage2DView {
    fn debug_type_name() -> &'static str {
        "GfxImage2DView"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
