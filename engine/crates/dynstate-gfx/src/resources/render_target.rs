use std::rc::Rc;

use ash::vk;

use crate::commands::command_buffer::GfxCommandBuffer;
use crate::error::GfxResult;
use crate::foundation::{device::GfxDevice, mem_allocator::GfxMemAllocator};
use crate::pipelines::rendering_info::GfxRenderingInfo;
use crate::resources::image::{GfxImage2D, GfxImage2DView};

/// 离屏渲染的 color + depth attachment
///
/// 创建后需要执行一次 [`Self::transition_layouts`]，
/// 之后两个 image 始终处于 attachment layout
pub struct GfxRenderTarget {
    color_view: GfxImage2DView,
    color: GfxImage2D,
    depth_view: GfxImage2DView,
    depth: GfxImage2D,
}

impl GfxRenderTarget {
    pub const COLOR_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;
    pub const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

    pub fn new(
        device: Rc<GfxDevice>,
        allocator: Rc<GfxMemAllocator>,
        extent: vk::Extent2D,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let color = GfxImage2D::new(
            &device,
            allocator.clone(),
            extent,
            Self::COLOR_FORMAT,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC,
            &format!("{debug_name}-color"),
        )?;
        let color_view =
            GfxImage2DView::new(device.clone(), &color, vk::ImageAspectFlags::COLOR, format!("{debug_name}-color"))?;

        let depth = GfxImage2D::new(
            &device,
            allocator,
            extent,
            Self::DEPTH_FORMAT,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            &format!("{debug_name}-depth"),
        )?;
        let depth_view = GfxImage2DView::new(device, &depth, vk::ImageAspectFlags::DEPTH, format!("{debug_name}-depth"))?;

        Ok(Self {
            color_view,
            color,
            depth_view,
            depth,
        })
    }

    /// UNDEFINED -> attachment layout
    pub fn transition_layouts(&self, cmd: &GfxCommandBuffer) {
        let subresource = |aspect_mask| vk::ImageSubresourceRange {
            aspect_mask,
            level_count: 1,
            layer_count: 1,
            ..Default::default()
        };
        let barriers = [
            vk::ImageMemoryBarrier::default()
                .image(self.color.handle())
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .subresource_range(subresource(vk::ImageAspectFlags::COLOR)),
            vk::ImageMemoryBarrier::default()
                .image(self.depth.handle())
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .dst_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .subresource_range(subresource(vk::ImageAspectFlags::DEPTH)),
        ];
        cmd.image_memory_barrier(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            &barriers,
        );
    }

    pub fn rendering_info(&self, clear_color: [f32; 4]) -> GfxRenderingInfo {
        GfxRenderingInfo::new(
            vec![self.color_view.handle()],
            Some(self.depth_view.handle()),
            vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.extent(),
            },
            clear_color,
        )
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.color.extent()
    }
}
