use ash::vk;

/// dynamic rendering 的 attachment 信息
///
/// color 使用固定的背景色清屏，depth 清为 1.0
pub struct GfxRenderingInfo {
    color_attach_info: Vec<vk::RenderingAttachmentInfo<'static>>,
    depth_attach_info: Option<vk::RenderingAttachmentInfo<'static>>,
    range: vk::Rect2D,
}
impl GfxRenderingInfo {
    pub fn new(
        color_attach_image: Vec<vk::ImageView>,
        depth_attach_image: Option<vk::ImageView>,
        range: vk::Rect2D,
        clear_color: [f32; 4],
    ) -> Self {
        Self {
            color_attach_info: color_attach_image
                .iter()
                .map(|view| Self::get_color_attachment(*view, clear_color))
                .collect(),
            depth_attach_info: depth_attach_image.map(Self::get_depth_attachment),
            range,
        }
    }

    pub fn rendering_info(&self) -> vk::RenderingInfo<'_> {
        let mut info = vk::RenderingInfo::default()
            .layer_count(1)
            .render_area(self.range)
            .color_attachments(&self.color_attach_info);
        if let Some(depth_attach) = &self.depth_attach_info {
            info = info.depth_attachment(depth_attach)
        }
        info
    }

    #[inline]
    pub fn render_area(&self) -> vk::Rect2D {
        self.range
    }

    fn get_color_attachment(image_view: vk::ImageView, clear_color: [f32; 4]) -> vk::RenderingAttachmentInfo<'static> {
        vk::RenderingAttachmentInfo::default()
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .image_view(image_view)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue { float32: clear_color },
            })
    }

    fn get_depth_attachment(depth_image_view: vk::ImageView) -> vk::RenderingAttachmentInfo<'static> {
        vk::RenderingAttachmentInfo::default()
            .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            .image_view(depth_image_view)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1_f32, // 1 表示无限远
                    stencil: 0,
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_info_without_depth() {
        let area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D { width: 64, height: 32 },
        };
        let info = GfxRenderingInfo::new(vec![vk::ImageView::null()], None, area, [0.0, 0.0, 0.0, 1.0]);
        let vk_info = info.rendering_info();

        assert_eq!(vk_info.color_attachment_count, 1);
        assert!(vk_info.p_depth_attachment.is_null());
        assert_eq!(vk_info.render_area.extent.width, 64);
    }
}
