use ash::vk;

/// 离屏渲染目标以及帧循环的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    pub frame_extent: vk::Extent2D,
    pub color_format: vk::Format,
    pub depth_format: vk::Format,
    pub frames_in_flight: usize,
}

impl FrameSettings {
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.frame_extent.width as f32 / self.frame_extent.height.max(1) as f32
    }
}
