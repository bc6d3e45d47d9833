use ash::vk;

/// barrier 使用的 src 和 dst 访问 mask
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GfxBarrierMask {
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
}

impl GfxBarrierMask {
    /// 多个 frame 复用同一组 color/depth attachment：
    /// 本次 pass 的 clear 和写入需要等待之前提交的 pass 写入完成（write-after-write）
    ///
    /// depth 的 load op 发生在 early fragment test，store op 发生在 late fragment test
    pub const ATTACHMENT_REUSE: Self = Self {
        src_stage: vk::PipelineStageFlags::from_raw(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT.as_raw()
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS.as_raw(),
        ),
        dst_stage: vk::PipelineStageFlags::from_raw(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT.as_raw()
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS.as_raw(),
        ),
        src_access: vk::AccessFlags::from_raw(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE.as_raw() | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw(),
        ),
        dst_access: vk::AccessFlags::from_raw(
            vk::AccessFlags::COLOR_ATTACHMENT_READ.as_raw()
                | vk::AccessFlags::COLOR_ATTACHMENT_WRITE.as_raw()
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ.as_raw()
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE.as_raw(),
        ),
    };

    #[inline]
    pub fn memory_barrier(&self) -> vk::MemoryBarrier<'static> {
        vk::MemoryBarrier::default().src_access_mask(self.src_access).dst_access_mask(self.dst_access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_reuse_waits_for_color_and_depth_writes() {
        let mask = GfxBarrierMask::ATTACHMENT_REUSE;

        assert!(mask.src_access.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
        assert!(mask.src_access.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
        assert!(mask.dst_access.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
        assert!(mask.dst_access.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));

        assert!(mask.src_stage.contains(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS));
        assert!(mask.dst_stage.contains(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS));

        let barrier = mask.memory_barrier();
        assert_eq!(barrier.src_access_mask, mask.src_access);
        assert_eq!(barrier.dst_access_mask, mask.dst_access);
    }
}
