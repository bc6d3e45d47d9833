use ash::vk;
use itertools::Itertools;

use crate::dynamic_state::capabilities::DynamicStateCapabilities;
use crate::dynamic_state::entry_points::{DynamicStateEntryPoints, DynamicStateOp};
use crate::error::{GfxError, GfxResult};

/// 可以声明为 dynamic 的 pipeline 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicAspect {
    Viewport,
    Scissor,
    LineWidth,
    CullMode,
    FrontFace,
}
impl DynamicAspect {
    /// core Vulkan 即可提供，不依赖任何扩展
    pub const ALWAYS_DYNAMIC: [Self; 3] = [Self::Viewport, Self::Scissor, Self::LineWidth];

    #[inline]
    pub fn to_vk(self) -> vk::DynamicState {
        match self {
            Self::Viewport => vk::DynamicState::VIEWPORT,
            Self::Scissor => vk::DynamicState::SCISSOR,
            Self::LineWidth => vk::DynamicState::LINE_WIDTH,
            Self::CullMode => vk::DynamicState::CULL_MODE,
            Self::FrontFace => vk::DynamicState::FRONT_FACE,
        }
    }

    /// 设置该状态的扩展命令；core 状态返回 `None`
    #[inline]
    pub fn extension_op(self) -> Option<DynamicStateOp> {
        match self {
            Self::Viewport | Self::Scissor | Self::LineWidth => None,
            Self::CullMode => Some(DynamicStateOp::SetCullMode),
            Self::FrontFace => Some(DynamicStateOp::SetFrontFace),
        }
    }
}

/// 一个 pipeline 声明为 dynamic 的状态集合
///
/// 顺序固定：先是 core 状态，然后是扩展状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicAspectSet {
    aspects: Vec<DynamicAspect>,
}

impl DynamicAspectSet {
    /// viewport, scissor, line width 总是 dynamic；
    /// 只有在 extended_dynamic_state 受支持时，cull mode 和 front face 才是 dynamic
    pub fn for_capabilities(capabilities: &DynamicStateCapabilities) -> Self {
        let mut aspects = DynamicAspect::ALWAYS_DYNAMIC.to_vec();
        if capabilities.has_extended_dynamic_state() {
            aspects.extend([DynamicAspect::CullMode, DynamicAspect::FrontFace]);
        }
        Self { aspects }
    }

    #[inline]
    pub fn contains(&self, aspect: DynamicAspect) -> bool {
        self.aspects.contains(&aspect)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = DynamicAspect> + '_ {
        self.aspects.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    /// 用于 `VkPipelineDynamicStateCreateInfo`
    pub fn to_vk(&self) -> Vec<vk::DynamicState> {
        self.aspects.iter().map(|aspect| aspect.to_vk()).collect_vec()
    }

    /// 每一个依赖扩展命令的 dynamic 状态，都必须有解析好的函数指针
    ///
    /// 否则录制时无法设置该状态，绘制结果未定义，因此这里直接报错
    pub fn ensure_resolved(&self, entry_points: &DynamicStateEntryPoints) -> GfxResult<()> {
        for aspect in self.iter() {
            let Some(op) = aspect.extension_op() else {
                continue;
            };
            if !entry_points.is_resolved(op) {
                return Err(GfxError::UnresolvedDynamicAspect(aspect));
            }
        }
        Ok(())
    }

    /// dispatcher 会设置的状态，与声明为 dynamic 的扩展状态完全一致
    pub fn matches_dispatch(&self, entry_points: &DynamicStateEntryPoints) -> bool {
        [DynamicAspect::CullMode, DynamicAspect::FrontFace].into_iter().all(|aspect| {
            aspect.extension_op().is_some_and(|op| self.contains(aspect) == entry_points.is_resolved(op))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic_state::capabilities::DynamicStateExtension;
    use crate::testing::FakeDevice;

    fn caps_from_bits(bits: u32) -> DynamicStateCapabilities {
        DynamicStateCapabilities::from_fn(|ext| {
            let idx = DynamicStateExtension::ALL.iter().position(|e| *e == ext).unwrap_or(0);
            bits & (1 << idx) != 0
        })
    }

    #[test]
    fn test_aspects_for_all_capability_combinations() {
        for bits in 0..16 {
            let caps = caps_from_bits(bits);
            let aspects = DynamicAspectSet::for_capabilities(&caps);

            for aspect in DynamicAspect::ALWAYS_DYNAMIC {
                assert!(aspects.contains(aspect), "bits={bits:04b}");
            }
            assert_eq!(aspects.contains(DynamicAspect::CullMode), caps.has_extended_dynamic_state(), "bits={bits:04b}");
            assert_eq!(aspects.contains(DynamicAspect::FrontFace), caps.has_extended_dynamic_state(), "bits={bits:04b}");
            assert_eq!(aspects.len(), if caps.has_extended_dynamic_state() { 5 } else { 3 });
        }
    }

    #[test]
    fn test_vk_order() {
        let caps = DynamicStateCapabilities::from_fn(|_| true);
        assert_eq!(
            DynamicAspectSet::for_capabilities(&caps).to_vk(),
            vec![
                vk::DynamicState::VIEWPORT,
                vk::DynamicState::SCISSOR,
                vk::DynamicState::LINE_WIDTH,
                vk::DynamicState::CULL_MODE,
                vk::DynamicState::FRONT_FACE,
            ]
        );
    }

    #[test]
    fn test_resolved_entry_points_cover_declared_aspects() {
        for bits in 0..16 {
            let device = FakeDevice::from_capabilities(caps_from_bits(bits));
            let caps = DynamicStateCapabilities::probe(&device);
            let entry_points = DynamicStateEntryPoints::resolve(&caps, &device);
            let aspects = DynamicAspectSet::for_capabilities(&caps);

            assert!(aspects.ensure_resolved(&entry_points).is_ok(), "bits={bits:04b}");
            assert!(aspects.matches_dispatch(&entry_points), "bits={bits:04b}");
        }
    }

    #[test]
    fn test_missing_entry_point_is_reported() {
        let caps = DynamicStateCapabilities::from_fn(|ext| ext == DynamicStateExtension::ExtendedDynamicState);
        let aspects = DynamicAspectSet::for_capabilities(&caps);

        let err = aspects.ensure_resolved(&DynamicStateEntryPoints::none()).unwrap_err();
        assert!(matches!(err, GfxError::UnresolvedDynamicAspect(DynamicAspect::CullMode)));
        assert!(!aspects.matches_dispatch(&DynamicStateEntryPoints::none()));
    }
}
