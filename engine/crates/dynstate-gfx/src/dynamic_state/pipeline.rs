use std::rc::Rc;

use ash::vk;

use crate::dynamic_state::aspects::{DynamicAspect, DynamicAspectSet};
use crate::dynamic_state::capabilities::DynamicStateCapabilities;
use crate::dynamic_state::entry_points::DynamicStateEntryPoints;
use crate::dynamic_state::values::{CullMode, FrontFace};
use crate::error::GfxResult;
use crate::foundation::device::GfxDevice;
use crate::pipelines::graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout};

/// 状态不是 dynamic 时，烘焙到 pipeline 中的值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticStateDefaults {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
}
impl Default for StaticStateDefaults {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
        }
    }
}

/// 根据探测结果决定 pipeline 的哪些状态是 dynamic 的
pub struct DynamicStatePipelineBuilder<'a> {
    capabilities: &'a DynamicStateCapabilities,
    entry_points: &'a DynamicStateEntryPoints,
    defaults: StaticStateDefaults,
}

impl<'a> DynamicStatePipelineBuilder<'a> {
    pub fn new(capabilities: &'a DynamicStateCapabilities, entry_points: &'a DynamicStateEntryPoints) -> Self {
        Self {
            capabilities,
            entry_points,
            defaults: StaticStateDefaults::default(),
        }
    }

    /// builder
    #[inline]
    pub fn static_defaults(mut self, defaults: StaticStateDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// 修改 create info 的 dynamic state 列表以及烘焙的 cull mode, front face
    ///
    /// 不涉及任何 Vulkan 调用。
    /// 声明为 dynamic 的扩展状态没有对应的函数指针时，返回 `UnresolvedDynamicAspect`
    pub fn configure(&self, create_info: &mut GfxGraphicsPipelineCreateInfo) -> GfxResult<DynamicAspectSet> {
        let aspects = DynamicAspectSet::for_capabilities(self.capabilities);
        aspects.ensure_resolved(self.entry_points)?;

        create_info
            .dynamic_states(aspects.to_vk())
            // 即使 cull mode 是 dynamic 的，也填入默认值，此时会被忽略
            .cull_mode(self.defaults.cull_mode.to_vk(), self.defaults.front_face.to_vk())
            .pipeline_flags(vk::PipelineCreateFlags::ALLOW_DERIVATIVES);

        log::info!("pipeline dynamic states: {:?}", aspects.to_vk());
        Ok(aspects)
    }

    /// 通常只在初始化时调用一次
    pub fn build(
        &self,
        device: Rc<GfxDevice>,
        mut create_info: GfxGraphicsPipelineCreateInfo,
        pipeline_layout: Rc<GfxPipelineLayout>,
        debug_name: &str,
    ) -> GfxResult<DynamicStatePipeline> {
        let aspects = self.configure(&mut create_info)?;
        let pipeline = GfxGraphicsPipeline::new(device, &create_info, pipeline_layout, debug_name)?;

        Ok(DynamicStatePipeline {
            pipeline,
            aspects,
            defaults: self.defaults,
        })
    }
}

/// graphics pipeline 以及它声明为 dynamic 的状态
pub struct DynamicStatePipeline {
    pipeline: GfxGraphicsPipeline,
    aspects: DynamicAspectSet,
    defaults: StaticStateDefaults,
}
impl DynamicStatePipeline {
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline.handle()
    }

    #[inline]
    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline.layout()
    }

    #[inline]
    pub fn aspects(&self) -> &DynamicAspectSet {
        &self.aspects
    }

    #[inline]
    pub fn is_dynamic(&self, aspect: DynamicAspect) -> bool {
        self.aspects.contains(aspect)
    }

    #[inline]
    pub fn static_defaults(&self) -> StaticStateDefaults {
        self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic_state::capabilities::DynamicStateExtension;
    use crate::error::GfxError;
    use crate::testing::FakeDevice;

    fn configure_on(device: &FakeDevice) -> (GfxResult<DynamicAspectSet>, GfxGraphicsPipelineCreateInfo) {
        let caps = DynamicStateCapabilities::probe(device);
        let entry_points = DynamicStateEntryPoints::resolve(&caps, device);
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        let result = DynamicStatePipelineBuilder::new(&caps, &entry_points).configure(&mut ci);
        (result, ci)
    }

    #[test]
    fn test_configure_with_extended_dynamic_state() {
        let (aspects, ci) = configure_on(&FakeDevice::with_extensions(&[DynamicStateExtension::ExtendedDynamicState]));
        let aspects = aspects.unwrap();

        assert!(aspects.contains(DynamicAspect::CullMode));
        assert!(aspects.contains(DynamicAspect::FrontFace));
        assert_eq!(
            ci.get_dynamic_states(),
            &[
                vk::DynamicState::VIEWPORT,
                vk::DynamicState::SCISSOR,
                vk::DynamicState::LINE_WIDTH,
                vk::DynamicState::CULL_MODE,
                vk::DynamicState::FRONT_FACE,
            ]
        );
        assert_eq!(ci.get_pipeline_flags(), vk::PipelineCreateFlags::ALLOW_DERIVATIVES);
    }

    #[test]
    fn test_configure_without_extension_bakes_defaults() {
        let (aspects, ci) = configure_on(&FakeDevice::without_extensions());
        let aspects = aspects.unwrap();

        assert_eq!(aspects.to_vk(), ci.get_dynamic_states());
        assert_eq!(
            ci.get_dynamic_states(),
            &[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR, vk::DynamicState::LINE_WIDTH]
        );
        assert_eq!(ci.get_cull_mode(), vk::CullModeFlags::BACK);
        assert_eq!(ci.get_front_face(), vk::FrontFace::COUNTER_CLOCKWISE);
    }

    #[test]
    fn test_configure_is_deterministic() {
        let device = FakeDevice::with_extensions(&DynamicStateExtension::ALL);
        let (first, ci_first) = configure_on(&device);
        let (second, ci_second) = configure_on(&device);

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(ci_first.get_dynamic_states(), ci_second.get_dynamic_states());
    }

    #[test]
    fn test_custom_static_defaults() {
        let caps = DynamicStateCapabilities::none();
        let entry_points = DynamicStateEntryPoints::none();
        let mut ci = GfxGraphicsPipelineCreateInfo::default();
        DynamicStatePipelineBuilder::new(&caps, &entry_points)
            .static_defaults(StaticStateDefaults {
                cull_mode: CullMode::None,
                front_face: FrontFace::Clockwise,
            })
            .configure(&mut ci)
            .unwrap();

        assert_eq!(ci.get_cull_mode(), vk::CullModeFlags::NONE);
        assert_eq!(ci.get_front_face(), vk::FrontFace::CLOCKWISE);
    }

    #[test]
    fn test_configure_rejects_unresolved_entry_points() {
        let device = FakeDevice::with_extensions(&[DynamicStateExtension::ExtendedDynamicState]).without_entry_points();
        let (result, _) = configure_on(&device);

        assert!(matches!(result, Err(GfxError::UnresolvedDynamicAspect(DynamicAspect::CullMode))));
    }
}
