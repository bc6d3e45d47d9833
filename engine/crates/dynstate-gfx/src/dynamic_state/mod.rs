//! 运行时可调的 pipeline 状态
//!
//! 1. device 创建前：[`DynamicStateCapabilities::probe`] 探测扩展
//! 2. device 创建后：[`DynamicStateEntryPoints::resolve`] 解析扩展命令
//! 3. [`DynamicStatePipelineBuilder`] 根据探测结果决定哪些状态是 dynamic 的
//! 4. 录制时由 [`DynamicStateDispatcher`] 设置状态，缺失的命令直接跳过

pub mod aspects;
pub mod capabilities;
pub mod dispatcher;
pub mod entry_points;
pub mod pipeline;
pub mod values;

pub use aspects::{DynamicAspect, DynamicAspectSet};
pub use capabilities::{DynamicStateCapabilities, DynamicStateExtension};
pub use dispatcher::DynamicStateDispatcher;
pub use entry_points::{DynamicStateEntryPoints, DynamicStateOp};
pub use pipeline::{DynamicStatePipeline, DynamicStatePipelineBuilder, StaticStateDefaults};
pub use values::{CullMode, DynamicStateValues, FrontFace};

use crate::error::GfxResult;
use crate::foundation::capability_query::{DeviceExtensionQuery, DeviceProcResolver};

/// 两个阶段的探测结果，初始化后只读
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicStateSupport {
    pub capabilities: DynamicStateCapabilities,
    pub entry_points: DynamicStateEntryPoints,
}

/// 探测扩展，用探测结果创建 device，再从 device 中解析扩展命令
///
/// `create_device` 接收需要开启的扩展与 feature
pub fn probe_dynamic_state<D, F>(query: &impl DeviceExtensionQuery, create_device: F) -> GfxResult<(D, DynamicStateSupport)>
where
    D: DeviceProcResolver,
    F: FnOnce(&DynamicStateCapabilities) -> GfxResult<D>,
{
    let capabilities = DynamicStateCapabilities::probe(query);
    let device = create_device(&capabilities)?;
    let entry_points = DynamicStateEntryPoints::resolve(&capabilities, &device);

    Ok((
        device,
        DynamicStateSupport {
            capabilities,
            entry_points,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, RecordedCommand, RecordingCommandBuffer, take_recorded_commands};

    #[test]
    fn test_probe_passes_capabilities_to_device_creation() {
        let physical = FakeDevice::with_extensions(&[DynamicStateExtension::ExtendedDynamicState]);
        let (device, support) = probe_dynamic_state(&physical, |caps| {
            assert_eq!(caps.device_extensions(), vec![ash::ext::extended_dynamic_state::NAME]);
            assert_eq!(caps.device_features().len(), 1);
            Ok(FakeDevice::from_capabilities(*caps))
        })
        .unwrap();

        assert!(support.capabilities.has_extended_dynamic_state());
        assert!(support.entry_points.is_resolved(DynamicStateOp::SetCullMode));
        assert_eq!(device.resolved_names().len(), 2);
    }

    /// 支持扩展的设备：cull mode 可以运行时修改
    #[test]
    fn test_scenario_supported_device() {
        let physical = FakeDevice::with_extensions(&[DynamicStateExtension::ExtendedDynamicState]);
        let (_device, support) =
            probe_dynamic_state(&physical, |caps| Ok(FakeDevice::from_capabilities(*caps))).unwrap();

        let mut ci = pipelines_ci();
        let aspects = DynamicStatePipelineBuilder::new(&support.capabilities, &support.entry_points)
            .configure(&mut ci)
            .unwrap();
        assert!(aspects.contains(DynamicAspect::CullMode));

        let cmd = RecordingCommandBuffer::new(42);
        take_recorded_commands();
        DynamicStateDispatcher::apply(
            &cmd,
            &support.entry_points,
            &DynamicStateValues {
                cull_mode: CullMode::None,
                front_face: FrontFace::CounterClockwise,
            },
        );
        let recorded = take_recorded_commands();
        assert_eq!(recorded[0], (cmd.vk_handle(), RecordedCommand::SetCullMode(ash::vk::CullModeFlags::NONE)));
    }

    /// 不支持扩展的设备：UI 修改无效，始终使用烘焙的 back face culling
    #[test]
    fn test_scenario_unsupported_device() {
        let physical = FakeDevice::without_extensions();
        let (device, support) =
            probe_dynamic_state(&physical, |caps| Ok(FakeDevice::from_capabilities(*caps))).unwrap();
        assert!(device.resolved_names().is_empty());

        let mut ci = pipelines_ci();
        let aspects = DynamicStatePipelineBuilder::new(&support.capabilities, &support.entry_points)
            .configure(&mut ci)
            .unwrap();
        assert!(!aspects.contains(DynamicAspect::CullMode));
        assert_eq!(ci.get_cull_mode(), ash::vk::CullModeFlags::BACK);

        let cmd = RecordingCommandBuffer::new(42);
        take_recorded_commands();
        DynamicStateDispatcher::apply(
            &cmd,
            &support.entry_points,
            &DynamicStateValues {
                cull_mode: CullMode::None,
                front_face: FrontFace::Clockwise,
            },
        );
        assert!(take_recorded_commands().is_empty());
    }

    #[test]
    fn test_no_extensions_resolves_no_entry_points() {
        let physical = FakeDevice::with_extensions(&[]);
        let (device, support) =
            probe_dynamic_state(&physical, |caps| Ok(FakeDevice::from_capabilities(*caps))).unwrap();

        assert_eq!(support.capabilities.supported().count(), 0);
        for op in DynamicStateOp::ALL {
            assert!(!support.entry_points.is_resolved(op), "{op:?}");
        }
        assert!(support.entry_points.set_cull_mode().is_none());
        assert!(support.entry_points.set_front_face().is_none());
        // 不支持的扩展不会去解析命令
        assert!(device.resolved_names().is_empty());
    }

    #[test]
    fn test_device_creation_error_is_propagated() {
        let physical = FakeDevice::without_extensions();
        let result = probe_dynamic_state::<FakeDevice, _>(&physical, |_| {
            Err(crate::GfxError::Vulkan {
                call: "vkCreateDevice",
                result: ash::vk::Result::ERROR_EXTENSION_NOT_PRESENT,
            })
        });
        assert!(result.is_err());
    }

    fn pipelines_ci() -> crate::pipelines::graphics_pipeline::GfxGraphicsPipelineCreateInfo {
        crate::pipelines::graphics_pipeline::GfxGraphicsPipelineCreateInfo::default()
    }
}
