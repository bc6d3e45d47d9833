use std::ffi::CStr;
use std::fmt;

use ash::vk;

use crate::dynamic_state::capabilities::{DynamicStateCapabilities, DynamicStateExtension};
use crate::foundation::capability_query::DeviceProcResolver;

/// 需要在运行时解析的扩展命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicStateOp {
    SetCullMode,
    SetFrontFace,
}
impl DynamicStateOp {
    pub const ALL: [Self; 2] = [Self::SetCullMode, Self::SetFrontFace];

    /// 用于 vkGetDeviceProcAddr 的命令名称
    #[inline]
    pub fn command_name(self) -> &'static CStr {
        match self {
            Self::SetCullMode => c"vkCmdSetCullModeEXT",
            Self::SetFrontFace => c"vkCmdSetFrontFaceEXT",
        }
    }

    /// 提供该命令的扩展
    #[inline]
    pub fn extension(self) -> DynamicStateExtension {
        match self {
            Self::SetCullMode | Self::SetFrontFace => DynamicStateExtension::ExtendedDynamicState,
        }
    }
}

/// 扩展命令的函数指针表
///
/// 每一项要么是解析得到的函数指针，要么是 `None`。
/// `None` 意味着对应的状态只能烘焙到 pipeline 中。
#[derive(Clone, Copy, Default)]
pub struct DynamicStateEntryPoints {
    set_cull_mode: Option<vk::PFN_vkCmdSetCullMode>,
    set_front_face: Option<vk::PFN_vkCmdSetFrontFace>,
}

impl DynamicStateEntryPoints {
    /// 所有命令都不可用
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    /// 必须在 logical device 创建之后调用
    ///
    /// 只有当提供命令的扩展受支持时才会去解析，否则保持 `None`。
    /// 扩展受支持但解析失败时，同样保持 `None`，并输出警告。
    pub fn resolve(capabilities: &DynamicStateCapabilities, resolver: &impl DeviceProcResolver) -> Self {
        let mut entry_points = Self::none();
        for op in DynamicStateOp::ALL {
            if !capabilities.has(op.extension()) {
                continue;
            }

            let Some(raw) = resolver.device_proc_addr(op.command_name()) else {
                log::warn!("{:?} is supported, but {:?} could not be resolved", op.extension(), op.command_name());
                continue;
            };

            // SAFETY: 函数指针由 vkGetDeviceProcAddr 按名称返回，签名与对应的 PFN 一致
            unsafe {
                match op {
                    DynamicStateOp::SetCullMode => {
                        entry_points.set_cull_mode =
                            Some(std::mem::transmute::<unsafe extern "system" fn(), vk::PFN_vkCmdSetCullMode>(raw));
                    }
                    DynamicStateOp::SetFrontFace => {
                        entry_points.set_front_face =
                            Some(std::mem::transmute::<unsafe extern "system" fn(), vk::PFN_vkCmdSetFrontFace>(raw));
                    }
                }
            }
        }

        log::info!("dynamic state entry points: {:?}", entry_points);
        entry_points
    }
}

// getters
impl DynamicStateEntryPoints {
    #[inline]
    pub fn is_resolved(&self, op: DynamicStateOp) -> bool {
        match op {
            DynamicStateOp::SetCullMode => self.set_cull_mode.is_some(),
            DynamicStateOp::SetFrontFace => self.set_front_face.is_some(),
        }
    }

    #[inline]
    pub fn set_cull_mode(&self) -> Option<vk::PFN_vkCmdSetCullMode> {
        self.set_cull_mode
    }

    #[inline]
    pub fn set_front_face(&self) -> Option<vk::PFN_vkCmdSetFrontFace> {
        self.set_front_face
    }
}

impl fmt::Debug for DynamicStateEntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicStateEntryPoints")
            .field("set_cull_mode", &self.set_cull_mode.is_some())
            .field("set_front_face", &self.set_front_face.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDevice;

    #[test]
    fn test_resolved_when_extension_supported() {
        let device = FakeDevice::with_extensions(&[DynamicStateExtension::ExtendedDynamicState]);
        let caps = DynamicStateCapabilities::probe(&device);
        let entry_points = DynamicStateEntryPoints::resolve(&caps, &device);

        assert!(entry_points.is_resolved(DynamicStateOp::SetCullMode));
        assert!(entry_points.is_resolved(DynamicStateOp::SetFrontFace));
        assert_eq!(
            device.resolved_names(),
            vec![c"vkCmdSetCullModeEXT".to_owned(), c"vkCmdSetFrontFaceEXT".to_owned()]
        );
    }

    #[test]
    fn test_not_resolved_without_extension() {
        // 其他扩展不影响这两个命令
        let device = FakeDevice::with_extensions(&[
            DynamicStateExtension::ExtendedDynamicState2,
            DynamicStateExtension::ExtendedDynamicState3,
            DynamicStateExtension::VertexInputDynamicState,
        ]);
        let caps = DynamicStateCapabilities::probe(&device);
        let entry_points = DynamicStateEntryPoints::resolve(&caps, &device);

        for op in DynamicStateOp::ALL {
            assert!(!entry_points.is_resolved(op));
        }
        assert!(device.resolved_names().is_empty(), "must not query entry points of unsupported extensions");
    }

    #[test]
    fn test_supported_but_unresolvable_stays_none() {
        let device = FakeDevice::with_extensions(&[DynamicStateExtension::ExtendedDynamicState]).without_entry_points();
        let caps = DynamicStateCapabilities::probe(&device);
        let entry_points = DynamicStateEntryPoints::resolve(&caps, &device);

        assert!(caps.has_extended_dynamic_state());
        assert!(!entry_points.is_resolved(DynamicStateOp::SetCullMode));
        assert!(!entry_points.is_resolved(DynamicStateOp::SetFrontFace));
    }

    #[test]
    fn test_debug_output_hides_pointers() {
        let text = format!("{:?}", DynamicStateEntryPoints::none());
        assert_eq!(text, "DynamicStateEntryPoints { set_cull_mode: false, set_front_face: false }");
    }
}
