use std::ffi::CStr;
use std::fmt;

use ash::vk;
use itertools::Itertools;

use crate::foundation::capability_query::DeviceExtensionQuery;

/// 需要探测的 dynamic state 扩展，这是一个封闭的列表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicStateExtension {
    /// VK_EXT_extended_dynamic_state：cull mode, front face 等
    ExtendedDynamicState,
    /// VK_EXT_extended_dynamic_state2
    ExtendedDynamicState2,
    /// VK_EXT_extended_dynamic_state3
    ExtendedDynamicState3,
    /// VK_EXT_vertex_input_dynamic_state
    VertexInputDynamicState,
}
impl DynamicStateExtension {
    pub const ALL: [Self; 4] = [
        Self::ExtendedDynamicState,
        Self::ExtendedDynamicState2,
        Self::ExtendedDynamicState3,
        Self::VertexInputDynamicState,
    ];

    #[inline]
    pub fn name(self) -> &'static CStr {
        match self {
            Self::ExtendedDynamicState => ash::ext::extended_dynamic_state::NAME,
            Self::ExtendedDynamicState2 => ash::ext::extended_dynamic_state2::NAME,
            Self::ExtendedDynamicState3 => ash::ext::extended_dynamic_state3::NAME,
            Self::VertexInputDynamicState => ash::ext::vertex_input_dynamic_state::NAME,
        }
    }
}

/// 每个 dynamic state 扩展是否受支持
///
/// 在 device 创建前探测一次，之后不再修改
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DynamicStateCapabilities {
    extended_dynamic_state: bool,
    extended_dynamic_state2: bool,
    extended_dynamic_state3: bool,
    vertex_input_dynamic_state: bool,
}

// 构造
impl DynamicStateCapabilities {
    /// 所有扩展都不支持
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    /// 依次询问每个扩展是否受支持
    pub fn from_fn(mut supports: impl FnMut(DynamicStateExtension) -> bool) -> Self {
        Self {
            extended_dynamic_state: supports(DynamicStateExtension::ExtendedDynamicState),
            extended_dynamic_state2: supports(DynamicStateExtension::ExtendedDynamicState2),
            extended_dynamic_state3: supports(DynamicStateExtension::ExtendedDynamicState3),
            vertex_input_dynamic_state: supports(DynamicStateExtension::VertexInputDynamicState),
        }
    }

    /// 必须在 logical device 创建之前调用，结果决定了 device 需要开启哪些扩展
    ///
    /// 扩展缺失是正常情况，不会返回错误
    pub fn probe(query: &impl DeviceExtensionQuery) -> Self {
        let capabilities = Self::from_fn(|ext| query.supports_device_extension(ext.name()));
        log::info!("dynamic state capabilities: {}", capabilities);
        capabilities
    }
}

// getters
impl DynamicStateCapabilities {
    #[inline]
    pub fn has(&self, ext: DynamicStateExtension) -> bool {
        match ext {
            DynamicStateExtension::ExtendedDynamicState => self.extended_dynamic_state,
            DynamicStateExtension::ExtendedDynamicState2 => self.extended_dynamic_state2,
            DynamicStateExtension::ExtendedDynamicState3 => self.extended_dynamic_state3,
            DynamicStateExtension::VertexInputDynamicState => self.vertex_input_dynamic_state,
        }
    }

    #[inline]
    pub fn has_extended_dynamic_state(&self) -> bool {
        self.extended_dynamic_state
    }

    pub fn supported(&self) -> impl Iterator<Item = DynamicStateExtension> + '_ {
        DynamicStateExtension::ALL.into_iter().filter(|ext| self.has(*ext))
    }
}

// device 创建相关
impl DynamicStateCapabilities {
    /// 需要在 device 创建时开启的扩展
    ///
    /// 只有 extended_dynamic_state 会在录制命令时用到，
    /// 其余扩展仅开启，为之后的功能预留
    pub fn device_extensions(&self) -> Vec<&'static CStr> {
        self.supported().map(DynamicStateExtension::name).collect_vec()
    }

    /// 需要挂到 `VkPhysicalDeviceFeatures2` 上的 feature
    pub fn device_features(&self) -> Vec<Box<dyn vk::ExtendsPhysicalDeviceFeatures2>> {
        let mut features: Vec<Box<dyn vk::ExtendsPhysicalDeviceFeatures2>> = Vec::new();
        if self.extended_dynamic_state {
            features.push(Box::new(
                vk::PhysicalDeviceExtendedDynamicStateFeaturesEXT::default().extended_dynamic_state(true),
            ));
        }
        features
    }
}

impl fmt::Display for DynamicStateCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "extended_dynamic_state={}, extended_dynamic_state2={}, extended_dynamic_state3={}, vertex_input_dynamic_state={}",
            self.extended_dynamic_state,
            self.extended_dynamic_state2,
            self.extended_dynamic_state3,
            self.vertex_input_dynamic_state
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDevice;

    #[test]
    fn test_probe_device_without_extensions() {
        let caps = DynamicStateCapabilities::probe(&FakeDevice::without_extensions());

        assert_eq!(caps, DynamicStateCapabilities::none());
        assert_eq!(caps.supported().count(), 0);
        assert!(caps.device_extensions().is_empty());
        assert!(caps.device_features().is_empty());
    }

    #[test]
    fn test_probe_reports_each_extension_independently() {
        for ext in DynamicStateExtension::ALL {
            let caps = DynamicStateCapabilities::probe(&FakeDevice::with_extensions(&[ext]));

            for other in DynamicStateExtension::ALL {
                assert_eq!(caps.has(other), other == ext, "probing {:?}, checking {:?}", ext, other);
            }
            assert_eq!(caps.device_extensions(), vec![ext.name()]);
        }
    }

    #[test]
    fn test_feature_struct_only_for_extended_dynamic_state() {
        let caps = DynamicStateCapabilities::probe(&FakeDevice::with_extensions(&[
            DynamicStateExtension::ExtendedDynamicState2,
            DynamicStateExtension::VertexInputDynamicState,
        ]));
        assert!(caps.device_features().is_empty());

        let caps = DynamicStateCapabilities::probe(&FakeDevice::with_extensions(&DynamicStateExtension::ALL));
        assert_eq!(caps.device_features().len(), 1);
        assert_eq!(caps.device_extensions().len(), 4);
    }

    #[test]
    fn test_extension_names() {
        assert_eq!(DynamicStateExtension::ExtendedDynamicState.name(), c"VK_EXT_extended_dynamic_state");
        assert_eq!(DynamicStateExtension::VertexInputDynamicState.name(), c"VK_EXT_vertex_input_dynamic_state");
    }
}
