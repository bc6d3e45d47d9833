use std::ffi::CStr;

use ash::vk;
use itertools::Itertools;

use crate::commands::command_queue::GfxQueueFamily;
use crate::error::{GfxError, GfxResult, VkResultExt};
use crate::foundation::capability_query::DeviceExtensionQuery;
use crate::foundation::debug_messenger::DebugType;

/// 表示一张物理显卡
pub struct GfxPhysicalDevice {
    pub(crate) vk_handle: vk::PhysicalDevice,

    /// 当前 gpu 的基础属性
    pub(crate) basic_props: vk::PhysicalDeviceProperties,

    /// 当前 gpu 支持的 device extensions
    ///
    /// 在创建时枚举一次，之后的扩展查询都基于这份列表
    pub(crate) device_extensions: Vec<vk::ExtensionProperties>,

    pub(crate) gfx_queue_family: GfxQueueFamily,
}

impl GfxPhysicalDevice {
    /// 优先选择独立显卡，如果没有则选择第一个可用的显卡
    ///
    /// 可用：至少有一个同时支持 graphics 和 transfer 的 queue family
    pub fn new_descrete_physical_device(instance: &ash::Instance) -> GfxResult<Self> {
        let pdevices = unsafe { instance.enumerate_physical_devices().vk_call("vkEnumeratePhysicalDevices")? };

        Self::select(pdevices.iter().map(|pdevice| GfxPhysicalDevice::new(*pdevice, instance)))
    }

    /// 查询失败的 gpu 只打印警告并跳过，不影响其他 gpu 的选择
    fn select(candidates: impl IntoIterator<Item = GfxResult<Option<Self>>>) -> GfxResult<Self> {
        candidates
            .into_iter()
            .filter_map(|candidate| match candidate {
                Ok(pdevice) => pdevice,
                Err(err) => {
                    log::warn!("gpu skipped: {}", err);
                    None
                }
            })
            // 优先使用独立显卡
            .find_or_first(GfxPhysicalDevice::is_descrete_gpu)
            .ok_or(GfxError::NoSuitablePhysicalDevice)
    }

    /// 没有合适的 queue family 时返回 `None`
    fn new(pdevice: vk::PhysicalDevice, instance: &ash::Instance) -> GfxResult<Option<Self>> {
        let basic_props = unsafe { instance.get_physical_device_properties(pdevice) };
        let physical_device_name = basic_props.device_name_as_c_str().unwrap_or(c"<unknown>");
        log::info!("found gpu: {:?}", physical_device_name);

        // 扩展列表是能力探测的基础，枚举失败时放弃这张显卡
        let device_extensions = unsafe {
            instance
                .enumerate_device_extension_properties(pdevice)
                .vk_call("vkEnumerateDeviceExtensionProperties")?
        };
        log::debug!(
            "physical device supports extensions: {}",
            device_extensions
                .iter()
                .filter_map(|ext| ext.extension_name_as_c_str().ok())
                .map(|name| name.to_string_lossy())
                .join("\n")
        );

        let queue_family_props = unsafe { instance.get_physical_device_queue_family_properties(pdevice) };
        log::debug!("physical device: queue family props:\n{:#?}", queue_family_props);

        // 全能的 Queue：graphics, transfer
        let Some(gfx_queue_family) = Self::find_queue_family(
            &queue_family_props,
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            vk::QueueFlags::empty(),
        ) else {
            log::warn!("gpu {:?} has no graphics queue, skipped", physical_device_name);
            return Ok(None);
        };

        Ok(Some(Self {
            vk_handle: pdevice,
            basic_props,
            device_extensions,
            gfx_queue_family,
        }))
    }

    /// 找到包含 `include_flags` 中所有能力，且不包含 `exclude_flags` 的 queue family
    pub(crate) fn find_queue_family(
        queue_family_props: &[vk::QueueFamilyProperties],
        include_flags: vk::QueueFlags,
        exclude_flags: vk::QueueFlags,
    ) -> Option<GfxQueueFamily> {
        queue_family_props
            .iter()
            .enumerate()
            .find(|(_, props)| {
                props.queue_flags.contains(include_flags) && (props.queue_flags & exclude_flags).is_empty()
            })
            .map(|(family_idx, props)| GfxQueueFamily {
                queue_family_index: family_idx as u32,
                queue_flags: props.queue_flags,
            })
    }
}

// getter
impl GfxPhysicalDevice {
    #[inline]
    pub fn vk_handle(&self) -> vk::PhysicalDevice {
        self.vk_handle
    }

    #[inline]
    pub fn gfx_queue_family(&self) -> &GfxQueueFamily {
        &self.gfx_queue_family
    }

    /// 当前 gpu 是否是独立显卡
    #[inline]
    pub fn is_descrete_gpu(&self) -> bool {
        self.basic_props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }
}

impl DeviceExtensionQuery for GfxPhysicalDevice {
    fn supports_device_extension(&self, name: &CStr) -> bool {
        self.device_extensions.iter().any(|ext| ext.extension_name_as_c_str().is_ok_and(|ext_name| ext_name == name))
    }
}

impl DebugType for GfxPhysicalDevice {
    fn debug_type_name() -> &'static str {
        "GfxPhysicalDevice"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_find_queue_family_requires_all_flags() {
        let props = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        ];

        let gfx = GfxPhysicalDevice::find_queue_family(
            &props,
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            vk::QueueFlags::empty(),
        )
        .unwrap();
        assert_eq!(gfx.queue_family_index, 2);
    }

    #[test]
    fn test_find_queue_family_respects_exclude_flags() {
        let props = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        ];

        let compute = GfxPhysicalDevice::find_queue_family(
            &props,
            vk::QueueFlags::COMPUTE,
            vk::QueueFlags::GRAPHICS,
        )
        .unwrap();
        assert_eq!(compute.queue_family_index, 1);

        assert!(
            GfxPhysicalDevice::find_queue_family(&props[1..], vk::QueueFlags::GRAPHICS, vk::QueueFlags::empty())
                .is_none()
        );
    }

    fn gpu(raw: u64, device_type: vk::PhysicalDeviceType) -> GfxPhysicalDevice {
        GfxPhysicalDevice {
            vk_handle: vk::Handle::from_raw(raw),
            basic_props: vk::PhysicalDeviceProperties {
                device_type,
                ..Default::default()
            },
            device_extensions: vec![],
            gfx_queue_family: GfxQueueFamily {
                queue_family_index: 0,
                queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            },
        }
    }

    fn enumerate_failed() -> GfxResult<Option<GfxPhysicalDevice>> {
        Err(GfxError::Vulkan {
            call: "vkEnumerateDeviceExtensionProperties",
            result: vk::Result::ERROR_INITIALIZATION_FAILED,
        })
    }

    #[test]
    fn test_select_skips_gpu_that_failed_to_enumerate() {
        let selected = GfxPhysicalDevice::select([
            enumerate_failed(),
            Ok(None),
            Ok(Some(gpu(3, vk::PhysicalDeviceType::INTEGRATED_GPU))),
        ])
        .unwrap();
        assert_eq!(vk::Handle::as_raw(selected.vk_handle()), 3);
    }

    #[test]
    fn test_select_prefers_discrete_gpu() {
        let selected = GfxPhysicalDevice::select([
            Ok(Some(gpu(1, vk::PhysicalDeviceType::INTEGRATED_GPU))),
            enumerate_failed(),
            Ok(Some(gpu(2, vk::PhysicalDeviceType::DISCRETE_GPU))),
        ])
        .unwrap();
        assert!(selected.is_descrete_gpu());
        assert_eq!(vk::Handle::as_raw(selected.vk_handle()), 2);
    }

    #[test]
    fn test_select_without_usable_gpu() {
        let result = GfxPhysicalDevice::select([enumerate_failed(), Ok(None)]);
        assert!(matches!(result, Err(GfxError::NoSuitablePhysicalDevice)));
    }
}
