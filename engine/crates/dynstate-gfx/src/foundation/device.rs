use std::ffi::{CStr, CString};
use std::ops::Deref;

use ash::vk;
use itertools::Itertools;

use crate::error::{GfxResult, VkResultExt};
use crate::foundation::capability_query::DeviceProcResolver;
use crate::foundation::debug_messenger::DebugType;

/// Vulkan 逻辑设备封装
///
/// 包含核心设备 API 以及常用扩展的函数指针（动态渲染、调试工具）。
/// dynamic state 相关的扩展命令是可选的，不放在这里，
/// 而是通过 [`DeviceProcResolver`] 按需解析，见 `dynamic_state::entry_points`。
///
/// 通过 `Rc<GfxDevice>` 在各个对象之间共享，最后一个引用释放时销毁 device。
pub struct GfxDevice {
    /// 核心 Vulkan 设备 API
    pub(crate) device: ash::Device,
    /// 用于 vkGetDeviceProcAddr
    pub(crate) instance: ash::Instance,
    /// 动态渲染扩展 API
    pub(crate) dynamic_rendering: ash::khr::dynamic_rendering::Device,
    /// 调试工具扩展 API
    pub(crate) debug_utils: ash::ext::debug_utils::Device,
}

// 构造与销毁
impl GfxDevice {
    /// # param
    /// * `extra_exts` - 在基础扩展之外需要开启的扩展，例如探测到的 dynamic state 扩展
    /// * `extra_features` - 需要挂到 `VkPhysicalDeviceFeatures2` 上的扩展 feature
    pub fn new(
        instance: &ash::Instance,
        pdevice: vk::PhysicalDevice,
        queue_create_info: &[vk::DeviceQueueCreateInfo],
        extra_exts: &[&'static CStr],
        extra_features: Vec<Box<dyn vk::ExtendsPhysicalDeviceFeatures2>>,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxDevice::new");

        // device 所需的所有 extension
        let device_exts = Self::basic_device_exts().into_iter().chain(extra_exts.iter().copied()).unique().collect_vec();
        log::info!("device exts: {}", device_exts.iter().map(|ext| format!("\n\t{:?}", ext)).join(""));
        let device_ext_ptrs = device_exts.iter().map(|ext| ext.as_ptr()).collect_vec();

        // device 所需的所有 features
        let mut all_features = vk::PhysicalDeviceFeatures2::default().features(Self::physical_device_basic_features());
        let mut physical_device_ext_features = Self::physical_device_extra_features();
        physical_device_ext_features.extend(extra_features);
        unsafe {
            // 将所有的 feature 串到 all_features 的 p_next 链上
            physical_device_ext_features.iter_mut().for_each(|f| {
                let ptr = <*mut dyn vk::ExtendsPhysicalDeviceFeatures2>::cast::<vk::BaseOutStructure>(f.as_mut());
                (*ptr).p_next = all_features.p_next as _;
                all_features.p_next = ptr as _;
            });
        }

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(queue_create_info)
            .enabled_extension_names(&device_ext_ptrs)
            .push_next(&mut all_features);

        let device =
            unsafe { instance.create_device(pdevice, &device_create_info, None).vk_call("vkCreateDevice")? };

        let vk_dynamic_render_pf = ash::khr::dynamic_rendering::Device::new(instance, &device);
        let vk_debug_utils_device = ash::ext::debug_utils::Device::new(instance, &device);

        Ok(Self {
            device,
            instance: instance.clone(),
            dynamic_rendering: vk_dynamic_render_pf,
            debug_utils: vk_debug_utils_device,
        })
    }
}

// 创建过程的辅助函数
impl GfxDevice {
    /// 必要的 physical device core features
    fn physical_device_basic_features() -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default()
    }

    /// 必要的 physical device extension features
    fn physical_device_extra_features() -> Vec<Box<dyn vk::ExtendsPhysicalDeviceFeatures2>> {
        vec![Box::new(vk::PhysicalDeviceDynamicRenderingFeatures::default().dynamic_rendering(true))]
    }

    /// 必要的 device extensions
    fn basic_device_exts() -> Vec<&'static CStr> {
        vec![
            // 已经提升到 core-1.3.0，但仍然通过扩展的方式加载函数
            ash::khr::dynamic_rendering::NAME,
        ]
    }
}

// getters
impl GfxDevice {
    #[inline]
    pub fn vk_handle(&self) -> vk::Device {
        self.device.handle()
    }
}

// tools
impl GfxDevice {
    #[inline]
    pub fn set_object_debug_name<T: vk::Handle + Copy>(&self, handle: T, name: impl AsRef<str>) {
        let Ok(name) = CString::new(name.as_ref()) else {
            return;
        };
        unsafe {
            // debug name 只是辅助信息，失败时不影响运行
            let _ = self.debug_utils.set_debug_utils_object_name(
                &vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle),
            );
        }
    }

    pub fn set_debug_name<T: DebugType>(&self, handle: &T, name: impl AsRef<str>) {
        let debug_name = format!("{}::{}", T::debug_type_name(), name.as_ref());
        let Ok(debug_name) = CString::new(debug_name) else {
            return;
        };
        unsafe {
            let _ = self.debug_utils.set_debug_utils_object_name(
                &vk::DebugUtilsObjectNameInfoEXT::default()
                    .object_name(debug_name.as_c_str())
                    .object_handle(handle.vk_handle()),
            );
        }
    }

    #[inline]
    pub fn wait_idle(&self) -> GfxResult<()> {
        unsafe { self.device.device_wait_idle().vk_call("vkDeviceWaitIdle") }
    }
}

impl DeviceProcResolver for GfxDevice {
    fn device_proc_addr(&self, name: &CStr) -> vk::PFN_vkVoidFunction {
        unsafe { self.instance.get_device_proc_addr(self.device.handle(), name.as_ptr()) }
    }
}

impl Deref for GfxDevice {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}
impl Drop for GfxDevice {
    fn drop(&mut self) {
        log::info!("destroying device");
        unsafe {
            self.device.destroy_device(None);
        }
    }
}
impl DebugType for GfxDevice {
    fn debug_type_name() -> &'static str {
        "GfxDevice"
    }
    fn vk_handle(&self) -> impl vk::Handle {
        self.device.handle()
    }
}
