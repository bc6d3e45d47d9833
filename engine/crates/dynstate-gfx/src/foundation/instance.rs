use std::ffi::{CStr, CString};

use ash::vk;
use itertools::Itertools;

use crate::error::{GfxError, GfxResult, VkResultExt};
use crate::foundation::debug_messenger::GfxDebugMsger;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

pub struct GfxInstance {
    /// 仅仅是函数指针，以及一个裸的 handle，可以随意 clone
    ///
    /// 不需要考虑生命周期的问题，生命周期现在是由手动控制的
    pub(crate) ash_instance: ash::Instance,
}

impl GfxInstance {
    /// 设置所需的 layers 和 extensions，创建 vk instance
    pub fn new(
        vk_entry: &ash::Entry,
        app_name: &str,
        engine_name: &str,
        enable_validation: bool,
    ) -> GfxResult<Self> {
        // 名称里面不会出现 \0，出现时直接截断即可
        let app_name = CString::new(app_name.replace('\0', "")).unwrap_or_default();
        let engine_name = CString::new(engine_name.replace('\0', "")).unwrap_or_default();
        let app_info = vk::ApplicationInfo::default()
            .api_version(vk::API_VERSION_1_3) // 版本过低时，有些函数无法正确加载
            .application_name(app_name.as_c_str())
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(engine_name.as_c_str())
            .engine_version(vk::make_api_version(0, 1, 0, 0));

        let enabled_extensions = Self::get_extensions(vk_entry)?;
        log::info!("instance extensions: {}", Self::join_names(&enabled_extensions));

        let enabled_layers = Self::get_layers(vk_entry, enable_validation)?;
        log::info!("instance layers: {}", Self::join_names(&enabled_layers));

        let enabled_extensions = enabled_extensions.iter().map(|ext| ext.as_ptr()).collect_vec();
        let enabled_layers = enabled_layers.iter().map(|layer| layer.as_ptr()).collect_vec();

        // 为 instance info 添加 debug messenger，用于捕获 instance 创建过程中的消息
        let mut debug_utils_messenger_ci = GfxDebugMsger::debug_utils_messenger_ci();
        let instance_ci = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&enabled_extensions)
            .enabled_layer_names(&enabled_layers)
            .push_next(&mut debug_utils_messenger_ci);

        let handle = unsafe { vk_entry.create_instance(&instance_ci, None).vk_call("vkCreateInstance")? };

        Ok(Self { ash_instance: handle })
    }
}
impl Drop for GfxInstance {
    fn drop(&mut self) {
        log::info!("Destroying GfxInstance");
        unsafe {
            self.ash_instance.destroy_instance(None);
        }
    }
}

// getter
impl GfxInstance {
    #[inline]
    pub fn ash_instance(&self) -> &ash::Instance {
        &self.ash_instance
    }

    #[inline]
    pub fn vk_instance(&self) -> vk::Instance {
        self.ash_instance.handle()
    }
}

// 构造过程
impl GfxInstance {
    /// instance 所需的，且受支持的 extension
    fn get_extensions(vk_entry: &ash::Entry) -> GfxResult<Vec<&'static CStr>> {
        let all_ext_props = unsafe {
            vk_entry.enumerate_instance_extension_properties(None).vk_call("vkEnumerateInstanceExtensionProperties")?
        };

        Self::basic_instance_exts()
            .into_iter()
            .map(|ext| {
                let supported =
                    all_ext_props.iter().any(|props| props.extension_name_as_c_str().is_ok_and(|name| name == ext));
                if supported {
                    Ok(ext)
                } else {
                    Err(GfxError::MissingInstanceSupport {
                        kind: "extension",
                        name: ext.to_string_lossy().into_owned(),
                    })
                }
            })
            .collect()
    }

    /// instance 所需的 layers
    ///
    /// validation layer 是可选的，不支持时只打印警告
    fn get_layers(vk_entry: &ash::Entry, enable_validation: bool) -> GfxResult<Vec<&'static CStr>> {
        if !enable_validation {
            return Ok(Vec::new());
        }

        let all_layer_props =
            unsafe { vk_entry.enumerate_instance_layer_properties().vk_call("vkEnumerateInstanceLayerProperties")? };
        let supported = all_layer_props
            .iter()
            .any(|props| props.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER));
        if supported {
            Ok(vec![VALIDATION_LAYER])
        } else {
            log::warn!("validation requested, but {:?} is not installed", VALIDATION_LAYER);
            Ok(Vec::new())
        }
    }

    /// 必须要开启的 instance extensions
    fn basic_instance_exts() -> Vec<&'static CStr> {
        vec![
            // 这个 extension 可以单独使用，提供以下功能：
            // 1. debug messenger
            // 2. 为 vulkan object 设置 debug name
            // 3. 使用 label 标记 queue 或者 command buffer 中的一个一个 section
            vk::EXT_DEBUG_UTILS_NAME,
        ]
    }

    fn join_names(names: &[&CStr]) -> String {
        names.iter().map(|name| format!("\n\t{:?}", name)).join("")
    }
}

