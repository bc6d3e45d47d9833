//! 由外部（Vulkan 或测试替身）提供的两类查询能力
//!
//! - 扩展查询：在 logical device 创建之前，询问 physical device 是否支持某个扩展
//! - 入口解析：在 logical device 创建之后，根据命令名称解析函数指针

use std::ffi::CStr;

use ash::vk;

/// 查询 physical device 是否声明支持某个 device extension
pub trait DeviceExtensionQuery {
    fn supports_device_extension(&self, name: &CStr) -> bool;
}

/// 根据命令名称解析 device 级别的函数指针
///
/// 无法解析时返回 `None`，这是合法的结果，调用方需要自行判断
pub trait DeviceProcResolver {
    fn device_proc_addr(&self, name: &CStr) -> vk::PFN_vkVoidFunction;
}

impl<T: DeviceProcResolver + ?Sized> DeviceProcResolver for std::rc::Rc<T> {
    #[inline]
    fn device_proc_addr(&self, name: &CStr) -> vk::PFN_vkVoidFunction {
        (**self).device_proc_addr(name)
    }
}
