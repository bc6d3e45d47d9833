use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ash::vk;

use crate::error::{GfxError, GfxResult, VkResultExt};
use crate::foundation::{debug_messenger::DebugType, device::GfxDevice};

pub struct GfxShaderModule {
    handle: vk::ShaderModule,
    device: Rc<GfxDevice>,
}
impl GfxShaderModule {
    /// # param
    /// * path - spv shader 文件路径
    pub fn new(device: Rc<GfxDevice>, path: &Path) -> GfxResult<Self> {
        let load_err = |source| GfxError::ShaderLoad {
            path: path.display().to_string(),
            source,
        };
        let mut file = std::fs::File::open(path).map_err(load_err)?;
        let shader_code = ash::util::read_spv(&mut file).map_err(load_err)?;

        let shader_module_info = vk::ShaderModuleCreateInfo::default().code(&shader_code);
        let handle =
            unsafe { device.create_shader_module(&shader_module_info, None).vk_call("vkCreateShaderModule")? };
        let shader_module = Self { handle, device };
        shader_module.device.set_debug_name(&shader_module, path.display().to_string());
        Ok(shader_module)
    }

    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }
}
impl Drop for GfxShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}
impl DebugType for GfxShaderModule {
    fn debug_type_name() -> &'static str {
        "GfxShaderModule"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

/// 可以存放多个 ShaderModule，使用路径进行索引
///
/// pipeline 创建完成后即可丢弃
pub struct GfxShaderModuleCache {
    shader_modules: HashMap<PathBuf, GfxShaderModule>,
    device: Rc<GfxDevice>,
}
impl GfxShaderModuleCache {
    pub fn new(device: Rc<GfxDevice>) -> Self {
        Self {
            shader_modules: HashMap::new(),
            device,
        }
    }

    pub fn get_or_load(&mut self, path: &Path) -> GfxResult<&GfxShaderModule> {
        match self.shader_modules.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(GfxShaderModule::new(self.device.clone(), path)?)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GfxShaderStageInfo {
    pub stage: vk::ShaderStageFlags,
    pub entry_point: &'static CStr,
    pub path: PathBuf,
}
impl GfxShaderStageInfo {
    #[inline]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}
