use ash::vk;

use crate::dynamic_state::aspects::DynamicAspect;

/// GFX 层的错误
///
/// 除了 [`GfxError::UnresolvedDynamicAspect`] 属于配置错误，其余都来自 Vulkan 本身，
/// 均视为不可恢复，直接向上传递，不做重试。
#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    #[error("failed to load the Vulkan loader: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("{call} failed: {result}")]
    Vulkan { call: &'static str, result: vk::Result },

    #[error("required instance {kind} `{name}` is not supported")]
    MissingInstanceSupport { kind: &'static str, name: String },

    #[error("no physical device with a graphics queue was found")]
    NoSuitablePhysicalDevice,

    #[error("failed to read shader `{path}`: {source}")]
    ShaderLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline declares {0:?} as dynamic state, but no entry point was resolved for it")]
    UnresolvedDynamicAspect(DynamicAspect),
}

pub type GfxResult<T> = Result<T, GfxError>;

/// 为 Vulkan 调用的结果附加调用名称
pub trait VkResultExt<T> {
    fn vk_call(self, call: &'static str) -> GfxResult<T>;
}
impl<T> VkResultExt<T> for Result<T, vk::Result> {
    #[inline]
    fn vk_call(self, call: &'static str) -> GfxResult<T> {
        self.map_err(|result| GfxError::Vulkan { call, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulkan_error_names_the_failing_call() {
        let result: Result<(), vk::Result> = Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        let err = result.vk_call("vkCreateGraphicsPipelines").unwrap_err();

        let msg = err.to_string();
        assert!(msg.starts_with("vkCreateGraphicsPipelines failed"), "{msg}");
    }

    #[test]
    fn test_unresolved_aspect_message() {
        let err = GfxError::UnresolvedDynamicAspect(DynamicAspect::CullMode);
        assert!(err.to_string().contains("CullMode"));
    }
}
