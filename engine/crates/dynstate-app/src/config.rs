use std::path::{Path, PathBuf};

use anyhow::Context;
use ash::vk;
use dynstate_crate_tools::{init_log, resource::DynStatePath};
use dynstate_gfx::dynamic_state::{CullMode, DynamicStateValues, FrontFace};
use serde::{Deserialize, Serialize};

/// 在指定帧修改控制面板的值，用于在没有窗口的情况下模拟 UI 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    pub frame: u64,
    #[serde(default)]
    pub cull_mode: Option<CullMode>,
    #[serde(default)]
    pub front_face: Option<FrontFace>,
}

/// 启动配置，从 toml 文件读取
///
/// ```toml
/// app_name = "dynamic-state"
/// log_level = "info"
/// render_extent = [1280, 720]
/// frames_in_flight = 3
/// frame_count = 120
/// cull_mode = "back"
/// front_face = "counter_clockwise"
///
/// [[script]]
/// frame = 30
/// cull_mode = "front"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicStateAppConfig {
    pub app_name: String,
    pub log_level: String,
    pub render_extent: [u32; 2],
    pub frames_in_flight: usize,
    /// 渲染多少帧后退出
    pub frame_count: u64,
    /// 编译后的 spv 所在目录；为空时使用 `shader/.build/dynamic_state`
    pub shader_dir: Option<PathBuf>,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    /// 为空时，debug 构建开启 validation layer
    pub enable_validation: Option<bool>,
    pub script: Vec<ScriptStep>,
}

impl Default for DynamicStateAppConfig {
    fn default() -> Self {
        Self {
            app_name: "dynamic-state".to_string(),
            log_level: "info".to_string(),
            render_extent: [1280, 720],
            frames_in_flight: 3,
            frame_count: 120,
            shader_dir: None,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            enable_validation: None,
            script: vec![],
        }
    }
}

// 加载
impl DynamicStateAppConfig {
    /// 没有路径时使用默认配置
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {:?}", path))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.render_extent[0] > 0 && self.render_extent[1] > 0,
            "render_extent must be non-zero, got {:?}",
            self.render_extent
        );
        anyhow::ensure!(self.frames_in_flight > 0, "frames_in_flight must be at least 1");
        anyhow::ensure!(
            init_log::parse_level(&self.log_level).is_some(),
            "unknown log_level `{}`",
            self.log_level
        );
        Ok(())
    }
}

// getters
impl DynamicStateAppConfig {
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.render_extent[0],
            height: self.render_extent[1],
        }
    }

    #[inline]
    pub fn log_level(&self) -> log::LevelFilter {
        init_log::parse_level(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }

    #[inline]
    pub fn initial_values(&self) -> DynamicStateValues {
        DynamicStateValues {
            cull_mode: self.cull_mode,
            front_face: self.front_face,
        }
    }

    #[inline]
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }

    pub fn shader_dir(&self) -> PathBuf {
        self.shader_dir.clone().unwrap_or_else(|| DynStatePath::shader_path("dynamic_state"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DynamicStateAppConfig::from_toml_str("").unwrap();
        assert_eq!(config, DynamicStateAppConfig::default());
        assert_eq!(config.initial_values(), DynamicStateValues::default());
        assert_eq!(config.extent(), vk::Extent2D { width: 1280, height: 720 });
    }

    #[test]
    fn test_full_config() {
        let config = DynamicStateAppConfig::from_toml_str(
            r#"
            app_name = "cull-test"
            log_level = "debug"
            render_extent = [640, 480]
            frames_in_flight = 2
            frame_count = 10
            shader_dir = "out/shaders"
            cull_mode = "none"
            front_face = "clockwise"
            enable_validation = false

            [[script]]
            frame = 3
            cull_mode = "front"

            [[script]]
            frame = 5
            front_face = "counter_clockwise"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level(), log::LevelFilter::Debug);
        assert_eq!(config.shader_dir(), PathBuf::from("out/shaders"));
        assert!(!config.validation_enabled());
        assert_eq!(
            config.initial_values(),
            DynamicStateValues {
                cull_mode: CullMode::None,
                front_face: FrontFace::Clockwise,
            }
        );
        assert_eq!(
            config.script,
            vec![
                ScriptStep {
                    frame: 3,
                    cull_mode: Some(CullMode::Front),
                    front_face: None,
                },
                ScriptStep {
                    frame: 5,
                    cull_mode: None,
                    front_face: Some(FrontFace::CounterClockwise),
                },
            ]
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(DynamicStateAppConfig::from_toml_str("cull_mode = \"sideways\"").is_err());
        assert!(DynamicStateAppConfig::from_toml_str("render_extent = [0, 720]").is_err());
        assert!(DynamicStateAppConfig::from_toml_str("frames_in_flight = 0").is_err());
        assert!(DynamicStateAppConfig::from_toml_str("log_level = \"loud\"").is_err());
        assert!(DynamicStateAppConfig::from_toml_str("unknown_key = 1").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = DynamicStateAppConfig::load(Some(Path::new("/nonexistent/dynstate.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
        assert_eq!(DynamicStateAppConfig::load(None).unwrap(), DynamicStateAppConfig::default());
    }
}
