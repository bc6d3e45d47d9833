use ash::vk;
use serde::{Deserialize, Serialize};

/// 面剔除模式，对应 `VkCullModeFlags` 中常用的三种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}
impl CullMode {
    /// 与 UI 中下拉框的顺序一致
    pub const ALL: [Self; 3] = [Self::None, Self::Front, Self::Back];

    #[inline]
    pub fn to_vk(self) -> vk::CullModeFlags {
        match self {
            Self::None => vk::CullModeFlags::NONE,
            Self::Front => vk::CullModeFlags::FRONT,
            Self::Back => vk::CullModeFlags::BACK,
        }
    }

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 正面的顶点环绕方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontFace {
    /// 按照 OpenGL 的传统，将 CCW 视为 front face
    #[default]
    CounterClockwise,
    Clockwise,
}
impl FrontFace {
    pub const ALL: [Self; 2] = [Self::CounterClockwise, Self::Clockwise];

    #[inline]
    pub fn to_vk(self) -> vk::FrontFace {
        match self {
            Self::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            Self::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }

    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::CounterClockwise => "Counter clockwise",
            Self::Clockwise => "Clockwise",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 可以在运行时调整的状态值
///
/// 由 control surface 修改，每次重建 command buffer 时由 dispatcher 读取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DynamicStateValues {
    #[serde(default)]
    pub cull_mode: CullMode,
    #[serde(default)]
    pub front_face: FrontFace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_static_pipeline_defaults() {
        let values = DynamicStateValues::default();
        assert_eq!(values.cull_mode.to_vk(), vk::CullModeFlags::BACK);
        assert_eq!(values.front_face.to_vk(), vk::FrontFace::COUNTER_CLOCKWISE);
    }

    #[test]
    fn test_index_follows_ui_order() {
        for (idx, mode) in CullMode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), idx);
            assert_eq!(CullMode::from_index(idx), Some(*mode));
        }
        assert_eq!(CullMode::from_index(3), None);

        assert_eq!(FrontFace::from_index(1), Some(FrontFace::Clockwise));
        assert_eq!(FrontFace::from_index(2), None);
    }
}
