use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
///
/// # 使用示例
/// ```ignore
/// let shader = DynStatePath::shader_path("dynamic_state/cube.vert.spv"); // shader/.build/dynamic_state/cube.vert.spv
/// ```
pub struct DynStatePath {}
impl DynStatePath {
    /// `shader/` 目录：着色器源码
    pub fn shader_src_path() -> PathBuf {
        Self::workspace_path().join("shader")
    }

    /// `shader/.build/` 目录：编译后的 SPIR-V
    pub fn shader_build_path() -> PathBuf {
        Self::shader_src_path().join(".build")
    }

    /// 获取 `shader/.build/` 目录下的着色器路径
    pub fn shader_path(filename: impl AsRef<Path>) -> PathBuf {
        Self::shader_build_path().join(filename)
    }

    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 从 dynstate-crate-tools 到 workspace root
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.parent().unwrap_or(manifest_dir).to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_path_is_under_build_dir() {
        let path = DynStatePath::shader_path("dynamic_state/cube.vert.spv");
        assert!(path.starts_with(DynStatePath::shader_build_path()));
        assert!(path.ends_with("shader/.build/dynamic_state/cube.vert.spv"));
    }

    #[test]
    fn test_workspace_contains_this_crate() {
        assert!(DynStatePath::workspace_path().join("dynstate-crate-tools").is_dir());
    }
}
