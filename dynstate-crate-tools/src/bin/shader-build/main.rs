//! 将 shader 目录下的所有 glsl 文件编译为 spv 文件，输出到 shader/.build 下的同名路径

use std::path::{Path, PathBuf};

use anyhow::Context;
use dynstate_crate_tools::{init_log::init_log, resource::DynStatePath};
use rayon::prelude::*;

/// 一个具体的编译任务
#[derive(Debug)]
struct ShaderCompileTask {
    shader_path: PathBuf,
    output_path: PathBuf,
}

impl ShaderCompileTask {
    /// 只处理 glsl 的 vertex 和 fragment shader
    fn new(shader_path: &Path) -> Option<Self> {
        let shader_name = shader_path.file_name()?.to_str()?;
        if !Self::is_glsl_stage(shader_name) {
            return None;
        }

        // 相对于 shader 的路径
        let relative_path = shader_path.strip_prefix(DynStatePath::shader_src_path()).ok()?;
        let output_path = DynStatePath::shader_build_path().join(format!("{}.spv", relative_path.to_str()?));

        Some(Self {
            shader_path: shader_path.to_path_buf(),
            output_path,
        })
    }

    fn is_glsl_stage(shader_name: &str) -> bool {
        shader_name.ends_with(".vert") || shader_name.ends_with(".frag")
    }

    /// 使用 glslc 编译 glsl 文件
    fn build(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }

        let output = std::process::Command::new("glslc")
            .arg("-g")
            .arg("--target-env=vulkan1.3")
            .arg("-o")
            .arg(&self.output_path)
            .arg(&self.shader_path)
            .output()
            .context("failed to run glslc, is the Vulkan SDK installed?")?;

        if !output.stdout.is_empty() {
            log::info!("stdout: {stdout}", stdout = String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            log::error!("stderr: {stderr}", stderr = String::from_utf8_lossy(&output.stderr));
        }
        anyhow::ensure!(output.status.success(), "glslc failed on {:?}", self.shader_path);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_log(log::LevelFilter::Info);

    log::info!("shader src: {:?}", DynStatePath::shader_src_path());
    log::info!("shader build output: {:?}", DynStatePath::shader_build_path());

    let tasks = walkdir::WalkDir::new(DynStatePath::shader_src_path())
        .into_iter()
        // 跳过编译输出目录
        .filter_entry(|entry| entry.file_name() != ".build")
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| ShaderCompileTask::new(entry.path()))
        .collect::<Vec<_>>();

    tasks
        .par_iter() // 并行化
        .map(|task| {
            log::info!("compile shader: {:?}", task.shader_path);
            task.build()
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    log::info!("compiled {} shaders", tasks.len());
    Ok(())
}
