//! Vulkan GFX 抽象层
//!
//! 提供对 Vulkan API 的轻量封装：instance、device、命令缓冲、管线以及离屏渲染目标。
//!
//! 核心是 [`dynamic_state`] 模块：在 device 创建前探测 dynamic state 相关的扩展，
//! 在 device 创建后解析扩展命令的函数指针，并在录制命令时根据函数指针是否存在
//! 决定是动态设置状态，还是依赖 pipeline 中烘焙的静态状态。
//!
//! 所有 Vulkan 对象通过 `Rc<GfxDevice>` 共享设备，仅适用于单线程环境。

pub mod basic;
pub mod commands;
pub mod dynamic_state;
pub mod error;
pub mod foundation;
pub mod gfx_core;
pub mod pipelines;
pub mod resources;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{GfxError, GfxResult};
