//! dynamic state 示例的应用层
//!
//! [`render_app::HeadlessRenderApp`] 负责 Vulkan 初始化、帧循环以及 command buffer 的重建，
//! 具体的绘制逻辑由实现了 [`outer_app::OuterApp`] 的应用提供。

pub mod config;
pub mod controls;
pub mod frame_settings;
pub mod geometry;
pub mod outer_app;
pub mod render_app;
pub mod session;
