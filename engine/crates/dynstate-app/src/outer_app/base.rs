use dynstate_gfx::commands::command_buffer::GfxCommandBuffer;
use dynstate_gfx::gfx_core::GfxCore;
use dynstate_gfx::pipelines::rendering_info::GfxRenderingInfo;

use crate::frame_settings::FrameSettings;
use crate::session::DynamicStateSession;

/// 外部应用接口 trait
///
/// 定义应用生命周期的关键钩子函数，由 [`HeadlessRenderApp`](crate::render_app::HeadlessRenderApp) 调用。
/// session 作为参数显式传入，应用本身不持有全局状态。
pub trait OuterApp {
    /// 创建 pipeline 等资源，在 session 创建之后调用一次
    fn init(
        &mut self,
        gfx_core: &GfxCore,
        session: &DynamicStateSession,
        frame_settings: &FrameSettings,
    ) -> anyhow::Result<()>;

    /// 绘制 GUI
    fn draw_ui(&mut self, ui: &imgui::Ui, session: &mut DynamicStateSession);

    /// 每帧更新逻辑（可选）
    fn update(&mut self, _session: &mut DynamicStateSession, _frame_index: u64) {}

    /// 录制一个 command buffer，只在需要重建时调用
    fn draw(
        &self,
        cmd: &GfxCommandBuffer,
        rendering_info: &GfxRenderingInfo,
        session: &DynamicStateSession,
        frame_settings: &FrameSettings,
    );

    /// 在 GfxCore 销毁之前释放所有资源
    fn destroy(&mut self);
}
