use std::path::PathBuf;

use anyhow::Context;
use dynstate_gfx::commands::command_buffer::GfxCommandBuffer;
use dynstate_gfx::dynamic_state::DynamicAspect;
use dynstate_gfx::gfx_core::GfxCore;
use dynstate_gfx::pipelines::rendering_info::GfxRenderingInfo;

use crate::controls::DynamicStateControls;
use crate::frame_settings::FrameSettings;
use crate::geometry::ProceduralCube;
use crate::outer_app::OuterApp;
use crate::outer_app::dynamic_state::dynamic_state_pass::{CubePushConstants, DynamicStatePass, record_scene};
use crate::session::DynamicStateSession;

/// 绘制一个立方体，cull mode 与 front face 可以通过控制面板调整
pub struct DynamicStateApp {
    shader_dir: PathBuf,
    cube: ProceduralCube,
    /// 立方体绕 y 轴的旋转角度
    rotation_deg: f32,
    pass: Option<DynamicStatePass>,
}

impl DynamicStateApp {
    pub fn new(shader_dir: PathBuf) -> Self {
        Self {
            shader_dir,
            cube: ProceduralCube,
            rotation_deg: 30.0,
            pass: None,
        }
    }
}

impl OuterApp for DynamicStateApp {
    fn init(
        &mut self,
        gfx_core: &GfxCore,
        session: &DynamicStateSession,
        frame_settings: &FrameSettings,
    ) -> anyhow::Result<()> {
        log::info!("dynamic state app init, shader dir: {:?}", self.shader_dir);

        let pass = DynamicStatePass::new(gfx_core.device().clone(), session, frame_settings, &self.shader_dir)
            .context("failed to create the dynamic state pipeline")?;
        if !pass.pipeline().is_dynamic(DynamicAspect::CullMode) {
            log::warn!(
                "cull mode is baked into the pipeline as {:?}, UI changes will have no effect",
                pass.pipeline().static_defaults().cull_mode
            );
        }
        self.pass = Some(pass);
        Ok(())
    }

    fn draw_ui(&mut self, ui: &imgui::Ui, session: &mut DynamicStateSession) {
        DynamicStateControls::new(session).draw_ui(ui);
    }

    fn draw(
        &self,
        cmd: &GfxCommandBuffer,
        rendering_info: &GfxRenderingInfo,
        session: &DynamicStateSession,
        frame_settings: &FrameSettings,
    ) {
        let Some(pass) = self.pass.as_ref() else {
            log::error!("draw called before init");
            return;
        };

        record_scene(
            cmd,
            &rendering_info.rendering_info(),
            pass.binding(),
            session,
            &self.cube,
            &CubePushConstants::looking_at_cube(frame_settings.aspect_ratio(), self.rotation_deg),
        );
    }

    fn destroy(&mut self) {
        self.pass = None;
    }
}
