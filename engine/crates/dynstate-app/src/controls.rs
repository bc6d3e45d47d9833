use std::borrow::Cow;

use dynstate_gfx::dynamic_state::{CullMode, FrontFace};

use crate::config::ScriptStep;
use crate::session::DynamicStateSession;

/// 修改 cull mode 和 front face 的控制面板
///
/// 任何值发生变化时，都会在 session 上发出重建请求
pub struct DynamicStateControls<'a> {
    session: &'a mut DynamicStateSession,
}

impl<'a> DynamicStateControls<'a> {
    pub fn new(session: &'a mut DynamicStateSession) -> Self {
        Self { session }
    }

    /// 返回值是否发生了变化
    pub fn set_cull_mode(&mut self, cull_mode: CullMode) -> bool {
        let values = self.session.values_mut();
        if values.cull_mode == cull_mode {
            return false;
        }
        log::info!("cull mode: {} -> {}", values.cull_mode.label(), cull_mode.label());
        values.cull_mode = cull_mode;
        self.session.request_rebuild();
        true
    }

    /// 返回值是否发生了变化
    pub fn set_front_face(&mut self, front_face: FrontFace) -> bool {
        let values = self.session.values_mut();
        if values.front_face == front_face {
            return false;
        }
        log::info!("front face: {} -> {}", values.front_face.label(), front_face.label());
        values.front_face = front_face;
        self.session.request_rebuild();
        true
    }

    /// 执行脚本中的一步，返回是否有值发生变化
    pub fn apply_step(&mut self, step: &ScriptStep) -> bool {
        let mut changed = false;
        if let Some(cull_mode) = step.cull_mode {
            changed |= self.set_cull_mode(cull_mode);
        }
        if let Some(front_face) = step.front_face {
            changed |= self.set_front_face(front_face);
        }
        changed
    }

    /// "Dynamic state" 分组下的两个下拉框
    pub fn draw_ui(&mut self, ui: &imgui::Ui) {
        if !ui.collapsing_header("Dynamic state", imgui::TreeNodeFlags::DEFAULT_OPEN) {
            return;
        }

        let mut cull_mode_idx = self.session.values().cull_mode.index();
        if ui.combo("Cull mode", &mut cull_mode_idx, &CullMode::ALL, |mode| Cow::Borrowed(mode.label())) {
            if let Some(cull_mode) = CullMode::from_index(cull_mode_idx) {
                self.set_cull_mode(cull_mode);
            }
        }

        let mut front_face_idx = self.session.values().front_face.index();
        if ui.combo("Front face", &mut front_face_idx, &FrontFace::ALL, |face| Cow::Borrowed(face.label())) {
            if let Some(front_face) = FrontFace::from_index(front_face_idx) {
                self.set_front_face(front_face);
            }
        }

        if !self.session.capabilities().has_extended_dynamic_state() {
            ui.text_disabled("VK_EXT_extended_dynamic_state is not supported, changes have no effect");
        }
    }
}

/// 按帧号执行的控制脚本
#[derive(Debug, Clone, Default)]
pub struct ControlScript {
    steps: Vec<ScriptStep>,
}

impl ControlScript {
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.sort_by_key(|step| step.frame);
        Self { steps }
    }

    /// 执行所有 frame 等于 `frame_index` 的步骤
    pub fn run_frame(&self, frame_index: u64, controls: &mut DynamicStateControls<'_>) -> bool {
        let mut changed = false;
        for step in self.steps.iter().filter(|step| step.frame == frame_index) {
            changed |= controls.apply_step(step);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use dynstate_gfx::dynamic_state::{DynamicStateSupport, DynamicStateValues};

    use super::*;

    fn session() -> DynamicStateSession {
        let mut session = DynamicStateSession::new(DynamicStateSupport::default(), DynamicStateValues::default());
        session.take_rebuild_request();
        session
    }

    #[test]
    fn test_change_raises_rebuild_request() {
        let mut session = session();

        assert!(DynamicStateControls::new(&mut session).set_cull_mode(CullMode::Front));
        assert_eq!(session.values().cull_mode, CullMode::Front);
        assert!(session.take_rebuild_request());

        assert!(DynamicStateControls::new(&mut session).set_front_face(FrontFace::Clockwise));
        assert_eq!(session.values().front_face, FrontFace::Clockwise);
        assert!(session.take_rebuild_request());
    }

    #[test]
    fn test_unchanged_value_does_not_rebuild() {
        let mut session = session();
        let mut controls = DynamicStateControls::new(&mut session);

        assert!(!controls.set_cull_mode(CullMode::Back));
        assert!(!controls.set_front_face(FrontFace::CounterClockwise));
        assert!(!session.is_rebuild_requested());
    }

    #[test]
    fn test_script_runs_steps_of_the_frame() {
        let script = ControlScript::new(vec![
            ScriptStep {
                frame: 4,
                cull_mode: None,
                front_face: Some(FrontFace::Clockwise),
            },
            ScriptStep {
                frame: 2,
                cull_mode: Some(CullMode::None),
                front_face: None,
            },
        ]);
        let mut session = session();

        assert!(!script.run_frame(1, &mut DynamicStateControls::new(&mut session)));
        assert!(script.run_frame(2, &mut DynamicStateControls::new(&mut session)));
        assert_eq!(session.values().cull_mode, CullMode::None);
        assert!(session.take_rebuild_request());

        // 同样的值再执行一次，没有变化
        assert!(!script.run_frame(2, &mut DynamicStateControls::new(&mut session)));

        assert!(script.run_frame(4, &mut DynamicStateControls::new(&mut session)));
        assert_eq!(session.values().front_face, FrontFace::Clockwise);
    }

    /// imgui 的 context 是全局的，整个 crate 中只有这一个测试创建它
    #[test]
    fn test_draw_ui_without_interaction_keeps_values() {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui.io_mut().display_size = [800.0, 600.0];
        imgui.fonts().build_rgba32_texture();

        let mut session = session();
        {
            let ui = imgui.new_frame();
            DynamicStateControls::new(&mut session).draw_ui(ui);
        }
        imgui.render();

        assert_eq!(*session.values(), DynamicStateValues::default());
        assert!(!session.is_rebuild_requested());
    }
}
