use crate::commands::recorder::GfxCommandRecorder;
use crate::dynamic_state::entry_points::DynamicStateEntryPoints;
use crate::dynamic_state::values::DynamicStateValues;

/// 在录制过程中设置扩展提供的 dynamic state
///
/// 函数指针缺失时直接跳过，此时 pipeline 中烘焙的默认值生效。
pub struct DynamicStateDispatcher;

impl DynamicStateDispatcher {
    /// 在 begin rendering 并设置 viewport/scissor/line width 之后、bind pipeline 之前调用
    ///
    /// 先设置 cull mode，再设置 front face
    pub fn apply(cmd: &impl GfxCommandRecorder, entry_points: &DynamicStateEntryPoints, values: &DynamicStateValues) {
        let cmd_handle = cmd.vk_handle();

        if let Some(set_cull_mode) = entry_points.set_cull_mode() {
            // SAFETY: 函数指针来自 vkGetDeviceProcAddr，command buffer 处于录制状态
            unsafe { set_cull_mode(cmd_handle, values.cull_mode.to_vk()) };
        }
        if let Some(set_front_face) = entry_points.set_front_face() {
            unsafe { set_front_face(cmd_handle, values.front_face.to_vk()) };
        }
    }
}

#[cfg(test)]
mod tests {
    use ash::vk;

    use super::*;
    use crate::dynamic_state::capabilities::{DynamicStateCapabilities, DynamicStateExtension};
    use crate::dynamic_state::values::{CullMode, FrontFace};
    use crate::testing::{FakeDevice, RecordedCommand, RecordingCommandBuffer, take_recorded_commands};

    fn resolve_for(exts: &[DynamicStateExtension]) -> DynamicStateEntryPoints {
        let device = FakeDevice::with_extensions(exts);
        let caps = DynamicStateCapabilities::probe(&device);
        DynamicStateEntryPoints::resolve(&caps, &device)
    }

    #[test]
    fn test_apply_with_resolved_entry_points() {
        let entry_points = resolve_for(&[DynamicStateExtension::ExtendedDynamicState]);
        let cmd = RecordingCommandBuffer::new(7);
        let values = DynamicStateValues {
            cull_mode: CullMode::Front,
            front_face: FrontFace::Clockwise,
        };

        take_recorded_commands();
        DynamicStateDispatcher::apply(&cmd, &entry_points, &values);

        assert_eq!(
            take_recorded_commands(),
            vec![
                (cmd.vk_handle(), RecordedCommand::SetCullMode(vk::CullModeFlags::FRONT)),
                (cmd.vk_handle(), RecordedCommand::SetFrontFace(vk::FrontFace::CLOCKWISE)),
            ]
        );
    }

    #[test]
    fn test_apply_skips_missing_entry_points() {
        let cmd = RecordingCommandBuffer::new(1);

        take_recorded_commands();
        DynamicStateDispatcher::apply(&cmd, &DynamicStateEntryPoints::none(), &DynamicStateValues::default());
        DynamicStateDispatcher::apply(
            &cmd,
            &resolve_for(&[DynamicStateExtension::ExtendedDynamicState2]),
            &DynamicStateValues::default(),
        );

        assert!(take_recorded_commands().is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let entry_points = resolve_for(&DynamicStateExtension::ALL);
        let cmd = RecordingCommandBuffer::new(3);
        let values = DynamicStateValues {
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
        };

        take_recorded_commands();
        DynamicStateDispatcher::apply(&cmd, &entry_points, &values);
        let first = take_recorded_commands();
        DynamicStateDispatcher::apply(&cmd, &entry_points, &values);
        let second = take_recorded_commands();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_each_value_reaches_the_command_buffer() {
        let entry_points = resolve_for(&[DynamicStateExtension::ExtendedDynamicState]);
        let cmd = RecordingCommandBuffer::new(9);

        for cull_mode in CullMode::ALL {
            for front_face in FrontFace::ALL {
                take_recorded_commands();
                DynamicStateDispatcher::apply(&cmd, &entry_points, &DynamicStateValues { cull_mode, front_face });
                assert_eq!(
                    take_recorded_commands(),
                    vec![
                        (cmd.vk_handle(), RecordedCommand::SetCullMode(cull_mode.to_vk())),
                        (cmd.vk_handle(), RecordedCommand::SetFrontFace(front_face.to_vk())),
                    ]
                );
            }
        }
    }
}
