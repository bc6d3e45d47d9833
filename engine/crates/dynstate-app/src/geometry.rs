use dynstate_gfx::commands::recorder::GfxCommandRecorder;

/// 场景中可以被绘制的几何体
pub trait SceneGeometry {
    /// 绑定 vertex buffer 以及 index buffer
    fn bind_buffers(&self, cmd: &dyn GfxCommandRecorder);

    fn draw(&self, cmd: &dyn GfxCommandRecorder);
}

/// 顶点直接定义在 `cube.vert` 中的立方体，不需要任何 buffer
///
/// 6 个面颜色不同，便于观察剔除与环绕方向的变化
#[derive(Debug, Default, Clone, Copy)]
pub struct ProceduralCube;

impl ProceduralCube {
    /// 6 个面，每个面 2 个三角形
    pub const VERTEX_COUNT: u32 = 36;
}

impl SceneGeometry for ProceduralCube {
    fn bind_buffers(&self, _cmd: &dyn GfxCommandRecorder) {}

    fn draw(&self, cmd: &dyn GfxCommandRecorder) {
        cmd.cmd_draw(Self::VERTEX_COUNT, 1, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use dynstate_gfx::testing::{RecordedCommand, RecordingCommandBuffer, take_recorded_commands};

    use super::*;

    #[test]
    fn test_cube_draws_without_buffers() {
        let cmd = RecordingCommandBuffer::new(5);
        take_recorded_commands();

        ProceduralCube.bind_buffers(&cmd);
        ProceduralCube.draw(&cmd);

        assert_eq!(
            take_recorded_commands(),
            vec![(
                cmd.vk_handle(),
                RecordedCommand::Draw {
                    vertex_count: 36,
                    instance_count: 1,
                    first_vertex: 0,
                    first_instance: 0,
                }
            )]
        );
    }
}
