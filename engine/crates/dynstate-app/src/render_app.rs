use std::time::Instant;

use anyhow::Context;
use ash::vk;
use dynstate_crate_tools::init_log::init_log;
use dynstate_gfx::commands::{command_buffer::GfxCommandBuffer, command_pool::GfxCommandPool, fence::GfxFence};
use dynstate_gfx::gfx_core::GfxCore;
use dynstate_gfx::resources::render_target::GfxRenderTarget;

use crate::config::DynamicStateAppConfig;
use crate::controls::{ControlScript, DynamicStateControls};
use crate::frame_settings::FrameSettings;
use crate::outer_app::OuterApp;
use crate::session::DynamicStateSession;

pub fn panic_handler(info: &std::panic::PanicHookInfo) {
    log::error!("{}", info);
}

/// 每个 frame in flight 独占的资源
struct FrameResources {
    cmd: GfxCommandBuffer,
    /// 上一次提交的 command buffer 执行完毕后 signal
    fence: GfxFence,
}

/// GfxCore 之后创建的资源
struct RenderResources {
    frame_settings: FrameSettings,
    session: DynamicStateSession,
    frames: Vec<FrameResources>,
    command_pool: GfxCommandPool,
    render_target: GfxRenderTarget,
}

/// 没有窗口的渲染循环：渲染到离屏 render target
///
/// 每帧依次执行：控制脚本 -> GUI -> update -> 按需重建 command buffer -> 提交。
/// 需要手动调用 [`HeadlessRenderApp::destroy`]
pub struct HeadlessRenderApp {
    config: DynamicStateAppConfig,
    frame_settings: FrameSettings,

    session: DynamicStateSession,
    script: ControlScript,
    imgui: imgui::Context,

    frames: Vec<FrameResources>,
    command_pool: GfxCommandPool,
    render_target: GfxRenderTarget,

    outer_app: Option<Box<dyn OuterApp>>,

    /// 最后销毁
    gfx_core: Option<GfxCore>,
}

// new & init
impl HeadlessRenderApp {
    pub fn init_env(log_level: log::LevelFilter) {
        std::panic::set_hook(Box::new(panic_handler));

        init_log(log_level);

        tracy_client::Client::start();
        tracy_client::set_thread_name!("RenderThread");
    }

    pub fn new(config: DynamicStateAppConfig, mut outer_app: Box<dyn OuterApp>) -> anyhow::Result<Self> {
        let gfx_core = GfxCore::new(&config.app_name, "dynstate", config.validation_enabled())
            .context("failed to initialize Vulkan")?;

        let resources = match Self::init_resources(&config, &gfx_core, outer_app.as_mut()) {
            Ok(resources) => resources,
            Err(err) => {
                // 所有持有 device 的对象都要在 GfxCore 之前释放
                if let Err(wait_err) = gfx_core.wait_idle() {
                    log::warn!("wait idle before teardown failed: {}", wait_err);
                }
                outer_app.destroy();
                drop(outer_app);
                gfx_core.destroy();
                return Err(err);
            }
        };

        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui.io_mut().display_size =
            [resources.frame_settings.frame_extent.width as f32, resources.frame_settings.frame_extent.height as f32];
        // 没有 GUI 后端，只需要构建字体，不上传纹理
        imgui.fonts().build_rgba32_texture();

        let RenderResources {
            frame_settings,
            session,
            frames,
            command_pool,
            render_target,
        } = resources;
        Ok(Self {
            script: ControlScript::new(config.script.clone()),
            config,
            frame_settings,
            session,
            imgui,
            frames,
            command_pool,
            render_target,
            outer_app: Some(outer_app),
            gfx_core: Some(gfx_core),
        })
    }

    /// GfxCore 创建之后的所有初始化步骤，出错时已经创建的资源随返回值一起释放
    fn init_resources(
        config: &DynamicStateAppConfig,
        gfx_core: &GfxCore,
        outer_app: &mut dyn OuterApp,
    ) -> anyhow::Result<RenderResources> {
        let session = DynamicStateSession::new(*gfx_core.dynamic_state(), config.initial_values());
        let frame_settings = FrameSettings {
            frame_extent: config.extent(),
            color_format: GfxRenderTarget::COLOR_FORMAT,
            depth_format: GfxRenderTarget::DEPTH_FORMAT,
            frames_in_flight: config.frames_in_flight,
        };

        let render_target = GfxRenderTarget::new(
            gfx_core.device().clone(),
            gfx_core.allocator().clone(),
            frame_settings.frame_extent,
            "offscreen",
        )?;
        gfx_core.one_time_exec(|cmd| render_target.transition_layouts(cmd), "render-target-layout")?;

        // 所有 command buffer 一起重建，因此使用 pool 级别的 reset
        let command_pool = GfxCommandPool::new(
            gfx_core.device().clone(),
            gfx_core.gfx_queue().queue_family().clone(),
            vk::CommandPoolCreateFlags::empty(),
            "frame-cmds",
        )?;
        let frames = (0..frame_settings.frames_in_flight)
            .map(|idx| -> anyhow::Result<FrameResources> {
                Ok(FrameResources {
                    cmd: GfxCommandBuffer::new(&command_pool, &format!("frame-{idx}"))?,
                    fence: GfxFence::new(gfx_core.device().clone(), true, &format!("frame-{idx}"))?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        {
            let _span = tracy_client::span!("OuterApp::init");
            outer_app.init(gfx_core, &session, &frame_settings)?;
        }

        Ok(RenderResources {
            frame_settings,
            session,
            frames,
            command_pool,
            render_target,
        })
    }
}
// destroy
impl HeadlessRenderApp {
    pub fn destroy(mut self) -> anyhow::Result<()> {
        if let Some(gfx_core) = self.gfx_core.as_ref() {
            gfx_core.wait_idle()?;
        }

        if let Some(mut outer_app) = self.outer_app.take() {
            outer_app.destroy();
        }

        let Self {
            frames,
            command_pool,
            render_target,
            gfx_core,
            ..
        } = self;
        drop(frames);
        drop(command_pool);
        drop(render_target);

        if let Some(gfx_core) = gfx_core {
            gfx_core.destroy();
        }
        Ok(())
    }
}
// update
impl HeadlessRenderApp {
    /// 渲染 `frame_count` 帧后返回
    pub fn run(&mut self) -> anyhow::Result<()> {
        let start = Instant::now();
        for frame_index in 0..self.config.frame_count {
            self.big_update(frame_index)?;
        }
        log::info!("rendered {} frames in {:.2?}", self.config.frame_count, start.elapsed());
        Ok(())
    }

    pub fn big_update(&mut self, frame_index: u64) -> anyhow::Result<()> {
        // 脚本代替用户操作 ============================
        self.script.run_frame(frame_index, &mut DynamicStateControls::new(&mut self.session));

        // build Gui ==================================
        {
            let _span = tracy_client::span!("Update Gui");
            self.build_ui();
        }

        // Update ==================================
        if let Some(outer_app) = self.outer_app.as_mut() {
            outer_app.update(&mut self.session, frame_index);
        }

        // Rebuild ==================================
        if self.session.take_rebuild_request() {
            self.rebuild_command_buffers()?;
        }

        // Submit ==================================
        self.submit_frame(frame_index)?;

        tracy_client::frame_mark();
        Ok(())
    }

    fn build_ui(&mut self) {
        self.imgui.io_mut().delta_time = 1.0 / 60.0;
        let ui = self.imgui.new_frame();
        if let Some(outer_app) = self.outer_app.as_mut() {
            outer_app.draw_ui(ui, &mut self.session);
        }
        // 不绘制到屏幕，仅结束这一帧
        self.imgui.render();
    }

    /// 所有 frame 的 command buffer 从头重新录制
    fn rebuild_command_buffers(&mut self) -> anyhow::Result<()> {
        let _span = tracy_client::span!("rebuild_command_buffers");
        log::debug!("rebuild command buffers with {:?}", self.session.values());

        // 等待所有 command buffer 执行完毕后才能 reset
        for frame in &self.frames {
            frame.fence.wait()?;
        }
        self.command_pool.reset_all_buffers()?;

        let Some(outer_app) = self.outer_app.as_ref() else {
            return Ok(());
        };
        let rendering_info = self.render_target.rendering_info([0.025, 0.025, 0.025, 1.0]);
        for frame in &self.frames {
            frame.cmd.begin(vk::CommandBufferUsageFlags::empty(), "dynamic-state")?;
            outer_app.draw(&frame.cmd, &rendering_info, &self.session, &self.frame_settings);
            frame.cmd.end()?;
        }
        Ok(())
    }

    fn submit_frame(&mut self, frame_index: u64) -> anyhow::Result<()> {
        let frame = &self.frames[frame_index as usize % self.frames.len()];
        frame.fence.wait()?;
        frame.fence.reset()?;

        let gfx_core = self.gfx_core.as_ref().context("gfx core is already destroyed")?;
        gfx_core.gfx_queue().submit(&[&frame.cmd], Some(&frame.fence))?;
        Ok(())
    }

    #[inline]
    pub fn session(&self) -> &DynamicStateSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use dynstate_gfx::GfxError;
    use dynstate_gfx::pipelines::rendering_info::GfxRenderingInfo;

    use super::*;
    use crate::outer_app::dynamic_state::dynamic_state_app::DynamicStateApp;

    /// init 总是失败，记录 destroy 是否被调用
    struct FailingInitApp {
        destroyed: Rc<Cell<bool>>,
    }

    impl OuterApp for FailingInitApp {
        fn init(&mut self, _: &GfxCore, _: &DynamicStateSession, _: &FrameSettings) -> anyhow::Result<()> {
            anyhow::bail!("init failed on purpose")
        }

        fn draw_ui(&mut self, _: &imgui::Ui, _: &mut DynamicStateSession) {}

        fn draw(&self, _: &GfxCommandBuffer, _: &GfxRenderingInfo, _: &DynamicStateSession, _: &FrameSettings) {}

        fn destroy(&mut self) {
            self.destroyed.set(true);
        }
    }

    fn small_config() -> DynamicStateAppConfig {
        DynamicStateAppConfig {
            render_extent: [64, 64],
            frames_in_flight: 2,
            frame_count: 1,
            enable_validation: Some(false),
            ..Default::default()
        }
    }

    #[test]
    #[ignore = "needs a Vulkan driver"]
    fn test_outer_app_init_error_tears_down_gfx_core() {
        let destroyed = Rc::new(Cell::new(false));
        let result = HeadlessRenderApp::new(
            small_config(),
            Box::new(FailingInitApp {
                destroyed: destroyed.clone(),
            }),
        );

        let Err(err) = result else {
            panic!("init error must abort startup");
        };
        assert!(err.to_string().contains("init failed on purpose"), "{err:?}");
        assert!(destroyed.get());
    }

    #[test]
    #[ignore = "needs a Vulkan driver"]
    fn test_missing_spv_is_reported_after_core_creation() {
        let shader_dir = PathBuf::from("no-such-shader-dir");
        let Err(err) = HeadlessRenderApp::new(small_config(), Box::new(DynamicStateApp::new(shader_dir))) else {
            panic!("missing shaders must abort startup");
        };
        assert!(matches!(err.downcast_ref::<GfxError>(), Some(GfxError::ShaderLoad { .. })), "{err:?}");
    }
}
