use std::path::{Path, PathBuf};

use dynstate_app::config::DynamicStateAppConfig;
use dynstate_app::outer_app::OuterApp;
use dynstate_app::render_app::HeadlessRenderApp;

pub struct HeadlessApp;

// 总的 main 函数
impl HeadlessApp {
    /// 整个程序的入口
    ///
    /// 第一个命令行参数是配置文件路径，没有时使用默认配置
    pub fn run(make_outer_app: impl FnOnce(&DynamicStateAppConfig) -> Box<dyn OuterApp>) -> anyhow::Result<()> {
        let config_path = std::env::args().nth(1).map(PathBuf::from);
        let config = match DynamicStateAppConfig::load(config_path.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                // 配置无效时仍然需要 logger 输出错误
                HeadlessRenderApp::init_env(log::LevelFilter::Info);
                return Err(err);
            }
        };

        HeadlessRenderApp::init_env(config.log_level());
        Self::log_config(config_path.as_deref(), &config);

        let outer_app = make_outer_app(&config);
        let mut render_app = HeadlessRenderApp::new(config, outer_app)?;
        let result = render_app.run();

        log::info!("end run.");

        // 即使渲染失败，也要先释放 Vulkan 资源
        render_app.destroy()?;
        result
    }

    fn log_config(path: Option<&Path>, config: &DynamicStateAppConfig) {
        match path {
            Some(path) => log::info!("config loaded from {:?}", path),
            None => log::info!("no config file given, using defaults"),
        }
        log::info!("{:#?}", config);
    }
}
