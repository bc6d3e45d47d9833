use dynstate_app::outer_app::dynamic_state::dynamic_state_app::DynamicStateApp;
use dynstate_headless_app::app::HeadlessApp;

fn main() {
    let result = HeadlessApp::run(|config| Box::new(DynamicStateApp::new(config.shader_dir())));
    if let Err(err) = result {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}
