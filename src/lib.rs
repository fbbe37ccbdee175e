pub mod app;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod settings;

use app::App;
use winit::event_loop::EventLoop;

pub use error::{RenderError, ViewerError};
pub use settings::ViewerSettings;

fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

pub fn run() -> Result<(), ViewerError> {
    init_logging();

    log::info!("Starting shadow scene viewer");

    let settings = ViewerSettings::load();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings);

    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result?;
    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
