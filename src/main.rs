mod app;
mod color;
mod state;
mod ui;

use app::HaloViewerApp;
use eframe::egui;
use halo_viewer::config::ViewerConfig;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ViewerConfig::from_env().unwrap_or_else(|e| {
        log::error!("{e:#}; using default settings");
        ViewerConfig::default()
    });

    let mut state = AppState::new(config);
    // A catalog path on the command line is opened at start-up.
    if let Some(path) = std::env::args_os().nth(1) {
        if let Err(e) = state.open(path.into()) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(state.config.window_size)
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Halo Viewer – Catalog Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(HaloViewerApp::new(state)))),
    )
}
