mod app;
mod color;
mod config;
mod data;
mod map;
mod share;
mod state;
mod ui;

use app::ApartmentsMapApp;
use config::Settings;
use eframe::egui;
use share::{SharedView, parse_query};

fn main() -> eframe::Result {
    // .env first so RUST_LOG can live there too
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    if let Ok(path) = dotenv {
        log::info!("Loaded environment from {}", path.display());
    }

    let settings = Settings::from_env();

    // Optional first argument: a shared link or its query string.
    let shared = match std::env::args().nth(1) {
        Some(query) => parse_query(&query).unwrap_or_else(|e| {
            log::warn!("Ignoring shared filters: {e}");
            SharedView::default()
        }),
        None => SharedView::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Apartments in The Netherlands",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render listing thumbnails.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(ApartmentsMapApp::new(settings, shared)))
        }),
    )
}
