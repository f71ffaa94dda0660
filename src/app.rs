use eframe::egui::{self, Color32, RichText};

use crate::config::{ConfigError, Settings};
use crate::share::SharedView;
use crate::state::AppState;
use crate::ui::{details, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ApartmentsMapApp {
    /// `Err` holds a fatal configuration message; nothing else is rendered.
    state: Result<AppState, String>,
}

impl ApartmentsMapApp {
    pub fn new(settings: Result<Settings, ConfigError>, shared: SharedView) -> Self {
        let state = match settings {
            Ok(settings) => {
                let mut state = AppState::new(settings, shared);
                state.load_configured_dataset();
                Ok(state)
            }
            Err(e) => {
                log::error!("Invalid configuration: {e}");
                Err(e.to_string())
            }
        };
        Self { state }
    }
}

impl eframe::App for ApartmentsMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = match &mut self.state {
            Ok(state) => state,
            Err(msg) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Configuration error");
                    ui.label(RichText::new(msg.as_str()).color(Color32::RED));
                });
                return;
            }
        };

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, state);
        });

        // ---- Left side panel: filters + custom marker ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, state);
            });

        // ---- Right side panel: selected marker ----
        if state.selected.is_some() {
            egui::SidePanel::right("details_panel")
                .default_width(280.0)
                .resizable(true)
                .show(ctx, |ui| {
                    details::details_panel(ui, state);
                });
        }

        // ---- Central panel: map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map::apartments_map(ui, state);
        });
    }
}
