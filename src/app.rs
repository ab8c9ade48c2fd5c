use std::time::Duration;

use eframe::egui;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalesForecastApp {
    pub state: AppState,
}

impl SalesForecastApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl Default for SalesForecastApp {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl eframe::App for SalesForecastApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up worker progress; keep repainting until training ends.
        if self.state.poll_training() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        // ---- Top panel: menu bar + forecast controls ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: product picker + data ----
        egui::SidePanel::left("product_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::forecast_plot(ui, &self.state);
        });

        // ---- Blocking notices (skipped products) ----
        panels::notification_window(ctx, &mut self.state);
    }
}
