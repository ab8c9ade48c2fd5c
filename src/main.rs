mod app;
mod chart;
mod color;
mod config;
mod data;
mod error;
mod forecast;
mod state;
mod ui;

use app::SalesForecastApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Forecast",
        options,
        Box::new(|_cc| Ok(Box::new(SalesForecastApp::new(config)))),
    )
}
