use eframe::egui::Ui;
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints, Points};

use crate::chart::ChartRow;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Forecast plot (central panel)
// ---------------------------------------------------------------------------

/// Render actual vs. predicted sales for the selected product(s).
pub fn forecast_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a sales CSV to begin  (File → Open…)");
        });
        return;
    }

    let products = state.visible_products();
    if products.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No usable sales rows in this file");
        });
        return;
    }

    Plot::new("forecast_plot")
        .legend(Legend::default())
        .x_axis_label("Month")
        .y_axis_label("Quantity")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for product in &products {
                let rows = state.chart_series(product);
                let colors = state.color_map.colors_for(product);

                let actual = series(&rows, |r| r.actual);
                if !actual.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(actual.clone()))
                            .name(format!("{product} (actual)"))
                            .color(colors.actual)
                            .width(2.0),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(actual))
                            .color(colors.actual)
                            .radius(3.0),
                    );
                }

                let predicted = series(&rows, |r| r.predicted);
                if !predicted.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(predicted))
                            .name(format!("{product} (predicted)"))
                            .color(colors.predicted)
                            .style(LineStyle::dashed_loose())
                            .width(2.0),
                    );
                }
            }
        });
}

/// `[month, value]` pairs for rows where `pick` yields a value.
fn series(rows: &[ChartRow], pick: impl Fn(&ChartRow) -> Option<f64>) -> Vec<[f64; 2]> {
    rows.iter()
        .filter_map(|r| pick(r).map(|v| [r.month as f64, v]))
        .collect()
}
