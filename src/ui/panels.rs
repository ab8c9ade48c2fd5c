use eframe::egui::{self, Align2, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::chart::ProductSelection;
use crate::state::{AppState, Phase};

// ---------------------------------------------------------------------------
// Left side panel – product picker and data table
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Products");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    let products = dataset.products.clone();
    let current = state.selection.clone();

    egui::ComboBox::from_id_salt("product_select")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            if ui
                .selectable_label(current == ProductSelection::All, "All products")
                .clicked()
            {
                state.select_product(ProductSelection::All);
            }
            for product in &products {
                let choice = ProductSelection::Product(product.clone());
                let colour = state.color_map.colors_for(product).actual;
                if ui
                    .selectable_label(current == choice, RichText::new(product).color(colour))
                    .clicked()
                {
                    state.select_product(choice);
                }
            }
        });

    ui.add_space(6.0);
    ui.strong("Sales rows");
    ui.separator();
    sales_table(ui, state);
}

/// Actual sales of the selected product(s), one row per point.
fn sales_table(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let rows: Vec<_> = dataset
        .points
        .iter()
        .filter(|p| match &state.selection {
            ProductSelection::All => true,
            ProductSelection::Product(name) => &p.product == name,
        })
        .collect();

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::remainder())
        .column(Column::auto())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Month");
            });
            header.col(|ui| {
                ui.strong("Product");
            });
            header.col(|ui| {
                ui.strong("Qty");
            });
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let p = rows[row.index()];
                row.col(|ui| {
                    ui.label(p.month.to_string());
                });
                row.col(|ui| {
                    ui.label(&p.product);
                });
                row.col(|ui| {
                    ui.label(format!("{:.1}", p.quantity));
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui
                .add_enabled(!state.is_training(), egui::Button::new("Open…"))
                .clicked()
            {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(name)) = (&state.dataset, &state.source_name) {
            ui.label(format!(
                "{name}: {} of {} rows usable, {} products",
                ds.len(),
                ds.source_rows,
                ds.products.len()
            ));
            ui.separator();
        }

        let training = state.is_training();
        ui.label("Horizon (months)");
        ui.add_enabled(
            !training,
            egui::TextEdit::singleline(&mut state.horizon_input).desired_width(36.0),
        );

        let can_predict = state.dataset.as_ref().is_some_and(|ds| !ds.is_empty());
        if training {
            if ui
                .add_enabled(!state.is_cancelling(), egui::Button::new("Cancel"))
                .clicked()
            {
                state.cancel_training();
            }
        } else if ui
            .add_enabled(can_predict, egui::Button::new("Predict"))
            .clicked()
        {
            // Rejections are shown inline; nothing else to do here.
            let _ = state.request_prediction();
        }

        if let Phase::Training { current, done, total } = &state.phase {
            ui.spinner();
            let name = current.as_deref().unwrap_or("…");
            ui.label(format!("Training {name} ({done}/{total})"));
        }

        if let Some(msg) = &state.horizon_error {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Blocking notification
// ---------------------------------------------------------------------------

/// Show the oldest pending notice until the user acknowledges it.
pub fn notification_window(ctx: &egui::Context, state: &mut AppState) {
    let Some(message) = state.notifications.front().cloned() else {
        return;
    };

    egui::Window::new("Notice")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(&message);
            ui.add_space(6.0);
            if ui.button("OK").clicked() {
                state.dismiss_notification();
            }
        });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("CSV", &["csv", "txt"])
        .pick_file();

    if let Some(path) = file {
        // Errors are already logged and shown in the status bar.
        let _ = state.load_path(&path);
    }
}
