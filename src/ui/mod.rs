/// egui rendering: top bar, side panel, notices and the forecast plot.
pub mod panels;
pub mod plot;
