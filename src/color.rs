use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let hsl = Hsl::new(hue, saturation, lightness);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize, lightness: f32) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, lightness))
        .collect()
}

// ---------------------------------------------------------------------------
// Product colours: one hue per product, lighter shade for the forecast
// ---------------------------------------------------------------------------

/// Colours for the actual and predicted line of one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesColors {
    pub actual: Color32,
    pub predicted: Color32,
}

/// Maps product names to distinct line colours.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, SeriesColors>,
}

impl ColorMap {
    /// Build a colour map for the given products.
    pub fn new(products: &[String]) -> Self {
        let actual = generate_palette(products.len(), 0.45);
        let predicted = generate_palette(products.len(), 0.70);
        let mapping = products
            .iter()
            .zip(actual.into_iter().zip(predicted))
            .map(|(p, (actual, predicted))| (p.clone(), SeriesColors { actual, predicted }))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colours for a product.
    pub fn colors_for(&self, product: &str) -> SeriesColors {
        self.mapping.get(product).copied().unwrap_or(SeriesColors {
            actual: Color32::LIGHT_BLUE,
            predicted: Color32::GRAY,
        })
    }
}
