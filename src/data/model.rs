use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// RawRecord – one uploaded CSV row
// ---------------------------------------------------------------------------

/// One uploaded row: column name → cell text.
///
/// Columns missing from a short row are simply absent from the map.
pub type RawRecord = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// SalesPoint – one normalized observation
// ---------------------------------------------------------------------------

/// A single `(month, product, quantity)` observation.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesPoint {
    /// Calendar month, always in `1..=12`.
    pub month: u32,
    pub product: String,
    /// Units sold, always finite and positive.
    pub quantity: f64,
}

// ---------------------------------------------------------------------------
// Dataset – the normalized upload
// ---------------------------------------------------------------------------

/// All sales points from one upload, in source order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub points: Vec<SalesPoint>,
    /// Distinct products in first-seen order.
    pub products: Vec<String>,
    /// How many source rows were considered (after truncation).
    pub source_rows: usize,
}

impl Dataset {
    /// Build the product index from the normalized points.
    pub fn from_points(points: Vec<SalesPoint>, source_rows: usize) -> Self {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut products = Vec::new();
        for p in &points {
            if seen.insert(p.product.as_str()) {
                products.push(p.product.clone());
            }
        }
        Dataset {
            points,
            products,
            source_rows,
        }
    }

    /// Points belonging to one product, in dataset order.
    pub fn points_for<'a>(&'a self, product: &'a str) -> impl Iterator<Item = &'a SalesPoint> + 'a {
        self.points.iter().filter(move |p| p.product == product)
    }

    /// Number of sales points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// One forecast value for a future month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionPoint {
    /// Month index; may run past 12 for long horizons.
    pub month: u32,
    pub predicted: f64,
}

/// Forecasts of one predict run, keyed by product.
pub type PredictionSet = BTreeMap<String, Vec<PredictionPoint>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn point(month: u32, product: &str, quantity: f64) -> SalesPoint {
        SalesPoint {
            month,
            product: product.to_string(),
            quantity,
        }
    }

    #[test]
    fn products_keep_first_seen_order() {
        let ds = Dataset::from_points(
            vec![
                point(1, "Widget", 10.0),
                point(1, "Gadget", 3.0),
                point(2, "Widget", 15.0),
                point(2, "Bolt", 7.0),
            ],
            4,
        );
        assert_eq!(ds.products, vec!["Widget", "Gadget", "Bolt"]);
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.source_rows, 4);
    }

    #[test]
    fn points_for_filters_by_product() {
        let ds = Dataset::from_points(
            vec![point(1, "Widget", 10.0), point(1, "Gadget", 3.0), point(2, "Widget", 15.0)],
            3,
        );
        let months: Vec<u32> = ds.points_for("Widget").map(|p| p.month).collect();
        assert_eq!(months, vec![1, 2]);
        assert_eq!(ds.points_for("Missing").count(), 0);
    }

    #[test]
    fn default_dataset_is_empty() {
        let ds = Dataset::default();
        assert!(ds.is_empty());
        assert!(ds.products.is_empty());
    }
}
