use std::collections::BTreeSet;

use crate::data::model::{Dataset, PredictionSet};

// ---------------------------------------------------------------------------
// Chart rows: actual and predicted values merged by month
// ---------------------------------------------------------------------------

/// One x-position of a product chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartRow {
    pub month: u32,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
}

/// Which products the chart shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProductSelection {
    #[default]
    All,
    Product(String),
}

impl ProductSelection {
    /// Products to draw, in dataset order.
    pub fn products(&self, dataset: &Dataset) -> Vec<String> {
        match self {
            ProductSelection::All => dataset.products.clone(),
            ProductSelection::Product(p) => dataset
                .products
                .iter()
                .filter(|name| *name == p)
                .cloned()
                .collect(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ProductSelection::All => "All products",
            ProductSelection::Product(p) => p,
        }
    }
}

/// Merge one product's actual sales and forecast into chart rows.
///
/// Actual points come first in dataset order, each paired with the forecast
/// for its month if there is one.  Forecast months without an actual row
/// follow in forecast order.  With `sort_by_month` the rows are then sorted
/// by month (stable, so ties keep that order).
pub fn merge_series(
    dataset: &Dataset,
    predictions: &PredictionSet,
    product: &str,
    sort_by_month: bool,
) -> Vec<ChartRow> {
    let forecast = predictions.get(product).map(Vec::as_slice).unwrap_or(&[]);
    let lookup = |month: u32| forecast.iter().find(|p| p.month == month).map(|p| p.predicted);

    let mut covered = BTreeSet::new();
    let mut rows: Vec<ChartRow> = dataset
        .points_for(product)
        .map(|sp| {
            covered.insert(sp.month);
            ChartRow {
                month: sp.month,
                actual: Some(sp.quantity),
                predicted: lookup(sp.month),
            }
        })
        .collect();

    rows.extend(
        forecast
            .iter()
            .filter(|p| covered.insert(p.month))
            .map(|p| ChartRow {
                month: p.month,
                actual: None,
                predicted: Some(p.predicted),
            }),
    );

    if sort_by_month {
        rows.sort_by_key(|r| r.month);
    }
    rows
}
