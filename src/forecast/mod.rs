//! Per-product forecasting.
//!
//! For each product the sales points become `(month, row index)` features
//! with the quantity as label; a fresh [`network::DenseRegressor`] is fit
//! and then queried for the months following the product's last sale.
//! Products are processed one at a time and each model is dropped before
//! the next one is built.

pub mod network;
pub mod worker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{FutureIndex, ModelConfig};
use crate::data::model::{Dataset, PredictionPoint, PredictionSet, SalesPoint};
use crate::error::ForecastError;
use network::DenseRegressor;

// ---------------------------------------------------------------------------
// Horizon
// ---------------------------------------------------------------------------

/// Number of future months to forecast; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon(u32);

impl Horizon {
    pub fn new(months: i64) -> Result<Self, ForecastError> {
        u32::try_from(months)
            .ok()
            .filter(|m| *m > 0)
            .map(Horizon)
            .ok_or_else(|| ForecastError::InvalidHorizon(months.to_string()))
    }

    /// Parse user input such as `"6"`.
    pub fn parse(input: &str) -> Result<Self, ForecastError> {
        let trimmed = input.trim();
        let months = trimmed
            .parse::<i64>()
            .map_err(|_| ForecastError::InvalidHorizon(trimmed.to_string()))?;
        Self::new(months)
    }

    /// Reject horizons longer than `max` months.
    pub fn at_most(self, max: u32) -> Result<Self, ForecastError> {
        if self.0 > max {
            return Err(ForecastError::HorizonTooLong {
                requested: self.0,
                max,
            });
        }
        Ok(self)
    }

    pub fn months(self) -> u32 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared flag checked between products.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    Started {
        product: String,
        index: usize,
        total: usize,
    },
    Finished {
        product: String,
        points: Vec<PredictionPoint>,
    },
    /// The product had no sales points; the user must be told.
    Skipped { product: String },
}

/// Result of one predict run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastOutcome {
    pub predictions: PredictionSet,
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Modeling
// ---------------------------------------------------------------------------

/// Training matrix `[month, row index]` and quantity labels.
pub fn training_data(points: &[&SalesPoint]) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((points.len(), 2), |(i, j)| match j {
        0 => points[i].month as f64,
        _ => i as f64,
    });
    let y = points.iter().map(|p| p.quantity).collect();
    (x, y)
}

/// Months and feature rows to query after the last sale.
fn future_inputs(
    last_month: u32,
    rows: usize,
    horizon: Horizon,
    mode: FutureIndex,
) -> Result<(Vec<u32>, Array2<f64>), ForecastError> {
    let months = (1..=horizon.months())
        .map(|k| last_month.checked_add(k))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| ForecastError::InvalidHorizon(horizon.months().to_string()))?;
    let x = Array2::from_shape_fn((months.len(), 2), |(k, j)| match (j, mode) {
        (0, _) => months[k] as f64,
        (_, FutureIndex::Fixed) => rows as f64,
        (_, FutureIndex::Stepped) => (rows + k) as f64,
    });
    Ok((months, x))
}

/// Fit a model on one product's points and forecast `horizon` months.
pub fn forecast_product<R: Rng + ?Sized>(
    product: &str,
    points: &[&SalesPoint],
    horizon: Horizon,
    config: &ModelConfig,
    rng: &mut R,
) -> Result<Vec<PredictionPoint>, ForecastError> {
    let last = points
        .last()
        .ok_or_else(|| ForecastError::EmptyProduct(product.to_string()))?;

    let (months, future) = future_inputs(last.month, points.len(), horizon, config.future_index)?;
    let (x, y) = training_data(points);
    let mut model = DenseRegressor::new(2, config.hidden_units.max(1), rng);
    let loss = model.fit(&x, &y, config, rng);
    log::debug!(
        "{product}: trained {} hidden units on {} rows, final loss {loss:.4}",
        model.hidden_units(),
        points.len()
    );

    let predicted = model.predict(&future);

    Ok(months
        .into_iter()
        .zip(predicted.iter())
        .map(|(month, &predicted)| PredictionPoint { month, predicted })
        .collect())
}

/// Forecast each listed product in turn.
///
/// Products without points in `dataset` are reported through `emit` and
/// skipped.  `cancel` is honoured between products; a cancelled run keeps
/// the forecasts finished so far.
pub fn forecast_products(
    dataset: &Dataset,
    products: &[String],
    horizon: Horizon,
    config: &ModelConfig,
    cancel: &CancelToken,
    mut emit: impl FnMut(TrainingEvent),
) -> ForecastOutcome {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut outcome = ForecastOutcome::default();
    let total = products.len();

    for (index, product) in products.iter().enumerate() {
        if cancel.is_cancelled() {
            log::info!("Forecast cancelled after {index} of {total} products");
            outcome.cancelled = true;
            break;
        }

        emit(TrainingEvent::Started {
            product: product.clone(),
            index,
            total,
        });

        let points: Vec<&SalesPoint> = dataset.points_for(product).collect();
        match forecast_product(product, &points, horizon, config, &mut rng) {
            Ok(forecast) => {
                log::info!("Forecast {} months for '{product}'", forecast.len());
                emit(TrainingEvent::Finished {
                    product: product.clone(),
                    points: forecast.clone(),
                });
                outcome.predictions.insert(product.clone(), forecast);
            }
            Err(e) => {
                log::warn!("Skipping '{product}': {e}");
                emit(TrainingEvent::Skipped {
                    product: product.clone(),
                });
                outcome.skipped.push(product.clone());
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(month: u32, product: &str, quantity: f64) -> SalesPoint {
        SalesPoint {
            month,
            product: product.to_string(),
            quantity,
        }
    }

    fn widget_dataset() -> Dataset {
        Dataset::from_points(vec![sp(1, "Widget", 10.0), sp(2, "Widget", 15.0)], 2)
    }

    fn seeded() -> ModelConfig {
        ModelConfig {
            seed: Some(42),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn horizon_rejects_non_positive_values() {
        assert!(matches!(Horizon::new(0), Err(ForecastError::InvalidHorizon(_))));
        assert!(matches!(Horizon::new(-3), Err(ForecastError::InvalidHorizon(_))));
        assert_eq!(Horizon::new(6).unwrap().months(), 6);
    }

    #[test]
    fn horizon_parses_user_input() {
        assert_eq!(Horizon::parse(" 4 ").unwrap().months(), 4);
        assert!(Horizon::parse("six").is_err());
        assert!(Horizon::parse("").is_err());
        assert!(Horizon::parse("-1").is_err());
    }

    #[test]
    fn training_data_uses_month_and_row_index() {
        let ds = widget_dataset();
        let points: Vec<&SalesPoint> = ds.points_for("Widget").collect();
        let (x, y) = training_data(&points);
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[0, 0]], 1.0);
        assert_eq!(x[[1, 0]], 2.0);
        assert_eq!(x[[0, 1]], 0.0);
        assert_eq!(x[[1, 1]], 1.0);
        assert_eq!(y.to_vec(), vec![10.0, 15.0]);
    }

    #[test]
    fn horizon_limit_is_enforced() {
        let h = Horizon::parse("121").unwrap();
        assert_eq!(
            h.at_most(120),
            Err(ForecastError::HorizonTooLong {
                requested: 121,
                max: 120,
            })
        );
        assert_eq!(Horizon::new(120).unwrap().at_most(120).unwrap().months(), 120);
    }

    #[test]
    fn future_index_modes() {
        let h = Horizon::new(3).unwrap();
        let (months, fixed) = future_inputs(5, 4, h, FutureIndex::Fixed).unwrap();
        assert_eq!(months, vec![6, 7, 8]);
        assert_eq!(fixed.column(1).to_vec(), vec![4.0, 4.0, 4.0]);

        let (_, stepped) = future_inputs(5, 4, h, FutureIndex::Stepped).unwrap();
        assert_eq!(stepped.column(1).to_vec(), vec![4.0, 5.0, 6.0]);
        assert_eq!(stepped.column(0).to_vec(), vec![6.0, 7.0, 8.0]);
    }

    #[test]
    fn future_months_past_u32_are_rejected() {
        let h = Horizon::new(i64::from(u32::MAX)).unwrap();
        let err = future_inputs(12, 3, h, FutureIndex::Stepped).unwrap_err();
        assert_eq!(err, ForecastError::InvalidHorizon(u32::MAX.to_string()));
    }

    #[test]
    fn forecast_returns_horizon_consecutive_months() {
        let ds = widget_dataset();
        let points: Vec<&SalesPoint> = ds.points_for("Widget").collect();
        let mut rng = StdRng::seed_from_u64(1);
        let horizon = Horizon::new(2).unwrap();
        let out = forecast_product("Widget", &points, horizon, &seeded(), &mut rng).unwrap();
        let months: Vec<u32> = out.iter().map(|p| p.month).collect();
        assert_eq!(months, vec![3, 4]);
        assert!(out.iter().all(|p| p.predicted.is_finite()));
    }

    #[test]
    fn forecast_starts_after_last_point_in_dataset_order() {
        let ds = Dataset::from_points(vec![sp(9, "Bolt", 4.0), sp(3, "Bolt", 5.0)], 2);
        let points: Vec<&SalesPoint> = ds.points_for("Bolt").collect();
        let mut rng = StdRng::seed_from_u64(1);
        let horizon = Horizon::new(1).unwrap();
        let out = forecast_product("Bolt", &points, horizon, &seeded(), &mut rng).unwrap();
        assert_eq!(out[0].month, 4);
    }

    #[test]
    fn empty_product_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let horizon = Horizon::new(2).unwrap();
        let err = forecast_product("Ghost", &[], horizon, &seeded(), &mut rng).unwrap_err();
        assert_eq!(err, ForecastError::EmptyProduct("Ghost".into()));
    }

    #[test]
    fn absent_products_are_skipped_and_reported() {
        let ds = widget_dataset();
        let products = vec!["Ghost".to_string(), "Widget".to_string()];
        let mut events = Vec::new();
        let outcome = forecast_products(
            &ds,
            &products,
            Horizon::new(2).unwrap(),
            &seeded(),
            &CancelToken::default(),
            |e| events.push(e),
        );

        assert_eq!(outcome.skipped, vec!["Ghost"]);
        assert!(!outcome.predictions.contains_key("Ghost"));
        assert_eq!(outcome.predictions["Widget"].len(), 2);
        assert!(events.contains(&TrainingEvent::Skipped {
            product: "Ghost".into(),
        }));
        assert!(!outcome.cancelled);
    }

    #[test]
    fn prediction_keys_are_dataset_products() {
        let ds = Dataset::from_points(
            vec![
                sp(1, "Widget", 10.0),
                sp(1, "Gadget", 2.0),
                sp(2, "Widget", 12.0),
            ],
            3,
        );
        let outcome = forecast_products(
            &ds,
            &ds.products,
            Horizon::new(1).unwrap(),
            &seeded(),
            &CancelToken::default(),
            |_| {},
        );
        let keys: Vec<&String> = outcome.predictions.keys().collect();
        assert_eq!(keys, vec!["Gadget", "Widget"]);
    }

    #[test]
    fn cancelled_token_stops_before_next_product() {
        let ds = widget_dataset();
        let cancel = CancelToken::default();
        cancel.cancel();
        let mut started = 0;
        let outcome = forecast_products(
            &ds,
            &ds.products,
            Horizon::new(2).unwrap(),
            &seeded(),
            &cancel,
            |e| {
                if matches!(e, TrainingEvent::Started { .. }) {
                    started += 1;
                }
            },
        );
        assert!(outcome.cancelled);
        assert!(outcome.predictions.is_empty());
        assert_eq!(started, 0);
    }

    #[test]
    fn cancel_during_run_keeps_finished_products_only() {
        let ds = Dataset::from_points(
            vec![
                sp(1, "Widget", 10.0),
                sp(1, "Gadget", 2.0),
                sp(2, "Widget", 12.0),
                sp(2, "Gadget", 3.0),
            ],
            4,
        );
        let cancel = CancelToken::default();
        let trigger = cancel.clone();
        let mut started = Vec::new();
        let outcome = forecast_products(
            &ds,
            &ds.products,
            Horizon::new(2).unwrap(),
            &seeded(),
            &cancel,
            |e| match e {
                TrainingEvent::Started { product, .. } => started.push(product),
                TrainingEvent::Finished { .. } => trigger.cancel(),
                TrainingEvent::Skipped { .. } => {}
            },
        );

        assert!(outcome.cancelled);
        assert_eq!(started, vec!["Widget"]);
        let keys: Vec<&String> = outcome.predictions.keys().collect();
        assert_eq!(keys, vec!["Widget"]);
        assert_eq!(outcome.predictions["Widget"].len(), 2);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let ds = widget_dataset();
        let run = || {
            forecast_products(
                &ds,
                &ds.products,
                Horizon::new(2).unwrap(),
                &seeded(),
                &CancelToken::default(),
                |_| {},
            )
        };
        assert_eq!(run(), run());
    }
}
