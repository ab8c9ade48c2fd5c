use std::collections::VecDeque;
use std::path::Path;

use crate::chart::{ChartRow, ProductSelection, merge_series};
use crate::color::ColorMap;
use crate::config::AppConfig;
use crate::data::load_dataset;
use crate::data::model::{Dataset, PredictionSet};
use crate::error::ForecastError;
use crate::forecast::worker::{TrainingJob, WorkerMessage};
use crate::forecast::{ForecastOutcome, Horizon, TrainingEvent};

// ---------------------------------------------------------------------------
// Workflow phase
// ---------------------------------------------------------------------------

/// Where the session is in the load → predict workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    DataLoaded,
    Training {
        /// Product currently being fit.
        current: Option<String>,
        done: usize,
        total: usize,
    },
    Predicted,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Normalized upload (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// File name of the current dataset, for the top bar.
    pub source_name: Option<String>,

    /// Forecasts of the last completed run.
    pub predictions: PredictionSet,

    /// Product(s) shown in the chart.
    pub selection: ProductSelection,

    /// Horizon text box contents.
    pub horizon_input: String,

    /// Inline message under the horizon box.
    pub horizon_error: Option<String>,

    pub phase: Phase,

    /// Per-product line colours.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Blocking notices, shown one at a time until dismissed.
    pub notifications: VecDeque<String>,

    job: Option<TrainingJob>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            horizon_input: config.horizon.to_string(),
            config,
            dataset: None,
            source_name: None,
            predictions: PredictionSet::new(),
            selection: ProductSelection::All,
            horizon_error: None,
            phase: Phase::Idle,
            color_map: ColorMap::default(),
            status_message: None,
            notifications: VecDeque::new(),
            job: None,
        }
    }

    // -- Loading --

    /// Read, normalize and install a sales file.
    ///
    /// On failure the current dataset is kept and the error is shown.
    pub fn load_path(&mut self, path: &Path) -> Result<(), ForecastError> {
        match load_dataset(path, &self.config) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} sales points for {} products from {}",
                    dataset.len(),
                    dataset.products.len(),
                    path.display()
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_dataset(dataset, name);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                let err = ForecastError::from(e);
                self.status_message = Some(format!("Error: {err}"));
                Err(err)
            }
        }
    }

    /// Replace the dataset wholesale; earlier forecasts no longer apply.
    pub fn set_dataset(&mut self, dataset: Dataset, source_name: String) {
        if let Some(job) = self.job.take() {
            log::info!("New data loaded, abandoning running forecast");
            job.cancel();
        }

        self.color_map = ColorMap::new(&dataset.products);
        self.status_message = if dataset.is_empty() {
            log::warn!("{source_name}: no usable sales rows");
            Some(format!("{source_name}: no usable sales rows"))
        } else {
            None
        };
        self.dataset = Some(dataset);
        self.source_name = Some(source_name);
        self.predictions.clear();
        self.selection = ProductSelection::All;
        self.horizon_error = None;
        self.phase = Phase::DataLoaded;
    }

    // -- Forecasting --

    pub fn is_training(&self) -> bool {
        self.job.is_some()
    }

    /// Validate the horizon and start training every product.
    pub fn request_prediction(&mut self) -> Result<(), ForecastError> {
        if self.is_training() {
            return Err(ForecastError::TrainingInProgress);
        }
        let Some(dataset) = &self.dataset else {
            self.status_message = Some(ForecastError::NoDataset.to_string());
            return Err(ForecastError::NoDataset);
        };

        let parsed = Horizon::parse(&self.horizon_input)
            .and_then(|h| h.at_most(self.config.max_horizon));
        let horizon = match parsed {
            Ok(h) => h,
            Err(e) => {
                log::warn!("Rejected forecast: {e}");
                self.horizon_error = Some(e.to_string());
                return Err(e);
            }
        };
        self.horizon_error = None;

        let products = dataset.products.clone();
        log::info!(
            "Forecasting {} months for {} products",
            horizon.months(),
            products.len()
        );
        let job = TrainingJob::spawn(
            dataset.clone(),
            products.clone(),
            horizon,
            self.config.model.clone(),
        )
        .inspect_err(|e| self.status_message = Some(e.to_string()))?;

        self.job = Some(job);
        self.status_message = None;
        self.phase = Phase::Training {
            current: None,
            done: 0,
            total: products.len(),
        };
        Ok(())
    }

    /// Ask the running forecast to stop after the current product.
    pub fn cancel_training(&mut self) {
        if let Some(job) = &self.job {
            job.cancel();
            self.status_message = Some("Cancelling after current product…".to_string());
        }
    }

    pub fn is_cancelling(&self) -> bool {
        self.job.as_ref().is_some_and(TrainingJob::is_cancelling)
    }

    /// Apply worker messages.  Returns whether a forecast is still running.
    pub fn poll_training(&mut self) -> bool {
        let messages = match self.job.as_mut() {
            Some(job) => job.drain(),
            None => return false,
        };
        for msg in messages {
            match msg {
                WorkerMessage::Progress(event) => self.apply_event(event),
                WorkerMessage::Done(outcome) => self.finish_training(outcome),
            }
        }
        self.is_training()
    }

    /// Progress update from the worker.
    pub fn apply_event(&mut self, event: TrainingEvent) {
        match event {
            TrainingEvent::Started { product, index, total } => {
                self.phase = Phase::Training {
                    current: Some(product),
                    done: index,
                    total,
                };
            }
            TrainingEvent::Finished { product, points } => {
                log::debug!("{product}: {} forecast points", points.len());
                if let Phase::Training { done, .. } = &mut self.phase {
                    *done += 1;
                }
            }
            TrainingEvent::Skipped { product } => {
                if let Phase::Training { done, .. } = &mut self.phase {
                    *done += 1;
                }
                self.notifications
                    .push_back(format!("No sales data for '{product}'. It was skipped."));
            }
        }
    }

    /// Install the forecasts of a finished (or cancelled) run.
    pub fn finish_training(&mut self, outcome: ForecastOutcome) {
        self.job = None;
        if !outcome.skipped.is_empty() {
            log::warn!("Skipped products without data: {:?}", outcome.skipped);
        }
        if outcome.cancelled {
            self.status_message = Some(format!(
                "Forecast cancelled; {} products finished",
                outcome.predictions.len()
            ));
        }
        self.predictions = outcome.predictions;
        self.phase = Phase::Predicted;
    }

    pub fn dismiss_notification(&mut self) {
        self.notifications.pop_front();
    }

    // -- Presentation --

    pub fn select_product(&mut self, selection: ProductSelection) {
        self.selection = selection;
    }

    /// Products the chart should draw for the current selection.
    pub fn visible_products(&self) -> Vec<String> {
        self.dataset
            .as_ref()
            .map(|ds| self.selection.products(ds))
            .unwrap_or_default()
    }

    /// Merged actual/predicted rows for one product.
    pub fn chart_series(&self, product: &str) -> Vec<ChartRow> {
        match &self.dataset {
            Some(ds) => merge_series(
                ds,
                &self.predictions,
                product,
                self.config.chart.sort_by_month,
            ),
            None => Vec::new(),
        }
    }
}
