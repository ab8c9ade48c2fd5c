use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "SALES_FORECAST_CONFIG";

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

/// Runtime settings.  Every field has a default so partial files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial forecast horizon in months.
    pub horizon: i64,
    /// Largest horizon the user may request.
    pub max_horizon: u32,
    /// Source rows considered per upload.
    pub row_limit: usize,
    pub columns: ColumnConfig,
    pub model: ModelConfig,
    pub chart: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            horizon: 6,
            max_horizon: 120,
            row_limit: 100,
            columns: ColumnConfig::default(),
            model: ModelConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

/// Names of the CSV columns the normalizer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub date: String,
    pub description: String,
    pub quantity: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            date: "created".to_string(),
            description: "short_desc".to_string(),
            quantity: "total_sold".to_string(),
        }
    }
}

/// Row index fed to the model for future months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureIndex {
    /// Every future month reuses the training row count.
    Fixed,
    /// Future month `k` (counting from 0) uses `row_count + k`.
    Stepped,
}

/// Hyper-parameters of the per-product regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_units: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub future_index: FutureIndex,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_units: 64,
            learning_rate: 0.01,
            epochs: 100,
            batch_size: 32,
            future_index: FutureIndex::Stepped,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Sort merged chart rows by month instead of keeping source order.
    pub sort_by_month: bool,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).context("parsing config JSON")
    }

    /// Load from `$SALES_FORECAST_CONFIG`, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", Path::new(&path).display());
                cfg
            }
            Err(e) => {
                log::warn!("Ignoring config file: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_six_month_forecast() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.horizon, 6);
        assert_eq!(cfg.max_horizon, 120);
        assert_eq!(cfg.row_limit, 100);
        assert_eq!(cfg.model.hidden_units, 64);
        assert_eq!(cfg.model.epochs, 100);
        assert!((cfg.model.learning_rate - 0.01).abs() < 1e-12);
        assert_eq!(cfg.columns.date, "created");
        assert!(!cfg.chart.sort_by_month);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "horizon": 3,
            "max_horizon": 24,
            "model": { "future_index": "fixed", "seed": 7 }
        }"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.horizon, 3);
        assert_eq!(cfg.max_horizon, 24);
        assert_eq!(cfg.model.future_index, FutureIndex::Fixed);
        assert_eq!(cfg.model.seed, Some(7));
        assert_eq!(cfg.model.hidden_units, 64);
        assert_eq!(cfg.columns, ColumnConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::from_file(Path::new("/nonexistent/forecast.json")).is_err());
    }
}
