/// Data layer: core types, loading, and normalization.
///
/// Architecture:
/// ```text
///        .csv
///          │
///          ▼
///   ┌────────────┐
///   │   loader    │  parse file → Vec<RawRecord>
///   └────────────┘
///          │
///          ▼
///   ┌────────────┐
///   │ normalize   │  filter + reshape → Dataset (month, product, quantity)
///   └────────────┘
///          │
///          ▼
///   ┌────────────┐
///   │  Dataset    │  Vec<SalesPoint>, product index
///   └────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod normalize;

use std::path::Path;

use anyhow::Result;

use crate::config::AppConfig;
use model::Dataset;

/// Ingest and normalize a file in one step.
pub fn load_dataset(path: &Path, config: &AppConfig) -> Result<Dataset> {
    let records = loader::load_file(path)?;
    Ok(normalize::normalize(&records, &config.columns, config.row_limit))
}
