use thiserror::Error;

/// Failures the forecast workflow reports to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Forecast horizon must be a positive number of months (got {0})")]
    InvalidHorizon(String),

    #[error("Forecast horizon of {requested} months exceeds the limit of {max}")]
    HorizonTooLong { requested: u32, max: u32 },

    #[error("No sales data for product '{0}'")]
    EmptyProduct(String),

    #[error("No dataset loaded")]
    NoDataset,

    #[error("A forecast is already running")]
    TrainingInProgress,

    #[error("Could not start forecast worker: {0}")]
    Worker(String),

    #[error("Failed to load file: {0}")]
    Load(String),
}

impl From<anyhow::Error> for ForecastError {
    fn from(err: anyhow::Error) -> Self {
        ForecastError::Load(format!("{err:#}"))
    }
}
