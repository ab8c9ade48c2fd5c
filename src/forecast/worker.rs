use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::config::ModelConfig;
use crate::data::model::Dataset;
use crate::error::ForecastError;

use super::{CancelToken, ForecastOutcome, Horizon, TrainingEvent, forecast_products};

// ---------------------------------------------------------------------------
// Background training job
// ---------------------------------------------------------------------------

/// Messages sent from the worker thread to the UI.
#[derive(Debug)]
pub enum WorkerMessage {
    Progress(TrainingEvent),
    Done(ForecastOutcome),
}

/// A forecast running on its own thread.  Dropping the job cancels it.
pub struct TrainingJob {
    receiver: Receiver<WorkerMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl TrainingJob {
    /// Start forecasting `products` of `dataset` in the background.
    pub fn spawn(
        dataset: Dataset,
        products: Vec<String>,
        horizon: Horizon,
        config: ModelConfig,
    ) -> Result<Self, ForecastError> {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::default();
        let worker_cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name("forecast".to_string())
            .spawn(move || {
                let progress = tx.clone();
                let outcome = forecast_products(
                    &dataset,
                    &products,
                    horizon,
                    &config,
                    &worker_cancel,
                    |event| {
                        // The UI may have gone away; nothing to do then.
                        let _ = progress.send(WorkerMessage::Progress(event));
                    },
                );
                let _ = tx.send(WorkerMessage::Done(outcome));
            })
            .map_err(|e| ForecastError::Worker(e.to_string()))?;

        Ok(TrainingJob {
            receiver: rx,
            cancel,
            handle: Some(handle),
        })
    }

    /// Ask the worker to stop before its next product.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Collect every message available right now, without blocking.
    ///
    /// A worker that vanished without reporting yields an empty, cancelled
    /// outcome so the caller never waits forever.
    pub fn drain(&mut self) -> Vec<WorkerMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(msg) => messages.push(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !messages.iter().any(|m| matches!(m, WorkerMessage::Done(_))) {
                        log::error!("Forecast worker exited without a result");
                        messages.push(WorkerMessage::Done(ForecastOutcome {
                            cancelled: true,
                            ..ForecastOutcome::default()
                        }));
                    }
                    self.join();
                    break;
                }
            }
        }
        messages
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Forecast worker panicked");
            }
        }
    }
}

impl Drop for TrainingJob {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
