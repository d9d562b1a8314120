use std::sync::Arc;
use std::time::Instant;

use store::Warehouse;
use tracing::{info, warn};

use crate::{LoadOutcome, LoadRequest, PipelineError, ProcessingResult};

/// Writes one result row, idempotently per row identity key.
#[derive(Clone)]
pub struct Loader {
    warehouse: Arc<dyn Warehouse>,
}

impl Loader {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    /// Validates an HTTP request body and loads it.
    pub async fn handle(&self, raw: LoadRequest) -> Result<LoadOutcome, PipelineError> {
        let result = raw.validate()?;
        self.load(&result).await
    }

    /// Upserts `result`.
    ///
    /// Row-level rejections are returned as [`LoadOutcome::Error`]; only an
    /// unreachable warehouse is an `Err`.
    pub async fn load(&self, result: &ProcessingResult) -> Result<LoadOutcome, PipelineError> {
        let start = Instant::now();
        let row = result.to_row()?;
        let key = row.key();

        let errors = match self.warehouse.upsert(&row).await {
            Ok(errors) => errors,
            Err(err) => {
                let err = PipelineError::from(err);
                warn!(
                    row_key = %key,
                    error = %err,
                    elapsed_micros = start.elapsed().as_micros(),
                    "load_failure"
                );
                return Err(err);
            }
        };

        if errors.is_empty() {
            info!(
                row_key = %key,
                total_words = result.total_words,
                elapsed_micros = start.elapsed().as_micros(),
                "load_success"
            );
            Ok(LoadOutcome::Success)
        } else {
            warn!(
                row_key = %key,
                rejected = errors.len(),
                errors = ?errors,
                elapsed_micros = start.elapsed().as_micros(),
                "load_rejected"
            );
            Ok(LoadOutcome::Error { errors })
        }
    }
}
