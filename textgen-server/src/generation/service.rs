//! Generation service
//!
//! Validates a raw request, makes the requested model resident, runs
//! generation while still holding the residency lock, and cleans up the
//! first candidate.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::params::GenerationRequest;
use super::postprocess::clean_output;
use crate::errors::{GenerationError, ServiceError};
use crate::residency::ResidencyManager;

/// Generated text plus the effective parameters that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub generated_text: String,
    pub parameters: GenerationRequest,
}

pub struct GenerationService {
    residency: Arc<ResidencyManager>,
    default_run_name: String,
}

impl GenerationService {
    pub fn new(residency: Arc<ResidencyManager>, default_run_name: impl Into<String>) -> Self {
        Self {
            residency,
            default_run_name: default_run_name.into(),
        }
    }

    pub fn residency(&self) -> &ResidencyManager {
        &self.residency
    }

    pub fn default_run_name(&self) -> &str {
        &self.default_run_name
    }

    /// Run one generation request end to end.
    ///
    /// Blocks for the duration of any model swap and of the generation
    /// itself. Errors are returned unchanged; nothing is retried.
    pub fn generate(&self, raw: &Value) -> Result<GenerationResult, ServiceError> {
        let request = GenerationRequest::from_json(raw, &self.default_run_name)?;

        debug!(
            run_name = %request.run_name,
            length = request.length,
            nsamples = request.nsamples,
            "Generation request accepted"
        );

        let started = Instant::now();
        let candidates = {
            let mut resident = self.residency.ensure_model(&request.run_name)?;
            resident.generate(&request.sampling())?
        };

        let first = candidates
            .into_iter()
            .next()
            .ok_or(GenerationError::NoOutput)?;
        let generated_text = clean_output(&first, &request.prompt);

        info!(
            run_name = %request.run_name,
            chars = generated_text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation complete"
        );

        Ok(GenerationResult {
            generated_text,
            parameters: request,
        })
    }
}
