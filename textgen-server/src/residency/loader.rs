//! Seam between the residency manager and a model runtime.
//!
//! A [`ModelLoader`] turns a run name into a live [`ExecutionContext`]. The
//! residency manager never looks inside either; swapping the bundled
//! checkpoint runtime for another one only means implementing these two
//! traits.

use serde::{Deserialize, Serialize};

use crate::errors::{GenerationError, ModelLoadError};

/// Sampling parameters handed to an execution context.
///
/// Values are already clamped by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Text the model continues from
    pub prompt: String,
    /// Number of tokens to generate per candidate
    pub length: usize,
    /// Temperature for sampling (lower = more deterministic)
    pub temperature: f64,
    /// Top-p (nucleus) sampling threshold
    pub top_p: f64,
    /// Number of candidates to produce
    pub nsamples: usize,
    /// Candidates produced per batch
    pub batch_size: usize,
}

/// Loaded weights plus whatever runtime session is needed to run them.
pub trait ExecutionContext: Send {
    /// Produce up to `params.nsamples` candidate texts.
    ///
    /// Candidates echo the prompt verbatim as a prefix, the way GPT-2 style
    /// runtimes do; stripping it is the caller's job.
    fn generate(&mut self, params: &SamplingParams) -> Result<Vec<String>, GenerationError>;

    /// Release runtime resources. Called exactly once, right before the
    /// context is dropped.
    fn close(&mut self);
}

/// Builds execution contexts for named runs.
pub trait ModelLoader: Send + Sync {
    /// Load the weights for `run_name` into a fresh execution context.
    ///
    /// Must either return a fully-initialized context or an error; a
    /// half-built context is never handed out.
    fn load(&self, run_name: &str) -> Result<Box<dyn ExecutionContext>, ModelLoadError>;
}
