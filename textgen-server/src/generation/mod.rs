//! Text generation
//!
//! - [`params`]: parsing and clamping of request parameters
//! - [`postprocess`]: prompt stripping and end-of-text truncation
//! - [`service`]: the request-level `generate` operation

pub mod params;
pub mod postprocess;
pub mod service;

pub use params::GenerationRequest;
pub use postprocess::{clean_output, END_OF_TEXT};
pub use service::{GenerationResult, GenerationService};
