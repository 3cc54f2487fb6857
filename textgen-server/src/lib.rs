//! # textgen-server
//!
//! HTTP text generation server that keeps one model resident at a time.
//!
//! Requests name a run; the [`ResidencyManager`] loads it on first use and
//! swaps it out when a request names a different one. The
//! [`GenerationService`] clamps request parameters, runs generation against
//! the resident model, and cleans up the output.
//!
//! Endpoints:
//! - `POST /generate`: generate text from a prompt
//! - `GET /health`: liveness plus the resident run name
//! - `GET /api/models`: runs available in the checkpoint directory

pub mod api;
pub mod backend;
pub mod config;
pub mod errors;
pub mod generation;
pub mod observability;
pub mod residency;
pub mod state;

pub use config::Config;
pub use generation::{GenerationRequest, GenerationResult, GenerationService};
pub use residency::{ModelLoader, ResidencyManager};
pub use state::AppState;
