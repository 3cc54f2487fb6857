//! Model residency
//!
//! Keeps exactly one model loaded and swaps it when a request names a
//! different run.
//!
//! - [`ResidencyManager`]: owns the resident slot and its lock
//! - [`ResidentModel`]: lock-holding guard returned by `ensure_model`
//! - [`ModelLoader`] / [`ExecutionContext`]: the runtime seam

pub mod loader;
pub mod manager;

pub use loader::{ExecutionContext, ModelLoader, SamplingParams};
pub use manager::{ModelHandle, ResidencyManager, ResidencyStats, ResidentModel};
