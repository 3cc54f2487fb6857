//! Bundled model runtime
//!
//! Serves runs stored as plain-text checkpoints so the server works without an
//! external inference engine. Any other runtime can be plugged in through
//! [`crate::residency::ModelLoader`].

pub mod bigram;
pub mod checkpoint;
pub mod sampling;

pub use checkpoint::{available_runs, list_run_names, CheckpointLoader};
