use std::path::PathBuf;
use std::sync::Arc;

use crate::generation::GenerationService;
use crate::residency::{ModelLoader, ResidencyManager};

/// Axum application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Generation service (owns the residency manager)
    pub generator: Arc<GenerationService>,
    /// Directory scanned by the model listing endpoint
    pub checkpoint_dir: PathBuf,
}

impl AppState {
    /// Create application state around a model loader
    pub fn new(
        loader: Arc<dyn ModelLoader>,
        default_run_name: impl Into<String>,
        checkpoint_dir: impl Into<PathBuf>,
    ) -> Self {
        let residency = Arc::new(ResidencyManager::new(loader));
        Self {
            generator: Arc::new(GenerationService::new(residency, default_run_name)),
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    pub fn residency(&self) -> &ResidencyManager {
        self.generator.residency()
    }
}
