//! Checkpoint-directory model runtime.
//!
//! Layout, one directory per run:
//!
//! ```text
//! <checkpoint_dir>/
//!   <run_name>/
//!     corpus.txt      required, training text; documents separated by <|endoftext|>
//!     hparams.json    optional, { "seed": 1234 } for reproducible sampling
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::bigram::BigramModel;
use crate::errors::{GenerationError, ModelLoadError};
use crate::residency::{ExecutionContext, ModelLoader, SamplingParams};

pub const CORPUS_FILE: &str = "corpus.txt";
pub const HPARAMS_FILE: &str = "hparams.json";

/// Optional per-run settings. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct HParams {
    #[serde(default)]
    seed: Option<u64>,
}

/// Loads runs from a checkpoint directory
#[derive(Debug, Clone)]
pub struct CheckpointLoader {
    root: PathBuf,
}

impl CheckpointLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `run_name`, rejecting names that are not a single
    /// plain path component.
    pub fn run_dir(&self, run_name: &str) -> Result<PathBuf, ModelLoadError> {
        let mut components = Path::new(run_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !run_name.contains(['/', '\\']) => {
                Ok(self.root.join(run_name))
            }
            _ => Err(ModelLoadError::InvalidRunName(run_name.to_string())),
        }
    }

    fn read_hparams(&self, run_name: &str, dir: &Path) -> Result<HParams, ModelLoadError> {
        let path = dir.join(HPARAMS_FILE);
        if !path.exists() {
            return Ok(HParams::default());
        }

        let data = std::fs::read_to_string(&path).map_err(|source| ModelLoadError::Io {
            run_name: run_name.to_string(),
            source,
        })?;

        serde_json::from_str(&data).map_err(|e| ModelLoadError::Corrupt {
            run_name: run_name.to_string(),
            reason: format!("{}: {}", HPARAMS_FILE, e),
        })
    }
}

impl ModelLoader for CheckpointLoader {
    fn load(&self, run_name: &str) -> Result<Box<dyn ExecutionContext>, ModelLoadError> {
        let dir = self.run_dir(run_name)?;
        if !dir.is_dir() {
            return Err(ModelLoadError::CheckpointNotFound {
                run_name: run_name.to_string(),
                path: dir,
            });
        }

        let corpus_path = dir.join(CORPUS_FILE);
        if !corpus_path.is_file() {
            return Err(ModelLoadError::MissingFile {
                run_name: run_name.to_string(),
                file: PathBuf::from(CORPUS_FILE),
            });
        }

        let hparams = self.read_hparams(run_name, &dir)?;

        info!(run_name = %run_name, path = %dir.display(), "Loading checkpoint");

        let corpus = std::fs::read_to_string(&corpus_path).map_err(|source| ModelLoadError::Io {
            run_name: run_name.to_string(),
            source,
        })?;

        let model = BigramModel::from_corpus(&corpus).map_err(|reason| ModelLoadError::Corrupt {
            run_name: run_name.to_string(),
            reason,
        })?;

        debug!(
            run_name = %run_name,
            vocab_size = model.vocab_size(),
            seeded = hparams.seed.is_some(),
            "Checkpoint weights built"
        );

        let rng = match hparams.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Box::new(BigramContext {
            run_name: run_name.to_string(),
            model: Some(Arc::new(model)),
            rng,
        }))
    }
}

/// Execution context over a loaded bigram model
struct BigramContext {
    run_name: String,
    model: Option<Arc<BigramModel>>,
    rng: StdRng,
}

impl ExecutionContext for BigramContext {
    fn generate(&mut self, params: &SamplingParams) -> Result<Vec<String>, GenerationError> {
        let model = self
            .model
            .clone()
            .ok_or_else(|| GenerationError::ContextClosed {
                run_name: self.run_name.clone(),
            })?;

        let batch_size = params.batch_size.max(1);
        let mut candidates = Vec::with_capacity(params.nsamples);
        while candidates.len() < params.nsamples {
            let batch = batch_size.min(params.nsamples - candidates.len());
            for _ in 0..batch {
                candidates.push(model.continue_prompt(
                    &params.prompt,
                    params.length,
                    params.temperature,
                    params.top_p,
                    &mut self.rng,
                ));
            }
            debug!(run_name = %self.run_name, batch, "Generated batch");
        }

        Ok(candidates)
    }

    fn close(&mut self) {
        self.model = None;
    }
}

/// Names of the runs available under `dir`, hidden entries excluded, sorted.
pub fn list_run_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    Ok(names)
}

/// Like [`list_run_names`], but an unreadable directory yields an empty list.
pub fn available_runs(dir: &Path) -> Vec<String> {
    list_run_names(dir).unwrap_or_else(|e| {
        error!(path = %dir.display(), error = %e, "Error reading checkpoint directory");
        Vec::new()
    })
}
