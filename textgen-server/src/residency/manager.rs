//! Single-slot model residency.
//!
//! At most one model is resident at a time. A request naming the resident
//! run reuses it; a request naming any other run releases the resident model
//! and loads the new one (capacity-1 cache, evict on every miss).
//!
//! The slot lock is held by the returned [`ResidentModel`] guard, so the
//! ensure-then-generate sequence is atomic: no other request can swap the
//! model out from under an in-flight generation.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::loader::{ExecutionContext, ModelLoader, SamplingParams};
use crate::errors::{GenerationError, ModelLoadError};

/// A loaded model instance bound to one run name.
pub struct ModelHandle {
    run_name: String,
    context: Box<dyn ExecutionContext>,
    loaded_at: Instant,
    live: bool,
}

impl ModelHandle {
    fn new(run_name: &str, context: Box<dyn ExecutionContext>) -> Self {
        Self {
            run_name: run_name.to_string(),
            context,
            loaded_at: Instant::now(),
            live: true,
        }
    }

    /// Run name this handle was loaded for
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Whether the execution context is still open
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// When the weights finished loading
    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    /// Run generation against this handle's execution context.
    pub fn generate(&mut self, params: &SamplingParams) -> Result<Vec<String>, GenerationError> {
        if !self.live {
            return Err(GenerationError::ContextClosed {
                run_name: self.run_name.clone(),
            });
        }
        self.context.generate(params)
    }

    fn release(mut self) {
        self.context.close();
        self.live = false;
        debug!(
            run_name = %self.run_name,
            resident_secs = self.loaded_at.elapsed().as_secs(),
            "Released execution context"
        );
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("run_name", &self.run_name)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

/// Exclusive access to the resident model.
///
/// Holds the residency lock until dropped.
pub struct ResidentModel<'a> {
    handle: MappedMutexGuard<'a, ModelHandle>,
}

impl Deref for ResidentModel<'_> {
    type Target = ModelHandle;

    fn deref(&self) -> &ModelHandle {
        &self.handle
    }
}

impl DerefMut for ResidentModel<'_> {
    fn deref_mut(&mut self) -> &mut ModelHandle {
        &mut self.handle
    }
}

/// Counters describing residency churn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResidencyStats {
    /// Successful loads
    pub loads: u64,
    /// Loads that returned an error
    pub failed_loads: u64,
    /// Execution contexts released
    pub releases: u64,
    /// Requests served by the already-resident model
    pub hits: u64,
}

#[derive(Default)]
struct Counters {
    loads: AtomicU64,
    failed_loads: AtomicU64,
    releases: AtomicU64,
    hits: AtomicU64,
}

/// Owns the single resident model and the lock that guards it.
pub struct ResidencyManager {
    loader: Arc<dyn ModelLoader>,
    slot: Mutex<Option<ModelHandle>>,
    /// Mirror of the resident run name for status queries.
    /// Only written while `slot` is locked.
    current: RwLock<Option<String>>,
    counters: Counters,
}

impl ResidencyManager {
    /// Create a manager with nothing resident
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
            current: RwLock::new(None),
            counters: Counters::default(),
        }
    }

    /// Make `run_name` the resident model and return exclusive access to it.
    ///
    /// On a hit the resident handle is returned untouched. On a miss the
    /// resident handle is released first, then the new one is loaded. If that
    /// load fails the manager is left unloaded and the error is returned.
    pub fn ensure_model(&self, run_name: &str) -> Result<ResidentModel<'_>, ModelLoadError> {
        let mut slot = self.slot.lock();

        let hit = matches!(slot.as_ref(), Some(handle) if handle.run_name == run_name);

        if hit {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(run_name = %run_name, "Resident model hit");
        } else {
            if let Some(previous) = slot.take() {
                info!(
                    from = %previous.run_name,
                    to = %run_name,
                    "Swapping resident model"
                );
                *self.current.write() = None;
                previous.release();
                self.counters.releases.fetch_add(1, Ordering::Relaxed);
            }

            let started = Instant::now();
            match self.loader.load(run_name) {
                Ok(context) => {
                    *slot = Some(ModelHandle::new(run_name, context));
                    *self.current.write() = Some(run_name.to_string());
                    self.counters.loads.fetch_add(1, Ordering::Relaxed);
                    info!(
                        run_name = %run_name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Model loaded"
                    );
                }
                Err(e) => {
                    self.counters.failed_loads.fetch_add(1, Ordering::Relaxed);
                    warn!(run_name = %run_name, error = %e, "Model load failed, manager is unloaded");
                    return Err(e);
                }
            }
        }

        MutexGuard::try_map(slot, |slot| slot.as_mut())
            .map(|handle| ResidentModel { handle })
            .map_err(|_| ModelLoadError::Corrupt {
                run_name: run_name.to_string(),
                reason: "no model resident after load".to_string(),
            })
    }

    /// Run name of the resident model, `None` if nothing is loaded.
    ///
    /// Does not wait for in-flight generations.
    pub fn current_run_name(&self) -> Option<String> {
        self.current.read().clone()
    }

    /// Release the resident model, if any.
    pub fn unload(&self) {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.take() {
            info!(run_name = %previous.run_name, "Unloading resident model");
            *self.current.write() = None;
            previous.release();
            self.counters.releases.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Snapshot of the residency counters
    pub fn stats(&self) -> ResidencyStats {
        ResidencyStats {
            loads: self.counters.loads.load(Ordering::Relaxed),
            failed_loads: self.counters.failed_loads.load(Ordering::Relaxed),
            releases: self.counters.releases.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    /// Records every load and close so tests can count resource churn.
    #[derive(Default)]
    struct RecordingLoader {
        events: Arc<StdMutex<Vec<String>>>,
        fail: HashSet<String>,
    }

    impl RecordingLoader {
        fn failing(names: &[&str]) -> Self {
            Self {
                fail: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct RecordingContext {
        run_name: String,
        events: Arc<StdMutex<Vec<String>>>,
    }

    impl ExecutionContext for RecordingContext {
        fn generate(&mut self, params: &SamplingParams) -> Result<Vec<String>, GenerationError> {
            Ok(vec![format!("{} [{}]", params.prompt, self.run_name)])
        }

        fn close(&mut self) {
            self.events.lock().unwrap().push(format!("close:{}", self.run_name));
        }
    }

    impl ModelLoader for RecordingLoader {
        fn load(&self, run_name: &str) -> Result<Box<dyn ExecutionContext>, ModelLoadError> {
            if self.fail.contains(run_name) {
                return Err(ModelLoadError::CheckpointNotFound {
                    run_name: run_name.to_string(),
                    path: run_name.into(),
                });
            }
            self.events.lock().unwrap().push(format!("load:{}", run_name));
            Ok(Box::new(RecordingContext {
                run_name: run_name.to_string(),
                events: self.events.clone(),
            }))
        }
    }

    fn params(prompt: &str) -> SamplingParams {
        SamplingParams {
            prompt: prompt.to_string(),
            length: 10,
            temperature: 0.7,
            top_p: 0.9,
            nsamples: 1,
            batch_size: 1,
        }
    }

    #[test]
    fn test_starts_unloaded() {
        let manager = ResidencyManager::new(Arc::new(RecordingLoader::default()));
        assert_eq!(manager.current_run_name(), None);
        assert_eq!(manager.stats(), ResidencyStats::default());
    }

    #[test]
    fn test_same_run_loads_once() {
        let loader = Arc::new(RecordingLoader::default());
        let manager = ResidencyManager::new(loader.clone());

        drop(manager.ensure_model("A").unwrap());
        drop(manager.ensure_model("A").unwrap());

        assert_eq!(loader.events(), vec!["load:A"]);
        let stats = manager.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.releases, 0);
    }

    #[test]
    fn test_different_run_swaps() {
        let loader = Arc::new(RecordingLoader::default());
        let manager = ResidencyManager::new(loader.clone());

        drop(manager.ensure_model("A").unwrap());
        let resident = manager.ensure_model("B").unwrap();
        assert_eq!(resident.run_name(), "B");
        assert!(resident.is_live());
        drop(resident);

        // Release of A happens before load of B
        assert_eq!(loader.events(), vec!["load:A", "close:A", "load:B"]);
        assert_eq!(manager.current_run_name().as_deref(), Some("B"));
        assert_eq!(manager.stats().loads, 2);
        assert_eq!(manager.stats().releases, 1);
    }

    #[test]
    fn test_failed_load_leaves_manager_unloaded() {
        let loader = Arc::new(RecordingLoader::failing(&["broken"]));
        let manager = ResidencyManager::new(loader.clone());

        drop(manager.ensure_model("A").unwrap());
        let err = manager.ensure_model("broken").err().unwrap();
        assert!(matches!(err, ModelLoadError::CheckpointNotFound { .. }));

        assert_eq!(manager.current_run_name(), None);
        assert_eq!(loader.events(), vec!["load:A", "close:A"]);
        assert_eq!(manager.stats().failed_loads, 1);

        // Requesting A again reloads it from scratch
        drop(manager.ensure_model("A").unwrap());
        assert_eq!(loader.events(), vec!["load:A", "close:A", "load:A"]);
        assert_eq!(manager.current_run_name().as_deref(), Some("A"));
    }

    #[test]
    fn test_resident_model_generates() {
        let manager = ResidencyManager::new(Arc::new(RecordingLoader::default()));
        let mut resident = manager.ensure_model("A").unwrap();
        let out = resident.generate(&params("hi")).unwrap();
        assert_eq!(out, vec!["hi [A]"]);
    }

    #[test]
    fn test_unload_releases() {
        let loader = Arc::new(RecordingLoader::default());
        let manager = ResidencyManager::new(loader.clone());

        drop(manager.ensure_model("A").unwrap());
        manager.unload();
        manager.unload();

        assert_eq!(manager.current_run_name(), None);
        assert_eq!(loader.events(), vec!["load:A", "close:A"]);
    }

    #[test]
    fn test_concurrent_swaps_never_observe_foreign_handle() {
        let manager = Arc::new(ResidencyManager::new(Arc::new(RecordingLoader::default())));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                std::thread::spawn(move || {
                    let name = if i % 2 == 0 { "A" } else { "B" };
                    for _ in 0..50 {
                        let mut resident = manager.ensure_model(name).unwrap();
                        assert_eq!(resident.run_name(), name);
                        let out = resident.generate(&params("p")).unwrap();
                        assert_eq!(out[0], format!("p [{}]", name));
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        let stats = manager.stats();
        assert_eq!(stats.loads, stats.releases + 1);
        assert_eq!(stats.loads + stats.hits, 400);
    }
}
