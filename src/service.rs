use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Once, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};

use log::info;
use tokio::sync::{oneshot, Mutex};

use crate::backend::{LabelClassifier, TrainingBackend};
use crate::embedding::WordEmbedding;
use crate::orchestrator::{UpdateError, UpdateOrchestrator, UpdateRun};
use crate::store::{ModelPaths, ModelStore, StoreError};
use crate::vectorizer::Vectorizer;

/// Minimum score a label must strictly exceed to be returned by
/// [`PredictionService::predict`].
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("default model unavailable at {0:?}; the bundled artifact is required")]
    DefaultModelUnavailable(PathBuf),
}

/// Resolution of a completed [`PredictionService::update`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The personalized model was trained, saved, reloaded, and is now live.
    Applied { label: String },
    /// The input had no embeddable tokens; the live model was not touched.
    SkippedNoFeatures,
}

/// Handle to an in-flight update, resolved on the caller's own execution
/// context.
///
/// Awaiting the handle yields only after the new artifact is durably saved,
/// reloaded, and swapped in as the live model, never before. Dropping the
/// handle does not cancel the update; once started, an update runs to
/// completion or failure.
pub struct UpdateHandle {
    rx: oneshot::Receiver<Result<UpdateOutcome, UpdateError>>,
}

impl Future for UpdateHandle {
    type Output = Result<UpdateOutcome, UpdateError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(UpdateError::Aborted)),
            Poll::Pending => Poll::Pending,
        }
    }
}

struct ServiceInner<E, B: TrainingBackend> {
    vectorizer: Vectorizer<E>,
    orchestrator: UpdateOrchestrator<B>,
    default_model: Arc<B::Model>,
    personalized: RwLock<Option<Arc<B::Model>>>,
    lazy_load: Once,
    update_serial: Mutex<()>,
}

/// Top-level façade over prediction and incremental training.
///
/// Holds which model is live (personalized if one has been loaded or
/// trained, else the bundled default), performs a single lazy just-in-time
/// load of the personalized artifact on first use, and serializes updates
/// so at most one is in flight at a time.
///
/// The service is a cheap cloneable handle over shared state; clones share
/// the live model and can be used from any thread.
pub struct PredictionService<E, B: TrainingBackend> {
    inner: Arc<ServiceInner<E, B>>,
}

impl<E, B: TrainingBackend> Clone for PredictionService<E, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<E, B> ServiceInner<E, B>
where
    E: WordEmbedding,
    B: TrainingBackend,
{
    fn store(&self) -> &ModelStore {
        self.orchestrator.store()
    }

    /// Attempts the one-time load of a previously saved personalized model.
    ///
    /// Runs at most once per process, on the first predict or update call,
    /// whichever comes first. Later saves go through the orchestrator's
    /// explicit reload instead; this gate never reopens.
    fn ensure_lazy_load(&self) {
        self.lazy_load.call_once(|| {
            let path = &self.store().paths().personalized;
            if let Some(model) = self.store().load::<B::Model>(path) {
                *write_lock(&self.personalized) = Some(Arc::new(model));
                info!("personalized model loaded from {:?}", path);
            }
        });
    }

    /// The model currently answering predictions.
    fn live_model(&self) -> Arc<B::Model> {
        match read_lock(&self.personalized).as_ref() {
            Some(model) => Arc::clone(model),
            None => Arc::clone(&self.default_model),
        }
    }

    fn personalized_is_live(&self) -> bool {
        read_lock(&self.personalized).is_some()
    }

    async fn run_update(&self, text: &str, label: &str) -> Result<UpdateOutcome, UpdateError> {
        // One update at a time; overlapping calls queue here.
        let _serial = self.update_serial.lock().await;

        self.ensure_lazy_load();

        let paths = self.store().paths();
        let base = if self.personalized_is_live() {
            paths.personalized.clone()
        } else {
            paths.default.clone()
        };

        match self
            .orchestrator
            .run(&self.vectorizer, &base, text, label)
            .await?
        {
            UpdateRun::Applied { label, model } => {
                // Single atomic swap, only after save and reload succeeded.
                *write_lock(&self.personalized) = Some(Arc::new(model));
                Ok(UpdateOutcome::Applied { label })
            }
            UpdateRun::SkippedNoFeatures => Ok(UpdateOutcome::SkippedNoFeatures),
        }
    }
}

impl<E, B> PredictionService<E, B>
where
    E: WordEmbedding + 'static,
    B: TrainingBackend,
{
    /// Constructs the service, eagerly loading the bundled default model.
    ///
    /// A missing or corrupt default artifact is the one unrecoverable
    /// misconfiguration: prediction has no fallback below "default", so
    /// construction fails instead of limping along.
    pub fn new(paths: ModelPaths, embedding: E, backend: B) -> Result<Self, ServiceError> {
        let store = ModelStore::new(paths);

        let default_path = store.paths().default.clone();
        let default_model: B::Model = store
            .load(&default_path)
            .ok_or(ServiceError::DefaultModelUnavailable(default_path))?;

        Ok(Self {
            inner: Arc::new(ServiceInner {
                vectorizer: Vectorizer::new(embedding),
                orchestrator: UpdateOrchestrator::new(store, backend),
                default_model: Arc::new(default_model),
                personalized: RwLock::new(None),
                lazy_load: Once::new(),
                update_serial: Mutex::new(()),
            }),
        })
    }

    /// Predicts a category label for the given transaction description.
    ///
    /// Returns `None` when the text has no embeddable tokens or when no
    /// label's score exceeds [`CONFIDENCE_THRESHOLD`]. Among labels above
    /// the threshold the highest score wins; exact score ties break toward
    /// the lexicographically greatest label, so the result is deterministic.
    pub fn predict(&self, text: &str) -> Option<String> {
        self.inner.ensure_lazy_load();

        let features = self.inner.vectorizer.vectorize(text)?;
        let scores = self.inner.live_model().predict_scores(&features);
        best_label(&scores)
    }

    /// Starts one incremental-training update and returns immediately.
    ///
    /// The returned handle resolves on the caller's context once the
    /// update's effects (save, reload, live-model swap) have all happened;
    /// callers must not assume the model is updated before the handle
    /// resolves. Failures keep the previous live model authoritative and
    /// are carried through the handle's result as well as logged.
    pub fn update(&self, text: &str, label: &str) -> UpdateHandle {
        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        let label = label.to_string();

        tokio::spawn(async move {
            let result = inner.run_update(&text, &label).await;
            // The receiver may have been dropped; the update itself already
            // ran to completion either way.
            let _ = tx.send(result);
        });

        UpdateHandle { rx }
    }

    /// Discards the personalized model, in memory and on disk, reverting
    /// predictions to the bundled default model. Idempotent.
    pub fn reset(&self) -> Result<(), StoreError> {
        *write_lock(&self.inner.personalized) = None;
        let path = self.inner.store().paths().personalized.clone();
        self.inner.store().delete(&path)?;
        info!("personalized model reset; default model is live");
        Ok(())
    }

    /// Copies the currently active persisted model artifact to a
    /// user-visible location.
    pub fn export(&self, destination: &Path) -> Result<(), StoreError> {
        let paths = self.inner.store().paths();
        let source = if self.inner.store().exists(&paths.personalized) {
            paths.personalized.clone()
        } else {
            paths.default.clone()
        };
        self.inner.store().export(&source, destination)
    }
}

fn best_label(scores: &HashMap<String, f32>) -> Option<String> {
    scores
        .iter()
        .filter(|(_, score)| **score > CONFIDENCE_THRESHOLD)
        .max_by(|(label_a, score_a), (label_b, score_b)| {
            score_a
                .partial_cmp(score_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| label_a.cmp(label_b))
        })
        .map(|(label, _)| label.clone())
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<
            PredictionService<crate::embedding::HashedEmbedding, crate::centroid::CentroidTrainer>,
        >();
    }
};
