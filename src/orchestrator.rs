use std::path::Path;

use log::{error, info, warn};

use crate::backend::{TrainingBackend, TrainingError, TrainingExample};
use crate::embedding::WordEmbedding;
use crate::store::{ModelStore, StoreError};
use crate::vectorizer::Vectorizer;

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("training backend failed: {0}")]
    Training(#[from] TrainingError),
    #[error("failed to persist updated model: {0}")]
    Persistence(#[from] StoreError),
    #[error("updated model could not be reloaded after save")]
    ReloadFailed,
    #[error("update task was aborted before completing")]
    Aborted,
}

/// Resolution of a single orchestrated update.
#[derive(Debug)]
pub enum UpdateRun<M> {
    /// The model was trained, durably saved, and reloaded; the carried
    /// handle is the canonical in-memory model the caller should swap in.
    Applied { label: String, model: M },
    /// The input had no embeddable tokens, so no training happened and
    /// nothing on disk or in memory changed.
    SkippedNoFeatures,
}

/// Drives one incremental-training operation against the training backend.
///
/// An update runs save-then-reload-then-resolve, in that order: the new
/// artifact is durably at the personalized path and reloaded into memory
/// before the caller ever learns the update completed. On any failure the
/// previous live model remains authoritative and nothing is swapped.
#[derive(Debug)]
pub struct UpdateOrchestrator<B: TrainingBackend> {
    store: ModelStore,
    backend: B,
}

impl<B: TrainingBackend> UpdateOrchestrator<B> {
    pub fn new(store: ModelStore, backend: B) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Runs one update: vectorize, train against the base artifact at
    /// `base_model`, save to the personalized path, reload.
    pub async fn run<E: WordEmbedding>(
        &self,
        vectorizer: &Vectorizer<E>,
        base_model: &Path,
        text: &str,
        label: &str,
    ) -> Result<UpdateRun<B::Model>, UpdateError> {
        let Some(features) = vectorizer.vectorize(text) else {
            warn!("update for label '{}' skipped: no embeddable tokens", label);
            return Ok(UpdateRun::SkippedNoFeatures);
        };

        let example = TrainingExample::new(features, label);
        let trained = self
            .backend
            .train(base_model, example)
            .await
            .map_err(|e| {
                error!("incremental training failed, keeping previous model: {}", e);
                e
            })?;

        let personalized = self.store.paths().personalized.clone();
        self.store.save(&trained, &personalized).map_err(|e| {
            error!(
                "could not persist updated model, keeping previous model: {}",
                e
            );
            e
        })?;

        // Reload rather than adopt the trained instance directly: the
        // artifact on disk is the source of truth for the live model.
        let model: B::Model = self
            .store
            .load(&personalized)
            .ok_or(UpdateError::ReloadFailed)?;

        info!("personalized model updated with label '{}'", label);
        Ok(UpdateRun::Applied {
            label: label.to_string(),
            model,
        })
    }
}
