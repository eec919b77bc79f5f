use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One feature vector paired with its user-chosen category label.
///
/// Labels are opaque strings; no fixed label set is enforced anywhere in
/// the lifecycle subsystem.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub features: Array1<f32>,
    pub label: String,
}

impl TrainingExample {
    pub fn new(features: Array1<f32>, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// The prediction capability of a classifier model.
///
/// The model is otherwise opaque to the lifecycle subsystem: it only needs
/// to be scorable and serializable so that the store can persist and reload
/// it as a single artifact.
pub trait LabelClassifier: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Scores the input against every label the model knows, returning a
    /// label-to-score mapping. An empty mapping means the model has nothing
    /// to say about the input.
    fn predict_scores(&self, features: &Array1<f32>) -> HashMap<String, f32>;
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("base model unavailable at {path:?}: {source}")]
    BaseModelUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("base model could not be decoded: {0}")]
    Decode(#[from] bincode::Error),
    #[error("training backend failure: {0}")]
    Backend(String),
}

/// The external incremental-training capability.
///
/// A backend takes the path of the currently live model artifact and a
/// single training example, and asynchronously produces a new model. One
/// example per invocation; batching across calls is not part of the
/// contract.
pub trait TrainingBackend: Send + Sync + 'static {
    type Model: LabelClassifier;

    fn train(
        &self,
        base_model: &Path,
        example: TrainingExample,
    ) -> impl Future<Output = Result<Self::Model, TrainingError>> + Send;
}
