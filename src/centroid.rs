use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::Path;

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::backend::{LabelClassifier, TrainingBackend, TrainingError, TrainingExample};

fn normalize(vec: &Array1<f32>) -> Array1<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Centroid {
    sum: Array1<f32>,
    count: u32,
}

impl Centroid {
    fn mean(&self) -> Array1<f32> {
        &self.sum / self.count as f32
    }
}

/// Running per-label centroid classifier scored by cosine similarity.
///
/// Each label's prototype is the mean of every feature vector ever trained
/// under it; prediction scores an input by the cosine similarity between
/// its normalized vector and each normalized prototype. A freshly created
/// model knows no labels and scores everything as an empty mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroidModel {
    dim: usize,
    centroids: HashMap<String, Centroid>,
}

impl NearestCentroidModel {
    /// Creates a model with no observed examples, suitable as the bundled
    /// default artifact.
    pub fn empty(dim: usize) -> Self {
        Self {
            dim,
            centroids: HashMap::new(),
        }
    }

    /// Folds one labeled example into the model, creating the label's
    /// centroid on first sight.
    pub fn observe(&mut self, example: &TrainingExample) {
        match self.centroids.get_mut(&example.label) {
            Some(centroid) => {
                centroid.sum += &example.features;
                centroid.count += 1;
            }
            None => {
                self.centroids.insert(
                    example.label.clone(),
                    Centroid {
                        sum: example.features.clone(),
                        count: 1,
                    },
                );
            }
        }
        debug!(
            "observed example for label '{}' ({} labels known)",
            example.label,
            self.centroids.len()
        );
    }

    /// The labels this model has seen at least one example for.
    pub fn labels(&self) -> Vec<String> {
        self.centroids.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}

impl LabelClassifier for NearestCentroidModel {
    fn predict_scores(&self, features: &Array1<f32>) -> HashMap<String, f32> {
        let input = normalize(features);
        self.centroids
            .iter()
            .map(|(label, centroid)| {
                let prototype = normalize(&centroid.mean());
                (label.clone(), input.dot(&prototype))
            })
            .collect()
    }
}

/// Built-in training backend over [`NearestCentroidModel`].
///
/// Loads the base artifact from the given path, folds the single example
/// in, and hands back the grown model. Persisting the result is the
/// orchestrator's job, not the backend's.
#[derive(Debug, Clone, Default)]
pub struct CentroidTrainer;

impl TrainingBackend for CentroidTrainer {
    type Model = NearestCentroidModel;

    fn train(
        &self,
        base_model: &Path,
        example: TrainingExample,
    ) -> impl Future<Output = Result<Self::Model, TrainingError>> + Send {
        let base = base_model.to_path_buf();
        async move {
            let bytes = fs::read(&base).map_err(|source| TrainingError::BaseModelUnavailable {
                path: base.clone(),
                source,
            })?;
            let mut model: NearestCentroidModel = bincode::deserialize(&bytes)?;
            model.observe(&example);
            Ok(model)
        }
    }
}
