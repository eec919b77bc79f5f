//! On-device, incrementally-trainable text classification for short
//! transaction descriptions.
//!
//! Predictions and model updates happen entirely on-device for a single
//! local user: free text is turned into a fixed 128-dimension feature
//! vector, scored against the live classifier model, and single-example
//! training updates mutate a personalized model that survives restarts.
//! Saves are atomic (staging write + rename), loads are lazy and
//! fall back to the bundled default model when no personalized artifact
//! exists or the artifact is corrupt.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use moneta::{
//!     CentroidTrainer, HashedEmbedding, ModelPaths, ModelStore, NearestCentroidModel,
//!     PredictionService, FEATURE_DIM,
//! };
//!
//! let dir = tempfile::tempdir()?;
//! let paths = ModelPaths::in_dir(dir.path());
//!
//! // Seed the bundled default artifact (normally shipped with the app).
//! let store = ModelStore::new(paths.clone());
//! store.save(&NearestCentroidModel::empty(FEATURE_DIM), &paths.default)?;
//!
//! let service = PredictionService::new(paths, HashedEmbedding::default(), CentroidTrainer)?;
//!
//! // Nothing trained yet: no label clears the confidence threshold.
//! assert_eq!(service.predict("coffee shop"), None);
//! # Ok(())
//! # }
//! ```
//!
//! # Updating the model
//!
//! [`PredictionService::update`] returns immediately; its effects (save,
//! reload, live-model swap) land later and the returned handle resolves on
//! the caller's own context once they have:
//!
//! ```rust
//! # use moneta::{
//! #     CentroidTrainer, HashedEmbedding, ModelPaths, ModelStore, NearestCentroidModel,
//! #     PredictionService, UpdateOutcome, FEATURE_DIM,
//! # };
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::tempdir()?;
//! # let paths = ModelPaths::in_dir(dir.path());
//! # let store = ModelStore::new(paths.clone());
//! # store.save(&NearestCentroidModel::empty(FEATURE_DIM), &paths.default)?;
//! # let service = PredictionService::new(paths, HashedEmbedding::default(), CentroidTrainer)?;
//! let outcome = service.update("coffee shop", "Dining").await?;
//! assert_eq!(outcome, UpdateOutcome::Applied { label: "Dining".to_string() });
//! assert_eq!(service.predict("coffee shop"), Some("Dining".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod centroid;
pub mod embedding;
pub mod orchestrator;
pub mod service;
pub mod store;
pub mod vectorizer;

pub use backend::{LabelClassifier, TrainingBackend, TrainingError, TrainingExample};
pub use centroid::{CentroidTrainer, NearestCentroidModel};
pub use embedding::{HashedEmbedding, WordEmbedding};
pub use orchestrator::{UpdateError, UpdateOrchestrator, UpdateRun};
pub use service::{
    PredictionService, ServiceError, UpdateHandle, UpdateOutcome, CONFIDENCE_THRESHOLD,
};
pub use store::{ModelPaths, ModelStore, StoreError};
pub use vectorizer::{Vectorizer, FEATURE_DIM};

pub fn init_logger() {
    env_logger::init();
}
