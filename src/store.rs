use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode model artifact: {0}")]
    Encode(#[from] bincode::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("no model artifact available to export")]
    NothingToExport,
}

/// The three well-known locations a model artifact can live at.
///
/// `default` holds the read-only bundled model, `personalized` the durable
/// user-trained model (if any), and `staging` a scratch sibling of
/// `personalized` that is only ever meaningful in the middle of a save.
/// Anything found at the staging path after a restart is a leftover from an
/// interrupted write and is never loaded.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub default: PathBuf,
    pub personalized: PathBuf,
    pub staging: PathBuf,
}

impl ModelPaths {
    /// Builds the conventional artifact layout under `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            default: dir.join("default.model"),
            personalized: dir.join("personalized.model"),
            staging: dir.join("personalized.model.tmp"),
        }
    }

    /// Returns the default per-user data directory for model artifacts.
    pub fn default_data_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("MONETA_DATA") {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("moneta");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("moneta");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("moneta")
    }
}

/// Owns the on-disk representation of the default and personalized model
/// artifacts.
///
/// Artifacts are bincode-encoded. Saves are atomic with respect to process
/// crashes and concurrent readers: the full artifact is written to the
/// staging path first and then moved over the destination with a single
/// `rename`, so a reader never observes a partially-written file. The
/// invariant this buys: at every point after process start, the
/// personalized path either does not exist or contains one complete,
/// loadable artifact.
#[derive(Debug, Clone)]
pub struct ModelStore {
    paths: ModelPaths,
}

impl ModelStore {
    pub fn new(paths: ModelPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    /// Loads the artifact at `path`, or `None` if it is missing.
    ///
    /// A corrupt or unreadable artifact is also reported as `None`: a model
    /// that cannot be decoded is never fatal to the caller, which falls back
    /// to whatever model it already has.
    pub fn load<M: DeserializeOwned>(&self, path: &Path) -> Option<M> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read model artifact at {:?}: {}", path, e);
                return None;
            }
        };

        match bincode::deserialize(&bytes) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!(
                    "model artifact at {:?} is corrupt, treating as absent: {}",
                    path, e
                );
                None
            }
        }
    }

    /// Atomically replaces the artifact at `path` with `model`.
    ///
    /// The artifact is fully written to the staging path first; only then is
    /// it moved into place with a single rename. If anything fails before
    /// the rename, `path` is left untouched and the previous artifact (if
    /// any) remains valid.
    pub fn save<M: Serialize>(&self, model: &M, path: &Path) -> Result<(), StoreError> {
        let bytes = bincode::serialize(model)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(parent) = self.paths.staging.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.paths.staging, &bytes)?;
        fs::rename(&self.paths.staging, path)?;

        info!("model artifact saved to {:?}", path);
        Ok(())
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Removes the artifact at `path`. A missing artifact is a no-op, not
    /// an error.
    pub fn delete(&self, path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            fs::remove_file(path)?;
            info!("model artifact deleted from {:?}", path);
        }
        Ok(())
    }

    /// Copies the artifact at `source` to a user-visible `destination`.
    pub fn export(&self, source: &Path, destination: &Path) -> Result<(), StoreError> {
        if !source.exists() {
            return Err(StoreError::NothingToExport);
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        info!("model artifact exported to {:?}", destination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Artifact {
        weights: Vec<f32>,
        label: String,
    }

    fn sample() -> Artifact {
        Artifact {
            weights: vec![0.25, -1.5, 3.0],
            label: "Dining".to_string(),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        store.save(&sample(), &paths.personalized).unwrap();
        let loaded: Artifact = store.load(&paths.personalized).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_load_missing_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        let loaded: Option<Artifact> = store.load(&paths.personalized);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        fs::write(&paths.personalized, b"not a model").unwrap();
        let loaded: Option<Artifact> = store.load(&paths.personalized);
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_replaces_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        store.save(&sample(), &paths.personalized).unwrap();
        let replacement = Artifact {
            weights: vec![9.0],
            label: "Transport".to_string(),
        };
        store.save(&replacement, &paths.personalized).unwrap();

        let loaded: Artifact = store.load(&paths.personalized).unwrap();
        assert_eq!(loaded, replacement);
    }

    #[test]
    fn test_interrupted_save_leaves_previous_artifact_intact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        store.save(&sample(), &paths.personalized).unwrap();

        // A crash between the staging write and the rename leaves junk at
        // the staging path; the durable artifact must be unaffected.
        fs::write(&paths.staging, b"half-written artifact").unwrap();

        let loaded: Artifact = store.load(&paths.personalized).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_staging_is_consumed_by_save() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        store.save(&sample(), &paths.personalized).unwrap();
        assert!(!paths.staging.exists());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        store.save(&sample(), &paths.personalized).unwrap();
        store.delete(&paths.personalized).unwrap();
        assert!(!store.exists(&paths.personalized));

        // Second delete of an absent artifact is a no-op.
        store.delete(&paths.personalized).unwrap();
    }

    #[test]
    fn test_export_copies_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        store.save(&sample(), &paths.personalized).unwrap();
        let destination = dir.path().join("exported.model");
        store.export(&paths.personalized, &destination).unwrap();

        assert_eq!(
            fs::read(&paths.personalized).unwrap(),
            fs::read(&destination).unwrap()
        );
    }

    #[test]
    fn test_export_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ModelPaths::in_dir(dir.path());
        let store = ModelStore::new(paths.clone());

        let destination = dir.path().join("exported.model");
        let result = store.export(&paths.personalized, &destination);
        assert!(matches!(result, Err(StoreError::NothingToExport)));
    }

    #[test]
    fn test_default_data_dir_env_override() {
        env::set_var("MONETA_DATA", "/tmp/moneta-test-data");
        let path = ModelPaths::default_data_dir();
        assert_eq!(path, PathBuf::from("/tmp/moneta-test-data"));
        env::remove_var("MONETA_DATA");

        let path = ModelPaths::default_data_dir();
        assert!(path.to_str().unwrap().contains("moneta"));
    }
}
