use std::fs;

use ndarray::Array1;

use moneta::{
    LabelClassifier, ModelPaths, ModelStore, NearestCentroidModel, TrainingExample, FEATURE_DIM,
};

fn basis_vector(index: usize) -> Array1<f32> {
    let mut vec = Array1::zeros(FEATURE_DIM);
    vec[index] = 1.0;
    vec
}

fn trained_model() -> NearestCentroidModel {
    let mut model = NearestCentroidModel::empty(FEATURE_DIM);
    model.observe(&TrainingExample::new(basis_vector(0), "Dining"));
    model.observe(&TrainingExample::new(basis_vector(1), "Transport"));
    model
}

#[test]
fn test_round_trip_is_behaviorally_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths::in_dir(dir.path());
    let store = ModelStore::new(paths.clone());

    let original = trained_model();
    store.save(&original, &paths.personalized).unwrap();
    let reloaded: NearestCentroidModel = store.load(&paths.personalized).unwrap();

    // Same predictions on a fixed probe set.
    for probe in [basis_vector(0), basis_vector(1), basis_vector(7)] {
        let before = original.predict_scores(&probe);
        let after = reloaded.predict_scores(&probe);
        assert_eq!(before.len(), after.len());
        for (label, score) in before {
            assert!((score - after[&label]).abs() < 1e-6);
        }
    }
}

#[test]
fn test_crash_between_staging_and_rename_preserves_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths::in_dir(dir.path());
    let store = ModelStore::new(paths.clone());

    store.save(&trained_model(), &paths.personalized).unwrap();

    // Simulate a crash mid-save: the staging file was written but the
    // rename never happened.
    fs::write(&paths.staging, b"partial artifact from a crashed save").unwrap();

    // A fresh process sees the previous artifact, complete and loadable.
    let fresh_store = ModelStore::new(paths.clone());
    let reloaded: NearestCentroidModel = fresh_store.load(&paths.personalized).unwrap();
    let scores = reloaded.predict_scores(&basis_vector(0));
    assert!(scores["Dining"] > 0.9);
}

#[test]
fn test_crash_before_first_save_leaves_path_absent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths::in_dir(dir.path());
    let store = ModelStore::new(paths.clone());

    fs::write(&paths.staging, b"partial artifact from a crashed save").unwrap();

    assert!(!store.exists(&paths.personalized));
    let loaded: Option<NearestCentroidModel> = store.load(&paths.personalized);
    assert!(loaded.is_none());
}

#[test]
fn test_corrupt_artifact_is_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths::in_dir(dir.path());
    let store = ModelStore::new(paths.clone());

    fs::write(&paths.personalized, b"garbage bytes").unwrap();
    let loaded: Option<NearestCentroidModel> = store.load(&paths.personalized);
    assert!(loaded.is_none());
}
