use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use moneta::{
    CentroidTrainer, HashedEmbedding, ModelPaths, ModelStore, NearestCentroidModel,
    PredictionService, FEATURE_DIM,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the model artifacts (defaults to the per-user data dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Discard the personalized model and revert to the default
    #[arg(long)]
    reset: bool,

    /// Copy the active model artifact to the given path and exit
    #[arg(long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data_dir = args.data_dir.unwrap_or_else(ModelPaths::default_data_dir);
    info!("using data directory {:?}", data_dir);
    let paths = ModelPaths::in_dir(&data_dir);

    // Seed the bundled default artifact on first run.
    let store = ModelStore::new(paths.clone());
    if !store.exists(&paths.default) {
        info!("seeding default model artifact at {:?}", paths.default);
        store
            .save(&NearestCentroidModel::empty(FEATURE_DIM), &paths.default)
            .context("failed to seed the default model artifact")?;
    }

    let service = PredictionService::new(paths, HashedEmbedding::default(), CentroidTrainer)
        .context("failed to start the prediction service")?;

    if args.reset {
        service.reset()?;
        println!("Personalized model reset; default model is live.");
        return Ok(());
    }

    if let Some(destination) = args.export {
        service.export(&destination)?;
        println!("Active model exported to {}", destination.display());
        return Ok(());
    }

    info!("=== Transaction Classifier Demo ===");

    let training_data = vec![
        ("starbucks coffee", "Dining"),
        ("blue bottle espresso bar", "Dining"),
        ("uber ride downtown", "Transport"),
        ("metro transit fare", "Transport"),
        ("whole foods market", "Groceries"),
        ("corner grocery store", "Groceries"),
    ];

    info!("training on {} labeled transactions", training_data.len());
    for (text, label) in &training_data {
        let outcome = service.update(text, label).await?;
        info!("update '{}' -> {:?}", text, outcome);
    }

    let test_inputs = vec![
        "starbucks coffee",
        "uber ride downtown",
        "whole foods market",
        "a description the model has never seen",
        "12.99 4821",
    ];

    println!("\nPredictions:");
    for text in test_inputs {
        match service.predict(text) {
            Some(label) => println!("  {:40} -> {}", text, label),
            None => println!("  {:40} -> (no confident label)", text),
        }
    }

    Ok(())
}
