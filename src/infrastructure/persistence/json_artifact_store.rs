//! File-backed artifact store.
//!
//! One directory per horizon holds the fitted model as `<name>.json` and the
//! run record as `metrics.json`. Both files are written to a temporary path
//! and renamed, so readers never observe a partial file.

use crate::application::ml::models::FittedModel;
use crate::application::ml::trainer::{ArtifactStore, TrainedArtifact};
use crate::domain::errors::ArtifactError;
use crate::domain::ml::ArtifactMetadata;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const METADATA_FILE: &str = "metrics.json";

pub struct JsonArtifactStore {
    model_dir: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.model_dir.join(METADATA_FILE)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let content =
        serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;

    // Atomic write: write to temp file then rename
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(io_error(&temp_path))?;
    fs::rename(&temp_path, path).map_err(io_error(path))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

impl ArtifactStore for JsonArtifactStore {
    fn model_path(&self, name: &str) -> PathBuf {
        self.model_dir.join(format!("{}.json", name))
    }

    fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.model_dir).map_err(io_error(&self.model_dir))?;

        write_json(&artifact.metadata.model_path, &artifact.model)?;
        let metadata_path = self.metadata_path();
        write_json(&metadata_path, &artifact.metadata)?;

        info!(
            "Saved {} model and metadata to {:?}",
            artifact.metadata.best_model, self.model_dir
        );
        Ok(())
    }

    fn load(&self) -> Result<TrainedArtifact, ArtifactError> {
        let metadata: ArtifactMetadata = read_json(&self.metadata_path())?;
        let model: FittedModel = read_json(&metadata.model_path)?;
        Ok(TrainedArtifact { metadata, model })
    }
}
