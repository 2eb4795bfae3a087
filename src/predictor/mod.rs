//! Loading and dispatch for the three pre-trained disease classifiers.
//!
//! Artifacts are read once at startup and held in shared state for the
//! process lifetime; request handlers only ever see `&ModelArtifact`.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::ModelsConfig;

mod artifact;

pub use artifact::{ModelArtifact, PredictError};

/// Expected input widths, fixed per disease domain.
pub const DIABETES_FEATURES: usize = 8;
pub const HEART_DISEASE_FEATURES: usize = 13;
pub const PARKINSONS_FEATURES: usize = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disease {
    Diabetes,
    HeartDisease,
    Parkinsons,
}

pub struct ModelSet {
    diabetes: ModelArtifact,
    heart_disease: ModelArtifact,
    parkinsons: ModelArtifact,
}

impl ModelSet {
    /// Deserialize all three artifacts. A missing or corrupt file is fatal;
    /// the service refuses to start without its models.
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        let diabetes = load_artifact(&config.diabetes_path, DIABETES_FEATURES)?;
        let heart_disease = load_artifact(&config.heart_disease_path, HEART_DISEASE_FEATURES)?;
        let parkinsons = load_artifact(&config.parkinsons_path, PARKINSONS_FEATURES)?;

        info!("Loaded model artifacts: {}, {}, {}", diabetes.name, heart_disease.name, parkinsons.name);

        Ok(Self {
            diabetes,
            heart_disease,
            parkinsons,
        })
    }

    #[must_use]
    pub const fn model(&self, disease: Disease) -> &ModelArtifact {
        match disease {
            Disease::Diabetes => &self.diabetes,
            Disease::HeartDisease => &self.heart_disease,
            Disease::Parkinsons => &self.parkinsons,
        }
    }
}

fn load_artifact(path: &str, expected_features: usize) -> Result<ModelArtifact> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;

    let artifact: ModelArtifact = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse model artifact: {}", path.display()))?;

    artifact.validate()?;

    if artifact.feature_count != expected_features {
        anyhow::bail!(
            "Model artifact {} declares {} features, expected {expected_features}",
            path.display(),
            artifact.feature_count
        );
    }

    Ok(artifact)
}
