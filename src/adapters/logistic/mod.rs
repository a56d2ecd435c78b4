//! Logistic adapter: Implementation of RiskModel and FeatureNormalizer.
//!
//! Loads a logistic-regression model and an optional standard scaler exported
//! by the training pipeline as JSON.
//!
//! # Artifact layout
//!
//! ```text
//! <model_dir>/
//!   model.json      coefficients, intercept, feature layout version
//!   scaler.json     optional: per-feature mean and scale
//!   manifest.json   optional: SHA-256 of every artifact file
//! ```
//!
//! # Integrity
//!
//! When `manifest.json` is present, every file it lists must hash to the
//! recorded value, and every artifact actually loaded must be listed.
//! Deployments can make the manifest mandatory via `require_manifest`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FEATURE_LAYOUT_VERSION, FEATURE_WIDTH};
use crate::ports::{FeatureNormalizer, ModelError, NormalizationError, RiskModel};

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub layout_version: u32,
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Scaler parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactManifest {
    version: u32,
    files: BTreeMap<String, String>,
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Logistic-regression risk model.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    /// Validate exported parameters against the current feature layout.
    ///
    /// # Errors
    /// Returns `ModelError::Artifact` on a layout version or width mismatch,
    /// or non-finite parameters.
    pub fn from_exported(exported: ExportedLogisticModel) -> Result<Self, ModelError> {
        if exported.layout_version != FEATURE_LAYOUT_VERSION {
            return Err(ModelError::Artifact(format!(
                "model trained on feature layout v{}, encoder uses v{}",
                exported.layout_version, FEATURE_LAYOUT_VERSION
            )));
        }
        if exported.coefficients.len() != FEATURE_WIDTH {
            return Err(ModelError::Artifact(format!(
                "expected {FEATURE_WIDTH} coefficients, got {}",
                exported.coefficients.len()
            )));
        }
        if !exported.feature_names.is_empty() && exported.feature_names.len() != FEATURE_WIDTH {
            return Err(ModelError::Artifact(
                "feature_names length does not match coefficients".into(),
            ));
        }
        if !exported.intercept.is_finite() || exported.coefficients.iter().any(|c| !c.is_finite())
        {
            return Err(ModelError::Artifact(
                "model parameters must be finite".into(),
            ));
        }

        Ok(Self {
            coefficients: exported.coefficients,
            intercept: exported.intercept,
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl RiskModel for LogisticModel {
    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::WidthMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let z = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        let p = sigmoid(z);

        if !p.is_finite() {
            return Err(ModelError::InvalidOutput(p));
        }
        Ok(p)
    }
}

/// Standard scaler: `(x - mean) / scale`.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// # Errors
    /// Returns `ModelError::Artifact` if lengths differ or values are non-finite.
    pub fn from_exported(exported: ExportedScaler) -> Result<Self, ModelError> {
        if exported.mean.len() != exported.scale.len() {
            return Err(ModelError::Artifact(format!(
                "scaler mean has {} entries, scale has {}",
                exported.mean.len(),
                exported.scale.len()
            )));
        }
        if exported
            .mean
            .iter()
            .chain(&exported.scale)
            .any(|v| !v.is_finite())
        {
            return Err(ModelError::Artifact("scaler values must be finite".into()));
        }

        // Zero-variance columns are left unscaled.
        let scale = exported
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: exported.mean,
            scale,
        })
    }
}

impl FeatureNormalizer for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, NormalizationError> {
        if features.len() != self.mean.len() {
            return Err(NormalizationError::WidthMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .enumerate()
            .map(|(i, (x, (m, s)))| {
                let y = (x - m) / s;
                if y.is_finite() {
                    Ok(y)
                } else {
                    Err(NormalizationError::NonFinite(i))
                }
            })
            .collect()
    }
}

/// Everything loaded from a model directory.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: LogisticModel,
    pub scaler: Option<StandardScaler>,
}

fn read_file(path: &Path) -> Result<Vec<u8>, ModelError> {
    std::fs::read(path).map_err(|e| ModelError::NotLoaded(format!("{}: {e}", path.display())))
}

/// Resolve a manifest entry inside `model_dir`.
///
/// Entries must be plain relative paths: no root, no `..`, no `.`.
fn manifest_entry_path(model_dir: &Path, rel: &str) -> Result<PathBuf, ModelError> {
    let entry = Path::new(rel);
    let plain = !rel.is_empty()
        && entry
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if !plain {
        return Err(ModelError::Artifact(format!(
            "{MANIFEST_FILE} entry escapes the model directory: {rel}"
        )));
    }
    Ok(model_dir.join(entry))
}

/// Verify `manifest.json` if present.
///
/// Returns the set of files the manifest binds, or `None` when there is no
/// manifest and one is not required.
fn verify_manifest(
    model_dir: &Path,
    require_manifest: bool,
) -> Result<Option<BTreeMap<String, String>>, ModelError> {
    let manifest_path = model_dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        if require_manifest {
            return Err(ModelError::Artifact(format!(
                "{MANIFEST_FILE} required but not found in {}",
                model_dir.display()
            )));
        }
        tracing::debug!("No artifact manifest in {:?}, skipping hash checks", model_dir);
        return Ok(None);
    }

    let content = read_file(&manifest_path)?;
    let manifest: ArtifactManifest = serde_json::from_slice(&content)
        .map_err(|e| ModelError::Artifact(format!("Invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.version != 1 {
        return Err(ModelError::Artifact(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }
    if !manifest.files.contains_key(MODEL_FILE) {
        return Err(ModelError::Artifact(format!(
            "{MANIFEST_FILE} must include {MODEL_FILE}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let bytes = read_file(&manifest_entry_path(model_dir, rel)?)?;
        let actual_hex = sha256_hex_bytes(&bytes);
        if !actual_hex.eq_ignore_ascii_case(expected_hex.trim()) {
            return Err(ModelError::Artifact(format!("File hash mismatch for {rel}")));
        }
    }

    tracing::info!("Model artifact hashes verified ({} files)", manifest.files.len());
    Ok(Some(manifest.files))
}

/// Load the model (and scaler, if present) from a directory.
///
/// A scaler that fails to parse is dropped with a warning; the model is then
/// used on unnormalized vectors. With a manifest, a scaler that is present
/// but not bound by it is rejected outright.
///
/// # Errors
/// Returns `ModelError` if the model file is missing or invalid, or if the
/// manifest check fails.
pub fn load_artifacts(model_dir: &Path, require_manifest: bool) -> Result<ModelArtifacts, ModelError> {
    let bound = verify_manifest(model_dir, require_manifest)?;

    let model_path = model_dir.join(MODEL_FILE);
    let exported: ExportedLogisticModel = serde_json::from_slice(&read_file(&model_path)?)
        .map_err(|e| ModelError::Artifact(format!("Invalid {MODEL_FILE}: {e}")))?;
    let model = LogisticModel::from_exported(exported)?;

    let scaler_path = model_dir.join(SCALER_FILE);
    let scaler = if scaler_path.exists() {
        if let Some(files) = &bound {
            if !files.contains_key(SCALER_FILE) {
                return Err(ModelError::Artifact(format!(
                    "{SCALER_FILE} present but not bound by {MANIFEST_FILE}"
                )));
            }
        }
        let parsed = read_file(&scaler_path).and_then(|bytes| {
            serde_json::from_slice::<ExportedScaler>(&bytes)
                .map_err(|e| ModelError::Artifact(format!("Invalid {SCALER_FILE}: {e}")))
                .and_then(StandardScaler::from_exported)
        });
        match parsed {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!("Ignoring feature scaler: {e}");
                None
            }
        }
    } else {
        None
    };

    tracing::info!(
        "Loaded risk model from {:?} (n_features={}, scaler={})",
        model_dir,
        model.input_width(),
        scaler.is_some()
    );

    Ok(ModelArtifacts { model, scaler })
}
