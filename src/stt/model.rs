//! Whisper model registry and on-disk path resolution.
//!
//! Only multilingual models are listed: every supported application language
//! (English plus the Indian languages in the locale table) must be
//! recognisable with the same loaded model.

use std::path::PathBuf;

use crate::config::AppPaths;

/// Capacity tier of a Whisper GGML model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

/// Static metadata for a single GGML model file.
#[derive(Debug)]
pub struct ModelInfo {
    /// Identifier used in `RecognitionConfig::model` (e.g. `"whisper-small"`).
    pub id: &'static str,
    pub display_name: &'static str,
    pub size: ModelSize,
    /// File name under the models directory.
    pub file_name: &'static str,
    pub file_size_mb: u64,
    /// Minimum RAM required to run this model (megabytes).
    pub ram_required_mb: u64,
}

/// Where the GGML files in [`WHISPER_MODELS`] can be downloaded from.
pub const MODEL_SOURCE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp";

pub const WHISPER_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "whisper-tiny",
        display_name: "Whisper Tiny (multilingual)",
        size: ModelSize::Tiny,
        file_name: "ggml-tiny.bin",
        file_size_mb: 75,
        ram_required_mb: 400,
    },
    ModelInfo {
        id: "whisper-base",
        display_name: "Whisper Base (multilingual)",
        size: ModelSize::Base,
        file_name: "ggml-base.bin",
        file_size_mb: 142,
        ram_required_mb: 500,
    },
    ModelInfo {
        id: "whisper-small",
        display_name: "Whisper Small (multilingual) [Recommended]",
        size: ModelSize::Small,
        file_name: "ggml-small.bin",
        file_size_mb: 466,
        ram_required_mb: 1_000,
    },
    ModelInfo {
        id: "whisper-medium",
        display_name: "Whisper Medium (multilingual)",
        size: ModelSize::Medium,
        file_name: "ggml-medium.bin",
        file_size_mb: 1_500,
        ram_required_mb: 3_000,
    },
    ModelInfo {
        id: "whisper-large-v3",
        display_name: "Whisper Large-v3 (multilingual)",
        size: ModelSize::Large,
        file_name: "ggml-large-v3.bin",
        file_size_mb: 3_100,
        ram_required_mb: 6_000,
    },
];

pub fn find_model_by_id(id: &str) -> Option<&'static ModelInfo> {
    WHISPER_MODELS.iter().find(|m| m.id == id)
}

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves the on-disk location of model files.
///
/// ```rust,no_run
/// use civic_voice::config::AppPaths;
/// use civic_voice::stt::ModelPaths;
///
/// let paths = ModelPaths::from_app_paths(&AppPaths::new());
/// match paths.resolve("whisper-small") {
///     Some(path) => println!("model at {}", path.display()),
///     None => println!("model missing; download it from {}", civic_voice::stt::MODEL_SOURCE_URL),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub models_dir: PathBuf,
}

impl ModelPaths {
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self::new(app_paths.models_dir.clone())
    }

    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name)
    }

    pub fn is_available(&self, model: &ModelInfo) -> bool {
        self.model_path(model).exists()
    }

    /// Path of the configured model, if it is known and present on disk.
    ///
    /// An unknown id is also tried as a file name, so a custom GGML file
    /// dropped into the models directory can be used directly.
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        let path = match find_model_by_id(id) {
            Some(model) => self.model_path(model),
            None => self.models_dir.join(id),
        };
        path.is_file().then_some(path)
    }

    pub fn list_local_models(&self) -> Vec<&'static ModelInfo> {
        WHISPER_MODELS
            .iter()
            .filter(|m| self.is_available(m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ids_are_unique() {
        for (i, a) in WHISPER_MODELS.iter().enumerate() {
            for b in &WHISPER_MODELS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn default_model_is_registered() {
        let default = crate::config::RecognitionConfig::default().model;
        let m = find_model_by_id(&default).expect("default model registered");
        assert_eq!(m.size, ModelSize::Small);
    }

    #[test]
    fn find_model_by_id_unknown() {
        assert!(find_model_by_id("thonburian-medium").is_none());
    }

    #[test]
    fn resolve_missing_is_none() {
        let mp = ModelPaths::new("/nonexistent/path");
        assert!(mp.resolve("whisper-small").is_none());
        assert!(mp.list_local_models().is_empty());
    }

    #[test]
    fn resolve_finds_registered_and_custom_files() {
        let dir = tempdir().expect("temp dir");
        std::fs::write(dir.path().join("ggml-base.bin"), b"x").unwrap();
        std::fs::write(dir.path().join("custom.bin"), b"x").unwrap();

        let mp = ModelPaths::new(dir.path());
        assert!(mp.resolve("whisper-base").is_some());
        assert!(mp.resolve("custom.bin").is_some());
        assert_eq!(mp.list_local_models().len(), 1);
    }
}
