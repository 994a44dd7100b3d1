//! On-disk model: vocabulary and learned parameters in one JSON document.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use deplm_core::DependencyParams;
use deplm_nlp::Vocab;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub vocab: Vocab,
    pub params: DependencyParams,
}

impl ModelFile {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialise model")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Read a model and check its parameters still fit its vocabulary.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ModelFile = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a model file", path.display()))?;
        file.params
            .validate(&file.vocab)
            .with_context(|| format!("{} does not match its vocabulary", path.display()))?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deplm_core::ModelConfig;
    use serde_json::json;

    fn small_model() -> ModelFile {
        let mut vocab = Vocab::with_control_tokens();
        vocab.convert("dog").unwrap();
        vocab.set_unk("UNK");
        vocab.freeze();
        let config = ModelConfig {
            embedding_dim: 3,
            state_dim: 4,
            hidden_dim: 3,
            layers: 1,
            seed: 5,
        };
        let params = DependencyParams::new(config, &vocab).unwrap();
        ModelFile { vocab, params }
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("deplm-model-{}.json", std::process::id()));
        let model = small_model();
        model.save(&path).unwrap();
        let loaded = ModelFile::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, model);
        assert!(loaded.vocab.is_frozen());
        assert_eq!(loaded.vocab.lookup("dog"), Some(2));
    }

    #[test]
    fn test_load_rejects_mismatched_vocab() {
        let path = std::env::temp_dir().join(format!("deplm-bad-{}.json", std::process::id()));
        let mut model = small_model();
        model.vocab = Vocab::with_control_tokens();
        model.save(&path).unwrap();
        let result = ModelFile::load(&path);
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    /// Save `small_model` with part of its JSON rewritten, then load it.
    fn load_edited(name: &str, edit: impl FnOnce(&mut serde_json::Value)) -> Result<ModelFile> {
        let path = std::env::temp_dir().join(format!("deplm-{}-{}.json", name, std::process::id()));
        let mut value = serde_json::to_value(small_model()).unwrap();
        edit(&mut value);
        fs::write(&path, value.to_string()).unwrap();
        let result = ModelFile::load(&path);
        fs::remove_file(&path).unwrap();
        result
    }

    fn load_error(name: &str, edit: impl FnOnce(&mut serde_json::Value)) -> String {
        format!("{:#}", load_edited(name, edit).unwrap_err())
    }

    #[test]
    fn test_unedited_json_loads() {
        assert_eq!(load_edited("unedited", |_| {}).unwrap(), small_model());
    }

    #[test]
    fn test_load_rejects_encoder_without_layers() {
        let err = load_error("no-layers", |v| {
            v["params"]["stack_encoder"]["layers"] = json!([]);
        });
        assert!(err.contains("at least one layer"), "{}", err);
    }

    #[test]
    fn test_load_rejects_short_scorer_bias() {
        let err = load_error("short-bias", |v| {
            v["params"]["scorer"]["output"]["bias"] = json!({ "shape": [1], "data": [0.0] });
        });
        assert!(err.contains("linear bias"), "{}", err);
    }

    #[test]
    fn test_load_rejects_tensor_data_not_filling_shape() {
        let err = load_error("short-data", |v| {
            v["params"]["comp_init"]["data"] = json!([0.0]);
        });
        assert!(err.contains("tensor data"), "{}", err);
    }

    #[test]
    fn test_load_rejects_gru_width_disagreeing_with_weights() {
        let err = load_error("gru-width", |v| {
            v["params"]["comp_encoder"]["layers"][0]["hidden_dim"] = json!(5);
        });
        assert!(err.contains("gru hidden width"), "{}", err);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ModelFile::load(Path::new("/nonexistent/model.json")).is_err());
    }
}
