use std::{env, fs, path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
        }
    }
}

/// What callers get to see: everything except the key itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigInfo {
    pub base_url: String,
    pub model: String,
    pub api_key_set: bool,
}

/// File-backed model-service configuration with an in-memory cache.
///
/// Load order on startup: config file if present, otherwise the
/// CLASSPILOT_MODEL_* environment variables, otherwise defaults.
pub struct ModelConfigStore {
    path: PathBuf,
    data: RwLock<ModelConfig>,
}

impl ModelConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read model config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|_| Self::from_env())
        } else {
            Self::from_env()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn from_env() -> ModelConfig {
        let defaults = ModelConfig::default();
        ModelConfig {
            base_url: env::var("CLASSPILOT_MODEL_BASE").unwrap_or(defaults.base_url),
            api_key: env::var("CLASSPILOT_MODEL_KEY").unwrap_or(defaults.api_key),
            model: env::var("CLASSPILOT_MODEL_NAME").unwrap_or(defaults.model),
        }
    }

    pub fn current(&self) -> ModelConfig {
        self.data.read().expect("model config lock poisoned").clone()
    }

    pub fn info(&self) -> ModelConfigInfo {
        let cfg = self.current();
        ModelConfigInfo {
            base_url: cfg.base_url,
            model: cfg.model,
            api_key_set: !cfg.api_key.is_empty(),
        }
    }

    pub fn update(&self, cfg: ModelConfig) -> Result<()> {
        {
            let mut guard = self.data.write().expect("model config lock poisoned");
            *guard = cfg;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &ModelConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write model config to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_persists_and_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_config.json");

        let store = ModelConfigStore::new(path.clone()).unwrap();
        store
            .update(ModelConfig {
                base_url: "https://models.example".into(),
                api_key: "secret".into(),
                model: "vision-1".into(),
            })
            .unwrap();

        let reloaded = ModelConfigStore::new(path).unwrap();
        let cfg = reloaded.current();
        assert_eq!(cfg.base_url, "https://models.example");
        assert_eq!(cfg.model, "vision-1");

        let info = reloaded.info();
        assert!(info.api_key_set);
    }
}
