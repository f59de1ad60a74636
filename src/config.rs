//! Runtime configuration from an optional TOML file plus environment overrides.
//!
//! Environment:
//!   TWELVE_POINTS_CONFIG  : path to a TOML file with the fields of [`Config`]
//!   TWELVE_POINTS_STORE   : "sqlite" (default) or "memory"
//!   TWELVE_POINTS_DB      : SQLite database path
//!   TWELVE_POINTS_DATASET : JSON archive to load (imported into an empty database)
//!   TWELVE_POINTS_SEED    : fixed RNG seed for reproducible questions
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use crate::error::{Result, TriviaError};
use crate::memory_store::MemoryStore;
use crate::model::parse_corpus;
use crate::orchestrator::{DrawMode, DEFAULT_MAX_ATTEMPTS};
use crate::sql_store::{SqliteStore, DB_PATH};
use crate::store::ContestStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreBackend,
    pub database_path: PathBuf,
    pub dataset_path: Option<PathBuf>,
    pub questions_per_round: usize,
    pub max_attempts: usize,
    /// Use each question kind at most once per round
    pub distinct_kinds: bool,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: StoreBackend::Sqlite,
            database_path: PathBuf::from(DB_PATH),
            dataset_path: None,
            questions_per_round: 1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            distinct_kinds: false,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TriviaError::Config(e.to_string()))
    }

    /// Reads the TOML file named by `TWELVE_POINTS_CONFIG` (if any), then
    /// applies the environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("TWELVE_POINTS_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| TriviaError::Config(format!("{path}: {e}")))?;
                let config = Self::from_toml_str(&raw)?;
                info!(%path, "loaded config");
                config
            }
            Err(_) => Config::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store) = lookup("TWELVE_POINTS_STORE") {
            self.store = match store.to_ascii_lowercase().as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "memory" => StoreBackend::Memory,
                other => {
                    return Err(TriviaError::Config(format!("unknown store '{other}'")));
                }
            };
        }
        if let Some(db) = lookup("TWELVE_POINTS_DB") {
            self.database_path = PathBuf::from(db);
        }
        if let Some(dataset) = lookup("TWELVE_POINTS_DATASET") {
            self.dataset_path = Some(PathBuf::from(dataset));
        }
        if let Some(seed) = lookup("TWELVE_POINTS_SEED") {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| TriviaError::Config(format!("TWELVE_POINTS_SEED: {e}")))?;
            self.seed = Some(seed);
        }
        Ok(())
    }

    pub fn draw_mode(&self) -> DrawMode {
        if self.distinct_kinds {
            DrawMode::WithoutReplacement
        } else {
            DrawMode::WithReplacement
        }
    }

    /// Opens the configured store, loading the dataset where needed.
    pub fn open_store(&self) -> Result<Box<dyn ContestStore>> {
        match self.store {
            StoreBackend::Memory => {
                let path = self.dataset_path.as_ref().ok_or_else(|| {
                    TriviaError::Config("memory store needs a dataset path".to_string())
                })?;
                let store = MemoryStore::from_json_file(path)?;
                info!(
                    path = %path.display(),
                    contests = store.contests().len(),
                    "loaded archive into memory"
                );
                Ok(Box::new(store))
            }
            StoreBackend::Sqlite => {
                let store = SqliteStore::open(&self.database_path)?;
                if let Some(path) = &self.dataset_path {
                    if store.contest_count()? == 0 {
                        let raw = std::fs::read_to_string(path)?;
                        store.import(&parse_corpus(&raw)?)?;
                    }
                }
                info!(path = %self.database_path.display(), "opened contest database");
                Ok(Box::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.database_path, PathBuf::from("contests.sqlite"));
        assert_eq!(config.questions_per_round, 1);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.draw_mode(), DrawMode::WithReplacement);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            "store = \"memory\"\nquestions_per_round = 5\ndistinct_kinds = true\n",
        )
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.questions_per_round, 5);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.draw_mode(), DrawMode::WithoutReplacement);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        assert!(matches!(
            Config::from_toml_str("questions_per_round = \"many\""),
            Err(TriviaError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TWELVE_POINTS_STORE", "MEMORY"),
            ("TWELVE_POINTS_DATASET", "archive.json"),
            ("TWELVE_POINTS_SEED", "77"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.dataset_path, Some(PathBuf::from("archive.json")));
        assert_eq!(config.seed, Some(77));
    }

    #[test]
    fn test_bad_seed_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "TWELVE_POINTS_SEED").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(TriviaError::Config(_))));
    }

    #[test]
    fn test_memory_store_requires_dataset() {
        let config = Config {
            store: StoreBackend::Memory,
            ..Config::default()
        };
        assert!(matches!(config.open_store(), Err(TriviaError::Config(_))));
    }
}
