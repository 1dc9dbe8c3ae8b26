//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use testaudit_core::engine::ValidityEngine;
use testaudit_store::{load_config_from, JsonDirStore, TestauditConfig};

pub mod analyze;
pub mod init;
pub mod override_status;
pub mod report;
pub mod show;
pub mod validate;

/// Global options shared by every subcommand.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Context {
    /// Load config, applying `--data-dir` on top of file and env settings.
    pub fn config(&self) -> Result<TestauditConfig> {
        let mut config = load_config_from(self.config_path.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }

    /// Open the data directory and build an engine on top of it.
    pub async fn engine(&self) -> Result<(TestauditConfig, ValidityEngine)> {
        let config = self.config()?;
        tracing::debug!("opening data dir {}", config.data_dir.display());
        let store = Arc::new(JsonDirStore::open(&config.data_dir).await?);
        let engine = ValidityEngine::new(store.clone(), store, config.engine_config());
        Ok((config, engine))
    }
}

/// Write to `output` when given, else print to stdout.
pub fn emit(content: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
            eprintln!("Written to: {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
