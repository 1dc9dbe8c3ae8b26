//! The `testaudit init` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use testaudit_store::config::sample_config_toml;
use testaudit_store::dataset::SESSIONS_FILE;
use testaudit_store::Dataset;

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let data_dir = ctx
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("testaudit-data"));

    let config_path = Path::new("testaudit.toml");
    if config_path.exists() {
        println!("testaudit.toml already exists, skipping.");
    } else {
        std::fs::write(config_path, sample_config_toml(&data_dir))?;
        println!("Created testaudit.toml");
    }

    if data_dir.join(SESSIONS_FILE).exists() {
        println!("{} already has a dataset, skipping.", data_dir.display());
    } else {
        Dataset::sample(chrono::Utc::now()).save_dir(&data_dir)?;
        println!("Created sample dataset in {}", data_dir.display());
    }

    println!("\nNext steps:");
    println!("  1. Run: testaudit validate");
    println!("  2. Run: testaudit analyze --all");
    println!("  3. Run: testaudit report");

    Ok(())
}
