use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Key FoodData Central accepts without registration, heavily rate limited.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

pub struct Config {
    pub db_path: PathBuf,
    pub usda_api_key: String,
}

impl Config {
    /// Read settings from the environment, falling back to the platform
    /// data directory for the database.
    pub fn load() -> Result<Self> {
        let db_path = match std::env::var_os("MATLOG_DB") {
            Some(path) => PathBuf::from(path),
            None => {
                let proj_dirs = ProjectDirs::from("", "", "matlog")
                    .context("Could not determine home directory")?;
                let data_dir = proj_dirs.data_dir().to_path_buf();
                std::fs::create_dir_all(&data_dir).with_context(|| {
                    format!("Failed to create data directory: {}", data_dir.display())
                })?;
                data_dir.join("matlog.db")
            }
        };

        Ok(Config {
            db_path,
            usda_api_key: api_key_from(std::env::var("USDA_API_KEY").ok()),
        })
    }
}

fn api_key_from(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEMO_API_KEY.to_string())
}
