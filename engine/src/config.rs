use std::env;
use std::path::PathBuf;

use crate::services::DEFAULT_MAX_SIMULATION_YEARS;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory the file-backed store keeps its blobs in
    pub data_dir: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_simulation_years: i32,
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("CLARUS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT")
            .unwrap_or_else(|| "text".to_string())
            .to_lowercase()
            .as_str()
        {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(format!(
                    "Invalid LOG_FORMAT: {}. Must be one of: [\"text\", \"json\"]",
                    other
                ))
            }
        };

        let max_simulation_years = match lookup("MAX_SIMULATION_YEARS") {
            Some(raw) => raw
                .parse::<i32>()
                .map_err(|_| format!("Invalid MAX_SIMULATION_YEARS: {}", raw))?,
            None => DEFAULT_MAX_SIMULATION_YEARS,
        };

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        if max_simulation_years <= 0 {
            return Err("MAX_SIMULATION_YEARS must be greater than 0".to_string());
        }

        Ok(Self {
            data_dir,
            log_level: log_level.to_lowercase(),
            log_format,
            max_simulation_years,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            max_simulation_years: DEFAULT_MAX_SIMULATION_YEARS,
        }
    }
}
