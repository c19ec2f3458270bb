//! App configuration
//!
//! Read once at startup from `config.json` in the app config dir. Every
//! field has a default, so a partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sibling_order::ReorderConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database file name inside the app data dir
    pub db_file: String,
    /// Stem of the log files
    pub log_app_name: String,
    /// Handed to the frontend by `get_reorder_config`
    pub reorder: ReorderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_file: "course_dashboard.db".to_string(),
            log_app_name: "CourseDashboard".to_string(),
            reorder: ReorderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing or malformed file yields the defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Could not read {}: {}, using defaults", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Malformed {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
