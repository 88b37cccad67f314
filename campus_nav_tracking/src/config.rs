use std::path::{Path, PathBuf};

use anyhow::Context;
use const_format::concatcp;

pub const DATA_DIR: &str = "data/";
pub const GPX_DIR: &str = concatcp!(DATA_DIR, "gpx");
pub const MAPS_KEY_FILE: &str = "maps_key.txt";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com";
pub const DIRECTIONS_PATH: &str = "/maps/api/directions/json";

const ENV_PREFIX: &str = "CAMPUS_NAV_";
pub const API_URL_VAR: &str = concatcp!(ENV_PREFIX, "API_URL");
pub const API_TOKEN_VAR: &str = concatcp!(ENV_PREFIX, "API_TOKEN");
pub const MAPS_KEY_VAR: &str = concatcp!(ENV_PREFIX, "MAPS_KEY");
pub const DIRECTIONS_URL_VAR: &str = concatcp!(ENV_PREFIX, "DIRECTIONS_URL");

#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Base URL of the campus REST API serving `/api/schedules/{id}/`.
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub maps_api_key: String,
    pub directions_base_url: String,
}

impl NavigatorConfig {
    /// Reads the environment. The maps key falls back to `maps_key.txt` in the project root.
    pub fn from_env() -> anyhow::Result<Self> {
        let key_file = project_root::get_project_root()
            .map(|root| root.join(MAPS_KEY_FILE))
            .ok();
        Self::from_lookup(|name| std::env::var(name).ok(), key_file.as_deref())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, key_file: Option<&Path>) -> anyhow::Result<Self> {
        let non_empty = |name: &str| lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let maps_api_key = match non_empty(MAPS_KEY_VAR) {
            Some(key) => key,
            None => {
                let path = key_file.with_context(|| format!("{MAPS_KEY_VAR} is not set and no project root was found"))?;
                std::fs::read_to_string(path)
                    .with_context(|| format!("{MAPS_KEY_VAR} is not set and {:?} could not be read", path))?
                    .trim()
                    .to_string()
            }
        };

        Ok(Self {
            api_base_url: non_empty(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_token: non_empty(API_TOKEN_VAR),
            maps_api_key,
            directions_base_url: non_empty(DIRECTIONS_URL_VAR).unwrap_or_else(|| DEFAULT_DIRECTIONS_URL.to_string()),
        })
    }
}

/// Finds a GPX file either as given or under `data/gpx` in the project root.
pub fn resolve_gpx_path(path: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }

    project_root::get_project_root()
        .map(|root| root.join(GPX_DIR).join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn reads_variables_with_defaults() {
        let vars = HashMap::from([(MAPS_KEY_VAR, "key-from-env"), (API_TOKEN_VAR, "abc")]);
        let config = NavigatorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()), None).unwrap();

        assert_eq!(config.maps_api_key, "key-from-env");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.directions_base_url, DEFAULT_DIRECTIONS_URL);
    }

    #[test]
    fn maps_key_falls_back_to_file() {
        let path = std::env::temp_dir().join(format!("campus_nav_maps_key_{}.txt", std::process::id()));
        std::fs::write(&path, "key-from-file\n").unwrap();

        let config = NavigatorConfig::from_lookup(|name| (name == API_URL_VAR).then(|| "http://campus.test".to_string()), Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.maps_api_key, "key-from-file");
        assert_eq!(config.api_base_url, "http://campus.test");
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn missing_maps_key_is_an_error() {
        assert!(NavigatorConfig::from_lookup(|_| None, None).is_err());
        assert!(NavigatorConfig::from_lookup(|_| Some("  ".into()), Some(Path::new("/nonexistent/maps_key.txt"))).is_err());
    }
}
