pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "SLFLOW_CONFIG_PATH";
pub const USERNAME_ENV: &str = "SL_USERNAME";
pub const API_KEY_ENV: &str = "SL_API_KEY";
pub const ENDPOINT_ENV: &str = "SL_API_ENDPOINT";

const CANDIDATES: [&str; 2] = ["slflow.yaml", ".slflow.yaml"];

/// Account settings and defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub username: Option<String>,
    pub api_key: Option<String>,
    /// REST endpoint; the public SoftLayer endpoint when unset
    pub endpoint: Option<String>,
    pub ssh_key_label: String,
    pub ready_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: None,
            api_key: None,
            endpoint: None,
            ssh_key_label: "default".to_string(),
            ready_timeout_secs: 600,
        }
    }
}

impl Settings {
    /// Read a settings file; an empty file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = read(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override with `SL_USERNAME`, `SL_API_KEY` and `SL_API_ENDPOINT`
    pub fn apply_env(&mut self) {
        if let Some(username) = env_value(USERNAME_ENV) {
            self.username = Some(username);
        }
        if let Some(api_key) = env_value(API_KEY_ENV) {
            self.api_key = Some(api_key);
        }
        if let Some(endpoint) = env_value(ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Find the settings file
///
/// Search order:
/// 1. `SLFLOW_CONFIG_PATH` (direct path)
/// 2. Current directory: slflow.yaml, .slflow.yaml
/// 3. `<config dir>/slflow/config.yaml` (global settings)
pub fn find_settings_file() -> Result<Option<PathBuf>> {
    if let Some(config_path) = env_value(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("slflow").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Discover, read and env-override the settings
pub fn load_settings() -> Result<Settings> {
    let mut settings = match find_settings_file()? {
        Some(path) => Settings::from_file(&path)?,
        None => Settings::default(),
    };
    settings.apply_env();
    Ok(settings)
}

/// Read a flavor file: JSON for `.json`, YAML otherwise
pub fn load_flavor(path: &Path) -> Result<BTreeMap<String, Value>> {
    let content = read(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let value: Value = if is_json {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::fs;

    fn isolated<R>(config_home: &Path, f: impl FnOnce() -> R) -> R {
        isolated_with(config_home, &[], f)
    }

    /// Clear the slflow variables, then set `vars`
    fn isolated_with<R>(
        config_home: &Path,
        vars: &[(&str, &str)],
        f: impl FnOnce() -> R,
    ) -> R {
        let mut env: Vec<(&str, Option<&str>)> = vec![
            (CONFIG_PATH_ENV, None),
            (USERNAME_ENV, None),
            (API_KEY_ENV, None),
            (ENDPOINT_ENV, None),
            ("XDG_CONFIG_HOME", config_home.to_str()),
        ];
        for (name, value) in vars {
            env.retain(|(n, _)| n != name);
            env.push((*name, Some(*value)));
        }
        temp_env::with_vars(env, f)
    }

    #[test]
    #[serial]
    fn test_find_settings_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("slflow.yaml"), "username: alice\n").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = isolated(temp_dir.path(), find_settings_file).unwrap();
        assert!(result.unwrap().ends_with("slflow.yaml"));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_visible_file_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("slflow.yaml"), "").unwrap();
        fs::write(temp_dir.path().join(".slflow.yaml"), "").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = isolated(temp_dir.path(), find_settings_file)
            .unwrap()
            .unwrap();
        assert_eq!(result.file_name().unwrap(), "slflow.yaml");

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_env_path_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "ssh_key_label: deploy\n").unwrap();

        let result = isolated_with(
            temp_dir.path(),
            &[(CONFIG_PATH_ENV, config_path.to_str().unwrap())],
            find_settings_file,
        )
        .unwrap();
        assert_eq!(result, Some(config_path));
    }

    #[test]
    #[serial]
    fn test_global_settings_file() {
        let cwd = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let global_dir = config_home.path().join("slflow");
        fs::create_dir_all(&global_dir).unwrap();
        fs::write(global_dir.join("config.yaml"), "username: global\n").unwrap();
        std::env::set_current_dir(&cwd).unwrap();

        let result = isolated(config_home.path(), find_settings_file).unwrap();
        assert_eq!(result, Some(global_dir.join("config.yaml")));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_missing_file_gives_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let settings = isolated(temp_dir.path(), load_settings).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.ssh_key_label, "default");
        assert_eq!(settings.ready_timeout(), Duration::from_secs(600));

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("slflow.yaml");
        fs::write(
            &config_path,
            "username: file-user\napi_key: file-key\nready_timeout_secs: 60\n",
        )
        .unwrap();

        let settings = isolated_with(
            temp_dir.path(),
            &[
                (CONFIG_PATH_ENV, config_path.to_str().unwrap()),
                (API_KEY_ENV, "env-key"),
                (ENDPOINT_ENV, "https://api.service.softlayer.com/rest/v3.1"),
            ],
            load_settings,
        )
        .unwrap();

        assert_eq!(settings.username.as_deref(), Some("file-user"));
        assert_eq!(settings.api_key.as_deref(), Some("env-key"));
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("https://api.service.softlayer.com/rest/v3.1")
        );
        assert_eq!(settings.ready_timeout_secs, 60);
    }

    #[test]
    fn test_invalid_settings_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("slflow.yaml");
        fs::write(&path, "ready_timeout_secs: [soon]\n").unwrap();

        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_load_flavor_yaml_and_json() {
        let temp_dir = tempfile::tempdir().unwrap();

        let yaml = temp_dir.path().join("small.yaml");
        fs::write(&yaml, "cpus: 2\nmemory: 4096\ndisks: [25, 100]\ntags: web,prod\n").unwrap();
        let flavor = load_flavor(&yaml).unwrap();
        assert_eq!(flavor["cpus"], json!(2));
        assert_eq!(flavor["disks"], json!([25, 100]));
        assert_eq!(flavor["tags"], json!("web,prod"));

        let json_path = temp_dir.path().join("bm.json");
        fs::write(&json_path, r#"{"size": "S1270_8GB_2X1TBSATA_NORAID", "port_speed": 100}"#)
            .unwrap();
        let flavor = load_flavor(&json_path).unwrap();
        assert_eq!(flavor["size"], json!("S1270_8GB_2X1TBSATA_NORAID"));
    }

    #[test]
    fn test_load_flavor_rejects_non_mapping() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("list.yaml");
        fs::write(&path, "- a\n- b\n").unwrap();

        assert!(matches!(
            load_flavor(&path),
            Err(ConfigError::NotAMapping(_))
        ));
    }

    #[test]
    fn test_load_flavor_missing_file() {
        let err = load_flavor(Path::new("/nonexistent/flavor.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
