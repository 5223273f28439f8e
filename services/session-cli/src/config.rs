//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. Only the API base
//! URL has an env override (`SESSION_API_URL`); tokens never live in the TOML.

use serde::Deserialize;
use session_auth::Endpoints;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Where the credential pair is persisted
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from(".sessionctl/credentials.json")
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(url) = std::env::var("SESSION_API_URL")
            && !url.trim().is_empty()
        {
            config.api.base_url = url.trim().to_owned();
        }

        if config.api.base_url.is_empty() {
            return Err(common::Error::Config(
                "api.base_url is required (or set SESSION_API_URL)".into(),
            ));
        }

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_URL") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "https://api.example.com/api"

[storage]
credentials_path = "/var/lib/sessionctl/credentials.json"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.api.endpoints, Endpoints::default());
        assert_eq!(
            config.storage.credentials_path,
            PathBuf::from("/var/lib/sessionctl/credentials.json")
        );
    }

    #[test]
    fn test_endpoint_overrides_keep_other_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_URL") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "http://localhost:5000/api"
timeout_secs = 5

[api.endpoints]
refresh = "/auth/token/refresh"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.endpoints.refresh, "/auth/token/refresh");
        assert_eq!(config.api.endpoints.login, "/auth/login");
        assert_eq!(
            config.storage.credentials_path,
            PathBuf::from(".sessionctl/credentials.json")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_base_url_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"https://file.example.com\"\n");

        unsafe { set_env("SESSION_API_URL", "https://env.example.com/api") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("SESSION_API_URL") };

        assert_eq!(config.api.base_url, "https://env.example.com/api");
    }

    #[test]
    fn test_env_alone_supplies_base_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");

        unsafe { set_env("SESSION_API_URL", "http://localhost:5000/api") };
        let config = Config::load(&path).unwrap();
        unsafe { remove_env("SESSION_API_URL") };

        assert_eq!(config.api.base_url, "http://localhost:5000/api");
    }

    #[test]
    fn test_missing_base_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_URL") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[storage]\ncredentials_path = \"c.json\"\n");

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("base_url is required"));
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_URL") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"ftp://api.example.com\"\n");

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("http:// or https://"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("SESSION_API_URL") };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[api]\nbase_url = \"https://api.example.com\"\ntimeout_secs = 0\n",
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }
}
