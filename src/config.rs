//! Configuration for the kardex CLI.
//!
//! Two layers: [`CliConfig`] is the operator-editable JSON file under the
//! platform config dir, and [`ClientConfig`] is the resolved runtime
//! configuration the gateway consumes (defaults, then file, then
//! `KARDEX_*` environment variables).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{KardexError, Result};

const DEFAULT_BASE_URL: &str = "https://rh.example.com/api";
const DEFAULT_LOGIN_PATH: &str = "/token/";
const DEFAULT_REFRESH_PATH: &str = "/token/refresh/";
const DEFAULT_EMPLOYEES_PATH: &str = "/v1/empleados/";

/// Persisted CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub endpoint: String,
    pub timeout: u64,
    pub verbose: bool,
    pub storage_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BASE_URL.to_string(),
            timeout: 30,
            verbose: false,
            storage_dir: default_storage_dir(),
        }
    }
}

impl CliConfig {
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file).await?;
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => Ok(config),
                Err(_) => {
                    // Unreadable file: rewrite with defaults rather than
                    // refusing to start.
                    let config = Self::default();
                    config.save(&config_file).await?;
                    Ok(config)
                }
            }
        } else {
            let config = Self::default();
            config.save(&config_file).await?;
            Ok(config)
        }
    }

    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).await?;
        Ok(())
    }

    /// Resolve the runtime configuration for the gateway.
    pub fn to_client_config(&self) -> Result<ClientConfig> {
        let token_path = self.storage_dir.join("tokens").join("session.json");
        ClientConfig::builder()
            .base_url(&self.endpoint)
            .timeout(self.timeout)
            .verbose(self.verbose)
            .token_path(token_path)
            .build()
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kardex")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kardex")
}

/// Runtime configuration consumed by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_employees_path")]
    pub employees_path: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub verbose: bool,
    /// Durable token storage location. `None` keeps tokens in memory
    /// only (used by tests).
    pub token_path: Option<PathBuf>,
    #[serde(default = "default_use_proxy")]
    pub use_proxy: bool,
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_employees_path() -> String {
    DEFAULT_EMPLOYEES_PATH.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_use_proxy() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
            employees_path: default_employees_path(),
            timeout: default_timeout(),
            verbose: false,
            token_path: None,
            use_proxy: default_use_proxy(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Layer defaults, an optional file and the `KARDEX_*` environment.
    pub fn from_file_and_env<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("login_path", DEFAULT_LOGIN_PATH)?
            .set_default("refresh_path", DEFAULT_REFRESH_PATH)?
            .set_default("employees_path", DEFAULT_EMPLOYEES_PATH)?
            .set_default("timeout", 30)?
            .set_default("verbose", false)?
            .set_default("use_proxy", true)?;

        if let Some(config_path) = config_file {
            if config_path.as_ref().exists() {
                builder = builder.add_source(File::from(config_path.as_ref()));
            }
        }
        builder = builder.add_source(Environment::with_prefix("KARDEX").try_parsing(true));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(KardexError::invalid_endpoint("base URL cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(KardexError::invalid_endpoint(format!(
                "base URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Join base URL and path without double slashes.
    pub fn endpoint_url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn login_url(&self) -> String {
        self.endpoint_url(&self.login_path)
    }

    pub fn refresh_url(&self) -> String {
        self.endpoint_url(&self.refresh_path)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    login_path: Option<String>,
    refresh_path: Option<String>,
    employees_path: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    token_path: Option<PathBuf>,
    config_file: Option<PathBuf>,
    use_proxy: Option<bool>,
}

impl ClientConfigBuilder {
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn login_path<S: Into<String>>(mut self, path: S) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn refresh_path<S: Into<String>>(mut self, path: S) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    pub fn employees_path<S: Into<String>>(mut self, path: S) -> Self {
        self.employees_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn token_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn use_proxy(mut self, use_proxy: bool) -> Self {
        self.use_proxy = Some(use_proxy);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_file_and_env(self.config_file.as_deref())?;

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(path) = self.login_path {
            config.login_path = path;
        }
        if let Some(path) = self.refresh_path {
            config.refresh_path = path;
        }
        if let Some(path) = self.employees_path {
            config.employees_path = path;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if self.token_path.is_some() {
            config.token_path = self.token_path;
        }
        if let Some(use_proxy) = self.use_proxy {
            config.use_proxy = use_proxy;
        }

        config.validate()?;
        Ok(config)
    }
}
