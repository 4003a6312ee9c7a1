use crate::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_DATABASE_PATH, DEFAULT_LOG_DIR, DEFAULT_PORT, DEFAULT_SITE_URL,
};
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Public site used to build `openstatesUrl` links
    pub site_url: String,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_name: String,
    pub json_file: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required by `/admin` routes. Unset means the routes are not served.
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            site_url: DEFAULT_SITE_URL.to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            file_name: "openstates_web.log".to_string(),
            json_file: true,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or `openstates.toml` when present), then apply
    /// `OPENSTATES_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("OPENSTATES_DATABASE") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(port) = lookup("OPENSTATES_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("OPENSTATES_PORT is not a port: {port}")))?;
        }
        if let Some(site) = lookup("OPENSTATES_SITE_URL") {
            self.server.site_url = site.trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("OPENSTATES_LOG_DIR") {
            self.logging.dir = PathBuf::from(dir);
        }
        if let Some(token) = lookup("OPENSTATES_ADMIN_TOKEN") {
            self.admin.token = Some(token).filter(|t| !t.is_empty());
        }
        Ok(())
    }
}
