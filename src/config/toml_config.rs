use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_RETENTION_DAYS: u32 = 3;
pub const MAX_RETENTION_DAYS: u32 = 36500;
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 1000;
/// PostgreSQL accepts at most 65535 bind parameters per statement; each row
/// binds seven.
pub const MAX_INSERT_CHUNK_SIZE: usize = 9000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "API")]
    pub api: ApiConfig,
    #[serde(rename = "DATABASE")]
    pub database: DatabaseConfig,
    #[serde(rename = "LOGGING", default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_url: String,
    pub client: String,
    pub client_key: String,
    pub start_date: String,
    pub end_date: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub insert_chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_level")]
    pub level: String,
    /// `text` or `json`, applies to the log file only.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.to_string()
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            retention_days: default_retention_days(),
            level: default_level(),
            format: default_format(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STATS_CLIENT_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Replaces the configured date range; either side may be left as is.
    pub fn override_dates(&mut self, start: Option<String>, end: Option<String>) {
        if let Some(start) = start {
            tracing::info!("Start date overridden to {}", start);
            self.api.start_date = start;
        }
        if let Some(end) = end {
            tracing::info!("End date overridden to {}", end);
            self.api.end_date = end;
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.log_dir)
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Query parameters in the order the statistics API documents them.
    pub fn query_params(&self) -> [(&'static str, &str); 4] {
        [
            ("client", self.client.as_str()),
            ("client_key", self.client_key.as_str()),
            ("start", self.start_date.as_str()),
            ("end", self.end_date.as_str()),
        ]
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
    }

    pub fn insert_chunk_size(&self) -> usize {
        self.insert_chunk_size.unwrap_or(DEFAULT_INSERT_CHUNK_SIZE)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("API.api_url", &self.api.api_url),
            ("API.client", &self.api.client),
            ("API.client_key", &self.api.client_key),
            ("DATABASE.dbname", &self.database.dbname),
            ("DATABASE.user", &self.database.user),
            ("DATABASE.password", &self.database.password),
            ("DATABASE.host", &self.database.host),
        ] {
            validation::validate_resolved(field, value)?;
        }

        validation::validate_url("API.api_url", &self.api.api_url)?;
        validation::validate_non_empty_string("API.client", &self.api.client)?;
        validation::validate_non_empty_string("API.client_key", &self.api.client_key)?;
        validation::validate_date_range(
            "API.start_date",
            &self.api.start_date,
            "API.end_date",
            &self.api.end_date,
        )?;
        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("API.timeout_seconds", timeout, 1, 3600)?;
        }

        validation::validate_non_empty_string("DATABASE.dbname", &self.database.dbname)?;
        validation::validate_non_empty_string("DATABASE.user", &self.database.user)?;
        validation::validate_non_empty_string("DATABASE.host", &self.database.host)?;
        validation::validate_range("DATABASE.port", self.database.port, 1, u16::MAX)?;
        validation::validate_range(
            "DATABASE.insert_chunk_size",
            self.database.insert_chunk_size(),
            1,
            MAX_INSERT_CHUNK_SIZE,
        )?;

        validation::validate_path("LOGGING.log_dir", &self.logging.log_dir)?;
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(EtlError::InvalidConfigValueError {
                field: "LOGGING.format".to_string(),
                value: self.logging.format.clone(),
                reason: "Unsupported format. Valid formats: text, json".to_string(),
            });
        }
        validation::validate_range(
            "LOGGING.retention_days",
            self.logging.retention_days,
            1,
            MAX_RETENTION_DAYS,
        )?;

        Ok(())
    }
}
