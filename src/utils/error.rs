use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Transport error while calling {url}: {source}")]
    TransportError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} from {url}")]
    HttpError { status: u16, url: String },

    #[error("Response body is not valid JSON: {0}")]
    DecodeError(#[source] serde_json::Error),

    #[error("Expected a JSON array of attempt records, got {found}")]
    ShapeError { found: String },

    #[error("Invalid passback_params in record {index}: {reason}")]
    PassbackDecodeError { index: usize, reason: String },

    #[error("Database sink error: {0}")]
    SinkError(#[from] sqlx::Error),

    #[error("Unparsable log file name: {file_name}")]
    FilenameParseError { file_name: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Storage,
    FileSystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::TransportError { .. } | EtlError::HttpError { .. } => ErrorCategory::Network,
            EtlError::DecodeError(_)
            | EtlError::ShapeError { .. }
            | EtlError::PassbackDecodeError { .. }
            | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::SinkError(_) => ErrorCategory::Storage,
            EtlError::FilenameParseError { .. } | EtlError::IoError(_) => {
                ErrorCategory::FileSystem
            }
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::PassbackDecodeError { .. } | EtlError::FilenameParseError { .. } => {
                ErrorSeverity::Low
            }
            EtlError::TransportError { .. }
            | EtlError::HttpError { .. }
            | EtlError::DecodeError(_)
            | EtlError::ShapeError { .. } => ErrorSeverity::Medium,
            EtlError::SinkError(_) | EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::TransportError { .. } => {
                "Check network connectivity and that the API host is reachable".to_string()
            }
            EtlError::HttpError { status, .. } if (400..500).contains(status) => {
                "Verify the client id, client key and date range in the [API] section".to_string()
            }
            EtlError::HttpError { .. } => {
                "The statistics API reported a server error; run again later".to_string()
            }
            EtlError::DecodeError(_) | EtlError::ShapeError { .. } => {
                "Confirm api_url points at the attempts endpoint returning a JSON array"
                    .to_string()
            }
            EtlError::PassbackDecodeError { .. } => {
                "The record was kept with empty passback fields; no action needed".to_string()
            }
            EtlError::SinkError(_) => {
                "Check the [DATABASE] section and that PostgreSQL accepts connections; the batch was rolled back".to_string()
            }
            EtlError::FilenameParseError { .. } => {
                "Only YYYY-MM-DD.log files are managed in the log directory".to_string()
            }
            EtlError::IoError(_) => "Check file permissions and paths".to_string(),
            EtlError::SerializationError(_) => "Inspect the offending payload".to_string(),
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not download attempts: {}", self),
            ErrorCategory::Data => format!("Unexpected data from the API: {}", self),
            ErrorCategory::Storage => format!("Could not write to the database: {}", self),
            ErrorCategory::FileSystem => format!("File system problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_suggestion_depends_on_status() {
        let client_side = EtlError::HttpError {
            status: 403,
            url: "https://stats.example.com".to_string(),
        };
        let server_side = EtlError::HttpError {
            status: 502,
            url: "https://stats.example.com".to_string(),
        };

        assert_eq!(client_side.category(), ErrorCategory::Network);
        assert!(client_side.recovery_suggestion().contains("client key"));
        assert!(server_side.recovery_suggestion().contains("server error"));
    }

    #[test]
    fn test_severity_ordering() {
        let passback = EtlError::PassbackDecodeError {
            index: 0,
            reason: "bad".to_string(),
        };
        let config = EtlError::ConfigError {
            message: "bad".to_string(),
        };
        assert!(passback.severity() < config.severity());
    }
}
