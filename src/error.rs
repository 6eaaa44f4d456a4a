// Error types shared by the domain and application layers
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a usable payload from the sensor API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("request to sensor API failed: {0}")]
    Transport(String),

    #[error("sensor API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed sensor payload: {0}")]
    Malformed(String),

    #[error("sensor API did not answer within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Malformed(_) => "malformed",
            FetchError::Timeout(_) => "timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    /// A sample's channels differ from the buffer's declared channel set.
    /// This is a wiring bug and must never be swallowed.
    #[error("sample channels do not match buffer schema (missing: {missing:?}, unexpected: {unexpected:?})")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("buffer capacity must be greater than zero")]
    InvalidCapacity,

    #[error("buffer needs at least one channel")]
    EmptyChannelSet,

    #[error("history limit must be at least 1")]
    InvalidLimit,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MonitorError {
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::SchemaMismatch { .. } => "schema_mismatch",
            MonitorError::Fetch(err) => err.kind(),
            MonitorError::InvalidCapacity => "invalid_capacity",
            MonitorError::EmptyChannelSet => "empty_channel_set",
            MonitorError::InvalidLimit => "invalid_limit",
            MonitorError::InvalidConfig(_) => "invalid_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_a_fetch_error() {
        let err: MonitorError = FetchError::Timeout(Duration::from_millis(1500)).into();
        assert_eq!(err.kind(), "timeout");
        assert!(matches!(err, MonitorError::Fetch(FetchError::Timeout(_))));
    }

    #[test]
    fn test_schema_mismatch_message_names_channels() {
        let err = MonitorError::SchemaMismatch {
            missing: vec!["humidity".to_string()],
            unexpected: vec!["pressure".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("humidity"));
        assert!(message.contains("pressure"));
    }
}
