//! Error types for the biogas monitor

/// Errors that can occur in the biogas monitor
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Network failure, non-success HTTP status or an unparseable body.
    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

impl MonitorError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        MonitorError::Transport {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by a transport error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            MonitorError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP error! status: {}: {}", code, message),
        None => format!("HTTP request failed: {}", message),
    }
}

/// Result type alias for biogas monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
