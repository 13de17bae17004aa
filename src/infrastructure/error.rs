use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Credential store error: {0}")]
    Credential(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error (http {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Session expired; sign in again")]
    SessionExpired,
}

impl InfraError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// Message suitable for surfacing in the webview. Validation text,
    /// plain-text 4xx bodies, and session expiry come through verbatim;
    /// everything else collapses to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::SessionExpired => self.to_string(),
            Self::Api { status, message }
                if (400..500).contains(status) && !message.trim().is_empty() =>
            {
                message.clone()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
