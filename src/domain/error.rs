use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("gateway: {0}")]
    Gateway(String),

    #[error("accounting: {0}")]
    Accounting(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// The message without the error-class prefix. Synchronous entry points
    /// surface this directly as the response body.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Gateway(msg)
            | Self::Accounting(msg)
            | Self::Storage(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
