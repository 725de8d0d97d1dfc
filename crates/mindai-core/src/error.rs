use thiserror::Error;

#[derive(Error, Debug)]
pub enum MindError {
    #[error("Could not read attachment {name}: {message}")]
    UnreadableFile { name: String, message: String },

    #[error("Nothing to send: message text is empty and no file is attached")]
    EmptyRequest,

    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("{provider} returned a response in an unexpected format")]
    MalformedResponse { provider: String },

    #[error("{provider} did not answer within {secs}s")]
    ProviderTimeout { provider: String, secs: u64 },

    #[error("No provider is configured")]
    NoProviderSelected,

    #[error("Provider {0} is not supported")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MindError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.into(),
        }
    }

    pub fn unreadable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableFile {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Text shown to the user when a turn fails.
    ///
    /// Provider errors are passed through verbatim; wire-shape problems are
    /// reported generically.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider { message, .. } => message.clone(),
            Self::MalformedResponse { .. } => "No response from AI".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_surface_verbatim() {
        let err = MindError::provider("openrouter", "Rate limit exceeded");
        assert_eq!(err.user_message(), "Rate limit exceeded");
        assert_eq!(err.to_string(), "openrouter error: Rate limit exceeded");
    }

    #[test]
    fn malformed_response_is_generic() {
        let err = MindError::malformed("gemini");
        assert_eq!(err.user_message(), "No response from AI");
    }
}
