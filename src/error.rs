use thiserror::Error;

/// Everything that can stop a load or a replay run.
///
/// Step-level variants are fatal to the current step only; the interpreter turns them
/// into a run failure and never retries.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Missing, malformed, or empty action script.
    #[error("script error: {0}")]
    Script(String),

    /// Selector syntax not recognized, or its target is absent from the page.
    #[error("selector error: {0}")]
    Selector(String),

    /// The target answered with a client or server error status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("assertion failed: {0}")]
    Assertion(String),

    /// An assertion's regular expression does not compile.
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("unsupported action '{0}'")]
    UnsupportedAction(String),

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid wait duration '{0}'")]
    InvalidWait(String),

    #[error("cookie store error: {0}")]
    CookieStore(String),
}

impl ReplayError {
    pub(crate) fn selector(msg: impl Into<String>) -> Self {
        Self::Selector(msg.into())
    }

    pub(crate) fn invalid_url(url: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T, E = ReplayError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_names_status_and_url() {
        let err = ReplayError::Http {
            url: "http://localhost/missing".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 from http://localhost/missing");
    }

    #[test]
    fn test_unsupported_action_message() {
        let err = ReplayError::UnsupportedAction("hover".into());
        assert_eq!(err.to_string(), "unsupported action 'hover'");
    }
}
