use thiserror::Error;

/// Errors raised while talking to a Jenkins controller
#[derive(Error, Debug)]
pub enum JenkinsError {
    #[error("Missing: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP {status} from {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

impl JenkinsError {
    /// HTTP status of the failed response, if the error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            JenkinsError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type JenkinsResult<T> = Result<T, JenkinsError>;

impl From<serde_json::Error> for JenkinsError {
    fn from(err: serde_json::Error) -> Self {
        JenkinsError::Serialization(err.to_string())
    }
}

impl From<regex::Error> for JenkinsError {
    fn from(err: regex::Error) -> Self {
        JenkinsError::InvalidPattern(err.to_string())
    }
}

impl From<reqwest::Error> for JenkinsError {
    fn from(err: reqwest::Error) -> Self {
        JenkinsError::Network(err.to_string())
    }
}
