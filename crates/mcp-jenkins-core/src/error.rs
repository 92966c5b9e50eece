use mcp_jenkins_rest::JenkinsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing Jenkins credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Jenkins(#[from] JenkinsError),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_names_fields() {
        let err = CoreError::MissingCredentials(vec!["url", "password"]);
        assert_eq!(err.to_string(), "Missing Jenkins credentials: url, password");
    }

    #[test]
    fn test_jenkins_error_is_transparent() {
        let err: CoreError = JenkinsError::MissingParameters(vec!["id".to_string()]).into();
        assert_eq!(err.to_string(), "Missing: id");
    }
}
