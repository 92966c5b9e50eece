//! Process-level Jenkins configuration read from the environment

use std::fmt;
use std::time::Duration;

use mcp_jenkins_rest::ClientOptions;

use crate::error::{
    CoreError,
    CoreResult,
};

pub const ENV_URL: &str = "JENKINS_URL";
pub const ENV_USERNAME: &str = "JENKINS_USERNAME";
pub const ENV_PASSWORD: &str = "JENKINS_PASSWORD";
pub const ENV_TIMEOUT: &str = "JENKINS_TIMEOUT";
pub const ENV_VERIFY_SSL: &str = "JENKINS_VERIFY_SSL";
pub const ENV_READ_ONLY: &str = "JENKINS_READ_ONLY";
pub const ENV_TOOL_ALIAS: &str = "JENKINS_TOOL_ALIAS";
pub const ENV_SESSION_SINGLETON: &str = "JENKINS_SESSION_SINGLETON";

/// Placeholder replaced by the tool's own name in a tool alias
pub const TOOL_NAME_PLACEHOLDER: &str = "[fn]";

const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, PartialEq, Eq)]
pub struct JenkinsSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub verify_ssl: bool,
    pub read_only: bool,
    pub tool_alias: String,
    pub session_singleton: bool,
}

impl Default for JenkinsSettings {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_ssl: true,
            read_only: false,
            tool_alias: TOOL_NAME_PLACEHOLDER.to_string(),
            session_singleton: true,
        }
    }
}

impl fmt::Debug for JenkinsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("verify_ssl", &self.verify_ssl)
            .field("read_only", &self.read_only)
            .field("tool_alias", &self.tool_alias)
            .field("session_singleton", &self.session_singleton)
            .finish()
    }
}

impl JenkinsSettings {
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let timeout = match get(ENV_TIMEOUT) {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                CoreError::InvalidConfig(format!(
                    "{ENV_TIMEOUT} must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => defaults.timeout,
        };

        let tool_alias = get(ENV_TOOL_ALIAS).unwrap_or(defaults.tool_alias);
        if !tool_alias.contains(TOOL_NAME_PLACEHOLDER) {
            return Err(CoreError::InvalidConfig(format!(
                "{ENV_TOOL_ALIAS} must contain {TOOL_NAME_PLACEHOLDER}, got {tool_alias:?}"
            )));
        }

        Ok(Self {
            url: get(ENV_URL),
            username: get(ENV_USERNAME),
            password: get(ENV_PASSWORD),
            timeout,
            verify_ssl: get(ENV_VERIFY_SSL).map_or(defaults.verify_ssl, |v| parse_bool(&v)),
            read_only: get(ENV_READ_ONLY).map_or(defaults.read_only, |v| parse_bool(&v)),
            tool_alias,
            session_singleton: get(ENV_SESSION_SINGLETON)
                .map_or(defaults.session_singleton, |v| parse_bool(&v)),
        })
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: self.timeout,
            verify_ssl: self.verify_ssl,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
