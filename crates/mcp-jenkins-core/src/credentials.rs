//! Resolving which Jenkins to talk to for a request
//!
//! An HTTP transport may carry `X-Jenkins-Url`, `X-Jenkins-Username` and
//! `X-Jenkins-Password` headers. Each one that is present overrides the
//! matching process setting for that request only.

use std::fmt;

use http::HeaderMap;

use crate::error::{
    CoreError,
    CoreResult,
};
use crate::settings::JenkinsSettings;

pub const HEADER_URL: &str = "x-jenkins-url";
pub const HEADER_USERNAME: &str = "x-jenkins-username";
pub const HEADER_PASSWORD: &str = "x-jenkins-password";

/// Per-request overrides. Every field is optional.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RequestCredentials {
    /// Reads the `X-Jenkins-*` headers, decoding their bytes as latin-1.
    /// Empty values are ignored. The url and username are trimmed; the
    /// password is taken exactly as sent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .map(|value| decode_latin1(value.as_bytes()))
                .filter(|value| !value.is_empty())
        };
        let trimmed = |value: String| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Self {
            url: get(HEADER_URL).and_then(trimmed),
            username: get(HEADER_USERNAME).and_then(trimmed),
            password: get(HEADER_PASSWORD),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.username.is_none() && self.password.is_none()
    }
}

/// Every byte maps to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

impl fmt::Debug for RequestCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A complete credential set, ready to build a client from
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Request values first, then settings. Fails naming every field neither
/// source provides.
pub fn resolve_credentials(
    request: &RequestCredentials, settings: &JenkinsSettings,
) -> CoreResult<Credentials> {
    let url = request.url.clone().or_else(|| settings.url.clone());
    let username = request.username.clone().or_else(|| settings.username.clone());
    let password = request.password.clone().or_else(|| settings.password.clone());

    match (url, username, password) {
        (Some(url), Some(username), Some(password)) => Ok(Credentials {
            url,
            username,
            password,
        }),
        (url, username, password) => {
            let missing = [
                ("url", url.is_none()),
                ("username", username.is_none()),
                ("password", password.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, is_missing)| is_missing.then_some(field))
            .collect();
            Err(CoreError::MissingCredentials(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn settings() -> JenkinsSettings {
        JenkinsSettings {
            url: Some("https://env.example.com".to_string()),
            username: Some("env-user".to_string()),
            password: Some("env-pass".to_string()),
            ..JenkinsSettings::default()
        }
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_URL, HeaderValue::from_static("https://header.example.com"));
        headers.insert(HEADER_USERNAME, HeaderValue::from_static("header-user"));
        headers.insert(HEADER_PASSWORD, HeaderValue::from_static(""));

        let request = RequestCredentials::from_headers(&headers);
        assert_eq!(request.url.as_deref(), Some("https://header.example.com"));
        assert_eq!(request.username.as_deref(), Some("header-user"));
        assert_eq!(request.password, None);
        assert!(RequestCredentials::from_headers(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_from_headers_keeps_password_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_USERNAME, HeaderValue::from_bytes(b"j\xfcrgen").unwrap());
        headers.insert(HEADER_PASSWORD, HeaderValue::from_bytes(b" p\xe4ss ").unwrap());

        let request = RequestCredentials::from_headers(&headers);
        assert_eq!(request.username.as_deref(), Some("jürgen"));
        assert_eq!(request.password.as_deref(), Some(" päss "));
    }

    #[test]
    fn test_request_values_take_precedence_per_field() {
        let request = RequestCredentials {
            url: Some("https://header.example.com".to_string()),
            username: None,
            password: Some("header-pass".to_string()),
        };

        let credentials = resolve_credentials(&request, &settings()).unwrap();
        assert_eq!(credentials.url, "https://header.example.com");
        assert_eq!(credentials.username, "env-user");
        assert_eq!(credentials.password, "header-pass");
    }

    #[test]
    fn test_falls_back_to_settings() {
        let credentials = resolve_credentials(&RequestCredentials::default(), &settings()).unwrap();
        assert_eq!(credentials.url, "https://env.example.com");
    }

    #[test]
    fn test_missing_fields_are_named() {
        let request = RequestCredentials {
            username: Some("user".to_string()),
            ..RequestCredentials::default()
        };

        let err = resolve_credentials(&request, &JenkinsSettings::default()).unwrap_err();
        match err {
            CoreError::MissingCredentials(missing) => assert_eq!(missing, vec!["url", "password"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let credentials = resolve_credentials(&RequestCredentials::default(), &settings()).unwrap();
        assert!(!format!("{credentials:?}").contains("env-pass"));
    }
}
