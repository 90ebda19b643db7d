//! Credentials and base URL for the identity service.

use std::env;
use std::fmt;

use url::Url;

use crate::error::ConfigError;

pub const ENV_USERNAME: &str = "API_USERNAME";
pub const ENV_PASSWORD: &str = "API_PASSWORD";
pub const ENV_URL: &str = "API_URL";
pub const ENV_VERSION: &str = "API_VERSION";

/// Basic-auth credentials plus the versioned base URL every path is joined
/// onto. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    base_url: Url,
}

impl Credentials {
    /// Build credentials for `https://{url}/{version}/`.
    pub fn new(username: &str, password: &str, url: &str, version: &str) -> Result<Self, ConfigError> {
        let username = required(username, "Username for Basic authentication is required")?;
        let password = required(password, "Password for Basic authentication is required")?;
        let url = required(url, "URL is required")?;
        let version = required(version, "Version of API is required")?;

        let base_url = format!("https://{}/{}/", url.trim_matches('/'), version.trim_matches('/'));
        Ok(Self {
            username,
            password,
            base_url: parse_base(base_url)?,
        })
    }

    /// Build credentials against an explicit base URL, e.g. a plain-http
    /// test deployment. A trailing `/` is added when missing.
    pub fn with_base_url(username: &str, password: &str, base_url: &str) -> Result<Self, ConfigError> {
        let username = required(username, "Username for Basic authentication is required")?;
        let password = required(password, "Password for Basic authentication is required")?;
        let base_url = required(base_url, "URL is required")?;
        Ok(Self {
            username,
            password,
            base_url: parse_base(base_url)?,
        })
    }

    /// Read `API_USERNAME`, `API_PASSWORD`, `API_URL` and `API_VERSION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name| env::var(name).unwrap_or_default();
        Self::new(
            &var(ENV_USERNAME),
            &var(ENV_PASSWORD),
            &var(ENV_URL),
            &var(ENV_VERSION),
        )
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

fn required(value: &str, message: &'static str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(message));
    }
    Ok(value.to_string())
}

fn parse_base(mut url: String) -> Result<Url, ConfigError> {
    if !url.ends_with('/') {
        url.push('/');
    }
    let parsed = Url::parse(&url).map_err(|e| ConfigError::InvalidBaseUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            url,
            reason: "not a base URL".to_string(),
        });
    }
    Ok(parsed)
}
