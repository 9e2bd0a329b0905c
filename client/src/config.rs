//! Backend configuration parsing and validation.
//!
//! Settings come from the environment and are validated once at startup.
//! A URL that still carries template placeholder content fails loudly
//! instead of letting every later request fail with a confusing transport
//! error.

use std::path::PathBuf;
use std::time::Duration;

use mockable::Env;
use tracing::warn;
use url::Url;

use crate::domain::DomainError;

pub(crate) const BACKEND_URL_ENV: &str = "MARKETPLACE_BACKEND_URL";
pub(crate) const ANON_KEY_ENV: &str = "MARKETPLACE_BACKEND_ANON_KEY";
pub(crate) const OAUTH_REDIRECT_ENV: &str = "MARKETPLACE_OAUTH_REDIRECT_URL";
pub(crate) const TIMEOUT_ENV: &str = "MARKETPLACE_HTTP_TIMEOUT_SECS";
pub(crate) const SESSION_FILE_ENV: &str = "MARKETPLACE_SESSION_FILE";
const HOME_ENV: &str = "HOME";
const DEFAULT_SESSION_FILE: &str = ".marketplace-session.json";

const DEV_OAUTH_REDIRECT: &str = "http://localhost:3000/auth/callback";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const URL_EXPECTED: &str = "absolute http(s) URL";
const TIMEOUT_EXPECTED: &str = "positive integer number of seconds";

const URL_PLACEHOLDERS: &[&str] = &[
    "your-project",
    "your_project",
    "placeholder",
    "<",
    ">",
    "example.supabase.co",
];
const KEY_PLACEHOLDERS: &[&str] = &["your-anon-key", "your_anon_key", "placeholder", "<", ">"];

/// Build mode for configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to a local OAuth callback with a warning.
    Debug,
    /// Release builds require every variable explicitly.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use marketplace_client::config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated settings for reaching the hosted platform.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendSettings {
    /// Project endpoint, e.g. `https://abc.supabase.co/`.
    pub url: Url,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    /// Where the provider sends users back after OAuth, email confirmation
    /// and password reset.
    pub oauth_redirect: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSettings")
            .field("url", &self.url.as_str())
            .field("anon_key", &"<redacted>")
            .field("oauth_redirect", &self.oauth_redirect.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Errors raised while validating backend configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing or blank.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// A variable still holds template placeholder content.
    #[error("{name} still contains placeholder content ('{marker}'); set it to your project's value")]
    Placeholder {
        name: &'static str,
        marker: &'static str,
    },
}

impl From<ConfigError> for DomainError {
    fn from(error: ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

/// Build backend settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use marketplace_client::config::{BuildMode, backend_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "MARKETPLACE_BACKEND_URL" => Some("https://abc.supabase.co".to_owned()),
///     "MARKETPLACE_BACKEND_ANON_KEY" => Some("public-anon-key".to_owned()),
///     "MARKETPLACE_OAUTH_REDIRECT_URL" => {
///         Some("https://shop.example.com/auth/callback".to_owned())
///     }
///     _ => None,
/// });
///
/// let settings = backend_settings_from_env(&env, BuildMode::Release).expect("valid settings");
/// assert_eq!(settings.url.host_str(), Some("abc.supabase.co"));
/// ```
///
/// # Errors
///
/// [`ConfigError`] for missing, malformed or placeholder values.
pub fn backend_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<BackendSettings, ConfigError> {
    let url = backend_url_from_env(env)?;
    let anon_key = anon_key_from_env(env)?;
    let oauth_redirect = oauth_redirect_from_env(env, mode)?;
    let timeout = timeout_from_env(env, mode)?;

    Ok(BackendSettings {
        url,
        anon_key,
        oauth_redirect,
        timeout,
    })
}

/// Where the session is kept between runs.
///
/// `MARKETPLACE_SESSION_FILE` wins; otherwise a dotfile in `HOME`. Without
/// either the session lives only as long as the process.
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
///
/// use marketplace_client::config::session_file_from_env;
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "HOME" => Some("/home/ana".to_owned()),
///     _ => None,
/// });
///
/// assert_eq!(
///     session_file_from_env(&env).as_deref(),
///     Some(Path::new("/home/ana/.marketplace-session.json"))
/// );
/// ```
pub fn session_file_from_env<E: Env>(env: &E) -> Option<PathBuf> {
    let configured = |name: &str| {
        env.string(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    };
    configured(SESSION_FILE_ENV)
        .map(PathBuf::from)
        .or_else(|| configured(HOME_ENV).map(|home| PathBuf::from(home).join(DEFAULT_SESSION_FILE)))
}

fn required<E: Env>(env: &E, name: &'static str) -> Result<String, ConfigError> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingEnv { name })
}

fn backend_url_from_env<E: Env>(env: &E) -> Result<Url, ConfigError> {
    let value = required(env, BACKEND_URL_ENV)?;
    reject_placeholder(BACKEND_URL_ENV, &value, URL_PLACEHOLDERS)?;
    parse_http_url(BACKEND_URL_ENV, value)
}

fn anon_key_from_env<E: Env>(env: &E) -> Result<String, ConfigError> {
    let value = required(env, ANON_KEY_ENV)?;
    reject_placeholder(ANON_KEY_ENV, &value, KEY_PLACEHOLDERS)?;
    Ok(value)
}

fn oauth_redirect_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Url, ConfigError> {
    match required(env, OAUTH_REDIRECT_ENV) {
        Ok(value) => {
            reject_placeholder(OAUTH_REDIRECT_ENV, &value, URL_PLACEHOLDERS)?;
            parse_http_url(OAUTH_REDIRECT_ENV, value)
        }
        Err(err) => {
            if mode.is_debug() {
                warn!(
                    fallback = DEV_OAUTH_REDIRECT,
                    "MARKETPLACE_OAUTH_REDIRECT_URL not set; using local callback"
                );
                parse_http_url(OAUTH_REDIRECT_ENV, DEV_OAUTH_REDIRECT.to_owned())
            } else {
                Err(err)
            }
        }
    }
}

fn timeout_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, ConfigError> {
    let Some(value) = env.string(TIMEOUT_ENV) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => {
            if mode.is_debug() {
                warn!(value = %value, "invalid MARKETPLACE_HTTP_TIMEOUT_SECS; using default");
                Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            } else {
                Err(ConfigError::InvalidEnv {
                    name: TIMEOUT_ENV,
                    value,
                    expected: TIMEOUT_EXPECTED,
                })
            }
        }
    }
}

fn reject_placeholder(
    name: &'static str,
    value: &str,
    markers: &[&'static str],
) -> Result<(), ConfigError> {
    let lowered = value.to_ascii_lowercase();
    match markers.iter().find(|marker| lowered.contains(**marker)) {
        Some(marker) => Err(ConfigError::Placeholder {
            name,
            marker: *marker,
        }),
        None => Ok(()),
    }
}

fn parse_http_url(name: &'static str, value: String) -> Result<Url, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value,
            expected: URL_EXPECTED,
        }),
    }
}
