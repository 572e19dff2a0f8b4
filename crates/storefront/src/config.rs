//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BRIGHTIQUE_API_BASE_URL` - Backend REST API root (e.g., `https://api.brightique.in/api/`)
//!
//! ## Optional
//! - `BRIGHTIQUE_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `BRIGHTIQUE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `BRIGHTIQUE_ACCESS_TOKEN` - Bearer token; when set, a session is configured
//!   and the variables below become required
//! - `BRIGHTIQUE_USER_ID` - Backend user ID for the session
//! - `BRIGHTIQUE_USER_EMAIL` - Login email for the session
//! - `BRIGHTIQUE_USER_NAME` - Display name (default: the email)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use brightique_core::UserId;

use crate::models::{Session, User};

const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Prefixes of common placeholder values (case-insensitive).
///
/// Matched at the start only: issued tokens are random and may contain these
/// anywhere.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Pre-authenticated session, if one is configured
    pub session: Option<SessionConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// API root; always ends with `/` so relative endpoints join under it
    pub base_url: Url,
    /// How long the unfiltered catalog stays cached
    pub catalog_cache_ttl: Duration,
    /// Timeout applied to every request
    pub http_timeout: Duration,
}

impl ApiConfig {
    /// Configuration for `base_url` with default timeouts.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Credentials for a pre-authenticated session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct SessionConfig {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub access_token: SecretString,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl SessionConfig {
    /// Build the session handed to the store on sign-in.
    #[must_use]
    pub fn to_session(&self) -> Session {
        Session::new(
            User {
                id: self.user_id,
                name: self.name.clone(),
                email: self.email.clone(),
                is_admin: false,
            },
            self.access_token.clone(),
        )
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the access token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let base_url = env.required("BRIGHTIQUE_API_BASE_URL")?;
        let base_url = parse_base_url(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BRIGHTIQUE_API_BASE_URL".to_string(), e))?;

        let api = ApiConfig {
            base_url,
            catalog_cache_ttl: Duration::from_secs(env.parsed_or(
                "BRIGHTIQUE_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CATALOG_CACHE_TTL_SECS,
            )?),
            http_timeout: Duration::from_secs(
                env.parsed_or("BRIGHTIQUE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            ),
        };

        let session = SessionConfig::from_env(&env)?;

        Ok(Self {
            api,
            session,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

impl SessionConfig {
    fn from_env<F>(env: &Env<F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(token) = env.optional("BRIGHTIQUE_ACCESS_TOKEN") else {
            return Ok(None);
        };
        validate_secret_strength(&token, "BRIGHTIQUE_ACCESS_TOKEN")?;

        let user_id = env.parsed("BRIGHTIQUE_USER_ID")?;
        let email = env.required("BRIGHTIQUE_USER_EMAIL")?;
        if !email.contains('@') {
            return Err(ConfigError::InvalidEnvVar(
                "BRIGHTIQUE_USER_EMAIL".to_string(),
                "not an email address".to_string(),
            ));
        }
        let name = env
            .optional("BRIGHTIQUE_USER_NAME")
            .unwrap_or_else(|| email.clone());

        Ok(Some(Self {
            user_id,
            name,
            email,
            access_token: SecretString::from(token),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup; blank values count as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional environment variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a required environment variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a required environment variable.
    fn parsed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.required(key)?
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse an environment variable with a default value.
    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(_) => self.parsed(key),
            None => Ok(default),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(normalize_base_url(url))
}

/// Ensure the path ends with `/` so `Url::join` keeps the last segment.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.starts_with(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (starts with '{pattern}')"),
            ));
        }
    }

    // Issued tokens are random; a low-entropy value was typed by hand
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.k3Vq8ZpL2mXw9RtB";

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&[("BRIGHTIQUE_API_BASE_URL", "https://api.brightique.in/api")]).unwrap();

        assert_eq!(config.api.base_url.as_str(), "https://api.brightique.in/api/");
        assert_eq!(config.api.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.api.http_timeout, Duration::from_secs(15));
        assert!(config.session.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BRIGHTIQUE_API_BASE_URL"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[("BRIGHTIQUE_API_BASE_URL", "ftp://files.brightique.in/")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[("BRIGHTIQUE_API_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = load(&[
            ("BRIGHTIQUE_API_BASE_URL", "https://api.brightique.in/"),
            ("BRIGHTIQUE_HTTP_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "BRIGHTIQUE_HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_session_config() {
        let config = load(&[
            ("BRIGHTIQUE_API_BASE_URL", "https://api.brightique.in/"),
            ("BRIGHTIQUE_ACCESS_TOKEN", TOKEN),
            ("BRIGHTIQUE_USER_ID", "17"),
            ("BRIGHTIQUE_USER_EMAIL", "ananya@brightique.in"),
        ])
        .unwrap();

        let session_config = config.session.unwrap();
        assert_eq!(session_config.name, "ananya@brightique.in");

        let session = session_config.to_session();
        assert_eq!(session.user_id(), UserId::new(17));
        assert_eq!(session.bearer_token(), TOKEN);
    }

    #[test]
    fn test_session_requires_user_id() {
        let err = load(&[
            ("BRIGHTIQUE_API_BASE_URL", "https://api.brightique.in/"),
            ("BRIGHTIQUE_ACCESS_TOKEN", TOKEN),
            ("BRIGHTIQUE_USER_EMAIL", "ananya@brightique.in"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "BRIGHTIQUE_USER_ID"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[
            ("BRIGHTIQUE_API_BASE_URL", "https://api.brightique.in/"),
            ("BRIGHTIQUE_ACCESS_TOKEN", "  "),
            ("SENTRY_DSN", ""),
        ])
        .unwrap();
        assert!(config.session.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(TOKEN) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = validate_secret_strength("your-token-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength(TOKEN, "TEST_VAR").is_ok());
    }

    #[test]
    fn test_placeholder_words_inside_token_accepted() {
        let token = "eyJhbGciOiJIUzI1NiJ9.k3VxxXq8ZpL2mTodoXw9RtB";
        assert!(validate_secret_strength(token, "TEST_VAR").is_ok());
        assert!(validate_secret_strength("XXXX-k3Vq8ZpL2mXw9RtB", "TEST_VAR").is_err());
    }

    #[test]
    fn test_session_config_debug_redacts_token() {
        let config = SessionConfig {
            user_id: UserId::new(3),
            name: "Kabir".to_string(),
            email: "kabir@brightique.in".to_string(),
            access_token: SecretString::from(TOKEN),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("kabir@brightique.in"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(TOKEN));
    }
}
