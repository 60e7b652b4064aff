//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EYERIC_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `EYERIC_BASE_URL` - Public URL for the storefront
//! - `EYERIC_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `SUPABASE_URL` - Supabase project URL (e.g., `https://abc.supabase.co`)
//! - `SUPABASE_SERVICE_KEY` - Service-role key used for Storage uploads
//!
//! ## Optional
//! - `EYERIC_HOST` - Bind address (default: 127.0.0.1)
//! - `EYERIC_PORT` - Listen port (default: 3000)
//! - `EYERIC_CATALOG_CACHE_SECS` - Product table cache TTL (default: 60)
//! - `EYERIC_STATIC_DIR` - CSS/JS served under `/static` (default: crates/storefront/static)
//! - `EYERIC_CONTENT_DIR` - Markdown content root (default: crates/storefront/content)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CATALOG_CACHE_SECS: u64 = 60;
const DEFAULT_STATIC_DIR: &str = "crates/storefront/static";
const DEFAULT_CONTENT_DIR: &str = "crates/storefront/content";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL, used to decide whether cookies are `Secure`
    pub base_url: String,
    pub session_secret: SecretString,
    pub supabase: SupabaseConfig,
    /// How long the product table stays cached
    pub catalog_cache_ttl: Duration,
    pub static_dir: PathBuf,
    /// Holds `pages/*.md`
    pub content_dir: PathBuf,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Supabase Storage access.
///
/// Implements `Debug` manually to redact the service key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without a trailing slash
    pub url: Url,
    pub service_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("service_key", &"[REDACTED]")
            .finish()
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
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("EYERIC_DATABASE_URL")?;
        let host = parse_env("EYERIC_HOST", "127.0.0.1")?;
        let port = parse_env("EYERIC_PORT", "3000")?;
        let base_url = get_required_env("EYERIC_BASE_URL")?;
        let session_secret = get_validated_secret("EYERIC_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "EYERIC_SESSION_SECRET")?;

        let supabase = SupabaseConfig::from_env()?;
        let catalog_cache_ttl = Duration::from_secs(parse_env(
            "EYERIC_CATALOG_CACHE_SECS",
            &DEFAULT_CATALOG_CACHE_SECS.to_string(),
        )?);
        let static_dir = get_optional_env("EYERIC_STATIC_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);
        let content_dir = get_optional_env("EYERIC_CONTENT_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR), PathBuf::from);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            supabase,
            catalog_cache_ttl,
            static_dir,
            content_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("SUPABASE_URL")?;
        let url = parse_project_url(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e))?;

        Ok(Self {
            url,
            service_key: get_required_secret("SUPABASE_SERVICE_KEY")?,
        })
    }
}

/// Parse the Supabase project URL, requiring an http(s) scheme and a host.
fn parse_project_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim().trim_end_matches('/')).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy values.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
