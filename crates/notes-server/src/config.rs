//! Server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// How bearer tokens are verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// Verify RS256 tokens against the identity provider's published key set.
    Jwks {
        jwks_url: String,
        issuer: Option<String>,
        audience: Option<String>,
        cache_ttl: Duration,
    },
    /// Verify HS256 tokens with a shared secret.
    SharedSecret {
        secret: String,
        issuer: Option<String>,
        audience: Option<String>,
    },
}

/// Google's key set for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// Name reported by `GET /`.
    pub project_name: String,
    /// PostgreSQL URL. When unset the in-memory store is used.
    pub database_url: Option<String>,
    /// Connection pool size.
    pub database_max_connections: u32,
    /// Collection holding note documents.
    pub notes_collection: String,
    /// Page size used when a list request omits one.
    pub default_page_size: u32,
    /// Largest accepted page size.
    pub max_page_size: u32,
    /// Token verification settings.
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `PORT`: Server port (default: 8000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    /// - `LOG_FORMAT`: "text" or "json" (default: "text")
    /// - `CORS_ALLOWED_ORIGINS`: Allowed CORS origins
    ///   (default: "http://localhost:3000,http://localhost:8080")
    /// - `PROJECT_NAME`: (default: "Notes API")
    /// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` (default: 10)
    /// - `NOTES_COLLECTION` (default: "notes")
    /// - `DEFAULT_PAGE_SIZE` (default: 20), `MAX_PAGE_SIZE` (default: 100)
    ///
    /// Authentication:
    /// - `AUTH_MODE`: "jwks" (default) or "secret"
    /// - `FIREBASE_PROJECT_ID`: derives the JWKS URL, issuer, and audience
    /// - `JWKS_URL`, `TOKEN_ISSUER`, `TOKEN_AUDIENCE`: explicit overrides
    /// - `JWKS_CACHE_SECONDS` (default: 3600)
    /// - `JWT_SECRET_KEY`: required in "secret" mode
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", 8000u16)?;
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "LOG_FORMAT".to_string(),
                    reason: format!("expected \"text\" or \"json\", got {other:?}"),
                });
            }
        };
        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://localhost:8080".to_string());
        let project_name = get("PROJECT_NAME").unwrap_or_else(|| "Notes API".to_string());

        let database_url = get("DATABASE_URL");
        let database_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let notes_collection = get("NOTES_COLLECTION").unwrap_or_else(|| "notes".to_string());

        let default_page_size = parse_or(&get, "DEFAULT_PAGE_SIZE", 20u32)?;
        let max_page_size = parse_or(&get, "MAX_PAGE_SIZE", 100u32)?;
        if default_page_size == 0 || max_page_size == 0 || default_page_size > max_page_size {
            return Err(ConfigError::InvalidValue {
                name: "DEFAULT_PAGE_SIZE".to_string(),
                reason: format!(
                    "must be between 1 and MAX_PAGE_SIZE ({max_page_size}), got {default_page_size}"
                ),
            });
        }

        let auth = auth_from_lookup(&get)?;

        Ok(Self {
            port,
            log_level,
            log_format,
            cors_allowed_origins,
            project_name,
            database_url,
            database_max_connections,
            notes_collection,
            default_page_size,
            max_page_size,
            auth,
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn auth_from_lookup<G>(get: &G) -> Result<AuthConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let project_id = get("FIREBASE_PROJECT_ID");
    let issuer = get("TOKEN_ISSUER").or_else(|| {
        project_id
            .as_ref()
            .map(|id| format!("https://securetoken.google.com/{id}"))
    });
    let audience = get("TOKEN_AUDIENCE").or_else(|| project_id.clone());

    match get("AUTH_MODE").as_deref() {
        None | Some("jwks") => {
            let jwks_url = match get("JWKS_URL") {
                Some(url) => url,
                None if project_id.is_some() => FIREBASE_JWKS_URL.to_string(),
                None => {
                    return Err(ConfigError::MissingEnvVar(
                        "JWKS_URL (or FIREBASE_PROJECT_ID)".to_string(),
                    ));
                }
            };
            let cache_seconds = parse_or(get, "JWKS_CACHE_SECONDS", 3600u64)?;
            Ok(AuthConfig::Jwks {
                jwks_url,
                issuer,
                audience,
                cache_ttl: Duration::from_secs(cache_seconds),
            })
        }
        Some("secret") => {
            let secret = get("JWT_SECRET_KEY")
                .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET_KEY".to_string()))?;
            Ok(AuthConfig::SharedSecret {
                secret,
                issuer,
                audience,
            })
        }
        Some(other) => Err(ConfigError::InvalidValue {
            name: "AUTH_MODE".to_string(),
            reason: format!("expected \"jwks\" or \"secret\", got {other:?}"),
        }),
    }
}

fn parse_or<G, T>(get: &G, name: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config =
            ServerConfig::from_lookup(lookup(&[("FIREBASE_PROJECT_ID", "demo-notes")])).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.cors_allowed_origins,
            "http://localhost:3000,http://localhost:8080"
        );
        assert_eq!(config.project_name, "Notes API");
        assert_eq!(config.database_url, None);
        assert_eq!(config.notes_collection, "notes");
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn test_firebase_project_derives_jwks_settings() {
        let config =
            ServerConfig::from_lookup(lookup(&[("FIREBASE_PROJECT_ID", "demo-notes")])).unwrap();
        assert_eq!(
            config.auth,
            AuthConfig::Jwks {
                jwks_url: FIREBASE_JWKS_URL.to_string(),
                issuer: Some("https://securetoken.google.com/demo-notes".to_string()),
                audience: Some("demo-notes".to_string()),
                cache_ttl: Duration::from_secs(3600),
            }
        );
    }

    #[test]
    fn test_jwks_mode_requires_a_key_source() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_secret_mode() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("AUTH_MODE", "secret"),
            ("JWT_SECRET_KEY", "s3cret"),
            ("TOKEN_AUDIENCE", "notes"),
        ]))
        .unwrap();
        assert_eq!(
            config.auth,
            AuthConfig::SharedSecret {
                secret: "s3cret".to_string(),
                issuer: None,
                audience: Some("notes".to_string()),
            }
        );

        let err = ServerConfig::from_lookup(lookup(&[("AUTH_MODE", "secret")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET_KEY"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = [("AUTH_MODE", "secret"), ("JWT_SECRET_KEY", "k")];

        let mut pairs = base.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&pairs)).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));

        let mut pairs = base.to_vec();
        pairs.push(("DEFAULT_PAGE_SIZE", "500"));
        assert!(ServerConfig::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("LOG_FORMAT", "xml"));
        assert!(ServerConfig::from_lookup(lookup(&pairs)).is_err());

        assert!(ServerConfig::from_lookup(lookup(&[("AUTH_MODE", "basic")])).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("AUTH_MODE", "secret"),
            ("JWT_SECRET_KEY", "k"),
            ("PORT", "9123"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().port(), 9123);
    }
}
