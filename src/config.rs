use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 15;
/// One year.
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 365 * 24 * 60;
const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    #[error("setting {key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for the token service and password hashing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub password_hash_cost: u32,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub honeycomb_api_key: Option<String>,
    pub environment: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Reads every setting from the process environment.
    ///
    /// | Env Var                            | Required | Default       |
    /// |------------------------------------|----------|---------------|
    /// | `DATABASE_URL`                     | **yes**  | --            |
    /// | `AUTH_SECRET_KEY`                  | **yes**  | --            |
    /// | `AUTH_ALGORITHM`                   | no       | `HS256`       |
    /// | `AUTH_ACCESS_TOKEN_EXPIRE_MINUTES` | no       | `15`          |
    /// | `AUTH_PASSWORD_HASH_COST`          | no       | bcrypt default|
    /// | `CORS_ALLOWED_ORIGINS`             | no       | `*`           |
    /// | `OTEL_EXPORTER_OTLP_ENDPOINT`      | no       | --            |
    /// | `HONEYCOMB_API_KEY`                | no       | --            |
    /// | `DEPLOYMENT_ENVIRONMENT`           | no       | `development` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let secret_key = required("AUTH_SECRET_KEY")?;

        let algorithm = parse_algorithm(
            &optional("AUTH_ALGORITHM").unwrap_or_else(|| DEFAULT_ALGORITHM.to_string()),
        )?;

        let access_token_expire_minutes = match optional("AUTH_ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(value) => parse_positive_minutes(&value)?,
            None => DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
        };

        let password_hash_cost = match optional("AUTH_PASSWORD_HASH_COST") {
            Some(value) => parse_hash_cost(&value)?,
            None => bcrypt::DEFAULT_COST,
        };

        let cors_allowed_origins = optional("CORS_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            database_url,
            auth: AuthConfig {
                secret_key,
                algorithm,
                access_token_expire_minutes,
                password_hash_cost,
            },
            cors_allowed_origins,
            telemetry: TelemetryConfig {
                otlp_endpoint: optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
                honeycomb_api_key: optional("HONEYCOMB_API_KEY"),
                environment: optional("DEPLOYMENT_ENVIRONMENT")
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            },
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

/// Only HMAC algorithms can be driven by a shared secret.
pub fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "AUTH_ALGORITHM",
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let algorithm = Algorithm::from_str(&value.to_ascii_uppercase())
        .map_err(|_| invalid("unknown signing algorithm"))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(invalid("only HS256, HS384 and HS512 are supported")),
    }
}

fn parse_positive_minutes(value: &str) -> Result<i64, ConfigError> {
    match value.parse::<i64>() {
        Ok(minutes) if (1..=MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&minutes) => Ok(minutes),
        _ => Err(ConfigError::Invalid {
            key: "AUTH_ACCESS_TOKEN_EXPIRE_MINUTES",
            value: value.to_string(),
            reason: format!(
                "expected between 1 and {} minutes",
                MAX_ACCESS_TOKEN_EXPIRE_MINUTES
            ),
        }),
    }
}

fn parse_hash_cost(value: &str) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(cost) if (4..=31).contains(&cost) => Ok(cost),
        _ => Err(ConfigError::Invalid {
            key: "AUTH_PASSWORD_HASH_COST",
            value: value.to_string(),
            reason: "expected a bcrypt cost between 4 and 31".to_string(),
        }),
    }
}
