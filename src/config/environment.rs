//! Configuración de variables de entorno
//!
//! Todo se lee una sola vez al arrancar. Un valor que no se puede interpretar
//! es un error de configuración; uno ausente toma su valor por defecto,
//! salvo `JWT_SECRET`, que es obligatorio.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::{PartialFailurePolicy, SiblingBidPolicy};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::retry::RetryPolicy;

/// Contra qué backend trabaja el motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Rest,
    Memory,
}

impl FromStr for BackendMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Config(format!("Unknown backend mode '{}'", other))),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub backend_mode: BackendMode,
    pub backend_base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub partial_failure_policy: PartialFailurePolicy,
    pub sibling_bid_policy: SiblingBidPolicy,
    pub poll_interval: Duration,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
}

impl EnvironmentConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("JWT_SECRET").ok_or_else(|| AppError::Config("JWT_SECRET must be set".to_string()))?;

        let poll_secs: u64 = parse_or(&var, "POLL_INTERVAL_SECS", 30)?;
        if poll_secs == 0 {
            return Err(AppError::Config("POLL_INTERVAL_SECS must be greater than zero".to_string()));
        }

        Ok(Self {
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 3000)?,
            backend_mode: parse_or(&var, "BACKEND_MODE", BackendMode::Rest)?,
            backend_base_url: var("BACKEND_BASE_URL").unwrap_or_else(|| "http://localhost:8080/api".to_string()),
            request_timeout: Duration::from_secs(parse_or(&var, "REQUEST_TIMEOUT_SECS", 15)?),
            retry: RetryPolicy::new(
                parse_or(&var, "TRANSITION_RETRY_ATTEMPTS", 3)?,
                Duration::from_millis(parse_or(&var, "TRANSITION_RETRY_BASE_MS", 200)?),
            ),
            partial_failure_policy: parse_or(&var, "PARTIAL_FAILURE_POLICY", PartialFailurePolicy::Report)?,
            sibling_bid_policy: parse_or(&var, "SIBLING_BID_POLICY", SiblingBidPolicy::Keep)?,
            poll_interval: Duration::from_secs(poll_secs),
            jwt_secret,
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{} has an invalid value '{}': {}", key, raw, e))),
    }
}
