/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, JWT 検証設定, HTTP 制限など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::services::auth::DEFAULT_REALM;

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,

    // HMAC secret or PEM public key
    pub jwt_key_material: Vec<u8>,
    pub jwt_audience: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_algorithms: Option<Vec<Algorithm>>,
    pub jwt_realm: String,
    pub jwt_leeway_seconds: u64,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_algorithms", &self.jwt_algorithms)
            .field("jwt_realm", &self.jwt_realm)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let jwt_key_material = match (
            non_empty_var("JWT_SECRET"),
            non_empty_var("JWT_PUBLIC_KEY_PEM"),
        ) {
            (Some(secret), None) => secret.into_bytes(),
            (None, Some(pem)) => pem.replace("\\n", "\n").into_bytes(),
            (Some(_), Some(_)) => return Err(ConfigError::Invalid("JWT_SECRET")),
            (None, None) => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let jwt_audience = non_empty_var("JWT_AUDIENCE");
        let jwt_issuer = non_empty_var("JWT_ISSUER");

        let jwt_algorithms = non_empty_var("JWT_ALGORITHMS")
            .map(|v| parse_algorithms(&v))
            .transpose()?;

        let jwt_realm = non_empty_var("JWT_REALM").unwrap_or_else(|| DEFAULT_REALM.to_string());

        let jwt_leeway_seconds = match non_empty_var("JWT_LEEWAY_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_LEEWAY_SECONDS"))?,
            None => 0,
        };

        let request_body_limit_bytes = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            addr,
            jwt_key_material,
            jwt_audience,
            jwt_issuer,
            jwt_algorithms,
            jwt_realm,
            jwt_leeway_seconds,
            request_body_limit_bytes,
            request_timeout,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma separated list such as `HS256, RS256`.
pub fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Algorithm::from_str(s).map_err(|_| ConfigError::Invalid("JWT_ALGORITHMS")))
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("JWT_ALGORITHMS"));
    }
    Ok(algorithms)
}
