use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration values read from the process environment
///
/// Every field is optional; defaults are applied during merge.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_enabled: Option<bool>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub recordings_dir: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
    pub max_upload_size_bytes: Option<usize>,
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
    pub max_websocket_connections: Option<usize>,
    pub max_connections_per_ip: Option<u32>,
}

impl EnvConfig {
    /// Read all supported variables
    ///
    /// # Errors
    /// Returns an error naming the variable when a value cannot be parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            host: string_var("HOST"),
            port: parse_var("PORT")?,
            tls_enabled: bool_var("TLS_ENABLED")?,
            tls_cert_path: string_var("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: string_var("TLS_KEY_PATH").map(PathBuf::from),
            recordings_dir: string_var("RECORDINGS_DIR").map(PathBuf::from),
            public_dir: string_var("PUBLIC_DIR").map(PathBuf::from),
            max_upload_size_bytes: parse_var("MAX_UPLOAD_SIZE_BYTES")?,
            cors_allowed_origins: string_var("CORS_ALLOWED_ORIGINS"),
            rate_limit_requests_per_second: parse_var("RATE_LIMIT_REQUESTS_PER_SECOND")?,
            rate_limit_burst_size: parse_var("RATE_LIMIT_BURST_SIZE")?,
            max_websocket_connections: parse_var("MAX_WEBSOCKET_CONNECTIONS")?,
            max_connections_per_ip: parse_var("MAX_CONNECTIONS_PER_IP")?,
        })
    }
}

/// Non-empty, trimmed value of a variable
fn string_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match string_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: '{raw}' ({e})").into()),
        None => Ok(None),
    }
}

fn bool_var(name: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    match string_var(name) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(format!("Invalid value for {name}: '{raw}' (expected true/false)").into()),
        },
        None => Ok(None),
    }
}
