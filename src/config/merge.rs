use std::path::PathBuf;

use super::env::EnvConfig;
use super::yaml::YamlConfig;
use super::{
    DEFAULT_HOST, DEFAULT_MAX_CONNECTIONS_PER_IP, DEFAULT_MAX_UPLOAD_SIZE_BYTES, DEFAULT_PORT,
    DEFAULT_PUBLIC_DIR, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_RPS, DEFAULT_RECORDINGS_DIR,
    ServerConfig, TlsConfig,
};

/// Merge environment variables (base) with optional YAML overrides
///
/// Priority: YAML > ENV > defaults
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    let yaml = yaml.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let storage = yaml.storage.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();
    let tls_yaml = server.tls.unwrap_or_default();

    let tls_enabled = tls_yaml.enabled.or(env.tls_enabled).unwrap_or(false);
    let tls = if tls_enabled {
        let cert_path = tls_yaml
            .cert_path
            .map(PathBuf::from)
            .or(env.tls_cert_path)
            .ok_or("TLS is enabled but no certificate path is configured (TLS_CERT_PATH)")?;
        let key_path = tls_yaml
            .key_path
            .map(PathBuf::from)
            .or(env.tls_key_path)
            .ok_or("TLS is enabled but no private key path is configured (TLS_KEY_PATH)")?;
        Some(TlsConfig {
            cert_path,
            key_path,
        })
    } else {
        None
    };

    Ok(ServerConfig {
        host: server
            .host
            .or(env.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: server.port.or(env.port).unwrap_or(DEFAULT_PORT),
        tls,
        recordings_dir: storage
            .recordings_dir
            .map(PathBuf::from)
            .or(env.recordings_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORDINGS_DIR)),
        public_dir: storage
            .public_dir
            .map(PathBuf::from)
            .or(env.public_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR)),
        max_upload_size_bytes: storage
            .max_upload_size_bytes
            .or(env.max_upload_size_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_BYTES),
        cors_allowed_origins: security.cors_allowed_origins.or(env.cors_allowed_origins),
        rate_limit_requests_per_second: security
            .rate_limit_requests_per_second
            .or(env.rate_limit_requests_per_second)
            .unwrap_or(DEFAULT_RATE_LIMIT_RPS),
        rate_limit_burst_size: security
            .rate_limit_burst_size
            .or(env.rate_limit_burst_size)
            .unwrap_or(DEFAULT_RATE_LIMIT_BURST),
        max_websocket_connections: security
            .max_websocket_connections
            .or(env.max_websocket_connections),
        max_connections_per_ip: security
            .max_connections_per_ip
            .or(env.max_connections_per_ip)
            .unwrap_or(DEFAULT_MAX_CONNECTIONS_PER_IP),
    })
}
