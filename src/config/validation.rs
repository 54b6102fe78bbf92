use super::ServerConfig;

/// Validate a merged configuration
pub fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_port(config.port)?;
    validate_tls(config)?;
    validate_limits(config)?;
    Ok(())
}

fn validate_port(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    if port == 0 {
        return Err("Server port must be non-zero".into());
    }
    Ok(())
}

fn validate_tls(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Some(tls) = &config.tls else {
        return Ok(());
    };

    if !tls.cert_path.exists() {
        return Err(format!(
            "TLS certificate file not found: {}",
            tls.cert_path.display()
        )
        .into());
    }
    if !tls.key_path.exists() {
        return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
    }
    Ok(())
}

fn validate_limits(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.max_upload_size_bytes == 0 {
        return Err("max_upload_size_bytes must be greater than zero".into());
    }
    if config.rate_limit_requests_per_second == 0 {
        return Err("rate_limit_requests_per_second must be greater than zero".into());
    }
    if config.rate_limit_burst_size == 0 {
        return Err("rate_limit_burst_size must be greater than zero".into());
    }
    if config.max_connections_per_ip == 0 {
        return Err("max_connections_per_ip must be greater than zero".into());
    }
    if config.max_websocket_connections == Some(0) {
        return Err("max_websocket_connections must be greater than zero when set".into());
    }
    Ok(())
}
