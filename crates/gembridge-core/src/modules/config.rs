use gembridge_types::{ConfigError, GatewayConfig};
use std::fs;
use std::path::Path;

/// Load gateway configuration.
///
/// `None` means "no config file": built-in defaults are used. A path that
/// does not exist is an error, since the operator asked for it explicitly.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let Some(path) = path else {
        tracing::info!("[Config] No config file given, using defaults");
        return GatewayConfig::default().validated();
    };

    let shown = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(&shown, &e))?;
    let config = GatewayConfig::from_json_str(&content)?;
    tracing::info!("[Config] Loaded {}", shown);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.port, 8045);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9999, "cache": {{"capacity": 10}}}}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.cache.capacity, 10);
        assert_eq!(config.cache.models_ttl_secs, 3600);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
