//! Bus configuration loader.
//!
//! Reads a TOML file and deserializes it into [`BusConfig`]. Falls back to
//! defaults when the file is missing or malformed, so loading never fails.

use std::path::Path;

use tidings_types::config::BusConfig;

/// Load bus configuration from `config_path`.
///
/// - If the file does not exist, returns [`BusConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_bus_config(config_path: &Path) -> BusConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No bus config at {}, using defaults", config_path.display());
            return BusConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return BusConfig::default();
        }
    };

    match toml::from_str::<BusConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            BusConfig::default()
        }
    }
}
