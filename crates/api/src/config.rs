//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use audit::DEFAULT_CAPACITY;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `POLICY_FILE`: JSON policy table; the built-in commerce catalog when unset
/// - `AUDIT_BUFFER`: audit queue capacity (default: `1024`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub policy_file: Option<PathBuf>,
    pub audit_buffer: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            policy_file: std::env::var_os("POLICY_FILE")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            audit_buffer: std::env::var("AUDIT_BUFFER")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(DEFAULT_CAPACITY),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            policy_file: None,
            audit_buffer: DEFAULT_CAPACITY,
        }
    }
}
