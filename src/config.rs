use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Careledger";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "careledger=info,tower_http=info".to_string()
}

/// Application data directory, ~/Careledger/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// SQLite database path. CARELEDGER_DB overrides the default location.
pub fn database_path() -> PathBuf {
    match std::env::var("CARELEDGER_DB") {
        Ok(path) => PathBuf::from(path),
        Err(_) => app_data_dir().join("careledger.db"),
    }
}

/// Listen address. CARELEDGER_ADDR overrides 127.0.0.1:8080.
pub fn listen_addr() -> SocketAddr {
    let raw = std::env::var("CARELEDGER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!("invalid CARELEDGER_ADDR {raw:?}, using {DEFAULT_ADDR}");
        DEFAULT_ADDR.parse().expect("default addr parses")
    })
}
