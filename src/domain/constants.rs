pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;

pub const API_URL_ENV: &str = "SATARK_API_URL";

/// Relative to `$HOME`.
pub const CONFIG_DIR: &str = ".config/satark";
pub const CONFIG_FILE: &str = "config.toml";
pub const SESSION_FILE: &str = "session.json";

pub const CLEAN_RECORD_LABEL: &str = "Clean Record";
