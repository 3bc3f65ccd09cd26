//! Shared configuration paths for casedesk.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.casedesk/
//! ├── data/      # FileStore collections
//! └── config/    # .env and user settings
//! ```
//!
//! # Environment Variables
//!
//! - `CASEDESK_STATE_DIR`: Override the base state directory
//! - `CASEDESK_DATA_DIR`: Override the data directory

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "CASEDESK_STATE_DIR";

/// Environment variable for custom data directory.
pub const DATA_DIR_ENV: &str = "CASEDESK_DATA_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".casedesk";

const DATA_SUBDIR: &str = "data";
const CONFIG_SUBDIR: &str = "config";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the casedesk state directory.
///
/// Resolved once from:
/// 1. `CASEDESK_STATE_DIR` if set
/// 2. `~/.casedesk` if a home directory is available
/// 3. `.casedesk` in the current directory
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the data directory holding the store collections.
pub fn data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(DATA_SUBDIR))
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the `.env` file loaded at startup.
pub fn env_file() -> PathBuf {
    config_dir().join(".env")
}

/// Ensure the state, data and config directories exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(data_dir())?;
    std::fs::create_dir_all(config_dir())?;
    Ok(())
}
