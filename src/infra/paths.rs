// src/infra/paths.rs — Config and session file locations
//
// TASKMASTER_HOME overrides everything; otherwise files live in ~/.taskmaster/.

use std::path::PathBuf;

/// Returns the TASKMASTER_HOME override, if set.
fn taskmaster_home() -> Option<PathBuf> {
    std::env::var_os("TASKMASTER_HOME").map(PathBuf::from)
}

/// Configuration directory: $TASKMASTER_HOME/ or ~/.taskmaster/
pub fn config_dir() -> PathBuf {
    if let Some(home) = taskmaster_home() {
        return home;
    }
    dirs_home().join(".taskmaster")
}

/// Home directory. Falls back to the working directory when no home can be
/// determined (containers without a passwd entry).
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Persisted login session
pub fn session_file_path() -> PathBuf {
    config_dir().join("session.json")
}
