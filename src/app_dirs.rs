use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "reflex").map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }

    /// Log file for the TUI; stdout is taken by the terminal UI
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("reflex");
            Some(state_dir.join("reflex.log"))
        } else {
            ProjectDirs::from("", "", "reflex")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("reflex.log"))
        }
    }
}
