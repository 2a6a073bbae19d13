use dirs::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".goal_planner";
const CONFIG_FILE: &str = "config.json";
const BOOK_FILE: &str = "goals.json";
const BACKUP_DIR: &str = "backups";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "GOAL_PLANNER_HOME";

/// Returns the application data directory, defaulting to `~/.goal_planner`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

pub fn book_file_in(base: &Path) -> PathBuf {
    base.join(BOOK_FILE)
}

pub fn backup_dir_in(base: &Path) -> PathBuf {
    base.join(BACKUP_DIR)
}
