use dirs::home_dir;
use std::{env, path::Path, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".tuition_core";
const DATA_DIR: &str = "data";
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "TUITION_CORE_HOME";

/// Returns the application-specific data directory, defaulting to `~/.tuition_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding one JSON file per persisted collection.
pub fn collections_dir_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_base() {
        let base = Path::new("/srv/tutoring");
        assert_eq!(collections_dir_in(base), base.join("data"));
        assert_eq!(config_file_in(base), base.join("config.json"));
    }
}
