use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    core::utils::{app_data_dir, config_file_in},
    errors::{LedgerError, Result},
    utils::persistence::{read_json, write_json_atomic},
};

pub const DEFAULT_UPCOMING_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_DUE_DAY: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Days ahead covered by the "upcoming" dashboard figures.
    pub upcoming_window_days: u32,
    /// Due day assigned when a registration leaves it unset.
    pub default_due_day: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "pt-BR".into(),
            currency: "BRL".into(),
            upcoming_window_days: DEFAULT_UPCOMING_WINDOW_DAYS,
            default_due_day: DEFAULT_DUE_DAY,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.default_due_day) {
            return Err(LedgerError::Config(format!(
                "default due day must be between 1 and 31, got {}",
                self.default_due_day
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(LedgerError::Config("currency must not be empty".into()));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: impl AsRef<Path>) -> Self {
        Self {
            path: config_file_in(base.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        let config = read_json::<Config>(&self.path)?.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        write_json_atomic(&self.path, config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
