use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "bilifetch/config.toml";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.5; Win64; x64) AppleWebKit/547.36 (KHTML, like Gecko) Chrome/86.0.4280.66 Safari/537.36";

/// Runtime settings, read from a toml file. Every field may be omitted.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Entries requested per listing page
    pub page_size: u32,
    /// Listing order passed to the api
    pub order: String,
    /// `code` value the listing api uses for success
    pub success_code: i64,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Where downloaded streams are written
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 30,
            order: "pubdate".to_string(),
            success_code: 200,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads `explicit` if given, otherwise the file in the user config dir if it
    /// exists, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => dirs::config_dir()
                .map(|dir| dir.join(CONFIG_FILE))
                .filter(|path| path.exists()),
        };
        match path {
            Some(path) => {
                debug!("Reading config from {:?}", path);
                let text = std::fs::read_to_string(&path)?;
                Self::from_toml(&text)
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be at least 1".into()));
        }
        Ok(())
    }
}
