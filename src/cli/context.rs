use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::apps::{AppProfile, AppRegistry};
use crate::config::Config;

pub struct CliContext {
    config: Config,
    config_path: PathBuf,
    apps: AppRegistry,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        let apps = AppRegistry::with_extra(&config.apps);
        Self {
            config,
            config_path,
            apps,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn apps(&self) -> &AppRegistry {
        &self.apps
    }

    pub fn app(&self, name: &str) -> Result<&AppProfile> {
        Ok(self.apps.get(name)?)
    }
}
