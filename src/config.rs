use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::render::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_RENDER_BUDGET, RenderSchedule};
use crate::virtual_list::DEFAULT_OVERSCAN;

const CONFIG_DIR_NAME: &str = "rowflow";
const CONFIG_FILE_NAME: &str = "engine.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub render_budget_ms: u64,
    pub progress_interval: usize,
    pub overscan: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_budget_ms: DEFAULT_RENDER_BUDGET.as_millis() as u64,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl EngineConfig {
    pub fn render_budget(&self) -> Duration {
        Duration::from_millis(self.render_budget_ms)
    }

    pub fn render_schedule(&self) -> RenderSchedule {
        RenderSchedule {
            budget: self.render_budget(),
            progress_interval: self.progress_interval.max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfigStore {
    path: PathBuf,
}

impl EngineConfigStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("failed to resolve config directory"))?;
        Ok(Self {
            path: base_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_default(&self) -> Result<EngineConfig> {
        if !self.path.exists() {
            return Ok(EngineConfig::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read config file at {}", self.path.display()))?;
        toml::from_str::<EngineConfig>(&raw).with_context(|| {
            format!("failed to parse TOML config file at {}", self.path.display())
        })
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("config path has no parent: {}", self.path.display()))?;

        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;

        let contents =
            toml::to_string_pretty(config).context("failed to serialize engine config to TOML")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write config file at {}", self.path.display()))?;
        Ok(())
    }
}
