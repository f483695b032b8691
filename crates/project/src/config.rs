use serde::Deserialize;
use std::path::{Path, PathBuf};

use batislens_core::render::{
    RenderOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FOREACH_ITERATIONS,
};

use crate::error::{ProjectError, Result};

pub const CONFIG_FILE: &str = "batislens.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: String,
    pub mappers: MappersConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize)]
pub struct MappersConfig {
    pub path: PathBuf,
}

/// Java source roots scanned for mapper interfaces and parameter types.
#[derive(Debug, Deserialize, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("target/batislens.json"),
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct EngineConfig {
    pub max_depth: usize,
    pub max_foreach_iterations: usize,
    pub strict_includes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_foreach_iterations: DEFAULT_MAX_FOREACH_ITERATIONS,
            strict_includes: false,
        }
    }
}

impl From<EngineConfig> for RenderOptions {
    fn from(engine: EngineConfig) -> Self {
        Self {
            max_depth: engine.max_depth,
            max_foreach_iterations: engine.max_foreach_iterations,
            strict_includes: engine.strict_includes,
        }
    }
}

impl Config {
    /// Walks up from `start_dir` to the first directory holding a config
    /// file. Relative paths in the file are resolved against that directory.
    pub fn find_and_load(start_dir: &Path) -> Result<(Self, PathBuf)> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load(&config_path)?;
                return Ok((config, current_dir));
            }

            if !current_dir.pop() {
                return Err(ProjectError::ConfigNotFound(start_dir.to_path_buf()));
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn render_options(&self) -> RenderOptions {
        self.engine.into()
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.mappers.path);
        self.sources.paths.iter_mut().for_each(resolve);
        resolve(&mut self.output.path);
    }

    fn validate(&self) -> Result<()> {
        if !self.mappers.path.exists() {
            return Err(ProjectError::InvalidPath(self.mappers.path.clone()));
        }

        for path in &self.sources.paths {
            if !path.exists() {
                return Err(ProjectError::InvalidPath(path.clone()));
            }
        }

        if self.engine.max_depth == 0 || self.engine.max_foreach_iterations == 0 {
            return Err(ProjectError::InvalidConfig(
                "engine limits must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
