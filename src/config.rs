//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treeoracle/treeoracle.toml`
//! 3. Project config: `--config <file>` or `./treeoracle.toml`
//! 4. Environment variables: `TREEORACLE_*` prefix
//!
//! Command-line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::application::fixture::FixtureTemplate;
use crate::application::ApplicationError;
use crate::domain::TraversalKind;

/// Tree the engine's own regression fixture is generated from.
pub const DEFAULT_TREE: &str =
    "((((0_1,1_1)1_2,(2_1,3_1)3_2)3_4,4_1)4_5,((5_1,(6_1,7_1)7_2)7_3,(8_1,9_1)9_2)9_5)9_10;";

/// Name of the project-local config file.
pub const PROJECT_CONFIG_FILE: &str = "treeoracle.toml";

/// Unified configuration for treeoracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Source tree in tree notation
    pub tree: String,
    /// Fixture destination
    pub output: PathBuf,
    /// Traversals emitted, in order
    pub kinds: Vec<TraversalKind>,
    /// Fixture layout
    pub fixture: FixtureTemplate,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tree: DEFAULT_TREE.into(),
            output: PathBuf::from("src/doctest.cpp"),
            kinds: TraversalKind::ALL.to_vec(),
            fixture: FixtureTemplate::default(),
        }
    }
}

/// Raw fixture layout for intermediate parsing (`None` → inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFixtureTemplate {
    pub header: Option<Vec<String>>,
    pub prelude: Option<Vec<String>>,
    pub includes: Option<Vec<String>>,
    pub test_case: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub tree: Option<String>,
    pub output: Option<PathBuf>,
    pub kinds: Option<Vec<TraversalKind>>,
    pub fixture: RawFixtureTemplate,
}

impl FixtureTemplate {
    /// Overlay wins field by field; lists are replaced, not merged.
    pub fn merge(&self, overlay: &RawFixtureTemplate) -> Self {
        Self {
            header: overlay.header.clone().unwrap_or_else(|| self.header.clone()),
            prelude: overlay.prelude.clone().unwrap_or_else(|| self.prelude.clone()),
            includes: overlay
                .includes
                .clone()
                .unwrap_or_else(|| self.includes.clone()),
            test_case: overlay
                .test_case
                .clone()
                .unwrap_or_else(|| self.test_case.clone()),
        }
    }
}

/// Get the XDG config directory for treeoracle.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treeoracle").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treeoracle.toml"))
}

/// Get the path to the project config file in a directory.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Merge overlay config onto self (base).
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            tree: overlay.tree.clone().unwrap_or_else(|| self.tree.clone()),
            output: overlay.output.clone().unwrap_or_else(|| self.output.clone()),
            kinds: overlay.kinds.clone().unwrap_or_else(|| self.kinds.clone()),
            fixture: self.fixture.merge(&overlay.fixture),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit project config; must exist when given.
    ///   Without it, `./treeoracle.toml` is used if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        match config_file {
            Some(path) => {
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let local_path = project_config_path(Path::new("."));
                if local_path.exists() {
                    current = current.merge_with(&load_raw_settings(&local_path)?);
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.output = expand_path(&current.output);
        current.validate()?;

        Ok(current)
    }

    /// Load defaults plus a single file, ignoring global config and environment.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let mut settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.output = expand_path(&settings.output);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply TREEORACLE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TREEORACLE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("tree") {
            settings.tree = val;
        }
        if let Ok(val) = config.get_string("output") {
            settings.output = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("kinds") {
            settings.kinds = parse_kinds(&val)?;
        }
        if let Ok(val) = config.get_string("fixture.test_case") {
            settings.fixture.test_case = val;
        }

        Ok(settings)
    }

    /// Reject settings that cannot produce a fixture.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.kinds.is_empty() {
            return Err(ApplicationError::Config {
                message: "kinds must name at least one traversal".into(),
            });
        }
        if let Some(dup) = self.kinds.iter().duplicates().next() {
            return Err(ApplicationError::Config {
                message: format!("traversal kind listed twice: {}", dup),
            });
        }
        if self.output.as_os_str().is_empty() {
            return Err(ApplicationError::Config {
                message: "output path is empty".into(),
            });
        }
        Ok(())
    }

    /// Render the merged settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

/// Parse a comma-separated list of traversal kinds.
pub fn parse_kinds(list: &str) -> Result<Vec<TraversalKind>, ApplicationError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<TraversalKind>()
                .map_err(|e| ApplicationError::Config {
                    message: e.to_string(),
                })
        })
        .collect()
}
