//! Application configuration for causespec.
//!
//! User config lives at `~/.causespec/causespec.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CauseSpecError, Result};
use crate::types::RefutationType;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "causespec.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".causespec";

// ---------------------------------------------------------------------------
// Config structs (matching causespec.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Refutation used when an analysis document does not pick one.
    #[serde(default)]
    pub refutation: RefutationType,

    /// Dataframe name used when an analysis document leaves it out.
    #[serde(default = "default_dataframe")]
    pub dataframe: String,

    /// Pretty-print emitted JSON.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            refutation: RefutationType::default(),
            dataframe: default_dataframe(),
            pretty: true,
        }
    }
}

fn default_dataframe() -> String {
    "primary".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Build options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime request-building options, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Refutation applied when the analysis document has none.
    pub refutation: RefutationType,
    /// Dataframe applied when the analysis document has none.
    pub dataframe: String,
    /// Pretty-print output.
    pub pretty: bool,
}

impl From<&AppConfig> for BuildOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            refutation: config.defaults.refutation,
            dataframe: config.defaults.dataframe.clone(),
            pretty: config.defaults.pretty,
        }
    }
}

impl BuildOptions {
    /// Apply command-line overrides; `None` keeps the configured value.
    pub fn with_overrides(
        mut self,
        refutation: Option<RefutationType>,
        dataframe: Option<String>,
    ) -> Self {
        if let Some(refutation) = refutation {
            self.refutation = refutation;
        }
        if let Some(dataframe) = dataframe {
            self.dataframe = dataframe;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.causespec/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CauseSpecError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.causespec/causespec.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CauseSpecError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CauseSpecError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CauseSpecError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CauseSpecError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CauseSpecError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("quick_refutation"));
        assert!(toml_str.contains("dataframe"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.refutation, RefutationType::Quick);
        assert_eq!(parsed.defaults.dataframe, "primary");
        assert!(parsed.defaults.pretty);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
refutation = "full_refutation"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.refutation, RefutationType::Full);
        assert_eq!(config.defaults.dataframe, "primary");
    }

    #[test]
    fn unknown_refutation_rejected() {
        let toml_str = r#"
[defaults]
refutation = "thorough"
"#;
        let err = toml::from_str::<AppConfig>(toml_str).unwrap_err();
        assert!(err.to_string().contains("unmapped refutation type"));
    }

    #[test]
    fn build_options_from_app_config() {
        let mut app = AppConfig::default();
        app.defaults.pretty = false;
        let options = BuildOptions::from(&app);
        assert_eq!(options.refutation, RefutationType::Quick);
        assert!(!options.pretty);
    }

    #[test]
    fn flags_override_config_values() {
        let mut app = AppConfig::default();
        app.defaults.refutation = RefutationType::Full;
        app.defaults.dataframe = "cohort".into();

        let options = BuildOptions::from(&app)
            .with_overrides(Some(RefutationType::Quick), Some("trial".into()));
        assert_eq!(options.refutation, RefutationType::Quick);
        assert_eq!(options.dataframe, "trial");

        let options = BuildOptions::from(&app).with_overrides(None, None);
        assert_eq!(options.refutation, RefutationType::Full);
        assert_eq!(options.dataframe, "cohort");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/causespec.toml")).unwrap_err();
        assert!(matches!(err, CauseSpecError::Io { .. }));
    }
}
