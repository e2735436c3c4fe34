//! `config.toml` loading.
//!
//! ```toml
//! [query]
//! strict_aggregates = false
//! default_limit = 100
//!
//! [display]
//! decimals = 2
//! ```
//!
//! Problems never abort the program: they are returned as warnings and the
//! defaults are used instead.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use flowcalc_core::QueryBuilder;
use flowcalc_engine::engine::DEFAULT_DECIMALS;

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub query: QueryConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct QueryConfig {
    pub strict_aggregates: bool,
    pub default_limit: Option<u64>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct DisplayConfig {
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new()
            .with_strict_aggregates(self.query.strict_aggregates)
            .with_default_limit(self.query.default_limit)
    }
}

/// Load `config_file`, or the user config when none is given.
///
/// A missing user config is silent; a missing explicit file is a warning.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
    } else {
        match read_config(&path) {
            Ok(config) => return (config, warnings),
            Err(message) => warnings.push(message),
        }
    }

    for message in &warnings {
        warn!(%message, "using default configuration");
    }
    (Config::default(), warnings)
}

fn read_config(path: &Path) -> Result<Config, String> {
    let meta = std::fs::metadata(path)
        .map_err(|err| format!("Failed to read metadata for {}: {}", path.display(), err))?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(format!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        ));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {}", path.display(), err))?;
    Config::parse(&content).map_err(|err| format!("Failed to parse {}: {}", path.display(), err))
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "flowcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_is_default() {
        let config = Config::parse("").expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.display.decimals, 2);
        assert!(!config.query.strict_aggregates);
    }

    #[test]
    fn parse_all_sections() {
        let config = Config::parse(
            "[query]\nstrict_aggregates = true\ndefault_limit = 50\n\n[display]\ndecimals = 4\n",
        )
        .expect("config");
        assert!(config.query.strict_aggregates);
        assert_eq!(config.query.default_limit, Some(50));
        assert_eq!(config.display.decimals, 4);

        let builder = config.query_builder();
        assert!(builder.strict_aggregates);
        assert_eq!(builder.default_limit, Some(50));
    }

    #[test]
    fn parse_rejects_unknown_fields() {
        assert!(Config::parse("[display]\nprecision = 3\n").is_err());
        assert!(Config::parse("[theme]\n").is_err());
    }

    #[test]
    fn load_missing_explicit_file_warns() {
        let path = std::env::temp_dir().join("flowcalc_missing_config_for_test.toml");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn load_oversized_file_falls_back() {
        let path = std::env::temp_dir().join("flowcalc_oversized_config_for_test.toml");
        let body = format!("# {}\n", "x".repeat(MAX_CONFIG_FILE_BYTES as usize));
        std::fs::write(&path, body).expect("write");

        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, Config::default());
        assert!(warnings[0].contains("too large"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_valid_file() {
        let path = std::env::temp_dir().join("flowcalc_valid_config_for_test.toml");
        std::fs::write(&path, "[display]\ndecimals = 3\n").expect("write");

        let (config, warnings) = load_config(Some(&path));
        assert!(warnings.is_empty());
        assert_eq!(config.display.decimals, 3);

        std::fs::remove_file(&path).ok();
    }
}
