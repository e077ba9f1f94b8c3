use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use azdo::client::{DEFAULT_BASE_URL, DEFAULT_ENTITLEMENTS_URL, DEFAULT_TIMEOUT_SECS};

const CANDIDATES: [&str; 4] = ["azdo.toml", "azdo.json", "azdo.yaml", "azdo.yml"];

/// Configuration file structure for azdo.
///
/// Holds the connection defaults so organization, project and token do not
/// have to be repeated on every invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub azure: AzureConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AzureConfig {
    /// Azure DevOps personal access token
    pub token: Option<String>,

    /// Default organization
    pub organization: Option<String>,

    /// Default project
    pub project: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the user entitlements API
    #[serde(default = "default_entitlements_url")]
    pub entitlements_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            token: None,
            organization: None,
            project: None,
            base_url: default_base_url(),
            entitlements_url: default_entitlements_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_entitlements_url() -> String {
    DEFAULT_ENTITLEMENTS_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./azdo.toml, ./azdo.json, ./azdo.yaml, ./azdo.yml
    /// 3. `<user config dir>/azdo/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        Self::load_from_dir(Path::new("."))
    }

    /// Load the first candidate file found in `root`, then the user config.
    fn load_from_dir(root: &Path) -> Result<Self> {
        let found = CANDIDATES
            .into_iter()
            .map(|candidate| root.join(candidate))
            .chain(user_config_path())
            .find(|path| path.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

/// `<config dir>/azdo/config.toml`, e.g. `~/.config/azdo/config.toml` on Linux.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("azdo").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.azure.base_url, "https://dev.azure.com/");
        assert_eq!(config.azure.entitlements_url, "https://vsaex.dev.azure.com/");
        assert_eq!(config.azure.timeout_secs, 30);
        assert!(config.azure.token.is_none());
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[azure]
token = "pat-from-toml"
organization = "alelltech"
project = "labs"
base-url = "https://tfs.example.com/tfs/"
timeout-secs = 10

[output]
format = "table"
pretty = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.azure.token, Some("pat-from-toml".to_string()));
        assert_eq!(config.azure.organization.as_deref(), Some("alelltech"));
        assert_eq!(config.azure.project.as_deref(), Some("labs"));
        assert_eq!(config.azure.base_url, "https://tfs.example.com/tfs/");
        assert_eq!(config.azure.entitlements_url, "https://vsaex.dev.azure.com/");
        assert_eq!(config.azure.timeout_secs, 10);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "azure": {
    "organization": "alelltech",
    "entitlements-url": "https://vsaex.example.com/"
  },
  "output": {
    "format": "yaml"
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.azure.organization.as_deref(), Some("alelltech"));
        assert_eq!(config.azure.entitlements_url, "https://vsaex.example.com/");
        assert_eq!(config.output.format, OutputFormat::Yaml);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        write!(temp_file, "azure:\n  project: labs\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.azure.project.as_deref(), Some("labs"));
        assert_eq!(config.azure.base_url, "https://dev.azure.com/");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("does-not-exist/azdo.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_config_fails() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[azure\ntoken = ").unwrap();

        let error = Config::load_from_path(temp_file.path()).unwrap_err();
        assert!(error.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_load_config_from_candidates() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("azdo.toml"),
            "[azure]\norganization = \"from-cwd\"\n",
        )
        .unwrap();

        std::fs::write(
            temp_dir.path().join("azdo.yaml"),
            "azure:\n  organization: from-yaml\n",
        )
        .unwrap();

        let config = Config::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(config.azure.organization.as_deref(), Some("from-cwd"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("azdo.yaml");

        let mut config = Config::default();
        config.azure.organization = Some("alelltech".to_string());
        config.output.format = OutputFormat::Table;
        config.save(&path).unwrap();

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.azure.organization.as_deref(), Some("alelltech"));
        assert_eq!(reloaded.output.format, OutputFormat::Table);
    }

    #[test]
    fn test_user_config_path() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("azdo/config.toml"));
        }
    }
}
