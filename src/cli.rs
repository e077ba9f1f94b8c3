mod entitlements;
mod pipelines;
mod projects;
mod repos;
mod service_connections;
mod variable_groups;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use azdo::{AzureClient, ProjectKey, RepositoryKey, Token};

use crate::config::{user_config_path, Config, OutputFormat};
use crate::output::{OutputSettings, RequestProgress};

#[derive(Parser)]
#[command(name = "azdo")]
#[command(author, version, about = "Azure DevOps REST client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Personal access token (falls back to API_TOKEN, then the config file)
    #[arg(short, long, global = true, env = "AZURE_DEVOPS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, global = true, env = "AZURE_DEVOPS_ORG")]
    organization: Option<String>,

    #[arg(short = 'P', long, global = true, env = "AZURE_DEVOPS_PROJECT")]
    project: Option<String>,

    /// Configuration file (defaults to ./azdo.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pipelines, build definitions, builds and timelines
    Pipelines {
        #[command(subcommand)]
        action: pipelines::PipelineCommand,
    },
    /// Git repositories
    Repos {
        #[command(subcommand)]
        action: repos::RepoCommand,
    },
    /// Projects of the organization
    Projects {
        #[command(subcommand)]
        action: projects::ProjectCommand,
    },
    /// Library variable groups
    VariableGroups {
        #[command(subcommand)]
        action: variable_groups::VariableGroupCommand,
    },
    /// User entitlements
    Entitlements {
        #[command(subcommand)]
        action: entitlements::EntitlementCommand,
    },
    /// Service connections
    ServiceConnections {
        #[command(subcommand)]
        action: service_connections::ServiceConnectionCommand,
    },
    /// Write the resolved organization, project and output settings to a config file
    InitConfig {
        /// Target file (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

/// Connection and output settings resolved from flags and config.
pub(crate) struct Context {
    pub client: AzureClient,
    pub output: OutputSettings,
    organization: Option<String>,
    project: Option<String>,
}

impl Context {
    pub fn organization(&self) -> Result<&str> {
        self.organization
            .as_deref()
            .context("No organization given: pass --organization or set azure.organization")
    }

    pub fn project_key(&self) -> Result<ProjectKey> {
        let project = self
            .project
            .as_deref()
            .context("No project given: pass --project or set azure.project")?;
        Ok(ProjectKey::new(self.organization()?, project))
    }

    pub fn repository_key(&self, repository: &str) -> Result<RepositoryKey> {
        let key = self.project_key()?;
        Ok(RepositoryKey::new(key.organization, key.project, repository))
    }
}

/// Runs one API call behind a spinner.
pub(crate) async fn track<T>(
    message: &str,
    request: impl Future<Output = azdo::Result<T>>,
) -> Result<T> {
    let progress = RequestProgress::start(message);
    match request.await {
        Ok(value) => {
            progress.finish();
            Ok(value)
        }
        Err(e) => {
            progress.fail();
            Err(e.into())
        }
    }
}

impl Cli {
    fn context(&self) -> Result<Context> {
        let config = Config::load(self.config.as_deref())?;

        let token = self
            .token
            .clone()
            .or_else(|| std::env::var("API_TOKEN").ok())
            .or(config.azure.token)
            .map(Token::from);

        if token.is_none() {
            info!("No token configured, sending anonymous requests");
        }

        let client = AzureClient::with_base_urls(
            &config.azure.base_url,
            &config.azure.entitlements_url,
            token,
            Duration::from_secs(config.azure.timeout_secs),
        )?;

        Ok(Context {
            client,
            output: OutputSettings {
                format: self.format.unwrap_or(config.output.format),
                pretty: self.pretty || config.output.pretty,
                path: self.output.clone(),
            },
            organization: self.organization.clone().or(config.azure.organization),
            project: self.project.clone().or(config.azure.project),
        })
    }

    fn init_config(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => user_config_path().context("No user config directory on this platform")?,
        };

        let mut config = Config::load(self.config.as_deref())?;
        if self.organization.is_some() {
            config.azure.organization = self.organization.clone();
        }
        if self.project.is_some() {
            config.azure.project = self.project.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config.output.pretty |= self.pretty;
        config.azure.token = None;

        config.save(&path)?;
        info!("Configuration written to: {}", path.display());
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        if let Commands::InitConfig { path } = &self.command {
            return self.init_config(path.as_deref());
        }

        let ctx = self.context()?;

        match &self.command {
            Commands::Pipelines { action } => action.execute(&ctx).await,
            Commands::Repos { action } => action.execute(&ctx).await,
            Commands::Projects { action } => action.execute(&ctx).await,
            Commands::VariableGroups { action } => action.execute(&ctx).await,
            Commands::Entitlements { action } => action.execute(&ctx).await,
            Commands::ServiceConnections { action } => action.execute(&ctx).await,
            Commands::InitConfig { .. } => Ok(()),
        }
    }
}

/// Parses `KEY=VALUE` arguments.
pub(crate) fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("ENVIRONMENT=qa"),
            Ok(("ENVIRONMENT".to_string(), "qa".to_string()))
        );
        assert_eq!(
            parse_key_value("QUERY=a=b"),
            Ok(("QUERY".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("missing").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("azdo.toml");
        std::fs::write(
            &path,
            "[azure]\norganization = \"from-config\"\nproject = \"labs\"\n\n[output]\nformat = \"yaml\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "azdo",
            "--config",
            path.to_str().unwrap(),
            "--organization",
            "alelltech",
            "--format",
            "table",
            "projects",
            "list",
        ]);
        let ctx = cli.context().unwrap();

        assert_eq!(ctx.organization().unwrap(), "alelltech");
        assert_eq!(ctx.project_key().unwrap().project, "labs");
        assert_eq!(ctx.output.format, OutputFormat::Table);

        let key = ctx.repository_key("azdo-tasks-tests").unwrap();
        assert_eq!(key.repository, "azdo-tasks-tests");
    }

    #[tokio::test]
    async fn test_init_config_writes_flags() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source.toml");
        std::fs::write(&source, "[azure]\nproject = \"labs\"\n").unwrap();
        let target = temp_dir.path().join("azdo").join("config.toml");

        let cli = Cli::parse_from([
            "azdo",
            "--config",
            source.to_str().unwrap(),
            "--organization",
            "alelltech",
            "init-config",
            target.to_str().unwrap(),
        ]);
        cli.execute().await.unwrap();

        let written = Config::load(Some(&target)).unwrap();
        assert_eq!(written.azure.organization.as_deref(), Some("alelltech"));
        assert_eq!(written.azure.project.as_deref(), Some("labs"));
    }

    #[tokio::test]
    async fn test_init_config_leaves_token_out() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source.toml");
        std::fs::write(
            &source,
            "[azure]\ntoken = \"secret-pat\"\norganization = \"alelltech\"\n",
        )
        .unwrap();
        let target = temp_dir.path().join("shared.toml");

        let cli = Cli::parse_from([
            "azdo",
            "--config",
            source.to_str().unwrap(),
            "--token",
            "flag-pat",
            "init-config",
            target.to_str().unwrap(),
        ]);
        cli.execute().await.unwrap();

        let written = Config::load(Some(&target)).unwrap();
        assert!(written.azure.token.is_none());
        assert_eq!(written.azure.organization.as_deref(), Some("alelltech"));

        let contents = std::fs::read_to_string(&target).unwrap();
        assert!(!contents.contains("secret-pat"));
        assert!(!contents.contains("flag-pat"));
    }

    #[test]
    fn test_repo_branch_is_required() {
        let missing = Cli::try_parse_from(["azdo", "repos", "item", "azdo-tasks-tests", "/README.md"]);
        assert!(missing.is_err());

        let given = Cli::try_parse_from([
            "azdo",
            "repos",
            "item",
            "azdo-tasks-tests",
            "/README.md",
            "--branch",
            "master",
        ]);
        assert!(given.is_ok());
    }

    #[test]
    fn test_missing_project_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("azdo.toml");
        std::fs::write(&path, "[azure]\norganization = \"alelltech\"\n").unwrap();

        let cli = Cli::parse_from(["azdo", "--config", path.to_str().unwrap(), "projects", "list"]);
        let ctx = cli.context().unwrap();

        let error = ctx.project_key().unwrap_err();
        assert!(error.to_string().contains("No project given"));
    }
}
