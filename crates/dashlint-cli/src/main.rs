use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dashlint_core::{
    default_rules, lint_document, lint_pull_request, render_report, GithubClient, GithubSettings,
    OutputFormat, PullRequestSource, ReportEntry, RuleKind,
};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "dashlint",
    author,
    version,
    about = "Flags deprecated fields in dashboard JSON changed by a pull request"
)]
struct Cli {
    /// Optional config file (TOML, YAML or JSON) with api_url, repository, timeout, max_retries
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check dashboard files changed in a GitHub pull request
    CheckPr {
        /// Repository as owner/repo (default: GITHUB_REPOSITORY)
        #[arg(long = "repo", value_name = "OWNER/REPO")]
        repository: Option<String>,
        /// Pull request number (default: DASHLINT_PR_NUMBER)
        #[arg(long = "pr", value_name = "NUMBER")]
        pr_number: Option<u64>,
        /// REST API base URL (default: GITHUB_API_URL or https://api.github.com)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Per-request timeout, e.g. `30s`
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
        /// Post the warning table as a pull request comment
        #[arg(long)]
        post: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Check local dashboard JSON files
    CheckFiles {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the built-in rules
    ListRules {
        /// Emit rules as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    format: Format,
    /// Exit with status 2 when any warning is found
    #[arg(long)]
    fail_on_warnings: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Markdown => OutputFormat::Markdown,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Values read from `--config`; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    repository: Option<String>,
    timeout: Option<String>,
    max_retries: Option<u32>,
}

impl FileConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    fn apply(&self, settings: &mut GithubSettings) -> Result<()> {
        if let Some(api_url) = &self.api_url {
            settings.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(repository) = &self.repository {
            settings.repository = Some(repository.clone());
        }
        if let Some(timeout) = &self.timeout {
            settings.timeout = humantime::parse_duration(timeout)
                .with_context(|| format!("invalid timeout `{timeout}` in config file"))?;
        }
        if let Some(max_retries) = self.max_retries {
            settings.max_retries = max_retries;
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let file_config = FileConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::CheckPr {
            repository,
            pr_number,
            api_url,
            timeout,
            post,
            output,
        } => {
            let mut settings = GithubSettings::from_env()?;
            file_config.apply(&mut settings)?;
            if let Some(repository) = repository {
                settings.repository = Some(repository);
            }
            if pr_number.is_some() {
                settings.pr_number = pr_number;
            }
            if let Some(api_url) = api_url {
                settings.api_url = api_url.trim_end_matches('/').to_string();
            }
            if let Some(timeout) = timeout {
                settings.timeout = timeout;
            }
            check_pr(&settings, post, &output).await
        }
        Commands::CheckFiles { paths, output } => check_files(&paths, &output).await,
        Commands::ListRules { json } => {
            list_rules(json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn check_pr(settings: &GithubSettings, post: bool, output: &OutputArgs) -> Result<ExitCode> {
    let client = GithubClient::new(settings)?;
    let entries = lint_pull_request(&client).await?;
    if entries.is_empty() {
        info!("no dashboard warnings found");
        return Ok(ExitCode::SUCCESS);
    }

    let rendered = render_report(&entries, output.format.into())?;
    println!("{rendered}");
    if post {
        let comment = render_report(&entries, OutputFormat::Markdown)?;
        client
            .post_comment(&comment)
            .await
            .context("failed to post warning comment")?;
        info!(warnings = entries.len(), "posted warning comment");
    }
    Ok(exit_code(&entries, output))
}

async fn check_files(paths: &[PathBuf], output: &OutputArgs) -> Result<ExitCode> {
    let mut entries: Vec<ReportEntry> = Vec::new();
    for path in paths {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        entries.extend(lint_document(&path.display().to_string(), &document));
    }

    if entries.is_empty() {
        eprintln!("{} no dashboard warnings in {} file(s)", "ok:".green().bold(), paths.len());
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!(
        "{} {} dashboard warning(s) in {} file(s)",
        "warning:".yellow().bold(),
        entries.len(),
        paths.len()
    );
    println!("{}", render_report(&entries, output.format.into())?);
    Ok(exit_code(&entries, output))
}

fn exit_code(entries: &[ReportEntry], output: &OutputArgs) -> ExitCode {
    if output.fail_on_warnings && !entries.is_empty() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn list_rules(json: bool) -> Result<()> {
    let rules = default_rules();
    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("{} built-in rule(s)", rules.len());
    for rule in rules {
        let kind = match rule.kind {
            RuleKind::Keyword => "keyword",
            RuleKind::Regex => "regex",
            RuleKind::ExpectValue => "value",
        };
        let expected = rule
            .expected
            .map(|e| format!(" (expects {e})"))
            .unwrap_or_default();
        println!(
            "- {id:<20} [{kind:7}] {message}{expected}",
            id = rule.id,
            kind = kind,
            message = rule.message,
            expected = expected
        );
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
