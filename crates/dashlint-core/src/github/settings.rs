use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Environment-driven configuration for talking to the GitHub REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSettings {
    pub api_url: String,
    pub token: String,
    /// `owner/repo`.
    pub repository: Option<String>,
    pub pr_number: Option<u64>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl GithubSettings {
    const TOKEN_ENV: &'static str = "GITHUB_TOKEN";
    const REPOSITORY_ENV: &'static str = "GITHUB_REPOSITORY";
    const API_URL_ENV: &'static str = "GITHUB_API_URL";
    const PR_NUMBER_ENV: &'static str = "DASHLINT_PR_NUMBER";
    const TIMEOUT_ENV: &'static str = "DASHLINT_TIMEOUT_SECS";
    const RETRIES_ENV: &'static str = "DASHLINT_MAX_RETRIES";

    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";

    /// Load settings from environment variables.
    ///
    /// * `GITHUB_TOKEN` — API token (required).
    /// * `GITHUB_REPOSITORY` — `owner/repo` of the pull request.
    /// * `GITHUB_API_URL` — REST base URL (default: `https://api.github.com`).
    /// * `DASHLINT_PR_NUMBER`, `DASHLINT_TIMEOUT_SECS`, `DASHLINT_MAX_RETRIES`.
    pub fn from_env() -> Result<Self> {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let non_blank = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = non_blank(Self::TOKEN_ENV).with_context(|| {
            format!(
                "environment variable {} must be set to read pull request files",
                Self::TOKEN_ENV
            )
        })?;
        let api_url = non_blank(Self::API_URL_ENV)
            .unwrap_or_else(|| Self::DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let pr_number = non_blank(Self::PR_NUMBER_ENV)
            .map(|v| {
                v.parse::<u64>()
                    .with_context(|| format!("{} must be a number (got `{v}`)", Self::PR_NUMBER_ENV))
            })
            .transpose()?;
        let timeout = non_blank(Self::TIMEOUT_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let max_retries = non_blank(Self::RETRIES_ENV)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(2);

        Ok(Self {
            api_url,
            token,
            repository: non_blank(Self::REPOSITORY_ENV),
            pr_number,
            timeout,
            max_retries,
        })
    }

    /// Split `repository` into `(owner, repo)`.
    pub fn owner_and_repo(&self) -> Result<(&str, &str)> {
        let repository = self.repository.as_deref().ok_or_else(|| {
            anyhow!(
                "repository is not set; pass --repo or set {}",
                Self::REPOSITORY_ENV
            )
        })?;
        match repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok((owner, repo))
            }
            _ => Err(anyhow!(
                "repository must look like `owner/repo` (got `{repository}`)"
            )),
        }
    }

    pub fn require_pr_number(&self) -> Result<u64> {
        self.pr_number.ok_or_else(|| {
            anyhow!(
                "pull request number is not set; pass --pr or set {}",
                Self::PR_NUMBER_ENV
            )
        })
    }
}
