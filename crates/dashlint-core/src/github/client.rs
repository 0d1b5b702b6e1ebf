use super::{ChangedFile, GithubSettings, PullRequestSource};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

const PER_PAGE: usize = 100;
/// GitHub stops listing pull request files after 3000 entries.
const MAX_PAGES: u32 = 30;

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
    pr_number: u64,
    max_retries: u32,
}

impl GithubClient {
    pub fn new(settings: &GithubSettings) -> Result<Self> {
        if settings.token.trim().is_empty() {
            bail!("GitHub token must be provided via GITHUB_TOKEN");
        }
        let (owner, repo) = settings.owner_and_repo()?;
        let pr_number = settings.require_pr_number()?;

        let http = Client::builder()
            .user_agent(concat!("dashlint/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .context("failed to build GitHub HTTP client")?;

        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number,
            max_retries: settings.max_retries,
        })
    }

    fn files_url(&self, page: u32) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}/files?per_page={}&page={}",
            self.api_url, self.owner, self.repo, self.pr_number, PER_PAGE, page
        )
    }

    fn comments_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, self.pr_number
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
    }

    /// GET `url`, retrying transport failures, 5xx and 429 responses with backoff.
    /// Any other non-success status fails on the first attempt.
    async fn get(&self, what: &str, url: &str) -> Result<Response> {
        let mut attempt = 0u32;
        let mut backoff = Duration::from_millis(200);
        loop {
            match self.authorized(self.http.get(url)).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if !is_transient(status) || attempt >= self.max_retries {
                        return Err(api_error(what, response).await);
                    }
                    warn!(attempt, status = %status, "GitHub returned a transient error; retrying");
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(err).with_context(|| format!("failed to {what}"));
                    }
                    warn!(attempt, error = %err, "request to GitHub failed; retrying");
                }
            }
            sleep(backoff).await;
            backoff = (backoff * 2).min(Duration::from_secs(5));
            attempt += 1;
        }
    }

    /// Send a non-idempotent request exactly once.
    async fn send_once(&self, what: &str, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .with_context(|| format!("failed to {what}"))?;
        if !response.status().is_success() {
            return Err(api_error(what, response).await);
        }
        Ok(response)
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn api_error(what: &str, response: Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow!("GitHub API error while trying to {what} ({status}): {body}")
}

#[async_trait]
impl PullRequestSource for GithubClient {
    #[instrument(skip_all)]
    async fn changed_files(&self) -> Result<Vec<ChangedFile>> {
        let mut files = Vec::new();
        for page in 1..=MAX_PAGES {
            let url = self.files_url(page);
            let response = self.get("list pull request files", &url).await?;
            let batch: Vec<ChangedFile> = response
                .json()
                .await
                .with_context(|| format!("failed to parse pull request files page {page}"))?;
            let count = batch.len();
            debug!(pr = self.pr_number, page, count, "fetched pull request files page");
            files.extend(batch);
            if count < PER_PAGE {
                break;
            }
        }
        Ok(files)
    }

    #[instrument(skip_all, fields(filename = %file.filename))]
    async fn fetch_document(&self, file: &ChangedFile) -> Result<serde_json::Value> {
        let what = format!("download {}", file.filename);
        let body = self
            .get(&what, &file.raw_url)
            .await?
            .text()
            .await
            .with_context(|| format!("failed to read body of {}", file.filename))?;
        serde_json::from_str(&body).with_context(|| format!("{} is not valid JSON", file.filename))
    }

    #[instrument(skip_all, fields(len = body.len()))]
    async fn post_comment(&self, body: &str) -> Result<()> {
        let url = self.comments_url();
        let request = self.http.post(&url).json(&CommentRequest { body });
        self.send_once("post pull request comment", request).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}
