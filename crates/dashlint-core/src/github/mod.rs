mod client;
mod settings;

use std::path::{Component, Path};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::GithubClient;
pub use settings::GithubSettings;

/// Path components that mark test fixtures rather than shipped dashboards.
const FIXTURE_DIRS: &[&str] = &["__tests__", "mock_files", "test-fixtures"];

/// One entry of the pull request "files" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    pub raw_url: String,
}

impl ChangedFile {
    pub fn is_removed(&self) -> bool {
        self.status == "removed"
    }
}

/// Source of a pull request's changed files and their contents.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Every file changed in the pull request, across all pages.
    async fn changed_files(&self) -> Result<Vec<ChangedFile>>;

    /// Download and parse the file's raw JSON content.
    async fn fetch_document(&self, file: &ChangedFile) -> Result<serde_json::Value>;

    /// Publish `body` as a comment on the pull request.
    async fn post_comment(&self, body: &str) -> Result<()>;
}

/// Whether a changed file is a dashboard definition that should be linted.
pub fn is_dashboard_file(file: &ChangedFile) -> bool {
    if file.is_removed() {
        return false;
    }
    let path = Path::new(&file.filename);
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return false;
    }
    let mut in_dashboards = false;
    for component in path.components() {
        if let Component::Normal(part) = component {
            let Some(part) = part.to_str() else {
                return false;
            };
            if FIXTURE_DIRS.contains(&part) {
                return false;
            }
            if part == "dashboards" {
                in_dashboards = true;
            }
        }
    }
    in_dashboards
}
