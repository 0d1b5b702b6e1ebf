use anyhow::Result;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::github::{is_dashboard_file, PullRequestSource};
use crate::report::ReportEntry;
use crate::scanner::collector::get_warnings;

/// Tag every warning in `document` with `filename`.
pub fn lint_document(filename: &str, document: &Value) -> Vec<ReportEntry> {
    get_warnings(document)
        .into_iter()
        .map(|warning| ReportEntry::new(warning, filename))
        .collect()
}

/// Lint every dashboard file changed in a pull request.
///
/// Files are processed in listing order. The first listing or download failure
/// aborts the run; no partial result is returned.
#[instrument(skip_all)]
pub async fn lint_pull_request<S>(source: &S) -> Result<Vec<ReportEntry>>
where
    S: PullRequestSource + ?Sized,
{
    let files = source.changed_files().await.inspect_err(|err| {
        error!(error = %err, "failed to list pull request files");
    })?;
    let dashboards: Vec<_> = files.iter().filter(|f| is_dashboard_file(f)).collect();
    info!(
        changed = files.len(),
        dashboards = dashboards.len(),
        "checking dashboard files"
    );

    let mut entries = Vec::new();
    for file in dashboards {
        let document = source.fetch_document(file).await.inspect_err(|err| {
            error!(filename = %file.filename, error = %err, "aborting: could not fetch dashboard");
        })?;
        let found = lint_document(&file.filename, &document);
        debug!(filename = %file.filename, warnings = found.len(), "dashboard checked");
        entries.extend(found);
    }
    Ok(entries)
}
