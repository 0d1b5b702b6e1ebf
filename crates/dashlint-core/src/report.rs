use serde::{Deserialize, Serialize};

pub const COMMENT_HEADING: &str = "## Dashboard JSON warnings";
pub const CONTRIBUTING_URL: &str =
    "https://github.com/newrelic/newrelic-quickstarts/blob/main/CONTRIBUTING.md#dashboards";

/// Format styles supported when emitting a run's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

/// A warning paired with the file it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub warning: String,
    pub filename: String,
}

impl ReportEntry {
    pub fn new(warning: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            warning: warning.into(),
            filename: filename.into(),
        }
    }

    /// Markdown table row for this entry.
    pub fn to_row(&self) -> String {
        format!("| {} | {} |", self.warning, self.filename)
    }
}

/// Wrap pre-formatted table rows with the comment heading, table header and footer.
///
/// Rows are copied verbatim and everything is joined with `\n`.
pub fn create_warning_comment<S: AsRef<str>>(rows: &[S]) -> String {
    let footer = format!(
        "Please see the [dashboard contribution guidelines]({CONTRIBUTING_URL}) for more information."
    );
    let mut lines: Vec<&str> = Vec::with_capacity(rows.len() + 5);
    lines.push(COMMENT_HEADING);
    lines.push("Deprecated or disallowed fields were found in the following dashboard files:");
    lines.push("| Warning | Filepath |");
    lines.push("| --- | --- |");
    lines.extend(rows.iter().map(|row| AsRef::<str>::as_ref(row)));
    lines.push(&footer);
    lines.join("\n")
}

/// Produce the run output from report entries in the desired format.
pub fn render_report(entries: &[ReportEntry], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => {
            let rows: Vec<String> = entries.iter().map(ReportEntry::to_row).collect();
            Ok(create_warning_comment(&rows))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
    }
}
