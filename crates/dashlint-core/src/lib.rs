pub mod github;
pub mod lint;
pub mod report;
pub mod scanner;

pub use github::{is_dashboard_file, ChangedFile, GithubClient, GithubSettings, PullRequestSource};
pub use lint::{lint_document, lint_pull_request};
pub use report::{create_warning_comment, render_report, OutputFormat, ReportEntry};
pub use scanner::{
    collector::{get_warnings, render_flattened, scan_document},
    default_rules,
    line_checker::{check_line, default_checker, LineChecker},
    LineWarning, Rule, RuleKind, RuleValidationError,
};
