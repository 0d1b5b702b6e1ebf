use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::line_checker::{default_checker, LineChecker};
use super::LineWarning;

/// Render `document` as 2-space indented JSON where every array is replaced by
/// its compact single-line JSON text, so each field value stays on one line.
pub fn render_flattened(document: &Value) -> String {
    let flattened = flatten_arrays(document);
    // Serializing a `Value` cannot fail: all map keys are strings.
    serde_json::to_string_pretty(&flattened).unwrap_or_default()
}

fn flatten_arrays(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::String(value.to_string()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), flatten_arrays(child)))
                .collect::<Map<_, _>>(),
        ),
        scalar => scalar.clone(),
    }
}

/// All warnings for `document` under the built-in rules, in line-then-rule order.
pub fn get_warnings(document: &Value) -> Vec<String> {
    default_checker().warnings_for(document)
}

/// Like [`get_warnings`], but keeps the rule id and rendered line number of each hit.
pub fn scan_document(document: &Value) -> Vec<LineWarning> {
    default_checker().scan_document(document)
}

impl LineChecker {
    #[instrument(name = "scan_document", skip_all)]
    pub fn scan_document(&self, document: &Value) -> Vec<LineWarning> {
        let rendered = render_flattened(document);
        let mut warnings = Vec::new();
        for (idx, line) in rendered.lines().enumerate() {
            for rule in self.matching_rules(line) {
                warnings.push(LineWarning {
                    rule_id: rule.id.clone(),
                    message: rule.message.clone(),
                    line: idx + 1,
                });
            }
        }
        debug!(warnings = warnings.len(), "document scanned");
        warnings
    }

    pub fn warnings_for(&self, document: &Value) -> Vec<String> {
        self.scan_document(document)
            .into_iter()
            .map(|warning| warning.message)
            .collect()
    }
}
