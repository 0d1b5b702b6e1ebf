use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod collector;
pub mod line_checker;

/// Distinguishes how a rule pattern is evaluated against a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Literal substring presence.
    Keyword,
    /// Regular-expression presence.
    Regex,
    /// Regex with a single capture group; fires when the captured value differs from `expected`.
    ExpectValue,
}

/// Definition of a single deprecated-field rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier (e.g. `ACCOUNT_ID`).
    pub id: String,
    /// Warning text emitted when the rule fires.
    pub message: String,
    pub kind: RuleKind,
    /// Keyword literal or regex source.
    pub pattern: String,
    /// Literal the captured value must equal for `ExpectValue` rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl Rule {
    /// Construct a new rule, validating invariants before returning.
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        kind: RuleKind,
        pattern: impl Into<String>,
        expected: Option<&str>,
    ) -> Result<Self, RuleValidationError> {
        let rule = Self {
            id: id.into(),
            message: message.into(),
            kind,
            pattern: pattern.into(),
            expected: expected.map(str::to_string),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Validate invariants for existing rule definitions.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.id.trim().is_empty() {
            return Err(RuleValidationError::EmptyId);
        }
        if self.pattern.is_empty() {
            return Err(RuleValidationError::EmptyPattern {
                rule_id: self.id.clone(),
            });
        }
        if self.message.trim().is_empty() {
            return Err(RuleValidationError::EmptyMessage {
                rule_id: self.id.clone(),
            });
        }
        match (self.kind, &self.expected) {
            (RuleKind::ExpectValue, None) => Err(RuleValidationError::MissingExpected {
                rule_id: self.id.clone(),
            }),
            (RuleKind::Keyword | RuleKind::Regex, Some(_)) => {
                Err(RuleValidationError::UnexpectedExpected {
                    rule_id: self.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Errors emitted while validating rule definitions.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleValidationError {
    #[error("rule id must not be blank")]
    EmptyId,
    #[error("rule `{rule_id}` pattern must not be empty")]
    EmptyPattern { rule_id: String },
    #[error("rule `{rule_id}` message must not be blank")]
    EmptyMessage { rule_id: String },
    #[error("rule `{rule_id}` compares a captured value and needs an expected literal")]
    MissingExpected { rule_id: String },
    #[error("rule `{rule_id}` only checks presence and must not set an expected literal")]
    UnexpectedExpected { rule_id: String },
}

/// A warning tied to the rendered line that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWarning {
    pub rule_id: String,
    pub message: String,
    /// 1-based line number within the flattened rendering.
    pub line: usize,
}

/// The built-in rule table. Order determines output order for same-line matches.
pub fn default_rules() -> Vec<Rule> {
    let table: [(&str, &str, RuleKind, &str, Option<&str>); 6] = [
        (
            "GUID",
            "\"guid\" should not be used",
            RuleKind::Regex,
            r#"guid[`")\s]"#,
            None,
        ),
        (
            "ENTITY_GUID",
            "\"entityGuid\" should not be used",
            RuleKind::Keyword,
            r#""entityGuid""#,
            None,
        ),
        (
            "LINKED_ENTITY_GUIDS",
            "\"entityGuid\" should not be used",
            RuleKind::ExpectValue,
            r#""linkedEntityGuids": ("(?:[^"\\]|\\.)*"|[^,\s}\]]+)"#,
            Some("null"),
        ),
        (
            "PERMISSIONS",
            "\"permissions\" field should not be used",
            RuleKind::Keyword,
            r#""permissions":"#,
            None,
        ),
        (
            "ACCOUNT_ID",
            "\"accountId\" must be zero",
            RuleKind::ExpectValue,
            r#""accountId": ("(?:[^"\\]|\\.)*"|[^,\s}\]]+)"#,
            Some("0"),
        ),
        (
            "ACCOUNT_IDS",
            "\"accountIds\" must be set to []",
            RuleKind::ExpectValue,
            r#""accountIds": "(\[(?:[^"\\]|\\.)*\])""#,
            Some("[]"),
        ),
    ];

    table
        .into_iter()
        .map(|(id, message, kind, pattern, expected)| Rule {
            id: id.to_string(),
            message: message.to_string(),
            kind,
            pattern: pattern.to_string(),
            expected: expected.map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_are_valid() {
        let rules = default_rules();
        assert_eq!(rules.len(), 6);
        for rule in &rules {
            rule.validate()
                .unwrap_or_else(|err| panic!("default rule {} invalid: {err}", rule.id));
        }
    }

    #[test]
    fn rule_validation_rejects_missing_expected() {
        let err = Rule::new(
            "ACCOUNT_ID",
            "must be zero",
            RuleKind::ExpectValue,
            r#""accountId": (.*)"#,
            None,
        )
        .expect_err("expect-value rules need a literal");
        assert!(matches!(
            err,
            RuleValidationError::MissingExpected { rule_id } if rule_id == "ACCOUNT_ID"
        ));
    }

    #[test]
    fn rule_validation_rejects_expected_on_keyword() {
        let err = Rule::new("KW", "msg", RuleKind::Keyword, "guid", Some("0"))
            .expect_err("keyword rules take no literal");
        assert!(matches!(err, RuleValidationError::UnexpectedExpected { .. }));
    }

    #[test]
    fn rule_new_enforces_invariants() {
        assert!(matches!(
            Rule::new("  ", "msg", RuleKind::Keyword, "x", None),
            Err(RuleValidationError::EmptyId)
        ));
        assert!(matches!(
            Rule::new("ID", "msg", RuleKind::Regex, "", None),
            Err(RuleValidationError::EmptyPattern { .. })
        ));
        assert!(matches!(
            Rule::new("ID", " ", RuleKind::Regex, "x", None),
            Err(RuleValidationError::EmptyMessage { .. })
        ));
    }

    #[test]
    fn rule_serializes_kind_in_snake_case() {
        let rule = Rule::new("ID", "msg", RuleKind::ExpectValue, "(x)", Some("0")).unwrap();
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["kind"], "expect_value");
        assert_eq!(value["expected"], "0");
    }
}
