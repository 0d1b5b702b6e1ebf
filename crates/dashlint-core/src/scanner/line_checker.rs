use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::{default_rules, Rule, RuleKind};

static DEFAULT_CHECKER: Lazy<LineChecker> = Lazy::new(|| {
    LineChecker::new(default_rules()).expect("built-in dashboard rules must compile")
});

/// Shared checker over the built-in rule table, compiled on first use.
pub fn default_checker() -> &'static LineChecker {
    &DEFAULT_CHECKER
}

/// Evaluate one rendered line against the built-in rules.
pub fn check_line(line: &str) -> Vec<String> {
    default_checker()
        .check_line(line)
        .into_iter()
        .map(str::to_string)
        .collect()
}

enum Matcher {
    /// Index into the keyword automaton's pattern list.
    Keyword(usize),
    Regex(Regex),
    ExpectValue { regex: Regex, expected: String },
}

/// Compiled rule table that evaluates every rule independently against a single line.
pub struct LineChecker {
    rules: Vec<Rule>,
    matchers: Vec<Matcher>,
    keywords: Option<AhoCorasick>,
}

impl LineChecker {
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let mut keyword_patterns = Vec::new();
        let mut matchers = Vec::with_capacity(rules.len());

        for rule in &rules {
            rule.validate()?;
            let matcher = match rule.kind {
                RuleKind::Keyword => {
                    keyword_patterns.push(rule.pattern.clone());
                    Matcher::Keyword(keyword_patterns.len() - 1)
                }
                RuleKind::Regex => Matcher::Regex(compile(rule)?),
                RuleKind::ExpectValue => {
                    let regex = compile(rule)?;
                    if regex.captures_len() < 2 {
                        anyhow::bail!(
                            "regex for rule {} must contain a capture group for the value",
                            rule.id
                        );
                    }
                    Matcher::ExpectValue {
                        regex,
                        // validate() guarantees the literal is present
                        expected: rule.expected.clone().unwrap_or_default(),
                    }
                }
            };
            matchers.push(matcher);
        }

        let keywords = if keyword_patterns.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::new(&keyword_patterns)
                    .context("failed to build keyword automaton from rules")?,
            )
        };

        Ok(Self {
            rules,
            matchers,
            keywords,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules triggered by `line`, in rule-table order.
    pub fn matching_rules<'a>(&'a self, line: &str) -> Vec<&'a Rule> {
        let keyword_hits = self.keyword_hits(line);
        self.rules
            .iter()
            .zip(&self.matchers)
            .filter(|(rule, matcher)| {
                let hit = match matcher {
                    Matcher::Keyword(idx) => keyword_hits[*idx],
                    Matcher::Regex(regex) => regex.is_match(line),
                    Matcher::ExpectValue { regex, expected } => regex
                        .captures(line)
                        .and_then(|caps| caps.get(1))
                        .is_some_and(|value| value.as_str() != expected.as_str()),
                };
                if hit {
                    trace!(rule_id = %rule.id, "rule matched line");
                }
                hit
            })
            .map(|(rule, _)| rule)
            .collect()
    }

    /// Warning messages triggered by `line`, in rule-table order.
    pub fn check_line<'a>(&'a self, line: &str) -> Vec<&'a str> {
        self.matching_rules(line)
            .into_iter()
            .map(|rule| rule.message.as_str())
            .collect()
    }

    fn keyword_hits(&self, line: &str) -> Vec<bool> {
        let Some(automaton) = &self.keywords else {
            return Vec::new();
        };
        let mut hits = vec![false; automaton.patterns_len()];
        for mat in automaton.find_overlapping_iter(line) {
            hits[mat.pattern().as_usize()] = true;
        }
        hits
    }
}

fn compile(rule: &Rule) -> Result<Regex> {
    Regex::new(&rule.pattern).with_context(|| format!("invalid regex pattern for rule {}", rule.id))
}
