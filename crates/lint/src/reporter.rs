//! Diagnostics Reporter
//!
//! Collects the messages and statistics produced by rules during one
//! verification. Rules share the reporter through an `Rc` from inside parser
//! listeners, so the collections live behind `RefCell`s.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use nisaba_css::Position;

use crate::rule::RuleMeta;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    /// Absent for rollup messages
    #[serde(flatten)]
    pub position: Option<Position>,
    /// Source line the position points into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Whether the message summarizes the whole stylesheet
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rollup: bool,
    pub rule: Option<RuleMeta>,
}

/// Everything one verification produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LintResult {
    pub messages: Vec<Message>,
    pub stats: BTreeMap<String, usize>,
}

impl LintResult {
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }
}

/// Message and statistic sink for one verification
#[derive(Debug, Default)]
pub struct Reporter {
    lines: Vec<String>,
    messages: RefCell<Vec<Message>>,
    stats: RefCell<BTreeMap<String, usize>>,
}

impl Reporter {
    /// Create a reporter over the source text. Lines are split the same way
    /// the tokenizer counts them.
    pub fn new(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            ..Self::default()
        }
    }

    pub fn error(&self, message: impl Into<String>, position: Position, rule: &RuleMeta) {
        self.report(Severity::Error, message, position, Some(rule));
    }

    pub fn warn(&self, message: impl Into<String>, position: Position, rule: &RuleMeta) {
        self.report(Severity::Warning, message, position, Some(rule));
    }

    pub fn info(&self, message: impl Into<String>, position: Position, rule: &RuleMeta) {
        self.report(Severity::Info, message, position, Some(rule));
    }

    /// Append a positioned message with the source line as evidence
    pub fn report(
        &self,
        severity: Severity,
        message: impl Into<String>,
        position: Position,
        rule: Option<&RuleMeta>,
    ) {
        debug_assert!(
            (1..=self.lines.len()).contains(&position.line),
            "message reported at line {} of {}",
            position.line,
            self.lines.len()
        );
        let evidence = position
            .line
            .checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .cloned();

        self.messages.borrow_mut().push(Message {
            severity,
            message: message.into(),
            position: Some(position),
            evidence,
            rollup: false,
            rule: rule.copied(),
        });
    }

    pub fn rollup_error(&self, message: impl Into<String>, rule: &RuleMeta) {
        self.rollup(Severity::Error, message, rule);
    }

    pub fn rollup_warn(&self, message: impl Into<String>, rule: &RuleMeta) {
        self.rollup(Severity::Warning, message, rule);
    }

    fn rollup(&self, severity: Severity, message: impl Into<String>, rule: &RuleMeta) {
        self.messages.borrow_mut().push(Message {
            severity,
            message: message.into(),
            position: None,
            evidence: None,
            rollup: true,
            rule: Some(*rule),
        });
    }

    /// Record a statistic, replacing any earlier value
    pub fn stat(&self, name: impl Into<String>, value: usize) {
        self.stats.borrow_mut().insert(name.into(), value);
    }

    /// Move the collected messages and statistics out
    pub fn take_result(&self) -> LintResult {
        LintResult {
            messages: self.messages.take(),
            stats: self.stats.take(),
        }
    }
}

/// Split on `\r\n`, `\r` and `\n`, keeping a trailing empty line
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    static RULE: RuleMeta = RuleMeta {
        id: "test",
        name: "Test",
        desc: "Test rule.",
        browsers: "All",
    };

    #[test]
    fn test_messages_keep_insertion_order() {
        let reporter = Reporter::new("a {}\nb {}\n");
        reporter.warn("second line", Position::new(2, 1), &RULE);
        reporter.rollup_warn("summary", &RULE);
        reporter.error("first line", Position::new(1, 3), &RULE);

        let result = reporter.take_result();
        let texts: Vec<&str> = result.messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, vec!["second line", "summary", "first line"]);

        assert_eq!(result.messages[0].evidence.as_deref(), Some("b {}"));
        assert_eq!(result.messages[0].severity, Severity::Warning);
        assert!(result.messages[1].rollup);
        assert_eq!(result.messages[1].position, None);
        assert_eq!(result.messages[2].evidence.as_deref(), Some("a {}"));
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Warning), 2);
        assert_eq!(result.count(Severity::Info), 0);
    }

    #[test]
    fn test_stat_overwrites() {
        let reporter = Reporter::new("");
        reporter.stat("floats", 1);
        reporter.stat("floats", 4);
        assert_eq!(reporter.take_result().stats.get("floats"), Some(&4));
    }

    #[test]
    fn test_split_lines_newline_styles() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    #[should_panic(expected = "message reported at line 3 of 1")]
    #[cfg(debug_assertions)]
    fn test_out_of_range_line_is_caught() {
        let reporter = Reporter::new("a {}");
        reporter.info("nowhere", Position::new(3, 1), &RULE);
    }

    #[test]
    fn test_message_json_shape() {
        let reporter = Reporter::new("a {}");
        reporter.warn("w", Position::new(1, 2), &RULE);
        reporter.rollup_error("r", &RULE);
        let result = reporter.take_result();

        let value = serde_json::to_value(&result.messages[0]).unwrap();
        assert_eq!(value["type"], "warning");
        assert_eq!(value["line"], 1);
        assert_eq!(value["col"], 2);
        assert_eq!(value["evidence"], "a {}");
        assert_eq!(value["rule"]["id"], "test");
        assert!(value.get("rollup").is_none());

        let value = serde_json::to_value(&result.messages[1]).unwrap();
        assert_eq!(value["rollup"], true);
        assert!(value.get("line").is_none());
    }
}
