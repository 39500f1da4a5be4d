//! Lint Engine
//!
//! Owns the rule and formatter registries and runs verifications.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Once;

use log::{debug, error, warn};
use rustc_hash::FxHashMap;

use nisaba_css::{Parser, ParserOptions};

use crate::error::LintError;
use crate::formatters::{self, Formatter};
use crate::reporter::{LintResult, Reporter, Severity};
use crate::rule::Rule;
use crate::rules;

/// Id of the rule that is active in every verification
const ERRORS_RULE: &str = "errors";

thread_local! {
    /// Set while this thread runs a parse whose panics `verify` contains
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Route panics raised inside `verify` to the log instead of stderr. Other
/// panics still reach the previous hook.
fn install_panic_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINED.with(Cell::get) {
                error!("contained panic: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Rule and formatter registry
#[derive(Default)]
pub struct Engine {
    rules: Vec<Box<dyn Rule>>,
    rule_index: FxHashMap<&'static str, usize>,
    formatters: Vec<Box<dyn Formatter>>,
    formatter_index: FxHashMap<&'static str, usize>,
}

impl Engine {
    /// Create an engine with no rules or formatters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with every built-in rule and formatter
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        for rule in rules::defaults() {
            engine.add_rule(rule);
        }
        for formatter in formatters::defaults() {
            engine.add_formatter(formatter);
        }
        engine
    }

    /// Register a rule. A rule with the same id is replaced in place.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        let id = rule.id();
        match self.rule_index.get(id) {
            Some(&index) => self.rules[index] = rule,
            None => {
                self.rule_index.insert(id, self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
        self.rule_index.clear();
    }

    /// Registered rules in registration order
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rule_index.get(id).map(|&index| self.rules[index].as_ref())
    }

    /// Register a formatter. A formatter with the same id is replaced.
    pub fn add_formatter(&mut self, formatter: Box<dyn Formatter>) {
        let id = formatter.id();
        match self.formatter_index.get(id) {
            Some(&index) => self.formatters[index] = formatter,
            None => {
                self.formatter_index.insert(id, self.formatters.len());
                self.formatters.push(formatter);
            }
        }
    }

    pub fn get_formatter(&self, id: &str) -> Option<&dyn Formatter> {
        self.formatter_index.get(id).map(|&index| self.formatters[index].as_ref())
    }

    pub fn has_format(&self, id: &str) -> bool {
        self.formatter_index.contains_key(id)
    }

    /// Format a single result with the formatter `id`, wrapped in its start
    /// and end text
    pub fn format(&self, result: &LintResult, filename: &str, id: &str) -> Result<String, LintError> {
        let formatter = self
            .get_formatter(id)
            .ok_or_else(|| LintError::UnknownFormatter(id.to_string()))?;
        Ok(formatter.start_format() + &formatter.format_results(result, filename)? + &formatter.end_format())
    }

    /// Fail on the first id in `selection` that names no registered rule
    pub fn check_selection(&self, selection: &[&str]) -> Result<(), LintError> {
        match selection.iter().find(|id| !self.rule_index.contains_key(**id)) {
            Some(id) => Err(LintError::UnknownRule(id.to_string())),
            None => Ok(()),
        }
    }

    /// Lint `text` with every registered rule, or only those in `selection`.
    ///
    /// The `errors` rule always runs. A parse that cannot continue, or a rule
    /// that panics, ends up as one more error message instead of escaping.
    pub fn verify(&self, text: &str, selection: Option<&[&str]>) -> LintResult {
        let reporter = Rc::new(Reporter::new(text));
        let mut parser = Parser::new(ParserOptions::lenient());

        let selected = self.rules.iter().filter(|rule| match selection {
            Some(ids) => rule.id() == ERRORS_RULE || ids.contains(&rule.id()),
            None => true,
        });
        let mut count = 0;
        for rule in selected {
            rule.init(&mut parser, &reporter);
            count += 1;
        }
        debug!("verifying {} bytes with {} rules", text.len(), count);

        install_panic_hook();
        let outer = CONTAINED.with(|contained| contained.replace(true));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| parser.parse(text)));
        CONTAINED.with(|contained| contained.set(outer));

        let fatal = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some((error.to_string(), error.position())),
            Err(payload) => Some((panic_message(payload.as_ref()), None)),
        };
        if let Some((message, position)) = fatal {
            warn!("verification aborted: {}", message);
            reporter.report(
                Severity::Error,
                format!("Fatal error, cannot continue: {}", message),
                position.unwrap_or_default(),
                None,
            );
        }

        // Listeners hold reporter clones
        drop(parser);
        let result = reporter.take_result();
        debug!("verification produced {} messages", result.messages.len());
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleMeta;
    use nisaba_css::{EventKind, Position};

    fn messages(result: &LintResult) -> Vec<&str> {
        result.messages.iter().map(|m| m.message.as_str()).collect()
    }

    #[test]
    fn test_duplicate_properties_scenario() {
        let engine = Engine::with_defaults();
        let result = engine.verify("a{color:red;color:blue;}", Some(&["duplicate-properties"]));
        assert_eq!(messages(&result), vec!["Duplicate property 'color' found."]);

        let result = engine.verify("a{color:red;font-size:1px;color:blue;}", Some(&["duplicate-properties"]));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_box_model_scenario() {
        let engine = Engine::with_defaults();
        let result = engine.verify("a{height:10px;border:1px solid red;}", Some(&["box-model"]));
        assert_eq!(messages(&result), vec!["Broken box model: using height with border."]);

        let result = engine.verify("a{height:10px;padding:0 5px;}", Some(&["box-model"]));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_known_properties_scenario() {
        let engine = Engine::with_defaults();
        let result = engine.verify("a{flumbo:1;}", Some(&["known-properties"]));
        assert_eq!(messages(&result), vec!["Unknown property 'flumbo'."]);

        let result = engine.verify("a{-flumbo:1;}", Some(&["known-properties"]));
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_errors_rule_always_runs() {
        let engine = Engine::with_defaults();
        let result = engine.verify("a { color: red }\n}", Some(&["ids"]));
        assert!(!result.messages.is_empty());
        assert_eq!(result.messages[0].message, "Unexpected token '}' at line 2, col 1.");
        assert!(result
            .messages
            .iter()
            .all(|m| m.severity == Severity::Error && m.rule.map(|r| r.id) == Some("errors")));
    }

    #[test]
    fn test_verify_is_repeatable() {
        let engine = Engine::with_defaults();
        let css = "h1 { color: red }\nh1 { color: blue }\n#a.b { float: left; margin: 0px }";
        let first = engine.verify(css, None);
        let second = engine.verify(css, None);
        assert!(!first.messages.is_empty());
        assert_eq!(first, second);
        assert_eq!(first.stats.get("rule-count"), Some(&3));
    }

    struct Panicking;

    static PANICKING: RuleMeta = RuleMeta {
        id: "panicking",
        name: "Panicking",
        desc: "Panics on the first rule.",
        browsers: "All",
    };

    impl Rule for Panicking {
        fn meta(&self) -> &'static RuleMeta {
            &PANICKING
        }

        fn init(&self, parser: &mut Parser, _reporter: &Rc<Reporter>) {
            parser.add_listener(EventKind::StartRule, |_| panic!("rule blew up"));
        }
    }

    #[test]
    fn test_panicking_rule_is_contained() {
        let mut engine = Engine::with_defaults();
        engine.add_rule(Box::new(Panicking));
        let result = engine.verify("a { color: red }", Some(&["panicking"]));
        assert_eq!(messages(&result), vec!["Fatal error, cannot continue: rule blew up"]);
        assert_eq!(result.messages[0].position, Some(Position::new(1, 1)));
        assert_eq!(result.messages[0].rule, None);
        assert!(!CONTAINED.with(Cell::get));

        let again = engine.verify("b { color: red }", Some(&["panicking"]));
        assert_eq!(again.messages.len(), 1);
    }

    #[test]
    fn test_deep_nesting_is_contained() {
        let engine = Engine::with_defaults();
        let css = format!("a {{ b: {} }}", "f(".repeat(5_000));
        let result = engine.verify(&css, None);
        assert_eq!(
            messages(&result),
            vec!["Fatal error, cannot continue: Values nested too deeply at line 1, col 264."]
        );
    }

    #[test]
    fn test_engine_shared_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Engine>();

        let engine = Engine::with_defaults();
        let results: Vec<LintResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| engine.verify("#a { color: red }", Some(&["ids"]))))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        for result in results {
            assert_eq!(messages(&result), vec!["Don't use IDs in selectors."]);
        }
    }

    #[test]
    fn test_add_rule_replaces_same_id() {
        let mut engine = Engine::with_defaults();
        let before = engine.rules().count();
        engine.add_rule(Box::new(rules::Ids));
        assert_eq!(engine.rules().count(), before);
        assert_eq!(engine.rules().nth(11).map(|r| r.id()), Some("ids"));

        engine.clear_rules();
        assert_eq!(engine.rules().count(), 0);
        assert!(engine.get_rule("ids").is_none());
    }

    #[test]
    fn test_check_selection() {
        let engine = Engine::with_defaults();
        assert!(engine.check_selection(&["ids", "import"]).is_ok());
        assert!(matches!(
            engine.check_selection(&["ids", "nope"]),
            Err(LintError::UnknownRule(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_format() {
        let engine = Engine::with_defaults();
        let result = engine.verify("a { }", Some(&["empty-rules"]));
        let output = engine.format(&result, "a.css", "lint-xml").unwrap();
        assert!(output.starts_with("<?xml"));
        assert!(output.contains("reason=\"Rule is empty.\""));
        assert!(output.ends_with("</lint>"));

        assert!(engine.has_format("json"));
        assert!(matches!(
            engine.format(&result, "a.css", "yaml"),
            Err(LintError::UnknownFormatter(id)) if id == "yaml"
        ));
    }
}
