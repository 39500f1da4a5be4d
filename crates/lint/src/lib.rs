//! Nisaba Lint Engine
//!
//! Rules, reporting and output formats on top of the nisaba CSS parser.

mod engine;
mod error;
mod formatters;
mod reporter;
mod rule;
pub mod rules;

pub use engine::Engine;
pub use error::LintError;
pub use formatters::{CheckstyleXml, Compact, CsslintXml, Formatter, Json, LintXml, Text};
pub use reporter::{LintResult, Message, Reporter, Severity};
pub use rule::{Rule, RuleMeta};
