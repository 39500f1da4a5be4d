//! Rule interface

use std::rc::Rc;

use serde::Serialize;

use nisaba_css::Parser;

use crate::reporter::Reporter;

/// Descriptive data every rule carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMeta {
    /// Unique id used to select the rule
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    /// Browsers the rule is relevant to
    pub browsers: &'static str,
}

/// A lint check
///
/// `init` runs once per verification. It subscribes listeners to the parser
/// and keeps any per-document state inside them, so nothing survives into
/// the next verification. Rules themselves are shared between threads, so
/// one engine can serve concurrent verifications.
pub trait Rule: Send + Sync {
    fn meta(&self) -> &'static RuleMeta;

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>);

    fn id(&self) -> &'static str {
        self.meta().id
    }
}
