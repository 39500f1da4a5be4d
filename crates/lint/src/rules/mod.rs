//! Built-in rules

mod counts;
mod declarations;
mod selectors;
mod tables;

pub use counts::{Errors, Floats, FontFaces, FontSizes, Import, Important, RulesCount};
pub use declarations::{
    BoxModel, CompatibleVendorPrefixes, DisplayPropertyGrouping, DuplicateProperties, EmptyRules,
    Gradients, KnownProperties, TextIndent, VendorPrefix, ZeroUnits,
};
pub use selectors::{
    AdjoiningClasses, Ids, OverqualifiedElements, QualifiedHeadings, RegexSelectors,
    UniqueHeadings, UniversalSelector,
};

use crate::rule::Rule;

/// Every built-in rule, ordered by id
pub fn defaults() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(AdjoiningClasses),
        Box::new(BoxModel),
        Box::new(CompatibleVendorPrefixes),
        Box::new(DisplayPropertyGrouping),
        Box::new(DuplicateProperties),
        Box::new(EmptyRules),
        Box::new(Errors),
        Box::new(Floats),
        Box::new(FontFaces),
        Box::new(FontSizes),
        Box::new(Gradients),
        Box::new(Ids),
        Box::new(Import),
        Box::new(Important),
        Box::new(KnownProperties),
        Box::new(OverqualifiedElements),
        Box::new(QualifiedHeadings),
        Box::new(RegexSelectors),
        Box::new(RulesCount),
        Box::new(TextIndent),
        Box::new(UniqueHeadings),
        Box::new(UniversalSelector),
        Box::new(VendorPrefix),
        Box::new(ZeroUnits),
    ]
}

/// Run a single rule over `text`
#[cfg(test)]
pub(crate) fn run(rule: &dyn Rule, text: &str) -> crate::reporter::LintResult {
    use std::rc::Rc;

    use nisaba_css::{Parser, ParserOptions};

    let reporter = Rc::new(crate::reporter::Reporter::new(text));
    let mut parser = Parser::new(ParserOptions::lenient());
    rule.init(&mut parser, &reporter);
    parser.parse(text).unwrap();
    drop(parser);
    reporter.take_result()
}

#[cfg(test)]
pub(crate) fn messages(result: &crate::reporter::LintResult) -> Vec<String> {
    result.messages.iter().map(|m| m.message.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sorted_and_unique() {
        let ids: Vec<&str> = defaults().iter().map(|rule| rule.id()).collect();
        assert_eq!(ids.len(), 24);
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }
}
