//! Selector rules
//!
//! Checks that inspect the selectors of each rule as it starts.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use nisaba_css::{
    EventKind, Parser, ParserEvent, Position, Selector, SelectorComponent, SelectorPart, SubPartKind,
};

use crate::reporter::Reporter;
use crate::rule::{Rule, RuleMeta};

/// Call `check` with the selectors of every rule
fn on_selectors(
    parser: &mut Parser,
    reporter: &Rc<Reporter>,
    mut check: impl FnMut(&Reporter, &[Selector]) + 'static,
) {
    let reporter = Rc::clone(reporter);
    parser.add_listener(EventKind::StartRule, move |event| {
        if let ParserEvent::StartRule { selectors, .. } = event {
            check(&reporter, selectors);
        }
    });
}

/// The `h1`..`h6` heading named in an element name, if any
fn heading(element: &str) -> Option<&str> {
    element
        .as_bytes()
        .windows(2)
        .position(|w| w[0] == b'h' && (b'1'..=b'6').contains(&w[1]))
        .map(|i| &element[i..i + 2])
}

pub struct AdjoiningClasses;

static ADJOINING_CLASSES: RuleMeta = RuleMeta {
    id: "adjoining-classes",
    name: "Adjoining Classes",
    desc: "Don't use adjoining classes.",
    browsers: "IE6",
};

impl Rule for AdjoiningClasses {
    fn meta(&self) -> &'static RuleMeta {
        &ADJOINING_CLASSES
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_selectors(parser, reporter, |reporter, selectors| {
            for part in selectors.iter().flat_map(|selector| selector.sequences()) {
                let mut classes = 0;
                for modifier in &part.modifiers {
                    if modifier.kind == SubPartKind::Class {
                        classes += 1;
                    }
                    if classes > 1 {
                        reporter.warn("Don't use adjoining classes.", part.position, &ADJOINING_CLASSES);
                    }
                }
            }
        });
    }
}

pub struct Ids;

static IDS: RuleMeta = RuleMeta {
    id: "ids",
    name: "IDs",
    desc: "Selectors should not contain IDs.",
    browsers: "All",
};

impl Rule for Ids {
    fn meta(&self) -> &'static RuleMeta {
        &IDS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_selectors(parser, reporter, |reporter, selectors| {
            for selector in selectors {
                let ids: usize = selector.sequences().map(|part| part.count(SubPartKind::Id)).sum();
                match ids {
                    0 => {}
                    1 => reporter.warn("Don't use IDs in selectors.", selector.position, &IDS),
                    n => reporter.warn(
                        format!("{} IDs in the selector, really?", n),
                        selector.position,
                        &IDS,
                    ),
                }
            }
        });
    }
}

pub struct OverqualifiedElements;

static OVERQUALIFIED_ELEMENTS: RuleMeta = RuleMeta {
    id: "overqualified-elements",
    name: "Overqualified Elements",
    desc: "Don't use classes or IDs with elements (a.foo or a#foo).",
    browsers: "All",
};

/// One appearance of a class in a selector
struct ClassUse {
    class: String,
    part: String,
    qualified: bool,
    position: Position,
}

/// Class uses grouped by class, in first-seen order
#[derive(Default)]
struct ClassUses {
    index: FxHashMap<String, usize>,
    uses: Vec<Vec<ClassUse>>,
}

impl ClassUses {
    fn push(&mut self, class_use: ClassUse) {
        let next = self.uses.len();
        let slot = *self.index.entry(class_use.class.clone()).or_insert(next);
        if slot == next {
            self.uses.push(Vec::new());
        }
        self.uses[slot].push(class_use);
    }
}

impl Rule for OverqualifiedElements {
    fn meta(&self) -> &'static RuleMeta {
        &OVERQUALIFIED_ELEMENTS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let classes = Rc::new(RefCell::new(ClassUses::default()));

        let seen = Rc::clone(&classes);
        on_selectors(parser, reporter, move |reporter, selectors| {
            let mut seen = seen.borrow_mut();
            for part in selectors.iter().flat_map(|selector| selector.sequences()) {
                for modifier in &part.modifiers {
                    if part.element_name.is_some() && modifier.kind == SubPartKind::Id {
                        reporter.warn(
                            overqualified(&part.text, &modifier.text),
                            part.position,
                            &OVERQUALIFIED_ELEMENTS,
                        );
                    } else if modifier.kind == SubPartKind::Class {
                        seen.push(ClassUse {
                            class: modifier.text.clone(),
                            part: part.text.clone(),
                            qualified: part.element_name.is_some(),
                            position: part.position,
                        });
                    }
                }
            }
        });

        // A class only ever used with an element does not need the element
        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndStylesheet, move |_| {
            for uses in &classes.borrow().uses {
                if let [only] = uses.as_slice() {
                    if only.qualified {
                        reporter.warn(
                            overqualified(&only.part, &only.class),
                            only.position,
                            &OVERQUALIFIED_ELEMENTS,
                        );
                    }
                }
            }
        });
    }
}

fn overqualified(part: &str, modifier: &str) -> String {
    format!(
        "Element ({}) is overqualified, just use {} without element name.",
        part, modifier
    )
}

pub struct QualifiedHeadings;

static QUALIFIED_HEADINGS: RuleMeta = RuleMeta {
    id: "qualified-headings",
    name: "Qualified Headings",
    desc: "Headings should not be qualified (namespaced).",
    browsers: "All",
};

impl Rule for QualifiedHeadings {
    fn meta(&self) -> &'static RuleMeta {
        &QUALIFIED_HEADINGS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_selectors(parser, reporter, |reporter, selectors| {
            for selector in selectors {
                for (index, component) in selector.parts.iter().enumerate() {
                    let SelectorComponent::Part(part) = component else {
                        continue;
                    };
                    let Some(element) = &part.element_name else {
                        continue;
                    };
                    if index > 0 && heading(element).is_some() {
                        reporter.warn(
                            format!("Heading ({}) should not be qualified.", element),
                            part.position,
                            &QUALIFIED_HEADINGS,
                        );
                    }
                }
            }
        });
    }
}

pub struct RegexSelectors;

static REGEX_SELECTORS: RuleMeta = RuleMeta {
    id: "regex-selectors",
    name: "Regex Selectors",
    desc: "Selectors that look like regular expressions are slow and should be avoided.",
    browsers: "All",
};

const SLOW_ATTRIBUTE_OPERATORS: [char; 5] = ['~', '|', '^', '$', '*'];

impl Rule for RegexSelectors {
    fn meta(&self) -> &'static RuleMeta {
        &REGEX_SELECTORS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_selectors(parser, reporter, |reporter, selectors| {
            for part in selectors.iter().flat_map(|selector| selector.sequences()) {
                for modifier in &part.modifiers {
                    if modifier.kind != SubPartKind::Attribute {
                        continue;
                    }
                    let operator = modifier
                        .text
                        .char_indices()
                        .find(|&(i, c)| {
                            SLOW_ATTRIBUTE_OPERATORS.contains(&c)
                                && modifier.text[i + c.len_utf8()..].starts_with('=')
                        })
                        .map(|(i, _)| &modifier.text[i..i + 2]);

                    if let Some(operator) = operator {
                        reporter.warn(
                            format!("Attribute selectors with {} are slow!", operator),
                            modifier.position,
                            &REGEX_SELECTORS,
                        );
                    }
                }
            }
        });
    }
}

pub struct UniqueHeadings;

static UNIQUE_HEADINGS: RuleMeta = RuleMeta {
    id: "unique-headings",
    name: "Unique Headings",
    desc: "Headings should be defined only once.",
    browsers: "All",
};

impl Rule for UniqueHeadings {
    fn meta(&self) -> &'static RuleMeta {
        &UNIQUE_HEADINGS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let mut defined: FxHashMap<String, usize> = FxHashMap::default();

        on_selectors(parser, reporter, move |reporter, selectors| {
            for selector in selectors {
                let Some(part) = selector.subject() else {
                    continue;
                };
                let Some(element) = &part.element_name else {
                    continue;
                };
                let Some(level) = heading(element) else {
                    continue;
                };

                let count = defined.entry(level.to_string()).or_default();
                *count += 1;
                if *count > 1 {
                    reporter.warn(
                        format!("Heading ({}) has already been defined.", element),
                        part.position,
                        &UNIQUE_HEADINGS,
                    );
                }
            }
        });
    }
}

pub struct UniversalSelector;

static UNIVERSAL_SELECTOR: RuleMeta = RuleMeta {
    id: "universal-selector",
    name: "Universal Selector",
    desc: "The universal selector (*) is known to be slow.",
    browsers: "All",
};

impl Rule for UniversalSelector {
    fn meta(&self) -> &'static RuleMeta {
        &UNIVERSAL_SELECTOR
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_selectors(parser, reporter, |reporter, selectors| {
            for part in selectors.iter().filter_map(|selector| selector.subject()) {
                if is_universal(part) {
                    reporter.warn(UNIVERSAL_SELECTOR.desc, part.position, &UNIVERSAL_SELECTOR);
                }
            }
        });
    }
}

fn is_universal(part: &SelectorPart) -> bool {
    part.element_name.as_deref() == Some("*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{messages, run};

    #[test]
    fn test_adjoining_classes() {
        let result = run(&AdjoiningClasses, ".foo.bar { color: red }\n.foo .bar { color: red }");
        assert_eq!(messages(&result), vec!["Don't use adjoining classes."]);
        assert_eq!(result.messages[0].position, Some(Position::new(1, 1)));
    }

    #[test]
    fn test_ids() {
        let result = run(&Ids, "#a { }\n#a #b { }\n.c, div#d { }");
        assert_eq!(
            messages(&result),
            vec![
                "Don't use IDs in selectors.",
                "2 IDs in the selector, really?",
                "Don't use IDs in selectors.",
            ]
        );
        assert_eq!(result.messages[2].position, Some(Position::new(3, 5)));
    }

    #[test]
    fn test_overqualified_elements() {
        let result = run(&OverqualifiedElements, "li#nav { }\np.note { }\ndiv.box { }\n.box { }");
        assert_eq!(
            messages(&result),
            vec![
                "Element (li#nav) is overqualified, just use #nav without element name.",
                "Element (p.note) is overqualified, just use .note without element name.",
            ]
        );
        assert_eq!(result.messages[1].position, Some(Position::new(2, 1)));
    }

    #[test]
    fn test_qualified_headings() {
        let result = run(&QualifiedHeadings, "h1 { }\n.nav h2 { }");
        assert_eq!(messages(&result), vec!["Heading (h2) should not be qualified."]);
        assert_eq!(result.messages[0].position, Some(Position::new(2, 6)));
    }

    #[test]
    fn test_regex_selectors() {
        let result = run(&RegexSelectors, "a[href] { }\na[href='x'] { }\na[href^='http'] { }\na[class~=x] { }");
        assert_eq!(
            messages(&result),
            vec!["Attribute selectors with ^= are slow!", "Attribute selectors with ~= are slow!"]
        );
        assert_eq!(result.messages[0].position, Some(Position::new(3, 2)));
    }

    #[test]
    fn test_unique_headings() {
        let result = run(&UniqueHeadings, "h1 { }\nh2 { }\n.x h1 { }\nh1 a { }");
        assert_eq!(messages(&result), vec!["Heading (h1) has already been defined."]);
        assert_eq!(result.messages[0].position, Some(Position::new(3, 4)));
    }

    #[test]
    fn test_universal_selector() {
        let result = run(&UniversalSelector, "* { }\n* a { }\n.x * { }");
        assert_eq!(
            messages(&result),
            vec![
                "The universal selector (*) is known to be slow.",
                "The universal selector (*) is known to be slow.",
            ]
        );
        assert_eq!(result.messages[1].position, Some(Position::new(3, 4)));
    }

    #[test]
    fn test_heading_detection() {
        assert_eq!(heading("h3"), Some("h3"));
        assert_eq!(heading("th1"), Some("h1"));
        assert_eq!(heading("h7"), None);
        assert_eq!(heading("header"), None);
    }
}
