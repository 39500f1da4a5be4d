//! Declaration rules
//!
//! Checks over the properties declared inside a rule (or `@font-face` and
//! `@page` block). Rules that compare declarations with each other collect
//! them between the start and end events of the enclosing block.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use nisaba_css::{EventKind, Parser, ParserEvent, Position, PropertyName, PropertyValue, ValueKind};

use super::tables::{COMPATIBLE_PREFIXES, COMPATIBLE_VARIANTS, KNOWN_PROPERTIES, VENDOR_PROPERTIES};
use crate::reporter::Reporter;
use crate::rule::{Rule, RuleMeta};

/// Call `check` for every declaration
fn on_property(
    parser: &mut Parser,
    reporter: &Rc<Reporter>,
    mut check: impl FnMut(&Reporter, &PropertyName, &PropertyValue, bool, Position) + 'static,
) {
    let reporter = Rc::clone(reporter);
    parser.add_listener(EventKind::Property, move |event| {
        if let ParserEvent::Property { property, value, important, position } = event {
            check(&reporter, property, value, *important, *position);
        }
    });
}

/// Run `reset` on each of `kinds`
fn reset_on<T: 'static>(
    parser: &mut Parser,
    kinds: &[EventKind],
    state: &Rc<RefCell<T>>,
    reset: fn(&mut T),
) {
    for &kind in kinds {
        let state = Rc::clone(state);
        parser.add_listener(kind, move |_| reset(&mut state.borrow_mut()));
    }
}

pub struct BoxModel;

static BOX_MODEL: RuleMeta = RuleMeta {
    id: "box-model",
    name: "Box Model",
    desc: "Don't use width or height when using padding or border.",
    browsers: "All",
};

const HEIGHT_SIDES: [&str; 6] = ["border", "border-bottom", "border-top", "padding", "padding-bottom", "padding-top"];
const WIDTH_SIDES: [&str; 6] = ["border", "border-left", "border-right", "padding", "padding-left", "padding-right"];

#[derive(Default)]
struct BoxModelState {
    dimensions: Vec<&'static str>,
    sides: FxHashMap<String, (Position, PropertyValue)>,
}

impl Rule for BoxModel {
    fn meta(&self) -> &'static RuleMeta {
        &BOX_MODEL
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let state = Rc::new(RefCell::new(BoxModelState::default()));
        reset_on(parser, &[EventKind::StartRule], &state, |s| *s = BoxModelState::default());

        let collect = Rc::clone(&state);
        on_property(parser, reporter, move |_, property, value, _, _| {
            let name = property.text.to_ascii_lowercase();
            let mut state = collect.borrow_mut();

            if HEIGHT_SIDES.contains(&name.as_str()) || WIDTH_SIDES.contains(&name.as_str()) {
                let zero = value.text.starts_with('0') && !value.text.contains(char::is_whitespace);
                if !zero && !(name == "border" && value.text == "none") {
                    state.sides.insert(name, (property.position, value.clone()));
                }
            } else if name == "height" {
                state.dimensions.push("height");
            } else if name == "width" {
                state.dimensions.push("width");
            }
        });

        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndRule, move |_| {
            let state = state.borrow();
            let checks = [("height", &HEIGHT_SIDES, 0), ("width", &WIDTH_SIDES, 1)];

            for (dimension, sides, padding_index) in checks {
                if !state.dimensions.contains(&dimension) {
                    continue;
                }
                for side in sides {
                    let Some((position, value)) = state.sides.get(*side) else {
                        continue;
                    };
                    // `padding: 0 5px` leaves height alone, `padding: 5px 0` leaves width alone
                    if *side == "padding"
                        && value.parts.len() == 2
                        && value.parts[padding_index].value == Some(0.0)
                    {
                        continue;
                    }
                    reporter.warn(
                        format!("Broken box model: using {} with {}.", dimension, side),
                        *position,
                        &BOX_MODEL,
                    );
                }
            }
        });
    }
}

pub struct CompatibleVendorPrefixes;

static COMPATIBLE_VENDOR_PREFIXES: RuleMeta = RuleMeta {
    id: "compatible-vendor-prefixes",
    name: "Compatible Vendor Prefixes",
    desc: "Include all compatible vendor prefixes to reach a wider range of users.",
    browsers: "All",
};

impl Rule for CompatibleVendorPrefixes {
    fn meta(&self) -> &'static RuleMeta {
        &COMPATIBLE_VENDOR_PREFIXES
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let prefixed = Rc::new(RefCell::new(Vec::<String>::new()));
        reset_on(parser, &[EventKind::StartRule], &prefixed, Vec::clear);

        let collect = Rc::clone(&prefixed);
        on_property(parser, reporter, move |_, property, _, _, _| {
            if COMPATIBLE_VARIANTS.contains_key(&property.text) {
                collect.borrow_mut().push(property.text.clone());
            }
        });

        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndRule, move |event| {
            let Some(position) = event.position() else {
                return;
            };

            let prefixed = prefixed.borrow();
            // Entry index -> variants actually declared, in first-seen order
            let mut groups: Vec<(usize, Vec<&str>)> = Vec::new();
            for name in prefixed.iter() {
                let index = COMPATIBLE_VARIANTS[name];
                let slot = match groups.iter().position(|(i, _)| *i == index) {
                    Some(slot) => slot,
                    None => {
                        groups.push((index, Vec::new()));
                        groups.len() - 1
                    }
                };
                if !groups[slot].1.contains(&name.as_str()) {
                    groups[slot].1.push(name);
                }
            }

            for (index, actual) in groups {
                let (property, prefixes) = COMPATIBLE_PREFIXES[index];
                if prefixes.len() == actual.len() {
                    continue;
                }
                let specified = match actual.len() {
                    1 | 2 => actual.join(" and "),
                    _ => actual.join(", "),
                };
                for prefix in prefixes.iter() {
                    let item = format!("-{}-{}", prefix, property);
                    if !actual.contains(&item.as_str()) {
                        reporter.warn(
                            format!(
                                "The property {} is compatible with {} and should be included as well.",
                                item, specified
                            ),
                            position,
                            &COMPATIBLE_VENDOR_PREFIXES,
                        );
                    }
                }
            }
        });
    }
}

pub struct DisplayPropertyGrouping;

static DISPLAY_PROPERTY_GROUPING: RuleMeta = RuleMeta {
    id: "display-property-grouping",
    name: "Display Property Grouping",
    desc: "Certain properties shouldn't be used with certain display property values.",
    browsers: "All",
};

const DISPLAY_AFFECTED: [&str; 15] = [
    "display",
    "float",
    "height",
    "width",
    "margin",
    "margin-left",
    "margin-right",
    "margin-bottom",
    "margin-top",
    "padding",
    "padding-left",
    "padding-right",
    "padding-bottom",
    "padding-top",
    "vertical-align",
];

const INLINE_FLOAT: &str =
    "display:inline has no effect on floated elements (but may be used to fix the IE6 double-margin bug).";

impl Rule for DisplayPropertyGrouping {
    fn meta(&self) -> &'static RuleMeta {
        &DISPLAY_PROPERTY_GROUPING
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let declared = Rc::new(RefCell::new(FxHashMap::<String, (String, Position)>::default()));
        reset_on(parser, &[EventKind::StartRule], &declared, FxHashMap::clear);

        let collect = Rc::clone(&declared);
        on_property(parser, reporter, move |_, property, value, _, _| {
            let name = property.text.to_ascii_lowercase();
            if DISPLAY_AFFECTED.contains(&name.as_str()) {
                collect.borrow_mut().insert(name, (value.text.clone(), property.position));
            }
        });

        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndRule, move |_| {
            let declared = declared.borrow();
            let Some((display, _)) = declared.get("display") else {
                return;
            };

            let report = |name: &str, message: Option<&str>| {
                let Some((value, position)) = declared.get(name) else {
                    return;
                };
                if name == "float" && value.eq_ignore_ascii_case("none") {
                    return;
                }
                let message = match message {
                    Some(message) => message.to_string(),
                    None => format!("{} can't be used with display: {}.", name, display),
                };
                reporter.warn(message, *position, &DISPLAY_PROPERTY_GROUPING);
            };

            match display.as_str() {
                "inline" => {
                    for name in ["height", "width", "margin", "margin-top", "margin-bottom"] {
                        report(name, None);
                    }
                    report("float", Some(INLINE_FLOAT));
                }
                "block" => report("vertical-align", None),
                "inline-block" => report("float", None),
                table if table.starts_with("table-") => {
                    for name in ["margin", "margin-left", "margin-right", "margin-top", "margin-bottom", "float"] {
                        report(name, None);
                    }
                }
                _ => {}
            }
        });
    }
}

pub struct DuplicateProperties;

static DUPLICATE_PROPERTIES: RuleMeta = RuleMeta {
    id: "duplicate-properties",
    name: "Duplicate Properties",
    desc: "Duplicate properties must appear one after the other.",
    browsers: "All",
};

#[derive(Default)]
struct DuplicateState {
    values: FxHashMap<String, String>,
    last: Option<String>,
}

impl Rule for DuplicateProperties {
    fn meta(&self) -> &'static RuleMeta {
        &DUPLICATE_PROPERTIES
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let state = Rc::new(RefCell::new(DuplicateState::default()));
        reset_on(
            parser,
            &[EventKind::StartRule, EventKind::StartFontFace, EventKind::StartPage],
            &state,
            |s| *s = DuplicateState::default(),
        );

        on_property(parser, reporter, move |reporter, property, value, _, position| {
            let name = property.text.to_ascii_lowercase();
            let mut state = state.borrow_mut();

            if let Some(previous) = state.values.get(&name) {
                let adjacent = state.last.as_deref() == Some(name.as_str());
                let same_value = *previous == value.text;
                // Adjacent repeats are fallbacks unless the value is different;
                // separated repeats are fallbacks only when the value differs
                if adjacent != same_value {
                    reporter.warn(
                        format!("Duplicate property '{}' found.", property.text),
                        position,
                        &DUPLICATE_PROPERTIES,
                    );
                }
            }

            state.values.insert(name.clone(), value.text.clone());
            state.last = Some(name);
        });
    }
}

pub struct EmptyRules;

static EMPTY_RULES: RuleMeta = RuleMeta {
    id: "empty-rules",
    name: "Empty Rules",
    desc: "Rules without any properties specified should be removed.",
    browsers: "All",
};

impl Rule for EmptyRules {
    fn meta(&self) -> &'static RuleMeta {
        &EMPTY_RULES
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let count = Rc::new(RefCell::new(0usize));
        reset_on(parser, &[EventKind::StartRule], &count, |c| *c = 0);

        let counter = Rc::clone(&count);
        parser.add_listener(EventKind::Property, move |_| *counter.borrow_mut() += 1);

        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndRule, move |event| {
            if let ParserEvent::EndRule { position, .. } = event {
                if *count.borrow() == 0 {
                    reporter.warn("Rule is empty.", *position, &EMPTY_RULES);
                }
            }
        });
    }
}

pub struct Gradients;

static GRADIENTS: RuleMeta = RuleMeta {
    id: "gradients",
    name: "Gradients",
    desc: "When using a vendor-prefixed gradient, make sure to use them all.",
    browsers: "All",
};

/// Gradient vendor prefixes and the browsers they cover
const GRADIENT_VENDORS: [(&str, &str); 4] = [
    ("moz", "Firefox 3.6+"),
    ("webkit", "Webkit (Safari, Chrome)"),
    ("ms", "Internet Explorer 10+"),
    ("o", "Opera 11.1+"),
];

fn has_vendor_gradient(value: &str, vendor: &str) -> bool {
    ["linear", "radial"]
        .iter()
        .any(|shape| value.contains(&format!("-{}-{}-gradient", vendor, shape)))
}

impl Rule for Gradients {
    fn meta(&self) -> &'static RuleMeta {
        &GRADIENTS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let seen = Rc::new(RefCell::new([false; 4]));
        reset_on(parser, &[EventKind::StartRule], &seen, |s| *s = [false; 4]);

        let collect = Rc::clone(&seen);
        on_property(parser, reporter, move |_, _, value, _, _| {
            let mut seen = collect.borrow_mut();
            for (index, (vendor, _)) in GRADIENT_VENDORS.iter().enumerate() {
                if has_vendor_gradient(&value.text, vendor) {
                    seen[index] = true;
                }
            }
        });

        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndRule, move |event| {
            let seen = seen.borrow();
            let missing: Vec<&str> = GRADIENT_VENDORS
                .iter()
                .zip(seen.iter())
                .filter(|(_, seen)| !**seen)
                .map(|((_, browser), _)| *browser)
                .collect();

            if !missing.is_empty() && missing.len() < GRADIENT_VENDORS.len() {
                if let Some(position) = event.position() {
                    reporter.warn(
                        format!("Missing vendor-prefixed CSS gradients for {}.", missing.join(", ")),
                        position,
                        &GRADIENTS,
                    );
                }
            }
        });
    }
}

pub struct KnownProperties;

static KNOWN_PROPERTIES_RULE: RuleMeta = RuleMeta {
    id: "known-properties",
    name: "Known Properties",
    desc: "Properties should be known (defined by a CSS module) or be a vendor-prefixed property.",
    browsers: "All",
};

impl Rule for KnownProperties {
    fn meta(&self) -> &'static RuleMeta {
        &KNOWN_PROPERTIES_RULE
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_property(parser, reporter, |reporter, property, _, _, position| {
            let name = property.text.to_ascii_lowercase();
            // Check the name behind an IE hack prefix
            let name = match property.hack {
                Some(hack) => name.strip_prefix(hack).unwrap_or(&name),
                None => name.as_str(),
            };

            if !name.starts_with('-') && !KNOWN_PROPERTIES.contains(name) {
                reporter.error(
                    format!("Unknown property '{}'.", property.text),
                    position,
                    &KNOWN_PROPERTIES_RULE,
                );
            }
        });
    }
}

pub struct TextIndent;

static TEXT_INDENT: RuleMeta = RuleMeta {
    id: "text-indent",
    name: "Text Indent",
    desc: "Checks for text indent less than -99px",
    browsers: "All",
};

impl Rule for TextIndent {
    fn meta(&self) -> &'static RuleMeta {
        &TEXT_INDENT
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_property(parser, reporter, |reporter, property, value, _, _| {
            let indent = value.parts.first().and_then(|part| part.value);
            if property.text == "text-indent" && indent.is_some_and(|v| v < -99.0) {
                reporter.warn(
                    "Negative text-indent doesn't work well with RTL. If you use text-indent for \
                     image replacement explicitly set text-direction for that item to ltr.",
                    property.position,
                    &TEXT_INDENT,
                );
            }
        });
    }
}

pub struct VendorPrefix;

static VENDOR_PREFIX: RuleMeta = RuleMeta {
    id: "vendor-prefix",
    name: "Vendor Prefix",
    desc: "When using a vendor-prefixed property, make sure to include the standard one.",
    browsers: "All",
};

/// Order of first declaration for each property name, in first-seen order
#[derive(Default)]
struct DeclarationOrder {
    first: FxHashMap<String, usize>,
    names: Vec<String>,
}

impl DeclarationOrder {
    fn push(&mut self, name: String) {
        let next = self.names.len();
        if !self.first.contains_key(&name) {
            self.first.insert(name.clone(), next);
            self.names.push(name);
        }
    }
}

impl Rule for VendorPrefix {
    fn meta(&self) -> &'static RuleMeta {
        &VENDOR_PREFIX
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let order = Rc::new(RefCell::new(DeclarationOrder::default()));
        reset_on(
            parser,
            &[EventKind::StartRule, EventKind::StartFontFace],
            &order,
            |o| *o = DeclarationOrder::default(),
        );

        let collect = Rc::clone(&order);
        on_property(parser, reporter, move |_, property, _, _, _| {
            collect.borrow_mut().push(property.text.to_ascii_lowercase());
        });

        for kind in [EventKind::EndRule, EventKind::EndFontFace] {
            let order = Rc::clone(&order);
            let reporter = Rc::clone(reporter);
            parser.add_listener(kind, move |event| {
                let Some(position) = event.position() else {
                    return;
                };
                let order = order.borrow();

                for actual in &order.names {
                    let Some(needed) = VENDOR_PROPERTIES.get(actual.as_str()) else {
                        continue;
                    };
                    match order.first.get(*needed) {
                        None => reporter.warn(
                            format!(
                                "Missing standard property '{}' to go along with '{}'.",
                                needed, actual
                            ),
                            position,
                            &VENDOR_PREFIX,
                        ),
                        Some(standard) if *standard < order.first[actual] => reporter.warn(
                            format!(
                                "Standard property '{}' should come after vendor-prefixed property '{}'.",
                                needed, actual
                            ),
                            position,
                            &VENDOR_PREFIX,
                        ),
                        Some(_) => {}
                    }
                }
            });
        }
    }
}

pub struct ZeroUnits;

static ZERO_UNITS: RuleMeta = RuleMeta {
    id: "zero-units",
    name: "Zero Units",
    desc: "You don't need to specify units when a value is 0.",
    browsers: "All",
};

impl Rule for ZeroUnits {
    fn meta(&self) -> &'static RuleMeta {
        &ZERO_UNITS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        on_property(parser, reporter, |reporter, _, value, _, _| {
            for part in &value.parts {
                let has_unit = part.units.is_some() || part.kind == ValueKind::Percentage;
                if has_unit && part.is_zero() {
                    reporter.warn("Values of 0 shouldn't have units specified.", part.position, &ZERO_UNITS);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{messages, run};

    #[test]
    fn test_box_model() {
        let result = run(&BoxModel, "a{height:10px;border:1px solid red;}");
        assert_eq!(messages(&result), vec!["Broken box model: using height with border."]);
        assert_eq!(result.messages[0].position, Some(Position::new(1, 15)));

        let result = run(&BoxModel, "a{height:10px;padding:0 5px;}");
        assert!(result.messages.is_empty());

        let result = run(&BoxModel, "a{width:10px;padding:0 5px;border:none;padding-left:0}");
        assert_eq!(messages(&result), vec!["Broken box model: using width with padding."]);

        let result = run(&BoxModel, "a{width:10px;border-left:2px solid}\nb{border-left:2px solid}");
        assert_eq!(messages(&result), vec!["Broken box model: using width with border-left."]);
    }

    #[test]
    fn test_compatible_vendor_prefixes() {
        let result = run(
            &CompatibleVendorPrefixes,
            "a { -webkit-border-radius: 4px; }\nb { -webkit-transition: all; -moz-transition: all; }",
        );
        assert_eq!(
            messages(&result),
            vec![
                "The property -moz-border-radius is compatible with -webkit-border-radius and should be included as well.",
                "The property -o-transition is compatible with -webkit-transition and -moz-transition and should be included as well.",
            ]
        );
        assert_eq!(result.messages[1].position, Some(Position::new(2, 1)));

        let result = run(&CompatibleVendorPrefixes, "a { -webkit-box-sizing: x; -moz-box-sizing: x }");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_display_property_grouping() {
        let result = run(
            &DisplayPropertyGrouping,
            "a { display: inline; height: 1px; float: left; }\nb { display: inline-block; float: none }\n\
             c { display: table-cell; margin: 0 }\nd { display: block; vertical-align: top }",
        );
        assert_eq!(
            messages(&result),
            vec![
                "height can't be used with display: inline.",
                INLINE_FLOAT,
                "margin can't be used with display: table-cell.",
                "vertical-align can't be used with display: block.",
            ]
        );
        assert_eq!(result.messages[0].position, Some(Position::new(1, 22)));
    }

    #[test]
    fn test_duplicate_properties_adjacent_values() {
        let result = run(&DuplicateProperties, "a{color:red;color:blue;}");
        assert_eq!(messages(&result), vec!["Duplicate property 'color' found."]);
        assert_eq!(result.messages[0].position, Some(Position::new(1, 13)));

        let result = run(&DuplicateProperties, "a{color:red;font-size:1px;color:blue;}");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_duplicate_properties_separated_same_value() {
        let result = run(&DuplicateProperties, "a{color:red;font-size:1px;color:red;}");
        assert_eq!(messages(&result), vec!["Duplicate property 'color' found."]);

        let result = run(&DuplicateProperties, "a{color:red;color:red;}\nb{color:blue}");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_empty_rules() {
        let result = run(&EmptyRules, "a { }\nb { color: red }\n@font-face { src: x } c { }");
        assert_eq!(messages(&result), vec!["Rule is empty.", "Rule is empty."]);
        assert_eq!(result.messages[1].position, Some(Position::new(3, 23)));
    }

    #[test]
    fn test_gradients() {
        let result = run(
            &Gradients,
            "a { background: -moz-linear-gradient(top, #fff, #000); \
             background: -webkit-radial-gradient(top, #fff, #000); }",
        );
        assert_eq!(
            messages(&result),
            vec!["Missing vendor-prefixed CSS gradients for Internet Explorer 10+, Opera 11.1+."]
        );

        let result = run(&Gradients, "a { background: red }");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_known_properties() {
        let result = run(&KnownProperties, "a{flumbo:1;}");
        assert_eq!(messages(&result), vec!["Unknown property 'flumbo'."]);
        assert_eq!(result.messages[0].severity, crate::reporter::Severity::Error);

        let result = run(&KnownProperties, "a{-flumbo:1; COLOR: red; *zoom: 1; _height: 1px}");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_text_indent() {
        let result = run(&TextIndent, "a { text-indent: -999px }\nb { text-indent: -50px }");
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].position, Some(Position::new(1, 5)));
    }

    #[test]
    fn test_vendor_prefix() {
        let result = run(
            &VendorPrefix,
            "a { -moz-box-shadow: none; }\nb { box-shadow: none; -webkit-box-shadow: none }\n\
             c { -webkit-transform: none; transform: none }",
        );
        assert_eq!(
            messages(&result),
            vec![
                "Missing standard property 'box-shadow' to go along with '-moz-box-shadow'.",
                "Standard property 'box-shadow' should come after vendor-prefixed property '-webkit-box-shadow'.",
            ]
        );
        assert_eq!(result.messages[1].position, Some(Position::new(2, 1)));
    }

    #[test]
    fn test_vendor_prefix_font_face() {
        let result = run(&VendorPrefix, "@font-face { -webkit-user-select: none }");
        assert_eq!(
            messages(&result),
            vec!["Missing standard property 'user-select' to go along with '-webkit-user-select'."]
        );
    }

    #[test]
    fn test_zero_units() {
        let result = run(&ZeroUnits, "a { margin: 0px 0 0% 1px; top: -0.0em }");
        assert_eq!(result.messages.len(), 3);
        let columns: Vec<usize> = result.messages.iter().filter_map(|m| m.position).map(|p| p.column).collect();
        assert_eq!(columns, vec![13, 19, 32]);
    }
}
