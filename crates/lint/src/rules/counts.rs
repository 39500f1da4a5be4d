//! Stylesheet-wide rules
//!
//! Parse error reporting plus the rules that count things across the whole
//! stylesheet and summarize at the end.

use std::cell::Cell;
use std::rc::Rc;

use nisaba_css::{EventKind, Parser, ParserEvent};

use crate::reporter::Reporter;
use crate::rule::{Rule, RuleMeta};

/// Count events of `kind` matching `filter`, then hand the total to `summarize`
/// when the stylesheet ends
fn count_then(
    parser: &mut Parser,
    reporter: &Rc<Reporter>,
    kind: EventKind,
    filter: fn(&ParserEvent) -> bool,
    summarize: fn(&Reporter, usize),
) {
    let count = Rc::new(Cell::new(0usize));

    let counter = Rc::clone(&count);
    parser.add_listener(kind, move |event| {
        if filter(event) {
            counter.set(counter.get() + 1);
        }
    });

    let reporter = Rc::clone(reporter);
    parser.add_listener(EventKind::EndStylesheet, move |_| summarize(&reporter, count.get()));
}

pub struct Errors;

static ERRORS: RuleMeta = RuleMeta {
    id: "errors",
    name: "Parsing Errors",
    desc: "This rule looks for recoverable syntax errors.",
    browsers: "All",
};

impl Rule for Errors {
    fn meta(&self) -> &'static RuleMeta {
        &ERRORS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::Error, move |event| {
            if let ParserEvent::Error { error, position } = event {
                reporter.error(error.to_string(), *position, &ERRORS);
            }
        });
    }
}

pub struct Floats;

static FLOATS: RuleMeta = RuleMeta {
    id: "floats",
    name: "Floats",
    desc: "This rule tests if the float property is used too many times",
    browsers: "All",
};

impl Rule for Floats {
    fn meta(&self) -> &'static RuleMeta {
        &FLOATS
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        count_then(
            parser,
            reporter,
            EventKind::Property,
            |event| {
                matches!(event, ParserEvent::Property { property, value, .. }
                    if property.text.eq_ignore_ascii_case("float")
                        && !value.text.eq_ignore_ascii_case("none"))
            },
            |reporter, count| {
                reporter.stat("floats", count);
                if count >= 10 {
                    reporter.rollup_warn(
                        format!(
                            "Too many floats ({}), you're probably using them for layout. \
                             Consider using a grid system instead.",
                            count
                        ),
                        &FLOATS,
                    );
                }
            },
        );
    }
}

pub struct FontFaces;

static FONT_FACES: RuleMeta = RuleMeta {
    id: "font-faces",
    name: "Font Faces",
    desc: "Too many different web fonts in the same stylesheet.",
    browsers: "All",
};

impl Rule for FontFaces {
    fn meta(&self) -> &'static RuleMeta {
        &FONT_FACES
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        count_then(
            parser,
            reporter,
            EventKind::StartFontFace,
            |_| true,
            |reporter, count| {
                if count > 5 {
                    reporter.rollup_warn(format!("Too many @font-face declarations ({}).", count), &FONT_FACES);
                }
            },
        );
    }
}

pub struct FontSizes;

static FONT_SIZES: RuleMeta = RuleMeta {
    id: "font-sizes",
    name: "Font Sizes",
    desc: "Checks the number of font-size declarations.",
    browsers: "All",
};

impl Rule for FontSizes {
    fn meta(&self) -> &'static RuleMeta {
        &FONT_SIZES
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        count_then(
            parser,
            reporter,
            EventKind::Property,
            |event| matches!(event, ParserEvent::Property { property, .. } if property.text == "font-size"),
            |reporter, count| {
                reporter.stat("font-sizes", count);
                if count >= 10 {
                    reporter.rollup_warn(
                        format!("Too many font-size declarations ({}), abstraction needed.", count),
                        &FONT_SIZES,
                    );
                }
            },
        );
    }
}

pub struct Import;

static IMPORT: RuleMeta = RuleMeta {
    id: "import",
    name: "@import",
    desc: "Don't use @import, use <link> instead.",
    browsers: "All",
};

impl Rule for Import {
    fn meta(&self) -> &'static RuleMeta {
        &IMPORT
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::Import, move |event| {
            if let ParserEvent::Import { position, .. } = event {
                reporter.warn("@import prevents parallel downloads, use <link> instead.", *position, &IMPORT);
            }
        });
    }
}

pub struct Important;

static IMPORTANT: RuleMeta = RuleMeta {
    id: "important",
    name: "Important",
    desc: "Be careful when using !important declaration",
    browsers: "All",
};

impl Rule for Important {
    fn meta(&self) -> &'static RuleMeta {
        &IMPORTANT
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        let count = Rc::new(Cell::new(0usize));

        let counter = Rc::clone(&count);
        let warn = Rc::clone(reporter);
        parser.add_listener(EventKind::Property, move |event| {
            if let ParserEvent::Property { important: true, position, .. } = event {
                counter.set(counter.get() + 1);
                warn.warn("Use of !important", *position, &IMPORTANT);
            }
        });

        let reporter = Rc::clone(reporter);
        parser.add_listener(EventKind::EndStylesheet, move |_| {
            let count = count.get();
            reporter.stat("important", count);
            if count >= 10 {
                reporter.rollup_warn(
                    format!(
                        "Too many !important declarations ({}), try to use less than 10 \
                         to avoid specificity issues.",
                        count
                    ),
                    &IMPORTANT,
                );
            }
        });
    }
}

pub struct RulesCount;

static RULES_COUNT: RuleMeta = RuleMeta {
    id: "rules-count",
    name: "Rules Count",
    desc: "Track how many rules there are.",
    browsers: "All",
};

impl Rule for RulesCount {
    fn meta(&self) -> &'static RuleMeta {
        &RULES_COUNT
    }

    fn init(&self, parser: &mut Parser, reporter: &Rc<Reporter>) {
        count_then(
            parser,
            reporter,
            EventKind::StartRule,
            |_| true,
            |reporter, count| reporter.stat("rule-count", count),
        );
    }
}
