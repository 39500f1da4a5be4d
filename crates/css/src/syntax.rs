//! Syntax units
//!
//! Structured results of grammar productions. Every unit keeps the source
//! text it was parsed from and the position where it starts; nothing here is
//! retained after the event carrying it has been dispatched.

use std::fmt;

use smallvec::SmallVec;

use crate::colors::{hex_to_rgb, named_color};
use crate::error::Position;
use crate::token::TokenKind;
use crate::tokenizer::unit_kind;

/// A plain piece of text with a position (keyframe keys, names, margin keywords)
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub text: String,
    pub position: Position,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        Self { text: text.into(), position }
    }
}

/// Any syntax unit
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxUnit {
    Text(TextUnit),
    Selector(Selector),
    SelectorPart(SelectorPart),
    SelectorSubPart(SelectorSubPart),
    Combinator(Combinator),
    PropertyName(PropertyName),
    PropertyValue(PropertyValue),
    PropertyValuePart(PropertyValuePart),
    MediaQuery(MediaQuery),
    MediaFeature(MediaFeature),
}

impl SyntaxUnit {
    pub fn text(&self) -> &str {
        match self {
            SyntaxUnit::Text(unit) => &unit.text,
            SyntaxUnit::Selector(unit) => &unit.text,
            SyntaxUnit::SelectorPart(unit) => &unit.text,
            SyntaxUnit::SelectorSubPart(unit) => &unit.text,
            SyntaxUnit::Combinator(unit) => &unit.text,
            SyntaxUnit::PropertyName(unit) => &unit.text,
            SyntaxUnit::PropertyValue(unit) => &unit.text,
            SyntaxUnit::PropertyValuePart(unit) => &unit.text,
            SyntaxUnit::MediaQuery(unit) => &unit.text,
            SyntaxUnit::MediaFeature(unit) => &unit.text,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            SyntaxUnit::Text(unit) => unit.position,
            SyntaxUnit::Selector(unit) => unit.position,
            SyntaxUnit::SelectorPart(unit) => unit.position,
            SyntaxUnit::SelectorSubPart(unit) => unit.position,
            SyntaxUnit::Combinator(unit) => unit.position,
            SyntaxUnit::PropertyName(unit) => unit.position,
            SyntaxUnit::PropertyValue(unit) => unit.position,
            SyntaxUnit::PropertyValuePart(unit) => unit.position,
            SyntaxUnit::MediaQuery(unit) => unit.position,
            SyntaxUnit::MediaFeature(unit) => unit.position,
        }
    }
}

/// A complex selector: simple selector sequences joined by combinators
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub parts: Vec<SelectorComponent>,
    pub text: String,
    pub position: Position,
}

impl Selector {
    pub fn new(parts: Vec<SelectorComponent>, position: Position) -> Self {
        let text = parts
            .iter()
            .filter(|part| {
                !matches!(part, SelectorComponent::Combinator(c) if c.kind == CombinatorKind::Descendant)
            })
            .map(SelectorComponent::text)
            .collect::<Vec<_>>()
            .join(" ");
        Self { parts, text, position }
    }

    /// The simple selector sequences, skipping combinators
    pub fn sequences(&self) -> impl Iterator<Item = &SelectorPart> {
        self.parts.iter().filter_map(|part| match part {
            SelectorComponent::Part(part) => Some(part),
            SelectorComponent::Combinator(_) => None,
        })
    }

    /// The rightmost simple selector sequence (the subject)
    pub fn subject(&self) -> Option<&SelectorPart> {
        match self.parts.last() {
            Some(SelectorComponent::Part(part)) => Some(part),
            _ => None,
        }
    }
}

/// Entry in a selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    Part(SelectorPart),
    Combinator(Combinator),
}

impl SelectorComponent {
    pub fn text(&self) -> &str {
        match self {
            SelectorComponent::Part(part) => &part.text,
            SelectorComponent::Combinator(combinator) => &combinator.text,
        }
    }
}

/// A simple selector sequence such as `a.nav#top:hover`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorPart {
    /// Type or universal selector, including any namespace prefix
    pub element_name: Option<String>,
    pub modifiers: SmallVec<[SelectorSubPart; 4]>,
    pub text: String,
    pub position: Position,
}

impl SelectorPart {
    pub fn new(
        element_name: Option<String>,
        modifiers: SmallVec<[SelectorSubPart; 4]>,
        text: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            element_name,
            modifiers,
            text: text.into(),
            position,
        }
    }

    /// Count modifiers of one kind
    pub fn count(&self, kind: SubPartKind) -> usize {
        self.modifiers.iter().filter(|m| m.kind == kind).count()
    }
}

/// Kind of a selector modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubPartKind {
    Id,
    Class,
    Attribute,
    Pseudo,
    Not,
}

/// An id, class, attribute, pseudo or negation modifier
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSubPart {
    pub text: String,
    pub kind: SubPartKind,
    /// Arguments of `:not()`; empty for every other kind
    pub args: Vec<SelectorPart>,
    pub position: Position,
}

impl SelectorSubPart {
    pub fn new(text: impl Into<String>, kind: SubPartKind, position: Position) -> Self {
        Self {
            text: text.into(),
            kind,
            args: Vec::new(),
            position,
        }
    }

    pub fn negation(text: impl Into<String>, arg: SelectorPart, position: Position) -> Self {
        Self {
            text: text.into(),
            kind: SubPartKind::Not,
            args: vec![arg],
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinatorKind {
    Descendant,
    Child,
    AdjacentSibling,
    Sibling,
    Unknown,
}

/// Relationship between two simple selector sequences
#[derive(Debug, Clone, PartialEq)]
pub struct Combinator {
    pub text: String,
    pub kind: CombinatorKind,
    pub position: Position,
}

impl Combinator {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        let text = text.into();
        let kind = match text.trim() {
            "" => CombinatorKind::Descendant,
            ">" => CombinatorKind::Child,
            "+" => CombinatorKind::AdjacentSibling,
            "~" => CombinatorKind::Sibling,
            _ => CombinatorKind::Unknown,
        };
        Self { text, kind, position }
    }
}

/// A declaration's property name, including an IE hack prefix if present
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyName {
    pub text: String,
    /// `*` or `_` when written with the IE star/underscore hack
    pub hack: Option<char>,
    pub position: Position,
}

impl PropertyName {
    pub fn new(name: &str, hack: Option<char>, position: Position) -> Self {
        let mut text = String::with_capacity(name.len() + 1);
        text.extend(hack);
        text.push_str(name);
        Self { text, hack, position }
    }
}

/// A declaration's value
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    /// Terms and operators in source order
    pub parts: Vec<PropertyValuePart>,
    pub text: String,
    pub position: Position,
}

impl PropertyValue {
    pub fn new(parts: Vec<PropertyValuePart>, position: Position) -> Self {
        let text = parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(" ");
        Self { parts, text, position }
    }
}

/// What a value term looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Dimension,
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
    Percentage,
    Integer,
    Number,
    Color,
    Uri,
    String,
    Identifier,
    Operator,
    Unknown,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Dimension => "dimension",
            ValueKind::Length => "length",
            ValueKind::Angle => "angle",
            ValueKind::Time => "time",
            ValueKind::Frequency => "frequency",
            ValueKind::Resolution => "resolution",
            ValueKind::Percentage => "percentage",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Color => "color",
            ValueKind::Uri => "uri",
            ValueKind::String => "string",
            ValueKind::Identifier => "identifier",
            ValueKind::Operator => "operator",
            ValueKind::Unknown => "unknown",
        }
    }
}

/// One term (or operator) of a property value, classified from its text
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValuePart {
    pub text: String,
    pub kind: ValueKind,
    /// Numeric value of numbers, percentages and dimensions
    pub value: Option<f64>,
    /// Unit of dimensions
    pub units: Option<String>,
    pub rgb: Option<(u8, u8, u8)>,
    /// Address inside `url(...)`
    pub uri: Option<String>,
    /// Contents of a quoted string
    pub string: Option<String>,
    pub position: Position,
}

impl PropertyValuePart {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        let mut part = Self {
            text: text.into(),
            kind: ValueKind::Unknown,
            value: None,
            units: None,
            rgb: None,
            uri: None,
            string: None,
            position,
        };
        part.classify();
        part
    }

    /// Whether this is a number-like term equal to zero
    pub fn is_zero(&self) -> bool {
        self.value == Some(0.0)
    }

    fn classify(&mut self) {
        let text = self.text.clone();

        if let Some((number, rest)) = split_number(&text) {
            if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphabetic()) {
                self.kind = dimension_kind(rest);
                self.value = number.parse().ok();
                self.units = Some(rest.to_string());
                return;
            }
            if rest == "%" {
                self.kind = ValueKind::Percentage;
                self.value = number.parse().ok();
                return;
            }
            if rest.is_empty() {
                self.kind = if number.contains('.') { ValueKind::Number } else { ValueKind::Integer };
                self.value = number.parse().ok();
                return;
            }
        }

        if let Some(digits) = text.strip_prefix('#') {
            let hex: String = digits.chars().take_while(char::is_ascii_hexdigit).take(6).collect();
            if hex.len() >= 3 {
                self.kind = ValueKind::Color;
                self.rgb = hex_to_rgb(&hex);
                return;
            }
        }

        if let Some(rgb) = parse_rgb_function(&text) {
            self.kind = ValueKind::Color;
            self.rgb = Some(rgb);
            return;
        }

        if let Some(uri) = parse_url(&text) {
            self.kind = ValueKind::Uri;
            self.uri = Some(uri);
            return;
        }

        if let Some(string) = parse_string(&text) {
            self.kind = ValueKind::String;
            self.string = Some(string);
            return;
        }

        if let Some(hex) = named_color(&text) {
            self.kind = ValueKind::Color;
            self.rgb = hex_to_rgb(hex);
            return;
        }

        self.kind = if text == "," || text == "/" {
            ValueKind::Operator
        } else if is_identifier(&text) {
            ValueKind::Identifier
        } else {
            ValueKind::Unknown
        };
    }
}

/// A media query such as `only screen and (min-width: 10em)`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    /// `only` or `not`
    pub modifier: Option<String>,
    pub media_type: Option<String>,
    pub features: Vec<MediaFeature>,
    pub text: String,
    pub position: Position,
}

impl MediaQuery {
    pub fn new(
        modifier: Option<String>,
        media_type: Option<String>,
        features: Vec<MediaFeature>,
        position: Position,
    ) -> Self {
        let mut text = [modifier.as_deref(), media_type.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !features.is_empty() {
            if !text.is_empty() {
                text.push_str(" and ");
            }
            let features_text = features.iter().map(|f| f.text.as_str()).collect::<Vec<_>>();
            text.push_str(&features_text.join(" and "));
        }
        Self {
            modifier,
            media_type,
            features,
            text,
            position,
        }
    }
}

/// A parenthesized media feature such as `(min-width: 10em)`
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFeature {
    pub name: TextUnit,
    pub value: Option<Box<SyntaxUnit>>,
    pub text: String,
    pub position: Position,
}

impl MediaFeature {
    pub fn new(name: TextUnit, value: Option<SyntaxUnit>) -> Self {
        let text = match &value {
            Some(value) => format!("({}:{})", name.text, value.text()),
            None => format!("({})", name.text),
        };
        Self {
            position: name.position,
            name,
            value: value.map(Box::new),
            text,
        }
    }
}

macro_rules! display_text {
    ($($unit:ty),* $(,)?) => {
        $(
            impl fmt::Display for $unit {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.text)
                }
            }
        )*
    };
}

display_text!(
    TextUnit,
    Selector,
    SelectorPart,
    SelectorSubPart,
    Combinator,
    PropertyName,
    PropertyValue,
    PropertyValuePart,
    MediaQuery,
    MediaFeature,
);

impl fmt::Display for SyntaxUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<TextUnit> for SyntaxUnit {
    fn from(unit: TextUnit) -> Self {
        SyntaxUnit::Text(unit)
    }
}

impl From<Selector> for SyntaxUnit {
    fn from(unit: Selector) -> Self {
        SyntaxUnit::Selector(unit)
    }
}

impl From<PropertyValue> for SyntaxUnit {
    fn from(unit: PropertyValue) -> Self {
        SyntaxUnit::PropertyValue(unit)
    }
}

impl From<MediaQuery> for SyntaxUnit {
    fn from(unit: MediaQuery) -> Self {
        SyntaxUnit::MediaQuery(unit)
    }
}

/// Split a leading signed `[0-9.]+` run off `text`
fn split_number(text: &str) -> Option<(&str, &str)> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let sign_len = text.len() - unsigned.len();
    let digits = unsigned.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    Some(text.split_at(sign_len + digits))
}

fn dimension_kind(unit: &str) -> ValueKind {
    match unit_kind(unit) {
        TokenKind::Length => ValueKind::Length,
        TokenKind::Angle => ValueKind::Angle,
        TokenKind::Time => ValueKind::Time,
        TokenKind::Freq => ValueKind::Frequency,
        TokenKind::Resolution => ValueKind::Resolution,
        _ => ValueKind::Dimension,
    }
}

/// `rgb(r, g, b)` with integer or percentage channels
fn parse_rgb_function(text: &str) -> Option<(u8, u8, u8)> {
    let prefix = text.get(..4)?;
    if !prefix.eq_ignore_ascii_case("rgb(") {
        return None;
    }
    let inner = text[4..].strip_suffix(')')?;
    let channels: Vec<&str> = inner.split(',').map(str::trim).collect();
    if channels.len() != 3 {
        return None;
    }

    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let to_u8 = |v: f64| v.round().clamp(0.0, 255.0) as u8;

    if channels.iter().all(|c| is_digits(c)) {
        let mut values = channels.iter().map(|c| c.parse::<f64>().ok().map(to_u8));
        return Some((values.next()??, values.next()??, values.next()??));
    }

    let percents: Vec<&str> = channels.iter().filter_map(|c| c.strip_suffix('%')).collect();
    if percents.len() == 3 && percents.iter().all(|p| is_digits(p)) {
        let mut values = percents
            .iter()
            .map(|p| p.parse::<f64>().ok().map(|v| to_u8(v * 255.0 / 100.0)));
        return Some((values.next()??, values.next()??, values.next()??));
    }
    None
}

/// The address inside `url(...)`, with optional quotes removed
fn parse_url(text: &str) -> Option<String> {
    let prefix = text.get(..4)?;
    if !prefix.eq_ignore_ascii_case("url(") {
        return None;
    }
    let rest = &text[4..];
    let rest = rest.strip_prefix(['"', '\'']).unwrap_or(rest);
    let end = rest.find([')', '"', '\''])?;
    if end == 0 {
        return None;
    }
    let tail = &rest[end..];
    let tail = tail.strip_prefix(['"', '\'']).unwrap_or(tail);
    if !tail.starts_with(')') {
        return None;
    }
    Some(rest[..end].to_string())
}

/// The contents of a quoted string, with backslash escapes resolved
fn parse_string(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if text.len() < 2 || !text.ends_with(quote) {
        return None;
    }

    let inner = &text[1..text.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            value.extend(chars.next());
        } else {
            value.push(c);
        }
    }
    Some(value)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let start_ok = first.is_ascii_alphabetic() || first == '-' || first >= '\u{80}';
    start_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c >= '\u{80}')
}
