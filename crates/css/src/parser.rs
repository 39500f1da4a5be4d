//! Stylesheet Parser
//!
//! Recursive-descent parser over a [`TokenStream`]. Productions return
//! `Ok(None)` (or `Ok(false)`) when they do not apply at the current position
//! and `Err` when input they own is malformed. Nothing is kept once a
//! production completes: results are handed to listeners as [`ParserEvent`]s.
//!
//! Syntax errors are recovered from at two places. Top-level items and whole
//! rulesets resynchronize on `}`; declarations inside a block resynchronize
//! on `;` or `}`. In strict mode every syntax error is returned instead.

use log::{debug, warn};
use smallvec::SmallVec;

use crate::error::{ParseError, ParseResult, Position};
use crate::events::{EventKind, EventTarget, ListenerId, ParserEvent};
use crate::stream::TokenStream;
use crate::syntax::{
    Combinator, MediaFeature, MediaQuery, PropertyName, PropertyValue, PropertyValuePart, Selector,
    SelectorComponent, SelectorPart, SelectorSubPart, SubPartKind, TextUnit,
};
use crate::token::{Channel, Token, TokenKind, MARGIN_SYMS};
use crate::tokenizer::Tokenizer;

/// Token types that form a value term on their own
const TERM_TOKENS: [TokenKind; 12] = [
    TokenKind::Number,
    TokenKind::Percentage,
    TokenKind::Length,
    TokenKind::Angle,
    TokenKind::Time,
    TokenKind::Freq,
    TokenKind::Resolution,
    TokenKind::Dimension,
    TokenKind::String,
    TokenKind::Ident,
    TokenKind::Uri,
    TokenKind::UnicodeRange,
];

/// Token types allowed in a functional pseudo-class or media feature value
const EXPRESSION_TOKENS: [TokenKind; 12] = [
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Slash,
    TokenKind::Dimension,
    TokenKind::Number,
    TokenKind::String,
    TokenKind::Ident,
    TokenKind::Length,
    TokenKind::Freq,
    TokenKind::Angle,
    TokenKind::Time,
    TokenKind::Resolution,
];

const ATTRIBUTE_OPERATORS: [TokenKind; 6] = [
    TokenKind::Prefixmatch,
    TokenKind::Suffixmatch,
    TokenKind::Substringmatch,
    TokenKind::Equals,
    TokenKind::Includes,
    TokenKind::Dashmatch,
];

/// Parser configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Accept `*property` (IE6/7 star hack)
    pub star_hack: bool,
    /// Treat a leading `_` on a property as the IE6 underscore hack
    pub underscore_hack: bool,
    /// Accept IE `progid:` and `alpha(opacity=..)` filter values
    pub ie_filters: bool,
    /// Return syntax errors instead of recovering from them
    pub strict: bool,
}

impl ParserOptions {
    /// Recovering parser that accepts the common IE hacks
    pub fn lenient() -> Self {
        Self {
            star_hack: true,
            underscore_hack: true,
            ie_filters: true,
            strict: false,
        }
    }
}

/// Which top-level at-rules are still allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Charset,
    Imports,
    Namespaces,
    Body,
}

/// Deepest function nesting accepted inside a value
pub const MAX_NESTING: usize = 128;

/// Event-driven stylesheet parser
pub struct Parser {
    options: ParserOptions,
    target: EventTarget,
    stream: TokenStream<Tokenizer>,
    /// Functions currently open in the value being parsed
    depth: usize,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            target: EventTarget::new(),
            stream: TokenStream::new(Tokenizer::new("")),
            depth: 0,
        }
    }

    /// Register a listener; listeners for the same kind fire in registration order
    pub fn add_listener(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&ParserEvent) + 'static,
    ) -> ListenerId {
        self.target.add(kind, listener)
    }

    pub fn remove_listener(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.target.remove(kind, id)
    }

    // ---------------------------------------------------------------------
    // Entry points
    // ---------------------------------------------------------------------

    /// Parse a whole stylesheet, firing events as constructs complete
    pub fn parse(&mut self, input: &str) -> ParseResult<()> {
        debug!("parsing stylesheet ({} bytes)", input.len());
        self.reset(input);
        self.stylesheet()
    }

    /// Parse a single selector such as `ul > li:first-child`
    pub fn parse_selector(&mut self, input: &str) -> ParseResult<Option<Selector>> {
        self.reset(input);
        self.read_whitespace()?;
        let selector = self.selector()?;
        self.verify_end()?;
        Ok(selector)
    }

    /// Parse a property value (everything after the colon)
    pub fn parse_property_value(&mut self, input: &str) -> ParseResult<Option<PropertyValue>> {
        self.reset(input);
        self.read_whitespace()?;
        let value = self.expr()?;
        self.verify_end()?;
        Ok(value)
    }

    /// Parse a single ruleset, firing the same events as inside a stylesheet
    pub fn parse_rule(&mut self, input: &str) -> ParseResult<bool> {
        self.reset(input);
        self.read_whitespace()?;
        let parsed = self.ruleset()?;
        self.verify_end()?;
        Ok(parsed)
    }

    /// Parse a single media query such as `only screen and (color)`
    pub fn parse_media_query(&mut self, input: &str) -> ParseResult<Option<MediaQuery>> {
        self.reset(input);
        self.read_whitespace()?;
        let query = self.media_query()?;
        self.verify_end()?;
        Ok(query)
    }

    fn reset(&mut self, input: &str) {
        self.stream = TokenStream::new(Tokenizer::new(input));
        self.depth = 0;
    }

    fn verify_end(&mut self) -> ParseResult<()> {
        if self.stream.la(1)? != TokenKind::Eof {
            return Err(self.unexpected_next());
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn fire(&mut self, event: ParserEvent) {
        self.target.fire(&event);
    }

    /// Report a syntax error and continue, unless strict or not recoverable
    fn recover(&mut self, error: ParseError) -> ParseResult<()> {
        if !error.is_syntax() || self.options.strict {
            return Err(error);
        }
        let position = error.position().unwrap_or_default();
        self.fire(ParserEvent::Error { error, position });
        Ok(())
    }

    /// Fail when the cursor is still at `before` after a recovered error
    fn ensure_progress(&mut self, before: usize) -> ParseResult<()> {
        if self.stream.cursor() == before {
            let position = self.next_position()?;
            return Err(ParseError::NoProgress { position });
        }
        Ok(())
    }

    /// Error for the next token, whatever it is
    fn unexpected_next(&mut self) -> ParseError {
        match self.stream.lt(1) {
            Ok(token) => ParseError::unexpected(&token),
            Err(error) => error,
        }
    }

    fn next_position(&mut self) -> ParseResult<Position> {
        Ok(self.stream.lt(1)?.start)
    }

    /// Consume whitespace tokens and return their text
    fn read_whitespace(&mut self) -> ParseResult<String> {
        let mut whitespace = String::new();
        while self.stream.match_on(&[TokenKind::S], Some(Channel::Whitespace))? {
            whitespace.push_str(&self.stream.current()?.value);
        }
        Ok(whitespace)
    }

    /// Skip whitespace and HTML comment markers between top-level items
    fn skip_cruft(&mut self) -> ParseResult<()> {
        while self.stream.match_on(
            &[TokenKind::S, TokenKind::Cdo, TokenKind::Cdc],
            Some(Channel::Whitespace),
        )? {}
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Stylesheet structure
    // ---------------------------------------------------------------------

    fn stylesheet(&mut self) -> ParseResult<()> {
        self.fire(ParserEvent::StartStylesheet);

        let mut section = Section::Charset;
        loop {
            self.skip_cruft()?;
            let kind = self.stream.peek()?;
            if kind == TokenKind::Eof {
                break;
            }

            let before = self.stream.cursor();
            if let Err(error) = self.top_level_item(kind, &mut section) {
                self.recover(error)?;
                self.ensure_progress(before)?;
            }
        }

        self.fire(ParserEvent::EndStylesheet);
        Ok(())
    }

    fn top_level_item(&mut self, kind: TokenKind, section: &mut Section) -> ParseResult<()> {
        match kind {
            TokenKind::CharsetSym | TokenKind::ImportSym | TokenKind::NamespaceSym => {
                self.prologue_rule(kind, section)
            }
            TokenKind::MediaSym => {
                *section = Section::Body;
                self.media()
            }
            TokenKind::PageSym => {
                *section = Section::Body;
                self.page()
            }
            TokenKind::FontFaceSym => {
                *section = Section::Body;
                self.font_face()
            }
            TokenKind::KeyframesSym => {
                *section = Section::Body;
                self.keyframes()
            }
            _ => {
                *section = Section::Body;
                if self.ruleset()? {
                    return Ok(());
                }
                self.stream.get()?;
                Err(ParseError::unexpected(&self.stream.current()?))
            }
        }
    }

    /// `@charset`, `@import` and `@namespace` must come before everything
    /// else, in that order. A misplaced one is parsed but not reported.
    fn prologue_rule(&mut self, kind: TokenKind, section: &mut Section) -> ParseResult<()> {
        let position = self.next_position()?;
        let (allowed_in, next) = match kind {
            TokenKind::CharsetSym => (Section::Charset, Section::Imports),
            TokenKind::ImportSym => (Section::Imports, Section::Imports),
            _ => (Section::Namespaces, Section::Namespaces),
        };

        let emit = *section <= allowed_in;
        match kind {
            TokenKind::CharsetSym => self.charset(emit)?,
            TokenKind::ImportSym => self.import(emit)?,
            _ => self.namespace(emit)?,
        }

        if !emit {
            return Err(ParseError::not_allowed(kind, position));
        }
        *section = next;
        Ok(())
    }

    fn charset(&mut self, emit: bool) -> ParseResult<()> {
        let position = self.stream.must_match(&[TokenKind::CharsetSym])?.start;
        let charset = self.stream.must_match(&[TokenKind::String])?;
        self.stream.must_match(&[TokenKind::Semicolon])?;

        if emit {
            self.fire(ParserEvent::Charset {
                charset: unquote(&charset.value).to_string(),
                position,
            });
        }
        Ok(())
    }

    fn import(&mut self, emit: bool) -> ParseResult<()> {
        let position = self.stream.must_match(&[TokenKind::ImportSym])?.start;
        let target = self.stream.must_match(&[TokenKind::String, TokenKind::Uri])?;
        let media = self.media_query_list()?;
        self.stream.must_match(&[TokenKind::Semicolon])?;

        if emit {
            self.fire(ParserEvent::Import {
                uri: import_uri(&target.value),
                media,
                position,
            });
        }
        Ok(())
    }

    fn namespace(&mut self, emit: bool) -> ParseResult<()> {
        let position = self.stream.must_match(&[TokenKind::NamespaceSym])?.start;
        let prefix = if self.stream.match_any(&[TokenKind::Ident])? {
            Some(self.stream.current()?.value)
        } else {
            None
        };
        let target = self.stream.must_match(&[TokenKind::String, TokenKind::Uri])?;
        self.stream.must_match(&[TokenKind::Semicolon])?;

        if emit {
            self.fire(ParserEvent::Namespace {
                prefix,
                uri: import_uri(&target.value),
                position,
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Media queries
    // ---------------------------------------------------------------------

    fn media(&mut self) -> ParseResult<()> {
        let position = self.stream.must_match(&[TokenKind::MediaSym])?.start;
        let media = self.media_query_list()?;
        self.stream.must_match(&[TokenKind::Lbrace])?;

        self.fire(ParserEvent::StartMedia { media: media.clone(), position });

        loop {
            if self.stream.peek()? == TokenKind::PageSym {
                self.page()?;
            } else if !self.ruleset()? {
                break;
            }
        }

        self.stream.must_match(&[TokenKind::Rbrace])?;
        self.fire(ParserEvent::EndMedia { media, position });
        Ok(())
    }

    fn media_query_list(&mut self) -> ParseResult<Vec<MediaQuery>> {
        let mut list = Vec::new();
        if matches!(self.stream.peek()?, TokenKind::Ident | TokenKind::Lparen) {
            list.extend(self.media_query()?);
        }
        while self.stream.match_any(&[TokenKind::Comma])? {
            match self.media_query()? {
                Some(query) => list.push(query),
                None => return Err(self.unexpected_next()),
            }
        }
        Ok(list)
    }

    fn media_query(&mut self) -> ParseResult<Option<MediaQuery>> {
        let mut modifier = None;
        let mut position = None;

        if self.stream.match_any(&[TokenKind::Ident])? {
            let token = self.stream.current()?;
            let ident = token.value.to_ascii_lowercase();
            if ident == "only" || ident == "not" {
                modifier = Some(ident);
                position = Some(token.start);
            } else {
                self.stream.unget()?;
            }
        }

        let mut media_type = None;
        let mut features = Vec::new();
        match self.stream.peek()? {
            TokenKind::Ident => {
                let token = self.stream.must_match(&[TokenKind::Ident])?;
                position.get_or_insert(token.start);
                media_type = Some(token.value);
            }
            TokenKind::Lparen => {
                position.get_or_insert(self.next_position()?);
                features.push(self.media_expression()?);
            }
            _ => {}
        }

        let Some(position) = position.filter(|_| media_type.is_some() || !features.is_empty()) else {
            if modifier.is_some() {
                return Err(self.unexpected_next());
            }
            return Ok(None);
        };

        while self.stream.match_any(&[TokenKind::Ident])? {
            let token = self.stream.current()?;
            if !token.value.eq_ignore_ascii_case("and") {
                return Err(ParseError::unexpected(&token));
            }
            features.push(self.media_expression()?);
        }

        Ok(Some(MediaQuery::new(modifier, media_type, features, position)))
    }

    /// `( feature [: value] )`
    fn media_expression(&mut self) -> ParseResult<MediaFeature> {
        self.stream.must_match(&[TokenKind::Lparen])?;
        let feature = self.stream.must_match(&[TokenKind::Ident])?;
        let name = TextUnit::new(feature.value, feature.start);

        let mut value = None;
        if self.stream.match_any(&[TokenKind::Colon])? {
            let position = self.next_position()?;
            value = self.expression()?.map(|text| TextUnit::new(text, position).into());
        }

        self.stream.must_match(&[TokenKind::Rparen])?;
        Ok(MediaFeature::new(name, value))
    }

    // ---------------------------------------------------------------------
    // Paged media, fonts
    // ---------------------------------------------------------------------

    fn page(&mut self) -> ParseResult<()> {
        let position = self.stream.must_match(&[TokenKind::PageSym])?.start;

        let mut id = None;
        if self.stream.match_any(&[TokenKind::Ident])? {
            let token = self.stream.current()?;
            // `auto` is reserved and cannot name a page
            if token.value.eq_ignore_ascii_case("auto") {
                return Err(ParseError::unexpected(&token));
            }
            id = Some(token.value);
        }

        let pseudo = if self.stream.peek()? == TokenKind::Colon {
            Some(self.pseudo_page()?)
        } else {
            None
        };

        self.fire(ParserEvent::StartPage {
            id: id.clone(),
            pseudo: pseudo.clone(),
            position,
        });
        self.read_declarations(true, true)?;
        self.fire(ParserEvent::EndPage { id, pseudo, position });
        Ok(())
    }

    fn pseudo_page(&mut self) -> ParseResult<String> {
        self.stream.must_match(&[TokenKind::Colon])?;
        Ok(self.stream.must_match(&[TokenKind::Ident])?.value)
    }

    /// A margin box inside `@page`, such as `@top-left { ... }`
    fn margin(&mut self) -> ParseResult<bool> {
        if !self.stream.match_any(&MARGIN_SYMS)? {
            return Ok(false);
        }
        let token = self.stream.current()?;
        let position = token.start;
        let margin = TextUnit::new(token.value, position);

        self.fire(ParserEvent::StartPageMargin { margin: margin.clone(), position });
        self.read_declarations(true, false)?;
        self.fire(ParserEvent::EndPageMargin { margin, position });
        Ok(true)
    }

    fn font_face(&mut self) -> ParseResult<()> {
        let position = self.stream.must_match(&[TokenKind::FontFaceSym])?.start;

        self.fire(ParserEvent::StartFontFace { position });
        self.read_declarations(true, false)?;
        self.fire(ParserEvent::EndFontFace { position });
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Rulesets and selectors
    // ---------------------------------------------------------------------

    /// A selector group and its declaration block. A malformed selector
    /// group discards the whole ruleset up to the next `}`.
    fn ruleset(&mut self) -> ParseResult<bool> {
        let selectors = match self.ruleset_prelude() {
            Ok(Some(selectors)) => selectors,
            Ok(None) => return Ok(false),
            Err(error) => {
                self.recover(error)?;
                if self.stream.advance(&[TokenKind::Rbrace])? != TokenKind::Rbrace {
                    warn!("reached end of input while skipping a malformed rule");
                }
                return Ok(true);
            }
        };

        let position = selectors[0].position;
        self.fire(ParserEvent::StartRule {
            selectors: selectors.clone(),
            position,
        });
        self.read_declarations(false, false)?;
        self.fire(ParserEvent::EndRule { selectors, position });
        Ok(true)
    }

    fn ruleset_prelude(&mut self) -> ParseResult<Option<Vec<Selector>>> {
        let Some(selectors) = self.selectors_group()? else {
            return Ok(None);
        };
        self.stream.must_match(&[TokenKind::Lbrace])?;
        Ok(Some(selectors))
    }

    fn selectors_group(&mut self) -> ParseResult<Option<Vec<Selector>>> {
        let Some(first) = self.selector()? else {
            return Ok(None);
        };

        let mut selectors = vec![first];
        while self.stream.match_any(&[TokenKind::Comma])? {
            self.read_whitespace()?;
            match self.selector()? {
                Some(selector) => selectors.push(selector),
                None => return Err(self.unexpected_next()),
            }
        }
        Ok(Some(selectors))
    }

    fn selector(&mut self) -> ParseResult<Option<Selector>> {
        let Some(first) = self.simple_selector_sequence()? else {
            return Ok(None);
        };
        let position = first.position;
        let mut parts = vec![SelectorComponent::Part(first)];

        loop {
            if let Some(combinator) = self.combinator()? {
                match self.simple_selector_sequence()? {
                    Some(next) => {
                        parts.push(SelectorComponent::Combinator(combinator));
                        parts.push(SelectorComponent::Part(next));
                    }
                    None => return Err(self.unexpected_next()),
                }
                continue;
            }

            // Whitespace is a descendant combinator unless an explicit one follows
            if !self.stream.match_on(&[TokenKind::S], Some(Channel::Whitespace))? {
                break;
            }
            let space = self.stream.current()?;
            self.read_whitespace()?;

            let combinator = self.combinator()?;
            match self.simple_selector_sequence()? {
                Some(next) => {
                    let combinator =
                        combinator.unwrap_or_else(|| Combinator::new(space.value, space.start));
                    parts.push(SelectorComponent::Combinator(combinator));
                    parts.push(SelectorComponent::Part(next));
                }
                None if combinator.is_some() => return Err(self.unexpected_next()),
                None => break,
            }
        }

        Ok(Some(Selector::new(parts, position)))
    }

    fn combinator(&mut self) -> ParseResult<Option<Combinator>> {
        if !self
            .stream
            .match_any(&[TokenKind::Plus, TokenKind::Greater, TokenKind::Tilde])?
        {
            return Ok(None);
        }
        let token = self.stream.current()?;
        self.read_whitespace()?;
        Ok(Some(Combinator::new(token.value, token.start)))
    }

    fn simple_selector_sequence(&mut self) -> ParseResult<Option<SelectorPart>> {
        let position = self.next_position()?;

        let element_name = match self.type_selector()? {
            Some(name) => Some(name),
            None => self.universal()?,
        };

        let mut text = element_name.clone().unwrap_or_default();
        let mut modifiers: SmallVec<[SelectorSubPart; 4]> = SmallVec::new();
        loop {
            if self.stream.peek_on(Some(Channel::Whitespace))? == TokenKind::S {
                break;
            }
            let Some(modifier) = self.selector_modifier()? else {
                break;
            };
            text.push_str(&modifier.text);
            modifiers.push(modifier);
        }

        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(SelectorPart::new(element_name, modifiers, text, position)))
    }

    fn selector_modifier(&mut self) -> ParseResult<Option<SelectorSubPart>> {
        if let Some(id) = self.hash_selector()? {
            return Ok(Some(id));
        }
        if let Some(class) = self.class()? {
            return Ok(Some(class));
        }
        if let Some(attribute) = self.attrib()? {
            return Ok(Some(attribute));
        }
        if let Some(pseudo) = self.pseudo()? {
            return Ok(Some(pseudo));
        }
        self.negation()
    }

    fn type_selector(&mut self) -> ParseResult<Option<String>> {
        let namespace = self.namespace_prefix()?;
        if self.stream.match_any(&[TokenKind::Ident])? {
            let name = self.stream.current()?.value;
            return Ok(Some(format!("{}{}", namespace.unwrap_or_default(), name)));
        }

        // Give the prefix back so `universal` can read it
        if let Some(namespace) = namespace {
            self.stream.unget()?;
            if namespace.len() > 1 {
                self.stream.unget()?;
            }
        }
        Ok(None)
    }

    /// `[IDENT | '*']? '|'`
    fn namespace_prefix(&mut self) -> ParseResult<Option<String>> {
        let first = self.stream.la(1)?;
        let prefixed = first == TokenKind::Pipe
            || (matches!(first, TokenKind::Ident | TokenKind::Star)
                && self.stream.la(2)? == TokenKind::Pipe);
        if !prefixed {
            return Ok(None);
        }

        let mut prefix = String::new();
        if self.stream.match_any(&[TokenKind::Ident, TokenKind::Star])? {
            prefix.push_str(&self.stream.current()?.value);
        }
        self.stream.must_match(&[TokenKind::Pipe])?;
        prefix.push('|');
        Ok(Some(prefix))
    }

    fn universal(&mut self) -> ParseResult<Option<String>> {
        let mut value = self.namespace_prefix()?.unwrap_or_default();
        if self.stream.match_any(&[TokenKind::Star])? {
            value.push('*');
        }
        Ok((!value.is_empty()).then_some(value))
    }

    fn hash_selector(&mut self) -> ParseResult<Option<SelectorSubPart>> {
        if !self.stream.match_any(&[TokenKind::Hash])? {
            return Ok(None);
        }
        let token = self.stream.current()?;
        Ok(Some(SelectorSubPart::new(token.value, SubPartKind::Id, token.start)))
    }

    fn class(&mut self) -> ParseResult<Option<SelectorSubPart>> {
        if !self.stream.match_any(&[TokenKind::Dot])? {
            return Ok(None);
        }
        let position = self.stream.current()?.start;
        let name = self.stream.must_match(&[TokenKind::Ident])?;
        Ok(Some(SelectorSubPart::new(
            format!(".{}", name.value),
            SubPartKind::Class,
            position,
        )))
    }

    fn attrib(&mut self) -> ParseResult<Option<SelectorSubPart>> {
        if !self.stream.match_any(&[TokenKind::Lbracket])? {
            return Ok(None);
        }
        let open = self.stream.current()?;
        let mut text = open.value;
        text.push_str(&self.read_whitespace()?);

        if let Some(namespace) = self.namespace_prefix()? {
            text.push_str(&namespace);
        }
        text.push_str(&self.stream.must_match(&[TokenKind::Ident])?.value);
        text.push_str(&self.read_whitespace()?);

        if self.stream.match_any(&ATTRIBUTE_OPERATORS)? {
            text.push_str(&self.stream.current()?.value);
            text.push_str(&self.read_whitespace()?);
            text.push_str(&self.stream.must_match(&[TokenKind::Ident, TokenKind::String])?.value);
            text.push_str(&self.read_whitespace()?);
        }

        self.stream.must_match(&[TokenKind::Rbracket])?;
        text.push(']');
        Ok(Some(SelectorSubPart::new(text, SubPartKind::Attribute, open.start)))
    }

    fn pseudo(&mut self) -> ParseResult<Option<SelectorSubPart>> {
        if !self.stream.match_any(&[TokenKind::Colon])? {
            return Ok(None);
        }
        let position = self.stream.current()?.start;
        let mut text = String::from(":");
        if self.stream.match_any(&[TokenKind::Colon])? {
            text.push(':');
        }

        if self.stream.match_any(&[TokenKind::Ident])? {
            text.push_str(&self.stream.current()?.value);
        } else if self.stream.peek()? == TokenKind::Function {
            text.push_str(&self.functional_pseudo()?);
        } else {
            return Err(self.unexpected_next());
        }

        Ok(Some(SelectorSubPart::new(text, SubPartKind::Pseudo, position)))
    }

    fn functional_pseudo(&mut self) -> ParseResult<String> {
        let mut text = self.stream.must_match(&[TokenKind::Function])?.value;
        text.push_str(&self.read_whitespace()?);
        text.push_str(&self.expression()?.unwrap_or_default());
        self.stream.must_match(&[TokenKind::Rparen])?;
        text.push(')');
        Ok(text)
    }

    /// Argument text of a functional pseudo-class or media feature value
    fn expression(&mut self) -> ParseResult<Option<String>> {
        let mut text = String::new();
        while self.stream.match_any(&EXPRESSION_TOKENS)? {
            text.push_str(&self.stream.current()?.value);
            text.push_str(&self.read_whitespace()?);
        }
        let text = text.trim_end();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    fn negation(&mut self) -> ParseResult<Option<SelectorSubPart>> {
        if !self.stream.match_any(&[TokenKind::Not])? {
            return Ok(None);
        }
        let token = self.stream.current()?;
        let mut text = token.value;
        text.push_str(&self.read_whitespace()?);

        let arg = self.negation_arg()?;
        text.push_str(&arg.text);
        text.push_str(&self.read_whitespace()?);

        self.stream.must_match(&[TokenKind::Rparen])?;
        text.push(')');
        Ok(Some(SelectorSubPart::negation(text, arg, token.start)))
    }

    fn negation_arg(&mut self) -> ParseResult<SelectorPart> {
        let position = self.next_position()?;

        let element = match self.type_selector()? {
            Some(name) => Some(name),
            None => self.universal()?,
        };
        if let Some(name) = element {
            return Ok(SelectorPart::new(Some(name.clone()), SmallVec::new(), name, position));
        }

        let modifier = match self.hash_selector()? {
            Some(id) => Some(id),
            None => match self.class()? {
                Some(class) => Some(class),
                None => match self.attrib()? {
                    Some(attribute) => Some(attribute),
                    None => self.pseudo()?,
                },
            },
        };
        match modifier {
            Some(modifier) => {
                let text = modifier.text.clone();
                let mut modifiers = SmallVec::new();
                modifiers.push(modifier);
                Ok(SelectorPart::new(None, modifiers, text, position))
            }
            None => Err(self.unexpected_next()),
        }
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    /// Read a `{ declaration; ... }` block, recovering at `;` and `}`
    fn read_declarations(&mut self, check_start: bool, read_margins: bool) -> ParseResult<()> {
        let mut check_start = check_start;
        loop {
            let Err(error) = self.declaration_list(check_start, read_margins) else {
                return Ok(());
            };
            self.recover(error)?;

            match self.stream.advance(&[TokenKind::Semicolon, TokenKind::Rbrace])? {
                TokenKind::Semicolon => check_start = false,
                TokenKind::Rbrace => return Ok(()),
                _ => {
                    warn!("reached end of input inside a declaration block");
                    return Ok(());
                }
            }
        }
    }

    fn declaration_list(&mut self, check_start: bool, read_margins: bool) -> ParseResult<()> {
        if check_start {
            self.stream.must_match(&[TokenKind::Lbrace])?;
        }

        loop {
            if read_margins && self.margin()? {
                continue;
            }
            // Empty declarations between semicolons are allowed
            self.declaration()?;
            if !self.stream.match_any(&[TokenKind::Semicolon])? {
                break;
            }
        }

        self.stream.must_match(&[TokenKind::Rbrace])?;
        Ok(())
    }

    fn declaration(&mut self) -> ParseResult<bool> {
        let Some(property) = self.property()? else {
            return Ok(false);
        };

        self.stream.must_match(&[TokenKind::Colon])?;
        let Some(value) = self.expr()? else {
            return Err(self.unexpected_next());
        };
        let important = self.stream.match_any(&[TokenKind::ImportantSym])?;

        let position = property.position;
        self.fire(ParserEvent::Property {
            property,
            value,
            important,
            position,
        });
        Ok(true)
    }

    fn property(&mut self) -> ParseResult<Option<PropertyName>> {
        let mut hack = None;
        let mut hack_position = None;
        if self.options.star_hack && self.stream.peek()? == TokenKind::Star {
            self.stream.get()?;
            hack = Some('*');
            hack_position = Some(self.stream.current()?.start);
        }

        if !self.stream.match_any(&[TokenKind::Ident])? {
            if hack.is_some() {
                return Err(self.unexpected_next());
            }
            return Ok(None);
        }

        let token = self.stream.current()?;
        let mut name = token.value.as_str();
        if self.options.underscore_hack {
            if let Some(stripped) = name.strip_prefix('_') {
                hack = Some('_');
                name = stripped;
            }
        }
        Ok(Some(PropertyName::new(name, hack, hack_position.unwrap_or(token.start))))
    }

    /// `term [operator? term]*`
    fn expr(&mut self) -> ParseResult<Option<PropertyValue>> {
        let Some(first) = self.term()? else {
            return Ok(None);
        };
        let position = first.position;
        let mut parts = vec![first];

        loop {
            if let Some(operator) = self.operator()? {
                parts.push(operator);
            }
            match self.term()? {
                Some(term) => parts.push(term),
                None => break,
            }
        }

        Ok(Some(PropertyValue::new(parts, position)))
    }

    fn operator(&mut self) -> ParseResult<Option<PropertyValuePart>> {
        if !self.stream.match_any(&[TokenKind::Slash, TokenKind::Comma])? {
            return Ok(None);
        }
        let token = self.stream.current()?;
        Ok(Some(PropertyValuePart::new(token.value, token.start)))
    }

    fn term(&mut self) -> ParseResult<Option<PropertyValuePart>> {
        let unary = if self.stream.match_any(&[TokenKind::Minus, TokenKind::Plus])? {
            Some(self.stream.current()?)
        } else {
            None
        };
        let position = match &unary {
            Some(token) => token.start,
            None => self.next_position()?,
        };

        let text = if self.options.ie_filters && self.stream.peek()? == TokenKind::IeFunction {
            self.ie_function()?
        } else if self.stream.match_any(&TERM_TOKENS)? {
            Some(self.stream.current()?.value)
        } else if let Some(color) = self.hexcolor()? {
            Some(color.value)
        } else if self.options.ie_filters && self.stream.la(3)? == TokenKind::Equals {
            self.ie_function()?
        } else {
            self.function()?
        };

        match (text, unary) {
            (Some(text), Some(sign)) => Ok(Some(PropertyValuePart::new(
                format!("{}{}", sign.value, text),
                position,
            ))),
            (Some(text), None) => Ok(Some(PropertyValuePart::new(text, position))),
            (None, Some(_)) => Err(self.unexpected_next()),
            (None, None) => Ok(None),
        }
    }

    fn hexcolor(&mut self) -> ParseResult<Option<Token>> {
        if !self.stream.match_any(&[TokenKind::Hash])? {
            return Ok(None);
        }
        let token = self.stream.current()?;
        let digits = token.value[1..].chars().take_while(char::is_ascii_hexdigit).count();
        if digits < 3 {
            return Err(ParseError::syntax(
                format!("Expected a hex color but found '{}' at {}.", token.value, token.start),
                token.start,
            ));
        }
        Ok(Some(token))
    }

    /// `FUNCTION expr ')'`; a missing `)` is tolerated
    fn function(&mut self) -> ParseResult<Option<String>> {
        if !self.stream.match_any(&[TokenKind::Function])? {
            return Ok(None);
        }
        let token = self.stream.current()?;
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep { position: token.start });
        }

        self.depth += 1;
        let args = self.expr();
        self.depth -= 1;

        let mut text = token.value;
        if let Some(args) = args? {
            text.push_str(&args.text);
        }
        self.stream.match_any(&[TokenKind::Rparen])?;
        text.push(')');
        Ok(Some(text))
    }

    /// `progid:...(...)` or `alpha(opacity=50)`, kept verbatim up to `)`
    fn ie_function(&mut self) -> ParseResult<Option<String>> {
        if !self
            .stream
            .match_any(&[TokenKind::IeFunction, TokenKind::Function])?
        {
            return Ok(None);
        }
        let mut text = self.stream.current()?.value;

        loop {
            match self.stream.get_on(Some(Channel::Whitespace))? {
                TokenKind::Rparen => break,
                TokenKind::Eof => {
                    self.stream.unget()?;
                    let position = self.next_position()?;
                    return Err(ParseError::expected(TokenKind::Rparen, position));
                }
                _ => text.push_str(&self.stream.current()?.value),
            }
        }
        text.push(')');
        Ok(Some(text))
    }

    // ---------------------------------------------------------------------
    // Animations
    // ---------------------------------------------------------------------

    fn keyframes(&mut self) -> ParseResult<()> {
        self.stream.must_match(&[TokenKind::KeyframesSym])?;
        let token = self.stream.must_match(&[TokenKind::Ident, TokenKind::String])?;
        let name = TextUnit::new(token.value, token.start);
        let position = name.position;
        self.stream.must_match(&[TokenKind::Lbrace])?;

        self.fire(ParserEvent::StartKeyframes { name: name.clone(), position });

        while matches!(self.stream.peek()?, TokenKind::Ident | TokenKind::Percentage) {
            self.keyframe_rule()?;
        }

        self.fire(ParserEvent::EndKeyframes { name, position });
        self.stream.must_match(&[TokenKind::Rbrace])?;
        Ok(())
    }

    fn keyframe_rule(&mut self) -> ParseResult<()> {
        let mut keys = vec![self.key()?];
        while self.stream.match_any(&[TokenKind::Comma])? {
            keys.push(self.key()?);
        }
        let position = keys[0].position;

        self.fire(ParserEvent::StartKeyframeRule { keys: keys.clone(), position });
        self.read_declarations(true, false)?;
        self.fire(ParserEvent::EndKeyframeRule { keys, position });
        Ok(())
    }

    /// A percentage, `from`, or `to`
    fn key(&mut self) -> ParseResult<TextUnit> {
        if self.stream.match_any(&[TokenKind::Percentage])? {
            let token = self.stream.current()?;
            return Ok(TextUnit::new(token.value, token.start));
        }
        if self.stream.match_any(&[TokenKind::Ident])? {
            let token = self.stream.current()?;
            if token.value.eq_ignore_ascii_case("from") || token.value.eq_ignore_ascii_case("to") {
                return Ok(TextUnit::new(token.value, token.start));
            }
            self.stream.unget()?;
        }
        Err(self.unexpected_next())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

/// Strip one pair of matching quotes
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    text
}

/// Address of an `@import`/`@namespace` target written as a string or `url()`
fn import_uri(text: &str) -> String {
    let inner = match text.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("url(") => {
            text[4..].strip_suffix(')').unwrap_or(&text[4..]).trim()
        }
        _ => text,
    };
    unquote(inner).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{CombinatorKind, ValueKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collect_with(options: ParserOptions, input: &str) -> Vec<ParserEvent> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::new(options);
        for kind in EventKind::ALL {
            let sink = Rc::clone(&events);
            parser.add_listener(kind, move |event| sink.borrow_mut().push(event.clone()));
        }
        parser.parse(input).unwrap();
        let collected = events.borrow().clone();
        collected
    }

    fn collect(input: &str) -> Vec<ParserEvent> {
        collect_with(ParserOptions::lenient(), input)
    }

    fn kinds(events: &[ParserEvent]) -> Vec<EventKind> {
        events.iter().map(ParserEvent::kind).collect()
    }

    fn errors(events: &[ParserEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                ParserEvent::Error { error, .. } => Some(error.to_string()),
                _ => None,
            })
            .collect()
    }

    fn properties(events: &[ParserEvent]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                ParserEvent::Property { property, value, .. } => {
                    Some((property.text.clone(), value.text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_simple_rule() {
        let events = collect("a { color: red; }");
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::StartStylesheet,
                EventKind::StartRule,
                EventKind::Property,
                EventKind::EndRule,
                EventKind::EndStylesheet,
            ]
        );
        match &events[1] {
            ParserEvent::StartRule { selectors, position } => {
                assert_eq!(selectors.len(), 1);
                assert_eq!(selectors[0].text, "a");
                assert_eq!(*position, Position::new(1, 1));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[2] {
            ParserEvent::Property { property, value, important, position } => {
                assert_eq!(property.text, "color");
                assert_eq!(value.text, "red");
                assert!(!important);
                assert_eq!(*position, Position::new(1, 5));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_malformed_rule_is_skipped() {
        let events = collect("a..b { color: red } p { margin: 0 }");
        assert_eq!(errors(&events), vec!["Expected IDENT at line 1, col 3."]);
        let starts = events.iter().filter(|e| e.kind() == EventKind::StartRule).count();
        let ends = events.iter().filter(|e| e.kind() == EventKind::EndRule).count();
        assert_eq!((starts, ends), (1, 1));
        assert_eq!(properties(&events), vec![("margin".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_missing_brace_skips_rule() {
        let events = collect("a % { color: red } p { margin: 0 }");
        assert_eq!(errors(&events), vec!["Expected LBRACE at line 1, col 3."]);
        assert_eq!(events.iter().filter(|e| e.kind() == EventKind::StartRule).count(), 1);
    }

    #[test]
    fn test_error_position_ignores_newline_style() {
        for input in ["a {\n color red;\n}", "a {\r\n color red;\r\n}", "a {\r color red;\r}"] {
            let events = collect(input);
            assert_eq!(errors(&events), vec!["Expected COLON at line 2, col 8."], "{:?}", input);
            match events.iter().find(|e| e.kind() == EventKind::Error) {
                Some(ParserEvent::Error { position, .. }) => {
                    assert_eq!(*position, Position::new(2, 8));
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_declaration_recovery() {
        let events = collect("a { color: ; font-size: 1px }");
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::StartStylesheet,
                EventKind::StartRule,
                EventKind::Error,
                EventKind::Property,
                EventKind::EndRule,
                EventKind::EndStylesheet,
            ]
        );
        assert_eq!(errors(&events), vec!["Unexpected token ';' at line 1, col 12."]);
        assert_eq!(properties(&events), vec![("font-size".to_string(), "1px".to_string())]);
    }

    #[test]
    fn test_unclosed_block_reports_once() {
        let events = collect("a { color: red");
        assert_eq!(errors(&events), vec!["Expected RBRACE at line 1, col 15."]);
        assert_eq!(events.last(), Some(&ParserEvent::EndStylesheet));
        assert!(events.iter().any(|e| e.kind() == EventKind::EndRule));
    }

    #[test]
    fn test_unexpected_top_level_token() {
        let events = collect("} a { }");
        assert_eq!(errors(&events), vec!["Unexpected token '}' at line 1, col 1."]);
        assert_eq!(events.iter().filter(|e| e.kind() == EventKind::StartRule).count(), 1);
    }

    #[test]
    fn test_empty_declarations() {
        let events = collect("a { ; color: red;; }");
        assert!(errors(&events).is_empty());
        assert_eq!(properties(&events).len(), 1);
    }

    #[test]
    fn test_charset_import_namespace() {
        let events = collect(
            "@charset \"UTF-8\";\n@import url(\"bar.css\") print, screen;\n@import 'foo.css';\n\
             @namespace svg url(http://www.w3.org/2000/svg);\na {}",
        );
        assert!(errors(&events).is_empty());

        match &events[1] {
            ParserEvent::Charset { charset, position } => {
                assert_eq!(charset, "UTF-8");
                assert_eq!(*position, Position::new(1, 1));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[2] {
            ParserEvent::Import { uri, media, position } => {
                assert_eq!(uri, "bar.css");
                assert_eq!(media.len(), 2);
                assert_eq!(media[0].text, "print");
                assert_eq!(media[1].text, "screen");
                assert_eq!(*position, Position::new(2, 1));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[3] {
            ParserEvent::Import { uri, media, .. } => {
                assert_eq!(uri, "foo.css");
                assert!(media.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[4] {
            ParserEvent::Namespace { prefix, uri, .. } => {
                assert_eq!(prefix.as_deref(), Some("svg"));
                assert_eq!(uri, "http://www.w3.org/2000/svg");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_misplaced_prologue_rules() {
        let events = collect("a {} @charset \"UTF-8\"; @import 'a.css'; @namespace 'x';");
        assert_eq!(
            errors(&events),
            vec![
                "@charset not allowed here.",
                "@import not allowed here.",
                "@namespace not allowed here.",
            ]
        );
        assert!(!events.iter().any(|e| matches!(
            e.kind(),
            EventKind::Charset | EventKind::Import | EventKind::Namespace
        )));

        let events = collect("@namespace 'x'; @import 'a.css';");
        assert_eq!(errors(&events), vec!["@import not allowed here."]);
    }

    #[test]
    fn test_media_block() {
        let events = collect("@media screen and (max-width: 100px) { a { color: red } }");
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::StartStylesheet,
                EventKind::StartMedia,
                EventKind::StartRule,
                EventKind::Property,
                EventKind::EndRule,
                EventKind::EndMedia,
                EventKind::EndStylesheet,
            ]
        );
        match &events[1] {
            ParserEvent::StartMedia { media, .. } => {
                assert_eq!(media.len(), 1);
                assert_eq!(media[0].media_type.as_deref(), Some("screen"));
                assert_eq!(media[0].text, "screen and (max-width:100px)");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_page_with_margin_box() {
        let events = collect("@page :first { margin: 1in; @top-left { content: 'x' } }");
        assert!(errors(&events).is_empty());
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::StartStylesheet,
                EventKind::StartPage,
                EventKind::Property,
                EventKind::StartPageMargin,
                EventKind::Property,
                EventKind::EndPageMargin,
                EventKind::EndPage,
                EventKind::EndStylesheet,
            ]
        );
        match &events[1] {
            ParserEvent::StartPage { id, pseudo, .. } => {
                assert_eq!(*id, None);
                assert_eq!(pseudo.as_deref(), Some("first"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[3] {
            ParserEvent::StartPageMargin { margin, .. } => assert_eq!(margin.text, "@top-left"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_page_auto_is_rejected() {
        let events = collect("@page auto { margin: 0 }");
        assert_eq!(errors(&events)[0], "Unexpected token 'auto' at line 1, col 7.");
        assert!(!events.iter().any(|e| e.kind() == EventKind::StartPage));
    }

    #[test]
    fn test_font_face() {
        let events = collect("@font-face { font-family: 'Foo'; src: url(foo.woff) }");
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::StartStylesheet,
                EventKind::StartFontFace,
                EventKind::Property,
                EventKind::Property,
                EventKind::EndFontFace,
                EventKind::EndStylesheet,
            ]
        );
    }

    #[test]
    fn test_keyframes() {
        let events = collect("@-webkit-keyframes spin { from { opacity: 0 } 50%, TO { opacity: 1 } }");
        assert!(errors(&events).is_empty());
        let keys: Vec<Vec<String>> = events
            .iter()
            .filter_map(|event| match event {
                ParserEvent::StartKeyframeRule { keys, .. } => {
                    Some(keys.iter().map(|k| k.text.clone()).collect())
                }
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec![vec!["from".to_string()], vec!["50%".to_string(), "TO".to_string()]]);
        match &events[1] {
            ParserEvent::StartKeyframes { name, .. } => assert_eq!(name.text, "spin"),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(events[events.len() - 2].kind(), EventKind::EndKeyframes);
    }

    #[test]
    fn test_keyframe_key_must_be_from_or_to() {
        let events = collect("@keyframes x { fromage { opacity: 0 } }");
        assert_eq!(errors(&events)[0], "Unexpected token 'fromage' at line 1, col 16.");
        assert!(!events.iter().any(|e| e.kind() == EventKind::StartKeyframeRule));
    }

    #[test]
    fn test_important_and_hacks() {
        let events = collect(
            "a { color: red !important; *zoom: 1; _height: 1px; \
             filter: progid:DXImageTransform.Microsoft.Alpha(opacity=50); }",
        );
        assert!(errors(&events).is_empty(), "{:?}", errors(&events));

        let mut found = Vec::new();
        for event in &events {
            if let ParserEvent::Property { property, value, important, .. } = event {
                found.push((property.text.clone(), property.hack, value.text.clone(), *important));
            }
        }
        assert_eq!(found[0], ("color".into(), None, "red".into(), true));
        assert_eq!(found[1], ("*zoom".into(), Some('*'), "1".into(), false));
        assert_eq!(found[2], ("_height".into(), Some('_'), "1px".into(), false));
        assert_eq!(
            found[3].2,
            "progid:DXImageTransform.Microsoft.Alpha(opacity=50)".to_string()
        );
    }

    #[test]
    fn test_alpha_filter() {
        let events = collect("a { filter: alpha(opacity=50); }");
        assert!(errors(&events).is_empty());
        assert_eq!(properties(&events), vec![("filter".into(), "alpha(opacity=50)".into())]);
    }

    #[test]
    fn test_hacks_rejected_by_default() {
        let events = collect_with(ParserOptions::default(), "a { *zoom: 1; color: red }");
        assert_eq!(errors(&events), vec!["Expected RBRACE at line 1, col 5."]);
        assert_eq!(properties(&events), vec![("color".to_string(), "red".to_string())]);
    }

    #[test]
    fn test_strict_mode_returns_error() {
        let mut parser = Parser::new(ParserOptions { strict: true, ..ParserOptions::default() });
        let err = parser.parse("a { color: }").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token '}' at line 1, col 12.");
    }

    #[test]
    fn test_bad_hex_color() {
        let events = collect("a { color: #zz }");
        assert_eq!(errors(&events), vec!["Expected a hex color but found '#zz' at line 1, col 12."]);
    }

    #[test]
    fn test_value_parts() {
        let events = collect("a { font: 12px/1.5 \"Helvetica Neue\", sans-serif; margin: -1px 0 }");
        let values: Vec<PropertyValue> = events
            .iter()
            .filter_map(|event| match event {
                ParserEvent::Property { value, .. } => Some(value.clone()),
                _ => None,
            })
            .collect();

        let kinds: Vec<ValueKind> = values[0].parts.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Length,
                ValueKind::Operator,
                ValueKind::Number,
                ValueKind::String,
                ValueKind::Operator,
                ValueKind::Identifier,
            ]
        );
        assert_eq!(values[1].parts[0].text, "-1px");
        assert_eq!(values[1].parts[0].value, Some(-1.0));
        assert_eq!(values[1].text, "-1px 0");
    }

    #[test]
    fn test_parse_selector_structure() {
        let mut parser = Parser::default();
        let selector = parser
            .parse_selector("ul > li.item:first-child a[href^='http']")
            .unwrap()
            .unwrap();
        assert_eq!(selector.text, "ul > li.item:first-child a[href^='http']");
        assert_eq!(selector.parts.len(), 5);

        match &selector.parts[1] {
            SelectorComponent::Combinator(c) => assert_eq!(c.kind, CombinatorKind::Child),
            other => panic!("unexpected part {:?}", other),
        }
        match &selector.parts[3] {
            SelectorComponent::Combinator(c) => assert_eq!(c.kind, CombinatorKind::Descendant),
            other => panic!("unexpected part {:?}", other),
        }

        let parts: Vec<&SelectorPart> = selector.sequences().collect();
        assert_eq!(parts[1].element_name.as_deref(), Some("li"));
        assert_eq!(parts[1].modifiers[0].kind, SubPartKind::Class);
        assert_eq!(parts[1].modifiers[1].kind, SubPartKind::Pseudo);
        assert_eq!(parts[1].modifiers[1].text, ":first-child");
        assert_eq!(parts[2].modifiers[0].kind, SubPartKind::Attribute);
        assert_eq!(parts[2].modifiers[0].text, "[href^='http']");
        assert_eq!(parts[2].position, Position::new(1, 26));
    }

    #[test]
    fn test_parse_selector_negation_and_namespace() {
        let mut parser = Parser::default();
        let selector = parser.parse_selector("svg|rect:not(.hidden)").unwrap().unwrap();
        let part = selector.subject().unwrap();
        assert_eq!(part.element_name.as_deref(), Some("svg|rect"));
        assert_eq!(part.modifiers[0].kind, SubPartKind::Not);
        assert_eq!(part.modifiers[0].text, ":not(.hidden)");
        assert_eq!(part.modifiers[0].args[0].text, ".hidden");

        let selector = parser.parse_selector("*|* li:nth-child(2n+1)").unwrap().unwrap();
        assert_eq!(selector.sequences().next().unwrap().text, "*|*");
        assert_eq!(selector.subject().unwrap().modifiers[0].text, ":nth-child(2n+1)");
    }

    #[test]
    fn test_parse_selector_rejects_trailing_input() {
        let mut parser = Parser::default();
        assert!(parser.parse_selector("a {").is_err());
        assert!(parser.parse_selector("a >").is_err());
        assert_eq!(parser.parse_selector("").unwrap(), None);
    }

    #[test]
    fn test_parse_property_value() {
        let mut parser = Parser::default();
        let value = parser.parse_property_value(" 1px solid #fff ").unwrap().unwrap();
        let kinds: Vec<ValueKind> = value.parts.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![ValueKind::Length, ValueKind::Identifier, ValueKind::Color]);
        assert_eq!(value.text, "1px solid #fff");

        let err = parser.parse_property_value("red }").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected token '}' at line 1, col 5.");
    }

    #[test]
    fn test_parse_rule_fires_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::default();
        let sink = Rc::clone(&seen);
        parser.add_listener(EventKind::Property, move |event| {
            if let ParserEvent::Property { property, .. } = event {
                sink.borrow_mut().push(property.text.clone());
            }
        });

        assert!(parser.parse_rule("  h1, h2 { color: red; margin: 0 }  ").unwrap());
        assert_eq!(*seen.borrow(), vec!["color".to_string(), "margin".to_string()]);
        assert!(!parser.parse_rule("").unwrap());
    }

    #[test]
    fn test_parse_media_query() {
        let mut parser = Parser::default();
        let query = parser.parse_media_query("only screen and (color)").unwrap().unwrap();
        assert_eq!(query.modifier.as_deref(), Some("only"));
        assert_eq!(query.media_type.as_deref(), Some("screen"));
        assert_eq!(query.features.len(), 1);
        assert!(query.features[0].value.is_none());
        assert_eq!(query.text, "only screen and (color)");

        assert!(parser.parse_media_query("screen or (color)").is_err());
    }

    #[test]
    fn test_remove_listener_stops_events() {
        let count = Rc::new(RefCell::new(0));
        let mut parser = Parser::default();
        let counter = Rc::clone(&count);
        let id = parser.add_listener(EventKind::StartRule, move |_| *counter.borrow_mut() += 1);

        parser.parse("a {} b {}").unwrap();
        assert!(parser.remove_listener(EventKind::StartRule, id));
        parser.parse("a {} b {}").unwrap();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_html_comment_markers_skipped() {
        let events = collect("<!-- a { color: red } -->");
        assert!(errors(&events).is_empty());
        assert_eq!(properties(&events).len(), 1);
    }

    #[test]
    fn test_import_uri_forms() {
        assert_eq!(import_uri("\"a.css\""), "a.css");
        assert_eq!(import_uri("url('b.css')"), "b.css");
        assert_eq!(import_uri("url(c.css)"), "c.css");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("\"x'"), "\"x'");
    }

    #[test]
    fn test_ensure_progress_requires_consumed_token() {
        let mut parser = Parser::default();
        parser.reset("a {}");
        let before = parser.stream.cursor();
        assert_eq!(
            parser.ensure_progress(before),
            Err(ParseError::NoProgress { position: Position::new(1, 1) })
        );

        parser.stream.get().unwrap();
        assert_eq!(parser.ensure_progress(before), Ok(()));
    }

    #[test]
    fn test_deeply_nested_function_is_fatal() {
        let mut parser = Parser::new(ParserOptions::lenient());
        let input = format!("a {{ b: {} }}", "f(".repeat(5_000));
        let err = parser.parse(&input).unwrap_err();
        assert_eq!(err, ParseError::TooDeep { position: Position::new(1, 8 + 2 * MAX_NESTING) });

        let nested = format!("{}1{}", "f(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        let value = parser.parse_property_value(&nested).unwrap().unwrap();
        assert_eq!(value.text, nested);
    }

}
