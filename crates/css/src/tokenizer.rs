//! Stylesheet Tokenizer
//!
//! Turns characters from a [`Reader`] into classified tokens. The first
//! character picks the scanning routine; multi-character forms that turn out
//! not to match (`@foo`, `<!-`, `!imp`) are rolled back with mark/reset so a
//! single-character token comes out instead.

use crate::error::Position;
use crate::reader::Reader;
use crate::stream::TokenSource;
use crate::token::{Token, TokenKind};

/// Stylesheet tokenizer
pub struct Tokenizer {
    reader: Reader,
}

impl Tokenizer {
    /// Create a new tokenizer
    pub fn new(input: &str) -> Self {
        Self {
            reader: Reader::new(input),
        }
    }

    /// Scan the next token
    pub fn scan(&mut self) -> Token {
        let start = self.reader.position();
        let Some(c) = self.reader.read() else {
            return self.token(TokenKind::Eof, String::new(), start);
        };
        let next = self.reader.peek();

        match c {
            '/' if next == Some('*') => {
                let comment = self.read_comment(c);
                self.token(TokenKind::Comment, comment, start)
            }
            '|' | '~' | '^' | '$' | '*' if next == Some('=') => self.comparison_token(c, start),
            '"' | '\'' => self.string_token(c, start),
            '#' if next.is_some_and(is_name_char) => {
                let name = self.read_name(String::from('#'));
                self.token(TokenKind::Hash, name, start)
            }
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => self.number_token(c, start),
            '-' if next == Some('-') => self.html_comment_end_token(c, start),
            '-' if next.is_some_and(is_name_start) => self.ident_or_function_token(c, start),
            '!' => self.important_token(c, start),
            '@' => self.at_rule_token(c, start),
            ':' => self.not_token(c, start),
            '<' => self.html_comment_start_token(c, start),
            'u' | 'U' if next == Some('+') => self.unicode_range_token(c, start),
            _ if c.is_ascii_digit() => self.number_token(c, start),
            _ if c.is_whitespace() => {
                let mut whitespace = String::from(c);
                whitespace.push_str(&self.reader.read_while(char::is_whitespace));
                self.token(TokenKind::S, whitespace, start)
            }
            _ if is_name_start(c) => self.ident_or_function_token(c, start),
            _ => self.char_token(c, start),
        }
    }

    /// Scan all remaining tokens, excluding the final EOF
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan();
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    fn token(&self, kind: TokenKind, value: impl Into<String>, start: Position) -> Token {
        Token::new(kind, value, start, self.reader.position())
    }

    fn char_token(&self, c: char, start: Position) -> Token {
        let text = c.to_string();
        let kind = TokenKind::from_text(&text).unwrap_or(TokenKind::Char);
        self.token(kind, text, start)
    }

    fn comparison_token(&mut self, c: char, start: Position) -> Token {
        let mut text = String::from(c);
        text.extend(self.reader.read());
        let kind = TokenKind::from_text(&text).unwrap_or(TokenKind::Char);
        self.token(kind, text, start)
    }

    fn string_token(&mut self, delimiter: char, start: Position) -> Token {
        let (text, closed) = self.read_string(delimiter);
        let kind = if closed { TokenKind::String } else { TokenKind::Invalid };
        self.token(kind, text, start)
    }

    fn number_token(&mut self, first: char, start: Position) -> Token {
        let mut value = self.read_number(first);

        match self.reader.peek() {
            Some(c) if is_name_start(c) => {
                let unit = self.read_name(String::new());
                let kind = unit_kind(&unit);
                value.push_str(&unit);
                self.token(kind, value, start)
            }
            Some('%') => {
                self.reader.read();
                value.push('%');
                self.token(TokenKind::Percentage, value, start)
            }
            _ => self.token(TokenKind::Number, value, start),
        }
    }

    fn html_comment_start_token(&mut self, first: char, start: Position) -> Token {
        self.reader.mark();
        let mut text = String::from(first);
        text.push_str(&self.reader.read_count(3));

        if text == "<!--" {
            self.token(TokenKind::Cdo, text, start)
        } else {
            self.reader.reset();
            self.char_token(first, start)
        }
    }

    fn html_comment_end_token(&mut self, first: char, start: Position) -> Token {
        self.reader.mark();
        let mut text = String::from(first);
        text.push_str(&self.reader.read_count(2));

        if text == "-->" {
            self.token(TokenKind::Cdc, text, start)
        } else {
            self.reader.reset();
            self.char_token(first, start)
        }
    }

    fn ident_or_function_token(&mut self, first: char, start: Position) -> Token {
        let prefix = if first == '\\' { self.read_escape() } else { String::from(first) };
        let mut ident = self.read_name(prefix);

        match self.reader.peek() {
            Some('(') => {
                self.reader.read();
                ident.push('(');
                if ident.eq_ignore_ascii_case("url(") {
                    if let Some(uri) = self.read_uri(&ident) {
                        return self.token(TokenKind::Uri, uri, start);
                    }
                }
                self.token(TokenKind::Function, ident, start)
            }
            Some(':') if ident.eq_ignore_ascii_case("progid") => {
                self.reader.mark();
                match self.reader.read_to("(") {
                    Some(rest) => {
                        ident.push_str(&rest);
                        self.token(TokenKind::IeFunction, ident, start)
                    }
                    None => {
                        self.reader.reset();
                        self.token(TokenKind::Ident, ident, start)
                    }
                }
            }
            _ => self.token(TokenKind::Ident, ident, start),
        }
    }

    /// `!` followed by optional whitespace/comments and `important`
    fn important_token(&mut self, first: char, start: Position) -> Token {
        self.reader.mark();
        let mut important = String::from(first);

        loop {
            match self.reader.read() {
                Some('/') if self.reader.peek() == Some('*') => {
                    self.read_comment('/');
                }
                Some(c) if c.is_whitespace() => important.push(c),
                Some(c) if c.eq_ignore_ascii_case(&'i') => {
                    let rest = self.reader.read_count(8);
                    if rest.eq_ignore_ascii_case("mportant") {
                        important.push(c);
                        important.push_str(&rest);
                        return self.token(TokenKind::ImportantSym, important, start);
                    }
                    break;
                }
                _ => break,
            }
        }

        self.reader.reset();
        self.char_token(first, start)
    }

    fn at_rule_token(&mut self, first: char, start: Position) -> Token {
        self.reader.mark();
        let rule = self.read_name(String::from(first));

        match TokenKind::from_text(&rule) {
            Some(kind) if kind.is_at_keyword() => self.token(kind, rule, start),
            _ => {
                self.reader.reset();
                self.char_token(first, start)
            }
        }
    }

    fn not_token(&mut self, first: char, start: Position) -> Token {
        self.reader.mark();
        let mut text = String::from(first);
        text.push_str(&self.reader.read_count(4));

        if text.eq_ignore_ascii_case(":not(") {
            self.token(TokenKind::Not, text, start)
        } else {
            self.reader.reset();
            self.char_token(first, start)
        }
    }

    fn unicode_range_token(&mut self, first: char, start: Position) -> Token {
        self.reader.mark();
        self.reader.read();
        let part = self.read_unicode_range_part(true);
        if part.is_empty() {
            self.reader.reset();
            return self.ident_or_function_token(first, start);
        }

        let mut value = format!("{}+{}", first, part);
        if !part.contains('?') && self.reader.peek() == Some('-') {
            self.reader.mark();
            self.reader.read();
            let end = self.read_unicode_range_part(false);
            if end.is_empty() {
                self.reader.reset();
            } else {
                value.push('-');
                value.push_str(&end);
            }
        }
        self.token(TokenKind::UnicodeRange, value, start)
    }

    fn read_unicode_range_part(&mut self, allow_question: bool) -> String {
        let mut part = String::new();
        while part.len() < 6 {
            match self.reader.peek() {
                Some(c) if c.is_ascii_hexdigit() => part.push(c),
                _ => break,
            }
            self.reader.read();
        }
        if allow_question {
            while part.len() < 6 && self.reader.peek() == Some('?') {
                self.reader.read();
                part.push('?');
            }
        }
        part
    }

    /// Read a quoted string whose opening delimiter has been consumed.
    /// Returns the text with both quotes and whether it was closed properly.
    fn read_string(&mut self, delimiter: char) -> (String, bool) {
        let mut text = String::from(delimiter);
        let mut escaped = false;

        while let Some(c) = self.reader.read() {
            text.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == delimiter {
                return (text, true);
            }

            if !escaped && self.reader.peek().is_some_and(is_newline) {
                return (text, false);
            }
        }
        (text, false)
    }

    fn read_number(&mut self, first: char) -> String {
        let mut number = String::from(first);
        let mut has_dot = first == '.';

        while let Some(c) = self.reader.peek() {
            if c.is_ascii_digit() {
                number.push(c);
            } else if c == '.' && !has_dot {
                has_dot = true;
                number.push(c);
            } else {
                break;
            }
            self.reader.read();
        }
        number
    }

    /// Append name characters (and escapes) to `name`
    fn read_name(&mut self, mut name: String) -> String {
        while let Some(c) = self.reader.peek() {
            if c == '\\' {
                self.reader.read();
                name.push_str(&self.read_escape());
            } else if is_name_char(c) {
                self.reader.read();
                name.push(c);
            } else {
                break;
            }
        }
        name
    }

    /// Read an escape whose backslash has been consumed: up to six hex
    /// digits plus one optional whitespace character, or one literal
    /// character.
    fn read_escape(&mut self) -> String {
        let mut escape = String::from('\\');
        match self.reader.peek() {
            Some(c) if c.is_ascii_hexdigit() => {
                let mut digits = 0;
                while digits < 6 {
                    match self.reader.peek() {
                        Some(h) if h.is_ascii_hexdigit() => escape.push(h),
                        _ => break,
                    }
                    self.reader.read();
                    digits += 1;
                }
                if let Some(ws) = self.reader.peek().filter(|c| c.is_whitespace()) {
                    self.reader.read();
                    escape.push(ws);
                }
            }
            Some(c) if !is_newline(c) => {
                self.reader.read();
                escape.push(c);
            }
            _ => {}
        }
        escape
    }

    /// Read a comment whose `/` has been consumed; unterminated comments run
    /// to the end of input
    fn read_comment(&mut self, first: char) -> String {
        let mut comment = String::from(first);
        if self.reader.peek() != Some('*') {
            return comment;
        }
        self.reader.read();
        comment.push('*');

        while let Some(c) = self.reader.read() {
            comment.push(c);
            if c == '*' && self.reader.peek() == Some('/') {
                self.reader.read();
                comment.push('/');
                break;
            }
        }
        comment
    }

    /// Read the rest of `url(...)`. Rolls back and returns `None` if the
    /// contents are not a well-formed URI, so the caller emits a FUNCTION.
    fn read_uri(&mut self, prefix: &str) -> Option<String> {
        self.reader.mark();
        self.reader.read_while(char::is_whitespace);

        let inner = match self.reader.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.reader.read();
                match self.read_string(quote) {
                    (text, true) => text,
                    (_, false) => String::new(),
                }
            }
            _ => self.reader.read_while(is_url_char),
        };

        self.reader.read_while(char::is_whitespace);

        if inner.is_empty() || self.reader.peek() != Some(')') {
            self.reader.reset();
            return None;
        }
        self.reader.read();
        Some(format!("{}{})", prefix, inner))
    }
}

impl TokenSource for Tokenizer {
    type Kind = TokenKind;

    fn next_token(&mut self) -> Token {
        self.scan()
    }
}

/// Classify a numeric unit suffix
pub(crate) fn unit_kind(unit: &str) -> TokenKind {
    match unit.to_ascii_lowercase().as_str() {
        "em" | "rem" | "ex" | "px" | "cm" | "mm" | "in" | "pt" | "pc" | "ch" | "vw" | "vh" | "vm"
        | "gd" => TokenKind::Length,
        "deg" | "rad" | "grad" => TokenKind::Angle,
        "ms" | "s" => TokenKind::Time,
        "hz" | "khz" => TokenKind::Freq,
        "dpi" | "dpcm" => TokenKind::Resolution,
        _ => TokenKind::Dimension,
    }
}

/// Check if character can start a name
pub fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '\\' || c >= '\u{80}'
}

/// Check if character can continue a name
pub fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn is_newline(c: char) -> bool {
    c == '\n' || c == '\u{c}'
}

fn is_url_char(c: char) -> bool {
    matches!(c, '!' | '#' | '$' | '%' | '&' | '*'..='~')
}
