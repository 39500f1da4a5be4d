//! Token catalog
//!
//! The closed set of stylesheet token types, plus the generic token record
//! shared by the tokenizer and the lookahead stream.

use std::fmt;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::error::Position;

/// Side channel a token type lives on. Tokens without a channel are always
/// visible; tokens with one are skipped unless that channel is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Whitespace,
    Comment,
}

/// Per-type token metadata the lookahead stream needs
pub trait TokenType: Copy + Eq + fmt::Debug {
    /// End-of-input marker
    const EOF: Self;

    /// Upper-case catalog name, used in error messages
    fn name(self) -> &'static str;

    /// Channel the type lives on (`None` for the default channel)
    fn channel(self) -> Option<Channel> {
        None
    }

    /// Hidden tokens are dropped before they reach the parser
    fn hidden(self) -> bool {
        false
    }
}

/// Stylesheet token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural
    Eof,
    Char,
    S,
    Comment,

    // Strings and identifiers
    String,
    Ident,
    Hash,
    Uri,
    Function,
    IeFunction,

    // At-keywords
    ImportSym,
    PageSym,
    MediaSym,
    FontFaceSym,
    CharsetSym,
    NamespaceSym,
    KeyframesSym,

    // Paged media margin boxes
    TopLeftCornerSym,
    TopLeftSym,
    TopCenterSym,
    TopRightSym,
    TopRightCornerSym,
    BottomLeftCornerSym,
    BottomLeftSym,
    BottomCenterSym,
    BottomRightSym,
    BottomRightCornerSym,
    LeftTopSym,
    LeftMiddleSym,
    LeftBottomSym,
    RightTopSym,
    RightMiddleSym,
    RightBottomSym,

    // Numbers
    Number,
    Percentage,
    Dimension,
    Length,
    Angle,
    Time,
    Freq,
    Resolution,

    // Attribute match operators
    Includes,
    Dashmatch,
    Prefixmatch,
    Suffixmatch,
    Substringmatch,

    // Combinators and punctuation
    Plus,
    Greater,
    Tilde,
    Comma,
    Pipe,
    Slash,
    Minus,
    Star,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,
    Equals,
    Colon,
    Semicolon,
    Lparen,
    Rparen,
    Dot,

    // Markers
    Cdo,
    Cdc,
    Not,
    ImportantSym,

    UnicodeRange,
    Invalid,
    Unknown,
}

/// The sixteen `@page` margin-box keywords
pub const MARGIN_SYMS: [TokenKind; 16] = [
    TokenKind::TopLeftCornerSym,
    TokenKind::TopLeftSym,
    TokenKind::TopCenterSym,
    TokenKind::TopRightSym,
    TokenKind::TopRightCornerSym,
    TokenKind::BottomLeftCornerSym,
    TokenKind::BottomLeftSym,
    TokenKind::BottomCenterSym,
    TokenKind::BottomRightSym,
    TokenKind::BottomRightCornerSym,
    TokenKind::LeftTopSym,
    TokenKind::LeftMiddleSym,
    TokenKind::LeftBottomSym,
    TokenKind::RightTopSym,
    TokenKind::RightMiddleSym,
    TokenKind::RightBottomSym,
];

/// Literal token text, keyed in lower case
static TEXT_TOKENS: LazyLock<FxHashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut m = FxHashMap::default();

    m.insert("<!--", TokenKind::Cdo);
    m.insert("-->", TokenKind::Cdc);

    m.insert("~=", TokenKind::Includes);
    m.insert("|=", TokenKind::Dashmatch);
    m.insert("^=", TokenKind::Prefixmatch);
    m.insert("$=", TokenKind::Suffixmatch);
    m.insert("*=", TokenKind::Substringmatch);

    m.insert("@import", TokenKind::ImportSym);
    m.insert("@page", TokenKind::PageSym);
    m.insert("@media", TokenKind::MediaSym);
    m.insert("@font-face", TokenKind::FontFaceSym);
    m.insert("@charset", TokenKind::CharsetSym);
    m.insert("@namespace", TokenKind::NamespaceSym);
    m.insert("@keyframes", TokenKind::KeyframesSym);
    m.insert("@-webkit-keyframes", TokenKind::KeyframesSym);
    m.insert("@-moz-keyframes", TokenKind::KeyframesSym);
    m.insert("@-o-keyframes", TokenKind::KeyframesSym);
    m.insert("@-ms-keyframes", TokenKind::KeyframesSym);

    m.insert("@top-left-corner", TokenKind::TopLeftCornerSym);
    m.insert("@top-left", TokenKind::TopLeftSym);
    m.insert("@top-center", TokenKind::TopCenterSym);
    m.insert("@top-right", TokenKind::TopRightSym);
    m.insert("@top-right-corner", TokenKind::TopRightCornerSym);
    m.insert("@bottom-left-corner", TokenKind::BottomLeftCornerSym);
    m.insert("@bottom-left", TokenKind::BottomLeftSym);
    m.insert("@bottom-center", TokenKind::BottomCenterSym);
    m.insert("@bottom-right", TokenKind::BottomRightSym);
    m.insert("@bottom-right-corner", TokenKind::BottomRightCornerSym);
    m.insert("@left-top", TokenKind::LeftTopSym);
    m.insert("@left-middle", TokenKind::LeftMiddleSym);
    m.insert("@left-bottom", TokenKind::LeftBottomSym);
    m.insert("@right-top", TokenKind::RightTopSym);
    m.insert("@right-middle", TokenKind::RightMiddleSym);
    m.insert("@right-bottom", TokenKind::RightBottomSym);

    m.insert("+", TokenKind::Plus);
    m.insert(">", TokenKind::Greater);
    m.insert("~", TokenKind::Tilde);
    m.insert(",", TokenKind::Comma);
    m.insert("|", TokenKind::Pipe);
    m.insert("/", TokenKind::Slash);
    m.insert("-", TokenKind::Minus);
    m.insert("*", TokenKind::Star);
    m.insert("{", TokenKind::Lbrace);
    m.insert("}", TokenKind::Rbrace);
    m.insert("[", TokenKind::Lbracket);
    m.insert("]", TokenKind::Rbracket);
    m.insert("=", TokenKind::Equals);
    m.insert(":", TokenKind::Colon);
    m.insert(";", TokenKind::Semicolon);
    m.insert("(", TokenKind::Lparen);
    m.insert(")", TokenKind::Rparen);
    m.insert(".", TokenKind::Dot);

    m.insert(":not(", TokenKind::Not);

    m
});

impl TokenKind {
    /// Look up a token type by its literal text (case-insensitive)
    pub fn from_text(text: &str) -> Option<TokenKind> {
        TEXT_TOKENS.get(text.to_ascii_lowercase().as_str()).copied()
    }

    /// Whether this type is an `@page` margin-box keyword
    pub fn is_margin_sym(self) -> bool {
        MARGIN_SYMS.contains(&self)
    }

    /// Whether this type is one of the at-keyword symbols
    pub fn is_at_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::ImportSym
                | TokenKind::PageSym
                | TokenKind::MediaSym
                | TokenKind::FontFaceSym
                | TokenKind::CharsetSym
                | TokenKind::NamespaceSym
                | TokenKind::KeyframesSym
        ) || self.is_margin_sym()
    }
}

impl TokenType for TokenKind {
    const EOF: Self = TokenKind::Eof;

    fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Char => "CHAR",
            TokenKind::S => "S",
            TokenKind::Comment => "COMMENT",
            TokenKind::String => "STRING",
            TokenKind::Ident => "IDENT",
            TokenKind::Hash => "HASH",
            TokenKind::Uri => "URI",
            TokenKind::Function => "FUNCTION",
            TokenKind::IeFunction => "IE_FUNCTION",
            TokenKind::ImportSym => "IMPORT_SYM",
            TokenKind::PageSym => "PAGE_SYM",
            TokenKind::MediaSym => "MEDIA_SYM",
            TokenKind::FontFaceSym => "FONT_FACE_SYM",
            TokenKind::CharsetSym => "CHARSET_SYM",
            TokenKind::NamespaceSym => "NAMESPACE_SYM",
            TokenKind::KeyframesSym => "KEYFRAMES_SYM",
            TokenKind::TopLeftCornerSym => "TOPLEFTCORNER_SYM",
            TokenKind::TopLeftSym => "TOPLEFT_SYM",
            TokenKind::TopCenterSym => "TOPCENTER_SYM",
            TokenKind::TopRightSym => "TOPRIGHT_SYM",
            TokenKind::TopRightCornerSym => "TOPRIGHTCORNER_SYM",
            TokenKind::BottomLeftCornerSym => "BOTTOMLEFTCORNER_SYM",
            TokenKind::BottomLeftSym => "BOTTOMLEFT_SYM",
            TokenKind::BottomCenterSym => "BOTTOMCENTER_SYM",
            TokenKind::BottomRightSym => "BOTTOMRIGHT_SYM",
            TokenKind::BottomRightCornerSym => "BOTTOMRIGHTCORNER_SYM",
            TokenKind::LeftTopSym => "LEFTTOP_SYM",
            TokenKind::LeftMiddleSym => "LEFTMIDDLE_SYM",
            TokenKind::LeftBottomSym => "LEFTBOTTOM_SYM",
            TokenKind::RightTopSym => "RIGHTTOP_SYM",
            TokenKind::RightMiddleSym => "RIGHTMIDDLE_SYM",
            TokenKind::RightBottomSym => "RIGHTBOTTOM_SYM",
            TokenKind::Number => "NUMBER",
            TokenKind::Percentage => "PERCENTAGE",
            TokenKind::Dimension => "DIMENSION",
            TokenKind::Length => "LENGTH",
            TokenKind::Angle => "ANGLE",
            TokenKind::Time => "TIME",
            TokenKind::Freq => "FREQ",
            TokenKind::Resolution => "RESOLUTION",
            TokenKind::Includes => "INCLUDES",
            TokenKind::Dashmatch => "DASHMATCH",
            TokenKind::Prefixmatch => "PREFIXMATCH",
            TokenKind::Suffixmatch => "SUFFIXMATCH",
            TokenKind::Substringmatch => "SUBSTRINGMATCH",
            TokenKind::Plus => "PLUS",
            TokenKind::Greater => "GREATER",
            TokenKind::Tilde => "TILDE",
            TokenKind::Comma => "COMMA",
            TokenKind::Pipe => "PIPE",
            TokenKind::Slash => "SLASH",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Lbrace => "LBRACE",
            TokenKind::Rbrace => "RBRACE",
            TokenKind::Lbracket => "LBRACKET",
            TokenKind::Rbracket => "RBRACKET",
            TokenKind::Equals => "EQUALS",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Lparen => "LPAREN",
            TokenKind::Rparen => "RPAREN",
            TokenKind::Dot => "DOT",
            TokenKind::Cdo => "CDO",
            TokenKind::Cdc => "CDC",
            TokenKind::Not => "NOT",
            TokenKind::ImportantSym => "IMPORTANT_SYM",
            TokenKind::UnicodeRange => "UNICODE_RANGE",
            TokenKind::Invalid => "INVALID",
            TokenKind::Unknown => "UNKNOWN",
        }
    }

    fn channel(self) -> Option<Channel> {
        match self {
            TokenKind::S => Some(Channel::Whitespace),
            TokenKind::Comment => Some(Channel::Comment),
            _ => None,
        }
    }

    fn hidden(self) -> bool {
        self == TokenKind::Comment
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified, positioned lexical unit
#[derive(Debug, Clone, PartialEq)]
pub struct Token<K = TokenKind> {
    pub kind: K,
    /// Source text of the token
    pub value: String,
    pub channel: Option<Channel>,
    pub hidden: bool,
    /// Position of the first character
    pub start: Position,
    /// Position just past the last character
    pub end: Position,
}

impl<K: TokenType> Token<K> {
    pub fn new(kind: K, value: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            channel: kind.channel(),
            hidden: kind.hidden(),
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        assert_eq!(TokenKind::from_text("{"), Some(TokenKind::Lbrace));
        assert_eq!(TokenKind::from_text("@MEDIA"), Some(TokenKind::MediaSym));
        assert_eq!(TokenKind::from_text("@-webkit-keyframes"), Some(TokenKind::KeyframesSym));
        assert_eq!(TokenKind::from_text(":NOT("), Some(TokenKind::Not));
        assert_eq!(TokenKind::from_text("@flumbo"), None);
    }

    #[test]
    fn test_channels() {
        assert_eq!(TokenKind::S.channel(), Some(Channel::Whitespace));
        assert!(TokenKind::Comment.hidden());
        assert_eq!(TokenKind::Ident.channel(), None);
        assert!(!TokenKind::S.hidden());
    }

    #[test]
    fn test_margin_syms() {
        assert_eq!(MARGIN_SYMS.len(), 16);
        assert!(TokenKind::BottomRightCornerSym.is_margin_sym());
        assert!(TokenKind::LeftMiddleSym.is_at_keyword());
        assert!(!TokenKind::Ident.is_at_keyword());
    }

    #[test]
    fn test_token_inherits_channel() {
        let token = Token::new(TokenKind::S, "  ", Position::new(1, 1), Position::new(1, 3));
        assert_eq!(token.channel, Some(Channel::Whitespace));
        assert!(!token.hidden);
    }
}
