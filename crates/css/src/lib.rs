//! Nisaba CSS Parser
//!
//! Stylesheet tokenizer, lookahead token stream and event-driven parser.

mod colors;
mod error;
mod events;
mod parser;
mod reader;
mod stream;
mod syntax;
mod token;
mod tokenizer;

pub use colors::{hex_to_rgb, named_color};
pub use error::{ParseError, ParseResult, Position};
pub use events::{EventKind, EventTarget, Listener, ListenerId, ParserEvent};
pub use parser::{Parser, ParserOptions, MAX_NESTING};
pub use reader::Reader;
pub use stream::{TokenSource, TokenStream, MAX_LOOKAHEAD};
pub use syntax::{
    Combinator, CombinatorKind, MediaFeature, MediaQuery, PropertyName, PropertyValue,
    PropertyValuePart, Selector, SelectorComponent, SelectorPart, SelectorSubPart, SubPartKind,
    SyntaxUnit, TextUnit, ValueKind,
};
pub use token::{Channel, Token, TokenKind, TokenType, MARGIN_SYMS};
pub use tokenizer::{is_name_char, is_name_start, Tokenizer};
