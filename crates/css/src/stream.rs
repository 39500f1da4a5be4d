//! Lookahead token stream
//!
//! Buffers tokens from any [`TokenSource`] in a fixed ring so the parser can
//! peek up to [`MAX_LOOKAHEAD`] tokens ahead, push consumed tokens back, and
//! ask for tokens that live on a side channel (whitespace) only when the
//! grammar cares about them.

use log::trace;
use smallvec::SmallVec;

use crate::error::{ParseError, ParseResult};
use crate::token::{Channel, Token, TokenType};

/// Deepest lookahead, lookbehind and unget the stream supports
pub const MAX_LOOKAHEAD: usize = 5;

/// Ring capacity: lookahead plus lookbehind, with room for an off-channel
/// token between every pair of visible ones.
const BUFFER_SIZE: usize = MAX_LOOKAHEAD * 4;

/// Producer of tokens for a [`TokenStream`]
pub trait TokenSource {
    type Kind: TokenType;

    /// Produce the next token. Must keep returning an EOF token once the
    /// input is exhausted.
    fn next_token(&mut self) -> Token<Self::Kind>;
}

/// Token stream with bounded lookahead and pushback
pub struct TokenStream<S: TokenSource> {
    source: S,
    ring: Vec<Option<Token<S::Kind>>>,
    /// Number of tokens pulled from the source (absolute index of the next slot)
    fetched: usize,
    /// Absolute index of the next token to hand out
    cursor: usize,
    /// How many ring slots each recent `get` moved the cursor
    history: SmallVec<[usize; MAX_LOOKAHEAD]>,
}

impl<S: TokenSource> TokenStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            ring: (0..BUFFER_SIZE).map(|_| None).collect(),
            fetched: 0,
            cursor: 0,
            history: SmallVec::new(),
        }
    }

    /// Absolute index of the next token; only ever grows past a consumed token
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn slot(&self, index: usize) -> Option<&Token<S::Kind>> {
        if index >= self.fetched || index + BUFFER_SIZE < self.fetched {
            return None;
        }
        self.ring[index % BUFFER_SIZE].as_ref()
    }

    fn fill(&mut self) {
        loop {
            let token = self.source.next_token();
            if token.hidden {
                trace!("dropping hidden {:?} at {}", token.kind, token.start);
                continue;
            }
            self.ring[self.fetched % BUFFER_SIZE] = Some(token);
            self.fetched += 1;
            return;
        }
    }

    /// The most recently consumed token
    pub fn token(&self) -> Option<&Token<S::Kind>> {
        self.cursor.checked_sub(1).and_then(|index| self.slot(index))
    }

    /// Clone of the most recently consumed token
    pub fn current(&self) -> ParseResult<Token<S::Kind>> {
        self.token().cloned().ok_or(ParseError::Lookbehind)
    }

    /// Consume the next token on the default channel
    pub fn get(&mut self) -> ParseResult<S::Kind> {
        self.get_on(None)
    }

    /// Consume the next token visible on `channel`, skipping tokens that
    /// live on any other channel
    pub fn get_on(&mut self, channel: Option<Channel>) -> ParseResult<S::Kind> {
        let mut steps = 0;
        loop {
            if self.cursor == self.fetched {
                self.fill();
            }
            let index = self.cursor;
            self.cursor += 1;
            steps += 1;

            let token = self.slot(index).ok_or(ParseError::Lookbehind)?;
            let visible = token.channel.is_none() || token.channel == channel;
            if visible {
                let kind = token.kind;
                if self.history.len() == MAX_LOOKAHEAD {
                    self.history.remove(0);
                }
                self.history.push(steps);
                return Ok(kind);
            }
        }
    }

    /// Push the most recently consumed token back
    pub fn unget(&mut self) -> ParseResult<()> {
        let steps = self.history.pop().ok_or(ParseError::Lookahead)?;
        let target = self.cursor - steps;
        if target + BUFFER_SIZE < self.fetched {
            return Err(ParseError::Lookahead);
        }
        self.cursor = target;
        Ok(())
    }

    /// Consume the next token if it is one of `kinds`
    pub fn match_any(&mut self, kinds: &[S::Kind]) -> ParseResult<bool> {
        self.match_on(kinds, None)
    }

    /// Consume the next token on `channel` if it is one of `kinds`
    pub fn match_on(&mut self, kinds: &[S::Kind], channel: Option<Channel>) -> ParseResult<bool> {
        let kind = self.get_on(channel)?;
        if kinds.contains(&kind) {
            Ok(true)
        } else {
            self.unget()?;
            Ok(false)
        }
    }

    /// Consume the next token, which must be one of `kinds`
    pub fn must_match(&mut self, kinds: &[S::Kind]) -> ParseResult<Token<S::Kind>> {
        if self.match_any(kinds)? {
            return self.current();
        }
        let found = self.lt(1)?;
        let expected = kinds.first().copied().unwrap_or(S::Kind::EOF);
        Err(ParseError::expected(expected, found.start))
    }

    /// Type of the next default-channel token
    pub fn peek(&mut self) -> ParseResult<S::Kind> {
        self.la(1)
    }

    /// Type of the next token visible on `channel`
    pub fn peek_on(&mut self, channel: Option<Channel>) -> ParseResult<S::Kind> {
        let kind = self.get_on(channel)?;
        self.unget()?;
        Ok(kind)
    }

    /// Type of the token `k` positions away: ahead for positive `k`, the
    /// current token for zero, behind for negative `k`
    pub fn la(&mut self, k: isize) -> ParseResult<S::Kind> {
        Ok(self.lt(k)?.kind)
    }

    /// The token `k` positions away, without consuming anything
    pub fn lt(&mut self, k: isize) -> ParseResult<Token<S::Kind>> {
        if k > 0 {
            let ahead = k.unsigned_abs();
            if ahead > MAX_LOOKAHEAD {
                return Err(ParseError::Lookahead);
            }
            for _ in 0..ahead {
                self.get()?;
            }
            let token = self.current()?;
            for _ in 0..ahead {
                self.unget()?;
            }
            Ok(token)
        } else if k == 0 {
            self.current()
        } else {
            let behind = k.unsigned_abs();
            if behind > MAX_LOOKAHEAD {
                return Err(ParseError::Lookbehind);
            }
            self.cursor
                .checked_sub(1 + behind)
                .and_then(|index| self.slot(index))
                .cloned()
                .ok_or(ParseError::Lookbehind)
        }
    }

    /// Skip tokens until one of `kinds` is consumed or input ends.
    /// Returns the type of the last consumed token.
    pub fn advance(&mut self, kinds: &[S::Kind]) -> ParseResult<S::Kind> {
        loop {
            if self.token().map(|token| token.kind) == Some(S::Kind::EOF) {
                return Ok(S::Kind::EOF);
            }
            if self.match_any(kinds)? {
                return Ok(self.current()?.kind);
            }
            self.get()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;
    use crate::token::TokenKind;

    struct VecSource {
        tokens: Vec<Token>,
        index: usize,
    }

    impl TokenSource for VecSource {
        type Kind = TokenKind;

        fn next_token(&mut self) -> Token {
            let token = self.tokens.get(self.index).cloned().unwrap_or_else(|| {
                Token::new(TokenKind::Eof, "", Position::new(1, 99), Position::new(1, 99))
            });
            self.index += 1;
            token
        }
    }

    fn stream(kinds: &[(TokenKind, &str)]) -> TokenStream<VecSource> {
        let tokens = kinds
            .iter()
            .enumerate()
            .map(|(i, (kind, value))| {
                Token::new(*kind, *value, Position::new(1, i + 1), Position::new(1, i + 2))
            })
            .collect();
        TokenStream::new(VecSource { tokens, index: 0 })
    }

    #[test]
    fn test_get_skips_whitespace_channel() {
        let mut s = stream(&[(TokenKind::Ident, "a"), (TokenKind::S, " "), (TokenKind::Ident, "b")]);
        assert_eq!(s.get().unwrap(), TokenKind::Ident);
        assert_eq!(s.get().unwrap(), TokenKind::Ident);
        assert_eq!(s.token().unwrap().value, "b");
        assert_eq!(s.get().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_whitespace_on_request() {
        let mut s = stream(&[(TokenKind::Ident, "a"), (TokenKind::S, " "), (TokenKind::Ident, "b")]);
        s.get().unwrap();
        assert_eq!(s.peek_on(Some(Channel::Whitespace)).unwrap(), TokenKind::S);
        assert!(s.match_on(&[TokenKind::S], Some(Channel::Whitespace)).unwrap());
        assert!(!s.match_on(&[TokenKind::S], Some(Channel::Whitespace)).unwrap());
        assert_eq!(s.token().unwrap().kind, TokenKind::S);
    }

    #[test]
    fn test_hidden_tokens_dropped() {
        let mut s = stream(&[(TokenKind::Comment, "/* x */"), (TokenKind::Ident, "a")]);
        assert!(s.match_on(&[TokenKind::Ident], Some(Channel::Comment)).unwrap());
    }

    #[test]
    fn test_unget_restores_across_skipped_tokens() {
        let mut s = stream(&[(TokenKind::Ident, "a"), (TokenKind::S, " "), (TokenKind::Colon, ":")]);
        s.get().unwrap();
        s.get().unwrap();
        s.unget().unwrap();
        assert_eq!(s.token().unwrap().value, "a");
        assert_eq!(s.peek_on(Some(Channel::Whitespace)).unwrap(), TokenKind::S);
    }

    #[test]
    fn test_unget_without_history_fails() {
        let mut s = stream(&[(TokenKind::Ident, "a")]);
        assert_eq!(s.unget(), Err(ParseError::Lookahead));
    }

    #[test]
    fn test_lookahead_bound() {
        let mut s = stream(&[
            (TokenKind::Ident, "a"),
            (TokenKind::Comma, ","),
            (TokenKind::Ident, "b"),
            (TokenKind::Comma, ","),
            (TokenKind::Ident, "c"),
            (TokenKind::Lbrace, "{"),
        ]);
        assert_eq!(s.la(5).unwrap(), TokenKind::Ident);
        assert_eq!(s.lt(5).unwrap().value, "c");
        assert_eq!(s.la(6), Err(ParseError::Lookahead));
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_lookbehind() {
        let mut s = stream(&[(TokenKind::Ident, "a"), (TokenKind::Colon, ":"), (TokenKind::Ident, "b")]);
        s.get().unwrap();
        s.get().unwrap();
        assert_eq!(s.la(0).unwrap(), TokenKind::Colon);
        assert_eq!(s.la(-1).unwrap(), TokenKind::Ident);
        assert_eq!(s.la(-2), Err(ParseError::Lookbehind));
        assert_eq!(s.la(-6), Err(ParseError::Lookbehind));
    }

    #[test]
    fn test_unget_depth_is_bounded() {
        let kinds: Vec<(TokenKind, &str)> = (0..8).map(|_| (TokenKind::Ident, "x")).collect();
        let mut s = stream(&kinds);
        for _ in 0..7 {
            s.get().unwrap();
        }
        for _ in 0..MAX_LOOKAHEAD {
            s.unget().unwrap();
        }
        assert_eq!(s.unget(), Err(ParseError::Lookahead));
    }

    #[test]
    fn test_must_match_reports_expected_type() {
        let mut s = stream(&[(TokenKind::Ident, "a")]);
        let err = s.must_match(&[TokenKind::Lbrace]).unwrap_err();
        assert_eq!(err.to_string(), "Expected LBRACE at line 1, col 1.");
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_advance_to_sync_token() {
        let mut s = stream(&[
            (TokenKind::Ident, "a"),
            (TokenKind::Colon, ":"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Ident, "b"),
        ]);
        s.get().unwrap();
        assert_eq!(s.advance(&[TokenKind::Semicolon, TokenKind::Rbrace]).unwrap(), TokenKind::Semicolon);
        assert_eq!(s.peek().unwrap(), TokenKind::Ident);
        assert_eq!(s.advance(&[TokenKind::Rbrace]).unwrap(), TokenKind::Eof);
    }
}
