//! The scanning engine: a stack of sources feeding a one-token lookahead.

use std::rc::Rc;

use scribble_base::{Location, SpannedError};

use crate::language::Language;
use crate::token::{CommentKind, NumberKind, QuoteKind, Token, TokenKind, TokenPayload};

/// One entry of the source stack. Pushed by `#include`-style directives,
/// popped on exhaustion; popping past the last source yields end-of-file
/// rather than an error.
struct Source<'a> {
    name: Rc<str>,
    remaining: &'a str,
    location: Location,
}

/// Error raised by [`Lexer::expect`] / [`Lexer::expect_kind`]. Scanning
/// itself never fails — unterminated strings and comments surface as
/// explicit token subtypes instead.
pub type LexerError = SpannedError;

/// A configurable lexer: a stack of source texts plus a one-token lookahead,
/// parameterised by a [`Language`] descriptor.
///
/// Invariant: `lookahead.text` is always a prefix of the top source's
/// remaining text. Push/pop of sources is the only legal way to enter or
/// leave an included file.
pub struct Lexer<'a> {
    sources: Vec<Source<'a>>,
    language: Language,
    lookahead: Option<Token<'a>>,
    in_block_comment: bool,
    active_directive: Option<u32>,
    whitespace_significant: bool,
    include_comments: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(language: Language) -> Self {
        let whitespace_significant = language.whitespace_significant;
        Lexer {
            sources: Vec::new(),
            language,
            lookahead: None,
            in_block_comment: false,
            active_directive: None,
            whitespace_significant,
            include_comments: false,
        }
    }

    pub fn for_source(language: Language, text: &'a str, name: impl Into<Rc<str>>) -> Self {
        let mut lexer = Self::new(language);
        lexer.push_source(text, name);
        lexer
    }

    pub fn set_whitespace_significant(&mut self, significant: bool) {
        self.whitespace_significant = significant;
    }

    pub fn set_include_comments(&mut self, include: bool) {
        self.include_comments = include;
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Pushes a new source onto the stack. Invalidates the current
    /// lookahead so the next `peek`/`next` scans from the new source.
    pub fn push_source(&mut self, text: &'a str, name: impl Into<Rc<str>>) {
        let name = name.into();
        self.sources.push(Source {
            location: Location::start_of(name.clone()),
            name,
            remaining: text,
        });
        self.lookahead = None;
    }

    /// Pops the current source. Popping the last source leaves the stack
    /// empty; subsequent scans report end-of-file.
    pub fn pop_source(&mut self) {
        self.sources.pop();
        self.lookahead = None;
    }

    fn current_source_text(&self) -> &'a str {
        self.sources.last().map(|s| s.remaining).unwrap_or("")
    }

    fn current_location(&self) -> Location {
        self.sources
            .last()
            .map(|s| s.location.clone())
            .unwrap_or_else(|| Location::start_of("<eof>"))
    }

    /// Returns the current lookahead without consuming it. Idempotent.
    pub fn peek(&mut self) -> Token<'a> {
        if let Some(tok) = &self.lookahead {
            return tok.clone();
        }
        let tok = self.scan();
        self.lookahead = Some(tok.clone());
        tok
    }

    /// Advances past the current lookahead and returns it, refilling the
    /// lookahead from the (possibly now-popped) current source. Skips
    /// whitespace and comment tokens unless the corresponding flag is set.
    pub fn next(&mut self) -> Token<'a> {
        loop {
            let tok = self.peek();
            if tok.kind == TokenKind::EndOfFile && self.sources.len() > 1 {
                self.pop_source();
                continue;
            }
            let skip = (tok.kind == TokenKind::Whitespace && !self.whitespace_significant)
                || (tok.kind == TokenKind::Comment && !self.include_comments);
            self.consume_lookahead();
            if !skip {
                return tok;
            }
        }
    }

    /// Consumes and returns the current token if it matches; otherwise
    /// fails with [`LexerError`] without advancing.
    pub fn expect(&mut self, kind: TokenKind, code: Option<u32>) -> Result<Token<'a>, LexerError> {
        let tok = self.peek();
        if !tok.matches(kind, code) {
            return Err(SpannedError::new(
                format!("expected {:?}, found {:?} ({:?})", kind, tok.kind, tok.text),
                scribble_base::Span::new(tok.location.byte_index, tok.location.byte_index + tok.text.len()),
            ));
        }
        Ok(self.next())
    }

    /// Non-destructive predicate: does the current token match?
    pub fn next_matches(&mut self, kind: TokenKind, code: Option<u32>) -> bool {
        self.peek().matches(kind, code)
    }

    fn consume_lookahead(&mut self) {
        let Some(tok) = self.lookahead.take() else {
            return;
        };
        let len = tok.text.len();
        if let Some(src) = self.sources.last_mut() {
            src.location.advance(tok.text);
            src.remaining = &src.remaining[len..];
        }
    }

    /// Scans exactly one token from the current state without consuming it
    /// from `self.lookahead` bookkeeping (callers cache the result).
    fn scan(&mut self) -> Token<'a> {
        if self.sources.is_empty() {
            return Token::new(TokenKind::EndOfFile, "", Location::start_of("<eof>"), TokenPayload::None);
        }
        if let Some(active) = self.active_directive {
            let mut handler = std::mem::replace(&mut self.language.directive_handler, Box::new(crate::language::NoDirectives));
            let result = handler.handle(self, active);
            self.language.directive_handler = handler;
            match result {
                Some(tok) => return tok,
                None => self.active_directive = None,
            }
        }
        self.scan_raw()
    }

    fn scan_raw(&mut self) -> Token<'a> {
        let source = self.current_source_text();
        let location = self.current_location();

        if source.is_empty() {
            return Token::new(TokenKind::EndOfFile, "", location, TokenPayload::None);
        }

        let first = source.as_bytes()[0];

        if first == b'\n' {
            return Token::new(TokenKind::EndOfLine, &source[..1], location, TokenPayload::None);
        }

        if self.in_block_comment {
            return self.scan_block_comment_continuation(source, location);
        }

        match first {
            b' ' | b'\t' | b'\r' => self.scan_whitespace(source, location),
            b'\'' | b'"' | b'`' => self.scan_quoted_string(source, location),
            b'/' if source.as_bytes().get(1) == Some(&b'/') => self.scan_line_comment(source, location),
            b'/' if source.as_bytes().get(1) == Some(&b'*') => self.scan_block_comment(source, location, 2),
            b'0'..=b'9' => self.scan_number(source, location),
            b'_' => self.scan_identifier_or_keyword(source, location),
            c if c.is_ascii_alphabetic() => self.scan_identifier_or_keyword(source, location),
            _ => self.scan_symbol_or_directive(source, location),
        }
    }

    fn scan_whitespace(&self, source: &'a str, location: Location) -> Token<'a> {
        let end = source
            .as_bytes()
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r'))
            .count();
        Token::new(TokenKind::Whitespace, &source[..end], location, TokenPayload::None)
    }

    fn scan_quoted_string(&self, source: &'a str, location: Location) -> Token<'a> {
        let bytes = source.as_bytes();
        let quote_char = bytes[0];
        let quote = match quote_char {
            b'\'' => QuoteKind::Single,
            b'"' => QuoteKind::Double,
            _ => QuoteKind::Back,
        };
        let mut ix = 1;
        while ix < bytes.len() && bytes[ix] != quote_char {
            if bytes[ix] == b'\\' {
                ix += 1;
            }
            if ix < bytes.len() {
                ix += 1;
            }
        }
        let terminated = ix < bytes.len();
        let end = if terminated { ix + 1 } else { ix };
        Token::new(
            TokenKind::QuotedString,
            &source[..end],
            location,
            TokenPayload::QuotedString {
                quote,
                triple: false,
                terminated,
            },
        )
    }

    fn scan_line_comment(&self, source: &'a str, location: Location) -> Token<'a> {
        let end = source.as_bytes().iter().position(|&b| b == b'\n').unwrap_or(source.len());
        Token::new(
            TokenKind::Comment,
            &source[..end],
            location,
            TokenPayload::Comment {
                kind: CommentKind::Line,
                terminated: true,
            },
        )
    }

    fn scan_block_comment(&mut self, source: &'a str, location: Location, start: usize) -> Token<'a> {
        self.scan_block_comment_from(source, location, start)
    }

    fn scan_block_comment_continuation(&mut self, source: &'a str, location: Location) -> Token<'a> {
        self.scan_block_comment_from(source, location, 0)
    }

    fn scan_block_comment_from(&mut self, source: &'a str, location: Location, start: usize) -> Token<'a> {
        let bytes = source.as_bytes();
        let mut ix = start;
        while ix < bytes.len() && bytes[ix] != b'\n' {
            if bytes[ix] == b'*' && bytes.get(ix + 1) == Some(&b'/') {
                self.in_block_comment = false;
                return Token::new(
                    TokenKind::Comment,
                    &source[..ix + 2],
                    location,
                    TokenPayload::Comment {
                        kind: CommentKind::Block,
                        terminated: true,
                    },
                );
            }
            ix += 1;
        }
        if ix >= bytes.len() {
            self.in_block_comment = false;
            return Token::new(
                TokenKind::Comment,
                &source[..ix],
                location,
                TokenPayload::Comment {
                    kind: CommentKind::Block,
                    terminated: false,
                },
            );
        }
        // Hit a newline with no closing `*/` yet: comment continues on the next line.
        self.in_block_comment = true;
        Token::new(
            TokenKind::Comment,
            &source[..ix],
            location,
            TokenPayload::Comment {
                kind: CommentKind::Block,
                terminated: false,
            },
        )
    }

    fn scan_number(&self, source: &'a str, location: Location) -> Token<'a> {
        let bytes = source.as_bytes();
        if bytes.starts_with(b"0x") || bytes.starts_with(b"0X") {
            let end = 2 + bytes[2..].iter().take_while(|b| b.is_ascii_hexdigit()).count();
            let end = end.max(1);
            return Token::new(TokenKind::Number, &source[..end], location, TokenPayload::Number(NumberKind::Hex));
        }
        if bytes.starts_with(b"0b") || bytes.starts_with(b"0B") {
            let end = 2 + bytes[2..].iter().take_while(|b| *b == b'0' || *b == b'1').count();
            let end = end.max(1);
            return Token::new(TokenKind::Number, &source[..end], location, TokenPayload::Number(NumberKind::Binary));
        }
        let mut ix = 0;
        let mut kind = NumberKind::Integer;
        let mut seen_dot = false;
        while ix < bytes.len() {
            let c = bytes[ix];
            if c.is_ascii_digit() {
                ix += 1;
                continue;
            }
            if c == b'.' && !seen_dot && bytes.get(ix + 1) != Some(&b'.') {
                seen_dot = true;
                kind = NumberKind::Decimal;
                ix += 1;
                continue;
            }
            break;
        }
        Token::new(TokenKind::Number, &source[..ix], location, TokenPayload::Number(kind))
    }

    fn scan_identifier_or_keyword(&self, source: &'a str, location: Location) -> Token<'a> {
        let end = source
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(1);
        let word = &source[..end];
        if let Some(kw) = self.language.keyword_exact(word) {
            return Token::new(TokenKind::Keyword, word, location, TokenPayload::Keyword(kw.code));
        }
        Token::new(TokenKind::Identifier, word, location, TokenPayload::None)
    }

    fn scan_symbol_or_directive(&mut self, source: &'a str, location: Location) -> Token<'a> {
        if let Some(kw) = self.language.keyword_prefix(source) {
            let text = &source[..kw.text.len()];
            let code = kw.code;
            if self.maybe_trigger_directive(code, text, location.clone()) {
                return self.directive_trigger_token(text, location, code);
            }
            return Token::new(TokenKind::Symbol, text, location, TokenPayload::Symbol(code));
        }
        let ch = source.chars().next().unwrap();
        let len = ch.len_utf8();
        let text = &source[..len];
        let code = ch as u32;
        if self.maybe_trigger_directive(code, text, location.clone()) {
            return self.directive_trigger_token(text, location, code);
        }
        Token::new(TokenKind::Symbol, text, location, TokenPayload::Symbol(code))
    }

    fn maybe_trigger_directive(&self, code: u32, _text: &str, _location: Location) -> bool {
        self.active_directive.is_none() && self.language.preprocessor_trigger == Some(code)
    }

    fn directive_trigger_token(&mut self, text: &'a str, location: Location, code: u32) -> Token<'a> {
        // Skip whitespace, then scan an identifier naming the directive.
        let after_trigger = &self.current_source_text()[text.len()..];
        let ws_len = after_trigger.bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
        let ident_start = &after_trigger[ws_len..];
        let ident_len = ident_start
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        if ident_len == 0 {
            return Token::new(TokenKind::Symbol, text, location, TokenPayload::Symbol(code));
        }
        let name = &ident_start[..ident_len];
        match self.language.directive_code(name) {
            Some(directive_code) => {
                self.active_directive = Some(directive_code);
                let full_len = text.len() + ws_len + ident_len;
                let full_text = &self.current_source_text()[..full_len];
                Token::new(TokenKind::Directive, full_text, location, TokenPayload::Directive(directive_code))
            }
            None => Token::new(TokenKind::Symbol, text, location, TokenPayload::Symbol(code)),
        }
    }

    /// Consumes exactly `len` bytes of the current source as a
    /// directive-argument token. Intended for use from inside a
    /// [`crate::language::DirectiveHandler::handle`] implementation.
    pub fn take_directive_argument(&mut self, len: usize) -> Token<'a> {
        let source = self.current_source_text();
        let location = self.current_location();
        let len = len.min(source.len());
        Token::new(TokenKind::DirectiveArgument, &source[..len], location, TokenPayload::None)
    }

    /// Clears the active directive state — called by a directive handler
    /// once it has consumed the directive's entire argument.
    pub fn clear_active_directive(&mut self) {
        self.active_directive = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Keyword;

    fn plain_lexer(text: &str) -> Lexer<'_> {
        Lexer::for_source(Language::new("plain"), text, "test.scribble")
    }

    #[test]
    fn reaches_eof_on_empty_input() {
        let mut lexer = plain_lexer("");
        assert_eq!(lexer.next().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn peek_is_idempotent() {
        let mut lexer = plain_lexer("abc");
        let a = lexer.peek();
        let b = lexer.peek();
        assert_eq!(a.text, b.text);
        assert_eq!(a.text, "abc");
    }

    #[test]
    fn next_advances_past_lookahead() {
        let mut lexer = plain_lexer("ab cd");
        assert_eq!(lexer.next().text, "ab");
        assert_eq!(lexer.next().text, "cd");
        assert_eq!(lexer.next().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn whitespace_skipped_by_default() {
        let mut lexer = plain_lexer("a   b");
        assert_eq!(lexer.next().text, "a");
        assert_eq!(lexer.next().text, "b");
    }

    #[test]
    fn whitespace_significant_mode_returns_whitespace_tokens() {
        let mut lexer = plain_lexer("a b");
        lexer.set_whitespace_significant(true);
        assert_eq!(lexer.next().text, "a");
        assert_eq!(lexer.next().kind, TokenKind::Whitespace);
        assert_eq!(lexer.next().text, "b");
    }

    #[test]
    fn identifier_matching_keyword_becomes_keyword() {
        let lang = Language::new("test").with_keywords(vec![Keyword::new("func", 1)]);
        let mut lexer = Lexer::for_source(lang, "func functor", "t");
        let tok = lexer.next();
        assert_eq!(tok.kind, TokenKind::Keyword);
        assert!(matches!(tok.payload, TokenPayload::Keyword(1)));
        let tok2 = lexer.next();
        assert_eq!(tok2.kind, TokenKind::Identifier);
        assert_eq!(tok2.text, "functor");
    }

    #[test]
    fn numbers_detect_hex_and_binary_and_decimal() {
        let mut lexer = plain_lexer("0x1F 0b101 3.14 42");
        assert!(matches!(lexer.next().payload, TokenPayload::Number(NumberKind::Hex)));
        assert!(matches!(lexer.next().payload, TokenPayload::Number(NumberKind::Binary)));
        assert!(matches!(lexer.next().payload, TokenPayload::Number(NumberKind::Decimal)));
        assert!(matches!(lexer.next().payload, TokenPayload::Number(NumberKind::Integer)));
    }

    #[test]
    fn double_dot_stops_decimal_scan_before_second_dot() {
        let mut lexer = plain_lexer("1..10");
        let first = lexer.next();
        assert_eq!(first.text, "1");
        assert!(matches!(first.payload, TokenPayload::Number(NumberKind::Integer)));
    }

    #[test]
    fn unterminated_string_is_explicit_not_infinite() {
        let mut lexer = plain_lexer("\"unterminated");
        let tok = lexer.next();
        assert_eq!(tok.kind, TokenKind::QuotedString);
        assert!(matches!(
            tok.payload,
            TokenPayload::QuotedString { terminated: false, .. }
        ));
        assert_eq!(lexer.next().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn terminated_quoted_string_respects_escaped_quote() {
        let mut lexer = plain_lexer(r#""say \"hi\"" rest"#);
        let tok = lexer.next();
        assert_eq!(tok.text, r#""say \"hi\"""#);
        assert!(matches!(
            tok.payload,
            TokenPayload::QuotedString { terminated: true, .. }
        ));
    }

    #[test]
    fn line_comment_stops_before_newline() {
        let mut lexer = plain_lexer("// hello\nnext");
        lexer.set_include_comments(true);
        let tok = lexer.next();
        assert_eq!(tok.kind, TokenKind::Comment);
        assert_eq!(tok.text, "// hello");
        assert_eq!(lexer.next().kind, TokenKind::EndOfLine);
        assert_eq!(lexer.next().text, "next");
    }

    #[test]
    fn unterminated_block_comment_reaches_eof() {
        let mut lexer = plain_lexer("/* never closes");
        lexer.set_include_comments(true);
        let tok = lexer.next();
        assert!(matches!(
            tok.payload,
            TokenPayload::Comment {
                kind: CommentKind::Block,
                terminated: false
            }
        ));
        assert_eq!(lexer.next().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn block_comment_spanning_lines_marks_in_comment_state() {
        let mut lexer = plain_lexer("/* line one\nline two */done");
        lexer.set_include_comments(true);
        let first = lexer.next();
        assert_eq!(first.kind, TokenKind::Comment);
        assert!(!first.text.contains('\n'));
        assert_eq!(lexer.next().kind, TokenKind::EndOfLine);
        let second = lexer.next();
        assert_eq!(second.kind, TokenKind::Comment);
        assert!(second.text.ends_with("*/"));
        assert_eq!(lexer.next().text, "done");
    }

    #[test]
    fn longest_symbol_keyword_wins() {
        let lang = Language::new("test").with_keywords(vec![
            Keyword::new("=", 1),
            Keyword::new("==", 2),
        ]);
        let mut lexer = Lexer::for_source(lang, "== =", "t");
        assert!(matches!(lexer.next().payload, TokenPayload::Symbol(2)));
        assert!(matches!(lexer.next().payload, TokenPayload::Symbol(1)));
    }

    #[test]
    fn push_pop_source_restores_outer_source() {
        let mut lexer = plain_lexer("outer");
        lexer.push_source("inner", "included.scribble");
        assert_eq!(lexer.next().text, "inner");
        assert_eq!(lexer.next().kind, TokenKind::EndOfFile);
        lexer.pop_source();
        assert_eq!(lexer.next().text, "outer");
    }

    #[test]
    fn expect_fails_without_advancing_on_mismatch() {
        let mut lexer = plain_lexer("abc");
        let err = lexer.expect(TokenKind::Number, None);
        assert!(err.is_err());
        // Lookahead untouched: still able to read the identifier.
        assert_eq!(lexer.next().text, "abc");
    }

    #[test]
    fn expect_advances_on_match() {
        let mut lexer = plain_lexer("abc def");
        let tok = lexer.expect(TokenKind::Identifier, None).unwrap();
        assert_eq!(tok.text, "abc");
        assert_eq!(lexer.next().text, "def");
    }

    #[test]
    fn next_matches_does_not_advance() {
        let mut lexer = plain_lexer("abc");
        assert!(lexer.next_matches(TokenKind::Identifier, None));
        assert!(lexer.next_matches(TokenKind::Identifier, None));
        assert_eq!(lexer.next().text, "abc");
    }

    #[test]
    fn location_tracks_line_and_column_across_tokens() {
        let mut lexer = plain_lexer("ab\ncd");
        let first = lexer.next();
        assert_eq!((first.location.line, first.location.column), (1, 1));
        let eol = lexer.next();
        assert_eq!(eol.kind, TokenKind::EndOfLine);
        let second = lexer.next();
        assert_eq!((second.location.line, second.location.column), (2, 1));
    }
}
