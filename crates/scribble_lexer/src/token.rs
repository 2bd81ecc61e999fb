//! Token types produced by [`crate::Lexer`].
//!
//! A token is an immutable value: kind, the exact source slice it came
//! from, the location of its first byte, and a kind-specific payload.
//! Tokens never own their text — `text` always borrows from the source
//! that produced them, which is why a [`Token`] cannot outlive the
//! [`crate::Lexer`] that scanned it.

use scribble_base::Location;

/// The coarse category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Unknown,
    EndOfFile,
    EndOfLine,
    Symbol,
    Keyword,
    Identifier,
    Number,
    QuotedString,
    Comment,
    Whitespace,
    Directive,
    DirectiveArgument,
    Module,
    Program,
}

/// Numeric literal subtype, distinguished by the prefix the lexer consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Integer,
    Decimal,
    Hex,
    Binary,
}

/// Which quote character opened a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Single,
    Double,
    Back,
}

/// Which comment syntax opened a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    Line,
    Block,
}

/// Kind-specific data a token carries beyond its raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPayload {
    None,
    Number(NumberKind),
    QuotedString {
        quote: QuoteKind,
        /// `"""`/`'''`-delimited literal rather than a single-character quote.
        triple: bool,
        terminated: bool,
    },
    Comment {
        kind: CommentKind,
        terminated: bool,
    },
    /// Index into the active [`crate::Language`]'s keyword table.
    Keyword(u32),
    /// Index into the active [`crate::Language`]'s directive table.
    Directive(u32),
    /// The symbol's character, widened to `u32` so multi-byte symbols (none
    /// defined yet, but the field shape allows them) are representable.
    Symbol(u32),
}

/// A single lexical token.
///
/// `text` borrows from whichever [`crate::Source`] produced it; the
/// invariant `text` is always a substring of that source's original text is
/// maintained entirely by [`crate::Lexer`] — tokens themselves don't (and
/// can't) check it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub location: Location,
    pub payload: TokenPayload,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, location: Location, payload: TokenPayload) -> Self {
        Token {
            kind,
            text,
            location,
            payload,
        }
    }

    /// `true` if this token's kind and (for keyword/directive/symbol
    /// tokens) payload code match the given kind and code.
    pub fn matches(&self, kind: TokenKind, code: Option<u32>) -> bool {
        if self.kind != kind {
            return false;
        }
        match code {
            None => true,
            Some(c) => match self.payload {
                TokenPayload::Keyword(k) => k == c,
                TokenPayload::Directive(d) => d == c,
                TokenPayload::Symbol(s) => s == c,
                _ => false,
            },
        }
    }

    /// `true` for token kinds the lexer skips by default (whitespace, comments).
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::start_of("test.scribble")
    }

    #[test]
    fn matches_checks_kind_only_when_no_code_given() {
        let tok = Token::new(TokenKind::Identifier, "foo", loc(), TokenPayload::None);
        assert!(tok.matches(TokenKind::Identifier, None));
        assert!(!tok.matches(TokenKind::Keyword, None));
    }

    #[test]
    fn matches_checks_keyword_code() {
        let tok = Token::new(TokenKind::Keyword, "func", loc(), TokenPayload::Keyword(3));
        assert!(tok.matches(TokenKind::Keyword, Some(3)));
        assert!(!tok.matches(TokenKind::Keyword, Some(4)));
    }

    #[test]
    fn whitespace_and_comments_are_trivia() {
        let ws = Token::new(TokenKind::Whitespace, " ", loc(), TokenPayload::None);
        let comment = Token::new(
            TokenKind::Comment,
            "// hi",
            loc(),
            TokenPayload::Comment {
                kind: CommentKind::Line,
                terminated: true,
            },
        );
        let ident = Token::new(TokenKind::Identifier, "x", loc(), TokenPayload::None);
        assert!(ws.is_trivia());
        assert!(comment.is_trivia());
        assert!(!ident.is_trivia());
    }
}
