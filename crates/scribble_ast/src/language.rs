//! The [`scribble_lexer::Language`] the compiler frontend lexes scribble
//! source with. Source-level syntax is left open by `spec.md` (§1's
//! Non-goals: "does not cover source-level language surface beyond what
//! the IR/codegen contract requires") — this is this compiler's own
//! concrete surface over the §3 syntax-node kinds.

use scribble_lexer::{Keyword, Language};

/// Keyword codes the parser matches on.
pub mod kw {
    pub const MODULE: u32 = 0;
    pub const IMPORT: u32 = 1;
    pub const FUNC: u32 = 2;
    pub const NATIVE: u32 = 3;
    pub const RETURN: u32 = 4;
    pub const IF: u32 = 5;
    pub const ELSE: u32 = 6;
    pub const FOR: u32 = 7;
    pub const IN: u32 = 8;
    pub const WHILE: u32 = 9;
    pub const LOOP: u32 = 10;
    pub const BREAK: u32 = 11;
    pub const CONTINUE: u32 = 12;
    pub const VAR: u32 = 13;
    pub const CONST: u32 = 14;
    pub const STRUCT: u32 = 15;
    pub const VARIANT: u32 = 16;
    pub const ENUM: u32 = 17;
    pub const TRUE: u32 = 18;
    pub const FALSE: u32 = 19;
    pub const MACRO: u32 = 20;
}

pub fn scribble_language() -> Language {
    Language::new("scribble").with_keywords(vec![
        Keyword::new("module", kw::MODULE),
        Keyword::new("import", kw::IMPORT),
        Keyword::new("func", kw::FUNC),
        Keyword::new("native", kw::NATIVE),
        Keyword::new("return", kw::RETURN),
        Keyword::new("if", kw::IF),
        Keyword::new("else", kw::ELSE),
        Keyword::new("for", kw::FOR),
        Keyword::new("in", kw::IN),
        Keyword::new("while", kw::WHILE),
        Keyword::new("loop", kw::LOOP),
        Keyword::new("break", kw::BREAK),
        Keyword::new("continue", kw::CONTINUE),
        Keyword::new("var", kw::VAR),
        Keyword::new("const", kw::CONST),
        Keyword::new("struct", kw::STRUCT),
        Keyword::new("variant", kw::VARIANT),
        Keyword::new("enum", kw::ENUM),
        Keyword::new("true", kw::TRUE),
        Keyword::new("false", kw::FALSE),
        Keyword::new("macro", kw::MACRO),
        // Multi-character symbol "keywords" — longest-prefix-match puts
        // these ahead of their single-character prefixes in the table.
        Keyword::new("==", 100),
        Keyword::new("!=", 101),
        Keyword::new("<=", 102),
        Keyword::new(">=", 103),
        Keyword::new("&&", 104),
        Keyword::new("||", 105),
        Keyword::new("->", 106),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_lexer::{Lexer, TokenKind, TokenPayload};

    #[test]
    fn keywords_lex_distinctly_from_identifiers() {
        let mut lexer = Lexer::for_source(scribble_language(), "func main", "test.scribble");
        let tok = lexer.next();
        assert_eq!(tok.kind, TokenKind::Keyword);
        assert!(matches!(tok.payload, TokenPayload::Keyword(kw::FUNC)));
        let name = lexer.next();
        assert_eq!(name.kind, TokenKind::Identifier);
        assert_eq!(name.text, "main");
    }

    #[test]
    fn two_character_operators_win_over_their_prefix() {
        let mut lexer = Lexer::for_source(scribble_language(), "a == b", "test.scribble");
        lexer.next();
        let tok = lexer.next();
        assert_eq!(tok.text, "==");
        assert_eq!(tok.kind, TokenKind::Symbol);
        assert!(matches!(tok.payload, TokenPayload::Symbol(100)));
    }
}
