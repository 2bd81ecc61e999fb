//! The TypeScript-subset [`scribble_lexer::Language`] the schema parser
//! lexes with.
//!
//! Grounded on `spec.md` §4.3 step 1's keyword list; this is the same
//! `scribble_lexer::Lexer` the compiler frontend uses, configured with no
//! preprocessor (TypeScript schema files have none).

use scribble_lexer::{Keyword, Language};

/// Keyword codes, stable across calls — the parser matches on these, not
/// on the keyword text, so renaming a keyword's spelling here would only
/// require updating [`ts_language`].
pub mod kw {
    pub const BOOLEAN: u32 = 0;
    pub const CONST: u32 = 1;
    pub const DECIMAL: u32 = 2;
    pub const ENUM: u32 = 3;
    pub const EXPORT: u32 = 4;
    pub const EXTENDS: u32 = 5;
    pub const INTEGER: u32 = 6;
    pub const INTERFACE: u32 = 7;
    pub const LSP_ANY: u32 = 8;
    pub const NAMESPACE: u32 = 9;
    pub const NULL: u32 = 10;
    pub const STRING: u32 = 11;
    pub const TYPE: u32 = 12;
    pub const UINTEGER: u32 = 13;
}

pub fn ts_language() -> Language {
    Language::new("typescript-schema").with_keywords(vec![
        Keyword::new("boolean", kw::BOOLEAN),
        Keyword::new("const", kw::CONST),
        Keyword::new("decimal", kw::DECIMAL),
        Keyword::new("enum", kw::ENUM),
        Keyword::new("export", kw::EXPORT),
        Keyword::new("extends", kw::EXTENDS),
        Keyword::new("integer", kw::INTEGER),
        Keyword::new("interface", kw::INTERFACE),
        Keyword::new("LSPAny", kw::LSP_ANY),
        Keyword::new("namespace", kw::NAMESPACE),
        Keyword::new("null", kw::NULL),
        Keyword::new("string", kw::STRING),
        Keyword::new("type", kw::TYPE),
        Keyword::new("uinteger", kw::UINTEGER),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_lexer::{Lexer, TokenKind, TokenPayload};

    #[test]
    fn keywords_lex_distinctly_from_identifiers() {
        let mut lexer = Lexer::for_source(ts_language(), "interface Foo", "schema.ts");
        let tok = lexer.next();
        assert_eq!(tok.kind, TokenKind::Keyword);
        assert!(matches!(tok.payload, TokenPayload::Keyword(kw::INTERFACE)));
        let name = lexer.next();
        assert_eq!(name.kind, TokenKind::Identifier);
        assert_eq!(name.text, "Foo");
    }
}
