//! Per-language configuration plugged into a [`crate::Lexer`].
//!
//! A [`Language`] is the only thing that differs between lexing scribble
//! source, an included header, or a TypeScript schema file: the keyword
//! table, which symbol (if any) triggers the preprocessor, the directive
//! name table, and how an active directive consumes its argument.

use crate::lexer::Lexer;
use crate::token::Token;

/// One entry of a language's keyword table.
///
/// Longest-match wins: when scanning an identifier-shaped run of
/// characters, [`crate::Lexer`] checks it against every keyword whose
/// length equals the run's length before falling back to `Identifier`, and
/// separately checks multi-character *symbol* keywords (operators like
/// `==` or `->`) by longest prefix match against the keyword table too.
#[derive(Debug, Clone, Copy)]
pub struct Keyword {
    pub text: &'static str,
    pub code: u32,
}

impl Keyword {
    pub const fn new(text: &'static str, code: u32) -> Self {
        Keyword { text, code }
    }
}

/// Handles an active preprocessor directive.
///
/// Invoked once per call to [`Lexer::next`]/[`Lexer::peek`] while a
/// directive is active. Returns `Some(token)` to emit a directive-argument
/// token and keep the directive active, or `None` once the directive's
/// argument has been fully consumed (clearing the active-directive state).
pub trait DirectiveHandler {
    fn handle<'a>(&mut self, lexer: &mut Lexer<'a>, active_directive: u32) -> Option<Token<'a>>;
}

/// A directive handler that never claims a directive argument — scanning
/// simply re-emits the trigger symbol. Used by languages with no
/// preprocessor (the default).
#[derive(Debug, Default)]
pub struct NoDirectives;

impl DirectiveHandler for NoDirectives {
    fn handle<'a>(&mut self, _lexer: &mut Lexer<'a>, _active_directive: u32) -> Option<Token<'a>> {
        None
    }
}

/// Configuration for a single source language.
pub struct Language {
    pub name: &'static str,
    pub keywords: Vec<Keyword>,
    /// The symbol code that, when scanned with no directive currently
    /// active, hands control to `directives` and `directive_handler`
    /// (e.g. `#` for a C-style preprocessor). `None` disables directives.
    pub preprocessor_trigger: Option<u32>,
    pub directives: Vec<&'static str>,
    pub directive_handler: Box<dyn DirectiveHandler>,
    /// `true` if whitespace inside this language is syntactically
    /// significant (e.g. an indentation-sensitive language); affects only
    /// whether [`Lexer::next`] skips whitespace tokens, never [`Lexer::peek`].
    pub whitespace_significant: bool,
}

impl Language {
    pub fn new(name: &'static str) -> Self {
        Language {
            name,
            keywords: Vec::new(),
            preprocessor_trigger: None,
            directives: Vec::new(),
            directive_handler: Box::new(NoDirectives),
            whitespace_significant: false,
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<Keyword>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_directives(
        mut self,
        trigger: u32,
        names: Vec<&'static str>,
        handler: Box<dyn DirectiveHandler>,
    ) -> Self {
        self.preprocessor_trigger = Some(trigger);
        self.directives = names;
        self.directive_handler = handler;
        self
    }

    pub fn whitespace_significant(mut self, significant: bool) -> Self {
        self.whitespace_significant = significant;
        self
    }

    /// Longest keyword whose text exactly matches `word` (used for
    /// identifier-shaped runs: `func` retags as a keyword, `funct` does not).
    pub fn keyword_exact(&self, word: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.text == word)
    }

    /// Longest keyword that is a prefix of `remaining` (used for symbol
    /// keywords like `==`, `->`, `<=`).
    pub fn keyword_prefix(&self, remaining: &str) -> Option<&Keyword> {
        self.keywords
            .iter()
            .filter(|k| remaining.starts_with(k.text))
            .max_by_key(|k| k.text.len())
    }

    /// The directive name table index for `name`, if `name` names a
    /// directive this language recognises.
    pub fn directive_code(&self, name: &str) -> Option<u32> {
        self.directives.iter().position(|d| *d == name).map(|i| i as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_exact_matches_full_word_only() {
        let lang = Language::new("test").with_keywords(vec![Keyword::new("func", 1), Keyword::new("for", 2)]);
        assert_eq!(lang.keyword_exact("func").map(|k| k.code), Some(1));
        assert_eq!(lang.keyword_exact("funct"), None);
    }

    #[test]
    fn keyword_prefix_picks_longest_match() {
        let lang = Language::new("test").with_keywords(vec![
            Keyword::new("=", 1),
            Keyword::new("==", 2),
            Keyword::new("===", 3),
        ]);
        assert_eq!(lang.keyword_prefix("==x").map(|k| k.code), Some(2));
        assert_eq!(lang.keyword_prefix("=x").map(|k| k.code), Some(1));
    }

    #[test]
    fn directive_code_looks_up_registered_name() {
        let lang = Language::new("test").with_directives(b'#' as u32, vec!["include", "define"], Box::new(NoDirectives));
        assert_eq!(lang.directive_code("include"), Some(0));
        assert_eq!(lang.directive_code("define"), Some(1));
        assert_eq!(lang.directive_code("nope"), None);
    }
}
