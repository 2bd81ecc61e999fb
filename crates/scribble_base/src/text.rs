//! Small string helpers shared by the codegen and template layers.

/// Escapes `s` for embedding inside a double-quoted assembler string
/// directive (`.asciz "..."`). Backslash and `"` are escaped; everything
/// else passes through verbatim, matching what the reference assembler
/// expects.
pub fn escape_asciz(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Un-escapes a single-character backslash escape the way the lexer's
/// quoted-string scanning treats it: `\` always consumes exactly one
/// following character literally (no `\n`/`\t` translation at the lexer
/// level — that is a codegen/runtime concern).
pub fn unescape_single_char(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_asciz_escapes_quotes_and_backslashes() {
        assert_eq!(escape_asciz(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_asciz(r"a\b"), r"a\\b");
    }

    #[test]
    fn escape_asciz_passes_through_plain_text() {
        assert_eq!(escape_asciz("hello"), "hello");
    }

    #[test]
    fn unescape_single_char_strips_one_backslash_per_escape() {
        assert_eq!(unescape_single_char(r#"a\"b"#), "a\"b");
        assert_eq!(unescape_single_char(r"a\\b"), "a\\b");
    }
}
