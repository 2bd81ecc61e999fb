//! Expression grammar: a precedence-climbing parser over a tiny hand-rolled
//! tokenizer. Embedded inside `@= =@` interpolations and `@% %@` control
//! headers, never reused for anything outside the template engine.

use scribble_base::{CompileError, Span, SpannedError};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i32),
    Str(String),
    Ident(String),
    Member(Box<Expr>, String),
    Call(Box<Expr>, Vec<Expr>),
    /// `{ e1, e2, ... }` — an array literal.
    ArrayLit(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i32),
    Str(String),
    True,
    False,
    Null,
    Symbol(String),
    End,
}

struct ExprLexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> ExprLexer<'a> {
    fn new(text: &'a str) -> Self {
        ExprLexer { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let skipped = self.rest().len() - self.rest().trim_start().len();
        self.pos += skipped;
    }

    fn next(&mut self) -> Result<Tok, SpannedError> {
        self.skip_ws();
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Ok(Tok::End);
        };
        if c.is_ascii_digit() {
            let len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
            let (digits, _) = rest.split_at(len);
            self.pos += len;
            return digits
                .parse::<i32>()
                .map(Tok::Int)
                .map_err(|_| self.error(format!("invalid integer literal '{digits}'")));
        }
        if c == '_' || c.is_alphabetic() {
            let len = rest
                .char_indices()
                .take_while(|(_, ch)| ch.is_alphanumeric() || *ch == '_')
                .map(|(i, ch)| i + ch.len_utf8())
                .last()
                .unwrap_or(0);
            let word = &rest[..len];
            self.pos += len;
            return Ok(match word {
                "true" => Tok::True,
                "false" => Tok::False,
                "null" => Tok::Null,
                _ => Tok::Ident(word.to_string()),
            });
        }
        if c == '\'' || c == '"' {
            let quote = c;
            let mut chars = rest.char_indices().skip(1).peekable();
            let mut out = String::new();
            let mut closed_at = None;
            while let Some((byte_ix, ch)) = chars.next() {
                if ch == quote {
                    closed_at = Some(byte_ix + ch.len_utf8());
                    break;
                }
                if ch == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                        continue;
                    }
                    break;
                }
                out.push(ch);
            }
            let Some(end) = closed_at else {
                return Err(self.error("unterminated string literal in expression"));
            };
            self.pos += end;
            return Ok(Tok::Str(out));
        }
        for sym in ["==", "!=", "<=", ">="] {
            if rest.starts_with(sym) {
                self.pos += sym.len();
                return Ok(Tok::Symbol(sym.to_string()));
            }
        }
        if "(){}.,!+-*/%<>".contains(c) {
            self.pos += c.len_utf8();
            return Ok(Tok::Symbol(c.to_string()));
        }
        Err(self.error(format!("unexpected character '{c}' in expression")))
    }

    fn error(&self, message: impl Into<String>) -> SpannedError {
        SpannedError::new(message.into(), Span::new(self.pos, self.pos + 1))
    }
}

struct ExprParser<'a> {
    lexer: ExprLexer<'a>,
    current: Tok,
}

impl<'a> ExprParser<'a> {
    fn new(text: &'a str) -> Result<Self, SpannedError> {
        let mut lexer = ExprLexer::new(text);
        let current = lexer.next()?;
        Ok(ExprParser { lexer, current })
    }

    fn bump(&mut self) -> Result<Tok, SpannedError> {
        let next = self.lexer.next()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<(), SpannedError> {
        match &self.current {
            Tok::Symbol(s) if s == sym => {
                self.bump()?;
                Ok(())
            }
            other => Err(self.lexer.error(format!("expected '{sym}', found {other:?}"))),
        }
    }

    fn at_symbol(&self, sym: &str) -> bool {
        matches!(&self.current, Tok::Symbol(s) if s == sym)
    }

    fn parse_expr(&mut self) -> Result<Expr, SpannedError> {
        self.parse_binary(0)
    }

    fn binary_op(&self) -> Option<(BinaryOp, u8)> {
        let Tok::Symbol(s) = &self.current else { return None };
        Some(match s.as_str() {
            "*" => (BinaryOp::Mul, 12),
            "/" => (BinaryOp::Div, 12),
            "%" => (BinaryOp::Mod, 12),
            "+" => (BinaryOp::Add, 11),
            "-" => (BinaryOp::Sub, 11),
            "<" => (BinaryOp::Lt, 9),
            "<=" => (BinaryOp::Le, 9),
            ">" => (BinaryOp::Gt, 9),
            ">=" => (BinaryOp::Ge, 9),
            "==" => (BinaryOp::Eq, 8),
            "!=" => (BinaryOp::Ne, 8),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SpannedError> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = self.binary_op() {
            if prec < min_prec {
                break;
            }
            self.bump()?;
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SpannedError> {
        if self.at_symbol("!") {
            self.bump()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)));
        }
        if self.at_symbol("-") {
            self.bump()?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)));
        }
        if self.at_symbol("+") {
            self.bump()?;
            return Ok(Expr::Unary(UnaryOp::Plus, Box::new(self.parse_unary()?)));
        }
        if self.at_symbol("{") {
            self.bump()?;
            let mut items = Vec::new();
            if !self.at_symbol("}") {
                loop {
                    items.push(self.parse_expr()?);
                    if self.at_symbol(",") {
                        self.bump()?;
                        continue;
                    }
                    break;
                }
            }
            self.expect_symbol("}")?;
            return Ok(Expr::ArrayLit(items));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SpannedError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.at_symbol(".") {
                self.bump()?;
                let name = match self.bump()? {
                    Tok::Ident(name) => name,
                    other => return Err(self.lexer.error(format!("expected member name, found {other:?}"))),
                };
                expr = Expr::Member(Box::new(expr), name);
            } else if self.at_symbol("(") {
                self.bump()?;
                let mut args = Vec::new();
                if !self.at_symbol(")") {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.at_symbol(",") {
                            self.bump()?;
                            continue;
                        }
                        break;
                    }
                }
                self.expect_symbol(")")?;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SpannedError> {
        match self.bump()? {
            Tok::Int(n) => Ok(Expr::Int(n)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::True => Ok(Expr::Bool(true)),
            Tok::False => Ok(Expr::Bool(false)),
            Tok::Null => Ok(Expr::Null),
            Tok::Ident(name) => Ok(Expr::Ident(name)),
            Tok::Symbol(s) if s == "(" => {
                let inner = self.parse_expr()?;
                self.expect_symbol(")")?;
                Ok(inner)
            }
            other => Err(self.lexer.error(format!("unexpected token {other:?} in expression"))),
        }
    }

    fn finish(&mut self) -> Result<(), SpannedError> {
        match &self.current {
            Tok::End => Ok(()),
            other => Err(self.lexer.error(format!("unexpected trailing token {other:?}"))),
        }
    }
}

/// Parses a complete expression from `text`, requiring the whole string to
/// be consumed (used for `set`/`call` argument text already isolated by the
/// block parser).
pub fn parse_expr(text: &str) -> Result<Expr, CompileError> {
    let mut parser = ExprParser::new(text).map_err(CompileError::Template)?;
    let expr = parser.parse_expr().map_err(CompileError::Template)?;
    parser.finish().map_err(CompileError::Template)?;
    Ok(expr)
}

/// Parses a comma-separated list of expressions, e.g. a `call name(...)`
/// argument list with the surrounding parens already stripped. An empty or
/// all-whitespace `text` parses as an empty list.
pub fn parse_expr_list(text: &str) -> Result<Vec<Expr>, CompileError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parser = ExprParser::new(text).map_err(CompileError::Template)?;
    let mut args = vec![parser.parse_expr().map_err(CompileError::Template)?];
    while parser.at_symbol(",") {
        parser.bump().map_err(CompileError::Template)?;
        args.push(parser.parse_expr().map_err(CompileError::Template)?);
    }
    parser.finish().map_err(CompileError::Template)?;
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_with_precedence() {
        let expr = parse_expr("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(BinaryOp::Mul, Box::new(Expr::Int(2)), Box::new(Expr::Int(3))))
            )
        );
    }

    #[test]
    fn parses_member_access_and_call() {
        let expr = parse_expr("items.length()").unwrap();
        match expr {
            Expr::Call(callee, args) => {
                assert!(args.is_empty());
                assert_eq!(*callee, Expr::Member(Box::new(Expr::Ident("items".into())), "length".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_comparison_and_equality() {
        let expr = parse_expr("a <= b == true").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Eq,
                Box::new(Expr::Binary(BinaryOp::Le, Box::new(Expr::Ident("a".into())), Box::new(Expr::Ident("b".into())))),
                Box::new(Expr::Bool(true))
            )
        );
    }

    #[test]
    fn parses_unary_not_and_neg() {
        let expr = parse_expr("!ready").unwrap();
        assert_eq!(expr, Expr::Unary(UnaryOp::Not, Box::new(Expr::Ident("ready".into()))));
        let expr = parse_expr("-1").unwrap();
        assert_eq!(expr, Expr::Unary(UnaryOp::Neg, Box::new(Expr::Int(1))));
    }

    #[test]
    fn parses_array_literal() {
        let expr = parse_expr("{1, 2, 3}").unwrap();
        assert_eq!(expr, Expr::ArrayLit(vec![Expr::Int(1), Expr::Int(2), Expr::Int(3)]));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_expr("1 + 2 garbage").is_err());
    }

    #[test]
    fn respects_parens_over_precedence() {
        let expr = parse_expr("(1 + 2) * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Mul,
                Box::new(Expr::Binary(BinaryOp::Add, Box::new(Expr::Int(1)), Box::new(Expr::Int(2)))),
                Box::new(Expr::Int(3))
            )
        );
    }
}
