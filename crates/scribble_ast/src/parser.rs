//! Recursive-descent parser: source text to [`SyntaxArena`].
//!
//! Lexes against [`crate::language::scribble_language`] and builds nodes in
//! the same shapes [`crate::binder`]'s own tests hand-construct. Expression
//! parsing is precedence climbing over a fixed ladder (ternary, `||`, `&&`,
//! equality, relational, additive, multiplicative, unary, postfix).

use std::rc::Rc;

use scribble_base::{Interner, Location, Result, Span, SpannedError, Symbol};
use scribble_lexer::{Lexer, Token, TokenKind, TokenPayload};

use crate::language::{kw, scribble_language};
use crate::syntax::{Literal, NodeId, Operator, SyntaxArena, SyntaxKind};

/// Parses one compilation unit into a [`SyntaxArena`], returning the id of
/// its root [`SyntaxKind::Program`] node.
///
/// A scribble source file is a single implicit module wrapping every
/// top-level item: the language has no file-level `module { ... }` wrapper
/// of its own, and the module's name is derived from `file_name`'s stem.
pub fn parse_program(source: &str, file_name: &str, interner: &mut Interner) -> Result<(SyntaxArena, NodeId)> {
    let mut parser = Parser::new(source, file_name, interner);
    let root = parser.parse_program()?;
    Ok((parser.arena, root))
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    interner: &'a mut Interner,
    arena: SyntaxArena,
    module_name: Symbol,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, file_name: &'a str, interner: &'a mut Interner) -> Self {
        let module_name_text = module_name_from_file(file_name);
        let module_name = interner.intern(&module_name_text);
        Parser {
            lexer: Lexer::for_source(scribble_language(), source, Rc::from(file_name)),
            interner,
            arena: SyntaxArena::new(),
            module_name,
        }
    }
}

fn module_name_from_file(file_name: &str) -> String {
    let stem = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = stem.strip_suffix(".scribble").unwrap_or(stem);
    stem.to_string()
}

impl<'a> Parser<'a> {
    fn parse_program(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut imports = Vec::new();
        let mut types = Vec::new();
        let mut functions = Vec::new();
        while !self.at_eof() {
            let item_start = self.peek_location();
            if self.eat_keyword(kw::IMPORT) {
                let name = self.expect_identifier()?;
                self.expect_symbol(";")?;
                imports.push(self.arena.push(SyntaxKind::Import { module: name }, item_start, None));
            } else if self.next_is_keyword(kw::FUNC) {
                functions.push(self.parse_function()?);
            } else if self.next_is_keyword(kw::NATIVE) {
                functions.push(self.parse_native_function()?);
            } else if self.next_is_keyword(kw::STRUCT) {
                types.push(self.parse_struct()?);
            } else if self.next_is_keyword(kw::VARIANT) {
                types.push(self.parse_variant()?);
            } else if self.next_is_keyword(kw::ENUM) {
                types.push(self.parse_enumeration()?);
            } else {
                let tok = self.lexer.peek();
                return Err(self.error_at(&tok, format!("expected a top-level item, found `{}`", tok.text)));
            }
        }
        let module = self
            .arena
            .push(SyntaxKind::Module { name: self.module_name, imports, types, functions }, start.clone(), None);
        Ok(self.arena.push(SyntaxKind::Program { modules: vec![module] }, start, None))
    }

    fn parse_function(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::FUNC)?;
        let name = self.expect_identifier()?;
        self.expect_symbol("(")?;
        let parameters = self.parse_parameter_list()?;
        self.expect_symbol(")")?;
        self.expect_symbol("->")?;
        let return_type = self.parse_type_ref()?;
        let implementation = self.parse_block()?;
        Ok(self.arena.push(
            SyntaxKind::Function { name, parameters, return_type, implementation: Some(implementation) },
            start,
            None,
        ))
    }

    fn parse_native_function(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::NATIVE)?;
        self.expect_keyword(kw::FUNC)?;
        let name = self.expect_identifier()?;
        self.expect_symbol("(")?;
        let _parameters = self.parse_parameter_list()?;
        self.expect_symbol(")")?;
        self.expect_symbol("->")?;
        let _return_type = self.parse_type_ref()?;
        self.expect_symbol("=")?;
        let link_name = self.expect_string()?;
        self.expect_symbol(";")?;
        Ok(self.arena.push(SyntaxKind::NativeFunction { name, link_name }, start, None))
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<NodeId>> {
        let mut params = Vec::new();
        if self.lexer.next_matches(TokenKind::Symbol, None) && self.peek_text() == ")" {
            return Ok(params);
        }
        loop {
            let start = self.peek_location();
            let name = self.expect_identifier()?;
            self.expect_symbol(":")?;
            let type_ref = self.parse_type_ref()?;
            params.push(self.arena.push(SyntaxKind::Parameter { name, type_ref }, start, None));
            if !self.eat_symbol(",") {
                break;
            }
        }
        Ok(params)
    }

    fn parse_type_ref(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let name = self.expect_identifier()?;
        let array = if self.peek_text() == "[" {
            self.expect_symbol("[")?;
            self.expect_symbol("]")?;
            true
        } else {
            false
        };
        Ok(self.arena.push(SyntaxKind::TypeRef { name, array }, start, None))
    }

    fn parse_struct(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::STRUCT)?;
        let name = self.expect_identifier()?;
        self.expect_symbol("{")?;
        let mut components = Vec::new();
        while self.peek_text() != "}" {
            let field_start = self.peek_location();
            let field_name = self.expect_identifier()?;
            self.expect_symbol(":")?;
            let type_ref = self.parse_type_ref()?;
            self.expect_symbol(";")?;
            components.push(self.arena.push(SyntaxKind::TypeComponent { name: field_name, type_ref }, field_start, None));
        }
        self.expect_symbol("}")?;
        Ok(self.arena.push(SyntaxKind::Struct { name, components }, start, None))
    }

    fn parse_variant(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::VARIANT)?;
        let name = self.expect_identifier()?;
        self.expect_symbol("{")?;
        let mut options = Vec::new();
        while self.peek_text() != "}" {
            let option_start = self.peek_location();
            let option_name = self.expect_identifier()?;
            let payload_type = if self.peek_text() == "(" {
                self.expect_symbol("(")?;
                let type_ref = self.parse_type_ref()?;
                self.expect_symbol(")")?;
                Some(type_ref)
            } else {
                None
            };
            self.expect_symbol(";")?;
            options.push(self.arena.push(SyntaxKind::VariantOption { name: option_name, payload_type }, option_start, None));
        }
        self.expect_symbol("}")?;
        Ok(self.arena.push(SyntaxKind::Variant { name, options }, start, None))
    }

    fn parse_enumeration(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::ENUM)?;
        let name = self.expect_identifier()?;
        self.expect_symbol("{")?;
        let mut values = Vec::new();
        while self.peek_text() != "}" {
            let value_start = self.peek_location();
            let value_name = self.expect_identifier()?;
            let value = if self.eat_symbol("=") {
                Some(self.expect_integer()?)
            } else {
                None
            };
            values.push(self.arena.push(SyntaxKind::EnumValue { name: value_name, value }, value_start, None));
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol("}")?;
        Ok(self.arena.push(SyntaxKind::Enumeration { name, values }, start, None))
    }

    fn parse_block(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_symbol("{")?;
        let mut statements = Vec::new();
        while self.peek_text() != "}" {
            statements.push(self.parse_statement()?);
        }
        self.expect_symbol("}")?;
        Ok(self.arena.push(SyntaxKind::Block { statements }, start, None))
    }

    fn parse_statement(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        if self.peek_text() == "{" {
            return self.parse_block();
        }
        if self.next_is_keyword(kw::IF) {
            return self.parse_if();
        }
        if self.next_is_keyword(kw::WHILE) {
            return self.parse_while();
        }
        if self.next_is_keyword(kw::LOOP) {
            self.expect_keyword(kw::LOOP)?;
            let body = self.parse_block()?;
            return Ok(self.arena.push(SyntaxKind::Loop { body }, start, None));
        }
        if self.next_is_keyword(kw::FOR) {
            return self.parse_for();
        }
        if self.eat_keyword(kw::BREAK) {
            self.expect_symbol(";")?;
            return Ok(self.arena.push(SyntaxKind::Break, start, None));
        }
        if self.eat_keyword(kw::CONTINUE) {
            self.expect_symbol(";")?;
            return Ok(self.arena.push(SyntaxKind::Continue, start, None));
        }
        if self.eat_keyword(kw::RETURN) {
            let expr = if self.peek_text() == ";" {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect_symbol(";")?;
            return Ok(self.arena.push(SyntaxKind::Return { expr }, start, None));
        }
        if self.next_is_keyword(kw::VAR) || self.next_is_keyword(kw::CONST) {
            return self.parse_variable_decl();
        }
        self.parse_expression_statement()
    }

    fn parse_if(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::IF)?;
        self.expect_symbol("(")?;
        let condition = self.parse_expression()?;
        self.expect_symbol(")")?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat_keyword(kw::ELSE) {
            if self.next_is_keyword(kw::IF) {
                Some(self.parse_if()?)
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(self.arena.push(SyntaxKind::If { condition, then_branch, else_branch }, start, None))
    }

    fn parse_while(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::WHILE)?;
        self.expect_symbol("(")?;
        let condition = self.parse_expression()?;
        self.expect_symbol(")")?;
        let body = self.parse_block()?;
        Ok(self.arena.push(SyntaxKind::While { condition, body }, start, None))
    }

    fn parse_for(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        self.expect_keyword(kw::FOR)?;
        let variable = self.expect_identifier()?;
        self.expect_keyword(kw::IN)?;
        let range = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(self.arena.push(SyntaxKind::For { variable, range, body }, start, None))
    }

    fn parse_variable_decl(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let is_const = self.next_is_keyword(kw::CONST);
        if is_const {
            self.expect_keyword(kw::CONST)?;
        } else {
            self.expect_keyword(kw::VAR)?;
        }
        let name = self.expect_identifier()?;
        let type_ref = if self.eat_symbol(":") { Some(self.parse_type_ref()?) } else { None };
        let initializer = if self.eat_symbol("=") { Some(self.parse_expression()?) } else { None };
        self.expect_symbol(";")?;
        Ok(self.arena.push(SyntaxKind::VariableDecl { name, type_ref, initializer, is_const }, start, None))
    }

    /// An identifier-led statement is ambiguous between an assignment and a
    /// bare expression (a call, most commonly) until the parser has already
    /// consumed the left-hand side: parse one expression, then decide.
    fn parse_expression_statement(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let expr = self.parse_expression()?;
        if self.eat_symbol("=") {
            let rhs = self.parse_expression()?;
            self.expect_symbol(";")?;
            return Ok(self.arena.push(SyntaxKind::Assignment { target: expr, expr: rhs }, start, None));
        }
        self.expect_symbol(";")?;
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<NodeId> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let condition = self.parse_logic_or()?;
        if self.eat_symbol("?") {
            let if_true = self.parse_expression()?;
            self.expect_symbol(":")?;
            let if_false = self.parse_expression()?;
            return Ok(self.arena.push(SyntaxKind::Ternary { condition, if_true, if_false }, start, None));
        }
        Ok(condition)
    }

    fn parse_logic_or(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut lhs = self.parse_logic_and()?;
        while self.eat_symbol("||") {
            let rhs = self.parse_logic_and()?;
            lhs = self.arena.push(SyntaxKind::Binary { op: Operator::Or, lhs, rhs }, start.clone(), None);
        }
        Ok(lhs)
    }

    fn parse_logic_and(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut lhs = self.parse_equality()?;
        while self.eat_symbol("&&") {
            let rhs = self.parse_equality()?;
            lhs = self.arena.push(SyntaxKind::Binary { op: Operator::And, lhs, rhs }, start.clone(), None);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut lhs = self.parse_relational()?;
        loop {
            let op = if self.eat_symbol("==") {
                Operator::Eq
            } else if self.eat_symbol("!=") {
                Operator::Ne
            } else {
                break;
            };
            let rhs = self.parse_relational()?;
            lhs = self.arena.push(SyntaxKind::Binary { op, lhs, rhs }, start.clone(), None);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut lhs = self.parse_additive()?;
        loop {
            let op = if self.eat_symbol("<=") {
                Operator::Le
            } else if self.eat_symbol(">=") {
                Operator::Ge
            } else if self.eat_symbol("<") {
                Operator::Lt
            } else if self.eat_symbol(">") {
                Operator::Gt
            } else {
                break;
            };
            let rhs = self.parse_additive()?;
            lhs = self.arena.push(SyntaxKind::Binary { op, lhs, rhs }, start.clone(), None);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.eat_symbol("+") {
                Operator::Add
            } else if self.eat_symbol("-") {
                Operator::Sub
            } else {
                break;
            };
            let rhs = self.parse_multiplicative()?;
            lhs = self.arena.push(SyntaxKind::Binary { op, lhs, rhs }, start.clone(), None);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.eat_symbol("*") {
                Operator::Mul
            } else if self.eat_symbol("/") {
                Operator::Div
            } else if self.eat_symbol("%") {
                Operator::Mod
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            lhs = self.arena.push(SyntaxKind::Binary { op, lhs, rhs }, start.clone(), None);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        if self.eat_symbol("-") {
            let operand = self.parse_unary()?;
            return Ok(self.arena.push(SyntaxKind::Unary { op: Operator::Neg, operand }, start, None));
        }
        if self.eat_symbol("!") {
            let operand = self.parse_unary()?;
            return Ok(self.arena.push(SyntaxKind::Unary { op: Operator::Not, operand }, start, None));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let mut node = self.parse_primary()?;
        loop {
            if self.eat_symbol("[") {
                let subscript = self.parse_expression()?;
                self.expect_symbol("]")?;
                let name = match &self.arena.get(node).kind {
                    SyntaxKind::NameRef { name } => *name,
                    SyntaxKind::VariableRef { name, .. } => *name,
                    _ => Symbol::EMPTY,
                };
                node = self.arena.push(SyntaxKind::VariableRef { name, subscript: Some(subscript) }, start.clone(), None);
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        let start = self.peek_location();
        let tok = self.lexer.peek();
        match tok.kind {
            TokenKind::Number => {
                self.lexer.next();
                return Ok(self.push_number_literal(&tok, start));
            }
            TokenKind::QuotedString => {
                self.lexer.next();
                let text = unquote(tok.text);
                return Ok(self.arena.push(SyntaxKind::Lit(Literal::String(text)), start, None));
            }
            TokenKind::Keyword if tok.matches(TokenKind::Keyword, Some(kw::TRUE)) => {
                self.lexer.next();
                return Ok(self.arena.push(SyntaxKind::Lit(Literal::Bool(true)), start, None));
            }
            TokenKind::Keyword if tok.matches(TokenKind::Keyword, Some(kw::FALSE)) => {
                self.lexer.next();
                return Ok(self.arena.push(SyntaxKind::Lit(Literal::Bool(false)), start, None));
            }
            TokenKind::Identifier => {
                self.lexer.next();
                let name = self.interner.intern(tok.text);
                if self.peek_text() == "(" {
                    self.expect_symbol("(")?;
                    let arguments = self.parse_argument_list()?;
                    self.expect_symbol(")")?;
                    return Ok(self.arena.push(SyntaxKind::FunctionCall { callee: name, arguments }, start, None));
                }
                return Ok(self.arena.push(SyntaxKind::NameRef { name }, start, None));
            }
            TokenKind::Symbol if tok.text == "(" => {
                self.lexer.next();
                let mut expressions = vec![self.parse_expression()?];
                while self.eat_symbol(",") {
                    expressions.push(self.parse_expression()?);
                }
                self.expect_symbol(")")?;
                if expressions.len() == 1 {
                    return Ok(expressions.remove(0));
                }
                return Ok(self.arena.push(SyntaxKind::Compound { expressions }, start, None));
            }
            _ => {}
        }
        Err(self.error_at(&tok, format!("expected an expression, found `{}`", tok.text)))
    }

    fn push_number_literal(&mut self, tok: &Token<'a>, start: Location) -> NodeId {
        let kind = match tok.payload {
            TokenPayload::Number(k) => k,
            _ => scribble_lexer::NumberKind::Integer,
        };
        match kind {
            scribble_lexer::NumberKind::Decimal => {
                let value: f64 = tok.text.parse().unwrap_or(0.0);
                self.arena.push(SyntaxKind::Lit(Literal::Decimal(value)), start, None)
            }
            scribble_lexer::NumberKind::Hex => {
                let value = i64::from_str_radix(tok.text.trim_start_matches("0x").trim_start_matches("0X"), 16).unwrap_or(0);
                self.arena.push(SyntaxKind::Lit(Literal::Integer(value)), start, None)
            }
            scribble_lexer::NumberKind::Binary => {
                let value = i64::from_str_radix(tok.text.trim_start_matches("0b").trim_start_matches("0B"), 2).unwrap_or(0);
                self.arena.push(SyntaxKind::Lit(Literal::Integer(value)), start, None)
            }
            scribble_lexer::NumberKind::Integer => {
                let value: i64 = tok.text.parse().unwrap_or(0);
                self.arena.push(SyntaxKind::Lit(Literal::Integer(value)), start, None)
            }
        }
    }

    fn parse_argument_list(&mut self) -> Result<Vec<NodeId>> {
        let mut args = Vec::new();
        if self.peek_text() == ")" {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat_symbol(",") {
                break;
            }
        }
        Ok(args)
    }

    // --- token-stream helpers ---

    /// Advances past whitespace-only end-of-line tokens. Scribble statements
    /// are terminated by `;`, not by newlines, so a line break carries no
    /// syntactic meaning here.
    fn skip_line_breaks(&mut self) {
        while self.lexer.next_matches(TokenKind::EndOfLine, None) {
            self.lexer.next();
        }
    }

    fn peek(&mut self) -> Token<'a> {
        self.skip_line_breaks();
        self.lexer.peek()
    }

    fn peek_text(&mut self) -> &'a str {
        self.peek().text
    }

    fn peek_location(&mut self) -> Location {
        self.peek().location
    }

    fn at_eof(&mut self) -> bool {
        self.peek().kind == TokenKind::EndOfFile
    }

    fn next_is_keyword(&mut self, code: u32) -> bool {
        self.peek().matches(TokenKind::Keyword, Some(code))
    }

    fn eat_keyword(&mut self, code: u32) -> bool {
        self.skip_line_breaks();
        if self.lexer.next_matches(TokenKind::Keyword, Some(code)) {
            self.lexer.next();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, code: u32) -> Result<()> {
        self.skip_line_breaks();
        let tok = self.lexer.peek();
        if !tok.matches(TokenKind::Keyword, Some(code)) {
            return Err(self.error_at(&tok, format!("expected keyword, found `{}`", tok.text)));
        }
        self.lexer.next();
        Ok(())
    }

    fn eat_symbol(&mut self, text: &str) -> bool {
        self.skip_line_breaks();
        if self.lexer.next_matches(TokenKind::Symbol, None) && self.lexer.peek().text == text {
            self.lexer.next();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, text: &str) -> Result<()> {
        self.skip_line_breaks();
        let tok = self.lexer.peek();
        if tok.kind != TokenKind::Symbol || tok.text != text {
            return Err(self.error_at(&tok, format!("expected `{text}`, found `{}`", tok.text)));
        }
        self.lexer.next();
        Ok(())
    }

    fn expect_identifier(&mut self) -> Result<Symbol> {
        self.skip_line_breaks();
        let tok = self.lexer.peek();
        if tok.kind != TokenKind::Identifier {
            return Err(self.error_at(&tok, format!("expected an identifier, found `{}`", tok.text)));
        }
        self.lexer.next();
        Ok(self.interner.intern(tok.text))
    }

    fn expect_string(&mut self) -> Result<String> {
        self.skip_line_breaks();
        let tok = self.lexer.peek();
        if tok.kind != TokenKind::QuotedString {
            return Err(self.error_at(&tok, format!("expected a string literal, found `{}`", tok.text)));
        }
        self.lexer.next();
        Ok(unquote(tok.text))
    }

    fn expect_integer(&mut self) -> Result<i64> {
        self.skip_line_breaks();
        let tok = self.lexer.peek();
        if tok.kind != TokenKind::Number {
            return Err(self.error_at(&tok, format!("expected an integer, found `{}`", tok.text)));
        }
        self.lexer.next();
        Ok(tok.text.parse().unwrap_or(0))
    }

    fn error_at(&self, tok: &Token<'a>, message: String) -> SpannedError {
        let span = Span::new(tok.location.byte_index, tok.location.byte_index + tok.text.len());
        SpannedError::new(message, span)
    }
}

fn unquote(text: &str) -> String {
    let inner = text.get(1..text.len().saturating_sub(1)).unwrap_or("");
    inner.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::BoundKind;
    use crate::types::TypeRegistry;

    fn parse(source: &str) -> (SyntaxArena, NodeId, Interner) {
        let mut interner = Interner::new();
        let (arena, root) = parse_program(source, "test.scribble", &mut interner).unwrap();
        (arena, root, interner)
    }

    #[test]
    fn parses_scenario_a_and_binds_cleanly() {
        let (arena, root, mut interner) = parse("func main() -> int { return 0; }");
        let mut types = TypeRegistry::new(&mut interner);
        let (bound, id) = crate::bind_program(&arena, root, &mut types, &interner).unwrap();
        assert!(matches!(bound.get(id).kind, BoundKind::Program { .. }));
    }

    #[test]
    fn parses_scenario_b_with_undefined_identifier() {
        let (arena, root, mut interner) = parse("func main() -> int { return x; }");
        let mut types = TypeRegistry::new(&mut interner);
        let errs = crate::bind_program(&arena, root, &mut types, &interner).unwrap_err();
        assert!(!errs.is_empty());
    }

    #[test]
    fn parses_function_with_parameter_and_binds() {
        let (arena, root, mut interner) = parse("func identity(n: int) -> int { return n; }");
        let mut types = TypeRegistry::new(&mut interner);
        crate::bind_program(&arena, root, &mut types, &interner).unwrap();
    }

    #[test]
    fn parses_if_else_while_and_loop_constructs() {
        let source = r#"
            func main() -> int {
                var x: int = 0;
                if (x == 0) {
                    x = 1;
                } else {
                    x = 2;
                }
                while (x < 10) {
                    x = x + 1;
                }
                loop {
                    break;
                }
                return x;
            }
        "#;
        let (arena, root, mut interner) = parse(source);
        let mut types = TypeRegistry::new(&mut interner);
        crate::bind_program(&arena, root, &mut types, &interner).unwrap();
    }

    #[test]
    fn parses_for_loop_over_a_call_expression() {
        let source = r#"
            func range(n: int) -> int { return n; }
            func main() -> int {
                for i in range(10) {
                    return i;
                }
                return 0;
            }
        "#;
        let (arena, root, _interner) = parse(source);
        match &arena.get(root).kind {
            SyntaxKind::Program { modules } => assert_eq!(modules.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_struct_variant_and_enum_declarations() {
        let source = r#"
            struct Point {
                x: int;
                y: int;
            }
            variant Shape {
                Circle(int);
                Empty;
            }
            enum Color {
                Red = 0,
                Green = 1,
                Blue = 2,
            }
            func main() -> int { return 0; }
        "#;
        let (arena, root, _interner) = parse(source);
        match &arena.get(root).kind {
            SyntaxKind::Program { modules } => {
                let module = arena.get(modules[0]);
                match &module.kind {
                    SyntaxKind::Module { types, .. } => assert_eq!(types.len(), 3),
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_native_function_declaration() {
        let source = r#"native func write_line(message: string) -> int = "scribble_write_line";"#;
        let (arena, root, _interner) = parse(source);
        match &arena.get(root).kind {
            SyntaxKind::Program { modules } => {
                let module = arena.get(modules[0]);
                match &module.kind {
                    SyntaxKind::Module { functions, .. } => {
                        assert_eq!(functions.len(), 1);
                        assert!(matches!(arena.get(functions[0]).kind, SyntaxKind::NativeFunction { .. }));
                    }
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn operator_precedence_groups_multiplicative_before_additive() {
        let source = "func main() -> int { return 1 + 2 * 3; }";
        let (arena, root, _interner) = parse(source);
        let module = match &arena.get(root).kind {
            SyntaxKind::Program { modules } => arena.get(modules[0]),
            other => panic!("unexpected {other:?}"),
        };
        let func = match &module.kind {
            SyntaxKind::Module { functions, .. } => arena.get(functions[0]),
            other => panic!("unexpected {other:?}"),
        };
        let block = match &func.kind {
            SyntaxKind::Function { implementation: Some(b), .. } => arena.get(*b),
            other => panic!("unexpected {other:?}"),
        };
        let ret = match &block.kind {
            SyntaxKind::Block { statements } => arena.get(statements[0]),
            other => panic!("unexpected {other:?}"),
        };
        let top = match &ret.kind {
            SyntaxKind::Return { expr: Some(e) } => arena.get(*e),
            other => panic!("unexpected {other:?}"),
        };
        match &top.kind {
            SyntaxKind::Binary { op: Operator::Add, rhs, .. } => {
                assert!(matches!(arena.get(*rhs).kind, SyntaxKind::Binary { op: Operator::Mul, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_source_with_a_located_error() {
        let mut interner = Interner::new();
        let err = parse_program("func main( -> int { }", "test.scribble", &mut interner).unwrap_err();
        assert!(err.message.contains("identifier"));
    }
}
