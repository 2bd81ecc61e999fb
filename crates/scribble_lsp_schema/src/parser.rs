//! Recursive-descent parser from TypeScript-subset tokens to the §3 data
//! model: interfaces, type aliases, and namespace-shaped enumerations.
//!
//! Grounded on `spec.md` §4.3 steps 1-2. Anonymous structs and variants
//! are materialised inline with synthetic names scoped to their enclosing
//! typedef, per §4.3's "materialised inline with synthetic names scoped
//! to their enclosing typedef".

use scribble_base::{CompileError, SpannedError};
use scribble_lexer::{Lexer, Token, TokenKind};

use crate::language::{kw, ts_language};
use crate::model::{BasicType, ConstantValue, Enumeration, Interface, Module, Property, Type, TypeDef, TypeDefPayload, TypeKind};

type PResult<T> = Result<T, CompileError>;

struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Synthetic-name counter for anonymous structs/variants nested inside
    /// the typedef currently being parsed.
    anon_counter: u32,
    current_typedef: String,
}

/// Parses a whole TypeScript schema source file into a [`Module`] named
/// `module_name`. Dependency closure and ordering are left to
/// [`crate::resolve::resolve_module`].
pub fn parse_module(source: &str, file_name: &str, module_name: impl Into<String>) -> PResult<Module> {
    let mut parser = Parser {
        lexer: Lexer::for_source(ts_language(), source, file_name.to_string()),
        anon_counter: 0,
        current_typedef: String::new(),
    };
    let mut module = Module { name: module_name.into(), typedefs: Vec::new(), order: Vec::new() };

    loop {
        if parser.next_matches(TokenKind::EndOfFile, None) {
            break;
        }
        if let Some(typedef) = parser.parse_top_level_item()? {
            if module.find(&typedef.name).is_some() {
                log::warn!("schema '{}' declares '{}' more than once; keeping the first definition", module.name, typedef.name);
            } else {
                module.typedefs.push(typedef);
            }
        }
    }
    Ok(module)
}

impl<'a> Parser<'a> {
    /// Every other helper reads through this rather than `self.lexer`
    /// directly: end-of-line tokens carry no meaning in this grammar, only
    /// terminating a property or namespace entry the way `;`/`,` already do.
    fn peek(&mut self) -> Token<'a> {
        while self.lexer.peek().kind == TokenKind::EndOfLine {
            self.lexer.next();
        }
        self.lexer.peek()
    }

    fn advance(&mut self) -> Token<'a> {
        self.peek();
        self.lexer.next()
    }

    fn next_matches(&mut self, kind: TokenKind, code: Option<u32>) -> bool {
        self.peek().matches(kind, code)
    }

    fn err(&mut self, message: impl Into<String>) -> CompileError {
        let tok = self.peek();
        let start = tok.location.byte_index;
        CompileError::Parser(SpannedError::new(message, scribble_base::Span::new(start, start + tok.text.len())))
    }

    fn eat_symbol(&mut self, text: &str) -> PResult<()> {
        let tok = self.peek();
        if tok.kind == TokenKind::Symbol && tok.text == text {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '{text}', found '{}'", tok.text)))
        }
    }

    fn at_symbol(&mut self, text: &str) -> bool {
        let tok = self.peek();
        tok.kind == TokenKind::Symbol && tok.text == text
    }

    fn eat_keyword(&mut self, code: u32, name: &str) -> PResult<()> {
        if self.next_matches(TokenKind::Keyword, Some(code)) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected keyword '{name}'")))
        }
    }

    fn at_keyword(&mut self, code: u32) -> bool {
        self.next_matches(TokenKind::Keyword, Some(code))
    }

    fn identifier(&mut self) -> PResult<String> {
        let tok = self.peek();
        if tok.kind == TokenKind::Identifier {
            self.advance();
            Ok(tok.text.to_string())
        } else {
            Err(self.err(format!("expected identifier, found '{}'", tok.text)))
        }
    }

    fn parse_top_level_item(&mut self) -> PResult<Option<TypeDef>> {
        if self.at_keyword(kw::EXPORT) {
            self.advance();
        }
        if self.at_keyword(kw::INTERFACE) {
            return self.parse_interface().map(Some);
        }
        if self.at_keyword(kw::TYPE) {
            return self.parse_alias().map(Some);
        }
        if self.at_keyword(kw::NAMESPACE) {
            return self.parse_namespace().map(Some);
        }
        Err(self.err("expected 'interface', 'type', or 'namespace'"))
    }

    fn parse_interface(&mut self) -> PResult<TypeDef> {
        self.eat_keyword(kw::INTERFACE, "interface")?;
        let name = self.identifier()?;
        self.current_typedef = name.clone();
        let mut extends = Vec::new();
        if self.at_keyword(kw::EXTENDS) {
            self.advance();
            extends.push(self.identifier()?);
            while self.at_symbol(",") {
                self.advance();
                extends.push(self.identifier()?);
            }
        }
        let properties = self.parse_property_block()?;
        Ok(TypeDef {
            name,
            dependencies: Vec::new(),
            payload: TypeDefPayload::Interface(Interface { extends, properties }),
        })
    }

    fn parse_property_block(&mut self) -> PResult<Vec<Property>> {
        self.eat_symbol("{")?;
        let mut properties = Vec::new();
        while !self.at_symbol("}") {
            properties.push(self.parse_property()?);
            while self.at_symbol(";") || self.at_symbol(",") {
                self.advance();
            }
        }
        self.eat_symbol("}")?;
        Ok(properties)
    }

    fn parse_property(&mut self) -> PResult<Property> {
        let name = self.identifier()?;
        let optional = if self.at_symbol("?") {
            self.advance();
            true
        } else {
            false
        };
        self.eat_symbol(":")?;
        let ty = self.parse_type()?;
        Ok(Property { name, optional, ty })
    }

    fn parse_alias(&mut self) -> PResult<TypeDef> {
        self.eat_keyword(kw::TYPE, "type")?;
        let name = self.identifier()?;
        self.current_typedef = name.clone();
        self.eat_symbol("=")?;
        let ty = self.parse_type()?;
        while self.at_symbol(";") {
            self.advance();
        }
        Ok(TypeDef { name, dependencies: Vec::new(), payload: TypeDefPayload::Alias(ty) })
    }

    /// `namespace Name { export? const A: integer = 1; ... }` — treated as
    /// an enumeration, the convention the real LSP schema itself uses for
    /// its value sets (`DiagnosticSeverity`, `SymbolKind`, ...).
    fn parse_namespace(&mut self) -> PResult<TypeDef> {
        self.eat_keyword(kw::NAMESPACE, "namespace")?;
        let name = self.identifier()?;
        self.current_typedef = name.clone();
        self.eat_symbol("{")?;
        let mut underlying = BasicType::Integer;
        let mut values = Vec::new();
        while !self.at_symbol("}") {
            if self.at_keyword(kw::EXPORT) {
                self.advance();
            }
            self.eat_keyword(kw::CONST, "const")?;
            let value_name = self.identifier()?;
            self.eat_symbol(":")?;
            underlying = self.parse_basic_type()?;
            self.eat_symbol("=")?;
            let literal = self.parse_constant()?;
            values.push((value_name, literal));
            while self.at_symbol(";") {
                self.advance();
            }
        }
        self.eat_symbol("}")?;
        Ok(TypeDef {
            name,
            dependencies: Vec::new(),
            payload: TypeDefPayload::Enumeration(Enumeration { underlying, values }),
        })
    }

    fn parse_basic_type(&mut self) -> PResult<BasicType> {
        let tok = self.peek();
        if tok.kind == TokenKind::Keyword {
            if let Some(basic) = BasicType::from_keyword(tok.text) {
                self.advance();
                return Ok(basic);
            }
        }
        Err(self.err(format!("expected a basic type, found '{}'", tok.text)))
    }

    fn parse_constant(&mut self) -> PResult<ConstantValue> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                let value: i64 = tok.text.parse().map_err(|_| self.err(format!("malformed integer literal '{}'", tok.text)))?;
                Ok(ConstantValue::Int(value))
            }
            TokenKind::QuotedString => {
                self.advance();
                let inner = tok.text.get(1..tok.text.len().saturating_sub(1)).unwrap_or("");
                Ok(ConstantValue::Str(inner.to_string()))
            }
            _ => Err(self.err(format!("expected a literal value, found '{}'", tok.text))),
        }
    }

    /// `Type := UnionMember ('|' UnionMember)*`; a single member with no
    /// `|` collapses to that member directly rather than a one-element
    /// variant.
    fn parse_type(&mut self) -> PResult<Type> {
        let mut members = vec![self.parse_type_member()?];
        while self.at_symbol("|") {
            self.advance();
            members.push(self.parse_type_member()?);
        }
        if members.len() == 1 {
            Ok(members.into_iter().next().unwrap())
        } else {
            Ok(Type { kind: TypeKind::AnonymousVariant(members), array: false })
        }
    }

    fn parse_type_member(&mut self) -> PResult<Type> {
        let tok = self.peek();
        let mut ty = if tok.kind == TokenKind::Keyword && BasicType::from_keyword(tok.text).is_some() {
            let basic = self.parse_basic_type()?;
            Type::basic(basic)
        } else if tok.kind == TokenKind::Number || tok.kind == TokenKind::QuotedString {
            let constant = self.parse_constant()?;
            Type { kind: TypeKind::Constant(constant), array: false }
        } else if tok.kind == TokenKind::Identifier {
            self.advance();
            Type::named(tok.text)
        } else if self.at_symbol("{") {
            self.anon_counter += 1;
            let properties = self.parse_property_block()?;
            Type { kind: TypeKind::AnonymousStruct(properties), array: false }
        } else if self.at_symbol("(") {
            self.advance();
            let inner = self.parse_type()?;
            self.eat_symbol(")")?;
            inner
        } else {
            return Err(self.err(format!("expected a type, found '{}'", tok.text)));
        };
        while self.at_symbol("[") {
            self.advance();
            self.eat_symbol("]")?;
            ty.array = true;
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_interface() {
        let src = "export interface TextDocumentIdentifier {\n  uri: string;\n  version?: integer;\n}\n";
        let module = parse_module(src, "schema.ts", "textDocument").unwrap();
        assert_eq!(module.typedefs.len(), 1);
        let TypeDefPayload::Interface(iface) = &module.typedefs[0].payload else { panic!("expected interface") };
        assert_eq!(iface.properties.len(), 2);
        assert!(iface.properties[1].optional);
    }

    #[test]
    fn parses_extends_clause() {
        let src = "export interface VersionedTextDocumentIdentifier extends TextDocumentIdentifier {\n  version: integer;\n}\n";
        let module = parse_module(src, "schema.ts", "m").unwrap();
        let TypeDefPayload::Interface(iface) = &module.typedefs[0].payload else { panic!() };
        assert_eq!(iface.extends, vec!["TextDocumentIdentifier".to_string()]);
    }

    #[test]
    fn parses_union_alias() {
        let src = "export type Kind = string | integer;\n";
        let module = parse_module(src, "schema.ts", "m").unwrap();
        let TypeDefPayload::Alias(ty) = &module.typedefs[0].payload else { panic!() };
        assert!(matches!(ty.kind, TypeKind::AnonymousVariant(_)));
    }

    #[test]
    fn parses_array_type() {
        let src = "export interface Holder {\n  items: string[];\n}\n";
        let module = parse_module(src, "schema.ts", "m").unwrap();
        let TypeDefPayload::Interface(iface) = &module.typedefs[0].payload else { panic!() };
        assert!(iface.properties[0].ty.array);
    }

    #[test]
    fn parses_namespace_as_enumeration() {
        let src = "export namespace DiagnosticSeverity {\n  export const Error: integer = 1;\n  export const Warning: integer = 2;\n}\n";
        let module = parse_module(src, "schema.ts", "m").unwrap();
        let TypeDefPayload::Enumeration(e) = &module.typedefs[0].payload else { panic!() };
        assert_eq!(e.values.len(), 2);
        assert_eq!(e.values[0].0, "Error");
        assert_eq!(e.values[0].1, ConstantValue::Int(1));
    }

    #[test]
    fn malformed_interface_is_a_parser_error() {
        let src = "export interface Foo {\n  bad field\n}\n";
        let result = parse_module(src, "schema.ts", "m");
        assert!(matches!(result, Err(CompileError::Parser(_))));
    }
}
