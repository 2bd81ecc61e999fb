//! Recursive-descent parser for the `@=`/`@#`/`@%` template surface.
//!
//! Scanning of literal text and `@= =@` interpolations follows the original
//! text/expression node split closely; the `@% %@` control-block grammar
//! (absent there) is layered on top using the same "read until a literal tag"
//! technique.

use scribble_base::{CompileError, Span, SpannedError};

use crate::ast::Node;
use crate::expr::{parse_expr, parse_expr_list};

/// What a body scan stopped on.
enum StopTag {
    Eof,
    End,
    Else,
    Case(String),
}

pub fn parse_template(text: &str) -> Result<Vec<Node>, CompileError> {
    let mut parser = Parser { text, pos: 0 };
    let (nodes, tag) = parser.parse_sequence()?;
    match tag {
        StopTag::Eof => Ok(nodes),
        StopTag::End => Err(parser.error("unmatched '@%;' with no open block")),
        StopTag::Else => Err(parser.error("unmatched '@%else@%' with no open if/switch")),
        StopTag::Case(_) => Err(parser.error("unmatched '@%case@%' with no open switch")),
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::Template(SpannedError::new(message.into(), Span::new(self.pos, self.pos + 1)))
    }

    /// Scans literal text up to (not including) the next unescaped `@`,
    /// honoring `\` as an escape for the following character.
    fn scan_text(&mut self) -> String {
        let mut out = String::new();
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos] != b'@' {
            if bytes[self.pos] == b'\\' && self.pos + 1 < bytes.len() {
                self.pos += 1;
            }
            let ch = self.rest().chars().next().unwrap();
            out.push(ch);
            self.pos += ch.len_utf8();
        }
        out
    }

    fn scan_comment(&mut self) -> Result<(), CompileError> {
        // Positioned just after "@#". Skip to the closing "#@", honoring
        // that '#' alone doesn't close it — only "#@" does.
        loop {
            match self.rest().find('#') {
                None => return Err(self.error("unclosed '@#' comment")),
                Some(offset) => {
                    self.pos += offset + 1;
                    if self.rest().starts_with('@') {
                        self.pos += 1;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Positioned just after "@=". Reads the raw expression text (no
    /// whitespace unless backslash-escaped) up to the closing "=@".
    fn scan_interpolation(&mut self) -> Result<Node, CompileError> {
        // Skip the whitespace the author put between '=' and the expression.
        self.pos += self.rest().len() - self.rest().trim_start().len();
        let start = self.pos;
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            if b == b'\\' && self.pos + 1 < bytes.len() {
                self.pos += 2;
                continue;
            }
            if b.is_ascii_whitespace() || b == b'@' {
                break;
            }
            self.pos += 1;
        }
        let raw = &self.text[start..self.pos];
        self.pos += self.rest().len() - self.rest().trim_start().len();
        if !self.rest().starts_with("=@") {
            return Err(self.error("expected '=@' to close expression"));
        }
        self.pos += 2;
        Ok(Node::Interpolate(parse_expr(raw)?))
    }

    /// Positioned just after "@%". Reads the keyword identifier, then the
    /// remainder of the header up to the closing literal "@%".
    fn scan_header(&mut self) -> Result<(String, String), CompileError> {
        if self.rest().starts_with(';') {
            return Ok((";".to_string(), String::new()));
        }
        let kw_len = self
            .rest()
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        if kw_len == 0 {
            return Err(self.error("expected a control keyword after '@%'"));
        }
        let keyword = self.rest()[..kw_len].to_string();
        self.pos += kw_len;

        let Some(close_at) = self.rest().find("@%") else {
            return Err(self.error(format!("unterminated '@%{keyword}' header, expected closing '@%'")));
        };
        let rest = self.rest()[..close_at].trim().to_string();
        self.pos += close_at + 2;
        Ok((keyword, rest))
    }

    /// Parses literal text, interpolations, comments and nested blocks until
    /// the end of input or a bare `@%;`/`@%else@%`/`@%case ...@%` tag, which
    /// the caller interprets.
    fn parse_sequence(&mut self) -> Result<(Vec<Node>, StopTag), CompileError> {
        let mut nodes = Vec::new();
        loop {
            let text = self.scan_text();
            if !text.is_empty() {
                nodes.push(Node::Text(text));
            }
            if self.rest().is_empty() {
                return Ok((nodes, StopTag::Eof));
            }
            // Positioned at '@'.
            self.pos += 1;
            match self.rest().chars().next() {
                Some('=') => {
                    self.pos += 1;
                    nodes.push(self.scan_interpolation()?);
                }
                Some('#') => {
                    self.pos += 1;
                    self.scan_comment()?;
                }
                Some('%') => {
                    self.pos += 1;
                    let (keyword, rest) = self.scan_header()?;
                    match keyword.as_str() {
                        ";" => return Ok((nodes, StopTag::End)),
                        "else" => return Ok((nodes, StopTag::Else)),
                        "case" => return Ok((nodes, StopTag::Case(rest))),
                        "if" => nodes.push(self.parse_if(rest)?),
                        "for" => nodes.push(self.parse_for(rest)?),
                        "switch" => nodes.push(self.parse_switch(rest)?),
                        "set" => nodes.push(self.parse_set(rest)?),
                        "macro" => nodes.push(self.parse_macro(rest)?),
                        "call" => nodes.push(self.parse_call(rest)?),
                        other => return Err(self.error(format!("unknown control keyword '{other}'"))),
                    }
                }
                _ => return Err(self.error("expected '=', '#' or '%' after '@'")),
            }
        }
    }

    fn parse_if(&mut self, cond_text: String) -> Result<Node, CompileError> {
        let cond = parse_expr(&cond_text)?;
        let (body, tag) = self.parse_sequence()?;
        let mut branches = vec![(cond, body)];
        let else_branch = match tag {
            StopTag::End => None,
            StopTag::Else => {
                let (else_body, tag2) = self.parse_sequence()?;
                match tag2 {
                    StopTag::End => Some(else_body),
                    _ => return Err(self.error("expected '@%;' to close 'if' after 'else'")),
                }
            }
            _ => return Err(self.error("expected '@%else@%' or '@%;' to close 'if'")),
        };
        // `branches` stays a single-element vec: the grammar has no `elseif`.
        let _ = &mut branches;
        Ok(Node::If { branches, else_branch })
    }

    fn parse_for(&mut self, header: String) -> Result<Node, CompileError> {
        let (vars, expr_text) = header
            .split_once(" in ")
            .ok_or_else(|| self.error("expected 'for x, y in expr'"))?;
        let mut vars = vars.split(',').map(|v| v.trim().to_string());
        let index_var = vars.next().filter(|v| !v.is_empty()).ok_or_else(|| self.error("'for' is missing its index variable"))?;
        let value_var = vars.next().filter(|v| !v.is_empty()).ok_or_else(|| self.error("'for' is missing its value variable"))?;
        let expr = parse_expr(expr_text.trim())?;
        let (body, tag) = self.parse_sequence()?;
        match tag {
            StopTag::End => Ok(Node::For { index_var, value_var, expr, body }),
            _ => Err(self.error("expected '@%;' to close 'for'")),
        }
    }

    fn parse_switch(&mut self, subject_text: String) -> Result<Node, CompileError> {
        let expr = parse_expr(&subject_text)?;
        let (leading, mut tag) = self.parse_sequence()?;
        if !leading.is_empty() {
            return Err(self.error("content is not allowed between 'switch' and its first 'case'"));
        }
        let mut cases = Vec::new();
        loop {
            match tag {
                StopTag::Case(case_text) => {
                    let case_expr = parse_expr(&case_text)?;
                    let (body, next_tag) = self.parse_sequence()?;
                    cases.push((case_expr, body));
                    tag = next_tag;
                }
                StopTag::Else => {
                    let (default_body, next_tag) = self.parse_sequence()?;
                    return match next_tag {
                        StopTag::End => Ok(Node::Switch { expr, cases, default: Some(default_body) }),
                        _ => Err(self.error("expected '@%;' to close 'switch' after 'else'")),
                    };
                }
                StopTag::End => return Ok(Node::Switch { expr, cases, default: None }),
                StopTag::Eof => return Err(self.error("unterminated 'switch'")),
            }
        }
    }

    fn parse_set(&mut self, header: String) -> Result<Node, CompileError> {
        let (name, expr_text) = header
            .split_once('=')
            .ok_or_else(|| self.error("expected 'set name = expr'"))?;
        let name = name.trim().to_string();
        let expr = parse_expr(expr_text.trim())?;
        let (body, tag) = self.parse_sequence()?;
        if !body.is_empty() {
            return Err(self.error("'set' does not take a body"));
        }
        match tag {
            StopTag::End => Ok(Node::Set { name, expr }),
            _ => Err(self.error("expected '@%;' to close 'set'")),
        }
    }

    fn parse_macro(&mut self, header: String) -> Result<Node, CompileError> {
        let (name, params) = parse_signature(&header, &|s| self.error(s))?;
        let (body, tag) = self.parse_sequence()?;
        match tag {
            StopTag::End => Ok(Node::MacroDef { name, params, body }),
            _ => Err(self.error("expected '@%;' to close 'macro'")),
        }
    }

    fn parse_call(&mut self, header: String) -> Result<Node, CompileError> {
        let paren_at = header.find('(').ok_or_else(|| self.error("expected 'call name(...)'"))?;
        if !header.ends_with(')') {
            return Err(self.error("expected 'call name(...)' to close with ')'"));
        }
        let name = header[..paren_at].trim().to_string();
        let args_text = &header[paren_at + 1..header.len() - 1];
        let args = parse_expr_list(args_text)?;
        let (body, tag) = self.parse_sequence()?;
        if !body.is_empty() {
            return Err(self.error("'call' does not take a body"));
        }
        match tag {
            StopTag::End => Ok(Node::Call { name, args }),
            _ => Err(self.error("expected '@%;' to close 'call'")),
        }
    }
}

/// Parses a `name(p1: T1, p2: T2)` macro signature. Not an expression — the
/// right-hand side of each parameter is a bare type name, not a value.
fn parse_signature(header: &str, err: &dyn Fn(String) -> CompileError) -> Result<(String, Vec<(String, String)>), CompileError> {
    let paren_at = header.find('(').ok_or_else(|| err("expected 'macro name(p1: T1, ...)'".into()))?;
    if !header.ends_with(')') {
        return Err(err("expected 'macro name(...)' to close with ')'".into()));
    }
    let name = header[..paren_at].trim().to_string();
    let params_text = &header[paren_at + 1..header.len() - 1];
    let mut params = Vec::new();
    if !params_text.trim().is_empty() {
        for param in params_text.split(',') {
            let (pname, ptype) = param
                .split_once(':')
                .ok_or_else(|| err(format!("expected 'name: Type' in macro parameter '{param}'")))?;
            params.push((pname.trim().to_string(), ptype.trim().to_string()));
        }
    }
    Ok((name, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Expr};

    #[test]
    fn parses_plain_text() {
        let nodes = parse_template("hello world").unwrap();
        assert_eq!(nodes, vec![Node::Text("hello world".into())]);
    }

    #[test]
    fn parses_escaped_at_sign() {
        let nodes = parse_template(r"price: \@home").unwrap();
        assert_eq!(nodes, vec![Node::Text("price: @home".into())]);
    }

    #[test]
    fn parses_interpolation() {
        let nodes = parse_template("x = @=a.b=@ done").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("x = ".into()),
                Node::Interpolate(Expr::Member(Box::new(Expr::Ident("a".into())), "b".into())),
                Node::Text(" done".into()),
            ]
        );
    }

    #[test]
    fn parses_comment_as_no_op() {
        let nodes = parse_template("a@# this is dropped #@b").unwrap();
        assert_eq!(nodes, vec![Node::Text("a".into()), Node::Text("b".into())]);
    }

    #[test]
    fn parses_for_loop_with_index_and_value() {
        let nodes = parse_template("@%for k, v in items@%(@=k=@:@=v=@)@%;").unwrap();
        match &nodes[0] {
            Node::For { index_var, value_var, .. } => {
                assert_eq!(index_var, "k");
                assert_eq!(value_var, "v");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_if_else() {
        let nodes = parse_template("@%if a == b@%yes@%else@%no@%;").unwrap();
        match &nodes[0] {
            Node::If { branches, else_branch } => {
                assert_eq!(branches.len(), 1);
                assert_eq!(branches[0].0, Expr::Binary(BinaryOp::Eq, Box::new(Expr::Ident("a".into())), Box::new(Expr::Ident("b".into()))));
                assert_eq!(branches[0].1, vec![Node::Text("yes".into())]);
                assert_eq!(else_branch.as_deref(), Some(&[Node::Text("no".into())][..]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_switch_with_default() {
        let nodes = parse_template("@%switch k@%@%case 1@%one@%case 2@%two@%else@%other@%;").unwrap();
        match &nodes[0] {
            Node::Switch { cases, default, .. } => {
                assert_eq!(cases.len(), 2);
                assert!(default.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_set_statement() {
        let nodes = parse_template("@%set total = 1 + 2@%;").unwrap();
        match &nodes[0] {
            Node::Set { name, expr } => {
                assert_eq!(name, "total");
                assert_eq!(*expr, Expr::Binary(BinaryOp::Add, Box::new(Expr::Int(1)), Box::new(Expr::Int(2))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_macro_definition_and_call() {
        let nodes = parse_template("@%macro greet(name: string)@%hi @=name=@@%;@%call greet(who)@%;").unwrap();
        match &nodes[0] {
            Node::MacroDef { name, params, .. } => {
                assert_eq!(name, "greet");
                assert_eq!(params, &vec![("name".to_string(), "string".to_string())]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &nodes[1] {
            Node::Call { name, args } => {
                assert_eq!(name, "greet");
                assert_eq!(args, &vec![Expr::Ident("who".into())]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        assert!(parse_template("@# never closes").is_err());
    }

    #[test]
    fn stray_terminator_is_an_error() {
        assert!(parse_template("leftover @%;").is_err());
    }

    #[test]
    fn nested_if_inside_for_body() {
        let nodes = parse_template("@%for i, v in xs@%@%if v@%(@=v=@)@%;@%;").unwrap();
        match &nodes[0] {
            Node::For { body, .. } => {
                assert_eq!(body.len(), 1);
                assert!(matches!(body[0], Node::If { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
