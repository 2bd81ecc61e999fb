//! Evaluates a parsed template against a context, producing text.
//!
//! Rendering is single-pass: a `macro` definition is recorded as it is
//! encountered and `call` resolves it immediately, so a macro can only be
//! called after its definition has been rendered past (no hoisting).

use std::collections::HashMap;

use scribble_base::{CompileError, Span, SpannedError};

use crate::ast::Node;
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::value::Value;

#[derive(Clone)]
struct Macro {
    params: Vec<(String, String)>,
    body: Vec<Node>,
}

struct Scope {
    bindings: HashMap<String, Value>,
}

struct Renderer {
    scopes: Vec<Scope>,
    macros: HashMap<String, Macro>,
    out: String,
}

impl Renderer {
    fn new(context: Value) -> Self {
        let mut root = HashMap::new();
        if let Value::Object(fields) = context {
            for (k, v) in fields {
                root.insert(k, v);
            }
        }
        Renderer {
            scopes: vec![Scope { bindings: root }],
            macros: HashMap::new(),
            out: String::new(),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope { bindings: HashMap::new() });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn set(&mut self, name: &str, value: Value) {
        self.scopes
            .last_mut()
            .expect("at least one scope always present")
            .bindings
            .insert(name.to_string(), value);
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes.iter().rev().find_map(|s| s.bindings.get(name).cloned())
    }

    fn render_nodes(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            self.render_node(node)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Text(text) => {
                self.out.push_str(text);
                Ok(())
            }
            Node::Interpolate(expr) => {
                let value = self.eval(expr)?;
                self.out.push_str(&value.to_string());
                Ok(())
            }
            Node::If { branches, else_branch } => {
                for (cond, body) in branches {
                    if self.eval(cond)?.is_truthy() {
                        self.push_scope();
                        let result = self.render_nodes(body);
                        self.pop_scope();
                        return result;
                    }
                }
                if let Some(body) = else_branch {
                    self.push_scope();
                    let result = self.render_nodes(body);
                    self.pop_scope();
                    return result;
                }
                Ok(())
            }
            Node::For { index_var, value_var, expr, body } => {
                let iterable = self.eval(expr)?;
                match iterable {
                    Value::Array(items) => {
                        for (ix, item) in items.into_iter().enumerate() {
                            self.push_scope();
                            self.set(index_var, Value::Number(ix as i32));
                            self.set(value_var, item);
                            let result = self.render_nodes(body);
                            self.pop_scope();
                            result?;
                        }
                        Ok(())
                    }
                    Value::Object(fields) => {
                        for (key, val) in fields {
                            self.push_scope();
                            self.set(index_var, Value::Str(key));
                            self.set(value_var, val);
                            let result = self.render_nodes(body);
                            self.pop_scope();
                            result?;
                        }
                        Ok(())
                    }
                    other => Err(template_error(format!("'for' requires an array or object, found {}", other.type_name()))),
                }
            }
            Node::Switch { expr, cases, default } => {
                let subject = self.eval(expr)?;
                for (case_expr, body) in cases {
                    let case_value = self.eval(case_expr)?;
                    if subject.structural_eq(&case_value) {
                        self.push_scope();
                        let result = self.render_nodes(body);
                        self.pop_scope();
                        return result;
                    }
                }
                if let Some(body) = default {
                    self.push_scope();
                    let result = self.render_nodes(body);
                    self.pop_scope();
                    return result;
                }
                Ok(())
            }
            Node::Set { name, expr } => {
                let value = self.eval(expr)?;
                self.set(name, value);
                Ok(())
            }
            Node::MacroDef { name, params, body } => {
                self.macros.insert(
                    name.clone(),
                    Macro {
                        params: params.clone(),
                        body: body.clone(),
                    },
                );
                Ok(())
            }
            Node::Call { name, args } => self.call_macro(name, args),
        }
    }

    fn call_macro(&mut self, name: &str, args: &[Expr]) -> Result<(), CompileError> {
        let mac = self
            .macros
            .get(name)
            .cloned()
            .ok_or_else(|| template_error(format!("call to undefined macro '{name}'")))?;
        if mac.params.len() != args.len() {
            return Err(template_error(format!(
                "macro '{name}' expects {} argument(s), got {}",
                mac.params.len(),
                args.len()
            )));
        }
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        self.push_scope();
        for ((pname, ptype), value) in mac.params.iter().zip(values) {
            check_param_type(name, pname, ptype, &value)?;
            self.set(pname, value);
        }
        let result = self.render_nodes(&mac.body);
        self.pop_scope();
        result
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, CompileError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Ident(name) => self
                .lookup(name)
                .ok_or_else(|| template_error(format!("undefined variable '{name}'"))),
            Expr::Member(base, name) => {
                let value = self.eval(base)?;
                value
                    .get_member(name)
                    .ok_or_else(|| template_error(format!("'{name}' is not a field of {}", value.type_name())))
            }
            Expr::ArrayLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::Array(values))
            }
            Expr::Unary(op, inner) => {
                let value = self.eval(inner)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => as_number(&value).map(|n| Value::Number(-n)),
                    UnaryOp::Plus => as_number(&value).map(Value::Number),
                }
            }
            Expr::Binary(op, lhs, rhs) => self.eval_binary(*op, lhs, rhs),
            Expr::Call(..) => Err(template_error(
                "expression-level function calls are not supported; use a 'call' control block",
            )),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, CompileError> {
        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;
        match op {
            BinaryOp::Eq => return Ok(Value::Bool(left.structural_eq(&right))),
            BinaryOp::Ne => return Ok(Value::Bool(!left.structural_eq(&right))),
            _ => {}
        }
        let a = as_number(&left)?;
        let b = as_number(&right)?;
        Ok(match op {
            BinaryOp::Mul => Value::Number(a.wrapping_mul(b)),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(template_error("division by zero"));
                }
                Value::Number(a / b)
            }
            BinaryOp::Mod => {
                if b == 0 {
                    return Err(template_error("modulo by zero"));
                }
                Value::Number(a % b)
            }
            BinaryOp::Add => Value::Number(a.wrapping_add(b)),
            BinaryOp::Sub => Value::Number(a.wrapping_sub(b)),
            BinaryOp::Lt => Value::Bool(a < b),
            BinaryOp::Le => Value::Bool(a <= b),
            BinaryOp::Gt => Value::Bool(a > b),
            BinaryOp::Ge => Value::Bool(a >= b),
            BinaryOp::Eq | BinaryOp::Ne => unreachable!("handled above"),
        })
    }
}

fn as_number(value: &Value) -> Result<i32, CompileError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(template_error(format!("expected a number, found {}", other.type_name()))),
    }
}

fn check_param_type(macro_name: &str, param_name: &str, type_name: &str, value: &Value) -> Result<(), CompileError> {
    let matches = match type_name {
        "string" => matches!(value, Value::Str(_)),
        "integer" | "number" => matches!(value, Value::Number(_)),
        "boolean" => matches!(value, Value::Bool(_)),
        "array" => matches!(value, Value::Array(_)),
        "object" => matches!(value, Value::Object(_)),
        // An unrecognised declared type is treated as opaque/any.
        _ => true,
    };
    if matches {
        Ok(())
    } else {
        Err(template_error(format!(
            "macro '{macro_name}' parameter '{param_name}' expects {type_name}, got {}",
            value.type_name()
        )))
    }
}

fn template_error(message: impl Into<String>) -> CompileError {
    CompileError::Template(SpannedError::new(message.into(), Span::new(0, 0)))
}

pub fn render_nodes(nodes: &[Node], context: Value) -> Result<String, CompileError> {
    let mut renderer = Renderer::new(context);
    renderer.render_nodes(nodes)?;
    Ok(renderer.out)
}
