//! Template AST: the sequence of nodes a template compiles down to before
//! evaluation.

use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Interpolate(Expr),
    If {
        /// `if`, then zero or more trailing conditions chained by `else`
        /// carrying their own guard expression (there is no `elseif`
        /// keyword; a bare `else` is the last entry with `cond == None`).
        branches: Vec<(Expr, Vec<Node>)>,
        else_branch: Option<Vec<Node>>,
    },
    For {
        index_var: String,
        value_var: String,
        expr: Expr,
        body: Vec<Node>,
    },
    Switch {
        expr: Expr,
        cases: Vec<(Expr, Vec<Node>)>,
        default: Option<Vec<Node>>,
    },
    Set {
        name: String,
        expr: Expr,
    },
    MacroDef {
        name: String,
        params: Vec<(String, String)>,
        body: Vec<Node>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}
