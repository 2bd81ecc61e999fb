//! Binds an unbound [`crate::syntax::SyntaxArena`] tree into a
//! [`crate::bound::BoundArena`] tree: resolves names against lexical scope,
//! assigns a [`TypeId`] to every value-producing node, and accumulates
//! every failure instead of stopping at the first one.
//!
//! Grounded on `spec.md` §3's Bound node description and
//! `examples/original_source/scribble/src/scribble/binder.h`'s
//! `BoundNodeType`/`BoundNode` shape (the tagged-union-of-structs layout
//! there is what `crate::bound::BoundKind`'s variants mirror field-for-field
//! for the subset of node kinds this binder actually implements).

use std::collections::HashMap;

use log::trace;
use scribble_base::{BindError, Interner, Location, Span, Symbol};

use crate::bound::{BoundArena, BoundId, BoundKind};
use crate::syntax::{Literal, NodeId as SyntaxId, Operator, SyntaxArena, SyntaxKind};
use crate::types::{TypeDescriptor, TypeId, TypeKind, TypeRegistry, BOOL_ID, DECIMAL_ID, INT_ID, STRING_ID};

struct Scope {
    bindings: HashMap<Symbol, BoundId>,
}

struct Binder<'a> {
    syntax: &'a SyntaxArena,
    interner: &'a Interner,
    types: &'a mut TypeRegistry,
    bound: BoundArena,
    scopes: Vec<Scope>,
    next_slot: u32,
    errors: Vec<BindError>,
}

impl<'a> Binder<'a> {
    fn push_scope(&mut self) {
        self.scopes.push(Scope { bindings: HashMap::new() });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: Symbol, id: BoundId) {
        self.scopes.last_mut().expect("at least one scope always present").bindings.insert(name, id);
    }

    fn resolve(&self, name: Symbol) -> Option<BoundId> {
        self.scopes.iter().rev().find_map(|s| s.bindings.get(&name).copied())
    }

    fn error_at(&mut self, message: String, location: &Location) {
        let offset = location.byte_index;
        self.errors.push(BindError::new(message, Span::new(offset, offset)));
    }

    fn bind_type_ref(&mut self, id: SyntaxId) -> TypeId {
        match &self.syntax.get(id).kind {
            SyntaxKind::TypeRef { name, .. } => {
                if let Some(ty) = self.types.lookup(*name) {
                    ty
                } else {
                    let location = self.syntax.get(id).location.clone();
                    let message = format!("undefined type '{}'", self.interner.resolve(*name));
                    self.error_at(message, &location);
                    INT_ID
                }
            }
            other => unreachable!("bind_type_ref called on non-type-ref node {other:?}"),
        }
    }

    /// Registers a module-level `struct`/`variant`/`enum` declaration in
    /// the type registry. Field/option/value types are resolved against
    /// whatever the registry already holds, so a type can reference any
    /// earlier sibling declaration but not a later one.
    fn bind_type_decl(&mut self, id: SyntaxId) {
        let kind = self.syntax.get(id).kind.clone();
        match kind {
            SyntaxKind::Struct { name, components } => {
                let fields: Vec<(Symbol, TypeId)> = components
                    .iter()
                    .map(|c| match &self.syntax.get(*c).kind {
                        SyntaxKind::TypeComponent { name, type_ref } => (*name, self.bind_type_ref(*type_ref)),
                        other => unreachable!("expected TypeComponent, found {other:?}"),
                    })
                    .collect();
                self.types.register(TypeDescriptor { name, kind: TypeKind::Struct { fields } });
            }
            SyntaxKind::Variant { name, options } => {
                let variants: Vec<(Symbol, Option<TypeId>)> = options
                    .iter()
                    .map(|o| match &self.syntax.get(*o).kind {
                        SyntaxKind::VariantOption { name, payload_type } => (*name, payload_type.map(|t| self.bind_type_ref(t))),
                        other => unreachable!("expected VariantOption, found {other:?}"),
                    })
                    .collect();
                self.types.register(TypeDescriptor { name, kind: TypeKind::Variant { options: variants } });
            }
            SyntaxKind::Enumeration { name, values } => {
                let mut next_value = 0i64;
                let entries: Vec<(Symbol, i64)> = values
                    .iter()
                    .map(|v| match &self.syntax.get(*v).kind {
                        SyntaxKind::EnumValue { name, value } => {
                            let v = value.unwrap_or(next_value);
                            next_value = v + 1;
                            (*name, v)
                        }
                        other => unreachable!("expected EnumValue, found {other:?}"),
                    })
                    .collect();
                self.types.register(TypeDescriptor { name, kind: TypeKind::Enumeration { underlying: INT_ID, values: entries } });
            }
            other => unreachable!("expected a type declaration, found {other:?}"),
        }
    }

    fn bind_program(&mut self, id: SyntaxId) -> BoundId {
        let SyntaxKind::Program { modules } = &self.syntax.get(id).kind else {
            unreachable!("root node must be Program");
        };
        let modules = modules.clone();
        let location = self.syntax.get(id).location.clone();
        let bound_modules: Vec<BoundId> = modules.iter().map(|m| self.bind_module(*m)).collect();
        self.bound.push(BoundKind::Program { modules: bound_modules }, Symbol::EMPTY, location, None)
    }

    fn bind_module(&mut self, id: SyntaxId) -> BoundId {
        let (name, types, functions, location) = match &self.syntax.get(id).kind {
            SyntaxKind::Module { name, types, functions, .. } => (*name, types.clone(), functions.clone(), self.syntax.get(id).location.clone()),
            other => unreachable!("expected Module, found {other:?}"),
        };
        self.push_scope();
        // Declaration-order, single pass: a struct field referencing a type
        // declared later in the same module reports an undefined-type
        // error rather than resolving through a forward declaration.
        for type_id in &types {
            self.bind_type_decl(*type_id);
        }
        // Two passes so functions can call forward-declared siblings and
        // recurse into themselves: every signature is bound and declared
        // before any body is bound.
        let signatures: Vec<BoundId> = functions.iter().map(|f| self.bind_function_signature(*f)).collect();
        for (syntax_id, bound_id) in functions.iter().zip(signatures.iter()) {
            self.bind_function_body(*syntax_id, *bound_id);
        }
        self.pop_scope();
        self.bound.push(BoundKind::Module { name, functions: signatures }, name, location, None)
    }

    fn bind_function_signature(&mut self, id: SyntaxId) -> BoundId {
        let (name, parameters, return_type_ref, location) = match &self.syntax.get(id).kind {
            SyntaxKind::Function { name, parameters, return_type, .. } => {
                (*name, parameters.clone(), *return_type, self.syntax.get(id).location.clone())
            }
            other => unreachable!("expected Function, found {other:?}"),
        };
        let return_type = self.bind_type_ref(return_type_ref);
        self.push_scope();
        self.next_slot = 0;
        let bound_params: Vec<BoundId> = parameters.iter().map(|p| self.bind_parameter(*p)).collect();
        self.pop_scope();
        let bound_id = self.bound.push(
            BoundKind::Function { name, parameters: bound_params, return_type, implementation: None },
            name,
            location,
            None,
        );
        self.declare(name, bound_id);
        bound_id
    }

    fn bind_function_body(&mut self, id: SyntaxId, bound_id: BoundId) {
        let (name, parameters, implementation) = match &self.syntax.get(id).kind {
            SyntaxKind::Function { name, parameters, implementation, .. } => (*name, parameters.clone(), *implementation),
            other => unreachable!("expected Function, found {other:?}"),
        };
        trace!("binding function '{}'", self.interner.resolve(name));
        let Some(body) = implementation else { return };
        self.push_scope();
        self.next_slot = parameters.len() as u32;
        // Re-declare each parameter in this fresh scope using the bound
        // parameter node already produced by `bind_function_signature`.
        let BoundKind::Function { parameters: bound_params, .. } = self.bound.get(bound_id).kind.clone() else {
            unreachable!("bound_id must name the Function just signature-bound");
        };
        for param_id in &bound_params {
            let BoundKind::Parameter { name: param_name, .. } = self.bound.get(*param_id).kind else {
                unreachable!("Function.parameters only ever holds Parameter nodes");
            };
            self.declare(param_name, *param_id);
        }
        let bound_body = self.bind_block(body);
        self.pop_scope();
        if let BoundKind::Function { name, parameters, return_type, .. } = self.bound.get(bound_id).kind.clone() {
            self.bound.replace_kind(
                bound_id,
                BoundKind::Function { name, parameters, return_type, implementation: Some(bound_body) },
            );
        }
    }

    fn bind_parameter(&mut self, id: SyntaxId) -> BoundId {
        let (name, type_ref, location) = match &self.syntax.get(id).kind {
            SyntaxKind::Parameter { name, type_ref } => (*name, *type_ref, self.syntax.get(id).location.clone()),
            other => unreachable!("expected Parameter, found {other:?}"),
        };
        let ty = self.bind_type_ref(type_ref);
        let slot = self.next_slot;
        self.next_slot += 1;
        let bound_id = self.bound.push(BoundKind::Parameter { name, ty, slot }, name, location, None);
        self.declare(name, bound_id);
        bound_id
    }

    fn bind_block(&mut self, id: SyntaxId) -> BoundId {
        let (statements, location) = match &self.syntax.get(id).kind {
            SyntaxKind::Block { statements } => (statements.clone(), self.syntax.get(id).location.clone()),
            other => unreachable!("expected Block, found {other:?}"),
        };
        self.push_scope();
        let bound_statements: Vec<BoundId> = statements.iter().map(|s| self.bind_statement(*s)).collect();
        self.pop_scope();
        self.bound.push(BoundKind::Block { statements: bound_statements }, Symbol::EMPTY, location, None)
    }

    fn bind_statement(&mut self, id: SyntaxId) -> BoundId {
        let location = self.syntax.get(id).location.clone();
        let kind = self.syntax.get(id).kind.clone();
        match kind {
            SyntaxKind::Block { .. } => self.bind_block(id),
            SyntaxKind::Return { expr } => {
                let bound_expr = expr.map(|e| self.bind_expr(e));
                self.bound.push(BoundKind::Return { expr: bound_expr }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::Break => self.bound.push(BoundKind::Break, Symbol::EMPTY, location, None),
            SyntaxKind::Continue => self.bound.push(BoundKind::Continue, Symbol::EMPTY, location, None),
            SyntaxKind::VariableDecl { name, type_ref, initializer, is_const } => {
                let init = initializer.map(|e| self.bind_expr(e));
                let declared_ty = type_ref.map(|t| self.bind_type_ref(t));
                let ty = declared_ty.or_else(|| init.map(|e| self.bound_expr_type(e))).unwrap_or(INT_ID);
                let slot = self.next_slot;
                self.next_slot += 1;
                let bound_id = self.bound.push(
                    BoundKind::VariableDecl { name, ty, initializer: init, is_const, slot },
                    name,
                    location,
                    None,
                );
                self.declare(name, bound_id);
                bound_id
            }
            SyntaxKind::Assignment { target, expr } => {
                let bound_target = self.bind_expr(target);
                let bound_expr = self.bind_expr(expr);
                self.bound.push(BoundKind::Assignment { variable: bound_target, expr: bound_expr }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::If { condition, then_branch, else_branch } => {
                let cond = self.bind_expr(condition);
                let then_b = self.bind_statement(then_branch);
                let else_b = else_branch.map(|e| self.bind_statement(e));
                self.bound.push(BoundKind::If { condition: cond, then_branch: then_b, else_branch: else_b }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::While { condition, body } => {
                let cond = self.bind_expr(condition);
                let bound_body = self.bind_statement(body);
                self.bound.push(BoundKind::While { condition: cond, body: bound_body }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::Loop { body } => {
                let bound_body = self.bind_statement(body);
                self.bound.push(BoundKind::Loop { body: bound_body }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::For { variable, range, body } => {
                let bound_range = self.bind_expr(range);
                self.push_scope();
                let slot = self.next_slot;
                self.next_slot += 1;
                let loop_var = self.bound.push(
                    BoundKind::VariableDecl { name: variable, ty: INT_ID, initializer: None, is_const: false, slot },
                    variable,
                    location.clone(),
                    None,
                );
                self.declare(variable, loop_var);
                let bound_body = self.bind_statement(body);
                self.pop_scope();
                self.bound.push(BoundKind::For { variable, range: bound_range, body: bound_body }, Symbol::EMPTY, location, None)
            }
            // Anything else reaching statement position is an expression
            // statement, e.g. a bare call whose result is discarded.
            _ => self.bind_expr(id),
        }
    }

    fn bound_expr_type(&self, id: BoundId) -> TypeId {
        match &self.bound.get(id).kind {
            BoundKind::Integer(_) => INT_ID,
            BoundKind::Decimal(_) => DECIMAL_ID,
            BoundKind::Bool(_) => BOOL_ID,
            BoundKind::StringLit(_) => STRING_ID,
            BoundKind::BinaryExpr { ty, .. } | BoundKind::UnaryExpr { ty, .. } => *ty,
            BoundKind::Variable { ty, .. } => *ty,
            BoundKind::Cast { target, .. } => *target,
            _ => INT_ID,
        }
    }

    fn bind_expr(&mut self, id: SyntaxId) -> BoundId {
        let location = self.syntax.get(id).location.clone();
        match self.syntax.get(id).kind.clone() {
            SyntaxKind::Lit(Literal::Integer(n)) => self.bound.push(BoundKind::Integer(n), Symbol::EMPTY, location, None),
            SyntaxKind::Lit(Literal::Decimal(n)) => self.bound.push(BoundKind::Decimal(n), Symbol::EMPTY, location, None),
            SyntaxKind::Lit(Literal::Bool(b)) => self.bound.push(BoundKind::Bool(b), Symbol::EMPTY, location, None),
            SyntaxKind::Lit(Literal::String(s)) => self.bound.push(BoundKind::StringLit(s), Symbol::EMPTY, location, None),
            SyntaxKind::NameRef { name } => self.bind_name_ref(id, name, None, location),
            SyntaxKind::VariableRef { name, subscript } => self.bind_name_ref(id, name, subscript, location),
            SyntaxKind::Binary { op, lhs, rhs } => {
                let l = self.bind_expr(lhs);
                let r = self.bind_expr(rhs);
                let ty = match op {
                    Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge | Operator::And | Operator::Or => BOOL_ID,
                    _ => self.bound_expr_type(l),
                };
                self.bound.push(BoundKind::BinaryExpr { op, lhs: l, rhs: r, ty }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::Unary { op, operand } => {
                let o = self.bind_expr(operand);
                let ty = if op == Operator::Not { BOOL_ID } else { self.bound_expr_type(o) };
                self.bound.push(BoundKind::UnaryExpr { op, operand: o, ty }, Symbol::EMPTY, location, None)
            }
            SyntaxKind::FunctionCall { callee, arguments } => {
                let args: Vec<BoundId> = arguments.iter().map(|a| self.bind_expr(*a)).collect();
                let target = match self.resolve(callee) {
                    Some(decl) => decl,
                    None => {
                        let message = format!("undefined function '{}'", self.interner.resolve(callee));
                        self.error_at(message, &location);
                        self.bound.push(BoundKind::Unbound(id), callee, location.clone(), None)
                    }
                };
                self.bound.push(BoundKind::FunctionCall { function: target, arguments: args, discard_result: false }, Symbol::EMPTY, location, None)
            }
            other => {
                let message = format!("{other:?} is not a supported expression form");
                self.error_at(message, &location);
                self.bound.push(BoundKind::Unbound(id), Symbol::EMPTY, location, None)
            }
        }
    }

    fn bind_name_ref(&mut self, id: SyntaxId, name: Symbol, subscript: Option<SyntaxId>, location: Location) -> BoundId {
        match self.resolve(name) {
            Some(decl) => {
                let ty = self.bound_expr_type(decl);
                let bound_subscript = subscript.map(|s| self.bind_expr(s));
                self.bound.push(BoundKind::Variable { declaration: decl, ty, subscript: bound_subscript }, name, location, None)
            }
            None => {
                let message = format!("undefined identifier '{}'", self.interner.resolve(name));
                self.error_at(message, &location);
                self.bound.push(BoundKind::Unbound(id), name, location, None)
            }
        }
    }
}

/// Binds `root` (a `Program` node) against `syntax`, registering any new
/// types it introduces in `types`. Names are resolved through `interner`,
/// the same one used to intern `syntax`'s symbols. Returns the bound tree
/// and its root id on success, or every accumulated [`BindError`] on
/// failure.
pub fn bind_program(
    syntax: &SyntaxArena,
    root: SyntaxId,
    types: &mut TypeRegistry,
    interner: &Interner,
) -> Result<(BoundArena, BoundId), Vec<BindError>> {
    let mut binder = Binder {
        syntax,
        interner,
        types,
        bound: BoundArena::new(),
        scopes: vec![Scope { bindings: HashMap::new() }],
        next_slot: 0,
        errors: Vec::new(),
    };
    let root_id = binder.bind_program(root);
    if binder.errors.is_empty() {
        Ok((binder.bound, root_id))
    } else {
        Err(binder.errors)
    }
}
