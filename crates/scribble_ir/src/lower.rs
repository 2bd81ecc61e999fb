//! Lowers a bound AST (`scribble-ast`) into `Program`.
//!
//! Grounded on `spec.md` §4.5's lowering shape: each bound module becomes
//! an IR module, each function-impl becomes an IR function whose
//! parameters are indexed by declaration order, statement lowering walks
//! the bound tree producing zero or more ops per statement, expression
//! lowering is post-order producing a `ValueLocation` naming the result,
//! and control flow lowers to labels and conditional branches with
//! `break`/`continue` resolving to the nearest enclosing loop's exit/head
//! label.

use scribble_ast::{BoundArena, BoundId, BoundKind, TypeId, BOOL_ID, DECIMAL_ID, INT_ID, STRING_ID};
use scribble_base::{IdAllocator, Interner, Symbol};

use crate::location::{Register, ValueLocation, ValueLocationKind};
use crate::op::Op;
use crate::program::{Function, Module, Program};

struct LoopLabels {
    break_label: u32,
    continue_label: u32,
}

struct Lowering<'a> {
    bound: &'a BoundArena,
    interner: &'a mut Interner,
    labels: IdAllocator,
    registers: IdAllocator,
    ops: Vec<Op>,
    locals: Vec<TypeId>,
    loop_stack: Vec<LoopLabels>,
}

impl<'a> Lowering<'a> {
    fn fresh_label(&mut self) -> u32 {
        self.labels.next() as u32
    }

    fn fresh_register(&mut self, ty: TypeId) -> ValueLocation {
        let id = self.registers.next() as u32;
        ValueLocation::new(ValueLocationKind::Register(Register::Virtual(id)), ty)
    }

    fn emit(&mut self, op: Op) {
        self.ops.push(op);
    }

    fn lower_function(&mut self, id: BoundId) -> Function {
        let BoundKind::Function { name, parameters, return_type, implementation } = self.bound.get(id).kind.clone() else {
            unreachable!("lower_function called on non-Function node");
        };
        self.ops = Vec::new();
        self.locals = Vec::new();
        self.labels = IdAllocator::new();
        self.registers = IdAllocator::new();

        let mut parameter_types = Vec::with_capacity(parameters.len());
        for param_id in &parameters {
            let BoundKind::Parameter { ty, slot, .. } = self.bound.get(*param_id).kind else {
                unreachable!("Function.parameters only ever holds Parameter nodes");
            };
            parameter_types.push(ty);
            self.reserve_local(slot, ty);
        }

        if let Some(body) = implementation {
            self.lower_statement(body);
        }
        // Every function falls through to an implicit return if the
        // author's control flow didn't already end in one — per
        // `spec.md` §4.5's "at least one return (lowered even from
        // implicit fall-through at function end)" invariant.
        if !matches!(self.ops.last(), Some(Op::Return { .. })) {
            self.emit(Op::Return { value: None });
        }

        let mut function = Function::new(name, parameter_types, return_type);
        function.locals = self.locals.clone();
        function.ops = self.ops.clone();
        function
    }

    fn reserve_local(&mut self, slot: u32, ty: TypeId) {
        let slot = slot as usize;
        if self.locals.len() <= slot {
            self.locals.resize(slot + 1, INT_ID);
        }
        self.locals[slot] = ty;
    }

    fn lower_statement(&mut self, id: BoundId) {
        match self.bound.get(id).kind.clone() {
            BoundKind::Block { statements } => {
                for stmt in statements {
                    self.lower_statement(stmt);
                }
            }
            BoundKind::Return { expr } => {
                let value = expr.map(|e| self.lower_expr(e));
                self.emit(Op::Return { value });
            }
            BoundKind::Break => {
                let label = self.loop_stack.last().expect("break outside a loop").break_label;
                self.emit(Op::Jump(label));
            }
            BoundKind::Continue => {
                let label = self.loop_stack.last().expect("continue outside a loop").continue_label;
                self.emit(Op::Jump(label));
            }
            BoundKind::VariableDecl { ty, initializer, slot, .. } => {
                self.reserve_local(slot, ty);
                if let Some(init) = initializer {
                    let value = self.lower_expr(init);
                    self.emit(Op::StoreLocal { slot, src: value });
                }
            }
            BoundKind::Assignment { variable, expr } => {
                let value = self.lower_expr(expr);
                self.lower_store(variable, value);
            }
            BoundKind::If { condition, then_branch, else_branch } => {
                let cond = self.lower_expr(condition);
                let else_label = self.fresh_label();
                let end_label = self.fresh_label();
                self.emit(Op::JumpIfFalse { cond, label: else_label });
                self.lower_statement(then_branch);
                self.emit(Op::Jump(end_label));
                self.emit(Op::Label(else_label));
                if let Some(else_b) = else_branch {
                    self.lower_statement(else_b);
                }
                self.emit(Op::Label(end_label));
            }
            BoundKind::While { condition, body } => {
                let head = self.fresh_label();
                let end = self.fresh_label();
                self.emit(Op::Label(head));
                let cond = self.lower_expr(condition);
                self.emit(Op::JumpIfFalse { cond, label: end });
                self.loop_stack.push(LoopLabels { break_label: end, continue_label: head });
                self.lower_statement(body);
                self.loop_stack.pop();
                self.emit(Op::Jump(head));
                self.emit(Op::Label(end));
            }
            BoundKind::Loop { body } => {
                let head = self.fresh_label();
                let end = self.fresh_label();
                self.emit(Op::Label(head));
                self.loop_stack.push(LoopLabels { break_label: end, continue_label: head });
                self.lower_statement(body);
                self.loop_stack.pop();
                self.emit(Op::Jump(head));
                self.emit(Op::Label(end));
            }
            BoundKind::For { range, body, .. } => self.lower_for(id, range, body),
            other => unreachable!("{other:?} is not a supported statement form"),
        }
    }

    /// Lowers a `for variable in range` loop against a small, fixed
    /// iteration protocol (`__range_begin`/`__range_has_next`/
    /// `__range_next`) rather than any concrete container representation:
    /// `spec.md` §3 names `for_statement{variable, range, statement}` but
    /// never pins down what a range value actually is. This mirrors how a
    /// for-each over an opaque iterator lowers in languages that don't
    /// fix an iteration protocol at the type-system level, and is
    /// recorded as a resolved design decision in `DESIGN.md`.
    fn lower_for(&mut self, for_id: BoundId, range: BoundId, body: BoundId) {
        let BoundKind::For { variable: _, range: _, body: _ } = self.bound.get(for_id).kind else {
            unreachable!("lower_for called on non-For node");
        };
        let loop_var_slot = self.for_loop_var_slot(body);
        let range_value = self.lower_expr(range);
        let iter_slot = self.locals.len() as u32;
        self.reserve_local(iter_slot, INT_ID);

        let begin_fn = self.bound_synthetic_fn("__range_begin");
        let has_next_fn = self.bound_synthetic_fn("__range_has_next");
        let next_fn = self.bound_synthetic_fn("__range_next");

        let iter_loc = self.fresh_register(INT_ID);
        self.emit(Op::Call { dest: Some(iter_loc.clone()), function: begin_fn, args: vec![range_value] });
        self.emit(Op::StoreLocal { slot: iter_slot, src: iter_loc });

        let head = self.fresh_label();
        let end = self.fresh_label();
        self.emit(Op::Label(head));
        let iter_loc = self.fresh_register(INT_ID);
        self.emit(Op::LoadLocal { dest: iter_loc.clone(), slot: iter_slot });
        let cond = self.fresh_register(BOOL_ID);
        self.emit(Op::Call { dest: Some(cond.clone()), function: has_next_fn, args: vec![iter_loc] });
        self.emit(Op::JumpIfFalse { cond, label: end });

        let iter_loc = self.fresh_register(INT_ID);
        self.emit(Op::LoadLocal { dest: iter_loc.clone(), slot: iter_slot });
        let value = self.fresh_register(INT_ID);
        self.emit(Op::Call { dest: Some(value.clone()), function: next_fn, args: vec![iter_loc] });
        self.emit(Op::StoreLocal { slot: loop_var_slot, src: value });

        self.loop_stack.push(LoopLabels { break_label: end, continue_label: head });
        self.lower_statement(body);
        self.loop_stack.pop();
        self.emit(Op::Jump(head));
        self.emit(Op::Label(end));
    }

    /// The binder declares the loop variable as the first statement of
    /// the loop's own scope (see `scribble_ast::binder::bind_statement`'s
    /// `For` arm); its slot is recovered from that declaration rather
    /// than re-derived here.
    fn for_loop_var_slot(&self, body: BoundId) -> u32 {
        if let BoundKind::Block { statements } = &self.bound.get(body).kind {
            if let Some(first) = statements.first() {
                if let BoundKind::VariableDecl { slot, .. } = self.bound.get(*first).kind {
                    return slot;
                }
            }
        }
        0
    }

    fn bound_synthetic_fn(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    fn lower_store(&mut self, target: BoundId, value: ValueLocation) {
        match self.bound.get(target).kind {
            BoundKind::Variable { declaration, .. } => {
                let slot = self.slot_of(declaration);
                self.emit(Op::StoreLocal { slot, src: value });
            }
            ref other => unreachable!("{other:?} is not an assignable location"),
        }
    }

    fn slot_of(&self, declaration: BoundId) -> u32 {
        match self.bound.get(declaration).kind {
            BoundKind::Parameter { slot, .. } | BoundKind::VariableDecl { slot, .. } => slot,
            ref other => unreachable!("{other:?} does not own a stack slot"),
        }
    }

    fn lower_expr(&mut self, id: BoundId) -> ValueLocation {
        match self.bound.get(id).kind.clone() {
            BoundKind::Integer(n) => {
                let dest = self.fresh_register(INT_ID);
                self.emit(Op::LoadImmediate { dest: dest.clone(), value: n });
                dest
            }
            BoundKind::Decimal(n) => {
                let dest = self.fresh_register(DECIMAL_ID);
                self.emit(Op::LoadFloat { dest: dest.clone(), value: n });
                dest
            }
            BoundKind::Bool(b) => {
                let dest = self.fresh_register(BOOL_ID);
                self.emit(Op::LoadImmediate { dest: dest.clone(), value: b as i64 });
                dest
            }
            BoundKind::StringLit(s) => {
                let dest = self.fresh_register(STRING_ID);
                self.emit(Op::LoadString { dest: dest.clone(), value: s });
                dest
            }
            BoundKind::Variable { declaration, ty, .. } => {
                let slot = self.slot_of(declaration);
                let dest = self.fresh_register(ty);
                self.emit(Op::LoadLocal { dest: dest.clone(), slot });
                dest
            }
            BoundKind::BinaryExpr { op, lhs, rhs, ty } => {
                let l = self.lower_expr(lhs);
                let r = self.lower_expr(rhs);
                let dest = self.fresh_register(ty);
                self.emit(Op::BinaryOp { op, dest: dest.clone(), lhs: l, rhs: r });
                dest
            }
            BoundKind::UnaryExpr { op, operand, ty } => {
                let o = self.lower_expr(operand);
                let dest = self.fresh_register(ty);
                self.emit(Op::UnaryOp { op, dest: dest.clone(), operand: o });
                dest
            }
            BoundKind::FunctionCall { function, arguments, discard_result } => {
                let args: Vec<ValueLocation> = arguments.iter().map(|a| self.lower_expr(*a)).collect();
                let BoundKind::Function { name, return_type, .. } = self.bound.get(function).kind.clone() else {
                    unreachable!("FunctionCall.function must reference a Function node");
                };
                let dest = if discard_result { None } else { Some(self.fresh_register(return_type)) };
                self.emit(Op::Call { dest: dest.clone(), function: name, args });
                dest.unwrap_or_else(|| ValueLocation::discard(return_type))
            }
            other => unreachable!("{other:?} is not a supported expression form"),
        }
    }
}

/// Lowers every module reachable from `bound`'s `Program` root into an IR
/// [`Program`]. `entry_point_name`, if given, marks the one function
/// whose name matches as the program's entry point. `interner` must be
/// the same interner `bound`'s symbols were created from; it is also
/// used to intern the names of the small fixed set of runtime helpers
/// `for`-loop lowering calls (see `lower_for`).
pub fn lower_program(bound: &BoundArena, root: BoundId, entry_point_name: Option<&str>, interner: &mut Interner) -> Program {
    let mut lowering = Lowering {
        bound,
        interner,
        labels: IdAllocator::new(),
        registers: IdAllocator::new(),
        ops: Vec::new(),
        locals: Vec::new(),
        loop_stack: Vec::new(),
    };

    let BoundKind::Program { modules } = bound.get(root).kind.clone() else {
        unreachable!("lower_program's root must be a Program node");
    };

    let mut program = Program::new();
    for module_id in modules {
        let BoundKind::Module { name, functions } = bound.get(module_id).kind.clone() else {
            unreachable!("Program.modules only ever holds Module nodes");
        };
        let mut module = Module { name, functions: Vec::new(), statics: Vec::new() };
        for function_id in functions {
            let mut function = lowering.lower_function(function_id);
            if let Some(entry_name) = entry_point_name {
                if interner.resolve(function.name) == entry_name {
                    function.is_entry_point = true;
                }
            }
            module.functions.push(function);
        }
        program.modules.push(module);
    }
    program
}
