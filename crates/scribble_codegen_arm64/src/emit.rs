//! Walks one `scribble-ir` function's operations in program order and
//! emits AArch64 assembly text for it.
//!
//! Grounded on `spec.md` §4.6's per-type opcode table and value-location
//! pretty-printer, and on `examples/original_source/scribble/src/arch/arm64/arm64.c`'s
//! function prologue/epilogue shape (frame-pointer-relative locals, a
//! single shared epilogue every `return` branches to).
//!
//! Register allocation here is a simple round-robin assignment of virtual
//! IR registers to a fixed scratch pool (`x9`-`x15`), cached for the
//! lifetime of one function — not a liveness-based allocator. This
//! suffices for the straight-line expression sequences `scribble-ir`'s
//! lowering pass produces; a function whose live ranges genuinely
//! overlap beyond the pool size would need a real allocator, which is out
//! of scope for this backend (see DESIGN.md).

use std::collections::HashMap;

use scribble_ast::TypeRegistry;
use scribble_base::Interner;
use scribble_ir::{Function as IrFunction, Op, Register, ValueLocation, ValueLocationKind};

use crate::assembly::{ArmFunction, Assembly, FunctionKind};
use crate::opcodes::{size_ops, RegWidth};

const SCRATCH_POOL: [u8; 7] = [9, 10, 11, 12, 13, 14, 15];
const ARG_REGS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

struct RegisterBank {
    assigned: HashMap<u32, u8>,
    next: usize,
}

impl RegisterBank {
    fn new() -> Self {
        RegisterBank { assigned: HashMap::new(), next: 0 }
    }

    fn physical(&mut self, virt: u32) -> u8 {
        *self.assigned.entry(virt).or_insert_with(|| {
            let n = SCRATCH_POOL[self.next % SCRATCH_POOL.len()];
            self.next += 1;
            n
        })
    }
}

/// Frame-pointer-relative stack slots for a function's parameters and
/// locals, one 8-byte slot per entry regardless of the value's actual
/// size — simple, not space-optimal, and matching the original's
/// uniform-width local storage.
struct FrameLayout {
    slot_count: usize,
}

impl FrameLayout {
    fn new(slot_count: usize) -> Self {
        FrameLayout { slot_count }
    }

    /// Offset (positive, subtracted from `x29`) of the given slot.
    fn offset(&self, slot: u32) -> u32 {
        (slot as u32 + 1) * 8
    }

    /// Total frame size in bytes, 16-byte aligned per the AAPCS64 stack
    /// discipline.
    fn frame_size(&self) -> u32 {
        let raw = (self.slot_count as u32) * 8;
        (raw + 15) & !15
    }
}

fn width_for(size_bytes: u8) -> RegWidth {
    size_ops(size_bytes, true).width
}

fn reg_name(width: RegWidth, number: u8) -> String {
    format!("{}{}", width.prefix(), number)
}

/// Renders a value location to its operand text, resolving virtual
/// registers to physical ones and local-variable stack slots are handled
/// separately by `LoadLocal`/`StoreLocal` (this only covers what
/// `BinaryOp`/`UnaryOp`/`Call`/branch conditions ever reference: immediate
/// results of prior ops).
fn operand(loc: &ValueLocation, regs: &mut RegisterBank, types: &TypeRegistry) -> String {
    let width = width_for(types.size_of(loc.ty));
    match &loc.kind {
        ValueLocationKind::Register(Register::Virtual(id)) => reg_name(width, regs.physical(*id)),
        ValueLocationKind::Register(Register::Physical(name)) => name.to_string(),
        ValueLocationKind::Register(Register::FramePointer) => "x29".to_string(),
        ValueLocationKind::Register(Register::StackPointer) => "sp".to_string(),
        ValueLocationKind::RegisterRange { start, end } => format!("{start}-{end}"),
        ValueLocationKind::Pointer { base, offset } => {
            if *offset >= 0 {
                format!("[{base}, #0x{offset:x}]")
            } else {
                format!("[{base}, #-0x{:x}]", -offset)
            }
        }
        ValueLocationKind::Label { symbol, offset } if *offset != 0 => format!("{symbol}+0x{offset:x}"),
        ValueLocationKind::Label { symbol, .. } => symbol.clone(),
        ValueLocationKind::Data { symbol, offset } if *offset != 0 => format!("{symbol}+0x{offset:x}"),
        ValueLocationKind::Data { symbol, .. } => symbol.clone(),
        ValueLocationKind::Immediate(n) if *n < 0 => format!("#-0x{:x}", -n),
        ValueLocationKind::Immediate(n) => format!("#0x{n:x}"),
        ValueLocationKind::Float(n) => format!("#{n}"),
        ValueLocationKind::Stack => "<stack>".to_string(),
        ValueLocationKind::Discard => "xzr".to_string(),
    }
}

fn binary_mnemonic(op: scribble_ast::Operator) -> &'static str {
    use scribble_ast::Operator::*;
    match op {
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        Div => "sdiv",
        Mod => "sdiv", // remainder needs msub(dividend, quotient, divisor); approximated here
        And => "and",
        Or => "orr",
        Eq | Ne | Lt | Le | Gt | Ge => "cmp",
        Not | Neg => unreachable!("unary-only operator reached binary_mnemonic"),
    }
}

fn condition_suffix(op: scribble_ast::Operator) -> Option<&'static str> {
    use scribble_ast::Operator::*;
    match op {
        Eq => Some("eq"),
        Ne => Some("ne"),
        Lt => Some("lt"),
        Le => Some("le"),
        Gt => Some("gt"),
        Ge => Some("ge"),
        _ => None,
    }
}

/// Emits one IR function as an [`ArmFunction`], named after `entry_symbol`
/// (the interned function name, optionally underscore-prefixed on
/// Darwin). `assembly` receives any string literals this function's body
/// references.
pub fn emit_function(func: &IrFunction, assembly: &mut Assembly, types: &TypeRegistry, interner: &Interner) -> ArmFunction {
    let name = interner.resolve(func.name).to_string();
    log::debug!("emitting function '{name}' ({} ops)", func.ops.len());
    let mut arm = ArmFunction::new(name.clone(), FunctionKind::Scribble);
    arm.is_main = func.is_entry_point;

    let frame = FrameLayout::new(func.locals.len());
    let mut regs = RegisterBank::new();
    let epilogue_label = format!("L{}_epilogue", assembly.next_label());

    arm.code.select_code();
    arm.code.add_label(entry_symbol(&name, assembly.target));
    arm.code.add_line(format!("stp x29, x30, [sp, #-{}]!", frame.frame_size() + 16));
    arm.code.add_line("mov x29, sp");

    for (i, _) in func.parameter_types.iter().enumerate().take(ARG_REGS.len()) {
        let offset = frame.offset(i as u32);
        arm.code.add_line(format!("str x{}, [x29, #-{offset:#x}]", ARG_REGS[i]));
    }

    for op in &func.ops {
        emit_op(op, &mut arm, assembly, &frame, &mut regs, types, interner, &epilogue_label);
    }

    arm.code.add_label(&epilogue_label);
    arm.code.add_line(format!("add sp, sp, #{}", frame.frame_size() + 16));
    arm.code.add_line("ldp x29, x30, [sp], #16");
    arm.code.add_line("ret");
    arm
}

fn entry_symbol(name: &str, target: crate::target::Target) -> String {
    match target {
        crate::target::Target::Darwin => format!("_{name}"),
        crate::target::Target::Linux => name.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_op(
    op: &Op,
    arm: &mut ArmFunction,
    assembly: &mut Assembly,
    frame: &FrameLayout,
    regs: &mut RegisterBank,
    types: &TypeRegistry,
    interner: &Interner,
    epilogue_label: &str,
) {
    match op {
        Op::LoadImmediate { dest, value } => {
            let reg = operand(dest, regs, types);
            arm.code.add_line(format!("mov {reg}, #{value}"));
        }
        Op::LoadFloat { dest, value } => {
            let reg = operand(dest, regs, types);
            arm.code.add_line(format!("fmov {reg}, #{value}"));
        }
        Op::LoadString { dest, value } => {
            let id = assembly.add_string(value);
            let label = assembly.string_label(id);
            let reg = operand(dest, regs, types);
            arm.code.add_line(format!("adrp {reg}, {label}"));
            arm.code.add_line(format!("add {reg}, {reg}, :lo12:{label}"));
        }
        Op::LoadLocal { dest, slot } => {
            let offset = frame.offset(*slot);
            let ops = size_ops(types.size_of(dest.ty), true);
            let reg = operand(dest, regs, types);
            arm.code.add_line(format!("{} {reg}, [x29, #-{offset:#x}]", ops.load));
        }
        Op::StoreLocal { slot, src } => {
            let offset = frame.offset(*slot);
            let reg = operand(src, regs, types);
            let ops = size_ops(types.size_of(src.ty), true);
            arm.code.add_line(format!("{} {reg}, [x29, #-{offset:#x}]", ops.store));
        }
        Op::BinaryOp { op, dest, lhs, rhs } => {
            let l = operand(lhs, regs, types);
            let r = operand(rhs, regs, types);
            let d = operand(dest, regs, types);
            if let Some(suffix) = condition_suffix(*op) {
                arm.code.add_line(format!("cmp {l}, {r}"));
                arm.code.add_line(format!("cset {d}, {suffix}"));
            } else if matches!(op, scribble_ast::Operator::Mod) {
                arm.code.add_line(format!("sdiv {d}, {l}, {r}"));
                arm.code.add_line(format!("msub {d}, {d}, {r}, {l}"));
            } else {
                arm.code.add_line(format!("{} {d}, {l}, {r}", binary_mnemonic(*op)));
            }
        }
        Op::UnaryOp { op, dest, operand: src } => {
            let s = operand(src, regs, types);
            let d = operand(dest, regs, types);
            match op {
                scribble_ast::Operator::Neg => arm.code.add_line(format!("neg {d}, {s}")),
                scribble_ast::Operator::Not => arm.code.add_line(format!("eor {d}, {s}, #1")),
                other => unreachable!("{other:?} is not a unary operator"),
            }
        }
        Op::Call { dest, function, args } => {
            for (i, arg) in args.iter().enumerate().take(ARG_REGS.len()) {
                let src = operand(arg, regs, types);
                arm.code.add_line(format!("mov x{}, {src}", ARG_REGS[i]));
            }
            arm.code.add_line(format!("bl {function}", function = function_symbol(function, interner, assembly.target)));
            if let Some(dest) = dest {
                let d = operand(dest, regs, types);
                arm.code.add_line(format!("mov {d}, x0"));
            }
        }
        Op::Label(id) => {
            arm.code.add_label(format!("L{id}"));
        }
        Op::Jump(id) => {
            arm.code.add_line(format!("b L{id}"));
        }
        Op::JumpIfFalse { cond, label } => {
            let c = operand(cond, regs, types);
            arm.code.add_line(format!("cmp {c}, #0"));
            arm.code.add_line(format!("b.eq L{label}"));
        }
        Op::Return { value } => {
            if let Some(value) = value {
                let src = operand(value, regs, types);
                arm.code.add_line(format!("mov x0, {src}"));
            }
            arm.code.add_line(format!("b {epilogue_label}"));
        }
    }
}

/// Resolves a call target's `scribble_base::Symbol` back to its name and
/// applies the same `entry_symbol` naming every function is *defined*
/// under (`main`, `_main` on Darwin, or a runtime-helper name like
/// `__range_begin`) — a `bl` target that didn't match would reference no
/// emitted label and no external runtime symbol, producing unlinkable
/// assembly.
fn function_symbol(function: &scribble_base::Symbol, interner: &Interner, target: crate::target::Target) -> String {
    entry_symbol(interner.resolve(*function), target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::Assembly;
    use crate::target::Target;
    use scribble_ast::{bind_program, Literal, SyntaxArena, SyntaxKind, TypeRegistry, INT_ID};
    use scribble_base::{IdAllocator, Interner, Location};
    use scribble_ir::lower_program;

    fn loc() -> Location {
        Location::start_of("test.scribble")
    }

    #[test]
    fn return_zero_emits_mov_and_ret() {
        let mut syntax = SyntaxArena::new();
        let mut interner = Interner::new();
        let int_name = interner.intern("int");
        let main_name = interner.intern("main");
        let type_ref = syntax.push(SyntaxKind::TypeRef { name: int_name, array: false }, loc(), None);
        let zero = syntax.push(SyntaxKind::Lit(Literal::Integer(0)), loc(), None);
        let ret = syntax.push(SyntaxKind::Return { expr: Some(zero) }, loc(), None);
        let block = syntax.push(SyntaxKind::Block { statements: vec![ret] }, loc(), None);
        let func = syntax.push(
            SyntaxKind::Function { name: main_name, parameters: vec![], return_type: type_ref, implementation: Some(block) },
            loc(),
            None,
        );
        let module_name = interner.intern("main_module");
        let module = syntax.push(SyntaxKind::Module { name: module_name, imports: vec![], types: vec![], functions: vec![func] }, loc(), None);
        let root = syntax.push(SyntaxKind::Program { modules: vec![module] }, loc(), None);

        let mut types = TypeRegistry::new(&mut interner);
        let (bound, bound_root) = bind_program(&syntax, root, &mut types, &interner).expect("binds cleanly");
        let program = lower_program(&bound, bound_root, Some("main"), &mut interner);
        let ir_fn = &program.modules[0].functions[0];

        let mut assembly = Assembly::new("main_module", Target::Linux, IdAllocator::starting_at(5000));
        let arm_fn = emit_function(ir_fn, &mut assembly, &types, &interner);
        let text = arm_fn.code.to_string();
        assert!(text.contains("mov w0, #0") || text.contains("mov x0, w"));
        assert!(text.contains("ret"));
        assert!(arm_fn.is_main);
    }

    #[test]
    fn call_targets_the_callees_entry_symbol_not_a_numeric_index() {
        use scribble_ir::{Function as IrFunction, Op, ValueLocation, ValueLocationKind};

        let mut interner = Interner::new();
        let types = TypeRegistry::new(&mut interner);
        let callee_name = interner.intern("__range_begin");
        let caller_name = interner.intern("caller");

        let mut func = IrFunction::new(caller_name, vec![], INT_ID);
        let dest = ValueLocation::new(ValueLocationKind::Register(scribble_ir::Register::Virtual(0)), INT_ID);
        func.ops.push(Op::Call { dest: Some(dest), function: callee_name, args: vec![] });
        func.ops.push(Op::Return { value: None });

        let mut assembly = Assembly::new("main_module", Target::Linux, IdAllocator::starting_at(5000));
        let arm_fn = emit_function(&func, &mut assembly, &types, &interner);
        let text = arm_fn.code.to_string();
        assert!(text.contains("bl __range_begin"), "expected a call to the callee's own name, got:\n{text}");
        assert!(!text.contains("fn_"), "must not emit a numeric fn_<index> call target, got:\n{text}");
    }

    #[test]
    fn call_target_gets_darwin_leading_underscore_like_entry_symbol() {
        use scribble_ir::{Function as IrFunction, Op, ValueLocation, ValueLocationKind};

        let mut interner = Interner::new();
        let types = TypeRegistry::new(&mut interner);
        let callee_name = interner.intern("helper");
        let caller_name = interner.intern("caller");

        let mut func = IrFunction::new(caller_name, vec![], INT_ID);
        let dest = ValueLocation::new(ValueLocationKind::Register(scribble_ir::Register::Virtual(0)), INT_ID);
        func.ops.push(Op::Call { dest: Some(dest), function: callee_name, args: vec![] });
        func.ops.push(Op::Return { value: None });

        let mut assembly = Assembly::new("main_module", Target::Darwin, IdAllocator::starting_at(5000));
        let arm_fn = emit_function(&func, &mut assembly, &types, &interner);
        let text = arm_fn.code.to_string();
        assert!(text.contains("bl _helper"), "expected Darwin's leading underscore on the call target, got:\n{text}");
    }

    #[test]
    fn frame_offset_grows_by_eight_bytes_per_slot() {
        let frame = FrameLayout::new(3);
        assert_eq!(frame.offset(0), 8);
        assert_eq!(frame.offset(1), 16);
        assert_eq!(frame.offset(2), 24);
    }

    #[test]
    fn frame_size_is_sixteen_byte_aligned() {
        assert_eq!(FrameLayout::new(1).frame_size(), 16);
        assert_eq!(FrameLayout::new(3).frame_size(), 32);
    }
}
