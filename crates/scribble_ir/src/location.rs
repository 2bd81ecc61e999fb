//! The value-location model shared between IR lowering and code
//! generation: every operand and every operation's destination names
//! *where* a value lives, not just what it is, so codegen never has to
//! rediscover storage — it only has to render each location's textual
//! form for the target assembler.
//!
//! Grounded on `spec.md` §3's "Value location" paragraph: the eight-way
//! tagged union (`Pointer`/`Register`/`RegisterRange`/`Label`/`Data`/
//! `Immediate`/`Float`/`Stack`/`Discard`), each carrying a type id and a
//! "don't release" flag.

use std::fmt;

use scribble_ast::TypeId;

/// A register name. Unlike the original's raw string, virtual registers
/// (not yet assigned to a physical one) and the two frame-relative
/// registers get their own constructors instead of magic strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Not yet allocated to a physical register; codegen's allocator
    /// assigns these before emission.
    Virtual(u32),
    /// A concrete physical register, e.g. `"x0"`, `"w3"`.
    Physical(&'static str),
    FramePointer,
    StackPointer,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Virtual(n) => write!(f, "%{n}"),
            Register::Physical(name) => write!(f, "{name}"),
            Register::FramePointer => write!(f, "fp"),
            Register::StackPointer => write!(f, "sp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueLocationKind {
    /// A memory location addressed as `base + offset`.
    Pointer { base: Register, offset: i64 },
    /// A value held in a single register.
    Register(Register),
    /// A value spanning a contiguous run of registers (e.g. a 128-bit
    /// return value split across two 64-bit registers).
    RegisterRange { start: Register, end: Register },
    /// A reference to a code label, optionally offset (e.g. into a jump
    /// table).
    Label { symbol: String, offset: i64 },
    /// A reference to a data-section symbol, optionally offset.
    Data { symbol: String, offset: i64 },
    /// A compile-time-known integer constant.
    Immediate(i64),
    /// A compile-time-known floating-point constant.
    Float(f64),
    /// The value lives on top of the evaluation stack (pushed, not yet
    /// assigned a register or frame slot).
    Stack,
    /// The value is computed but never consumed; codegen may elide
    /// materialising it entirely.
    Discard,
}

/// A fully-typed operand or destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLocation {
    pub kind: ValueLocationKind,
    pub ty: TypeId,
    /// Prevents the register/slot allocator from reclaiming this
    /// location even once its last use has passed (e.g. a value that
    /// must survive to a later IPC handshake step).
    pub pinned: bool,
}

impl ValueLocation {
    pub fn new(kind: ValueLocationKind, ty: TypeId) -> Self {
        ValueLocation { kind, ty, pinned: false }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn discard(ty: TypeId) -> Self {
        ValueLocation::new(ValueLocationKind::Discard, ty)
    }
}

impl fmt::Display for ValueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueLocationKind::Pointer { base, offset } => {
                if *offset >= 0 {
                    write!(f, "[{base}, #0x{offset:x}]")
                } else {
                    write!(f, "[{base}, #-0x{:x}]", -offset)
                }
            }
            ValueLocationKind::Register(reg) => write!(f, "{reg}"),
            ValueLocationKind::RegisterRange { start, end } => write!(f, "{start}..{end}"),
            ValueLocationKind::Label { symbol, offset } if *offset != 0 => write!(f, "{symbol}+0x{offset:x}"),
            ValueLocationKind::Label { symbol, .. } => write!(f, "{symbol}"),
            ValueLocationKind::Data { symbol, offset } if *offset != 0 => write!(f, "{symbol}+0x{offset:x}"),
            ValueLocationKind::Data { symbol, .. } => write!(f, "{symbol}"),
            ValueLocationKind::Immediate(n) if *n < 0 => write!(f, "#-0x{:x}", -n),
            ValueLocationKind::Immediate(n) => write!(f, "#0x{n:x}"),
            ValueLocationKind::Float(n) => write!(f, "#{n}"),
            ValueLocationKind::Stack => write!(f, "<stack>"),
            ValueLocationKind::Discard => write!(f, "<discard>"),
        }
    }
}
