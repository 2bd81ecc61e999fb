//! Error types with source location tracking.
//!
//! All errors in the scribble pipeline carry a [`Span`] indicating where in
//! the source text the problem occurred. [`CompileError`] is the umbrella
//! taxonomy a stage boundary reports to its caller; individual stages are
//! free to work with more specific types (e.g. [`BindError`]) internally and
//! convert to [`CompileError`] only when they cross that boundary.

use crate::span::Span;
use std::fmt;

/// An error annotated with its source location.
///
/// Implements [`std::error::Error`] and [`fmt::Display`]. The display format
/// is `{message} at {start}..{end}`.
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub message: String,
    pub span: Span,
}

impl SpannedError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for SpannedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for SpannedError {}

/// Alias for `std::result::Result<T, SpannedError>`.
pub type Result<T> = std::result::Result<T, SpannedError>;

/// A single secondary observation attached to a [`BindError`] — "note: `x`
/// was declared here" style follow-ups. Modelled as a `Vec` rather than the
/// original hand-rolled intrusive linked list: Rust's `Vec` already gives us
/// ownership, iteration, and drop for free.
#[derive(Debug, Clone)]
pub struct BindNote {
    pub span: Span,
    pub message: String,
}

/// A binder-stage error: type mismatch, undefined identifier, or arity
/// mismatch, with zero or more secondary notes.
#[derive(Debug, Clone)]
pub struct BindError {
    pub span: Span,
    pub message: String,
    pub notes: Vec<BindNote>,
}

impl BindError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, message: impl Into<String>, span: Span) -> Self {
        self.notes.push(BindNote {
            span,
            message: message.into(),
        });
        self
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)?;
        for note in &self.notes {
            write!(f, "\n  note: {} at {}..{}", note.message, note.span.start, note.span.end)?;
        }
        Ok(())
    }
}

impl std::error::Error for BindError {}

/// The umbrella error taxonomy reported across a stage boundary.
///
/// A stage collects everything it can before failing (the binder, for
/// instance, accumulates every [`BindError`] it finds rather than stopping
/// at the first one); `CompileError::Bind` therefore carries a `Vec`.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// Raised only by `expect`-style lexer calls; scanning itself never fails.
    Lexer(SpannedError),
    /// Unexpected token, unclosed construct, unknown reference.
    Parser(SpannedError),
    /// One or more binder failures collected over a whole compilation unit.
    Bind(Vec<BindError>),
    /// Template syntax, missing variable, or type mismatch in a macro call.
    Template(SpannedError),
    /// A child process (assembler, linker, executed program) misbehaved.
    Process(String),
    /// A filesystem operation failed.
    Io(String),
    /// Malformed JSON at a given byte offset.
    Json { offset: usize, message: String },
    /// An IPC framing violation (malformed request/response line, bad
    /// `Content-Length`, socket closed mid-message).
    Http(String),
    /// A trap surfaced while interpreting or executing IR.
    Runtime(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lexer(e) => write!(f, "lexer error: {e}"),
            CompileError::Parser(e) => write!(f, "parse error: {e}"),
            CompileError::Bind(errs) => {
                write!(f, "{} binding error(s)", errs.len())?;
                for e in errs {
                    write!(f, "\n  {e}")?;
                }
                Ok(())
            }
            CompileError::Template(e) => write!(f, "template error: {e}"),
            CompileError::Process(msg) => write!(f, "process error: {msg}"),
            CompileError::Io(msg) => write!(f, "I/O error: {msg}"),
            CompileError::Json { offset, message } => {
                write!(f, "JSON error at offset {offset}: {message}")
            }
            CompileError::Http(msg) => write!(f, "IPC error: {msg}"),
            CompileError::Runtime(msg) => write!(f, "runtime error: {msg}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<SpannedError> for CompileError {
    fn from(e: SpannedError) -> Self {
        CompileError::Lexer(e)
    }
}

impl From<BindError> for CompileError {
    fn from(e: BindError) -> Self {
        CompileError::Bind(vec![e])
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e.to_string())
    }
}

/// Terminates the process after logging an unrecoverable invariant
/// violation: a `must`-optional that came up empty, an allocator failure, a
/// reached-unreachable. Mirrors the original `fatal(...)` macro — this is
/// the one place in the pipeline that does not propagate a `Result`.
pub fn fatal(message: impl fmt::Display) -> ! {
    eprintln!("ERROR: fatal: {message}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanned_error_display() {
        let err = SpannedError::new("test error", Span::new(5, 10));
        let display = format!("{}", err);
        assert!(display.contains("test error"));
        assert!(display.contains("5..10"));
    }

    #[test]
    fn bind_error_accumulates_notes() {
        let err = BindError::new("undefined identifier `x`", Span::new(0, 1))
            .with_note("did you mean `y`?", Span::new(10, 11));
        assert_eq!(err.notes.len(), 1);
        let display = format!("{}", err);
        assert!(display.contains("undefined identifier"));
        assert!(display.contains("did you mean"));
    }

    #[test]
    fn compile_error_bind_variant_counts_all_errors() {
        let errs = vec![
            BindError::new("a", Span::new(0, 1)),
            BindError::new("b", Span::new(2, 3)),
        ];
        let compile_err = CompileError::Bind(errs);
        assert!(format!("{compile_err}").contains("2 binding error(s)"));
    }

    #[test]
    fn from_spanned_error_wraps_as_lexer_variant() {
        let e: CompileError = SpannedError::new("bad token", Span::new(0, 1)).into();
        assert!(matches!(e, CompileError::Lexer(_)));
    }
}
