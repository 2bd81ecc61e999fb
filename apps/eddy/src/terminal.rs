//! The trait-based stand-in for the editor's actual widget tree. The
//! widget tree, input handling, palette, and rendering are Non-goals
//! (spec.md §1) — this trait is the seam a real terminal UI would plug
//! into, narrowed here to the handful of calls this entry point needs to
//! make to report diagnostics and status.

/// What a real `eddy` UI would do with status and diagnostic text.
/// [`StdoutTerminal`] is the only implementation this crate ships; a full
/// widget-tree renderer is out of scope.
pub trait Terminal {
    fn status(&mut self, text: &str);
    fn diagnostic(&mut self, text: &str);
}

/// Writes status lines to stdout and diagnostics to stderr, with no
/// cursor control or screen management of any kind.
pub struct StdoutTerminal;

impl Terminal for StdoutTerminal {
    fn status(&mut self, text: &str) {
        println!("{text}");
    }

    fn diagnostic(&mut self, text: &str) {
        eprintln!("{text}");
    }
}
