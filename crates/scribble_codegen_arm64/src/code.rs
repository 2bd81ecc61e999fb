//! The append-only text buffer an [`crate::assembly::Assembly`]'s code and
//! data sections are built from.
//!
//! Grounded on `spec.md` §3's "Assembly model" paragraph: "a `Code`
//! builder is a triple of (prologue, body, epilogue) append-only text
//! buffers plus a selector indicating which buffer append operations
//! target; concatenation at serialisation yields prologue || body ||
//! epilogue."

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSelector {
    Prologue,
    Body,
    Epilogue,
}

#[derive(Debug, Clone, Default)]
pub struct Code {
    prologue: String,
    body: String,
    epilogue: String,
    selector: Option<CodeSelector>,
}

impl Code {
    pub fn new() -> Self {
        Code::default()
    }

    pub fn select_prologue(&mut self) {
        self.selector = Some(CodeSelector::Prologue);
    }

    pub fn select_code(&mut self) {
        self.selector = Some(CodeSelector::Body);
    }

    pub fn select_epilogue(&mut self) {
        self.selector = Some(CodeSelector::Epilogue);
    }

    fn target(&mut self) -> &mut String {
        match self.selector.unwrap_or(CodeSelector::Body) {
            CodeSelector::Prologue => &mut self.prologue,
            CodeSelector::Body => &mut self.body,
            CodeSelector::Epilogue => &mut self.epilogue,
        }
    }

    /// Appends a raw line, e.g. an already-formatted instruction or
    /// label, with a trailing newline.
    pub fn add_line(&mut self, line: impl AsRef<str>) {
        let target = self.target();
        target.push_str(line.as_ref());
        target.push('\n');
    }

    /// Appends `<name>:` as a label definition.
    pub fn add_label(&mut self, name: impl AsRef<str>) {
        self.add_line(format!("{}:", name.as_ref()));
    }

    /// Appends a directive with an optional operand, e.g.
    /// `.align 2` or `.section __TEXT,__text`.
    pub fn add_directive(&mut self, directive: &str, operand: Option<&str>) {
        match operand {
            Some(op) if !op.is_empty() => self.add_line(format!("{directive} {op}")),
            _ => self.add_line(directive.to_string()),
        }
    }

    /// Appends a `.import` marker — scribble's assembly text has no real
    /// `.import` AArch64 directive, but the original's "required imports"
    /// concept (a symbol referenced but not defined in this unit) is
    /// recorded the same way a `.extern`/`.global` forward-reference would
    /// be, immediately after the section prologue.
    pub fn add_import(&mut self, symbol: &str) {
        self.add_directive(".extern", Some(symbol));
    }

    /// Appends another `Code`'s fully concatenated text (prologue || body
    /// || epilogue) to this one's currently selected buffer — used to
    /// splice a function's own `Code` into the assembly-wide body, and to
    /// append the data section after the text section at serialisation.
    pub fn append_code(&mut self, other: &Code) {
        let text = other.to_string();
        if !text.is_empty() {
            self.target().push_str(&text);
        }
    }

    pub fn has_text(&self) -> bool {
        !self.prologue.is_empty() || !self.body.is_empty() || !self.epilogue.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_text()
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.prologue, self.body, self.epilogue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_concatenate_in_prologue_body_epilogue_order() {
        let mut code = Code::new();
        code.select_epilogue();
        code.add_line("epilogue");
        code.select_prologue();
        code.add_line("prologue");
        code.select_code();
        code.add_line("body");
        assert_eq!(code.to_string(), "prologue\nbody\nepilogue\n");
    }

    #[test]
    fn default_selector_targets_body() {
        let mut code = Code::new();
        code.add_line("bare");
        assert_eq!(code.to_string(), "bare\n");
    }

    #[test]
    fn directive_without_operand_omits_trailing_space() {
        let mut code = Code::new();
        code.add_directive(".text", None);
        assert_eq!(code.to_string(), ".text\n");
    }

    #[test]
    fn empty_code_has_no_text() {
        assert!(Code::new().is_empty());
        let mut code = Code::new();
        code.add_line("x");
        assert!(code.has_text());
    }

    #[test]
    fn append_code_splices_full_triple() {
        let mut inner = Code::new();
        inner.select_prologue();
        inner.add_line("inner_pro");
        inner.select_code();
        inner.add_line("inner_body");

        let mut outer = Code::new();
        outer.select_code();
        outer.add_line("outer_body");
        outer.append_code(&inner);
        assert_eq!(outer.to_string(), "outer_body\ninner_pro\ninner_body\n");
    }
}
