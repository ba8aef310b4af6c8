/// Position in the assembler source, as handed over by the parser
///
/// The back end never looks inside a position - it only threads it through to diagnostics so the
/// front end can map it back to a line and column.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Position(pub u32);

impl Position {
    /// Position for things that weren't written in the source (eg. synthesized entries)
    pub const UNKNOWN: Position = Position(0);
}

/// Non-fatal diagnostic
///
/// Message text is looked up by `id` in a catalog which lives outside of this crate, with `args`
/// filling the positional placeholders.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub position: Position,
    pub id: &'static str,
    pub args: Vec<String>,
}

/// Sink for warnings produced while assembling a class
pub trait Reporter {
    fn warning(&mut self, diagnostic: Diagnostic);
}

/// Reporter which accumulates warnings until the class is done
#[derive(Default, Debug)]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics { warnings: vec![] }
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Flush accumulated warnings to the log
    pub fn report(&mut self, file: &str) {
        for Diagnostic { position, id, args } in self.warnings.drain(..) {
            log::warn!("{}@{}: {} {:?}", file, position.0, id, args);
        }
    }
}

impl Reporter for Diagnostics {
    fn warning(&mut self, diagnostic: Diagnostic) {
        log::debug!("Warning {} {:?}", diagnostic.id, diagnostic.args);
        self.warnings.push(diagnostic);
    }
}

/// Reporter which drops all warnings
pub struct IgnoreWarnings;

impl Reporter for IgnoreWarnings {
    fn warning(&mut self, _diagnostic: Diagnostic) {}
}
