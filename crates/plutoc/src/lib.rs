#![doc = include_str!("../../../README.md")]

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod diagnostics;
pub mod fold;
pub mod infer;
pub mod ir;
pub mod names;
pub mod prelude;
pub mod scope;
pub mod span;
pub mod typed_ast;
pub mod types;

pub use diagnostics::{render, Diagnostic};
pub use ir::Term;

/// Configuration for a single [`compile`] run: no global mutable state,
/// every knob threaded explicitly through the call.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// The top-level function whose parameter list becomes the compiled
    /// program's own, plus the synthetic trailing argument. This is also
    /// the one function definition `validator_rejects_defaults`-style
    /// checking applies to.
    pub entry_point: String,
    /// Whether to run the constant-folding pass between inference and
    /// code generation. Disabling this is useful for inspecting unfolded
    /// IR while debugging the compiler itself — every real build wants
    /// folding on.
    pub fold_constants: bool,
    /// Whether the constant folder emits a `tracing::debug!` event for
    /// every subtree it declines to fold.
    pub log_fold_skips: bool,
}

impl CompileOptions {
    #[must_use]
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self { entry_point: entry_point.into(), fold_constants: true, log_fold_skips: false }
    }
}

/// Every stage of the pipeline that can fail, composed into the one error
/// type [`compile`] returns. The front end is the sole stage whose raw
/// error isn't already a [`Diagnostic`]; inference and code generation
/// both produce one directly at their own pass boundary.
#[derive(Debug, Clone)]
pub enum CompileError {
    FrontEnd(ast::front::FrontEndError),
    Diagnostic(Diagnostic),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FrontEnd(e) => write!(f, "{e}"),
            Self::Diagnostic(d) => write!(f, "{d}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<Diagnostic> for CompileError {
    fn from(d: Diagnostic) -> Self {
        Self::Diagnostic(d)
    }
}

impl CompileError {
    /// Renders this error as a one-shot human-readable report with source
    /// context, mirroring the original project's rendering of a compiler
    /// error to a terminal.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        match self {
            Self::FrontEnd(e) => {
                let diag = Diagnostic { pass: diagnostics::Pass::FrontEnd, span: e.span(), node_desc: "a module", message: e.to_string() };
                render(&diag, source)
            }
            Self::Diagnostic(d) => render(d, source),
        }
    }
}

/// Runs the whole pipeline — parse, infer, (optionally) fold, generate —
/// over `source` and returns the closed IR term a validator compiles to.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Term, CompileError> {
    let untyped = ast::front::lower_module(source).map_err(CompileError::FrontEnd)?;
    let (typed, _scope) = infer::infer_module(&untyped, &options.entry_point)?;
    let typed = if options.fold_constants {
        fold::ConstantFolder::new().with_skip_logging(options.log_fold_skips).fold_module(typed)
    } else {
        typed
    };
    let term = codegen::compile_module(&typed, &options.entry_point)?;
    Ok(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_trivial_validator_end_to_end() {
        let source = "def validator(x: int) -> int:\n    return x\n";
        let term = compile(source, &CompileOptions::new("validator")).unwrap();
        assert!(matches!(term, Term::Lambda(..)));
    }

    #[test]
    fn an_unsupported_construct_renders_with_source_context() {
        let source = "while True:\n    pass\n";
        let err = compile(source, &CompileOptions::new("validator")).unwrap_err();
        let rendered = err.render(source);
        assert!(rendered.contains("Front end"));
        assert!(rendered.contains("while True:"));
    }
}
