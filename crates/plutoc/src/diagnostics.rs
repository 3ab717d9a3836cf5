//! The one structured diagnostic type every pass surfaces on fatal failure.
//!
//! Rust-idiomatic rendering of `eopsin/util.py`'s `CompilerError` /
//! `CompilingNodeTransformer.visit`: a raised cause is wrapped with the
//! offending node's span and the pass name *exactly once*. In Python that
//! discipline is enforced at runtime with an `isinstance` check in a
//! `try`/`except` around every `visit()` call; here it falls out of the type
//! system instead — each pass's raw error enum carries a `Nested` variant
//! that already holds a finished `Diagnostic`, and `wrap` recognizes it and
//! returns it unchanged rather than wrapping again.

use std::fmt;

use crate::span::{LineIndex, Span};

/// Name of the compilation step a diagnostic originated in.
///
/// `NodeVisiting` and `NodeTransformation` match the two sweep kinds the
/// inference pass performs per scope; `ConstantFolding` and
/// `CodeGeneration` name the other two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Pass {
    #[strum(serialize = "Front end")]
    FrontEnd,
    #[strum(serialize = "Node visiting")]
    NodeVisiting,
    #[strum(serialize = "Node transformation")]
    NodeTransformation,
    #[strum(serialize = "Constant folding")]
    ConstantFolding,
    #[strum(serialize = "Code generation")]
    CodeGeneration,
}

/// A fatal compiler error: the original cause, the node it occurred at, and
/// the pass that raised it. Never re-wrapped once constructed (see module docs).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub pass: Pass,
    pub span: Span,
    pub node_desc: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} at {}: {}", self.pass, self.node_desc, self.span.start, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Implemented by each pass's raw (not-yet-wrapped) error enum so that a
/// diagnostic produced by a recursive child call can be threaded through
/// without being rewrapped.
pub trait Nestable: fmt::Display {
    /// Returns the already-finished diagnostic this cause carries, if any.
    fn nested(self) -> Result<Diagnostic, Self>
    where
        Self: Sized;
}

/// Wraps a raw pass error into a `Diagnostic`, attaching `pass`/`span`/`node_desc`
/// — unless `cause` already carries a finished diagnostic, in which case it is
/// returned unchanged (the "no double wrap" rule).
pub fn wrap<E: Nestable>(pass: Pass, span: Span, node_desc: &'static str, cause: E) -> Diagnostic {
    match cause.nested() {
        Ok(already) => already,
        Err(cause) => Diagnostic {
            pass,
            span,
            node_desc,
            message: cause.to_string(),
        },
    }
}

/// Renders a diagnostic as a one-shot, human-readable report with source
/// context — a pointer line under the offending source line,
/// in the manner of a one-shot rustc-style caret diagnostic. `diag.span`
/// being synthetic (no real source position, e.g. a codegen-internal
/// wrapping) falls back to the bare `Display` line with no source excerpt.
#[must_use]
pub fn render(diag: &Diagnostic, source: &str) -> String {
    if diag.span == Span::synthetic() {
        return diag.to_string();
    }
    let lines = LineIndex::new(source);
    let line_text = lines.line_text(source, diag.span.start);
    let caret_col = diag.span.start.column.saturating_sub(1) as usize;
    let caret = format!("{}^", " ".repeat(caret_col));
    format!(
        "{pass} of {node} at {loc}: {message}\n  {line}\n  {caret}",
        pass = diag.pass,
        node = diag.node_desc,
        loc = diag.span.start,
        message = diag.message,
        line = line_text,
        caret = caret,
    )
}
