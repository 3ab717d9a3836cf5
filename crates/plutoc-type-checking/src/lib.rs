//! A pre-flight type-checking front for `plutoc`, split into its own crate
//! so a caller can type-check a script without pulling in code generation.
//!
//! This crate has no external checker to wrap: inference *is* the type
//! checker, and it already lives in `plutoc::infer`. What this crate
//! contributes is the thin, stable surface a caller (the CLI, an editor
//! integration, a test harness) wants: a named source file, an optional
//! type-stub file, and a yes/no-plus-diagnostic answer, without pulling in
//! code generation or the VM's own `Term` type at all.

use plutoc::{ast::front, diagnostics, infer};

/// A named chunk of source text: file content plus the path used in
/// rendered diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    code: &'a str,
    path: &'a str,
}

impl<'a> SourceFile<'a> {
    #[must_use]
    pub fn new(code: &'a str, path: &'a str) -> Self {
        Self { code, path }
    }

    #[must_use]
    pub fn code(&self) -> &'a str {
        self.code
    }

    #[must_use]
    pub fn path(&self) -> &'a str {
        self.path
    }
}

/// The one fatal-error kind this crate's own front-end step can raise; a
/// type error from inference itself is reported as `Ok(Some(report))`, not
/// an `Err`, since "the program does not type-check" is the expected,
/// successful outcome of a check, not a failure of the checker.
#[derive(Debug, Clone)]
pub enum TypeCheckError {
    FrontEnd { file: String, message: String },
}

impl std::fmt::Display for TypeCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FrontEnd { file, message } => write!(f, "{file}: {message}"),
        }
    }
}

impl std::error::Error for TypeCheckError {}

/// A rendered type-error report: one or more diagnostics already formatted
/// with source context, ready to print to a terminal. Kept as an opaque
/// `Display`-only value rather than exposing `plutoc::Diagnostic` directly,
/// so this crate's one public failure shape stays independent of inference's
/// internal error representation.
#[derive(Debug, Clone)]
pub struct TypeCheckReport(String);

impl std::fmt::Display for TypeCheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The name inference applies the validator's no-default-arguments rule to
/// when neither caller has an opinion — see [`type_check_as`]. Scripts with
/// no function of this name are unaffected by the rule; it simply never
/// triggers.
pub const DEFAULT_ENTRY_POINT: &str = "validator";

/// Type-checks `file` against the built-in catalog and domain prelude,
/// optionally pre-loading `stubs`' top-level class/function declarations
/// into scope first, as a plain top-level import would.
///
/// Returns `Ok(None)` if `file` type-checks cleanly, `Ok(Some(report))`
/// with a rendered diagnostic if it does not, and `Err` only for a
/// front-end (parse-shape) failure.
///
/// # Errors
///
/// Returns [`TypeCheckError::FrontEnd`] if `file` or `stubs` contains a
/// construct outside the compiler's supported subset, or fails to parse.
pub fn type_check(file: &SourceFile<'_>, stubs: Option<&SourceFile<'_>>) -> Result<Option<TypeCheckReport>, TypeCheckError> {
    type_check_as(file, stubs, DEFAULT_ENTRY_POINT)
}

/// Same as [`type_check`], but applies the validator's no-default-arguments
/// rule to the function named `entry_point` instead of the default
/// `"validator"`. Useful for checking a script whose entry point is named
/// differently, or for checking a module with no entry point at all (pass
/// a name that never appears — the rule then simply never applies).
///
/// # Errors
///
/// Returns [`TypeCheckError::FrontEnd`] if `file` or `stubs` contains a
/// construct outside the compiler's supported subset, or fails to parse.
pub fn type_check_as(
    file: &SourceFile<'_>,
    stubs: Option<&SourceFile<'_>>,
    entry_point: &str,
) -> Result<Option<TypeCheckReport>, TypeCheckError> {
    let module = front::lower_module(file.code).map_err(|e| TypeCheckError::FrontEnd { file: file.path.to_owned(), message: e.to_string() })?;
    let stub_module = stubs
        .map(|s| front::lower_module(s.code).map_err(|e| TypeCheckError::FrontEnd { file: s.path.to_owned(), message: e.to_string() }))
        .transpose()?;

    match infer::infer_module_with_prelude_stub(stub_module.as_ref(), &module, entry_point) {
        Ok(_) => Ok(None),
        Err(diag) => Ok(Some(TypeCheckReport(diagnostics::render(&diag, file.code)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_checking_success() {
        let code = "def add(x: int, y: int) -> int:\n    return x + y\n\nresult = add(1, 2)\n";
        let result = type_check(&SourceFile::new(code, "main.py"), None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn type_checking_error_reports_the_mismatched_call_argument() {
        let code = "def add(x: int, y: int) -> int:\n    return x + y\n\nresult = add(1, b'2')\n";
        let result = type_check(&SourceFile::new(code, "main.py"), None).unwrap();
        assert!(result.is_some());
        let report = result.unwrap().to_string();
        assert!(report.contains("main.py") || report.contains("Node visiting") || report.contains("Node transformation"));
    }

    #[test]
    fn type_checking_with_stubs_resolves_the_stub_class() {
        let stubs = "class Pair:\n    a: int\n    b: int\n";
        let code = "def validator(p: Pair) -> int:\n    return p.a\n";
        let result = type_check(&SourceFile::new(code, "main.py"), Some(&SourceFile::new(stubs, "stub.py"))).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn validator_entry_point_rejects_default_arguments() {
        let code = "def validator(x: int = 1) -> int:\n    return x\n";
        let result = type_check(&SourceFile::new(code, "main.py"), None).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn a_non_entry_point_function_may_declare_defaults() {
        let code = "def helper(x: int = 1) -> int:\n    return x\n";
        let result = type_check(&SourceFile::new(code, "main.py"), None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn an_unsupported_construct_surfaces_as_a_front_end_error() {
        let code = "while True:\n    pass\n";
        let err = type_check(&SourceFile::new(code, "main.py"), None).unwrap_err();
        assert!(matches!(err, TypeCheckError::FrontEnd { .. }));
    }
}
