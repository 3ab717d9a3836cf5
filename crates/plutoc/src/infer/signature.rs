//! Keyword/positional argument binding against a parameter list:
//! position-independence of keywords, duplicate- and unknown-keyword
//! rejection, and default-value fallback. Grounded on
//! `opshin/tests/test_keywords.py`.
//!
//! "Keyword argument after a positional argument is a syntax error" is
//! enforced upstream of this module: the front end's `Call`
//! lowering (`ast::front`) only ever produces a positional-argument count
//! and a keyword list, the same shape the source parser itself only
//! accepts when positionals precede keywords — see DESIGN.md.

use crate::{names::Name, types::ParamSig};

#[derive(Debug, Clone)]
pub enum SignatureError {
    TooManyPositional { expected: usize, got: usize },
    DuplicateArgument(Name),
    UnknownKeyword(Name),
    MissingArgument(Name),
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureError::TooManyPositional { expected, got } => {
                write!(f, "expected at most {expected} positional arguments, got {got}")
            }
            SignatureError::DuplicateArgument(name) => write!(f, "got multiple values for argument '{name}'"),
            SignatureError::UnknownKeyword(name) => write!(f, "unexpected keyword argument '{name}'"),
            SignatureError::MissingArgument(name) => write!(f, "missing required argument '{name}'"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// For each parameter, in declaration order, which call-site argument fills
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSource {
    Positional(usize),
    Keyword(usize),
    Default,
}

/// Binds a call's `n_positional` positional arguments and `keywords` (in
/// source order) against `params`, in declaration order.
pub fn bind_call(params: &[ParamSig], n_positional: usize, keywords: &[Name]) -> Result<Vec<ArgSource>, SignatureError> {
    if n_positional > params.len() {
        return Err(SignatureError::TooManyPositional { expected: params.len(), got: n_positional });
    }
    let mut sources: Vec<Option<ArgSource>> = vec![None; params.len()];
    for i in 0..n_positional {
        sources[i] = Some(ArgSource::Positional(i));
    }
    for (kw_idx, kw) in keywords.iter().enumerate() {
        let Some(param_idx) = params.iter().position(|p| &p.name == kw) else {
            return Err(SignatureError::UnknownKeyword(kw.clone()));
        };
        if sources[param_idx].is_some() {
            return Err(SignatureError::DuplicateArgument(kw.clone()));
        }
        sources[param_idx] = Some(ArgSource::Keyword(kw_idx));
    }
    let mut resolved = Vec::with_capacity(params.len());
    for (param, source) in params.iter().zip(sources) {
        match source {
            Some(s) => resolved.push(s),
            None if param.has_default => resolved.push(ArgSource::Default),
            None => return Err(SignatureError::MissingArgument(param.name.clone())),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str], defaults: &[bool]) -> Vec<ParamSig> {
        names.iter().zip(defaults).map(|(n, d)| ParamSig { name: Name::new(*n), has_default: *d }).collect()
    }

    #[test]
    fn all_keywords_bind_by_name_regardless_of_order() {
        let p = params(&["x", "y", "z"], &[false, false, false]);
        let order_a = bind_call(&p, 0, &[Name::new("x"), Name::new("y"), Name::new("z")]).unwrap();
        let order_b = bind_call(&p, 0, &[Name::new("z"), Name::new("x"), Name::new("y")]).unwrap();
        // position-independence: both permutations fill the same
        // parameter slots, just via different keyword-list indices.
        assert!(matches!(order_a[0], ArgSource::Keyword(0)));
        assert!(matches!(order_b[0], ArgSource::Keyword(1)));
    }

    #[test]
    fn mixture_of_positional_and_keyword() {
        let p = params(&["x", "y", "z"], &[false, false, false]);
        let bound = bind_call(&p, 2, &[Name::new("z")]).unwrap();
        assert_eq!(bound, vec![ArgSource::Positional(0), ArgSource::Positional(1), ArgSource::Keyword(0)]);
    }

    #[test]
    fn duplicate_keyword_is_rejected() {
        let p = params(&["x", "y"], &[false, false]);
        let err = bind_call(&p, 1, &[Name::new("x")]).unwrap_err();
        assert!(matches!(err, SignatureError::DuplicateArgument(_)));
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let p = params(&["x", "y"], &[false, false]);
        let err = bind_call(&p, 0, &[Name::new("x"), Name::new("k")]).unwrap_err();
        assert!(matches!(err, SignatureError::UnknownKeyword(_)));
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let p = params(&["x", "y"], &[false, false]);
        let err = bind_call(&p, 1, &[]).unwrap_err();
        assert!(matches!(err, SignatureError::MissingArgument(_)));
    }

    #[test]
    fn default_fills_an_unsupplied_parameter() {
        let p = params(&["x", "y", "z"], &[false, false, true]);
        let bound = bind_call(&p, 2, &[]).unwrap();
        assert_eq!(bound[2], ArgSource::Default);
    }
}
