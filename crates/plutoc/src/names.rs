//! Interned-enough identifiers.
//!
//! A long-running interpreter backs every identifier with a `StringId` into
//! a string interner sized for its whole heap. This compiler is a
//! single-shot batch pipeline over scripts small enough that a cheap
//! `Rc<str>` clone is indistinguishable in practice, so the interner was not
//! carried over — see DESIGN.md.

use std::{fmt, rc::Rc};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Name(Rc<str>);

impl Name {
    pub fn new(s: impl Into<Rc<str>>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::borrow::Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}
