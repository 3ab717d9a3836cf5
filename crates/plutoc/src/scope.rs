//! Scope stack used by the inference pass.
//!
//! A scope is a mapping from name to `(type, optional constant value,
//! optional definition span)`. Scopes form a stack — module scope, then one
//! per function and per comprehension — and lookup is innermost-first.
//! Rather than a back-pointer from a node to its scope, a small `(frame,
//! slot)` handle is embedded directly in the AST, avoiding the source's
//! closures-over-the-interpreter style.

use std::rc::Rc;

use crate::{
    names::Name,
    span::Span,
    types::{ConstValue, ParamSig, Type},
};

/// Resolves which binding a name occurrence refers to: `(frame index, slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeHandle {
    pub frame: u32,
    pub slot: u32,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub ty: Type,
    pub constant: Option<ConstValue>,
    pub def_span: Option<Span>,
    /// A function definition's own named parameter list, for keyword-argument
    /// resolution at its call sites. `None` for every binding that
    /// isn't itself a `def` — a `FunctionT`-typed value with no name of its
    /// own (a parameter, a list element) cannot be called with keywords.
    pub call_params: Option<Rc<Vec<ParamSig>>>,
}

impl Binding {
    #[must_use]
    pub fn new(ty: Type) -> Self {
        Self { ty, constant: None, def_span: None, call_params: None }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.def_span = Some(span);
        self
    }

    #[must_use]
    pub fn with_constant(mut self, value: ConstValue) -> Self {
        self.constant = Some(value);
        self
    }

    #[must_use]
    pub fn with_call_params(mut self, params: Vec<ParamSig>) -> Self {
        self.call_params = Some(Rc::new(params));
        self
    }
}

#[derive(Debug, Default)]
struct Frame {
    bindings: Vec<(Name, Binding)>,
}

/// A stack of scope frames: frame 0 is the initial (built-in) scope.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self { frames: vec![Frame::default()] }
    }

    pub fn push_frame(&mut self) -> u32 {
        self.frames.push(Frame::default());
        self.frames.len() as u32 - 1
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.frames.len() as u32 - 1
    }

    /// Binds `name` in the innermost frame, returning its handle. A repeat
    /// bind of the same name in the same frame shadows the earlier slot for
    /// future lookups but does not remove it (matching Python's rebinding
    /// semantics, where the old slot simply becomes unreachable).
    pub fn bind(&mut self, name: Name, binding: Binding) -> ScopeHandle {
        let frame_idx = self.frames.len() as u32 - 1;
        let frame = self.frames.last_mut().expect("scope stack is never empty");
        let slot = frame.bindings.len() as u32;
        frame.bindings.push((name, binding));
        ScopeHandle { frame: frame_idx, slot }
    }

    /// Innermost-first lookup by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(ScopeHandle, &Binding)> {
        for (frame_idx, frame) in self.frames.iter().enumerate().rev() {
            if let Some((slot, (_, binding))) = frame.bindings.iter().enumerate().rev().find(|(_, (n, _))| n.as_str() == name) {
                return Some((ScopeHandle { frame: frame_idx as u32, slot: slot as u32 }, binding));
            }
        }
        None
    }

    #[must_use]
    pub fn resolve(&self, handle: ScopeHandle) -> &Binding {
        &self.frames[handle.frame as usize].bindings[handle.slot as usize].1
    }
}
