//! Host-supplied intrinsic functions.
//!
//! Intrinsics replace the normal dispatch for selected callables, keyed by
//! qualified name (`"example.com/fmt.Println"`, `"(*example.com/app.T).Close"`),
//! and the built-in universe functions are registered the same way under
//! their bare names. The registry is a stack of tables: `register` writes
//! the top table, `push`/`pop` nest temporary overrides, and `get` walks
//! from the top down, so a scoped override shadows without destroying.
//!
//! The **default intrinsic** is a single separate slot invoked for every
//! function and method call the evaluator performs, resolved or not, with
//! the callee object and the positional arguments. Returning `None` accepts
//! normal dispatch; returning a value short-circuits the call. It is the
//! primary extension point for analyses: call-graph builders and orphan
//! detectors observe the entire call stream through it.

use std::rc::Rc;

use ahash::AHashMap;

use crate::{evaluator::Evaluator, object::ObjectRef};

/// A host function bound to an intrinsic key. Receives the evaluator (for
/// constructing typed results and checking cancellation) and the evaluated
/// arguments.
pub type IntrinsicFn = Rc<dyn Fn(&mut Evaluator, &[ObjectRef]) -> ObjectRef>;

/// The catch-all hook invoked on every call: `(evaluator, callee, args)`.
/// A `Some` result replaces the call's normal result.
pub type DefaultIntrinsicFn = Rc<dyn Fn(&mut Evaluator, &ObjectRef, &[ObjectRef]) -> Option<ObjectRef>>;

/// Stack-scoped name → function table plus the default-intrinsic slot.
pub struct IntrinsicRegistry {
    scopes: Vec<AHashMap<String, IntrinsicFn>>,
    default_intrinsic: Option<DefaultIntrinsicFn>,
}

impl IntrinsicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![AHashMap::new()],
            default_intrinsic: None,
        }
    }

    /// Binds `key` in the top scope, shadowing lower scopes.
    pub fn register(&mut self, key: impl Into<String>, func: IntrinsicFn) {
        self.scopes
            .last_mut()
            .expect("registry always has a base scope")
            .insert(key.into(), func);
    }

    /// Opens a fresh override scope.
    pub fn push(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    /// Discards the top override scope. The base scope is never popped.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Resolves a key, innermost scope first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<IntrinsicFn> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(key).cloned())
    }

    /// Installs the default intrinsic. Single-writer: intended to be set
    /// once before evaluation begins.
    pub fn set_default(&mut self, func: DefaultIntrinsicFn) {
        self.default_intrinsic = Some(func);
    }

    #[must_use]
    pub fn default_intrinsic(&self) -> Option<DefaultIntrinsicFn> {
        self.default_intrinsic.clone()
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_intrinsic.is_some()
    }
}

impl Default for IntrinsicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IntrinsicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: usize = self.scopes.iter().map(|m| m.len()).sum();
        write!(
            f,
            "IntrinsicRegistry({} keys, {} scopes, default={})",
            keys,
            self.scopes.len(),
            self.has_default()
        )
    }
}
