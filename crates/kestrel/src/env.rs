//! Lexical environments.
//!
//! An environment is a map of name bindings plus an optional reference to
//! the enclosing scope. The root of every chain is the universe scope;
//! package scopes enclose the universe, function invocations enclose the
//! function's captured environment, and blocks enclose their surrounding
//! scope.
//!
//! Two write operations exist because declaration and mutation are
//! different statements in the analyzed language: `set_local` binds in the
//! current scope (shadowing, `:=`), while `set` updates the nearest
//! enclosing scope that already has the name (plain `=`), falling back to a
//! local binding when no scope has it.

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;

use crate::object::ObjectRef;

pub struct Env {
    store: RefCell<AHashMap<String, ObjectRef>>,
    outer: Option<Rc<Env>>,
}

impl Env {
    /// A root scope with no enclosing environment.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(AHashMap::new()),
            outer: None,
        })
    }

    /// A child scope enclosing `outer`.
    #[must_use]
    pub fn new_enclosed(outer: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(AHashMap::new()),
            outer: Some(Rc::clone(outer)),
        })
    }

    /// Looks a name up through the scope chain.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ObjectRef> {
        if let Some(obj) = self.store.borrow().get(name) {
            return Some(Rc::clone(obj));
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// True when the name is bound in this scope, ignoring enclosing ones.
    #[must_use]
    pub fn has_local(&self, name: &str) -> bool {
        self.store.borrow().contains_key(name)
    }

    /// Binds in this scope only, shadowing any enclosing binding.
    pub fn set_local(&self, name: &str, obj: ObjectRef) {
        self.store.borrow_mut().insert(name.to_owned(), obj);
    }

    /// Updates the binding in the nearest scope that has it; binds locally
    /// when no enclosing scope does.
    pub fn set(&self, name: &str, obj: ObjectRef) {
        if self.try_update(name, &obj) {
            return;
        }
        self.set_local(name, obj);
    }

    fn try_update(&self, name: &str, obj: &ObjectRef) -> bool {
        {
            let mut store = self.store.borrow_mut();
            if let Some(slot) = store.get_mut(name) {
                *slot = Rc::clone(obj);
                return true;
            }
        }
        self.outer
            .as_ref()
            .is_some_and(|outer| outer.try_update(name, obj))
    }

    /// The enclosing scope, if any.
    #[must_use]
    pub fn outer(&self) -> Option<&Rc<Self>> {
        self.outer.as_ref()
    }

    /// Names bound locally, for debugging and scope dumps.
    #[must_use]
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.store.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Env({} bindings{})",
            self.store.borrow().len(),
            if self.outer.is_some() { ", enclosed" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn get_walks_the_chain() {
        let root = Env::new();
        root.set_local("x", Object::integer(1));
        let child = Env::new_enclosed(&root);
        assert!(matches!(*child.get("x").unwrap(), Object::Integer(1)));
        assert!(child.get("y").is_none());
    }

    #[test]
    fn set_local_shadows() {
        let root = Env::new();
        root.set_local("x", Object::integer(1));
        let child = Env::new_enclosed(&root);
        child.set_local("x", Object::integer(2));
        assert!(matches!(*child.get("x").unwrap(), Object::Integer(2)));
        assert!(matches!(*root.get("x").unwrap(), Object::Integer(1)));
    }

    #[test]
    fn set_updates_in_place() {
        let root = Env::new();
        root.set_local("x", Object::integer(1));
        let child = Env::new_enclosed(&root);
        child.set("x", Object::integer(2));
        // no local binding was created; the root binding changed
        assert!(!child.has_local("x"));
        assert!(matches!(*root.get("x").unwrap(), Object::Integer(2)));
    }

    #[test]
    fn set_falls_back_to_local() {
        let root = Env::new();
        let child = Env::new_enclosed(&root);
        child.set("fresh", Object::integer(3));
        assert!(child.has_local("fresh"));
        assert!(root.get("fresh").is_none());
    }
}
