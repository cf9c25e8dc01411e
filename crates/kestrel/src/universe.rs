//! The universe scope.
//!
//! Every environment chain bottoms out here: the built-in functions as
//! intrinsic objects, the predeclared constants `true`/`false`/`nil`, an
//! `iota` stand-in for constant groups, and a pre-constructed `TypeInfo`
//! for the built-in `error` interface so that `error`-typed variables
//! participate in interface-call recording like any user interface.

use std::rc::Rc;

use crate::{
    builtins,
    env::Env,
    object::{Object, ObjectRef, TypeHint, TypeObject},
    scanner::{FieldType, InterfaceInfo, MethodSig, TypeDeclKind, TypeInfo},
};

/// Builds the `error` interface: `interface { Error() string }`.
#[must_use]
pub fn error_interface() -> Rc<TypeInfo> {
    Rc::new(TypeInfo {
        name: "error".to_owned(),
        pkg_path: String::new(),
        kind: TypeDeclKind::Interface,
        struct_info: None,
        interface_info: Some(InterfaceInfo {
            methods: vec![MethodSig {
                name: "Error".to_owned(),
                params: Vec::new(),
                results: vec![FieldType::builtin("string")],
            }],
        }),
        methods: Vec::new(),
        underlying: None,
        type_params: Vec::new(),
        unresolved: false,
    })
}

/// Constructs the universe scope shared by every package.
#[must_use]
pub fn build() -> Rc<Env> {
    let env = Env::new();
    builtins::install(&env);

    env.set_local("true", Object::boolean(true));
    env.set_local("false", Object::boolean(false));
    env.set_local("nil", Object::nil());
    // iota only has a defined value inside a constant group; a typed
    // placeholder keeps constant expressions evaluating.
    env.set_local(
        "iota",
        Object::typed_placeholder("iota", TypeHint::of_field(FieldType::builtin("int"))),
    );

    let error_info = error_interface();
    env.set_local(
        "error",
        Rc::new(Object::Type(Rc::new(TypeObject {
            name: "error".to_owned(),
            info: error_info,
        }))),
    );

    // scalar type names double as conversion functions and generic type
    // arguments; binding them as type objects keeps both forms evaluable
    for name in crate::scanner::BUILTIN_TYPES {
        if *name == "error" {
            continue;
        }
        env.set_local(
            name,
            Rc::new(Object::Type(Rc::new(TypeObject {
                name: (*name).to_owned(),
                info: TypeInfo::builtin(name),
            }))),
        );
    }

    env
}

/// Looks a name up in the universe only; used by identifier resolution as
/// the last stop after the lexical chain.
#[must_use]
pub fn lookup(universe: &Rc<Env>, name: &str) -> Option<ObjectRef> {
    universe.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    #[test]
    fn universe_has_builtins_and_constants() {
        let env = build();
        for name in ["len", "make", "append", "panic", "recover", "min", "max"] {
            let obj = env.get(name).unwrap_or_else(|| panic!("missing builtin {name}"));
            assert_eq!(obj.kind(), ObjectKind::Intrinsic, "{name}");
        }
        assert!(matches!(*env.get("true").unwrap(), Object::Boolean(true)));
        assert!(matches!(*env.get("nil").unwrap(), Object::Nil));
    }

    #[test]
    fn error_interface_is_an_interface_with_error_method() {
        let info = error_interface();
        assert!(info.is_interface());
        let sig = info.interface_method("Error").unwrap();
        assert_eq!(sig.results.len(), 1);
        assert_eq!(sig.results[0].name, "string");
    }
}
