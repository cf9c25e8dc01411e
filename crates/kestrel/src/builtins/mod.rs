//! Built-in functions of the universe scope.
//!
//! Each submodule implements one family of builtins as plain functions with
//! the intrinsic signature; [`install`] wires them into a scope as
//! [`Intrinsic`] objects. Builtins compute concrete results only when the
//! arguments make that trivial (`len` of a string literal, `min` of known
//! integers) and otherwise return typed placeholders, like every other
//! part of the engine.

mod control;
mod len;
mod make;
mod numeric;
mod print;
mod seq;

use std::rc::Rc;

use crate::{
    env::Env,
    evaluator::Evaluator,
    object::{Intrinsic, Object, ObjectRef},
};

type BuiltinFn = fn(&mut Evaluator, &[ObjectRef]) -> ObjectRef;

const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("len", len::len),
    ("cap", len::cap),
    ("make", make::make),
    ("new", make::new),
    ("append", seq::append),
    ("copy", seq::copy),
    ("delete", seq::delete),
    ("close", seq::close),
    ("clear", seq::clear),
    ("complex", numeric::complex),
    ("real", numeric::real),
    ("imag", numeric::imag),
    ("min", numeric::min),
    ("max", numeric::max),
    ("print", print::print),
    ("println", print::println),
    ("panic", control::panic),
    ("recover", control::recover),
];

/// Binds every builtin into `env` as an intrinsic object.
pub(crate) fn install(env: &Rc<Env>) {
    for (name, func) in BUILTINS {
        env.set_local(
            name,
            Rc::new(Object::Intrinsic(Intrinsic {
                name: (*name).to_owned(),
                func: Rc::new(*func),
            })),
        );
    }
}
