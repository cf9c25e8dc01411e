//! `panic` and `recover`.

use std::rc::Rc;

use crate::{
    evaluator::Evaluator,
    object::{Object, ObjectRef, PanicError},
};

/// `panic(v)` produces a panic marker that propagates like an error.
/// `panic(nil)` carries the nil object; the payload is never dereferenced.
pub(crate) fn panic(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let payload = args.first().map_or_else(Object::nil, Rc::clone);
    Rc::new(Object::PanicError(Rc::new(PanicError {
        payload,
        pos: ev.current_pos(),
    })))
}

/// `recover()` yields a symbolic value: whether a panic is in flight on any
/// given path is not tracked.
pub(crate) fn recover(_ev: &mut Evaluator, _args: &[ObjectRef]) -> ObjectRef {
    Object::placeholder("result of recover")
}
