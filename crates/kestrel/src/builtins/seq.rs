//! Sequence and container builtins: `append`, `copy`, `delete`, `close`,
//! `clear`.
//!
//! Container contents are symbolic, so these mostly exist to keep typed
//! values flowing and to avoid erroring on well-formed programs.

use std::rc::Rc;

use crate::{
    evaluator::Evaluator,
    object::{Object, ObjectRef, TypeHint},
    scanner::FieldType,
};

/// `append(s, vs...)` evaluates to its first argument: the result has the
/// same slice type, and the appended values were already evaluated for
/// their side effects.
pub(crate) fn append(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    match args.first() {
        Some(slice) => Rc::clone(slice),
        None => ev.argument_count_error("append", 1, 0),
    }
}

/// `copy(dst, src)` returns a symbolic element count.
pub(crate) fn copy(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 2 {
        return ev.argument_count_error("copy", 2, args.len());
    }
    Object::typed_placeholder(
        "result of copy",
        TypeHint::of_field(FieldType::builtin("int")),
    )
}

pub(crate) fn delete(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 2 {
        return ev.argument_count_error("delete", 2, args.len());
    }
    Object::nil()
}

pub(crate) fn close(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return ev.argument_count_error("close", 1, args.len());
    }
    Object::nil()
}

pub(crate) fn clear(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return ev.argument_count_error("clear", 1, args.len());
    }
    Object::nil()
}
