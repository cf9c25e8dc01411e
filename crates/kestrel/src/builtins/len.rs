//! `len` and `cap`.

use crate::{
    evaluator::Evaluator,
    object::{Object, ObjectRef, TypeHint},
    scanner::FieldType,
};

/// `len(v)`: concrete for string values, symbolic (typed `int`) otherwise.
pub(crate) fn len(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let [arg] = args else {
        return ev.argument_count_error("len", 1, args.len());
    };
    match &**arg {
        Object::String(s) => Object::integer(i64::try_from(s.len()).unwrap_or(i64::MAX)),
        Object::Nil => Object::integer(0),
        _ => int_placeholder("len of symbolic value"),
    }
}

/// `cap(v)`: always symbolic; capacity is never tracked.
pub(crate) fn cap(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    if args.len() != 1 {
        return ev.argument_count_error("cap", 1, args.len());
    }
    int_placeholder("cap of symbolic value")
}

fn int_placeholder(reason: &str) -> ObjectRef {
    Object::typed_placeholder(reason, TypeHint::of_field(FieldType::builtin("int")))
}
