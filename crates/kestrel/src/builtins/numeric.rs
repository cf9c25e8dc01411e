//! Numeric builtins: `complex`, `real`, `imag`, `min`, `max`.

use crate::{
    evaluator::Evaluator,
    object::{Complex64, Object, ObjectRef, TypeHint},
    scanner::FieldType,
};

fn as_f64(obj: &ObjectRef) -> Option<f64> {
    match &**obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Unsigned(v) => Some(*v as f64),
        Object::Float(v) => Some(*v),
        _ => None,
    }
}

/// `complex(re, im)`: concrete when both parts are known numbers.
pub(crate) fn complex(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let [re, im] = args else {
        return ev.argument_count_error("complex", 2, args.len());
    };
    match (as_f64(re), as_f64(im)) {
        (Some(re), Some(im)) => Object::complex(Complex64::new(re, im)),
        _ => Object::typed_placeholder(
            "complex of symbolic parts",
            TypeHint::of_field(FieldType::builtin("complex128")),
        ),
    }
}

pub(crate) fn real(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let [arg] = args else {
        return ev.argument_count_error("real", 1, args.len());
    };
    match &**arg {
        Object::Complex(c) => Object::float(c.re),
        _ => Object::typed_placeholder(
            "real of symbolic value",
            TypeHint::of_field(FieldType::builtin("float64")),
        ),
    }
}

pub(crate) fn imag(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let [arg] = args else {
        return ev.argument_count_error("imag", 1, args.len());
    };
    match &**arg {
        Object::Complex(c) => Object::float(c.im),
        _ => Object::typed_placeholder(
            "imag of symbolic value",
            TypeHint::of_field(FieldType::builtin("float64")),
        ),
    }
}

pub(crate) fn min(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    fold_ordered(ev, "min", args, i64::min, f64::min)
}

pub(crate) fn max(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    fold_ordered(ev, "max", args, i64::max, f64::max)
}

/// Folds `min`/`max` over the arguments: concrete integers stay integers,
/// any float involvement promotes, anything symbolic yields a placeholder.
fn fold_ordered(
    ev: &mut Evaluator,
    name: &str,
    args: &[ObjectRef],
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> ObjectRef {
    if args.is_empty() {
        return ev.argument_count_error(name, 1, 0);
    }
    if args.iter().all(|a| matches!(&**a, Object::Integer(_))) {
        let mut acc = match &*args[0] {
            Object::Integer(v) => *v,
            _ => unreachable!(),
        };
        for arg in &args[1..] {
            if let Object::Integer(v) = &**arg {
                acc = int_op(acc, *v);
            }
        }
        return Object::integer(acc);
    }
    if args.iter().all(|a| as_f64(a).is_some()) {
        let mut acc = as_f64(&args[0]).unwrap_or(0.0);
        for arg in &args[1..] {
            acc = float_op(acc, as_f64(arg).unwrap_or(acc));
        }
        return Object::float(acc);
    }
    Object::placeholder(format!("{name} of symbolic values"))
}
