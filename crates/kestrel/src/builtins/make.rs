//! `make` and `new`.
//!
//! Both read the static type of their first argument: the evaluator turns a
//! type expression in argument position into a type-valued object (or a
//! placeholder carrying the type reference when the type is out of policy),
//! so the builtin only has to inspect the hint.

use std::rc::Rc;

use crate::{
    evaluator::Evaluator,
    object::{Channel, Instance, MapObject, Object, ObjectRef, Pointer, Slice, TypeHint},
    scanner::FieldType,
};

/// `make(T, ...)` for slice, map, and channel types. Size arguments are
/// accepted and ignored; contents are symbolic regardless.
pub(crate) fn make(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let Some(first) = args.first() else {
        return ev.argument_count_error("make", 1, 0);
    };
    let hint = first.type_hint();
    if let Some(ft) = hint.field_type.clone() {
        if ft.is_chan {
            return Rc::new(Object::Channel(Rc::new(Channel {
                elem: ft.elem.clone(),
                hint,
            })));
        }
        if ft.is_slice {
            return Rc::new(Object::Slice(Rc::new(Slice {
                elem: ft.elem.clone(),
                hint,
            })));
        }
        if ft.is_map {
            return Rc::new(Object::Map(Rc::new(MapObject {
                key: ft.key.clone(),
                value: ft.elem.clone(),
                hint,
            })));
        }
    }
    Object::typed_placeholder("make of unresolved or non-composite type", hint)
}

/// `new(T)`: a pointer to a zero value of `T` when `T` resolves, else a
/// placeholder naming the unresolved type.
pub(crate) fn new(ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    let [arg] = args else {
        return ev.argument_count_error("new", 1, args.len());
    };
    let hint = arg.type_hint();
    let pointer_hint = TypeHint::new(
        hint.type_info.clone(),
        hint.field_type.clone().map(FieldType::pointer_to),
    );
    match &hint.type_info {
        Some(info) if !info.unresolved => {
            let pointee = Rc::new(Object::Instance(Rc::new(Instance {
                type_name: info.qualified_name(),
                hint: hint.clone(),
            })));
            Rc::new(Object::Pointer(Rc::new(Pointer {
                pointee,
                hint: pointer_hint,
            })))
        }
        _ => {
            let described = hint
                .field_type
                .as_ref()
                .map_or_else(|| "<unknown>".to_owned(), |ft| ft.type_string());
            Object::typed_placeholder(format!("new of unresolved type {described}"), pointer_hint)
        }
    }
}
