//! Field and method lookup on resolved types.
//!
//! Given a receiver's [`TypeInfo`] and a selector name, the accessor finds
//! what the selector denotes: a declared method, a struct field, or an
//! interface method. Lookup rules:
//!
//! - direct matches on the named type win;
//! - a method with receiver `*T` is visible when the lookup is on a pointer
//!   (pointer promotion);
//! - embedded fields are searched breadth-first, so a shallower match beats
//!   a deeper one and two matches at the same depth are ambiguous;
//! - when an embedded chain crosses into an unresolved (out-of-policy)
//!   type, a miss degrades to [`Lookup::Unresolved`] so the evaluator can
//!   fall back to a field assumption instead of erroring.

use std::{collections::VecDeque, rc::Rc};

use ahash::AHashSet;

use crate::{
    resolver::Resolver,
    scanner::{FieldInfo, FunctionInfo, MethodSig, TypeInfo},
    tracer::EvalTracer,
};

/// What a selector resolved to.
#[derive(Debug)]
pub enum Lookup {
    /// A declared method, with the type that declares it.
    Method {
        info: Rc<FunctionInfo>,
        owner: Rc<TypeInfo>,
    },
    /// A struct field, with the type that declares it.
    Field {
        info: FieldInfo,
        owner: Rc<TypeInfo>,
    },
    /// A method of an interface type.
    InterfaceMethod {
        sig: MethodSig,
        owner: Rc<TypeInfo>,
    },
    /// Two or more candidates at the same embedding depth.
    Ambiguous { candidates: Vec<String> },
    /// Nothing found, but an embedded type along the way was unresolved;
    /// the selector may still exist out of sight.
    Unresolved,
    NotFound,
}

/// Finds `name` on `info`, honoring pointer promotion when `on_pointer`.
pub fn find_field_or_method(
    resolver: &mut Resolver,
    info: &Rc<TypeInfo>,
    name: &str,
    on_pointer: bool,
    tracer: &mut dyn EvalTracer,
) -> Lookup {
    let mut queue: VecDeque<(Rc<TypeInfo>, usize)> = VecDeque::new();
    let mut visited: AHashSet<String> = AHashSet::new();
    queue.push_back((Rc::clone(info), 0));
    visited.insert(info.qualified_name());

    let mut saw_unresolved = false;
    let mut current_depth = 0;
    let mut found_at_depth: Vec<(String, Lookup)> = Vec::new();

    while let Some((ty, depth)) = queue.pop_front() {
        if depth > current_depth {
            match finish_depth(&mut found_at_depth) {
                Some(result) => return result,
                None => current_depth = depth,
            }
        }

        if ty.unresolved {
            saw_unresolved = true;
            continue;
        }

        // Methods declared on this named type. Pointer promotion applies at
        // every embedding level: an embedded value gives access to its
        // pointer methods only when the outer receiver is addressable,
        // which symbolic lookup treats as the `on_pointer` flag.
        if let Some(m) = ty.method(name, on_pointer || depth > 0) {
            found_at_depth.push((
                format!("({}).{name}", ty.qualified_name()),
                Lookup::Method {
                    info: m,
                    owner: Rc::clone(&ty),
                },
            ));
        }

        if let Some(sig) = ty.interface_method(name) {
            found_at_depth.push((
                format!("{}.{name}", ty.qualified_name()),
                Lookup::InterfaceMethod {
                    sig: sig.clone(),
                    owner: Rc::clone(&ty),
                },
            ));
        }

        if let Some(struct_info) = &ty.struct_info {
            for field in &struct_info.fields {
                if !field.embedded && field.name == name {
                    found_at_depth.push((
                        format!("{}.{name}", ty.qualified_name()),
                        Lookup::Field {
                            info: field.clone(),
                            owner: Rc::clone(&ty),
                        },
                    ));
                }
            }
            // embedded names themselves are selectable as fields
            for field in &struct_info.fields {
                if field.embedded && embedded_name(field) == Some(name) {
                    found_at_depth.push((
                        format!("{}.{name}", ty.qualified_name()),
                        Lookup::Field {
                            info: field.clone(),
                            owner: Rc::clone(&ty),
                        },
                    ));
                }
            }
            // enqueue embedded types for the next depth
            for field in &struct_info.fields {
                if !field.embedded {
                    continue;
                }
                let embedded = resolver.resolve_type(&field.field_type, tracer);
                if embedded.unresolved {
                    saw_unresolved = true;
                    continue;
                }
                if visited.insert(embedded.qualified_name()) {
                    queue.push_back((embedded, depth + 1));
                }
            }
        }
    }

    if let Some(result) = finish_depth(&mut found_at_depth) {
        return result;
    }
    if saw_unresolved {
        Lookup::Unresolved
    } else {
        Lookup::NotFound
    }
}

/// Collapses the matches collected at one embedding depth: one match wins,
/// several are ambiguous, none keeps searching.
fn finish_depth(found: &mut Vec<(String, Lookup)>) -> Option<Lookup> {
    match found.len() {
        0 => None,
        1 => Some(found.pop().map(|(_, lookup)| lookup).unwrap_or(Lookup::NotFound)),
        _ => Some(Lookup::Ambiguous {
            candidates: found.drain(..).map(|(desc, _)| desc).collect(),
        }),
    }
}

/// The selectable name of an embedded field: the bare type name, pointer
/// stripped.
fn embedded_name(field: &FieldInfo) -> Option<&str> {
    let ft = &field.field_type;
    let named = if ft.is_pointer { ft.elem.as_ref()? } else { ft };
    if named.name.is_empty() {
        None
    } else {
        Some(named.name.as_str())
    }
}
