//! Composite literals: instances for in-policy types, element evaluation
//! for side-effect coverage, function values threaded through literals.

mod common;

use std::rc::Rc;

use common::*;
use kestrel::{Object, ObjectKind, syntax::Decl};

#[test]
fn composite_literal_of_resolved_type_is_an_instance() {
    let point = struct_type(
        MAIN,
        "Point",
        vec![field("X", builtin_ft("int")), field("Y", builtin_ft("int"))],
        vec![],
    );
    let mut ev = setup(vec![package("main", MAIN, vec![], vec![point], vec![])]);
    let pkg = ev.package(MAIN).unwrap();
    let lit = composite(
        Some(ident("Point")),
        vec![kv(ident("X"), lit_int("1")), kv(ident("Y"), lit_int("2"))],
    );
    let result = ev.eval_expr(&lit, &pkg.env, &pkg);
    match &*expect_ok(&result, &ev) {
        Object::Instance(inst) => assert_eq!(inst.type_name, "example.com/main.Point"),
        other => panic!("expected instance, got {}", other.inspect()),
    }
}

#[test]
fn slice_literal_keeps_element_type() {
    let mut ev = setup(vec![empty_main()]);
    let pkg = ev.package(MAIN).unwrap();
    let lit = composite(Some(slice_type(ident("int"))), vec![lit_int("1"), lit_int("2")]);
    let result = ev.eval_expr(&lit, &pkg.env, &pkg);
    match &*expect_ok(&result, &ev) {
        Object::Slice(s) => {
            assert_eq!(s.elem.as_ref().unwrap().name, "int");
        }
        other => panic!("expected slice, got {}", other.inspect()),
    }
}

#[test]
fn functions_inside_composite_literals_are_observed() {
    // type X struct { Ys []Y }; type Y struct { Handler func() }
    // func f() {}
    // func g(fn func()) func() { return fn }
    // func main() { _ = &X{ Ys: []Y{ { Handler: g(f) } } } }
    let x_type = struct_type(
        MAIN,
        "X",
        vec![field("Ys", kestrel::scanner::FieldType::slice_of(named_ft("main", MAIN, "Y")))],
        vec![],
    );
    let y_type = struct_type(MAIN, "Y", vec![field("Handler", builtin_ft("any"))], vec![]);

    let f_decl = func_decl("f", None, vec![], vec![], vec![], Some(block(vec![])));
    let g_decl = func_decl(
        "g",
        None,
        vec![],
        vec![param("fn", Some(func_type_expr()))],
        vec![param("", Some(func_type_expr()))],
        Some(block(vec![ret_stmt(vec![ident("fn")])])),
    );
    let main_decl = func_decl(
        "main",
        None,
        vec![],
        vec![],
        vec![],
        Some(block(vec![assign(
            vec![ident("_")],
            vec![addr(composite(
                Some(ident("X")),
                vec![kv(
                    ident("Ys"),
                    composite(
                        Some(slice_type(ident("Y"))),
                        vec![composite(
                            None,
                            vec![kv(ident("Handler"), call(ident("g"), vec![ident("f")]))],
                        )],
                    ),
                )],
            ))],
        )])),
    );
    let f_info = func_info(MAIN, "f", Rc::clone(&f_decl), vec![], vec![]);
    let g_info = func_info(
        MAIN,
        "g",
        Rc::clone(&g_decl),
        vec![field("fn", kestrel::scanner::FieldType::func_type())],
        vec![field("", kestrel::scanner::FieldType::func_type())],
    );
    let main_info = func_info(MAIN, "main", Rc::clone(&main_decl), vec![], vec![]);
    let main_file = file(
        "main.src",
        "main",
        vec![],
        vec![Decl::Func(f_decl), Decl::Func(g_decl), Decl::Func(main_decl)],
    );
    let mut ev = setup(vec![package(
        "main",
        MAIN,
        vec![main_file],
        vec![x_type, y_type],
        vec![f_info, g_info, main_info],
    )]);

    let (used, intrinsic) = collecting_intrinsic();
    ev.set_default_intrinsic(intrinsic);
    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);

    let used = used.borrow();
    assert!(used.contains(&"example.com/main.g".to_owned()), "g used: {used:?}");
    assert!(used.contains(&"example.com/main.f".to_owned()), "f used: {used:?}");
}

#[test]
fn untyped_composite_literal_stays_symbolic_but_evaluates_elements() {
    let mut ev = setup(vec![empty_main()]);
    let pkg = ev.package(MAIN).unwrap();
    let lit = composite(None, vec![lit_int("1")]);
    let result = ev.eval_expr(&lit, &pkg.env, &pkg);
    assert_eq!(result.kind(), ObjectKind::SymbolicPlaceholder);
}

#[test]
fn make_produces_typed_containers() {
    let mut ev = setup(vec![empty_main()]);
    let pkg = ev.package(MAIN).unwrap();

    let chan = ev.eval_expr(&call(ident("make"), vec![chan_type(ident("int"))]), &pkg.env, &pkg);
    match &*expect_ok(&chan, &ev) {
        Object::Channel(c) => assert_eq!(c.elem.as_ref().unwrap().name, "int"),
        other => panic!("expected channel, got {}", other.inspect()),
    }

    let slice = ev.eval_expr(
        &call(ident("make"), vec![slice_type(ident("string")), lit_int("4")]),
        &pkg.env,
        &pkg,
    );
    match &*expect_ok(&slice, &ev) {
        Object::Slice(s) => assert_eq!(s.elem.as_ref().unwrap().name, "string"),
        other => panic!("expected slice, got {}", other.inspect()),
    }
}
