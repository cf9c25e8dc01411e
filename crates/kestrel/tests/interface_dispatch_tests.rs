//! Interface-call recording and finalization: the dispatch scenarios that
//! motivate the whole engine.

mod common;

use std::rc::Rc;

use common::*;
use kestrel::{Evaluator, scanner::FieldType, syntax::Decl};
use pretty_assertions::assert_eq;

const DEF: &str = "example.com/def";
const IMPL: &str = "example.com/impl";
const BASE: &str = "example.com/base";
const CTRL: &str = "example.com/ctrl";

/// def:  type Speaker interface { Speak() string }
/// impl: type Dog struct{}; func (d *Dog) Speak() string
/// main: func doSpeak(s def.Speaker) { s.Speak() }
///       func main() { doSpeak(&impl.Dog{}) }
fn speaker_world() -> Evaluator {
    let speaker = iface_type(DEF, "Speaker", vec![msig("Speak", vec![], vec![builtin_ft("string")])]);
    let def_pkg = package("def", DEF, vec![], vec![speaker], vec![]);

    let speak_decl = func_decl(
        "Speak",
        Some(param("d", Some(star(ident("Dog"))))),
        vec![],
        vec![],
        vec![param("", Some(ident("string")))],
        Some(block(vec![ret_stmt(vec![lit_str("woof")])])),
    );
    let speak_info = method_fn_info(
        IMPL,
        field("d", FieldType::pointer_to(named_ft("impl", IMPL, "Dog"))),
        "Speak",
        Rc::clone(&speak_decl),
        vec![],
        vec![field("", builtin_ft("string"))],
    );
    let dog = struct_type(IMPL, "Dog", vec![], vec![Rc::clone(&speak_info)]);
    let impl_pkg = package("impl", IMPL, vec![], vec![dog], vec![speak_info]);

    let do_speak_decl = func_decl(
        "doSpeak",
        None,
        vec![],
        vec![param("s", Some(sel(ident("def"), "Speaker")))],
        vec![],
        Some(block(vec![expr_stmt(call(sel(ident("s"), "Speak"), vec![]))])),
    );
    let main_decl = func_decl(
        "main",
        None,
        vec![],
        vec![],
        vec![],
        Some(block(vec![expr_stmt(call(
            ident("doSpeak"),
            vec![addr(composite(Some(sel(ident("impl"), "Dog")), vec![]))],
        ))])),
    );
    let do_speak_info = func_info(
        MAIN,
        "doSpeak",
        Rc::clone(&do_speak_decl),
        vec![field("s", named_ft("def", DEF, "Speaker"))],
        vec![],
    );
    let main_info = func_info(MAIN, "main", Rc::clone(&main_decl), vec![], vec![]);
    let main_file = file(
        "main.src",
        "main",
        vec![(None, DEF), (None, IMPL)],
        vec![Decl::Func(do_speak_decl), Decl::Func(main_decl)],
    );
    let main_pkg = package(
        "main",
        MAIN,
        vec![main_file],
        vec![],
        vec![do_speak_info, main_info],
    );

    setup(vec![def_pkg, impl_pkg, main_pkg])
}

#[test]
fn interface_call_is_recorded_during_execution() {
    let mut ev = speaker_world();
    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);

    let records = ev.interface_calls();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, "example.com/def.Speaker.Speak");
    assert!(records[0].receivers >= 1);
}

#[test]
fn finalize_resolves_interface_call_to_concrete_method() {
    let mut ev = speaker_world();
    let (used, intrinsic) = collecting_intrinsic();
    ev.set_default_intrinsic(intrinsic);

    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);
    let report = ev.finalize();

    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.resolved[0].interface_key, "example.com/def.Speaker.Speak");
    assert_eq!(report.resolved[0].concrete_type, "example.com/impl.Dog");
    assert_eq!(report.resolved[0].function, "(*example.com/impl.Dog).Speak");

    let used = used.borrow();
    assert!(
        used.contains(&"(*example.com/impl.Dog).Speak".to_owned()),
        "default intrinsic saw the resolved method: {used:?}"
    );
    assert!(used.contains(&"example.com/main.doSpeak".to_owned()));
}

#[test]
fn finalize_is_idempotent() {
    let mut ev = speaker_world();
    let (used, intrinsic) = collecting_intrinsic();
    ev.set_default_intrinsic(intrinsic);

    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);

    let first = ev.finalize();
    let after_first = used.borrow().len();
    let second = ev.finalize();
    let after_second = used.borrow().len();

    assert_eq!(first, second);
    // the same intrinsic invocations happened again, no more, no fewer
    assert_eq!(after_second - after_first, first.resolved.len());
}

#[test]
fn embedded_method_call_resolves_to_the_embedded_type() {
    // base: type BaseController struct{}; func (c *BaseController) Validate(req any) error
    // ctrl: type Controller struct { base.BaseController }
    // main: func main() { (&ctrl.Controller{}).Validate(nil) }
    let validate_decl = func_decl(
        "Validate",
        Some(param("c", Some(star(ident("BaseController"))))),
        vec![],
        vec![param("req", Some(ident("any")))],
        vec![param("", Some(ident("error")))],
        Some(block(vec![ret_stmt(vec![ident("nil")])])),
    );
    let validate_info = method_fn_info(
        BASE,
        field("c", FieldType::pointer_to(named_ft("base", BASE, "BaseController"))),
        "Validate",
        Rc::clone(&validate_decl),
        vec![field("req", builtin_ft("any"))],
        vec![field("", builtin_ft("error"))],
    );
    let base_controller = struct_type(BASE, "BaseController", vec![], vec![Rc::clone(&validate_info)]);
    let base_pkg = package("base", BASE, vec![], vec![base_controller], vec![validate_info]);

    let controller = struct_type(
        CTRL,
        "Controller",
        vec![embedded_field(named_ft("base", BASE, "BaseController"))],
        vec![],
    );
    let ctrl_pkg = package("ctrl", CTRL, vec![], vec![controller], vec![]);

    let main_decl = func_decl(
        "main",
        None,
        vec![],
        vec![],
        vec![],
        Some(block(vec![expr_stmt(call(
            sel(
                paren(addr(composite(Some(sel(ident("ctrl"), "Controller")), vec![]))),
                "Validate",
            ),
            vec![ident("nil")],
        ))])),
    );
    let main_info = func_info(MAIN, "main", Rc::clone(&main_decl), vec![], vec![]);
    let main_file = file(
        "main.src",
        "main",
        vec![(None, CTRL), (None, BASE)],
        vec![Decl::Func(main_decl)],
    );
    let main_pkg = package("main", MAIN, vec![main_file], vec![], vec![main_info]);

    let mut ev = setup(vec![base_pkg, ctrl_pkg, main_pkg]);
    let (used, intrinsic) = collecting_intrinsic();
    ev.set_default_intrinsic(intrinsic);

    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);

    let used = used.borrow();
    assert!(
        used.contains(&"(*example.com/base.BaseController).Validate".to_owned()),
        "embedded method observed: {used:?}"
    );
}

#[test]
fn possible_types_accumulate_on_interface_variables() {
    // var s def.Speaker; func main() { s = &impl.Dog{} }
    let speaker = iface_type(DEF, "Speaker", vec![msig("Speak", vec![], vec![builtin_ft("string")])]);
    let def_pkg = package("def", DEF, vec![], vec![speaker], vec![]);
    let dog = struct_type(IMPL, "Dog", vec![], vec![]);
    let impl_pkg = package("impl", IMPL, vec![], vec![dog], vec![]);

    let main_decl = func_decl(
        "main",
        None,
        vec![],
        vec![],
        vec![],
        Some(block(vec![assign(
            vec![ident("s")],
            vec![addr(composite(Some(sel(ident("impl"), "Dog")), vec![]))],
        )])),
    );
    let main_info = func_info(MAIN, "main", Rc::clone(&main_decl), vec![], vec![]);
    let main_file = file(
        "main.src",
        "main",
        vec![(None, DEF), (None, IMPL)],
        vec![
            var_decl(vec!["s"], Some(sel(ident("def"), "Speaker")), vec![]),
            Decl::Func(main_decl),
        ],
    );
    let main_pkg = package("main", MAIN, vec![main_file], vec![], vec![main_info]);

    let mut ev = setup(vec![def_pkg, impl_pkg, main_pkg]);
    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);

    let pkg = ev.package(MAIN).unwrap();
    match &*pkg.env.get("s").unwrap() {
        kestrel::Object::Variable(v) => {
            assert!(v.has_possible_type("example.com/impl.Dog"), "Dog recorded");
            // the static type is untouched
            assert!(v.declared.is_interface());
        }
        other => panic!("expected variable, got {}", other.inspect()),
    }
}

#[test]
fn interface_arguments_carry_concrete_hints() {
    let mut ev = speaker_world();
    // observe the parameter binding through the default intrinsic
    let seen: Rc<std::cell::RefCell<Vec<String>>> = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    ev.set_default_intrinsic(Rc::new(move |_ev, callee, args| {
        if let kestrel::Object::Function(f) = &**callee
            && f.qualified_name() == "example.com/main.doSpeak"
            && let Some(arg) = args.first()
        {
            sink.borrow_mut().push(arg.type_hint().describe());
        }
        None
    }));
    let result = apply_main(&mut ev);
    expect_ok(&result, &ev);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("Dog"), "argument typed as Dog: {seen:?}");
}
