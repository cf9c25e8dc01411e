//! Literal parsing and binary/unary expression evaluation: concrete where
//! trivially known, symbolic placeholders everywhere else.

mod common;

use common::*;
use kestrel::{
    Object, ObjectKind,
    syntax::{BinaryOp, UnaryOp},
};
use pretty_assertions::assert_eq;

fn eval_in_main(expr: std::rc::Rc<kestrel::syntax::Expr>) -> kestrel::ObjectRef {
    let mut ev = setup(vec![empty_main()]);
    let pkg = ev.package(MAIN).unwrap();
    let result = ev.eval_expr(&expr, &pkg.env, &pkg);
    expect_ok(&result, &ev)
}

#[test]
fn complex_multiplication_promotes_integers() {
    // (2+3i) * (4+5i) == -7 + 22i
    let expr = bin(
        paren(bin(lit_int("2"), BinaryOp::Add, lit_imag("3i"))),
        BinaryOp::Mul,
        paren(bin(lit_int("4"), BinaryOp::Add, lit_imag("5i"))),
    );
    let result = eval_in_main(expr);
    match &*result {
        Object::Complex(c) => {
            assert_eq!(c.re, -7.0);
            assert_eq!(c.im, 22.0);
        }
        other => panic!("expected complex, got {}", other.inspect()),
    }
}

#[test]
fn complex_result_through_function_return() {
    let main_decl = func_decl(
        "main",
        None,
        vec![],
        vec![],
        vec![],
        Some(block(vec![ret_stmt(vec![bin(
            paren(bin(lit_int("2"), BinaryOp::Add, lit_imag("3i"))),
            BinaryOp::Mul,
            paren(bin(lit_int("4"), BinaryOp::Add, lit_imag("5i"))),
        )])])),
    );
    let main_info = func_info(MAIN, "main", std::rc::Rc::clone(&main_decl), vec![], vec![]);
    let main_file = file("main.src", "main", vec![], vec![kestrel::syntax::Decl::Func(main_decl)]);
    let mut ev = setup(vec![package("main", MAIN, vec![main_file], vec![], vec![main_info])]);
    let result = apply_main(&mut ev);
    match &*result {
        Object::Complex(c) => assert_eq!((c.re, c.im), (-7.0, 22.0)),
        other => panic!("expected complex, got {}", other.inspect()),
    }
}

#[test]
fn integer_literals_parse_in_base_zero() {
    for (text, want) in [("31", 31), ("0x1F", 31), ("0o37", 31), ("0b11111", 31), ("1_000", 1000)] {
        let result = eval_in_main(lit_int(text));
        match &*result {
            Object::Integer(v) => assert_eq!(*v, want, "literal {text}"),
            other => panic!("expected integer for {text}, got {}", other.inspect()),
        }
    }
}

#[test]
fn hex_and_decimal_spellings_agree() {
    let a = eval_in_main(lit_int("0xFF"));
    let b = eval_in_main(lit_int("255"));
    assert!(matches!((&*a, &*b), (Object::Integer(255), Object::Integer(255))));
}

#[test]
fn literals_overflowing_i64_become_unsigned() {
    let max_i64 = eval_in_main(lit_int("9223372036854775807"));
    assert!(matches!(&*max_i64, Object::Integer(i64::MAX)));

    let beyond = eval_in_main(lit_int("9223372036854775808"));
    assert!(matches!(&*beyond, Object::Unsigned(9_223_372_036_854_775_808)));

    let max_u64 = eval_in_main(lit_int("18446744073709551615"));
    assert!(matches!(&*max_u64, Object::Unsigned(u64::MAX)));
}

#[test]
fn char_literal_is_codepoint() {
    let result = eval_in_main(lit_char("A"));
    assert!(matches!(&*result, Object::Integer(65)));
}

#[test]
fn division_by_zero_stays_symbolic() {
    let result = eval_in_main(bin(lit_int("1"), BinaryOp::Quo, lit_int("0")));
    assert_eq!(result.kind(), ObjectKind::SymbolicPlaceholder);
}

#[test]
fn partially_defined_operators_stay_symbolic() {
    for op in [
        BinaryOp::Rem,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Xor,
        BinaryOp::AndNot,
    ] {
        let result = eval_in_main(bin(lit_int("6"), op, lit_int("3")));
        assert_eq!(result.kind(), ObjectKind::SymbolicPlaceholder, "{op}");
    }
}

#[test]
fn integer_arithmetic_and_comparison() {
    let sum = eval_in_main(bin(lit_int("2"), BinaryOp::Add, lit_int("3")));
    assert!(matches!(&*sum, Object::Integer(5)));

    let lt = eval_in_main(bin(lit_int("2"), BinaryOp::Lt, lit_int("3")));
    assert!(matches!(&*lt, Object::Boolean(true)));
}

#[test]
fn string_concatenation_and_equality() {
    let cat = eval_in_main(bin(lit_str("foo"), BinaryOp::Add, lit_str("bar")));
    match &*cat {
        Object::String(s) => assert_eq!(&**s, "foobar"),
        other => panic!("expected string, got {}", other.inspect()),
    }
    let eq = eval_in_main(bin(lit_str("a"), BinaryOp::Eq, lit_str("a")));
    assert!(matches!(&*eq, Object::Boolean(true)));
    let ne = eval_in_main(bin(lit_str("a"), BinaryOp::Ne, lit_str("b")));
    assert!(matches!(&*ne, Object::Boolean(true)));
}

#[test]
fn unary_operators_on_concrete_values() {
    let not = eval_in_main(un(UnaryOp::Not, ident("true")));
    assert!(matches!(&*not, Object::Boolean(false)));

    let neg = eval_in_main(un(UnaryOp::Neg, lit_int("3")));
    assert!(matches!(&*neg, Object::Integer(-3)));

    let complement = eval_in_main(un(UnaryOp::Xor, lit_int("0")));
    assert!(matches!(&*complement, Object::Integer(-1)));
}

#[test]
fn float_involvement_promotes_to_complex() {
    let result = eval_in_main(bin(lit_float("1.5"), BinaryOp::Add, lit_int("2")));
    match &*result {
        Object::Complex(c) => assert_eq!((c.re, c.im), (3.5, 0.0)),
        other => panic!("expected complex, got {}", other.inspect()),
    }
    // real-only comparison still concrete
    let lt = eval_in_main(bin(lit_float("1.5"), BinaryOp::Lt, lit_int("2")));
    assert!(matches!(&*lt, Object::Boolean(true)));
}

#[test]
fn panic_with_nil_payload_is_never_dereferenced() {
    let result = eval_in_main(call(ident("panic"), vec![ident("nil")]));
    match &*result {
        Object::PanicError(p) => assert!(matches!(&*p.payload, Object::Nil)),
        other => panic!("expected panic marker, got {}", other.inspect()),
    }
}

#[test]
fn address_then_deref_round_trips() {
    // func main() { x := 41; return *(&x) }
    let main_decl = func_decl(
        "main",
        None,
        vec![],
        vec![],
        vec![],
        Some(block(vec![
            define(vec![ident("x")], vec![lit_int("41")]),
            ret_stmt(vec![star(paren(addr(ident("x"))))]),
        ])),
    );
    let main_info = func_info(MAIN, "main", std::rc::Rc::clone(&main_decl), vec![], vec![]);
    let main_file = file("main.src", "main", vec![], vec![kestrel::syntax::Decl::Func(main_decl)]);
    let mut ev = setup(vec![package("main", MAIN, vec![main_file], vec![], vec![main_info])]);
    let result = apply_main(&mut ev);
    assert!(matches!(&*result, Object::Integer(41)));
}
