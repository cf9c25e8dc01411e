//! `print` and `println`.
//!
//! The engine has no stdout: arguments were already evaluated for their
//! effects, and the rendered line goes to the `tracing` stream where a host
//! subscriber can surface it.

use tracing::trace;

use crate::{
    evaluator::Evaluator,
    object::{Object, ObjectRef},
};

pub(crate) fn print(_ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    trace!(target: "kestrel::builtin", output = %render(args), "print");
    Object::nil()
}

pub(crate) fn println(_ev: &mut Evaluator, args: &[ObjectRef]) -> ObjectRef {
    trace!(target: "kestrel::builtin", output = %render(args), "println");
    Object::nil()
}

fn render(args: &[ObjectRef]) -> String {
    let parts: Vec<String> = args.iter().map(|a| a.inspect()).collect();
    parts.join(" ")
}
