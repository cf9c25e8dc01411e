//! Execution tracing hooks.
//!
//! The evaluator reports key events (node evaluation, call push/pop,
//! recorded interface calls, package loads, swallowed branch errors)
//! through an [`EvalTracer`]. Every hook has a no-op default, so a tracer
//! implements only what it cares about.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Silent default |
//! | [`StderrTracer`] | Human-readable execution log on stderr |
//! | [`RecordingTracer`] | Full event capture for tests and post-mortems |
//!
//! Diagnostics that are *about* the engine (load failures, swallowed branch
//! errors) additionally go through `tracing` so a host subscriber sees them
//! without installing a tracer.

use std::{cell::RefCell, rc::Rc};

use crate::syntax::Pos;

/// One observed execution event, as captured by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A call frame was pushed. `depth` is the stack depth after the push.
    Call { name: String, depth: usize },
    /// A call frame was popped. `depth` is the stack depth after the pop.
    Return { depth: usize },
    /// A method call through an interface-typed receiver was recorded under
    /// `key` (`path.Iface.Method`).
    InterfaceCall { key: String },
    /// A package object was created for `path`.
    PackageLoad { path: String, in_policy: bool },
    /// An error inside one branch of a multi-branch construct was logged
    /// and evaluation of sibling branches continued.
    BranchError { message: String },
}

/// Observation points for symbolic execution.
///
/// All methods default to no-ops; [`NoopTracer`] implements the trait with
/// zero lines. The evaluator calls hooks unconditionally, so the hot ones
/// (`on_step`) should stay cheap.
pub trait EvalTracer: std::fmt::Debug {
    /// Called for every evaluated AST node. `pos` may be `Pos::NONE` for
    /// synthetic nodes.
    fn on_step(&mut self, _pos: Pos) {}

    /// Called when a call frame is pushed. `name` is the callee's
    /// qualified name when known.
    fn on_call(&mut self, _name: &str, _depth: usize) {}

    /// Called when a call frame is popped.
    fn on_return(&mut self, _depth: usize) {}

    /// Called when an interface-typed method call is recorded.
    fn on_interface_call(&mut self, _key: &str) {}

    /// Called when a package object is created.
    fn on_package_load(&mut self, _path: &str, _in_policy: bool) {}

    /// Called when a branch-local error is swallowed so sibling branches
    /// can continue.
    fn on_branch_error(&mut self, _message: &str) {}
}

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Tracer that prints a human-readable log to stderr.
///
/// Calls are shown indented by stack depth:
/// ```text
/// -> example.com/app.main            depth=1
///   -> example.com/app.handle        depth=2
///   <-                               depth=1
/// iface example.com/def.Speaker.Speak
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn indent(depth: usize) -> String {
        "  ".repeat(depth.saturating_sub(1))
    }
}

impl EvalTracer for StderrTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        eprintln!("{}-> {name}  depth={depth}", Self::indent(depth));
    }

    fn on_return(&mut self, depth: usize) {
        eprintln!("{}<-  depth={depth}", Self::indent(depth + 1));
    }

    fn on_interface_call(&mut self, key: &str) {
        eprintln!("iface {key}");
    }

    fn on_package_load(&mut self, path: &str, in_policy: bool) {
        let marker = if in_policy { "scan" } else { "skip" };
        eprintln!("pkg [{marker}] {path}");
    }

    fn on_branch_error(&mut self, message: &str) {
        eprintln!("branch error (continuing): {message}");
    }
}

/// Tracer that records every event for later inspection.
///
/// The event log is behind a shared handle: clone the tracer before handing
/// it to the evaluator and read `events()` from the clone afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    events: Rc<RefCell<Vec<TraceEvent>>>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    /// Drops the recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: TraceEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl EvalTracer for RecordingTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        self.push(TraceEvent::Call {
            name: name.to_owned(),
            depth,
        });
    }

    fn on_return(&mut self, depth: usize) {
        self.push(TraceEvent::Return { depth });
    }

    fn on_interface_call(&mut self, key: &str) {
        self.push(TraceEvent::InterfaceCall { key: key.to_owned() });
    }

    fn on_package_load(&mut self, path: &str, in_policy: bool) {
        self.push(TraceEvent::PackageLoad {
            path: path.to_owned(),
            in_policy,
        });
    }

    fn on_branch_error(&mut self, message: &str) {
        self.push(TraceEvent::BranchError {
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_tracer_captures_in_order() {
        let mut tracer = RecordingTracer::new();
        let handle = tracer.clone();
        tracer.on_call("a.f", 1);
        tracer.on_interface_call("a.I.M");
        tracer.on_return(0);
        assert_eq!(
            handle.events(),
            vec![
                TraceEvent::Call {
                    name: "a.f".into(),
                    depth: 1
                },
                TraceEvent::InterfaceCall { key: "a.I.M".into() },
                TraceEvent::Return { depth: 0 },
            ]
        );
    }
}
