//! Evaluation errors as first-class objects.
//!
//! The engine has no exception machinery: an error is an ordinary
//! [`Object`](crate::object::Object) variant that every evaluator function
//! returns unchanged the moment it sees one. An [`EvalError`] captures its
//! message, the source position it arose at, and a snapshot of the call
//! stack at creation time; the snapshot is resolved to `file:line` text
//! only when someone renders it.
//!
//! Errors come in two severities. Ordinary errors kill one evaluation path;
//! the evaluator logs them and keeps exploring sibling branches. Fatal
//! errors (resource bounds, cancellation) abort the whole construct.

use std::{fmt, rc::Rc};

use crate::{
    resource::LimitError,
    syntax::{FileSet, Pos},
};

/// Classification of an [`EvalError`], used to decide whether sibling
/// branches keep evaluating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Identifier not found, bad literal, wrong argument count, invalid
    /// indirect: anything wrong with one evaluation path.
    General,
    /// A lazy variable initializer re-entered itself.
    CyclicVariableInit,
    /// A package load re-entered itself.
    CyclicPackageLoad,
    /// A package could not be scanned.
    PackageLoad,
    /// Call depth exceeded the configured maximum.
    InfiniteRecursion,
    /// The step budget ran out.
    MaxSteps,
    /// Chain of variable indirections exceeded the depth bound.
    VariableDepth,
    /// The host cancelled evaluation.
    Cancelled,
}

impl ErrorKind {
    /// Fatal errors propagate out of branch constructs instead of being
    /// logged and swallowed.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::InfiniteRecursion | Self::MaxSteps | Self::Cancelled)
    }
}

/// One entry of a call-stack snapshot: the callee's qualified name and the
/// position of the call site.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub function: String,
    pub call_pos: Pos,
}

/// An evaluation error with position and captured call stack.
#[derive(Debug, Clone)]
pub struct EvalError {
    message: String,
    kind: ErrorKind,
    pos: Pos,
    frames: Vec<CallFrame>,
}

impl EvalError {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ErrorKind, pos: Pos, frames: Vec<CallFrame>) -> Rc<Self> {
        Rc::new(Self {
            message: message.into(),
            kind,
            pos,
            frames,
        })
    }

    /// Builds an error from an exceeded execution bound.
    #[must_use]
    pub fn from_limit(err: &LimitError, pos: Pos, frames: Vec<CallFrame>) -> Rc<Self> {
        let kind = match err {
            LimitError::Steps { .. } => ErrorKind::MaxSteps,
            LimitError::Depth { .. } => ErrorKind::InfiniteRecursion,
            LimitError::Cancelled => ErrorKind::Cancelled,
        };
        Self::new(err.to_string(), kind, pos, frames)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    #[must_use]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Multi-line rendering with positions resolved through `fset`:
    ///
    /// ```text
    /// a.src:3:9: identifier not found: speak
    ///   in example.com/app.handle (a.src:7:2)
    ///   in example.com/app.main (a.src:12:2)
    /// ```
    #[must_use]
    pub fn render(&self, fset: &FileSet) -> String {
        let mut out = format!("{}: {}", fset.describe(self.pos), self.message);
        for frame in self.frames.iter().rev() {
            out.push_str(&format!(
                "\n  in {} ({})",
                frame.function,
                fset.describe(frame.call_pos)
            ));
        }
        out
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
