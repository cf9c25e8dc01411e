#![doc = include_str!("../../../README.md")]

mod accessor;
mod builtins;
mod env;
mod error;
mod evaluator;
mod finalizer;
mod intrinsics;
mod object;
pub mod policy;
mod resolver;
mod resource;
pub mod scanner;
pub mod syntax;
pub mod tracer;
mod universe;

pub use crate::{
    accessor::Lookup,
    env::Env,
    error::{CallFrame, ErrorKind, EvalError},
    evaluator::{CallRecord, Evaluator},
    finalizer::{FinalizeReport, ResolvedDispatch},
    intrinsics::{DefaultIntrinsicFn, IntrinsicFn, IntrinsicRegistry},
    object::{
        AmbiguousSelector, Channel, Complex64, Function, Instance, InstantiatedFunction, Intrinsic,
        MapObject, MultiReturn, Object, ObjectKind, ObjectRef, PackageObject, PanicError,
        Placeholder, Pointer, ReturnValue, Slice, TypeHint, TypeObject, UnresolvedFunction,
        VarInit, Variable,
    },
    policy::ScanPolicy,
    resolver::{PackageLoad, Resolver},
    resource::{
        CancelToken, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_REENTRY, EvalLimits, LimitError,
        MAX_VARIABLE_DEPTH, StepTracker,
    },
    tracer::{EvalTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
    universe::{build as build_universe, error_interface},
};
