//! The AST-dispatch evaluator.
//!
//! `eval_expr`/`eval_stmt` walk syntax trees and produce [`Object`]s. The
//! discipline is uniform across every node kind:
//!
//! - concrete results are computed only when trivially known; everything
//!   else becomes a typed [`Placeholder`],
//! - an `Object::Error` returned by any sub-evaluation is returned
//!   unchanged (no unwinding machinery exists),
//! - control flow is explored across **all** branches (both arms of an
//!   `if`, every `case` of a switch, every `select` clause) because the
//!   goal is call-graph coverage, not concrete-execution fidelity. Errors
//!   inside one branch are logged and the siblings still evaluate, unless
//!   the error is fatal (recursion, step budget, cancellation).
//!
//! Function application manages the call stack, binds parameters as fresh
//! [`Variable`] cells with resolved static types (which is what makes
//! interface-call recording fire inside callees), enforces the depth and
//! re-entry bounds, and invokes the default intrinsic for every call.

use std::{
    hash::{Hash, Hasher},
    rc::Rc,
};

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{
    accessor::{self, Lookup},
    error::{CallFrame, ErrorKind, EvalError},
    env::Env,
    intrinsics::{DefaultIntrinsicFn, IntrinsicFn, IntrinsicRegistry},
    object::{
        Complex64, Function, FunctionBuilder, InstantiatedFunction, MultiReturn, Object, ObjectRef,
        PackageObject, Placeholder, Pointer, ReturnValue, Slice, TypeHint, TypeObject, VarInit,
        Variable,
    },
    policy::ScanPolicy,
    resolver::{PackageLoad, Resolver},
    resource::{CancelToken, EvalLimits, StepTracker, MAX_VARIABLE_DEPTH},
    scanner::{FieldType, FunctionInfo, MethodSig, Scanner, TypeDeclKind, TypeInfo, is_exported},
    syntax::{
        AssignOp, BinaryOp, Block, BranchKind, CaseClause, CommClause, Decl, DeclKind, Expr,
        ExprKind, File, FileSet, GenDecl, Lit, LitKind, ParamDecl, Pos, Spec, Stmt, StmtKind,
        UnaryOp,
    },
    tracer::{EvalTracer, NoopTracer},
    universe,
};

/// One interface call site's accumulated observations.
#[derive(Debug)]
pub(crate) struct InterfaceCall {
    pub iface: Rc<TypeInfo>,
    pub method: String,
    pub receivers: Vec<ObjectRef>,
}

/// Host-facing summary of one recorded interface call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CallRecord {
    /// `import/path.Iface.Method`.
    pub key: String,
    /// Number of receiver objects observed at the call sites.
    pub receivers: usize,
}

/// The symbolic execution engine.
///
/// Construct with a scanner and a scan policy, optionally adjust limits,
/// tracer, and cancellation, register intrinsics, then drive execution with
/// [`Evaluator::package`], [`Evaluator::eval_file`], and
/// [`Evaluator::apply`]. After the last entry point, [`finalize`]
/// (in the `finalizer` module) resolves recorded interface calls.
///
/// [`finalize`]: Evaluator::finalize
pub struct Evaluator {
    scanner: Rc<dyn Scanner>,
    pub(crate) resolver: Resolver,
    universe: Rc<Env>,
    pub(crate) intrinsics: IntrinsicRegistry,
    pub(crate) tracer: Box<dyn EvalTracer>,
    tracker: StepTracker,
    cancel: CancelToken,
    call_stack: Vec<CallFrame>,
    current_pos: Pos,
    /// Recorded interface calls, keyed `path.Iface.Method`, insertion order.
    pub(crate) iface_calls: IndexMap<String, InterfaceCall>,
    /// Packages whose scopes are already populated.
    initialized: AHashSet<String>,
    /// Lazy variable initializers currently evaluating (`path::name`).
    vars_in_progress: AHashSet<String>,
    /// Active structurally-equal re-entries per call site.
    reentry: AHashMap<(u32, u64), u32>,
    /// Memoized call results keyed by (declaration position, arg shape).
    memo: AHashMap<(u32, u64), ObjectRef>,
    /// Per-package import lookup tables, merged over all files.
    import_maps: AHashMap<String, Rc<AHashMap<String, String>>>,
}

impl Evaluator {
    #[must_use]
    pub fn new(scanner: Rc<dyn Scanner>, policy: ScanPolicy) -> Self {
        let universe = universe::build();
        let resolver = Resolver::new(Rc::clone(&scanner), policy, Rc::clone(&universe));
        Self {
            scanner,
            resolver,
            universe,
            intrinsics: IntrinsicRegistry::new(),
            tracer: Box::new(NoopTracer),
            tracker: StepTracker::new(EvalLimits::default()),
            cancel: CancelToken::new(),
            call_stack: Vec::new(),
            current_pos: Pos::NONE,
            iface_calls: IndexMap::new(),
            initialized: AHashSet::new(),
            vars_in_progress: AHashSet::new(),
            reentry: AHashMap::new(),
            memo: AHashMap::new(),
            import_maps: AHashMap::new(),
        }
    }

    /// Replaces the execution bounds. Resets the step counter.
    #[must_use]
    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.tracker = StepTracker::new(limits);
        self
    }

    #[must_use]
    pub fn with_tracer(mut self, tracer: Box<dyn EvalTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    // ------------------------------------------------------------------
    // Host-facing surface
    // ------------------------------------------------------------------

    /// Registers an intrinsic under a qualified key, replacing normal
    /// dispatch for that callable.
    pub fn register_intrinsic(&mut self, key: impl Into<String>, func: IntrinsicFn) {
        self.intrinsics.register(key, func);
    }

    /// Installs the default intrinsic invoked for every call.
    pub fn set_default_intrinsic(&mut self, func: DefaultIntrinsicFn) {
        self.intrinsics.set_default(func);
    }

    /// Opens a scoped intrinsic override frame.
    pub fn push_intrinsics(&mut self) {
        self.intrinsics.push();
    }

    /// Closes the top intrinsic override frame.
    pub fn pop_intrinsics(&mut self) {
        self.intrinsics.pop();
    }

    #[must_use]
    pub fn file_set(&self) -> Rc<FileSet> {
        self.scanner.file_set()
    }

    #[must_use]
    pub fn universe(&self) -> &Rc<Env> {
        &self.universe
    }

    /// Nodes evaluated so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.tracker.steps()
    }

    /// Position of the node currently being evaluated. Used by intrinsics
    /// to attach errors and panics to the call site.
    #[must_use]
    pub fn current_pos(&self) -> Pos {
        self.current_pos
    }

    /// Summaries of the recorded interface calls, in recording order.
    #[must_use]
    pub fn interface_calls(&self) -> Vec<CallRecord> {
        self.iface_calls
            .iter()
            .map(|(key, call)| CallRecord {
                key: key.clone(),
                receivers: call.receivers.len(),
            })
            .collect()
    }

    /// Loads a package by import path and populates its scope (when it is
    /// in policy). Out-of-policy packages load as opaque objects.
    pub fn package(&mut self, path: &str) -> Result<Rc<PackageObject>, Rc<EvalError>> {
        match self.resolver.resolve_package(path, self.tracer.as_mut()) {
            PackageLoad::Loaded(pkg) => {
                self.populate_package(&pkg);
                Ok(pkg)
            }
            PackageLoad::Cycle(path) => Err(EvalError::new(
                format!("cyclic package load: {path}"),
                ErrorKind::CyclicPackageLoad,
                self.current_pos,
                self.stack_snapshot(),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Package population
    // ------------------------------------------------------------------

    fn populate_package(&mut self, pkg: &Rc<PackageObject>) {
        if self.initialized.contains(&pkg.path) {
            return;
        }
        let Some(info) = pkg.scanned_info() else {
            return;
        };
        self.initialized.insert(pkg.path.clone());
        for file in &info.files {
            let result = self.eval_file(file, pkg);
            if let Object::Error(err) = &*result {
                warn!(pkg = %pkg.path, error = %err, "package population error");
            }
        }
    }

    /// Evaluates a file's declarations into the package scope, in
    /// population order: imports, constants, types, variables (lazily),
    /// functions.
    pub fn eval_file(&mut self, file: &Rc<File>, pkg: &Rc<PackageObject>) -> ObjectRef {
        for spec in &file.imports {
            if let PackageLoad::Loaded(imported) =
                self.resolver.resolve_package(&spec.path, self.tracer.as_mut())
            {
                pkg.env
                    .set_local(spec.local_name(), Rc::new(Object::Package(imported)));
            } else {
                warn!(path = %spec.path, "cyclic import skipped");
            }
        }

        for decl in &file.decls {
            if let Decl::Gen(gd) = decl
                && gd.kind == DeclKind::Const
            {
                self.declare_constants(gd, &pkg.env, pkg);
            }
        }
        for decl in &file.decls {
            if let Decl::Gen(gd) = decl
                && gd.kind == DeclKind::Type
            {
                self.declare_types(gd, pkg);
            }
        }
        for decl in &file.decls {
            if let Decl::Gen(gd) = decl
                && gd.kind == DeclKind::Var
            {
                self.declare_package_vars(gd, pkg);
            }
        }
        for decl in &file.decls {
            if let Decl::Func(fd) = decl {
                if fd.recv.is_some() {
                    continue; // methods are reached through the accessor
                }
                let obj = match pkg.scanned_info().and_then(|info| info.lookup_function(&fd.name)) {
                    Some(func_info) => self.resolver.resolve_function(pkg, &func_info),
                    None => Rc::new(Object::Function(
                        FunctionBuilder {
                            name: Some(fd.name.clone()),
                            decl: Some(Rc::clone(fd)),
                            type_params: fd.func_type.type_params.clone(),
                            params: fd.func_type.params.clone(),
                            results: fd.func_type.results.clone(),
                            body: fd.body.clone(),
                            env: Rc::clone(&pkg.env),
                            pkg: Rc::clone(pkg),
                            info: None,
                        }
                        .build(),
                    )),
                };
                pkg.env.set_local(&fd.name, obj);
            }
        }
        Object::nil()
    }

    fn declare_constants(&mut self, gd: &Rc<GenDecl>, env: &Rc<Env>, pkg: &Rc<PackageObject>) {
        for spec in &gd.specs {
            let Spec::Value(vs) = spec else { continue };
            let declared = vs
                .type_expr
                .as_ref()
                .map(|te| self.hint_of(te, pkg))
                .unwrap_or_default();
            for (i, name) in vs.names.iter().enumerate() {
                if name == "_" {
                    continue;
                }
                let value = match vs.values.get(i) {
                    Some(expr) => {
                        let v = self.eval_expr(expr, env, pkg);
                        let v = self.force(&v);
                        if v.is_error() {
                            debug!(name = %name, "constant initializer failed; binding placeholder");
                            Object::typed_placeholder("constant with failed initializer", declared.clone())
                        } else {
                            v
                        }
                    }
                    // `iota`-style repetition without an expression
                    None => Object::typed_placeholder("constant without initializer", declared.clone()),
                };
                env.set_local(
                    name,
                    Rc::new(Object::Variable(Variable::with_value(
                        name,
                        value,
                        declared.clone(),
                        Rc::clone(env),
                        Some(Rc::clone(pkg)),
                    ))),
                );
            }
        }
    }

    fn declare_types(&mut self, gd: &Rc<GenDecl>, pkg: &Rc<PackageObject>) {
        for spec in &gd.specs {
            let Spec::Type(ts) = spec else { continue };
            let info = pkg
                .scanned_info()
                .and_then(|info| info.lookup_type(&ts.name))
                .unwrap_or_else(|| TypeInfo::unresolved(&pkg.path, &ts.name));
            pkg.env.set_local(
                &ts.name,
                Rc::new(Object::Type(Rc::new(TypeObject {
                    name: ts.name.clone(),
                    info,
                }))),
            );
        }
    }

    fn declare_package_vars(&mut self, gd: &Rc<GenDecl>, pkg: &Rc<PackageObject>) {
        for spec in &gd.specs {
            let Spec::Value(vs) = spec else { continue };
            let declared = vs
                .type_expr
                .as_ref()
                .map(|te| self.hint_of(te, pkg))
                .unwrap_or_default();
            let single_init = vs.values.len() == 1 && vs.names.len() > 1;
            for (i, name) in vs.names.iter().enumerate() {
                if name == "_" {
                    continue;
                }
                let initializer = if single_init {
                    vs.values.first().map(|expr| VarInit {
                        expr: Rc::clone(expr),
                        index: i,
                        count: vs.names.len(),
                    })
                } else {
                    vs.values.get(i).map(|expr| VarInit {
                        expr: Rc::clone(expr),
                        index: 0,
                        count: 1,
                    })
                };
                pkg.env.set_local(
                    name,
                    Rc::new(Object::Variable(Variable::lazy(
                        name,
                        initializer,
                        declared.clone(),
                        Rc::clone(&pkg.env),
                        Some(Rc::clone(pkg)),
                    ))),
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Error and bookkeeping helpers
    // ------------------------------------------------------------------

    fn stack_snapshot(&self) -> Vec<CallFrame> {
        self.call_stack.clone()
    }

    pub(crate) fn new_error(&self, pos: Pos, message: impl Into<String>) -> ObjectRef {
        self.new_error_kind(ErrorKind::General, pos, message)
    }

    pub(crate) fn new_error_kind(
        &self,
        kind: ErrorKind,
        pos: Pos,
        message: impl Into<String>,
    ) -> ObjectRef {
        let pos = if pos.is_valid() { pos } else { self.current_pos };
        Rc::new(Object::Error(EvalError::new(
            message,
            kind,
            pos,
            self.stack_snapshot(),
        )))
    }

    /// Error for a builtin invoked with the wrong number of arguments.
    pub(crate) fn argument_count_error(&self, name: &str, want: usize, got: usize) -> ObjectRef {
        self.new_error(
            self.current_pos,
            format!("wrong number of arguments to {name}: want {want}, got {got}"),
        )
    }

    /// Counts a node against the step budget; a `Some` result is the fatal
    /// error to return.
    fn step(&mut self, pos: Pos) -> Option<ObjectRef> {
        if pos.is_valid() {
            self.current_pos = pos;
        }
        self.tracer.on_step(pos);
        match self.tracker.on_step() {
            Ok(()) => None,
            Err(err) => Some(Rc::new(Object::Error(EvalError::from_limit(
                &err,
                pos,
                self.stack_snapshot(),
            )))),
        }
    }

    /// Builds the merged import lookup for a package, cached per path.
    fn import_map(&mut self, pkg: &Rc<PackageObject>) -> Rc<AHashMap<String, String>> {
        if let Some(map) = self.import_maps.get(&pkg.path) {
            return Rc::clone(map);
        }
        let mut map = AHashMap::new();
        if let Some(info) = pkg.scanned_info() {
            for file in &info.files {
                for spec in &file.imports {
                    map.insert(spec.local_name().to_owned(), spec.path.clone());
                }
            }
        }
        let map = Rc::new(map);
        self.import_maps.insert(pkg.path.clone(), Rc::clone(&map));
        map
    }

    /// Converts a type expression to a [`FieldType`] in `pkg`'s context.
    pub(crate) fn field_type_of(&mut self, expr: &Rc<Expr>, pkg: &Rc<PackageObject>) -> Rc<FieldType> {
        let imports = self.import_map(pkg);
        match pkg.scanned_info() {
            Some(info) => {
                let scanner = Rc::clone(&self.scanner);
                scanner.type_info_from_expr(expr, &info, &imports)
            }
            None => FieldType::unknown(),
        }
    }

    /// Resolves a type expression to a full [`TypeHint`].
    pub(crate) fn hint_of(&mut self, expr: &Rc<Expr>, pkg: &Rc<PackageObject>) -> TypeHint {
        let ft = self.field_type_of(expr, pkg);
        let info = self.resolver.resolve_type(&ft, self.tracer.as_mut());
        TypeHint::new(Some(info), Some(ft))
    }

    /// Resolves a variable or ambiguous selector to its underlying object,
    /// evaluating lazy initializers on first read.
    pub fn force(&mut self, obj: &ObjectRef) -> ObjectRef {
        let mut current = Rc::clone(obj);
        for _ in 0..MAX_VARIABLE_DEPTH {
            let next = match &*current {
                Object::Variable(v) => {
                    let v = Rc::clone(v);
                    if !v.is_evaluated()
                        && let Some(err) = self.eval_variable_initializer(&v)
                    {
                        return err;
                    }
                    v.value()
                }
                Object::AmbiguousSelector(a) => Object::typed_placeholder(
                    format!("assuming field for ambiguous selector .{}", a.selector),
                    TypeHint::none(),
                ),
                _ => return current,
            };
            current = next;
        }
        self.new_error_kind(
            ErrorKind::VariableDepth,
            self.current_pos,
            "variable evaluation depth limit exceeded",
        )
    }

    /// Runs a lazy initializer. Returns `Some(error)` only for cyclic
    /// initialization; other failures are stored as the variable's value.
    fn eval_variable_initializer(&mut self, v: &Rc<Variable>) -> Option<ObjectRef> {
        let pkg_path = v.decl_pkg.as_ref().map_or("", |p| p.path.as_str());
        let key = format!("{pkg_path}::{}", v.name);
        if self.vars_in_progress.contains(&key) {
            return Some(self.new_error_kind(
                ErrorKind::CyclicVariableInit,
                self.current_pos,
                format!("cyclic variable initialization: {}", v.name),
            ));
        }
        let Some(init) = v.initializer.clone() else {
            v.set_value(Object::typed_placeholder(
                format!("zero value of {}", v.declared.describe()),
                v.declared.clone(),
            ));
            return None;
        };
        self.vars_in_progress.insert(key.clone());
        let pkg = v
            .decl_pkg
            .clone()
            .unwrap_or_else(|| PackageObject::new("", "", Rc::clone(&v.decl_env)));
        let result = self.eval_expr(&init.expr, &v.decl_env, &pkg);
        let result = self.force(&result);
        self.vars_in_progress.remove(&key);

        let value = if init.count > 1 {
            match &*result {
                Object::MultiReturn(mr) => mr
                    .values
                    .get(init.index)
                    .map_or_else(|| Object::placeholder("missing initializer value"), Rc::clone),
                _ if result.is_error() => result,
                _ if init.index == 0 => result,
                _ => Object::placeholder("missing initializer value"),
            }
        } else {
            result
        };
        self.record_assignment(v, &value);
        v.set_value(value);
        None
    }

    /// Accumulates the concrete type of `value` into `v`'s possible-types
    /// set when `v` is interface-typed. The static type is never touched.
    fn record_assignment(&mut self, v: &Rc<Variable>, value: &ObjectRef) {
        if !v.declared.is_interface() {
            return;
        }
        let hint = value.type_hint();
        if let Some(info) = hint.type_info
            && !info.is_interface()
            && !info.unresolved
        {
            v.record_possible_type(info);
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn eval_expr(&mut self, expr: &Rc<Expr>, env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        if let Some(err) = self.step(expr.pos) {
            return err;
        }
        match &expr.kind {
            ExprKind::Ident(name) => self.eval_ident(name, expr.pos, env),
            ExprKind::BasicLit(lit) => self.eval_literal(lit, expr.pos),
            ExprKind::Selector { x, sel } => self.eval_selector(x, sel, expr.pos, env, pkg),
            ExprKind::CompositeLit { type_expr, elts } => {
                self.eval_composite_lit(type_expr.as_ref(), elts, env, pkg)
            }
            ExprKind::KeyValue { key, value } => {
                if key.as_ident().is_none() {
                    let k = self.eval_expr(key, env, pkg);
                    if k.is_fatal_error() {
                        return k;
                    }
                }
                self.eval_expr(value, env, pkg)
            }
            ExprKind::Call { func, args, .. } => self.eval_call(func, args, expr.pos, env, pkg),
            ExprKind::Unary { op, x } => self.eval_unary(*op, x, env, pkg),
            ExprKind::Binary { x, op, y } => self.eval_binary(x, *op, y, env, pkg),
            ExprKind::Star(x) => self.eval_star(x, expr.pos, env, pkg),
            ExprKind::FuncLit { func_type, body } => Rc::new(Object::Function(
                FunctionBuilder {
                    name: None,
                    decl: None,
                    type_params: func_type.type_params.clone(),
                    params: func_type.params.clone(),
                    results: func_type.results.clone(),
                    body: Some(Rc::clone(body)),
                    env: Rc::clone(env),
                    pkg: Rc::clone(pkg),
                    info: None,
                }
                .build(),
            )),
            ExprKind::ArrayType { .. }
            | ExprKind::MapType { .. }
            | ExprKind::ChanType { .. }
            | ExprKind::FuncType(_)
            | ExprKind::InterfaceType { .. }
            | ExprKind::StructType { .. } => {
                let ft = self.field_type_of(expr, pkg);
                Object::typed_placeholder("type expression", TypeHint::of_field(ft))
            }
            ExprKind::Index { x, index } => self.eval_index(x, std::slice::from_ref(index), env, pkg),
            ExprKind::IndexList { x, indices } => self.eval_index(x, indices, env, pkg),
            ExprKind::Slice { x, low, high, max } => {
                for bound in [low, high, max].into_iter().flatten() {
                    let b = self.eval_expr(bound, env, pkg);
                    if b.is_fatal_error() {
                        return b;
                    }
                }
                let value = self.eval_expr(x, env, pkg);
                let value = self.force(&value);
                if value.is_error() {
                    return value;
                }
                match &*value {
                    Object::Slice(_) | Object::String(_) => Rc::clone(&value),
                    _ => Object::typed_placeholder("slice of symbolic value", value.type_hint()),
                }
            }
            ExprKind::Paren(inner) => self.eval_expr(inner, env, pkg),
            ExprKind::TypeAssert { x, type_expr } => {
                let value = self.eval_expr(x, env, pkg);
                if value.is_error() {
                    return value;
                }
                match type_expr {
                    Some(te) => {
                        let hint = self.hint_of(te, pkg);
                        Object::typed_placeholder("type assertion result", hint)
                    }
                    None => Object::placeholder("type switch guard"),
                }
            }
            ExprKind::Ellipsis(_) => Object::placeholder("ellipsis expression"),
        }
    }

    fn eval_ident(&mut self, name: &str, pos: Pos, env: &Rc<Env>) -> ObjectRef {
        match env.get(name) {
            Some(obj) => obj,
            None => self.new_error(pos, format!("identifier not found: {name}")),
        }
    }

    fn eval_literal(&mut self, lit: &Lit, pos: Pos) -> ObjectRef {
        match lit.kind {
            LitKind::Int => self.parse_int_literal(&lit.text, pos),
            LitKind::Float => match lit.text.replace('_', "").parse::<f64>() {
                Ok(v) => Object::float(v),
                Err(_) => self.new_error(pos, format!("invalid float literal: {}", lit.text)),
            },
            LitKind::Imag => {
                let digits = lit.text.trim_end_matches('i').replace('_', "");
                match digits.parse::<f64>() {
                    Ok(v) => Object::complex(Complex64::new(0.0, v)),
                    Err(_) => self.new_error(pos, format!("invalid imaginary literal: {}", lit.text)),
                }
            }
            LitKind::Char => match lit.text.chars().next() {
                Some(c) => Object::integer(i64::from(u32::from(c))),
                None => self.new_error(pos, "empty character literal"),
            },
            LitKind::Str => Object::string(&lit.text),
        }
    }

    /// Base-0 integer parsing: `0x`, `0o`, `0b` prefixes and underscores
    /// accepted. A literal that overflows i64 but fits u64 becomes an
    /// unsigned integer.
    fn parse_int_literal(&mut self, text: &str, pos: Pos) -> ObjectRef {
        let cleaned = text.replace('_', "");
        let (digits, radix) = match cleaned.as_bytes() {
            [b'0', b'x' | b'X', ..] => (&cleaned[2..], 16),
            [b'0', b'o' | b'O', ..] => (&cleaned[2..], 8),
            [b'0', b'b' | b'B', ..] => (&cleaned[2..], 2),
            _ => (cleaned.as_str(), 10),
        };
        if let Ok(v) = i64::from_str_radix(digits, radix) {
            return Object::integer(v);
        }
        if let Ok(v) = u64::from_str_radix(digits, radix) {
            return Object::unsigned(v);
        }
        self.new_error(pos, format!("invalid integer literal: {text}"))
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        x: &Rc<Expr>,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        if op == UnaryOp::And {
            // address-of: the operand is not forced, so identifiers stay
            // addressable as variables
            let pointee = self.eval_expr(x, env, pkg);
            if pointee.is_error() {
                return pointee;
            }
            let pointee_hint = pointee.type_hint();
            let hint = TypeHint::new(
                pointee_hint.type_info.clone(),
                pointee_hint.field_type.clone().map(FieldType::pointer_to),
            );
            return Rc::new(Object::Pointer(Rc::new(Pointer { pointee, hint })));
        }

        let value = self.eval_expr(x, env, pkg);
        let value = self.force(&value);
        if value.is_error() {
            return value;
        }
        match (op, &*value) {
            (UnaryOp::Not, Object::Boolean(b)) => Object::boolean(!b),
            (UnaryOp::Neg, Object::Integer(v)) => Object::integer(v.wrapping_neg()),
            (UnaryOp::Neg, Object::Float(v)) => Object::float(-v),
            (UnaryOp::Neg, Object::Complex(v)) => Object::complex(-*v),
            (UnaryOp::Plus, Object::Integer(_) | Object::Unsigned(_) | Object::Float(_) | Object::Complex(_)) => {
                Rc::clone(&value)
            }
            (UnaryOp::Xor, Object::Integer(v)) => Object::integer(!v),
            (UnaryOp::Recv, Object::Channel(ch)) => {
                let hint = TypeHint::new(
                    ch.elem
                        .as_ref()
                        .map(|elem| self.resolver.resolve_type(elem, self.tracer.as_mut())),
                    ch.elem.clone(),
                );
                Object::typed_placeholder("value received from channel", hint)
            }
            (UnaryOp::Recv, _) => Object::placeholder("receive from symbolic channel"),
            _ => Object::typed_placeholder(
                format!("unary {op:?} of symbolic value"),
                value.type_hint(),
            ),
        }
    }

    fn eval_star(&mut self, x: &Rc<Expr>, pos: Pos, env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        let value = self.eval_expr(x, env, pkg);
        let value = self.force(&value);
        if value.is_error() {
            return value;
        }
        match &*value {
            Object::Pointer(p) => self.force(&p.pointee),
            // `*T` in type position
            Object::Type(t) => {
                let ft = FieldType::pointer_to(
                    t.info
                        .underlying
                        .clone()
                        .unwrap_or_else(|| FieldType::named("", &t.info.pkg_path, &t.info.name)),
                );
                Object::typed_placeholder(
                    "pointer type expression",
                    TypeHint::new(Some(Rc::clone(&t.info)), Some(ft)),
                )
            }
            Object::Nil => self.new_error(pos, "invalid indirect of nil"),
            Object::SymbolicPlaceholder(p) => {
                // dereference of an unresolved-type pointer: typed to the
                // pointee when the reference is resolvable
                let elem = p.hint.field_type.as_ref().and_then(|ft| {
                    if ft.is_pointer { ft.elem.clone() } else { Some(Rc::clone(ft)) }
                });
                match elem {
                    Some(elem) => {
                        let info = self.resolver.resolve_type(&elem, self.tracer.as_mut());
                        Object::typed_placeholder(
                            format!("dereference of symbolic pointer to {}", elem.type_string()),
                            TypeHint::new(Some(info), Some(elem)),
                        )
                    }
                    None => Object::placeholder("dereference of symbolic pointer"),
                }
            }
            _ => Object::typed_placeholder("dereference of symbolic value", value.type_hint()),
        }
    }

    fn eval_index(
        &mut self,
        x: &Rc<Expr>,
        indices: &[Rc<Expr>],
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let base = self.eval_expr(x, env, pkg);
        let base = self.force(&base);
        if base.is_error() {
            return base;
        }
        // generic instantiation when the base is callable
        match &*base {
            Object::Function(f) => return self.instantiate(Rc::clone(f), indices, pkg),
            Object::SymbolicPlaceholder(p) if p.underlying_func.is_some() => {
                // instantiating an out-of-policy generic: stays symbolic
                return Object::typed_placeholder(
                    "instantiation of out-of-policy generic function",
                    base.type_hint(),
                );
            }
            _ => {}
        }
        for index in indices {
            let i = self.eval_expr(index, env, pkg);
            if i.is_fatal_error() {
                return i;
            }
        }
        match &*base {
            Object::Slice(s) => {
                let hint = TypeHint::new(
                    s.elem
                        .as_ref()
                        .map(|elem| self.resolver.resolve_type(elem, self.tracer.as_mut())),
                    s.elem.clone(),
                );
                Object::typed_placeholder("slice element", hint)
            }
            Object::Map(m) => {
                let hint = TypeHint::new(
                    m.value
                        .as_ref()
                        .map(|v| self.resolver.resolve_type(v, self.tracer.as_mut())),
                    m.value.clone(),
                );
                Object::typed_placeholder("map value", hint)
            }
            Object::String(_) => Object::typed_placeholder(
                "string byte",
                TypeHint::of_field(FieldType::builtin("byte")),
            ),
            _ => Object::typed_placeholder("index of symbolic value", TypeHint::none()),
        }
    }

    fn instantiate(
        &mut self,
        func: Rc<Function>,
        indices: &[Rc<Expr>],
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let names = flatten_param_names(&func.type_params);
        let mut type_args = Vec::with_capacity(indices.len());
        let mut param_map = IndexMap::new();
        for (i, ix) in indices.iter().enumerate() {
            let hint = self.hint_of(ix, pkg);
            let info = hint
                .type_info
                .unwrap_or_else(|| TypeInfo::unresolved("", "<type argument>"));
            if let Some(name) = names.get(i) {
                param_map.insert(name.clone(), Rc::clone(&info));
            }
            type_args.push(info);
        }
        Rc::new(Object::InstantiatedFunction(Rc::new(InstantiatedFunction {
            func,
            type_args,
            param_map,
        })))
    }

    fn eval_composite_lit(
        &mut self,
        type_expr: Option<&Rc<Expr>>,
        elts: &[Rc<Expr>],
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        for elt in elts {
            let v = self.eval_expr(elt, env, pkg);
            if v.is_fatal_error() {
                return v;
            }
            if let Object::Error(err) = &*v {
                self.tracer.on_branch_error(err.message());
                warn!(error = %err, "composite literal element error");
            }
        }
        let Some(te) = type_expr else {
            return Object::placeholder("untyped composite literal");
        };
        let ft = self.field_type_of(te, pkg);
        if ft.is_slice {
            return Rc::new(Object::Slice(Rc::new(Slice {
                elem: ft.elem.clone(),
                hint: TypeHint::of_field(ft),
            })));
        }
        if ft.is_map {
            return Rc::new(Object::Map(Rc::new(crate::object::MapObject {
                key: ft.key.clone(),
                value: ft.elem.clone(),
                hint: TypeHint::of_field(ft),
            })));
        }
        self.resolver.resolve_composite_lit(&ft, self.tracer.as_mut())
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    fn eval_selector(
        &mut self,
        x: &Rc<Expr>,
        sel: &str,
        pos: Pos,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let receiver = self.eval_expr(x, env, pkg);
        if receiver.is_error() {
            return receiver;
        }

        // interface method call through a statically interface-typed
        // variable: record and answer with a method placeholder
        if let Object::Variable(v) = &*receiver
            && v.declared.is_interface()
            && let Some(iface) = v.declared.type_info.clone()
            && let Some(sig) = iface.interface_method(sel).cloned()
        {
            return self.record_interface_call(&iface, &sig, Rc::clone(&receiver));
        }

        let forced = self.force(&receiver);
        if forced.is_error() {
            return forced;
        }

        match &*forced {
            Object::Package(target) => self.eval_package_member(&Rc::clone(target), sel, pos),
            Object::Type(t) => self.eval_method_expression(&Rc::clone(&t.info), sel, pos),
            _ => self.eval_member_access(&forced, sel, pos),
        }
    }

    fn record_interface_call(
        &mut self,
        iface: &Rc<TypeInfo>,
        sig: &MethodSig,
        receiver: ObjectRef,
    ) -> ObjectRef {
        let key = format!("{}.{}", iface.qualified_name(), sig.name);
        self.tracer.on_interface_call(&key);
        let entry = self
            .iface_calls
            .entry(key)
            .or_insert_with(|| InterfaceCall {
                iface: Rc::clone(iface),
                method: sig.name.clone(),
                receivers: Vec::new(),
            });
        entry.receivers.push(Rc::clone(&receiver));
        Placeholder::new(format!(
            "interface method {}.{}",
            iface.qualified_name(),
            sig.name
        ))
        .with_method(sig.clone())
        .with_receiver(receiver)
        .into_object()
    }

    fn eval_package_member(&mut self, target: &Rc<PackageObject>, sel: &str, pos: Pos) -> ObjectRef {
        self.populate_package(target);
        if let Some(obj) = target.env.get(sel) {
            return obj;
        }
        if target.is_scanned() {
            // scanned but unknown: maybe a method-only name or a scan gap
            return self.new_error(pos, format!("undefined: {}.{sel}", target.name));
        }
        if !is_exported(sel) {
            return self.new_error(
                pos,
                format!("cannot access unexported {}.{sel} outside policy", target.name),
            );
        }
        // the member's kind is unknowable without a scan; an unresolved
        // function is the most useful assumption, since it is callable,
        // carries the name as an intrinsic key, and degrades to a typed
        // placeholder everywhere else
        let ft = FieldType::named(&target.name, &target.path, sel);
        let member = Rc::new(Object::UnresolvedFunction(Rc::new(
            crate::object::UnresolvedFunction {
                pkg_path: target.path.clone(),
                name: sel.to_owned(),
                hint: TypeHint::of_field(ft),
            },
        )));
        // cache so repeated access observes one object
        target.env.set_local(sel, Rc::clone(&member));
        member
    }

    /// `T.Method` / `(*T).Method`: the unbound method as a function value.
    fn eval_method_expression(&mut self, info: &Rc<TypeInfo>, sel: &str, pos: Pos) -> ObjectRef {
        match accessor::find_field_or_method(&mut self.resolver, info, sel, true, self.tracer.as_mut()) {
            Lookup::Method { info: func_info, owner } => self.method_object(&owner, &func_info),
            Lookup::InterfaceMethod { sig, owner } => Placeholder::new(format!(
                "method expression {}.{}",
                owner.qualified_name(),
                sig.name
            ))
            .with_method(sig)
            .into_object(),
            Lookup::Field { .. } | Lookup::NotFound => {
                self.new_error(pos, format!("type {} has no method {sel}", info.qualified_name()))
            }
            Lookup::Ambiguous { candidates } => self.new_error(
                pos,
                format!("ambiguous selector {sel}: {}", candidates.join(", ")),
            ),
            Lookup::Unresolved => Object::placeholder(format!(
                "method expression on partially resolved type {}",
                info.qualified_name()
            )),
        }
    }

    fn method_object(&mut self, owner: &Rc<TypeInfo>, func_info: &Rc<FunctionInfo>) -> ObjectRef {
        match self
            .resolver
            .resolve_package(&owner.pkg_path, self.tracer.as_mut())
        {
            PackageLoad::Loaded(owner_pkg) => self.resolver.resolve_function(&owner_pkg, func_info),
            PackageLoad::Cycle(_) => Placeholder::new(format!(
                "method {} in package still loading",
                func_info.qualified_name()
            ))
            .with_func(Rc::clone(func_info))
            .into_object(),
        }
    }

    fn eval_member_access(&mut self, receiver: &ObjectRef, sel: &str, pos: Pos) -> ObjectRef {
        let (info, on_pointer) = match &**receiver {
            Object::Pointer(p) => {
                let pointee = self.force(&p.pointee);
                let hint = pointee.type_hint();
                match hint.type_info {
                    Some(info) => (info, true),
                    None => {
                        return Object::placeholder(format!(
                            "selector .{sel} on untyped pointer"
                        ));
                    }
                }
            }
            Object::Instance(inst) => match inst.hint.type_info.clone() {
                Some(info) => (info, false),
                None => return Object::placeholder(format!("selector .{sel} on untyped instance")),
            },
            Object::SymbolicPlaceholder(p) => {
                // a placeholder typed to an interface records like a
                // variable would
                if let Some(info) = p.hint.type_info.clone()
                    && info.is_interface()
                    && let Some(sig) = info.interface_method(sel).cloned()
                {
                    return self.record_interface_call(&info, &sig, Rc::clone(receiver));
                }
                match p.hint.type_info.clone() {
                    Some(info) if !info.unresolved => {
                        let on_pointer = p.hint.field_type.as_ref().is_some_and(|ft| ft.is_pointer);
                        (info, on_pointer)
                    }
                    _ => {
                        return Object::placeholder(format!(
                            "selector .{sel} on symbolic value ({})",
                            p.reason
                        ));
                    }
                }
            }
            Object::Nil => return self.new_error(pos, format!("selector .{sel} on nil")),
            _ => {
                return Object::placeholder(format!(
                    "selector .{sel} on {} value",
                    receiver.kind()
                ));
            }
        };

        if info.is_interface()
            && let Some(sig) = info.interface_method(sel).cloned()
        {
            return self.record_interface_call(&info, &sig, Rc::clone(receiver));
        }

        match accessor::find_field_or_method(
            &mut self.resolver,
            &info,
            sel,
            on_pointer,
            self.tracer.as_mut(),
        ) {
            Lookup::Method { info: func_info, owner } => {
                let method = self.method_object(&owner, &func_info);
                match &*method {
                    Object::Function(f) => {
                        Rc::new(Object::Function(f.bind_receiver(Rc::clone(receiver))))
                    }
                    _ => method,
                }
            }
            Lookup::InterfaceMethod { sig, owner } => {
                self.record_interface_call(&owner, &sig, Rc::clone(receiver))
            }
            Lookup::Field { info: field, .. } => {
                let resolved = self
                    .resolver
                    .resolve_type(&field.field_type, self.tracer.as_mut());
                let hint = TypeHint::new(Some(resolved), Some(Rc::clone(&field.field_type)));
                if hint.is_interface()
                    && let Some(iface) = hint.type_info.clone()
                    && let Some(sig) = iface.interface_method(sel).cloned()
                {
                    // field of interface type selected for a call
                    return self.record_interface_call(&iface, &sig, Rc::clone(receiver));
                }
                Object::typed_placeholder(
                    format!("field {}.{sel}", info.qualified_name()),
                    hint,
                )
            }
            Lookup::Ambiguous { candidates } => {
                debug!(selector = sel, ?candidates, "ambiguous embedded selector");
                Rc::new(Object::AmbiguousSelector(Rc::new(
                    crate::object::AmbiguousSelector {
                        receiver: Rc::clone(receiver),
                        selector: sel.to_owned(),
                        pos,
                    },
                )))
            }
            Lookup::Unresolved => Rc::new(Object::AmbiguousSelector(Rc::new(
                crate::object::AmbiguousSelector {
                    receiver: Rc::clone(receiver),
                    selector: sel.to_owned(),
                    pos,
                },
            ))),
            Lookup::NotFound => self.new_error(
                pos,
                format!("undefined field or method {sel} on {}", info.qualified_name()),
            ),
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn eval_call(
        &mut self,
        func: &Rc<Expr>,
        args: &[Rc<Expr>],
        pos: Pos,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let callee = self.eval_expr(func, env, pkg);
        let callee = self.force(&callee);
        if callee.is_error() {
            return callee;
        }

        let mut arg_values: SmallVec<[ObjectRef; 4]> = SmallVec::with_capacity(args.len());
        for arg in args {
            let v = self.eval_expr(arg, env, pkg);
            let v = self.force(&v);
            if v.is_error() {
                return v;
            }
            arg_values.push(v);
        }
        // f(g()) forwards g's results as f's arguments
        if arg_values.len() == 1 {
            let first = Rc::clone(&arg_values[0]);
            if let Object::MultiReturn(mr) = &*first {
                arg_values = mr.values.iter().map(Rc::clone).collect();
            }
        }

        self.dispatch_call(&callee, &arg_values, pos)
    }

    /// Applies a callable from the host: the entry point of symbolic
    /// execution. Behaves exactly like an evaluated call expression,
    /// including the default-intrinsic observation.
    pub fn apply(&mut self, callee: &ObjectRef, args: Vec<ObjectRef>, pkg: &Rc<PackageObject>) -> ObjectRef {
        self.populate_package(pkg);
        let callee = self.force(callee);
        if callee.is_error() {
            return callee;
        }
        let args: SmallVec<[ObjectRef; 4]> = args.into_iter().collect();
        self.dispatch_call(&callee, &args, Pos::NONE)
    }

    fn dispatch_call(&mut self, callee: &ObjectRef, args: &[ObjectRef], pos: Pos) -> ObjectRef {
        // the default intrinsic observes every call first and may
        // short-circuit the whole dispatch
        if let Some(default) = self.intrinsics.default_intrinsic()
            && let Some(result) = default(self, callee, args)
        {
            return result;
        }

        // a keyed intrinsic replaces normal dispatch for its callable
        if let Some(key) = callee_key(callee)
            && let Some(intrinsic) = self.intrinsics.get(&key)
        {
            return intrinsic(self, args);
        }

        match &**callee {
            Object::Intrinsic(intr) => {
                let func = Rc::clone(&intr.func);
                func(self, args)
            }
            Object::Function(f) => self.apply_function(&Rc::clone(f), None, args, pos),
            Object::InstantiatedFunction(inst) => {
                let inst = Rc::clone(inst);
                self.apply_function(&Rc::clone(&inst.func), Some(&inst), args, pos)
            }
            Object::UnresolvedFunction(u) => Object::typed_placeholder(
                format!("result of unresolved call {}", u.qualified_name()),
                u.hint.clone(),
            ),
            Object::SymbolicPlaceholder(p) => {
                if let Some(sig) = &p.underlying_method {
                    return self.symbolic_result_from_types(
                        &format!("result of interface call {}", sig.name),
                        &sig.results,
                    );
                }
                if let Some(info) = &p.underlying_func {
                    let results: Vec<Rc<FieldType>> = info
                        .results
                        .iter()
                        .map(|r| Rc::clone(&r.field_type))
                        .collect();
                    return self.symbolic_result_from_types(
                        &format!("result of out-of-policy call {}", info.qualified_name()),
                        &results,
                    );
                }
                Object::placeholder(format!("result of symbolic call ({})", p.reason))
            }
            // type conversion: T(x)
            Object::Type(t) => {
                let hint = TypeHint::of_type(Rc::clone(&t.info));
                match args {
                    [single] => match (&t.info.kind, &**single) {
                        (TypeDeclKind::Alias, Object::Integer(_) | Object::Unsigned(_) | Object::Float(_))
                            if t.info.pkg_path.is_empty() =>
                        {
                            // scalar-to-scalar conversions keep the value
                            Rc::clone(single)
                        }
                        _ => Object::typed_placeholder(
                            format!("conversion to {}", t.info.qualified_name()),
                            hint,
                        ),
                    },
                    _ => Object::typed_placeholder(
                        format!("conversion to {}", t.info.qualified_name()),
                        hint,
                    ),
                }
            }
            Object::Nil => self.new_error(pos, "call of nil"),
            Object::Error(_) => Rc::clone(callee),
            other => self.new_error(pos, format!("not callable: {}", other.kind())),
        }
    }

    fn apply_function(
        &mut self,
        func: &Rc<Function>,
        inst: Option<&Rc<InstantiatedFunction>>,
        args: &[ObjectRef],
        pos: Pos,
    ) -> ObjectRef {
        if let Err(err) = self.cancel.check() {
            return Rc::new(Object::Error(EvalError::from_limit(
                &err,
                pos,
                self.stack_snapshot(),
            )));
        }
        if let Err(err) = self.tracker.check_depth(self.call_stack.len()) {
            return Rc::new(Object::Error(EvalError::from_limit(
                &err,
                pos,
                self.stack_snapshot(),
            )));
        }

        let shape = argument_shape(args);
        let site = (func.decl_pos().0, shape);
        let max_reentry = self.tracker.limits().max_reentry;
        let active = self.reentry.entry(site).or_insert(0);
        if *active > max_reentry {
            return self.symbolic_recursion_result(func);
        }
        *active += 1;

        let memoize = self.tracker.limits().memoize && !self.intrinsics.has_default();
        if memoize && let Some(cached) = self.memo.get(&site) {
            let cached = Rc::clone(cached);
            self.decrement_reentry(site);
            return cached;
        }

        let name = func.qualified_name();
        self.call_stack.push(CallFrame {
            function: name.clone(),
            call_pos: pos,
        });
        self.tracer.on_call(&name, self.call_stack.len());

        let result = self.apply_function_body(func, inst, args);

        self.call_stack.pop();
        self.tracer.on_return(self.call_stack.len());
        self.decrement_reentry(site);

        if memoize && !result.is_error() && !matches!(&*result, Object::PanicError(_)) {
            self.memo.insert(site, Rc::clone(&result));
        }
        result
    }

    fn decrement_reentry(&mut self, site: (u32, u64)) {
        if let Some(active) = self.reentry.get_mut(&site) {
            *active = active.saturating_sub(1);
            if *active == 0 {
                self.reentry.remove(&site);
            }
        }
    }

    /// Result for a recursion-bounded call: symbolic, typed to the declared
    /// results.
    fn symbolic_recursion_result(&mut self, func: &Rc<Function>) -> ObjectRef {
        let pkg = Rc::clone(&func.pkg);
        let results = self.result_types_of(func, &pkg);
        self.symbolic_result_from_types(
            &format!("recursive call to {} bounded", func.qualified_name()),
            &results,
        )
    }

    fn result_types_of(&mut self, func: &Rc<Function>, pkg: &Rc<PackageObject>) -> Vec<Rc<FieldType>> {
        if let Some(info) = &func.info {
            return info.results.iter().map(|r| Rc::clone(&r.field_type)).collect();
        }
        func.results
            .iter()
            .filter_map(|p| p.type_expr.as_ref().map(Rc::clone))
            .map(|te| self.field_type_of(&te, pkg))
            .collect()
    }

    fn symbolic_result_from_types(&mut self, reason: &str, results: &[Rc<FieldType>]) -> ObjectRef {
        match results {
            [] => Object::placeholder(reason),
            [single] => {
                let info = self.resolver.resolve_type(single, self.tracer.as_mut());
                Object::typed_placeholder(reason, TypeHint::new(Some(info), Some(Rc::clone(single))))
            }
            many => {
                let values = many
                    .iter()
                    .map(|ft| {
                        let info = self.resolver.resolve_type(ft, self.tracer.as_mut());
                        Object::typed_placeholder(
                            reason,
                            TypeHint::new(Some(info), Some(Rc::clone(ft))),
                        )
                    })
                    .collect();
                Rc::new(Object::MultiReturn(Rc::new(MultiReturn { values })))
            }
        }
    }

    fn apply_function_body(
        &mut self,
        func: &Rc<Function>,
        inst: Option<&Rc<InstantiatedFunction>>,
        args: &[ObjectRef],
    ) -> ObjectRef {
        let Some(body) = func.body.clone() else {
            let pkg = Rc::clone(&func.pkg);
            let results = self.result_types_of(func, &pkg);
            return self.symbolic_result_from_types(
                &format!("call to body-less function {}", func.qualified_name()),
                &results,
            );
        };

        let fn_env = Env::new_enclosed(&func.env);
        let fn_pkg = Rc::clone(&func.pkg);

        if let Some(inst) = inst {
            for (name, info) in &inst.param_map {
                fn_env.set_local(
                    name,
                    Rc::new(Object::Type(Rc::new(TypeObject {
                        name: name.clone(),
                        info: Rc::clone(info),
                    }))),
                );
            }
        }

        if let Some(recv) = &func.bound_recv
            && let Some(recv_param) = func.decl.as_ref().and_then(|d| d.recv.clone())
            && let Some(recv_name) = recv_param.names.first()
            && recv_name != "_"
        {
            let declared = recv_param
                .type_expr
                .as_ref()
                .map(|te| self.hint_of(te, &fn_pkg))
                .unwrap_or_default();
            fn_env.set_local(
                recv_name,
                Rc::new(Object::Variable(Variable::with_value(
                    recv_name,
                    Rc::clone(recv),
                    declared,
                    Rc::clone(&fn_env),
                    Some(Rc::clone(&fn_pkg)),
                ))),
            );
        }

        self.bind_parameters(func, args, &fn_env, &fn_pkg);

        let result = self.eval_block(&body, &fn_env, &fn_pkg);

        match &*result {
            Object::ReturnValue(ret) => {
                let value = Rc::clone(&ret.value);
                self.propagate_result_hint(func, &value, &fn_pkg);
                value
            }
            Object::Error(_) | Object::PanicError(_) => result,
            // break/continue escaping a function body are absorbed
            _ => Object::nil(),
        }
    }

    fn bind_parameters(
        &mut self,
        func: &Rc<Function>,
        args: &[ObjectRef],
        fn_env: &Rc<Env>,
        fn_pkg: &Rc<PackageObject>,
    ) {
        let mut arg_iter = args.iter();
        let param_count = func.params.len();
        for (pi, param) in func.params.iter().enumerate() {
            let is_variadic = pi + 1 == param_count
                && param
                    .type_expr
                    .as_ref()
                    .is_some_and(|te| matches!(te.kind, ExprKind::Ellipsis(_)));
            let declared = param
                .type_expr
                .as_ref()
                .map(|te| self.hint_of(te, fn_pkg))
                .unwrap_or_default();
            let names: &[String] = if param.names.is_empty() {
                // anonymous parameter still consumes an argument
                arg_iter.next();
                continue;
            } else {
                &param.names
            };
            for name in names {
                let value = if is_variadic {
                    // remaining arguments collapse into a symbolic slice
                    for rest in arg_iter.by_ref() {
                        let _ = rest;
                    }
                    let elem = declared.field_type.as_ref().and_then(|ft| ft.elem.clone());
                    Rc::new(Object::Slice(Rc::new(Slice {
                        elem,
                        hint: declared.clone(),
                    })))
                } else {
                    match arg_iter.next() {
                        Some(arg) => Rc::clone(arg),
                        None => Object::typed_placeholder(
                            format!("missing argument for parameter {name}"),
                            declared.clone(),
                        ),
                    }
                };
                if name == "_" {
                    continue;
                }
                let variable = Variable::with_value(
                    name,
                    Rc::clone(&value),
                    declared.clone(),
                    Rc::clone(fn_env),
                    Some(Rc::clone(fn_pkg)),
                );
                self.record_assignment(&variable, &value);
                fn_env.set_local(name, Rc::new(Object::Variable(variable)));
            }
        }
    }

    /// Attaches a named function-type hint to a returned function literal
    /// when the declared result resolves to a `Func`-kind type.
    fn propagate_result_hint(&mut self, func: &Rc<Function>, value: &ObjectRef, pkg: &Rc<PackageObject>) {
        let Object::Function(returned) = &**value else {
            return;
        };
        if func.results.len() != 1 {
            return;
        }
        let Some(te) = func.results[0].type_expr.as_ref().map(Rc::clone) else {
            return;
        };
        let hint = self.hint_of(&te, pkg);
        if hint
            .type_info
            .as_ref()
            .is_some_and(|info| info.kind == TypeDeclKind::Func)
        {
            returned.set_hint(hint);
        }
    }

    // ------------------------------------------------------------------
    // Binary expressions
    // ------------------------------------------------------------------

    fn eval_binary(
        &mut self,
        x: &Rc<Expr>,
        op: BinaryOp,
        y: &Rc<Expr>,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        // both operands always evaluate, for tracing coverage
        let left = self.eval_expr(x, env, pkg);
        let left = self.force(&left);
        if left.is_error() {
            return left;
        }
        let right = self.eval_expr(y, env, pkg);
        let right = self.force(&right);
        if right.is_error() {
            return right;
        }
        binary_op(&left, op, &right)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn eval_stmt(&mut self, stmt: &Rc<Stmt>, env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        if let Some(err) = self.step(stmt.pos) {
            return err;
        }
        match &stmt.kind {
            StmtKind::Empty => Object::nil(),
            StmtKind::Expr(e) => self.eval_expr(e, env, pkg),
            StmtKind::Send { chan, value } => {
                let c = self.eval_expr(chan, env, pkg);
                if c.is_fatal_error() {
                    return c;
                }
                let v = self.eval_expr(value, env, pkg);
                if v.is_error() {
                    return v;
                }
                Object::nil()
            }
            StmtKind::IncDec { x, inc } => self.eval_incdec(x, *inc, env, pkg),
            StmtKind::Assign { lhs, op, rhs } => self.eval_assign(lhs, *op, rhs, stmt.pos, env, pkg),
            StmtKind::Block(b) => {
                let scope = Env::new_enclosed(env);
                self.eval_block_in(b, &scope, pkg)
            }
            StmtKind::Return(exprs) => self.eval_return(exprs, env, pkg),
            StmtKind::If { init, cond, then, els } => self.eval_if(init.as_ref(), cond, then, els.as_ref(), env, pkg),
            StmtKind::For { init, cond, post, body } => {
                self.eval_for(init.as_ref(), cond.as_ref(), post.as_ref(), body, env, pkg)
            }
            StmtKind::Range { key, value, define, x, body } => {
                self.eval_range(key.as_ref(), value.as_ref(), *define, x, body, env, pkg)
            }
            StmtKind::Switch { init, tag, cases } => self.eval_switch(init.as_ref(), tag.as_ref(), cases, env, pkg),
            StmtKind::TypeSwitch { init, assign, cases } => {
                self.eval_type_switch(init.as_ref(), assign, cases, env, pkg)
            }
            StmtKind::Select { cases } => self.eval_select(cases, env, pkg),
            StmtKind::Branch { kind, label } => match kind {
                BranchKind::Break => Rc::new(Object::Break { label: label.clone() }),
                BranchKind::Continue => Rc::new(Object::Continue { label: label.clone() }),
                BranchKind::Fallthrough => Rc::new(Object::Fallthrough),
                // goto is treated as a no-op: the labeled statement is
                // evaluated on its own path anyway
                BranchKind::Goto => Object::nil(),
            },
            StmtKind::Labeled { label, stmt: inner } => {
                let result = self.eval_stmt(inner, env, pkg);
                match &*result {
                    Object::Break { label: Some(l) } if l == label => Object::nil(),
                    Object::Continue { label: Some(l) } if l == label => Object::nil(),
                    _ => result,
                }
            }
            StmtKind::Go(call) | StmtKind::Defer(call) => {
                // evaluated inline for call-graph coverage; no scheduling
                // or deferred-ordering semantics
                let result = self.eval_expr(call, env, pkg);
                if result.is_fatal_error() {
                    return result;
                }
                if let Object::Error(err) = &*result {
                    self.log_branch_error(err);
                }
                Object::nil()
            }
            StmtKind::Decl(gd) => self.eval_local_decl(gd, env, pkg),
        }
    }

    fn eval_incdec(&mut self, x: &Rc<Expr>, inc: bool, env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        let target = self.eval_expr(x, env, pkg);
        if target.is_error() {
            return target;
        }
        if let Object::Variable(v) = &*target {
            let current = self.force(&target);
            if current.is_error() {
                return current;
            }
            let next = match &*current {
                Object::Integer(n) => {
                    Object::integer(if inc { n.wrapping_add(1) } else { n.wrapping_sub(1) })
                }
                _ => Object::typed_placeholder("incremented symbolic value", current.type_hint()),
            };
            v.set_value(next);
        }
        Object::nil()
    }

    fn eval_return(&mut self, exprs: &[Rc<Expr>], env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let v = self.eval_expr(expr, env, pkg);
            let v = self.force(&v);
            if v.is_error() {
                return v;
            }
            values.push(v);
        }
        let value = match values.len() {
            0 => Object::nil(),
            1 => values.remove(0),
            _ => Rc::new(Object::MultiReturn(Rc::new(MultiReturn { values }))),
        };
        Rc::new(Object::ReturnValue(Rc::new(ReturnValue { value })))
    }

    fn eval_if(
        &mut self,
        init: Option<&Rc<Stmt>>,
        cond: &Rc<Expr>,
        then: &Rc<Block>,
        els: Option<&Rc<Stmt>>,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let scope = Env::new_enclosed(env);
        if let Some(init) = init {
            let r = self.eval_stmt(init, &scope, pkg);
            if r.is_control() {
                return r;
            }
        }
        let c = self.eval_expr(cond, &scope, pkg);
        if c.is_fatal_error() {
            return c;
        }
        if let Object::Error(err) = &*c {
            self.log_branch_error(err);
        }

        // both branches explored
        let then_result = self.eval_branch(|ev| {
            let branch_scope = Env::new_enclosed(&scope);
            ev.eval_block_in(then, &branch_scope, pkg)
        });
        if then_result.is_fatal_error() {
            return then_result;
        }
        let else_result = match els {
            Some(els) => {
                let els = Rc::clone(els);
                let r = self.eval_branch(|ev| {
                    let branch_scope = Env::new_enclosed(&scope);
                    ev.eval_stmt(&els, &branch_scope, pkg)
                });
                if r.is_fatal_error() {
                    return r;
                }
                r
            }
            None => Object::nil(),
        };

        if then_result.is_control() && !then_result.is_error() {
            return then_result;
        }
        if else_result.is_control() && !else_result.is_error() {
            return else_result;
        }
        Object::nil()
    }

    /// Runs one branch of a multi-branch construct: non-fatal errors are
    /// logged and collapse to nil so siblings continue.
    fn eval_branch(&mut self, f: impl FnOnce(&mut Self) -> ObjectRef) -> ObjectRef {
        let result = f(self);
        if result.is_fatal_error() {
            return result;
        }
        if let Object::Error(err) = &*result {
            self.log_branch_error(err);
            return Object::nil();
        }
        result
    }

    fn log_branch_error(&mut self, err: &Rc<EvalError>) {
        self.tracer.on_branch_error(err.message());
        warn!(error = %err, "branch evaluation error (continuing)");
    }

    fn eval_for(
        &mut self,
        init: Option<&Rc<Stmt>>,
        cond: Option<&Rc<Expr>>,
        post: Option<&Rc<Stmt>>,
        body: &Rc<Block>,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let scope = Env::new_enclosed(env);
        if let Some(init) = init {
            let r = self.eval_stmt(init, &scope, pkg);
            if r.is_control() {
                return r;
            }
        }
        if let Some(cond) = cond {
            let c = self.eval_expr(cond, &scope, pkg);
            if c.is_fatal_error() {
                return c;
            }
        }
        // the body is unrolled exactly once
        let result = self.eval_branch(|ev| {
            let body_scope = Env::new_enclosed(&scope);
            ev.eval_block_in(body, &body_scope, pkg)
        });
        if result.is_fatal_error() {
            return result;
        }
        if let Some(post) = post {
            let r = self.eval_stmt(post, &scope, pkg);
            if r.is_fatal_error() {
                return r;
            }
        }
        absorb_loop_control(result)
    }

    fn eval_range(
        &mut self,
        key: Option<&Rc<Expr>>,
        value: Option<&Rc<Expr>>,
        define: bool,
        x: &Rc<Expr>,
        body: &Rc<Block>,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let container = self.eval_expr(x, env, pkg);
        let container = self.force(&container);
        if container.is_fatal_error() {
            return container;
        }

        let (key_hint, value_hint) = range_binding_hints(self, &container);

        let scope = Env::new_enclosed(env);
        for (target, hint, what) in [
            (key, key_hint, "range key"),
            (value, value_hint, "range value"),
        ] {
            let Some(target) = target else { continue };
            let Some(name) = target.as_ident() else {
                continue;
            };
            if name == "_" {
                continue;
            }
            let bound = Object::typed_placeholder(what, hint.clone());
            if define {
                let variable = Variable::with_value(
                    name,
                    Rc::clone(&bound),
                    hint,
                    Rc::clone(&scope),
                    Some(Rc::clone(pkg)),
                );
                scope.set_local(name, Rc::new(Object::Variable(variable)));
            } else {
                let existing = scope.get(name);
                if let Some(obj) = existing
                    && let Object::Variable(v) = &*obj
                {
                    v.set_value(bound);
                } else {
                    scope.set(name, bound);
                }
            }
        }

        // body evaluated once with symbolic bindings
        let result = self.eval_branch(|ev| {
            let body_scope = Env::new_enclosed(&scope);
            ev.eval_block_in(body, &body_scope, pkg)
        });
        if result.is_fatal_error() {
            return result;
        }
        absorb_loop_control(result)
    }

    fn eval_switch(
        &mut self,
        init: Option<&Rc<Stmt>>,
        tag: Option<&Rc<Expr>>,
        cases: &[CaseClause],
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let scope = Env::new_enclosed(env);
        if let Some(init) = init {
            let r = self.eval_stmt(init, &scope, pkg);
            if r.is_control() {
                return r;
            }
        }
        if let Some(tag) = tag {
            let t = self.eval_expr(tag, &scope, pkg);
            if t.is_fatal_error() {
                return t;
            }
        }

        // every case explored; fallthrough is implied by that
        let mut propagated: Option<ObjectRef> = None;
        for case in cases {
            for guard in &case.exprs {
                let g = self.eval_expr(guard, &scope, pkg);
                if g.is_fatal_error() {
                    return g;
                }
            }
            let case_body = case.body.clone();
            let result = self.eval_branch(|ev| {
                let case_scope = Env::new_enclosed(&scope);
                ev.eval_stmts(&case_body, &case_scope, pkg)
            });
            if result.is_fatal_error() {
                return result;
            }
            match &*result {
                Object::Break { label: None } | Object::Fallthrough | Object::Nil => {}
                _ if result.is_control() => {
                    propagated.get_or_insert(result);
                }
                _ => {}
            }
        }
        propagated.unwrap_or_else(Object::nil)
    }

    fn eval_type_switch(
        &mut self,
        init: Option<&Rc<Stmt>>,
        assign: &Rc<Stmt>,
        cases: &[CaseClause],
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let scope = Env::new_enclosed(env);
        if let Some(init) = init {
            let r = self.eval_stmt(init, &scope, pkg);
            if r.is_control() {
                return r;
            }
        }

        // the guard names the switched value: `v := x.(type)` or plain
        // `x.(type)` as an expression statement
        let (bind_name, guard_expr) = type_switch_guard(assign);
        if let Some(expr) = &guard_expr {
            let g = self.eval_expr(expr, &scope, pkg);
            if g.is_fatal_error() {
                return g;
            }
        }

        let mut propagated: Option<ObjectRef> = None;
        for case in cases {
            let case_scope = Env::new_enclosed(&scope);
            // in each clause the bound name takes the clause's type
            if let Some(name) = &bind_name {
                let hint = match case.exprs.first() {
                    Some(te) => self.hint_of(te, pkg),
                    None => TypeHint::none(),
                };
                let bound = Object::typed_placeholder("type switch binding", hint.clone());
                let variable =
                    Variable::with_value(name, bound, hint, Rc::clone(&case_scope), Some(Rc::clone(pkg)));
                case_scope.set_local(name, Rc::new(Object::Variable(variable)));
            }
            let case_body = case.body.clone();
            let result = self.eval_branch(|ev| ev.eval_stmts(&case_body, &case_scope, pkg));
            if result.is_fatal_error() {
                return result;
            }
            match &*result {
                Object::Break { label: None } | Object::Nil => {}
                _ if result.is_control() => {
                    propagated.get_or_insert(result);
                }
                _ => {}
            }
        }
        propagated.unwrap_or_else(Object::nil)
    }

    fn eval_select(&mut self, cases: &[CommClause], env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        let mut propagated: Option<ObjectRef> = None;
        for case in cases {
            let case_scope = Env::new_enclosed(env);
            if let Some(comm) = &case.comm {
                let c = self.eval_stmt(comm, &case_scope, pkg);
                if c.is_fatal_error() {
                    return c;
                }
                if let Object::Error(err) = &*c {
                    self.log_branch_error(err);
                }
            }
            let case_body = case.body.clone();
            let result = self.eval_branch(|ev| ev.eval_stmts(&case_body, &case_scope, pkg));
            if result.is_fatal_error() {
                return result;
            }
            match &*result {
                Object::Break { label: None } | Object::Nil => {}
                _ if result.is_control() => {
                    propagated.get_or_insert(result);
                }
                _ => {}
            }
        }
        propagated.unwrap_or_else(Object::nil)
    }

    fn eval_local_decl(&mut self, gd: &Rc<GenDecl>, env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        match gd.kind {
            DeclKind::Import => Object::nil(),
            DeclKind::Type => {
                self.declare_types_local(gd, env, pkg);
                Object::nil()
            }
            DeclKind::Const | DeclKind::Var => {
                // locals are eager, unlike package variables
                for spec in &gd.specs {
                    let Spec::Value(vs) = spec else { continue };
                    let declared = vs
                        .type_expr
                        .as_ref()
                        .map(|te| self.hint_of(te, pkg))
                        .unwrap_or_default();
                    let mut values = Vec::with_capacity(vs.names.len());
                    for expr in &vs.values {
                        let v = self.eval_expr(expr, env, pkg);
                        let v = self.force(&v);
                        if v.is_fatal_error() {
                            return v;
                        }
                        values.push(v);
                    }
                    let values = expand_values(values, vs.names.len(), &declared);
                    for (name, value) in vs.names.iter().zip(values) {
                        if name == "_" {
                            continue;
                        }
                        let variable = Variable::with_value(
                            name,
                            Rc::clone(&value),
                            declared.clone(),
                            Rc::clone(env),
                            Some(Rc::clone(pkg)),
                        );
                        self.record_assignment(&variable, &value);
                        env.set_local(name, Rc::new(Object::Variable(variable)));
                    }
                }
                Object::nil()
            }
        }
    }

    fn declare_types_local(&mut self, gd: &Rc<GenDecl>, env: &Rc<Env>, pkg: &Rc<PackageObject>) {
        for spec in &gd.specs {
            let Spec::Type(ts) = spec else { continue };
            let info = pkg
                .scanned_info()
                .and_then(|info| info.lookup_type(&ts.name))
                .unwrap_or_else(|| TypeInfo::unresolved(&pkg.path, &ts.name));
            env.set_local(
                &ts.name,
                Rc::new(Object::Type(Rc::new(TypeObject {
                    name: ts.name.clone(),
                    info,
                }))),
            );
        }
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    fn eval_assign(
        &mut self,
        lhs: &[Rc<Expr>],
        op: AssignOp,
        rhs: &[Rc<Expr>],
        pos: Pos,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        let mut values = Vec::with_capacity(rhs.len());
        for expr in rhs {
            let v = self.eval_expr(expr, env, pkg);
            let v = self.force(&v);
            if v.is_error() {
                return v;
            }
            values.push(v);
        }
        let values = expand_values(values, lhs.len(), &TypeHint::none());

        match op {
            AssignOp::Define => {
                for (target, value) in lhs.iter().zip(values) {
                    let Some(name) = target.as_ident() else {
                        return self.new_error(pos, "non-identifier on := left-hand side");
                    };
                    if name == "_" {
                        continue;
                    }
                    if let Some(existing) = env
                        .has_local(name)
                        .then(|| env.get(name))
                        .flatten()
                        && let Object::Variable(v) = &*existing
                    {
                        // re-declaration in a multi-assign updates in place
                        self.record_assignment(v, &value);
                        v.set_value(value);
                        continue;
                    }
                    let declared = value.type_hint();
                    let variable = Variable::with_value(
                        name,
                        Rc::clone(&value),
                        declared,
                        Rc::clone(env),
                        Some(Rc::clone(pkg)),
                    );
                    self.record_assignment(&variable, &value);
                    env.set_local(name, Rc::new(Object::Variable(variable)));
                }
                Object::nil()
            }
            AssignOp::Assign => {
                for (target, value) in lhs.iter().zip(values) {
                    let r = self.assign_to(target, value, env, pkg);
                    if r.is_error() {
                        return r;
                    }
                }
                Object::nil()
            }
            AssignOp::Compound(bin_op) => {
                let [target] = lhs else {
                    return self.new_error(pos, "compound assignment with multiple targets");
                };
                let current = self.eval_expr(target, env, pkg);
                let current = self.force(&current);
                if current.is_error() {
                    return current;
                }
                let value = values
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| Object::placeholder("missing assignment value"));
                let combined = binary_op(&current, bin_op, &value);
                self.assign_to(target, combined, env, pkg)
            }
        }
    }

    fn assign_to(
        &mut self,
        target: &Rc<Expr>,
        value: ObjectRef,
        env: &Rc<Env>,
        pkg: &Rc<PackageObject>,
    ) -> ObjectRef {
        match &target.kind {
            ExprKind::Ident(name) => {
                if name == "_" {
                    return Object::nil();
                }
                if let Some(existing) = env.get(name) {
                    if let Object::Variable(v) = &*existing {
                        self.record_assignment(v, &value);
                        v.set_value(value);
                        return Object::nil();
                    }
                    env.set(name, value);
                    return Object::nil();
                }
                env.set(name, value);
                Object::nil()
            }
            ExprKind::Selector { x, sel } => {
                // a package-scoped variable reached by selector is a real
                // cell; anything else has no storage and is evaluated for
                // effect only
                let base = self.eval_expr(x, env, pkg);
                if base.is_error() {
                    return base;
                }
                let forced = self.force(&base);
                if let Object::Package(target_pkg) = &*forced {
                    self.populate_package(&Rc::clone(target_pkg));
                    if let Some(member) = target_pkg.env.get(sel)
                        && let Object::Variable(v) = &*member
                    {
                        self.record_assignment(v, &value);
                        v.set_value(value);
                    }
                }
                Object::nil()
            }
            ExprKind::Index { x, index } => {
                let b = self.eval_expr(x, env, pkg);
                if b.is_fatal_error() {
                    return b;
                }
                let i = self.eval_expr(index, env, pkg);
                if i.is_fatal_error() {
                    return i;
                }
                Object::nil()
            }
            ExprKind::Star(inner) => {
                let p = self.eval_expr(inner, env, pkg);
                if p.is_fatal_error() {
                    return p;
                }
                Object::nil()
            }
            _ => {
                let r = self.eval_expr(target, env, pkg);
                if r.is_fatal_error() {
                    return r;
                }
                Object::nil()
            }
        }
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    pub(crate) fn eval_block(&mut self, block: &Rc<Block>, env: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        let scope = Env::new_enclosed(env);
        self.eval_block_in(block, &scope, pkg)
    }

    fn eval_block_in(&mut self, block: &Rc<Block>, scope: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        self.eval_stmts(&block.stmts, scope, pkg)
    }

    fn eval_stmts(&mut self, stmts: &[Rc<Stmt>], scope: &Rc<Env>, pkg: &Rc<PackageObject>) -> ObjectRef {
        for stmt in stmts {
            let result = self.eval_stmt(stmt, scope, pkg);
            if result.is_control() {
                return result;
            }
        }
        Object::nil()
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Evaluator(depth={}, steps={}, {} interface calls)",
            self.call_stack.len(),
            self.tracker.steps(),
            self.iface_calls.len()
        )
    }
}

// ============================================================================
// Free helpers
// ============================================================================

/// The intrinsic-lookup key of a callee, when it has one.
fn callee_key(callee: &ObjectRef) -> Option<String> {
    match &**callee {
        Object::Function(f) => Some(f.qualified_name()),
        Object::InstantiatedFunction(inst) => Some(inst.func.qualified_name()),
        Object::Intrinsic(i) => Some(i.name.clone()),
        Object::UnresolvedFunction(u) => Some(u.qualified_name()),
        Object::SymbolicPlaceholder(p) => p.underlying_func.as_ref().map(|i| i.qualified_name()),
        _ => None,
    }
}

/// Structural fingerprint of an argument list, for the re-entry guard and
/// the memo key: kinds, scalar values, and type-hint names.
fn argument_shape(args: &[ObjectRef]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for arg in args {
        std::mem::discriminant(&**arg).hash(&mut hasher);
        match &**arg {
            Object::Integer(v) => v.hash(&mut hasher),
            Object::Unsigned(v) => v.hash(&mut hasher),
            Object::String(s) => s.hash(&mut hasher),
            Object::Boolean(b) => b.hash(&mut hasher),
            Object::Float(v) => v.to_bits().hash(&mut hasher),
            _ => arg.type_hint().describe().hash(&mut hasher),
        }
    }
    hasher.finish()
}

/// Unlabeled break/continue are absorbed by the nearest loop; labeled ones
/// and returns keep propagating.
fn absorb_loop_control(result: ObjectRef) -> ObjectRef {
    match &*result {
        Object::Break { label: None } | Object::Continue { label: None } => Object::nil(),
        _ => result,
    }
}

/// Expands RHS values to the LHS arity: multi-returns unpack, a single
/// one-valued expression in a two-target binding gains an `ok` boolean,
/// anything missing becomes a placeholder.
fn expand_values(values: Vec<ObjectRef>, want: usize, declared: &TypeHint) -> Vec<ObjectRef> {
    if values.len() == want {
        return values;
    }
    if values.len() == 1 {
        if let Object::MultiReturn(mr) = &*values[0] {
            let mut out: Vec<ObjectRef> = mr.values.iter().map(Rc::clone).collect();
            while out.len() < want {
                out.push(Object::placeholder("missing value in unpacking"));
            }
            out.truncate(want.max(1));
            return out;
        }
        if want == 2 {
            // comma-ok forms: type assertion, map index, channel receive
            let mut out = values;
            out.push(Object::typed_placeholder(
                "comma-ok result",
                TypeHint::of_field(FieldType::builtin("bool")),
            ));
            return out;
        }
    }
    let mut out = values;
    while out.len() < want {
        out.push(Object::typed_placeholder("missing value", declared.clone()));
    }
    out
}

/// Hints for the loop variables of a range statement, derived from the
/// container's element and key types.
fn range_binding_hints(ev: &mut Evaluator, container: &ObjectRef) -> (TypeHint, TypeHint) {
    let int_hint = TypeHint::of_field(FieldType::builtin("int"));
    match &**container {
        Object::Slice(s) => {
            let value = s.elem.as_ref().map_or_else(TypeHint::none, |elem| {
                let info = ev.resolver.resolve_type(elem, ev.tracer.as_mut());
                TypeHint::new(Some(info), Some(Rc::clone(elem)))
            });
            (int_hint, value)
        }
        Object::Map(m) => {
            let key = m.key.as_ref().map_or_else(TypeHint::none, |k| {
                let info = ev.resolver.resolve_type(k, ev.tracer.as_mut());
                TypeHint::new(Some(info), Some(Rc::clone(k)))
            });
            let value = m.value.as_ref().map_or_else(TypeHint::none, |v| {
                let info = ev.resolver.resolve_type(v, ev.tracer.as_mut());
                TypeHint::new(Some(info), Some(Rc::clone(v)))
            });
            (key, value)
        }
        Object::Channel(c) => {
            let value = c.elem.as_ref().map_or_else(TypeHint::none, |elem| {
                let info = ev.resolver.resolve_type(elem, ev.tracer.as_mut());
                TypeHint::new(Some(info), Some(Rc::clone(elem)))
            });
            (value, TypeHint::none())
        }
        Object::String(_) => (int_hint, TypeHint::of_field(FieldType::builtin("rune"))),
        Object::Integer(_) => (int_hint.clone(), TypeHint::none()),
        _ => (TypeHint::none(), TypeHint::none()),
    }
}

/// Extracts the bound name and guarded expression of a type-switch guard.
fn type_switch_guard(assign: &Rc<Stmt>) -> (Option<String>, Option<Rc<Expr>>) {
    match &assign.kind {
        StmtKind::Assign { lhs, rhs, .. } => {
            let name = lhs.first().and_then(|e| e.as_ident()).map(str::to_owned);
            let expr = rhs.first().map(|e| match &e.kind {
                ExprKind::TypeAssert { x, .. } => Rc::clone(x),
                _ => Rc::clone(e),
            });
            (name, expr)
        }
        StmtKind::Expr(e) => match &e.kind {
            ExprKind::TypeAssert { x, .. } => (None, Some(Rc::clone(x))),
            _ => (None, Some(Rc::clone(e))),
        },
        _ => (None, None),
    }
}

/// Typed dispatch for binary operators, per the evaluation rules: concrete
/// where trivially known, placeholders otherwise. Division by zero and the
/// partially-defined operators (`%`, shifts, bitwise) stay symbolic.
fn binary_op(left: &ObjectRef, op: BinaryOp, right: &ObjectRef) -> ObjectRef {
    use BinaryOp as B;
    match (&**left, &**right) {
        (Object::Integer(a), Object::Integer(b)) => match op {
            B::Add => Object::integer(a.wrapping_add(*b)),
            B::Sub => Object::integer(a.wrapping_sub(*b)),
            B::Mul => Object::integer(a.wrapping_mul(*b)),
            B::Quo => {
                if *b == 0 {
                    Object::placeholder("integer division by zero")
                } else {
                    Object::integer(a.wrapping_div(*b))
                }
            }
            B::Eq => Object::boolean(a == b),
            B::Ne => Object::boolean(a != b),
            B::Lt => Object::boolean(a < b),
            B::Le => Object::boolean(a <= b),
            B::Gt => Object::boolean(a > b),
            B::Ge => Object::boolean(a >= b),
            // partially defined semantics stay symbolic to keep paths alive
            B::Rem | B::Shl | B::Shr | B::And | B::Or | B::Xor | B::AndNot => {
                Object::typed_placeholder(
                    format!("integer {op} with partially defined semantics"),
                    TypeHint::of_field(FieldType::builtin("int")),
                )
            }
            B::LAnd | B::LOr => Object::placeholder("logical operator on integers"),
        },
        (Object::Unsigned(a), Object::Unsigned(b)) => match op {
            B::Add => Object::unsigned(a.wrapping_add(*b)),
            B::Sub => Object::unsigned(a.wrapping_sub(*b)),
            B::Mul => Object::unsigned(a.wrapping_mul(*b)),
            B::Quo => {
                if *b == 0 {
                    Object::placeholder("integer division by zero")
                } else {
                    Object::unsigned(a.wrapping_div(*b))
                }
            }
            B::Eq => Object::boolean(a == b),
            B::Ne => Object::boolean(a != b),
            B::Lt => Object::boolean(a < b),
            B::Le => Object::boolean(a <= b),
            B::Gt => Object::boolean(a > b),
            B::Ge => Object::boolean(a >= b),
            _ => Object::typed_placeholder(
                format!("unsigned {op} with partially defined semantics"),
                TypeHint::of_field(FieldType::builtin("uint64")),
            ),
        },
        (Object::String(a), Object::String(b)) => match op {
            B::Add => Object::string(&format!("{a}{b}")),
            B::Eq => Object::boolean(a == b),
            B::Ne => Object::boolean(a != b),
            _ => Object::typed_placeholder(
                "string comparison",
                TypeHint::of_field(FieldType::builtin("bool")),
            ),
        },
        (Object::Boolean(a), Object::Boolean(b)) => match op {
            B::LAnd => Object::boolean(*a && *b),
            B::LOr => Object::boolean(*a || *b),
            B::Eq => Object::boolean(a == b),
            B::Ne => Object::boolean(a != b),
            _ => Object::placeholder("operator on booleans"),
        },
        (Object::Nil, Object::Nil) => match op {
            B::Eq => Object::boolean(true),
            B::Ne => Object::boolean(false),
            _ => Object::placeholder("operator on nil"),
        },
        _ => {
            // float/complex involvement promotes both sides to complex128
            if let (Some(a), Some(b)) = (as_complex(left), as_complex(right)) {
                return match op {
                    B::Add => Object::complex(a + b),
                    B::Sub => Object::complex(a - b),
                    B::Mul => Object::complex(a * b),
                    B::Quo => {
                        if b.is_zero() {
                            Object::placeholder("division by zero")
                        } else {
                            Object::complex(a / b)
                        }
                    }
                    B::Eq => Object::boolean(a == b),
                    B::Ne => Object::boolean(a != b),
                    B::Lt | B::Le | B::Gt | B::Ge if a.im == 0.0 && b.im == 0.0 => {
                        Object::boolean(match op {
                            B::Lt => a.re < b.re,
                            B::Le => a.re <= b.re,
                            B::Gt => a.re > b.re,
                            _ => a.re >= b.re,
                        })
                    }
                    _ => Object::placeholder("operator on complex values"),
                };
            }
            let hint = {
                let lh = left.type_hint();
                if lh.is_empty() { right.type_hint() } else { lh }
            };
            Object::typed_placeholder(format!("binary {op} on symbolic values"), hint)
        }
    }
}

/// Numeric promotion into complex128, when either side demands it.
fn as_complex(obj: &ObjectRef) -> Option<Complex64> {
    match &**obj {
        Object::Integer(v) => Some(Complex64::from_real(*v as f64)),
        Object::Unsigned(v) => Some(Complex64::from_real(*v as f64)),
        Object::Float(v) => Some(Complex64::from_real(*v)),
        Object::Complex(v) => Some(*v),
        _ => None,
    }
}

/// All parameter names of a declaration, in order.
fn flatten_param_names(params: &[ParamDecl]) -> Vec<String> {
    let mut names = Vec::new();
    for param in params {
        for name in &param.names {
            names.push(name.clone());
        }
    }
    names
}

