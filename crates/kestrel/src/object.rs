//! The runtime object universe.
//!
//! Every value the evaluator produces is one [`Object`] variant: concrete
//! scalars when a value is trivially known, functions and packages and
//! types as first-class values, control-flow markers that unwind through
//! enclosing evaluators, and, pervasively, [`Placeholder`], the symbolic
//! stand-in for anything unknown. No evaluation path ever returns "no
//! value": where a concrete result cannot be computed, a placeholder with a
//! human-readable reason takes its place.
//!
//! Objects are immutable and `Rc`-shared. The two exceptions are a
//! [`Variable`]'s value cell (lazy initialization, assignment,
//! possible-type accumulation) and the resolution caches. Everything else
//! is built once.

use std::{
    cell::RefCell,
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    env::Env,
    error::EvalError,
    intrinsics::IntrinsicFn,
    scanner::{FieldType, FunctionInfo, MethodSig, PackageInfo, TypeInfo},
    syntax::{Block, Expr, FuncDecl, ParamDecl, Pos},
};

pub type ObjectRef = Rc<Object>;

/// A complex value with 64-bit components.
///
/// Arithmetic promotion in binary expressions funnels every float-or-complex
/// computation through this type, so it carries the full operator set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    #[must_use]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[must_use]
    pub fn from_real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }
}

impl Add for Complex64 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex64 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex64 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Div for Complex64 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let denom = rhs.re * rhs.re + rhs.im * rhs.im;
        Self::new(
            (self.re * rhs.re + self.im * rhs.im) / denom,
            (self.im * rhs.re - self.re * rhs.im) / denom,
        )
    }
}

impl Neg for Complex64 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

impl fmt::Display for Complex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im >= 0.0 {
            write!(f, "({}+{}i)", self.re, self.im)
        } else {
            write!(f, "({}{}i)", self.re, self.im)
        }
    }
}

/// The optional static-type pair carried by objects: a resolved
/// [`TypeInfo`] and/or the [`FieldType`] reference it came from.
#[derive(Debug, Clone, Default)]
pub struct TypeHint {
    pub type_info: Option<Rc<TypeInfo>>,
    pub field_type: Option<Rc<FieldType>>,
}

impl TypeHint {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn of_type(type_info: Rc<TypeInfo>) -> Self {
        Self {
            type_info: Some(type_info),
            field_type: None,
        }
    }

    #[must_use]
    pub fn of_field(field_type: Rc<FieldType>) -> Self {
        Self {
            type_info: None,
            field_type: Some(field_type),
        }
    }

    #[must_use]
    pub fn new(type_info: Option<Rc<TypeInfo>>, field_type: Option<Rc<FieldType>>) -> Self {
        Self {
            type_info,
            field_type,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.type_info.is_none() && self.field_type.is_none()
    }

    /// True when the static type is a resolved interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.type_info.as_ref().is_some_and(|t| t.is_interface())
    }

    /// A short rendering for placeholder reasons and inspect output.
    #[must_use]
    pub fn describe(&self) -> String {
        if let Some(info) = &self.type_info {
            return info.qualified_name();
        }
        if let Some(ft) = &self.field_type {
            return ft.type_string();
        }
        "<untyped>".to_owned()
    }
}

/// Discriminant for [`Object`], used by dispatch guards and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Integer,
    Unsigned,
    Float,
    Complex,
    String,
    Boolean,
    Nil,
    Function,
    InstantiatedFunction,
    Intrinsic,
    UnresolvedFunction,
    Type,
    Instance,
    Pointer,
    Variable,
    Channel,
    Slice,
    Map,
    MultiReturn,
    SymbolicPlaceholder,
    ReturnValue,
    Break,
    Continue,
    Fallthrough,
    PanicError,
    Error,
    AmbiguousSelector,
    Package,
}

// ============================================================================
// Variant payloads
// ============================================================================

/// A user function: declaration AST plus captured environment.
///
/// Cloned (shallowly) on generic instantiation; otherwise immutable apart
/// from the result-type hint, which return-unwrapping may attach when the
/// declared result resolves to a named function type.
pub struct Function {
    /// `None` for function literals.
    pub name: Option<String>,
    pub decl: Option<Rc<FuncDecl>>,
    pub type_params: Vec<ParamDecl>,
    pub params: Vec<ParamDecl>,
    pub results: Vec<ParamDecl>,
    pub body: Option<Rc<Block>>,
    /// Captured (defining) environment.
    pub env: Rc<Env>,
    /// Defining package.
    pub pkg: Rc<PackageObject>,
    /// Front-end metadata, present for declared functions and methods.
    pub info: Option<Rc<FunctionInfo>>,
    /// Receiver value for bound method values (`v.Method` used as a value).
    pub bound_recv: Option<ObjectRef>,
    hint: RefCell<TypeHint>,
}

impl Function {
    /// The key used for intrinsic lookup and reporting: `path.Func`,
    /// `(path.T).Method`, `(*path.T).Method`, or `<func literal>`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if let Some(info) = &self.info {
            return info.qualified_name();
        }
        match &self.name {
            Some(name) => format!("{}.{}", self.pkg.path, name),
            None => "<func literal>".to_owned(),
        }
    }

    /// Position of the declaration (or literal), the memoization key.
    #[must_use]
    pub fn decl_pos(&self) -> Pos {
        match (&self.decl, &self.body) {
            (Some(decl), _) => decl.pos,
            (None, Some(body)) => body.pos,
            (None, None) => Pos::NONE,
        }
    }

    #[must_use]
    pub fn hint(&self) -> TypeHint {
        self.hint.borrow().clone()
    }

    pub fn set_hint(&self, hint: TypeHint) {
        *self.hint.borrow_mut() = hint;
    }

    /// A shallow copy with a bound receiver, for method values.
    #[must_use]
    pub fn bind_receiver(&self, recv: ObjectRef) -> Rc<Self> {
        Rc::new(Self {
            name: self.name.clone(),
            decl: self.decl.clone(),
            type_params: self.type_params.clone(),
            params: self.params.clone(),
            results: self.results.clone(),
            body: self.body.clone(),
            env: Rc::clone(&self.env),
            pkg: Rc::clone(&self.pkg),
            info: self.info.clone(),
            bound_recv: Some(recv),
            hint: RefCell::new(self.hint()),
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.qualified_name())
    }
}

/// Builder for [`Function`]; the evaluator and resolver are the only
/// constructors.
pub struct FunctionBuilder {
    pub name: Option<String>,
    pub decl: Option<Rc<FuncDecl>>,
    pub type_params: Vec<ParamDecl>,
    pub params: Vec<ParamDecl>,
    pub results: Vec<ParamDecl>,
    pub body: Option<Rc<Block>>,
    pub env: Rc<Env>,
    pub pkg: Rc<PackageObject>,
    pub info: Option<Rc<FunctionInfo>>,
}

impl FunctionBuilder {
    #[must_use]
    pub fn build(self) -> Rc<Function> {
        Rc::new(Function {
            name: self.name,
            decl: self.decl,
            type_params: self.type_params,
            params: self.params,
            results: self.results,
            body: self.body,
            env: self.env,
            pkg: self.pkg,
            info: self.info,
            bound_recv: None,
            hint: RefCell::new(TypeHint::none()),
        })
    }
}

/// A generic function applied to explicit type arguments.
#[derive(Debug)]
pub struct InstantiatedFunction {
    pub func: Rc<Function>,
    pub type_args: Vec<Rc<TypeInfo>>,
    /// Type parameter name → resolved argument, in declaration order.
    pub param_map: IndexMap<String, Rc<TypeInfo>>,
}

/// A host-supplied function bound into a scope (built-ins, analysis hooks).
#[derive(Clone)]
pub struct Intrinsic {
    pub name: String,
    pub func: IntrinsicFn,
}

impl fmt::Debug for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Intrinsic({})", self.name)
    }
}

/// A function known only by name: its package is out of policy or its body
/// was never found. Calling one yields a placeholder.
#[derive(Debug)]
pub struct UnresolvedFunction {
    pub pkg_path: String,
    pub name: String,
    pub hint: TypeHint,
}

impl UnresolvedFunction {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.pkg_path, self.name)
    }
}

/// A type used as a value (conversion target, method expression base).
#[derive(Debug)]
pub struct TypeObject {
    pub name: String,
    pub info: Rc<TypeInfo>,
}

/// A value of a named composite type, produced by composite literals of
/// in-policy types. Carries no field storage: field reads go through the
/// accessor and produce typed placeholders.
#[derive(Debug)]
pub struct Instance {
    pub type_name: String,
    pub hint: TypeHint,
}

/// `&x` or `new(T)`.
#[derive(Debug)]
pub struct Pointer {
    pub pointee: ObjectRef,
    pub hint: TypeHint,
}

/// Channel value; contents are always symbolic.
#[derive(Debug)]
pub struct Channel {
    pub elem: Option<Rc<FieldType>>,
    pub hint: TypeHint,
}

/// Slice value; contents are always symbolic.
#[derive(Debug)]
pub struct Slice {
    pub elem: Option<Rc<FieldType>>,
    pub hint: TypeHint,
}

/// Map value; contents are always symbolic.
#[derive(Debug)]
pub struct MapObject {
    pub key: Option<Rc<FieldType>>,
    pub value: Option<Rc<FieldType>>,
    pub hint: TypeHint,
}

/// The values of a multi-result call, unpacked at assignment and
/// parameter-binding boundaries.
#[derive(Debug)]
pub struct MultiReturn {
    pub values: Vec<ObjectRef>,
}

/// Initializer attachment for a lazily-evaluated variable: which value
/// expression, and which position within it this name binds.
#[derive(Debug, Clone)]
pub struct VarInit {
    pub expr: Rc<Expr>,
    /// Index of this name among the spec's names.
    pub index: usize,
    /// Total names bound by the spec.
    pub count: usize,
}

#[derive(Debug)]
struct VarState {
    value: ObjectRef,
    evaluated: bool,
    possible_types: IndexMap<String, Rc<TypeInfo>>,
}

/// A named, lazily-initialized, possibly-mutable cell. Distinct from the
/// value it holds.
///
/// `evaluated` transitions false→true exactly once; afterwards `value` is
/// never a `Variable` or `AmbiguousSelector`. For variables with a declared
/// interface type, `possible_types` accumulates every concrete type ever
/// assigned and is never reset.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    /// Environment the declaration was evaluated in; lazy initializers run
    /// here, not at the read site.
    pub decl_env: Rc<Env>,
    pub decl_pkg: Option<Rc<PackageObject>>,
    pub initializer: Option<VarInit>,
    /// The declared (static) type.
    pub declared: TypeHint,
    state: RefCell<VarState>,
}

impl Variable {
    /// An eagerly-valued variable (parameters, `:=` bindings).
    #[must_use]
    pub fn with_value(
        name: &str,
        value: ObjectRef,
        declared: TypeHint,
        decl_env: Rc<Env>,
        decl_pkg: Option<Rc<PackageObject>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            decl_env,
            decl_pkg,
            initializer: None,
            declared,
            state: RefCell::new(VarState {
                value,
                evaluated: true,
                possible_types: IndexMap::new(),
            }),
        })
    }

    /// A lazily-initialized package variable. The initializer runs on first
    /// read, in `decl_env`.
    #[must_use]
    pub fn lazy(
        name: &str,
        initializer: Option<VarInit>,
        declared: TypeHint,
        decl_env: Rc<Env>,
        decl_pkg: Option<Rc<PackageObject>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            decl_env,
            decl_pkg,
            initializer,
            declared,
            state: RefCell::new(VarState {
                value: Object::nil(),
                evaluated: false,
                possible_types: IndexMap::new(),
            }),
        })
    }

    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.state.borrow().evaluated
    }

    /// The current value. Meaningless until `is_evaluated`.
    #[must_use]
    pub fn value(&self) -> ObjectRef {
        Rc::clone(&self.state.borrow().value)
    }

    /// Stores a value and marks the variable evaluated.
    pub fn set_value(&self, value: ObjectRef) {
        let mut state = self.state.borrow_mut();
        state.value = value;
        state.evaluated = true;
    }

    /// Accumulates a concrete type into the possible-types set. Only
    /// meaningful for interface-typed variables; never resets.
    pub fn record_possible_type(&self, info: Rc<TypeInfo>) {
        self.state
            .borrow_mut()
            .possible_types
            .insert(info.qualified_name(), info);
    }

    /// Concrete types ever assigned, in first-assignment order.
    #[must_use]
    pub fn possible_types(&self) -> Vec<Rc<TypeInfo>> {
        self.state.borrow().possible_types.values().cloned().collect()
    }

    #[must_use]
    pub fn has_possible_type(&self, qualified_name: &str) -> bool {
        self.state.borrow().possible_types.contains_key(qualified_name)
    }
}

/// The symbolic stand-in for an unknown or un-computed value.
#[derive(Debug)]
pub struct Placeholder {
    /// Human-readable account of why the value is symbolic.
    pub reason: String,
    pub hint: TypeHint,
    /// The function this placeholder stands for, when it stands for one.
    pub underlying_func: Option<Rc<FunctionInfo>>,
    /// The interface method this placeholder represents a call to.
    pub underlying_method: Option<MethodSig>,
    /// Receiver observed at an interface call site.
    pub receiver: Option<ObjectRef>,
    /// Filled by finalization: concrete in-policy implementers.
    pub concrete_impls: RefCell<Vec<Rc<TypeInfo>>>,
}

impl Placeholder {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            hint: TypeHint::none(),
            underlying_func: None,
            underlying_method: None,
            receiver: None,
            concrete_impls: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = hint;
        self
    }

    #[must_use]
    pub fn with_func(mut self, info: Rc<FunctionInfo>) -> Self {
        self.underlying_func = Some(info);
        self
    }

    #[must_use]
    pub fn with_method(mut self, sig: MethodSig) -> Self {
        self.underlying_method = Some(sig);
        self
    }

    #[must_use]
    pub fn with_receiver(mut self, recv: ObjectRef) -> Self {
        self.receiver = Some(recv);
        self
    }

    #[must_use]
    pub fn into_object(self) -> ObjectRef {
        Rc::new(Object::SymbolicPlaceholder(Rc::new(self)))
    }
}

/// `return` marker wrapping the returned value (possibly a [`MultiReturn`]).
#[derive(Debug)]
pub struct ReturnValue {
    pub value: ObjectRef,
}

/// `panic(x)` marker. The payload may be the nil object and is never
/// dereferenced.
#[derive(Debug)]
pub struct PanicError {
    pub payload: ObjectRef,
    pub pos: Pos,
}

/// A selector that embedded-field resolution could not disambiguate. Forced
/// to a field assumption when used as a value.
#[derive(Debug)]
pub struct AmbiguousSelector {
    pub receiver: ObjectRef,
    pub selector: String,
    pub pos: Pos,
}

/// A package as a value: its scope plus (when scanned) its front-end info.
pub struct PackageObject {
    pub name: String,
    pub path: String,
    pub env: Rc<Env>,
    info: RefCell<Option<Rc<PackageInfo>>>,
}

impl PackageObject {
    #[must_use]
    pub fn new(name: &str, path: &str, env: Rc<Env>) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            path: path.to_owned(),
            env,
            info: RefCell::new(None),
        })
    }

    /// The scanned package info; `None` for packages excluded by policy or
    /// failed scans.
    #[must_use]
    pub fn scanned_info(&self) -> Option<Rc<PackageInfo>> {
        self.info.borrow().clone()
    }

    pub fn set_scanned_info(&self, info: Rc<PackageInfo>) {
        *self.info.borrow_mut() = Some(info);
    }

    #[must_use]
    pub fn is_scanned(&self) -> bool {
        self.info.borrow().is_some()
    }
}

impl fmt::Debug for PackageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Package({}{})",
            self.path,
            if self.is_scanned() { "" } else { ", unscanned" }
        )
    }
}

// ============================================================================
// Object
// ============================================================================

#[derive(Debug)]
pub enum Object {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Complex(Complex64),
    String(Rc<str>),
    Boolean(bool),
    Nil,
    Function(Rc<Function>),
    InstantiatedFunction(Rc<InstantiatedFunction>),
    Intrinsic(Intrinsic),
    UnresolvedFunction(Rc<UnresolvedFunction>),
    Type(Rc<TypeObject>),
    Instance(Rc<Instance>),
    Pointer(Rc<Pointer>),
    Variable(Rc<Variable>),
    Channel(Rc<Channel>),
    Slice(Rc<Slice>),
    Map(Rc<MapObject>),
    MultiReturn(Rc<MultiReturn>),
    SymbolicPlaceholder(Rc<Placeholder>),
    ReturnValue(Rc<ReturnValue>),
    Break { label: Option<String> },
    Continue { label: Option<String> },
    Fallthrough,
    PanicError(Rc<PanicError>),
    Error(Rc<EvalError>),
    AmbiguousSelector(Rc<AmbiguousSelector>),
    Package(Rc<PackageObject>),
}

impl Object {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Integer(_) => ObjectKind::Integer,
            Self::Unsigned(_) => ObjectKind::Unsigned,
            Self::Float(_) => ObjectKind::Float,
            Self::Complex(_) => ObjectKind::Complex,
            Self::String(_) => ObjectKind::String,
            Self::Boolean(_) => ObjectKind::Boolean,
            Self::Nil => ObjectKind::Nil,
            Self::Function(_) => ObjectKind::Function,
            Self::InstantiatedFunction(_) => ObjectKind::InstantiatedFunction,
            Self::Intrinsic(_) => ObjectKind::Intrinsic,
            Self::UnresolvedFunction(_) => ObjectKind::UnresolvedFunction,
            Self::Type(_) => ObjectKind::Type,
            Self::Instance(_) => ObjectKind::Instance,
            Self::Pointer(_) => ObjectKind::Pointer,
            Self::Variable(_) => ObjectKind::Variable,
            Self::Channel(_) => ObjectKind::Channel,
            Self::Slice(_) => ObjectKind::Slice,
            Self::Map(_) => ObjectKind::Map,
            Self::MultiReturn(_) => ObjectKind::MultiReturn,
            Self::SymbolicPlaceholder(_) => ObjectKind::SymbolicPlaceholder,
            Self::ReturnValue(_) => ObjectKind::ReturnValue,
            Self::Break { .. } => ObjectKind::Break,
            Self::Continue { .. } => ObjectKind::Continue,
            Self::Fallthrough => ObjectKind::Fallthrough,
            Self::PanicError(_) => ObjectKind::PanicError,
            Self::Error(_) => ObjectKind::Error,
            Self::AmbiguousSelector(_) => ObjectKind::AmbiguousSelector,
            Self::Package(_) => ObjectKind::Package,
        }
    }

    /// Human-readable rendering for debugging and tracer output.
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Unsigned(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Complex(v) => v.to_string(),
            Self::String(s) => format!("{s:?}"),
            Self::Boolean(v) => v.to_string(),
            Self::Nil => "nil".to_owned(),
            Self::Function(f) => format!("func {}", f.qualified_name()),
            Self::InstantiatedFunction(inst) => {
                let args: Vec<String> =
                    inst.type_args.iter().map(|t| t.qualified_name()).collect();
                format!("func {}[{}]", inst.func.qualified_name(), args.join(", "))
            }
            Self::Intrinsic(i) => format!("builtin {}", i.name),
            Self::UnresolvedFunction(u) => format!("func {} (unresolved)", u.qualified_name()),
            Self::Type(t) => format!("type {}", t.info.qualified_name()),
            Self::Instance(i) => format!("{}{{}}", i.type_name),
            Self::Pointer(p) => format!("&{}", p.pointee.inspect()),
            Self::Variable(v) => {
                if v.is_evaluated() {
                    format!("var {} = {}", v.name, v.value().inspect())
                } else {
                    format!("var {} = <lazy>", v.name)
                }
            }
            Self::Channel(c) => match &c.elem {
                Some(elem) => format!("chan {}", elem.type_string()),
                None => "chan".to_owned(),
            },
            Self::Slice(s) => match &s.elem {
                Some(elem) => format!("[]{}", elem.type_string()),
                None => "[]".to_owned(),
            },
            Self::Map(m) => match (&m.key, &m.value) {
                (Some(k), Some(v)) => format!("map[{}]{}", k.type_string(), v.type_string()),
                _ => "map".to_owned(),
            },
            Self::MultiReturn(m) => {
                let parts: Vec<String> = m.values.iter().map(|v| v.inspect()).collect();
                format!("({})", parts.join(", "))
            }
            Self::SymbolicPlaceholder(p) => format!("<symbolic: {}>", p.reason),
            Self::ReturnValue(r) => r.value.inspect(),
            Self::Break { label: Some(l) } => format!("break {l}"),
            Self::Break { label: None } => "break".to_owned(),
            Self::Continue { label: Some(l) } => format!("continue {l}"),
            Self::Continue { label: None } => "continue".to_owned(),
            Self::Fallthrough => "fallthrough".to_owned(),
            Self::PanicError(p) => format!("panic: {}", p.payload.inspect()),
            Self::Error(e) => e.message().to_owned(),
            Self::AmbiguousSelector(a) => format!("<ambiguous selector .{}>", a.selector),
            Self::Package(p) => format!("package {}", p.path),
        }
    }

    /// The static-type pair, when this variant carries one.
    #[must_use]
    pub fn type_hint(&self) -> TypeHint {
        match self {
            Self::Function(f) => f.hint(),
            Self::InstantiatedFunction(inst) => inst.func.hint(),
            Self::UnresolvedFunction(u) => u.hint.clone(),
            Self::Type(t) => TypeHint::of_type(Rc::clone(&t.info)),
            Self::Instance(i) => i.hint.clone(),
            Self::Pointer(p) => p.hint.clone(),
            Self::Variable(v) => v.declared.clone(),
            Self::Channel(c) => c.hint.clone(),
            Self::Slice(s) => s.hint.clone(),
            Self::Map(m) => m.hint.clone(),
            Self::SymbolicPlaceholder(p) => p.hint.clone(),
            _ => TypeHint::none(),
        }
    }

    /// True for objects the evaluator will attempt to call: function
    /// variants, intrinsics, placeholders, and variables (which may hold a
    /// function).
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Self::Function(_)
                | Self::InstantiatedFunction(_)
                | Self::Intrinsic(_)
                | Self::UnresolvedFunction(_)
                | Self::SymbolicPlaceholder(_)
                | Self::Variable(_)
        )
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// True for errors that must abort sibling branches too (recursion,
    /// step, cancellation errors).
    #[must_use]
    pub fn is_fatal_error(&self) -> bool {
        match self {
            Self::Error(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// True for anything that unwinds through enclosing statements.
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Self::ReturnValue(_)
                | Self::Break { .. }
                | Self::Continue { .. }
                | Self::Fallthrough
                | Self::PanicError(_)
                | Self::Error(_)
        )
    }

    // ------------------------------------------------------------------
    // Shorthand constructors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn integer(v: i64) -> ObjectRef {
        Rc::new(Self::Integer(v))
    }

    #[must_use]
    pub fn unsigned(v: u64) -> ObjectRef {
        Rc::new(Self::Unsigned(v))
    }

    #[must_use]
    pub fn float(v: f64) -> ObjectRef {
        Rc::new(Self::Float(v))
    }

    #[must_use]
    pub fn complex(v: Complex64) -> ObjectRef {
        Rc::new(Self::Complex(v))
    }

    #[must_use]
    pub fn string(v: &str) -> ObjectRef {
        Rc::new(Self::String(v.into()))
    }

    #[must_use]
    pub fn boolean(v: bool) -> ObjectRef {
        Rc::new(Self::Boolean(v))
    }

    #[must_use]
    pub fn nil() -> ObjectRef {
        Rc::new(Self::Nil)
    }

    /// A bare placeholder with a reason and no type information.
    #[must_use]
    pub fn placeholder(reason: impl Into<String>) -> ObjectRef {
        Placeholder::new(reason).into_object()
    }

    /// A placeholder carrying a static type.
    #[must_use]
    pub fn typed_placeholder(reason: impl Into<String>, hint: TypeHint) -> ObjectRef {
        Placeholder::new(reason).with_hint(hint).into_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_multiplication() {
        // (2+3i) * (4+5i) = -7 + 22i
        let product = Complex64::new(2.0, 3.0) * Complex64::new(4.0, 5.0);
        assert_eq!(product, Complex64::new(-7.0, 22.0));
        assert_eq!(product.to_string(), "(-7+22i)");
    }

    #[test]
    fn complex_division() {
        let q = Complex64::new(-7.0, 22.0) / Complex64::new(4.0, 5.0);
        assert!((q.re - 2.0).abs() < 1e-12);
        assert!((q.im - 3.0).abs() < 1e-12);
    }

    #[test]
    fn variable_transitions_once() {
        let env = Env::new();
        let v = Variable::lazy("x", None, TypeHint::none(), env, None);
        assert!(!v.is_evaluated());
        v.set_value(Object::integer(7));
        assert!(v.is_evaluated());
        assert!(matches!(*v.value(), Object::Integer(7)));
    }

    #[test]
    fn possible_types_accumulate_without_reset() {
        let env = Env::new();
        let v = Variable::lazy("s", None, TypeHint::none(), env, None);
        v.record_possible_type(TypeInfo::unresolved("a", "T1"));
        v.record_possible_type(TypeInfo::unresolved("b", "T2"));
        v.record_possible_type(TypeInfo::unresolved("a", "T1"));
        let types = v.possible_types();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].qualified_name(), "a.T1");
        assert_eq!(types[1].qualified_name(), "b.T2");
    }

    #[test]
    fn control_flow_markers_are_distinguishable() {
        assert!(Object::Fallthrough.is_control());
        assert!(Object::Break { label: None }.is_control());
        assert!(!Object::Integer(1).is_control());
        assert_eq!(Object::Fallthrough.kind(), ObjectKind::Fallthrough);
    }

    #[test]
    fn placeholder_inspect_carries_reason() {
        let obj = Object::placeholder("call to out-of-policy function");
        assert_eq!(obj.inspect(), "<symbolic: call to out-of-policy function>");
        assert!(obj.is_callable());
    }
}
