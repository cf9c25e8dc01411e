//! The consumed front-end contract.
//!
//! The engine never reads source text. A host supplies an implementation of
//! [`Scanner`] that produces [`PackageInfo`] values (syntax trees plus
//! type-level metadata), and the evaluator treats those as ground truth.
//! Everything in this module is data the front-end hands over: the engine
//! adds resolution caching but never mutates the shapes.
//!
//! Two pieces of real logic live here as provided trait methods so that any
//! front-end gets them for free: converting a type expression to a
//! [`FieldType`] and the structural [`implements`](Scanner::implements)
//! judgment used by finalization.

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;

use crate::syntax::{Expr, ExprKind, File, FileSet, FuncDecl, Pos};

/// Built-in scalar type names recognized without package qualification.
pub(crate) const BUILTIN_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64",
    "complex128", "error", "any",
];

/// Returns true for identifiers visible outside their package (leading
/// uppercase letter).
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Error produced when a package cannot be loaded.
#[derive(Debug, Clone)]
pub enum ScanError {
    /// No package exists at the import path.
    PackageNotFound(String),
    /// The package is already being loaded further up the stack.
    LoadCycle(String),
    /// The front-end failed to scan the package.
    Failed { path: String, message: String },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageNotFound(path) => write!(f, "package not found: {path}"),
            Self::LoadCycle(path) => write!(f, "cyclic package load: {path}"),
            Self::Failed { path, message } => write!(f, "scanning {path} failed: {message}"),
        }
    }
}

impl std::error::Error for ScanError {}

// ============================================================================
// Type metadata
// ============================================================================

/// What kind of declaration produced a [`TypeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Struct,
    Interface,
    Func,
    Alias,
    Unknown,
}

/// A reference to a type as it appears in a signature or field: a name plus
/// the shape modifiers wrapped around it.
///
/// `FieldType` is deliberately resolution-free: it can always be built from
/// syntax alone. Resolution to a [`TypeInfo`] happens later, through the
/// policy-gated resolver, and the result is cached here so repeated lookups
/// of the same reference are cheap.
#[derive(Debug)]
pub struct FieldType {
    /// Bare type name (`Dog`, `int`). Empty for anonymous types.
    pub name: String,
    /// Local package qualifier as written (`impl` in `impl.Dog`). Empty for
    /// builtins and same-package references.
    pub pkg_name: String,
    /// Full import path of the defining package. Empty for builtins.
    pub import_path: String,
    pub is_pointer: bool,
    pub is_slice: bool,
    pub is_map: bool,
    pub is_chan: bool,
    pub is_func: bool,
    pub is_variadic: bool,
    pub is_builtin: bool,
    /// Element type for pointers, slices, channels, and map values.
    pub elem: Option<Rc<FieldType>>,
    /// Key type for maps.
    pub key: Option<Rc<FieldType>>,
    /// Type arguments on an instantiated generic reference (`List[int]`).
    pub type_args: Vec<Rc<FieldType>>,
    resolved: RefCell<Option<Rc<TypeInfo>>>,
}

impl FieldType {
    #[must_use]
    pub fn named(pkg_name: &str, import_path: &str, name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            pkg_name: pkg_name.to_owned(),
            import_path: import_path.to_owned(),
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn builtin(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            is_builtin: true,
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn pointer_to(elem: Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            is_pointer: true,
            elem: Some(elem),
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn slice_of(elem: Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            is_slice: true,
            elem: Some(elem),
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn map_of(key: Rc<Self>, value: Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            is_map: true,
            key: Some(key),
            elem: Some(value),
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn chan_of(elem: Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            is_chan: true,
            elem: Some(elem),
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn func_type() -> Rc<Self> {
        Rc::new(Self {
            name: "func".to_owned(),
            is_func: true,
            ..Self::empty()
        })
    }

    #[must_use]
    pub fn variadic(elem: Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            is_slice: true,
            is_variadic: true,
            elem: Some(elem),
            ..Self::empty()
        })
    }

    /// An unparseable or unsupported reference; resolves to nothing.
    #[must_use]
    pub fn unknown() -> Rc<Self> {
        Rc::new(Self::empty())
    }

    #[must_use]
    pub fn with_type_args(self: &Rc<Self>, type_args: Vec<Rc<Self>>) -> Rc<Self> {
        Rc::new(Self {
            name: self.name.clone(),
            pkg_name: self.pkg_name.clone(),
            import_path: self.import_path.clone(),
            is_pointer: self.is_pointer,
            is_slice: self.is_slice,
            is_map: self.is_map,
            is_chan: self.is_chan,
            is_func: self.is_func,
            is_variadic: self.is_variadic,
            is_builtin: self.is_builtin,
            elem: self.elem.clone(),
            key: self.key.clone(),
            type_args,
            resolved: RefCell::new(None),
        })
    }

    fn empty() -> Self {
        Self {
            name: String::new(),
            pkg_name: String::new(),
            import_path: String::new(),
            is_pointer: false,
            is_slice: false,
            is_map: false,
            is_chan: false,
            is_func: false,
            is_variadic: false,
            is_builtin: false,
            elem: None,
            key: None,
            type_args: Vec::new(),
            resolved: RefCell::new(None),
        }
    }

    /// Returns the cached resolution, if any. The resolver is the only
    /// writer.
    #[must_use]
    pub fn cached_resolution(&self) -> Option<Rc<TypeInfo>> {
        self.resolved.borrow().clone()
    }

    pub fn cache_resolution(&self, info: Rc<TypeInfo>) {
        *self.resolved.borrow_mut() = Some(info);
    }

    /// True when the reference is a bare named type (no shape modifiers).
    #[must_use]
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
            && !self.is_pointer
            && !self.is_slice
            && !self.is_map
            && !self.is_chan
            && !self.is_func
    }

    /// Source-like rendering: `*impl.Dog`, `[]byte`, `map[string]int`.
    #[must_use]
    pub fn type_string(&self) -> String {
        if self.is_pointer {
            let inner = self.elem.as_ref().map_or_else(String::new, |e| e.type_string());
            return format!("*{inner}");
        }
        if self.is_slice {
            let inner = self.elem.as_ref().map_or_else(String::new, |e| e.type_string());
            if self.is_variadic {
                return format!("...{inner}");
            }
            return format!("[]{inner}");
        }
        if self.is_map {
            let k = self.key.as_ref().map_or_else(String::new, |e| e.type_string());
            let v = self.elem.as_ref().map_or_else(String::new, |e| e.type_string());
            return format!("map[{k}]{v}");
        }
        if self.is_chan {
            let inner = self.elem.as_ref().map_or_else(String::new, |e| e.type_string());
            return format!("chan {inner}");
        }
        let mut out = String::new();
        if !self.pkg_name.is_empty() {
            out.push_str(&self.pkg_name);
            out.push('.');
        }
        out.push_str(&self.name);
        if !self.type_args.is_empty() {
            out.push('[');
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&arg.type_string());
            }
            out.push(']');
        }
        out
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_string())
    }
}

/// One named field of a struct, or one parameter/result of a function.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: Rc<FieldType>,
    pub embedded: bool,
}

impl FieldInfo {
    #[must_use]
    pub fn new(name: &str, field_type: Rc<FieldType>) -> Self {
        Self {
            name: name.to_owned(),
            field_type,
            embedded: false,
        }
    }

    #[must_use]
    pub fn embedded(field_type: Rc<FieldType>) -> Self {
        Self {
            name: String::new(),
            field_type,
            embedded: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructInfo {
    pub fields: Vec<FieldInfo>,
}

/// One method of an interface's method list.
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Rc<FieldType>>,
    pub results: Vec<Rc<FieldType>>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceInfo {
    pub methods: Vec<MethodSig>,
}

/// Type-level metadata for one declared type.
#[derive(Debug)]
pub struct TypeInfo {
    pub name: String,
    /// Import path of the defining package. Empty for builtins and for
    /// unresolved placeholders whose package was never scanned.
    pub pkg_path: String,
    pub kind: TypeDeclKind,
    pub struct_info: Option<StructInfo>,
    pub interface_info: Option<InterfaceInfo>,
    /// Methods declared with this type as receiver (value or pointer).
    pub methods: Vec<Rc<FunctionInfo>>,
    /// The declaration's right-hand side as a type reference.
    pub underlying: Option<Rc<FieldType>>,
    pub type_params: Vec<String>,
    /// True when this stands in for a type in an unscanned package: only
    /// `name` and `pkg_path` are meaningful.
    pub unresolved: bool,
}

impl TypeInfo {
    /// A stand-in for a type whose package is out of policy or failed to
    /// scan.
    #[must_use]
    pub fn unresolved(pkg_path: &str, name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            pkg_path: pkg_path.to_owned(),
            kind: TypeDeclKind::Unknown,
            struct_info: None,
            interface_info: None,
            methods: Vec::new(),
            underlying: None,
            type_params: Vec::new(),
            unresolved: true,
        })
    }

    /// Metadata for a built-in scalar type (`int`, `string`, …).
    #[must_use]
    pub fn builtin(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_owned(),
            pkg_path: String::new(),
            kind: TypeDeclKind::Alias,
            struct_info: None,
            interface_info: None,
            methods: Vec::new(),
            underlying: None,
            type_params: Vec::new(),
            unresolved: false,
        })
    }

    /// `import/path.Name`, or the bare name for builtins.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.pkg_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.pkg_path, self.name)
        }
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeDeclKind::Interface
    }

    /// Looks up an interface method by name.
    #[must_use]
    pub fn interface_method(&self, name: &str) -> Option<&MethodSig> {
        self.interface_info
            .as_ref()
            .and_then(|info| info.methods.iter().find(|m| m.name == name))
    }

    /// Looks up a declared method by name, optionally admitting pointer
    /// receivers.
    #[must_use]
    pub fn method(&self, name: &str, include_pointer: bool) -> Option<Rc<FunctionInfo>> {
        self.methods
            .iter()
            .find(|m| {
                m.name == name
                    && (include_pointer
                        || !m.receiver.as_ref().is_some_and(|r| r.field_type.is_pointer))
            })
            .cloned()
    }
}

/// Metadata for one function or method declaration.
#[derive(Debug)]
pub struct FunctionInfo {
    pub name: String,
    pub pkg_path: String,
    /// Absolute path of the defining file.
    pub file: String,
    pub doc: Option<String>,
    pub receiver: Option<FieldInfo>,
    pub type_params: Vec<String>,
    pub params: Vec<FieldInfo>,
    pub results: Vec<FieldInfo>,
    pub decl: Rc<FuncDecl>,
}

impl FunctionInfo {
    /// The spelling intrinsic keys use: `path.Func`, `(path.T).Method`,
    /// `(*path.T).Method`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.receiver {
            None => format!("{}.{}", self.pkg_path, self.name),
            Some(recv) => {
                let ft = &recv.field_type;
                let (star, base) = if ft.is_pointer {
                    let name = ft.elem.as_ref().map_or("", |e| e.name.as_str());
                    ("*", name)
                } else {
                    ("", ft.name.as_str())
                };
                format!("({star}{}.{base}).{}", self.pkg_path, self.name)
            }
        }
    }

    #[must_use]
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Eagerly-populated constant declaration.
#[derive(Debug, Clone)]
pub struct ConstantInfo {
    pub pos: Pos,
    pub name: String,
    pub type_expr: Option<Rc<Expr>>,
    pub value: Option<Rc<Expr>>,
}

/// Lazily-populated package variable declaration. A single spec can bind
/// several names to one multi-valued initializer.
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub pos: Pos,
    pub names: Vec<String>,
    pub type_expr: Option<Rc<Expr>>,
    pub values: Vec<Rc<Expr>>,
}

/// Everything the front-end knows about one package.
#[derive(Debug)]
pub struct PackageInfo {
    pub name: String,
    pub import_path: String,
    pub files: Vec<Rc<File>>,
    pub types: Vec<Rc<TypeInfo>>,
    pub constants: Vec<ConstantInfo>,
    pub variables: Vec<VariableInfo>,
    pub functions: Vec<Rc<FunctionInfo>>,
}

impl PackageInfo {
    #[must_use]
    pub fn lookup_type(&self, name: &str) -> Option<Rc<TypeInfo>> {
        self.types.iter().find(|t| t.name == name).cloned()
    }

    #[must_use]
    pub fn lookup_function(&self, name: &str) -> Option<Rc<FunctionInfo>> {
        self.functions
            .iter()
            .find(|f| f.name == name && f.receiver.is_none())
            .cloned()
    }

    #[must_use]
    pub fn file_by_path(&self, path: &str) -> Option<Rc<File>> {
        self.files.iter().find(|f| f.path == path).cloned()
    }
}

// ============================================================================
// The scanner contract
// ============================================================================

/// The front-end the engine drives.
///
/// `scan_package_by_import` is the only loading primitive the evaluator
/// uses during execution; `scan` exists for hosts that seed evaluation from
/// a pattern. The provided methods implement front-end-independent logic on
/// top of the data contract.
pub trait Scanner {
    /// Loads every package matching a pattern (front-end defined syntax).
    fn scan(&self, pattern: &str) -> Result<Vec<Rc<PackageInfo>>, ScanError>;

    /// Loads a single package by import path, scanning it if necessary.
    fn scan_package_by_import(&self, path: &str) -> Result<Rc<PackageInfo>, ScanError>;

    /// The shared position table for everything this scanner produced.
    fn file_set(&self) -> Rc<FileSet>;

    /// Every package the scanner has ever produced, in load order.
    fn all_seen_packages(&self) -> Vec<Rc<PackageInfo>>;

    /// Maps local names bound by a file's imports to import paths.
    fn build_import_lookup(&self, file: &File) -> AHashMap<String, String> {
        let mut lookup = AHashMap::with_capacity(file.imports.len());
        for spec in &file.imports {
            lookup.insert(spec.local_name().to_owned(), spec.path.clone());
        }
        lookup
    }

    /// Converts a type expression into a [`FieldType`], resolving package
    /// qualifiers through `imports` and unqualified names against `pkg`.
    fn type_info_from_expr(
        &self,
        expr: &Expr,
        pkg: &PackageInfo,
        imports: &AHashMap<String, String>,
    ) -> Rc<FieldType> {
        match &expr.kind {
            ExprKind::Ident(name) => {
                if BUILTIN_TYPES.contains(&name.as_str()) {
                    FieldType::builtin(name)
                } else {
                    FieldType::named(&pkg.name, &pkg.import_path, name)
                }
            }
            ExprKind::Selector { x, sel } => {
                let local = Expr::unparen(x);
                let Some(local_name) = local.as_ident() else {
                    return FieldType::unknown();
                };
                let path = imports
                    .get(local_name)
                    .cloned()
                    .unwrap_or_else(|| local_name.to_owned());
                FieldType::named(local_name, &path, sel)
            }
            ExprKind::Star(inner) => {
                FieldType::pointer_to(self.type_info_from_expr(inner, pkg, imports))
            }
            ExprKind::ArrayType { elem, .. } => {
                FieldType::slice_of(self.type_info_from_expr(elem, pkg, imports))
            }
            ExprKind::MapType { key, value } => FieldType::map_of(
                self.type_info_from_expr(key, pkg, imports),
                self.type_info_from_expr(value, pkg, imports),
            ),
            ExprKind::ChanType { elem, .. } => {
                FieldType::chan_of(self.type_info_from_expr(elem, pkg, imports))
            }
            ExprKind::Ellipsis(Some(inner)) => {
                FieldType::variadic(self.type_info_from_expr(inner, pkg, imports))
            }
            ExprKind::FuncType(_) => FieldType::func_type(),
            ExprKind::InterfaceType { .. } => FieldType::builtin("any"),
            ExprKind::StructType { .. } => FieldType::unknown(),
            ExprKind::Paren(inner) => self.type_info_from_expr(inner, pkg, imports),
            ExprKind::Index { x, index } => {
                let base = self.type_info_from_expr(x, pkg, imports);
                let arg = self.type_info_from_expr(index, pkg, imports);
                base.with_type_args(vec![arg])
            }
            ExprKind::IndexList { x, indices } => {
                let base = self.type_info_from_expr(x, pkg, imports);
                let args = indices
                    .iter()
                    .map(|ix| self.type_info_from_expr(ix, pkg, imports))
                    .collect();
                base.with_type_args(args)
            }
            _ => FieldType::unknown(),
        }
    }

    /// Structural implements-check: every interface method must appear in
    /// the concrete type's method set with matching name and arity. Pointer
    /// receivers count; the finalizer treats pointer and value receivers
    /// alike when resolving dispatch.
    fn implements(&self, concrete: &TypeInfo, iface: &TypeInfo) -> bool {
        let Some(iface_info) = iface.interface_info.as_ref() else {
            return false;
        };
        if concrete.unresolved || concrete.is_interface() {
            return false;
        }
        iface_info.methods.iter().all(|sig| {
            concrete.methods.iter().any(|m| {
                m.name == sig.name
                    && m.params.len() == sig.params.len()
                    && m.results.len() == sig.results.len()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{FuncTypeExpr, ParamDecl};

    fn method_info(name: &str, params: usize, results: usize, pointer_recv: bool) -> Rc<FunctionInfo> {
        let recv_ft = if pointer_recv {
            FieldType::pointer_to(FieldType::named("impl", "example.com/impl", "Dog"))
        } else {
            FieldType::named("impl", "example.com/impl", "Dog")
        };
        Rc::new(FunctionInfo {
            name: name.to_owned(),
            pkg_path: "example.com/impl".to_owned(),
            file: String::new(),
            doc: None,
            receiver: Some(FieldInfo::new("d", recv_ft)),
            type_params: Vec::new(),
            params: (0..params)
                .map(|i| FieldInfo::new(&format!("p{i}"), FieldType::builtin("int")))
                .collect(),
            results: (0..results)
                .map(|_| FieldInfo::new("", FieldType::builtin("string")))
                .collect(),
            decl: Rc::new(FuncDecl {
                pos: Pos::NONE,
                name: name.to_owned(),
                recv: Some(ParamDecl {
                    names: vec!["d".to_owned()],
                    type_expr: None,
                }),
                func_type: FuncTypeExpr::default(),
                body: None,
            }),
        })
    }

    struct NullScanner;

    impl Scanner for NullScanner {
        fn scan(&self, _pattern: &str) -> Result<Vec<Rc<PackageInfo>>, ScanError> {
            Ok(Vec::new())
        }
        fn scan_package_by_import(&self, path: &str) -> Result<Rc<PackageInfo>, ScanError> {
            Err(ScanError::PackageNotFound(path.to_owned()))
        }
        fn file_set(&self) -> Rc<FileSet> {
            FileSet::new()
        }
        fn all_seen_packages(&self) -> Vec<Rc<PackageInfo>> {
            Vec::new()
        }
    }

    #[test]
    fn implements_matches_name_and_arity() {
        let iface = TypeInfo {
            name: "Speaker".to_owned(),
            pkg_path: "example.com/def".to_owned(),
            kind: TypeDeclKind::Interface,
            struct_info: None,
            interface_info: Some(InterfaceInfo {
                methods: vec![MethodSig {
                    name: "Speak".to_owned(),
                    params: Vec::new(),
                    results: vec![FieldType::builtin("string")],
                }],
            }),
            methods: Vec::new(),
            underlying: None,
            type_params: Vec::new(),
            unresolved: false,
        };
        let concrete = TypeInfo {
            name: "Dog".to_owned(),
            pkg_path: "example.com/impl".to_owned(),
            kind: TypeDeclKind::Struct,
            struct_info: Some(StructInfo::default()),
            interface_info: None,
            methods: vec![method_info("Speak", 0, 1, true)],
            underlying: None,
            type_params: Vec::new(),
            unresolved: false,
        };
        assert!(NullScanner.implements(&concrete, &iface));

        let wrong_arity = TypeInfo {
            methods: vec![method_info("Speak", 1, 1, true)],
            ..concrete
        };
        assert!(!NullScanner.implements(&wrong_arity, &iface));
    }

    #[test]
    fn qualified_names_spell_receivers() {
        let m = method_info("Speak", 0, 1, true);
        assert_eq!(m.qualified_name(), "(*example.com/impl.Dog).Speak");
        let m = method_info("Speak", 0, 1, false);
        assert_eq!(m.qualified_name(), "(example.com/impl.Dog).Speak");
    }

    #[test]
    fn field_type_strings() {
        let dog = FieldType::named("impl", "example.com/impl", "Dog");
        assert_eq!(FieldType::pointer_to(Rc::clone(&dog)).type_string(), "*impl.Dog");
        assert_eq!(FieldType::slice_of(Rc::clone(&dog)).type_string(), "[]impl.Dog");
        assert_eq!(
            FieldType::map_of(FieldType::builtin("string"), dog).type_string(),
            "map[string]impl.Dog"
        );
    }
}
