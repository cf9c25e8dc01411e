//! Shared fixtures: an in-memory `Scanner` over hand-built packages, plus
//! constructors that keep the test suites readable.
//!
//! Tests build syntax trees and package metadata directly instead of
//! parsing source text: the front-end is outside the engine's boundary,
//! and hand-built trees make each scenario's shape explicit.

#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use kestrel::{
    DefaultIntrinsicFn, Evaluator, Object, ObjectRef, ScanPolicy,
    scanner::{
        ConstantInfo, FieldInfo, FieldType, FunctionInfo, InterfaceInfo, MethodSig, PackageInfo,
        ScanError, Scanner, StructInfo, TypeDeclKind, TypeInfo, VariableInfo,
    },
    syntax::{
        AssignOp, BinaryOp, Block, Decl, DeclKind, Expr, ExprKind, FieldDecl, File, FileSet,
        FuncDecl, FuncTypeExpr, GenDecl, ImportSpec, Lit, LitKind, ParamDecl, Pos, Spec, Stmt,
        StmtKind, UnaryOp, ValueSpec,
    },
};

// ============================================================================
// Scanner fixture
// ============================================================================

/// An in-memory scanner over pre-registered packages.
pub struct FixtureScanner {
    fileset: Rc<FileSet>,
    packages: RefCell<AHashMap<String, Rc<PackageInfo>>>,
    seen: RefCell<Vec<Rc<PackageInfo>>>,
}

impl FixtureScanner {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            fileset: FileSet::new(),
            packages: RefCell::new(AHashMap::new()),
            seen: RefCell::new(Vec::new()),
        })
    }

    pub fn add_package(&self, info: PackageInfo) {
        self.packages
            .borrow_mut()
            .insert(info.import_path.clone(), Rc::new(info));
    }
}

impl Scanner for FixtureScanner {
    fn scan(&self, pattern: &str) -> Result<Vec<Rc<PackageInfo>>, ScanError> {
        let packages = self.packages.borrow();
        let mut found: Vec<Rc<PackageInfo>> = packages
            .values()
            .filter(|p| pattern == "./..." || p.import_path.starts_with(pattern))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.import_path.cmp(&b.import_path));
        Ok(found)
    }

    fn scan_package_by_import(&self, path: &str) -> Result<Rc<PackageInfo>, ScanError> {
        match self.packages.borrow().get(path) {
            Some(info) => {
                self.seen.borrow_mut().push(Rc::clone(info));
                Ok(Rc::clone(info))
            }
            None => Err(ScanError::PackageNotFound(path.to_owned())),
        }
    }

    fn file_set(&self) -> Rc<FileSet> {
        Rc::clone(&self.fileset)
    }

    fn all_seen_packages(&self) -> Vec<Rc<PackageInfo>> {
        self.seen.borrow().clone()
    }
}

impl std::fmt::Debug for FixtureScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FixtureScanner({} packages)", self.packages.borrow().len())
    }
}

// ============================================================================
// Evaluator setup
// ============================================================================

pub const MAIN: &str = "example.com/main";

/// An empty main package, for tests that evaluate bare expressions.
pub fn empty_main() -> PackageInfo {
    package("main", MAIN, vec![], vec![], vec![])
}

pub fn setup(packages: Vec<PackageInfo>) -> Evaluator {
    setup_with_policy(packages, ScanPolicy::allow_all())
}

pub fn setup_with_policy(packages: Vec<PackageInfo>, policy: ScanPolicy) -> Evaluator {
    let scanner = FixtureScanner::new();
    for p in packages {
        scanner.add_package(p);
    }
    Evaluator::new(scanner, policy)
}

/// Loads the main package and applies its `main` function.
pub fn apply_main(ev: &mut Evaluator) -> ObjectRef {
    let pkg = ev.package(MAIN).expect("main package loads");
    let main = pkg.env.get("main").expect("main function bound");
    ev.apply(&main, vec![], &pkg)
}

// ============================================================================
// Expression constructors
// ============================================================================

pub fn ident(name: &str) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::Ident(name.to_owned()))
}

pub fn lit_int(text: &str) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::BasicLit(Lit {
            kind: LitKind::Int,
            text: text.to_owned(),
        }),
    )
}

pub fn lit_float(text: &str) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::BasicLit(Lit {
            kind: LitKind::Float,
            text: text.to_owned(),
        }),
    )
}

pub fn lit_imag(text: &str) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::BasicLit(Lit {
            kind: LitKind::Imag,
            text: text.to_owned(),
        }),
    )
}

pub fn lit_str(text: &str) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::BasicLit(Lit {
            kind: LitKind::Str,
            text: text.to_owned(),
        }),
    )
}

pub fn lit_char(text: &str) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::BasicLit(Lit {
            kind: LitKind::Char,
            text: text.to_owned(),
        }),
    )
}

pub fn bin(x: Rc<Expr>, op: BinaryOp, y: Rc<Expr>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::Binary { x, op, y })
}

pub fn un(op: UnaryOp, x: Rc<Expr>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::Unary { op, x })
}

pub fn addr(x: Rc<Expr>) -> Rc<Expr> {
    un(UnaryOp::And, x)
}

pub fn star(x: Rc<Expr>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::Star(x))
}

pub fn paren(x: Rc<Expr>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::Paren(x))
}

pub fn sel(x: Rc<Expr>, name: &str) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::Selector {
            x,
            sel: name.to_owned(),
        },
    )
}

pub fn call(func: Rc<Expr>, args: Vec<Rc<Expr>>) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::Call {
            func,
            args,
            ellipsis: false,
        },
    )
}

pub fn composite(type_expr: Option<Rc<Expr>>, elts: Vec<Rc<Expr>>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::CompositeLit { type_expr, elts })
}

pub fn kv(key: Rc<Expr>, value: Rc<Expr>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::KeyValue { key, value })
}

pub fn index_list(x: Rc<Expr>, indices: Vec<Rc<Expr>>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::IndexList { x, indices })
}

pub fn slice_type(elem: Rc<Expr>) -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::ArrayType { len: None, elem })
}

pub fn chan_type(elem: Rc<Expr>) -> Rc<Expr> {
    Expr::new(
        Pos::NONE,
        ExprKind::ChanType {
            dir: kestrel::syntax::ChanDir::Both,
            elem,
        },
    )
}

pub fn func_type_expr() -> Rc<Expr> {
    Expr::new(Pos::NONE, ExprKind::FuncType(FuncTypeExpr::default()))
}

// ============================================================================
// Statement constructors
// ============================================================================

pub fn expr_stmt(e: Rc<Expr>) -> Rc<Stmt> {
    Stmt::new(Pos::NONE, StmtKind::Expr(e))
}

pub fn ret_stmt(values: Vec<Rc<Expr>>) -> Rc<Stmt> {
    Stmt::new(Pos::NONE, StmtKind::Return(values))
}

pub fn assign(lhs: Vec<Rc<Expr>>, rhs: Vec<Rc<Expr>>) -> Rc<Stmt> {
    Stmt::new(
        Pos::NONE,
        StmtKind::Assign {
            lhs,
            op: AssignOp::Assign,
            rhs,
        },
    )
}

pub fn define(lhs: Vec<Rc<Expr>>, rhs: Vec<Rc<Expr>>) -> Rc<Stmt> {
    Stmt::new(
        Pos::NONE,
        StmtKind::Assign {
            lhs,
            op: AssignOp::Define,
            rhs,
        },
    )
}

pub fn block(stmts: Vec<Rc<Stmt>>) -> Rc<Block> {
    Rc::new(Block {
        pos: Pos::NONE,
        stmts,
    })
}

// ============================================================================
// Declaration constructors
// ============================================================================

pub fn param(name: &str, type_expr: Option<Rc<Expr>>) -> ParamDecl {
    ParamDecl {
        names: if name.is_empty() {
            Vec::new()
        } else {
            vec![name.to_owned()]
        },
        type_expr,
    }
}

pub fn func_decl(
    name: &str,
    recv: Option<ParamDecl>,
    type_params: Vec<ParamDecl>,
    params: Vec<ParamDecl>,
    results: Vec<ParamDecl>,
    body: Option<Rc<Block>>,
) -> Rc<FuncDecl> {
    Rc::new(FuncDecl {
        pos: Pos::NONE,
        name: name.to_owned(),
        recv,
        func_type: FuncTypeExpr {
            type_params,
            params,
            results,
        },
        body,
    })
}

pub fn var_decl(names: Vec<&str>, type_expr: Option<Rc<Expr>>, values: Vec<Rc<Expr>>) -> Decl {
    Decl::Gen(Rc::new(GenDecl {
        pos: Pos::NONE,
        kind: DeclKind::Var,
        specs: vec![Spec::Value(ValueSpec {
            pos: Pos::NONE,
            names: names.into_iter().map(str::to_owned).collect(),
            type_expr,
            values,
        })],
    }))
}

pub fn const_decl(names: Vec<&str>, type_expr: Option<Rc<Expr>>, values: Vec<Rc<Expr>>) -> Decl {
    Decl::Gen(Rc::new(GenDecl {
        pos: Pos::NONE,
        kind: DeclKind::Const,
        specs: vec![Spec::Value(ValueSpec {
            pos: Pos::NONE,
            names: names.into_iter().map(str::to_owned).collect(),
            type_expr,
            values,
        })],
    }))
}

pub fn file(
    path: &str,
    package_name: &str,
    imports: Vec<(Option<&str>, &str)>,
    decls: Vec<Decl>,
) -> Rc<File> {
    Rc::new(File {
        pos: Pos::NONE,
        path: path.to_owned(),
        package_name: package_name.to_owned(),
        imports: imports
            .into_iter()
            .map(|(alias, import_path)| ImportSpec {
                pos: Pos::NONE,
                alias: alias.map(str::to_owned),
                path: import_path.to_owned(),
            })
            .collect(),
        decls,
    })
}

// ============================================================================
// Metadata constructors
// ============================================================================

pub fn field(name: &str, field_type: Rc<FieldType>) -> FieldInfo {
    FieldInfo::new(name, field_type)
}

pub fn embedded_field(field_type: Rc<FieldType>) -> FieldInfo {
    FieldInfo::embedded(field_type)
}

pub fn named_ft(pkg_name: &str, import_path: &str, name: &str) -> Rc<FieldType> {
    FieldType::named(pkg_name, import_path, name)
}

pub fn builtin_ft(name: &str) -> Rc<FieldType> {
    FieldType::builtin(name)
}

pub fn msig(name: &str, params: Vec<Rc<FieldType>>, results: Vec<Rc<FieldType>>) -> MethodSig {
    MethodSig {
        name: name.to_owned(),
        params,
        results,
    }
}

pub fn func_info(
    pkg_path: &str,
    name: &str,
    decl: Rc<FuncDecl>,
    params: Vec<FieldInfo>,
    results: Vec<FieldInfo>,
) -> Rc<FunctionInfo> {
    Rc::new(FunctionInfo {
        name: name.to_owned(),
        pkg_path: pkg_path.to_owned(),
        file: String::new(),
        doc: None,
        receiver: None,
        type_params: Vec::new(),
        params,
        results,
        decl,
    })
}

pub fn method_fn_info(
    pkg_path: &str,
    receiver: FieldInfo,
    name: &str,
    decl: Rc<FuncDecl>,
    params: Vec<FieldInfo>,
    results: Vec<FieldInfo>,
) -> Rc<FunctionInfo> {
    Rc::new(FunctionInfo {
        name: name.to_owned(),
        pkg_path: pkg_path.to_owned(),
        file: String::new(),
        doc: None,
        receiver: Some(receiver),
        type_params: Vec::new(),
        params,
        results,
        decl,
    })
}

pub fn struct_type(
    pkg_path: &str,
    name: &str,
    fields: Vec<FieldInfo>,
    methods: Vec<Rc<FunctionInfo>>,
) -> Rc<TypeInfo> {
    Rc::new(TypeInfo {
        name: name.to_owned(),
        pkg_path: pkg_path.to_owned(),
        kind: TypeDeclKind::Struct,
        struct_info: Some(StructInfo { fields }),
        interface_info: None,
        methods,
        underlying: None,
        type_params: Vec::new(),
        unresolved: false,
    })
}

pub fn iface_type(pkg_path: &str, name: &str, methods: Vec<MethodSig>) -> Rc<TypeInfo> {
    Rc::new(TypeInfo {
        name: name.to_owned(),
        pkg_path: pkg_path.to_owned(),
        kind: TypeDeclKind::Interface,
        struct_info: None,
        interface_info: Some(InterfaceInfo { methods }),
        methods: Vec::new(),
        underlying: None,
        type_params: Vec::new(),
        unresolved: false,
    })
}

pub fn package(
    name: &str,
    import_path: &str,
    files: Vec<Rc<File>>,
    types: Vec<Rc<TypeInfo>>,
    functions: Vec<Rc<FunctionInfo>>,
) -> PackageInfo {
    PackageInfo {
        name: name.to_owned(),
        import_path: import_path.to_owned(),
        files,
        types,
        constants: Vec::<ConstantInfo>::new(),
        variables: Vec::<VariableInfo>::new(),
        functions,
    }
}

/// A struct type declaration for the AST side of a fixture (the metadata
/// side is built with [`struct_type`]).
pub fn type_decl(name: &str, fields: Vec<FieldDecl>) -> Decl {
    Decl::Gen(Rc::new(GenDecl {
        pos: Pos::NONE,
        kind: DeclKind::Type,
        specs: vec![Spec::Type(kestrel::syntax::TypeSpec {
            pos: Pos::NONE,
            name: name.to_owned(),
            type_params: Vec::new(),
            is_alias: false,
            type_expr: Expr::new(Pos::NONE, ExprKind::StructType { fields }),
        })],
    }))
}

// ============================================================================
// Intrinsic helpers
// ============================================================================

/// A default intrinsic that records the qualified name of every observed
/// callee, plus any function-valued arguments, and never short-circuits.
pub fn collecting_intrinsic() -> (Rc<RefCell<Vec<String>>>, DefaultIntrinsicFn) {
    let used: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&used);
    let intrinsic: DefaultIntrinsicFn = Rc::new(move |_ev, callee, args| {
        if let Some(name) = describe_callable(callee) {
            sink.borrow_mut().push(name);
        }
        for arg in args {
            if let Object::Function(f) = &**arg {
                sink.borrow_mut().push(f.qualified_name());
            }
        }
        None
    });
    (used, intrinsic)
}

fn describe_callable(obj: &ObjectRef) -> Option<String> {
    match &**obj {
        Object::Function(f) => Some(f.qualified_name()),
        Object::InstantiatedFunction(inst) => Some(inst.func.qualified_name()),
        Object::UnresolvedFunction(u) => Some(u.qualified_name()),
        Object::SymbolicPlaceholder(p) => {
            p.underlying_func.as_ref().map(|i| i.qualified_name())
        }
        _ => None,
    }
}

/// Unwraps an object expected to be a concrete evaluation result, failing
/// the test with the error message otherwise.
pub fn expect_ok(result: &ObjectRef, ev: &Evaluator) -> ObjectRef {
    if let Object::Error(err) = &**result {
        panic!("unexpected error: {}", err.render(&ev.file_set()));
    }
    Rc::clone(result)
}
