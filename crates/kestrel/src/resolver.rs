//! Policy-gated resolution of packages, types, and functions.
//!
//! The resolver is the only component that consults the [`ScanPolicy`]. An
//! in-policy package is scanned and its functions materialize as executable
//! [`Function`] objects; an out-of-policy (or scan-failed) package still
//! gets a cached [`PackageObject`], with an empty scope and no scanned
//! info, and everything reached through it materializes as symbolic
//! placeholders or unresolved functions. Callers above the resolver never
//! see "package missing"; they see objects that cannot be descended into.
//!
//! The package cache and the loading set live here. The loading set turns a
//! cyclic package load into an error instead of unbounded recursion.

use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use tracing::warn;

use crate::{
    env::Env,
    object::{FunctionBuilder, Object, ObjectRef, PackageObject, Placeholder, TypeHint},
    policy::ScanPolicy,
    scanner::{FieldType, FunctionInfo, Scanner, TypeInfo},
    tracer::EvalTracer,
};

/// Resolution outcome for a package load.
pub enum PackageLoad {
    /// The package object, possibly fresh, possibly unscanned.
    Loaded(Rc<PackageObject>),
    /// The path is already being loaded further up the stack.
    Cycle(String),
}

pub struct Resolver {
    scanner: Rc<dyn Scanner>,
    policy: ScanPolicy,
    universe: Rc<Env>,
    packages: AHashMap<String, Rc<PackageObject>>,
    loading: AHashSet<String>,
    /// Function objects by qualified name, so repeated resolution of one
    /// declaration yields one object (memoization and report identity
    /// depend on this).
    functions: AHashMap<String, ObjectRef>,
    /// Every named type of every scanned (in-policy) package, in scan
    /// order. Finalization enumerates these as dispatch candidates.
    seen_types: IndexMap<String, Rc<TypeInfo>>,
}

impl Resolver {
    #[must_use]
    pub fn new(scanner: Rc<dyn Scanner>, policy: ScanPolicy, universe: Rc<Env>) -> Self {
        Self {
            scanner,
            policy,
            universe,
            packages: AHashMap::new(),
            loading: AHashSet::new(),
            functions: AHashMap::new(),
            seen_types: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    #[must_use]
    pub fn scanner(&self) -> &Rc<dyn Scanner> {
        &self.scanner
    }

    /// True when `import_path` is inside the analysis boundary.
    #[must_use]
    pub fn admits(&self, import_path: &str) -> bool {
        self.policy.admits(import_path)
    }

    /// Every package object created so far, in no particular order.
    #[must_use]
    pub fn cached_packages(&self) -> Vec<Rc<PackageObject>> {
        self.packages.values().cloned().collect()
    }

    /// Policy-gated package retrieval. Always yields a cached package
    /// object; an out-of-policy or scan-failed package has no scanned info
    /// and an empty scope.
    pub fn resolve_package(&mut self, path: &str, tracer: &mut dyn EvalTracer) -> PackageLoad {
        if let Some(pkg) = self.packages.get(path) {
            return PackageLoad::Loaded(Rc::clone(pkg));
        }
        if self.loading.contains(path) {
            return PackageLoad::Cycle(path.to_owned());
        }
        self.loading.insert(path.to_owned());

        let in_policy = self.policy.admits(path);
        let scanned = if in_policy {
            match self.scanner.scan_package_by_import(path) {
                Ok(info) => Some(info),
                Err(err) => {
                    warn!(path, error = %err, "package scan failed; treating as opaque");
                    None
                }
            }
        } else {
            None
        };

        let default_name = path.rsplit('/').next().unwrap_or(path);
        let name = scanned
            .as_ref()
            .map_or(default_name, |info| info.name.as_str());
        let env = Env::new_enclosed(&self.universe);
        let pkg = PackageObject::new(name, path, env);
        if let Some(info) = scanned {
            for ty in &info.types {
                self.seen_types.insert(ty.qualified_name(), Rc::clone(ty));
            }
            pkg.set_scanned_info(info);
        }

        self.loading.remove(path);
        self.packages.insert(path.to_owned(), Rc::clone(&pkg));
        tracer.on_package_load(path, in_policy && pkg.is_scanned());
        PackageLoad::Loaded(pkg)
    }

    /// Resolves a type reference to its [`TypeInfo`], following element
    /// types through pointers, slices, channels, and map values. Out-of-
    /// policy targets resolve to an unresolved stand-in carrying the import
    /// path and type name. The result is cached on the `FieldType`.
    pub fn resolve_type(&mut self, field_type: &Rc<FieldType>, tracer: &mut dyn EvalTracer) -> Rc<TypeInfo> {
        if let Some(cached) = field_type.cached_resolution() {
            return cached;
        }
        let resolved = self.resolve_type_uncached(field_type, tracer);
        field_type.cache_resolution(Rc::clone(&resolved));
        resolved
    }

    fn resolve_type_uncached(
        &mut self,
        field_type: &Rc<FieldType>,
        tracer: &mut dyn EvalTracer,
    ) -> Rc<TypeInfo> {
        if field_type.is_pointer || field_type.is_slice || field_type.is_chan || field_type.is_map {
            if let Some(elem) = &field_type.elem {
                return self.resolve_type(elem, tracer);
            }
            return TypeInfo::unresolved("", &field_type.type_string());
        }
        if field_type.is_builtin {
            return TypeInfo::builtin(&field_type.name);
        }
        if field_type.name.is_empty() {
            return TypeInfo::unresolved("", "");
        }
        if field_type.import_path.is_empty() {
            // unqualified non-builtin: can only be resolved by the caller
            // against its own package; treat as opaque here
            return TypeInfo::unresolved("", &field_type.name);
        }
        if !self.policy.admits(&field_type.import_path) {
            return TypeInfo::unresolved(&field_type.import_path, &field_type.name);
        }
        match self.resolve_package(&field_type.import_path, tracer) {
            PackageLoad::Loaded(pkg) => match pkg.scanned_info() {
                Some(info) => info
                    .lookup_type(&field_type.name)
                    .unwrap_or_else(|| TypeInfo::unresolved(&field_type.import_path, &field_type.name)),
                None => TypeInfo::unresolved(&field_type.import_path, &field_type.name),
            },
            PackageLoad::Cycle(_) => TypeInfo::unresolved(&field_type.import_path, &field_type.name),
        }
    }

    /// Materializes a function: an executable [`Function`] when its package
    /// is in policy, otherwise a placeholder tagged with the declaration's
    /// metadata.
    pub fn resolve_function(&mut self, pkg: &Rc<PackageObject>, info: &Rc<FunctionInfo>) -> ObjectRef {
        let key = info.qualified_name();
        if let Some(cached) = self.functions.get(&key) {
            return Rc::clone(cached);
        }
        let obj = if self.policy.admits(&pkg.path) && pkg.is_scanned() {
            let decl = &info.decl;
            let func = FunctionBuilder {
                name: Some(info.name.clone()),
                decl: Some(Rc::clone(decl)),
                type_params: decl.func_type.type_params.clone(),
                params: decl.func_type.params.clone(),
                results: decl.func_type.results.clone(),
                body: decl.body.clone(),
                env: Rc::clone(&pkg.env),
                pkg: Rc::clone(pkg),
                info: Some(Rc::clone(info)),
            }
            .build();
            Rc::new(Object::Function(func))
        } else {
            Placeholder::new(format!("function {key} is out of policy"))
                .with_func(Rc::clone(info))
                .into_object()
        };
        self.functions.insert(key, Rc::clone(&obj));
        obj
    }

    /// Produces the value of a composite literal of type `field_type`: an
    /// [`Instance`](crate::object::Instance) when the type resolves, else a
    /// placeholder with a descriptive reason.
    pub fn resolve_composite_lit(
        &mut self,
        field_type: &Rc<FieldType>,
        tracer: &mut dyn EvalTracer,
    ) -> ObjectRef {
        let info = self.resolve_type(field_type, tracer);
        if info.unresolved {
            return Object::typed_placeholder(
                format!("composite literal of unresolved type {}", field_type.type_string()),
                TypeHint::of_field(Rc::clone(field_type)),
            );
        }
        Rc::new(Object::Instance(Rc::new(crate::object::Instance {
            type_name: info.qualified_name(),
            hint: TypeHint::new(Some(info), Some(Rc::clone(field_type))),
        })))
    }

    /// Looks up an already-created function object by qualified name.
    #[must_use]
    pub fn cached_function(&self, qualified_name: &str) -> Option<ObjectRef> {
        self.functions.get(qualified_name).cloned()
    }

    /// Named types of every scanned package, in first-seen order.
    #[must_use]
    pub fn seen_types(&self) -> Vec<Rc<TypeInfo>> {
        self.seen_types.values().cloned().collect()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resolver(policy={:?}, {} packages cached)",
            self.policy,
            self.packages.len()
        )
    }
}
