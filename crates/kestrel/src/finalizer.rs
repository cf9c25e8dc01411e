//! Interface-dispatch resolution.
//!
//! During evaluation, method calls through interface-typed receivers are
//! only *recorded*; collection is cheap and monotonic. Finalization is the
//! single pass that collapses those records: for every recorded
//! `Iface.Method`, every in-policy struct type ever seen is asked whether
//! it implements the interface, each implementer's concrete method is
//! resolved to a function object, and the default intrinsic is invoked with
//! it so analyses observe the concrete callee as used.
//!
//! Finalization is idempotent: it reads the recorded state, never mutates
//! it, and resolves methods through the resolver's function cache, so a
//! second run produces the same intrinsic invocations.

use std::rc::Rc;

use tracing::debug;

use crate::{
    accessor::{self, Lookup},
    evaluator::Evaluator,
    object::ObjectRef,
    scanner::TypeDeclKind,
};

/// One interface call resolved to a concrete method.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedDispatch {
    /// The recorded key: `import/path.Iface.Method`.
    pub interface_key: String,
    /// Qualified name of the implementing type.
    pub concrete_type: String,
    /// Qualified name of the resolved method, e.g. `(*path.T).Method`.
    pub function: String,
}

/// Everything finalization resolved, in deterministic record order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FinalizeReport {
    pub resolved: Vec<ResolvedDispatch>,
}

impl FinalizeReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// The resolved concrete function names, deduplicated, in order.
    #[must_use]
    pub fn functions(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for dispatch in &self.resolved {
            if !seen.contains(&dispatch.function) {
                seen.push(dispatch.function.clone());
            }
        }
        seen
    }
}

impl Evaluator {
    /// Resolves every recorded interface call against the in-policy types
    /// seen during evaluation. Safe to call repeatedly.
    pub fn finalize(&mut self) -> FinalizeReport {
        let mut report = FinalizeReport::default();
        let scanner = Rc::clone(self.resolver.scanner());

        // snapshot both tables: resolution must not observe its own work
        let calls: Vec<(String, Rc<crate::scanner::TypeInfo>, String)> = self
            .iface_calls
            .iter()
            .map(|(key, call)| (key.clone(), Rc::clone(&call.iface), call.method.clone()))
            .collect();
        let candidates: Vec<Rc<crate::scanner::TypeInfo>> = self.resolver.seen_types();

        for (key, iface, method) in calls {
            for candidate in &candidates {
                if candidate.kind != TypeDeclKind::Struct {
                    continue;
                }
                if !self.resolver.admits(&candidate.pkg_path) {
                    continue;
                }
                if !scanner.implements(candidate, &iface) {
                    continue;
                }
                let Some(func) = self.resolve_concrete_method(candidate, &method) else {
                    debug!(
                        iface = %key,
                        concrete = %candidate.qualified_name(),
                        method = %method,
                        "implementer without locatable method"
                    );
                    continue;
                };
                let function = match &*func {
                    crate::object::Object::Function(f) => f.qualified_name(),
                    _ => continue,
                };
                report.resolved.push(ResolvedDispatch {
                    interface_key: key.clone(),
                    concrete_type: candidate.qualified_name(),
                    function,
                });
                if let Some(default) = self.intrinsics.default_intrinsic() {
                    default(self, &func, &[]);
                }
            }
        }
        report
    }

    /// Locates `method` on a concrete type and materializes it through the
    /// policy gate.
    fn resolve_concrete_method(
        &mut self,
        concrete: &Rc<crate::scanner::TypeInfo>,
        method: &str,
    ) -> Option<ObjectRef> {
        match accessor::find_field_or_method(
            &mut self.resolver,
            concrete,
            method,
            true,
            self.tracer.as_mut(),
        ) {
            Lookup::Method { info, owner } => {
                match self
                    .resolver
                    .resolve_package(&owner.pkg_path, self.tracer.as_mut())
                {
                    crate::resolver::PackageLoad::Loaded(pkg) => {
                        Some(self.resolver.resolve_function(&pkg, &info))
                    }
                    crate::resolver::PackageLoad::Cycle(_) => None,
                }
            }
            _ => None,
        }
    }
}
