//! Scan-policy gate for package execution.
//!
//! A policy decides, per import path, whether a package is inside the
//! analysis boundary. Inside the boundary the evaluator scans the package,
//! executes function bodies, and sees unexported symbols; outside it the
//! package still exists as a cached object, but every symbol it exposes is a
//! symbolic placeholder or an unresolved function, and its types never
//! participate in interface resolution.
//!
//! The policy is checked at the resolver boundary only. The evaluator never
//! consults it directly, so a policy cannot be escalated mid-run: it is
//! captured at evaluator construction and immutable afterwards.
//!
//! # Usage
//!
//! ```
//! use kestrel::policy::ScanPolicy;
//!
//! let policy = ScanPolicy::prefixes(["example.com/app"]);
//! assert!(policy.admits("example.com/app"));
//! assert!(policy.admits("example.com/app/sub"));
//! assert!(!policy.admits("example.com/application"));
//! assert!(!policy.admits("vendor.io/lib"));
//! ```

use std::{fmt, rc::Rc};

/// Predicate on import paths deciding what the evaluator may execute.
///
/// Cheap to clone; the underlying predicate is shared.
#[derive(Clone)]
pub struct ScanPolicy {
    describe: Rc<str>,
    predicate: Rc<dyn Fn(&str) -> bool>,
}

impl ScanPolicy {
    /// Admits every package. Appropriate for closed-world analyses where
    /// the whole module tree is available to the scanner.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            describe: "allow-all".into(),
            predicate: Rc::new(|_| true),
        }
    }

    /// Admits nothing: every package becomes an opaque boundary. The
    /// evaluator can still trace calls into it, but never through it.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            describe: "deny-all".into(),
            predicate: Rc::new(|_| false),
        }
    }

    /// Admits packages whose import path equals a prefix or extends it at a
    /// `/` boundary: `example.com/app` admits `example.com/app/db` but not
    /// `example.com/application`.
    #[must_use]
    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        let describe = format!("prefixes[{}]", prefixes.join(", "));
        Self {
            describe: describe.into(),
            predicate: Rc::new(move |path| {
                prefixes.iter().any(|prefix| {
                    path == prefix
                        || (path.starts_with(prefix.as_str())
                            && path.as_bytes().get(prefix.len()) == Some(&b'/'))
                })
            }),
        }
    }

    /// Wraps an arbitrary predicate.
    #[must_use]
    pub fn from_fn(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            describe: "custom".into(),
            predicate: Rc::new(predicate),
        }
    }

    /// True when the package at `import_path` is inside the analysis
    /// boundary.
    #[must_use]
    pub fn admits(&self, import_path: &str) -> bool {
        (self.predicate)(import_path)
    }
}

impl fmt::Debug for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScanPolicy({})", self.describe)
    }
}

impl fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe)
    }
}
