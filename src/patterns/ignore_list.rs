//! Module ownership predicates consulted before any violation is reported
//!
//! Architectural Principle: Service Layer - OwnershipFilter encapsulates "is this type ours to police"
//! - IgnoreList parses the comma-separated module list from configuration
//! - Test variants of a module (`pkg_test`) count as the module itself

use crate::model::TypeId;
use std::collections::BTreeSet;
use std::fmt;

/// Module paths exempt from every violation check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    modules: BTreeSet<String>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated setting; entries are trimmed and empty ones dropped.
    ///
    /// Parsing never fails: a malformed value degrades to whatever entries it yields.
    pub fn from_setting(setting: &str) -> Self {
        let modules = setting
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(String::from)
            .collect();
        Self { modules }
    }

    pub fn with_module(mut self, path: impl Into<String>) -> Self {
        self.modules.insert(path.into());
        self
    }

    /// Exact-equality membership test
    pub fn contains(&self, module_path: &str) -> bool {
        self.modules.contains(module_path)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }
}

impl fmt::Display for IgnoreList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Strip the external-test suffix so `pkg_test` is treated as `pkg`
pub fn strip_test_variant(path: &str) -> &str {
    path.strip_suffix("_test").unwrap_or(path)
}

/// Whether two module paths denote the same module, test variants included
pub fn same_module(a: &str, b: &str) -> bool {
    strip_test_variant(a) == strip_test_variant(b)
}

/// Why a candidate type was exempted from checking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Declared by the module under analysis
    Local,
    /// Declared by a module on the ignore list
    Ignored,
}

/// Skip predicate applied to every candidate type before a violation is raised
#[derive(Debug, Clone, Copy)]
pub struct OwnershipFilter<'a> {
    current: &'a str,
    ignore: &'a IgnoreList,
}

impl<'a> OwnershipFilter<'a> {
    pub fn new(current: &'a str, ignore: &'a IgnoreList) -> Self {
        Self { current, ignore }
    }

    /// Reason to skip `owner`, or `None` when it must be checked.
    ///
    /// Predeclared types have no declaring module: they are never local and
    /// never ignored.
    pub fn skip(&self, owner: &TypeId) -> Option<SkipReason> {
        if owner.is_predeclared() {
            return None;
        }
        if same_module(self.current, &owner.module) {
            return Some(SkipReason::Local);
        }
        if self.ignore.contains(&owner.module) {
            return Some(SkipReason::Ignored);
        }
        None
    }
}
