//! Constructor recognition patterns
//!
//! Architectural Principle: Service Layer - Patterns answer "does this name or doc look like a constructor"
//! - NamingConvention recognizes `{prefix}{Capitalized}` function names
//! - MarkerTag recognizes the inline constructor marker in doc comment lines
//! - Ownership and ignore-list predicates live in `ignore_list`

pub mod ignore_list;

use crate::domain::violations::{GuardError, GuardResult};
use regex::Regex;

pub use ignore_list::{same_module, strip_test_variant, IgnoreList, OwnershipFilter, SkipReason};

/// Default constructor name prefix
pub const DEFAULT_PREFIX: &str = "New";
/// Default constructor marker written in a doc comment
pub const DEFAULT_MARKER: &str = "factory:constructor";

/// Constructor naming rule: a fixed prefix followed by an uppercase letter
#[derive(Debug, Clone)]
pub struct NamingConvention {
    prefix: String,
    regex: Regex,
}

impl NamingConvention {
    /// Compile the rule for `prefix`; matching of the prefix is case-sensitive
    pub fn new(prefix: impl Into<String>) -> GuardResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(GuardError::config("Constructor prefix must not be empty"));
        }

        let pattern = format!("^{}([A-Z].*)$", regex::escape(&prefix));
        let regex = Regex::new(&pattern).map_err(|e| {
            GuardError::config(format!("Invalid constructor prefix '{prefix}': {e}"))
        })?;

        Ok(Self { prefix, regex })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Candidate type name for a constructor-shaped function name.
    ///
    /// `NewUser` yields `User`; `New`, `Newuser` and `MakeUser` yield nothing.
    pub fn candidate<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.regex
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether `type_name` is the type `function_name` constructs by name
    pub fn names_type(&self, function_name: &str, type_name: &str) -> bool {
        self.candidate(function_name)
            .is_some_and(|candidate| eq_fold(candidate, type_name))
    }
}

/// Inline marker tag identifying a constructor through its doc comment
#[derive(Debug, Clone)]
pub struct MarkerTag {
    tag: String,
    regex: Regex,
}

impl MarkerTag {
    /// Compile a marker; the tag must be non-empty and contain no whitespace
    pub fn new(tag: impl Into<String>) -> GuardResult<Self> {
        let tag = tag.into();
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(GuardError::config(format!(
                "Constructor marker '{tag}' must be a single non-empty word"
            )));
        }

        // `//tag`, `// tag`, `/* tag */` or the bare tag when the front-end already stripped markers
        let pattern = format!(r"^\s*(?://|/\*)?\s*{}(?:\s|\*/|$)", regex::escape(&tag));
        let regex = Regex::new(&pattern)
            .map_err(|e| GuardError::config(format!("Invalid constructor marker '{tag}': {e}")))?;

        Ok(Self { tag, regex })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether any doc line starts with the marker
    pub fn is_marked(&self, doc: &[String]) -> bool {
        doc.iter().any(|line| self.regex.is_match(line))
    }
}

/// Case-insensitive comparison under simple Unicode lowercase folding
pub fn eq_fold(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
