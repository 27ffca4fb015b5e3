//! Core domain models for encapsulation violations and validation results
//!
//! Architecture: Rich Domain Models - A violation knows its rule, location and message
//! - ValidationReport is the aggregate root collecting the diagnostics of a whole run
//! - Message text is produced by the analyzer passes and never rewritten here

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rule identifier for direct composite literal construction of a guarded type
pub const RULE_STRUCT_LITERAL: &str = "struct_literal";
/// Rule identifier for raw conversion into a guarded defined type
pub const RULE_TYPE_CONVERSION: &str = "type_conversion";
/// Rule identifier for assignment to a field of a guarded type
pub const RULE_FIELD_ASSIGNMENT: &str = "field_assignment";
/// Rule identifier for constructors returning literals with unkeyed fields
pub const RULE_CONSTRUCTOR_COMPLETENESS: &str = "constructor_completeness";

/// All rule identifiers known to the analyzer, in reporting order
pub const ALL_RULES: [&str; 4] = [
    RULE_STRUCT_LITERAL,
    RULE_TYPE_CONVERSION,
    RULE_FIELD_ASSIGNMENT,
    RULE_CONSTRUCTOR_COMPLETENESS,
];

/// Severity levels for encapsulation violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Warnings that should be addressed but don't block builds
    Warning,
    /// Errors that fail CI/CD builds
    Error,
}

impl Severity {
    /// Whether this severity level should cause validation to fail
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// An encapsulation violation detected in one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that produced this violation
    pub rule_id: String,
    /// Severity level of this violation
    pub severity: Severity,
    /// Path of the module whose code contains the violation
    pub module: String,
    /// Source file containing the offending expression
    pub file_path: PathBuf,
    /// Line number (1-indexed) of the offending expression
    pub line_number: Option<u32>,
    /// Column number (1-indexed) of the offending expression
    pub column_number: Option<u32>,
    /// Diagnostic text
    pub message: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        file_path: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            module: String::new(),
            file_path,
            line_number: None,
            column_number: None,
            message: message.into(),
        }
    }

    /// Set line and column position
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }

    /// Attach the path of the module being analyzed
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Whether this violation is blocking
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Format violation the way compilers print diagnostics: `file:line:col: message`
    pub fn format_display(&self) -> String {
        let location = match (self.line_number, self.column_number) {
            (Some(line), Some(col)) => format!(":{line}:{col}"),
            (Some(line), None) => format!(":{line}"),
            _ => String::new(),
        };

        format!("{}{}: {}", self.file_path.display(), location, self.message)
    }

    /// Ordering key: file, then line, then column
    fn position_key(&self) -> (&PathBuf, u32, u32) {
        (
            &self.file_path,
            self.line_number.unwrap_or(0),
            self.column_number.unwrap_or(0),
        )
    }
}

/// Summary statistics for a validation report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of modules analyzed
    pub total_modules: usize,
    /// Number of constructor facts known at the end of the run
    pub total_facts: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Whether there are any blocking violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Complete validation report containing all violations and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All violations found during validation
    pub violations: Vec<Violation>,
    /// Summary statistics
    pub summary: ValidationSummary,
    /// Fingerprint of the configuration used for this validation
    pub config_fingerprint: Option<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether the report contains blocking violations (errors)
    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Get violations produced by one rule
    pub fn violations_for_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.rule_id == rule_id)
    }

    /// Set the number of modules analyzed
    pub fn set_modules_analyzed(&mut self, count: usize) {
        self.summary.total_modules = count;
    }

    /// Set the number of facts known after the run
    pub fn set_facts_known(&mut self, count: usize) {
        self.summary.total_facts = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Sort violations by source position for stable output
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| a.position_key().cmp(&b.position_key()));
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur while loading, configuring or driving analysis
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A module unit file could not be decoded
    #[error("Load error in {file}: {message}")]
    Load { file: String, message: String },

    /// Analysis failed for a specific module
    #[error("Analysis error in {module}: {message}")]
    Analysis { module: String, message: String },

    /// The module set handed to the driver is inconsistent
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl GuardError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a unit loading error
    pub fn load(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type for Factory Guard operations
pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_violation_creation() {
        let violation = Violation::new(
            RULE_STRUCT_LITERAL,
            Severity::Error,
            PathBuf::from("external/external.go"),
            "direct struct literal creation of User is not allowed; use target.NewUser() instead",
        )
        .in_module("external");

        assert_eq!(violation.rule_id, "struct_literal");
        assert_eq!(violation.module, "external");
        assert_eq!(violation.file_path, Path::new("external/external.go"));
        assert!(violation.is_blocking());
    }

    #[test]
    fn test_format_display() {
        let violation = Violation::new(
            RULE_FIELD_ASSIGNMENT,
            Severity::Warning,
            PathBuf::from("a.go"),
            "msg",
        )
        .with_position(7, 3);

        assert_eq!(violation.format_display(), "a.go:7:3: msg");
        assert!(!violation.is_blocking());
    }

    #[test]
    fn test_validation_report_counts_and_order() {
        let mut report = ValidationReport::new();

        report.add_violation(
            Violation::new("r", Severity::Error, PathBuf::from("b.go"), "second")
                .with_position(1, 1),
        );
        report.add_violation(
            Violation::new("r", Severity::Warning, PathBuf::from("a.go"), "late").with_position(9, 2),
        );
        report.add_violation(
            Violation::new("r", Severity::Error, PathBuf::from("a.go"), "early").with_position(9, 1),
        );
        report.sort_violations();

        let messages: Vec<_> = report.violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages, vec!["early", "late", "second"]);
        assert!(report.has_errors());
        assert_eq!(report.summary.violations_by_severity.total(), 3);
        assert_eq!(report.summary.violations_by_severity.warning, 1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Error.is_blocking());
        assert!(!Severity::Warning.is_blocking());
    }
}
