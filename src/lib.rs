//! Factory Guard - Construction-through-constructor enforcement across module boundaries
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - The resolved program model and diagnostics form the domain core
//! - Unit loading, fact files and report formatting live at the edges
//! - FactoryGuard wires configuration, analysis and reporting for callers

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod facts;
pub mod loader;
pub mod model;
pub mod patterns;
pub mod report;

// Re-export main types for convenient access
pub use domain::violations::{
    GuardError, GuardResult, Severity, ValidationReport, ValidationSummary, Violation,
};

pub use config::{ConfigBuilder, GuardConfig};

pub use analyzer::{AnalysisOptions, Analyzer, ModuleAnalysis, ProgramAnalysis, RuleStats};

pub use facts::{ConstructorFact, FactStatistics, FactStore};

pub use model::{Module, TypeId, TypeTable};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

use std::path::{Path, PathBuf};

/// Main validator providing high-level validation operations
pub struct FactoryGuard {
    analyzer: Analyzer,
    report_formatter: ReportFormatter,
}

/// Options for a validation run
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Where to write the constructor facts known at the end of the run
    pub facts_output: Option<PathBuf>,
    /// Analysis options
    pub analysis_options: AnalysisOptions,
}

impl FactoryGuard {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: GuardConfig) -> GuardResult<Self> {
        let analyzer = Analyzer::new(config)?;
        let report_formatter = ReportFormatter::default();

        Ok(Self {
            analyzer,
            report_formatter,
        })
    }

    /// Create a validator with default configuration
    pub fn new() -> GuardResult<Self> {
        Self::new_with_config(GuardConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let config = GuardConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// Mutable access to the analyzer, e.g. to override the ignore list
    pub fn analyzer_mut(&mut self) -> &mut Analyzer {
        &mut self.analyzer
    }

    /// Validate unit files under `paths` with default options
    pub fn validate_paths<P: AsRef<Path>>(&self, paths: &[P]) -> GuardResult<ValidationReport> {
        let analysis = self
            .analyzer
            .analyze_paths(paths, &AnalysisOptions::default())?;
        Ok(analysis.report)
    }

    /// Validate unit files with custom options, writing the fact file when asked
    pub async fn validate_with_options<P: AsRef<Path>>(
        &self,
        paths: Vec<P>,
        options: &ValidationOptions,
    ) -> GuardResult<ProgramAnalysis> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let analysis = self.analyzer.analyze_paths(&paths, &options.analysis_options)?;

        if let Some(facts_output) = &options.facts_output {
            let facts = analysis.facts.clone();
            let path = facts_output.clone();
            tokio::task::spawn_blocking(move || facts.save(path))
                .await
                .map_err(|e| GuardError::validation(format!("Fact file writer failed: {e}")))??;
            tracing::info!(
                "Wrote {} constructor facts to {}",
                analysis.facts.len(),
                facts_output.display()
            );
        }

        Ok(analysis)
    }

    /// Analyze modules that are already in memory
    pub fn analyze_modules(
        &self,
        modules: &[Module],
        options: &AnalysisOptions,
    ) -> GuardResult<ProgramAnalysis> {
        self.analyzer.analyze_program(modules, options)
    }

    /// Format a validation report for output
    pub fn format_report(&self, report: &ValidationReport, format: OutputFormat) -> GuardResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Get analyzer statistics
    pub fn rule_statistics(&self) -> RuleStats {
        self.analyzer.rule_stats()
    }
}

/// Convenience function to create a validator with default settings
pub fn create_validator() -> GuardResult<FactoryGuard> {
    FactoryGuard::new()
}

/// Convenience function to validate unit files with default settings
pub async fn validate_units<P: AsRef<Path>>(paths: Vec<P>) -> GuardResult<ValidationReport> {
    let validator = FactoryGuard::new()?;
    let analysis = validator
        .validate_with_options(paths, &ValidationOptions::default())
        .await?;
    Ok(analysis.report)
}

/// Fail when a run over `paths` finds any error-level violation
pub async fn check_units<P: AsRef<Path>>(paths: Vec<P>) -> GuardResult<()> {
    let report = validate_units(paths).await?;

    if report.has_errors() {
        let error_count = report.summary.violations_by_severity.error;
        return Err(GuardError::validation(format!(
            "{} encapsulation violation{} found",
            error_count,
            if error_count == 1 { "" } else { "s" }
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Expr, Field, FuncDecl, SourceFile, Stmt, Ty, TypeDecl};
    use std::fs;
    use tempfile::TempDir;

    fn target() -> Module {
        let user = Ty::named("target", "User");
        Module::new("target")
            .with_type(TypeDecl::aggregate(
                TypeId::new("target", "User"),
                vec![Field::new("Name", Ty::basic("string"))],
            ))
            .with_file(
                SourceFile::new("target/target.go").with_func(
                    FuncDecl::new("NewUser")
                        .returning(Ty::pointer(user.clone()))
                        .with_body(vec![Stmt::ret(vec![Expr::addr_of(Expr::composite(
                            user,
                            vec![Element::field("Name", Expr::ident("name"))],
                        ))])]),
                ),
            )
    }

    fn consumer() -> Module {
        Module::new("consumer").with_import("target").with_file(
            SourceFile::new("consumer/consumer.go").with_func(FuncDecl::new("Run").with_body(vec![
                Stmt::define("u", Expr::composite(Ty::named("target", "User"), vec![]).at(4, 7)),
            ])),
        )
    }

    fn write_units(root: &Path, modules: &[Module]) {
        for module in modules {
            let json = serde_json::to_string(module).unwrap();
            fs::write(root.join(format!("{}.unit.json", module.path)), json).unwrap();
        }
    }

    #[test]
    fn test_validator_creation() {
        let validator = FactoryGuard::new().unwrap();
        let stats = validator.rule_statistics();

        assert_eq!(stats.enabled_rules, 4);
        assert_eq!(stats.ignored_modules, 0);
    }

    #[test]
    fn test_validate_paths() {
        let temp_dir = TempDir::new().unwrap();
        write_units(temp_dir.path(), &[target(), consumer()]);

        let validator = FactoryGuard::new().unwrap();
        let report = validator.validate_paths(&[temp_dir.path()]).unwrap();

        assert_eq!(report.violations.len(), 1);
        assert_eq!(
            report.violations[0].message,
            "direct struct literal creation of User is not allowed; use target.NewUser() instead"
        );
        assert_eq!(report.violations[0].module, "consumer");
    }

    #[tokio::test]
    async fn test_validate_with_options_writes_facts() {
        let temp_dir = TempDir::new().unwrap();
        let units = temp_dir.path().join("units");
        fs::create_dir_all(&units).unwrap();
        write_units(&units, &[target()]);

        let facts_output = temp_dir.path().join("facts.json");
        let options = ValidationOptions {
            facts_output: Some(facts_output.clone()),
            ..Default::default()
        };

        let validator = FactoryGuard::new().unwrap();
        let analysis = validator.validate_with_options(vec![&units], &options).await.unwrap();
        assert!(!analysis.report.has_violations());

        let saved = FactStore::load(&facts_output).unwrap();
        assert_eq!(saved, analysis.facts);
        assert_eq!(
            saved.lookup(&TypeId::new("target", "User")).map(|f| f.constructor.as_str()),
            Some("NewUser")
        );
    }

    #[tokio::test]
    async fn test_facts_from_an_earlier_run_guard_later_runs() {
        let temp_dir = TempDir::new().unwrap();
        let upstream = temp_dir.path().join("upstream");
        let downstream = temp_dir.path().join("downstream");
        fs::create_dir_all(&upstream).unwrap();
        fs::create_dir_all(&downstream).unwrap();
        write_units(&upstream, &[target()]);
        write_units(&downstream, &[consumer()]);

        let validator = FactoryGuard::new().unwrap();
        let facts_file = temp_dir.path().join("facts.json");
        validator
            .validate_with_options(
                vec![&upstream],
                &ValidationOptions {
                    facts_output: Some(facts_file.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let alone = validator
            .validate_with_options(vec![&downstream], &ValidationOptions::default())
            .await
            .unwrap();
        assert!(!alone.report.has_violations());

        let seeded = validator
            .validate_with_options(
                vec![&downstream],
                &ValidationOptions {
                    analysis_options: AnalysisOptions {
                        facts_input: Some(facts_file),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(seeded.report.violations.len(), 1);
        assert_eq!(seeded.report.violations[0].module, "consumer");
    }

    #[test]
    fn test_report_formatting() {
        let validator = FactoryGuard::new()
            .unwrap()
            .with_report_formatter(ReportFormatter::new(ReportOptions {
                use_colors: false,
                ..Default::default()
            }));
        let analysis = validator
            .analyze_modules(&[consumer(), target()], &AnalysisOptions::default())
            .unwrap();

        let human = validator.format_report(&analysis.report, OutputFormat::Human).unwrap();
        assert!(human.contains("Encapsulation Violations Found"));
        assert!(human.contains("consumer/consumer.go"));

        let json = validator.format_report(&analysis.report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["violations"].is_array());
    }

    #[tokio::test]
    async fn test_check_units() {
        let clean = TempDir::new().unwrap();
        write_units(clean.path(), &[target()]);
        assert!(check_units(vec![clean.path()]).await.is_ok());

        let dirty = TempDir::new().unwrap();
        write_units(dirty.path(), &[target(), consumer()]);
        let err = check_units(vec![dirty.path()]).await.unwrap_err();
        assert!(err.to_string().contains("1 encapsulation violation found"));
    }

    #[test]
    fn test_ignore_list_override() {
        let mut validator = create_validator().unwrap();
        validator
            .analyzer_mut()
            .set_ignore_list(patterns::IgnoreList::from_setting("target"));

        let analysis = validator
            .analyze_modules(&[consumer(), target()], &AnalysisOptions::default())
            .unwrap();
        assert!(!analysis.report.has_violations());
    }
}
