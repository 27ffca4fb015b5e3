//! Main analysis orchestrator for Factory Guard
//!
//! CDD Principle: Domain Services - Analyzer orchestrates the per-module passes and the program run
//! - Extraction, scanning and completeness checking run per module in that order
//! - Modules are processed level by level along the import graph
//! - Modules sharing a level run in parallel against the same fact snapshot

pub mod completeness;
pub mod constructor;
pub mod schedule;
pub mod violations;

use crate::analyzer::completeness::CompletenessChecker;
use crate::analyzer::constructor::ConstructorExtractor;
use crate::analyzer::violations::ViolationScanner;
use crate::config::GuardConfig;
use crate::domain::violations::{
    GuardError, GuardResult, Severity, ValidationReport, Violation, ALL_RULES,
    RULE_CONSTRUCTOR_COMPLETENESS,
};
use crate::facts::{FactStore, FactView};
use crate::loader::UnitLoader;
use crate::model::{Module, TypeTable};
use crate::patterns::{IgnoreList, NamingConvention, OwnershipFilter};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main analyzer that orchestrates the entire validation process
pub struct Analyzer {
    /// Configuration for this analysis
    config: GuardConfig,
    /// Constructor discovery
    extractor: ConstructorExtractor,
    /// Naming rule used to select constructors for the completeness check
    naming: NamingConvention,
    /// Enabled rules and their severities
    rules: RuleSet,
    /// Modules exempt from violation checks
    ignore: IgnoreList,
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to analyze independent modules in parallel
    pub parallel: bool,
    /// Maximum number of modules to analyze
    pub max_modules: Option<usize>,
    /// Whether to abort on the first unreadable unit file
    pub fail_fast: bool,
    /// Additional unit exclusion patterns
    pub exclude_patterns: Vec<String>,
    /// Fact file of an earlier run, seeding facts for modules outside this one
    pub facts_input: Option<PathBuf>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_modules: None,
            fail_fast: false,
            exclude_patterns: Vec::new(),
            facts_input: None,
        }
    }
}

/// Enabled rules with their effective severities
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    active: BTreeMap<&'static str, Severity>,
}

impl RuleSet {
    /// Every rule at its default severity
    pub fn all() -> Self {
        Self::from_config(&GuardConfig::default())
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        let active = ALL_RULES
            .iter()
            .filter(|id| config.rule_enabled(id))
            .map(|&id| (id, config.effective_severity(id)))
            .collect();
        Self { active }
    }

    /// Severity of an enabled rule, `None` when the rule is off
    pub fn severity(&self, rule_id: &str) -> Option<Severity> {
        self.active.get(rule_id).copied()
    }

    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.active.contains_key(rule_id)
    }

    pub fn disable(&mut self, rule_id: &str) {
        self.active.remove(rule_id);
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Outcome of analyzing one module
#[derive(Debug, Clone)]
pub struct ModuleAnalysis {
    /// Path of the analyzed module
    pub module: String,
    /// Facts discovered for the module's own types
    pub facts: FactStore,
    /// Diagnostics in source order
    pub violations: Vec<Violation>,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct ProgramAnalysis {
    pub report: ValidationReport,
    /// Every fact known at the end of the run
    pub facts: FactStore,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: GuardConfig) -> GuardResult<Self> {
        config.validate()?;

        let extractor = ConstructorExtractor::from_config(&config)
            .map_err(|e| GuardError::config(format!("Failed to set up constructor detection: {e}")))?;
        let naming = config.naming_convention()?;
        let rules = RuleSet::from_config(&config);
        let ignore = config.ignore_list();

        tracing::debug!(
            "Analyzer ready: detectors {:?}, {} rules enabled, {} ignored modules",
            extractor.detector_names(),
            rules.len(),
            ignore.len()
        );

        Ok(Self {
            config,
            extractor,
            naming,
            rules,
            ignore,
        })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> GuardResult<Self> {
        Self::new(GuardConfig::default())
    }

    /// Replace the ignore list taken from the configuration
    pub fn set_ignore_list(&mut self, ignore: IgnoreList) {
        self.ignore = ignore;
    }

    /// Turn one rule off for this analyzer
    pub fn disable_rule(&mut self, rule_id: &str) {
        self.rules.disable(rule_id);
    }

    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    /// Run every pass over one module.
    ///
    /// `imported` holds the facts of every module analyzed earlier in the run;
    /// facts for the module's own types are extracted first and returned.
    pub fn analyze_module(
        &self,
        module: &Module,
        types: &TypeTable,
        imported: &FactStore,
        ignore: &IgnoreList,
    ) -> ModuleAnalysis {
        let facts = self.extractor.extract(module, types);

        let mut violations = ViolationScanner::new(
            module,
            types,
            FactView::new(&facts, imported),
            OwnershipFilter::new(&module.path, ignore),
            &self.rules,
        )
        .scan();

        if let Some(severity) = self.rules.severity(RULE_CONSTRUCTOR_COMPLETENESS) {
            violations.extend(CompletenessChecker::new(&self.naming, severity).check(module, types));
        }

        violations.sort_by(|a, b| {
            (&a.file_path, a.line_number, a.column_number).cmp(&(
                &b.file_path,
                b.line_number,
                b.column_number,
            ))
        });

        tracing::debug!(
            "Analyzed {}: {} facts, {} violations",
            module.path,
            facts.len(),
            violations.len()
        );

        ModuleAnalysis {
            module: module.path.clone(),
            facts,
            violations,
        }
    }

    /// Analyze a set of modules in dependency order, seeded from `options.facts_input`
    pub fn analyze_program(
        &self,
        modules: &[Module],
        options: &AnalysisOptions,
    ) -> GuardResult<ProgramAnalysis> {
        let seed = match &options.facts_input {
            Some(path) => {
                let seed = FactStore::load(path)?;
                tracing::info!("Loaded {} constructor facts from {}", seed.len(), path.display());
                seed
            }
            None => FactStore::new(),
        };
        self.analyze_program_seeded(modules, &seed, options)
    }

    /// Analyze a set of modules in dependency order on top of facts from earlier runs.
    ///
    /// Seeded facts owned by a module of this run are dropped; the run
    /// extracts that module's facts itself.
    pub fn analyze_program_seeded(
        &self,
        modules: &[Module],
        seed: &FactStore,
        options: &AnalysisOptions,
    ) -> GuardResult<ProgramAnalysis> {
        let start_time = Instant::now();
        let levels = schedule::dependency_levels(modules)?;
        let types: TypeTable = modules.iter().flat_map(|m| m.types.iter().cloned()).collect();

        let in_run: HashSet<&str> = modules.iter().map(|m| m.path.as_str()).collect();
        let mut facts = FactStore::new();
        let seeded = facts.merge(
            seed.iter()
                .filter(|fact| !in_run.contains(fact.owner.module.as_str()))
                .cloned(),
        );
        if seeded < seed.len() {
            tracing::debug!(
                "Dropped {} seeded facts owned by modules in this run",
                seed.len() - seeded
            );
        }

        let mut report = ValidationReport::new();

        for (depth, level) in levels.iter().enumerate() {
            tracing::info!("Analyzing level {} ({} modules)", depth, level.len());

            let results: Vec<ModuleAnalysis> = if options.parallel && level.len() > 1 {
                level
                    .par_iter()
                    .map(|&index| self.analyze_module(&modules[index], &types, &facts, &self.ignore))
                    .collect()
            } else {
                level
                    .iter()
                    .map(|&index| self.analyze_module(&modules[index], &types, &facts, &self.ignore))
                    .collect()
            };

            // Levels are sorted by module path, so merge order is deterministic
            for analysis in results {
                facts.merge(analysis.facts.iter().cloned());
                for violation in analysis.violations {
                    report.add_violation(violation);
                }
            }
        }

        report.set_modules_analyzed(modules.len());
        report.set_facts_known(facts.len());
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config.fingerprint());
        report.sort_violations();

        Ok(ProgramAnalysis { report, facts })
    }

    /// Load unit files under `paths` and analyze them
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> GuardResult<ProgramAnalysis> {
        let mut loader = UnitLoader::from_config(&self.config.units)?;
        for pattern in &options.exclude_patterns {
            loader.add_exclusion(pattern)?;
        }

        let mut modules = loader.collect(paths, options.fail_fast)?;
        if let Some(max_modules) = options.max_modules {
            modules = limit_modules(modules, max_modules)?;
        }

        self.analyze_program(&modules, options)
    }

    /// Get configuration fingerprint
    pub fn config_fingerprint(&self) -> String {
        self.config.fingerprint()
    }

    /// Get statistics about the configured rules
    pub fn rule_stats(&self) -> RuleStats {
        let mut stats = RuleStats {
            detectors: self.extractor.detector_names(),
            ignored_modules: self.ignore.len(),
            ..Default::default()
        };

        for id in ALL_RULES {
            if self.rules.is_enabled(id) {
                stats.enabled_rules += 1;
            } else {
                stats.disabled_rules += 1;
            }
        }

        stats
    }
}

/// Keep at most `max` modules, taken in dependency order so no kept module
/// loses an in-run import.
fn limit_modules(modules: Vec<Module>, max: usize) -> GuardResult<Vec<Module>> {
    if modules.len() <= max {
        return Ok(modules);
    }

    let keep: HashSet<usize> = schedule::dependency_levels(&modules)?
        .into_iter()
        .flatten()
        .take(max)
        .collect();

    let (kept, dropped): (Vec<_>, Vec<_>) = modules
        .into_iter()
        .enumerate()
        .partition(|(index, _)| keep.contains(index));
    let dropped: Vec<&str> = dropped.iter().map(|(_, m)| m.path.as_str()).collect();
    tracing::warn!(
        "Module limit {} reached; skipping {} modules: {}",
        max,
        dropped.len(),
        dropped.join(", ")
    );

    Ok(kept.into_iter().map(|(_, module)| module).collect())
}

/// Statistics about configured rules
#[derive(Debug, Default)]
pub struct RuleStats {
    pub enabled_rules: usize,
    pub disabled_rules: usize,
    /// Active constructor detectors, in order
    pub detectors: Vec<&'static str>,
    pub ignored_modules: usize,
}

impl RuleStats {
    pub fn total_rules(&self) -> usize {
        self.enabled_rules + self.disabled_rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::domain::violations::{
        RULE_FIELD_ASSIGNMENT, RULE_STRUCT_LITERAL, RULE_TYPE_CONVERSION,
    };
    use crate::model::{Element, Expr, Field, FuncDecl, SourceFile, Stmt, Ty, TypeDecl, TypeId};
    use std::fs;
    use tempfile::TempDir;

    fn user() -> Ty {
        Ty::named("target", "User")
    }

    fn email() -> Ty {
        Ty::named("target", "Email")
    }

    /// Declares `User{Name, email}`, `Email string` and their constructors
    fn target() -> Module {
        let mut module = Module::new("target");
        module.name = "target".to_string();
        module
            .with_type(TypeDecl::aggregate(
                TypeId::new("target", "User"),
                vec![
                    Field::new("Name", Ty::basic("string")),
                    Field::new("email", Ty::basic("string")),
                ],
            ))
            .with_type(TypeDecl::defined(TypeId::new("target", "Email"), Ty::basic("string")))
            .with_file(
                SourceFile::new("target/target.go")
                    .with_func(
                        FuncDecl::new("NewUser")
                            .returning(Ty::pointer(user()))
                            .with_body(vec![Stmt::ret(vec![Expr::addr_of(
                                Expr::composite(
                                    user(),
                                    vec![
                                        Element::field("Name", Expr::ident("name")),
                                        Element::field("email", Expr::ident("email")),
                                    ],
                                )
                                .at(8, 10),
                            )])]),
                    )
                    .with_func(
                        FuncDecl::new("NewEmail")
                            .returning(email())
                            .returning(Ty::Error)
                            .with_body(vec![Stmt::ret(vec![
                                Expr::call(
                                    Expr::ident("Email").at(12, 9).denoting(email()),
                                    vec![Expr::ident("s")],
                                ),
                                Expr::ident("nil"),
                            ])]),
                    ),
            )
    }

    /// Builds target types directly, converts and mutates them
    fn external() -> Module {
        let qualified = |name: &str, ty: Ty, line: u32| {
            Expr::selector(Expr::ident("target").at(line, 7), name).denoting(ty)
        };
        let u = Expr::ident("u").at(10, 2).typed(Ty::pointer(user()));

        Module::new("external").with_import("target").with_file(
            SourceFile::new("external/external.go").with_func(FuncDecl::new("Use").with_body(vec![
                Stmt::define(
                    "u",
                    Expr::addr_of(Expr::composite(user(), vec![]).at(5, 8)),
                ),
                Stmt::define(
                    "e",
                    Expr::call(qualified("Email", email(), 7), vec![Expr::lit("\"x\"")]),
                ),
                Stmt::assign(Expr::field_access(u, "Name", vec![0]), Expr::lit("\"y\"")),
            ])),
        )
    }

    fn ignored() -> Module {
        Module::new("ignored")
            .with_type(TypeDecl::aggregate(
                TypeId::new("ignored", "Config"),
                vec![Field::new("Debug", Ty::basic("bool"))],
            ))
            .with_file(
                SourceFile::new("ignored/ignored.go").with_func(
                    FuncDecl::new("NewConfig")
                        .returning(Ty::pointer(Ty::named("ignored", "Config")))
                        .with_body(vec![Stmt::ret(vec![Expr::addr_of(Expr::composite(
                            Ty::named("ignored", "Config"),
                            vec![Element::field("Debug", Expr::ident("false"))],
                        ))])]),
                ),
            )
    }

    fn uses_ignored() -> Module {
        Module::new("consumer").with_import("ignored").with_file(
            SourceFile::new("consumer/consumer.go").with_func(FuncDecl::new("f").with_body(vec![
                Stmt::define("c", Expr::composite(Ty::named("ignored", "Config"), vec![]).at(3, 7)),
            ])),
        )
    }

    #[test]
    fn test_analyzer_creation() {
        let analyzer = Analyzer::with_defaults().unwrap();
        let stats = analyzer.rule_stats();

        assert_eq!(stats.total_rules(), 4);
        assert_eq!(stats.enabled_rules, 4);
        assert_eq!(stats.detectors, vec!["marker", "naming"]);
    }

    #[test]
    fn test_program_reports_external_misuse() -> GuardResult<()> {
        let analyzer = Analyzer::with_defaults()?;
        let modules = vec![external(), target()];

        let result = analyzer.analyze_program(&modules, &AnalysisOptions::default())?;
        let messages: Vec<_> = result.report.violations.iter().map(|v| v.message.as_str()).collect();

        assert_eq!(
            messages,
            vec![
                "direct struct literal creation of User is not allowed; use target.NewUser() instead",
                "direct type conversion to Email is not allowed; use target.NewEmail() instead",
                "direct field assignment to User.Name is not allowed; User has a constructor NewUser()",
            ]
        );
        assert_eq!(result.facts.len(), 2);
        assert_eq!(result.report.summary.total_modules, 2);
        assert_eq!(result.report.summary.total_facts, 2);
        assert!(result.report.has_errors());
        Ok(())
    }

    #[test]
    fn test_declaring_module_is_clean() -> GuardResult<()> {
        let analyzer = Analyzer::with_defaults()?;
        let result = analyzer.analyze_program(&[target()], &AnalysisOptions::default())?;

        assert!(!result.report.has_violations());
        assert_eq!(result.facts.len(), 2);
        Ok(())
    }

    #[test]
    fn test_ignored_module_produces_no_diagnostics() -> GuardResult<()> {
        let config = ConfigBuilder::new().ignore_packages("ignored").build()?;
        let analyzer = Analyzer::new(config)?;

        let result = analyzer.analyze_program(&[uses_ignored(), ignored()], &AnalysisOptions::default())?;

        assert!(!result.report.has_violations());
        assert!(result.facts.contains(&TypeId::new("ignored", "Config")));

        let strict = Analyzer::with_defaults()?;
        let result = strict.analyze_program(&[uses_ignored(), ignored()], &AnalysisOptions::default())?;
        assert_eq!(result.report.violations.len(), 1);
        Ok(())
    }

    #[test]
    fn test_completeness_toggle() -> GuardResult<()> {
        let incomplete = Module::new("completeness")
            .with_type(TypeDecl::aggregate(
                TypeId::new("completeness", "User"),
                vec![
                    Field::new("Name", Ty::basic("string")),
                    Field::new("email", Ty::basic("string")),
                ],
            ))
            .with_file(SourceFile::new("completeness/completeness.go").with_func(
                FuncDecl::new("NewUser")
                    .returning(Ty::named("completeness", "User"))
                    .with_body(vec![Stmt::ret(vec![Expr::composite(
                        Ty::named("completeness", "User"),
                        vec![Element::field("Name", Expr::ident("name"))],
                    )])]),
            ));

        let analyzer = Analyzer::with_defaults()?;
        let result = analyzer.analyze_program(&[incomplete.clone()], &AnalysisOptions::default())?;
        let found: Vec<_> = result.report.violations_for_rule(RULE_CONSTRUCTOR_COMPLETENESS).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert!(!result.report.has_errors());

        let mut quiet = Analyzer::with_defaults()?;
        quiet.disable_rule(RULE_CONSTRUCTOR_COMPLETENESS);
        let result = quiet.analyze_program(&[incomplete], &AnalysisOptions::default())?;
        assert!(!result.report.has_violations());
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> GuardResult<()> {
        let analyzer = Analyzer::with_defaults()?;
        let modules = vec![external(), target(), ignored(), uses_ignored()];

        let parallel = analyzer.analyze_program(&modules, &AnalysisOptions::default())?;
        let sequential = analyzer.analyze_program(
            &modules,
            &AnalysisOptions {
                parallel: false,
                ..Default::default()
            },
        )?;

        assert_eq!(parallel.report.violations, sequential.report.violations);
        assert_eq!(parallel.facts.digest(), sequential.facts.digest());
        Ok(())
    }

    #[test]
    fn test_rerun_is_idempotent() -> GuardResult<()> {
        let analyzer = Analyzer::with_defaults()?;
        let modules = vec![external(), target()];

        let first = analyzer.analyze_program(&modules, &AnalysisOptions::default())?;
        let second = analyzer.analyze_program(&modules, &AnalysisOptions::default())?;

        assert_eq!(first.facts, second.facts);
        assert_eq!(first.facts.digest(), second.facts.digest());
        assert_eq!(first.report.violations, second.report.violations);
        Ok(())
    }

    #[test]
    fn test_single_module_contract() -> GuardResult<()> {
        let analyzer = Analyzer::with_defaults()?;
        let target = target();
        let external = external();
        let types: TypeTable = target.types.iter().cloned().collect();

        let own = analyzer.analyze_module(&target, &types, &FactStore::new(), &IgnoreList::new());
        assert!(own.violations.is_empty());

        let foreign = analyzer.analyze_module(&external, &types, &own.facts, &IgnoreList::new());
        let rules: Vec<_> = foreign.violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(rules, vec![RULE_STRUCT_LITERAL, RULE_TYPE_CONVERSION, RULE_FIELD_ASSIGNMENT]);
        assert!(foreign.facts.is_empty());

        // Without the imported facts nothing is guarded yet
        let blind = analyzer.analyze_module(&external, &types, &FactStore::new(), &IgnoreList::new());
        assert!(blind.violations.is_empty());
        Ok(())
    }

    #[test]
    fn test_import_cycle_is_an_error() {
        let analyzer = Analyzer::with_defaults().unwrap();
        let modules = vec![
            Module::new("a").with_import("b"),
            Module::new("b").with_import("a"),
        ];

        let err = analyzer
            .analyze_program(&modules, &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, GuardError::Validation { .. }));
    }

    #[test]
    fn test_analyze_paths_from_unit_files() -> GuardResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("units/vendor"))?;

        for module in [target(), external()] {
            let json = serde_json::to_string(&module).unwrap();
            fs::write(root.join(format!("units/{}.unit.json", module.path)), json)?;
        }
        fs::write(root.join("units/vendor/skip.unit.json"), "not json")?;

        let analyzer = Analyzer::with_defaults()?;
        let result = analyzer.analyze_paths(&[root.join("units")], &AnalysisOptions::default())?;

        assert_eq!(result.report.summary.total_modules, 2);
        assert_eq!(result.report.violations.len(), 3);

        let limited = analyzer.analyze_paths(
            &[root.join("units")],
            &AnalysisOptions {
                exclude_patterns: vec!["**/external.unit.json".to_string()],
                ..Default::default()
            },
        )?;
        assert_eq!(limited.report.summary.total_modules, 1);
        assert!(!limited.report.has_violations());
        Ok(())
    }

    fn write_unit_dir(root: &Path, modules: &[Module]) -> std::io::Result<()> {
        fs::create_dir_all(root)?;
        for module in modules {
            let json = serde_json::to_string(module)?;
            fs::write(root.join(format!("{}.unit.json", module.path)), json)?;
        }
        Ok(())
    }

    #[test]
    fn test_module_limit_keeps_dependencies_first() -> GuardResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let units = temp_dir.path().join("units");
        write_unit_dir(&units, &[target(), external()])?;

        let analyzer = Analyzer::with_defaults()?;
        let result = analyzer.analyze_paths(
            &[&units],
            &AnalysisOptions {
                max_modules: Some(1),
                ..Default::default()
            },
        )?;

        // "external" sorts first but imports "target"
        assert_eq!(result.report.summary.total_modules, 1);
        assert_eq!(result.facts.len(), 2);
        assert!(!result.report.has_violations());
        Ok(())
    }

    #[test]
    fn test_limit_modules() -> GuardResult<()> {
        let kept = limit_modules(vec![external(), target()], 5)?;
        let paths: Vec<_> = kept.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["external", "target"]);

        let kept = limit_modules(vec![external(), target(), ignored()], 2)?;
        let paths: Vec<_> = kept.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["target", "ignored"]);
        Ok(())
    }

    #[test]
    fn test_seeded_facts_guard_modules_outside_the_run() -> GuardResult<()> {
        let temp_dir = TempDir::new().unwrap();
        let analyzer = Analyzer::with_defaults()?;

        let upstream = analyzer.analyze_program(&[target()], &AnalysisOptions::default())?;
        let facts_file = temp_dir.path().join("facts/target.json");
        upstream.facts.save(&facts_file)?;

        let result = analyzer.analyze_program(
            &[external()],
            &AnalysisOptions {
                facts_input: Some(facts_file),
                ..Default::default()
            },
        )?;

        // Conversion and field checks need the declarations, which stay with "target"
        let rules: Vec<_> = result.report.violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(rules, vec![RULE_STRUCT_LITERAL]);
        assert_eq!(
            result.report.violations[0].message,
            "direct struct literal creation of User is not allowed; use target.NewUser() instead"
        );
        assert_eq!(result.report.summary.total_facts, 2);
        Ok(())
    }

    #[test]
    fn test_seed_for_module_in_run_is_replaced() -> GuardResult<()> {
        let mut stale = FactStore::new();
        stale.export(crate::facts::ConstructorFact::new(
            TypeId::new("target", "User"),
            "MakeUser",
        ));
        stale.export(crate::facts::ConstructorFact::new(
            TypeId::new("other", "Client"),
            "NewClient",
        ));

        let analyzer = Analyzer::with_defaults()?;
        let result = analyzer.analyze_program_seeded(
            &[external(), target()],
            &stale,
            &AnalysisOptions::default(),
        )?;

        assert_eq!(
            result.facts.lookup(&TypeId::new("target", "User")).map(|f| f.constructor.as_str()),
            Some("NewUser")
        );
        assert!(result.facts.contains(&TypeId::new("other", "Client")));
        assert_eq!(result.report.violations.len(), 3);
        Ok(())
    }

    #[test]
    fn test_missing_fact_file_is_a_load_error() {
        let analyzer = Analyzer::with_defaults().unwrap();
        let err = analyzer
            .analyze_program(
                &[target()],
                &AnalysisOptions {
                    facts_input: Some(PathBuf::from("/nonexistent/facts.json")),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, GuardError::Load { .. }));
    }
}
