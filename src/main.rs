//! Factory Guard CLI - Command-line interface for constructor enforcement
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes and terminal output
//! - Keeps flag handling out of the library

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use factory_guard::config::{RuleConfig, CONFIG_FILE_NAMES};
use factory_guard::domain::violations::{
    ALL_RULES, RULE_CONSTRUCTOR_COMPLETENESS, RULE_FIELD_ASSIGNMENT, RULE_STRUCT_LITERAL,
    RULE_TYPE_CONVERSION,
};
use factory_guard::{
    AnalysisOptions, FactoryGuard, GuardConfig, OutputFormat, ReportFormatter, ReportOptions,
    Severity, ValidationOptions,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Factory Guard - construction through constructors only
#[derive(Parser)]
#[command(name = "factory-guard")]
#[command(version = "0.1.0")]
#[command(about = "Reports code that bypasses the constructor of a type declared in another module")]
#[command(
    long_about = "Factory Guard discovers constructor functions in each module and reports struct literals, raw conversions and field assignments that build or mutate those types from other modules. Input is a set of resolved module unit files."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check unit files for encapsulation violations
    Check {
        /// Paths to analyze (unit files or directories)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Comma-separated module paths to exempt, replacing the configured list
        #[arg(long)]
        ignore_packages: Option<String>,

        /// Skip the constructor completeness check
        #[arg(long)]
        no_completeness: bool,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Fail on the first unreadable unit file
        #[arg(long)]
        fail_fast: bool,

        /// Fact file from an earlier run covering modules outside these paths
        #[arg(long)]
        facts_in: Option<PathBuf>,
    },

    /// Print the constructor facts discovered in unit files
    Facts {
        /// Paths to analyze (unit files or directories)
        paths: Vec<PathBuf>,

        /// Write the fact file here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fact file from an earlier run covering modules outside these paths
        #[arg(long)]
        facts_in: Option<PathBuf>,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// List available rules
    Rules {
        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

/// Flags of the `check` command
struct CheckArgs {
    paths: Vec<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    max_violations: Option<usize>,
    ignore_packages: Option<String>,
    no_completeness: bool,
    exclude: Vec<String>,
    no_parallel: bool,
    fail_fast: bool,
    facts_in: Option<PathBuf>,
    use_colors: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            severity,
            max_violations,
            ignore_packages,
            no_completeness,
            exclude,
            no_parallel,
            fail_fast,
            facts_in,
        } => {
            let args = CheckArgs {
                paths,
                format,
                severity,
                max_violations,
                ignore_packages,
                no_completeness,
                exclude,
                no_parallel,
                fail_fast,
                facts_in,
                use_colors: !cli.no_color,
            };
            run_check(cli.config, args).await
        }
        Commands::Facts {
            paths,
            output,
            facts_in,
        } => run_facts(cli.config, paths, output, facts_in).await,
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Explain { rule_id } => Ok(run_explain(&rule_id)),
        Commands::Rules { enabled_only } => run_list_rules(cli.config, enabled_only),
    }
}

/// Explicit path, else a configuration file in the working directory, else defaults
fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<GuardConfig> {
    let path = config_path.or_else(|| GuardConfig::discover("."));

    match path {
        Some(path) => {
            tracing::debug!("Using configuration {}", path.display());
            GuardConfig::load_from_file(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(GuardConfig::default()),
    }
}

fn default_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    }
}

async fn run_check(config_path: Option<PathBuf>, args: CheckArgs) -> anyhow::Result<i32> {
    let mut config = load_config(config_path)?;

    if let Some(ignore_packages) = args.ignore_packages {
        config.ignore_packages = ignore_packages;
    }
    if args.no_completeness {
        config.rules.insert(
            RULE_CONSTRUCTOR_COMPLETENESS.to_string(),
            RuleConfig {
                enabled: false,
                severity: None,
            },
        );
    }

    let validator = FactoryGuard::new_with_config(config)
        .context("Invalid configuration")?
        .with_report_formatter(ReportFormatter::new(ReportOptions {
            use_colors: args.use_colors,
            max_violations: args.max_violations,
            min_severity: args.severity.map(Severity::from),
        }));

    let options = ValidationOptions {
        analysis_options: AnalysisOptions {
            parallel: !args.no_parallel,
            fail_fast: args.fail_fast,
            exclude_patterns: args.exclude,
            facts_input: args.facts_in,
            ..Default::default()
        },
        ..Default::default()
    };

    let analysis = validator
        .validate_with_options(default_paths(args.paths), &options)
        .await
        .context("Analysis failed")?;

    let formatted = validator.format_report(&analysis.report, args.format.into())?;
    print!("{formatted}");

    if analysis.report.has_errors() {
        Ok(1)
    } else {
        Ok(0)
    }
}

async fn run_facts(
    config_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    output: Option<PathBuf>,
    facts_in: Option<PathBuf>,
) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let validator = FactoryGuard::new_with_config(config).context("Invalid configuration")?;

    let options = ValidationOptions {
        facts_output: output.clone(),
        analysis_options: AnalysisOptions {
            facts_input: facts_in,
            ..Default::default()
        },
    };
    let analysis = validator
        .validate_with_options(default_paths(paths), &options)
        .await
        .context("Analysis failed")?;

    if output.is_none() {
        println!("{}", analysis.facts.to_json()?);
    }
    eprintln!("{}", analysis.facts.statistics().format_display());

    Ok(0)
}

fn run_validate_config(config_path: Option<PathBuf>) -> anyhow::Result<i32> {
    let config_path = config_path
        .or_else(|| GuardConfig::discover("."))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAMES[0]));

    println!("Validating configuration: {}", config_path.display());

    match GuardConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");

            let enabled_rules = ALL_RULES.iter().filter(|id| config.rule_enabled(id)).count();
            let mut detectors = Vec::new();
            if config.constructors.marker_detection {
                detectors.push(format!("marker '{}'", config.constructors.marker));
            }
            if config.constructors.naming_detection {
                detectors.push(format!("prefix '{}'", config.constructors.prefix));
            }

            println!("📊 Configuration summary:");
            println!("  Rules: {} total, {} enabled", ALL_RULES.len(), enabled_rules);
            println!("  Constructors: {}", detectors.join(", "));
            println!("  Ignored modules: {}", config.ignore_list().len());
            println!("  Unit exclusions: {}", config.units.patterns.len());
            println!("  Fingerprint: {}", config.fingerprint());

            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn rule_description(rule_id: &str) -> Option<&'static str> {
    match rule_id {
        RULE_STRUCT_LITERAL => Some(
            "A composite literal of a type that has a constructor, written outside the module declaring it. Covers value and address-of forms.",
        ),
        RULE_TYPE_CONVERSION => Some(
            "A conversion into a non-aggregate defined type that has a constructor, written outside the module declaring it.",
        ),
        RULE_FIELD_ASSIGNMENT => Some(
            "An assignment to a field of a type that has a constructor, outside the module declaring it. Promoted fields are reported against the embedded type that owns them.",
        ),
        RULE_CONSTRUCTOR_COMPLETENESS => Some(
            "A naming-convention constructor returning a literal of its type that leaves declared fields unkeyed.",
        ),
        _ => None,
    }
}

fn run_explain(rule_id: &str) -> i32 {
    let config = GuardConfig::default();

    match rule_description(rule_id) {
        Some(description) => {
            println!("📖 Rule: {rule_id}");
            println!("⚠️ Severity: {}", config.effective_severity(rule_id).as_str());
            println!();
            println!("📝 Description:");
            println!("   {description}");
            0
        }
        None => {
            eprintln!("❌ Rule '{rule_id}' not found");
            println!();
            println!("Available rules:");
            for id in ALL_RULES {
                println!("  - {id}");
            }
            1
        }
    }
}

fn run_list_rules(config_path: Option<PathBuf>, enabled_only: bool) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;

    println!("📋 Available Rules\n");

    for id in ALL_RULES {
        let enabled = config.rule_enabled(id);
        if enabled_only && !enabled {
            continue;
        }

        let status = if enabled { "✅" } else { "❌" };
        println!(
            "  {}🔍 {} [{}] - {}",
            status,
            id,
            config.effective_severity(id).as_str(),
            rule_description(id).unwrap_or_default()
        );
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use factory_guard::model::{Element, Expr, Field, FuncDecl, SourceFile, Stmt, Ty, TypeDecl};
    use factory_guard::{FactStore, Module, TypeId};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_units(root: &Path) {
        let user = Ty::named("target", "User");
        let target = Module::new("target")
            .with_type(TypeDecl::aggregate(
                TypeId::new("target", "User"),
                vec![
                    Field::new("Name", Ty::basic("string")),
                    Field::new("email", Ty::basic("string")),
                ],
            ))
            .with_file(
                SourceFile::new("target/target.go").with_func(
                    FuncDecl::new("NewUser")
                        .returning(Ty::pointer(user.clone()))
                        .with_body(vec![Stmt::ret(vec![Expr::addr_of(Expr::composite(
                            user.clone(),
                            vec![Element::field("Name", Expr::ident("name"))],
                        ))])]),
                ),
            );
        let consumer = Module::new("consumer").with_import("target").with_file(
            SourceFile::new("consumer/consumer.go").with_func(
                FuncDecl::new("Run")
                    .with_body(vec![Stmt::define("u", Expr::composite(user, vec![]).at(3, 7))]),
            ),
        );

        for module in [target, consumer] {
            let json = serde_json::to_string(&module).unwrap();
            fs::write(root.join(format!("{}.unit.json", module.path)), json).unwrap();
        }
    }

    fn check_args(root: &Path) -> CheckArgs {
        CheckArgs {
            paths: vec![root.to_path_buf()],
            format: OutputFormatArg::Json,
            severity: None,
            max_violations: None,
            ignore_packages: None,
            no_completeness: false,
            exclude: vec![],
            no_parallel: false,
            fail_fast: false,
            facts_in: None,
            use_colors: false,
        }
    }

    #[tokio::test]
    async fn test_check_command() {
        let temp_dir = TempDir::new().unwrap();
        write_units(temp_dir.path());

        let result = run_check(None, check_args(temp_dir.path())).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_check_with_ignored_target_passes() {
        let temp_dir = TempDir::new().unwrap();
        write_units(temp_dir.path());

        let args = CheckArgs {
            ignore_packages: Some("target".to_string()),
            no_completeness: true,
            ..check_args(temp_dir.path())
        };
        assert_eq!(run_check(None, args).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_facts_command_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        write_units(temp_dir.path());
        let output = temp_dir.path().join("out/facts.json");
        fs::create_dir_all(temp_dir.path().join("out")).unwrap();

        let result = run_facts(None, vec![temp_dir.path().to_path_buf()], Some(output.clone()), None).await;
        assert_eq!(result.unwrap(), 0);

        let facts = FactStore::load(&output).unwrap();
        assert!(facts.contains(&TypeId::new("target", "User")));
    }

    #[tokio::test]
    async fn test_check_with_facts_from_earlier_run() {
        let temp_dir = TempDir::new().unwrap();
        let units = temp_dir.path().join("units");
        fs::create_dir_all(&units).unwrap();
        write_units(&units);
        let facts_file = temp_dir.path().join("facts.json");
        assert_eq!(
            run_facts(None, vec![units.clone()], Some(facts_file.clone()), None).await.unwrap(),
            0
        );

        fs::remove_file(units.join("target.unit.json")).unwrap();
        assert_eq!(run_check(None, check_args(&units)).await.unwrap(), 0);

        let args = CheckArgs {
            facts_in: Some(facts_file),
            ..check_args(&units)
        };
        assert_eq!(run_check(None, args).await.unwrap(), 1);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("factory_guard.yaml");

        let yaml = serde_yaml::to_string(&GuardConfig::default()).unwrap();
        fs::write(&config_file, yaml).unwrap();
        assert_eq!(run_validate_config(Some(config_file.clone())).unwrap(), 0);

        fs::write(&config_file, "version: \"2.0\"\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file)).unwrap(), 1);
    }

    #[test]
    fn test_explain_rule() {
        assert_eq!(run_explain("struct_literal"), 0);
        assert_eq!(run_explain("nonexistent_rule"), 1);
    }

    #[test]
    fn test_every_rule_is_described() {
        for id in ALL_RULES {
            assert!(rule_description(id).is_some(), "{id} has no description");
        }
    }
}
