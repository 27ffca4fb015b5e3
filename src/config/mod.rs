//! Configuration loading and management for Factory Guard
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - Defaults live here so a missing file and an empty file behave the same
//! - The fingerprint identifies the effective settings in every report

use crate::domain::violations::{
    GuardError, GuardResult, Severity, ALL_RULES, RULE_CONSTRUCTOR_COMPLETENESS,
};
use crate::patterns::{IgnoreList, MarkerTag, NamingConvention, DEFAULT_MARKER, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported configuration format version
pub const CONFIG_VERSION: &str = "1.0";

/// File names searched, in order, when no configuration path is given
pub const CONFIG_FILE_NAMES: [&str; 2] = ["factory_guard.yaml", ".factory_guard.yaml"];

/// Main configuration structure for Factory Guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Configuration format version
    pub version: String,
    /// Comma-separated module paths exempt from every check
    #[serde(default)]
    pub ignore_packages: String,
    /// How constructors are recognized
    #[serde(default)]
    pub constructors: ConstructorConfig,
    /// Per-rule switches and severities, keyed by rule id
    #[serde(default = "default_rules")]
    pub rules: BTreeMap<String, RuleConfig>,
    /// Unit file discovery
    #[serde(default)]
    pub units: UnitConfig,
}

/// Constructor recognition settings
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct ConstructorConfig {
    /// Name prefix of naming-convention constructors
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Doc-comment marker of explicitly tagged constructors
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_true")]
    pub marker_detection: bool,
    #[serde(default = "default_true")]
    pub naming_detection: bool,
}

/// Switch and severity of one rule
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Severity override; each rule has its own default
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Unit file discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, Hash)]
pub struct UnitConfig {
    /// Glob patterns excluded from discovery
    #[serde(default)]
    pub patterns: Vec<String>,
    /// File name suffix of unit files, without the leading dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl GuardConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GuardError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GuardError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GuardResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GuardError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// First configuration file found in `dir`, if any
    pub fn discover<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Get default configuration
    pub fn with_defaults() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            ignore_packages: String::new(),
            constructors: ConstructorConfig::default(),
            rules: default_rules(),
            units: UnitConfig::default(),
        }
    }

    /// Validate configuration integrity
    pub fn validate(&self) -> GuardResult<()> {
        if self.version != CONFIG_VERSION {
            return Err(GuardError::config(format!(
                "Unsupported configuration version: {}. Expected {}",
                self.version, CONFIG_VERSION
            )));
        }

        let prefix = &self.constructors.prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(GuardError::config(format!(
                "Constructor prefix '{prefix}' must be a non-empty identifier"
            )));
        }

        MarkerTag::new(self.constructors.marker.clone())?;

        if !self.constructors.marker_detection && !self.constructors.naming_detection {
            return Err(GuardError::config(
                "At least one of marker_detection and naming_detection must be enabled",
            ));
        }

        for id in self.rules.keys() {
            if !ALL_RULES.contains(&id.as_str()) {
                return Err(GuardError::config(format!(
                    "Unknown rule '{}'. Known rules: {}",
                    id,
                    ALL_RULES.join(", ")
                )));
            }
        }

        if self.units.extension.is_empty() || self.units.extension.starts_with('.') {
            return Err(GuardError::config(format!(
                "Unit extension '{}' must be non-empty and given without a leading dot",
                self.units.extension
            )));
        }

        for pattern in &self.units.patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                GuardError::config(format!("Invalid unit exclusion pattern '{pattern}': {e}"))
            })?;
        }

        Ok(())
    }

    /// Effective settings of a rule; rules absent from the file keep their defaults
    pub fn rule(&self, id: &str) -> RuleConfig {
        self.rules.get(id).cloned().unwrap_or_default()
    }

    pub fn rule_enabled(&self, id: &str) -> bool {
        self.rule(id).enabled
    }

    /// Get effective severity for a rule (override or rule default)
    pub fn effective_severity(&self, id: &str) -> Severity {
        self.rule(id).severity.unwrap_or_else(|| default_severity(id))
    }

    /// Parsed ignore list
    pub fn ignore_list(&self) -> IgnoreList {
        IgnoreList::from_setting(&self.ignore_packages)
    }

    /// Compiled naming convention
    pub fn naming_convention(&self) -> GuardResult<NamingConvention> {
        NamingConvention::new(self.constructors.prefix.clone())
    }

    /// Compiled constructor marker
    pub fn marker_tag(&self) -> GuardResult<MarkerTag> {
        MarkerTag::new(self.constructors.marker.clone())
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> GuardResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GuardError::config(format!("Failed to serialize config: {e}")))
    }

    /// Create a fingerprint of the effective configuration
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.version.hash(&mut hasher);
        self.ignore_list().to_string().hash(&mut hasher);
        self.constructors.hash(&mut hasher);
        self.units.hash(&mut hasher);

        // Effective values so an explicit default and an omitted rule hash alike
        for id in ALL_RULES {
            id.hash(&mut hasher);
            self.rule_enabled(id).hash(&mut hasher);
            self.effective_severity(id).hash(&mut hasher);
        }

        format!("{:x}", hasher.finish())
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Default for ConstructorConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            marker: default_marker(),
            marker_detection: true,
            naming_detection: true,
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
        }
    }
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["**/vendor/**".to_string(), "**/.git/**".to_string()],
            extension: default_extension(),
        }
    }
}

/// Severity a rule reports at when the configuration does not override it
pub fn default_severity(id: &str) -> Severity {
    if id == RULE_CONSTRUCTOR_COMPLETENESS {
        Severity::Warning
    } else {
        Severity::Error
    }
}

fn default_rules() -> BTreeMap<String, RuleConfig> {
    ALL_RULES
        .iter()
        .map(|id| {
            (
                id.to_string(),
                RuleConfig {
                    enabled: true,
                    severity: Some(default_severity(id)),
                },
            )
        })
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_extension() -> String {
    "unit.json".to_string()
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: GuardConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: GuardConfig::default(),
        }
    }

    /// Set the comma-separated ignore list
    pub fn ignore_packages(mut self, setting: impl Into<String>) -> Self {
        self.config.ignore_packages = setting.into();
        self
    }

    pub fn constructor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.constructors.prefix = prefix.into();
        self
    }

    pub fn constructor_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.constructors.marker = marker.into();
        self
    }

    pub fn marker_detection(mut self, enabled: bool) -> Self {
        self.config.constructors.marker_detection = enabled;
        self
    }

    pub fn naming_detection(mut self, enabled: bool) -> Self {
        self.config.constructors.naming_detection = enabled;
        self
    }

    /// Enable or disable a rule, keeping its severity
    pub fn rule_enabled(mut self, id: impl Into<String>, enabled: bool) -> Self {
        self.config.rules.entry(id.into()).or_default().enabled = enabled;
        self
    }

    pub fn rule_severity(mut self, id: impl Into<String>, severity: Severity) -> Self {
        self.config.rules.entry(id.into()).or_default().severity = Some(severity);
        self
    }

    /// Add a unit exclusion pattern
    pub fn add_unit_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.units.patterns.push(pattern.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GuardResult<GuardConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
