//! Discovery and decoding of resolved module unit files
//!
//! Architectural Principle: Service Layer - UnitLoader turns paths on disk into analyzable modules
//! - Directories are walked for files carrying the unit extension
//! - Glob exclusions apply to the full path, the path below the walked root and the file name
//! - Unreadable units are either fatal or logged and skipped

use crate::config::UnitConfig;
use crate::domain::violations::{GuardError, GuardResult};
use crate::model::Module;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds and parses unit files
#[derive(Debug, Clone)]
pub struct UnitLoader {
    /// Exclusion patterns
    exclusions: Vec<Exclusion>,
    /// File name suffix of unit files, without the leading dot
    extension: String,
}

/// A single exclusion pattern
#[derive(Debug, Clone)]
struct Exclusion {
    pattern: glob::Pattern,
    /// Original pattern string for debugging
    original: String,
}

impl Exclusion {
    fn new(original: &str) -> GuardResult<Self> {
        let pattern = glob::Pattern::new(original).map_err(|e| {
            GuardError::config(format!("Invalid exclusion pattern '{original}': {e}"))
        })?;
        Ok(Self {
            pattern,
            original: original.to_string(),
        })
    }

    /// Patterns with a slash match paths; bare patterns match file names only
    fn matches(&self, path: &Path, relative: Option<&Path>) -> bool {
        if self.original.contains('/') {
            return self.pattern.matches_path(path)
                || relative.is_some_and(|rel| self.pattern.matches_path(rel));
        }

        path.file_name()
            .is_some_and(|name| self.pattern.matches(&name.to_string_lossy()))
    }
}

impl UnitLoader {
    /// Create a loader for files ending in `.{extension}`
    pub fn new(patterns: &[String], extension: impl Into<String>) -> GuardResult<Self> {
        let exclusions = patterns
            .iter()
            .map(|p| Exclusion::new(p))
            .collect::<GuardResult<Vec<_>>>()?;

        Ok(Self {
            exclusions,
            extension: extension.into(),
        })
    }

    pub fn from_config(config: &UnitConfig) -> GuardResult<Self> {
        Self::new(&config.patterns, config.extension.clone())
    }

    /// Add an exclusion pattern
    pub fn add_exclusion(&mut self, pattern: &str) -> GuardResult<()> {
        self.exclusions.push(Exclusion::new(pattern)?);
        Ok(())
    }

    /// Whether `path` names a unit file by its extension
    pub fn is_unit_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| {
                name.strip_suffix(self.extension.as_str())
                    .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
            })
    }

    /// Whether `path` is excluded; `root` is the directory being walked, if any
    pub fn is_excluded(&self, path: &Path, root: Option<&Path>) -> bool {
        let relative = root.and_then(|root| path.strip_prefix(root).ok());
        self.exclusions.iter().any(|exclusion| {
            let excluded = exclusion.matches(path, relative);
            if excluded {
                tracing::trace!("{} excluded by '{}'", path.display(), exclusion.original);
            }
            excluded
        })
    }

    /// Unit files below `root`, in sorted path order
    pub fn find_units<P: AsRef<Path>>(&self, root: P) -> Vec<PathBuf> {
        let root = root.as_ref();
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && self.is_unit_file(path))
            .filter(|path| !self.is_excluded(path, Some(root)))
            .collect();

        files.sort();
        files
    }

    /// Read and decode one unit file
    pub fn load_unit<P: AsRef<Path>>(&self, path: P) -> GuardResult<Module> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GuardError::load(path.display().to_string(), format!("Failed to read unit: {e}"))
        })?;

        parse_unit(&content).map_err(|message| GuardError::load(path.display().to_string(), message))
    }

    /// Load every unit reachable from `paths`.
    ///
    /// Files are taken as given; directories are walked. With `fail_fast`
    /// the first unreadable unit aborts, otherwise it is logged and skipped.
    pub fn collect<P: AsRef<Path>>(&self, paths: &[P], fail_fast: bool) -> GuardResult<Vec<Module>> {
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_file() {
                if !self.is_excluded(path, None) {
                    files.push(path.to_path_buf());
                }
            } else if path.is_dir() {
                files.extend(self.find_units(path));
            } else {
                return Err(GuardError::load(
                    path.display().to_string(),
                    "Path does not exist",
                ));
            }
        }

        let mut modules = Vec::with_capacity(files.len());
        for file in &files {
            match self.load_unit(file) {
                Ok(module) => modules.push(module),
                Err(e) => {
                    if fail_fast {
                        return Err(e);
                    }
                    tracing::warn!("Skipping unit {}: {}", file.display(), e);
                }
            }
        }

        tracing::debug!("Loaded {} of {} unit files", modules.len(), files.len());
        Ok(modules)
    }
}

/// Decode a unit from its JSON form, filling in the package name when omitted
pub fn parse_unit(content: &str) -> Result<Module, String> {
    let mut module: Module =
        serde_json::from_str(content).map_err(|e| format!("Failed to parse unit: {e}"))?;

    if module.path.is_empty() {
        return Err("Unit has an empty module path".to_string());
    }

    if module.name.is_empty() {
        module.name = crate::model::package_name_from_path(&module.path).to_string();
    }
    for decl in &mut module.types {
        if decl.package.is_empty() && decl.id.module == module.path {
            decl.package = module.name.clone();
        }
    }

    Ok(module)
}
