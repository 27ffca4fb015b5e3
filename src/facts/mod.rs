//! Constructor fact store shared across modules
//!
//! Architecture: Repository - FactStore holds what earlier modules learned about their types
//! - Facts are keyed by type identity and written at most once
//! - The store is serialized only to ship facts between processes of the same run
//! - A content digest makes re-runs over unchanged input comparable

use crate::domain::violations::{GuardError, GuardResult};
use crate::model::TypeId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Transport format version
const FACT_FORMAT_VERSION: u32 = 1;

/// A type has a canonical constructor; only that function may build it elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructorFact {
    /// The type the constructor builds
    pub owner: TypeId,
    /// Name of the constructor function in the owner's module
    pub constructor: String,
}

impl ConstructorFact {
    pub fn new(owner: TypeId, constructor: impl Into<String>) -> Self {
        Self {
            owner,
            constructor: constructor.into(),
        }
    }
}

/// Write-once, read-many map from type identity to constructor fact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactStore {
    facts: BTreeMap<TypeId, ConstructorFact>,
}

/// Serializable form of the store
#[derive(Debug, Serialize, Deserialize)]
struct FactFile {
    version: u32,
    facts: Vec<ConstructorFact>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact unless one already exists for its type.
    ///
    /// Returns `true` when the fact was stored. A later candidate for an
    /// already-covered type is dropped without complaint.
    pub fn export(&mut self, fact: ConstructorFact) -> bool {
        if let Some(existing) = self.facts.get(&fact.owner) {
            tracing::debug!(
                "Keeping constructor {} for {}; dropping later candidate {}",
                existing.constructor,
                fact.owner,
                fact.constructor
            );
            return false;
        }

        self.facts.insert(fact.owner.clone(), fact);
        true
    }

    /// Merge facts produced by another module, returning how many were new
    pub fn merge<I>(&mut self, facts: I) -> usize
    where
        I: IntoIterator<Item = ConstructorFact>,
    {
        facts.into_iter().filter(|fact| self.export(fact.clone())).count()
    }

    pub fn lookup(&self, owner: &TypeId) -> Option<&ConstructorFact> {
        self.facts.get(owner)
    }

    pub fn contains(&self, owner: &TypeId) -> bool {
        self.facts.contains_key(owner)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Facts in identity order
    pub fn iter(&self) -> impl Iterator<Item = &ConstructorFact> {
        self.facts.values()
    }

    /// SHA-256 over the canonical listing of every fact
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for fact in self.facts.values() {
            hasher.update(fact.owner.module.as_bytes());
            hasher.update(b"\t");
            hasher.update(fact.owner.name.as_bytes());
            hasher.update(b"\t");
            hasher.update(fact.constructor.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn statistics(&self) -> FactStatistics {
        let modules: BTreeSet<&str> = self.facts.keys().map(|id| id.module.as_str()).collect();
        FactStatistics {
            total_facts: self.facts.len(),
            modules: modules.len(),
            digest: self.digest(),
        }
    }

    pub fn to_json(&self) -> GuardResult<String> {
        let file = FactFile {
            version: FACT_FORMAT_VERSION,
            facts: self.facts.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&file)
            .map_err(|e| GuardError::validation(format!("Failed to serialize facts: {e}")))
    }

    /// Rebuild a store from its JSON form; duplicate owners keep the first entry
    pub fn from_json(content: &str) -> GuardResult<Self> {
        let file: FactFile = serde_json::from_str(content)
            .map_err(|e| GuardError::load("<facts>", format!("Failed to parse facts: {e}")))?;

        if file.version != FACT_FORMAT_VERSION {
            return Err(GuardError::load(
                "<facts>",
                format!(
                    "Unsupported fact format version: {}. Expected {}",
                    file.version, FACT_FORMAT_VERSION
                ),
            ));
        }

        let mut store = Self::new();
        store.merge(file.facts);
        Ok(store)
    }

    /// Write the store for another process of the same run
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GuardResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GuardError::load(path.display().to_string(), format!("Failed to read facts: {e}"))
        })?;
        Self::from_json(&content).map_err(|e| match e {
            GuardError::Load { message, .. } => GuardError::load(path.display().to_string(), message),
            other => other,
        })
    }
}

impl Extend<ConstructorFact> for FactStore {
    fn extend<I: IntoIterator<Item = ConstructorFact>>(&mut self, iter: I) {
        self.merge(iter);
    }
}

/// Read-only view over the facts of the module being analyzed and those it imports
#[derive(Debug, Clone, Copy)]
pub struct FactView<'a> {
    local: &'a FactStore,
    imported: &'a FactStore,
}

impl<'a> FactView<'a> {
    pub fn new(local: &'a FactStore, imported: &'a FactStore) -> Self {
        Self { local, imported }
    }

    pub fn lookup(&self, owner: &TypeId) -> Option<&'a ConstructorFact> {
        self.local
            .lookup(owner)
            .or_else(|| self.imported.lookup(owner))
    }
}

/// Summary of a fact store
#[derive(Debug, Clone)]
pub struct FactStatistics {
    pub total_facts: usize,
    pub modules: usize,
    pub digest: String,
}

impl FactStatistics {
    /// Format statistics for display
    pub fn format_display(&self) -> String {
        format!(
            "Facts: {} constructor{} across {} module{} (digest {})",
            self.total_facts,
            if self.total_facts == 1 { "" } else { "s" },
            self.modules,
            if self.modules == 1 { "" } else { "s" },
            &self.digest[..12.min(self.digest.len())]
        )
    }
}
