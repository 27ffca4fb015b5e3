//! Constructor discovery
//!
//! Architectural Principle: Strategy - Each ConstructorDetector is one way of recognizing a constructor
//! - Detectors run in order per function; the first that recognizes it wins
//! - Facts are only ever produced for types declared by the module being analyzed
//! - Declaration order decides which of two candidates for a type is kept

use crate::config::GuardConfig;
use crate::domain::violations::GuardResult;
use crate::facts::{ConstructorFact, FactStore};
use crate::model::{FuncDecl, Module, Ty, TypeId, TypeTable};
use crate::patterns::{MarkerTag, NamingConvention};

/// A way of recognizing constructor functions
pub trait ConstructorDetector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Types `func` constructs.
    ///
    /// `None` means the detector does not recognize the function and the next
    /// detector is consulted. `Some` stops detection for this function, even
    /// when the list is empty.
    fn detect(&self, func: &FuncDecl, module: &Module, types: &TypeTable) -> Option<Vec<TypeId>>;
}

/// Recognizes functions whose doc comment carries the constructor marker
#[derive(Debug, Clone)]
pub struct MarkerDetector {
    marker: MarkerTag,
}

impl MarkerDetector {
    pub fn new(marker: MarkerTag) -> Self {
        Self { marker }
    }
}

impl ConstructorDetector for MarkerDetector {
    fn name(&self) -> &'static str {
        "marker"
    }

    fn detect(&self, func: &FuncDecl, module: &Module, types: &TypeTable) -> Option<Vec<TypeId>> {
        if !self.marker.is_marked(&func.doc) {
            return None;
        }

        let mut owners: Vec<TypeId> = Vec::new();
        for result in &func.results {
            if result.ty.is_error_like() {
                continue;
            }
            if let Some(id) = local_named(&result.ty, module, types) {
                if !owners.contains(id) {
                    owners.push(id.clone());
                }
            }
        }

        if owners.is_empty() {
            tracing::debug!(
                "Marked function {} in {} returns no type declared there",
                func.name,
                module.path
            );
        }

        Some(owners)
    }
}

/// Recognizes `{prefix}{TypeName}` functions returning that type
#[derive(Debug, Clone)]
pub struct NamingDetector {
    naming: NamingConvention,
}

impl NamingDetector {
    pub fn new(naming: NamingConvention) -> Self {
        Self { naming }
    }
}

impl ConstructorDetector for NamingDetector {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn detect(&self, func: &FuncDecl, module: &Module, types: &TypeTable) -> Option<Vec<TypeId>> {
        self.naming.candidate(&func.name)?;
        let result = constructor_result(func)?;
        let id = local_named(result, module, types)?;

        if !self.naming.names_type(&func.name, &id.name) {
            tracing::trace!(
                "{} returns {} which its name does not announce",
                func.name,
                id
            );
            return None;
        }

        Some(vec![id.clone()])
    }
}

/// The type a constructor builds: its first result once a single trailing
/// error-like result is set aside
pub fn constructor_result(func: &FuncDecl) -> Option<&Ty> {
    let mut results = func.results.as_slice();
    if let Some((last, rest)) = results.split_last() {
        if last.ty.is_error_like() {
            results = rest;
        }
    }
    results.first().map(|result| &result.ty)
}

/// Named type behind at most one pointer, declared by `module` itself
fn local_named<'t>(ty: &'t Ty, module: &Module, types: &TypeTable) -> Option<&'t TypeId> {
    let id = ty.named_elem()?;
    if id.module != module.path || types.get(id).is_none() {
        return None;
    }
    Some(id)
}

/// Per-module pass producing constructor facts
pub struct ConstructorExtractor {
    detectors: Vec<Box<dyn ConstructorDetector>>,
}

impl ConstructorExtractor {
    /// Detectors in their fixed order: marker first, naming as fallback
    pub fn from_config(config: &GuardConfig) -> GuardResult<Self> {
        let mut detectors: Vec<Box<dyn ConstructorDetector>> = Vec::new();

        if config.constructors.marker_detection {
            detectors.push(Box::new(MarkerDetector::new(config.marker_tag()?)));
        }
        if config.constructors.naming_detection {
            detectors.push(Box::new(NamingDetector::new(config.naming_convention()?)));
        }

        Ok(Self::with_detectors(detectors))
    }

    pub fn with_detectors(detectors: Vec<Box<dyn ConstructorDetector>>) -> Self {
        Self { detectors }
    }

    /// Names of the active detectors, in order
    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Facts for the types `module` declares, in declaration order
    pub fn extract(&self, module: &Module, types: &TypeTable) -> FactStore {
        let mut facts = FactStore::new();

        for (_, func) in module.functions() {
            if func.is_method() {
                continue;
            }

            let Some((detector, owners)) = self
                .detectors
                .iter()
                .find_map(|d| d.detect(func, module, types).map(|owners| (d.name(), owners)))
            else {
                continue;
            };

            for owner in owners {
                tracing::debug!("{} constructs {} ({} detector)", func.name, owner, detector);
                facts.export(ConstructorFact::new(owner, func.name.clone()));
            }
        }

        facts
    }
}
