//! Domain layer for Factory Guard
//!
//! Architecture: Domain Model - Violations, reports and errors shared by every pass
//! - Independent of how modules are loaded or how reports are rendered
//! - Expresses the vocabulary of encapsulation checking: rules, severities, diagnostics

pub mod violations;

// Re-export main domain types for convenience
pub use violations::*;
