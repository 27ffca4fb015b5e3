//! Resolved program model consumed by the analyzer
//!
//! Architecture: Published Language - The contract between a language front-end and the checker
//! - types: declaration identities, fields, embedding and underlying kinds
//! - syntax: per-module resolved syntax tree with typed expressions
//! - visit: traversal helpers shared by every analysis pass

pub mod syntax;
pub mod types;
pub mod visit;

pub use syntax::{
    Block, CaseClause, CommClause, Element, Expr, ExprKind, FuncDecl, Module, Pos, ResultVar, Selection,
    SelectionKind, SourceFile, Stmt, UnaryOp,
};
pub use types::{package_name_from_path, Field, Ty, TypeDecl, TypeId, TypeKind, TypeTable};
pub use visit::Visit;
