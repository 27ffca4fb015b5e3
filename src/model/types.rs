//! Resolved types and declarations handed to the analyzer by the front-end
//!
//! Architecture: Published Language - The query surface every pass relies on
//! - TypeId is the global identity of a declaration: (module path, name)
//! - Ty is an already-resolved static type, never an unresolved name
//! - TypeTable answers "what are the fields of this declaration" for any visible module

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a declared type: the path of its declaring module and its name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId {
    /// Import path of the declaring module; empty for predeclared types
    pub module: String,
    /// Declared name
    pub name: String,
}

impl TypeId {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Whether this identity belongs to the universe scope rather than a module
    pub fn is_predeclared(&self) -> bool {
        self.module.is_empty()
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.module, self.name)
        }
    }
}

/// A resolved static type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ty {
    /// Predeclared scalar such as `string`, `int` or `bool`
    Basic { name: String },
    /// The predeclared error interface
    Error,
    /// Reference to a declared type
    Named(TypeId),
    /// Pointer or reference to another type
    Pointer { elem: Box<Ty> },
    Slice { elem: Box<Ty> },
    Map { key: Box<Ty>, value: Box<Ty> },
    /// Anonymous record type
    Struct { fields: Vec<Field> },
    /// Anything else the front-end resolved (functions, channels, interfaces)
    Other { repr: String },
}

impl Ty {
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic { name: name.into() }
    }

    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named(TypeId::new(module, name))
    }

    pub fn pointer(elem: Ty) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    /// Remove one level of pointer indirection
    pub fn deref(&self) -> &Ty {
        match self {
            Self::Pointer { elem } => elem,
            other => other,
        }
    }

    pub fn as_named(&self) -> Option<&TypeId> {
        match self {
            Self::Named(id) => Some(id),
            _ => None,
        }
    }

    /// Named type behind at most one pointer: `T` and `*T` both yield `T`
    pub fn named_elem(&self) -> Option<&TypeId> {
        self.deref().as_named()
    }

    /// Error-like sentinel results are skipped when looking for constructed types
    pub fn is_error_like(&self) -> bool {
        match self {
            Self::Error => true,
            Self::Named(id) => id.is_predeclared() && id.name == "error",
            _ => false,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { name } => write!(f, "{name}"),
            Self::Error => write!(f, "error"),
            Self::Named(id) => write!(f, "{id}"),
            Self::Pointer { elem } => write!(f, "*{elem}"),
            Self::Slice { elem } => write!(f, "[]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Struct { fields } => write!(f, "struct{{{} fields}}", fields.len()),
            Self::Other { repr } => write!(f, "{repr}"),
        }
    }
}

/// A field of an aggregate type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name; embedded members are named after their type
    pub name: String,
    /// Whether the field is visible outside its module
    #[serde(default)]
    pub exported: bool,
    /// Declared type of the field
    pub ty: Ty,
    /// Anonymous member whose own fields are promoted to the outer type
    #[serde(default)]
    pub embedded: bool,
}

impl Field {
    /// Create a named field; visibility follows the leading-capital convention
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        let name = name.into();
        let exported = name.chars().next().is_some_and(char::is_uppercase);
        Self {
            name,
            exported,
            ty,
            embedded: false,
        }
    }

    /// Create an embedded member; its name is the embedded type's name
    pub fn embedded(ty: Ty) -> Self {
        let name = match ty.named_elem() {
            Some(id) => id.name.clone(),
            None => ty.to_string(),
        };
        let mut field = Self::new(name, ty);
        field.embedded = true;
        field
    }
}

/// What a declaration is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Named record type with ordered fields
    Aggregate { fields: Vec<Field> },
    /// Named type over a non-record representation
    Defined { underlying: Ty },
}

/// A type declared by some module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub id: TypeId,
    /// Short package name used when naming the constructor in diagnostics
    #[serde(default)]
    pub package: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeDecl {
    pub fn aggregate(id: TypeId, fields: Vec<Field>) -> Self {
        Self {
            id,
            package: String::new(),
            kind: TypeKind::Aggregate { fields },
        }
    }

    pub fn defined(id: TypeId, underlying: Ty) -> Self {
        Self {
            id,
            package: String::new(),
            kind: TypeKind::Defined { underlying },
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Fields when the underlying representation is a record
    pub fn aggregate_fields(&self) -> Option<&[Field]> {
        match &self.kind {
            TypeKind::Aggregate { fields } => Some(fields),
            TypeKind::Defined {
                underlying: Ty::Struct { fields },
            } => Some(fields),
            TypeKind::Defined { .. } => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate_fields().is_some()
    }

    /// Declared package name, or the last path segment when the front-end omitted it
    pub fn package_name(&self) -> &str {
        if self.package.is_empty() {
            package_name_from_path(&self.id.module)
        } else {
            &self.package
        }
    }
}

/// Last `/`-separated segment of a module path
pub fn package_name_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Every declaration visible to the module under analysis
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    decls: BTreeMap<TypeId, TypeDecl>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, replacing any previous one with the same identity
    pub fn insert(&mut self, decl: TypeDecl) {
        self.decls.insert(decl.id.clone(), decl);
    }

    pub fn get(&self, id: &TypeId) -> Option<&TypeDecl> {
        self.decls.get(id)
    }

    /// Declaration supplying the representation of `id`.
    ///
    /// Defined types over another named type are followed through the table,
    /// so `type Admin User` resolves to `User`. `None` when a link is missing
    /// or the chain loops.
    pub fn underlying_decl(&self, id: &TypeId) -> Option<&TypeDecl> {
        let mut decl = self.get(id)?;
        for _ in 0..self.decls.len() {
            match &decl.kind {
                TypeKind::Defined {
                    underlying: Ty::Named(next),
                } => decl = self.get(next)?,
                _ => return Some(decl),
            }
        }
        None
    }

    /// Record fields of a declaration, `None` for unknown or non-record types
    pub fn aggregate_fields(&self, id: &TypeId) -> Option<&[Field]> {
        self.underlying_decl(id).and_then(TypeDecl::aggregate_fields)
    }

    pub fn is_aggregate(&self, id: &TypeId) -> bool {
        self.aggregate_fields(id).is_some()
    }

    /// Package name to print in front of a constructor of `id`
    pub fn package_name(&self, id: &TypeId) -> String {
        match self.get(id) {
            Some(decl) => decl.package_name().to_string(),
            None => package_name_from_path(&id.module).to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.values()
    }
}

impl Extend<TypeDecl> for TypeTable {
    fn extend<I: IntoIterator<Item = TypeDecl>>(&mut self, iter: I) {
        for decl in iter {
            self.insert(decl);
        }
    }
}

impl FromIterator<TypeDecl> for TypeTable {
    fn from_iter<I: IntoIterator<Item = TypeDecl>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deref_removes_one_level_only() {
        let user = Ty::named("target", "User");
        let double = Ty::pointer(Ty::pointer(user.clone()));

        assert_eq!(Ty::pointer(user.clone()).deref(), &user);
        assert!(double.named_elem().is_none());
        assert_eq!(user.named_elem().map(|id| id.name.as_str()), Some("User"));
    }

    #[test]
    fn test_error_like() {
        assert!(Ty::Error.is_error_like());
        assert!(Ty::named("", "error").is_error_like());
        assert!(!Ty::named("errors", "error").is_error_like());
        assert!(!Ty::basic("string").is_error_like());
    }

    #[test]
    fn test_embedded_field_named_after_type() {
        let field = Field::embedded(Ty::pointer(Ty::named("target", "User")));
        assert_eq!(field.name, "User");
        assert!(field.embedded);
        assert!(field.exported);

        let private = Field::new("email", Ty::basic("string"));
        assert!(!private.exported);
    }

    #[test]
    fn test_package_name_fallback() {
        let decl = TypeDecl::defined(TypeId::new("example.com/app/target", "Email"), Ty::basic("string"));
        assert_eq!(decl.package_name(), "target");
        assert!(!decl.is_aggregate());

        let named = decl.clone().with_package("tgt");
        assert_eq!(named.package_name(), "tgt");

        let table: TypeTable = vec![named].into_iter().collect();
        assert_eq!(table.package_name(&TypeId::new("example.com/app/target", "Email")), "tgt");
        assert_eq!(table.package_name(&TypeId::new("other/pkg", "Missing")), "pkg");
    }

    #[test]
    fn test_defined_over_anonymous_struct_is_aggregate() {
        let decl = TypeDecl::defined(
            TypeId::new("m", "Point"),
            Ty::Struct {
                fields: vec![Field::new("X", Ty::basic("int"))],
            },
        );
        assert_eq!(decl.aggregate_fields().map(<[Field]>::len), Some(1));
    }

    #[test]
    fn test_defined_over_named_aggregate_resolves_through_table() {
        let user = TypeId::new("target", "User");
        let admin = TypeId::new("target", "Admin");
        let root = TypeId::new("target", "Root");
        let email = TypeId::new("target", "Email");
        let table: TypeTable = vec![
            TypeDecl::aggregate(user.clone(), vec![Field::new("Name", Ty::basic("string"))]),
            TypeDecl::defined(admin.clone(), Ty::Named(user.clone())),
            TypeDecl::defined(root.clone(), Ty::Named(admin.clone())),
            TypeDecl::defined(email.clone(), Ty::basic("string")),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.underlying_decl(&root).map(|d| &d.id), Some(&user));
        assert_eq!(table.aggregate_fields(&admin).map(<[Field]>::len), Some(1));
        assert!(table.is_aggregate(&root));
        assert!(!table.is_aggregate(&email));
        assert_eq!(table.underlying_decl(&email).map(|d| &d.id), Some(&email));
    }

    #[test]
    fn test_defined_chain_with_missing_link_or_cycle() {
        let a = TypeId::new("m", "A");
        let b = TypeId::new("m", "B");
        let dangling = TypeId::new("m", "Dangling");
        let table: TypeTable = vec![
            TypeDecl::defined(a.clone(), Ty::Named(b.clone())),
            TypeDecl::defined(b.clone(), Ty::Named(a.clone())),
            TypeDecl::defined(dangling.clone(), Ty::named("other", "Gone")),
        ]
        .into_iter()
        .collect();

        assert!(table.underlying_decl(&a).is_none());
        assert!(!table.is_aggregate(&b));
        assert!(table.underlying_decl(&dangling).is_none());
    }

    #[test]
    fn test_type_decl_json_shape() {
        let decl = TypeDecl::aggregate(
            TypeId::new("target", "User"),
            vec![Field::new("Name", Ty::basic("string"))],
        );
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["kind"], "aggregate");
        assert_eq!(json["id"]["name"], "User");
        assert_eq!(json["fields"][0]["ty"]["kind"], "basic");

        let back: TypeDecl = serde_json::from_value(json).unwrap();
        assert_eq!(back, decl);
    }
}
