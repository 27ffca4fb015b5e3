//! Detection of construction and mutation that bypasses a constructor
//!
//! Architectural Principle: Domain Services - ViolationScanner walks one module and consults
//! the fact store and ownership filter for every candidate expression
//! - Composite literals of guarded types
//! - Conversions into guarded defined types
//! - Assignments to fields of guarded types, promoted fields included

use crate::analyzer::RuleSet;
use crate::domain::violations::{
    Severity, Violation, RULE_FIELD_ASSIGNMENT, RULE_STRUCT_LITERAL, RULE_TYPE_CONVERSION,
};
use crate::facts::{ConstructorFact, FactView};
use crate::model::visit::{self, Visit};
use crate::model::{
    Expr, ExprKind, Module, Pos, SelectionKind, SourceFile, Stmt, Ty, TypeId, TypeTable,
};
use crate::patterns::OwnershipFilter;
use std::path::Path;

/// Types traversed while resolving a field selection, receiver first.
///
/// The last link is the type that actually declares the selected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChain {
    pub links: Vec<TypeId>,
}

impl OwnershipChain {
    /// The declaring type of the selected field
    pub fn owner(&self) -> Option<&TypeId> {
        self.links.last()
    }

    /// Whether the field was reached through embedded members
    pub fn is_promoted(&self) -> bool {
        self.links.len() > 1
    }
}

/// Follow a selection's index path from `recv` to the aggregate declaring the field.
///
/// Every index but the last names an embedded member to descend into; each
/// step dereferences one pointer level and requires a named aggregate.
pub fn resolve_field_owner(types: &TypeTable, recv: &Ty, index: &[usize]) -> Option<OwnershipChain> {
    let (_, path) = index.split_last()?;

    let mut links = Vec::with_capacity(index.len());
    let mut current = recv;
    for &position in path {
        let id = current.named_elem()?;
        let fields = types.aggregate_fields(id)?;
        links.push(id.clone());
        current = &fields.get(position)?.ty;
    }

    let owner = current.named_elem()?;
    types.aggregate_fields(owner)?;
    links.push(owner.clone());

    Some(OwnershipChain { links })
}

pub fn struct_literal_message(type_name: &str, package: &str, constructor: &str) -> String {
    format!(
        "direct struct literal creation of {type_name} is not allowed; use {package}.{constructor}() instead"
    )
}

pub fn type_conversion_message(type_name: &str, package: &str, constructor: &str) -> String {
    format!(
        "direct type conversion to {type_name} is not allowed; use {package}.{constructor}() instead"
    )
}

pub fn field_assignment_message(type_name: &str, field: &str, constructor: &str) -> String {
    format!(
        "direct field assignment to {type_name}.{field} is not allowed; {type_name} has a constructor {constructor}()"
    )
}

/// Visitor collecting the violations of one module
pub struct ViolationScanner<'a> {
    module: &'a Module,
    types: &'a TypeTable,
    facts: FactView<'a>,
    filter: OwnershipFilter<'a>,
    rules: &'a RuleSet,
    file: Option<&'a Path>,
    violations: Vec<Violation>,
}

impl<'a> ViolationScanner<'a> {
    pub fn new(
        module: &'a Module,
        types: &'a TypeTable,
        facts: FactView<'a>,
        filter: OwnershipFilter<'a>,
        rules: &'a RuleSet,
    ) -> Self {
        Self {
            module,
            types,
            facts,
            filter,
            rules,
            file: None,
            violations: Vec::new(),
        }
    }

    /// Walk the whole module and return what was found
    pub fn scan(mut self) -> Vec<Violation> {
        self.visit_module(self.module);
        self.violations
    }

    /// Constructor fact for `owner` when it is foreign, not ignored and guarded
    fn guarded(&self, owner: &TypeId) -> Option<&'a ConstructorFact> {
        if let Some(reason) = self.filter.skip(owner) {
            tracing::trace!("Skipping {} ({:?})", owner, reason);
            return None;
        }
        self.facts.lookup(owner)
    }

    fn report(&mut self, rule_id: &str, severity: Severity, pos: Pos, message: String) {
        let file = self.file.map(Path::to_path_buf).unwrap_or_default();
        tracing::trace!("{}:{}:{}: {}", file.display(), pos.line, pos.column, message);
        self.violations.push(
            Violation::new(rule_id, severity, file, message)
                .with_position(pos.line, pos.column)
                .in_module(self.module.path.clone()),
        );
    }

    fn check_literal(&mut self, lit: &Expr) {
        let Some(severity) = self.rules.severity(RULE_STRUCT_LITERAL) else {
            return;
        };
        let Some(owner) = lit.ty.as_ref().and_then(Ty::named_elem) else {
            return;
        };
        let Some(fact) = self.guarded(owner) else {
            return;
        };

        let message = struct_literal_message(
            &owner.name,
            &self.types.package_name(owner),
            &fact.constructor,
        );
        self.report(RULE_STRUCT_LITERAL, severity, lit.pos, message);
    }

    fn check_conversion(&mut self, call: &Expr, callee: &Expr) {
        let Some(severity) = self.rules.severity(RULE_TYPE_CONVERSION) else {
            return;
        };
        if !callee.is_type {
            return;
        }
        let Some(target) = callee.ty.as_ref().and_then(Ty::named_elem) else {
            return;
        };
        // Aggregates are built with literals, which the literal rule covers
        match self.types.underlying_decl(target) {
            Some(decl) if !decl.is_aggregate() => {}
            _ => return,
        }
        let Some(fact) = self.guarded(target) else {
            return;
        };

        let message = type_conversion_message(
            &target.name,
            &self.types.package_name(target),
            &fact.constructor,
        );
        self.report(RULE_TYPE_CONVERSION, severity, call.pos, message);
    }

    fn check_field_assignment(&mut self, lhs: &Expr) {
        let Some(severity) = self.rules.severity(RULE_FIELD_ASSIGNMENT) else {
            return;
        };
        let ExprKind::Selector {
            field,
            selection: Some(selection),
            ..
        } = &lhs.kind
        else {
            return;
        };
        if selection.kind != SelectionKind::Field {
            return;
        }

        let Some(chain) = resolve_field_owner(self.types, &selection.recv, &selection.index) else {
            return;
        };
        let Some(owner) = chain.owner() else {
            return;
        };
        let Some(fact) = self.guarded(owner) else {
            return;
        };

        if chain.is_promoted() {
            tracing::trace!("{} reached through {:?}", field, chain.links);
        }

        let message = field_assignment_message(&owner.name, field, &fact.constructor);
        self.report(RULE_FIELD_ASSIGNMENT, severity, lhs.pos, message);
    }
}

impl<'a> Visit<'a> for ViolationScanner<'a> {
    fn visit_source_file(&mut self, file: &'a SourceFile) {
        self.file = Some(file.path.as_path());
        visit::visit_source_file(self, file);
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if let Stmt::Assign { lhs, .. } = stmt {
            for target in lhs {
                self.check_field_assignment(target);
            }
        }
        visit::visit_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::CompositeLit { .. } => self.check_literal(expr),
            ExprKind::Call { callee, .. } => self.check_conversion(expr, callee),
            _ => {}
        }
        visit::visit_expr(self, expr);
    }
}
