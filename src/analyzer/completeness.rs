//! Field coverage of literals returned by naming-convention constructors

use crate::analyzer::constructor::constructor_result;
use crate::domain::violations::{Severity, Violation, RULE_CONSTRUCTOR_COMPLETENESS};
use crate::model::visit::{self, Visit};
use crate::model::{Expr, ExprKind, FuncDecl, Module, Stmt, TypeId, TypeTable};
use crate::patterns::NamingConvention;

pub fn missing_fields_message(constructor: &str, missing: &[&str]) -> String {
    format!(
        "struct literal in constructor {constructor} is missing fields: {}",
        missing.join(", ")
    )
}

/// Checks that a constructor's returned literal keys every declared field
pub struct CompletenessChecker<'a> {
    naming: &'a NamingConvention,
    severity: Severity,
}

impl<'a> CompletenessChecker<'a> {
    pub fn new(naming: &'a NamingConvention, severity: Severity) -> Self {
        Self { naming, severity }
    }

    pub fn check(&self, module: &Module, types: &TypeTable) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (file, func) in module.functions() {
            let Some(target) = self.constructed_aggregate(func, module) else {
                continue;
            };
            let Some(fields) = types.aggregate_fields(target) else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }
            let Some(body) = &func.body else {
                continue;
            };

            let mut returns = ReturnCollector::default();
            returns.visit_block(body);

            for result in returns.results {
                let lit = result.without_addr();
                let ExprKind::CompositeLit { elems, .. } = &lit.kind else {
                    continue;
                };
                if lit.ty.as_ref().and_then(|ty| ty.named_elem()) != Some(target) {
                    continue;
                }

                let keyed: Vec<&str> = elems.iter().filter_map(|e| e.field_name()).collect();
                let missing: Vec<&str> = fields
                    .iter()
                    .map(|field| field.name.as_str())
                    .filter(|name| !keyed.contains(name))
                    .collect();

                if missing.is_empty() {
                    continue;
                }

                tracing::trace!("{} leaves {} unset", func.name, missing.join(", "));
                violations.push(
                    Violation::new(
                        RULE_CONSTRUCTOR_COMPLETENESS,
                        self.severity,
                        file.path.clone(),
                        missing_fields_message(&func.name, &missing),
                    )
                    .with_position(lit.pos.line, lit.pos.column)
                    .in_module(module.path.clone()),
                );
            }
        }

        violations
    }

    /// The local type a `{prefix}{Type}` function announces and returns
    fn constructed_aggregate<'f>(&self, func: &'f FuncDecl, module: &Module) -> Option<&'f TypeId> {
        if func.is_method() {
            return None;
        }
        let target = constructor_result(func)?.named_elem()?;
        if target.module != module.path || !self.naming.names_type(&func.name, &target.name) {
            return None;
        }
        Some(target)
    }
}

/// Every returned expression of a body, closures included
#[derive(Default)]
struct ReturnCollector<'ast> {
    results: Vec<&'ast Expr>,
}

impl<'ast> Visit<'ast> for ReturnCollector<'ast> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if let Stmt::Return { results, .. } = stmt {
            self.results.extend(results);
        }
        visit::visit_stmt(self, stmt);
    }
}
