//! Syntax tree traversal
//!
//! Each `visit_*` method defaults to the matching free `visit_*` function,
//! which walks the node's children in source order. Implementors override
//! the methods for the nodes they care about and call the free function to
//! keep descending.

use crate::model::syntax::{
    Block, CaseClause, CommClause, Element, Expr, ExprKind, FuncDecl, Module, SourceFile, Stmt,
};

pub trait Visit<'ast> {
    fn visit_module(&mut self, module: &'ast Module) {
        visit_module(self, module);
    }

    fn visit_source_file(&mut self, file: &'ast SourceFile) {
        visit_source_file(self, file);
    }

    fn visit_func_decl(&mut self, func: &'ast FuncDecl) {
        visit_func_decl(self, func);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        visit_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        visit_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        visit_expr(self, expr);
    }

    fn visit_element(&mut self, element: &'ast Element) {
        visit_element(self, element);
    }
}

pub fn visit_module<'ast, V>(v: &mut V, module: &'ast Module)
where
    V: Visit<'ast> + ?Sized,
{
    for file in &module.files {
        v.visit_source_file(file);
    }
}

pub fn visit_source_file<'ast, V>(v: &mut V, file: &'ast SourceFile)
where
    V: Visit<'ast> + ?Sized,
{
    for stmt in &file.globals {
        v.visit_stmt(stmt);
    }
    for func in &file.funcs {
        v.visit_func_decl(func);
    }
}

pub fn visit_func_decl<'ast, V>(v: &mut V, func: &'ast FuncDecl)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(body) = &func.body {
        v.visit_block(body);
    }
}

pub fn visit_block<'ast, V>(v: &mut V, block: &'ast Block)
where
    V: Visit<'ast> + ?Sized,
{
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn visit_stmt<'ast, V>(v: &mut V, stmt: &'ast Stmt)
where
    V: Visit<'ast> + ?Sized,
{
    match stmt {
        Stmt::Expr { expr } => v.visit_expr(expr),
        Stmt::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                v.visit_expr(expr);
            }
        }
        Stmt::IncDec { target, .. } => v.visit_expr(target),
        Stmt::Var { values, .. } => {
            for expr in values {
                v.visit_expr(expr);
            }
        }
        Stmt::Return { results, .. } => {
            for expr in results {
                v.visit_expr(expr);
            }
        }
        Stmt::If {
            init,
            cond,
            then,
            otherwise,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(otherwise) = otherwise {
                v.visit_stmt(otherwise);
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        Stmt::Range {
            key,
            value,
            expr,
            body,
            ..
        } => {
            for e in key.iter().chain(value.iter()) {
                v.visit_expr(e);
            }
            v.visit_expr(expr);
            v.visit_block(body);
        }
        Stmt::Switch {
            init, tag, cases, ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(tag) = tag {
                v.visit_expr(tag);
            }
            for case in cases {
                visit_case_clause(v, case);
            }
        }
        Stmt::TypeSwitch {
            init, assign, cases, ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_stmt(assign);
            for case in cases {
                visit_case_clause(v, case);
            }
        }
        Stmt::Select { cases, .. } => {
            for case in cases {
                visit_comm_clause(v, case);
            }
        }
        Stmt::Send { chan, value, .. } => {
            v.visit_expr(chan);
            v.visit_expr(value);
        }
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => v.visit_expr(call),
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::Branch { .. } => {}
        Stmt::Block { block } => v.visit_block(block),
    }
}

fn visit_comm_clause<'ast, V>(v: &mut V, case: &'ast CommClause)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(comm) = &case.comm {
        v.visit_stmt(comm);
    }
    for stmt in &case.body {
        v.visit_stmt(stmt);
    }
}

fn visit_case_clause<'ast, V>(v: &mut V, case: &'ast CaseClause)
where
    V: Visit<'ast> + ?Sized,
{
    for expr in &case.exprs {
        v.visit_expr(expr);
    }
    for stmt in &case.body {
        v.visit_stmt(stmt);
    }
}

pub fn visit_expr<'ast, V>(v: &mut V, expr: &'ast Expr)
where
    V: Visit<'ast> + ?Sized,
{
    match &expr.kind {
        ExprKind::Ident { .. } | ExprKind::BasicLit { .. } => {}
        ExprKind::CompositeLit { type_expr, elems } => {
            if let Some(type_expr) = type_expr {
                v.visit_expr(type_expr);
            }
            for element in elems {
                v.visit_element(element);
            }
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Call { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Selector { base, .. } => v.visit_expr(base),
        ExprKind::Index { base, index } => {
            v.visit_expr(base);
            v.visit_expr(index);
        }
        ExprKind::Paren { inner } => v.visit_expr(inner),
        ExprKind::TypeAssert { base, .. } => v.visit_expr(base),
        ExprKind::FuncLit { body, .. } => v.visit_block(body),
    }
}

pub fn visit_element<'ast, V>(v: &mut V, element: &'ast Element)
where
    V: Visit<'ast> + ?Sized,
{
    match element {
        Element::Field { value, .. } | Element::Value { value } => v.visit_expr(value),
        Element::KeyValue { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
    }
}
