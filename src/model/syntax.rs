//! Resolved syntax tree of one module
//!
//! Every expression carries the static type the front-end computed for it, and
//! field selections carry the index path the type checker used to reach the
//! field. Nothing here is re-resolved by the analyzer.

use crate::model::types::{Ty, TypeDecl};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source position, 1-based
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A compilation unit: one package with all of its files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Import path, the ownership key of every type declared here
    pub path: String,
    /// Declared package name; defaults to the last path segment
    #[serde(default)]
    pub name: String,
    /// Paths of imported modules
    #[serde(default)]
    pub imports: Vec<String>,
    /// Types declared by this module
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// Source files in declaration order
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

impl Module {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_import(mut self, path: impl Into<String>) -> Self {
        self.imports.push(path.into());
        self
    }

    /// Declare a type, stamping it with this module's package name
    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        let decl = if decl.package.is_empty() && !self.name.is_empty() {
            decl.with_package(self.name.clone())
        } else {
            decl
        };
        self.types.push(decl);
        self
    }

    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.files.push(file);
        self
    }

    /// Top-level functions in declaration order, paired with their file
    pub fn functions(&self) -> impl Iterator<Item = (&SourceFile, &FuncDecl)> {
        self.files
            .iter()
            .flat_map(|file| file.funcs.iter().map(move |func| (file, func)))
    }
}

/// One source file of a module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Package-level variable declarations
    #[serde(default)]
    pub globals: Vec<Stmt>,
    #[serde(default)]
    pub funcs: Vec<FuncDecl>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_global(mut self, stmt: Stmt) -> Self {
        self.globals.push(stmt);
        self
    }

    pub fn with_func(mut self, func: FuncDecl) -> Self {
        self.funcs.push(func);
        self
    }
}

/// A declared result of a function signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultVar {
    #[serde(default)]
    pub name: Option<String>,
    pub ty: Ty,
}

impl From<Ty> for ResultVar {
    fn from(ty: Ty) -> Self {
        Self { name: None, ty }
    }
}

/// A function or method declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    #[serde(default)]
    pub pos: Pos,
    /// Receiver type for methods
    #[serde(default)]
    pub receiver: Option<Ty>,
    /// Raw doc comment lines attached to the declaration
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub results: Vec<ResultVar>,
    /// Absent for external (body-less) declarations
    #[serde(default)]
    pub body: Option<Block>,
}

impl FuncDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Pos::new(line, column);
        self
    }

    pub fn with_doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    pub fn with_receiver(mut self, ty: Ty) -> Self {
        self.receiver = Some(ty);
        self
    }

    pub fn returning(mut self, ty: Ty) -> Self {
        self.results.push(ResultVar::from(ty));
        self
    }

    pub fn with_body(mut self, stmts: Vec<Stmt>) -> Self {
        self.body = Some(Block { stmts });
        self
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// A braced statement list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// A `case` arm of a switch statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    /// Case expressions; empty for `default`
    #[serde(default)]
    pub exprs: Vec<Expr>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

/// A `case` arm of a select statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommClause {
    /// Send or receive statement; `None` for `default`
    #[serde(default)]
    pub comm: Option<Box<Stmt>>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    /// `lhs op rhs` where op is `=`, `:=` or a compound operator like `+=`
    Assign {
        #[serde(default)]
        pos: Pos,
        #[serde(default = "default_assign_op")]
        op: String,
        lhs: Vec<Expr>,
        rhs: Vec<Expr>,
    },
    IncDec {
        #[serde(default)]
        pos: Pos,
        target: Expr,
        #[serde(default)]
        decrement: bool,
    },
    Var {
        #[serde(default)]
        pos: Pos,
        names: Vec<String>,
        #[serde(default)]
        ty: Option<Ty>,
        #[serde(default)]
        values: Vec<Expr>,
    },
    Return {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        results: Vec<Expr>,
    },
    If {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        #[serde(default)]
        otherwise: Option<Box<Stmt>>,
    },
    For {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        key: Option<Expr>,
        #[serde(default)]
        value: Option<Expr>,
        expr: Expr,
        body: Block,
    },
    Switch {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        tag: Option<Expr>,
        #[serde(default)]
        cases: Vec<CaseClause>,
    },
    /// `switch x := v.(type)`; `assign` is the guard statement
    TypeSwitch {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        init: Option<Box<Stmt>>,
        assign: Box<Stmt>,
        #[serde(default)]
        cases: Vec<CaseClause>,
    },
    Select {
        #[serde(default)]
        pos: Pos,
        #[serde(default)]
        cases: Vec<CommClause>,
    },
    /// `ch <- value`
    Send {
        #[serde(default)]
        pos: Pos,
        chan: Expr,
        value: Expr,
    },
    Go {
        #[serde(default)]
        pos: Pos,
        call: Expr,
    },
    Defer {
        #[serde(default)]
        pos: Pos,
        call: Expr,
    },
    Labeled {
        #[serde(default)]
        pos: Pos,
        label: String,
        // "stmt" is the variant tag
        #[serde(rename = "body")]
        stmt: Box<Stmt>,
    },
    /// `break`, `continue`, `goto` or `fallthrough`
    Branch {
        #[serde(default)]
        pos: Pos,
        keyword: String,
        #[serde(default)]
        label: Option<String>,
    },
    Block {
        block: Block,
    },
}

fn default_assign_op() -> String {
    "=".to_string()
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr { expr }
    }

    /// Plain `lhs = rhs` assignment positioned at the left-hand side
    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Self::Assign {
            pos: lhs.pos,
            op: default_assign_op(),
            lhs: vec![lhs],
            rhs: vec![rhs],
        }
    }

    /// `name := value`
    pub fn define(name: impl Into<String>, value: Expr) -> Self {
        let name = name.into();
        let ident = Expr::ident(name).at(value.pos.line, value.pos.column);
        Self::Assign {
            pos: value.pos,
            op: ":=".to_string(),
            lhs: vec![ident],
            rhs: vec![value],
        }
    }

    pub fn ret(results: Vec<Expr>) -> Self {
        let pos = results.first().map(|e| e.pos).unwrap_or_default();
        Self::Return { pos, results }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// `&x`
    Addr,
    /// `*x`
    Deref,
    Neg,
    Not,
    Xor,
    /// `<-ch`
    Recv,
}

/// How a selector expression was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Field,
    Method,
    MethodExpr,
}

/// Resolution of `x.f`: receiver type plus the index path to the selected member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Static type of `x`
    pub recv: Ty,
    /// Field positions traversed from the receiver; length > 1 means promotion
    pub index: Vec<usize>,
}

/// An element of a composite literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "elem", rename_all = "snake_case")]
pub enum Element {
    /// `Name: value` in a record literal
    Field {
        name: String,
        value: Expr,
    },
    /// `key: value` in a map, slice or array literal
    KeyValue {
        key: Expr,
        value: Expr,
    },
    /// Positional element
    Value {
        value: Expr,
    },
}

impl Element {
    pub fn field(name: impl Into<String>, value: Expr) -> Self {
        Self::Field {
            name: name.into(),
            value,
        }
    }

    pub fn value(value: Expr) -> Self {
        Self::Value { value }
    }

    /// Field name when the element is keyed by one
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum ExprKind {
    Ident {
        name: String,
    },
    BasicLit {
        value: String,
    },
    CompositeLit {
        /// Explicit type expression; absent when elided inside an outer literal
        #[serde(default)]
        type_expr: Option<Box<Expr>>,
        #[serde(default)]
        elems: Vec<Element>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// `base.field`; `selection` is absent for qualified identifiers like `pkg.Name`
    Selector {
        base: Box<Expr>,
        field: String,
        #[serde(default)]
        selection: Option<Selection>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Paren {
        inner: Box<Expr>,
    },
    TypeAssert {
        base: Box<Expr>,
        #[serde(default)]
        target: Option<Ty>,
    },
    FuncLit {
        #[serde(default)]
        results: Vec<ResultVar>,
        body: Block,
    },
}

/// A typed expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default)]
    pub pos: Pos,
    /// Static type computed by the front-end
    #[serde(default)]
    pub ty: Option<Ty>,
    /// Whether the expression denotes a type rather than a value
    #[serde(default)]
    pub is_type: bool,
    #[serde(flatten)]
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            pos: Pos::default(),
            ty: None,
            is_type: false,
            kind,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.pos = Pos::new(line, column);
        self
    }

    pub fn typed(mut self, ty: Ty) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Mark the expression as denoting the type `ty`
    pub fn denoting(mut self, ty: Ty) -> Self {
        self.ty = Some(ty);
        self.is_type = true;
        self
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident { name: name.into() })
    }

    pub fn lit(value: impl Into<String>) -> Self {
        Self::new(ExprKind::BasicLit {
            value: value.into(),
        })
    }

    /// Composite literal of type `ty` with the given elements
    pub fn composite(ty: Ty, elems: Vec<Element>) -> Self {
        Self::new(ExprKind::CompositeLit {
            type_expr: None,
            elems,
        })
        .typed(ty)
    }

    /// `&operand`, positioned at the operand and typed as a pointer to it
    pub fn addr_of(operand: Expr) -> Self {
        let pos = operand.pos;
        let ty = operand.ty.clone().map(Ty::pointer);
        Self {
            pos,
            ty,
            is_type: false,
            kind: ExprKind::Unary {
                op: UnaryOp::Addr,
                operand: Box::new(operand),
            },
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        let pos = callee.pos;
        Self::new(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
        .at(pos.line, pos.column)
    }

    /// Unresolved selector, used for qualified identifiers such as `pkg.Name`
    pub fn selector(base: Expr, field: impl Into<String>) -> Self {
        let pos = base.pos;
        Self::new(ExprKind::Selector {
            base: Box::new(base),
            field: field.into(),
            selection: None,
        })
        .at(pos.line, pos.column)
    }

    /// Field selection `base.field` reached through `index`
    pub fn field_access(base: Expr, field: impl Into<String>, index: Vec<usize>) -> Self {
        let pos = base.pos;
        let recv = base.ty.clone().unwrap_or(Ty::Other {
            repr: "invalid".to_string(),
        });
        Self::new(ExprKind::Selector {
            base: Box::new(base),
            field: field.into(),
            selection: Some(Selection {
                kind: SelectionKind::Field,
                recv,
                index,
            }),
        })
        .at(pos.line, pos.column)
    }

    pub fn func_lit(body: Vec<Stmt>) -> Self {
        Self::new(ExprKind::FuncLit {
            results: Vec::new(),
            body: Block { stmts: body },
        })
    }

    /// Strip one leading `&`
    pub fn without_addr(&self) -> &Expr {
        match &self.kind {
            ExprKind::Unary {
                op: UnaryOp::Addr,
                operand,
            } => operand,
            _ => self,
        }
    }
}
