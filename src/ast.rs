//! Syntax tree produced by the [`Parser`](crate::parser::Parser) and consumed
//! by the resolver and the interpreter.
//!
//! Nodes are immutable after parsing.  Expressions that the resolver binds to a
//! scope (`Variable`, `Assign`, `This`, `Super`) carry an [`ExprId`]: the
//! identity the resolver's side table is keyed by.  Two syntactically equal
//! occurrences still get distinct ids.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::token::Token;

/// Identity of a resolvable expression node.
///
/// Ids are allocated from a process-wide counter and never reused, so tables
/// built for earlier inputs of an interactive session stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// Index part of `object[...]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Index {
    /// `a[i]`
    Single(Box<Expr>),

    /// `a[lo:hi]`; either bound may be omitted.
    Slice {
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
    },
}

/// Parameters and body shared by named functions, methods and lambdas.
///
/// Held behind an `Rc` so every closure created from the same declaration
/// points at one body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// Function name; for a lambda this is its `fun` keyword.
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression: `!isReady` or `-42`
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// `name = value` or a compound form such as `name += value`;
    /// `operator` is the `=`/`+=`/... token.
    Assign {
        id: ExprId,
        name: Token,
        operator: Token,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `object.name = value` (or compound).
    Set {
        object: Box<Expr>,
        name: Token,
        operator: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous function: `fun (a, b) { ... }`
    Lambda(Rc<FunctionDecl>),

    /// `[a, b, c]`
    Array { bracket: Token, elements: Vec<Expr> },

    /// `{k: v, ...}`
    Map {
        brace: Token,
        entries: Vec<(Expr, Expr)>,
    },

    /// `object[index]` or `object[lo:hi]`
    IndexGet {
        object: Box<Expr>,
        bracket: Token,
        index: Index,
    },

    /// `object[index] = value` (or compound).
    IndexSet {
        object: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
        operator: Token,
        value: Box<Expr>,
    },
}

impl Expr {
    /// Best source line for diagnostics about this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary { operator, .. }
            | Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. } => operator.line,
            Expr::Variable { name, .. } | Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } | Expr::Set { name, .. } => name.line,
            Expr::This { keyword, .. } | Expr::Super { keyword, .. } => keyword.line,
            Expr::Lambda(decl) => decl.name.line,
            Expr::Array { bracket, .. }
            | Expr::IndexGet { bracket, .. }
            | Expr::IndexSet { bracket, .. } => bracket.line,
            Expr::Map { brace, .. } => brace.line,
        }
    }
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    Break { keyword: Token },

    /// `return` statement inside a function body.
    Return {
        keyword: Token,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<FunctionDecl>),

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
        statics: Vec<Rc<FunctionDecl>>,
    },
}
