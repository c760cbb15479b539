//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, Binding>` tracking each
//!    local's declare → define → read progress).
//! 2. Report static errors (redeclaration, forward‑read in initializer,
//!    returning a value from `init`, misplaced `super`, static `init`,
//!    self‑inheritance) and the non‑fatal unused‑local warning.
//! 3. Record, for *each* variable occurrence, whether it is a local (and at
//!    what depth) or a global, so the interpreter never falls back to dynamic
//!    lookup that would see a later shadowing local.
//!
//! Every diagnostic of the input is collected before returning; the
//! interpreter only runs a program the resolver accepted.

use crate::ast::{Expr, ExprId, FunctionDecl, Index, Stmt};
use crate::error::{LoxError, ResolveError, ResolveErrorKind, Result};
use crate::token::Token;
use log::{debug, info, warn};
use std::collections::HashMap;

/// What kind of function body we are inside.  Used to validate `return`
/// in initializers and `super` in static methods.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Lambda,
    Method,
    Static,
    Initializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Lifecycle of a local within its scope.  Only moves forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Status {
    Declared,
    Defined,
    Read,
    /// `this` / `super`: bound by the runtime, never reported as unused.
    Implicit,
}

#[derive(Debug)]
struct Binding {
    token: Token,
    status: Status,
}

/// Output of a successful pass.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Binding distance of every local reference.  Absent ids are globals.
    pub locals: HashMap<ExprId, usize>,

    /// Non‑fatal diagnostics (unused locals), in source order per scope.
    pub warnings: Vec<ResolveError>,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) in its [`Resolution`].
pub struct Resolver {
    scopes: Vec<HashMap<String, Binding>>,
    resolution: Resolution,
    errors: Vec<ResolveError>,
    current_function: FunctionType,
    current_class: ClassType,
    /// Set inside a static method body, including nested functions and
    /// lambdas; a class declared there starts clean.
    in_static: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            resolution: Resolution::default(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            in_static: false,
        }
    }

    /// Walk all top‑level statements.  Any error makes the whole pass fail
    /// with a [`LoxError::Static`] listing every error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Resolution> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if !self.errors.is_empty() {
            info!("Resolve pass failed with {} error(s)", self.errors.len());
            return Err(LoxError::Static(
                self.errors.into_iter().map(LoxError::Resolve).collect(),
            ));
        }

        for warning in &self.resolution.warnings {
            warn!("{}", warning);
        }

        Ok(self.resolution)
    }

    fn error(&mut self, kind: ResolveErrorKind, token: &Token) {
        self.errors
            .push(ResolveError::new(kind, token.line, token.lexeme.as_str()));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for s in statements {
            self.resolve_stmt(s);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
                statics,
            } => {
                debug!("Resolving class '{}'", name.lexeme);
                self.resolve_class(name, superclass.as_ref(), methods, statics);
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible *inside* its own body (recursion)
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Break { .. } => {}

            Stmt::Return { keyword, value } => {
                if let Some(expr) = value {
                    // `return;` is an early exit and stays legal in `init`.
                    if self.current_function == FunctionType::Initializer {
                        self.error(ResolveErrorKind::ReturnFromInit, keyword);
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
        statics: &[std::rc::Rc<FunctionDecl>],
    ) {
        let enclosing_class = self.current_class;
        let enclosing_static = std::mem::replace(&mut self.in_static, false);
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(sup) = superclass {
            if let Expr::Variable { name: super_name, .. } = sup {
                if super_name.lexeme == name.lexeme {
                    self.error(ResolveErrorKind::InheritsSelf, super_name);
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(sup);

            self.begin_scope();
            self.implicit("super", name.line);
        }

        self.begin_scope();
        self.implicit("this", name.line);

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        for method in statics {
            if method.name.lexeme == "init" {
                self.error(ResolveErrorKind::InitIsStatic, &method.name);
            }
            self.resolve_function(method, FunctionType::Static);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
        self.in_static = enclosing_static;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    .is_some_and(|b| b.status == Status::Declared);

                if in_own_initializer {
                    self.error(ResolveErrorKind::ReadLocalInOwnInitializer, name);
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign {
                id,
                name,
                operator,
                value,
            } => {
                // RHS first, then bind LHS.  Plain `=` is not a read; `+=`
                // and friends read the old value.
                self.resolve_expr(value);
                let is_read = operator.token_type.compound_base().is_some();
                self.resolve_local(*id, name, is_read);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => self.resolve_local(*id, keyword, true),

            Expr::Super { id, keyword, .. } => {
                if self.current_class != ClassType::Subclass {
                    self.error(ResolveErrorKind::SuperWithNoSuperClass, keyword);
                } else if self.in_static {
                    self.error(ResolveErrorKind::SuperInStatic, keyword);
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Lambda(decl) => self.resolve_function(decl, FunctionType::Lambda),

            Expr::Array { elements, .. } => {
                for element in elements {
                    self.resolve_expr(element);
                }
            }

            Expr::Map { entries, .. } => {
                for (key, value) in entries {
                    self.resolve_expr(key);
                    self.resolve_expr(value);
                }
            }

            Expr::IndexGet { object, index, .. } => {
                self.resolve_expr(object);
                match index {
                    Index::Single(i) => self.resolve_expr(i),
                    Index::Slice { start, stop } => {
                        for bound in [start, stop].into_iter().flatten() {
                            self.resolve_expr(bound);
                        }
                    }
                }
            }

            Expr::IndexSet {
                object,
                index,
                value,
                ..
            } => {
                self.resolve_expr(object);
                self.resolve_expr(index);
                self.resolve_expr(value);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters and body share one fresh scope.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        let enclosing_static = self.in_static;
        self.current_function = kind;
        self.in_static |= kind == FunctionType::Static;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
        self.in_static = enclosing_static;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope, reporting locals that were never read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unread: Vec<ResolveError> = scope
            .into_values()
            .filter(|b| b.status == Status::Defined)
            .map(|b| {
                ResolveError::new(
                    ResolveErrorKind::LocalNotRead,
                    b.token.line,
                    b.token.lexeme,
                )
            })
            .collect();

        unread.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.lexeme.cmp(&b.lexeme)));

        self.resolution.warnings.extend(unread);
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(ResolveErrorKind::AlreadyInScope, name);
            return;
        }

        scope.insert(
            name.lexeme.clone(),
            Binding {
                token: name.clone(),
                status: Status::Declared,
            },
        );
    }

    fn define(&mut self, name: &Token) {
        if let Some(binding) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            if binding.status == Status::Declared {
                binding.status = Status::Defined;
            }
        }
    }

    fn implicit(&mut self, name: &str, line: usize) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Binding {
                    token: Token::synthetic(name, line),
                    status: Status::Implicit,
                },
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as either a local at depth `d`, or a global if
    /// not found in *any* scope.
    fn resolve_local(&mut self, id: ExprId, name: &Token, is_read: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(binding) = scope.get_mut(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                if is_read && binding.status == Status::Defined {
                    binding.status = Status::Read;
                }

                self.resolution.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
