//! Callable values: user functions (closures) and native functions.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{Env, Environment};
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Where a function was declared; decides `return` and display behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Lambda,
    Method,
    Static,
    /// A class's `init` method: every call yields its `this`.
    Initializer,
}

/// Number of arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => n == count,
            Arity::Variadic => true,
        }
    }
}

/// A function declaration paired with the scope it closes over.
pub struct LoxFunction {
    pub decl: Rc<FunctionDecl>,
    pub closure: Env,
    pub kind: FunctionKind,
}

impl LoxFunction {
    pub fn new(decl: Rc<FunctionDecl>, closure: Env, kind: FunctionKind) -> Self {
        Self {
            decl,
            closure,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// A copy of this method whose closure is a fresh scope holding `this`.
    ///
    /// The original closure stays the parent, so every bound copy still
    /// shares the defining scope's variables.
    pub fn bind(&self, this: Value) -> LoxFunction {
        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));
        scope.define("this", this);

        LoxFunction {
            decl: Rc::clone(&self.decl),
            closure: scope.shared(),
            kind: self.kind,
        }
    }

    /// Runs the body in a new scope below the closure.  Arity has already
    /// been checked by the caller.  Only `Return` is consumed here.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> IResult<Value> {
        debug!("Calling function '{}'", self.name());

        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, arg) in self.decl.params.iter().zip(arguments) {
            scope.define(&param.lexeme, arg);
        }

        let value = match interpreter.execute_block(&self.decl.body, scope.shared()) {
            Ok(()) => Value::Nil,
            Err(InterpretError::Return(value)) => value,
            Err(e) => return Err(e),
        };

        if self.kind == FunctionKind::Initializer {
            let this = Token::synthetic("this", self.decl.name.line);
            return Ok(Environment::get_at(&self.closure, 0, &this)?);
        }

        Ok(value)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Signature of a built‑in.  The error string becomes a runtime error at the
/// call site's line.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, String>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
