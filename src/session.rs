//! One interpreter plus the pipeline feeding it.
//!
//! `run` continues the session: globals defined by earlier inputs stay
//! visible.  `reset` starts over with only the natives defined.

use std::io::Write;

use log::info;

use crate::ast::{Expr, Stmt};
use crate::error::{LoxError, ResolveError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;
use crate::value::Value;

type OutputFactory = Box<dyn Fn() -> Box<dyn Write>>;

pub struct Session {
    interpreter: Interpreter,
    output: OutputFactory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_output(|| Box::new(std::io::stdout()))
    }

    /// A session whose interpreters write to sinks made by `output`; it is
    /// called again on every [`Session::reset`].
    pub fn with_output<F>(output: F) -> Self
    where
        F: Fn() -> Box<dyn Write> + 'static,
    {
        Self {
            interpreter: Interpreter::with_output(output()),
            output: Box::new(output),
        }
    }

    /// Scan, parse, resolve and execute `source`.  Returns the resolver's
    /// warnings when the program ran.
    pub fn run(&mut self, source: &[u8]) -> Result<Vec<ResolveError>> {
        let statements = parse_program(source)?;

        let resolution = Resolver::new().resolve(&statements)?;
        self.interpreter.note_locals(resolution.locals);

        self.interpreter.interpret(&statements)?;

        Ok(resolution.warnings)
    }

    /// Evaluate a single expression against the session's globals.
    pub fn evaluate(&mut self, source: &[u8]) -> Result<Value> {
        let expr = parse_expression(source)?;

        let resolution = Resolver::new().resolve(&[Stmt::Expression(expr.clone())])?;
        self.interpreter.note_locals(resolution.locals);

        self.interpreter.evaluate_expression(&expr)
    }

    /// Drop every global binding and resolution.
    pub fn reset(&mut self) {
        info!("Resetting session");
        self.interpreter = Interpreter::with_output((self.output)());
    }
}

/// Scans all of `source`.  Every lexical error is reported together.
pub fn tokenize(source: &[u8]) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(LoxError::Static(errors))
    }
}

pub fn parse_program(source: &[u8]) -> Result<Vec<Stmt>> {
    Parser::new(tokenize(source)?).parse()
}

pub fn parse_expression(source: &[u8]) -> Result<Expr> {
    Parser::new(tokenize(source)?).parse_expression()
}
