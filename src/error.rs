//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the types defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error. `location` is `" at 'lexeme'"` or `" at end"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis failure found by the resolver.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Every static error of one input, reported together. Nothing runs when
    /// this is returned.
    #[error("{}", join_lines(.0))]
    Static(Vec<LoxError>),

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, location: String, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse {
            message,
            line,
            location,
        }
    }

    /// Process exit status the CLI reports for this error: 65 for anything
    /// caught before execution, 70 for runtime failures, 74 for I/O.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Runtime(_) => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
            _ => 65,
        }
    }
}

fn join_lines(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contextual rules enforced by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveErrorKind {
    #[error("Already a variable with this name in this scope")]
    AlreadyInScope,

    #[error("Can't read local variable in its own initializer")]
    ReadLocalInOwnInitializer,

    #[error("Can't return a value from an initializer")]
    ReturnFromInit,

    #[error("Can't use 'super' in a class with no superclass")]
    SuperWithNoSuperClass,

    #[error("Can't use 'super' in a static method")]
    SuperInStatic,

    #[error("Can't use 'init' as a static function")]
    InitIsStatic,

    #[error("A class can't inherit from itself")]
    InheritsSelf,

    /// Informational only; never stops execution.
    #[error("Local variable is not used")]
    LocalNotRead,
}

/// A resolver diagnostic anchored at the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] {} at '{lexeme}': {kind}", severity(.kind))]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub line: usize,
    pub lexeme: String,
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, line: usize, lexeme: impl Into<String>) -> Self {
        let lexeme = lexeme.into();

        info!(
            "Creating Resolve diagnostic: line={}, lexeme={}, kind={:?}",
            line, lexeme, kind
        );

        Self { kind, line, lexeme }
    }

    /// Warnings are reported but do not prevent the program from running.
    pub fn is_warning(&self) -> bool {
        self.kind == ResolveErrorKind::LocalNotRead
    }
}

fn severity(kind: &ResolveErrorKind) -> &'static str {
    if *kind == ResolveErrorKind::LocalNotRead {
        "Warning"
    } else {
        "Error"
    }
}

/// A user-visible failure raised while evaluating the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Runtime error: {message}")]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(line: usize, msg: S) -> Self {
        Self {
            message: msg.into(),
            line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
