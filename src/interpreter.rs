//! Tree‑walking evaluator.
//!
//! Runs statements against a chain of [`Environment`]s.  Locals are read
//! and written at the distance the resolver computed; references with no
//! recorded distance go straight to the globals.  `break` and `return`
//! travel up the call stack as [`InterpretError`] sentinels and are consumed
//! by the nearest loop or call frame.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprId, FunctionDecl, Index, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result, RuntimeError};
use crate::function::{Arity, FunctionKind, LoxFunction};
use crate::natives;
use crate::token::{Token, TokenType};
use crate::value::{HashKey, LoxMap, Value};

/// Non‑local exits while evaluating.  Only `Runtime` ever leaves
/// [`Interpreter::interpret`].
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("break outside of a loop")]
    Break,

    #[error("return outside of a function: {0}")]
    Return(Value),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

fn runtime<T>(line: usize, message: impl Into<String>) -> IResult<T> {
    let err = RuntimeError::new(line, message);
    debug!("Error: {}", err);
    Err(err.into())
}

pub struct Interpreter {
    globals: Env,
    environment: Env,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with natives defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Same as [`Interpreter::new`] but `print` and `printf` write to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        natives::install(&mut globals);
        let globals = globals.shared();

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Records binding distances computed by the resolver.
    pub fn note_locals(&mut self, locals: HashMap<ExprId, usize>) {
        debug!("Noting {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Writes one line to the output sink.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops the run; the current scope is the global one afterwards.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(InterpretError::Runtime(e)) => {
                    self.environment = Rc::clone(&self.globals);
                    return Err(LoxError::Runtime(e));
                }
                Err(sentinel) => debug!("Discarding top-level {}", sentinel),
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Evaluates a stand‑alone expression (the `evaluate` command).
    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),
            Err(InterpretError::Runtime(e)) => {
                self.environment = Rc::clone(&self.globals);
                Err(LoxError::Runtime(e))
            }
            Err(_) => Ok(Value::Nil),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                self.write_line(&value.to_string())
                    .or_else(|e| runtime(expr.line(), e.to_string()))
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}'", name.lexeme);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, scope.shared())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body) {
                        Ok(()) => {}
                        Err(InterpretError::Break) => break,
                        Err(e) => return Err(e),
                    }
                }
                Ok(())
            }

            Stmt::Break { .. } => Err(InterpretError::Break),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(e) => self.evaluate(e)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Err(InterpretError::Return(value))
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = self.closure(decl, FunctionKind::Function);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, function);
                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                statics,
            } => self.execute_class(name, superclass.as_ref(), methods, statics),
        }
    }

    /// Runs `statements` in `scope`, restoring the previous scope on every
    /// exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: Env) -> IResult<()> {
        let previous = std::mem::replace(&mut self.environment, scope);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;
        result
    }

    fn closure(&self, decl: &Rc<FunctionDecl>, kind: FunctionKind) -> Value {
        Value::Function(Rc::new(LoxFunction::new(
            Rc::clone(decl),
            Rc::clone(&self.environment),
            kind,
        )))
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        statics: &[Rc<FunctionDecl>],
    ) -> IResult<()> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => return runtime(expr.line(), "Superclass must be a class."),
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods close over a scope holding `super` when there is one.
        let defining = match &superclass {
            Some(sup) => {
                let mut scope = Environment::with_enclosing(Rc::clone(&self.environment));
                scope.define("super", Value::Class(Rc::clone(sup)));
                scope.shared()
            }
            None => Rc::clone(&self.environment),
        };

        let method_table = function_table(methods, &defining, |method| {
            if method == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            }
        });
        let static_table = function_table(statics, &defining, |_| FunctionKind::Static);

        let class = LoxClass::new(&name.lexeme, superclass, method_table, static_table);

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match (&operator.token_type, right) {
                    (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenType::MINUS, _) => runtime(operator.line, "Operand must be a number."),
                    (_, value) => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(apply_binary(&operator.token_type, operator.line, left, right)?)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let short_circuits = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };
                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign {
                id,
                name,
                operator,
                value,
            } => {
                let value = match operator.token_type.compound_base() {
                    Some(op) => {
                        let current = self.look_up_variable(*id, name)?;
                        let rhs = self.evaluate(value)?;
                        apply_binary(&op, operator.line, current, rhs)?
                    }
                    None => self.evaluate(value)?,
                };
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let args = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<IResult<Vec<_>>>()?;
                self.call_value(callee, paren, args)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(instance.get(name)?),
                Value::Class(class) => Ok(class.get_static(name)?),
                _ => runtime(name.line, "Only instances and classes have properties."),
            },

            Expr::Set {
                object,
                name,
                operator,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return runtime(name.line, "Only instances have fields.");
                };
                let value = match operator.token_type.compound_base() {
                    Some(op) => {
                        let current = instance.get(name)?;
                        let rhs = self.evaluate(value)?;
                        apply_binary(&op, operator.line, current, rhs)?
                    }
                    None => self.evaluate(value)?,
                };
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Lambda(decl) => Ok(self.closure(decl, FunctionKind::Lambda)),

            Expr::Array { elements, .. } => {
                let items = elements
                    .iter()
                    .map(|e| self.evaluate(e))
                    .collect::<IResult<Vec<_>>>()?;
                Ok(Value::array(items))
            }

            Expr::Map { brace, entries } => {
                let mut map = LoxMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = HashKey::from_value(&self.evaluate(key)?, brace.line)?;
                    let value = self.evaluate(value)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }

            Expr::IndexGet {
                object,
                bracket,
                index,
            } => {
                let target = self.evaluate(object)?;
                match index {
                    Index::Single(index) => {
                        let index = self.evaluate(index)?;
                        Ok(index_get(&target, &index, bracket.line)?)
                    }
                    Index::Slice { start, stop } => {
                        let start = self.evaluate_bound(start.as_deref())?;
                        let stop = self.evaluate_bound(stop.as_deref())?;
                        Ok(slice(&target, start, stop, bracket.line)?)
                    }
                }
            }

            Expr::IndexSet {
                object,
                bracket,
                index,
                operator,
                value,
            } => {
                let target = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                self.index_set(&target, &index, operator, value, bracket.line)
            }
        }
    }

    fn evaluate_bound(&mut self, bound: Option<&Expr>) -> IResult<Option<Value>> {
        bound.map(|expr| self.evaluate(expr)).transpose()
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        let value = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name)?,
            None => self.globals.borrow().get(name)?,
        };
        Ok(value)
    }

    fn assign_variable(&mut self, id: ExprId, name: &Token, value: Value) -> IResult<()> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::assign_at(&self.environment, distance, name, value)?,
            None => self.globals.borrow_mut().assign(name, value)?,
        }
        Ok(())
    }

    /// `super.method`: the superclass sits at the resolved distance and
    /// `this` one scope nearer.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let Some(&distance) = self.locals.get(&id) else {
            return runtime(keyword.line, "Undefined variable 'super'.");
        };

        let this = Token::synthetic("this", keyword.line);
        let Some(this_distance) = distance.checked_sub(1) else {
            return runtime(keyword.line, "Undefined variable 'this'.");
        };

        let superclass = Environment::get_at(&self.environment, distance, keyword)?;
        let object = Environment::get_at(&self.environment, this_distance, &this)?;

        let Value::Class(superclass) = superclass else {
            return runtime(keyword.line, "Superclass must be a class.");
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),
            None => runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            ),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────────

    /// Invokes a callable (native, user function or class).
    fn call_value(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> IResult<Value> {
        let arity = match &callee {
            Value::Function(function) => Arity::Fixed(function.arity()),
            Value::Native(native) => native.arity,
            Value::Class(class) => Arity::Fixed(class.arity()),
            _ => return runtime(paren.line, "Can only call functions and classes."),
        };

        if let Arity::Fixed(expected) = arity {
            if !arity.accepts(args.len()) {
                return runtime(
                    paren.line,
                    format!("Expected {} arguments but got {}.", expected, args.len()),
                );
            }
        }

        match callee {
            Value::Function(function) => function.call(self, args),

            Value::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(self, &args).or_else(|message| runtime(paren.line, message))
            }

            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);
                let instance = Rc::new(LoxInstance::new(Rc::clone(&class)));
                if let Some(init) = class.find_method("init") {
                    init.bind(Value::Instance(Rc::clone(&instance)))
                        .call(self, args)?;
                }
                Ok(Value::Instance(instance))
            }

            _ => runtime(paren.line, "Can only call functions and classes."),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Indexing
    // ─────────────────────────────────────────────────────────────────────────

    fn index_set(
        &mut self,
        target: &Value,
        index: &Value,
        operator: &Token,
        value: &Expr,
        line: usize,
    ) -> IResult<Value> {
        let compound = operator.token_type.compound_base();

        match target {
            Value::Array(items) => {
                let len = items.borrow().len();
                let i = element_index(index, len, line)?;

                let new_value = match &compound {
                    Some(op) => {
                        let current = items.borrow()[i].clone();
                        let rhs = self.evaluate(value)?;
                        apply_binary(op, operator.line, current, rhs)?
                    }
                    None => self.evaluate(value)?,
                };

                let mut items = items.borrow_mut();
                let len = items.len();
                match items.get_mut(i) {
                    Some(slot) => *slot = new_value.clone(),
                    None => return Err(out_of_bounds(index, len, line).into()),
                }
                Ok(new_value)
            }

            Value::Map(entries) => {
                let key = HashKey::from_value(index, line)?;

                let new_value = match &compound {
                    Some(op) => {
                        let current = entries.borrow().get(&key).cloned();
                        let Some(current) = current else {
                            return runtime(line, format!("Key '{}' not present.", key));
                        };
                        let rhs = self.evaluate(value)?;
                        apply_binary(op, operator.line, current, rhs)?
                    }
                    None => self.evaluate(value)?,
                };

                entries.borrow_mut().insert(key, new_value.clone());
                Ok(new_value)
            }

            Value::String(_) => runtime(line, "Strings are immutable."),

            _ => runtime(line, "Can only assign by index to arrays and hash maps."),
        }
    }
}

/// Method table of one class body; every entry closes over `defining`.
fn function_table(
    decls: &[Rc<FunctionDecl>],
    defining: &Env,
    kind: impl Fn(&str) -> FunctionKind,
) -> HashMap<String, Rc<LoxFunction>> {
    decls
        .iter()
        .map(|decl| {
            let function = LoxFunction::new(
                Rc::clone(decl),
                Rc::clone(defining),
                kind(&decl.name.lexeme),
            );
            (decl.name.lexeme.clone(), Rc::new(function))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluates `left <op> right`.  Shared by binary expressions and compound
/// assignment.
fn apply_binary(
    op: &TokenType,
    line: usize,
    left: Value,
    right: Value,
) -> std::result::Result<Value, RuntimeError> {
    let numbers = |l: &Value, r: &Value| match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(line, "Operands must be numbers.")),
    };

    match op {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(RuntimeError::new(
                line,
                "Operands must be two numbers or two strings.",
            )),
        },
        TokenType::MINUS => numbers(&left, &right).map(|(a, b)| Value::Number(a - b)),
        TokenType::STAR => numbers(&left, &right).map(|(a, b)| Value::Number(a * b)),
        TokenType::SLASH => {
            let (a, b) = numbers(&left, &right)?;
            if b == 0.0 {
                return Err(RuntimeError::new(line, "Division by zero."));
            }
            Ok(Value::Number(a / b))
        }
        TokenType::PERCENT => {
            let (a, b) = numbers(&left, &right)?;
            if b == 0.0 {
                return Err(RuntimeError::new(line, "Modulo by zero."));
            }
            Ok(Value::Number(a % b))
        }
        TokenType::GREATER => numbers(&left, &right).map(|(a, b)| Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => numbers(&left, &right).map(|(a, b)| Value::Bool(a >= b)),
        TokenType::LESS => numbers(&left, &right).map(|(a, b)| Value::Bool(a < b)),
        TokenType::LESS_EQUAL => numbers(&left, &right).map(|(a, b)| Value::Bool(a <= b)),
        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),
        other => Err(RuntimeError::new(
            line,
            format!("Invalid binary operator {}.", other.name()),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Index helpers
// ─────────────────────────────────────────────────────────────────────────────

fn integer(index: &Value, line: usize) -> std::result::Result<i64, RuntimeError> {
    match index {
        Value::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
        _ => Err(RuntimeError::new(line, "Index must be an integer.")),
    }
}

fn out_of_bounds(index: &Value, len: usize, line: usize) -> RuntimeError {
    RuntimeError::new(
        line,
        format!("Index out of bounds: index {}, length {}.", index, len),
    )
}

/// Position of `index` in a sequence of `len` items; negatives count from
/// the end.
fn element_index(index: &Value, len: usize, line: usize) -> std::result::Result<usize, RuntimeError> {
    let raw = integer(index, line)?;
    let i = if raw < 0 { raw + len as i64 } else { raw };

    if i < 0 || i >= len as i64 {
        return Err(out_of_bounds(index, len, line));
    }

    Ok(i as usize)
}

/// Slice bound normalised like an index, then clamped to `[0, len]`.
fn slice_bound(
    bound: Option<Value>,
    default: usize,
    len: usize,
    line: usize,
) -> std::result::Result<usize, RuntimeError> {
    let Some(bound) = bound else {
        return Ok(default);
    };

    let raw = integer(&bound, line)?;
    let i = if raw < 0 { raw + len as i64 } else { raw };

    Ok(i.clamp(0, len as i64) as usize)
}

fn index_get(target: &Value, index: &Value, line: usize) -> std::result::Result<Value, RuntimeError> {
    match target {
        Value::Array(items) => {
            let items = items.borrow();
            let i = element_index(index, items.len(), line)?;
            Ok(items[i].clone())
        }

        Value::String(s) => {
            let len = s.chars().count();
            let i = element_index(index, len, line)?;
            Ok(Value::String(
                s.chars().nth(i).map(String::from).unwrap_or_default(),
            ))
        }

        Value::Map(entries) => {
            let key = HashKey::from_value(index, line)?;
            entries
                .borrow()
                .get(&key)
                .cloned()
                .ok_or_else(|| RuntimeError::new(line, format!("Key '{}' not present.", key)))
        }

        _ => Err(RuntimeError::new(
            line,
            "Can only index arrays, strings and hash maps.",
        )),
    }
}

fn slice(
    target: &Value,
    start: Option<Value>,
    stop: Option<Value>,
    line: usize,
) -> std::result::Result<Value, RuntimeError> {
    let len = match target {
        Value::Array(items) => items.borrow().len(),
        Value::String(s) => s.chars().count(),
        Value::Map(_) => return Err(RuntimeError::new(line, "Can't slice a hash map.")),
        _ => {
            return Err(RuntimeError::new(
                line,
                "Can only index arrays, strings and hash maps.",
            ))
        }
    };

    let lo = slice_bound(start, 0, len, line)?;
    let hi = slice_bound(stop, len, len, line)?.max(lo);

    match target {
        Value::Array(items) => Ok(Value::array(items.borrow()[lo..hi].to_vec())),
        Value::String(s) => Ok(Value::String(s.chars().skip(lo).take(hi - lo).collect())),
        _ => Ok(Value::Nil),
    }
}
