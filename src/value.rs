//! Runtime values.
//!
//! Primitives are held inline.  Containers, callables and objects are shared
//! through `Rc`, so copying a `Value` never copies an array or an instance:
//! every copy observes the same mutations, and equality on them is identity.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::class::{LoxClass, LoxInstance};
use crate::error::RuntimeError;
use crate::function::{FunctionKind, LoxFunction, NativeFunction};

/// Insertion‑ordered hash map backing Lox `{k: v}` literals.
pub type LoxMap = IndexMap<HashKey, Value>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<LoxMap>>),
    Function(Rc<LoxFunction>),
    Native(Rc<NativeFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: LoxMap) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Name used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "hash map",
            Value::Function(_) => "function",
            Value::Native(_) => "native function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    fn fmt_nested(
        &self,
        f: &mut fmt::Formatter<'_>,
        quoted: bool,
        open: &mut Vec<usize>,
    ) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write_number(f, *n),

            Value::String(s) if quoted => write!(f, "{:?}", s),

            Value::String(s) => write!(f, "{}", s),

            Value::Array(items) => {
                let addr = Rc::as_ptr(items) as usize;
                if open.contains(&addr) {
                    return write!(f, "[...]");
                }

                open.push(addr);
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f, true, open)?;
                }
                open.pop();
                write!(f, "]")
            }

            Value::Map(entries) => {
                let addr = Rc::as_ptr(entries) as usize;
                if open.contains(&addr) {
                    return write!(f, "{{...}}");
                }

                open.push(addr);
                write!(f, "{{")?;
                for (i, (key, value)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    key.to_value().fmt_nested(f, true, open)?;
                    write!(f, ": ")?;
                    value.fmt_nested(f, true, open)?;
                }
                open.pop();
                write!(f, "}}")
            }

            Value::Function(fun) => match fun.kind {
                FunctionKind::Lambda => write!(f, "<lambda>"),
                _ => write!(f, "<fn {}>", fun.name()),
            },

            Value::Native(native) => write!(f, "<native fn {}>", native.name),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

/// Integral values print without a fraction: `3`, `-0`, `1.5`.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        if n == 0.0 && n.is_sign_negative() {
            return write!(f, "-0");
        }
        let mut buf = itoa::Buffer::new();
        write!(f, "{}", buf.format(n as i64))
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, true, &mut Vec::new())
    }
}

/// Primitives compare by value, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hash map keys
// ─────────────────────────────────────────────────────────────────────────────

/// Nested instances deeper than this hash by identity, which keeps
/// self‑referencing objects hashable.
const MAX_HASH_DEPTH: usize = 8;

/// The subset of values usable as hash map keys.
#[derive(Clone)]
pub enum HashKey {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Instance(Rc<LoxInstance>),
}

impl HashKey {
    /// Fails with `Unhashable type '...'.` for arrays, maps and callables.
    pub fn from_value(value: &Value, line: usize) -> Result<Self, RuntimeError> {
        match value {
            Value::Nil => Ok(HashKey::Nil),
            Value::Bool(b) => Ok(HashKey::Bool(*b)),
            // -0 and 0 are the same key
            Value::Number(n) => Ok(HashKey::Number(if *n == 0.0 { 0.0 } else { *n })),
            Value::String(s) => Ok(HashKey::String(s.clone())),
            Value::Instance(i) => Ok(HashKey::Instance(Rc::clone(i))),
            other => Err(RuntimeError::new(
                line,
                format!("Unhashable type '{}'.", other.type_name()),
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Nil => Value::Nil,
            HashKey::Bool(b) => Value::Bool(*b),
            HashKey::Number(n) => Value::Number(*n),
            HashKey::String(s) => Value::String(s.clone()),
            HashKey::Instance(i) => Value::Instance(Rc::clone(i)),
        }
    }

    fn hash_at<H: Hasher>(&self, state: &mut H, depth: usize) {
        std::mem::discriminant(self).hash(state);

        match self {
            HashKey::Nil => {}
            HashKey::Bool(b) => b.hash(state),
            HashKey::Number(n) => n.to_bits().hash(state),
            HashKey::String(s) => s.hash(state),
            HashKey::Instance(instance) if depth >= MAX_HASH_DEPTH => {
                (Rc::as_ptr(instance) as usize).hash(state)
            }
            HashKey::Instance(instance) => {
                (Rc::as_ptr(&instance.class) as usize).hash(state);

                for (name, value) in instance.sorted_fields() {
                    name.hash(state);
                    hash_field(&value, state, depth + 1);
                }
            }
        }
    }
}

fn hash_field<H: Hasher>(value: &Value, state: &mut H, depth: usize) {
    match HashKey::from_value(value, 0) {
        Ok(key) => key.hash_at(state, depth),
        Err(_) => identity(value).hash(state),
    }
}

fn identity(value: &Value) -> usize {
    match value {
        Value::Array(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Map(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Function(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Native(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Class(rc) => Rc::as_ptr(rc) as *const () as usize,
        Value::Instance(rc) => Rc::as_ptr(rc) as *const () as usize,
        _ => 0,
    }
}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_at(state, 0)
    }
}

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HashKey::Nil, HashKey::Nil) => true,
            (HashKey::Bool(a), HashKey::Bool(b)) => a == b,
            (HashKey::Number(a), HashKey::Number(b)) => a.to_bits() == b.to_bits(),
            (HashKey::String(a), HashKey::String(b)) => a == b,
            (HashKey::Instance(a), HashKey::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for HashKey {}

impl fmt::Debug for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_value(), f)
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_value(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &HashKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.0).to_string(), "-0");
    }

    #[test]
    fn strings_are_quoted_only_inside_containers() {
        let arr = Value::array(vec![Value::String("a".into()), Value::Number(1.0)]);
        assert_eq!(arr.to_string(), "[\"a\", 1]");
        assert_eq!(Value::String("a".into()).to_string(), "a");
    }

    #[test]
    fn self_containing_array_prints_an_ellipsis() {
        let arr = Value::array(vec![]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        assert_eq!(arr.to_string(), "[[...]]");
    }

    #[test]
    fn zero_and_negative_zero_are_one_key() {
        let a = HashKey::from_value(&Value::Number(0.0), 1).unwrap();
        let b = HashKey::from_value(&Value::Number(-0.0), 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn arrays_are_not_hashable() {
        let err = HashKey::from_value(&Value::array(vec![]), 7).unwrap_err();
        assert_eq!(err.message, "Unhashable type 'array'.");
        assert_eq!(err.line, 7);
    }
}
