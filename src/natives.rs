//! Built‑in functions installed in the global scope.

use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::environment::Environment;
use crate::function::{Arity, NativeFunction};
use crate::interpreter::Interpreter;
use crate::value::{HashKey, Value};

const NATIVES: [NativeFunction; 7] = [
    NativeFunction {
        name: "clock",
        arity: Arity::Fixed(0),
        func: clock,
    },
    NativeFunction {
        name: "len",
        arity: Arity::Fixed(1),
        func: len,
    },
    NativeFunction {
        name: "string",
        arity: Arity::Fixed(1),
        func: string,
    },
    NativeFunction {
        name: "parseNum",
        arity: Arity::Fixed(1),
        func: parse_num,
    },
    NativeFunction {
        name: "printf",
        arity: Arity::Variadic,
        func: printf,
    },
    NativeFunction {
        name: "push",
        arity: Arity::Fixed(2),
        func: push,
    },
    NativeFunction {
        name: "delete",
        arity: Arity::Fixed(2),
        func: delete,
    },
];

/// Defines every built‑in in `globals`.
pub fn install(globals: &mut Environment) {
    for native in NATIVES {
        debug!("Defining native function '{}'", native.name);
        globals.define(native.name, Value::Native(Rc::new(native)));
    }
}

/// Seconds since the Unix epoch, with millisecond precision.
fn clock(_: &mut Interpreter, _: &[Value]) -> Result<Value, String> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64 / 1000.0))
}

fn len(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(items) => Ok(Value::Number(items.borrow().len() as f64)),
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(format!(
            "len() expects an array or a string, got {}.",
            other.type_name()
        )),
    }
}

fn string(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    Ok(Value::String(args[0].to_string()))
}

fn parse_num(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let Value::String(text) = &args[0] else {
        return Err(format!(
            "parseNum() expects a string, got {}.",
            args[0].type_name()
        ));
    };

    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Value::Number(n)),
        _ => Err(format!("parseNum() could not parse '{}' as a number.", text)),
    }
}

fn printf(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    interpreter.write_line(&line).map_err(|e| e.to_string())?;

    Ok(Value::Nil)
}

fn push(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        }
        other => Err(format!(
            "push() expects an array as its first argument, got {}.",
            other.type_name()
        )),
    }
}

/// Removes `key` from a hash map, returning the removed value or nil.
fn delete(_: &mut Interpreter, args: &[Value]) -> Result<Value, String> {
    let Value::Map(entries) = &args[0] else {
        return Err(format!(
            "delete() expects a hash map as its first argument, got {}.",
            args[0].type_name()
        ));
    };

    let key = HashKey::from_value(&args[1], 0).map_err(|e| e.message)?;

    Ok(entries.borrow_mut().shift_remove(&key).unwrap_or_default())
}
