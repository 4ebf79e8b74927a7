//! Runtime value model.
//!
//! A [`Value`] is a tagged union over the kinds a Slate program can
//! produce. Small values are stored inline; lists and file handles sit
//! behind `Rc<RefCell<..>>` so that binding them under two names aliases
//! one underlying object, as the language requires. Strings are immutable
//! and share their buffer through `Rc<str>`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use slate_util::define_idx;

use crate::builtins::Builtin;
use crate::error::RuntimeError;
use crate::file::FileHandle;

define_idx!(FuncId);

/// Converts a possibly-negative index, counting from the end, into a
/// concrete position bounds-checked against `length`.
///
/// Used for every indexed access (subscripts and `pop`): `-1` is the
/// last element, `-length` the first.
pub(crate) fn normalise_index(raw: i64, length: usize) -> Result<usize, RuntimeError> {
    let index = if raw < 0 { raw + length as i64 } else { raw };
    if index < 0 || index as usize >= length {
        return Err(RuntimeError::Index {
            index: raw,
            length,
        });
    }
    Ok(index as usize)
}

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absent value, written `None`.
    Null,
    /// An integer number.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A boolean, written `true` / `false`.
    Bool(bool),
    /// An immutable string.
    Str(Rc<str>),
    /// A mutable, aliasable list.
    List(Rc<RefCell<Vec<Value>>>),
    /// A host file handle.
    File(Rc<RefCell<FileHandle>>),
    /// A host-provided built-in function.
    Builtin(Builtin),
    /// A user-defined subroutine, by index into the evaluator's
    /// function table.
    Subroutine(FuncId),
}

impl Value {
    /// Builds a string value.
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    /// Builds a list value from evaluated elements.
    pub fn list(elements: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    /// The value's truthiness.
    ///
    /// Null is false; a bool is itself; a number is true iff non-zero; a
    /// string or list is true iff non-empty. Files and callables are
    /// always true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::File(_) | Value::Builtin(_) | Value::Subroutine(_) => true,
        }
    }

    /// The kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::File(_) => "file",
            Value::Builtin(_) => "builtin",
            Value::Subroutine(_) => "subroutine",
        }
    }

    /// The numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality, used by tests and by `==` on same-kind values.
    ///
    /// Numbers compare numerically across int/float. Files compare by
    /// identity.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::File(a), Value::File(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Subroutine(a), Value::Subroutine(b)) => a == b,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(true) => write!(f, "true"),
            Value::Bool(false) => write!(f, "false"),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::File(handle) => write!(f, "<file {}>", handle.borrow().path()),
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name()),
            Value::Subroutine(_) => write!(f, "<subroutine>"),
        }
    }
}
