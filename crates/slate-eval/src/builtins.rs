//! Host-provided built-ins.
//!
//! Every built-in is a variant of [`Builtin`]; calling one dispatches
//! through a single `match`, so the set of host functions is closed and
//! known at compile time. [`install`] binds them all, plus the literal
//! bindings `None`, `true` and `false`, into the root environment before
//! a program runs.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use indexmap::IndexMap;
use rand::Rng;

use crate::env::{Access, Environments, ROOT_ENV};
use crate::error::RuntimeError;
use crate::file::FileHandle;
use crate::value::Value;

/// A host function preloaded into the root environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// `print(any…)`: display forms separated by spaces, trailing newline.
    Print,
    /// `input(prompt?)`: one line from the host input stream.
    Input,
    /// `random(lo, hi)`: uniform integer in `[lo, hi]` inclusive.
    Random,
    /// `str(value)`: the display form.
    Str,
    /// `int(value)`: integer coercion, truncating floats toward zero.
    Int,
    /// `float(value)`: float coercion.
    Float,
    /// `real(value)`: alias of `float`.
    Real,
    /// `bool(value)`: boolean coercion.
    Bool,
    /// `open(path)`: open for reading, loading lines into memory.
    Open,
    /// `newFile(path)`: create or truncate, returning a handle.
    NewFile,
    /// `ASC(char)`: character code of a one-character string.
    Asc,
    /// `CHR(num)`: one-character string from a character code.
    Chr,
}

impl Builtin {
    /// Every built-in, in installation order.
    pub const ALL: [Builtin; 12] = [
        Builtin::Print,
        Builtin::Input,
        Builtin::Random,
        Builtin::Str,
        Builtin::Int,
        Builtin::Float,
        Builtin::Real,
        Builtin::Bool,
        Builtin::Open,
        Builtin::NewFile,
        Builtin::Asc,
        Builtin::Chr,
    ];

    /// The name the built-in is bound under.
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Input => "input",
            Builtin::Random => "random",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Real => "real",
            Builtin::Bool => "bool",
            Builtin::Open => "open",
            Builtin::NewFile => "newFile",
            Builtin::Asc => "ASC",
            Builtin::Chr => "CHR",
        }
    }

    /// Applies the built-in to already-evaluated arguments.
    ///
    /// `out` and `input` are the host streams `print` and `input` talk to.
    pub(crate) fn call(
        &self,
        args: Vec<Value>,
        out: &mut dyn Write,
        input: &mut dyn BufRead,
    ) -> Result<Value, RuntimeError> {
        match self {
            Builtin::Print => {
                let mut text = String::new();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        text.push(' ');
                    }
                    text.push_str(&arg.to_string());
                }
                writeln!(out, "{}", text)?;
                out.flush()?;
                Ok(Value::Null)
            }
            Builtin::Input => {
                if args.len() > 1 {
                    return Err(self.bad_arity("0 to 1", args.len()));
                }
                if let Some(prompt) = args.first() {
                    write!(out, "{}", prompt)?;
                    out.flush()?;
                }
                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    return Err(RuntimeError::Eof {
                        message: "end of input".to_string(),
                    });
                }
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(Value::string(line))
            }
            Builtin::Random => {
                let [lo, hi] = self.exactly::<2>(args)?;
                let (Value::Int(lo), Value::Int(hi)) = (&lo, &hi) else {
                    return Err(RuntimeError::type_error(
                        "random expects two integer bounds",
                    ));
                };
                if lo > hi {
                    return Err(RuntimeError::value_error(format!(
                        "random bounds are reversed: {} > {}",
                        lo, hi
                    )));
                }
                Ok(Value::Int(rand::thread_rng().gen_range(*lo..=*hi)))
            }
            Builtin::Str => {
                let [value] = self.exactly::<1>(args)?;
                Ok(Value::string(value.to_string()))
            }
            Builtin::Int => {
                let [value] = self.exactly::<1>(args)?;
                match value {
                    Value::Int(n) => Ok(Value::Int(n)),
                    Value::Float(f) => Ok(Value::Int(f as i64)),
                    Value::Bool(b) => Ok(Value::Int(i64::from(b))),
                    Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                        RuntimeError::type_error(format!("cannot convert '{}' to int", s))
                    }),
                    other => Err(RuntimeError::type_error(format!(
                        "cannot convert {} to int",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Float | Builtin::Real => {
                let [value] = self.exactly::<1>(args)?;
                match value {
                    Value::Int(n) => Ok(Value::Float(n as f64)),
                    Value::Float(f) => Ok(Value::Float(f)),
                    Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
                    Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                        RuntimeError::type_error(format!("cannot convert '{}' to float", s))
                    }),
                    other => Err(RuntimeError::type_error(format!(
                        "cannot convert {} to float",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Bool => {
                let [value] = self.exactly::<1>(args)?;
                match value {
                    Value::Bool(b) => Ok(Value::Bool(b)),
                    Value::Int(_) | Value::Float(_) => Ok(Value::Bool(value.is_truthy())),
                    Value::Str(s) => match &*s {
                        "true" => Ok(Value::Bool(true)),
                        "false" => Ok(Value::Bool(false)),
                        other => Err(RuntimeError::type_error(format!(
                            "cannot convert '{}' to bool",
                            other
                        ))),
                    },
                    other => Err(RuntimeError::type_error(format!(
                        "cannot convert {} to bool",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Open | Builtin::NewFile => {
                let [value] = self.exactly::<1>(args)?;
                let Value::Str(path) = value else {
                    return Err(RuntimeError::type_error(format!(
                        "{} expects a path string",
                        self.name()
                    )));
                };
                let handle = match self {
                    Builtin::Open => FileHandle::open(&path)?,
                    _ => FileHandle::create(&path)?,
                };
                Ok(Value::File(Rc::new(RefCell::new(handle))))
            }
            Builtin::Asc => {
                let [value] = self.exactly::<1>(args)?;
                let Value::Str(s) = &value else {
                    return Err(RuntimeError::type_error("ASC expects a character"));
                };
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Int(c as i64)),
                    _ => Err(RuntimeError::type_error(
                        "ASC expects a single character",
                    )),
                }
            }
            Builtin::Chr => {
                let [value] = self.exactly::<1>(args)?;
                let Value::Int(code) = value else {
                    return Err(RuntimeError::type_error("CHR expects a character code"));
                };
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .map(|c| Value::string(c.to_string()))
                    .ok_or_else(|| {
                        RuntimeError::value_error(format!("{} is not a character code", code))
                    })
            }
        }
    }

    /// Demands an exact argument count.
    fn exactly<const N: usize>(&self, args: Vec<Value>) -> Result<[Value; N], RuntimeError> {
        let found = args.len();
        args.try_into()
            .map_err(|_| self.bad_arity(&N.to_string(), found))
    }

    fn bad_arity(&self, expected: &str, found: usize) -> RuntimeError {
        RuntimeError::Arity {
            name: self.name().to_string(),
            expected: expected.to_string(),
            found,
        }
    }
}

/// The built-in registry in installation order.
pub fn registry() -> IndexMap<&'static str, Builtin> {
    Builtin::ALL.iter().map(|b| (b.name(), *b)).collect()
}

/// Populates the root environment with the built-ins and the literal
/// bindings `None`, `true` and `false`.
pub fn install(envs: &mut Environments) {
    for (name, builtin) in registry() {
        envs.bind(ROOT_ENV, name, Value::Builtin(builtin), Access::Norm);
    }
    envs.bind(ROOT_ENV, "None", Value::Null, Access::Norm);
    envs.bind(ROOT_ENV, "true", Value::Bool(true), Access::Norm);
    envs.bind(ROOT_ENV, "false", Value::Bool(false), Access::Norm);
}
