//! Member dispatch: the method and attribute tables for strings, lists
//! and file handles.
//!
//! Each receiver kind has a fixed capability table expressed as a `match`
//! over the member name. An unknown member, or a member on a value with
//! no table, is a type error.

use std::cmp::Ordering;

use crate::error::RuntimeError;
use crate::value::{normalise_index, Value};

/// Looks up and applies `member` on `recv`.
///
/// `is_attribute` distinguishes `xs.length` from `xs.pop()`; attributes
/// take no arguments and are read directly.
pub(crate) fn eval_member(
    recv: &Value,
    member: &str,
    args: &[Value],
    is_attribute: bool,
) -> Result<Value, RuntimeError> {
    if is_attribute {
        eval_attribute(recv, member)
    } else {
        eval_method(recv, member, args)
    }
}

fn eval_attribute(recv: &Value, member: &str) -> Result<Value, RuntimeError> {
    match recv {
        Value::Str(s) => match member {
            "value" => Ok(recv.clone()),
            "length" => Ok(Value::Int(s.chars().count() as i64)),
            _ => Err(no_member(recv, member)),
        },
        Value::List(items) => match member {
            "length" => Ok(Value::Int(items.borrow().len() as i64)),
            _ => Err(no_member(recv, member)),
        },
        _ => Err(RuntimeError::type_error(format!(
            "value of type {} has no attributes",
            recv.type_name()
        ))),
    }
}

fn eval_method(recv: &Value, member: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    match recv {
        Value::Str(s) => string_method(s, member, args),
        Value::List(items) => {
            // Methods that hand the list back return the same aliased
            // value, not a copy.
            let list_value = recv.clone();
            list_method(&list_value, member, args)
        }
        Value::File(handle) => {
            let mut handle = handle.borrow_mut();
            match member {
                "readLine" => {
                    expect_args(member, args, 0)?;
                    handle.read_line().map(Value::string)
                }
                "writeLine" => {
                    expect_args(member, args, 1)?;
                    handle.write_line(args[0].to_string());
                    Ok(Value::Null)
                }
                "readFile" => {
                    expect_args(member, args, 0)?;
                    Ok(Value::string(handle.read_file()?))
                }
                "writeFile" => {
                    expect_args(member, args, 1)?;
                    handle.write_file(&args[0].to_string())?;
                    Ok(Value::Null)
                }
                "close" => {
                    expect_args(member, args, 0)?;
                    handle.close()?;
                    Ok(Value::Null)
                }
                _ => Err(no_member(recv, member)),
            }
        }
        _ => Err(RuntimeError::type_error(format!(
            "value of type {} has no methods",
            recv.type_name()
        ))),
    }
}

fn string_method(s: &str, member: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    match member {
        "substring" => {
            expect_args(member, args, 2)?;
            let start = want_index(&args[0], "substring start")?;
            let count = want_index(&args[1], "substring count")?;
            Ok(Value::string(
                s.chars().skip(start).take(count).collect::<String>(),
            ))
        }
        "left" => {
            expect_args(member, args, 1)?;
            let count = want_index(&args[0], "left count")?;
            Ok(Value::string(s.chars().take(count).collect::<String>()))
        }
        "right" => {
            expect_args(member, args, 1)?;
            let count = want_index(&args[0], "right count")?;
            let total = s.chars().count();
            Ok(Value::string(
                s.chars().skip(total.saturating_sub(count)).collect::<String>(),
            ))
        }
        "upper" => {
            expect_args(member, args, 0)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "lower" => {
            expect_args(member, args, 0)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "split" => {
            if args.len() > 1 {
                return Err(bad_arity(member, "0 to 1", args.len()));
            }
            let delimiter = match args.first() {
                Some(Value::Str(d)) => d.to_string(),
                Some(other) => {
                    return Err(RuntimeError::type_error(format!(
                        "split expects a string delimiter, found {}",
                        other.type_name()
                    )))
                }
                None => " ".to_string(),
            };
            if delimiter.is_empty() {
                return Err(RuntimeError::value_error("empty split delimiter"));
            }
            let parts = s.split(&delimiter).map(Value::string).collect();
            Ok(Value::list(parts))
        }
        _ => Err(RuntimeError::type_error(format!(
            "string has no method '{}'",
            member
        ))),
    }
}

fn list_method(list_value: &Value, member: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let Value::List(items) = list_value else {
        unreachable!("list_method called with a non-list receiver");
    };

    match member {
        "append" => {
            expect_args(member, args, 1)?;
            items.borrow_mut().push(args[0].clone());
            Ok(list_value.clone())
        }
        "pop" => {
            if args.len() > 1 {
                return Err(bad_arity(member, "0 to 1", args.len()));
            }
            let mut items = items.borrow_mut();
            let len = items.len();
            let raw = match args.first() {
                Some(value) => want_int(value, "pop index")?,
                None => -1,
            };
            let index = normalise_index(raw, len)?;
            Ok(items.remove(index))
        }
        "insert" => {
            expect_args(member, args, 2)?;
            let mut items = items.borrow_mut();
            let index = want_index(&args[0], "insert index")?.min(items.len());
            items.insert(index, args[1].clone());
            drop(items);
            Ok(list_value.clone())
        }
        "slice" => {
            expect_args(member, args, 2)?;
            let start = want_index(&args[0], "slice start")?;
            let count = want_index(&args[1], "slice count")?;
            let items = items.borrow();
            let taken: Vec<Value> = items.iter().skip(start).take(count).cloned().collect();
            Ok(Value::list(taken))
        }
        "head" => {
            if args.len() > 1 {
                return Err(bad_arity(member, "0 to 1", args.len()));
            }
            let items = items.borrow();
            match args.first() {
                // head() is the first element itself, not a one-element list
                None => items.first().cloned().ok_or(RuntimeError::Index {
                    index: 0,
                    length: 0,
                }),
                Some(value) => {
                    let count = want_index(value, "head count")?;
                    Ok(Value::list(items.iter().take(count).cloned().collect()))
                }
            }
        }
        "tail" => {
            if args.len() > 1 {
                return Err(bad_arity(member, "0 to 1", args.len()));
            }
            let items = items.borrow();
            match args.first() {
                None => Ok(Value::list(items.iter().skip(1).cloned().collect())),
                // tail(n) keeps the last n elements
                Some(value) => {
                    let count = want_index(value, "tail count")?;
                    let skip = items.len().saturating_sub(count);
                    Ok(Value::list(items.iter().skip(skip).cloned().collect()))
                }
            }
        }
        "sort" => {
            if args.len() > 1 {
                return Err(bad_arity(member, "0 to 1", args.len()));
            }
            let reverse = match args.first() {
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    return Err(RuntimeError::type_error(format!(
                        "sort expects a bool, found {}",
                        other.type_name()
                    )))
                }
                None => false,
            };
            sort_in_place(&mut items.borrow_mut(), reverse)?;
            Ok(Value::Null)
        }
        _ => Err(RuntimeError::type_error(format!(
            "list has no method '{}'",
            member
        ))),
    }
}

/// Sorts numbers numerically or strings lexicographically; mixed element
/// kinds cannot be ordered.
fn sort_in_place(items: &mut Vec<Value>, reverse: bool) -> Result<(), RuntimeError> {
    let all_numbers = items.iter().all(|v| v.as_number().is_some());
    let all_strings = items.iter().all(|v| matches!(v, Value::Str(_)));

    if all_numbers {
        items.sort_by(|a, b| {
            let (a, b) = (a.as_number().unwrap_or(0.0), b.as_number().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else if all_strings {
        items.sort_by(|a, b| match (a, b) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => Ordering::Equal,
        });
    } else {
        return Err(RuntimeError::type_error(
            "cannot sort a list of mixed kinds",
        ));
    }

    if reverse {
        items.reverse();
    }
    Ok(())
}

fn want_int(value: &Value, what: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(RuntimeError::type_error(format!(
            "{} must be an integer, found {}",
            what,
            other.type_name()
        ))),
    }
}

fn want_index(value: &Value, what: &str) -> Result<usize, RuntimeError> {
    let n = want_int(value, what)?;
    usize::try_from(n).map_err(|_| {
        RuntimeError::value_error(format!("{} must not be negative", what))
    })
}

fn expect_args(member: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(bad_arity(member, &expected.to_string(), args.len()));
    }
    Ok(())
}

fn bad_arity(member: &str, expected: &str, found: usize) -> RuntimeError {
    RuntimeError::Arity {
        name: member.to_string(),
        expected: expected.to_string(),
        found,
    }
}

fn no_member(recv: &Value, member: &str) -> RuntimeError {
    RuntimeError::type_error(format!(
        "{} has no member '{}'",
        recv.type_name(),
        member
    ))
}
