//! Runtime error types.
//!
//! One enum covers every way a Slate program can fail at run time. The
//! variant set mirrors the language's error kinds: name, type, value,
//! index, end-of-file, plus a catch-all for ill-formed operations and a
//! wrapper for host I/O failures from the file built-ins.

use thiserror::Error;

/// Errors raised while evaluating a program.
///
/// The first error aborts evaluation; nothing in the evaluator recovers
/// locally.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An identifier lookup failed.
    #[error("name error: '{name}' is not defined")]
    Name {
        /// The name that failed to resolve.
        name: String,
    },

    /// A value was not of the required kind.
    #[error("type error: {message}")]
    Type {
        /// Description of the mismatch.
        message: String,
    },

    /// A kind-appropriate value was out of range: duplicate declaration,
    /// const violation, array length mismatch, division by zero.
    #[error("value error: {message}")]
    Value {
        /// Description of the violation.
        message: String,
    },

    /// An array or string index was out of range.
    #[error("index error: index {index} out of range for length {length}")]
    Index {
        /// The requested index.
        index: i64,
        /// The container's length.
        length: usize,
    },

    /// A subroutine or built-in was called with the wrong argument count.
    #[error("runtime error: {name} expects {expected} argument(s), found {found}")]
    Arity {
        /// The callee's name.
        name: String,
        /// How many arguments it takes.
        expected: String,
        /// How many were supplied.
        found: usize,
    },

    /// Catch-all for ill-formed operations (unknown operator, calling a
    /// non-callable, and similar).
    #[error("runtime error: {message}")]
    Unsupported {
        /// Description of the operation.
        message: String,
    },

    /// `readLine` past the end of a file, or `input` past the end of the
    /// host's input stream.
    #[error("end of file: {message}")]
    Eof {
        /// What ran out.
        message: String,
    },

    /// A host I/O failure from the file built-ins.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Shorthand for a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type {
            message: message.into(),
        }
    }

    /// Shorthand for a value error.
    pub fn value_error(message: impl Into<String>) -> Self {
        RuntimeError::Value {
            message: message.into(),
        }
    }

    /// Shorthand for the catch-all kind.
    pub fn unsupported(message: impl Into<String>) -> Self {
        RuntimeError::Unsupported {
            message: message.into(),
        }
    }
}
