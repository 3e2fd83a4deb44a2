//! Til Public Types
//!
//! This module defines a number of types used throughout Til's public API.
//!
//! # Til Results
//!
//! The standard Rust `Result` type is aliased as [`TilResult`], which is
//! `Result<Value, Exception>`.  Command functions, substitutions and nested
//! evaluations all return it; the `?` operator propagates an [`Exception`] up to
//! the statement that raised it, and from there to [`Interp::eval`], which turns
//! it into a status code.
//!
//! # Error Codes
//!
//! Every [`Exception`] carries an [`ErrorCode`].  The codes are stable: a host that
//! only sees the integer returned by [`Interp::eval`] can rely on them.
//!
//! | Code | Status | Raised when                                              |
//! | ---- | ------ | -------------------------------------------------------- |
//! | `Parse`             | 1 | malformed statement, quote, group or expression |
//! | `UndefinedVariable` | 2 | a name is unbound in the whole scope chain       |
//! | `TypeMismatch`      | 3 | Text used where an integer is required           |
//! | `DivideByZero`      | 4 | `/` or `%` with a zero divisor                   |
//! | `UnknownCommand`    | 5 | a statement's leading word has no handler        |
//! | `Arity`             | 6 | a command got the wrong number of arguments      |
//! | `RecursionLimit`    | 7 | nested evaluation exceeded the recursion limit   |
//! | `Overflow`          | 8 | integer arithmetic overflowed                    |
//!
//! [`Interp::eval`]: ../interp/struct.Interp.html#method.eval

use crate::interp::Interp;
pub use crate::value::Value;
use std::fmt;

/// The hasher used by Til's internal tables.
pub type TilHasher = fnv::FnvBuildHasher;

/// The standard integer type for Til code.
pub type TilInt = i64;

/// The standard `Result<T,E>` type for Til code.
pub type TilResult = Result<Value, Exception>;

/// A function used to implement a built-in command.  It receives the interpreter, the
/// scope the statement is evaluated in, and the fully substituted words of the
/// statement, `argv[0]` being the command name.
///
/// ```
/// use til::types::*;
/// use til::{check_args, Interp};
///
/// fn cmd_double(_: &mut Interp, _: ScopeId, argv: &[Value]) -> TilResult {
///     check_args(1, argv, 2, 2, "value")?;
///     let n = argv[1].as_int()?;
///     Ok(Value::from(n * 2))
/// }
/// ```
pub type CommandFunc = fn(&mut Interp, ScopeId, &[Value]) -> TilResult;

/// A closure used to implement a command.  Closures may capture application data.
#[cfg(feature = "closure-commands")]
pub type CommandClosure = Box<dyn Fn(&mut Interp, ScopeId, &[Value]) -> TilResult>;

pub use crate::scope::ScopeId;

/// The kind of an [`Exception`].  Each kind maps to a distinct, stable status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A malformed statement, unterminated quote or group, or bad expression syntax.
    Parse,

    /// A variable reference to a name unbound in the whole scope chain.
    UndefinedVariable,

    /// A Text value used where an integer is required.
    TypeMismatch,

    /// Division or modulo by zero.
    DivideByZero,

    /// A statement whose leading word names no registered command.
    UnknownCommand,

    /// A command invoked with the wrong number of arguments.
    Arity,

    /// Nested evaluation exceeded the interpreter's recursion limit.
    RecursionLimit,

    /// Integer arithmetic overflowed.
    Overflow,
}

impl ErrorCode {
    /// Returns the status code [`Interp::eval`](../interp/struct.Interp.html#method.eval)
    /// reports for this kind of error.  Never zero.
    pub fn status(self) -> i32 {
        match self {
            ErrorCode::Parse => 1,
            ErrorCode::UndefinedVariable => 2,
            ErrorCode::TypeMismatch => 3,
            ErrorCode::DivideByZero => 4,
            ErrorCode::UnknownCommand => 5,
            ErrorCode::Arity => 6,
            ErrorCode::RecursionLimit => 7,
            ErrorCode::Overflow => 8,
        }
    }

    /// Returns the code for a status value, if it's one of ours.
    pub fn from_status(status: i32) -> Option<ErrorCode> {
        let code = match status {
            1 => ErrorCode::Parse,
            2 => ErrorCode::UndefinedVariable,
            3 => ErrorCode::TypeMismatch,
            4 => ErrorCode::DivideByZero,
            5 => ErrorCode::UnknownCommand,
            6 => ErrorCode::Arity,
            7 => ErrorCode::RecursionLimit,
            8 => ErrorCode::Overflow,
            _ => return None,
        };

        Some(code)
    }

    /// A short symbolic name, as used in error traces.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Parse => "PARSE",
            ErrorCode::UndefinedVariable => "UNDEFINED",
            ErrorCode::TypeMismatch => "TYPE",
            ErrorCode::DivideByZero => "DIVZERO",
            ErrorCode::UnknownCommand => "UNKNOWN",
            ErrorCode::Arity => "ARITY",
            ErrorCode::RecursionLimit => "RECURSION",
            ErrorCode::Overflow => "OVERFLOW",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The exceptional result of evaluating Til code.
///
/// An `Exception` records what went wrong (its [`ErrorCode`] and message) and, as it
/// propagates outward, where: each enclosing statement appends to the error info, so
/// that a host can print a readable trace.  Only the code participates in control flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Exception {
    code: ErrorCode,
    message: String,
    error_info: String,
    is_new: bool,
    incomplete: bool,
}

impl Exception {
    /// Creates a new exception with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code,
            error_info: message.clone(),
            message,
            is_new: true,
            incomplete: false,
        }
    }

    /// Shorthand for a `Parse` exception.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Parse, message)
    }

    /// A `Parse` exception for input that ends inside a quote or group, and so might
    /// become valid with more text.
    pub(crate) fn incomplete(message: impl Into<String>) -> Self {
        Self {
            incomplete: true,
            ..Self::parse(message)
        }
    }

    /// The kind of error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The status code the host sees for this error.
    pub fn status(&self) -> i32 {
        self.code.status()
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The human-readable stack trace: the message followed by the statements that
    /// were executing when it was raised, innermost first.
    pub fn error_info(&self) -> &str {
        &self.error_info
    }

    /// Returns true if the error is a `Parse` error caused by input that ended too soon:
    /// an unterminated quote or `$( )` group.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    /// Returns true if no statement context has been added to the trace yet.
    pub fn is_new_error(&self) -> bool {
        self.is_new
    }

    /// Appends a line to the error info.
    pub fn add_error_info(&mut self, line: &str) {
        self.error_info.push('\n');
        self.error_info.push_str(line);
        self.is_new = false;
    }
}

/// Checks the number of arguments passed to a command, returning an `Arity` error if
/// the count is out of range.
///
/// * `namec` is the number of words that make up the command name (1 for plain commands).
/// * `min` is the minimum `argv.len()` allowed, including the command name.
/// * `max` is the maximum, or 0 for no maximum.
/// * `argsig` describes the arguments, for the error message.
///
/// ```
/// use til::check_args;
/// use til::types::*;
///
/// let argv = [Value::from("set"), Value::from("a")];
/// let err = check_args(1, &argv, 3, 3, "name value").unwrap_err();
/// assert_eq!(err.code(), ErrorCode::Arity);
/// assert_eq!(err.message(), "wrong # args: should be \"set name value\"");
/// ```
pub fn check_args(
    namec: usize,
    argv: &[Value],
    min: usize,
    max: usize,
    argsig: &str,
) -> Result<(), Exception> {
    assert!(namec >= 1);
    assert!(!argv.is_empty());

    if argv.len() < min || (max > 0 && argv.len() > max) {
        let name: Vec<String> = argv[0..namec.min(argv.len())]
            .iter()
            .map(|v| v.to_string())
            .collect();

        let mut msg = format!("wrong # args: should be \"{}", name.join(" "));
        if !argsig.is_empty() {
            msg.push(' ');
            msg.push_str(argsig);
        }
        msg.push('"');

        Err(Exception::new(ErrorCode::Arity, msg))
    } else {
        Ok(())
    }
}
