//! Convenience Macros
//!
//! This module contains macros for use by command authors.

/// Returns an `Ok` `TilResult`.
///
/// If called with no arguments, returns an empty Text value as the `Ok` result.
/// If called with one argument, returns the argument as the `Ok` result, converting it
/// to a value automatically.
/// If called with two or more arguments, computes the `Ok` result using
/// `format!()`; the first argument is naturally the format string.
///
/// ```
/// use til::*;
///
/// fn func() -> TilResult {
///     til_ok!(7)
/// }
///
/// assert_eq!(func(), Ok(Value::from(7)));
/// ```
#[macro_export]
macro_rules! til_ok {
    () => (
        Ok($crate::Value::empty())
    );
    ($arg:expr) => (
        Ok($crate::Value::from($arg))
    );
    ($($arg:tt)*) => (
        Ok($crate::Value::from(format!($($arg)*)))
    )
}

/// Returns an `Err` result with the given error code; the remaining arguments are
/// passed to `format!()` to build the message.
///
/// ```
/// use til::*;
///
/// fn func(name: &str) -> TilResult {
///     til_err!(ErrorCode::UndefinedVariable, "can't read \"{}\": no such variable", name)
/// }
///
/// let err = func("x").unwrap_err();
/// assert_eq!(err.code(), ErrorCode::UndefinedVariable);
/// assert_eq!(err.message(), "can't read \"x\": no such variable");
/// ```
#[macro_export]
macro_rules! til_err {
    ($code:expr, $($arg:tt)*) => (
        Err($crate::Exception::new($code, format!($($arg)*)))
    )
}
