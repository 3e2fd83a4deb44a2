//! The Value Type
//!
//! The [`Value`] type is the type of all data flowing through a Til interpreter: the
//! words of a statement after substitution, the contents of variables, and the results
//! of commands and expressions.
//!
//! A `Value` is either an `Integer` or a `Text`.  The two are only converted into one
//! another at a few well-defined points:
//!
//! * Text to Integer: [`Value::as_int`], used for arithmetic operands and by
//!   [`Interp::get_integer`](../interp/struct.Interp.html#method.get_integer).  The
//!   text is trimmed of ASCII whitespace and parsed as a decimal `i64` with an optional
//!   sign; anything else is a `TypeMismatch`.
//! * Integer to Text: [`Value::as_str`] and `Display`, used when a substitution is
//!   concatenated with literal text or a value is used as a name.
//!
//! Everywhere else the tag is preserved: `set a $b` stores exactly what `$b` held.
//!
//! ```
//! use til::Value;
//!
//! let int = Value::from(42);
//! assert_eq!(int.as_int(), Ok(42));
//! assert_eq!(int.as_str(), "42");
//!
//! let text = Value::from(" 17 ");
//! assert_eq!(text.as_int(), Ok(17));
//! assert!(Value::from("abc").as_int().is_err());
//! ```

use crate::types::{ErrorCode, Exception, TilInt};
use std::borrow::Cow;
use std::fmt;

/// A Til value: an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Integer(TilInt),
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::empty()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Value {
    /// Returns the empty Text value.
    pub fn empty() -> Value {
        Value::Text(String::new())
    }

    /// Returns true if this is an Integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    /// Returns the value's string representation.  Integers are rendered in decimal.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Value::Integer(n) => Cow::Owned(n.to_string()),
            Value::Text(s) => Cow::Borrowed(s),
        }
    }

    /// Returns the value as an integer, parsing Text if need be.  Fails with
    /// `TypeMismatch` if the Text isn't a valid integer.
    pub fn as_int(&self) -> Result<TilInt, Exception> {
        match self {
            Value::Integer(n) => Ok(*n),
            Value::Text(s) => Value::get_int(s),
        }
    }

    /// Parses a string as an integer.  Leading and trailing ASCII whitespace is ignored,
    /// and the number may carry a leading `+` or `-`.
    ///
    /// ```
    /// use til::Value;
    /// assert_eq!(Value::get_int("-12"), Ok(-12));
    /// assert!(Value::get_int("1.5").is_err());
    /// ```
    pub fn get_int(s: &str) -> Result<TilInt, Exception> {
        s.trim_matches(|c: char| c.is_ascii_whitespace())
            .parse::<TilInt>()
            .map_err(|_| {
                Exception::new(
                    ErrorCode::TypeMismatch,
                    format!("expected integer but got \"{}\"", s),
                )
            })
    }

    /// The name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
        }
    }
}

impl From<TilInt> for Value {
    fn from(n: TilInt) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(TilInt::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}
