//! # Standard Til Command Definitions
//!
//! This module defines the standard Til commands.  Each is a [`CommandFunc`]; the
//! interpreter's command table maps names to them, and applications add their own
//! in the same way.
//!
//! [`CommandFunc`]: ../types/type.CommandFunc.html

use crate::interp::Interp;
use crate::types::*;
use crate::{check_args, til_err, til_ok};

/// # set *varName* *newValue*
///
/// Sets variable *varName* in the statement's scope to *newValue*, returning the value.
/// The value is stored exactly as substitution produced it.
pub fn cmd_set(interp: &mut Interp, scope: ScopeId, argv: &[Value]) -> TilResult {
    check_args(1, argv, 3, 3, "varName newValue")?;

    interp.set_var_return(scope, &argv[1].as_str(), argv[2].clone())
}

/// # unset *varName*
///
/// Removes the binding of *varName* from the statement's scope.  A binding visible only
/// in a parent scope is not removed, and is an error.
pub fn cmd_unset(interp: &mut Interp, scope: ScopeId, argv: &[Value]) -> TilResult {
    check_args(1, argv, 2, 2, "varName")?;

    let name = argv[1].as_str();
    match interp.unset_var(scope, &name) {
        Some(_) => til_ok!(),
        None => til_err!(
            ErrorCode::UndefinedVariable,
            "can't unset \"{}\": no such variable",
            name
        ),
    }
}

/// # incr *varName* ?*increment*?
///
/// Adds *increment* (default 1) to the integer value of *varName*, storing the result
/// in the statement's scope and returning it.  An unbound variable counts as 0.
pub fn cmd_incr(interp: &mut Interp, scope: ScopeId, argv: &[Value]) -> TilResult {
    check_args(1, argv, 2, 3, "varName ?increment?")?;

    let name = argv[1].as_str();
    let increment = match argv.get(2) {
        Some(value) => value.as_int()?,
        None => 1,
    };

    let current = if interp.var_exists(scope, &name) {
        interp.get_integer(scope, &name)?
    } else {
        0
    };

    match current.checked_add(increment) {
        Some(sum) => interp.set_var_return(scope, &name, Value::from(sum)),
        None => til_err!(
            ErrorCode::Overflow,
            "integer overflow in \"incr {} {}\"",
            name,
            increment
        ),
    }
}
