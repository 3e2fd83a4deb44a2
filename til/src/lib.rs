//! # Til: An Embeddable Tcl-like Scripting Language
//!
//! Til is a small, line-oriented command language for configuration-like snippets:
//!
//! ```text
//! set a 1
//! set b 2
//! set result $($a + $b)
//! ```
//!
//! Each line is a statement: a command name followed by argument words.  Before the
//! command runs, `$name` in a word is replaced by the variable's value and `$( ... )`
//! by the value of the enclosed integer expression (or, if the group isn't arithmetic,
//! of the enclosed command).  Variables live in hierarchical scopes created by the host.
//!
//! The host program drives Til through three operations, all on [`Interp`]:
//!
//! ```
//! use til::Interp;
//!
//! let mut interp = Interp::new();
//! let scope = interp.create_scope("main", None);
//!
//! let status = interp.eval(scope, "test program", "set a 1\nset b 2\nset result $($a + $b)\n");
//! assert_eq!(status, 0);
//! assert_eq!(interp.get_integer(scope, "result"), Ok(3));
//! ```
//!
//! See the [`interp`] module for the full API, [`parser`] for the syntax, and
//! [`types`] for the error codes.

pub use crate::interp::Interp;
pub use crate::scope::ScopeId;
pub use crate::types::*;
pub use crate::value::Value;

mod macros;
pub mod commands;
pub mod expr;
pub mod interp;
pub mod parser;
pub mod scope;
mod subst;
pub mod types;
pub mod value;
