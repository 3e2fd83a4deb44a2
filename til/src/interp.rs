//! The Til Interpreter
//!
//! The [`Interp`] struct is the primary API for embedding Til into a Rust application.
//! Given an `Interp`, the application may:
//!
//! * Create variable scopes
//! * Evaluate scripts and expressions against a scope
//! * Extend the language by defining new Til commands in Rust
//! * Set and get Til variables
//!
//! # Interp is not Sync!
//!
//! The [`Interp`] class (and the rest of Til) is intended for use in a single thread.
//! Evaluation runs to completion: `eval` never blocks or yields, and each statement,
//! with all of its substitutions, finishes before the next one starts.  It is safe to
//! have `Interps` in different threads, but a single interpreter and its scopes must
//! not be used from two threads at once.
//!
//! # Creating an Interpreter and a Scope
//!
//! [`Interp::new`](struct.Interp.html#method.new) creates an interpreter populated with
//! the standard Til commands; [`Interp::empty`](struct.Interp.html#method.empty) creates
//! one with no commands at all, for applications that want to define their own command
//! set from scratch.
//!
//! Variables live in scopes.  A scope is created with
//! [`Interp::create_scope`](struct.Interp.html#method.create_scope), which returns a
//! [`ScopeId`] handle that remains valid for the life of the interpreter.  A scope may
//! be given a parent, whose variables it can read but never write.
//!
//! # Evaluating Scripts
//!
//! [`Interp::eval`](struct.Interp.html#method.eval) evaluates a script against a scope
//! and returns a status code: 0 on success, or the [`ErrorCode`] status of the first
//! error.  Evaluation stops at the first failing statement; statements that already
//! ran keep their effects.
//!
//! ```
//! use til::Interp;
//!
//! let mut interp = Interp::new();
//! let scope = interp.create_scope("main", None);
//!
//! let status = interp.eval(scope, "test program", "
//!     set a 1
//!     set b 2
//!     set result $($a + $b)
//! ");
//!
//! assert_eq!(status, 0);
//! assert_eq!(interp.get_integer(scope, "result"), Ok(3));
//! ```
//!
//! When more than the status code is wanted,
//! [`Interp::eval_result`](struct.Interp.html#method.eval_result) returns the value of
//! the last statement, or the [`Exception`] with its message and error trace.
//!
//! # Defining New Commands
//!
//! A command is a [`CommandFunc`] registered by name with
//! [`Interp::add_command`](struct.Interp.html#method.add_command).  It receives the
//! interpreter, the scope the statement runs in, and the substituted words of the
//! statement, `argv[0]` being the command's own name.
//!
//! ```
//! use til::types::*;
//! use til::{check_args, Interp};
//!
//! let mut interp = Interp::new();
//! let scope = interp.create_scope("main", None);
//! interp.add_command("square", cmd_square);
//!
//! assert_eq!(interp.eval(scope, "demo", "set x $(square 5)"), 0);
//! assert_eq!(interp.get_integer(scope, "x"), Ok(25));
//!
//! fn cmd_square(_: &mut Interp, _: ScopeId, argv: &[Value]) -> TilResult {
//!     check_args(1, argv, 2, 2, "intValue")?;
//!     let n = argv[1].as_int()?;
//!     Ok(Value::from(n * n))
//! }
//! ```
//!
//! [`CommandFunc`]: ../types/type.CommandFunc.html
//! [`ScopeId`]: ../scope/struct.ScopeId.html
//! [`ErrorCode`]: ../types/enum.ErrorCode.html
//! [`Exception`]: ../types/struct.Exception.html

use crate::commands;
use crate::expr;
use crate::parser::{self, Script, Statement};
use crate::scope::ScopeStore;
use crate::til_err;
use crate::types::*;
use indexmap::IndexMap;
use std::rc::Rc;

/// The default limit on nested evaluations.
pub const DEFAULT_RECURSION_LIMIT: usize = 256;

/// The Til Interpreter.
///
/// The `Interp` struct is the primary API for embedding Til into a Rust application.
/// See the [module level documentation](index.html) for an overview.
pub struct Interp {
    // Command Table
    commands: IndexMap<String, Rc<Command>, TilHasher>,

    // Variable Scopes
    scopes: ScopeStore,

    // Defines the recursion limit for nested evaluation.
    recursion_limit: usize,

    // Current number of eval levels.
    num_levels: usize,
}

/// A command defined in the interpreter.
enum Command {
    /// A binary command implemented as a Rust CommandFunc.
    Native(CommandFunc),

    #[cfg(feature = "closure-commands")]
    Closure(CommandClosure),
}

impl Command {
    /// Execute the command according to its kind.
    fn execute(&self, interp: &mut Interp, scope: ScopeId, argv: &[Value]) -> TilResult {
        match self {
            Command::Native(func) => func(interp, scope, argv),
            #[cfg(feature = "closure-commands")]
            Command::Closure(func) => func(interp, scope, argv),
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}

impl Interp {
    //--------------------------------------------------------------------------------------------
    // Constructors

    /// Creates a new Til interpreter with no commands defined.  Use this when crafting
    /// command languages that shouldn't include the standard commands.
    ///
    /// ```
    /// # use til::Interp;
    /// let interp = Interp::empty();
    /// assert!(interp.command_names().is_empty());
    /// ```
    pub fn empty() -> Self {
        Self {
            commands: IndexMap::default(),
            scopes: ScopeStore::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            num_levels: 0,
        }
    }

    /// Creates a new Til interpreter that is pre-populated with the standard Til
    /// commands: `set`, `unset` and `incr`.
    ///
    /// ```
    /// # use til::Interp;
    /// let interp = Interp::new();
    /// assert!(interp.has_command("set"));
    /// ```
    pub fn new() -> Self {
        let mut interp = Interp::empty();

        let new_commands: &[(&'static str, CommandFunc)] = &[
            ("incr", commands::cmd_incr),
            ("set", commands::cmd_set),
            ("unset", commands::cmd_unset),
        ];

        for &(name, func) in new_commands {
            interp.add_command(name, func);
        }

        interp
    }

    //--------------------------------------------------------------------------------------------
    // Scopes

    /// Creates a new variable scope.  If `parent` is given, variables not bound in the
    /// new scope are looked up in the parent and its ancestors.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a scope created by this interpreter.
    ///
    /// ```
    /// # use til::Interp;
    /// let mut interp = Interp::new();
    /// let main = interp.create_scope("main", None);
    /// let child = interp.create_scope("child", Some(main));
    ///
    /// assert_eq!(interp.eval(main, "setup", "set a 1"), 0);
    /// assert_eq!(interp.get_integer(child, "a"), Ok(1));
    /// ```
    pub fn create_scope(&mut self, name: &str, parent: Option<ScopeId>) -> ScopeId {
        let scope = self.scopes.create(name, parent);
        tracing::debug!(name, ?parent, ?scope, "created scope");
        scope
    }

    /// The diagnostic name of a scope.
    pub fn scope_name(&self, scope: ScopeId) -> &str {
        self.scopes.name(scope)
    }

    /// The parent of a scope, if any.
    pub fn scope_parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.parent(scope)
    }

    //--------------------------------------------------------------------------------------------
    // Script and Expression Evaluation

    /// Evaluates a script against a scope, returning 0 on success or the status code of
    /// the first error.  The `program_name` only labels diagnostics.
    ///
    /// Status codes are those of [`ErrorCode::status`](../types/enum.ErrorCode.html#method.status).
    ///
    /// ```
    /// use til::{ErrorCode, Interp};
    ///
    /// let mut interp = Interp::new();
    /// let scope = interp.create_scope("main", None);
    ///
    /// assert_eq!(interp.eval(scope, "ok", "set r $(7 / 2)"), 0);
    /// assert_eq!(interp.get_integer(scope, "r"), Ok(3));
    ///
    /// let status = interp.eval(scope, "bad", "set r $(1 / 0)");
    /// assert_eq!(status, ErrorCode::DivideByZero.status());
    /// ```
    pub fn eval(&mut self, scope: ScopeId, program_name: &str, source: &str) -> i32 {
        match self.eval_result(scope, program_name, source) {
            Ok(_) => 0,
            Err(exception) => {
                tracing::debug!(
                    program_name,
                    code = %exception.code(),
                    error_info = exception.error_info(),
                    "evaluation failed"
                );
                exception.status()
            }
        }
    }

    /// Evaluates a script against a scope.  Returns the value of the last statement
    /// (the empty value for an empty script) or the first error, with its error info
    /// naming the failing statement and its line in `program_name`.
    ///
    /// ```
    /// use til::{ErrorCode, Interp};
    ///
    /// let mut interp = Interp::new();
    /// let scope = interp.create_scope("main", None);
    ///
    /// let err = interp.eval_result(scope, "demo", "set a 1\nfrobnicate 1 2").unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::UnknownCommand);
    /// assert_eq!(err.message(), "invalid command name \"frobnicate\"");
    /// assert_eq!(
    ///     err.error_info(),
    ///     "invalid command name \"frobnicate\"\n    while executing\n\"frobnicate 1 2\"\n    (program \"demo\" line 2)"
    /// );
    /// ```
    #[tracing::instrument(level = "debug", skip(self, source))]
    pub fn eval_result(&mut self, scope: ScopeId, program_name: &str, source: &str) -> TilResult {
        // FIRST, parse the whole program; nothing runs if it's malformed.
        let script = parser::parse(source).map_err(|mut exception| {
            exception.add_error_info(&format!("    (program \"{}\")", program_name));
            exception
        })?;

        // NEXT, evaluate it one statement at a time, within the recursion limit.
        self.enter()?;
        let result = self.eval_statements(scope, &script, Some(program_name));
        self.leave();

        result
    }

    /// Evaluates a parsed script in the given scope, returning the value of the last
    /// statement.  Used for nested command substitution.
    pub(crate) fn eval_script(&mut self, scope: ScopeId, script: &Script) -> TilResult {
        self.eval_statements(scope, script, None)
    }

    fn eval_statements(
        &mut self,
        scope: ScopeId,
        script: &Script,
        program_name: Option<&str>,
    ) -> TilResult {
        let mut result_value = Value::empty();

        for statement in script.statements() {
            match self.eval_statement(scope, statement) {
                Ok(value) => result_value = value,
                Err(mut exception) => {
                    // FIRST, a new error, or an error from within a nested substitution.
                    if exception.is_new_error() {
                        exception.add_error_info("    while executing");
                    } else {
                        exception.add_error_info("    invoked from within");
                    }
                    exception.add_error_info(&format!("\"{}\"", statement.text()));

                    // NEXT, at the top level, say where.
                    if let Some(name) = program_name {
                        exception.add_error_info(&format!(
                            "    (program \"{}\" line {})",
                            name,
                            statement.line()
                        ));
                    }

                    return Err(exception);
                }
            }
        }

        Ok(result_value)
    }

    /// Substitutes a statement's words and dispatches it to its command.
    fn eval_statement(&mut self, scope: ScopeId, statement: &Statement) -> TilResult {
        let words = self.subst_words(scope, statement.words())?;

        let name = words[0].as_str();
        let cmd = match self.commands.get(&*name) {
            Some(cmd) => Rc::clone(cmd),
            None => {
                return til_err!(ErrorCode::UnknownCommand, "invalid command name \"{}\"", name);
            }
        };

        tracing::debug!(command = %name, argc = words.len() - 1, "dispatching");
        cmd.execute(self, scope, &words)
    }

    /// Evaluates an arithmetic expression in the given scope.  `$name` operands are
    /// looked up in the scope, and nested `$( )` groups are substituted as usual.
    ///
    /// ```
    /// # use til::Interp;
    /// # use til::Value;
    /// let mut interp = Interp::new();
    /// let scope = interp.create_scope("main", None);
    /// interp.set_var(scope, "x", Value::from(4));
    ///
    /// assert_eq!(interp.expr(scope, "$x * (2 + 1)"), Ok(12));
    /// ```
    pub fn expr(&mut self, scope: ScopeId, expr: &str) -> Result<TilInt, Exception> {
        let ast = expr::parse(expr, self.recursion_limit)?;

        self.enter()?;
        let result = expr::eval(self, scope, &ast);
        self.leave();

        result
    }

    /// Determines whether or not the script is syntactically complete,
    /// e.g., has no unmatched quotes or groups and doesn't end with a line continuation.
    /// Other syntax errors don't make a script incomplete: more input can't fix them,
    /// and evaluation will report them.
    ///
    /// REPLs use this to determine whether or not to ask for another line of
    /// input.
    ///
    /// ```
    /// # use til::Interp;
    /// let interp = Interp::new();
    /// assert!(interp.complete("set a $(1 + 1)"));
    /// assert!(!interp.complete("set a $(1 + 1"));
    /// assert!(!interp.complete("set a \"abc"));
    /// assert!(!interp.complete("set a \\"));
    /// assert!(interp.complete("set a \"x\"y"));
    /// ```
    pub fn complete(&self, script: &str) -> bool {
        if parser::ends_with_continuation(script) {
            return false;
        }

        match parser::parse(script) {
            Ok(_) => true,
            Err(exception) => !exception.is_incomplete(),
        }
    }

    // Enters a nested evaluation, failing if that would exceed the recursion limit.
    pub(crate) fn enter(&mut self) -> Result<(), Exception> {
        if self.num_levels >= self.recursion_limit {
            return til_err!(
                ErrorCode::RecursionLimit,
                "too many nested evaluations (limit is {})",
                self.recursion_limit
            );
        }

        self.num_levels += 1;
        Ok(())
    }

    // Leaves a nested evaluation entered with `enter`.
    pub(crate) fn leave(&mut self) {
        self.num_levels -= 1;
    }

    //--------------------------------------------------------------------------------------------
    // Variable Handling

    /// Retrieves the value of the named variable, searching the scope and then its
    /// ancestors.  Fails with `UndefinedVariable` if no scope in the chain binds it.
    pub fn var(&self, scope: ScopeId, name: &str) -> TilResult {
        self.scopes.get(scope, name)
    }

    /// Retrieves the value of the named variable as an integer.  Fails with
    /// `UndefinedVariable` if it's unbound, or `TypeMismatch` if it holds Text that
    /// isn't an integer.
    ///
    /// ```
    /// use til::{ErrorCode, Interp};
    ///
    /// let mut interp = Interp::new();
    /// let scope = interp.create_scope("main", None);
    /// interp.eval(scope, "demo", "set n 42; set s hello");
    ///
    /// assert_eq!(interp.get_integer(scope, "n"), Ok(42));
    /// assert_eq!(interp.get_integer(scope, "s").unwrap_err().code(), ErrorCode::TypeMismatch);
    /// assert_eq!(interp.get_integer(scope, "x").unwrap_err().code(), ErrorCode::UndefinedVariable);
    /// ```
    pub fn get_integer(&self, scope: ScopeId, name: &str) -> Result<TilInt, Exception> {
        self.scopes.get_integer(scope, name)
    }

    /// Returns true if the named variable is visible from the scope.
    pub fn var_exists(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes.exists(scope, name)
    }

    /// Sets the named variable in the scope itself, creating it if necessary.  Parent
    /// scopes are never modified.
    pub fn set_var(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes.set(scope, name, value);
    }

    /// Sets the named variable as for [`set_var`](#method.set_var), returning the value.
    /// This is convenient for commands that return the assigned value.
    pub fn set_var_return(&mut self, scope: ScopeId, name: &str, value: Value) -> TilResult {
        self.set_var(scope, name, value.clone());
        Ok(value)
    }

    /// Removes the named variable from the scope itself, returning its value if it was
    /// bound there.
    pub fn unset_var(&mut self, scope: ScopeId, name: &str) -> Option<Value> {
        self.scopes.unset(scope, name)
    }

    /// The names of the variables bound in the scope itself, in the order they were
    /// first set.
    pub fn vars_in_scope(&self, scope: ScopeId) -> Vec<String> {
        self.scopes.vars_in_scope(scope)
    }

    /// The names of all variables visible from the scope.
    pub fn visible_vars(&self, scope: ScopeId) -> Vec<String> {
        self.scopes.visible_vars(scope)
    }

    //--------------------------------------------------------------------------------------------
    // Command Definition and Handling

    /// Adds a command defined by a [`CommandFunc`](../types/type.CommandFunc.html),
    /// replacing any existing command of the same name.
    pub fn add_command(&mut self, name: &str, func: CommandFunc) {
        self.commands
            .insert(name.into(), Rc::new(Command::Native(func)));
    }

    /// Adds a command defined by a closure, which may capture application data.
    ///
    /// ```
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use til::{Interp, Value};
    ///
    /// let mut interp = Interp::new();
    /// let scope = interp.create_scope("main", None);
    ///
    /// let count = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&count);
    /// interp.add_command_closure("tick", move |_, _, _| {
    ///     counter.set(counter.get() + 1);
    ///     Ok(Value::from(counter.get()))
    /// });
    ///
    /// assert_eq!(interp.eval(scope, "demo", "tick; tick; set n $(tick)"), 0);
    /// assert_eq!(count.get(), 3);
    /// assert_eq!(interp.get_integer(scope, "n"), Ok(3));
    /// ```
    #[cfg(feature = "closure-commands")]
    pub fn add_command_closure(
        &mut self,
        name: &str,
        func: impl Fn(&mut Interp, ScopeId, &[Value]) -> TilResult + 'static,
    ) {
        self.commands
            .insert(name.into(), Rc::new(Command::Closure(Box::new(func))));
    }

    /// Returns true if there's a command with the given name.
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Removes the named command, if it exists.
    pub fn remove_command(&mut self, name: &str) {
        self.commands.shift_remove(name);
    }

    /// The names of the defined commands, in the order they were added.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    //--------------------------------------------------------------------------------------------
    // Interpreter Configuration

    /// Gets the interpreter's recursion limit: how deeply evaluations may nest.
    ///
    /// ```
    /// # use til::Interp;
    /// let interp = Interp::new();
    /// assert_eq!(interp.recursion_limit(), 256);
    /// ```
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Sets the interpreter's recursion limit.  Nested `$( )` substitutions, nested
    /// parentheses in expressions, and re-entrant `eval` calls from commands all count
    /// against it; exceeding it is a `RecursionLimit` error.
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.recursion_limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: ErrorCode) -> i32 {
        code.status()
    }

    #[test]
    fn test_empty() {
        let interp = Interp::empty();
        // Interpreter is empty
        assert!(interp.command_names().is_empty());
    }

    #[test]
    fn test_new() {
        let interp = Interp::new();
        assert_eq!(interp.command_names(), vec!["incr", "set", "unset"]);
    }

    #[test]
    fn test_sample_program() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        let status = interp.eval(
            scope,
            "test program",
            "        set a 1\n        set b 2\n        set result $($a + $b)\n    ",
        );

        assert_eq!(status, 0);
        assert_eq!(interp.get_integer(scope, "result"), Ok(3));
        assert_eq!(interp.vars_in_scope(scope), vec!["a", "b", "result"]);
    }

    #[test]
    fn test_continued_sample_program() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        let status = interp.eval(
            scope,
            "test program",
            "set a 1\nset b 2\nset result \\\n    $($a + $b)\n",
        );

        assert_eq!(status, 0);
        assert_eq!(interp.get_integer(scope, "result"), Ok(3));
    }

    #[test]
    fn test_eval_result() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        assert_eq!(interp.eval_result(scope, "p", ""), Ok(Value::empty()));
        assert_eq!(interp.eval_result(scope, "p", "set a 1"), Ok(Value::from("1")));
        assert_eq!(
            interp.eval_result(scope, "p", "set a 1; set b $($a * 5)"),
            Ok(Value::from(5))
        );
    }

    #[test]
    fn test_error_statuses() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        let cases = [
            ("set r $(1 / 0)", ErrorCode::DivideByZero),
            ("set r $undefined_name", ErrorCode::UndefinedVariable),
            ("set r $($undefined_name + 1)", ErrorCode::UndefinedVariable),
            ("frobnicate 1 2", ErrorCode::UnknownCommand),
            ("set r", ErrorCode::Arity),
            ("set r \"abc", ErrorCode::Parse),
            ("set r $((1 + 2)", ErrorCode::Parse),
            ("set t abc; set r $($t + 1)", ErrorCode::TypeMismatch),
            ("set r $(9223372036854775807 * 2)", ErrorCode::Overflow),
        ];

        for (script, code) in &cases {
            assert_eq!(interp.eval(scope, "p", script), status(*code), "script: {}", script);
        }

        // None of the failing statements bound r.
        assert!(!interp.var_exists(scope, "r"));
    }

    #[test]
    fn test_stops_at_first_error() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        let status = interp.eval(scope, "p", "set a 1\nset b $(1 / 0)\nset c 3\nbogus");
        assert_eq!(status, ErrorCode::DivideByZero.status());

        // Earlier statements keep their effects; later ones never run.
        assert_eq!(interp.get_integer(scope, "a"), Ok(1));
        assert!(!interp.var_exists(scope, "b"));
        assert!(!interp.var_exists(scope, "c"));
    }

    #[test]
    fn test_parse_error_runs_nothing() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        let err = interp
            .eval_result(scope, "p", "set a 1\nset b \"oops")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);
        assert_eq!(err.error_info(), "missing \"\n    (program \"p\")");
        assert!(!interp.var_exists(scope, "a"));
    }

    #[test]
    fn test_error_info() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        let err = interp
            .eval_result(scope, "calc", "set a 1\n\nset r $(set q $(1 / 0))")
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DivideByZero);
        assert_eq!(
            err.error_info(),
            "divide by zero\n    while executing\n\"set q $(1 / 0)\"\n    invoked from within\n\"set r $(set q $(1 / 0))\"\n    (program \"calc\" line 3)"
        );
    }

    #[test]
    fn test_scope_isolation() {
        let mut interp = Interp::new();
        let parent = interp.create_scope("parent", None);
        let child = interp.create_scope("child", Some(parent));

        assert_eq!(interp.eval(parent, "p", "set x 10"), 0);
        assert_eq!(interp.get_integer(child, "x"), Ok(10));

        // The child shadows; the parent is untouched.
        assert_eq!(interp.eval(child, "c", "set x 20; set y $($x + 1)"), 0);
        assert_eq!(interp.get_integer(child, "x"), Ok(20));
        assert_eq!(interp.get_integer(parent, "x"), Ok(10));
        assert!(!interp.var_exists(parent, "y"));

        // A value already substituted into the child doesn't track the parent.
        assert_eq!(interp.eval(child, "c", "set z $($x * 1)"), 0);
        assert_eq!(interp.eval(parent, "p", "set x 99"), 0);
        assert_eq!(interp.get_integer(child, "z"), Ok(20));

        assert_eq!(interp.scope_name(child), "child");
        assert_eq!(interp.scope_parent(child), Some(parent));
        assert_eq!(interp.scope_parent(parent), None);
        assert_eq!(interp.visible_vars(child), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_child_reads_parent_in_expressions() {
        let mut interp = Interp::new();
        let parent = interp.create_scope("parent", None);
        let child = interp.create_scope("child", Some(parent));

        assert_eq!(interp.eval(parent, "p", "set base 100"), 0);
        assert_eq!(interp.eval(child, "c", "set total $($base + 5)"), 0);
        assert_eq!(interp.get_integer(child, "total"), Ok(105));
        assert!(!interp.var_exists(parent, "total"));
    }

    #[cfg(feature = "command-subst")]
    #[test]
    fn test_substituted_command_name_in_group() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        assert_eq!(interp.eval(scope, "p", "set cmd set"), 0);
        assert_eq!(interp.eval(scope, "p", "set r $($cmd q 7)"), 0);
        assert_eq!(interp.get_integer(scope, "q"), Ok(7));
        assert_eq!(interp.get_integer(scope, "r"), Ok(7));

        assert_eq!(interp.eval(scope, "p", "set t $(set s b\"c)"), 0);
        assert_eq!(interp.var(scope, "t"), Ok(Value::from("b\"c")));
    }

    #[test]
    fn test_unknown_command_after_substitution() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        assert_eq!(interp.eval(scope, "p", "set cmd set"), 0);
        assert_eq!(interp.eval(scope, "p", "$cmd a 5"), 0);
        assert_eq!(interp.get_integer(scope, "a"), Ok(5));

        let err = interp.eval_result(scope, "p", "$a 1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownCommand);
        assert_eq!(err.message(), "invalid command name \"5\"");
    }

    #[test]
    fn test_commands() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        interp.add_command("double", cmd_double);
        assert!(interp.has_command("double"));
        assert_eq!(interp.eval(scope, "p", "set d $(double 21)"), 0);
        assert_eq!(interp.get_integer(scope, "d"), Ok(42));

        interp.remove_command("double");
        assert!(!interp.has_command("double"));
        assert_eq!(
            interp.eval(scope, "p", "double 1"),
            ErrorCode::UnknownCommand.status()
        );

        // An empty interpreter knows nothing, not even set.
        let mut empty = Interp::empty();
        let scope = empty.create_scope("main", None);
        assert_eq!(empty.eval(scope, "p", "set a 1"), ErrorCode::UnknownCommand.status());
    }

    fn cmd_double(_: &mut Interp, _: ScopeId, argv: &[Value]) -> TilResult {
        check_args(1, argv, 2, 2, "value")?;
        Ok(Value::from(argv[1].as_int()? * 2))
    }

    #[cfg(feature = "closure-commands")]
    #[test]
    fn test_closure_reentrant_eval() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        // A command that evaluates its argument as a script, in the caller's scope.
        interp.add_command_closure("eval", |interp, scope, argv| {
            check_args(1, argv, 2, 2, "script")?;
            interp.eval_result(scope, "eval", &argv[1].as_str())
        });

        assert_eq!(interp.eval(scope, "p", "eval \"set a $(2 * 21)\""), 0);
        assert_eq!(interp.get_integer(scope, "a"), Ok(42));

        // A script that evaluates itself forever hits the recursion limit.
        interp.set_recursion_limit(20);
        assert_eq!(interp.eval(scope, "p", "set loop \"eval \\$loop\""), 0);
        assert_eq!(
            interp.eval(scope, "p", "eval $loop"),
            ErrorCode::RecursionLimit.status()
        );

        // And the interpreter is usable afterwards.
        assert_eq!(interp.eval(scope, "p", "set b 1"), 0);
    }

    #[test]
    fn test_expr() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);
        interp.set_var(scope, "a", Value::from("6"));

        assert_eq!(interp.expr(scope, "2 + 3 * 4"), Ok(14));
        assert_eq!(interp.expr(scope, "$a / 4"), Ok(1));
        assert_eq!(
            interp.expr(scope, "$a +").unwrap_err().code(),
            ErrorCode::Parse
        );
    }

    #[test]
    fn test_recursion_limit() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("main", None);

        assert_eq!(interp.recursion_limit(), DEFAULT_RECURSION_LIMIT);
        interp.set_recursion_limit(4);
        assert_eq!(interp.recursion_limit(), 4);

        // The top-level eval counts as one level.
        assert_eq!(interp.eval(scope, "p", "set a $($($(1)))"), 0);
        assert_eq!(
            interp.eval(scope, "p", "set a $($($($(1))))"),
            ErrorCode::RecursionLimit.status()
        );
    }

    #[test]
    fn test_complete() {
        let interp = Interp::new();

        assert!(interp.complete("abc"));
        assert!(interp.complete("set a \"b c\" $(1 + 2)"));

        assert!(!interp.complete("set a \"bc"));
        assert!(!interp.complete("set a $(1 + 2"));
        assert!(!interp.complete("set a \\"));
        assert!(!interp.complete("set r $(set s \"b)"));

        // Malformed but finished input is complete, so that it gets evaluated and
        // reported instead of waiting for more lines.
        assert!(interp.complete("set a \"x\"y"));
        assert!(interp.complete("set a \"x\"y\nmore\nlines"));
        assert!(interp.complete("set r $(1 +)"));
    }
}
