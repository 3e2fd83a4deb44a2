//! Variable Scope Store
//!
//! Til variables live in named scopes.  A scope may have a parent; looking up a name
//! searches the scope itself and then its ancestors, and the first binding found wins.
//! Setting a variable always writes the scope it's invoked on, never an ancestor, so a
//! child can shadow but never mutate its parent.
//!
//! Scopes are kept in an arena owned by the [`ScopeStore`] and addressed by
//! [`ScopeId`] handles.  A child records its parent's handle rather than a reference,
//! and since a parent must exist before a child can name it, the chain can never
//! contain a cycle.
//!
//! Values are copied in and out of scopes: a value substituted into a statement
//! doesn't change when the variable it came from is later reset.

use crate::til_err;
use crate::types::*;
use indexmap::IndexMap;

/// An opaque, stable handle to a scope in a [`ScopeStore`].
///
/// Handles are only created by the store and remain valid for the store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The handle's index in its store, for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single scope: a name, an optional parent, and the local variable bindings in
/// insertion order.
#[derive(Debug)]
struct Scope {
    name: String,
    parent: Option<ScopeId>,
    vars: IndexMap<String, Value, TilHasher>,
}

/// The arena of all scopes created by an interpreter.
#[derive(Debug, Default)]
pub struct ScopeStore {
    scopes: Vec<Scope>,
}

impl ScopeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Creates a new scope, linked to `parent` for lookups if one is given.
    ///
    /// # Panics
    ///
    /// Panics if `parent` isn't a handle from this store.
    pub fn create(&mut self, name: &str, parent: Option<ScopeId>) -> ScopeId {
        if let Some(parent) = parent {
            assert!(parent.0 < self.scopes.len(), "invalid parent scope");
        }

        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            parent,
            vars: IndexMap::default(),
        });
        id
    }

    /// The number of scopes in the store.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns true if no scope has been created.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The scope's diagnostic name.
    pub fn name(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.0].name
    }

    /// The scope's parent, if any.
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Binds `name` to `value` in `scope` itself, replacing any existing local binding.
    pub fn set(&mut self, scope: ScopeId, name: &str, value: Value) {
        let vars = &mut self.scopes[scope.0].vars;

        if let Some(slot) = vars.get_mut(name) {
            *slot = value;
        } else {
            vars.insert(name.into(), value);
        }
    }

    /// Looks `name` up in `scope` and then its ancestors.
    pub fn get(&self, scope: ScopeId, name: &str) -> TilResult {
        match self.lookup(scope, name) {
            Some(value) => Ok(value.clone()),
            None => til_err!(
                ErrorCode::UndefinedVariable,
                "can't read \"{}\": no such variable",
                name
            ),
        }
    }

    /// Looks `name` up as for [`get`](#method.get), and coerces the value to an integer.
    pub fn get_integer(&self, scope: ScopeId, name: &str) -> Result<TilInt, Exception> {
        match self.lookup(scope, name) {
            Some(value) => value.as_int().map_err(|_| {
                Exception::new(
                    ErrorCode::TypeMismatch,
                    format!(
                        "can't use \"{}\" as integer: variable \"{}\" is not an integer",
                        value, name
                    ),
                )
            }),
            None => til_err!(
                ErrorCode::UndefinedVariable,
                "can't read \"{}\": no such variable",
                name
            ),
        }
    }

    /// Returns true if `name` is bound anywhere in the scope chain.
    pub fn exists(&self, scope: ScopeId, name: &str) -> bool {
        self.lookup(scope, name).is_some()
    }

    /// Removes the local binding of `name` in `scope`, returning the old value if there
    /// was one.  Ancestors are untouched.
    pub fn unset(&mut self, scope: ScopeId, name: &str) -> Option<Value> {
        self.scopes[scope.0].vars.shift_remove(name)
    }

    /// The names bound locally in `scope`, in the order they were first set.
    pub fn vars_in_scope(&self, scope: ScopeId) -> Vec<String> {
        self.scopes[scope.0].vars.keys().cloned().collect()
    }

    /// The names visible from `scope`: its own, then its ancestors', without duplicates.
    pub fn visible_vars(&self, scope: ScopeId) -> Vec<String> {
        let mut names: IndexMap<&str, (), TilHasher> = IndexMap::default();

        for id in self.chain(scope) {
            for name in self.scopes[id.0].vars.keys() {
                names.entry(name.as_str()).or_insert(());
            }
        }

        names.keys().map(|name| name.to_string()).collect()
    }

    fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        self.chain(scope)
            .find_map(|id| self.scopes[id.0].vars.get(name))
    }

    // Iterates over `scope` and its ancestors, innermost first.
    fn chain(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |id| self.scopes[id.0].parent)
    }
}
