use crate::{error::BlackboardError, Symbol};
use std::{
    any::{type_name, Any},
    collections::HashMap,
    fmt,
};

/// A named, typed value cell stored in a [`Blackboard`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable<T> {
    name: Symbol,
    pub value: T,
}

impl<T> Variable<T> {
    pub fn new(name: impl Into<Symbol>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> Symbol {
        self.name
    }
}

struct Slot {
    type_name: &'static str,
    /// Always a `Variable<T>` where `T` is the type named by `type_name`.
    variable: Box<dyn Any>,
}

/// Blackboard is a mapping of variable names to values of any `'static` type.
///
/// Each name holds exactly one type at a time. Setting a name again with a
/// different type replaces the slot, and typed reads against the old type
/// then come back empty instead of coercing.
///
/// There is no locking inside. A blackboard shared by trees on several
/// threads has to be wrapped by the caller.
#[derive(Default)]
pub struct Blackboard {
    variables: HashMap<Symbol, Slot>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a variable.
    pub fn set<T: 'static>(&mut self, key: impl Into<Symbol>, value: T) {
        self.set_variable(Variable::new(key, value));
    }

    pub fn set_variable<T: 'static>(&mut self, variable: Variable<T>) {
        self.variables.insert(
            variable.name,
            Slot {
                type_name: type_name::<T>(),
                variable: Box::new(variable),
            },
        );
    }

    /// Typed read. Both a missing key and a type mismatch yield `None`; the
    /// latter is also reported as a warning.
    pub fn try_get<T: 'static>(&self, key: impl Into<Symbol>) -> Option<&T> {
        match self.lookup(key) {
            Ok(value) => Some(value),
            Err(BlackboardError::Missing(_)) => None,
            Err(BlackboardError::TypeMismatch {
                key,
                expected,
                found,
            }) => {
                tracing::warn!(%key, expected, found, "blackboard type mismatch");
                None
            }
        }
    }

    /// Typed read that tells a missing key apart from a type mismatch.
    pub fn lookup<T: 'static>(&self, key: impl Into<Symbol>) -> Result<&T, BlackboardError> {
        let key = key.into();
        let slot = self
            .variables
            .get(&key)
            .ok_or_else(|| BlackboardError::Missing(key.to_string()))?;
        slot.variable
            .downcast_ref::<Variable<T>>()
            .map(|variable| &variable.value)
            .ok_or_else(|| BlackboardError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
                found: slot.type_name,
            })
    }

    pub fn get_variable<T: 'static>(&self, key: impl Into<Symbol>) -> Option<&Variable<T>> {
        self.variables
            .get(&key.into())
            .and_then(|slot| slot.variable.downcast_ref())
    }

    pub fn get_variable_mut<T: 'static>(
        &mut self,
        key: impl Into<Symbol>,
    ) -> Option<&mut Variable<T>> {
        self.variables
            .get_mut(&key.into())
            .and_then(|slot| slot.variable.downcast_mut())
    }

    pub fn contains(&self, key: impl Into<Symbol>) -> bool {
        self.variables.contains_key(&key.into())
    }

    pub fn remove(&mut self, key: impl Into<Symbol>) -> bool {
        self.variables.remove(&key.into()).is_some()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Names and stored type names of every variable, in no particular order.
    pub fn variables(&self) -> impl Iterator<Item = (Symbol, &'static str)> + '_ {
        self.variables
            .iter()
            .map(|(name, slot)| (*name, slot.type_name))
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.variables()).finish()
    }
}
