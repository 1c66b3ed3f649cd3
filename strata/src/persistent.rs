//! Adapter over the persistent-collection backend.
//!
//! Every contact with the backing persistent containers lives here, behind
//! the capability surface the rest of the engine uses: the persistence
//! predicate and deep get/set/remove by path. Derived versions share all
//! untouched substructure with their input and inputs are never mutated.

use strata_common::{imbl, Data};

use crate::{path::Key, value::Value};

impl Value {
    /// Whether this value is a persistent (structurally shared) container.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Value::PersistentList(_) | Value::PersistentMap(_))
    }
}

/// Resolves `keys` inside a persistent value. `None` for anything missing,
/// including descents that would pass through a non-persistent interior
/// value (the walk does not re-enter plain containers past the boundary).
pub(crate) fn get_in(value: &Value, keys: &[Key]) -> Option<Value> {
    let Some((key, rest)) = keys.split_first() else {
        return Some(value.clone());
    };
    if !value.is_persistent() {
        return None;
    }
    get_in(value.child(key)?, rest)
}

/// Sets `keys` to `new_value` inside a persistent value, returning the new
/// version. Missing interior keys are created as persistent containers
/// chosen by the following key; a non-persistent interior value on the way
/// down is replaced the same way. Lists pad with `Null` up to a
/// past-the-end index.
pub(crate) fn set_in(value: &Value, keys: &[Key], new_value: Value) -> Value {
    let Some((key, rest)) = keys.split_first() else {
        return new_value;
    };
    let existing = if value.is_persistent() { value.child(key) } else { None };
    let child = match existing {
        Some(cur) => set_in(cur, rest, new_value),
        None if rest.is_empty() => new_value,
        None => set_in(&empty_for(&rest[0]), rest, new_value),
    };
    store(value, key, child)
}

/// Removes `keys` from a persistent value, returning the new version, or
/// the input version unchanged when the path does not resolve.
pub(crate) fn remove_in(value: &Value, keys: &[Key]) -> Value {
    let Some((key, rest)) = keys.split_first() else {
        return value.clone();
    };
    if rest.is_empty() {
        return match value {
            Value::PersistentMap(m) => {
                let f = key.as_field();
                if m.contains_key(&*f) {
                    Value::PersistentMap(m.without(&*f))
                } else {
                    value.clone()
                }
            }
            Value::PersistentList(l) => match key.as_index() {
                Some(i) if i < l.len() => {
                    let mut l = l.clone();
                    l.remove(i);
                    Value::PersistentList(l)
                }
                _ => value.clone(),
            },
            _ => value.clone(),
        };
    }
    match value.child(key) {
        Some(child) if value.is_persistent() => {
            let new_child = remove_in(child, rest);
            if new_child.same(child) {
                value.clone()
            } else {
                store(value, key, new_child)
            }
        }
        _ => value.clone(),
    }
}

fn empty_for(key: &Key) -> Value {
    match key {
        Key::Field(_) => Value::PersistentMap(imbl::HashMap::new()),
        Key::Index(_) => Value::PersistentList(imbl::Vector::new()),
    }
}

fn store(value: &Value, key: &Key, child: Value) -> Value {
    match (value, key) {
        (Value::PersistentMap(m), key) => Value::PersistentMap(m.update(key.as_field(), child)),
        (Value::PersistentList(l), key) if key.as_index().is_some() => {
            let i = key.as_index().unwrap();
            let mut l = l.clone();
            if i < l.len() {
                l.set(i, child);
            } else {
                while l.len() < i {
                    l.push_back(Value::Null);
                }
                l.push_back(child);
            }
            Value::PersistentList(l)
        }
        // a fresh container replaces whatever was here
        (_, Key::Index(i)) => {
            let mut l = imbl::Vector::new();
            for _ in 0..*i {
                l.push_back(Value::Null);
            }
            l.push_back(child);
            Value::PersistentList(l)
        }
        (_, key) => Value::PersistentMap(imbl::HashMap::unit(key.as_field(), child)),
    }
}
