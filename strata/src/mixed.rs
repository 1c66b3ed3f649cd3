//! Deep reads and copy-on-write updates over mixed trees.
//!
//! A state tree is plain on the outside and may become persistent further
//! in. Every operation first locates that boundary, then uses plain
//! shallow-cloning for the outer region and the collection adapter's
//! structural sharing for the inner one, so that untouched siblings keep
//! their identity and shallow-comparison render skipping stays effective.

use std::{collections::HashMap, rc::Rc};

use strata_common::Data;

use crate::{
    path::{Key, Path},
    persistent,
    value::Value,
};

/// A path split at the plain/persistent boundary of a particular tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary<'a> {
    /// Prefix traversing plain containers, starting at the root.
    pub mutable: &'a [Key],
    /// Remainder, starting at the first persistent value encountered.
    pub immutable: &'a [Key],
}

/// Walks `path` from `root` and splits it at the first persistent value.
///
/// The check happens before descending each key, so the key addressing into
/// the persistent container is the first immutable key. Missing values along
/// the way count as plain. If the walk never meets a persistent value the
/// immutable part is empty.
///
/// The plain prefix is assumed to come first: a persistent collection nested
/// in plain containers is supported, but a plain container nested deeper
/// inside a persistent region is not detected again. Callers relying on that
/// shape get adapter semantics for everything past the boundary.
pub fn split<'a>(root: &Value, path: &'a [Key]) -> Boundary<'a> {
    let mut cur = Some(root);
    for (i, key) in path.iter().enumerate() {
        match cur {
            Some(v) if v.is_persistent() => {
                return Boundary {
                    mutable: &path[..i],
                    immutable: &path[i..],
                };
            }
            _ => cur = cur.and_then(|v| v.child(key)),
        }
    }
    Boundary {
        mutable: path,
        immutable: &[],
    }
}

/// Reads the value at `path`. Missing steps yield `None`, never an error;
/// the empty path yields the root itself.
pub fn get(root: &Value, path: impl Into<Path>) -> Option<Value> {
    let path = path.into();
    let boundary = split(root, &path);
    let base = get_plain(root, boundary.mutable)?;
    if boundary.immutable.is_empty() {
        Some(base.clone())
    } else {
        persistent::get_in(base, boundary.immutable)
    }
}

/// Writes `value` at `path`, returning the new root.
///
/// If the current value is already the same, the root is returned untouched
/// (same identity), so no dependent comparison upstream sees a change.
/// Otherwise every plain ancestor along the path is shallow-cloned, the
/// persistent suffix (if any) is updated through the adapter, and untouched
/// siblings keep their identity. Missing or scalar intermediates on the
/// plain prefix are replaced by a fresh container chosen by the next key;
/// list writes past the end pad with `Null`.
pub fn set(root: &Value, path: impl Into<Path>, value: Value) -> Value {
    let path = path.into();
    let boundary = split(root, &path);
    let base = get_plain(root, boundary.mutable);

    let current = match base {
        Some(base) if boundary.immutable.is_empty() => Some(base.clone()),
        Some(base) => persistent::get_in(base, boundary.immutable),
        None => None,
    };
    if let Some(current) = &current {
        if current.same(&value) {
            return root.clone();
        }
    }

    let to_set = if boundary.immutable.is_empty() {
        value
    } else {
        // the boundary only forms at a value the walk has actually seen
        let base = base.cloned().unwrap_or(Value::Null);
        persistent::set_in(&base, boundary.immutable, value)
    };

    if boundary.mutable.is_empty() {
        to_set
    } else {
        set_plain(Some(root), boundary.mutable, to_set)
    }
}

/// Removes the value at `path`, returning the new root.
///
/// A deletion point inside the persistent region goes through the adapter
/// and the result is written back along the plain prefix like a `set`. A
/// deletion point in the plain region splices lists and removes map keys.
/// The empty path returns the root untouched.
pub fn delete(root: &Value, path: impl Into<Path>) -> Value {
    let path = path.into();
    if path.is_empty() {
        return root.clone();
    }
    let boundary = split(root, &path);
    if boundary.immutable.is_empty() {
        return delete_plain(Some(root), &path);
    }
    let base = get_plain(root, boundary.mutable).cloned().unwrap_or(Value::Null);
    let to_set = persistent::remove_in(&base, boundary.immutable);
    if boundary.mutable.is_empty() {
        to_set
    } else {
        set_plain(Some(root), boundary.mutable, to_set)
    }
}

fn get_plain<'a>(root: &'a Value, keys: &[Key]) -> Option<&'a Value> {
    let mut cur = root;
    for key in keys {
        cur = cur.child(key)?;
    }
    Some(cur)
}

fn set_plain(cur: Option<&Value>, keys: &[Key], to_set: Value) -> Value {
    let Some((key, rest)) = keys.split_first() else {
        return to_set;
    };
    let child = cur.and_then(|c| c.child(key));
    store_plain(cur, key, set_plain(child, rest, to_set))
}

fn delete_plain(cur: Option<&Value>, keys: &[Key]) -> Value {
    match keys.split_first() {
        None => cur.cloned().unwrap_or(Value::Null),
        Some((key, rest)) if rest.is_empty() => remove_plain(cur, key),
        Some((key, rest)) => {
            let child = cur.and_then(|c| c.child(key));
            store_plain(cur, key, delete_plain(child, rest))
        }
    }
}

/// Shallow-clones `cur` with `child` stored at `key`. Untouched entries are
/// carried over as handles, so they keep their identity in the clone.
fn store_plain(cur: Option<&Value>, key: &Key, child: Value) -> Value {
    match (cur, key) {
        (Some(Value::Map(m)), key) => {
            let mut m = (**m).clone();
            m.insert(key.as_field(), child);
            Value::Map(Rc::new(m))
        }
        (Some(Value::List(l)), key) if key.as_index().is_some() => {
            let i = key.as_index().unwrap();
            let mut l = (**l).clone();
            if i < l.len() {
                l[i] = child;
            } else {
                l.resize(i, Value::Null);
                l.push(child);
            }
            Value::List(Rc::new(l))
        }
        // missing or mismatched intermediates become a fresh container
        (_, Key::Index(i)) => {
            let mut l = vec![Value::Null; *i];
            l.push(child);
            Value::List(Rc::new(l))
        }
        (_, key) => {
            let mut m = HashMap::new();
            m.insert(key.as_field(), child);
            Value::Map(Rc::new(m))
        }
    }
}

/// Shallow-clones `cur` with `key` removed: lists splice (later elements
/// shift down), maps drop the entry without reindexing anything.
fn remove_plain(cur: Option<&Value>, key: &Key) -> Value {
    match (cur, key) {
        (Some(Value::Map(m)), key) => {
            let mut m = (**m).clone();
            m.remove(&*key.as_field());
            Value::Map(Rc::new(m))
        }
        (Some(Value::List(l)), key) => {
            let mut l = (**l).clone();
            if let Some(i) = key.as_index().filter(|i| *i < l.len()) {
                l.remove(i);
            }
            Value::List(Rc::new(l))
        }
        // nothing to delete; repair the missing container anyway
        (_, Key::Index(_)) => Value::List(Rc::new(Vec::new())),
        (_, _) => Value::Map(Rc::new(HashMap::new())),
    }
}
