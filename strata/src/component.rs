//! The UI-framework collaborator surface and the owner handle.

use std::{cell::RefCell, rc::Rc};

use fnv::FnvHashMap;
use strata_common::Data;
use tracing::trace;

use crate::{
    handler::{Handler, HandlerKey},
    value::Value,
};

/// What the engine needs from a component instance. The framework owns the
/// instance and decides when anything re-renders; the engine only reads the
/// current trees synchronously and hands new values back.
pub trait Component: 'static {
    /// The current state tree.
    fn state(&self) -> &Value;

    /// Replaces the state reference without scheduling anything. Composite
    /// dispatch uses this to stage intermediate states and to restore the
    /// pre-dispatch reference before the one real commit.
    fn set_state(&mut self, state: Value);

    /// Hands new state to the framework for commit. `changes` holds the
    /// top-level entries that changed (or a complete non-map state); the
    /// framework merges them in and schedules re-evaluation of dependents.
    fn commit(&mut self, changes: Value);

    /// The current props tree.
    fn props(&self) -> &Value;

    /// Invokes the named prop-update callback with a new value, reporting a
    /// prop change upward instead of writing state.
    fn call_prop(&mut self, name: &str, value: Value);
}

/// Shared handle to a component instance, plus the cache of handlers
/// synthesized on its behalf.
///
/// Cache entries live for the owner's lifetime and are never evicted, so a
/// component that keeps requesting handlers for an unbounded family of
/// paths (say, keyed by an ever-growing collection) grows its cache without
/// bound; dropping the owner releases everything at once.
pub struct Owner<C: Component> {
    component: Rc<RefCell<C>>,
    cache: Rc<RefCell<FnvHashMap<HandlerKey, Handler>>>,
}

impl<C: Component> Clone for Owner<C> {
    fn clone(&self) -> Self {
        Owner {
            component: self.component.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<C: Component> Owner<C> {
    pub fn new(component: C) -> Owner<C> {
        Owner {
            component: Rc::new(RefCell::new(component)),
            cache: Rc::new(RefCell::new(FnvHashMap::default())),
        }
    }

    pub fn component(&self) -> &Rc<RefCell<C>> {
        &self.component
    }

    /// A clone of the current state tree.
    pub fn state(&self) -> Value {
        self.component.borrow().state().clone()
    }

    /// Number of handlers cached so far.
    pub fn cached_handlers(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Returns the handler cached under `key`, synthesizing it with `build`
    /// on the first request. Equal keys always resolve to the identical
    /// callable for this owner's lifetime, so function-identity comparisons
    /// downstream keep working across repeated renders.
    pub fn memoize(&self, key: HandlerKey, build: impl FnOnce() -> Handler) -> Handler {
        if let Some(handler) = self.cache.borrow().get(&key) {
            return handler.clone();
        }
        trace!(?key, "synthesizing handler");
        let handler = build();
        self.cache.borrow_mut().insert(key, handler.clone());
        handler
    }
}

/// The top-level entries of `new` that are not the same in `old`, which is
/// the partial state a commit hands to the framework. Non-map states pass
/// through whole.
pub fn changed_keys(old: &Value, new: &Value) -> Value {
    match (old, new) {
        (Value::Map(old), Value::Map(new)) => Value::map(
            new.iter()
                .filter(|(key, value)| old.get(*key).map_or(true, |prev| !prev.same(value)))
                .map(|(key, value)| (key.clone(), value.clone())),
        ),
        _ => new.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_keys_is_minimal() {
        let old = Value::map([
            ("a", Value::from(1)),
            ("b", Value::from("x")),
            ("c", Value::list([Value::from(1)])),
        ]);
        let same_c = crate::mixed::get(&old, "c").unwrap();
        let new = Value::map([
            ("a", Value::from(2)),
            ("b", Value::from("x")),
            ("c", same_c),
        ]);
        let changes = changed_keys(&old, &new);
        assert_eq!(changes, Value::map([("a", Value::from(2))]));
    }

    #[test]
    fn changed_keys_passes_non_maps_through() {
        let old = Value::map([("a", Value::from(1))]);
        let new = Value::from(5);
        assert_eq!(changed_keys(&old, &new), Value::from(5));
    }
}
