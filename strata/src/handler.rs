//! Synthesized event handlers, memoized per owner.
//!
//! UI code asks its [`Owner`](crate::Owner) for small callables ("set this
//! field from the input's value", "toggle that flag") on every render pass.
//! Each request is described by a [`HandlerKey`]; equal descriptions resolve
//! to the identical [`Handler`] instance from the owner's cache, so
//! downstream identity comparisons keep skipping work. The value step of
//! every handler is a pure [`Transform`]; the commit step goes through the
//! component's normal pathway with only the changed top-level entries.

use std::{fmt, rc::Rc, sync::Arc};

use strata_common::Data;
use tracing::warn;

use crate::{
    component::{changed_keys, Component, Owner},
    event::Event,
    mixed,
    path::Path,
    value::Value,
};

/// A pure step from the current value (and the triggering event) to the new
/// value. Committing the result is the handler's job, never the transform's.
#[derive(Clone)]
pub enum Transform {
    /// The event payload, as-is.
    FromEvent,
    /// The event payload coerced to a number; non-numeric input becomes
    /// `Null`.
    NumberFromEvent,
    /// A constant fixed when the handler is synthesized.
    Constant(Value),
    /// Negation of the current value's truthiness.
    Negate,
    /// The constant, unless the current value already is it, then `Null`.
    ToggleConstant(Value),
    /// The event payload, unless the current value already is it, then
    /// `Null`.
    SetOrNull,
    /// The current value with a key removed from inside it.
    Remove(Path),
    /// A caller-supplied transform. `key` discriminates cache entries among
    /// custom transforms, so two different functions must not share one.
    Custom {
        key: Arc<str>,
        f: Rc<dyn Fn(Option<&Value>, &Event) -> Value>,
    },
}

impl Transform {
    pub fn apply(&self, current: Option<&Value>, event: &Event) -> Value {
        match self {
            Transform::FromEvent => event.value().cloned().unwrap_or(Value::Null),
            Transform::NumberFromEvent => match event.value() {
                Some(Value::Number(n)) if !n.is_nan() => Value::Number(*n),
                Some(Value::String(s)) => match s.trim().parse::<f64>() {
                    Ok(n) if !n.is_nan() => Value::Number(n),
                    _ => Value::Null,
                },
                _ => Value::Null,
            },
            Transform::Constant(value) => value.clone(),
            Transform::Negate => Value::Bool(!current.map_or(false, Value::is_truthy)),
            Transform::ToggleConstant(value) => {
                if current.map_or(false, |c| c.same(value)) {
                    Value::Null
                } else {
                    value.clone()
                }
            }
            Transform::SetOrNull => {
                let value = event.value().cloned().unwrap_or(Value::Null);
                if current.map_or(false, |c| c.same(&value)) {
                    Value::Null
                } else {
                    value
                }
            }
            Transform::Remove(path) => match current {
                Some(value) => mixed::delete(value, path.clone()),
                None => Value::Null,
            },
            Transform::Custom { f, .. } => f(current, event),
        }
    }

    pub(crate) fn key(&self) -> TransformKey {
        match self {
            Transform::FromEvent => TransformKey::FromEvent,
            Transform::NumberFromEvent => TransformKey::NumberFromEvent,
            Transform::Constant(value) => TransformKey::Constant(value.cache_key()),
            Transform::Negate => TransformKey::Negate,
            Transform::ToggleConstant(value) => TransformKey::ToggleConstant(value.cache_key()),
            Transform::SetOrNull => TransformKey::SetOrNull,
            Transform::Remove(path) => TransformKey::Remove(path.clone()),
            Transform::Custom { key, .. } => TransformKey::Custom(key.clone()),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.key().fmt(f)
    }
}

/// Cache-key form of a [`Transform`]: bound constants enter through their
/// canonical order-stable rendering, custom transforms through their
/// explicit key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransformKey {
    FromEvent,
    NumberFromEvent,
    Constant(String),
    Negate,
    ToggleConstant(String),
    SetOrNull,
    Remove(Path),
    Custom(Arc<str>),
}

/// Serialized description of a handler request; the memoization cache key.
/// Two requests with equal keys are the same request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    /// Change the owner's state at `path`.
    State {
        path: Path,
        transform: TransformKey,
        prevent_default: bool,
    },
    /// Change a value inside the prop at `prop` and report it through the
    /// `func` callback.
    Prop {
        func: Arc<str>,
        prop: Path,
        index: Path,
        transform: TransformKey,
        prevent_default: bool,
    },
    /// Run the listed handlers as one dispatch.
    Sequence {
        parts: Vec<HandlerKey>,
        prevent_default: bool,
    },
}

/// Whether a handler pushes its result through the owner's commit pathway
/// itself or leaves that to an enclosing composite dispatch.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commit {
    Now,
    Deferred,
}

type RunFn = Box<dyn Fn(&Event, Commit) -> Option<Value>>;

struct HandlerInner {
    key: HandlerKey,
    prevent_default: bool,
    run: RunFn,
}

/// A memoized event callable. Cloning is cheap and preserves identity;
/// [`Handler::same`] is what consumers compare to decide whether they are
/// looking at the callable they already subscribed.
#[derive(Clone)]
pub struct Handler(Rc<HandlerInner>);

impl Handler {
    pub(crate) fn new(key: HandlerKey, prevent_default: bool, run: RunFn) -> Handler {
        Handler(Rc::new(HandlerInner {
            key,
            prevent_default,
            run,
        }))
    }

    /// The descriptor this handler was synthesized for.
    pub fn key(&self) -> &HandlerKey {
        &self.0.key
    }

    /// Invokes the handler. When the handler was requested with
    /// default-prevention, the event's default action is suppressed and its
    /// propagation stopped before any value computation happens. Returns
    /// the full new state tree for state-targeting handlers, `None` for
    /// prop-targeting ones (their result travels through the prop
    /// callback) and after the owning component is gone.
    pub fn call(&self, event: &Event) -> Option<Value> {
        self.invoke(event, Commit::Now)
    }

    pub(crate) fn invoke(&self, event: &Event, commit: Commit) -> Option<Value> {
        if self.0.prevent_default {
            event.prevent_default_and_blur();
        }
        (self.0.run)(event, commit)
    }

    /// Identity comparison: `true` exactly when both handles came from the
    /// same synthesis.
    pub fn same(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Handler").field("key", &self.0.key).finish_non_exhaustive()
    }
}

impl<C: Component> Owner<C> {
    /// Synthesizes (or returns the cached) handler that rewrites the state
    /// at `path` through `transform` and commits the changed entries.
    pub fn change_state(&self, path: impl Into<Path>, transform: Transform, prevent_default: bool) -> Handler {
        let path = path.into();
        let key = HandlerKey::State {
            path: path.clone(),
            transform: transform.key(),
            prevent_default,
        };
        self.memoize(key.clone(), || {
            let component = Rc::downgrade(self.component());
            Handler::new(
                key,
                prevent_default,
                Box::new(move |event, commit| {
                    let Some(component) = component.upgrade() else {
                        warn!("state handler invoked after its owner was dropped");
                        return None;
                    };
                    let state = component.borrow().state().clone();
                    let current = mixed::get(&state, path.clone());
                    let new_value = transform.apply(current.as_ref(), event);
                    let new_state = mixed::set(&state, path.clone(), new_value);
                    if let Commit::Now = commit {
                        component.borrow_mut().commit(changed_keys(&state, &new_state));
                    }
                    Some(new_state)
                }),
            )
        })
    }

    /// Synthesizes (or returns the cached) handler that rewrites the value
    /// at `index` inside the prop at `prop` through `transform` and reports
    /// the new prop value through the `func` callback. An empty `index`
    /// transforms the prop value as a whole; an empty `prop` addresses the
    /// whole props tree.
    pub fn change_prop(
        &self,
        func: &str,
        prop: impl Into<Path>,
        index: impl Into<Path>,
        transform: Transform,
        prevent_default: bool,
    ) -> Handler {
        let func: Arc<str> = func.into();
        let prop = prop.into();
        let index = index.into();
        let key = HandlerKey::Prop {
            func: func.clone(),
            prop: prop.clone(),
            index: index.clone(),
            transform: transform.key(),
            prevent_default,
        };
        self.memoize(key.clone(), || {
            let component = Rc::downgrade(self.component());
            Handler::new(
                key,
                prevent_default,
                Box::new(move |event, _commit| {
                    let Some(component) = component.upgrade() else {
                        warn!("prop handler invoked after its owner was dropped");
                        return None;
                    };
                    let props = component.borrow().props().clone();
                    let prop_value = mixed::get(&props, prop.clone());
                    let current = prop_value.as_ref().and_then(|p| mixed::get(p, index.clone()));
                    let new_value = transform.apply(current.as_ref(), event);
                    let new_prop = mixed::set(prop_value.as_ref().unwrap_or(&Value::Null), index.clone(), new_value);
                    component.borrow_mut().call_prop(&func, new_prop);
                    None
                }),
            )
        })
    }

    /// Handler that flips the truthiness of the state at `path`.
    pub fn toggle(&self, path: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_state(path, Transform::Negate, prevent_default)
    }

    /// Handler that sets the state at `path` to `value`, or back to `Null`
    /// when it already is `value` (accordion-style selection).
    pub fn toggle_value(&self, path: impl Into<Path>, value: impl Into<Value>, prevent_default: bool) -> Handler {
        self.change_state(path, Transform::ToggleConstant(value.into()), prevent_default)
    }

    /// Handler that sets the state at `path` from the event payload, or
    /// back to `Null` when it already carries that payload.
    pub fn toggle_from_event(&self, path: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_state(path, Transform::SetOrNull, prevent_default)
    }

    /// Handler that sets the state at `path` from the event payload; the
    /// usual controlled-input handler.
    pub fn update(&self, path: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_state(path, Transform::FromEvent, prevent_default)
    }

    /// Like [`update`](Owner::update), with the payload coerced to a number
    /// (`Null` for non-numeric input).
    pub fn update_number(&self, path: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_state(path, Transform::NumberFromEvent, prevent_default)
    }

    /// Handler that sets the state at `path` to a constant.
    pub fn set_state(&self, path: impl Into<Path>, value: impl Into<Value>, prevent_default: bool) -> Handler {
        self.change_state(path, Transform::Constant(value.into()), prevent_default)
    }

    /// Handler that deletes the state at `path`. The leading key selects
    /// the top-level entry, the rest is removed inside it, so a one-key
    /// path leaves the tree unchanged (a removed top-level entry would be
    /// invisible to a partial commit).
    pub fn delete_state(&self, path: impl Into<Path>, prevent_default: bool) -> Handler {
        let path = path.into();
        match path.split_first() {
            Some((head, rest)) => self.change_state(Path::from(head.clone()), Transform::Remove(rest), prevent_default),
            None => self.change_state(Path::root(), Transform::Remove(Path::root()), prevent_default),
        }
    }

    /// Prop counterpart of [`update`](Owner::update).
    pub fn set_prop(&self, func: &str, prop: impl Into<Path>, index: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_prop(func, prop, index, Transform::FromEvent, prevent_default)
    }

    /// Prop counterpart of [`update_number`](Owner::update_number).
    pub fn set_prop_number(
        &self,
        func: &str,
        prop: impl Into<Path>,
        index: impl Into<Path>,
        prevent_default: bool,
    ) -> Handler {
        self.change_prop(func, prop, index, Transform::NumberFromEvent, prevent_default)
    }

    /// Prop counterpart of [`set_state`](Owner::set_state).
    pub fn set_prop_value(
        &self,
        func: &str,
        prop: impl Into<Path>,
        index: impl Into<Path>,
        value: impl Into<Value>,
        prevent_default: bool,
    ) -> Handler {
        self.change_prop(func, prop, index, Transform::Constant(value.into()), prevent_default)
    }

    /// Prop counterpart of [`toggle`](Owner::toggle).
    pub fn toggle_prop(&self, func: &str, prop: impl Into<Path>, index: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_prop(func, prop, index, Transform::Negate, prevent_default)
    }

    /// Prop counterpart of [`toggle_value`](Owner::toggle_value).
    pub fn toggle_prop_value(
        &self,
        func: &str,
        prop: impl Into<Path>,
        index: impl Into<Path>,
        value: impl Into<Value>,
        prevent_default: bool,
    ) -> Handler {
        self.change_prop(func, prop, index, Transform::ToggleConstant(value.into()), prevent_default)
    }

    /// Prop counterpart of [`toggle_from_event`](Owner::toggle_from_event).
    pub fn toggle_prop_from_event(
        &self,
        func: &str,
        prop: impl Into<Path>,
        index: impl Into<Path>,
        prevent_default: bool,
    ) -> Handler {
        self.change_prop(func, prop, index, Transform::SetOrNull, prevent_default)
    }

    /// Handler that removes `index` from inside the prop at `prop` and
    /// reports the pruned prop value through `func`.
    pub fn delete_prop(&self, func: &str, prop: impl Into<Path>, index: impl Into<Path>, prevent_default: bool) -> Handler {
        self.change_prop(func, prop, Path::root(), Transform::Remove(index.into()), prevent_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestComponent;

    fn owner() -> Owner<TestComponent> {
        Owner::new(TestComponent::new(Value::map([
            (
                "form",
                Value::map([
                    ("email", Value::from("")),
                    ("age", Value::Null),
                    ("nested", Value::persistent_map([("token", Value::from("x"))])),
                ]),
            ),
            ("open_tab", Value::Null),
            ("flag", Value::from(false)),
        ])))
    }

    #[test]
    fn equal_requests_return_the_identical_handler() {
        let owner = owner();
        let a = owner.update("form.email", true);
        let b = owner.update("form.email", true);
        assert!(a.same(&b));
        // a different flag is a different request
        let c = owner.update("form.email", false);
        assert!(!a.same(&c));
        // a different transform is a different request
        let d = owner.update_number("form.email", true);
        assert!(!a.same(&d));
        assert_eq!(owner.cached_handlers(), 3);

        // another owner never sees this cache
        let other = owner();
        assert!(!other.update("form.email", true).same(&a));
    }

    #[test]
    fn bound_constants_discriminate_requests() {
        let owner = owner();
        let a = owner.set_state("open_tab", "details", false);
        let b = owner.set_state("open_tab", "details", false);
        let c = owner.set_state("open_tab", "summary", false);
        assert!(a.same(&b));
        assert!(!a.same(&c));
    }

    #[test]
    fn update_commits_only_changed_entries() {
        let owner = owner();
        let handler = owner.update("form.email", false);
        handler.call(&Event::with_value("a@b.c"));
        let comp = owner.component().borrow();
        assert_eq!(mixed::get(comp.state(), "form.email"), Some(Value::from("a@b.c")));
        assert_eq!(comp.commits.len(), 1);
        // only the touched top-level entry travels in the commit
        assert!(matches!(&comp.commits[0], Value::Map(m) if m.len() == 1 && m.contains_key("form")));
    }

    #[test]
    fn toggle_and_toggle_value() {
        let owner = owner();
        owner.toggle("flag", false).call(&Event::new());
        assert_eq!(mixed::get(&owner.state(), "flag"), Some(Value::from(true)));
        owner.toggle("flag", false).call(&Event::new());
        assert_eq!(mixed::get(&owner.state(), "flag"), Some(Value::from(false)));

        let tab = owner.toggle_value("open_tab", "details", false);
        tab.call(&Event::new());
        assert_eq!(mixed::get(&owner.state(), "open_tab"), Some(Value::from("details")));
        // the same selection again clears it
        tab.call(&Event::new());
        assert_eq!(mixed::get(&owner.state(), "open_tab"), Some(Value::Null));
    }

    #[test]
    fn update_number_discards_non_numeric_input() {
        let owner = owner();
        let handler = owner.update_number("form.age", false);
        handler.call(&Event::with_value("42"));
        assert_eq!(mixed::get(&owner.state(), "form.age"), Some(Value::from(42)));
        handler.call(&Event::with_value("forty-two"));
        assert_eq!(mixed::get(&owner.state(), "form.age"), Some(Value::Null));
    }

    #[test]
    fn state_handlers_write_through_the_boundary() {
        let owner = owner();
        owner.update("form.nested.token", false).call(&Event::with_value("y"));
        assert_eq!(mixed::get(&owner.state(), "form.nested.token"), Some(Value::from("y")));
        assert!(mixed::get(&owner.state(), "form.nested").unwrap().is_persistent());
    }

    #[test]
    fn delete_state_removes_inside_the_entry() {
        let owner = owner();
        owner.delete_state("form.age", false).call(&Event::new());
        assert_eq!(mixed::get(&owner.state(), "form.age"), None);
        assert_eq!(mixed::get(&owner.state(), "form.email"), Some(Value::from("")));
    }

    #[test]
    fn prevent_default_happens_before_computation() {
        let owner = owner();
        let event = Event::with_value("x");
        owner.update("form.email", true).call(&event);
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert!(event.blur_requested());

        let event = Event::with_value("y");
        owner.update("form.email", false).call(&event);
        assert!(!event.default_prevented());
    }

    #[test]
    fn prop_handlers_report_through_the_callback() {
        let props = Value::map([(
            "row",
            Value::map([("label", Value::from("old")), ("count", Value::from(1))]),
        )]);
        let owner = Owner::new(TestComponent::with_props(Value::map::<&str, _>([]), props));
        let handler = owner.set_prop("on_row_changed", "row", "label", false);
        handler.call(&Event::with_value("new"));
        let comp = owner.component().borrow();
        let (name, value) = &comp.prop_calls[0];
        assert_eq!(name, "on_row_changed");
        assert_eq!(mixed::get(value, "label"), Some(Value::from("new")));
        assert_eq!(mixed::get(value, "count"), Some(Value::from(1)));
        // props are reported upward, not committed
        assert!(comp.commits.is_empty());
    }

    #[test]
    fn delete_prop_prunes_the_prop_value() {
        let props = Value::map([("row", Value::map([("a", Value::from(1)), ("b", Value::from(2))]))]);
        let owner = Owner::new(TestComponent::with_props(Value::map::<&str, _>([]), props));
        owner.delete_prop("on_row_changed", "row", "b", false).call(&Event::new());
        let comp = owner.component().borrow();
        let (_, value) = &comp.prop_calls[0];
        assert_eq!(mixed::get(value, "b"), None);
        assert_eq!(mixed::get(value, "a"), Some(Value::from(1)));
    }

    #[test]
    fn custom_transforms_are_cached_by_their_key() {
        let owner = owner();
        let double = Transform::Custom {
            key: "double".into(),
            f: Rc::new(|cur, _| match cur {
                Some(Value::Number(n)) => Value::Number(n * 2.0),
                _ => Value::Number(0.0),
            }),
        };
        let a = owner.change_state("form.age", double.clone(), false);
        let b = owner.change_state("form.age", double, false);
        assert!(a.same(&b));
    }

    #[test]
    fn handlers_outliving_their_owner_do_nothing() {
        let owner = owner();
        let handler = owner.update("form.email", false);
        drop(owner);
        assert_eq!(handler.call(&Event::with_value("x")), None);
    }
}
