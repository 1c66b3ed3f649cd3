//! Structural state updates for mixed mutable/persistent trees.
//!
//! UI components keep their state in trees that are plain on the outside
//! and persistent (structurally shared) further in. This crate provides the
//! pieces such components lean on during every render pass:
//!
//! - [`mixed`]: deep get/set/delete that locate the plain/persistent
//!   boundary of a path, shallow-clone only the plain ancestors that
//!   changed, and reuse the persistent side's structural sharing, so every
//!   untouched subtree keeps its identity and shallow-comparison render
//!   skipping stays effective;
//! - [`Owner`]: per-component memoization of synthesized event handlers,
//!   where equal requests return the identical callable across renders, so
//!   function-identity comparisons downstream keep skipping work;
//! - [`Owner::all`]: composite dispatch of several handlers against one
//!   pre-dispatch snapshot, with a single commit.

mod component;
mod event;
mod handler;
pub mod mixed;
mod path;
mod persistent;
mod sequence;
mod value;

#[cfg(test)]
mod fixtures;

pub use component::{changed_keys, Component, Owner};
pub use event::Event;
pub use handler::{Handler, HandlerKey, Transform, TransformKey};
pub use path::{Key, Path, PathError};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestComponent;

    fn sample_state() -> Value {
        Value::map([
            (
                "form",
                Value::map([
                    ("email", Value::from("")),
                    ("age", Value::Null),
                    ("nested", Value::persistent_map([("token", Value::from("x"))])),
                ]),
            ),
            ("session", Value::map([("user", Value::from("u"))])),
        ])
    }

    // a render pass asks for the same handlers every time
    fn render(owner: &Owner<TestComponent>) -> (Handler, Handler, Handler) {
        (
            owner.update("form.email", false),
            owner.update_number("form.age", false),
            owner.set_state("form.nested.token", "fresh", true),
        )
    }

    #[test]
    fn repeated_renders_reuse_every_handler() {
        let owner = Owner::new(TestComponent::new(sample_state()));
        let (a1, b1, c1) = render(&owner);
        let (a2, b2, c2) = render(&owner);
        assert!(a1.same(&a2));
        assert!(b1.same(&b2));
        assert!(c1.same(&c2));
        assert_eq!(owner.cached_handlers(), 3);
    }

    #[test]
    fn a_form_flow() {
        let owner = Owner::new(TestComponent::new(sample_state()));
        let session_before = mixed::get(&owner.state(), "session").unwrap();
        let (email, age, token) = render(&owner);

        email.call(&Event::with_value("me@example.com"));
        age.call(&Event::with_value("33"));
        token.call(&Event::new());

        let comp = owner.component().borrow();
        assert_eq!(mixed::get(comp.state(), "form.email"), Some(Value::from("me@example.com")));
        assert_eq!(mixed::get(comp.state(), "form.age"), Some(Value::from(33)));
        assert_eq!(mixed::get(comp.state(), "form.nested.token"), Some(Value::from("fresh")));
        assert!(mixed::get(comp.state(), "form.nested").unwrap().is_persistent());
        assert_eq!(comp.commits.len(), 3);
        // the untouched top-level branch rode through all three commits
        assert!(mixed::get(comp.state(), "session").unwrap().ptr_eq(&session_before));
    }

    #[test]
    fn no_op_writes_commit_no_entries() {
        let owner = Owner::new(TestComponent::new(sample_state()));
        owner.set_state("form.nested.token", "x", false).call(&Event::new());
        let comp = owner.component().borrow();
        assert_eq!(comp.commits.len(), 1);
        assert!(matches!(&comp.commits[0], Value::Map(m) if m.is_empty()));
    }
}
