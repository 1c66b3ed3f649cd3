//! Composite dispatch: several handlers, one commit.
//!
//! The commit primitive is not transactional, so dispatching a batch of
//! handlers naively would commit (and re-render) once per handler, each
//! against the state the previous commit happened to leave behind. The
//! combinator here folds the batch over one in-memory snapshot instead and
//! commits the combined result exactly once.

use std::rc::Rc;

use tracing::warn;

use crate::{
    component::{changed_keys, Component, Owner},
    handler::{Commit, Handler, HandlerKey},
};

impl<C: Component> Owner<C> {
    /// Combines `handlers` into one callable, memoized like any other
    /// handler (keyed by the constituents' descriptors plus this flag).
    ///
    /// Invoking it captures the state before anything runs, applies each
    /// handler in order with its commit suppressed (every handler computes
    /// against the staged result of the previous one), then restores the
    /// pre-dispatch state reference and pushes the combined diff through
    /// the normal commit pathway once. Prop-targeting constituents fire
    /// their callbacks during the fold and stage nothing.
    pub fn all(&self, handlers: &[Handler], prevent_default: bool) -> Handler {
        let key = HandlerKey::Sequence {
            parts: handlers.iter().map(|h| h.key().clone()).collect(),
            prevent_default,
        };
        self.memoize(key.clone(), || {
            let component = Rc::downgrade(self.component());
            let handlers = handlers.to_vec();
            Handler::new(
                key,
                prevent_default,
                Box::new(move |event, commit| {
                    let Some(component) = component.upgrade() else {
                        warn!("composite handler invoked after its owner was dropped");
                        return None;
                    };
                    let original = component.borrow().state().clone();
                    let mut folded = original.clone();
                    for handler in &handlers {
                        if let Some(next) = handler.invoke(event, Commit::Deferred) {
                            folded = next;
                            // stage, so the next handler reads this result
                            component.borrow_mut().set_state(folded.clone());
                        }
                    }
                    component.borrow_mut().set_state(original.clone());
                    if let Commit::Now = commit {
                        component.borrow_mut().commit(changed_keys(&original, &folded));
                    }
                    Some(folded)
                }),
            )
        })
    }
}
