//! Shared test fixtures.

use std::rc::Rc;

use crate::{component::Component, value::Value};

/// A component instance the way a host framework would hold one: state and
/// props trees, plus a record of every commit and prop-callback invocation.
pub(crate) struct TestComponent {
    pub state: Value,
    pub props: Value,
    pub commits: Vec<Value>,
    pub prop_calls: Vec<(String, Value)>,
}

impl TestComponent {
    pub fn new(state: Value) -> TestComponent {
        TestComponent::with_props(state, Value::map::<&str, [_; 0]>([]))
    }

    pub fn with_props(state: Value, props: Value) -> TestComponent {
        TestComponent {
            state,
            props,
            commits: Vec::new(),
            prop_calls: Vec::new(),
        }
    }
}

impl Component for TestComponent {
    fn state(&self) -> &Value {
        &self.state
    }

    fn set_state(&mut self, state: Value) {
        self.state = state;
    }

    fn commit(&mut self, changes: Value) {
        self.commits.push(changes.clone());
        // merge top-level entries the way a host framework would
        match (&self.state, &changes) {
            (Value::Map(cur), Value::Map(new)) => {
                let mut merged = (**cur).clone();
                for (k, v) in new.iter() {
                    merged.insert(k.clone(), v.clone());
                }
                self.state = Value::Map(Rc::new(merged));
            }
            _ => self.state = changes,
        }
    }

    fn props(&self) -> &Value {
        &self.props
    }

    fn call_prop(&mut self, name: &str, value: Value) {
        self.prop_calls.push((name.to_string(), value));
    }
}
