use crate::{
    node::{Node, NodeKind},
    nodes::{Action, ActionFn, ConditionFn, IndexedActionFn, MessageFn, OnFailFn},
    Context, Status,
};
use std::collections::HashMap;

enum LeafConstructor {
    Action(Box<dyn Fn() -> ActionFn>),
    IndexedAction(Box<dyn Fn() -> IndexedActionFn>),
    Condition(Box<dyn Fn() -> ConditionFn>),
}

/// Named callbacks that tree definitions can refer to.
///
/// Every registered closure must be `Clone`: each node loaded from a
/// definition gets its own copy, so per-node state inside a closure is not
/// shared between two leaves that use the same name.
#[derive(Default)]
pub struct Registry {
    leaves: HashMap<String, LeafConstructor>,
    on_fail: HashMap<String, Box<dyn Fn() -> OnFailFn>>,
    messages: HashMap<String, Box<dyn Fn() -> MessageFn>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_action<F>(&mut self, type_name: impl ToString, f: F)
    where
        F: FnMut(&mut Context) -> Status + Clone + 'static,
    {
        self.leaves.insert(
            type_name.to_string(),
            LeafConstructor::Action(Box::new(move || Box::new(f.clone()))),
        );
    }

    /// The leaf's `index` parameter (0 when absent) is passed to `f` on every tick.
    pub fn register_indexed_action<F>(&mut self, type_name: impl ToString, f: F)
    where
        F: FnMut(usize, &mut Context) -> Status + Clone + 'static,
    {
        self.leaves.insert(
            type_name.to_string(),
            LeafConstructor::IndexedAction(Box::new(move || Box::new(f.clone()))),
        );
    }

    /// Registers a condition, usable both as a leaf and as a guard.
    pub fn register_condition<F>(&mut self, type_name: impl ToString, f: F)
    where
        F: FnMut(&Context) -> bool + Clone + 'static,
    {
        self.leaves.insert(
            type_name.to_string(),
            LeafConstructor::Condition(Box::new(move || Box::new(f.clone()))),
        );
    }

    /// Callback for the `on_fail` parameter of dependency sequences.
    pub fn register_on_fail<F>(&mut self, name: impl ToString, f: F)
    where
        F: FnMut(&mut Context) + Clone + 'static,
    {
        self.on_fail
            .insert(name.to_string(), Box::new(move || Box::new(f.clone())));
    }

    /// Message source for the `message` parameter of debug leaves.
    pub fn register_message<F>(&mut self, name: impl ToString, f: F)
    where
        F: FnMut(&Context) -> String + Clone + 'static,
    {
        self.messages
            .insert(name.to_string(), Box::new(move || Box::new(f.clone())));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.leaves.contains_key(type_name)
    }

    /// Instantiate the leaf registered as `type_name`.
    pub fn build(&self, type_name: &str, name: &str, index: usize) -> Option<Node> {
        let kind = match self.leaves.get(type_name)? {
            LeafConstructor::Action(constructor) => NodeKind::Action(Action::Plain(constructor())),
            LeafConstructor::IndexedAction(constructor) => NodeKind::Action(Action::Indexed {
                f: constructor(),
                index,
            }),
            LeafConstructor::Condition(constructor) => NodeKind::Condition(constructor()),
        };
        Some(Node::new(name, kind))
    }

    /// Instantiate `type_name` only if it was registered as a condition.
    pub fn build_condition(&self, type_name: &str) -> Option<Node> {
        match self.leaves.get(type_name)? {
            LeafConstructor::Condition(constructor) => {
                Some(Node::new(type_name, NodeKind::Condition(constructor())))
            }
            _ => None,
        }
    }

    pub(crate) fn on_fail(&self, name: &str) -> Option<OnFailFn> {
        self.on_fail.get(name).map(|constructor| constructor())
    }

    pub(crate) fn message(&self, name: &str) -> Option<MessageFn> {
        self.messages.get(name).map(|constructor| constructor())
    }
}
