//! Leaf payloads and the tick algorithms shared by the composite kinds.
//!
//! Composites evaluate exactly one child per tick. A `Running` child is
//! returned as-is without touching its siblings. When a composite's pass ends
//! (overall `Success` or `Failure`), every child is reset and the cursor goes
//! back to the first child, so the next tick starts a fresh pass.

use crate::{BehaviorTree, Context, Node, Status};
use rand::{seq::SliceRandom, RngCore};
use std::time::Duration;

pub type ActionFn = Box<dyn FnMut(&mut Context) -> Status>;
pub type IndexedActionFn = Box<dyn FnMut(usize, &mut Context) -> Status>;
pub type ConditionFn = Box<dyn FnMut(&Context) -> bool>;
pub type MessageFn = Box<dyn FnMut(&Context) -> String>;
pub type OnFailFn = Box<dyn FnMut(&mut Context)>;

pub(crate) enum Action {
    Unbound,
    Plain(ActionFn),
    Indexed { f: IndexedActionFn, index: usize },
}

impl Action {
    pub(crate) fn tick(&mut self, ctx: &mut Context) -> Status {
        match self {
            Self::Unbound => Status::Failure,
            Self::Plain(f) => f(ctx),
            Self::Indexed { f, index } => f(*index, ctx),
        }
    }
}

pub(crate) struct Wait {
    duration: Duration,
    started_at: Option<Duration>,
}

impl Wait {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    pub(crate) fn tick(&mut self, now: Duration) -> Status {
        let started_at = *self.started_at.get_or_insert(now);
        // A clock that steps backwards reads as no time elapsed.
        let elapsed = now.saturating_sub(started_at);
        if elapsed < self.duration {
            Status::Running
        } else {
            self.started_at = None;
            Status::Success
        }
    }

    pub(crate) fn rearm(&mut self) {
        self.started_at = None;
    }
}

/// Priorities a dynamic prioritising selector assigns to a child after it
/// finishes. Lower sorts first, so by default a child that just succeeded is
/// tried before one that just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicPriorities {
    pub on_success: i32,
    pub on_failure: i32,
}

impl Default for DynamicPriorities {
    fn default() -> Self {
        Self {
            on_success: 1,
            on_failure: 10,
        }
    }
}

impl DynamicPriorities {
    pub(crate) fn after(&self, outcome: Status) -> i32 {
        match outcome {
            Status::Success => self.on_success,
            _ => self.on_failure,
        }
    }
}

/// The condition checked by dependency sequences and loops before every tick.
///
/// It is either a single condition leaf or a whole tree made of conditions.
/// Only `Failure` counts as failing; a `Running` guard lets the tick through.
pub struct Guard(Box<Node>);

impl Guard {
    pub fn condition(name: impl Into<String>, f: impl FnMut(&Context) -> bool + 'static) -> Self {
        Self(Box::new(Node::condition(name, f)))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub(crate) fn check(&mut self, ctx: &mut Context) -> bool {
        self.0.tick(ctx) != Status::Failure
    }

    pub(crate) fn reset(&mut self) {
        self.0.reset();
    }
}

impl From<Node> for Guard {
    fn from(node: Node) -> Self {
        Self(Box::new(node))
    }
}

impl From<BehaviorTree> for Guard {
    fn from(tree: BehaviorTree) -> Self {
        Self(Box::new(tree.into_node()))
    }
}

fn active_child(children: &mut [Node], current: usize) -> Option<&mut Node> {
    debug_assert!(
        current < children.len(),
        "composite ticked with no child at index {current} (it has {})",
        children.len()
    );
    children.get_mut(current)
}

pub(crate) fn reset_children(children: &mut [Node], current: &mut usize) {
    for child in children.iter_mut() {
        child.reset();
    }
    *current = 0;
}

/// Stable, so equal priorities keep their relative order.
pub(crate) fn sort_by_priority(children: &mut [Node]) {
    children.sort_by_key(Node::priority);
}

pub(crate) fn shuffle(children: &mut [Node], rng: &mut dyn RngCore) {
    children.shuffle(rng);
}

enum SequenceStep {
    Running,
    Failed,
    Completed,
}

fn sequence_step(children: &mut [Node], current: &mut usize, ctx: &mut Context) -> SequenceStep {
    let Some(child) = active_child(children, *current) else {
        return SequenceStep::Failed;
    };
    match child.tick(ctx) {
        Status::Running => SequenceStep::Running,
        Status::Failure => {
            reset_children(children, current);
            SequenceStep::Failed
        }
        Status::Success => {
            *current += 1;
            if *current < children.len() {
                SequenceStep::Running
            } else {
                reset_children(children, current);
                SequenceStep::Completed
            }
        }
    }
}

pub(crate) fn tick_sequence(children: &mut [Node], current: &mut usize, ctx: &mut Context) -> Status {
    match sequence_step(children, current, ctx) {
        SequenceStep::Running => Status::Running,
        SequenceStep::Failed => Status::Failure,
        SequenceStep::Completed => Status::Success,
    }
}

/// Like a sequence, except that finishing every child starts the loop over.
pub(crate) fn tick_loop(children: &mut [Node], current: &mut usize, ctx: &mut Context) -> Status {
    match sequence_step(children, current, ctx) {
        SequenceStep::Running | SequenceStep::Completed => Status::Running,
        SequenceStep::Failed => Status::Failure,
    }
}

/// One selector step. `on_outcome` sees the child that just finished along
/// with its result, before the cursor moves.
pub(crate) fn tick_selector(
    children: &mut [Node],
    current: &mut usize,
    ctx: &mut Context,
    mut on_outcome: impl FnMut(&mut Node, Status),
) -> Status {
    let Some(child) = active_child(children, *current) else {
        return Status::Failure;
    };
    let status = child.tick(ctx);
    match status {
        Status::Running => Status::Running,
        Status::Success => {
            on_outcome(child, status);
            reset_children(children, current);
            Status::Success
        }
        Status::Failure => {
            on_outcome(child, status);
            *current += 1;
            if *current < children.len() {
                Status::Running
            } else {
                reset_children(children, current);
                Status::Failure
            }
        }
    }
}

#[cfg(test)]
mod test;
