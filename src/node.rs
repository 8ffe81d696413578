use crate::{
    error::{AddChildError, AddChildResult},
    nodes::{
        self, Action, ActionFn, ConditionFn, DynamicPriorities, Guard, IndexedActionFn, MessageFn,
        OnFailFn, Wait,
    },
    Context, NumChildren, Status,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{fmt, time::Duration};

pub(crate) enum NodeKind {
    /// The root of a [`crate::BehaviorTree`]: delegates to its active child.
    Root,
    Action(Action),
    Condition(ConditionFn),
    Wait(Wait),
    Debug(Option<MessageFn>),
    Sequence,
    Selector,
    PrioritisingSelector {
        sorted: bool,
    },
    DynamicPrioritisingSelector {
        sorted: bool,
        priorities: DynamicPriorities,
    },
    RandomSelector {
        shuffled: bool,
        rng: Box<dyn RngCore>,
    },
    DependencySequence {
        guard: Guard,
        on_fail: Option<OnFailFn>,
    },
    Loop {
        guard: Guard,
    },
    Inverter,
}

impl NodeKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Root => "BehaviorTree",
            Self::Action(_) => "Action",
            Self::Condition(_) => "Condition",
            Self::Wait(_) => "Wait",
            Self::Debug(_) => "Debug",
            Self::Sequence => "Sequence",
            Self::Selector => "Selector",
            Self::PrioritisingSelector { .. } => "PrioritisingSelector",
            Self::DynamicPrioritisingSelector { .. } => "DynamicPrioritisingSelector",
            Self::RandomSelector { .. } => "RandomSelector",
            Self::DependencySequence { .. } => "DependencySequence",
            Self::Loop { .. } => "Loop",
            Self::Inverter => "Inverter",
        }
    }

    fn max_children(&self) -> NumChildren {
        match self {
            Self::Action(_) | Self::Condition(_) | Self::Wait(_) | Self::Debug(_) => {
                NumChildren::Finite(0)
            }
            Self::Inverter => NumChildren::Finite(1),
            _ => NumChildren::Infinite,
        }
    }
}

/// A node in a behavior tree.
///
/// A node exclusively owns its children. Composites remember which child is
/// active between ticks in `current_child`, so a `Running` child is resumed
/// on the next tick instead of re-walking its finished siblings.
///
/// Children are meant to be added before the first tick. Changing the child
/// list of a node while one of its children is `Running` leaves the cursor
/// pointing wherever it happens to point.
pub struct Node {
    name: String,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<Node>,
    pub(crate) current_child: usize,
    priority: i32,
    status: Status,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: vec![],
            current_child: 0,
            priority: 0,
            status: Status::Running,
        }
    }

    /// Leaf that runs `f` on every tick and returns its status.
    pub fn action(name: impl Into<String>, f: impl FnMut(&mut Context) -> Status + 'static) -> Self {
        Self::new(name, NodeKind::Action(Action::Plain(Box::new(f) as ActionFn)))
    }

    /// Leaf that runs `f` with a fixed `index`, so one callback can serve several leaves.
    pub fn indexed_action(
        name: impl Into<String>,
        index: usize,
        f: impl FnMut(usize, &mut Context) -> Status + 'static,
    ) -> Self {
        Self::new(
            name,
            NodeKind::Action(Action::Indexed {
                f: Box::new(f) as IndexedActionFn,
                index,
            }),
        )
    }

    /// Action leaf without a callback. Always fails.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Action(Action::Unbound))
    }

    /// Leaf that succeeds when `f` returns true and fails otherwise. Never `Running`.
    pub fn condition(name: impl Into<String>, f: impl FnMut(&Context) -> bool + 'static) -> Self {
        Self::new(name, NodeKind::Condition(Box::new(f)))
    }

    /// Leaf that is `Running` until `duration` has passed on the context's clock since
    /// its first tick, then succeeds once and starts over.
    pub fn wait(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, NodeKind::Wait(Wait::new(duration)))
    }

    /// Leaf that always succeeds.
    pub fn debug(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Debug(None))
    }

    /// Leaf that always succeeds and, while diagnostics are on, reports the text from `f`.
    pub fn debug_message(
        name: impl Into<String>,
        f: impl FnMut(&Context) -> String + 'static,
    ) -> Self {
        Self::new(name, NodeKind::Debug(Some(Box::new(f))))
    }

    pub fn sequence(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Sequence)
    }

    pub fn selector(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Selector)
    }

    /// Selector that tries its children in ascending priority order.
    pub fn prioritising_selector(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::PrioritisingSelector { sorted: false })
    }

    pub fn dynamic_prioritising_selector(name: impl Into<String>) -> Self {
        Self::dynamic_prioritising_selector_with(name, DynamicPriorities::default())
    }

    pub fn dynamic_prioritising_selector_with(
        name: impl Into<String>,
        priorities: DynamicPriorities,
    ) -> Self {
        Self::new(
            name,
            NodeKind::DynamicPrioritisingSelector {
                sorted: false,
                priorities,
            },
        )
    }

    /// Random selector seeded from the OS.
    pub fn random_selector(name: impl Into<String>) -> Self {
        Self::random_selector_with_rng(name, ChaCha8Rng::from_entropy())
    }

    pub fn random_selector_seeded(name: impl Into<String>, seed: u64) -> Self {
        Self::random_selector_with_rng(name, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn random_selector_with_rng(name: impl Into<String>, rng: impl RngCore + 'static) -> Self {
        Self::new(
            name,
            NodeKind::RandomSelector {
                shuffled: false,
                rng: Box::new(rng),
            },
        )
    }

    pub fn dependency_sequence(name: impl Into<String>, guard: impl Into<Guard>) -> Self {
        Self::new(
            name,
            NodeKind::DependencySequence {
                guard: guard.into(),
                on_fail: None,
            },
        )
    }

    /// Dependency sequence that calls `on_fail` every time its guard fails.
    pub fn dependency_sequence_or_else(
        name: impl Into<String>,
        guard: impl Into<Guard>,
        on_fail: impl FnMut(&mut Context) + 'static,
    ) -> Self {
        Self::new(
            name,
            NodeKind::DependencySequence {
                guard: guard.into(),
                on_fail: Some(Box::new(on_fail)),
            },
        )
    }

    pub fn loop_while(name: impl Into<String>, guard: impl Into<Guard>) -> Self {
        Self::new(
            name,
            NodeKind::Loop {
                guard: guard.into(),
            },
        )
    }

    pub fn inverter(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Inverter)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_children(
        mut self,
        children: impl IntoIterator<Item = Node>,
    ) -> Result<Self, AddChildError> {
        for child in children {
            self.add_child(child)?;
        }
        Ok(self)
    }

    pub fn add_child(&mut self, child: Node) -> AddChildResult {
        let max = self.kind.max_children();
        if NumChildren::Finite(self.children.len()) < max {
            self.children.push(child);
            Ok(())
        } else {
            Err(AddChildError::TooManyNodes {
                node: self.name.clone(),
                max: match max {
                    NumChildren::Finite(max) => max,
                    NumChildren::Infinite => usize::MAX,
                },
            })
        }
    }

    pub fn remove_child(&mut self, index: usize) -> Option<Node> {
        if index >= self.children.len() {
            return None;
        }
        let removed = self.children.remove(index);
        if self.current_child >= self.children.len() {
            self.current_child = 0;
        }
        Some(removed)
    }

    pub fn remove_children(&mut self) {
        self.children.clear();
        self.current_child = 0;
    }

    /// Evaluate this node once.
    pub fn tick(&mut self, ctx: &mut Context) -> Status {
        let Node {
            name,
            kind,
            children,
            current_child,
            ..
        } = self;

        let status = match kind {
            NodeKind::Root => match children.get_mut(*current_child) {
                Some(child) => child.tick(ctx),
                None => Status::Success,
            },
            NodeKind::Action(action) => action.tick(ctx),
            NodeKind::Condition(condition) => Status::from(condition(&*ctx)),
            NodeKind::Wait(wait) => wait.tick(ctx.now()),
            NodeKind::Debug(message) => {
                if let Some(message) = message {
                    if ctx.debug_enabled() {
                        let text = message(&*ctx);
                        ctx.report_message(name, &text);
                    }
                }
                Status::Success
            }
            NodeKind::Sequence => nodes::tick_sequence(children, current_child, ctx),
            NodeKind::Selector => nodes::tick_selector(children, current_child, ctx, |_, _| ()),
            NodeKind::PrioritisingSelector { sorted } => {
                if !*sorted {
                    nodes::sort_by_priority(children);
                    *sorted = true;
                }
                let status = nodes::tick_selector(children, current_child, ctx, |_, _| ());
                if status.is_done() {
                    *sorted = false;
                }
                status
            }
            NodeKind::DynamicPrioritisingSelector { sorted, priorities } => {
                if !*sorted {
                    nodes::sort_by_priority(children);
                    *sorted = true;
                }
                let priorities = *priorities;
                let status =
                    nodes::tick_selector(children, current_child, ctx, |child, outcome| {
                        child.priority = priorities.after(outcome);
                    });
                if status.is_done() {
                    *sorted = false;
                }
                status
            }
            NodeKind::RandomSelector { shuffled, rng } => {
                if !*shuffled {
                    nodes::shuffle(children, rng.as_mut());
                    *shuffled = true;
                }
                let status = nodes::tick_selector(children, current_child, ctx, |_, _| ());
                if status.is_done() {
                    *shuffled = false;
                }
                status
            }
            NodeKind::DependencySequence { guard, on_fail } => {
                if guard.check(ctx) {
                    nodes::tick_sequence(children, current_child, ctx)
                } else {
                    if let Some(on_fail) = on_fail {
                        on_fail(ctx);
                    }
                    nodes::reset_children(children, current_child);
                    Status::Failure
                }
            }
            NodeKind::Loop { guard } => {
                // A failing guard is how a loop ends, and it ends in Success.
                if guard.check(ctx) {
                    nodes::tick_loop(children, current_child, ctx)
                } else {
                    nodes::reset_children(children, current_child);
                    Status::Success
                }
            }
            NodeKind::Inverter => {
                debug_assert!(
                    children.len() == 1,
                    "Inverter {name:?} needs exactly one child, has {}",
                    children.len()
                );
                match children.first_mut() {
                    Some(child) => child.tick(ctx).invert(),
                    None => Status::Failure,
                }
            }
        };

        let old = std::mem::replace(&mut self.status, status);
        ctx.report_status(self.kind.label(), &self.name, old, status);
        status
    }

    /// Reset every descendant and move the cursor back to the first child.
    ///
    /// Any `Running` work below this node is abandoned without notice. Status
    /// and priority are left untouched.
    pub fn reset(&mut self) {
        nodes::reset_children(&mut self.children, &mut self.current_child);
        match &mut self.kind {
            NodeKind::Wait(wait) => wait.rearm(),
            NodeKind::PrioritisingSelector { sorted }
            | NodeKind::DynamicPrioritisingSelector { sorted, .. } => *sorted = false,
            NodeKind::RandomSelector { shuffled, .. } => *shuffled = false,
            NodeKind::DependencySequence { guard, .. } | NodeKind::Loop { guard } => guard.reset(),
            _ => (),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the node kind, e.g. `"Sequence"`.
    pub fn kind_name(&self) -> &'static str {
        self.kind.label()
    }

    /// Status returned by the most recent tick. `Running` before the first tick.
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    pub fn current_child(&self) -> usize {
        self.current_child
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.max_children() == NumChildren::Finite(0)
    }

    /// Depth-first search for a descendant (or this node) by name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.kind.label())
            .field("name", &self.name)
            .field("status", &self.status)
            .field("priority", &self.priority)
            .field("current_child", &self.current_child)
            .field("children", &self.children)
            .finish()
    }
}
