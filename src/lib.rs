//! # agent-behavior-tree (Rust crate)
//!
//! A tick-driven behavior tree engine for game agents.
//!
//!
//! ## Overview
//!
//! A behavior tree is an extension to finite state machines that makes describing transitional behavior easier.
//! Every node answers a tick with one of three [`Status`] values: `Success`, `Failure` or `Running`.
//! A `Running` node is resumed on the next tick, so long actions like walking across a map are spread over many frames
//! without blocking anything.
//!
//! Composite nodes evaluate exactly one child per tick.
//! When a composite finishes a pass, it resets all of its children and starts over from the first child on the next tick.
//!
//!
//! ## How it looks like
//!
//! First, you put the state your nodes need on a blackboard, which lives in the [`Context`].
//!
//! ```rust
//! # use agent_behavior_tree::Context;
//! let mut ctx = Context::default();
//! ctx.set("hunger", 7_i32);
//! ```
//!
//! Then, you define a behavior tree.
//! Leaves are closures over the context, composites are built with `with_children`.
//!
//! ```rust
//! # use agent_behavior_tree::*;
//! let tree = BehaviorTree::new("Villager").with_child(
//!     Node::selector("Daily")
//!         .with_children([
//!             Node::sequence("Lunch")
//!                 .with_children([
//!                     Node::condition("Hungry", |ctx| ctx.get::<i32>("hunger").map_or(false, |h| *h > 5)),
//!                     Node::action("Eat", |ctx| {
//!                         ctx.set("hunger", 0_i32);
//!                         Status::Success
//!                     }),
//!                 ])
//!                 .unwrap(),
//!             Node::leaf("Work"),
//!         ])
//!         .unwrap(),
//! );
//! ```
//!
//! and call `tick()` once per frame.
//!
//! ```rust
//! # use agent_behavior_tree::*;
//! # let mut tree = BehaviorTree::new("Villager").with_child(Node::condition("Hungry", |_| true));
//! # let mut ctx = Context::default();
//! let status = tree.tick(&mut ctx);
//! ```
//!
//! `tick` returns `Running` while some node is still busy, and `Success` or `Failure` once the whole tree has
//! finished a pass.
//!
//!
//! ## Node kinds
//!
//! Leaves:
//!
//! * Action: runs a callback and returns its status. [`Node::indexed_action`] passes a fixed index along, so one
//!   callback can serve several leaves.
//! * Condition: `Success` if the predicate holds, `Failure` otherwise.
//! * Wait: `Running` until a duration has passed on the context's [`Clock`].
//! * Debug: always `Success`, optionally reporting a message while diagnostics are on.
//!
//! Composites:
//!
//! * Sequence: runs children in order until one fails.
//! * Selector: runs children in order until one succeeds.
//! * PrioritisingSelector: a selector that sorts its children by ascending priority at the start of every pass.
//! * DynamicPrioritisingSelector: like the above, but a child that succeeds or fails is given a new priority,
//!   which takes effect on the next pass.
//! * RandomSelector: a selector that shuffles its children at the start of every pass.
//! * DependencySequence: a sequence that checks a guard before every tick and fails when the guard fails.
//! * Loop: a sequence that starts over when its last child succeeds, and ends with `Success` once its guard fails.
//! * Inverter: swaps `Success` and `Failure` of its only child.
//!
//!
//! ## Loading trees from text
//!
//! Trees can also be described in a small text format and instantiated with a [`Registry`] of named callbacks.
//!
//! ```rust
//! # use agent_behavior_tree::*;
//! let source = r#"
//! tree main = Sequence {
//!     !Hungry
//!     Wait (duration = 0.5)
//!     Work
//! }
//! "#;
//!
//! let mut registry = Registry::new();
//! registry.register_condition("Hungry", |ctx: &Context| ctx.get::<bool>("hungry") == Some(&true));
//! registry.register_action("Work", |_: &mut Context| Status::Success);
//!
//! let tree = load(&parse_source(source).unwrap(), &registry).unwrap();
//! assert_eq!(tree.render(), "main\n-Sequence\n--Inverter\n---Hungry\n--Wait\n--Work\n");
//! ```
//!
//! Another tree in the same source can be used as a node by its name, which nests it as a subtree.
//! The same trees can be written in YAML and loaded with [`load_yaml`].
//!
//!
//! ## Events
//!
//! The context also carries an [`EventBus`]. Anything holding the context can broadcast a typed event to every
//! listener registered for that event type, in registration order.
//!
//!
//! ## Diagnostics
//!
//! Status changes are reported to the context's [`StatusObserver`].
//! The default one, [`TracingObserver`], emits `tracing` events on the `agent_behavior_tree::status` and
//! `agent_behavior_tree::debug` targets. This crate never installs a subscriber itself.
//!
//! [`BehaviorTree::render`] prints the shape of a tree, one node per line, indented by depth.

mod agent;
mod blackboard;
mod clock;
mod context;
pub mod error;
mod event;
mod node;
mod nodes;
mod observer;
pub mod parser;
mod registry;
mod symbol;
mod tree;

pub use crate::agent::{can_see, flee, go_to, rotate, Agent, Locomotion, Perception, Walker, ARRIVAL_TOLERANCE};
pub use crate::blackboard::{Blackboard, Variable};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::context::Context;
pub use crate::event::{Event, EventBus, Listener, ListenerId, ListenerResult};
pub use crate::node::Node;
pub use crate::nodes::{
    ActionFn, ConditionFn, DynamicPriorities, Guard, IndexedActionFn, MessageFn, OnFailFn,
};
pub use crate::observer::{NullObserver, StatusChange, StatusObserver, TracingObserver};
pub use crate::parser::{load, load_yaml, parse_file, parse_source, TreeSource};
pub use crate::registry::Registry;
pub use crate::symbol::Symbol;
pub use crate::tree::BehaviorTree;
pub use ::once_cell::sync::Lazy;

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Status {
    Success,
    Failure,
    /// The node should keep running in the next tick
    Running,
}

impl Status {
    /// Swap `Success` and `Failure`. `Running` stays `Running`.
    pub fn invert(self) -> Self {
        match self {
            Self::Success => Self::Failure,
            Self::Failure => Self::Success,
            Self::Running => Self::Running,
        }
    }

    pub fn is_done(self) -> bool {
        self != Self::Running
    }
}

impl From<bool> for Status {
    fn from(b: bool) -> Self {
        if b {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum NumChildren {
    Finite(usize),
    Infinite,
}

impl PartialOrd for NumChildren {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(match (self, other) {
            (NumChildren::Finite(_), NumChildren::Infinite) => std::cmp::Ordering::Less,
            (NumChildren::Infinite, NumChildren::Finite(_)) => std::cmp::Ordering::Greater,
            (NumChildren::Finite(lhs), NumChildren::Finite(rhs)) => lhs.cmp(rhs),
            (NumChildren::Infinite, NumChildren::Infinite) => return None,
        })
    }
}
