//! Glue between behavior trees and a simulated body.
//!
//! The tree never moves or senses anything itself. Leaves built here call
//! into a [`Locomotion`] or [`Perception`] implementation shared with the
//! host, and read their targets from the blackboard as [`glam::Vec3`].

use crate::{BehaviorTree, Context, Node, Status, Symbol};
use glam::Vec3;
use std::{cell::RefCell, rc::Rc, time::Duration};

/// Distance at which a destination counts as reached.
pub const ARRIVAL_TOLERANCE: f32 = 2.0;

pub trait Perception {
    /// `Success` if something tagged `tag` is visible at `target`, `Failure` otherwise.
    fn can_see(&self, target: Vec3, tag: &str, max_distance: f32, max_angle: f32) -> Status;
}

pub trait Locomotion {
    fn position(&self) -> Vec3;

    /// Head for `destination`. Called once per tick for as long as the move
    /// is `Running`; `Failure` means the destination cannot be reached.
    fn seek(&mut self, destination: Vec3) -> Status;

    /// Turn about the vertical axis. Positive is counter-clockwise.
    fn turn(&mut self, degrees: f32);
}

/// Moves in a straight line at a fixed speed per call to [`Locomotion::seek`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walker {
    pub position: Vec3,
    pub speed: f32,
    /// Degrees about the vertical axis.
    pub heading: f32,
}

impl Walker {
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position,
            speed,
            heading: 0.,
        }
    }
}

impl Locomotion for Walker {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn seek(&mut self, destination: Vec3) -> Status {
        let offset = destination - self.position;
        if offset.length() <= ARRIVAL_TOLERANCE {
            return Status::Success;
        }
        if self.speed <= 0. || !offset.is_finite() {
            return Status::Failure;
        }
        self.position += offset.clamp_length_max(self.speed);
        Status::Running
    }

    fn turn(&mut self, degrees: f32) {
        self.heading = (self.heading + degrees).rem_euclid(360.);
    }
}

/// Condition-like leaf: succeeds when `perception` can see the position
/// stored under `target_key`. A missing target fails.
pub fn can_see<P: Perception + 'static>(
    name: impl Into<String>,
    perception: Rc<RefCell<P>>,
    target_key: impl Into<Symbol>,
    tag: impl Into<String>,
    max_distance: f32,
    max_angle: f32,
) -> Node {
    let target_key = target_key.into();
    let tag = tag.into();
    Node::action(name, move |ctx: &mut Context| {
        match ctx.get::<Vec3>(target_key) {
            Some(target) => perception
                .borrow()
                .can_see(*target, &tag, max_distance, max_angle),
            None => Status::Failure,
        }
    })
}

/// Moves toward the position stored under `destination_key`, re-reading it
/// on every tick so a moving target is followed.
pub fn go_to<L: Locomotion + 'static>(
    name: impl Into<String>,
    locomotion: Rc<RefCell<L>>,
    destination_key: impl Into<Symbol>,
) -> Node {
    let destination_key = destination_key.into();
    Node::action(name, move |ctx: &mut Context| {
        match ctx.get::<Vec3>(destination_key) {
            Some(destination) => locomotion.borrow_mut().seek(*destination),
            None => Status::Failure,
        }
    })
}

/// Runs `distance` away from the position stored under `threat_key`.
///
/// The flee point is fixed on the first tick of a run and kept until the
/// move succeeds or fails, even if the threat keeps moving.
pub fn flee<L: Locomotion + 'static>(
    name: impl Into<String>,
    locomotion: Rc<RefCell<L>>,
    threat_key: impl Into<Symbol>,
    distance: f32,
) -> Node {
    let threat_key = threat_key.into();
    let mut flee_point: Option<Vec3> = None;
    Node::action(name, move |ctx: &mut Context| {
        let mut locomotion = locomotion.borrow_mut();
        let destination = match flee_point {
            Some(point) => point,
            None => {
                let Some(threat) = ctx.get::<Vec3>(threat_key) else {
                    return Status::Failure;
                };
                let position = locomotion.position();
                *flee_point.insert(position + (position - *threat).normalize_or_zero() * distance)
            }
        };
        let status = locomotion.seek(destination);
        if status.is_done() {
            flee_point = None;
        }
        status
    })
}

/// Sweeps `degrees` at `speed` degrees per second of clock time, then turns
/// back to the heading it started from. Used to look around on the spot.
pub fn rotate<L: Locomotion + 'static>(
    name: impl Into<String>,
    locomotion: Rc<RefCell<L>>,
    degrees: f32,
    speed: f32,
) -> Node {
    // Start time and degrees turned so far in the current sweep.
    let mut sweep: Option<(Duration, f32)> = None;
    Node::action(name, move |ctx: &mut Context| {
        if degrees > 0. && (speed <= 0. || speed.is_nan()) {
            return Status::Failure;
        }
        let now = ctx.now();
        let (started_at, turned) = sweep.get_or_insert((now, 0.));
        let target = (now.saturating_sub(*started_at).as_secs_f32() * speed).min(degrees);
        let mut locomotion = locomotion.borrow_mut();
        if target > *turned {
            locomotion.turn(target - *turned);
            *turned = target;
        }
        if *turned < degrees {
            return Status::Running;
        }
        locomotion.turn(-*turned);
        sweep = None;
        Status::Success
    })
}

/// A tree plus the switch that stops it from being ticked.
///
/// How often [`Agent::update`] is called is up to the host.
#[derive(Debug)]
pub struct Agent {
    tree: BehaviorTree,
    paused: bool,
    status: Status,
}

impl Agent {
    pub fn new(tree: BehaviorTree) -> Self {
        Self {
            tree,
            paused: false,
            status: Status::Running,
        }
    }

    /// Tick the tree once, unless paused. Returns the new status, or `None`
    /// if nothing was ticked.
    pub fn update(&mut self, ctx: &mut Context) -> Option<Status> {
        if self.paused {
            return None;
        }
        self.status = self.tree.tick(ctx);
        Some(self.status)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Status from the last update that actually ticked.
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tree(&self) -> &BehaviorTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BehaviorTree {
        &mut self.tree
    }
}

#[cfg(test)]
mod test;
