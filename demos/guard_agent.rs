//! A guard patrols between two posts until an intruder walks into view, then
//! raises the alarm and runs.
//!
//! Run with `RUST_LOG=debug cargo run --example guard_agent` to see every
//! status change.

use agent_behavior_tree::{
    can_see, flee, go_to, Agent, BehaviorTree, Context, Event, Guard, Lazy, Listener,
    ListenerResult, ManualClock, Node, Perception, Status, Symbol, Walker,
};
use glam::Vec3;
use std::{cell::RefCell, rc::Rc, time::Duration};
use tracing_subscriber::EnvFilter;

static INTRUDER: Lazy<Symbol> = Lazy::new(|| "intruder".into());

struct IntruderSpotted {
    at: Vec3,
}

impl Event for IntruderSpotted {}

/// Sees anything within range inside a cone around the walking direction.
struct Eyes {
    body: Rc<RefCell<Walker>>,
    forward: Vec3,
}

impl Perception for Eyes {
    fn can_see(&self, target: Vec3, _tag: &str, max_distance: f32, max_angle: f32) -> Status {
        let to_target = target - self.body.borrow().position;
        if to_target.length() > max_distance {
            return Status::Failure;
        }
        let angle = to_target.angle_between(self.forward).to_degrees();
        Status::from(angle <= max_angle || to_target.length() < 1.)
    }
}

fn build_tree(body: &Rc<RefCell<Walker>>) -> anyhow::Result<BehaviorTree> {
    let eyes = Rc::new(RefCell::new(Eyes {
        body: body.clone(),
        forward: Vec3::X,
    }));
    let spotted = Guard::from(can_see("SeeIntruder", eyes, *INTRUDER, "Intruder", 8., 60.));

    let alarm = Node::action("RaiseAlarm", |ctx: &mut Context| {
        let Some(at) = ctx.get::<Vec3>(*INTRUDER).copied() else {
            return Status::Failure;
        };
        match ctx.events().broadcast(&IntruderSpotted { at }) {
            Ok(_) => Status::Success,
            Err(e) => {
                tracing::error!("alarm failed: {e}");
                Status::Failure
            }
        }
    });

    let escape = Node::dependency_sequence("Escape", spotted).with_children([
        alarm,
        flee("Flee", body.clone(), *INTRUDER, 12.),
        Node::debug_message("Safe", |ctx| {
            format!("escaped at t = {:.1}s", ctx.now().as_secs_f32())
        }),
    ])?;

    let patrol = Node::sequence("Patrol").with_children([
        go_to("GoToA", body.clone(), "post_a"),
        Node::wait("Rest", Duration::from_millis(500)),
        go_to("GoToB", body.clone(), "post_b"),
    ])?;

    Ok(BehaviorTree::new("Guard").with_child(
        Node::selector("Behave").with_children([escape, patrol])?,
    ))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let body = Rc::new(RefCell::new(Walker::new(Vec3::ZERO, 1.5)));
    let tree = build_tree(&body)?;
    tree.log_tree();
    println!("{tree}");

    let clock = ManualClock::new();
    let mut ctx = Context::default().with_clock(clock.clone());
    ctx.set("post_a", Vec3::new(10., 0., 0.));
    ctx.set("post_b", Vec3::new(0., 0., 0.));

    let listener: Listener<IntruderSpotted> = Rc::new(|event: &IntruderSpotted| -> ListenerResult {
        println!("ALARM: intruder at {}", event.at);
        Ok(())
    });
    ctx.events().add_listener(&listener);

    let mut agent = Agent::new(tree);
    let mut intruder = Vec3::new(30., 0., 4.);

    for step in 0..80 {
        clock.advance(Duration::from_millis(100));
        if step >= 20 {
            intruder += Vec3::new(-0.8, 0., 0.);
            ctx.set(*INTRUDER, intruder);
        }

        // Freeze the guard for a moment, e.g. while a cutscene plays.
        if step == 10 {
            agent.pause();
        } else if step == 15 {
            agent.resume();
        }

        let status = agent.update(&mut ctx);
        println!(
            "step {step:2}: guard at {:>18} status {:?}",
            body.borrow().position.to_string(),
            status
        );
    }

    Ok(())
}
