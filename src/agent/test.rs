use super::*;
use crate::{ManualClock, NullObserver};

struct Eyes {
    sees: &'static str,
}

impl Perception for Eyes {
    fn can_see(&self, _target: Vec3, tag: &str, _max_distance: f32, _max_angle: f32) -> Status {
        Status::from(tag == self.sees)
    }
}

fn quiet() -> Context {
    Context::default().with_observer(NullObserver)
}

#[test]
fn test_walker_arrives() {
    let mut walker = Walker::new(Vec3::ZERO, 3.);
    let destination = Vec3::new(10., 0., 0.);
    let mut steps = 0;
    while walker.seek(destination) == Status::Running {
        steps += 1;
    }
    assert_eq!(steps, 3);
    assert!(walker.position.distance(destination) <= ARRIVAL_TOLERANCE);
}

#[test]
fn test_walker_cannot_move() {
    let mut walker = Walker::new(Vec3::ZERO, 0.);
    assert_eq!(walker.seek(Vec3::new(10., 0., 0.)), Status::Failure);
    assert_eq!(walker.seek(Vec3::new(1., 0., 0.)), Status::Success);
}

#[test]
fn test_go_to() {
    let walker = Rc::new(RefCell::new(Walker::new(Vec3::ZERO, 5.)));
    let mut node = go_to("GoHome", walker.clone(), "home");

    let mut ctx = quiet();
    assert_eq!(node.tick(&mut ctx), Status::Failure);

    ctx.set("home", Vec3::new(0., 0., 7.));
    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().position, Vec3::new(0., 0., 5.));
    assert_eq!(node.tick(&mut ctx), Status::Success);
}

#[test]
fn test_flee_keeps_its_point() {
    let walker = Rc::new(RefCell::new(Walker::new(Vec3::ZERO, 4.)));
    let mut node = flee("Flee", walker.clone(), "threat", 10.);

    let mut ctx = quiet();
    ctx.set("threat", Vec3::new(1., 0., 0.));
    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().position, Vec3::new(-4., 0., 0.));

    // The threat moving does not change where this run is headed.
    ctx.set("threat", Vec3::new(-20., 0., 0.));
    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().position, Vec3::new(-8., 0., 0.));
    assert_eq!(node.tick(&mut ctx), Status::Success);

    // The next run picks a new point, away from the new threat position.
    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().position, Vec3::new(-4., 0., 0.));
}

#[test]
fn test_walker_turn_wraps() {
    let mut walker = Walker::new(Vec3::ZERO, 1.);
    walker.turn(-90.);
    assert_eq!(walker.heading, 270.);
    walker.turn(180.);
    assert_eq!(walker.heading, 90.);
}

#[test]
fn test_rotate_sweeps_and_turns_back() {
    let walker = Rc::new(RefCell::new(Walker::new(Vec3::ZERO, 1.)));
    let mut node = rotate("LookAround", walker.clone(), 180., 90.);
    let clock = ManualClock::new();
    let mut ctx = quiet().with_clock(clock.clone());

    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().heading, 0.);

    clock.set_secs(1.);
    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().heading, 90.);

    clock.set_secs(2.5);
    assert_eq!(node.tick(&mut ctx), Status::Success);
    assert_eq!(walker.borrow().heading, 0.);

    // A new sweep starts from the current time.
    assert_eq!(node.tick(&mut ctx), Status::Running);
    clock.set_secs(3.);
    assert_eq!(node.tick(&mut ctx), Status::Running);
    assert_eq!(walker.borrow().heading, 45.);
}

#[test]
fn test_rotate_without_speed() {
    let walker = Rc::new(RefCell::new(Walker::new(Vec3::ZERO, 1.)));
    let mut ctx = quiet();
    assert_eq!(rotate("Stuck", walker.clone(), 90., 0.).tick(&mut ctx), Status::Failure);
    assert_eq!(rotate("Nothing", walker, 0., 0.).tick(&mut ctx), Status::Success);
}

#[test]
fn test_can_see() {
    let eyes = Rc::new(RefCell::new(Eyes { sees: "Player" }));
    let mut player = can_see("SeePlayer", eyes.clone(), "player", "Player", 10., 45.);
    let mut cop = can_see("SeeCop", eyes, "player", "Cop", 10., 45.);

    let mut ctx = quiet();
    assert_eq!(player.tick(&mut ctx), Status::Failure);

    ctx.set("player", Vec3::ONE);
    assert_eq!(player.tick(&mut ctx), Status::Success);
    assert_eq!(cop.tick(&mut ctx), Status::Failure);
}

#[test]
fn test_agent_pause() -> anyhow::Result<()> {
    let tree = BehaviorTree::new("Agent").with_child(
        Node::sequence("Twice").with_children([Node::debug("a"), Node::debug("b")])?,
    );
    let mut agent = Agent::new(tree);
    let mut ctx = quiet();

    assert_eq!(agent.status(), Status::Running);
    assert_eq!(agent.update(&mut ctx), Some(Status::Running));

    agent.pause();
    assert!(agent.is_paused());
    assert_eq!(agent.update(&mut ctx), None);
    assert_eq!(agent.tree().children()[0].current_child(), 1);

    agent.resume();
    assert_eq!(agent.update(&mut ctx), Some(Status::Success));
    assert_eq!(agent.status(), Status::Success);
    Ok(())
}
