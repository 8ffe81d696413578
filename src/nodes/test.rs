use super::*;
use crate::{error::AddChildError, ManualClock, NullObserver, StatusChange, StatusObserver};
use std::{cell::RefCell, rc::Rc};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn quiet() -> Context {
    Context::default().with_observer(NullObserver)
}

/// Leaf that records its name and returns `status` on every tick.
fn append(log: &Log, name: &'static str, status: Status) -> Node {
    let log = log.clone();
    Node::action(name, move |_: &mut Context| {
        log.borrow_mut().push(name);
        status
    })
}

fn entries(log: &Log) -> Vec<&'static str> {
    log.borrow().clone()
}

#[test]
fn test_sequence() {
    let log = Log::default();
    let mut tree = Node::sequence("seq")
        .with_children([
            append(&log, "a", Status::Success),
            append(&log, "b", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(entries(&log), ["a"]);
    assert_eq!(tree.current_child(), 1);

    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(entries(&log), ["a", "b"]);
    assert_eq!(tree.current_child(), 0);
}

#[test]
fn test_sequence_failure_resets() {
    let log = Log::default();
    let mut tree = Node::sequence("seq")
        .with_children([
            append(&log, "a", Status::Success),
            append(&log, "b", Status::Failure),
            append(&log, "c", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(tree.current_child(), 0);

    // The next pass starts over from the first child.
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(entries(&log), ["a", "b", "a"]);
}

#[test]
fn test_sequence_suspend() {
    let log = Log::default();
    let mut tree = Node::sequence("seq")
        .with_children([
            append(&log, "a", Status::Success),
            append(&log, "suspend", Status::Running),
            append(&log, "b", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    for _ in 0..3 {
        assert_eq!(tree.tick(&mut ctx), Status::Running);
    }

    // Even ticking again won't reach "b", nor go back to "a"
    assert_eq!(entries(&log), ["a", "suspend", "suspend"]);
    assert_eq!(tree.current_child(), 1);
}

#[test]
fn test_selector() {
    let log = Log::default();
    let mut tree = Node::selector("sel")
        .with_children([
            append(&log, "a", Status::Failure),
            append(&log, "b", Status::Success),
            append(&log, "c", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(entries(&log), ["a", "b"]);
    assert_eq!(tree.current_child(), 0);
}

#[test]
fn test_selector_all_fail() {
    let log = Log::default();
    let mut tree = Node::selector("sel")
        .with_children([
            append(&log, "a", Status::Failure),
            append(&log, "b", Status::Failure),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(entries(&log), ["a", "b", "a"]);
}

#[test]
fn test_prioritising_selector() {
    let log = Log::default();
    let mut tree = Node::prioritising_selector("prio")
        .with_children([
            append(&log, "five", Status::Failure).with_priority(5),
            append(&log, "one", Status::Failure).with_priority(1),
            append(&log, "three", Status::Failure).with_priority(3),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    let names: Vec<_> = tree.children().iter().map(Node::name).collect();
    assert_eq!(names, ["one", "three", "five"]);

    // Changing a priority mid-pass only takes effect on the next pass.
    tree.find_mut("five").unwrap().set_priority(0);
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(entries(&log), ["one", "three", "five"]);

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(entries(&log).last(), Some(&"five"));
}

#[test]
fn test_prioritising_selector_stable() {
    let log = Log::default();
    let mut tree = Node::prioritising_selector("prio")
        .with_children([
            append(&log, "a", Status::Failure),
            append(&log, "b", Status::Failure),
            append(&log, "c", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    while tree.tick(&mut ctx) == Status::Running {}
    assert_eq!(entries(&log), ["a", "b", "c"]);
}

#[test]
fn test_dynamic_prioritising_selector() {
    let log = Log::default();
    let mut tree = Node::dynamic_prioritising_selector("dyn")
        .with_children([
            append(&log, "a", Status::Failure),
            append(&log, "b", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(tree.find("a").unwrap().priority(), 10);
    assert_eq!(tree.find("b").unwrap().priority(), 1);

    // The child that succeeded is now tried first.
    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(entries(&log), ["a", "b", "b"]);
}

#[test]
fn test_dynamic_priorities_custom() {
    let log = Log::default();
    let mut tree = Node::dynamic_prioritising_selector_with(
        "dyn",
        DynamicPriorities {
            on_success: 7,
            on_failure: -7,
        },
    )
    .with_children([
        append(&log, "a", Status::Failure),
        append(&log, "b", Status::Success),
    ])
    .unwrap();
    let mut ctx = quiet();

    while tree.tick(&mut ctx) == Status::Running {}
    assert_eq!(tree.find("a").unwrap().priority(), -7);
    assert_eq!(tree.find("b").unwrap().priority(), 7);
}

fn random_run(seed: u64, passes: usize) -> Vec<&'static str> {
    let log = Log::default();
    let mut tree = Node::random_selector_seeded("rand", seed)
        .with_children(
            ["a", "b", "c", "d", "e"]
                .into_iter()
                .map(|name| append(&log, name, Status::Failure)),
        )
        .unwrap();
    let mut ctx = quiet();
    for _ in 0..passes {
        while tree.tick(&mut ctx) == Status::Running {}
    }
    entries(&log)
}

#[test]
fn test_random_selector_seeded() {
    let first = random_run(42, 3);
    assert_eq!(first, random_run(42, 3));

    // Every pass tries each child exactly once.
    for pass in first.chunks(5) {
        let mut pass = pass.to_vec();
        pass.sort_unstable();
        assert_eq!(pass, ["a", "b", "c", "d", "e"]);
    }
}

#[test]
fn test_random_selector_single_child() {
    let log = Log::default();
    let mut tree = Node::random_selector("rand")
        .with_children([append(&log, "solo", Status::Success)])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(entries(&log), ["solo", "solo"]);
}

#[test]
fn test_inverter() {
    let log = Log::default();
    let mut ctx = quiet();
    for (input, output) in [
        (Status::Success, Status::Failure),
        (Status::Failure, Status::Success),
        (Status::Running, Status::Running),
    ] {
        let mut tree = Node::inverter("not")
            .with_children([append(&log, "x", input)])
            .unwrap();
        assert_eq!(tree.tick(&mut ctx), output);
    }
}

#[test]
fn test_add_child_errors() {
    let log = Log::default();

    let mut inverter = Node::inverter("not");
    inverter.add_child(append(&log, "a", Status::Success)).unwrap();
    assert!(matches!(
        inverter.add_child(append(&log, "b", Status::Success)),
        Err(AddChildError::TooManyNodes { max: 1, .. })
    ));

    for mut leaf in [
        Node::leaf("leaf"),
        Node::condition("cond", |_| true),
        Node::wait("wait", Duration::from_secs(1)),
        Node::debug("debug"),
    ] {
        assert!(leaf.is_leaf());
        assert!(matches!(
            leaf.add_child(Node::leaf("child")),
            Err(AddChildError::TooManyNodes { max: 0, .. })
        ));
    }

    assert!(Node::sequence("seq")
        .with_children((0..100).map(|_| Node::leaf("many")))
        .is_ok());
}

#[test]
fn test_unbound_leaf() {
    assert_eq!(Node::leaf("nothing").tick(&mut quiet()), Status::Failure);
}

#[test]
fn test_condition() {
    let mut ctx = quiet();
    let mut cond = Node::condition("armed", |ctx| ctx.get::<bool>("armed") == Some(&true));
    assert_eq!(cond.tick(&mut ctx), Status::Failure);
    ctx.set("armed", true);
    assert_eq!(cond.tick(&mut ctx), Status::Success);
}

#[test]
fn test_indexed_action() {
    let seen = Rc::new(RefCell::new(vec![]));
    let push = |index| {
        let seen = seen.clone();
        Node::indexed_action("visit", index, move |index, _: &mut Context| {
            seen.borrow_mut().push(index);
            Status::Success
        })
    };
    let mut tree = Node::sequence("seq")
        .with_children([push(3), push(1)])
        .unwrap();
    let mut ctx = quiet();
    while tree.tick(&mut ctx) == Status::Running {}
    assert_eq!(*seen.borrow(), [3, 1]);
}

#[test]
fn test_wait() {
    let clock = ManualClock::new();
    let mut ctx = quiet().with_clock(clock.clone());
    let mut wait = Node::wait("wait", Duration::from_secs(1));

    for secs in [0., 0.5, 0.9] {
        clock.set_secs(secs);
        assert_eq!(wait.tick(&mut ctx), Status::Running);
    }
    clock.set_secs(1.);
    assert_eq!(wait.tick(&mut ctx), Status::Success);

    // It starts over on the tick after it succeeded.
    assert_eq!(wait.tick(&mut ctx), Status::Running);
    clock.set_secs(2.);
    assert_eq!(wait.tick(&mut ctx), Status::Success);
}

#[test]
fn test_wait_reset() {
    let clock = ManualClock::new();
    let mut ctx = quiet().with_clock(clock.clone());
    let mut wait = Node::wait("wait", Duration::from_secs(1));

    assert_eq!(wait.tick(&mut ctx), Status::Running);
    wait.reset();
    clock.set_secs(0.6);
    assert_eq!(wait.tick(&mut ctx), Status::Running);
    clock.set_secs(1.5);
    assert_eq!(wait.tick(&mut ctx), Status::Running);
    clock.set_secs(1.6);
    assert_eq!(wait.tick(&mut ctx), Status::Success);
}

#[test]
fn test_wait_clock_backwards() {
    let clock = ManualClock::new();
    clock.set_secs(5.);
    let mut ctx = quiet().with_clock(clock.clone());
    let mut wait = Node::wait("wait", Duration::from_secs(1));

    assert_eq!(wait.tick(&mut ctx), Status::Running);
    clock.set_secs(1.);
    assert_eq!(wait.tick(&mut ctx), Status::Running);
    clock.set_secs(6.);
    assert_eq!(wait.tick(&mut ctx), Status::Success);
}

#[test]
fn test_loop_resets_nested_children() {
    let log = Log::default();
    let mut tree = Node::loop_while("loop", Guard::condition("always", |_| true))
        .with_children([
            Node::sequence("inner")
                .with_children([
                    append(&log, "a", Status::Success),
                    append(&log, "b", Status::Success),
                ])
                .unwrap(),
            append(&log, "c", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.children()[0].current_child(), 1);
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.current_child(), 1);

    // Finishing the last child wraps the pass around.
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.current_child(), 0);
    assert_eq!(tree.children()[0].current_child(), 0);
    assert_eq!(entries(&log), ["a", "b", "c"]);

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(entries(&log), ["a", "b", "c", "a"]);
}

#[test]
fn test_loop() {
    let log = Log::default();
    let mut tree = Node::loop_while(
        "loop",
        Guard::condition("keep_going", |ctx| ctx.get::<bool>("keep_going") == Some(&true)),
    )
    .with_children([
        append(&log, "a", Status::Success),
        append(&log, "b", Status::Success),
    ])
    .unwrap();
    let mut ctx = quiet();
    ctx.set("keep_going", true);

    for _ in 0..3 {
        assert_eq!(tree.tick(&mut ctx), Status::Running);
    }
    assert_eq!(entries(&log), ["a", "b", "a"]);

    ctx.set("keep_going", false);
    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(tree.current_child(), 0);
    assert_eq!(entries(&log), ["a", "b", "a"]);
}

#[test]
fn test_loop_child_failure() {
    let log = Log::default();
    let mut tree = Node::loop_while("loop", Guard::condition("always", |_| true))
        .with_children([
            append(&log, "a", Status::Success),
            append(&log, "b", Status::Failure),
        ])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(tree.current_child(), 0);
}

#[test]
fn test_dependency_sequence() {
    let log = Log::default();
    let failures = Rc::new(RefCell::new(0));
    let counter = failures.clone();
    let mut tree = Node::dependency_sequence_or_else(
        "dep",
        Guard::condition("armed", |ctx| ctx.get::<bool>("armed") == Some(&true)),
        move |_| *counter.borrow_mut() += 1,
    )
    .with_children([
        append(&log, "a", Status::Success),
        append(&log, "b", Status::Success),
    ])
    .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(*failures.borrow(), 1);
    assert!(entries(&log).is_empty());

    ctx.set("armed", true);
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.current_child(), 1);

    // Losing the guard mid-run abandons the progress made so far.
    ctx.set("armed", false);
    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(*failures.borrow(), 2);
    assert_eq!(tree.current_child(), 0);

    ctx.set("armed", true);
    assert_eq!(tree.tick(&mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut ctx), Status::Success);
    assert_eq!(entries(&log), ["a", "a", "b"]);
}

#[test]
fn test_running_guard_passes() {
    let log = Log::default();
    let mut tree = Node::dependency_sequence(
        "dep",
        Node::action("pending", |_: &mut Context| Status::Running),
    )
    .with_children([append(&log, "a", Status::Success)])
    .unwrap();

    assert_eq!(tree.tick(&mut quiet()), Status::Success);
    assert_eq!(entries(&log), ["a"]);
}

#[test]
fn test_guard_tree() {
    let guard = BehaviorTree::new("guard").with_child(
        Node::inverter("not_tired")
            .with_children([Node::condition("tired", |ctx| {
                ctx.get::<bool>("tired") == Some(&true)
            })])
            .unwrap(),
    );
    let log = Log::default();
    let mut tree = Node::dependency_sequence("dep", guard)
        .with_children([append(&log, "work", Status::Success)])
        .unwrap();
    let mut ctx = quiet();

    assert_eq!(tree.tick(&mut ctx), Status::Success);
    ctx.set("tired", true);
    assert_eq!(tree.tick(&mut ctx), Status::Failure);
    assert_eq!(entries(&log), ["work"]);
}

#[test]
fn test_reset() {
    let log = Log::default();
    let mut tree = Node::sequence("seq")
        .with_children([
            append(&log, "a", Status::Success),
            Node::sequence("inner")
                .with_children([
                    append(&log, "b", Status::Success),
                    append(&log, "c", Status::Success),
                ])
                .unwrap(),
        ])
        .unwrap();
    let mut ctx = quiet();

    tree.tick(&mut ctx);
    tree.tick(&mut ctx);
    assert_eq!(tree.current_child(), 1);
    assert_eq!(tree.children()[1].current_child(), 1);

    tree.reset();
    assert_eq!(tree.current_child(), 0);
    assert_eq!(tree.children()[1].current_child(), 0);
    let status = tree.status();

    // Resetting twice is the same as resetting once.
    tree.reset();
    assert_eq!(tree.current_child(), 0);
    assert_eq!(tree.status(), status);

    tree.tick(&mut ctx);
    assert_eq!(entries(&log), ["a", "b", "a"]);
}

#[test]
fn test_remove_child() {
    let log = Log::default();
    let mut tree = Node::sequence("seq")
        .with_children([
            append(&log, "a", Status::Success),
            append(&log, "b", Status::Success),
            append(&log, "c", Status::Success),
        ])
        .unwrap();
    let mut ctx = quiet();
    tree.tick(&mut ctx);
    tree.tick(&mut ctx);
    assert_eq!(tree.current_child(), 2);

    assert!(tree.remove_child(5).is_none());
    assert_eq!(tree.remove_child(2).map(|node| node.name().to_owned()), Some("c".to_owned()));
    assert_eq!(tree.current_child(), 0);

    tree.remove_children();
    assert!(tree.children().is_empty());
}

#[derive(Default, Clone)]
struct Recorder {
    changes: Rc<RefCell<Vec<(String, Status, Status)>>>,
    messages: Rc<RefCell<Vec<String>>>,
}

impl StatusObserver for Recorder {
    fn status_changed(&mut self, change: &StatusChange) {
        self.changes
            .borrow_mut()
            .push((change.name.to_owned(), change.old, change.new));
    }

    fn message(&mut self, _node: &str, message: &str) {
        self.messages.borrow_mut().push(message.to_owned());
    }
}

#[test]
fn test_observer_sees_changes_only() {
    let recorder = Recorder::default();
    let mut ctx = Context::default().with_observer(recorder.clone());
    let mut cond = Node::condition("ready", |ctx| ctx.get::<bool>("ready") == Some(&true));

    ctx.set("ready", true);
    for _ in 0..3 {
        cond.tick(&mut ctx);
    }
    ctx.set("ready", false);
    cond.tick(&mut ctx);

    assert_eq!(
        *recorder.changes.borrow(),
        [
            ("ready".to_owned(), Status::Running, Status::Success),
            ("ready".to_owned(), Status::Success, Status::Failure),
        ]
    );
}

#[test]
fn test_debug_disabled() {
    let recorder = Recorder::default();
    let mut ctx = Context::default().with_observer(recorder.clone());
    ctx.set_debug_enabled(false);

    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    let mut node = Node::debug_message("say", move |_| {
        *counter.borrow_mut() += 1;
        "hello".to_owned()
    });

    assert_eq!(node.tick(&mut ctx), Status::Success);
    assert_eq!(*calls.borrow(), 0);
    assert!(recorder.changes.borrow().is_empty());

    ctx.set_debug_enabled(true);
    node.reset();
    assert_eq!(node.tick(&mut ctx), Status::Success);
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(*recorder.messages.borrow(), ["hello"]);
    // The status already changed while nobody was listening.
    assert!(recorder.changes.borrow().is_empty());
}

#[test]
#[cfg(debug_assertions)]
#[should_panic]
fn test_empty_composite_panics() {
    Node::sequence("empty").tick(&mut quiet());
}
