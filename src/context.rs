use crate::{
    observer::{StatusChange, StatusObserver, TracingObserver},
    Blackboard, Clock, EventBus, Status, Symbol, SystemClock,
};
use std::{fmt, rc::Rc, time::Duration};

/// Everything a tick can reach outside the tree itself.
///
/// Trees that tick with the same `Context` share one blackboard and one event
/// bus. Build one per simulation (or per test) and pass it to every tree.
pub struct Context {
    blackboard: Blackboard,
    events: Rc<EventBus>,
    clock: Box<dyn Clock>,
    observer: Box<dyn StatusObserver>,
    debug_enabled: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Blackboard::default())
    }
}

impl Context {
    pub fn new(blackboard: Blackboard) -> Self {
        Self {
            blackboard,
            events: Rc::new(EventBus::new()),
            clock: Box::new(SystemClock::default()),
            observer: Box::new(TracingObserver),
            debug_enabled: true,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_observer(mut self, observer: impl StatusObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Use an event bus that is also held elsewhere, e.g. by listeners.
    pub fn with_event_bus(mut self, events: Rc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn take_blackboard(self) -> Blackboard {
        self.blackboard
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn get<T: 'static>(&self, key: impl Into<Symbol>) -> Option<&T> {
        self.blackboard.try_get(key)
    }

    pub fn set<T: 'static>(&mut self, key: impl Into<Symbol>, val: T) {
        self.blackboard.set(key, val);
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn event_bus(&self) -> Rc<EventBus> {
        Rc::clone(&self.events)
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    /// Turns diagnostics for every node ticked with this context on or off.
    pub fn set_debug_enabled(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
    }

    pub(crate) fn report_status(&mut self, kind: &'static str, name: &str, old: Status, new: Status) {
        if self.debug_enabled && old != new {
            self.observer.status_changed(&StatusChange {
                kind,
                name,
                old,
                new,
            });
        }
    }

    pub(crate) fn report_message(&mut self, node: &str, message: &str) {
        if self.debug_enabled {
            self.observer.message(node, message);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("blackboard", &self.blackboard)
            .field("events", &self.events)
            .field("now", &self.clock.now())
            .field("debug_enabled", &self.debug_enabled)
            .finish()
    }
}
