//! Type-indexed publish/subscribe between trees and the systems around them.
//!
//! Listeners are keyed by the concrete event type. Registration hands back a
//! [`ListenerId`] that removes exactly that registration later on; adding the
//! same `Rc` twice for one event type returns the original id instead of
//! subscribing again.
//!
//! ```
//! # use agent_behavior_tree::{Event, EventBus, Listener};
//! # use std::{cell::Cell, rc::Rc};
//! struct EnemySpotted(u32);
//! impl Event for EnemySpotted {}
//!
//! let bus = EventBus::new();
//! let seen = Rc::new(Cell::new(0));
//! let seen2 = seen.clone();
//! let listener: Listener<EnemySpotted> = Rc::new(move |e: &EnemySpotted| {
//!     seen2.set(e.0);
//!     Ok(())
//! });
//! bus.add_listener(&listener);
//! bus.broadcast(&EnemySpotted(7)).unwrap();
//! assert_eq!(seen.get(), 7);
//! ```

use crate::error::{EventError, ListenerError};
use std::{
    any::{type_name, Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};

/// Marker for payloads that can be broadcast. The concrete type is the event kind.
pub trait Event: Any {}

pub type ListenerResult = Result<(), ListenerError>;
pub type Listener<E> = Rc<dyn Fn(&E) -> ListenerResult>;

type Thunk = Rc<dyn Fn(&dyn Any) -> ListenerResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    /// Address of the listener allocation. Stays unique while the thunk keeps the `Rc` alive.
    identity: usize,
    thunk: Thunk,
}

#[derive(Default)]
struct Registrations {
    next_id: u64,
    by_kind: HashMap<TypeId, Vec<Registration>>,
    kinds: HashMap<ListenerId, TypeId>,
}

/// Listener registry. All methods take `&self`, so a listener holding an
/// `Rc<EventBus>` may add or remove listeners while a broadcast is running.
/// Such changes apply from the next broadcast on: each broadcast delivers to
/// the listeners registered when it started.
#[derive(Default)]
pub struct EventBus {
    inner: RefCell<Registrations>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<E: Event>(&self, listener: &Listener<E>) -> ListenerId {
        let identity = Rc::as_ptr(listener) as *const () as usize;
        let mut inner = self.inner.borrow_mut();
        let kind = TypeId::of::<E>();

        if let Some(existing) = inner
            .by_kind
            .get(&kind)
            .and_then(|regs| regs.iter().find(|reg| reg.identity == identity))
        {
            return existing.id;
        }

        let id = ListenerId(inner.next_id);
        inner.next_id += 1;

        let listener = Rc::clone(listener);
        let thunk: Thunk = Rc::new(move |event: &dyn Any| match event.downcast_ref::<E>() {
            Some(event) => listener(event),
            None => Ok(()),
        });

        inner.by_kind.entry(kind).or_default().push(Registration {
            id,
            identity,
            thunk,
        });
        inner.kinds.insert(id, kind);
        id
    }

    /// Removes a registration by its token. Unknown ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(kind) = inner.kinds.remove(&id) else {
            return false;
        };
        let now_empty = match inner.by_kind.get_mut(&kind) {
            Some(regs) => {
                regs.retain(|reg| reg.id != id);
                regs.is_empty()
            }
            None => false,
        };
        if now_empty {
            inner.by_kind.remove(&kind);
        }
        true
    }

    /// Removes a registration by listener identity, for callers that kept the `Rc` but not the id.
    pub fn remove_listener_fn<E: Event>(&self, listener: &Listener<E>) -> bool {
        let identity = Rc::as_ptr(listener) as *const () as usize;
        let id = self
            .inner
            .borrow()
            .by_kind
            .get(&TypeId::of::<E>())
            .and_then(|regs| regs.iter().find(|reg| reg.identity == identity))
            .map(|reg| reg.id);
        id.map_or(false, |id| self.remove_listener(id))
    }

    /// Delivers `event` to every listener of its type in registration order
    /// and returns how many were called.
    ///
    /// The first listener error aborts delivery to the remaining listeners
    /// and is returned to the caller.
    pub fn broadcast<E: Event>(&self, event: &E) -> Result<usize, EventError> {
        let snapshot: Vec<Thunk> = self
            .inner
            .borrow()
            .by_kind
            .get(&TypeId::of::<E>())
            .map(|regs| regs.iter().map(|reg| Rc::clone(&reg.thunk)).collect())
            .unwrap_or_default();

        tracing::trace!(
            event = type_name::<E>(),
            listeners = snapshot.len(),
            "broadcast"
        );

        for thunk in &snapshot {
            thunk(event as &dyn Any).map_err(|source| EventError::Listener {
                event: type_name::<E>(),
                source,
            })?;
        }
        Ok(snapshot.len())
    }

    pub fn listener_count<E: Event>(&self) -> usize {
        self.inner
            .borrow()
            .by_kind
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.inner.borrow().kinds.contains_key(&id)
    }

    /// Drops every registration of every event type.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.by_kind.clear();
        inner.kinds.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("kinds", &inner.by_kind.len())
            .field("listeners", &inner.kinds.len())
            .finish()
    }
}
