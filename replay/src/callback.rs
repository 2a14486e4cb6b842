//! Callback registry and shared per-pass state.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

use reverb_core::{DefinitionError, Event, EventType, FormatError};
use thiserror::Error;

// REPLAY ERROR
// ================================================================================================

/// Error surfaced from a replay callback; the driver short-circuits the walk
/// on the first one.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// An analysis invariant was violated inside a callback.
    #[error("{0}")]
    Runtime(String),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ReplayError {
    /// Shorthand for an invariant violation with a formatted message.
    pub fn runtime(message: impl Into<String>) -> Self {
        ReplayError::Runtime(message.into())
    }
}

// CALLBACK DATA
// ================================================================================================

/// Shared state passed through a replay.
///
/// The hooks run around every dispatched event: `preprocess` before the
/// first callback, `postprocess` after the last one. `postprocess` also runs
/// when a callback fails, so implementations can release per-event state on
/// the error path.
pub trait CallbackData {
    fn preprocess(&mut self, _event: &Event<'_>) {}
    fn postprocess(&mut self, _event: &Event<'_>) {}
}

/// Replays without shared state.
impl CallbackData for () {}

// CALLBACK MANAGER
// ================================================================================================

/// User-event value passed to callbacks triggered by event dispatch (rather
/// than by [`CallbackManager::notify`]).
pub const NO_USER_EVENT: u32 = 0;

/// A registered callback.
///
/// The `u32` argument carries the user-event id for callbacks triggered via
/// [`CallbackManager::notify`] and [`NO_USER_EVENT`] for type dispatch.
pub type Callback<D> =
    Rc<dyn Fn(&CallbackManager<D>, u32, &Event<'_>, &mut D) -> Result<(), ReplayError>>;

enum Pending<D> {
    Event(EventType, Callback<D>),
    User(u32, Callback<D>),
}

/// Registry of replay callbacks, keyed by event type (concrete types and
/// group predicates) and by user-defined event ids.
///
/// Dispatching an event runs every list whose key matches the event per
/// [`Event::is_of_type`] — the concrete type itself, concrete base types of
/// derived variants, and matching group predicates — each list in
/// registration order, key lists in ascending type order.
///
/// Callbacks may register further callbacks through the manager reference
/// they receive; such registrations only take effect for subsequent events.
pub struct CallbackManager<D> {
    event_cbs: RefCell<BTreeMap<EventType, Vec<Callback<D>>>>,
    user_cbs: RefCell<BTreeMap<u32, Vec<Callback<D>>>>,
    pending: RefCell<Vec<Pending<D>>>,
    depth: Cell<u32>,
}

impl<D> CallbackManager<D> {
    pub fn new() -> Self {
        Self {
            event_cbs: RefCell::new(BTreeMap::new()),
            user_cbs: RefCell::new(BTreeMap::new()),
            pending: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    // REGISTRATION
    // --------------------------------------------------------------------------------------------

    /// Registers a callback for all events matching `event_type`.
    pub fn register_callback<F>(&self, event_type: EventType, callback: F)
    where
        F: Fn(&CallbackManager<D>, u32, &Event<'_>, &mut D) -> Result<(), ReplayError> + 'static,
    {
        self.add_event_callback(event_type, Rc::new(callback));
    }

    /// Registers a callback under a user-defined event id, to be triggered
    /// explicitly via [`CallbackManager::notify`].
    pub fn register_user_callback<F>(&self, user_event: u32, callback: F)
    where
        F: Fn(&CallbackManager<D>, u32, &Event<'_>, &mut D) -> Result<(), ReplayError> + 'static,
    {
        self.add_user_callback(user_event, Rc::new(callback));
    }

    fn add_event_callback(&self, event_type: EventType, callback: Callback<D>) {
        if self.depth.get() > 0 {
            self.pending.borrow_mut().push(Pending::Event(event_type, callback));
        } else {
            self.event_cbs.borrow_mut().entry(event_type).or_default().push(callback);
        }
    }

    fn add_user_callback(&self, user_event: u32, callback: Callback<D>) {
        if self.depth.get() > 0 {
            self.pending.borrow_mut().push(Pending::User(user_event, callback));
        } else {
            self.user_cbs.borrow_mut().entry(user_event).or_default().push(callback);
        }
    }

    // DISPATCH
    // --------------------------------------------------------------------------------------------

    /// Runs all callbacks matching `event`, in key order then registration
    /// order. The snapshot of matching callbacks is fixed before the first
    /// one runs.
    pub fn dispatch(&self, event: &Event<'_>, data: &mut D) -> Result<(), ReplayError> {
        let snapshot: Vec<Callback<D>> = {
            let map = self.event_cbs.borrow();
            map.iter()
                .filter(|(key, _)| event.is_of_type(**key))
                .flat_map(|(_, callbacks)| callbacks.iter().cloned())
                .collect()
        };
        self.run(snapshot, NO_USER_EVENT, event, data)
    }

    /// Triggers the callbacks registered under a user-defined event id,
    /// passing the trace event that caused the notification.
    pub fn notify(
        &self,
        user_event: u32,
        event: &Event<'_>,
        data: &mut D,
    ) -> Result<(), ReplayError> {
        let snapshot: Vec<Callback<D>> = {
            let map = self.user_cbs.borrow();
            map.get(&user_event).map(|callbacks| callbacks.to_vec()).unwrap_or_default()
        };
        self.run(snapshot, user_event, event, data)
    }

    fn run(
        &self,
        snapshot: Vec<Callback<D>>,
        user_event: u32,
        event: &Event<'_>,
        data: &mut D,
    ) -> Result<(), ReplayError> {
        self.depth.set(self.depth.get() + 1);
        let mut result = Ok(());
        for callback in &snapshot {
            result = callback(self, user_event, event, data);
            if result.is_err() {
                break;
            }
        }
        self.depth.set(self.depth.get() - 1);
        if self.depth.get() == 0 {
            self.apply_pending();
        }
        result
    }

    fn apply_pending(&self) {
        for pending in self.pending.borrow_mut().drain(..) {
            match pending {
                Pending::Event(event_type, callback) => {
                    self.event_cbs.borrow_mut().entry(event_type).or_default().push(callback);
                },
                Pending::User(user_event, callback) => {
                    self.user_cbs.borrow_mut().entry(user_event).or_default().push(callback);
                },
            }
        }
    }
}

impl<D> Default for CallbackManager<D> {
    fn default() -> Self {
        Self::new()
    }
}
