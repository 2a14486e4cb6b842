//! Per-location trace container.

use std::collections::HashMap;

use crate::{EventRecord, defs::LocationId, handle::Event};

mod preprocess;

pub use preprocess::{CalltreeError, preprocess_trace, verify_calltree};

// LOCAL TRACE
// ================================================================================================

/// The ordered event sequence recorded on a single location.
///
/// The trace is append-only while the reader loads it and read-only during
/// replay; the preprocessing pass in this module is the only code that
/// rewrites records after loading. Events are kept in insertion order, which
/// the producer guarantees to be timestamp-monotonic.
#[derive(Debug)]
pub struct LocalTrace {
    location: LocationId,
    events: Vec<EventRecord>,

    /// Forward distance from a request-chain event to its successor.
    next_reqoffs: HashMap<usize, usize>,
    /// Backward distance from a request-chain event to its predecessor.
    prev_reqoffs: HashMap<usize, usize>,
}

impl LocalTrace {
    pub fn new(location: LocationId) -> Self {
        Self {
            location,
            events: Vec::new(),
            next_reqoffs: HashMap::new(),
            prev_reqoffs: HashMap::new(),
        }
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Location this trace was recorded on.
    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<&EventRecord> {
        self.events.get(index)
    }

    pub fn records(&self) -> impl DoubleEndedIterator<Item = &EventRecord> {
        self.events.iter()
    }

    // EVENT HANDLES
    // --------------------------------------------------------------------------------------------

    /// Cursor positioned on the event at `index`.
    pub fn event(&self, index: usize) -> Option<Event<'_>> {
        (index < self.events.len()).then(|| Event::new(self, index))
    }

    /// Cursor on the first event.
    pub fn first_event(&self) -> Option<Event<'_>> {
        self.event(0)
    }

    /// Cursor on the last event.
    pub fn last_event(&self) -> Option<Event<'_>> {
        self.len().checked_sub(1).and_then(|index| self.event(index))
    }

    /// Cursors over the whole trace in forward order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Event<'_>> {
        (0..self.events.len()).map(move |index| Event::new(self, index))
    }

    // LOADING
    // --------------------------------------------------------------------------------------------

    /// Appends a record at the end of the trace.
    pub fn append(&mut self, record: EventRecord) {
        self.events.push(record);
    }

    // REQUEST CHAIN OFFSETS
    // --------------------------------------------------------------------------------------------

    /// Forward distance from the request-chain event at `index` to its
    /// successor in the chain, if any.
    pub fn next_reqoffs(&self, index: usize) -> Option<usize> {
        self.next_reqoffs.get(&index).copied()
    }

    /// Backward distance from the request-chain event at `index` to its
    /// predecessor in the chain, if any.
    pub fn prev_reqoffs(&self, index: usize) -> Option<usize> {
        self.prev_reqoffs.get(&index).copied()
    }

    pub(crate) fn set_next_reqoffs(&mut self, index: usize, offset: usize) {
        self.next_reqoffs.insert(index, offset);
    }

    pub(crate) fn set_prev_reqoffs(&mut self, index: usize, offset: usize) {
        self.prev_reqoffs.insert(index, offset);
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> Option<&mut EventRecord> {
        self.events.get_mut(index)
    }
}
