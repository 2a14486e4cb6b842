//! Lightweight event handles.
//!
//! An [`Event`] is a copyable cursor into a [`LocalTrace`]; a [`RemoteEvent`]
//! is a free-standing record received from another location. Two handles
//! compare equal iff they denote the same physical record.

use std::{fmt, ptr};

use crate::{
    Buffer, EventRecord, EventType, Timestamp,
    defs::{CallpathId, LocationId},
    trace::LocalTrace,
};

mod remote;
mod time_segment;

pub use remote::{RemoteEvent, RemoteRmaEpoch};
pub use time_segment::{RemoteTimeSegment, SegmentError, TimeSegment};

// EVENT
// ================================================================================================

/// Cursor over a local trace.
///
/// The handle carries the trace pointer plus the position, so all per-event
/// context (record, callpath, location) is available in O(1) during replay.
#[derive(Clone, Copy)]
pub struct Event<'t> {
    trace: &'t LocalTrace,
    index: usize,
}

impl<'t> Event<'t> {
    pub(crate) fn new(trace: &'t LocalTrace, index: usize) -> Self {
        debug_assert!(index < trace.len());
        Self { trace, index }
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    /// Position of this event within its trace.
    pub fn id(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> &'t EventRecord {
        // The index is validated at construction and traces never shrink.
        self.trace.record(self.index).expect("event index in range")
    }

    pub fn event_type(&self) -> EventType {
        self.record().event_type()
    }

    pub fn is_of_type(&self, ty: EventType) -> bool {
        self.record().is_of_type(ty)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.record().timestamp()
    }

    /// Location the underlying trace was recorded on.
    pub fn location(&self) -> LocationId {
        self.trace.location()
    }

    /// Callpath of an enter/leave event; available after preprocessing.
    pub fn callpath(&self) -> Option<CallpathId> {
        self.record().callpath()
    }

    // NAVIGATION
    // --------------------------------------------------------------------------------------------

    pub fn next(&self) -> Option<Event<'t>> {
        self.trace.event(self.index + 1)
    }

    pub fn prev(&self) -> Option<Event<'t>> {
        self.index.checked_sub(1).and_then(|index| self.trace.event(index))
    }

    /// Next event of the same request chain (request to test/completion).
    pub fn next_request_event(&self) -> Option<Event<'t>> {
        let offset = self.trace.next_reqoffs(self.index)?;
        self.trace.event(self.index + offset)
    }

    /// Previous event of the same request chain (completion to test/request).
    pub fn prev_request_event(&self) -> Option<Event<'t>> {
        let offset = self.trace.prev_reqoffs(self.index)?;
        self.trace.event(self.index - offset)
    }

    /// Walks the request chain back to the originating request event.
    pub fn request(&self) -> Option<Event<'t>> {
        let mut current = self.prev_request_event()?;
        while let Some(prev) = current.prev_request_event() {
            current = prev;
        }
        Some(current)
    }

    /// Walks the request chain forward to its final completion event.
    pub fn completion(&self) -> Option<Event<'t>> {
        let mut current = self.next_request_event()?;
        while let Some(next) = current.next_request_event() {
            current = next;
        }
        Some(current)
    }

    // SERIALIZATION
    // --------------------------------------------------------------------------------------------

    /// Packs the event for transfer to a peer location: location id, callpath
    /// id, position in this trace, then the record itself.
    pub fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.location()));
        buffer.put_id(self.callpath());
        buffer.put_u32(self.index as u32);
        self.record().pack(buffer);
    }
}

impl PartialEq for Event<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.trace, other.trace) && self.index == other.index
    }
}

impl Eq for Event<'_> {}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("location", &self.location())
            .field("index", &self.index)
            .field("type", &self.event_type())
            .finish()
    }
}
