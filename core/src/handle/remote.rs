use std::rc::Rc;

use crate::{
    Buffer, EventRecord, EventType, Timestamp,
    defs::{CallpathId, DefKind, GlobalDefs, LocationId},
    event::FormatError,
};

/// Ordered list of remote events forming one epoch of one-sided operations
/// between matching synchronizations on an RMA window.
pub type RemoteRmaEpoch = Vec<RemoteEvent>;

// REMOTE EVENT
// ================================================================================================

/// An event received from another location, without iterator functionality.
///
/// The record is reference-counted so that analysis data structures (e.g.
/// collected epochs) can retain remote events cheaply.
#[derive(Debug, Clone)]
pub struct RemoteEvent {
    record: Rc<EventRecord>,
    location: LocationId,
    callpath: Option<CallpathId>,
    remote_index: u32,
}

impl RemoteEvent {
    /// Decodes an event packed by [`Event::pack`](crate::handle::Event::pack)
    /// on the sending side, resolving references against the (globally
    /// unified) definitions.
    pub fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let location = buffer
            .get_id::<LocationId>()?
            .ok_or(FormatError::MissingReference(DefKind::Location))?;
        defs.location(location)?;
        let callpath = buffer.get_id::<CallpathId>()?;
        if let Some(callpath) = callpath {
            defs.callpath(callpath)?;
        }
        let remote_index = buffer.get_u32()?;
        let record = Rc::new(EventRecord::unpack(defs, buffer)?);
        Ok(Self { record, location, callpath, remote_index })
    }

    // ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn record(&self) -> &EventRecord {
        &self.record
    }

    pub fn event_type(&self) -> EventType {
        self.record.event_type()
    }

    pub fn is_of_type(&self, ty: EventType) -> bool {
        self.record.is_of_type(ty)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.record.timestamp()
    }

    /// Location the event was recorded on.
    pub fn location(&self) -> LocationId {
        self.location
    }

    /// Callpath of the event within the sender's trace, if resolved.
    pub fn callpath(&self) -> Option<CallpathId> {
        self.callpath
    }

    /// Position of the event within the sender's trace.
    pub fn remote_index(&self) -> u32 {
        self.remote_index
    }
}

impl PartialEq for RemoteEvent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
            || (self.location == other.location && self.remote_index == other.remote_index)
    }
}

// TESTS
// ================================================================================================
