//! Matched enter/leave pairs as comparable time segments.

use std::cmp::Ordering;

use thiserror::Error;

use crate::{
    EventType, Timestamp,
    defs::{CallpathId, LocationId},
    handle::{Event, RemoteEvent},
};

// SEGMENT ERROR
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("time segment requires an enter/leave event pair")]
    NotEnterLeavePair,
    #[error("time segment must not end before it starts")]
    NegativeDuration,
}

// TIME SEGMENT
// ================================================================================================

/// The span between a matched enter and leave event on the local trace.
///
/// Segments order by start time (then end time), which makes sorted segment
/// containers line up concurrent executions of the same callpath.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSegment {
    callpath: Option<CallpathId>,
    start: Timestamp,
    end: Timestamp,
}

impl TimeSegment {
    /// Builds a segment from a matched enter/leave pair.
    pub fn new(enter: &Event<'_>, leave: &Event<'_>) -> Result<Self, SegmentError> {
        if !enter.is_of_type(EventType::GroupEnter) || !leave.is_of_type(EventType::GroupLeave) {
            return Err(SegmentError::NotEnterLeavePair);
        }
        if leave.timestamp() < enter.timestamp() {
            return Err(SegmentError::NegativeDuration);
        }
        Ok(Self {
            callpath: enter.callpath(),
            start: enter.timestamp(),
            end: leave.timestamp(),
        })
    }

    pub fn callpath(&self) -> Option<CallpathId> {
        self.callpath
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration(&self) -> Timestamp {
        self.end - self.start
    }
}

impl PartialOrd for TimeSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.start, self.end).partial_cmp(&(other.start, other.end))
    }
}

// REMOTE TIME SEGMENT
// ================================================================================================

/// The span between a matched enter and leave event received from a peer
/// location.
#[derive(Debug, Clone)]
pub struct RemoteTimeSegment {
    location: LocationId,
    callpath: Option<CallpathId>,
    start: Timestamp,
    end: Timestamp,
}

impl RemoteTimeSegment {
    /// Builds a segment from a matched remote enter/leave pair.
    ///
    /// Both events must stem from the same location.
    pub fn new(enter: &RemoteEvent, leave: &RemoteEvent) -> Result<Self, SegmentError> {
        if !enter.is_of_type(EventType::GroupEnter)
            || !leave.is_of_type(EventType::GroupLeave)
            || enter.location() != leave.location()
        {
            return Err(SegmentError::NotEnterLeavePair);
        }
        if leave.timestamp() < enter.timestamp() {
            return Err(SegmentError::NegativeDuration);
        }
        Ok(Self {
            location: enter.location(),
            callpath: enter.callpath(),
            start: enter.timestamp(),
            end: leave.timestamp(),
        })
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn callpath(&self) -> Option<CallpathId> {
        self.callpath
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration(&self) -> Timestamp {
        self.end - self.start
    }
}

impl PartialEq for RemoteTimeSegment {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl PartialOrd for RemoteTimeSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.start, self.end).partial_cmp(&(other.start, other.end))
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EventRecord,
        defs::{GlobalDefsBuilder, Paradigm, Region},
        trace::LocalTrace,
    };

    fn bracket_trace() -> LocalTrace {
        let mut builder = GlobalDefsBuilder::new();
        let name = builder.add_string("main").unwrap();
        let region = builder
            .add_region(Region {
                name,
                paradigm: Paradigm::User,
                file: None,
                begin_line: None,
                end_line: None,
            })
            .unwrap();

        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(EventRecord::enter(1.0, region));
        trace.append(EventRecord::leave(3.5, region));
        trace.append(EventRecord::enter(4.0, region));
        trace.append(EventRecord::leave(4.0, region));
        trace
    }

    #[test]
    fn segment_exposes_start_end_duration() {
        let trace = bracket_trace();
        let segment =
            TimeSegment::new(&trace.event(0).unwrap(), &trace.event(1).unwrap()).unwrap();

        assert_eq!(segment.start(), 1.0);
        assert_eq!(segment.end(), 3.5);
        assert_eq!(segment.duration(), 2.5);
    }

    #[test]
    fn segments_order_by_start_time() {
        let trace = bracket_trace();
        let first = TimeSegment::new(&trace.event(0).unwrap(), &trace.event(1).unwrap()).unwrap();
        let second = TimeSegment::new(&trace.event(2).unwrap(), &trace.event(3).unwrap()).unwrap();

        assert!(first < second);
        assert!(second > first);
        assert_eq!(second.duration(), 0.0);
    }

    #[test]
    fn mismatched_pair_is_rejected() {
        let trace = bracket_trace();
        let enter = trace.event(0).unwrap();
        let leave = trace.event(1).unwrap();

        assert_eq!(
            TimeSegment::new(&leave, &enter),
            Err(SegmentError::NotEnterLeavePair)
        );
        assert_eq!(
            TimeSegment::new(&trace.event(2).unwrap(), &leave),
            Err(SegmentError::NegativeDuration)
        );
    }
}
