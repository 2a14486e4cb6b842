//! Core data model of the Reverb trace-access library.
//!
//! This crate provides the in-memory representation of an event trace produced
//! by an instrumented parallel program: the unified definition catalogue
//! ([`GlobalDefs`]), the closed family of event records ([`EventRecord`]), the
//! per-location trace container ([`LocalTrace`]) with its calltree
//! verification and preprocessing passes, and the lightweight event handles
//! used during replay.

#[macro_use]
mod ids;

pub mod buffer;
pub mod defs;
pub mod event;
pub mod handle;
pub mod trace;

// RE-EXPORTS
// ================================================================================================

pub use buffer::{Buffer, BufferError};
pub use defs::{
    Callpath, CallpathId, Callsite, CallsiteId, CommSet, CommSetId, Communicator, CommunicatorId,
    DefinitionError, GlobalDefs, GlobalDefsBuilder, Location, LocationId, LocationKind, Membership,
    Metric, MetricId, Paradigm, Region, RegionId, RmaWindow, RmaWindowId, StringId,
};
pub use event::{CallContext, CollType, EventKind, EventRecord, EventType, FormatError};
pub use handle::{Event, RemoteEvent, RemoteRmaEpoch, RemoteTimeSegment, TimeSegment};
pub use ids::{Id, IdOverflowError, IdTable};
pub use trace::{CalltreeError, LocalTrace, preprocess_trace, verify_calltree};

// TYPE ALIASES
// ================================================================================================

/// Timestamp of a traced event, in seconds since trace begin.
pub type Timestamp = f64;

/// Identifier of a non-blocking communication request.
pub type RequestId = u64;

/// Request identifier used when no request is associated with an event.
pub const NO_REQUEST: RequestId = u64::MAX;
