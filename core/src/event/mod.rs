//! The closed family of event records.
//!
//! Every traced event is an [`EventRecord`]: a timestamp plus one of the
//! concrete [`EventKind`] variants. The family is closed so that replay
//! dispatch tables stay O(1); derivation between related variants (e.g.
//! `MpiSendRequest` is-a `MpiSend`) is expressed by struct composition and by
//! [`EventRecord::is_of_type`].

use std::fmt;

use num_traits::FromPrimitive as _;
use thiserror::Error;

use crate::{
    Buffer, BufferError, RequestId, Timestamp,
    defs::{
        CallpathId, CallsiteId, CommSetId, CommunicatorId, DefKind, DefinitionError, GlobalDefs,
        LocationId, Paradigm, RegionId, RmaWindowId,
    },
};

mod collective;
mod enter;
mod event_type;
mod leave;
mod p2p;
mod rma;
mod thread;

#[cfg(test)]
mod tests;

pub use collective::{CollType, MpiCollBeginEvent, MpiCollEndEvent};
pub use enter::{CallContext, EnterCsEvent, EnterEvent, EnterProgramEvent, MetricSamples};
pub use event_type::EventType;
pub use leave::{LeaveEvent, LeaveProgramEvent};
pub use p2p::{
    MpiCancelledEvent, MpiRecvCompleteEvent, MpiRecvEvent, MpiRecvRequestEvent,
    MpiRequestTestedEvent, MpiSendCompleteEvent, MpiSendEvent, MpiSendRequestEvent,
};
pub use rma::{
    MpiRmaCollBeginEvent, MpiRmaCollEndEvent, MpiRmaGatsEvent, MpiRmaGetEndEvent,
    MpiRmaGetStartEvent, MpiRmaLockEvent, MpiRmaPutEndEvent, MpiRmaPutStartEvent,
    MpiRmaUnlockEvent, RmaGetEndEvent, RmaGetStartEvent, RmaPutEndEvent, RmaPutStartEvent,
};
pub use thread::{
    ThreadAcquireLockEvent, ThreadBeginEvent, ThreadCreateEvent, ThreadEndEvent, ThreadForkEvent,
    ThreadJoinEvent, ThreadReleaseLockEvent, ThreadTaskCompleteEvent, ThreadTaskCreateEvent,
    ThreadTaskSwitchEvent, ThreadTeamBeginEvent, ThreadTeamEndEvent, ThreadWaitEvent,
};

// FORMAT ERROR
// ================================================================================================

/// Error raised while decoding an event record or message payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("invalid event type tag {0}")]
    InvalidEventTag(u8),
    #[error("invalid collective operation tag {0}")]
    InvalidCollType(u8),
    #[error("invalid paradigm tag {0}")]
    InvalidParadigm(u8),
    #[error("invalid call context state byte {0}")]
    InvalidCallContextState(u8),
    #[error("missing required {0} reference")]
    MissingReference(DefKind),
}

// EVENT KIND
// ================================================================================================

/// Variant-specific payload of an event record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Enter(EnterEvent),
    EnterCs(EnterCsEvent),
    EnterProgram(EnterProgramEvent),
    Leave(LeaveEvent),
    LeaveProgram(LeaveProgramEvent),
    MpiCollBegin(MpiCollBeginEvent),
    MpiCollEnd(MpiCollEndEvent),
    MpiSend(MpiSendEvent),
    MpiSendRequest(MpiSendRequestEvent),
    MpiSendComplete(MpiSendCompleteEvent),
    MpiRecv(MpiRecvEvent),
    MpiRecvRequest(MpiRecvRequestEvent),
    MpiRecvComplete(MpiRecvCompleteEvent),
    MpiRequestTested(MpiRequestTestedEvent),
    MpiCancelled(MpiCancelledEvent),
    ThreadAcquireLock(ThreadAcquireLockEvent),
    ThreadReleaseLock(ThreadReleaseLockEvent),
    ThreadTaskCreate(ThreadTaskCreateEvent),
    ThreadTaskComplete(ThreadTaskCompleteEvent),
    ThreadTaskSwitch(ThreadTaskSwitchEvent),
    ThreadBegin(ThreadBeginEvent),
    ThreadEnd(ThreadEndEvent),
    ThreadCreate(ThreadCreateEvent),
    ThreadWait(ThreadWaitEvent),
    ThreadFork(ThreadForkEvent),
    ThreadJoin(ThreadJoinEvent),
    ThreadTeamBegin(ThreadTeamBeginEvent),
    ThreadTeamEnd(ThreadTeamEndEvent),
    RmaPutStart(RmaPutStartEvent),
    RmaPutEnd(RmaPutEndEvent),
    RmaGetStart(RmaGetStartEvent),
    RmaGetEnd(RmaGetEndEvent),
    MpiRmaPutStart(MpiRmaPutStartEvent),
    MpiRmaPutEnd(MpiRmaPutEndEvent),
    MpiRmaGetStart(MpiRmaGetStartEvent),
    MpiRmaGetEnd(MpiRmaGetEndEvent),
    MpiRmaGats(MpiRmaGatsEvent),
    MpiRmaCollBegin(MpiRmaCollBeginEvent),
    MpiRmaCollEnd(MpiRmaCollEndEvent),
    MpiRmaLock(MpiRmaLockEvent),
    MpiRmaUnlock(MpiRmaUnlockEvent),
}

// EVENT RECORD
// ================================================================================================

/// A single traced event: timestamp plus variant payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    timestamp: Timestamp,
    kind: EventKind,
}

/// Constructors
impl EventRecord {
    pub fn new(timestamp: Timestamp, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// Shorthand for a plain enter record without metric samples.
    pub fn enter(timestamp: Timestamp, region: RegionId) -> Self {
        Self::new(timestamp, EventKind::Enter(EnterEvent::new(region, MetricSamples::new())))
    }

    /// Shorthand for a plain leave record.
    pub fn leave(timestamp: Timestamp, region: RegionId) -> Self {
        Self::new(timestamp, EventKind::Leave(LeaveEvent::new(region)))
    }
}

/// Type information
impl EventRecord {
    /// Primary classification of this record.
    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::Enter(_) => EventType::Enter,
            EventKind::EnterCs(_) => EventType::EnterCs,
            EventKind::EnterProgram(_) => EventType::EnterProgram,
            EventKind::Leave(_) => EventType::Leave,
            EventKind::LeaveProgram(_) => EventType::LeaveProgram,
            EventKind::MpiCollBegin(_) => EventType::MpiCollBegin,
            EventKind::MpiCollEnd(_) => EventType::MpiCollEnd,
            EventKind::MpiSend(_) => EventType::MpiSend,
            EventKind::MpiSendRequest(_) => EventType::MpiSendRequest,
            EventKind::MpiSendComplete(_) => EventType::MpiSendComplete,
            EventKind::MpiRecv(_) => EventType::MpiRecv,
            EventKind::MpiRecvRequest(_) => EventType::MpiRecvRequest,
            EventKind::MpiRecvComplete(_) => EventType::MpiRecvComplete,
            EventKind::MpiRequestTested(_) => EventType::MpiRequestTested,
            EventKind::MpiCancelled(_) => EventType::MpiCancelled,
            EventKind::ThreadAcquireLock(_) => EventType::ThreadAcquireLock,
            EventKind::ThreadReleaseLock(_) => EventType::ThreadReleaseLock,
            EventKind::ThreadTaskCreate(_) => EventType::ThreadTaskCreate,
            EventKind::ThreadTaskComplete(_) => EventType::ThreadTaskComplete,
            EventKind::ThreadTaskSwitch(_) => EventType::ThreadTaskSwitch,
            EventKind::ThreadBegin(_) => EventType::ThreadBegin,
            EventKind::ThreadEnd(_) => EventType::ThreadEnd,
            EventKind::ThreadCreate(_) => EventType::ThreadCreate,
            EventKind::ThreadWait(_) => EventType::ThreadWait,
            EventKind::ThreadFork(_) => EventType::ThreadFork,
            EventKind::ThreadJoin(_) => EventType::ThreadJoin,
            EventKind::ThreadTeamBegin(_) => EventType::ThreadTeamBegin,
            EventKind::ThreadTeamEnd(_) => EventType::ThreadTeamEnd,
            EventKind::RmaPutStart(_) => EventType::RmaPutStart,
            EventKind::RmaPutEnd(_) => EventType::RmaPutEnd,
            EventKind::RmaGetStart(_) => EventType::RmaGetStart,
            EventKind::RmaGetEnd(_) => EventType::RmaGetEnd,
            EventKind::MpiRmaPutStart(_) => EventType::MpiRmaPutStart,
            EventKind::MpiRmaPutEnd(_) => EventType::MpiRmaPutEnd,
            EventKind::MpiRmaGetStart(_) => EventType::MpiRmaGetStart,
            EventKind::MpiRmaGetEnd(_) => EventType::MpiRmaGetEnd,
            EventKind::MpiRmaGats(_) => EventType::MpiRmaGats,
            EventKind::MpiRmaCollBegin(_) => EventType::MpiRmaCollBegin,
            EventKind::MpiRmaCollEnd(_) => EventType::MpiRmaCollEnd,
            EventKind::MpiRmaLock(_) => EventType::MpiRmaLock,
            EventKind::MpiRmaUnlock(_) => EventType::MpiRmaUnlock,
        }
    }

    /// Returns true if `ty` is this record's primary type, a concrete base
    /// type it derives from, or a group predicate containing it.
    pub fn is_of_type(&self, ty: EventType) -> bool {
        let primary = self.event_type();
        if ty == primary {
            return true;
        }
        if ty.is_group() {
            return ty.members().contains(&primary);
        }
        matches!(
            (primary, ty),
            (EventType::EnterCs | EventType::EnterProgram, EventType::Enter)
                | (EventType::LeaveProgram, EventType::Leave)
                | (EventType::MpiSendRequest, EventType::MpiSend)
                | (EventType::MpiRecvComplete, EventType::MpiRecv)
                | (EventType::MpiRmaPutStart, EventType::RmaPutStart)
                | (EventType::MpiRmaPutEnd, EventType::RmaPutEnd)
                | (EventType::MpiRmaGetStart, EventType::RmaGetStart)
                | (EventType::MpiRmaGetEnd, EventType::RmaGetEnd)
        )
    }
}

/// Accessors
impl EventRecord {
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Region-or-callpath context of enter/leave records.
    pub fn call_context(&self) -> Option<CallContext> {
        match &self.kind {
            EventKind::Enter(ev) => Some(ev.context),
            EventKind::EnterCs(ev) => Some(ev.base.context),
            EventKind::EnterProgram(ev) => Some(ev.base.context),
            EventKind::Leave(ev) => Some(ev.context),
            EventKind::LeaveProgram(ev) => Some(ev.base.context),
            _ => None,
        }
    }

    /// Resolved callpath; present on enter/leave records after preprocessing.
    pub fn callpath(&self) -> Option<CallpathId> {
        self.call_context().and_then(CallContext::callpath)
    }

    /// Raw region reference; present on enter/leave records before
    /// preprocessing.
    pub fn region(&self) -> Option<RegionId> {
        self.call_context().and_then(CallContext::region)
    }

    pub fn callsite(&self) -> Option<CallsiteId> {
        match &self.kind {
            EventKind::EnterCs(ev) => Some(ev.callsite),
            _ => None,
        }
    }

    pub fn metrics(&self) -> Option<&MetricSamples> {
        match &self.kind {
            EventKind::Enter(ev) => Some(&ev.metrics),
            EventKind::EnterCs(ev) => Some(&ev.base.metrics),
            EventKind::EnterProgram(ev) => Some(&ev.base.metrics),
            _ => None,
        }
    }

    pub fn comm(&self) -> Option<CommunicatorId> {
        match &self.kind {
            EventKind::MpiSend(ev) => Some(ev.comm),
            EventKind::MpiSendRequest(ev) => Some(ev.base.comm),
            EventKind::MpiRecv(ev) => Some(ev.comm),
            EventKind::MpiRecvComplete(ev) => Some(ev.base.comm),
            EventKind::MpiCollEnd(ev) => Some(ev.comm),
            _ => None,
        }
    }

    /// Peer rank of a point-to-point or one-sided transfer.
    pub fn peer(&self) -> Option<u32> {
        match &self.kind {
            EventKind::MpiSend(ev) => Some(ev.destination),
            EventKind::MpiSendRequest(ev) => Some(ev.base.destination),
            EventKind::MpiRecv(ev) => Some(ev.source),
            EventKind::MpiRecvComplete(ev) => Some(ev.base.source),
            EventKind::RmaPutStart(ev) => Some(ev.remote),
            EventKind::RmaGetStart(ev) => Some(ev.remote),
            EventKind::MpiRmaPutStart(ev) => Some(ev.base.remote),
            EventKind::MpiRmaGetStart(ev) => Some(ev.base.remote),
            _ => None,
        }
    }

    /// Message tag of a point-to-point transfer.
    pub fn tag(&self) -> Option<u32> {
        match &self.kind {
            EventKind::MpiSend(ev) => Some(ev.tag),
            EventKind::MpiSendRequest(ev) => Some(ev.base.tag),
            EventKind::MpiRecv(ev) => Some(ev.tag),
            EventKind::MpiRecvComplete(ev) => Some(ev.base.tag),
            _ => None,
        }
    }

    pub fn bytes_sent(&self) -> Option<u64> {
        match &self.kind {
            EventKind::MpiSend(ev) => Some(ev.bytes_sent),
            EventKind::MpiSendRequest(ev) => Some(ev.base.bytes_sent),
            EventKind::MpiCollEnd(ev) => Some(ev.bytes_sent),
            EventKind::RmaPutStart(ev) => Some(ev.bytes_sent),
            EventKind::MpiRmaPutStart(ev) => Some(ev.base.bytes_sent),
            _ => None,
        }
    }

    pub fn bytes_received(&self) -> Option<u64> {
        match &self.kind {
            EventKind::MpiRecv(ev) => Some(ev.bytes_received),
            EventKind::MpiRecvComplete(ev) => Some(ev.base.bytes_received),
            EventKind::MpiCollEnd(ev) => Some(ev.bytes_received),
            EventKind::RmaGetStart(ev) => Some(ev.bytes_received),
            EventKind::MpiRmaGetStart(ev) => Some(ev.base.bytes_received),
            _ => None,
        }
    }

    /// Identifier tying the events of one non-blocking request together.
    pub fn request_id(&self) -> Option<RequestId> {
        match &self.kind {
            EventKind::MpiSendRequest(ev) => Some(ev.request_id),
            EventKind::MpiSendComplete(ev) => Some(ev.request_id),
            EventKind::MpiRecvRequest(ev) => Some(ev.request_id),
            EventKind::MpiRecvComplete(ev) => Some(ev.request_id),
            EventKind::MpiRequestTested(ev) => Some(ev.request_id),
            EventKind::MpiCancelled(ev) => Some(ev.request_id),
            _ => None,
        }
    }

    pub fn coll_type(&self) -> Option<CollType> {
        match &self.kind {
            EventKind::MpiCollEnd(ev) => Some(ev.coll_type),
            _ => None,
        }
    }

    pub fn root(&self) -> Option<u32> {
        match &self.kind {
            EventKind::MpiCollEnd(ev) => ev.root,
            _ => None,
        }
    }

    /// Transfer identifier linking RMA start/end pairs.
    pub fn rma_id(&self) -> Option<u32> {
        match &self.kind {
            EventKind::RmaPutStart(ev) => Some(ev.rma_id),
            EventKind::RmaPutEnd(ev) => Some(ev.rma_id),
            EventKind::RmaGetStart(ev) => Some(ev.rma_id),
            EventKind::RmaGetEnd(ev) => Some(ev.rma_id),
            EventKind::MpiRmaPutStart(ev) => Some(ev.base.rma_id),
            EventKind::MpiRmaPutEnd(ev) => Some(ev.base.rma_id),
            EventKind::MpiRmaGetStart(ev) => Some(ev.base.rma_id),
            EventKind::MpiRmaGetEnd(ev) => Some(ev.base.rma_id),
            _ => None,
        }
    }

    pub fn window(&self) -> Option<RmaWindowId> {
        match &self.kind {
            EventKind::MpiRmaPutStart(ev) => Some(ev.window),
            EventKind::MpiRmaGetStart(ev) => Some(ev.window),
            EventKind::MpiRmaGats(ev) => Some(ev.window),
            EventKind::MpiRmaCollEnd(ev) => Some(ev.window),
            EventKind::MpiRmaLock(ev) => Some(ev.window),
            EventKind::MpiRmaUnlock(ev) => Some(ev.window),
            _ => None,
        }
    }

    pub fn lock_location(&self) -> Option<LocationId> {
        match &self.kind {
            EventKind::MpiRmaLock(ev) => Some(ev.location),
            EventKind::MpiRmaUnlock(ev) => Some(ev.location),
            _ => None,
        }
    }

    pub fn lock_id(&self) -> Option<u32> {
        match &self.kind {
            EventKind::ThreadAcquireLock(ev) => Some(ev.lock_id),
            EventKind::ThreadReleaseLock(ev) => Some(ev.lock_id),
            _ => None,
        }
    }

    /// Team or contingent member set of a threading event.
    pub fn team(&self) -> Option<CommSetId> {
        match &self.kind {
            EventKind::ThreadTeamBegin(ev) => Some(ev.team),
            EventKind::ThreadTeamEnd(ev) => Some(ev.team),
            EventKind::ThreadTaskCreate(ev) => Some(ev.team),
            EventKind::ThreadTaskComplete(ev) => Some(ev.team),
            EventKind::ThreadTaskSwitch(ev) => Some(ev.team),
            EventKind::ThreadBegin(ev) => Some(ev.contingent),
            EventKind::ThreadEnd(ev) => Some(ev.contingent),
            EventKind::ThreadCreate(ev) => Some(ev.contingent),
            EventKind::ThreadWait(ev) => Some(ev.contingent),
            EventKind::MpiRmaGats(ev) => Some(ev.group),
            _ => None,
        }
    }

    pub fn task_id(&self) -> Option<u64> {
        match &self.kind {
            EventKind::ThreadTaskCreate(ev) => Some(ev.task_id),
            EventKind::ThreadTaskComplete(ev) => Some(ev.task_id),
            EventKind::ThreadTaskSwitch(ev) => Some(ev.task_id),
            _ => None,
        }
    }

    pub fn paradigm(&self) -> Option<Paradigm> {
        match &self.kind {
            EventKind::ThreadAcquireLock(ev) => Some(ev.paradigm),
            EventKind::ThreadReleaseLock(ev) => Some(ev.paradigm),
            EventKind::ThreadFork(ev) => Some(ev.paradigm),
            EventKind::ThreadJoin(ev) => Some(ev.paradigm),
            _ => None,
        }
    }
}

/// Privileged mutation (trace preprocessing only)
impl EventRecord {
    /// Rewrites the call context of an enter/leave record. No-op for other
    /// variants.
    pub(crate) fn set_call_context(&mut self, context: CallContext) {
        match &mut self.kind {
            EventKind::Enter(ev) => ev.context = context,
            EventKind::EnterCs(ev) => ev.base.context = context,
            EventKind::EnterProgram(ev) => ev.base.context = context,
            EventKind::Leave(ev) => ev.context = context,
            EventKind::LeaveProgram(ev) => ev.base.context = context,
            _ => {},
        }
    }
}

/// Serialization
impl EventRecord {
    /// Serializes the record: type tag, timestamp, then variant fields.
    pub fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u8(self.event_type() as u8);
        buffer.put_timestamp(self.timestamp);
        match &self.kind {
            EventKind::Enter(ev) => ev.pack(buffer),
            EventKind::EnterCs(ev) => ev.pack(buffer),
            EventKind::EnterProgram(ev) => ev.pack(buffer),
            EventKind::Leave(ev) => ev.pack(buffer),
            EventKind::LeaveProgram(ev) => ev.pack(buffer),
            EventKind::MpiCollBegin(ev) => ev.pack(buffer),
            EventKind::MpiCollEnd(ev) => ev.pack(buffer),
            EventKind::MpiSend(ev) => ev.pack(buffer),
            EventKind::MpiSendRequest(ev) => ev.pack(buffer),
            EventKind::MpiSendComplete(ev) => ev.pack(buffer),
            EventKind::MpiRecv(ev) => ev.pack(buffer),
            EventKind::MpiRecvRequest(ev) => ev.pack(buffer),
            EventKind::MpiRecvComplete(ev) => ev.pack(buffer),
            EventKind::MpiRequestTested(ev) => ev.pack(buffer),
            EventKind::MpiCancelled(ev) => ev.pack(buffer),
            EventKind::ThreadAcquireLock(ev) => ev.pack(buffer),
            EventKind::ThreadReleaseLock(ev) => ev.pack(buffer),
            EventKind::ThreadTaskCreate(ev) => ev.pack(buffer),
            EventKind::ThreadTaskComplete(ev) => ev.pack(buffer),
            EventKind::ThreadTaskSwitch(ev) => ev.pack(buffer),
            EventKind::ThreadBegin(ev) => ev.pack(buffer),
            EventKind::ThreadEnd(ev) => ev.pack(buffer),
            EventKind::ThreadCreate(ev) => ev.pack(buffer),
            EventKind::ThreadWait(ev) => ev.pack(buffer),
            EventKind::ThreadFork(ev) => ev.pack(buffer),
            EventKind::ThreadJoin(ev) => ev.pack(buffer),
            EventKind::ThreadTeamBegin(ev) => ev.pack(buffer),
            EventKind::ThreadTeamEnd(ev) => ev.pack(buffer),
            EventKind::RmaPutStart(ev) => ev.pack(buffer),
            EventKind::RmaPutEnd(ev) => ev.pack(buffer),
            EventKind::RmaGetStart(ev) => ev.pack(buffer),
            EventKind::RmaGetEnd(ev) => ev.pack(buffer),
            EventKind::MpiRmaPutStart(ev) => ev.pack(buffer),
            EventKind::MpiRmaPutEnd(ev) => ev.pack(buffer),
            EventKind::MpiRmaGetStart(ev) => ev.pack(buffer),
            EventKind::MpiRmaGetEnd(ev) => ev.pack(buffer),
            EventKind::MpiRmaGats(ev) => ev.pack(buffer),
            EventKind::MpiRmaCollBegin(ev) => ev.pack(buffer),
            EventKind::MpiRmaCollEnd(ev) => ev.pack(buffer),
            EventKind::MpiRmaLock(ev) => ev.pack(buffer),
            EventKind::MpiRmaUnlock(ev) => ev.pack(buffer),
        }
    }

    /// Reconstructs a record from the wire, resolving definition references
    /// against `defs`.
    pub fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let raw = buffer.get_u8()?;
        let ty = EventType::from_u8(raw)
            .filter(|ty| !ty.is_group())
            .ok_or(FormatError::InvalidEventTag(raw))?;
        let timestamp = buffer.get_timestamp()?;
        let kind = match ty {
            EventType::Enter => EventKind::Enter(EnterEvent::unpack(defs, buffer)?),
            EventType::EnterCs => EventKind::EnterCs(EnterCsEvent::unpack(defs, buffer)?),
            EventType::EnterProgram => {
                EventKind::EnterProgram(EnterProgramEvent::unpack(defs, buffer)?)
            },
            EventType::Leave => EventKind::Leave(LeaveEvent::unpack(defs, buffer)?),
            EventType::LeaveProgram => {
                EventKind::LeaveProgram(LeaveProgramEvent::unpack(defs, buffer)?)
            },
            EventType::MpiCollBegin => EventKind::MpiCollBegin(MpiCollBeginEvent::unpack(buffer)?),
            EventType::MpiCollEnd => EventKind::MpiCollEnd(MpiCollEndEvent::unpack(defs, buffer)?),
            EventType::MpiSend => EventKind::MpiSend(MpiSendEvent::unpack(defs, buffer)?),
            EventType::MpiSendRequest => {
                EventKind::MpiSendRequest(MpiSendRequestEvent::unpack(defs, buffer)?)
            },
            EventType::MpiSendComplete => {
                EventKind::MpiSendComplete(MpiSendCompleteEvent::unpack(buffer)?)
            },
            EventType::MpiRecv => EventKind::MpiRecv(MpiRecvEvent::unpack(defs, buffer)?),
            EventType::MpiRecvRequest => {
                EventKind::MpiRecvRequest(MpiRecvRequestEvent::unpack(buffer)?)
            },
            EventType::MpiRecvComplete => {
                EventKind::MpiRecvComplete(MpiRecvCompleteEvent::unpack(defs, buffer)?)
            },
            EventType::MpiRequestTested => {
                EventKind::MpiRequestTested(MpiRequestTestedEvent::unpack(buffer)?)
            },
            EventType::MpiCancelled => EventKind::MpiCancelled(MpiCancelledEvent::unpack(buffer)?),
            EventType::ThreadAcquireLock => {
                EventKind::ThreadAcquireLock(ThreadAcquireLockEvent::unpack(buffer)?)
            },
            EventType::ThreadReleaseLock => {
                EventKind::ThreadReleaseLock(ThreadReleaseLockEvent::unpack(buffer)?)
            },
            EventType::ThreadTaskCreate => {
                EventKind::ThreadTaskCreate(ThreadTaskCreateEvent::unpack(defs, buffer)?)
            },
            EventType::ThreadTaskComplete => {
                EventKind::ThreadTaskComplete(ThreadTaskCompleteEvent::unpack(defs, buffer)?)
            },
            EventType::ThreadTaskSwitch => {
                EventKind::ThreadTaskSwitch(ThreadTaskSwitchEvent::unpack(defs, buffer)?)
            },
            EventType::ThreadBegin => EventKind::ThreadBegin(ThreadBeginEvent::unpack(defs, buffer)?),
            EventType::ThreadEnd => EventKind::ThreadEnd(ThreadEndEvent::unpack(defs, buffer)?),
            EventType::ThreadCreate => {
                EventKind::ThreadCreate(ThreadCreateEvent::unpack(defs, buffer)?)
            },
            EventType::ThreadWait => EventKind::ThreadWait(ThreadWaitEvent::unpack(defs, buffer)?),
            EventType::ThreadFork => EventKind::ThreadFork(ThreadForkEvent::unpack(buffer)?),
            EventType::ThreadJoin => EventKind::ThreadJoin(ThreadJoinEvent::unpack(buffer)?),
            EventType::ThreadTeamBegin => {
                EventKind::ThreadTeamBegin(ThreadTeamBeginEvent::unpack(defs, buffer)?)
            },
            EventType::ThreadTeamEnd => {
                EventKind::ThreadTeamEnd(ThreadTeamEndEvent::unpack(defs, buffer)?)
            },
            EventType::RmaPutStart => EventKind::RmaPutStart(RmaPutStartEvent::unpack(buffer)?),
            EventType::RmaPutEnd => EventKind::RmaPutEnd(RmaPutEndEvent::unpack(buffer)?),
            EventType::RmaGetStart => EventKind::RmaGetStart(RmaGetStartEvent::unpack(buffer)?),
            EventType::RmaGetEnd => EventKind::RmaGetEnd(RmaGetEndEvent::unpack(buffer)?),
            EventType::MpiRmaPutStart => {
                EventKind::MpiRmaPutStart(MpiRmaPutStartEvent::unpack(defs, buffer)?)
            },
            EventType::MpiRmaPutEnd => EventKind::MpiRmaPutEnd(MpiRmaPutEndEvent::unpack(buffer)?),
            EventType::MpiRmaGetStart => {
                EventKind::MpiRmaGetStart(MpiRmaGetStartEvent::unpack(defs, buffer)?)
            },
            EventType::MpiRmaGetEnd => EventKind::MpiRmaGetEnd(MpiRmaGetEndEvent::unpack(buffer)?),
            EventType::MpiRmaGats => EventKind::MpiRmaGats(MpiRmaGatsEvent::unpack(defs, buffer)?),
            EventType::MpiRmaCollBegin => {
                EventKind::MpiRmaCollBegin(MpiRmaCollBeginEvent::unpack(buffer)?)
            },
            EventType::MpiRmaCollEnd => {
                EventKind::MpiRmaCollEnd(MpiRmaCollEndEvent::unpack(defs, buffer)?)
            },
            EventType::MpiRmaLock => EventKind::MpiRmaLock(MpiRmaLockEvent::unpack(defs, buffer)?),
            EventType::MpiRmaUnlock => {
                EventKind::MpiRmaUnlock(MpiRmaUnlockEvent::unpack(defs, buffer)?)
            },
            _ => unreachable!("group tags are rejected above"),
        };
        Ok(Self { timestamp, kind })
    }

    /// Returns an adapter rendering the record with names resolved against
    /// `defs`.
    pub fn display<'a>(&'a self, defs: &'a GlobalDefs) -> EventDisplay<'a> {
        EventDisplay { record: self, defs }
    }
}

// EVENT DISPLAY
// ================================================================================================

/// Human-readable rendering of an event record.
pub struct EventDisplay<'a> {
    record: &'a EventRecord,
    defs: &'a GlobalDefs,
}

impl EventDisplay<'_> {
    fn region_name(&self, context: CallContext) -> &str {
        let region = match context {
            CallContext::Region(region) => Some(region),
            CallContext::Callpath(callpath) => {
                self.defs.callpath(callpath).ok().map(|cp| cp.region)
            },
        };
        region
            .and_then(|id| self.defs.region(id).ok())
            .and_then(|region| self.defs.string(region.name).ok())
            .unwrap_or("<unknown>")
    }
}

impl fmt::Display for EventDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        write!(f, "{} @ {:.6}s", record.event_type(), record.timestamp())?;
        if let Some(context) = record.call_context() {
            write!(f, " region={}", self.region_name(context))?;
            if let Some(callpath) = context.callpath() {
                write!(f, " callpath={callpath}")?;
            }
        }
        if let Some(comm) = record.comm() {
            write!(f, " comm={comm}")?;
        }
        if let Some(peer) = record.peer() {
            write!(f, " peer={peer}")?;
        }
        if let Some(tag) = record.tag() {
            write!(f, " tag={tag}")?;
        }
        if let Some(coll_type) = record.coll_type() {
            write!(f, " op={coll_type}")?;
        }
        if let Some(sent) = record.bytes_sent() {
            write!(f, " sent={sent}")?;
        }
        if let Some(received) = record.bytes_received() {
            write!(f, " recvd={received}")?;
        }
        if let Some(request) = record.request_id() {
            write!(f, " request={request}")?;
        }
        if let Some(rma_id) = record.rma_id() {
            write!(f, " rma={rma_id}")?;
        }
        if let Some(window) = record.window() {
            write!(f, " window={window}")?;
        }
        if let Some(task) = record.task_id() {
            write!(f, " task={task}")?;
        }
        if let Some(paradigm) = record.paradigm() {
            write!(f, " paradigm={paradigm}")?;
        }
        Ok(())
    }
}
