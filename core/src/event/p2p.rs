//! Point-to-point message events, blocking and non-blocking.

use super::FormatError;
use crate::{
    Buffer, RequestId,
    defs::{CommunicatorId, DefKind, GlobalDefs},
};

fn unpack_comm(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<CommunicatorId, FormatError> {
    let comm = buffer
        .get_id::<CommunicatorId>()?
        .ok_or(FormatError::MissingReference(DefKind::Communicator))?;
    defs.communicator(comm)?;
    Ok(comm)
}

// SEND
// ================================================================================================

/// A blocking message send; `destination` is the local rank of the receiver
/// within `comm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiSendEvent {
    pub comm: CommunicatorId,
    pub destination: u32,
    pub tag: u32,
    pub bytes_sent: u64,
}

impl MpiSendEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.comm));
        buffer.put_u32(self.destination);
        buffer.put_u32(self.tag);
        buffer.put_u64(self.bytes_sent);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            comm: unpack_comm(defs, buffer)?,
            destination: buffer.get_u32()?,
            tag: buffer.get_u32()?,
            bytes_sent: buffer.get_u64()?,
        })
    }
}

/// Posting of a non-blocking send; carries the full message data plus the
/// request identifier linking it to its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiSendRequestEvent {
    pub base: MpiSendEvent,
    pub request_id: RequestId,
}

impl MpiSendRequestEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
        buffer.put_u64(self.request_id);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            base: MpiSendEvent::unpack(defs, buffer)?,
            request_id: buffer.get_u64()?,
        })
    }
}

/// Completion of a non-blocking send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiSendCompleteEvent {
    pub request_id: RequestId,
}

impl MpiSendCompleteEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u64(self.request_id);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { request_id: buffer.get_u64()? })
    }
}

// RECEIVE
// ================================================================================================

/// A blocking message receive; `source` is the local rank of the sender
/// within `comm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRecvEvent {
    pub comm: CommunicatorId,
    pub source: u32,
    pub tag: u32,
    pub bytes_received: u64,
}

impl MpiRecvEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.comm));
        buffer.put_u32(self.source);
        buffer.put_u32(self.tag);
        buffer.put_u64(self.bytes_received);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            comm: unpack_comm(defs, buffer)?,
            source: buffer.get_u32()?,
            tag: buffer.get_u32()?,
            bytes_received: buffer.get_u64()?,
        })
    }
}

/// Posting of a non-blocking receive; the message data is only known at
/// completion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRecvRequestEvent {
    pub request_id: RequestId,
}

impl MpiRecvRequestEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u64(self.request_id);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { request_id: buffer.get_u64()? })
    }
}

/// Completion of a non-blocking receive; carries the matched message data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRecvCompleteEvent {
    pub base: MpiRecvEvent,
    pub request_id: RequestId,
}

impl MpiRecvCompleteEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
        buffer.put_u64(self.request_id);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            base: MpiRecvEvent::unpack(defs, buffer)?,
            request_id: buffer.get_u64()?,
        })
    }
}

// REQUEST LIFECYCLE
// ================================================================================================

/// An unsuccessful test of an outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRequestTestedEvent {
    pub request_id: RequestId,
}

impl MpiRequestTestedEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u64(self.request_id);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { request_id: buffer.get_u64()? })
    }
}

/// Cancellation of an outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiCancelledEvent {
    pub request_id: RequestId,
}

impl MpiCancelledEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u64(self.request_id);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { request_id: buffer.get_u64()? })
    }
}
