//! One-sided (remote memory access) events, generic and MPI-specific.
//!
//! The MPI-specific variants compose their generic counterpart and add the
//! window (and, for synchronization events, group and lock information) of
//! the MPI one-sided model.

use super::FormatError;
use crate::{
    Buffer,
    defs::{CommSetId, DefKind, GlobalDefs, LocationId, RmaWindowId},
};

fn unpack_window(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<RmaWindowId, FormatError> {
    let window = buffer
        .get_id::<RmaWindowId>()?
        .ok_or(FormatError::MissingReference(DefKind::RmaWindow))?;
    defs.rma_window(window)?;
    Ok(window)
}

fn unpack_location(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<LocationId, FormatError> {
    let location = buffer
        .get_id::<LocationId>()?
        .ok_or(FormatError::MissingReference(DefKind::Location))?;
    defs.location(location)?;
    Ok(location)
}

// GENERIC RMA TRANSFERS
// ================================================================================================

/// Start of a one-sided put; `remote` is the target rank, `rma_id` links the
/// start to its end event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RmaPutStartEvent {
    pub rma_id: u32,
    pub remote: u32,
    pub bytes_sent: u64,
}

impl RmaPutStartEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.rma_id);
        buffer.put_u32(self.remote);
        buffer.put_u64(self.bytes_sent);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            rma_id: buffer.get_u32()?,
            remote: buffer.get_u32()?,
            bytes_sent: buffer.get_u64()?,
        })
    }
}

/// End of a one-sided put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RmaPutEndEvent {
    pub rma_id: u32,
}

impl RmaPutEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.rma_id);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { rma_id: buffer.get_u32()? })
    }
}

/// Start of a one-sided get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RmaGetStartEvent {
    pub rma_id: u32,
    pub remote: u32,
    pub bytes_received: u64,
}

impl RmaGetStartEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.rma_id);
        buffer.put_u32(self.remote);
        buffer.put_u64(self.bytes_received);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            rma_id: buffer.get_u32()?,
            remote: buffer.get_u32()?,
            bytes_received: buffer.get_u64()?,
        })
    }
}

/// End of a one-sided get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RmaGetEndEvent {
    pub rma_id: u32,
}

impl RmaGetEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.rma_id);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { rma_id: buffer.get_u32()? })
    }
}

// MPI RMA TRANSFERS
// ================================================================================================

/// Start of an MPI one-sided put on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaPutStartEvent {
    pub base: RmaPutStartEvent,
    pub window: RmaWindowId,
}

impl MpiRmaPutStartEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
        buffer.put_id(Some(self.window));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            base: RmaPutStartEvent::unpack(buffer)?,
            window: unpack_window(defs, buffer)?,
        })
    }
}

/// End of an MPI one-sided put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaPutEndEvent {
    pub base: RmaPutEndEvent,
}

impl MpiRmaPutEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { base: RmaPutEndEvent::unpack(buffer)? })
    }
}

/// Start of an MPI one-sided get on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaGetStartEvent {
    pub base: RmaGetStartEvent,
    pub window: RmaWindowId,
}

impl MpiRmaGetStartEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
        buffer.put_id(Some(self.window));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            base: RmaGetStartEvent::unpack(buffer)?,
            window: unpack_window(defs, buffer)?,
        })
    }
}

/// End of an MPI one-sided get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaGetEndEvent {
    pub base: RmaGetEndEvent,
}

impl MpiRmaGetEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { base: RmaGetEndEvent::unpack(buffer)? })
    }
}

// MPI RMA SYNCHRONIZATION
// ================================================================================================

/// General active-target synchronization (post/start/complete/wait) on a
/// window, against the given access/exposure group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaGatsEvent {
    pub window: RmaWindowId,
    pub group: CommSetId,
    pub sync: bool,
}

impl MpiRmaGatsEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.window));
        buffer.put_id(Some(self.group));
        buffer.put_u8(self.sync as u8);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let window = unpack_window(defs, buffer)?;
        let group = buffer
            .get_id::<CommSetId>()?
            .ok_or(FormatError::MissingReference(DefKind::CommSet))?;
        defs.comm_set(group)?;
        Ok(Self {
            window,
            group,
            sync: buffer.get_u8()? != 0,
        })
    }
}

/// Begin of a collective synchronization on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MpiRmaCollBeginEvent;

impl MpiRmaCollBeginEvent {
    pub(super) fn pack(&self, _buffer: &mut Buffer) {}

    pub(super) fn unpack(_buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self)
    }
}

/// End of a collective synchronization on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaCollEndEvent {
    pub window: RmaWindowId,
}

impl MpiRmaCollEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.window));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { window: unpack_window(defs, buffer)? })
    }
}

/// Acquisition of a window lock on a target location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaLockEvent {
    pub window: RmaWindowId,
    pub location: LocationId,
    pub exclusive: bool,
}

impl MpiRmaLockEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.window));
        buffer.put_id(Some(self.location));
        buffer.put_u8(self.exclusive as u8);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            window: unpack_window(defs, buffer)?,
            location: unpack_location(defs, buffer)?,
            exclusive: buffer.get_u8()? != 0,
        })
    }
}

/// Release of a window lock on a target location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiRmaUnlockEvent {
    pub window: RmaWindowId,
    pub location: LocationId,
}

impl MpiRmaUnlockEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.window));
        buffer.put_id(Some(self.location));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            window: unpack_window(defs, buffer)?,
            location: unpack_location(defs, buffer)?,
        })
    }
}
