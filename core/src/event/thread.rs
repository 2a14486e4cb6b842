//! Threading events, covering the fork/join, create/wait, tasking, and lock
//! models. Every variant is tagged with the paradigm it belongs to.

use num_traits::FromPrimitive as _;

use super::FormatError;
use crate::{
    Buffer,
    defs::{CommSetId, DefKind, GlobalDefs, Paradigm},
};

fn pack_paradigm(paradigm: Paradigm, buffer: &mut Buffer) {
    buffer.put_u8(paradigm as u8);
}

fn unpack_paradigm(buffer: &mut Buffer) -> Result<Paradigm, FormatError> {
    let raw = buffer.get_u8()?;
    Paradigm::from_u8(raw).ok_or(FormatError::InvalidParadigm(raw))
}

fn unpack_team(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<CommSetId, FormatError> {
    let team = buffer
        .get_id::<CommSetId>()?
        .ok_or(FormatError::MissingReference(DefKind::CommSet))?;
    defs.comm_set(team)?;
    Ok(team)
}

// FORK / JOIN
// ================================================================================================

/// A master thread forking a parallel region with `team_size` workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadForkEvent {
    pub team_size: u32,
    pub paradigm: Paradigm,
}

impl ThreadForkEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.team_size);
        pack_paradigm(self.paradigm, buffer);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            team_size: buffer.get_u32()?,
            paradigm: unpack_paradigm(buffer)?,
        })
    }
}

/// The master thread joining its parallel region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadJoinEvent {
    pub paradigm: Paradigm,
}

impl ThreadJoinEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        pack_paradigm(self.paradigm, buffer);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { paradigm: unpack_paradigm(buffer)? })
    }
}

/// A thread starting to participate in a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTeamBeginEvent {
    pub team: CommSetId,
}

impl ThreadTeamBeginEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.team));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { team: unpack_team(defs, buffer)? })
    }
}

/// A thread ending its participation in a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTeamEndEvent {
    pub team: CommSetId,
}

impl ThreadTeamEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.team));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self { team: unpack_team(defs, buffer)? })
    }
}

// LOCKS
// ================================================================================================

/// Acquisition of a thread lock; `acquisition_order` gives the global order
/// of acquisitions of that lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAcquireLockEvent {
    pub lock_id: u32,
    pub acquisition_order: u32,
    pub paradigm: Paradigm,
}

impl ThreadAcquireLockEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.lock_id);
        buffer.put_u32(self.acquisition_order);
        pack_paradigm(self.paradigm, buffer);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            lock_id: buffer.get_u32()?,
            acquisition_order: buffer.get_u32()?,
            paradigm: unpack_paradigm(buffer)?,
        })
    }
}

/// Release of a thread lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadReleaseLockEvent {
    pub lock_id: u32,
    pub acquisition_order: u32,
    pub paradigm: Paradigm,
}

impl ThreadReleaseLockEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u32(self.lock_id);
        buffer.put_u32(self.acquisition_order);
        pack_paradigm(self.paradigm, buffer);
    }

    pub(super) fn unpack(buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            lock_id: buffer.get_u32()?,
            acquisition_order: buffer.get_u32()?,
            paradigm: unpack_paradigm(buffer)?,
        })
    }
}

// TASKING
// ================================================================================================

/// Creation of an explicit task within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTaskCreateEvent {
    pub team: CommSetId,
    pub task_id: u64,
}

impl ThreadTaskCreateEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.team));
        buffer.put_u64(self.task_id);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            team: unpack_team(defs, buffer)?,
            task_id: buffer.get_u64()?,
        })
    }
}

/// Completion of an explicit task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTaskCompleteEvent {
    pub team: CommSetId,
    pub task_id: u64,
}

impl ThreadTaskCompleteEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.team));
        buffer.put_u64(self.task_id);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            team: unpack_team(defs, buffer)?,
            task_id: buffer.get_u64()?,
        })
    }
}

/// A thread switching execution to a different task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTaskSwitchEvent {
    pub team: CommSetId,
    pub task_id: u64,
}

impl ThreadTaskSwitchEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.team));
        buffer.put_u64(self.task_id);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            team: unpack_team(defs, buffer)?,
            task_id: buffer.get_u64()?,
        })
    }
}

// CREATE / WAIT
// ================================================================================================

/// Begin of a created thread's lifetime; `sequence` numbers the creations
/// within the contingent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadBeginEvent {
    pub contingent: CommSetId,
    pub sequence: u64,
}

impl ThreadBeginEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.contingent));
        buffer.put_u64(self.sequence);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            contingent: unpack_team(defs, buffer)?,
            sequence: buffer.get_u64()?,
        })
    }
}

/// End of a created thread's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadEndEvent {
    pub contingent: CommSetId,
    pub sequence: u64,
}

impl ThreadEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.contingent));
        buffer.put_u64(self.sequence);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            contingent: unpack_team(defs, buffer)?,
            sequence: buffer.get_u64()?,
        })
    }
}

/// Creation of a new thread within a contingent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadCreateEvent {
    pub contingent: CommSetId,
    pub sequence: u64,
}

impl ThreadCreateEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.contingent));
        buffer.put_u64(self.sequence);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            contingent: unpack_team(defs, buffer)?,
            sequence: buffer.get_u64()?,
        })
    }
}

/// Waiting for a created thread to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadWaitEvent {
    pub contingent: CommSetId,
    pub sequence: u64,
}

impl ThreadWaitEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_id(Some(self.contingent));
        buffer.put_u64(self.sequence);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self {
            contingent: unpack_team(defs, buffer)?,
            sequence: buffer.get_u64()?,
        })
    }
}
