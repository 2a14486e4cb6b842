//! Collective operation events.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use super::FormatError;
use crate::{
    Buffer,
    defs::{CommunicatorId, DefKind, GlobalDefs},
};

// COLLECTIVE TYPE
// ================================================================================================

/// The collective operation a `MpiCollEnd` event concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum CollType {
    Barrier,
    Bcast,
    Gather,
    Gatherv,
    Scatter,
    Scatterv,
    Allgather,
    Allgatherv,
    Alltoall,
    Alltoallv,
    Alltoallw,
    Allreduce,
    Reduce,
    ReduceScatter,
    Scan,
    Exscan,
    ReduceScatterBlock,
}

impl fmt::Display for CollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollType::Barrier => "barrier",
            CollType::Bcast => "bcast",
            CollType::Gather => "gather",
            CollType::Gatherv => "gatherv",
            CollType::Scatter => "scatter",
            CollType::Scatterv => "scatterv",
            CollType::Allgather => "allgather",
            CollType::Allgatherv => "allgatherv",
            CollType::Alltoall => "alltoall",
            CollType::Alltoallv => "alltoallv",
            CollType::Alltoallw => "alltoallw",
            CollType::Allreduce => "allreduce",
            CollType::Reduce => "reduce",
            CollType::ReduceScatter => "reduce_scatter",
            CollType::Scan => "scan",
            CollType::Exscan => "exscan",
            CollType::ReduceScatterBlock => "reduce_scatter_block",
        };
        f.write_str(name)
    }
}

// COLLECTIVE BEGIN / END
// ================================================================================================

/// Begin of a collective operation; carries no payload beyond the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MpiCollBeginEvent;

impl MpiCollBeginEvent {
    pub(super) fn pack(&self, _buffer: &mut Buffer) {}

    pub(super) fn unpack(_buffer: &mut Buffer) -> Result<Self, FormatError> {
        Ok(Self)
    }
}

/// End of a collective operation, carrying the transfer volumes observed by
/// the local rank. `root` is the operation's root rank within `comm`, if the
/// operation is rooted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiCollEndEvent {
    pub coll_type: CollType,
    pub comm: CommunicatorId,
    pub root: Option<u32>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl MpiCollEndEvent {
    pub(super) fn pack(&self, buffer: &mut Buffer) {
        buffer.put_u8(self.coll_type as u8);
        buffer.put_id(Some(self.comm));
        buffer.put_id(self.root);
        buffer.put_u64(self.bytes_sent);
        buffer.put_u64(self.bytes_received);
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let raw = buffer.get_u8()?;
        let coll_type = CollType::from_u8(raw).ok_or(FormatError::InvalidCollType(raw))?;
        let comm = buffer
            .get_id::<CommunicatorId>()?
            .ok_or(FormatError::MissingReference(DefKind::Communicator))?;
        defs.communicator(comm)?;
        Ok(Self {
            coll_type,
            comm,
            root: buffer.get_id::<u32>()?,
            bytes_sent: buffer.get_u64()?,
            bytes_received: buffer.get_u64()?,
        })
    }
}
