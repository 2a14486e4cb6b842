use super::{Paradigm, StringId};

define_id!(
    /// Identifier of a [`Communicator`] definition.
    CommunicatorId
);

define_id!(
    /// Identifier of a [`CommSet`] definition.
    CommSetId
);

// COMM SET
// ================================================================================================

/// Member set of a communicator, expressed as an ordered list of global
/// location ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    /// No members.
    None,
    /// The owning location only.
    SelfOnly,
    /// Every location, in global rank order.
    World,
    /// An explicit ordered list of global ranks.
    GlobalRanks(Vec<u32>),
}

/// The member set of one or more communicators, independent of communicator
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommSet {
    pub name: StringId,
    pub paradigm: Paradigm,
    pub membership: Membership,
}

impl CommSet {
    /// Number of members, given the total number of locations in the trace.
    pub fn size(&self, num_locations: usize) -> usize {
        match &self.membership {
            Membership::None => 0,
            Membership::SelfOnly => 1,
            Membership::World => num_locations,
            Membership::GlobalRanks(ranks) => ranks.len(),
        }
    }

    /// Maps a set-local rank to the global rank, if the member exists.
    pub fn global_rank(&self, local_rank: u32, num_locations: usize) -> Option<u32> {
        match &self.membership {
            Membership::None => None,
            Membership::SelfOnly => (local_rank == 0).then_some(0),
            Membership::World => ((local_rank as usize) < num_locations).then_some(local_rank),
            Membership::GlobalRanks(ranks) => ranks.get(local_rank as usize).copied(),
        }
    }
}

// COMMUNICATOR
// ================================================================================================

/// An ordered set of locations acting as the address space for point-to-point
/// and collective operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Communicator {
    pub name: StringId,
    pub paradigm: Paradigm,
    pub comm_set: CommSetId,
    pub parent: Option<CommunicatorId>,
}
