use std::fmt;

use num_derive::FromPrimitive;

// EVENT TYPE
// ================================================================================================

/// Classification of a traced event.
///
/// The first block enumerates the concrete record variants; their
/// discriminants double as the on-wire type tags. The trailing `Group*`
/// values are predicates over sets of concrete types — they never appear in a
/// trace or on the wire, but callbacks can be registered under them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
#[repr(u8)]
pub enum EventType {
    // Generic event types
    Enter,
    EnterCs,
    EnterProgram,
    Leave,
    LeaveProgram,

    // MPI-1 event types
    MpiCollBegin,
    MpiCollEnd,
    MpiSend,
    MpiSendRequest,
    MpiSendComplete,
    MpiRecv,
    MpiRecvRequest,
    MpiRecvComplete,
    MpiRequestTested,
    MpiCancelled,

    // Threading event types
    ThreadAcquireLock,
    ThreadReleaseLock,
    ThreadTaskCreate,
    ThreadTaskComplete,
    ThreadTaskSwitch,
    ThreadBegin,
    ThreadEnd,
    ThreadCreate,
    ThreadWait,
    ThreadFork,
    ThreadJoin,
    ThreadTeamBegin,
    ThreadTeamEnd,

    // Generic RMA event types
    RmaPutStart,
    RmaPutEnd,
    RmaGetStart,
    RmaGetEnd,

    // MPI-2 RMA event types
    MpiRmaPutStart,
    MpiRmaPutEnd,
    MpiRmaGetStart,
    MpiRmaGetEnd,
    MpiRmaGats,
    MpiRmaCollBegin,
    MpiRmaCollEnd,
    MpiRmaLock,
    MpiRmaUnlock,

    // Group predicates
    /// Any event.
    GroupAll,
    /// All enter-type events.
    GroupEnter,
    /// All leave-type events.
    GroupLeave,
    /// All events carrying send-message data.
    GroupSend,
    /// All events carrying receive-message data.
    GroupRecv,
    /// All events opening a begin/end bracket.
    GroupBegin,
    /// All events closing a begin/end bracket.
    GroupEnd,
    /// All events belonging to the non-blocking request lifecycle.
    GroupNonblock,
}

impl EventType {
    /// All concrete (non-group) event types, in tag order.
    pub const CONCRETE: [EventType; 41] = [
        EventType::Enter,
        EventType::EnterCs,
        EventType::EnterProgram,
        EventType::Leave,
        EventType::LeaveProgram,
        EventType::MpiCollBegin,
        EventType::MpiCollEnd,
        EventType::MpiSend,
        EventType::MpiSendRequest,
        EventType::MpiSendComplete,
        EventType::MpiRecv,
        EventType::MpiRecvRequest,
        EventType::MpiRecvComplete,
        EventType::MpiRequestTested,
        EventType::MpiCancelled,
        EventType::ThreadAcquireLock,
        EventType::ThreadReleaseLock,
        EventType::ThreadTaskCreate,
        EventType::ThreadTaskComplete,
        EventType::ThreadTaskSwitch,
        EventType::ThreadBegin,
        EventType::ThreadEnd,
        EventType::ThreadCreate,
        EventType::ThreadWait,
        EventType::ThreadFork,
        EventType::ThreadJoin,
        EventType::ThreadTeamBegin,
        EventType::ThreadTeamEnd,
        EventType::RmaPutStart,
        EventType::RmaPutEnd,
        EventType::RmaGetStart,
        EventType::RmaGetEnd,
        EventType::MpiRmaPutStart,
        EventType::MpiRmaPutEnd,
        EventType::MpiRmaGetStart,
        EventType::MpiRmaGetEnd,
        EventType::MpiRmaGats,
        EventType::MpiRmaCollBegin,
        EventType::MpiRmaCollEnd,
        EventType::MpiRmaLock,
        EventType::MpiRmaUnlock,
    ];

    /// All group predicates.
    pub const GROUPS: [EventType; 8] = [
        EventType::GroupAll,
        EventType::GroupEnter,
        EventType::GroupLeave,
        EventType::GroupSend,
        EventType::GroupRecv,
        EventType::GroupBegin,
        EventType::GroupEnd,
        EventType::GroupNonblock,
    ];

    /// Returns true if this value is a group predicate rather than a concrete
    /// record type.
    pub fn is_group(self) -> bool {
        self >= EventType::GroupAll
    }

    /// Concrete members of a group predicate; empty for concrete types.
    ///
    /// `GroupBegin`/`GroupEnd` cover every variant whose name ends in
    /// `Begin`/`End`, including the non-collective thread and RMA brackets.
    pub fn members(self) -> &'static [EventType] {
        match self {
            EventType::GroupAll => &Self::CONCRETE,
            EventType::GroupEnter => {
                &[EventType::Enter, EventType::EnterCs, EventType::EnterProgram]
            },
            EventType::GroupLeave => &[EventType::Leave, EventType::LeaveProgram],
            EventType::GroupSend => &[EventType::MpiSend, EventType::MpiSendRequest],
            EventType::GroupRecv => &[EventType::MpiRecv, EventType::MpiRecvComplete],
            EventType::GroupBegin => &[
                EventType::MpiCollBegin,
                EventType::MpiRmaCollBegin,
                EventType::ThreadBegin,
                EventType::ThreadTeamBegin,
            ],
            EventType::GroupEnd => &[
                EventType::MpiCollEnd,
                EventType::MpiRmaCollEnd,
                EventType::ThreadEnd,
                EventType::ThreadTeamEnd,
                EventType::RmaPutEnd,
                EventType::RmaGetEnd,
                EventType::MpiRmaPutEnd,
                EventType::MpiRmaGetEnd,
            ],
            EventType::GroupNonblock => &[
                EventType::MpiSendRequest,
                EventType::MpiSendComplete,
                EventType::MpiRecvRequest,
                EventType::MpiRecvComplete,
                EventType::MpiRequestTested,
                EventType::MpiCancelled,
            ],
            _ => &[],
        }
    }

    /// Returns true if `concrete` belongs to this predicate (or equals it).
    pub fn contains(self, concrete: EventType) -> bool {
        if self == concrete {
            return true;
        }
        self.members().contains(&concrete)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::Enter => "ENTER",
            EventType::EnterCs => "ENTER_CS",
            EventType::EnterProgram => "ENTER_PROGRAM",
            EventType::Leave => "LEAVE",
            EventType::LeaveProgram => "LEAVE_PROGRAM",
            EventType::MpiCollBegin => "MPI_COLLECTIVE_BEGIN",
            EventType::MpiCollEnd => "MPI_COLLECTIVE_END",
            EventType::MpiSend => "MPI_SEND",
            EventType::MpiSendRequest => "MPI_SEND_REQUEST",
            EventType::MpiSendComplete => "MPI_SEND_COMPLETE",
            EventType::MpiRecv => "MPI_RECV",
            EventType::MpiRecvRequest => "MPI_RECV_REQUEST",
            EventType::MpiRecvComplete => "MPI_RECV_COMPLETE",
            EventType::MpiRequestTested => "MPI_REQUEST_TESTED",
            EventType::MpiCancelled => "MPI_CANCELLED",
            EventType::ThreadAcquireLock => "THREAD_ACQUIRE_LOCK",
            EventType::ThreadReleaseLock => "THREAD_RELEASE_LOCK",
            EventType::ThreadTaskCreate => "THREAD_TASK_CREATE",
            EventType::ThreadTaskComplete => "THREAD_TASK_COMPLETE",
            EventType::ThreadTaskSwitch => "THREAD_TASK_SWITCH",
            EventType::ThreadBegin => "THREAD_BEGIN",
            EventType::ThreadEnd => "THREAD_END",
            EventType::ThreadCreate => "THREAD_CREATE",
            EventType::ThreadWait => "THREAD_WAIT",
            EventType::ThreadFork => "THREAD_FORK",
            EventType::ThreadJoin => "THREAD_JOIN",
            EventType::ThreadTeamBegin => "THREAD_TEAM_BEGIN",
            EventType::ThreadTeamEnd => "THREAD_TEAM_END",
            EventType::RmaPutStart => "RMA_PUT_START",
            EventType::RmaPutEnd => "RMA_PUT_END",
            EventType::RmaGetStart => "RMA_GET_START",
            EventType::RmaGetEnd => "RMA_GET_END",
            EventType::MpiRmaPutStart => "MPI_RMA_PUT_START",
            EventType::MpiRmaPutEnd => "MPI_RMA_PUT_END",
            EventType::MpiRmaGetStart => "MPI_RMA_GET_START",
            EventType::MpiRmaGetEnd => "MPI_RMA_GET_END",
            EventType::MpiRmaGats => "MPI_RMA_GATS",
            EventType::MpiRmaCollBegin => "MPI_RMA_COLLECTIVE_BEGIN",
            EventType::MpiRmaCollEnd => "MPI_RMA_COLLECTIVE_END",
            EventType::MpiRmaLock => "MPI_RMA_LOCK",
            EventType::MpiRmaUnlock => "MPI_RMA_UNLOCK",
            EventType::GroupAll => "GROUP_ALL",
            EventType::GroupEnter => "GROUP_ENTER",
            EventType::GroupLeave => "GROUP_LEAVE",
            EventType::GroupSend => "GROUP_SEND",
            EventType::GroupRecv => "GROUP_RECV",
            EventType::GroupBegin => "GROUP_BEGIN",
            EventType::GroupEnd => "GROUP_END",
            EventType::GroupNonblock => "GROUP_NONBLOCK",
        };
        f.write_str(name)
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_predicates_follow_the_concrete_block() {
        for ty in EventType::CONCRETE {
            assert!(!ty.is_group());
        }
        for ty in EventType::GROUPS {
            assert!(ty.is_group());
        }
    }

    #[test]
    fn group_all_covers_every_concrete_type() {
        for ty in EventType::CONCRETE {
            assert!(EventType::GroupAll.contains(ty));
        }
    }

    #[test]
    fn bracket_groups_cover_name_suffixes() {
        assert!(EventType::GroupEnd.contains(EventType::RmaPutEnd));
        assert!(EventType::GroupEnd.contains(EventType::ThreadTeamEnd));
        assert!(!EventType::GroupEnd.contains(EventType::RmaPutStart));
        assert!(EventType::GroupBegin.contains(EventType::ThreadBegin));
        assert!(!EventType::GroupBegin.contains(EventType::ThreadCreate));
    }
}
