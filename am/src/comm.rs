use std::any::Any;

use reverb_core::defs::{CommunicatorId, Paradigm};

// AM COMM
// ================================================================================================

/// A communicator bound to a live transport.
///
/// The definition catalogue describes communicators as pure data; a
/// transport binds them to actual endpoints. The factories dispatch on
/// [`AmComm::paradigm`] and the chosen constructor downcasts via
/// [`AmComm::as_any`] to its concrete communicator type.
pub trait AmComm {
    /// Definition this communicator corresponds to.
    fn id(&self) -> CommunicatorId;

    fn paradigm(&self) -> Paradigm;

    /// Number of ranks in the communicator.
    fn size(&self) -> u32;

    /// Rank of the calling location within the communicator.
    fn local_rank(&self) -> u32;

    fn as_any(&self) -> &dyn Any;
}
