use super::CommunicatorId;

define_id!(
    /// Identifier of an [`RmaWindow`] definition.
    RmaWindowId
);

// RMA WINDOW
// ================================================================================================

/// A memory region exposed for one-sided access, bound to the communicator
/// whose members may target it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmaWindow {
    pub comm: CommunicatorId,
}
