use super::StringId;

define_id!(
    /// Identifier of a [`Location`] definition.
    LocationId
);

// LOCATION
// ================================================================================================

/// Kind of entity an event stream was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationKind {
    CpuThread,
    GpuThread,
    MetricLocation,
}

/// A single recorded event stream: an MPI rank, a thread within a rank, or an
/// auxiliary metric stream.
///
/// Locations form a hierarchy through `parent`; the `rank` is the location's
/// position within the global location order and is what communicator member
/// sets refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: StringId,
    pub kind: LocationKind,
    pub parent: Option<LocationId>,
    pub rank: u32,
}
