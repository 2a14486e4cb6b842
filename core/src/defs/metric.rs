use super::StringId;

define_id!(
    /// Identifier of a [`Metric`] definition.
    MetricId
);

// METRIC
// ================================================================================================

/// A hardware-counter metric whose samples may be attached to enter events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub name: StringId,
    pub description: StringId,
}
