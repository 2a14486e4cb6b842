use super::{Paradigm, StringId};

define_id!(
    /// Identifier of a [`Region`] definition.
    RegionId
);

define_id!(
    /// Identifier of a [`Callsite`] definition.
    CallsiteId
);

// REGION
// ================================================================================================

/// A source-level scope (function, loop, or instrumented block) that enter
/// and leave events refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: StringId,
    pub paradigm: Paradigm,
    pub file: Option<StringId>,
    pub begin_line: Option<u32>,
    pub end_line: Option<u32>,
}

// CALLSITE
// ================================================================================================

/// A specific call location within a region, referenced by `EnterCs` events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callsite {
    pub file: StringId,
    pub line: u32,
    pub callee: RegionId,
}
