use smallvec::SmallVec;

use super::FormatError;
use crate::{
    Buffer,
    defs::{CallpathId, CallsiteId, DefKind, GlobalDefs, RegionId, StringId},
};

/// Hardware-counter samples attached to an enter event.
pub type MetricSamples = SmallVec<[u64; 4]>;

// CALL CONTEXT
// ================================================================================================

/// Region-or-callpath reference carried by enter and leave events.
///
/// A freshly loaded record stores the raw region reference; the trace
/// preprocessing pass rewrites it to the callpath reached in the global
/// calltree. The state is explicit on the wire as a leading byte (0 = region,
/// 1 = callpath).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallContext {
    Region(RegionId),
    Callpath(CallpathId),
}

impl CallContext {
    pub fn region(self) -> Option<RegionId> {
        match self {
            CallContext::Region(region) => Some(region),
            CallContext::Callpath(_) => None,
        }
    }

    pub fn callpath(self) -> Option<CallpathId> {
        match self {
            CallContext::Region(_) => None,
            CallContext::Callpath(callpath) => Some(callpath),
        }
    }

    /// Resolves the referenced region, consulting the calltree when the
    /// context has already been rewritten.
    pub fn resolve_region(self, defs: &GlobalDefs) -> Result<RegionId, FormatError> {
        match self {
            CallContext::Region(region) => Ok(region),
            CallContext::Callpath(callpath) => Ok(defs.callpath(callpath)?.region),
        }
    }

    pub(super) fn pack(self, buffer: &mut Buffer) {
        match self {
            CallContext::Region(region) => {
                buffer.put_u8(0);
                buffer.put_id(Some(region));
            },
            CallContext::Callpath(callpath) => {
                buffer.put_u8(1);
                buffer.put_id(Some(callpath));
            },
        }
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        match buffer.get_u8()? {
            0 => {
                let region = buffer
                    .get_id::<RegionId>()?
                    .ok_or(FormatError::MissingReference(DefKind::Region))?;
                defs.region(region)?;
                Ok(CallContext::Region(region))
            },
            1 => {
                let callpath = buffer
                    .get_id::<CallpathId>()?
                    .ok_or(FormatError::MissingReference(DefKind::Callpath))?;
                defs.callpath(callpath)?;
                Ok(CallContext::Callpath(callpath))
            },
            state => Err(FormatError::InvalidCallContextState(state)),
        }
    }
}

// ENTER
// ================================================================================================

/// Entering a source-code region.
#[derive(Debug, Clone, PartialEq)]
pub struct EnterEvent {
    pub context: CallContext,
    pub metrics: MetricSamples,
}

impl EnterEvent {
    pub fn new(region: RegionId, metrics: MetricSamples) -> Self {
        Self { context: CallContext::Region(region), metrics }
    }

    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.context.pack(buffer);
        buffer.put_u8(self.metrics.len() as u8);
        for sample in &self.metrics {
            buffer.put_u64(*sample);
        }
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let context = CallContext::unpack(defs, buffer)?;
        let count = buffer.get_u8()? as usize;
        let mut metrics = MetricSamples::new();
        for _ in 0..count {
            metrics.push(buffer.get_u64()?);
        }
        Ok(Self { context, metrics })
    }
}

// ENTER CALLSITE
// ================================================================================================

/// Entering a region through an instrumented callsite.
#[derive(Debug, Clone, PartialEq)]
pub struct EnterCsEvent {
    pub base: EnterEvent,
    pub callsite: CallsiteId,
}

impl EnterCsEvent {
    pub fn new(region: RegionId, callsite: CallsiteId, metrics: MetricSamples) -> Self {
        Self { base: EnterEvent::new(region, metrics), callsite }
    }

    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
        buffer.put_id(Some(self.callsite));
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let base = EnterEvent::unpack(defs, buffer)?;
        let callsite = buffer
            .get_id::<CallsiteId>()?
            .ok_or(FormatError::MissingReference(DefKind::Callsite))?;
        defs.callsite(callsite)?;
        Ok(Self { base, callsite })
    }
}

// ENTER PROGRAM
// ================================================================================================

/// Entering the program's top-level region, carrying its name and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct EnterProgramEvent {
    pub base: EnterEvent,
    pub name: StringId,
    pub arguments: Vec<StringId>,
}

impl EnterProgramEvent {
    pub fn new(
        region: RegionId,
        name: StringId,
        arguments: Vec<StringId>,
        metrics: MetricSamples,
    ) -> Self {
        Self {
            base: EnterEvent::new(region, metrics),
            name,
            arguments,
        }
    }

    pub(super) fn pack(&self, buffer: &mut Buffer) {
        self.base.pack(buffer);
        buffer.put_id(Some(self.name));
        buffer.put_u32(self.arguments.len() as u32);
        for argument in &self.arguments {
            buffer.put_id(Some(*argument));
        }
    }

    pub(super) fn unpack(defs: &GlobalDefs, buffer: &mut Buffer) -> Result<Self, FormatError> {
        let base = EnterEvent::unpack(defs, buffer)?;
        let name = buffer
            .get_id::<StringId>()?
            .ok_or(FormatError::MissingReference(DefKind::String))?;
        defs.string(name)?;
        let count = buffer.get_u32()? as usize;
        let mut arguments = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let argument = buffer
                .get_id::<StringId>()?
                .ok_or(FormatError::MissingReference(DefKind::String))?;
            defs.string(argument)?;
            arguments.push(argument);
        }
        Ok(Self { base, name, arguments })
    }
}
