//! Globally-unified definition catalogue.
//!
//! [`GlobalDefs`] is the read-only snapshot of all definitions referenced by
//! event records: strings, locations, regions, callsites, the calltree,
//! communicators and their member sets, RMA windows, and metrics. It is
//! assembled once through [`GlobalDefsBuilder`] before any trace is replayed;
//! afterwards the only permitted mutation is the on-demand creation of
//! callpath nodes by the trace preprocessing pass, which stays inside this
//! crate.

use std::{collections::HashMap, fmt};

use thiserror::Error;

use crate::ids::{IdOverflowError, IdTable};

mod callpath;
mod communicator;
mod location;
mod metric;
mod paradigm;
mod region;
mod window;

pub use callpath::{Callpath, CallpathId};
pub use communicator::{CommSet, CommSetId, Communicator, CommunicatorId, Membership};
pub use location::{Location, LocationId, LocationKind};
pub use metric::{Metric, MetricId};
pub use paradigm::Paradigm;
pub use region::{Callsite, CallsiteId, Region, RegionId};
pub use window::{RmaWindow, RmaWindowId};

define_id!(
    /// Identifier of an interned string.
    StringId
);

// DEFINITION ERROR
// ================================================================================================

/// Kind tag used in definition lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    String,
    Location,
    Region,
    Callsite,
    Callpath,
    Communicator,
    CommSet,
    RmaWindow,
    Metric,
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefKind::String => "string",
            DefKind::Location => "location",
            DefKind::Region => "region",
            DefKind::Callsite => "callsite",
            DefKind::Callpath => "callpath",
            DefKind::Communicator => "communicator",
            DefKind::CommSet => "communication set",
            DefKind::RmaWindow => "RMA window",
            DefKind::Metric => "metric",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("unknown {kind} definition with id {id}")]
    UnknownDefinition { kind: DefKind, id: u32 },
    #[error(transparent)]
    IdOverflow(#[from] IdOverflowError),
}

// GLOBAL DEFS
// ================================================================================================

/// Unified catalogue of definitions, shared read-only by every location of an
/// analysis process.
#[derive(Debug, Default)]
pub struct GlobalDefs {
    strings: IdTable<StringId, String>,
    locations: IdTable<LocationId, Location>,
    regions: IdTable<RegionId, Region>,
    callsites: IdTable<CallsiteId, Callsite>,
    callpaths: IdTable<CallpathId, Callpath>,
    communicators: IdTable<CommunicatorId, Communicator>,
    comm_sets: IdTable<CommSetId, CommSet>,
    rma_windows: IdTable<RmaWindowId, RmaWindow>,
    metrics: IdTable<MetricId, Metric>,

    /// (parent, region, callsite) -> callpath, for on-demand calltree growth.
    callpath_index: HashMap<(Option<CallpathId>, RegionId, Option<CallsiteId>), CallpathId>,
    world_comm: Option<CommunicatorId>,
    world_comm_set: Option<CommSetId>,
}

impl GlobalDefs {
    // LOOKUPS
    // --------------------------------------------------------------------------------------------

    pub fn string(&self, id: StringId) -> Result<&str, DefinitionError> {
        self.strings
            .get(id)
            .map(String::as_str)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::String, id: id.into() })
    }

    pub fn location(&self, id: LocationId) -> Result<&Location, DefinitionError> {
        self.locations
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::Location, id: id.into() })
    }

    pub fn region(&self, id: RegionId) -> Result<&Region, DefinitionError> {
        self.regions
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::Region, id: id.into() })
    }

    pub fn callsite(&self, id: CallsiteId) -> Result<&Callsite, DefinitionError> {
        self.callsites
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::Callsite, id: id.into() })
    }

    pub fn callpath(&self, id: CallpathId) -> Result<&Callpath, DefinitionError> {
        self.callpaths
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::Callpath, id: id.into() })
    }

    pub fn communicator(&self, id: CommunicatorId) -> Result<&Communicator, DefinitionError> {
        self.communicators.get(id).ok_or(DefinitionError::UnknownDefinition {
            kind: DefKind::Communicator,
            id: id.into(),
        })
    }

    pub fn comm_set(&self, id: CommSetId) -> Result<&CommSet, DefinitionError> {
        self.comm_sets
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::CommSet, id: id.into() })
    }

    pub fn rma_window(&self, id: RmaWindowId) -> Result<&RmaWindow, DefinitionError> {
        self.rma_windows
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::RmaWindow, id: id.into() })
    }

    pub fn metric(&self, id: MetricId) -> Result<&Metric, DefinitionError> {
        self.metrics
            .get(id)
            .ok_or(DefinitionError::UnknownDefinition { kind: DefKind::Metric, id: id.into() })
    }

    // CARDINALITIES
    // --------------------------------------------------------------------------------------------

    pub fn num_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn num_callpaths(&self) -> usize {
        self.callpaths.len()
    }

    /// Number of hardware-counter metrics sampled per enter event.
    pub fn num_metrics(&self) -> usize {
        self.metrics.len()
    }

    // FINDERS
    // --------------------------------------------------------------------------------------------

    /// Roots of the global calltree, in creation order.
    pub fn callpath_roots(&self) -> impl Iterator<Item = CallpathId> + '_ {
        self.callpaths.iter().filter(|(_, cp)| cp.parent.is_none()).map(|(id, _)| id)
    }

    /// The communicator spanning all locations, if one was defined.
    pub fn world_comm(&self) -> Option<CommunicatorId> {
        self.world_comm
    }

    /// The member set spanning all locations, if one was defined.
    pub fn world_comm_set(&self) -> Option<CommSetId> {
        self.world_comm_set
    }

    // PRIVILEGED MUTATION (trace preprocessing only)
    // --------------------------------------------------------------------------------------------

    /// Returns the callpath reached from `parent` through `region`/`callsite`,
    /// creating the calltree node on demand.
    pub(crate) fn callpath_for(
        &mut self,
        parent: Option<CallpathId>,
        region: RegionId,
        callsite: Option<CallsiteId>,
    ) -> Result<CallpathId, DefinitionError> {
        if !self.regions.contains_id(region) {
            return Err(DefinitionError::UnknownDefinition {
                kind: DefKind::Region,
                id: region.into(),
            });
        }
        if let Some(id) = self.callpath_index.get(&(parent, region, callsite)) {
            return Ok(*id);
        }

        tracing::debug!(?parent, %region, "creating calltree node on demand");
        let id = self.callpaths.push(Callpath {
            region,
            callsite,
            parent,
            children: Vec::new(),
        })?;
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.callpaths.get_mut(parent_id) {
                parent_node.children.push(id);
            }
        }
        self.callpath_index.insert((parent, region, callsite), id);
        Ok(id)
    }
}

// GLOBAL DEFS BUILDER
// ================================================================================================

/// Assembles a [`GlobalDefs`] catalogue, validating every cross-reference at
/// insertion time so that events can later resolve references without
/// checking.
#[derive(Debug, Default)]
pub struct GlobalDefsBuilder {
    defs: GlobalDefs,
}

impl GlobalDefsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_string(&mut self, value: impl Into<String>) -> Result<StringId, DefinitionError> {
        Ok(self.defs.strings.push(value.into())?)
    }

    pub fn add_location(&mut self, location: Location) -> Result<LocationId, DefinitionError> {
        self.check_string(location.name)?;
        if let Some(parent) = location.parent {
            self.check(self.defs.locations.contains_id(parent), DefKind::Location, parent)?;
        }
        Ok(self.defs.locations.push(location)?)
    }

    pub fn add_region(&mut self, region: Region) -> Result<RegionId, DefinitionError> {
        self.check_string(region.name)?;
        if let Some(file) = region.file {
            self.check_string(file)?;
        }
        Ok(self.defs.regions.push(region)?)
    }

    pub fn add_callsite(&mut self, callsite: Callsite) -> Result<CallsiteId, DefinitionError> {
        self.check_string(callsite.file)?;
        self.check(self.defs.regions.contains_id(callsite.callee), DefKind::Region, callsite.callee)?;
        Ok(self.defs.callsites.push(callsite)?)
    }

    /// Adds an explicit calltree node. The preprocessing pass can add further
    /// nodes on demand later.
    pub fn add_callpath(
        &mut self,
        region: RegionId,
        callsite: Option<CallsiteId>,
        parent: Option<CallpathId>,
    ) -> Result<CallpathId, DefinitionError> {
        self.check(self.defs.regions.contains_id(region), DefKind::Region, region)?;
        if let Some(cs) = callsite {
            self.check(self.defs.callsites.contains_id(cs), DefKind::Callsite, cs)?;
        }
        if let Some(p) = parent {
            self.check(self.defs.callpaths.contains_id(p), DefKind::Callpath, p)?;
        }
        let id = self.defs.callpaths.push(Callpath {
            region,
            callsite,
            parent,
            children: Vec::new(),
        })?;
        if let Some(p) = parent {
            if let Some(parent_node) = self.defs.callpaths.get_mut(p) {
                parent_node.children.push(id);
            }
        }
        self.defs.callpath_index.insert((parent, region, callsite), id);
        Ok(id)
    }

    pub fn add_comm_set(&mut self, set: CommSet) -> Result<CommSetId, DefinitionError> {
        self.check_string(set.name)?;
        let is_world = matches!(set.membership, Membership::World);
        let id = self.defs.comm_sets.push(set)?;
        if is_world && self.defs.world_comm_set.is_none() {
            self.defs.world_comm_set = Some(id);
        }
        Ok(id)
    }

    pub fn add_communicator(
        &mut self,
        comm: Communicator,
    ) -> Result<CommunicatorId, DefinitionError> {
        self.check_string(comm.name)?;
        self.check(self.defs.comm_sets.contains_id(comm.comm_set), DefKind::CommSet, comm.comm_set)?;
        if let Some(parent) = comm.parent {
            self.check(
                self.defs.communicators.contains_id(parent),
                DefKind::Communicator,
                parent,
            )?;
        }
        let is_world = matches!(
            self.defs.comm_sets[comm.comm_set].membership,
            Membership::World
        );
        let id = self.defs.communicators.push(comm)?;
        if is_world && self.defs.world_comm.is_none() {
            self.defs.world_comm = Some(id);
        }
        Ok(id)
    }

    pub fn add_rma_window(&mut self, window: RmaWindow) -> Result<RmaWindowId, DefinitionError> {
        self.check(
            self.defs.communicators.contains_id(window.comm),
            DefKind::Communicator,
            window.comm,
        )?;
        Ok(self.defs.rma_windows.push(window)?)
    }

    pub fn add_metric(&mut self, metric: Metric) -> Result<MetricId, DefinitionError> {
        self.check_string(metric.name)?;
        self.check_string(metric.description)?;
        Ok(self.defs.metrics.push(metric)?)
    }

    /// Finalizes the catalogue; no further definitions can be added.
    pub fn build(self) -> GlobalDefs {
        self.defs
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn check_string(&self, id: StringId) -> Result<(), DefinitionError> {
        self.check(self.defs.strings.contains_id(id), DefKind::String, id)
    }

    fn check<I: Into<u32>>(
        &self,
        present: bool,
        kind: DefKind,
        id: I,
    ) -> Result<(), DefinitionError> {
        if present {
            Ok(())
        } else {
            Err(DefinitionError::UnknownDefinition { kind, id: id.into() })
        }
    }
}

// TESTS
// ================================================================================================
