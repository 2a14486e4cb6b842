//! Paradigm-dispatched request and listener factories.
//!
//! Each transport registers one constructor per paradigm it serves; the
//! factories pick the constructor from the paradigm of the communicator
//! handed in. Factories are plain values owned by the runtime — there is no
//! process-global registration state.

use std::collections::BTreeMap;

use reverb_core::defs::Paradigm;

use crate::{
    comm::AmComm,
    error::AmError,
    listener::AmListenerRef,
    request::AmRequest,
};

type RequestCtor = Box<dyn Fn(u32, &dyn AmComm, bool) -> Result<Box<dyn AmRequest>, AmError>>;
type ListenerCtor = Box<dyn Fn(&dyn AmComm) -> Result<AmListenerRef, AmError>>;

// AM REQUEST FACTORY
// ================================================================================================

/// Creates transport-specific requests for a `(remote, comm, sync)` tuple.
#[derive(Default)]
pub struct AmRequestFactory {
    ctors: BTreeMap<Paradigm, RequestCtor>,
}

impl AmRequestFactory {
    pub fn new() -> Self {
        Self { ctors: BTreeMap::new() }
    }

    /// Registers the request constructor for a paradigm, replacing any
    /// previous registration.
    pub fn register_callback<F>(&mut self, paradigm: Paradigm, ctor: F)
    where
        F: Fn(u32, &dyn AmComm, bool) -> Result<Box<dyn AmRequest>, AmError> + 'static,
    {
        self.ctors.insert(paradigm, Box::new(ctor));
    }

    /// Creates a request targeting rank `remote` of `comm`. With
    /// `ensure_synchronous` the transport must guarantee rendezvous
    /// semantics.
    pub fn create(
        &self,
        remote: u32,
        comm: &dyn AmComm,
        ensure_synchronous: bool,
    ) -> Result<Box<dyn AmRequest>, AmError> {
        let ctor = self
            .ctors
            .get(&comm.paradigm())
            .ok_or(AmError::UnsupportedParadigm(comm.paradigm()))?;
        ctor(remote, comm, ensure_synchronous)
    }
}

// AM LISTENER FACTORY
// ================================================================================================

/// Creates transport-specific listeners for a communicator.
#[derive(Default)]
pub struct AmListenerFactory {
    ctors: BTreeMap<Paradigm, ListenerCtor>,
}

impl AmListenerFactory {
    pub fn new() -> Self {
        Self { ctors: BTreeMap::new() }
    }

    /// Registers the listener constructor for a paradigm, replacing any
    /// previous registration.
    pub fn register_callback<F>(&mut self, paradigm: Paradigm, ctor: F)
    where
        F: Fn(&dyn AmComm) -> Result<AmListenerRef, AmError> + 'static,
    {
        self.ctors.insert(paradigm, Box::new(ctor));
    }

    /// Creates a listener receiving on `comm`.
    pub fn create(&self, comm: &dyn AmComm) -> Result<AmListenerRef, AmError> {
        let ctor = self
            .ctors
            .get(&comm.paradigm())
            .ok_or(AmError::UnsupportedParadigm(comm.paradigm()))?;
        ctor(comm)
    }
}
