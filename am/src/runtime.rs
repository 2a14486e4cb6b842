//! Per-location active-message runtime.

use std::{collections::BTreeMap, rc::Rc};

use reverb_core::defs::CommunicatorId;

use crate::{
    comm::AmComm,
    error::AmError,
    factory::{AmListenerFactory, AmRequestFactory},
    handler::{AmHandler, UNREGISTERED},
    listener::AmListenerRef,
    request::{AmRequest, is_finished},
};

// AM RUNTIME
// ================================================================================================

/// The active-message state of one location: handler table, outstanding
/// requests, listeners, and the factories the transports registered with.
///
/// Progress is cooperative: nothing moves unless [`AmRuntime::advance`] is
/// called, typically from replay callbacks between events. There is one
/// runtime value per location; locations progress independently.
pub struct AmRuntime {
    handlers: Vec<Rc<dyn AmHandler>>,
    requests: Vec<Box<dyn AmRequest>>,
    listeners: BTreeMap<CommunicatorId, AmListenerRef>,
    request_factory: AmRequestFactory,
    listener_factory: AmListenerFactory,
}

impl AmRuntime {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            requests: Vec::new(),
            listeners: BTreeMap::new(),
            request_factory: AmRequestFactory::new(),
            listener_factory: AmListenerFactory::new(),
        }
    }

    // FACTORY ACCESS
    // --------------------------------------------------------------------------------------------

    pub fn request_factory(&self) -> &AmRequestFactory {
        &self.request_factory
    }

    pub fn request_factory_mut(&mut self) -> &mut AmRequestFactory {
        &mut self.request_factory
    }

    pub fn listener_factory(&self) -> &AmListenerFactory {
        &self.listener_factory
    }

    pub fn listener_factory_mut(&mut self) -> &mut AmListenerFactory {
        &mut self.listener_factory
    }

    // HANDLER REGISTRY
    // --------------------------------------------------------------------------------------------

    /// Registers a handler and returns its dense id. Registering the same
    /// handler again returns the previously assigned id.
    pub fn register_handler(&mut self, handler: Rc<dyn AmHandler>) -> u32 {
        if let Some(existing) = self.lookup_handler_id(&handler) {
            return existing;
        }
        let id = self.handlers.len() as u32;
        tracing::debug!(id, name = handler.name(), "registered active-message handler");
        self.handlers.push(handler);
        id
    }

    /// Id assigned to `handler`, or [`UNREGISTERED`].
    pub fn handler_id(&self, handler: &Rc<dyn AmHandler>) -> u32 {
        self.lookup_handler_id(handler).unwrap_or(UNREGISTERED)
    }

    pub fn handler(&self, id: u32) -> Option<&Rc<dyn AmHandler>> {
        self.handlers.get(id as usize)
    }

    pub fn num_handlers(&self) -> usize {
        self.handlers.len()
    }

    fn lookup_handler_id(&self, handler: &Rc<dyn AmHandler>) -> Option<u32> {
        self.handlers
            .iter()
            .position(|existing| Rc::ptr_eq(existing, handler))
            .map(|index| index as u32)
    }

    // SENDING
    // --------------------------------------------------------------------------------------------

    /// Creates a request through the registered transport.
    pub fn create_request(
        &self,
        remote: u32,
        comm: &dyn AmComm,
        ensure_synchronous: bool,
    ) -> Result<Box<dyn AmRequest>, AmError> {
        self.request_factory.create(remote, comm, ensure_synchronous)
    }

    /// Starts a packed request and tracks it until completion.
    pub fn enqueue(&mut self, mut request: Box<dyn AmRequest>) -> Result<(), AmError> {
        request.start()?;
        self.requests.push(request);
        Ok(())
    }

    /// Number of outstanding (started, not yet finished) requests.
    pub fn num_pending(&self) -> usize {
        self.requests.len()
    }

    /// Cancels all outstanding requests.
    pub fn cancel_all(&mut self) -> Result<(), AmError> {
        for request in &mut self.requests {
            request.cancel()?;
        }
        self.requests.clear();
        Ok(())
    }

    // RECEIVING
    // --------------------------------------------------------------------------------------------

    /// Returns the listener for `comm`, creating and retaining one on first
    /// use.
    pub fn attach_listener(&mut self, comm: &dyn AmComm) -> Result<AmListenerRef, AmError> {
        if let Some(listener) = self.listeners.get(&comm.id()) {
            return Ok(Rc::clone(listener));
        }
        let listener = self.listener_factory.create(comm)?;
        self.listeners.insert(comm.id(), Rc::clone(&listener));
        Ok(listener)
    }

    /// Drops the runtime's reference to the listener on `comm`.
    pub fn detach_listener(&mut self, comm_id: CommunicatorId) {
        self.listeners.remove(&comm_id);
    }

    // PROGRESS
    // --------------------------------------------------------------------------------------------

    /// Drives outgoing and incoming traffic once: polls outstanding requests
    /// and releases finished ones, then probes every listener and executes
    /// the handlers of all pending messages. Returns the number of
    /// successfully executed handlers.
    ///
    /// A message naming an unknown handler id is skipped with a warning; a
    /// handler failing to decode its payload aborts that invocation only.
    /// Transport failures propagate to the caller.
    pub fn advance(&mut self) -> Result<usize, AmError> {
        // Outgoing progress.
        let mut index = 0;
        while index < self.requests.len() {
            if is_finished(self.requests[index].as_mut())? {
                self.requests.swap_remove(index);
            } else {
                index += 1;
            }
        }

        // Incoming progress.
        let mut executed = 0;
        for listener in self.listeners.values() {
            let mut listener = listener.borrow_mut();
            while listener.probe()? {
                let buffer = listener.buffer();
                let handler_id = match buffer.get_u32() {
                    Ok(id) => id,
                    Err(error) => {
                        tracing::warn!(%error, "active message too short for a handler id");
                        continue;
                    },
                };
                let handler = match self.handlers.get(handler_id as usize) {
                    Some(handler) => Rc::clone(handler),
                    None => {
                        tracing::warn!(handler_id, "skipping message for unknown handler");
                        continue;
                    },
                };
                if let Err(error) = handler.execute(buffer) {
                    tracing::warn!(name = handler.name(), %error, "handler aborted");
                } else {
                    executed += 1;
                }
            }
        }
        Ok(executed)
    }
}

impl Default for AmRuntime {
    fn default() -> Self {
        Self::new()
    }
}
