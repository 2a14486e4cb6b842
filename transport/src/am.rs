//! Active-message request and listener over the channel transport.

use std::{cell::RefCell, rc::Rc};

use reverb_am::{
    AmComm, AmError, AmListener, AmListenerFactory, AmListenerRef, AmRequest, AmRequestFactory,
    AmRuntime, RequestState,
};
use reverb_core::{Buffer, defs::CommunicatorId};

use crate::{comm::ChannelComm, message::ChannelMessage, network::TransportError};

impl From<TransportError> for AmError {
    fn from(error: TransportError) -> Self {
        AmError::transport(error.to_string())
    }
}

fn downcast_comm(comm: &dyn AmComm) -> Result<&ChannelComm, AmError> {
    comm.as_any()
        .downcast_ref::<ChannelComm>()
        .ok_or_else(|| AmError::transport("communicator is not bound to the channel transport"))
}

// CHANNEL AM REQUEST
// ================================================================================================

/// An outgoing active message over the channel transport.
pub struct ChannelAmRequest {
    message: ChannelMessage,
    comm_id: CommunicatorId,
    am_tag: u32,
    remote: u32,
    sync: bool,
    state: RequestState,
}

impl ChannelAmRequest {
    /// Factory method used by the request factory registration.
    pub fn create(
        remote: u32,
        comm: &dyn AmComm,
        ensure_synchronous: bool,
    ) -> Result<Box<dyn AmRequest>, AmError> {
        let comm = downcast_comm(comm)?;
        Ok(Box::new(ChannelAmRequest {
            am_tag: comm.salted_tag(comm.endpoint().am_tag()),
            message: comm.message(),
            comm_id: comm.id(),
            remote,
            sync: ensure_synchronous,
            state: RequestState::Constructed,
        }))
    }
}

impl AmRequest for ChannelAmRequest {
    fn start(&mut self) -> Result<(), AmError> {
        if self.state != RequestState::Constructed {
            return Err(AmError::InvalidRequestState(self.state));
        }
        if self.sync {
            self.message.issend(self.remote, self.am_tag)?;
        } else {
            self.message.isend(self.remote, self.am_tag)?;
        }
        self.state = RequestState::Posted;
        Ok(())
    }

    fn test(&mut self) -> Result<bool, AmError> {
        if self.state == RequestState::Posted && self.message.test() {
            self.state = RequestState::Complete;
        }
        Ok(self.state == RequestState::Complete)
    }

    fn cancel(&mut self) -> Result<(), AmError> {
        self.message.cancel();
        self.state = RequestState::Cancelled;
        Ok(())
    }

    fn state(&self) -> RequestState {
        self.state
    }

    fn buffer(&mut self) -> &mut Buffer {
        self.message.buffer_mut()
    }

    fn remote(&self) -> u32 {
        self.remote
    }

    fn comm_id(&self) -> CommunicatorId {
        self.comm_id
    }

    fn ensure_synchronous(&self) -> bool {
        self.sync
    }
}

// CHANNEL AM LISTENER
// ================================================================================================

/// Receives active messages from any source on the reserved tag of one
/// communicator.
pub struct ChannelAmListener {
    message: ChannelMessage,
    comm_id: CommunicatorId,
    am_tag: u32,
}

impl ChannelAmListener {
    /// Factory method used by the listener factory registration.
    pub fn create(comm: &dyn AmComm) -> Result<AmListenerRef, AmError> {
        let comm = downcast_comm(comm)?;
        Ok(Rc::new(RefCell::new(ChannelAmListener {
            am_tag: comm.salted_tag(comm.endpoint().am_tag()),
            message: comm.message(),
            comm_id: comm.id(),
        })))
    }
}

impl AmListener for ChannelAmListener {
    fn probe(&mut self) -> Result<bool, AmError> {
        Ok(self.message.probe(None, self.am_tag))
    }

    fn buffer(&mut self) -> &mut Buffer {
        self.message.buffer_mut()
    }

    fn comm_id(&self) -> CommunicatorId {
        self.comm_id
    }
}

// FACTORY REGISTRATION
// ================================================================================================

/// Installs the channel transport's constructors for MPI-paradigm
/// communicators into the given factories.
pub fn register_channel_transport(
    request_factory: &mut AmRequestFactory,
    listener_factory: &mut AmListenerFactory,
) {
    use reverb_core::defs::Paradigm;

    request_factory.register_callback(Paradigm::Mpi, ChannelAmRequest::create);
    listener_factory.register_callback(Paradigm::Mpi, ChannelAmListener::create);
}

/// Installs the channel transport into a runtime's factories.
pub fn install_channel_transport(runtime: &mut AmRuntime) {
    use reverb_core::defs::Paradigm;

    runtime
        .request_factory_mut()
        .register_callback(Paradigm::Mpi, ChannelAmRequest::create);
    runtime
        .listener_factory_mut()
        .register_callback(Paradigm::Mpi, ChannelAmListener::create);
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use reverb_am::AmHandler;
    use reverb_core::defs::Paradigm;

    use super::*;
    use crate::network::ChannelNetwork;

    struct CheckPayload {
        expected: u32,
        hits: Rc<RefCell<u32>>,
    }

    impl AmHandler for CheckPayload {
        fn execute(&self, buffer: &mut Buffer) -> Result<(), AmError> {
            assert_eq!(buffer.get_u32()?, self.expected);
            *self.hits.borrow_mut() += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "CheckPayload"
        }
    }

    fn two_location_setup() -> (AmRuntime, ChannelComm, AmRuntime, ChannelComm) {
        let mut endpoints = ChannelNetwork::new(2).into_iter();
        let comm_a = ChannelComm::new(
            CommunicatorId::from(0),
            Paradigm::Mpi,
            Rc::new(endpoints.next().unwrap()),
        );
        let comm_b = ChannelComm::new(
            CommunicatorId::from(0),
            Paradigm::Mpi,
            Rc::new(endpoints.next().unwrap()),
        );
        let mut runtime_a = AmRuntime::new();
        let mut runtime_b = AmRuntime::new();
        install_channel_transport(&mut runtime_a);
        install_channel_transport(&mut runtime_b);
        (runtime_a, comm_a, runtime_b, comm_b)
    }

    #[test]
    fn active_message_round_trip_between_two_locations() {
        let (mut runtime_a, comm_a, mut runtime_b, comm_b) = two_location_setup();

        // Handlers register in the same order on every location, so the
        // dense ids agree across the network.
        let hits = Rc::new(RefCell::new(0));
        runtime_a.register_handler(Rc::new(CheckPayload {
            expected: 42,
            hits: Rc::new(RefCell::new(0)),
        }));
        let handler_id = runtime_b.register_handler(Rc::new(CheckPayload {
            expected: 42,
            hits: Rc::clone(&hits),
        }));

        runtime_b.attach_listener(&comm_b).unwrap();

        let mut request = runtime_a.create_request(1, &comm_a, false).unwrap();
        request.buffer().put_u32(handler_id);
        request.buffer().put_u32(42);
        runtime_a.enqueue(request).unwrap();

        assert_eq!(runtime_b.advance().unwrap(), 1);
        assert_eq!(*hits.borrow(), 1);

        // A second advance finds nothing new.
        assert_eq!(runtime_b.advance().unwrap(), 0);
        assert_eq!(*hits.borrow(), 1);

        // The sender's request has completed.
        runtime_a.advance().unwrap();
        assert_eq!(runtime_a.num_pending(), 0);
    }

    #[test]
    fn synchronous_request_completes_only_after_the_peer_matched() {
        let (mut runtime_a, comm_a, mut runtime_b, comm_b) = two_location_setup();

        let hits = Rc::new(RefCell::new(0));
        let handler_id = runtime_b.register_handler(Rc::new(CheckPayload {
            expected: 7,
            hits: Rc::clone(&hits),
        }));
        runtime_b.attach_listener(&comm_b).unwrap();

        let mut request = runtime_a.create_request(1, &comm_a, true).unwrap();
        request.buffer().put_u32(handler_id);
        request.buffer().put_u32(7);
        runtime_a.enqueue(request).unwrap();

        // Not complete until B progresses.
        runtime_a.advance().unwrap();
        assert_eq!(runtime_a.num_pending(), 1);

        runtime_b.advance().unwrap();
        assert_eq!(*hits.borrow(), 1);

        runtime_a.advance().unwrap();
        assert_eq!(runtime_a.num_pending(), 0);
    }

    #[test]
    fn request_cancel_is_idempotent_over_the_channel_transport() {
        let (runtime_a, comm_a, _runtime_b, _comm_b) = two_location_setup();

        let mut request = runtime_a.create_request(1, &comm_a, true).unwrap();
        request.buffer().put_u32(0);
        request.start().unwrap();
        request.cancel().unwrap();
        assert_eq!(request.state(), RequestState::Cancelled);
        request.cancel().unwrap();
        assert_eq!(request.state(), RequestState::Cancelled);
    }
}
