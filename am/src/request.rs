use reverb_core::{Buffer, defs::CommunicatorId};

use crate::error::AmError;

// REQUEST STATE
// ================================================================================================

/// Lifecycle of an outgoing active-message request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Created but not yet handed to the transport.
    Constructed,
    /// In flight after [`AmRequest::start`].
    Posted,
    /// The transport reported completion.
    Complete,
    /// Cancelled by the caller.
    Cancelled,
}

// AM REQUEST
// ================================================================================================

/// An outgoing active message.
///
/// The caller packs `[handler id | payload]` into the request's buffer,
/// starts it, and either polls it directly or hands it to the runtime's
/// progress engine. Requests are uniquely owned; ownership passes to the
/// runtime on [`AmRuntime::enqueue`](crate::AmRuntime::enqueue).
pub trait AmRequest {
    /// Hands the message to the transport. Valid once, from `Constructed`.
    fn start(&mut self) -> Result<(), AmError>;

    /// Polls the transport; returns true when the request is complete. With
    /// `ensure_synchronous`, completion additionally implies the peer has
    /// matched the message.
    fn test(&mut self) -> Result<bool, AmError>;

    /// Cancels an incomplete request and releases its transport resources.
    /// Safe to call in any state, any number of times.
    fn cancel(&mut self) -> Result<(), AmError>;

    fn state(&self) -> RequestState;

    /// Message buffer; packed by the caller before `start`.
    fn buffer(&mut self) -> &mut Buffer;

    /// Rank of the target within the communicator.
    fn remote(&self) -> u32;

    /// Communicator the message travels on.
    fn comm_id(&self) -> CommunicatorId;

    /// Whether rendezvous (synchronous-send) semantics were requested.
    fn ensure_synchronous(&self) -> bool;
}

/// Returns true once `request` no longer needs progress (complete or
/// cancelled), polling the transport if necessary.
pub fn is_finished(request: &mut dyn AmRequest) -> Result<bool, AmError> {
    match request.state() {
        RequestState::Complete | RequestState::Cancelled => Ok(true),
        RequestState::Constructed => Ok(false),
        RequestState::Posted => request.test(),
    }
}
