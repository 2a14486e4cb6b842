//! In-process channel transport for the Reverb active-message runtime.
//!
//! Any substrate with FIFO semantics between each pair of peers can carry the
//! engine's messages. This crate provides such a substrate over
//! `crossbeam-channel`: a [`ChannelNetwork`] wires one endpoint per rank, a
//! [`ChannelMessage`] gives a buffer the point-to-point surface the runtime
//! expects (send/isend/issend/test/cancel/probe/bcast), and
//! [`register_channel_transport`] plugs the concrete request and listener
//! types into the active-message factories.

mod am;
mod comm;
mod message;
mod network;

// RE-EXPORTS
// ================================================================================================

pub use am::{ChannelAmListener, ChannelAmRequest, install_channel_transport,
    register_channel_transport};
pub use comm::ChannelComm;
pub use message::ChannelMessage;
pub use network::{AM_TAG, ChannelEndpoint, ChannelNetwork, NetworkConfig, TransportError};
