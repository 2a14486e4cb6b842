//! Channel-wired network of per-rank endpoints.

use std::{
    cell::RefCell,
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crossbeam_channel::{Receiver, Sender, unbounded};
use thiserror::Error;

/// Reserved tag carrying active messages; the same value is reserved by the
/// engine's MPI binding, so mixed deployments interoperate. Override per
/// network through [`NetworkConfig`].
pub const AM_TAG: u32 = 170_275;

// TRANSPORT ERROR
// ================================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("peer rank {0} out of range")]
    InvalidRank(u32),
    #[error("transport disconnected")]
    Disconnected,
}

// NETWORK CONFIG
// ================================================================================================

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Tag the active-message listeners probe on.
    pub am_tag: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { am_tag: AM_TAG }
    }
}

// ENVELOPE
// ================================================================================================

/// One message in flight between two endpoints.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub src: u32,
    pub tag: u32,
    pub payload: Vec<u8>,
    /// Set when the receiver dequeues the message; backs rendezvous sends.
    pub delivery: Option<Arc<AtomicBool>>,
}

// CHANNEL NETWORK
// ================================================================================================

/// Builds the fully-connected channel mesh for a set of ranks.
pub struct ChannelNetwork;

impl ChannelNetwork {
    /// Wires `size` endpoints with default configuration.
    pub fn new(size: u32) -> Vec<ChannelEndpoint> {
        Self::with_config(size, NetworkConfig::default())
    }

    /// Wires `size` endpoints with the given configuration.
    ///
    /// Every endpoint gets one inbound channel; senders keep per-producer
    /// FIFO order, which gives the FIFO-per-pair guarantee the engine
    /// requires.
    pub fn with_config(size: u32, config: NetworkConfig) -> Vec<ChannelEndpoint> {
        tracing::debug!(size, am_tag = config.am_tag, "wiring channel network");
        let mut channels = Vec::with_capacity(size as usize);
        for _ in 0..size {
            channels.push(unbounded::<Envelope>());
        }
        let senders: Vec<Sender<Envelope>> =
            channels.iter().map(|(sender, _)| sender.clone()).collect();

        channels
            .into_iter()
            .enumerate()
            .map(|(rank, (_, receiver))| ChannelEndpoint {
                rank: rank as u32,
                size,
                am_tag: config.am_tag,
                senders: senders.clone(),
                receiver,
                pending: RefCell::new(VecDeque::new()),
            })
            .collect()
    }
}

// CHANNEL ENDPOINT
// ================================================================================================

/// One rank's attachment to the network.
///
/// The endpoint owns its inbound channel plus a pending queue of messages
/// that arrived but were not yet consumed by a matching probe or receive.
/// Matching scans the pending queue in arrival order, so messages of the
/// same source and tag are always taken in the order they were sent.
pub struct ChannelEndpoint {
    rank: u32,
    size: u32,
    am_tag: u32,
    senders: Vec<Sender<Envelope>>,
    receiver: Receiver<Envelope>,
    pending: RefCell<VecDeque<Envelope>>,
}

impl ChannelEndpoint {
    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Tag active messages travel on within this network.
    pub fn am_tag(&self) -> u32 {
        self.am_tag
    }

    // SENDING
    // --------------------------------------------------------------------------------------------

    pub(crate) fn post(
        &self,
        dest: u32,
        tag: u32,
        payload: Vec<u8>,
        delivery: Option<Arc<AtomicBool>>,
    ) -> Result<(), TransportError> {
        let sender = self
            .senders
            .get(dest as usize)
            .ok_or(TransportError::InvalidRank(dest))?;
        sender
            .send(Envelope { src: self.rank, tag, payload, delivery })
            .map_err(|_| TransportError::Disconnected)
    }

    // RECEIVING
    // --------------------------------------------------------------------------------------------

    /// Takes the first pending message matching `source` (any source when
    /// `None`) and `tag`, without blocking.
    pub(crate) fn try_take(&self, source: Option<u32>, tag: u32) -> Option<Envelope> {
        self.drain();
        self.take_pending(source, tag)
    }

    /// Takes the first matching message, blocking until one arrives.
    pub(crate) fn take_blocking(
        &self,
        source: Option<u32>,
        tag: u32,
    ) -> Result<Envelope, TransportError> {
        loop {
            if let Some(envelope) = self.try_take(source, tag) {
                return Ok(envelope);
            }
            let envelope = self.receiver.recv().map_err(|_| TransportError::Disconnected)?;
            self.pending.borrow_mut().push_back(envelope);
        }
    }

    fn drain(&self) {
        let mut pending = self.pending.borrow_mut();
        while let Ok(envelope) = self.receiver.try_recv() {
            pending.push_back(envelope);
        }
    }

    fn take_pending(&self, source: Option<u32>, tag: u32) -> Option<Envelope> {
        let mut pending = self.pending.borrow_mut();
        let position = pending
            .iter()
            .position(|envelope| envelope.tag == tag && source.is_none_or(|s| s == envelope.src))?;
        let envelope = pending.remove(position)?;
        if let Some(delivery) = &envelope.delivery {
            delivery.store(true, Ordering::Release);
        }
        Some(envelope)
    }
}

// TESTS
// ================================================================================================
