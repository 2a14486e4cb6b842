//! Point-to-point message surface over a channel endpoint.

use std::{
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use reverb_core::Buffer;

use crate::network::{ChannelEndpoint, TransportError};

enum SendTracker {
    /// Buffered send; complete as soon as it was posted.
    Eager,
    /// Rendezvous send; complete once the peer has dequeued the message.
    Rendezvous(Arc<AtomicBool>),
}

// CHANNEL MESSAGE
// ================================================================================================

/// A message buffer bound to a channel endpoint.
///
/// This is the transport's counterpart of the engine's buffer contract: the
/// payload lives in a [`Buffer`], and the methods move it across the network
/// with the usual point-to-point surface. At most one send is in flight per
/// message at a time.
pub struct ChannelMessage {
    buffer: Buffer,
    endpoint: Rc<ChannelEndpoint>,
    in_flight: Option<SendTracker>,
}

impl ChannelMessage {
    pub fn new(endpoint: Rc<ChannelEndpoint>) -> Self {
        Self {
            buffer: Buffer::new(),
            endpoint,
            in_flight: None,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn endpoint(&self) -> &Rc<ChannelEndpoint> {
        &self.endpoint
    }

    // SENDING
    // --------------------------------------------------------------------------------------------

    /// Blocking send; with a buffered substrate this completes immediately
    /// after posting.
    pub fn send(&mut self, dest: u32, tag: u32) -> Result<(), TransportError> {
        self.endpoint.post(dest, tag, self.buffer.as_slice().to_vec(), None)
    }

    /// Starts a non-blocking send; poll with [`ChannelMessage::test`].
    pub fn isend(&mut self, dest: u32, tag: u32) -> Result<(), TransportError> {
        self.endpoint.post(dest, tag, self.buffer.as_slice().to_vec(), None)?;
        self.in_flight = Some(SendTracker::Eager);
        Ok(())
    }

    /// Starts a non-blocking synchronous send: the message does not complete
    /// until the peer has matched it.
    pub fn issend(&mut self, dest: u32, tag: u32) -> Result<(), TransportError> {
        let delivery = Arc::new(AtomicBool::new(false));
        self.endpoint
            .post(dest, tag, self.buffer.as_slice().to_vec(), Some(Arc::clone(&delivery)))?;
        self.in_flight = Some(SendTracker::Rendezvous(delivery));
        Ok(())
    }

    /// Polls the outstanding send, if any; true when no send is in flight
    /// anymore.
    pub fn test(&mut self) -> bool {
        let done = match &self.in_flight {
            None => true,
            Some(SendTracker::Eager) => true,
            Some(SendTracker::Rendezvous(delivery)) => delivery.load(Ordering::Acquire),
        };
        if done {
            self.in_flight = None;
        }
        done
    }

    /// Spins until the outstanding send completes.
    pub fn wait(&mut self) {
        while !self.test() {
            std::thread::yield_now();
        }
    }

    /// Abandons the outstanding send; the completion is no longer tracked.
    /// Safe to call in any state, any number of times.
    pub fn cancel(&mut self) {
        self.in_flight = None;
    }

    // RECEIVING
    // --------------------------------------------------------------------------------------------

    /// Non-blocking probe-and-receive: if a message matching `source` (any
    /// when `None`) and `tag` is available, it replaces the buffer content
    /// (cursor rewound) and the method returns true.
    pub fn probe(&mut self, source: Option<u32>, tag: u32) -> bool {
        match self.endpoint.try_take(source, tag) {
            Some(envelope) => {
                self.buffer.assign(&envelope.payload);
                true
            },
            None => false,
        }
    }

    /// Blocking receive of the next message matching `source` and `tag`.
    pub fn recv(&mut self, source: Option<u32>, tag: u32) -> Result<(), TransportError> {
        let envelope = self.endpoint.take_blocking(source, tag)?;
        self.buffer.assign(&envelope.payload);
        Ok(())
    }

    // COLLECTIVES
    // --------------------------------------------------------------------------------------------

    /// Broadcasts the root's buffer to every rank: the root posts to all
    /// peers, every other rank blocks until the root's message arrives.
    pub fn bcast(&mut self, root: u32, tag: u32) -> Result<(), TransportError> {
        if self.endpoint.rank() == root {
            for dest in 0..self.endpoint.size() {
                if dest != root {
                    self.endpoint.post(dest, tag, self.buffer.as_slice().to_vec(), None)?;
                }
            }
            Ok(())
        } else {
            let envelope = self.endpoint.take_blocking(Some(root), tag)?;
            self.buffer.assign(&envelope.payload);
            Ok(())
        }
    }
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ChannelNetwork;

    fn pair() -> (ChannelMessage, ChannelMessage) {
        let mut endpoints = ChannelNetwork::new(2).into_iter();
        let a = ChannelMessage::new(Rc::new(endpoints.next().unwrap()));
        let b = ChannelMessage::new(Rc::new(endpoints.next().unwrap()));
        (a, b)
    }

    #[test]
    fn isend_completes_without_a_matching_receive() {
        let (mut sender, _receiver) = pair();
        sender.buffer_mut().put_u32(5);
        sender.isend(1, 3).unwrap();

        assert!(sender.test());
    }

    #[test]
    fn issend_completes_only_after_the_peer_matches() {
        let (mut sender, mut receiver) = pair();
        sender.buffer_mut().put_u32(5);
        sender.issend(1, 3).unwrap();

        assert!(!sender.test());
        assert!(receiver.probe(None, 3));
        assert!(sender.test());
        assert_eq!(receiver.buffer_mut().get_u32().unwrap(), 5);
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut sender, _receiver) = pair();
        sender.buffer_mut().put_u32(1);
        sender.issend(1, 3).unwrap();

        sender.cancel();
        assert!(sender.test());
        sender.cancel();
        assert!(sender.test());
    }

    #[test]
    fn probe_rewinds_the_cursor_for_unpacking() {
        let (mut sender, mut receiver) = pair();
        sender.buffer_mut().put_u32(11);
        sender.buffer_mut().put_u64(22);
        sender.send(1, 1).unwrap();

        assert!(receiver.probe(None, 1));
        assert_eq!(receiver.buffer_mut().get_u32().unwrap(), 11);
        assert_eq!(receiver.buffer_mut().get_u64().unwrap(), 22);
        assert!(!receiver.probe(None, 1));
    }

    #[test]
    fn bcast_replicates_the_root_buffer() {
        let mut messages: Vec<ChannelMessage> = ChannelNetwork::new(3)
            .into_iter()
            .map(|endpoint| ChannelMessage::new(Rc::new(endpoint)))
            .collect();

        messages[0].buffer_mut().put_u32(99);
        for message in &mut messages {
            message.bcast(0, 17).unwrap();
        }
        for message in &mut messages {
            assert_eq!(message.buffer_mut().get_u32().unwrap(), 99);
        }
    }
}
