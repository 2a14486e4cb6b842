//! Communicator definitions bound to channel endpoints.

use std::{any::Any, rc::Rc};

use reverb_am::AmComm;
use reverb_core::defs::{CommunicatorId, Paradigm};

use crate::{message::ChannelMessage, network::ChannelEndpoint};

// CHANNEL COMM
// ================================================================================================

/// A communicator definition bound to a live channel endpoint.
///
/// Several communicators can share one endpoint; each one salts its message
/// tags with its definition id, so traffic on different communicators never
/// matches. This is also how [`ChannelComm::duplicate`] isolates a duplicate
/// from its original: same endpoint, different definition, different salt.
pub struct ChannelComm {
    def: CommunicatorId,
    paradigm: Paradigm,
    endpoint: Rc<ChannelEndpoint>,
    tag_salt: u32,
}

impl ChannelComm {
    pub fn new(def: CommunicatorId, paradigm: Paradigm, endpoint: Rc<ChannelEndpoint>) -> Self {
        let tag_salt = u32::from(def).wrapping_mul(0x9e37_79b9);
        Self { def, paradigm, endpoint, tag_salt }
    }

    /// The duplicate-communicator operation: a communicator over the same
    /// endpoint whose traffic cannot match the original's. The caller
    /// supplies the definition the duplicate corresponds to.
    pub fn duplicate(&self, def: CommunicatorId) -> ChannelComm {
        ChannelComm::new(def, self.paradigm, Rc::clone(&self.endpoint))
    }

    pub fn endpoint(&self) -> &Rc<ChannelEndpoint> {
        &self.endpoint
    }

    /// Maps a communicator-local tag onto the shared endpoint's tag space.
    pub fn salted_tag(&self, tag: u32) -> u32 {
        tag ^ self.tag_salt
    }

    /// A fresh message bound to this communicator's endpoint.
    pub fn message(&self) -> ChannelMessage {
        ChannelMessage::new(Rc::clone(&self.endpoint))
    }
}

impl AmComm for ChannelComm {
    fn id(&self) -> CommunicatorId {
        self.def
    }

    fn paradigm(&self) -> Paradigm {
        self.paradigm
    }

    fn size(&self) -> u32 {
        self.endpoint.size()
    }

    fn local_rank(&self) -> u32 {
        self.endpoint.rank()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// TESTS
// ================================================================================================
