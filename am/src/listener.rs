use std::{cell::RefCell, rc::Rc};

use reverb_core::{Buffer, defs::CommunicatorId};

use crate::error::AmError;

// AM LISTENER
// ================================================================================================

/// Shared handle to a listener.
///
/// Listeners are shared between the runtime's listener table and any
/// analysis code that holds them across progress calls; creation hands out
/// the single initial reference, and the listener is destroyed when the last
/// clone drops.
pub type AmListenerRef = Rc<RefCell<dyn AmListener>>;

/// Receive side of the active-message runtime: one listener per active
/// communicator.
pub trait AmListener {
    /// Probes for an incoming message from any source on the transport's
    /// reserved tag. On success the message has been received into the
    /// listener's buffer with the cursor rewound, and the method returns
    /// true.
    fn probe(&mut self) -> Result<bool, AmError>;

    /// Buffer holding the most recently received message.
    fn buffer(&mut self) -> &mut Buffer;

    /// Communicator this listener serves.
    fn comm_id(&self) -> CommunicatorId;
}
