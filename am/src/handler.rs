use reverb_core::Buffer;

use crate::error::AmError;

/// Id reported for handlers that were never registered with a runtime.
pub const UNREGISTERED: u32 = u32::MAX;

// AM HANDLER
// ================================================================================================

/// Target-side behaviour of an active message.
///
/// A handler is registered once per process with the local
/// [`AmRuntime`](crate::AmRuntime), which assigns it a dense id. Incoming
/// messages name the handler by that id; `execute` then consumes the
/// handler-defined payload from the message buffer.
///
/// Handlers that mutate analysis state capture it with shared ownership —
/// the runtime only ever invokes them through a shared reference.
pub trait AmHandler {
    /// Decodes the payload and performs the handler's work.
    ///
    /// The buffer cursor is positioned right after the handler id. Failing
    /// with a decode error aborts this handler invocation only; the
    /// listener that received the message stays usable.
    fn execute(&self, buffer: &mut Buffer) -> Result<(), AmError>;

    /// Handler name used in diagnostics.
    fn name(&self) -> &str;
}
