//! Active-message runtime of the Reverb replay engine.
//!
//! Replay-based analyses use active messages to push work to the location
//! that owns the data: a message is a dense handler id followed by a
//! handler-defined payload, and receipt immediately executes the named
//! handler against the receiver's state. This crate provides the
//! paradigm-independent machinery — the handler registry, the request and
//! listener abstractions with their factories, and the per-location
//! [`AmRuntime`] progress engine. Concrete transports live in their own
//! crates and plug in through the factories.

mod comm;
mod error;
mod factory;
mod handler;
mod listener;
mod request;
mod runtime;


// RE-EXPORTS
// ================================================================================================

pub use comm::AmComm;
pub use error::AmError;
pub use factory::{AmListenerFactory, AmRequestFactory};
pub use handler::{AmHandler, UNREGISTERED};
pub use listener::{AmListener, AmListenerRef};
pub use request::{AmRequest, RequestState, is_finished};
pub use runtime::AmRuntime;
