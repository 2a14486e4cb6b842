//! Forward and backward replay drivers.
//!
//! A replay walks the trace and, for each event, runs the data hooks around
//! the callback dispatch:
//!
//! 1. `data.preprocess(event)`
//! 2. callback dispatch per the manager's registry
//! 3. `data.postprocess(event)`
//!
//! Callbacks for the event at one position complete before the cursor moves
//! to the next position, and replays never mutate the trace. The first
//! callback error aborts the walk and is handed back to the caller;
//! `postprocess` still runs for the failing event.

use std::ops::Range;

use reverb_core::LocalTrace;

use crate::callback::{CallbackData, CallbackManager, ReplayError};

// REPLAY ENTRY POINTS
// ================================================================================================

/// Replays the whole trace in forward (trace) order.
pub fn forward_replay<D: CallbackData>(
    trace: &LocalTrace,
    cbmanager: &CallbackManager<D>,
    data: &mut D,
) -> Result<(), ReplayError> {
    forward_replay_range(trace, cbmanager, data, 0..trace.len())
}

/// Replays the events at positions `range` in forward order.
#[tracing::instrument(skip_all, fields(location = %trace.location(), events = trace.len()))]
pub fn forward_replay_range<D: CallbackData>(
    trace: &LocalTrace,
    cbmanager: &CallbackManager<D>,
    data: &mut D,
    range: Range<usize>,
) -> Result<(), ReplayError> {
    for index in range {
        step(trace, cbmanager, data, index)?;
    }
    Ok(())
}

/// Replays the whole trace in backward (reverse trace) order.
pub fn backward_replay<D: CallbackData>(
    trace: &LocalTrace,
    cbmanager: &CallbackManager<D>,
    data: &mut D,
) -> Result<(), ReplayError> {
    backward_replay_range(trace, cbmanager, data, 0..trace.len())
}

/// Replays the events at positions `range` in backward order.
#[tracing::instrument(skip_all, fields(location = %trace.location(), events = trace.len()))]
pub fn backward_replay_range<D: CallbackData>(
    trace: &LocalTrace,
    cbmanager: &CallbackManager<D>,
    data: &mut D,
    range: Range<usize>,
) -> Result<(), ReplayError> {
    for index in range.rev() {
        step(trace, cbmanager, data, index)?;
    }
    Ok(())
}

fn step<D: CallbackData>(
    trace: &LocalTrace,
    cbmanager: &CallbackManager<D>,
    data: &mut D,
    index: usize,
) -> Result<(), ReplayError> {
    let event = match trace.event(index) {
        Some(event) => event,
        None => return Ok(()),
    };
    data.preprocess(&event);
    let result = cbmanager.dispatch(&event, data);
    data.postprocess(&event);
    result
}
