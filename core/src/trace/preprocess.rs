//! Calltree verification and trace preprocessing.
//!
//! These two passes run once per trace, between loading and the first replay.
//! They are the only code with mutable access to loaded records and the
//! calltree: verification checks the enter/leave structure, preprocessing
//! rewrites region references into callpaths and doubly-links the
//! non-blocking request chains.

use std::collections::HashMap;

use thiserror::Error;

use crate::{
    EventType, RequestId, Timestamp,
    defs::{CallpathId, DefinitionError, GlobalDefs, RegionId},
    event::CallContext,
    trace::LocalTrace,
};

// CALLTREE ERROR
// ================================================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalltreeError {
    #[error("leave event at {timestamp}s has no matching enter")]
    UnexpectedLeave { index: usize, timestamp: Timestamp },
    #[error("leave event at {timestamp}s closes region {found} while region {expected} is open")]
    MismatchedLeave {
        index: usize,
        timestamp: Timestamp,
        expected: RegionId,
        found: RegionId,
    },
    #[error("{open} region(s) left open at end of trace")]
    UnbalancedEnter { open: usize },
    #[error("program enter event must precede all other events (found at index {index})")]
    MisplacedProgramEnter { index: usize },
    #[error("program leave event must follow all other events (found at index {index})")]
    MisplacedProgramLeave { index: usize },
    #[error("enter/leave event at index {index} carries no region reference")]
    MissingRegion { index: usize },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

// CALLTREE VERIFICATION
// ================================================================================================

/// Checks the enter/leave structure of a trace.
///
/// Every leave must close the most recently opened region of the same
/// location, program begin/end must bracket all other events, and the region
/// stack must be empty at the end of the trace.
pub fn verify_calltree(defs: &GlobalDefs, trace: &LocalTrace) -> Result<(), CalltreeError> {
    let mut stack: Vec<RegionId> = Vec::new();

    for (index, record) in trace.records().enumerate() {
        if record.is_of_type(EventType::GroupEnter) {
            if record.event_type() == EventType::EnterProgram && index != 0 {
                return Err(CalltreeError::MisplacedProgramEnter { index });
            }
            let region = record.region().ok_or(CalltreeError::MissingRegion { index })?;
            defs.region(region)?;
            stack.push(region);
        } else if record.is_of_type(EventType::GroupLeave) {
            if record.event_type() == EventType::LeaveProgram && index + 1 != trace.len() {
                return Err(CalltreeError::MisplacedProgramLeave { index });
            }
            let region = record.region().ok_or(CalltreeError::MissingRegion { index })?;
            defs.region(region)?;
            let open = stack.pop().ok_or(CalltreeError::UnexpectedLeave {
                index,
                timestamp: record.timestamp(),
            })?;
            if open != region {
                return Err(CalltreeError::MismatchedLeave {
                    index,
                    timestamp: record.timestamp(),
                    expected: open,
                    found: region,
                });
            }
        }
    }

    if !stack.is_empty() {
        return Err(CalltreeError::UnbalancedEnter { open: stack.len() });
    }
    Ok(())
}

// TRACE PREPROCESSING
// ================================================================================================

/// Rewrites a verified trace for replay.
///
/// Walks the enter/leave stream with a call stack, replaces each raw region
/// reference with the callpath reached in the global calltree (creating
/// calltree nodes on demand), and doubly-links the events of every
/// non-blocking request chain by relative offset.
#[tracing::instrument(skip_all, fields(location = %trace.location()))]
pub fn preprocess_trace(
    defs: &mut GlobalDefs,
    trace: &mut LocalTrace,
) -> Result<(), CalltreeError> {
    let mut stack: Vec<CallpathId> = Vec::new();
    let mut open_chains: HashMap<RequestId, usize> = HashMap::new();

    for index in 0..trace.len() {
        let record = match trace.record(index) {
            Some(record) => record,
            None => break,
        };

        if record.is_of_type(EventType::GroupEnter) {
            let region = record.region().ok_or(CalltreeError::MissingRegion { index })?;
            let callsite = record.callsite();
            let callpath = defs.callpath_for(stack.last().copied(), region, callsite)?;
            stack.push(callpath);
            if let Some(record) = trace.record_mut(index) {
                record.set_call_context(CallContext::Callpath(callpath));
            }
        } else if record.is_of_type(EventType::GroupLeave) {
            let region = record.region().ok_or(CalltreeError::MissingRegion { index })?;
            let timestamp = record.timestamp();
            let callpath = stack
                .pop()
                .ok_or(CalltreeError::UnexpectedLeave { index, timestamp })?;
            let open_region = defs.callpath(callpath)?.region;
            if open_region != region {
                return Err(CalltreeError::MismatchedLeave {
                    index,
                    timestamp,
                    expected: open_region,
                    found: region,
                });
            }
            if let Some(record) = trace.record_mut(index) {
                record.set_call_context(CallContext::Callpath(callpath));
            }
        } else if let Some(request_id) = record.request_id() {
            match record.event_type() {
                EventType::MpiSendRequest | EventType::MpiRecvRequest => {
                    open_chains.insert(request_id, index);
                },
                EventType::MpiRequestTested => {
                    if let Some(prev) = open_chains.insert(request_id, index) {
                        link_chain(trace, prev, index);
                    }
                },
                EventType::MpiSendComplete
                | EventType::MpiRecvComplete
                | EventType::MpiCancelled => {
                    if let Some(prev) = open_chains.remove(&request_id) {
                        link_chain(trace, prev, index);
                    }
                },
                _ => {},
            }
        }
    }

    if !stack.is_empty() {
        return Err(CalltreeError::UnbalancedEnter { open: stack.len() });
    }

    tracing::debug!(
        events = trace.len(),
        callpaths = defs.num_callpaths(),
        "trace preprocessed"
    );
    Ok(())
}

fn link_chain(trace: &mut LocalTrace, prev: usize, next: usize) {
    let offset = next - prev;
    trace.set_next_reqoffs(prev, offset);
    trace.set_prev_reqoffs(next, offset);
}

// TESTS
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EventRecord, EventType,
        defs::{GlobalDefsBuilder, LocationId, Paradigm, Region},
        event::{
            EventKind, MpiRequestTestedEvent, MpiSendCompleteEvent, MpiSendEvent,
            MpiSendRequestEvent,
        },
    };

    fn defs_with_regions(names: &[&str]) -> (GlobalDefs, Vec<RegionId>) {
        let mut builder = GlobalDefsBuilder::new();
        let mut regions = Vec::new();
        for name in names {
            let name = builder.add_string(*name).unwrap();
            regions.push(
                builder
                    .add_region(Region {
                        name,
                        paradigm: Paradigm::User,
                        file: None,
                        begin_line: None,
                        end_line: None,
                    })
                    .unwrap(),
            );
        }
        (builder.build(), regions)
    }

    fn send_request(timestamp: f64, request_id: u64) -> EventRecord {
        EventRecord::new(
            timestamp,
            EventKind::MpiSendRequest(MpiSendRequestEvent {
                base: MpiSendEvent {
                    comm: crate::defs::CommunicatorId::from(0),
                    destination: 1,
                    tag: 0,
                    bytes_sent: 64,
                },
                request_id,
            }),
        )
    }

    #[test]
    fn nested_enters_resolve_to_parent_child_callpaths() {
        let (mut defs, regions) = defs_with_regions(&["main", "work"]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(EventRecord::enter(0.0, regions[0]));
        trace.append(EventRecord::enter(1.0, regions[1]));
        trace.append(EventRecord::leave(2.0, regions[1]));
        trace.append(EventRecord::leave(3.0, regions[0]));

        verify_calltree(&defs, &trace).unwrap();
        preprocess_trace(&mut defs, &mut trace).unwrap();

        let cp_main = trace.record(0).unwrap().callpath().unwrap();
        let cp_work = trace.record(1).unwrap().callpath().unwrap();
        assert_ne!(cp_main, cp_work);
        assert_eq!(defs.callpath(cp_work).unwrap().parent, Some(cp_main));
        assert_eq!(trace.record(2).unwrap().callpath(), Some(cp_work));
        assert_eq!(trace.record(3).unwrap().callpath(), Some(cp_main));
    }

    #[test]
    fn repeated_context_reuses_the_same_callpath() {
        let (mut defs, regions) = defs_with_regions(&["main"]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        for i in 0..3 {
            trace.append(EventRecord::enter(i as f64, regions[0]));
            trace.append(EventRecord::leave(i as f64 + 0.5, regions[0]));
        }

        preprocess_trace(&mut defs, &mut trace).unwrap();

        let first = trace.record(0).unwrap().callpath().unwrap();
        for index in 0..trace.len() {
            assert_eq!(trace.record(index).unwrap().callpath(), Some(first));
        }
        assert_eq!(defs.num_callpaths(), 1);
    }

    #[test]
    fn mismatched_leave_fails_verification() {
        let (defs, regions) = defs_with_regions(&["main", "work"]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(EventRecord::enter(0.0, regions[0]));
        trace.append(EventRecord::leave(1.0, regions[1]));

        assert!(matches!(
            verify_calltree(&defs, &trace),
            Err(CalltreeError::MismatchedLeave { index: 1, .. })
        ));
    }

    #[test]
    fn unbalanced_enter_fails_verification() {
        let (defs, regions) = defs_with_regions(&["main"]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(EventRecord::enter(0.0, regions[0]));

        assert_eq!(
            verify_calltree(&defs, &trace),
            Err(CalltreeError::UnbalancedEnter { open: 1 })
        );
    }

    #[test]
    fn leave_without_enter_fails_verification() {
        let (defs, regions) = defs_with_regions(&["main"]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(EventRecord::leave(1.0, regions[0]));

        assert!(matches!(
            verify_calltree(&defs, &trace),
            Err(CalltreeError::UnexpectedLeave { index: 0, .. })
        ));
    }

    #[test]
    fn request_chain_is_doubly_linked() {
        let (mut defs, regions) = defs_with_regions(&["main"]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(EventRecord::enter(0.0, regions[0]));
        trace.append(send_request(1.0, 7));
        trace.append(EventRecord::new(
            2.0,
            EventKind::MpiSendComplete(MpiSendCompleteEvent { request_id: 7 }),
        ));
        trace.append(EventRecord::leave(3.0, regions[0]));

        preprocess_trace(&mut defs, &mut trace).unwrap();

        let complete = trace.event(2).unwrap();
        let request = complete.prev_request_event().unwrap();
        assert_eq!(request.event_type(), EventType::MpiSendRequest);
        assert_eq!(request.record().request_id(), Some(7));
        assert_eq!(request.next_request_event().unwrap(), complete);
    }

    #[test]
    fn tested_requests_chain_through_to_completion() {
        let (mut defs, _) = defs_with_regions(&[]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(send_request(0.0, 42));
        trace.append(EventRecord::new(
            1.0,
            EventKind::MpiRequestTested(MpiRequestTestedEvent { request_id: 42 }),
        ));
        trace.append(EventRecord::new(
            2.0,
            EventKind::MpiRequestTested(MpiRequestTestedEvent { request_id: 42 }),
        ));
        trace.append(EventRecord::new(
            3.0,
            EventKind::MpiSendComplete(MpiSendCompleteEvent { request_id: 42 }),
        ));

        preprocess_trace(&mut defs, &mut trace).unwrap();

        let complete = trace.event(3).unwrap();
        // One hop lands on the last unsuccessful test.
        assert_eq!(
            complete.prev_request_event().unwrap().event_type(),
            EventType::MpiRequestTested
        );
        // Walking the chain lands on the originating request, and forward
        // again on the completion.
        let request = complete.request().unwrap();
        assert_eq!(request.event_type(), EventType::MpiSendRequest);
        assert_eq!(request.completion().unwrap(), complete);
    }

    #[test]
    fn distinct_requests_do_not_interfere() {
        let (mut defs, _) = defs_with_regions(&[]);
        let mut trace = LocalTrace::new(LocationId::from(0));
        trace.append(send_request(0.0, 1));
        trace.append(send_request(1.0, 2));
        trace.append(EventRecord::new(
            2.0,
            EventKind::MpiSendComplete(MpiSendCompleteEvent { request_id: 2 }),
        ));
        trace.append(EventRecord::new(
            3.0,
            EventKind::MpiSendComplete(MpiSendCompleteEvent { request_id: 1 }),
        ));

        preprocess_trace(&mut defs, &mut trace).unwrap();

        let first = trace.event(3).unwrap().prev_request_event().unwrap();
        let second = trace.event(2).unwrap().prev_request_event().unwrap();
        assert_eq!(first.id(), 0);
        assert_eq!(second.id(), 1);
    }
}
