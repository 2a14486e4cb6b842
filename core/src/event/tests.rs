use proptest::prelude::*;
use smallvec::smallvec;

use super::*;
use crate::defs::{
    Callsite, CommSet, Communicator, GlobalDefsBuilder, Location, LocationKind, Membership,
    Metric, Region, RmaWindow,
};

// FIXTURES
// ================================================================================================

/// A small catalogue covering every definition kind referenced by the event
/// variants below: two regions, one callsite, a world communicator, one RMA
/// window, and two locations.
fn test_defs() -> GlobalDefs {
    let mut builder = GlobalDefsBuilder::new();
    let s_main = builder.add_string("main").unwrap();
    let s_work = builder.add_string("work").unwrap();
    let s_file = builder.add_string("main.c").unwrap();
    let s_world = builder.add_string("world").unwrap();
    let s_prog = builder.add_string("./a.out").unwrap();

    for rank in 0..2 {
        builder
            .add_location(Location {
                name: s_prog,
                kind: LocationKind::CpuThread,
                parent: None,
                rank,
            })
            .unwrap();
    }
    builder
        .add_region(Region {
            name: s_main,
            paradigm: Paradigm::User,
            file: Some(s_file),
            begin_line: Some(10),
            end_line: Some(90),
        })
        .unwrap();
    let work = builder
        .add_region(Region {
            name: s_work,
            paradigm: Paradigm::User,
            file: Some(s_file),
            begin_line: None,
            end_line: None,
        })
        .unwrap();
    builder.add_callsite(Callsite { file: s_file, line: 42, callee: work }).unwrap();
    let set = builder
        .add_comm_set(CommSet {
            name: s_world,
            paradigm: Paradigm::Mpi,
            membership: Membership::World,
        })
        .unwrap();
    let comm = builder
        .add_communicator(Communicator {
            name: s_world,
            paradigm: Paradigm::Mpi,
            comm_set: set,
            parent: None,
        })
        .unwrap();
    builder.add_rma_window(RmaWindow { comm }).unwrap();
    builder.add_metric(Metric { name: s_main, description: s_work }).unwrap();
    builder.build()
}

/// Builds one record of the given concrete type, deriving scalar payload
/// fields from the seeds so the property test exercises varied values.
fn sample_record(ty: EventType, seed: u64, small: u32, timestamp: f64) -> EventRecord {
    use crate::defs::{
        CallsiteId, CommSetId, CommunicatorId, LocationId, RegionId, RmaWindowId, StringId,
    };

    let region = RegionId::from(small % 2);
    let callsite = CallsiteId::from(0);
    let comm = CommunicatorId::from(0);
    let set = CommSetId::from(0);
    let window = RmaWindowId::from(0);
    let location = LocationId::from(small % 2);

    let kind = match ty {
        EventType::Enter => EventKind::Enter(EnterEvent::new(region, smallvec![seed, seed ^ 1])),
        EventType::EnterCs => {
            EventKind::EnterCs(EnterCsEvent::new(region, callsite, MetricSamples::new()))
        },
        EventType::EnterProgram => EventKind::EnterProgram(EnterProgramEvent::new(
            region,
            StringId::from(4),
            vec![StringId::from(0), StringId::from(1)],
            smallvec![seed],
        )),
        EventType::Leave => EventKind::Leave(LeaveEvent::new(region)),
        EventType::LeaveProgram => {
            EventKind::LeaveProgram(LeaveProgramEvent::new(region, Some(seed as i64)))
        },
        EventType::MpiCollBegin => EventKind::MpiCollBegin(MpiCollBeginEvent),
        EventType::MpiCollEnd => EventKind::MpiCollEnd(MpiCollEndEvent {
            coll_type: CollType::Allreduce,
            comm,
            root: (small % 2 == 0).then_some(small % 7),
            bytes_sent: seed,
            bytes_received: seed / 2,
        }),
        EventType::MpiSend => EventKind::MpiSend(MpiSendEvent {
            comm,
            destination: small % 7,
            tag: small,
            bytes_sent: seed,
        }),
        EventType::MpiSendRequest => EventKind::MpiSendRequest(MpiSendRequestEvent {
            base: MpiSendEvent {
                comm,
                destination: small % 7,
                tag: small,
                bytes_sent: seed,
            },
            request_id: seed,
        }),
        EventType::MpiSendComplete => {
            EventKind::MpiSendComplete(MpiSendCompleteEvent { request_id: seed })
        },
        EventType::MpiRecv => EventKind::MpiRecv(MpiRecvEvent {
            comm,
            source: small % 7,
            tag: small,
            bytes_received: seed,
        }),
        EventType::MpiRecvRequest => {
            EventKind::MpiRecvRequest(MpiRecvRequestEvent { request_id: seed })
        },
        EventType::MpiRecvComplete => EventKind::MpiRecvComplete(MpiRecvCompleteEvent {
            base: MpiRecvEvent {
                comm,
                source: small % 7,
                tag: small,
                bytes_received: seed,
            },
            request_id: seed,
        }),
        EventType::MpiRequestTested => {
            EventKind::MpiRequestTested(MpiRequestTestedEvent { request_id: seed })
        },
        EventType::MpiCancelled => EventKind::MpiCancelled(MpiCancelledEvent { request_id: seed }),
        EventType::ThreadAcquireLock => EventKind::ThreadAcquireLock(ThreadAcquireLockEvent {
            lock_id: small,
            acquisition_order: small / 2,
            paradigm: Paradigm::OpenMp,
        }),
        EventType::ThreadReleaseLock => EventKind::ThreadReleaseLock(ThreadReleaseLockEvent {
            lock_id: small,
            acquisition_order: small / 2,
            paradigm: Paradigm::OpenMp,
        }),
        EventType::ThreadTaskCreate => {
            EventKind::ThreadTaskCreate(ThreadTaskCreateEvent { team: set, task_id: seed })
        },
        EventType::ThreadTaskComplete => {
            EventKind::ThreadTaskComplete(ThreadTaskCompleteEvent { team: set, task_id: seed })
        },
        EventType::ThreadTaskSwitch => {
            EventKind::ThreadTaskSwitch(ThreadTaskSwitchEvent { team: set, task_id: seed })
        },
        EventType::ThreadBegin => {
            EventKind::ThreadBegin(ThreadBeginEvent { contingent: set, sequence: seed })
        },
        EventType::ThreadEnd => {
            EventKind::ThreadEnd(ThreadEndEvent { contingent: set, sequence: seed })
        },
        EventType::ThreadCreate => {
            EventKind::ThreadCreate(ThreadCreateEvent { contingent: set, sequence: seed })
        },
        EventType::ThreadWait => {
            EventKind::ThreadWait(ThreadWaitEvent { contingent: set, sequence: seed })
        },
        EventType::ThreadFork => EventKind::ThreadFork(ThreadForkEvent {
            team_size: small.max(1),
            paradigm: Paradigm::OpenMp,
        }),
        EventType::ThreadJoin => {
            EventKind::ThreadJoin(ThreadJoinEvent { paradigm: Paradigm::OpenMp })
        },
        EventType::ThreadTeamBegin => {
            EventKind::ThreadTeamBegin(ThreadTeamBeginEvent { team: set })
        },
        EventType::ThreadTeamEnd => EventKind::ThreadTeamEnd(ThreadTeamEndEvent { team: set }),
        EventType::RmaPutStart => EventKind::RmaPutStart(RmaPutStartEvent {
            rma_id: small,
            remote: small % 7,
            bytes_sent: seed,
        }),
        EventType::RmaPutEnd => EventKind::RmaPutEnd(RmaPutEndEvent { rma_id: small }),
        EventType::RmaGetStart => EventKind::RmaGetStart(RmaGetStartEvent {
            rma_id: small,
            remote: small % 7,
            bytes_received: seed,
        }),
        EventType::RmaGetEnd => EventKind::RmaGetEnd(RmaGetEndEvent { rma_id: small }),
        EventType::MpiRmaPutStart => EventKind::MpiRmaPutStart(MpiRmaPutStartEvent {
            base: RmaPutStartEvent {
                rma_id: small,
                remote: small % 7,
                bytes_sent: seed,
            },
            window,
        }),
        EventType::MpiRmaPutEnd => {
            EventKind::MpiRmaPutEnd(MpiRmaPutEndEvent { base: RmaPutEndEvent { rma_id: small } })
        },
        EventType::MpiRmaGetStart => EventKind::MpiRmaGetStart(MpiRmaGetStartEvent {
            base: RmaGetStartEvent {
                rma_id: small,
                remote: small % 7,
                bytes_received: seed,
            },
            window,
        }),
        EventType::MpiRmaGetEnd => {
            EventKind::MpiRmaGetEnd(MpiRmaGetEndEvent { base: RmaGetEndEvent { rma_id: small } })
        },
        EventType::MpiRmaGats => EventKind::MpiRmaGats(MpiRmaGatsEvent {
            window,
            group: set,
            sync: small % 2 == 0,
        }),
        EventType::MpiRmaCollBegin => EventKind::MpiRmaCollBegin(MpiRmaCollBeginEvent),
        EventType::MpiRmaCollEnd => EventKind::MpiRmaCollEnd(MpiRmaCollEndEvent { window }),
        EventType::MpiRmaLock => EventKind::MpiRmaLock(MpiRmaLockEvent {
            window,
            location,
            exclusive: small % 2 == 0,
        }),
        EventType::MpiRmaUnlock => EventKind::MpiRmaUnlock(MpiRmaUnlockEvent { window, location }),
        _ => unreachable!("sample_record is only called with concrete types"),
    };
    EventRecord::new(timestamp, kind)
}

// ROUND-TRIP
// ================================================================================================

#[test]
fn every_variant_survives_a_pack_unpack_round_trip() {
    let defs = test_defs();
    for (idx, ty) in EventType::CONCRETE.into_iter().enumerate() {
        let record = sample_record(ty, 0xdead_beef ^ idx as u64, idx as u32, idx as f64 * 0.5);
        let mut buffer = Buffer::new();
        record.pack(&mut buffer);

        let decoded = EventRecord::unpack(&defs, &mut buffer).unwrap();
        assert_eq!(record, decoded, "{ty} did not round-trip");
        assert_eq!(buffer.remaining(), 0, "{ty} left trailing bytes");
    }
}

proptest! {
    #[test]
    fn pack_unpack_round_trip(
        type_idx in 0usize..EventType::CONCRETE.len(),
        seed in any::<u64>(),
        small in any::<u32>(),
        timestamp in 0.0f64..1.0e9,
    ) {
        let defs = test_defs();
        let record = sample_record(EventType::CONCRETE[type_idx], seed, small, timestamp);
        let mut buffer = Buffer::new();
        record.pack(&mut buffer);

        let decoded = EventRecord::unpack(&defs, &mut buffer).unwrap();
        prop_assert_eq!(record, decoded);
    }
}

// TYPE PREDICATES
// ================================================================================================

#[test]
fn group_predicates_match_their_member_sets() {
    for ty in EventType::CONCRETE {
        let record = sample_record(ty, 1, 1, 0.0);
        for group in EventType::GROUPS {
            assert_eq!(
                record.is_of_type(group),
                group.members().contains(&ty),
                "{ty} vs {group}"
            );
        }
    }
}

#[test]
fn derived_variants_answer_for_their_base_types() {
    assert!(sample_record(EventType::EnterCs, 1, 1, 0.0).is_of_type(EventType::Enter));
    assert!(sample_record(EventType::EnterProgram, 1, 1, 0.0).is_of_type(EventType::Enter));
    assert!(sample_record(EventType::LeaveProgram, 1, 1, 0.0).is_of_type(EventType::Leave));
    assert!(sample_record(EventType::MpiSendRequest, 1, 1, 0.0).is_of_type(EventType::MpiSend));
    assert!(sample_record(EventType::MpiRecvComplete, 1, 1, 0.0).is_of_type(EventType::MpiRecv));
    assert!(sample_record(EventType::MpiRmaPutEnd, 1, 1, 0.0).is_of_type(EventType::RmaPutEnd));
    assert!(sample_record(EventType::MpiRmaGetStart, 1, 1, 0.0).is_of_type(EventType::RmaGetStart));

    // The reverse direction must not hold.
    assert!(!sample_record(EventType::Enter, 1, 1, 0.0).is_of_type(EventType::EnterCs));
    assert!(!sample_record(EventType::MpiSend, 1, 1, 0.0).is_of_type(EventType::MpiSendRequest));
    // Completions without message payload are not send/recv events.
    assert!(!sample_record(EventType::MpiSendComplete, 1, 1, 0.0).is_of_type(EventType::GroupSend));
    assert!(sample_record(EventType::MpiRecvComplete, 1, 1, 0.0).is_of_type(EventType::GroupRecv));
}

// DECODE FAILURES
// ================================================================================================

#[test]
fn unknown_type_tag_is_rejected() {
    let defs = test_defs();
    let mut buffer = Buffer::new();
    buffer.put_u8(0xf0);
    buffer.put_timestamp(1.0);

    assert_eq!(
        EventRecord::unpack(&defs, &mut buffer),
        Err(FormatError::InvalidEventTag(0xf0))
    );
}

#[test]
fn group_tag_is_rejected_on_the_wire() {
    let defs = test_defs();
    let mut buffer = Buffer::new();
    buffer.put_u8(EventType::GroupEnter as u8);
    buffer.put_timestamp(1.0);

    assert_eq!(
        EventRecord::unpack(&defs, &mut buffer),
        Err(FormatError::InvalidEventTag(EventType::GroupEnter as u8))
    );
}

#[test]
fn truncated_record_is_rejected() {
    let defs = test_defs();
    let record = sample_record(EventType::MpiSend, 7, 7, 1.0);
    let mut buffer = Buffer::new();
    record.pack(&mut buffer);
    let bytes = buffer.into_bytes();
    let mut truncated = Buffer::from_bytes(bytes[..bytes.len() - 3].to_vec());

    assert!(matches!(
        EventRecord::unpack(&defs, &mut truncated),
        Err(FormatError::Buffer(BufferError::EndOfBuffer { .. }))
    ));
}

#[test]
fn dangling_reference_is_rejected() {
    let defs = test_defs();
    let mut buffer = Buffer::new();
    buffer.put_u8(EventType::MpiSend as u8);
    buffer.put_timestamp(1.0);
    buffer.put_u32(99); // communicator id out of range
    buffer.put_u32(0);
    buffer.put_u32(0);
    buffer.put_u64(0);

    assert!(matches!(
        EventRecord::unpack(&defs, &mut buffer),
        Err(FormatError::Definition(DefinitionError::UnknownDefinition { .. }))
    ));
}

#[test]
fn callpath_context_round_trips_after_rewrite() {
    let mut builder = GlobalDefsBuilder::new();
    let name = builder.add_string("main").unwrap();
    let region = builder
        .add_region(Region {
            name,
            paradigm: Paradigm::User,
            file: None,
            begin_line: None,
            end_line: None,
        })
        .unwrap();
    let callpath = builder.add_callpath(region, None, None).unwrap();
    let defs = builder.build();

    let mut record = EventRecord::enter(0.5, region);
    record.set_call_context(CallContext::Callpath(callpath));
    let mut buffer = Buffer::new();
    record.pack(&mut buffer);

    let decoded = EventRecord::unpack(&defs, &mut buffer).unwrap();
    assert_eq!(decoded.callpath(), Some(callpath));
    assert_eq!(decoded.region(), None);
}

#[test]
fn display_resolves_names() {
    let defs = test_defs();
    let record = sample_record(EventType::Enter, 1, 0, 0.25);

    let rendered = record.display(&defs).to_string();
    assert!(rendered.starts_with("ENTER @ 0.250000s"), "{rendered}");
    assert!(rendered.contains("region=main"), "{rendered}");
}
