use std::{cell::RefCell, rc::Rc};

use reverb_core::{
    EventRecord, EventType, GlobalDefs, GlobalDefsBuilder, LocalTrace, Timestamp,
    defs::{Callsite, LocationId, Paradigm, Region, RegionId},
    event::{EnterCsEvent, EventKind, MetricSamples},
    preprocess_trace,
};

use crate::{
    CallbackData, CallbackManager, CompoundTask, Direction, ReplayError, ReplayTask, Task,
    TaskError, backward_replay, forward_replay, forward_replay_range,
};

// FIXTURES
// ================================================================================================

fn defs_and_regions() -> (GlobalDefs, Vec<RegionId>) {
    let mut builder = GlobalDefsBuilder::new();
    let mut regions = Vec::new();
    for name in ["main", "work", "io"] {
        let name = builder.add_string(name).unwrap();
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
    let file = builder.add_string("main.c").unwrap();
    builder.add_callsite(Callsite { file, line: 12, callee: regions[1] }).unwrap();
    (builder.build(), regions)
}

/// `[Enter(main)@0, Enter(work)@1, Leave(work)@2, Leave(main)@3]`, already
/// preprocessed.
fn nested_trace() -> (GlobalDefs, LocalTrace) {
    let (mut defs, regions) = defs_and_regions();
    let mut trace = LocalTrace::new(LocationId::from(0));
    trace.append(EventRecord::enter(0.0, regions[0]));
    trace.append(EventRecord::enter(1.0, regions[1]));
    trace.append(EventRecord::leave(2.0, regions[1]));
    trace.append(EventRecord::leave(3.0, regions[0]));
    preprocess_trace(&mut defs, &mut trace).unwrap();
    (defs, trace)
}

#[derive(Default)]
struct Stats {
    enters: usize,
    leaves: usize,
    enter_time: Timestamp,
    duration: Timestamp,
    timestamps: Vec<Timestamp>,
    preprocessed: Vec<usize>,
    postprocessed: Vec<usize>,
}

impl CallbackData for Stats {
    fn preprocess(&mut self, event: &reverb_core::Event<'_>) {
        self.preprocessed.push(event.id());
    }

    fn postprocess(&mut self, event: &reverb_core::Event<'_>) {
        self.postprocessed.push(event.id());
    }
}

// REPLAY SCENARIOS
// ================================================================================================

#[test]
fn matched_bracket_is_counted_once() {
    let (mut defs, regions) = defs_and_regions();
    let mut trace = LocalTrace::new(LocationId::from(0));
    trace.append(EventRecord::enter(0.0, regions[0]));
    trace.append(EventRecord::leave(1.0, regions[0]));
    preprocess_trace(&mut defs, &mut trace).unwrap();

    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_callback(EventType::GroupEnter, |_, _, event, data: &mut Stats| {
        data.enters += 1;
        data.enter_time = event.timestamp();
        Ok(())
    });
    cbmanager.register_callback(EventType::GroupLeave, |_, _, event, data: &mut Stats| {
        data.leaves += 1;
        data.duration += event.timestamp() - data.enter_time;
        Ok(())
    });

    let mut stats = Stats::default();
    forward_replay(&trace, &cbmanager, &mut stats).unwrap();

    assert_eq!(stats.enters, 1);
    assert_eq!(stats.leaves, 1);
    assert_eq!(stats.duration, 1.0);
}

#[test]
fn forward_replay_visits_events_in_trace_order() {
    let (_, trace) = nested_trace();
    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_callback(EventType::GroupAll, |_, _, event, data: &mut Stats| {
        data.timestamps.push(event.timestamp());
        Ok(())
    });

    let mut stats = Stats::default();
    forward_replay(&trace, &cbmanager, &mut stats).unwrap();

    assert_eq!(stats.timestamps, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(stats.preprocessed, vec![0, 1, 2, 3]);
    assert_eq!(stats.postprocessed, vec![0, 1, 2, 3]);
}

#[test]
fn backward_replay_visits_events_in_reverse_order() {
    let (_, trace) = nested_trace();
    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_callback(EventType::GroupAll, |_, _, event, data: &mut Stats| {
        data.timestamps.push(event.timestamp());
        Ok(())
    });

    let mut stats = Stats::default();
    backward_replay(&trace, &cbmanager, &mut stats).unwrap();

    assert_eq!(stats.timestamps, vec![3.0, 2.0, 1.0, 0.0]);
}

#[test]
fn range_replay_covers_only_the_requested_window() {
    let (_, trace) = nested_trace();
    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_callback(EventType::GroupAll, |_, _, event, data: &mut Stats| {
        data.timestamps.push(event.timestamp());
        Ok(())
    });

    let mut stats = Stats::default();
    forward_replay_range(&trace, &cbmanager, &mut stats, 1..3).unwrap();

    assert_eq!(stats.timestamps, vec![1.0, 2.0]);
}

#[test]
fn replayed_events_expose_their_callpaths() {
    let (defs, trace) = nested_trace();
    let cbmanager = CallbackManager::<Vec<u32>>::new();
    cbmanager.register_callback(EventType::GroupAll, |_, _, event, data: &mut Vec<u32>| {
        data.push(event.callpath().map_or(u32::MAX, Into::into));
        Ok(())
    });

    let mut callpaths = Vec::new();
    forward_replay(&trace, &cbmanager, &mut callpaths).unwrap();

    let cp_main = callpaths[0];
    let cp_work = callpaths[1];
    assert_eq!(callpaths, vec![cp_main, cp_work, cp_work, cp_main]);
    assert_eq!(
        defs.callpath(cp_work.into()).unwrap().parent,
        Some(cp_main.into())
    );
}

impl CallbackData for Vec<u32> {}

// DISPATCH SEMANTICS
// ================================================================================================

#[test]
fn dispatch_fans_out_to_all_matching_keys_exactly_once() {
    let (mut defs, regions) = defs_and_regions();
    let mut trace = LocalTrace::new(LocationId::from(0));
    trace.append(EventRecord::new(
        0.0,
        EventKind::EnterCs(EnterCsEvent::new(regions[1], 0u32.into(), MetricSamples::new())),
    ));
    trace.append(EventRecord::leave(1.0, regions[1]));
    preprocess_trace(&mut defs, &mut trace).unwrap();

    let hits = Rc::new(RefCell::new(Vec::new()));
    let cbmanager = CallbackManager::<()>::new();
    for key in [
        EventType::EnterCs,
        EventType::Enter,
        EventType::GroupEnter,
        EventType::GroupAll,
        EventType::GroupLeave,
        EventType::MpiSend,
    ] {
        let hits = Rc::clone(&hits);
        cbmanager.register_callback(key, move |_, _, _, _| {
            hits.borrow_mut().push(key);
            Ok(())
        });
    }

    forward_replay_range(&trace, &cbmanager, &mut (), 0..1).unwrap();

    assert_eq!(
        hits.borrow().as_slice(),
        [
            EventType::Enter,
            EventType::EnterCs,
            EventType::GroupAll,
            EventType::GroupEnter
        ]
    );
}

#[test]
fn registrations_inside_a_callback_take_effect_for_subsequent_events() {
    let (_, trace) = nested_trace();
    let late_hits = Rc::new(RefCell::new(0));
    let cbmanager = CallbackManager::<()>::new();
    {
        let late_hits = Rc::clone(&late_hits);
        let registered = std::cell::Cell::new(false);
        cbmanager.register_callback(EventType::GroupEnter, move |cb, _, _, _| {
            if !registered.replace(true) {
                let late_hits = Rc::clone(&late_hits);
                cb.register_callback(EventType::GroupEnter, move |_, _, _, _| {
                    *late_hits.borrow_mut() += 1;
                    Ok(())
                });
            }
            Ok(())
        });
    }

    forward_replay(&trace, &cbmanager, &mut ()).unwrap();

    // The nested registration happened while dispatching the first enter, so
    // only the second enter can trigger it.
    assert_eq!(*late_hits.borrow(), 1);
}

#[test]
fn user_event_notification_reaches_user_callbacks() {
    const BRACKET_DONE: u32 = 7;

    let (_, trace) = nested_trace();
    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_user_callback(BRACKET_DONE, |_, user_event, _, data: &mut Stats| {
        assert_eq!(user_event, BRACKET_DONE);
        data.leaves += 1;
        Ok(())
    });
    cbmanager.register_callback(EventType::GroupLeave, |cb, _, event, data: &mut Stats| {
        cb.notify(BRACKET_DONE, event, data)
    });

    let mut stats = Stats::default();
    forward_replay(&trace, &cbmanager, &mut stats).unwrap();

    assert_eq!(stats.leaves, 2);
}

#[test]
fn first_callback_error_short_circuits_the_replay() {
    let (_, trace) = nested_trace();
    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_callback(EventType::GroupAll, |_, _, event, data: &mut Stats| {
        data.timestamps.push(event.timestamp());
        if event.is_of_type(EventType::GroupLeave) {
            return Err(ReplayError::runtime("unexpected leave"));
        }
        Ok(())
    });

    let mut stats = Stats::default();
    let result = forward_replay(&trace, &cbmanager, &mut stats);

    assert!(matches!(result, Err(ReplayError::Runtime(_))));
    // Events 0 and 1 dispatched, the failing leave at index 2 was the last.
    assert_eq!(stats.timestamps, vec![0.0, 1.0, 2.0]);
    // The cleanup hook still ran for the failing event.
    assert_eq!(stats.postprocessed, vec![0, 1, 2]);
}

// TASK PIPELINE
// ================================================================================================

struct LoggedTask {
    name: &'static str,
    fail: bool,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Task for LoggedTask {
    fn execute(&mut self) -> Result<(), TaskError> {
        self.log.borrow_mut().push(self.name);
        if self.fail {
            Err(TaskError::failed(self.name))
        } else {
            Ok(())
        }
    }
}

#[test]
fn compound_task_stops_at_the_first_failing_child() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pipeline = CompoundTask::new();
    pipeline.add_task(LoggedTask { name: "t1", fail: false, log: Rc::clone(&log) });
    pipeline.add_task(LoggedTask { name: "t2", fail: true, log: Rc::clone(&log) });
    pipeline.add_task(LoggedTask { name: "t3", fail: false, log: Rc::clone(&log) });
    {
        let log = Rc::clone(&log);
        pipeline.on_finish(move || {
            log.borrow_mut().push("finish");
            Ok(())
        });
    }

    let result = pipeline.execute();

    assert!(matches!(result, Err(TaskError::Failed(_))));
    assert_eq!(log.borrow().as_slice(), ["t1", "t2", "finish"]);
    assert_eq!(pipeline.current_step(), 1);
    assert_eq!(pipeline.num_steps(), 3);
}

#[test]
fn finish_does_not_run_when_prepare_fails() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut pipeline = CompoundTask::new();
    pipeline.add_task(LoggedTask { name: "t1", fail: false, log: Rc::clone(&log) });
    pipeline.on_prepare(|| Err(TaskError::failed("prepare")));
    {
        let log = Rc::clone(&log);
        pipeline.on_finish(move || {
            log.borrow_mut().push("finish");
            Ok(())
        });
    }

    let result = pipeline.execute();

    assert!(result.is_err());
    assert!(log.borrow().is_empty());
}

#[test]
fn nested_compound_tasks_propagate_failure() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut inner = CompoundTask::new();
    inner.add_task(LoggedTask { name: "inner", fail: true, log: Rc::clone(&log) });
    let mut outer = CompoundTask::new();
    outer.add_task(LoggedTask { name: "first", fail: false, log: Rc::clone(&log) });
    outer.add_task(inner);
    outer.add_task(LoggedTask { name: "last", fail: false, log: Rc::clone(&log) });

    assert!(outer.execute().is_err());
    assert_eq!(log.borrow().as_slice(), ["first", "inner"]);
}

#[test]
fn replay_tasks_compose_into_a_pipeline() {
    let (_, trace) = nested_trace();
    let cbmanager = CallbackManager::<Stats>::new();
    cbmanager.register_callback(EventType::GroupEnter, |_, _, _, data: &mut Stats| {
        data.enters += 1;
        Ok(())
    });

    let mut forward_stats = Stats::default();
    let mut backward_stats = Stats::default();
    let mut pipeline = CompoundTask::new();
    pipeline.add_task(ReplayTask::new(
        &trace,
        &cbmanager,
        &mut forward_stats,
        Direction::Forward,
    ));
    pipeline.add_task(ReplayTask::new(
        &trace,
        &cbmanager,
        &mut backward_stats,
        Direction::Backward,
    ));

    pipeline.execute().unwrap();
    drop(pipeline);

    assert_eq!(forward_stats.enters, 2);
    assert_eq!(backward_stats.enters, 2);
}
