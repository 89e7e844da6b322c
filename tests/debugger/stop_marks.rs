use crate::common::{env, record_events, MockRunner};
use ide_debugger::debugger::buffer::CURRENT_BREAKPOINT_TAG;
use ide_debugger::debugger::{Breakpoint, DebugManager, StopReason};
use std::future::Future;
use std::path::Path;

const MAIN_C: &str = "/src/app/main.c";

/// Let the stop marker make progress.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_stop_mark_on_open_buffer() {
    let env = env();
    let buffer = env.buffers.open(MAIN_C);
    let events = record_events(&env.manager);
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    let debugger = env.manager.debugger().unwrap();

    struct TestCase {
        line: u32,
        expected: u32,
    }
    let test_cases = [
        TestCase {
            line: 5,
            expected: 4,
        },
        TestCase {
            line: 1,
            expected: 0,
        },
        TestCase {
            line: 0,
            expected: 0,
        },
    ];
    for tc in test_cases {
        debugger.emit_stopped(
            StopReason::BreakpointHit,
            Some(Breakpoint::at_line(MAIN_C, tc.line)),
        );
        assert_eq!(buffer.tag_line(CURRENT_BREAKPOINT_TAG), Some(tc.expected));

        debugger.emit_running();
        assert_eq!(buffer.tag_line(CURRENT_BREAKPOINT_TAG), None);
    }

    assert_eq!(
        events
            .borrow()
            .iter()
            .filter(|e| **e == "breakpoint-reached")
            .count(),
        3
    );
    assert_eq!(env.buffers.loads.get(), 0);
}

#[test]
fn test_exit_does_not_mark() {
    let env = env();
    let buffer = env.buffers.open(MAIN_C);
    let events = record_events(&env.manager);
    env.manager.start(MockRunner::new(Some("c"))).unwrap();

    env.manager.debugger().unwrap().emit_stopped(
        StopReason::ExitedNormally,
        Some(Breakpoint::at_line(MAIN_C, 5)),
    );
    assert_eq!(buffer.tag_line(CURRENT_BREAKPOINT_TAG), None);
    assert!(!events.borrow().contains(&"breakpoint-reached"));
}

#[test]
fn test_stop_without_location_does_not_mark() {
    let env = env();
    env.manager.start(MockRunner::new(Some("c"))).unwrap();

    env.manager.debugger().unwrap().emit_stopped(
        StopReason::BreakpointHit,
        Some(Breakpoint::at_function("main")),
    );
    assert_eq!(env.buffers.loads.get(), 0);
}

/// Run `body` while the manager marks stop locations in files that are not open.
async fn with_stop_marker(manager: &DebugManager, body: impl Future<Output = ()>) {
    tokio::select! {
        _ = manager.mark_stop_locations() => unreachable!("stop marker never completes"),
        _ = body => {}
    }
}

#[tokio::test]
async fn test_stop_mark_loads_file() {
    let env = env();
    env.manager.start(MockRunner::new(Some("c"))).unwrap();

    with_stop_marker(&env.manager, async {
        env.manager.debugger().unwrap().emit_stopped(
            StopReason::LocationReached,
            Some(Breakpoint::at_line(MAIN_C, 10)),
        );
        settle().await;

        assert_eq!(env.buffers.loads.get(), 1);
        let buffer = env.buffers.buffer(Path::new(MAIN_C)).unwrap();
        assert_eq!(buffer.tag_line(CURRENT_BREAKPOINT_TAG), Some(9));

        env.manager.stop();
        assert_eq!(buffer.tag_line(CURRENT_BREAKPOINT_TAG), None);
    })
    .await;
}

#[tokio::test]
async fn test_session_end_cancels_file_load() {
    let env = env();
    env.manager.start(MockRunner::new(Some("c"))).unwrap();

    with_stop_marker(&env.manager, async {
        env.manager.debugger().unwrap().emit_stopped(
            StopReason::BreakpointHit,
            Some(Breakpoint::at_line(MAIN_C, 10)),
        );
        env.manager.stop();
        settle().await;

        assert_eq!(env.buffers.loads.get(), 0);
        assert!(env.buffers.buffer(Path::new(MAIN_C)).is_none());
    })
    .await;
}

#[tokio::test]
async fn test_resume_abandons_file_load() {
    let env = env();
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    let debugger = env.manager.debugger().unwrap();

    with_stop_marker(&env.manager, async {
        debugger.emit_stopped(
            StopReason::BreakpointHit,
            Some(Breakpoint::at_line(MAIN_C, 10)),
        );
        for _ in 0..8 {
            if env.buffers.loads.get() > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        // the file is being loaded when the inferior resumes
        assert_eq!(env.buffers.loads.get(), 1);
        debugger.emit_running();
        settle().await;

        assert!(debugger.is_running());
        let tagged = env
            .buffers
            .buffer(Path::new(MAIN_C))
            .and_then(|buffer| buffer.tag_line(CURRENT_BREAKPOINT_TAG));
        assert_eq!(tagged, None);
    })
    .await;
}

#[tokio::test]
async fn test_stop_mark_without_marker_is_skipped() {
    let env = env();
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    let debugger = env.manager.debugger().unwrap();

    debugger.emit_stopped(
        StopReason::BreakpointHit,
        Some(Breakpoint::at_line(MAIN_C, 10)),
    );
    assert!(!debugger.is_running());
    assert_eq!(env.buffers.loads.get(), 0);

    // resumed before anybody marked the location
    debugger.emit_running();
    with_stop_marker(&env.manager, settle()).await;
    assert_eq!(env.buffers.loads.get(), 0);
    assert!(env.buffers.buffer(Path::new(MAIN_C)).is_none());
}

#[test]
fn test_stop_outside_runtime_is_not_fatal() {
    let env = env();
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    let events = record_events(&env.manager);

    env.manager.debugger().unwrap().emit_stopped(
        StopReason::BreakpointHit,
        Some(Breakpoint::at_line(MAIN_C, 10)),
    );
    assert_eq!(*events.borrow(), vec!["breakpoint-reached"]);
    assert_eq!(env.buffers.loads.get(), 0);

    env.manager.stop();
    assert!(!env.manager.active());
}

#[tokio::test]
async fn test_next_stop_replaces_queued_mark() {
    let env = env();
    let lib_c = env.buffers.open("/src/app/lib.c");
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    let debugger = env.manager.debugger().unwrap();

    debugger.emit_stopped(
        StopReason::BreakpointHit,
        Some(Breakpoint::at_line(MAIN_C, 10)),
    );
    debugger.emit_stopped(
        StopReason::BreakpointHit,
        Some(Breakpoint::at_line("/src/app/lib.c", 3)),
    );
    with_stop_marker(&env.manager, settle()).await;

    assert_eq!(lib_c.tag_line(CURRENT_BREAKPOINT_TAG), Some(2));
    assert_eq!(env.buffers.loads.get(), 0);
    assert!(env.buffers.buffer(Path::new(MAIN_C)).is_none());
}
