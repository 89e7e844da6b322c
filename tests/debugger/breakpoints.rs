use crate::common::{env, record_events, MockRunner};
use ide_debugger::debugger::{BreakMode, Breakpoint};
use std::path::Path;
use std::rc::Rc;

const MAIN_C: &str = "/src/app/main.c";

#[tokio::test]
async fn test_breakpoints_cached_without_session() {
    let env = env();
    let buffer = env.buffers.open(MAIN_C);
    let events = record_events(&env.manager);

    let bp = Breakpoint::at_line(MAIN_C, 5);
    env.manager.add_breakpoint(bp.clone()).await.unwrap();

    let set = env.manager.breakpoints_for_file(Path::new(MAIN_C));
    assert!(Rc::ptr_eq(&set.get_line(5).unwrap(), &bp));
    assert_eq!(set.get_line_mode(5), BreakMode::Breakpoint);
    assert_eq!(buffer.line_flag_changes.get(), 1);

    let function_bp = Breakpoint::at_function("g_log_structured");
    env.manager.add_breakpoint(function_bp.clone()).await.unwrap();
    assert_eq!(env.manager.pending_breakpoints().len(), 1);
    assert_eq!(buffer.line_flag_changes.get(), 1);

    env.manager.remove_breakpoint(bp).await.unwrap();
    assert!(set.is_empty());
    assert_eq!(buffer.line_flag_changes.get(), 2);

    env.manager.remove_breakpoint(function_bp).await.unwrap();
    assert!(env.manager.pending_breakpoints().is_empty());

    assert_eq!(env.log.inserted_count(), 0);
    // cache changes are not debugger events
    assert!(events.borrow().is_empty());
}

#[tokio::test]
async fn test_breakpoints_through_debugger() {
    let env = env();
    let events = record_events(&env.manager);
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    events.borrow_mut().clear();

    let bp = Breakpoint::at_line(MAIN_C, 12);
    env.manager.add_breakpoint(bp.clone()).await.unwrap();

    assert_eq!(bp.id().as_deref(), Some("1"));
    assert_eq!(env.log.inserted_count(), 1);
    let set = env.manager.breakpoints_for_file(Path::new(MAIN_C));
    assert!(Rc::ptr_eq(&set.get_line(12).unwrap(), &bp));
    let debugger = env.manager.debugger().unwrap();
    assert_eq!(debugger.breakpoints().len(), 1);
    assert_eq!(*events.borrow(), vec!["breakpoint-added"]);

    env.manager.remove_breakpoint(bp.clone()).await.unwrap();
    assert_eq!(env.log.removed.borrow().len(), 1);
    assert!(set.get_line(12).is_none());
    assert!(debugger.breakpoints().is_empty());
    assert_eq!(*events.borrow(), vec!["breakpoint-added", "breakpoint-removed"]);
}

#[tokio::test]
async fn test_modified_breakpoint_moves_between_lines() {
    let env = env();
    let buffer = env.buffers.open(MAIN_C);
    env.manager.start(MockRunner::new(Some("c"))).unwrap();

    let bp = Breakpoint::at_line(MAIN_C, 5);
    env.manager.add_breakpoint(bp.clone()).await.unwrap();
    let flags = buffer.line_flag_changes.get();

    // backend resolved the location to the next line with code
    bp.set_line(7);
    env.manager
        .debugger()
        .unwrap()
        .emit_breakpoint_modified(bp.clone());

    let set = env.manager.breakpoints_for_file(Path::new(MAIN_C));
    assert!(set.get_line(5).is_none());
    assert!(Rc::ptr_eq(&set.get_line(7).unwrap(), &bp));
    assert_eq!(set.len(), 1);
    assert_eq!(buffer.line_flag_changes.get(), flags + 1);
}

#[tokio::test]
async fn test_pending_breakpoints_replayed_once() {
    let env = env();
    let bp = Breakpoint::at_function("main");
    env.manager.add_breakpoint(bp.clone()).await.unwrap();
    assert_eq!(env.manager.pending_breakpoints().len(), 1);

    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    env.manager.runner_spawned("1").await;

    assert!(env.manager.pending_breakpoints().is_empty());
    assert_eq!(env.log.inserted_count(), 1);
    assert!(Rc::ptr_eq(&env.log.inserted.borrow()[0], &bp));
    assert!(bp.has_id());

    env.manager.runner_spawned("1").await;
    assert_eq!(env.log.inserted_count(), 1);
}

#[tokio::test]
async fn test_failed_pending_breakpoint_stays_queued() {
    let env = env();
    let bp = Breakpoint::at_function("main");
    env.manager.add_breakpoint(bp.clone()).await.unwrap();

    env.log.fail_inserts.set(true);
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    env.manager.runner_spawned("1").await;

    let pending = env.manager.pending_breakpoints();
    assert_eq!(pending.len(), 1);
    assert!(Rc::ptr_eq(&pending[0], &bp));
    assert!(!bp.has_id());

    env.log.fail_inserts.set(false);
    env.manager.runner_spawned("1").await;
    assert!(env.manager.pending_breakpoints().is_empty());
    assert!(bp.has_id());
}

#[tokio::test]
async fn test_cached_breakpoints_survive_sessions() {
    let env = env();
    let bp = Breakpoint::at_line(MAIN_C, 5);
    env.manager.add_breakpoint(bp.clone()).await.unwrap();
    let set = env.manager.breakpoints_for_file(Path::new(MAIN_C));

    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    env.manager.runner_spawned("1").await;
    assert_eq!(bp.id().as_deref(), Some("1"));
    assert_eq!(set.len(), 1);

    env.manager.stop();
    assert!(!bp.has_id());
    assert!(Rc::ptr_eq(&set.get_line(5).unwrap(), &bp));

    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    env.manager.runner_spawned("2").await;
    assert_eq!(bp.id().as_deref(), Some("2"));
    assert_eq!(env.log.inserted_count(), 2);
    assert_eq!(set.len(), 1);
    assert!(Rc::ptr_eq(&set.get_line(5).unwrap(), &bp));
}
