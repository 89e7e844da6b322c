use crate::common::{
    env, env_with, init_logger, plugin, record_events, BackendLog, MockBufferManager, MockRunner,
};
use ide_debugger::config::DebugConfig;
use ide_debugger::debugger::runner::Runner;
use ide_debugger::debugger::{Breakpoint, DebugManager, DebuggerPlugin, DebuggerRegistry, Error};
use std::path::Path;
use std::rc::Rc;

fn manager_with(plugins: impl IntoIterator<Item = DebuggerPlugin>) -> Rc<DebugManager> {
    init_logger();
    let registry = Rc::new(DebuggerRegistry::new());
    for p in plugins {
        registry.load(p);
    }
    DebugManager::new(
        registry,
        Rc::new(MockBufferManager::default()),
        DebugConfig::default(),
    )
}

#[test]
fn test_find_debugger() {
    struct TestCase {
        plugins: Vec<(&'static str, &'static str, Option<i32>)>,
        language: Option<&'static str>,
        expected: Option<&'static str>,
    }
    let test_cases = [
        TestCase {
            plugins: vec![("gdb", "c", Some(100)), ("lldb", "c", Some(50)), ("dummy", "c", None)],
            language: Some("c"),
            expected: Some("lldb"),
        },
        TestCase {
            plugins: vec![("gdb", "", Some(100)), ("gdb-multiarch", "", Some(100))],
            language: Some("c"),
            expected: Some("gdb"),
        },
        TestCase {
            plugins: vec![("pdb", "python", Some(1)), ("gdb", "c,rust", Some(100))],
            language: Some("rust"),
            expected: Some("gdb"),
        },
        TestCase {
            plugins: vec![("pdb", "python", Some(1)), ("gdb", "c,rust", Some(100))],
            language: None,
            expected: Some("pdb"),
        },
        TestCase {
            plugins: vec![("pdb", "python", Some(1)), ("any", "", Some(200))],
            language: Some("rust"),
            expected: Some("any"),
        },
        TestCase {
            plugins: vec![("pdb", "python", Some(1)), ("dummy", "", None)],
            language: Some("rust"),
            expected: None,
        },
    ];

    for tc in test_cases {
        let log = Rc::new(BackendLog::default());
        let manager = manager_with(
            tc.plugins
                .iter()
                .map(|(name, languages, priority)| plugin(*name, languages, *priority, &log)),
        );
        let runner = MockRunner::new(tc.language);

        let found = manager.find_debugger(runner.pipeline(), runner.run_command());
        assert_eq!(
            found.map(|dbg| dbg.display_name()).as_deref(),
            tc.expected,
            "{:?} for {:?}",
            tc.plugins,
            tc.language
        );
    }
}

#[test]
fn test_start_without_suitable_debugger() {
    let log = Rc::new(BackendLog::default());
    let manager = manager_with([plugin("dummy", "", None, &log)]);
    let events = record_events(&manager);
    let runner = MockRunner::new(Some("c"));

    let err = manager.start(runner.clone()).unwrap_err();
    assert!(matches!(err, Error::NoSuitableDebugger));
    assert!(runner.failed.get());
    assert!(!manager.active());
    assert!(manager.debugger().is_none());
    assert!(events.borrow().is_empty());
}

#[test]
fn test_start_prepares_run_context() {
    struct TestCase {
        config: DebugConfig,
        g_debug: Option<&'static str>,
    }
    let test_cases = [
        TestCase {
            config: DebugConfig::default(),
            g_debug: None,
        },
        TestCase {
            config: DebugConfig {
                insert_breakpoint_at_criticals: true,
                ..Default::default()
            },
            g_debug: Some("fatal-criticals"),
        },
        TestCase {
            config: DebugConfig {
                insert_breakpoint_at_warnings: true,
                insert_breakpoint_at_criticals: true,
            },
            g_debug: Some("fatal-warnings"),
        },
    ];

    for tc in test_cases {
        let env = env_with(tc.config);
        let runner = MockRunner::new(Some("c"));
        env.manager.start(runner.clone()).unwrap();

        let ctx = runner.context();
        assert_eq!(ctx.argv, vec!["gdb", "--args", "./app"]);
        assert_eq!(ctx.getenv("G_DEBUG"), tc.g_debug);
        assert!(!runner.failed.get());
    }
}

#[test]
fn test_session_lifecycle() {
    let env = env();
    let events = record_events(&env.manager);
    let runner = MockRunner::new(Some("rust"));

    assert!(!env.manager.active());
    env.manager.start(runner.clone()).unwrap();
    assert!(env.manager.active());
    assert_eq!(
        env.manager.debugger().map(|dbg| dbg.display_name()).as_deref(),
        Some("gdb")
    );
    assert_eq!(*events.borrow(), vec!["active", "debugger-changed"]);

    env.manager.stop();
    assert!(!env.manager.active());
    assert!(env.manager.debugger().is_none());
    assert_eq!(runner.force_quits.get(), 1);
    assert_eq!(
        *events.borrow(),
        vec!["active", "debugger-changed", "inactive", "debugger-changed"]
    );

    // no session, nothing to stop
    env.manager.stop();
    assert_eq!(runner.force_quits.get(), 1);
    assert_eq!(events.borrow().len(), 4);
}

#[test]
fn test_runner_exited_keeps_process_alone() {
    let env = env();
    let runner = MockRunner::new(Some("c"));
    env.manager.start(runner.clone()).unwrap();

    env.manager.runner_exited();
    assert!(!env.manager.active());
    assert!(env.manager.debugger().is_none());
    assert_eq!(runner.force_quits.get(), 0);
}

#[test]
fn test_start_replaces_active_session() {
    let env = env();
    let first = MockRunner::new(Some("c"));
    let second = MockRunner::new(Some("c"));

    env.manager.start(first.clone()).unwrap();
    let first_debugger = env.manager.debugger().unwrap();
    env.manager.start(second.clone()).unwrap();

    assert_eq!(first.force_quits.get(), 1);
    assert_eq!(second.force_quits.get(), 0);
    assert!(env.manager.active());
    assert!(!Rc::ptr_eq(&first_debugger, &env.manager.debugger().unwrap()));
}

#[test]
fn test_detached_debugger_events_are_ignored() {
    let env = env();
    let events = record_events(&env.manager);
    env.manager.start(MockRunner::new(Some("c"))).unwrap();
    let debugger = env.manager.debugger().unwrap();
    env.manager.stop();
    events.borrow_mut().clear();

    debugger.emit_breakpoint_added(Breakpoint::at_line("/src/app/main.c", 3));
    assert!(events.borrow().is_empty());
    assert!(env
        .manager
        .breakpoints_for_file(Path::new("/src/app/main.c"))
        .is_empty());
}

#[test]
fn test_supports_language() {
    let env = env();
    let log = Rc::new(BackendLog::default());
    env.registry.load(plugin("lldb", "c,swift", Some(50), &log));

    struct TestCase {
        language: Option<&'static str>,
        expected: bool,
    }
    let test_cases = [
        TestCase {
            language: Some("c"),
            expected: true,
        },
        TestCase {
            language: Some("swift"),
            expected: true,
        },
        TestCase {
            language: Some("python"),
            expected: false,
        },
        TestCase {
            language: None,
            expected: false,
        },
    ];
    for tc in &test_cases {
        assert_eq!(
            env.manager.supports_language(tc.language),
            tc.expected,
            "{:?}",
            tc.language
        );
    }

    env.registry.unload("lldb");
    assert!(env.manager.supports_language(Some("c")));
    assert!(!env.manager.supports_language(Some("swift")));
}
