use crate::config::DebugConfig;
use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::breakpoints::BreakpointSet;
use crate::debugger::buffer::{BufferManager, CURRENT_BREAKPOINT_TAG};
use crate::debugger::debounce::Debounce;
use crate::debugger::error::Error;
use crate::debugger::index::BreakpointIndex;
use crate::debugger::registry::DebuggerRegistry;
use crate::debugger::runner::{Pipeline, RunCommand, Runner};
use crate::debugger::signal::{SubscriptionId, Subscribers};
use crate::debugger::{Debugger, DebuggerEvent};
use crate::weak_error;
use indexmap::IndexSet;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Debug manager state change.
#[derive(Clone, Debug)]
pub enum ManagerEvent {
    /// Breakpoint registered by the active debugger.
    BreakpointAdded(Rc<Breakpoint>),
    /// Breakpoint removed by the active debugger.
    BreakpointRemoved(Rc<Breakpoint>),
    /// Inferior stopped at the breakpoint.
    BreakpointReached(Rc<Breakpoint>),
    ActiveChanged(bool),
    /// Debugger was attached or detached.
    DebuggerChanged,
}

struct Session {
    debugger: Rc<Debugger>,
    runner: Rc<dyn Runner>,
    subscription: SubscriptionId,
    /// Cancelled when the session ends, parent of all session requests.
    cancel: CancellationToken,
}

/// Stop location in a file that is not open yet.
struct PendingMark {
    file: PathBuf,
    line: u32,
    /// Cancelled when the inferior resumes or the session ends.
    cancel: CancellationToken,
}

/// Debug session orchestrator.
///
/// Owns the breakpoint index, so breakpoints survive between sessions: cached
/// breakpoints are replayed into every new debugger when the inferior is spawned and
/// their identifiers are reset when the session ends.
///
/// A stop location in a file that is not open yet is queued and marked by
/// [`DebugManager::mark_stop_locations`], which the owner drives on its executor. If it
/// is not driven such locations are simply left unmarked.
pub struct DebugManager {
    weak_self: Weak<DebugManager>,
    registry: Rc<DebuggerRegistry>,
    buffer_manager: Rc<dyn BufferManager>,
    config: DebugConfig,
    index: BreakpointIndex,
    session: RefCell<Option<Session>>,
    active: Cell<bool>,
    /// Files with a stop mark applied during the session.
    marked: RefCell<IndexSet<PathBuf>>,
    pending_mark: RefCell<Option<PendingMark>>,
    /// Token of the current stop, child of the session token.
    stop_cancel: RefCell<CancellationToken>,
    mark_requested: Notify,
    line_flags: Debounce<PathBuf>,
    events: Subscribers<ManagerEvent>,
}

impl DebugManager {
    pub fn new(
        registry: Rc<DebuggerRegistry>,
        buffer_manager: Rc<dyn BufferManager>,
        config: DebugConfig,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            registry,
            buffer_manager,
            config,
            index: BreakpointIndex::new(),
            session: RefCell::default(),
            active: Cell::new(false),
            marked: RefCell::default(),
            pending_mark: RefCell::default(),
            stop_cancel: RefCell::default(),
            mark_requested: Notify::new(),
            line_flags: Debounce::default(),
            events: Subscribers::default(),
        })
    }

    pub fn subscribe(&self, f: impl Fn(&ManagerEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Return true while a debugger session is in progress.
    pub fn active(&self) -> bool {
        self.active.get()
    }

    pub fn debugger(&self) -> Option<Rc<Debugger>> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.debugger.clone())
    }

    /// Return the breakpoint set of a file, this is what the editor gutter queries.
    pub fn breakpoints_for_file(&self, file: &Path) -> Rc<BreakpointSet> {
        self.index.get_or_create_for_file(file)
    }

    /// Breakpoints without a file waiting for the next session.
    pub fn pending_breakpoints(&self) -> Vec<Rc<Breakpoint>> {
        self.index.pending()
    }

    /// Return true if some debugger backend may debug sources of the language.
    pub fn supports_language(&self, language: Option<&str>) -> bool {
        language.is_some_and(|language| self.registry.supports_language(language))
    }

    fn set_active(&self, active: bool) {
        if self.active.replace(active) != active {
            self.events.emit(&ManagerEvent::ActiveChanged(active));
        }
    }

    fn session_token(&self) -> CancellationToken {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.cancel.child_token())
            .unwrap_or_default()
    }

    /// Find a debugger for the command: the lowest priority among backends that support
    /// it, the first found wins a tie. Backends that declare languages are skipped if the
    /// command language is known and not declared.
    pub fn find_debugger(
        &self,
        pipeline: &Pipeline,
        run_command: &RunCommand,
    ) -> Option<Rc<Debugger>> {
        let mut found: Option<(i32, Rc<Debugger>)> = None;

        for plugin in self.registry.plugins() {
            if !plugin.matches_language(run_command.language.as_deref()) {
                debug!(
                    target: "debugger",
                    "skip debugger {}, language {:?} not supported",
                    plugin.module_name,
                    run_command.language
                );
                continue;
            }

            let debugger = plugin.create();
            let Some(priority) = debugger.supports_run_command(pipeline, run_command) else {
                continue;
            };
            debug!(
                target: "debugger",
                "debugger {} supports {} with priority {priority}",
                plugin.module_name,
                run_command.id
            );

            if found.as_ref().map_or(true, |(best, _)| priority < *best) {
                found = Some((priority, debugger));
            }
        }

        found.map(|(_, debugger)| debugger)
    }

    /// Prepare a debugger session for the runner. The runner is marked failed if there is
    /// no suitable debugger.
    pub fn start(&self, runner: Rc<dyn Runner>) -> Result<(), Error> {
        if self.session.borrow().is_some() {
            warn!(target: "debugger", "debugger session already active, stop it");
            self.stop();
        }

        let Some(debugger) = self.find_debugger(runner.pipeline(), runner.run_command()) else {
            runner.set_failed(true);
            return Err(Error::NoSuitableDebugger);
        };

        {
            let mut run_context = runner.run_context().borrow_mut();
            debugger.prepare_for_run(runner.pipeline(), &mut run_context);
            self.config.apply(&mut run_context);
        }

        let weak = self.weak_self.clone();
        let subscription = debugger.subscribe(move |event| {
            if let Some(manager) = weak.upgrade() {
                manager.on_debugger_event(event);
            }
        });

        info!(
            target: "debugger",
            "start {} session for {}",
            debugger.display_name(),
            runner.run_command().id
        );
        *self.session.borrow_mut() = Some(Session {
            debugger,
            runner,
            subscription,
            cancel: CancellationToken::new(),
        });

        self.set_active(true);
        self.events.emit(&ManagerEvent::DebuggerChanged);
        Ok(())
    }

    /// Inferior process was spawned: register cached breakpoints without an identifier
    /// and drain the pending queue into the debugger.
    pub async fn runner_spawned(&self, identifier: &str) {
        let Some(debugger) = self.debugger() else {
            return;
        };
        info!(target: "debugger", "inferior {identifier} spawned");

        let mut cached = vec![];
        self.index.sets().iter().for_each(|set| {
            set.foreach(|bp| {
                if !bp.has_id() {
                    cached.push(bp.clone());
                }
            })
        });
        for bp in cached {
            weak_error!(
                debugger.insert_breakpoint(bp, self.session_token()).await,
                "register cached breakpoint:"
            );
        }

        for bp in self.index.drain_pending() {
            if let Err(e) = debugger.insert_breakpoint(bp.clone(), self.session_token()).await {
                warn!(target: "debugger", "register pending breakpoint: {e:#}");
                self.index.queue_pending(bp);
            }
        }

        self.flush_line_flags();
    }

    /// Inferior process exited.
    pub fn runner_exited(&self) {
        self.finish_session(false);
    }

    /// Stop the session: kill the inferior, reset cached breakpoints so they are replayed
    /// into the next session, and clear the stop mark.
    pub fn stop(&self) {
        self.finish_session(true);
    }

    fn finish_session(&self, force_quit: bool) {
        let Some(session) = self.session.borrow_mut().take() else {
            return;
        };
        info!(target: "debugger", "stop {} session", session.debugger.display_name());

        session.cancel.cancel();
        session.debugger.unsubscribe(session.subscription);
        if force_quit {
            session.runner.force_quit();
        }

        self.set_active(false);
        self.index.reset_all();
        self.clear_stop_marks();
        self.events.emit(&ManagerEvent::DebuggerChanged);
        self.flush_line_flags();
    }

    /// Add a breakpoint: through the active debugger, or into the cache until the next
    /// session starts.
    pub async fn add_breakpoint(&self, breakpoint: Rc<Breakpoint>) -> Result<(), Error> {
        if let Some(debugger) = self.debugger() {
            return debugger
                .insert_breakpoint(breakpoint, self.session_token())
                .await;
        }

        if let Some(set) = self.index.add(breakpoint) {
            self.line_flags.schedule(set.file().to_path_buf());
        }
        self.flush_line_flags();
        Ok(())
    }

    /// Remove a breakpoint: through the active debugger, or from the cache.
    pub async fn remove_breakpoint(&self, breakpoint: Rc<Breakpoint>) -> Result<(), Error> {
        if let Some(debugger) = self.debugger() {
            return debugger
                .remove_breakpoint(breakpoint, self.session_token())
                .await;
        }

        if let Some(set) = self.index.remove(&breakpoint) {
            self.line_flags.schedule(set.file().to_path_buf());
        }
        self.flush_line_flags();
        Ok(())
    }

    fn on_debugger_event(&self, event: &DebuggerEvent) {
        match event {
            DebuggerEvent::Running => self.clear_stop_marks(),
            DebuggerEvent::BreakpointReached(bp) => {
                self.events.emit(&ManagerEvent::BreakpointReached(bp.clone()));
                self.mark_stopped(bp);
            }
            DebuggerEvent::BreakpointAdded(bp) => {
                if let Some(set) = self.index.breakpoint_added(bp) {
                    self.line_flags.schedule(set.file().to_path_buf());
                }
                self.events.emit(&ManagerEvent::BreakpointAdded(bp.clone()));
            }
            DebuggerEvent::BreakpointRemoved(bp) => {
                if let Some(set) = self.index.breakpoint_removed(bp) {
                    self.line_flags.schedule(set.file().to_path_buf());
                }
                self.events.emit(&ManagerEvent::BreakpointRemoved(bp.clone()));
            }
            DebuggerEvent::BreakpointModified(bp) => {
                if let Some(set) = self.index.breakpoint_modified(bp) {
                    self.line_flags.schedule(set.file().to_path_buf());
                }
            }
            _ => {}
        }
        self.flush_line_flags();
    }

    fn flush_line_flags(&self) {
        self.line_flags.flush(|file| {
            if let Some(buffer) = self.buffer_manager.find_buffer(&file) {
                buffer.line_flags_changed();
            }
        });
    }

    /// Highlight the line of the breakpoint. Line numbers of breakpoints are 1-based,
    /// buffer lines are 0-based.
    fn mark_stopped(&self, breakpoint: &Breakpoint) {
        let Some(file) = breakpoint.file() else {
            return;
        };
        let line = breakpoint.line().saturating_sub(1);
        // a mark still queued from the previous stop is stale now
        let cancel = self.session_token();
        self.stop_cancel.replace(cancel.clone()).cancel();
        self.pending_mark.borrow_mut().take();

        if let Some(buffer) = self.buffer_manager.find_buffer(&file) {
            buffer.apply_tag(CURRENT_BREAKPOINT_TAG, line);
            self.marked.borrow_mut().insert(file);
            return;
        }

        debug!(target: "debugger", "queue stop mark for {}", file.display());
        *self.pending_mark.borrow_mut() = Some(PendingMark { file, line, cancel });
        self.mark_requested.notify_one();
    }

    /// Load files of stop locations that are not open and mark the stop line. Runs
    /// until the future is dropped, a mark is abandoned if the inferior resumes or the
    /// session ends before the file is loaded.
    pub async fn mark_stop_locations(&self) {
        loop {
            let pending = self.pending_mark.borrow_mut().take();
            let Some(mark) = pending else {
                self.mark_requested.notified().await;
                continue;
            };

            let buffer = tokio::select! {
                biased;
                _ = mark.cancel.cancelled() => continue,
                buffer = self.buffer_manager.load_file(&mark.file) => buffer,
            };
            let Some(buffer) = weak_error!(buffer, "load stopped file:") else {
                continue;
            };
            buffer.apply_tag(CURRENT_BREAKPOINT_TAG, mark.line);
            self.marked.borrow_mut().insert(mark.file);
        }
    }

    /// Remove stop mark from every buffer marked during the session.
    fn clear_stop_marks(&self) {
        self.stop_cancel.take().cancel();
        self.pending_mark.borrow_mut().take();

        let marked = std::mem::take(&mut *self.marked.borrow_mut());
        for file in marked {
            if let Some(buffer) = self.buffer_manager.find_buffer(&file) {
                buffer.remove_tag(CURRENT_BREAKPOINT_TAG);
            }
        }
    }
}
