pub mod address;
pub mod address_map;
pub mod backend;
pub mod breakpoint;
pub mod breakpoints;
pub mod buffer;
pub mod debounce;
pub mod disasm;
pub mod error;
pub mod frame;
pub mod index;
pub mod library;
pub mod manager;
pub mod register;
pub mod registry;
pub mod runner;
pub mod signal;
pub mod thread;
pub mod types;
pub mod variable;

pub use address::{Address, AddressRange};
pub use backend::{DebuggerBackend, EventSink};
pub use breakpoint::{Breakpoint, BreakpointProperty};
pub use breakpoints::BreakpointSet;
pub use error::Error;
pub use manager::{DebugManager, ManagerEvent};
pub use registry::{DebuggerPlugin, DebuggerRegistry};
pub use types::{
    BreakMode, BreakpointChange, DebuggerState, Disposition, Movement, StopReason, Stream,
};

use crate::debugger::address_map::{AddressMapEntry, AddressRangeMap};
use crate::debugger::disasm::Instruction;
use crate::debugger::frame::Frame;
use crate::debugger::library::Library;
use crate::debugger::register::Register;
use crate::debugger::runner::{Pipeline, RunCommand, RunContext};
use crate::debugger::signal::{SubscriptionId, Subscribers};
use crate::debugger::thread::{Thread, ThreadGroup};
use crate::debugger::variable::Variable;
use bytes::Bytes;
use log::{debug, info};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::future::Future;
use std::rc::Rc;
use tokio_util::sync::CancellationToken;

/// Debugger state change, delivered synchronously to [`Debugger::subscribe`] observers
/// after the debugger state is updated.
#[derive(Clone, Debug)]
pub enum DebuggerEvent {
    Log {
        stream: Stream,
        content: Bytes,
    },
    Running,
    Stopped {
        reason: StopReason,
        breakpoint: Option<Rc<Breakpoint>>,
    },
    /// Inferior stopped at the breakpoint (not emitted for terminal stops).
    BreakpointReached(Rc<Breakpoint>),
    BreakpointAdded(Rc<Breakpoint>),
    BreakpointRemoved(Rc<Breakpoint>),
    BreakpointModified(Rc<Breakpoint>),
    ThreadAdded(Rc<Thread>),
    ThreadRemoved(Rc<Thread>),
    ThreadSelected(Rc<Thread>),
    ThreadGroupAdded(Rc<ThreadGroup>),
    ThreadGroupRemoved(Rc<ThreadGroup>),
    ThreadGroupStarted(Rc<ThreadGroup>),
    ThreadGroupExited(Rc<ThreadGroup>),
    LibraryLoaded(Rc<Library>),
    LibraryUnloaded(Rc<Library>),
}

#[derive(Default)]
struct SessionState {
    has_started: bool,
    is_running: bool,
    selected_thread: Option<Rc<Thread>>,
    /// ordered by [`Breakpoint::compare`]
    breakpoints: Vec<Rc<Breakpoint>>,
    /// ordered by [`Thread::compare`]
    threads: Vec<Rc<Thread>>,
    /// ordered by [`ThreadGroup::compare`]
    thread_groups: Vec<Rc<ThreadGroup>>,
    address_map: AddressRangeMap,
}

/// Insert an item after all elements that are not greater than it. An element equal to
/// the item is replaced, so the list never holds two equal elements.
fn insert_sorted<T>(list: &mut Vec<Rc<T>>, item: Rc<T>, cmp: impl Fn(&T, &T) -> Ordering) {
    remove_first_equal(list, item.as_ref(), &cmp);
    let pos = list.partition_point(|e| cmp(e.as_ref(), item.as_ref()) != Ordering::Greater);
    list.insert(pos, item);
}

fn remove_first_equal<T>(
    list: &mut Vec<Rc<T>>,
    item: &T,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Option<Rc<T>> {
    let pos = list
        .iter()
        .position(|e| cmp(e.as_ref(), item) == Ordering::Equal)?;
    Some(list.remove(pos))
}

/// Run a backend operation, complete with [`Error::Cancelled`] as soon as the token is
/// cancelled. An operation whose token is already cancelled never reaches the backend.
async fn cancellable<T, F, Fut>(cancel: CancellationToken, op: F) -> Result<T, Error>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let fut = op(cancel.clone());
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Protocol independent debugger.
///
/// Keeps the session state (running/stopped, breakpoint, thread and thread group
/// registries, library address map) up to date with events published by a
/// [`DebuggerBackend`] and forwards requests to it.
pub struct Debugger {
    backend: Box<dyn DebuggerBackend>,
    state: RefCell<SessionState>,
    events: Subscribers<DebuggerEvent>,
}

impl std::fmt::Debug for Debugger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Debugger")
            .field("display_name", &self.display_name())
            .field("has_started", &state.has_started)
            .field("is_running", &state.is_running)
            .finish()
    }
}

impl Debugger {
    pub fn new(backend: impl DebuggerBackend + 'static) -> Rc<Self> {
        let debugger = Rc::new(Self {
            backend: Box::new(backend),
            state: RefCell::default(),
            events: Subscribers::default(),
        });
        debugger
            .backend
            .attach(EventSink::new(Rc::downgrade(&debugger)));
        debugger
    }

    pub fn display_name(&self) -> String {
        self.backend
            .display_name()
            .unwrap_or_else(|| "Debugger".to_string())
    }

    pub fn subscribe(&self, f: impl Fn(&DebuggerEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn supports_run_command(
        &self,
        pipeline: &Pipeline,
        run_command: &RunCommand,
    ) -> Option<i32> {
        self.backend.supports_run_command(pipeline, run_command)
    }

    pub fn prepare_for_run(&self, pipeline: &Pipeline, run_context: &mut RunContext) {
        self.backend.prepare_for_run(pipeline, run_context)
    }

    // --------------------------------- state -----------------------------------------------------

    pub fn has_started(&self) -> bool {
        self.state.borrow().has_started
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    pub fn state(&self) -> DebuggerState {
        let state = self.state.borrow();
        DebuggerState::from_flags(state.has_started, state.is_running)
    }

    /// Return true if the movement is legal in the current state.
    pub fn can_move(&self, movement: Movement) -> bool {
        let state = self.state.borrow();
        match movement {
            Movement::Start => !state.is_running,
            Movement::Continue | Movement::StepIn | Movement::StepOver | Movement::Finish => {
                state.has_started && !state.is_running
            }
        }
    }

    pub fn selected_thread(&self) -> Option<Rc<Thread>> {
        self.state.borrow().selected_thread.clone()
    }

    /// Breakpoints known by the debugger, ordered by [`Breakpoint::compare`].
    pub fn breakpoints(&self) -> Vec<Rc<Breakpoint>> {
        self.state.borrow().breakpoints.clone()
    }

    pub fn threads(&self) -> Vec<Rc<Thread>> {
        self.state.borrow().threads.clone()
    }

    pub fn thread_groups(&self) -> Vec<Rc<ThreadGroup>> {
        self.state.borrow().thread_groups.clone()
    }

    /// Return name of a binary (executable or library) mapped at the address.
    pub fn locate_binary_at_address(&self, address: Address) -> Option<String> {
        self.state
            .borrow()
            .address_map
            .lookup(address)
            .map(|entry| entry.filename.to_string())
    }

    // --------------------------------- events ----------------------------------------------------

    pub fn emit_log(&self, stream: Stream, content: Bytes) {
        self.events.emit(&DebuggerEvent::Log { stream, content });
    }

    pub fn emit_running(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.is_running = true;
            state.has_started = true;
        }
        debug!(target: "debugger", "inferior running");
        self.events.emit(&DebuggerEvent::Running);
    }

    pub fn emit_stopped(&self, reason: StopReason, breakpoint: Option<Rc<Breakpoint>>) {
        {
            let mut state = self.state.borrow_mut();
            state.is_running = false;
            if reason.is_terminal() {
                state.has_started = false;
            }
        }
        debug!(target: "debugger", "inferior stopped: {reason}");

        self.events.emit(&DebuggerEvent::Stopped {
            reason,
            breakpoint: breakpoint.clone(),
        });
        if let Some(breakpoint) = breakpoint.filter(|_| reason.reaches_breakpoint()) {
            self.events.emit(&DebuggerEvent::BreakpointReached(breakpoint));
        }
    }

    pub fn emit_breakpoint_added(&self, breakpoint: Rc<Breakpoint>) {
        debug!(target: "debugger", "added breakpoint {:?}", breakpoint.id());
        insert_sorted(
            &mut self.state.borrow_mut().breakpoints,
            breakpoint.clone(),
            Breakpoint::compare,
        );
        self.events.emit(&DebuggerEvent::BreakpointAdded(breakpoint));
    }

    pub fn emit_breakpoint_removed(&self, breakpoint: Rc<Breakpoint>) {
        debug!(target: "debugger", "removed breakpoint {:?}", breakpoint.id());
        remove_first_equal(
            &mut self.state.borrow_mut().breakpoints,
            breakpoint.as_ref(),
            Breakpoint::compare,
        );
        self.events.emit(&DebuggerEvent::BreakpointRemoved(breakpoint));
    }

    pub fn emit_breakpoint_modified(&self, breakpoint: Rc<Breakpoint>) {
        debug!(
            target: "debugger",
            "modified breakpoint {:?} ({})",
            breakpoint.id(),
            if breakpoint.enabled() { "enabled" } else { "disabled" }
        );
        {
            let mut state = self.state.borrow_mut();
            remove_first_equal(&mut state.breakpoints, breakpoint.as_ref(), Breakpoint::compare);
            insert_sorted(&mut state.breakpoints, breakpoint.clone(), Breakpoint::compare);
        }
        self.events.emit(&DebuggerEvent::BreakpointModified(breakpoint));
    }

    pub fn emit_thread_added(&self, thread: Rc<Thread>) {
        debug!(target: "debugger", "added thread {}", thread.id);
        insert_sorted(
            &mut self.state.borrow_mut().threads,
            thread.clone(),
            Thread::compare,
        );
        self.events.emit(&DebuggerEvent::ThreadAdded(thread));
    }

    pub fn emit_thread_removed(&self, thread: Rc<Thread>) {
        debug!(target: "debugger", "removed thread {}", thread.id);
        {
            let mut state = self.state.borrow_mut();
            remove_first_equal(&mut state.threads, thread.as_ref(), Thread::compare);
            if state
                .selected_thread
                .as_ref()
                .is_some_and(|selected| Thread::compare(selected, &thread) == Ordering::Equal)
            {
                state.selected_thread = None;
            }
        }
        self.events.emit(&DebuggerEvent::ThreadRemoved(thread));
    }

    /// Update selected thread, notify only if the selection changes.
    pub fn emit_thread_selected(&self, thread: Rc<Thread>) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let changed = !state
                .selected_thread
                .as_ref()
                .is_some_and(|selected| Rc::ptr_eq(selected, &thread));
            if changed {
                state.selected_thread = Some(thread.clone());
            }
            changed
        };
        if changed {
            self.events.emit(&DebuggerEvent::ThreadSelected(thread));
        }
    }

    pub fn emit_thread_group_added(&self, thread_group: Rc<ThreadGroup>) {
        debug!(target: "debugger", "added thread group {}", thread_group.id());
        insert_sorted(
            &mut self.state.borrow_mut().thread_groups,
            thread_group.clone(),
            ThreadGroup::compare,
        );
        self.events.emit(&DebuggerEvent::ThreadGroupAdded(thread_group));
    }

    pub fn emit_thread_group_removed(&self, thread_group: Rc<ThreadGroup>) {
        debug!(target: "debugger", "removed thread group {}", thread_group.id());
        remove_first_equal(
            &mut self.state.borrow_mut().thread_groups,
            thread_group.as_ref(),
            ThreadGroup::compare,
        );
        self.events.emit(&DebuggerEvent::ThreadGroupRemoved(thread_group));
    }

    /// Thread group process started, group pid is expected to be set.
    pub fn emit_thread_group_started(&self, thread_group: Rc<ThreadGroup>) {
        info!(
            target: "debugger",
            "thread group {} started, pid {:?}",
            thread_group.id(),
            thread_group.pid()
        );
        self.events.emit(&DebuggerEvent::ThreadGroupStarted(thread_group));
    }

    /// Thread group process exited, group exit code is expected to be set.
    pub fn emit_thread_group_exited(&self, thread_group: Rc<ThreadGroup>) {
        info!(
            target: "debugger",
            "thread group {} exited, code {:?}",
            thread_group.id(),
            thread_group.exit_code()
        );
        self.events.emit(&DebuggerEvent::ThreadGroupExited(thread_group));
    }

    /// Map every library range into the address map. File offsets are not reported by
    /// backends, so entry offset is always zero.
    pub fn emit_library_loaded(&self, library: Rc<Library>) {
        debug!(target: "debugger", "library loaded {}", library.map_name());
        {
            let mut state = self.state.borrow_mut();
            for range in &library.ranges {
                state.address_map.insert(AddressMapEntry {
                    filename: library.map_name(),
                    offset: 0,
                    start: range.from,
                    end: range.to,
                });
            }
        }
        self.events.emit(&DebuggerEvent::LibraryLoaded(library));
    }

    pub fn emit_library_unloaded(&self, library: Rc<Library>) {
        debug!(target: "debugger", "library unloaded {}", library.map_name());
        {
            let mut state = self.state.borrow_mut();
            for range in &library.ranges {
                if !state.address_map.remove(range.from) {
                    debug!(target: "debugger", "range {} not mapped", range.from);
                }
            }
        }
        self.events.emit(&DebuggerEvent::LibraryUnloaded(library));
    }

    // --------------------------------- requests --------------------------------------------------

    pub async fn move_(&self, movement: Movement, cancel: CancellationToken) -> Result<(), Error> {
        debug!(target: "debugger", "move: {movement}");
        cancellable(cancel, |c| self.backend.move_(movement, c)).await
    }

    pub async fn interrupt(
        &self,
        thread_group: Option<Rc<ThreadGroup>>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        cancellable(cancel, |c| self.backend.interrupt(thread_group, c)).await
    }

    pub async fn send_signal(&self, signum: i32, cancel: CancellationToken) -> Result<(), Error> {
        cancellable(cancel, |c| self.backend.send_signal(signum, c)).await
    }

    pub async fn insert_breakpoint(
        &self,
        breakpoint: Rc<Breakpoint>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        cancellable(cancel, |c| self.backend.insert_breakpoint(breakpoint, c)).await
    }

    pub async fn remove_breakpoint(
        &self,
        breakpoint: Rc<Breakpoint>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        cancellable(cancel, |c| self.backend.remove_breakpoint(breakpoint, c)).await
    }

    pub async fn modify_breakpoint(
        &self,
        change: BreakpointChange,
        breakpoint: Rc<Breakpoint>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        cancellable(cancel, |c| {
            self.backend.modify_breakpoint(change, breakpoint, c)
        })
        .await
    }

    pub async fn list_breakpoints(
        &self,
        cancel: CancellationToken,
    ) -> Result<Vec<Rc<Breakpoint>>, Error> {
        cancellable(cancel, |c| self.backend.list_breakpoints(c)).await
    }

    pub async fn list_frames(
        &self,
        thread: Rc<Thread>,
        cancel: CancellationToken,
    ) -> Result<Vec<Frame>, Error> {
        cancellable(cancel, |c| self.backend.list_frames(thread, c)).await
    }

    pub async fn list_locals(
        &self,
        thread: Rc<Thread>,
        frame: Frame,
        cancel: CancellationToken,
    ) -> Result<Vec<Variable>, Error> {
        cancellable(cancel, |c| self.backend.list_locals(thread, frame, c)).await
    }

    pub async fn list_params(
        &self,
        thread: Rc<Thread>,
        frame: Frame,
        cancel: CancellationToken,
    ) -> Result<Vec<Variable>, Error> {
        cancellable(cancel, |c| self.backend.list_params(thread, frame, c)).await
    }

    pub async fn list_registers(&self, cancel: CancellationToken) -> Result<Vec<Register>, Error> {
        cancellable(cancel, |c| self.backend.list_registers(c)).await
    }

    pub async fn disassemble(
        &self,
        range: AddressRange,
        cancel: CancellationToken,
    ) -> Result<Vec<Instruction>, Error> {
        cancellable(cancel, |c| self.backend.disassemble(range, c)).await
    }

    pub async fn interpret(&self, command: &str, cancel: CancellationToken) -> Result<(), Error> {
        let command = command.to_string();
        cancellable(cancel, |c| self.backend.interpret(command, c)).await
    }
}
