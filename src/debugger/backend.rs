use crate::debugger::address::AddressRange;
use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::disasm::Instruction;
use crate::debugger::error::Error;
use crate::debugger::frame::Frame;
use crate::debugger::register::Register;
use crate::debugger::runner::{Pipeline, RunCommand, RunContext};
use crate::debugger::thread::{Thread, ThreadGroup};
use crate::debugger::types::{BreakpointChange, Movement};
use crate::debugger::variable::Variable;
use crate::debugger::Debugger;
use async_trait::async_trait;
use std::rc::{Rc, Weak};
use tokio_util::sync::CancellationToken;

/// Handle a backend uses to publish events (running, stopped, breakpoint and thread
/// registry changes, library loads, log output) into its [`Debugger`].
///
/// The handle is weak: events published after the debugger is dropped are discarded.
#[derive(Clone, Debug)]
pub struct EventSink(Weak<Debugger>);

impl EventSink {
    pub(crate) fn new(debugger: Weak<Debugger>) -> Self {
        Self(debugger)
    }

    /// Return the debugger if it is still alive.
    pub fn debugger(&self) -> Option<Rc<Debugger>> {
        self.0.upgrade()
    }

    /// Run `f` against the debugger, do nothing if it is gone.
    pub fn publish(&self, f: impl FnOnce(&Debugger)) {
        match self.0.upgrade() {
            Some(debugger) => f(&debugger),
            None => log::debug!(target: "debugger", "event dropped, debugger is gone"),
        }
    }
}

/// Concrete debugger implementation (GDB/MI, LLDB, ...).
///
/// Asynchronous operations resolve once the request is submitted to the debugger, the
/// resulting state changes arrive later as events published through [`EventSink`].
/// Every operation has a default implementation that fails with
/// [`Error::NotSupported`], so a backend implements only what it can do.
#[async_trait(?Send)]
pub trait DebuggerBackend {
    /// Human readable backend name.
    fn display_name(&self) -> Option<String> {
        None
    }

    /// Called once when the backend is wrapped into a [`Debugger`].
    fn attach(&self, _sink: EventSink) {}

    /// Return `Some(priority)` if the backend can debug the command. Lower priority wins.
    fn supports_run_command(&self, pipeline: &Pipeline, run_command: &RunCommand) -> Option<i32>;

    /// Rewrite the command line or environment before the program is spawned.
    fn prepare_for_run(&self, _pipeline: &Pipeline, _run_context: &mut RunContext) {}

    async fn move_(&self, _movement: Movement, _cancel: CancellationToken) -> Result<(), Error> {
        Err(Error::NotSupported("move"))
    }

    /// Interrupt a thread group, or every thread group if `None`.
    async fn interrupt(
        &self,
        _thread_group: Option<Rc<ThreadGroup>>,
        _cancel: CancellationToken,
    ) -> Result<(), Error> {
        Err(Error::NotSupported("interrupt"))
    }

    async fn send_signal(&self, _signum: i32, _cancel: CancellationToken) -> Result<(), Error> {
        Err(Error::NotSupported("send_signal"))
    }

    async fn insert_breakpoint(
        &self,
        _breakpoint: Rc<Breakpoint>,
        _cancel: CancellationToken,
    ) -> Result<(), Error> {
        Err(Error::NotSupported("insert_breakpoint"))
    }

    async fn remove_breakpoint(
        &self,
        _breakpoint: Rc<Breakpoint>,
        _cancel: CancellationToken,
    ) -> Result<(), Error> {
        Err(Error::NotSupported("remove_breakpoint"))
    }

    async fn modify_breakpoint(
        &self,
        _change: BreakpointChange,
        _breakpoint: Rc<Breakpoint>,
        _cancel: CancellationToken,
    ) -> Result<(), Error> {
        Err(Error::NotSupported("modify_breakpoint"))
    }

    async fn list_breakpoints(
        &self,
        _cancel: CancellationToken,
    ) -> Result<Vec<Rc<Breakpoint>>, Error> {
        Err(Error::NotSupported("list_breakpoints"))
    }

    async fn list_frames(
        &self,
        _thread: Rc<Thread>,
        _cancel: CancellationToken,
    ) -> Result<Vec<Frame>, Error> {
        Err(Error::NotSupported("list_frames"))
    }

    async fn list_locals(
        &self,
        _thread: Rc<Thread>,
        _frame: Frame,
        _cancel: CancellationToken,
    ) -> Result<Vec<Variable>, Error> {
        Err(Error::NotSupported("list_locals"))
    }

    async fn list_params(
        &self,
        _thread: Rc<Thread>,
        _frame: Frame,
        _cancel: CancellationToken,
    ) -> Result<Vec<Variable>, Error> {
        Err(Error::NotSupported("list_params"))
    }

    async fn list_registers(&self, _cancel: CancellationToken) -> Result<Vec<Register>, Error> {
        Err(Error::NotSupported("list_registers"))
    }

    async fn disassemble(
        &self,
        _range: AddressRange,
        _cancel: CancellationToken,
    ) -> Result<Vec<Instruction>, Error> {
        Err(Error::NotSupported("disassemble"))
    }

    /// Pass a raw command to the debugger, output arrives as log events.
    async fn interpret(&self, _command: String, _cancel: CancellationToken) -> Result<(), Error> {
        Err(Error::NotSupported("interpret"))
    }
}
