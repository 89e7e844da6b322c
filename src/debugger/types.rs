use strum_macros::{Display, EnumString, IntoStaticStr};

/// Classified cause of a debugger pause.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum StopReason {
    BreakpointHit,
    Exited,
    ExitedNormally,
    ExitedSignaled,
    FunctionFinished,
    LocationReached,
    SignalReceived,
    Catch,
    Unknown,
}

impl StopReason {
    /// Return true if the inferior process is gone after this stop.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StopReason::Exited | StopReason::ExitedNormally | StopReason::ExitedSignaled
        )
    }

    /// Return true if the stop location deserves a "breakpoint reached" notification.
    pub fn reaches_breakpoint(self) -> bool {
        !self.is_terminal()
    }

    /// Map a GDB/MI `reason` field into a stop reason.
    /// Catchpoint-like reasons (shared library events, forks, syscalls, exec) are
    /// reported as [`StopReason::Catch`], anything unrecognized as [`StopReason::Unknown`].
    pub fn from_mi_reason(reason: Option<&str>) -> Self {
        let Some(reason) = reason else {
            return StopReason::Unknown;
        };
        match reason {
            "solib-event" | "fork" | "vfork" | "syscall-entry" | "syscall-return" | "exec" => {
                StopReason::Catch
            }
            other => other.parse().unwrap_or(StopReason::Unknown),
        }
    }
}

/// Requested inferior movement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Movement {
    Start,
    Continue,
    StepIn,
    StepOver,
    Finish,
}

/// Breakpoint flavour.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BreakMode {
    None,
    #[default]
    Breakpoint,
    Countpoint,
    Watchpoint,
}

impl BreakMode {
    /// Map a GDB/MI breakpoint `type` field, unknown or absent types are plain breakpoints.
    pub fn from_mi(kind: Option<&str>) -> Self {
        match kind {
            Some("countpoint") => BreakMode::Countpoint,
            Some("watchpoint") => BreakMode::Watchpoint,
            _ => BreakMode::Breakpoint,
        }
    }
}

/// What happens with a breakpoint after it is hit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Display)]
pub enum Disposition {
    #[default]
    Keep,
    Disable,
    DeleteNextHit,
    DeleteNextStop,
}

impl Disposition {
    /// Map a GDB/MI breakpoint `disp` field.
    pub fn from_mi(disp: Option<&str>) -> Self {
        match disp {
            Some("dis") => Disposition::Disable,
            Some("del") => Disposition::DeleteNextHit,
            Some("dstp") => Disposition::DeleteNextStop,
            _ => Disposition::Keep,
        }
    }
}

/// Output channel of a debugger backend.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Stream {
    /// Output of the debugger itself.
    Console,
    /// Asynchronous debugger notifications.
    Event,
    /// Output of the inferior process.
    Target,
}

/// Kind of breakpoint modification request.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum BreakpointChange {
    Enabled,
}

/// Debugger life state, derived from `has_started` and `is_running` flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum DebuggerState {
    NotStarted,
    Running,
    Stopped,
}

impl DebuggerState {
    pub fn from_flags(has_started: bool, is_running: bool) -> Self {
        match (has_started, is_running) {
            (false, _) => DebuggerState::NotStarted,
            (true, true) => DebuggerState::Running,
            (true, false) => DebuggerState::Stopped,
        }
    }
}
