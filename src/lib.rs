//! Protocol independent debugger core of an IDE.
//!
//! [`debugger::Debugger`] tracks the state of a debug session reported by a concrete
//! [`debugger::DebuggerBackend`], [`debugger::DebugManager`] selects a backend for a
//! program, replays cached breakpoints into it and keeps per-file breakpoint sets
//! (queried by the editor gutter) up to date.

pub mod config;
pub mod debugger;
