use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::breakpoints::BreakpointSet;
use indexmap::IndexMap;
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Breakpoints known before (or independently of) a debugger session.
///
/// Source breakpoints are cached in per-file [`BreakpointSet`]s, breakpoints without a
/// file (address, function or expression breakpoints) wait in a FIFO queue until a
/// debugger session starts.
///
/// Index borrows are never held while a breakpoint set notifies its observers, so an
/// observer may query the index again.
#[derive(Debug, Default)]
pub struct BreakpointIndex {
    files: RefCell<IndexMap<PathBuf, Rc<BreakpointSet>>>,
    pending: RefCell<VecDeque<Rc<Breakpoint>>>,
}

impl BreakpointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return breakpoint set for a file, create an empty one if not exists.
    pub fn get_or_create_for_file(&self, file: &Path) -> Rc<BreakpointSet> {
        self.files
            .borrow_mut()
            .entry(file.to_path_buf())
            .or_insert_with(|| Rc::new(BreakpointSet::new(file)))
            .clone()
    }

    pub fn get_for_file(&self, file: &Path) -> Option<Rc<BreakpointSet>> {
        self.files.borrow().get(file).cloned()
    }

    /// Return all known breakpoint sets in creation order.
    pub fn sets(&self) -> Vec<Rc<BreakpointSet>> {
        self.files.borrow().values().cloned().collect()
    }

    pub fn queue_pending(&self, breakpoint: Rc<Breakpoint>) {
        debug!(target: "debugger", "queue pending breakpoint {breakpoint:?}");
        self.pending.borrow_mut().push_back(breakpoint);
    }

    /// Take all pending breakpoints out of the queue, in insertion order.
    pub fn drain_pending(&self) -> Vec<Rc<Breakpoint>> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> Vec<Rc<Breakpoint>> {
        self.pending.borrow().iter().cloned().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Cache a breakpoint. Return a set that was changed, `None` if the breakpoint was
    /// queued as pending.
    pub fn add(&self, breakpoint: Rc<Breakpoint>) -> Option<Rc<BreakpointSet>> {
        match breakpoint.file() {
            Some(file) => {
                let set = self.get_or_create_for_file(&file);
                set.add(breakpoint);
                Some(set)
            }
            None => {
                self.queue_pending(breakpoint);
                None
            }
        }
    }

    /// Forget a cached breakpoint. Return a set that was changed if any.
    pub fn remove(&self, breakpoint: &Breakpoint) -> Option<Rc<BreakpointSet>> {
        match breakpoint.file() {
            Some(file) => {
                let set = self.get_for_file(&file)?;
                set.remove(breakpoint);
                Some(set)
            }
            None => {
                self.pending
                    .borrow_mut()
                    .retain(|pending| !std::ptr::eq(Rc::as_ptr(pending), breakpoint));
                None
            }
        }
    }

    /// Apply a "breakpoint added" debugger event. File-less breakpoints are not cached.
    pub fn breakpoint_added(&self, breakpoint: &Rc<Breakpoint>) -> Option<Rc<BreakpointSet>> {
        let file = breakpoint.file()?;
        let set = self.get_or_create_for_file(&file);
        set.add(breakpoint.clone());
        Some(set)
    }

    /// Apply a "breakpoint removed" debugger event.
    pub fn breakpoint_removed(&self, breakpoint: &Breakpoint) -> Option<Rc<BreakpointSet>> {
        let file = breakpoint.file()?;
        let set = self.get_for_file(&file)?;
        set.remove(breakpoint);
        Some(set)
    }

    /// Apply a "breakpoint modified" debugger event, implemented as remove then add to
    /// keep line order consistent. Removal uses the current file, so a breakpoint the
    /// backend moved to another file stays in the set of its previous file as well.
    pub fn breakpoint_modified(&self, breakpoint: &Rc<Breakpoint>) -> Option<Rc<BreakpointSet>> {
        self.breakpoint_removed(breakpoint);
        self.breakpoint_added(breakpoint)
    }

    /// Visit every cached breakpoint: file sets first, then the pending queue.
    pub fn foreach(&self, mut visit: impl FnMut(&Rc<Breakpoint>)) {
        self.sets().iter().for_each(|set| set.foreach(&mut visit));
        self.pending().iter().for_each(&mut visit);
    }

    /// Clear backend identifiers of all cached breakpoints.
    pub fn reset_all(&self) {
        self.foreach(|bp| bp.reset());
    }
}
