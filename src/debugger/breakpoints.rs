use crate::debugger::breakpoint::Breakpoint;
use crate::debugger::signal::{SubscriptionId, Subscribers};
use crate::debugger::types::BreakMode;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone)]
struct LineEntry {
    line: u32,
    mode: BreakMode,
    breakpoint: Rc<Breakpoint>,
}

/// Breakpoints of a single source file, ordered by line number.
///
/// This is the structure queried by the editor gutter on every draw, so line queries
/// are a binary search and never allocate. Structural mutations are only available
/// inside the crate, the debug manager is the single writer.
#[derive(Debug)]
pub struct BreakpointSet {
    file: PathBuf,
    /// ordered by line, at most one entry per line
    entries: RefCell<Vec<LineEntry>>,
    changed: Subscribers<()>,
}

impl BreakpointSet {
    pub(crate) fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            entries: RefCell::default(),
            changed: Subscribers::default(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn find(entries: &[LineEntry], line: u32) -> Result<usize, usize> {
        entries.binary_search_by(|e| e.line.cmp(&line))
    }

    /// Return breakpoint at the line if any.
    pub fn get_line(&self, line: u32) -> Option<Rc<Breakpoint>> {
        let entries = self.entries.borrow();
        Self::find(&entries, line)
            .ok()
            .map(|idx| entries[idx].breakpoint.clone())
    }

    /// Return breakpoint mode at the line, [`BreakMode::None`] if there is no breakpoint.
    pub fn get_line_mode(&self, line: u32) -> BreakMode {
        let entries = self.entries.borrow();
        Self::find(&entries, line)
            .map(|idx| entries[idx].mode)
            .unwrap_or(BreakMode::None)
    }

    /// Visit all breakpoints in ascending line order.
    pub fn foreach(&self, mut visit: impl FnMut(&Rc<Breakpoint>)) {
        let snapshot: Vec<Rc<Breakpoint>> = self
            .entries
            .borrow()
            .iter()
            .map(|e| e.breakpoint.clone())
            .collect();
        snapshot.iter().for_each(|bp| visit(bp));
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Subscribe to structural changes (breakpoint added, removed or replaced).
    pub fn connect_changed(&self, f: impl Fn(&()) + 'static) -> SubscriptionId {
        self.changed.subscribe(f)
    }

    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }

    /// Set line state. An existing entry is replaced, or removed if `mode` is
    /// [`BreakMode::None`]. A missing entry is inserted unless `mode` is [`BreakMode::None`].
    pub(crate) fn set_line(&self, line: u32, mode: BreakMode, breakpoint: Option<Rc<Breakpoint>>) {
        let modified = {
            let mut entries = self.entries.borrow_mut();
            match (Self::find(&entries, line), mode, breakpoint) {
                (Ok(idx), BreakMode::None, _) => {
                    entries.remove(idx);
                    true
                }
                (Ok(idx), mode, Some(breakpoint)) => {
                    entries[idx] = LineEntry {
                        line,
                        mode,
                        breakpoint,
                    };
                    true
                }
                (Err(idx), mode, Some(breakpoint)) if mode != BreakMode::None => {
                    entries.insert(
                        idx,
                        LineEntry {
                            line,
                            mode,
                            breakpoint,
                        },
                    );
                    true
                }
                _ => false,
            }
        };

        if modified {
            self.changed.emit(&());
        }
    }

    pub(crate) fn add(&self, breakpoint: Rc<Breakpoint>) {
        debug_assert_eq!(breakpoint.file().as_deref(), Some(self.file()));
        let line = breakpoint.line();
        let mode = breakpoint.mode();
        self.set_line(line, mode, Some(breakpoint));
    }

    /// Remove breakpoint. Stored breakpoints are matched by identity first (a line of
    /// breakpoint may have changed after insertion), by current line otherwise.
    pub(crate) fn remove(&self, breakpoint: &Breakpoint) {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let pos = entries
                .iter()
                .position(|e| Breakpoint::compare(&e.breakpoint, breakpoint) == Ordering::Equal);
            pos.map(|idx| entries.remove(idx)).is_some()
        };

        if removed {
            self.changed.emit(&());
        } else {
            self.set_line(breakpoint.line(), BreakMode::None, None);
        }
    }

    #[cfg(test)]
    fn contains(&self, breakpoint: &Breakpoint) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| std::ptr::eq(Rc::as_ptr(&e.breakpoint), breakpoint))
    }
}
