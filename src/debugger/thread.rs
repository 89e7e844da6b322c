use crate::debugger::breakpoint::compare_ids;
use std::cell::RefCell;
use std::cmp::Ordering;

/// Inferior thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    /// Identifier of the owning thread group.
    pub group: Option<String>,
}

impl Thread {
    pub fn new(id: impl Into<String>, group: Option<&str>) -> Self {
        Self {
            id: id.into(),
            group: group.map(ToString::to_string),
        }
    }

    /// Numeric order if both ids are numbers, lexicographic otherwise.
    pub fn compare(a: &Thread, b: &Thread) -> Ordering {
        compare_ids(&a.id, &b.id)
    }
}

/// Group of threads, typically a single inferior process.
#[derive(Debug)]
pub struct ThreadGroup {
    id: String,
    pid: RefCell<Option<String>>,
    exit_code: RefCell<Option<String>>,
}

impl ThreadGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pid: RefCell::default(),
            exit_code: RefCell::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pid(&self) -> Option<String> {
        self.pid.borrow().clone()
    }

    pub fn set_pid(&self, pid: Option<&str>) {
        *self.pid.borrow_mut() = pid.map(ToString::to_string);
    }

    pub fn exit_code(&self) -> Option<String> {
        self.exit_code.borrow().clone()
    }

    pub fn set_exit_code(&self, exit_code: Option<&str>) {
        *self.exit_code.borrow_mut() = exit_code.map(ToString::to_string);
    }

    pub fn compare(a: &ThreadGroup, b: &ThreadGroup) -> Ordering {
        compare_ids(&a.id, &b.id)
    }
}
