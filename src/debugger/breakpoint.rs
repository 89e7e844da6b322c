use crate::debugger::address::Address;
use crate::debugger::signal::{SubscriptionId, Subscribers};
use crate::debugger::types::{BreakMode, Disposition};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use strum_macros::Display;

/// Breakpoint field that was changed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BreakpointProperty {
    Id,
    Address,
    File,
    Line,
    Function,
    Spec,
    Thread,
    Mode,
    Disposition,
    Enabled,
    Count,
}

/// Breakpoint, countpoint or watchpoint description.
///
/// Breakpoints are shared between the per-file breakpoint sets, the pending queue and
/// the debugger registry as `Rc<Breakpoint>`, so all fields are interior mutable.
/// Every setter notifies subscribers, but only if the value actually changes.
pub struct Breakpoint {
    /// Backend assigned identifier, `None` until the backend knows this breakpoint.
    id: RefCell<Option<String>>,
    address: Cell<Address>,
    file: RefCell<Option<PathBuf>>,
    /// 1-based, zero means unset.
    line: Cell<u32>,
    function: RefCell<Option<String>>,
    /// Watched expression.
    spec: RefCell<Option<String>>,
    thread: RefCell<Option<String>>,
    mode: Cell<BreakMode>,
    disposition: Cell<Disposition>,
    enabled: Cell<bool>,
    /// Hit counter.
    count: Cell<i64>,
    notify: Subscribers<BreakpointProperty>,
}

impl Default for Breakpoint {
    fn default() -> Self {
        Self::new(None::<String>)
    }
}

impl Debug for Breakpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breakpoint")
            .field("id", &self.id.borrow())
            .field("address", &self.address.get())
            .field("file", &self.file.borrow())
            .field("line", &self.line.get())
            .field("function", &self.function.borrow())
            .field("mode", &self.mode.get())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}

macro_rules! cell_setter {
    ($setter: ident, $field: ident, $ty: ty, $prop: expr) => {
        pub fn $setter(&self, value: $ty) {
            if self.$field.get() != value {
                self.$field.set(value);
                self.notify.emit(&$prop);
            }
        }
    };
}

macro_rules! string_setter {
    ($setter: ident, $field: ident, $prop: expr) => {
        pub fn $setter(&self, value: Option<&str>) {
            if self.$field.borrow().as_deref() != value {
                *self.$field.borrow_mut() = value.map(ToString::to_string);
                self.notify.emit(&$prop);
            }
        }
    };
}

impl Breakpoint {
    pub fn new(id: Option<impl Into<String>>) -> Self {
        Self {
            id: RefCell::new(id.map(Into::into)),
            address: Cell::new(Address::INVALID),
            file: RefCell::default(),
            line: Cell::new(0),
            function: RefCell::default(),
            spec: RefCell::default(),
            thread: RefCell::default(),
            mode: Cell::new(BreakMode::Breakpoint),
            disposition: Cell::new(Disposition::Keep),
            enabled: Cell::new(true),
            count: Cell::new(0),
            notify: Subscribers::default(),
        }
    }

    /// Create a not yet registered breakpoint at the source line.
    pub fn at_line(file: impl Into<PathBuf>, line: u32) -> Rc<Self> {
        let bp = Self::new(None::<String>);
        *bp.file.borrow_mut() = Some(file.into());
        bp.line.set(line);
        Rc::new(bp)
    }

    /// Create a not yet registered breakpoint at the function entry.
    pub fn at_function(function: impl Into<String>) -> Rc<Self> {
        let bp = Self::new(None::<String>);
        *bp.function.borrow_mut() = Some(function.into());
        Rc::new(bp)
    }

    /// Create a not yet registered breakpoint at the address.
    pub fn at_address(address: Address) -> Rc<Self> {
        let bp = Self::new(None::<String>);
        bp.address.set(address);
        Rc::new(bp)
    }

    pub fn id(&self) -> Option<String> {
        self.id.borrow().clone()
    }

    pub fn has_id(&self) -> bool {
        self.id.borrow().is_some()
    }

    pub fn address(&self) -> Address {
        self.address.get()
    }

    pub fn file(&self) -> Option<PathBuf> {
        self.file.borrow().clone()
    }

    /// Return true if the breakpoint has no source file (address, function or expression
    /// breakpoints).
    pub fn is_file_less(&self) -> bool {
        self.file.borrow().is_none()
    }

    pub fn line(&self) -> u32 {
        self.line.get()
    }

    pub fn function(&self) -> Option<String> {
        self.function.borrow().clone()
    }

    pub fn spec(&self) -> Option<String> {
        self.spec.borrow().clone()
    }

    pub fn thread(&self) -> Option<String> {
        self.thread.borrow().clone()
    }

    pub fn mode(&self) -> BreakMode {
        self.mode.get()
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition.get()
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn count(&self) -> i64 {
        self.count.get()
    }

    cell_setter!(set_address, address, Address, BreakpointProperty::Address);
    cell_setter!(set_line, line, u32, BreakpointProperty::Line);
    cell_setter!(set_mode, mode, BreakMode, BreakpointProperty::Mode);
    cell_setter!(
        set_disposition,
        disposition,
        Disposition,
        BreakpointProperty::Disposition
    );
    cell_setter!(set_enabled, enabled, bool, BreakpointProperty::Enabled);
    cell_setter!(set_count, count, i64, BreakpointProperty::Count);

    string_setter!(set_id, id, BreakpointProperty::Id);
    string_setter!(set_function, function, BreakpointProperty::Function);
    string_setter!(set_spec, spec, BreakpointProperty::Spec);
    string_setter!(set_thread, thread, BreakpointProperty::Thread);

    pub fn set_file(&self, file: Option<&Path>) {
        if self.file.borrow().as_deref() != file {
            *self.file.borrow_mut() = file.map(Path::to_path_buf);
            self.notify.emit(&BreakpointProperty::File);
        }
    }

    /// Forget backend assigned identifier. Called when a debugger session ends so
    /// the breakpoint may be registered within the next one.
    pub fn reset(&self) {
        if self.id.borrow_mut().take().is_some() {
            self.notify.emit(&BreakpointProperty::Id);
        }
    }

    /// Subscribe to field changes.
    pub fn connect_notify(&self, f: impl Fn(&BreakpointProperty) + 'static) -> SubscriptionId {
        self.notify.subscribe(f)
    }

    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        self.notify.unsubscribe(id)
    }

    /// Total order of breakpoints.
    ///
    /// Breakpoints without identifiers are ordered by object identity. Identifiers that both
    /// begin with a digit are compared numerically (so "3" < "10"), others as strings.
    pub fn compare(a: &Breakpoint, b: &Breakpoint) -> Ordering {
        if std::ptr::eq(a, b) {
            return Ordering::Equal;
        }

        let a_id = a.id.borrow();
        let b_id = b.id.borrow();
        match (a_id.as_deref(), b_id.as_deref()) {
            (None, None) => (a as *const Breakpoint).cmp(&(b as *const Breakpoint)),
            (Some(a_id), Some(b_id)) => compare_ids(a_id, b_id),
            (a_id, b_id) => a_id.cmp(&b_id),
        }
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

/// Parse decimal digits at the start of string, like `strtoll` does.
fn leading_number(s: &str) -> i64 {
    s.bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_i64, |acc, b| {
            acc.saturating_mul(10).saturating_add((b - b'0') as i64)
        })
}

/// Compare two identifiers: numerically if both begin with a digit, lexicographically
/// otherwise.
pub(crate) fn compare_ids(a: &str, b: &str) -> Ordering {
    if starts_with_digit(a) && starts_with_digit(b) {
        leading_number(a).cmp(&leading_number(b))
    } else {
        a.cmp(b)
    }
}
