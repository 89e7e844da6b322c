use crate::debugger::address::AddressRange;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Shared library loaded into the inferior address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Library {
    pub id: String,
    /// Path on the host system.
    pub host_name: Option<String>,
    /// Path as seen by the inferior.
    pub target_name: Option<String>,
    /// Mapped address ranges, most libraries have one or two.
    pub ranges: SmallVec<[AddressRange; 2]>,
}

impl Library {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host_name: None,
            target_name: None,
            ranges: SmallVec::new(),
        }
    }

    pub fn with_target_name(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = Some(target_name.into());
        self
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn add_range(&mut self, range: AddressRange) {
        self.ranges.push(range);
    }

    /// Name used in the address map: target name, or identifier if the target name is unknown.
    pub fn map_name(&self) -> &str {
        self.target_name.as_deref().unwrap_or(&self.id)
    }

    pub fn compare(a: &Library, b: &Library) -> Ordering {
        a.id.cmp(&b.id)
    }
}
