use crate::debugger::address::Address;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

/// Single mapped region of the inferior address space.
///
/// Used both as an insertion request and as a lookup result, in the latter case
/// `filename` borrows from the map string pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressMapEntry<'a> {
    /// File backing the region.
    pub filename: &'a str,
    /// Offset of the region inside the file.
    pub offset: u64,
    /// Region start (inclusive).
    pub start: Address,
    /// Region end (exclusive).
    pub end: Address,
}

#[derive(Debug)]
struct Slot {
    filename: DefaultSymbol,
    offset: u64,
    start: Address,
    end: Address,
}

impl Slot {
    fn contains(&self, addr: Address) -> bool {
        self.start <= addr && addr < self.end
    }
}

/// Sorted index of `[start, end)` address ranges.
///
/// File names are copied into an internal string pool so that many regions of the
/// same library share a single allocation.
#[derive(Debug)]
pub struct AddressRangeMap {
    pool: StringInterner<DefaultBackend>,
    /// ordered by `start`
    slots: Vec<Slot>,
    /// Length of the longest region ever inserted, bounds the backward scan of a lookup.
    max_span: u64,
}

impl Default for AddressRangeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressRangeMap {
    pub fn new() -> Self {
        Self {
            pool: StringInterner::new(),
            slots: vec![],
            max_span: 0,
        }
    }

    /// Insert a new region. Ranges with an equal start are placed after already
    /// known ones, overlapped ranges are kept as is.
    pub fn insert(&mut self, entry: AddressMapEntry<'_>) {
        let filename = self.pool.get_or_intern(entry.filename);
        let span = entry.end.as_u64().saturating_sub(entry.start.as_u64());
        self.max_span = self.max_span.max(span);
        let pos = self.slots.partition_point(|s| s.start <= entry.start);
        self.slots.insert(
            pos,
            Slot {
                filename,
                offset: entry.offset,
                start: entry.start,
                end: entry.end,
            },
        );
    }

    /// Return index of the region with the nearest start that contains the address.
    /// Only regions starting less than `max_span` below the address are scanned.
    fn find(&self, addr: Address) -> Option<usize> {
        let upper = self.slots.partition_point(|s| s.start <= addr);
        (0..upper)
            .rev()
            .take_while(|&idx| addr.as_u64() - self.slots[idx].start.as_u64() < self.max_span)
            .find(|&idx| self.slots[idx].contains(addr))
    }

    fn view(&self, slot: &Slot) -> AddressMapEntry<'_> {
        AddressMapEntry {
            filename: self
                .pool
                .resolve(slot.filename)
                .expect("infallible: symbol produced by this pool"),
            offset: slot.offset,
            start: slot.start,
            end: slot.end,
        }
    }

    /// Return region which contains the address. If overlapped regions contain it, the
    /// one with the greatest start wins, the latest inserted among equal starts.
    ///
    /// # Arguments
    ///
    /// * `addr`: address in the inferior process space
    pub fn lookup(&self, addr: Address) -> Option<AddressMapEntry<'_>> {
        let idx = self.find(addr)?;
        Some(self.view(&self.slots[idx]))
    }

    /// Remove region which contains the address. Return `true` if a region was removed.
    pub fn remove(&mut self, addr: Address) -> bool {
        match self.find(addr) {
            Some(idx) => {
                self.slots.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over regions in ascending `start` order.
    pub fn iter(&self) -> impl Iterator<Item = AddressMapEntry<'_>> {
        self.slots.iter().map(|s| self.view(s))
    }
}
