//! Host dispatch seam and the in-memory dispatch table

use crate::callback::Callback;
use phaseloop_core::{HandleId, PhaseTag, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One callback attached to a host phase slot
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    pub id: HandleId,
    pub callback: Callback,
}

impl DispatchEntry {
    pub fn new(id: HandleId, callback: Callback) -> Self {
        Self { id, callback }
    }
}

/// The host's per-phase dispatch structure, as seen by the scheduler.
///
/// Indices are positions in the host structure (see `Phase::host_index`).
/// Attaching to or detaching from an index the structure does not have is a
/// no-op; the scheduler verifies the layout before relying on indices.
pub trait DispatchSink {
    /// Identity tags of the host's phases, in host order
    fn get_phase_structure(&self) -> Vec<PhaseTag>;

    /// Append a callback to the slot at `index`
    fn attach(&mut self, index: usize, entry: DispatchEntry);

    /// Remove the most recent entry with `id` from the slot at `index`.
    /// Returns false if it was not attached.
    fn detach(&mut self, index: usize, id: HandleId) -> bool;

    /// Invoke every entry of the slot at `index`, in attach order.
    /// The first error aborts the rest of the slot.
    fn dispatch(&mut self, index: usize) -> Result<()>;
}

#[derive(Debug)]
struct PhaseSlot {
    tag: PhaseTag,
    entries: Vec<DispatchEntry>,
}

/// In-memory host dispatch structure.
///
/// Cloning yields another handle to the same table, so the scheduler and the
/// frame pump can share it. Dispatch snapshots the slot before invoking, which
/// lets callbacks subscribe or unsubscribe mid-tick; such changes apply from
/// the next tick.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    slots: Rc<RefCell<Vec<PhaseSlot>>>,
    generation: Rc<Cell<u64>>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    /// A table with the host's stock eight-slot layout
    pub fn new() -> Self {
        Self::with_layout(PhaseTag::DEFAULT_LAYOUT.to_vec())
    }

    /// A table with an arbitrary layout
    pub fn with_layout(layout: Vec<PhaseTag>) -> Self {
        let slots = layout
            .into_iter()
            .map(|tag| PhaseSlot {
                tag,
                entries: Vec::new(),
            })
            .collect();
        Self {
            slots: Rc::new(RefCell::new(slots)),
            generation: Rc::new(Cell::new(0)),
        }
    }

    /// Tear down and rebuild the structure, dropping every attached entry.
    ///
    /// This is what the host does on a mode transition.
    pub fn rebuild(&self) {
        for slot in self.slots.borrow_mut().iter_mut() {
            slot.entries.clear();
        }
        self.generation.set(self.generation.get() + 1);
        tracing::debug!(generation = self.generation.get(), "dispatch table rebuilt");
    }

    /// How many times the table has been rebuilt
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Number of entries attached at `index` (0 for unknown indices)
    pub fn entry_count(&self, index: usize) -> usize {
        self.slots
            .borrow()
            .get(index)
            .map_or(0, |slot| slot.entries.len())
    }

    pub fn is_attached(&self, index: usize, id: HandleId) -> bool {
        self.slots
            .borrow()
            .get(index)
            .is_some_and(|slot| slot.entries.iter().any(|e| e.id == id))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Invoke the slot at `index` through a shared reference.
    pub fn run_slot(&self, index: usize) -> Result<()> {
        let snapshot: Vec<Callback> = match self.slots.borrow().get(index) {
            Some(slot) => slot.entries.iter().map(|e| e.callback.clone()).collect(),
            None => return Ok(()),
        };
        for callback in &snapshot {
            callback.invoke()?;
        }
        Ok(())
    }
}

impl DispatchSink for DispatchTable {
    fn get_phase_structure(&self) -> Vec<PhaseTag> {
        self.slots.borrow().iter().map(|slot| slot.tag).collect()
    }

    fn attach(&mut self, index: usize, entry: DispatchEntry) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(index) {
            slot.entries.push(entry);
        }
    }

    fn detach(&mut self, index: usize, id: HandleId) -> bool {
        let mut slots = self.slots.borrow_mut();
        let Some(slot) = slots.get_mut(index) else {
            return false;
        };
        match slot.entries.iter().rposition(|e| e.id == id) {
            Some(pos) => {
                slot.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, index: usize) -> Result<()> {
        self.run_slot(index)
    }
}
