//! Per-phase registration lists

use crate::callback::{CallbackHandle, OwnerKey};
use phaseloop_core::{HandleId, Phase};

/// Ordered registrations for one phase.
///
/// Insertion order is preserved and duplicates of the same callable are
/// permitted; each entry is a distinct [`CallbackHandle`].
#[derive(Debug)]
pub struct PhaseRegistry {
    phase: Phase,
    handles: Vec<CallbackHandle>,
}

impl PhaseRegistry {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            handles: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn push(&mut self, handle: CallbackHandle) {
        debug_assert_eq!(handle.phase(), self.phase);
        self.handles.push(handle);
    }

    /// Remove the registration with the given id, if present
    pub(crate) fn remove(&mut self, id: HandleId) -> Option<CallbackHandle> {
        let pos = self.handles.iter().position(|h| h.id() == id)?;
        Some(self.handles.remove(pos))
    }

    /// Remove the most recent registration made on behalf of `owner`
    pub(crate) fn remove_last_owned(&mut self, owner: OwnerKey) -> Option<CallbackHandle> {
        let pos = self
            .handles
            .iter()
            .rposition(|h| h.owner() == Some(owner))?;
        Some(self.handles.remove(pos))
    }

    /// Take every registration, leaving the registry empty
    pub(crate) fn drain(&mut self) -> Vec<CallbackHandle> {
        std::mem::take(&mut self.handles)
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.handles.iter().any(|h| h.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallbackHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
