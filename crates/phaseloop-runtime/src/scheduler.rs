//! Phase scheduler: registries, dispatch wiring, and frame counting

use crate::callback::{Callback, CallbackHandle, OwnerKey};
use crate::dispatch::{DispatchEntry, DispatchSink};
use crate::registry::PhaseRegistry;
use crate::subscriber::PhaseSubscriber;
use phaseloop_core::{HandleId, Phase, PhaseLoopError, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Keeps one registry per phase and mirrors it into the host dispatch sink.
///
/// The frame counter is advanced by a hook attached to the host's Update
/// slot like any other callback; it is installed by the session
/// resynchronizer on startup and after every host rebuild.
pub struct PhaseScheduler<S: DispatchSink> {
    sink: S,
    registries: [PhaseRegistry; Phase::COUNT],
    frame: Rc<Cell<u64>>,
    frame_hook: Option<HandleId>,
    /// False between `detach_all` and `reattach_all`; registrations made
    /// meanwhile stay in the registries only.
    attached: bool,
}

impl<S: DispatchSink> PhaseScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            registries: Phase::ALL.map(PhaseRegistry::new),
            frame: Rc::new(Cell::new(0)),
            frame_hook: None,
            attached: true,
        }
    }

    /// Register `callback` for `phase`. Always succeeds; registering the same
    /// callback twice produces two independent entries.
    pub fn subscribe(&mut self, phase: Phase, callback: Callback) -> CallbackHandle {
        self.register(phase, callback, None)
    }

    /// Remove a registration. Returns false (and does nothing) if the handle
    /// is not currently registered.
    pub fn unsubscribe(&mut self, handle: &CallbackHandle) -> bool {
        let phase = handle.phase();
        if self.attached {
            self.sink.detach(phase.host_index(), handle.id());
        }
        match self.registries[phase.ordinal()].remove(handle.id()) {
            Some(_) => {
                tracing::debug!(%phase, id = %handle.id(), "unsubscribed");
                true
            }
            None => {
                tracing::trace!(%phase, id = %handle.id(), "unsubscribe of unregistered handle ignored");
                false
            }
        }
    }

    /// Subscribe every phase method the subscriber declares in its capabilities.
    ///
    /// The registrations keep the subscriber alive until they are removed.
    pub fn subscribe_all<T>(&mut self, subscriber: &Rc<RefCell<T>>) -> Vec<CallbackHandle>
    where
        T: PhaseSubscriber + 'static,
    {
        let capabilities = subscriber.borrow().capabilities();
        if capabilities.is_empty() {
            tracing::warn!("subscriber declares no phase capabilities; nothing subscribed");
        }
        let owner = owner_key(subscriber);
        capabilities
            .phases()
            .map(|phase| {
                let target = Rc::clone(subscriber);
                let callback = Callback::new(move || {
                    let mut target = target.try_borrow_mut().map_err(|_| {
                        PhaseLoopError::CallbackFailed(format!(
                            "subscriber already borrowed during {phase}"
                        ))
                    })?;
                    target.run_phase(phase)
                });
                self.register(phase, callback, Some(owner))
            })
            .collect()
    }

    /// Undo one `subscribe_all`: for each declared phase, remove the most
    /// recent registration owned by this subscriber. Returns how many were removed.
    pub fn unsubscribe_all<T>(&mut self, subscriber: &Rc<RefCell<T>>) -> usize
    where
        T: PhaseSubscriber + 'static,
    {
        let owner = owner_key(subscriber);
        let capabilities = subscriber.borrow().capabilities();
        let mut removed = 0;
        for phase in capabilities.phases() {
            if let Some(handle) = self.registries[phase.ordinal()].remove_last_owned(owner) {
                if self.attached {
                    self.sink.detach(phase.host_index(), handle.id());
                }
                removed += 1;
            }
        }
        tracing::debug!(removed, "subscriber unsubscribed");
        removed
    }

    /// Host-side: invoke everything attached for `phase`, in registration order.
    ///
    /// The first failing callback aborts the rest of the tick and its error is
    /// returned unchanged.
    ///
    /// This borrows the scheduler mutably for the whole dispatch, so a callback
    /// that subscribes or unsubscribes through a shared scheduler must be run
    /// by the host side instead (`DispatchTable::run_slot` or a `FramePump`).
    pub fn tick(&mut self, phase: Phase) -> Result<()> {
        self.sink.dispatch(phase.host_index())
    }

    /// Number of Update ticks observed since startup
    pub fn frame_count(&self) -> u64 {
        self.frame.get()
    }

    pub fn registry(&self, phase: Phase) -> &PhaseRegistry {
        &self.registries[phase.ordinal()]
    }

    pub fn is_registered(&self, handle: &CallbackHandle) -> bool {
        self.registry(handle.phase()).contains(handle.id())
    }

    /// Total registrations across all phases
    pub fn registered_count(&self) -> usize {
        self.registries.iter().map(PhaseRegistry::len).sum()
    }

    pub fn has_frame_hook(&self) -> bool {
        self.frame_hook.is_some()
    }

    /// Whether registrations are currently mirrored into the sink
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Check that the host structure carries the six phases at their indices.
    pub fn verify_structure(&self) -> Result<()> {
        let structure = self.sink.get_phase_structure();
        for phase in Phase::ALL {
            let index = phase.host_index();
            let found = structure.get(index).copied();
            if found != Some(phase.tag()) {
                let err = PhaseLoopError::IntegrityViolation {
                    phase,
                    index,
                    expected: phase.tag(),
                    found,
                };
                tracing::error!(%err, "host phase structure check failed");
                return Err(err);
            }
        }
        Ok(())
    }

    pub(crate) fn attach_frame_hook(&mut self) {
        self.detach_frame_hook();
        let id = HandleId::new();
        let frame = Rc::clone(&self.frame);
        let hook = Callback::infallible(move || frame.set(frame.get() + 1));
        self.sink
            .attach(Phase::Update.host_index(), DispatchEntry::new(id, hook));
        self.frame_hook = Some(id);
        tracing::debug!(%id, "frame hook attached");
    }

    pub(crate) fn detach_frame_hook(&mut self) {
        if let Some(id) = self.frame_hook.take() {
            self.sink.detach(Phase::Update.host_index(), id);
        }
    }

    /// Detach the frame hook and every registration from the sink, keeping
    /// the registries as they are.
    pub(crate) fn detach_all(&mut self) -> usize {
        self.detach_frame_hook();
        if !self.attached {
            return 0;
        }
        self.attached = false;
        let mut detached = 0;
        for registry in &self.registries {
            let index = registry.phase().host_index();
            for handle in registry.iter() {
                if self.sink.detach(index, handle.id()) {
                    detached += 1;
                }
            }
        }
        detached
    }

    /// Drop every registration. Returns how many were dropped.
    pub(crate) fn clear_registries(&mut self) -> usize {
        self.registries
            .iter_mut()
            .map(|registry| registry.drain().len())
            .sum()
    }

    /// Attach every registration to the sink, in registry order. Does nothing
    /// unless the registrations were detached first.
    pub(crate) fn reattach_all(&mut self) -> usize {
        if self.attached {
            return 0;
        }
        self.attached = true;
        let mut attached = 0;
        for registry in &self.registries {
            let index = registry.phase().host_index();
            for handle in registry.iter() {
                self.sink
                    .attach(index, DispatchEntry::new(handle.id(), handle.callback().clone()));
                attached += 1;
            }
        }
        attached
    }

    fn register(
        &mut self,
        phase: Phase,
        callback: Callback,
        owner: Option<OwnerKey>,
    ) -> CallbackHandle {
        let handle = CallbackHandle::new(phase, callback, owner);
        if self.attached {
            self.sink.attach(
                phase.host_index(),
                DispatchEntry::new(handle.id(), handle.callback().clone()),
            );
        }
        self.registries[phase.ordinal()].push(handle.clone());
        tracing::debug!(%phase, id = %handle.id(), attached = self.attached, "subscribed");
        handle
    }
}

fn owner_key<T>(subscriber: &Rc<RefCell<T>>) -> OwnerKey {
    Rc::as_ptr(subscriber) as usize
}
