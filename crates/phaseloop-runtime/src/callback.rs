//! Callbacks and the handles that track their registration

use phaseloop_core::{HandleId, Phase, PhaseLoopError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type CallbackFn = dyn FnMut() -> Result<()>;

/// Address of the subscriber that owns a registration, if any
pub(crate) type OwnerKey = usize;

/// A zero-argument callable that can be attached to a phase.
///
/// Clones share the same underlying closure, so identity is by reference:
/// two `Callback::new` calls over identical code are still different callbacks.
#[derive(Clone)]
pub struct Callback {
    func: Rc<RefCell<CallbackFn>>,
}

impl Callback {
    pub fn new<F>(func: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        Self {
            func: Rc::new(RefCell::new(func)),
        }
    }

    /// Wrap a callable that cannot fail
    pub fn infallible<F>(mut func: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self::new(move || {
            func();
            Ok(())
        })
    }

    /// Run the callable once. A callback that re-enters itself fails
    /// instead of panicking on the inner borrow.
    pub fn invoke(&self) -> Result<()> {
        let mut func = self.func.try_borrow_mut().map_err(|_| {
            PhaseLoopError::CallbackFailed("callback re-entered while running".to_string())
        })?;
        (&mut *func)()
    }

    /// True if both values share the same underlying callable
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.func) as *const ())
    }
}

/// Opaque handle for one registration of a callback in a phase registry.
///
/// Returned by subscribe and consumed by unsubscribe. Equality is by
/// registration, not by callable.
#[derive(Clone)]
pub struct CallbackHandle {
    id: HandleId,
    phase: Phase,
    callback: Callback,
    owner: Option<OwnerKey>,
}

impl CallbackHandle {
    pub(crate) fn new(phase: Phase, callback: Callback, owner: Option<OwnerKey>) -> Self {
        Self {
            id: HandleId::new(),
            phase,
            callback,
            owner,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The phase this handle was registered for
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn callback(&self) -> &Callback {
        &self.callback
    }

    pub(crate) fn owner(&self) -> Option<OwnerKey> {
        self.owner
    }
}

impl PartialEq for CallbackHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CallbackHandle {}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn invoke_runs_closure() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let cb = Callback::infallible(move || counter.set(counter.get() + 1));

        cb.invoke().unwrap();
        cb.invoke().unwrap();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn clones_share_identity() {
        let a = Callback::infallible(|| {});
        let b = a.clone();
        let c = Callback::infallible(|| {});
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn errors_propagate() {
        let cb = Callback::new(|| Err(PhaseLoopError::CallbackFailed("boom".into())));
        let err = cb.invoke().unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn reentrant_invoke_fails() {
        let slot: Rc<RefCell<Option<Callback>>> = Rc::new(RefCell::new(None));
        let inner = slot.clone();
        let cb = Callback::new(move || {
            let me = inner.borrow().clone();
            match me {
                Some(me) => me.invoke(),
                None => Ok(()),
            }
        });
        *slot.borrow_mut() = Some(cb.clone());

        let err = cb.invoke().unwrap_err();
        assert!(matches!(err, PhaseLoopError::CallbackFailed(_)));
    }

    #[test]
    fn handles_are_distinct_per_registration() {
        let cb = Callback::infallible(|| {});
        let first = CallbackHandle::new(Phase::Update, cb.clone(), None);
        let second = CallbackHandle::new(Phase::Update, cb, None);
        assert_ne!(first, second);
        assert!(first.callback().ptr_eq(second.callback()));
        assert_eq!(first.phase(), Phase::Update);
    }
}
