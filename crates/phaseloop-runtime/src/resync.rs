//! Session resynchronizer - keeps scheduler state consistent across host rebuilds.
//!
//! When the host switches between edit and play mode it discards its dispatch
//! structure and builds a fresh one, dropping every attached callback. The
//! resynchronizer brackets that rebuild: `on_host_reset_begin` detaches
//! everything (and, under the `clear` policy, empties the registries) before
//! the old structure goes away, and `on_host_reset_end` re-verifies the new
//! structure and re-attaches the frame hook. Begin and end must be paired.

use crate::config::ResetPolicy;
use crate::dispatch::DispatchSink;
use crate::scheduler::PhaseScheduler;
use phaseloop_core::{PhaseLoopError, Result};
use std::fmt;

/// Lifecycle of a session. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Resetting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => f.write_str("uninitialized"),
            SessionState::Active => f.write_str("active"),
            SessionState::Resetting => f.write_str("resetting"),
        }
    }
}

/// Mode-change events fired by the host around a rebuild.
///
/// Raw codes match the host's event values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    EnteredEditMode = 0,
    ExitingEditMode = 1,
    EnteredPlayMode = 2,
    ExitingPlayMode = 3,
}

impl ModeTransition {
    /// True for the events fired before the host tears its structure down
    pub fn is_exiting(self) -> bool {
        matches!(
            self,
            ModeTransition::ExitingEditMode | ModeTransition::ExitingPlayMode
        )
    }
}

impl TryFrom<i32> for ModeTransition {
    type Error = PhaseLoopError;

    fn try_from(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(ModeTransition::EnteredEditMode),
            1 => Ok(ModeTransition::ExitingEditMode),
            2 => Ok(ModeTransition::EnteredPlayMode),
            3 => Ok(ModeTransition::ExitingPlayMode),
            other => Err(PhaseLoopError::UnknownModeTransition(other)),
        }
    }
}

/// Drives a [`PhaseScheduler`] through host startup and mode transitions.
#[derive(Debug)]
pub struct SessionResynchronizer {
    state: SessionState,
    policy: ResetPolicy,
    transitions: u64,
}

impl Default for SessionResynchronizer {
    fn default() -> Self {
        Self::new(ResetPolicy::default())
    }
}

impl SessionResynchronizer {
    pub fn new(policy: ResetPolicy) -> Self {
        Self {
            state: SessionState::Uninitialized,
            policy,
            transitions: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// Completed begin/end pairs
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Whether the next mode transition will be handled
    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Run once before the first frame: verify the host layout, install the
    /// frame hook, and start listening for mode transitions.
    pub fn on_startup<S: DispatchSink>(&mut self, scheduler: &mut PhaseScheduler<S>) -> Result<()> {
        self.require_state(SessionState::Uninitialized, "startup")?;
        scheduler.verify_structure()?;
        scheduler.attach_frame_hook();
        self.state = SessionState::Active;
        tracing::info!(policy = ?self.policy, "phase scheduler session started");
        Ok(())
    }

    /// The host is about to discard its dispatch structure.
    pub fn on_host_reset_begin<S: DispatchSink>(
        &mut self,
        scheduler: &mut PhaseScheduler<S>,
    ) -> Result<()> {
        self.require_state(SessionState::Active, "reset begin")?;
        let detached = scheduler.detach_all();
        let cleared = match self.policy {
            ResetPolicy::Clear => scheduler.clear_registries(),
            ResetPolicy::Reattach => 0,
        };
        self.state = SessionState::Resetting;
        tracing::info!(detached, cleared, "host reset begin");
        Ok(())
    }

    /// The host has finished building its new dispatch structure.
    pub fn on_host_reset_end<S: DispatchSink>(
        &mut self,
        scheduler: &mut PhaseScheduler<S>,
    ) -> Result<()> {
        self.require_state(SessionState::Resetting, "reset end")?;
        scheduler.verify_structure()?;
        scheduler.attach_frame_hook();
        // Under Clear this only holds what was subscribed during the reset.
        let reattached = scheduler.reattach_all();
        self.state = SessionState::Active;
        self.transitions += 1;
        tracing::info!(
            reattached,
            frame = scheduler.frame_count(),
            "host reset end"
        );
        Ok(())
    }

    /// Route a host mode event: exiting events begin a reset, entered events end it.
    pub fn handle_mode_transition<S: DispatchSink>(
        &mut self,
        event: ModeTransition,
        scheduler: &mut PhaseScheduler<S>,
    ) -> Result<()> {
        tracing::debug!(?event, state = %self.state, "mode transition");
        if event.is_exiting() {
            self.on_host_reset_begin(scheduler)
        } else {
            self.on_host_reset_end(scheduler)
        }
    }

    /// Like [`handle_mode_transition`](Self::handle_mode_transition) for a raw host event code.
    pub fn handle_raw_mode_transition<S: DispatchSink>(
        &mut self,
        raw: i32,
        scheduler: &mut PhaseScheduler<S>,
    ) -> Result<()> {
        let event = ModeTransition::try_from(raw)?;
        self.handle_mode_transition(event, scheduler)
    }

    fn require_state(&self, required: SessionState, event: &str) -> Result<()> {
        if self.state == required {
            return Ok(());
        }
        Err(PhaseLoopError::InvalidSessionTransition {
            event: event.to_string(),
            state: self.state.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Callback;
    use crate::dispatch::DispatchTable;
    use phaseloop_core::{Phase, PhaseTag};
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Callback) {
        let hits = Rc::new(Cell::new(0));
        let inner = hits.clone();
        (hits, Callback::infallible(move || inner.set(inner.get() + 1)))
    }

    fn run_frame(scheduler: &mut PhaseScheduler<DispatchTable>) {
        for phase in Phase::ALL {
            scheduler.tick(phase).unwrap();
        }
    }

    fn transition(
        session: &mut SessionResynchronizer,
        scheduler: &mut PhaseScheduler<DispatchTable>,
    ) {
        session.on_host_reset_begin(scheduler).unwrap();
        scheduler.sink().rebuild();
        session.on_host_reset_end(scheduler).unwrap();
    }

    #[test]
    fn startup_activates_and_counts_frames() {
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(!session.is_listening());

        session.on_startup(&mut scheduler).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.is_listening());
        assert!(scheduler.has_frame_hook());

        run_frame(&mut scheduler);
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn startup_fails_on_missing_phase() {
        let layout: Vec<_> = PhaseTag::DEFAULT_LAYOUT
            .into_iter()
            .filter(|tag| *tag != PhaseTag::PostLateUpdate)
            .collect();
        let mut scheduler = PhaseScheduler::new(DispatchTable::with_layout(layout));
        let mut session = SessionResynchronizer::default();

        let err = session.on_startup(&mut scheduler).unwrap_err();
        assert!(matches!(
            err,
            PhaseLoopError::IntegrityViolation {
                phase: Phase::PostLateUpdate,
                found: None,
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(!scheduler.has_frame_hook());
    }

    #[test]
    fn startup_twice_is_rejected() {
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();

        let err = session.on_startup(&mut scheduler).unwrap_err();
        assert!(matches!(err, PhaseLoopError::InvalidSessionTransition { .. }));
    }

    #[test]
    fn reset_clears_registrations_and_keeps_frame_count() {
        let (hits, cb) = counter();
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();
        let handle = scheduler.subscribe(Phase::Update, cb.clone());
        scheduler.subscribe(Phase::EarlyUpdate, cb);

        run_frame(&mut scheduler);
        run_frame(&mut scheduler);
        assert_eq!(hits.get(), 4);
        assert_eq!(scheduler.frame_count(), 2);

        transition(&mut session, &mut scheduler);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.transitions(), 1);
        assert_eq!(scheduler.registered_count(), 0);
        assert!(!scheduler.is_registered(&handle));

        run_frame(&mut scheduler);
        assert_eq!(hits.get(), 4);
        assert_eq!(scheduler.frame_count(), 3);

        // Unsubscribing a handle dropped by the reset is still harmless.
        assert!(!scheduler.unsubscribe(&handle));
    }

    #[test]
    fn ticks_during_reset_do_not_count() {
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();

        session.on_host_reset_begin(&mut scheduler).unwrap();
        scheduler.tick(Phase::Update).unwrap();
        assert_eq!(scheduler.frame_count(), 0);
        assert!(!session.is_listening());

        scheduler.sink().rebuild();
        session.on_host_reset_end(&mut scheduler).unwrap();
        scheduler.tick(Phase::Update).unwrap();
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn resubscribing_after_reset_works() {
        let (hits, cb) = counter();
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();
        scheduler.subscribe(Phase::PreUpdate, cb.clone());

        transition(&mut session, &mut scheduler);
        scheduler.subscribe(Phase::PreUpdate, cb);
        run_frame(&mut scheduler);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn reattach_policy_survives_reset() {
        let (hits, cb) = counter();
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::new(ResetPolicy::Reattach);
        session.on_startup(&mut scheduler).unwrap();
        let handle = scheduler.subscribe(Phase::PostLateUpdate, cb);

        transition(&mut session, &mut scheduler);
        assert!(scheduler.is_registered(&handle));
        assert!(scheduler
            .sink()
            .is_attached(Phase::PostLateUpdate.host_index(), handle.id()));

        run_frame(&mut scheduler);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.frame_count(), 1);
        assert_eq!(scheduler.sink().entry_count(Phase::Update.host_index()), 1);
    }

    #[test]
    fn subscribe_during_reset_fires_after_reset_end() {
        let (hits, cb) = counter();
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();

        session.on_host_reset_begin(&mut scheduler).unwrap();
        let handle = scheduler.subscribe(Phase::Update, cb);
        scheduler.sink().rebuild();
        session.on_host_reset_end(&mut scheduler).unwrap();

        assert!(scheduler.is_registered(&handle));
        assert!(scheduler
            .sink()
            .is_attached(Phase::Update.host_index(), handle.id()));
        scheduler.tick(Phase::Update).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn reattach_policy_attaches_late_subscriber_once() {
        let (hits, cb) = counter();
        let (kept_hits, kept) = counter();
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::new(ResetPolicy::Reattach);
        session.on_startup(&mut scheduler).unwrap();
        scheduler.subscribe(Phase::Update, kept);

        session.on_host_reset_begin(&mut scheduler).unwrap();
        scheduler.sink().rebuild();
        scheduler.subscribe(Phase::Update, cb);
        session.on_host_reset_end(&mut scheduler).unwrap();

        scheduler.tick(Phase::Update).unwrap();
        assert_eq!(scheduler.registry(Phase::Update).len(), 2);
        assert_eq!(hits.get(), 1);
        assert_eq!(kept_hits.get(), 1);
        // Frame hook plus the two registrations
        assert_eq!(scheduler.sink().entry_count(Phase::Update.host_index()), 3);
    }

    #[test]
    fn reset_end_rechecks_rebuilt_structure() {
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();
        session.on_host_reset_begin(&mut scheduler).unwrap();

        *scheduler.sink_mut() = DispatchTable::with_layout(vec![PhaseTag::TimeUpdate]);
        let err = session.on_host_reset_end(&mut scheduler).unwrap_err();
        assert!(matches!(err, PhaseLoopError::IntegrityViolation { .. }));
        assert_eq!(session.state(), SessionState::Resetting);
    }

    #[test]
    fn unpaired_events_are_rejected() {
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();

        assert!(session.on_host_reset_begin(&mut scheduler).is_err());
        session.on_startup(&mut scheduler).unwrap();
        assert!(matches!(
            session.on_host_reset_end(&mut scheduler),
            Err(PhaseLoopError::InvalidSessionTransition { .. })
        ));

        session.on_host_reset_begin(&mut scheduler).unwrap();
        assert!(session.on_host_reset_begin(&mut scheduler).is_err());
    }

    #[test]
    fn mode_events_drive_the_cycle() {
        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();

        for event in [
            ModeTransition::ExitingEditMode,
            ModeTransition::EnteredPlayMode,
            ModeTransition::ExitingPlayMode,
            ModeTransition::EnteredEditMode,
        ] {
            let before = session.state();
            session.handle_mode_transition(event, &mut scheduler).unwrap();
            if event.is_exiting() {
                assert_eq!(before, SessionState::Active);
                assert_eq!(session.state(), SessionState::Resetting);
                scheduler.sink().rebuild();
            } else {
                assert_eq!(session.state(), SessionState::Active);
            }
        }
        assert_eq!(session.transitions(), 2);
    }

    #[test]
    fn raw_event_codes() {
        assert_eq!(
            ModeTransition::try_from(1).unwrap(),
            ModeTransition::ExitingEditMode
        );
        assert!(matches!(
            ModeTransition::try_from(9),
            Err(PhaseLoopError::UnknownModeTransition(9))
        ));

        let mut scheduler = PhaseScheduler::new(DispatchTable::new());
        let mut session = SessionResynchronizer::default();
        session.on_startup(&mut scheduler).unwrap();
        let err = session
            .handle_raw_mode_transition(-1, &mut scheduler)
            .unwrap_err();
        assert!(matches!(err, PhaseLoopError::UnknownModeTransition(-1)));
        assert_eq!(session.state(), SessionState::Active);

        session.handle_raw_mode_transition(3, &mut scheduler).unwrap();
        assert_eq!(session.state(), SessionState::Resetting);
    }
}
