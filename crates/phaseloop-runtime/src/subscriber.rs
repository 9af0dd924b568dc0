//! Subscriber capability trait

use phaseloop_core::{Phase, PhaseSet, Result};

/// An object that receives per-phase callbacks.
///
/// `capabilities` declares which phases the subscriber implements; only those
/// phases are wired by `PhaseScheduler::subscribe_all`. The phase methods
/// default to doing nothing, so implementors override just the ones they
/// declare.
pub trait PhaseSubscriber {
    /// Phases this subscriber provides callbacks for
    fn capabilities(&self) -> PhaseSet;

    fn on_early_update(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called zero or more times per frame, once per fixed step
    fn on_fixed_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_pre_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_pre_late_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_post_late_update(&mut self) -> Result<()> {
        Ok(())
    }

    /// Route a phase to its method
    fn run_phase(&mut self, phase: Phase) -> Result<()> {
        match phase {
            Phase::EarlyUpdate => self.on_early_update(),
            Phase::FixedUpdate => self.on_fixed_update(),
            Phase::PreUpdate => self.on_pre_update(),
            Phase::Update => self.on_update(),
            Phase::PreLateUpdate => self.on_pre_late_update(),
            Phase::PostLateUpdate => self.on_post_late_update(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tracker {
        seen: Vec<Phase>,
    }

    impl PhaseSubscriber for Tracker {
        fn capabilities(&self) -> PhaseSet {
            PhaseSet::all()
        }

        fn on_early_update(&mut self) -> Result<()> {
            self.seen.push(Phase::EarlyUpdate);
            Ok(())
        }

        fn on_fixed_update(&mut self) -> Result<()> {
            self.seen.push(Phase::FixedUpdate);
            Ok(())
        }

        fn on_pre_update(&mut self) -> Result<()> {
            self.seen.push(Phase::PreUpdate);
            Ok(())
        }

        fn on_update(&mut self) -> Result<()> {
            self.seen.push(Phase::Update);
            Ok(())
        }

        fn on_pre_late_update(&mut self) -> Result<()> {
            self.seen.push(Phase::PreLateUpdate);
            Ok(())
        }

        fn on_post_late_update(&mut self) -> Result<()> {
            self.seen.push(Phase::PostLateUpdate);
            Ok(())
        }
    }

    struct UpdateOnly;

    impl PhaseSubscriber for UpdateOnly {
        fn capabilities(&self) -> PhaseSet {
            PhaseSet::UPDATE
        }
    }

    #[test]
    fn run_phase_routes_to_matching_method() {
        let mut tracker = Tracker::default();
        for phase in Phase::ALL {
            tracker.run_phase(phase).unwrap();
        }
        assert_eq!(tracker.seen, Phase::ALL.to_vec());
    }

    #[test]
    fn default_methods_are_noops() {
        let mut sub = UpdateOnly;
        for phase in Phase::ALL {
            assert!(sub.run_phase(phase).is_ok());
        }
        assert_eq!(sub.capabilities().phases().collect::<Vec<_>>(), vec![Phase::Update]);
    }
}
