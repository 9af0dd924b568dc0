//! Run command - pumps frames through the reference host with a logging subscriber

use anyhow::{Context, Result};
use phaseloop_core::{Phase, PhaseLoopError, PhaseSet};
use phaseloop_runtime::{
    DispatchTable, FrameClock, FramePump, ModeTransition, PhaseScheduler, PhaseSubscriber,
    ResetPolicy, SessionResynchronizer,
};
use std::cell::RefCell;
use std::rc::Rc;

pub struct RunArgs {
    pub config: Option<String>,
    pub frames: u64,
    pub dt: f64,
    pub transition_every: Option<u64>,
    pub resubscribe: bool,
    pub fail_at: Option<u64>,
}

/// Demo subscriber that logs every phase it receives and counts calls.
struct PhaseLogger {
    calls: [u64; Phase::COUNT],
    updates: u64,
    fail_at: Option<u64>,
}

impl PhaseLogger {
    fn new(fail_at: Option<u64>) -> Self {
        Self {
            calls: [0; Phase::COUNT],
            updates: 0,
            fail_at,
        }
    }

    fn record(&mut self, phase: Phase) {
        self.calls[phase.ordinal()] += 1;
        tracing::debug!(%phase, count = self.calls[phase.ordinal()], "phase callback");
    }
}

impl PhaseSubscriber for PhaseLogger {
    fn capabilities(&self) -> PhaseSet {
        PhaseSet::all()
    }

    fn on_early_update(&mut self) -> phaseloop_core::Result<()> {
        self.record(Phase::EarlyUpdate);
        Ok(())
    }

    fn on_fixed_update(&mut self) -> phaseloop_core::Result<()> {
        self.record(Phase::FixedUpdate);
        Ok(())
    }

    fn on_pre_update(&mut self) -> phaseloop_core::Result<()> {
        self.record(Phase::PreUpdate);
        Ok(())
    }

    fn on_update(&mut self) -> phaseloop_core::Result<()> {
        self.record(Phase::Update);
        self.updates += 1;
        if self.fail_at == Some(self.updates) {
            return Err(PhaseLoopError::CallbackFailed(format!(
                "demo subscriber failed on its update #{}",
                self.updates
            )));
        }
        Ok(())
    }

    fn on_pre_late_update(&mut self) -> phaseloop_core::Result<()> {
        self.record(Phase::PreLateUpdate);
        Ok(())
    }

    fn on_post_late_update(&mut self) -> phaseloop_core::Result<()> {
        self.record(Phase::PostLateUpdate);
        Ok(())
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;

    let table = DispatchTable::with_layout(config.host.layout.clone());
    let mut scheduler = PhaseScheduler::new(table.clone());
    let mut session = SessionResynchronizer::new(config.session.reset_policy);
    session
        .on_startup(&mut scheduler)
        .context("Failed to start phase scheduler session")?;

    let mut pump = FramePump::new(table, FrameClock::from_config(&config.clock));
    let logger = Rc::new(RefCell::new(PhaseLogger::new(args.fail_at)));
    scheduler.subscribe_all(&logger);

    let mut in_play_mode = false;
    for _ in 0..args.frames {
        let report = pump
            .step(args.dt)
            .with_context(|| format!("Frame {} failed", pump.frames() + 1))?;
        tracing::debug!(frame = report.frame, fixed_steps = report.fixed_steps, "frame done");

        let due = args
            .transition_every
            .is_some_and(|every| every > 0 && report.frame % every == 0);
        if !due {
            continue;
        }

        let (exiting, entered) = if in_play_mode {
            (ModeTransition::ExitingPlayMode, ModeTransition::EnteredEditMode)
        } else {
            (ModeTransition::ExitingEditMode, ModeTransition::EnteredPlayMode)
        };
        session.handle_mode_transition(exiting, &mut scheduler)?;
        pump.table().rebuild();
        session.handle_mode_transition(entered, &mut scheduler)?;
        in_play_mode = !in_play_mode;

        if args.resubscribe && config.session.reset_policy == ResetPolicy::Clear {
            scheduler.subscribe_all(&logger);
        }
    }

    let logger = logger.borrow();
    println!("Frames pumped:      {}", pump.frames());
    println!("Frame counter:      {}", scheduler.frame_count());
    println!("Mode transitions:   {}", session.transitions());
    println!("Still subscribed:   {}", scheduler.registered_count());
    println!();
    println!("Callbacks received:");
    for phase in Phase::ALL {
        println!("  {:<15} {}", phase.as_str(), logger.calls[phase.ordinal()]);
    }
    Ok(())
}
