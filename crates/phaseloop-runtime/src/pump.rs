//! Reference frame pump
//!
//! Drives a [`DispatchTable`] the way the host drives its own structure: every
//! slot once per frame in structure order, except the FixedUpdate slot, which
//! runs once per fixed step owed by the [`FrameClock`].

use crate::clock::FrameClock;
use crate::dispatch::{DispatchSink, DispatchTable};
use phaseloop_core::{PhaseTag, Result};

/// What one pumped frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// 1-based index of the frame just completed
    pub frame: u64,
    pub fixed_steps: u32,
}

pub struct FramePump {
    table: DispatchTable,
    clock: FrameClock,
    frames: u64,
}

impl FramePump {
    pub fn new(table: DispatchTable, clock: FrameClock) -> Self {
        Self {
            table,
            clock,
            frames: 0,
        }
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Frames completed without error
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame using wall-clock time
    pub fn run_frame(&mut self) -> Result<FrameReport> {
        self.clock.tick();
        self.pump()
    }

    /// Run one frame as if `dt` seconds had passed
    pub fn step(&mut self, dt: f64) -> Result<FrameReport> {
        self.clock.advance(dt);
        self.pump()
    }

    fn pump(&mut self) -> Result<FrameReport> {
        let fixed_steps = self.clock.take_fixed_steps();
        let structure = self.table.get_phase_structure();
        for (index, tag) in structure.into_iter().enumerate() {
            let runs = if tag == PhaseTag::FixedUpdate { fixed_steps } else { 1 };
            for _ in 0..runs {
                self.table.run_slot(index)?;
            }
        }
        self.frames += 1;
        Ok(FrameReport {
            frame: self.frames,
            fixed_steps,
        })
    }
}
