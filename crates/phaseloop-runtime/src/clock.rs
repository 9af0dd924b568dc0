//! Frame clock with fixed-timestep accumulator

use crate::config::ClockConfig;
use std::time::Instant;

/// Tracks frame time and decides how many FixedUpdate steps each frame runs
pub struct FrameClock {
    /// Total elapsed time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Fixed timestep interval (default: 1/60 second)
    pub fixed_timestep: f64,
    /// Longest frame time accepted into the accumulator
    pub max_frame_time: f64,
    /// Cap on fixed steps per frame; any backlog beyond it is dropped
    pub max_fixed_steps: u32,
    /// Accumulated time for fixed-step consumption
    accumulator: f64,
    /// Last tick instant
    last_instant: Instant,
    /// Whether this is the first tick
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::from_config(&ClockConfig::default())
    }
}

impl FrameClock {
    /// Create a new frame clock with default 60Hz fixed timestep
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame clock with a custom fixed timestep
    pub fn with_fixed_timestep(hz: f64) -> Self {
        Self {
            fixed_timestep: 1.0 / hz,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            fixed_timestep: 1.0 / config.fixed_hz,
            max_frame_time: config.max_frame_time,
            max_fixed_steps: config.max_fixed_steps,
            accumulator: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }

    /// Advance by wall-clock time. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.advance(elapsed);
    }

    /// Advance by an explicit frame time, for deterministic stepping.
    pub fn advance(&mut self, dt: f64) {
        // Clamp to avoid spiral of death
        self.delta_time = dt.clamp(0.0, self.max_frame_time);
        self.total_time += self.delta_time;
        self.accumulator += self.delta_time;
        self.first_tick = false;
    }

    /// Consume the fixed steps owed for this frame (possibly zero).
    pub fn take_fixed_steps(&mut self) -> u32 {
        let mut steps = 0;
        while self.accumulator >= self.fixed_timestep && steps < self.max_fixed_steps {
            self.accumulator -= self.fixed_timestep;
            steps += 1;
        }
        if self.accumulator >= self.fixed_timestep {
            tracing::warn!(
                dropped = self.accumulator,
                max_fixed_steps = self.max_fixed_steps,
                "fixed-step backlog dropped"
            );
            self.accumulator %= self.fixed_timestep;
        }
        steps
    }

    /// Get the interpolation alpha for rendering between fixed steps
    pub fn interpolation_alpha(&self) -> f64 {
        self.accumulator / self.fixed_timestep
    }
}
