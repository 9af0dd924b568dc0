//! phaseloop Runtime - Phase-scoped callback scheduling
//!
//! Provides the scheduling building blocks:
//! - `PhaseScheduler` - per-phase registries, subscribe/unsubscribe, frame counting
//! - `PhaseSubscriber` - explicit capability descriptor for multi-phase subscribers
//! - `SessionResynchronizer` - keeps registries consistent across host rebuilds
//! - `DispatchSink` / `DispatchTable` - host dispatch seam and its in-memory implementation
//! - `FrameClock` / `FramePump` - reference frame loop with fixed-step sub-stepping
//! - `LoopConfig` - TOML configuration

mod callback;
mod clock;
mod config;
mod dispatch;
mod pump;
mod registry;
mod resync;
mod scheduler;
mod subscriber;

pub use callback::{Callback, CallbackHandle};
pub use clock::FrameClock;
pub use config::{ClockConfig, HostConfig, LoopConfig, ResetPolicy, SessionConfig};
pub use dispatch::{DispatchEntry, DispatchSink, DispatchTable};
pub use pump::{FramePump, FrameReport};
pub use registry::PhaseRegistry;
pub use resync::{ModeTransition, SessionResynchronizer, SessionState};
pub use scheduler::PhaseScheduler;
pub use subscriber::PhaseSubscriber;
