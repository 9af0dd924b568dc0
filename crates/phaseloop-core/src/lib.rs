//! phaseloop Core - Foundational types for the phase scheduler
//!
//! This crate provides the types every other phaseloop crate depends on:
//! - `Phase` - The six subscribable frame phases
//! - `PhaseTag` - Identity tags of the host dispatch structure
//! - `PhaseSet` - Capability descriptor (a set of phases)
//! - `HandleId` - Unique callback handle identifiers
//! - Error types and Result alias

mod error;
mod id;
mod phase;

pub use error::{PhaseLoopError, Result};
pub use id::HandleId;
pub use phase::{Phase, PhaseSet, PhaseTag};
