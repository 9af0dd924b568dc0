//! Phases command - lists subscribable phases and their host slots

use anyhow::Result;
use phaseloop_core::{Phase, PhaseTag};

pub fn run() -> Result<()> {
    println!("Host layout:");
    for (index, tag) in PhaseTag::DEFAULT_LAYOUT.iter().enumerate() {
        let note = match tag.phase() {
            Some(phase) if !phase.runs_once_per_frame() => "subscribable, 0..n per frame",
            Some(_) => "subscribable",
            None => "host only",
        };
        println!("  [{}] {:<15} {}", index, tag.to_string(), note);
    }
    println!();
    println!("{} subscribable phases", Phase::COUNT);
    Ok(())
}
