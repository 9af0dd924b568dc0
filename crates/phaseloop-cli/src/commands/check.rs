//! Check command - verifies a host layout against the expected phase shape

use anyhow::{Context, Result};
use phaseloop_runtime::{DispatchTable, PhaseScheduler};

pub fn run(config_path: Option<&str>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let layout = config.host.layout.clone();

    let scheduler = PhaseScheduler::new(DispatchTable::with_layout(layout.clone()));
    scheduler
        .verify_structure()
        .context("Host phase structure failed the integrity check")?;

    let names: Vec<String> = layout.iter().map(|tag| tag.to_string()).collect();
    println!("OK: {} slots [{}]", layout.len(), names.join(", "));
    Ok(())
}
