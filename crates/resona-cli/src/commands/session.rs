//! Validate and summarize session configuration files.

use std::path::PathBuf;

use clap::Args;
use resona_trial::{Recorder, SessionConfig};

/// Check a session TOML file.
#[derive(Args)]
pub struct SessionArgs {
    /// Path to the session file
    pub file: PathBuf,
}

/// Run the session command.
pub fn run(args: SessionArgs) -> anyhow::Result<()> {
    let config = SessionConfig::load(&args.file)?;

    // Constructing the recorder surfaces reserved-column collisions before
    // a listener is in the booth.
    let info: Vec<(String, String)> = config.info.clone().into_iter().collect();
    Recorder::new(&config.output, info, config.columns.clone())?;

    println!("Session:      {}", args.file.display());
    println!("Output:       {}", config.output.display());
    println!("Start offset: {}", config.start_offset);
    println!(
        "Engine:       {} Hz, {} channels, queue {}, stream unit {}",
        config.engine.rate,
        config.engine.num_channels,
        config.engine.queue_size,
        config.engine.stream_unit
    );
    if !config.info.is_empty() {
        println!("Info fields:");
        for (key, value) in &config.info {
            println!("  {key} = {value}");
        }
    }
    if !config.columns.is_empty() {
        println!("Columns:      {}", config.columns.join(", "));
    }
    println!("OK");
    Ok(())
}
