//! Display WAV file metadata.

use clap::Args;
use resona_engine::wav;

/// Display WAV file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the WAV file
    pub file: std::path::PathBuf,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let info = wav::info(&args.file)?;

    let format = if info.float { "IEEE Float" } else { "PCM" };
    println!("File:        {}", args.file.display());
    println!("Format:      {} {}-bit", format, info.bits_per_sample);
    println!("Channels:    {}", info.channels);
    println!("Sample Rate: {} Hz", info.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );
    Ok(())
}
