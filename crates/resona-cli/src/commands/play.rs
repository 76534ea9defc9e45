//! Play a WAV file through the engine.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use resona_dsp::canonicalize;
use resona_engine::{AudioEngine, CacheKey, EngineConfig, load};

/// Play a WAV file.
#[derive(Args)]
pub struct PlayArgs {
    /// Path to the WAV file
    pub file: PathBuf,

    /// Engine sample rate (defaults to the file's rate)
    #[arg(long)]
    rate: Option<u32>,

    /// Playback channel (1-based; auto-assign when omitted)
    #[arg(long)]
    channel: Option<usize>,

    /// Start time on the engine clock in seconds (0 = immediately)
    #[arg(long, default_value = "0.0")]
    time: f64,
}

/// Run the play command.
pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let sound = load(&args.file)?;
    let rate = args.rate.unwrap_or_else(|| sound.samplerate());

    let mut engine = AudioEngine::setup(EngineConfig {
        rate,
        ..EngineConfig::default()
    })?;

    let canonical = engine
        .cache()
        .get_or_insert_with(CacheKey::Path(args.file.clone()), || {
            canonicalize(&sound, rate)
        });

    let duration = canonical.duration().as_secs();
    let channel = engine.play(&canonical, args.time, args.channel)?;
    println!(
        "Playing {} ({duration:.3}s) on channel {channel}",
        args.file.display()
    );

    if let Some(warning) = engine.take_warning() {
        eprintln!("warning: {warning}");
    }

    // Sleep past the scheduled end plus the latency horizon.
    let wait = args.time.max(0.0) + duration + engine.current_latency() + 0.25;
    std::thread::sleep(Duration::from_secs_f64(wait));

    if let Some(error) = engine.take_error() {
        eprintln!("stream error: {error}");
    }
    engine.close();
    Ok(())
}
