//! Stimulus generation to WAV files.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use resona_core::{Freq, Sound, Time};
use resona_dsp::{
    NoiseRng, attenuate, canonicalize, harmonic_complex, noise_stereo, ramp, silence, tone,
};
use resona_engine::save;

#[derive(Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateCommand,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate a pure tone
    Tone {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Frequency in Hz
        #[arg(long, default_value = "1000.0")]
        freq: f64,

        /// Duration in seconds
        #[arg(long, default_value = "1.0")]
        duration: f64,

        #[command(flatten)]
        common: CommonOpts,
    },

    /// Generate uniform white noise (independent stereo channels)
    Noise {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Duration in seconds
        #[arg(long, default_value = "1.0")]
        duration: f64,

        /// RNG seed, for reproducible stimuli
        #[arg(long, default_value = "1")]
        seed: u32,

        #[command(flatten)]
        common: CommonOpts,
    },

    /// Generate a harmonic complex
    Complex {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Fundamental frequency in Hz
        #[arg(long, default_value = "200.0")]
        f0: f64,

        /// Number of harmonics, equal amplitude, starting at the
        /// fundamental
        #[arg(long, default_value = "5")]
        harmonics: u32,

        /// Duration in seconds
        #[arg(long, default_value = "1.0")]
        duration: f64,

        #[command(flatten)]
        common: CommonOpts,
    },

    /// Generate silence
    Silence {
        /// Output WAV file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Duration in seconds
        #[arg(long, default_value = "1.0")]
        duration: f64,

        /// Sample rate in Hz
        #[arg(long, default_value = "44100")]
        rate: u32,
    },
}

/// Options shared by the audible generators.
#[derive(Args)]
struct CommonOpts {
    /// Sample rate in Hz
    #[arg(long, default_value = "44100")]
    rate: u32,

    /// Onset/offset ramp in milliseconds (0 disables)
    #[arg(long, default_value = "5.0")]
    ramp_ms: f64,

    /// Attenuation in dB below unit RMS
    #[arg(long, default_value = "20.0")]
    attenuation: f64,
}

impl CommonOpts {
    /// Apply the shared shaping chain: ramp, then RMS-referenced level.
    fn shape(&self, sound: Sound) -> anyhow::Result<Sound> {
        let sound = if self.ramp_ms > 0.0 {
            ramp(&sound, Time::ms(self.ramp_ms))?
        } else {
            sound
        };
        Ok(attenuate(&sound, self.attenuation as f32))
    }
}

/// Run the generate command.
pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let (output, sound, rate) = match args.command {
        GenerateCommand::Tone {
            output,
            freq,
            duration,
            common,
        } => {
            let s = tone(Freq::hz(freq), Time::secs(duration), common.rate);
            (output, common.shape(s)?, common.rate)
        }
        GenerateCommand::Noise {
            output,
            duration,
            seed,
            common,
        } => {
            let mut rng = NoiseRng::new(seed);
            let s = noise_stereo(Time::secs(duration), common.rate, &mut rng);
            (output, common.shape(s)?, common.rate)
        }
        GenerateCommand::Complex {
            output,
            f0,
            harmonics,
            duration,
            common,
        } => {
            let numbers: Vec<u32> = (1..=harmonics.max(1)).collect();
            let amps = vec![1.0 / numbers.len() as f32; numbers.len()];
            let phases = vec![0.0; numbers.len()];
            let s = harmonic_complex(
                Freq::hz(f0),
                &numbers,
                &amps,
                &phases,
                Time::secs(duration),
                common.rate,
            )?;
            (output, common.shape(s)?, common.rate)
        }
        GenerateCommand::Silence {
            output,
            duration,
            rate,
        } => (output, silence(Time::secs(duration), rate), rate),
    };

    save(&output, &canonicalize(&sound, rate))?;
    println!(
        "Wrote {} ({:.3}s at {} Hz)",
        output.display(),
        sound.duration().as_secs(),
        rate
    );
    Ok(())
}
