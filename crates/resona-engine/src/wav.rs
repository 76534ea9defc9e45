//! WAV file loading and saving at the interface boundary.
//!
//! Loading normalizes any supported bit depth to floating point before
//! constructing a [`Sound`]; the sound model itself refuses ambiguous
//! integer data, so the bit-depth knowledge stays here with the container
//! format. Saving writes the canonical engine format: 16-bit PCM stereo.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use resona_core::{CanonicalSound, Sound, SoundError};

use crate::Result;

/// WAV metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// True for IEEE float files, false for PCM.
    pub float: bool,
}

/// Read WAV metadata without loading sample data.
pub fn info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels);
    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
        float: spec.sample_format == SampleFormat::Float,
    })
}

/// Load a WAV file as a [`Sound`].
///
/// Integer samples are normalized by their bit depth; files with more than
/// two channels are rejected.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Sound> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels == 0 || spec.channels > 2 {
        return Err(SoundError::Shape(format!(
            "{} channels in file; only mono and stereo are supported",
            spec.channels
        ))
        .into());
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(Sound::from_interleaved(
        samples,
        spec.sample_rate,
        spec.channels,
    )?)
}

/// Save a canonicalized sound as 16-bit stereo PCM.
pub fn save<P: AsRef<Path>>(path: P, sound: &CanonicalSound) -> Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: sound.samplerate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in sound.data().iter() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
