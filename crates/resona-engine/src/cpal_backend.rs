//! cpal-based audio backend.
//!
//! Wraps [cpal](https://crates.io/crates/cpal) for cross-platform output:
//! ALSA (Linux), CoreAudio (macOS), WASAPI (Windows). The engine requests
//! 16-bit signed output and falls back to f32 when the device only speaks
//! float; either way the mixer works in f32 and the conversion happens at
//! the edge of the callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Host, SampleFormat};
use tracing::info;

use crate::backend::{
    AudioBackend, AudioDevice, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
    StreamTiming,
};
use crate::{EngineError, Result};

/// cpal-based backend using the platform's default audio host.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Connect to the platform's default audio host.
    pub fn new() -> Self {
        info!(
            host = cpal::default_host().id().name(),
            "cpal backend initialized"
        );
        Self {
            host: cpal::default_host(),
        }
    }

    fn default_device(&self) -> Result<cpal::Device> {
        self.host
            .default_output_device()
            .ok_or(EngineError::NoDevice)
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// State threaded through the realtime callback closure: the engine's mix
/// callback plus the frame clock the stream times are derived from.
struct CallbackState {
    callback: OutputCallback,
    frames_done: u64,
    rate: f64,
}

impl CallbackState {
    fn timing(&self, frames: usize, dac_delay: f64) -> StreamTiming {
        let stream_time = self.frames_done as f64 / self.rate;
        StreamTiming {
            frames,
            output_time: stream_time + dac_delay,
            stream_time,
        }
    }
}

/// The driver's reported delay between callback time and DAC time.
fn dac_delay(info: &cpal::OutputCallbackInfo) -> f64 {
    let ts = info.timestamp();
    ts.playback
        .duration_since(&ts.callback)
        .map_or(0.0, |d| d.as_secs_f64())
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn list_outputs(&self) -> Result<Vec<AudioDevice>> {
        let mut devices = Vec::new();
        let outputs = self
            .host
            .output_devices()
            .map_err(|e| EngineError::Device(e.to_string()))?;
        for device in outputs {
            if let Ok(name) = device.name() {
                let default_sample_rate = device
                    .default_output_config()
                    .map(|c| c.sample_rate())
                    .unwrap_or(44100);
                devices.push(AudioDevice {
                    name,
                    default_sample_rate,
                });
            }
        }
        Ok(devices)
    }

    fn default_output(&self) -> Result<Option<AudioDevice>> {
        let Some(device) = self.host.default_output_device() else {
            return Ok(None);
        };
        let name = device
            .name()
            .map_err(|e| EngineError::Device(e.to_string()))?;
        let default_sample_rate = device
            .default_output_config()
            .map(|c| c.sample_rate())
            .unwrap_or(44100);
        Ok(Some(AudioDevice {
            name,
            default_sample_rate,
        }))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.default_device()?;
        let rate = config.sample_rate;

        // Confirm the device can open stereo at the requested rate before
        // deciding on a sample format.
        let formats: Vec<SampleFormat> = device
            .supported_output_configs()
            .map_err(|e| EngineError::Device(e.to_string()))?
            .filter(|r| {
                r.channels() == 2
                    && r.min_sample_rate() <= rate
                    && rate <= r.max_sample_rate()
            })
            .map(|r| r.sample_format())
            .collect();
        if formats.is_empty() {
            return Err(EngineError::Device(format!(
                "device does not support stereo output at {rate} Hz"
            )));
        }
        let format = if formats.contains(&SampleFormat::I16) {
            SampleFormat::I16
        } else if formats.contains(&SampleFormat::F32) {
            SampleFormat::F32
        } else {
            return Err(EngineError::Device(format!(
                "no supported sample format at {rate} Hz (offered: {formats:?})"
            )));
        };

        let stream_config = cpal::StreamConfig {
            channels: 2,
            sample_rate: rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_frames),
        };

        let mut state = CallbackState {
            callback,
            frames_done: 0,
            rate: f64::from(rate),
        };

        let stream = match format {
            SampleFormat::I16 => {
                // Mix in f32, convert at the edge. The scratch buffer is
                // sized for the requested stream unit and only regrows if
                // the driver hands over a larger buffer than promised.
                let mut scratch: Vec<f32> = vec![0.0; config.buffer_frames as usize * 2];
                device.build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], info: &cpal::OutputCallbackInfo| {
                        if scratch.len() < data.len() {
                            scratch.resize(data.len(), 0.0);
                        }
                        let frames = data.len() / 2;
                        let timing = state.timing(frames, dac_delay(info));
                        (state.callback)(&mut scratch[..data.len()], &timing);
                        state.frames_done += frames as u64;
                        for (out, &x) in data.iter_mut().zip(scratch.iter()) {
                            *out = (x * 32768.0).clamp(-32768.0, 32767.0) as i16;
                        }
                    },
                    move |err| error_callback(&err.to_string()),
                    None,
                )
            }
            _ => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], info: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / 2;
                    let timing = state.timing(frames, dac_delay(info));
                    (state.callback)(data, &timing);
                    state.frames_done += frames as u64;
                },
                move |err| error_callback(&err.to_string()),
                None,
            ),
        }
        .map_err(|e| EngineError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EngineError::Device(e.to_string()))?;
        info!(
            sample_rate = rate,
            buffer_frames = config.buffer_frames,
            format = ?format,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }
}
