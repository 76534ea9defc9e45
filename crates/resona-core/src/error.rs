//! Error types for the sound value model.

use thiserror::Error;

/// Errors produced when constructing or manipulating [`Sound`](crate::Sound)
/// values.
#[derive(Debug, Error)]
pub enum SoundError {
    /// The sample buffer does not form whole frames, or the channel count is
    /// unsupported.
    #[error("invalid sound shape: {0}")]
    Shape(String),

    /// The element type cannot be accepted without explicit normalization.
    ///
    /// Plain integer buffers are rejected because their full-scale value is
    /// ambiguous (a 16-bit file and a 24-bit file both arrive as integers).
    /// Loaders must normalize to floating point themselves.
    #[error("integer sample type requires explicit normalization to [-1, +1]")]
    Type,

    /// A slice bound resolved outside the underlying sample data.
    #[error("slice of frames {from}..{to} out of range for {frames} frames")]
    OutOfRange {
        /// Resolved first frame index (inclusive).
        from: usize,
        /// Resolved last frame index (exclusive).
        to: usize,
        /// Total frames available.
        frames: usize,
    },

    /// The sound is too short to carry the requested envelope.
    #[error("sound of {frames} frames is too short for a {ramp_frames}-frame ramp on each side")]
    DurationTooShort {
        /// Frames in the sound.
        frames: usize,
        /// Frames the ramp needs on each side.
        ramp_frames: usize,
    },

    /// Two sounds (or a sound and the engine) disagree on sample rate.
    #[error("sample rate {found} Hz does not match required rate {required} Hz")]
    RateMismatch {
        /// Rate carried by the offending sound.
        found: u32,
        /// Rate required by the operation.
        required: u32,
    },
}
