//! Raw PCM → playable buffer conversion.
//!
//! The synthesizer returns signed 16-bit little-endian PCM, interleaved
//! across channels.  [`decode`] de-interleaves it into one `f32` array per
//! channel, normalised by `1 / 32768` into `[-1.0, 1.0)`.
//!
//! Sample rate and channel count are taken on trust: a mismatch with the
//! real encoding produces wrong-sounding audio, never an error.

use thiserror::Error;

/// Scale factor from `i16` to `[-1.0, 1.0)`.
const I16_SCALE: f32 = 32_768.0;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("channel count must be at least 1")]
    ZeroChannels,
}

// ---------------------------------------------------------------------------
// PlayableBuffer
// ---------------------------------------------------------------------------

/// Channel-separated, sample-rate-tagged audio.
///
/// Every channel holds the same number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PlayableBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples of channel `index`.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Playback length.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    /// Re-interleave for an output device with `device_channels` channels.
    ///
    /// Device channels beyond the buffer's own are fed from channel
    /// `n % channel_count`, so a mono buffer plays on both sides of a stereo
    /// device.
    pub fn interleave_for(&self, device_channels: usize) -> Vec<f32> {
        let own = self.channel_count();
        if own == 0 || device_channels == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.frames() * device_channels);
        for frame in 0..self.frames() {
            for ch in 0..device_channels {
                out.push(self.channels[ch % own][frame]);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Decode interleaved s16le PCM.
///
/// A dangling odd byte and any incomplete trailing frame are dropped.
///
/// ```
/// use live_translate::audio::decode;
///
/// // two stereo frames: (0, -32768), (16384, 32767)
/// let bytes = [0x00, 0x00, 0x00, 0x80, 0x00, 0x40, 0xff, 0x7f];
/// let buf = decode(&bytes, 24_000, 2).unwrap();
/// assert_eq!(buf.channel(0), Some(&[0.0, 0.5][..]));
/// assert_eq!(buf.channel(1).unwrap()[0], -1.0);
/// ```
pub fn decode(raw: &[u8], sample_rate: u32, channel_count: u16) -> Result<PlayableBuffer, DecodeError> {
    if channel_count == 0 {
        return Err(DecodeError::ZeroChannels);
    }
    let channel_count = channel_count as usize;

    let total_samples = raw.len() / 2;
    let frames = total_samples / channel_count;

    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for (i, pair) in raw.chunks_exact(2).take(frames * channel_count).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        channels[i % channel_count].push(sample as f32 / I16_SCALE);
    }

    Ok(PlayableBuffer {
        sample_rate,
        channels,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
