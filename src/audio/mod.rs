//! Audio pipeline — raw synthesizer PCM → playable buffer → speaker.
//!
//! # Pipeline
//!
//! ```text
//! s16le bytes → decode() → PlayableBuffer → AudioOutput::play (CpalOutput)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use live_translate::audio::{decode, AudioOutput, CpalOutput};
//!
//! # async fn example(pcm: Vec<u8>) {
//! let output = CpalOutput::open(24_000).unwrap();
//! let buffer = decode(&pcm, 24_000, 1).unwrap();
//! output.play(buffer).await.unwrap(); // resolves when playback finishes
//! # }
//! ```

pub mod decode;
pub mod output;

pub use decode::{decode, DecodeError, PlayableBuffer};
pub use output::{AudioOutput, CpalOutput, OutputError};
