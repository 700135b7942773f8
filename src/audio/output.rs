//! Speaker output via `cpal`.
//!
//! [`CpalOutput`] is the process-wide output context.  Opening it spawns a
//! dedicated `audio-output` thread that owns the cpal stream (streams are not
//! `Send` on every platform) and keeps it running until process exit.  The
//! stream callback drains a shared sample queue; [`AudioOutput::play`]
//! enqueues a buffer and resolves once the callback has consumed it, or
//! fails with [`OutputError::Interrupted`] when the stream reports an error
//! or the buffer outlives its own duration by [`DRAIN_GRACE`].

use std::collections::VecDeque;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::audio::decode::PlayableBuffer;

/// Slack on top of a buffer's duration before playback counts as stalled.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// OutputError
// ---------------------------------------------------------------------------

/// Errors from opening or driving the output device.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio output thread is gone")]
    ThreadGone,

    /// Playback ended without the buffer being fully consumed.
    #[error("playback was interrupted")]
    Interrupted,
}

// ---------------------------------------------------------------------------
// AudioOutput trait
// ---------------------------------------------------------------------------

/// A shared sink that plays one buffer at a time.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play `buffer`, resolving on natural completion.
    async fn play(&self, buffer: PlayableBuffer) -> Result<(), OutputError>;
}

// ---------------------------------------------------------------------------
// CpalOutput
// ---------------------------------------------------------------------------

/// Samples waiting for the stream callback, plus the completion signal of
/// the buffer currently queued.
#[derive(Default)]
struct Playhead {
    queue: VecDeque<f32>,
    done: Option<oneshot::Sender<()>>,
}

impl Playhead {
    /// Fill `out` from the queue (silence when empty) and fire the completion
    /// signal once the queue has drained.
    fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.queue.pop_front().unwrap_or(0.0);
        }
        if self.queue.is_empty() {
            if let Some(done) = self.done.take() {
                let _ = done.send(());
            }
        }
    }

    /// Drop whatever is queued; the waiting `play` sees its signal vanish.
    fn interrupt(&mut self) {
        self.queue.clear();
        self.done = None;
    }
}

/// Wait for the completion signal of a buffer lasting `duration`.
async fn await_drain(done: oneshot::Receiver<()>, duration: Duration) -> Result<(), OutputError> {
    match tokio::time::timeout(duration + DRAIN_GRACE, done).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(OutputError::Interrupted),
        Err(_) => {
            log::warn!("audio output: buffer not drained within {duration:?} + grace");
            Err(OutputError::Interrupted)
        }
    }
}

/// The default output device, opened once at a fixed sample rate.
pub struct CpalOutput {
    playhead: Arc<Mutex<Playhead>>,
    sample_rate: u32,
    device_channels: usize,
}

impl CpalOutput {
    /// Open the default output device at `sample_rate` Hz.
    ///
    /// The stream thread lives for the rest of the process.
    pub fn open(sample_rate: u32) -> Result<Self, OutputError> {
        let playhead = Arc::new(Mutex::new(Playhead::default()));
        let stream_playhead = Arc::clone(&playhead);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<usize, OutputError>>();

        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let stream = match build_stream(sample_rate, stream_playhead) {
                    Ok((stream, channels)) => {
                        let _ = ready_tx.send(Ok(channels));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Keep the stream alive; the thread never has work to do.
                let _stream = stream;
                loop {
                    std::thread::park();
                }
            })
            .map_err(|_| OutputError::ThreadGone)?;

        let device_channels = ready_rx.recv().map_err(|_| OutputError::ThreadGone)??;

        log::info!("audio output opened ({sample_rate} Hz, {device_channels} ch)");

        Ok(Self {
            playhead,
            sample_rate,
            device_channels,
        })
    }

    /// Sample rate the stream was opened with.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn build_stream(
    sample_rate: u32,
    playhead: Arc<Mutex<Playhead>>,
) -> Result<(cpal::Stream, usize), OutputError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

    let channels = device.default_output_config()?.channels();
    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let error_playhead = Arc::clone(&playhead);
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            if let Ok(mut head) = playhead.lock() {
                head.render(data);
            } else {
                data.fill(0.0);
            }
        },
        move |err: cpal::StreamError| {
            log::error!("cpal output stream error: {err}");
            if let Ok(mut head) = error_playhead.lock() {
                head.interrupt();
            }
        },
        None,
    )?;

    stream.play()?;
    Ok((stream, channels as usize))
}

#[async_trait]
impl AudioOutput for CpalOutput {
    async fn play(&self, buffer: PlayableBuffer) -> Result<(), OutputError> {
        if buffer.sample_rate() != self.sample_rate {
            log::warn!(
                "audio output: buffer is {} Hz but output runs at {} Hz",
                buffer.sample_rate(),
                self.sample_rate
            );
        }
        if buffer.is_empty() {
            return Ok(());
        }

        let samples = buffer.interleave_for(self.device_channels);
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut head = self.playhead.lock().map_err(|_| OutputError::ThreadGone)?;
            head.queue.clear();
            head.queue.extend(samples);
            head.done = Some(done_tx);
        }

        let duration = Duration::from_secs_f32(buffer.duration_secs());
        let outcome = await_drain(done_rx, duration).await;
        if outcome.is_err() {
            if let Ok(mut head) = self.playhead.lock() {
                head.interrupt();
            }
        }
        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_drains_queue_then_outputs_silence() {
        let mut head = Playhead::default();
        head.queue.extend([0.1, 0.2, 0.3]);

        let mut out = [9.0_f32; 5];
        head.render(&mut out);
        assert_eq!(out, [0.1, 0.2, 0.3, 0.0, 0.0]);
        assert!(head.queue.is_empty());
    }

    #[test]
    fn completion_fires_only_after_drain() {
        let mut head = Playhead::default();
        head.queue.extend([0.5; 4]);
        let (tx, mut rx) = oneshot::channel();
        head.done = Some(tx);

        let mut out = [0.0_f32; 2];
        head.render(&mut out);
        assert!(rx.try_recv().is_err());
        assert!(head.done.is_some());

        head.render(&mut out);
        assert!(rx.try_recv().is_ok());
        assert!(head.done.is_none());
    }

    #[tokio::test]
    async fn interrupt_fails_the_waiting_play() {
        let mut head = Playhead::default();
        head.queue.extend([0.5; 4]);
        let (tx, rx) = oneshot::channel();
        head.done = Some(tx);

        head.interrupt();
        assert!(head.queue.is_empty());
        assert!(matches!(
            await_drain(rx, Duration::from_secs(1)).await,
            Err(OutputError::Interrupted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_stream_times_out() {
        let (_tx, rx) = oneshot::channel::<()>();
        let started = tokio::time::Instant::now();

        let outcome = await_drain(rx, Duration::from_secs(1)).await;
        assert!(matches!(outcome, Err(OutputError::Interrupted)));
        assert!(started.elapsed() >= Duration::from_secs(1) + DRAIN_GRACE);
    }

    #[tokio::test(start_paused = true)]
    async fn drained_buffer_resolves() {
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        assert!(await_drain(rx, Duration::from_millis(10)).await.is_ok());
    }

    #[test]
    fn output_error_messages() {
        assert_eq!(
            OutputError::NoDevice.to_string(),
            "no output device found on the default audio host"
        );
        assert_eq!(OutputError::Interrupted.to_string(), "playback was interrupted");
    }
}
