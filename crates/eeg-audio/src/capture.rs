use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use eeg_core::error::CoreError;
use eeg_core::traits::SampleSource;
use rtrb::{Consumer, RingBuffer};

use crate::error::AudioError;

/// Live capture via cpal.
///
/// The input callback downmixes to mono and pushes into a lock-free ring
/// buffer. The stream handle stays with the caller (it is not `Send` on every
/// platform); the analysis side reads through the paired [`CaptureReader`].
///
/// # Example
/// ```no_run
/// use eeg_audio::capture::AudioCapture;
/// let (capture, reader) = AudioCapture::start_default(16384).unwrap();
/// ```
pub struct AudioCapture {
    stream: cpal::Stream,
    sample_rate: u32,
}

impl AudioCapture {
    /// Start capturing from the default input device.
    ///
    /// `history_len` is the block size the reader will serve (N).
    ///
    /// # Errors
    /// Returns an error if no input device exists or the stream cannot start.
    pub fn start_default(history_len: usize) -> Result<(Self, CaptureReader), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let channels = usize::from(config.channels()).max(1);

        // 2 seconds of audio, never less than one block
        let buf_size = (sample_rate as usize * 2).max(history_len * 2);
        let (mut producer, consumer) = RingBuffer::new(buf_size);

        let failed = Arc::new(AtomicBool::new(false));
        let failed_cb = Arc::clone(&failed);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for chunk in data.chunks(channels) {
                        let mono: f32 = chunk.iter().sum::<f32>() / channels as f32;
                        // full ring: the reader only wants the latest N anyway
                        let _ = producer.push(mono);
                    }
                },
                move |err| {
                    log::error!("Erreur du stream d'acquisition : {err}");
                    failed_cb.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        log::info!(
            "Acquisition : {} @ {sample_rate}Hz, {channels} canal(aux)",
            device.name().unwrap_or_else(|_| "?".into())
        );

        let reader = CaptureReader {
            consumer,
            history: vec![0.0; history_len],
            failed,
            sample_rate,
        };
        Ok((Self { stream, sample_rate }, reader))
    }

    /// Reference to the underlying cpal stream (kept alive for capture).
    #[must_use]
    pub fn stream(&self) -> &cpal::Stream {
        &self.stream
    }

    /// The sample rate of the capture stream.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Consumer side of an [`AudioCapture`], usable from the analysis thread.
///
/// Keeps the latest `history_len` samples; a read drains whatever the
/// callback produced since the previous read. Before enough data has arrived
/// the oldest part of the block is zeros.
pub struct CaptureReader {
    consumer: Consumer<f32>,
    history: Vec<f32>,
    failed: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CaptureReader {
    fn drain(&mut self) {
        let n = self.history.len();
        let available = self.consumer.slots();
        if available == 0 || n == 0 {
            return;
        }
        let skip = available.saturating_sub(n);
        for _ in 0..skip {
            let _ = self.consumer.pop();
        }
        let fresh = available - skip;
        self.history.copy_within(fresh.., 0);
        for slot in &mut self.history[n - fresh..] {
            *slot = self.consumer.pop().unwrap_or(0.0);
        }
    }
}

impl SampleSource for CaptureReader {
    fn read_block(&mut self, out: &mut [f32]) -> Result<(), CoreError> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(AudioError::StreamError("flux interrompu".into()).into());
        }
        if self.consumer.is_abandoned() && self.consumer.is_empty() {
            return Err(AudioError::StreamError("stream fermé".into()).into());
        }

        self.drain();

        let n = self.history.len();
        if out.len() <= n {
            out.copy_from_slice(&self.history[n - out.len()..]);
        } else {
            let pad = out.len() - n;
            out[..pad].fill(0.0);
            out[pad..].copy_from_slice(&self.history);
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(history_len: usize, capacity: usize) -> (rtrb::Producer<f32>, CaptureReader) {
        let (producer, consumer) = RingBuffer::new(capacity);
        let reader = CaptureReader {
            consumer,
            history: vec![0.0; history_len],
            failed: Arc::new(AtomicBool::new(false)),
            sample_rate: 256,
        };
        (producer, reader)
    }

    #[test]
    fn partial_data_is_right_aligned() {
        let (mut producer, mut reader) = reader(4, 16);
        assert!(producer.push(1.0).is_ok());
        assert!(producer.push(2.0).is_ok());
        let mut out = [9.0f32; 4];
        reader.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn keeps_only_the_latest_history() {
        let (mut producer, mut reader) = reader(3, 16);
        for i in 0..7 {
            assert!(producer.push(i as f32).is_ok());
        }
        let mut out = [0.0f32; 3];
        reader.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(out, [4.0, 5.0, 6.0]);
        // nothing new: same block again
        reader.read_block(&mut out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(out, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn dropped_producer_is_a_lost_source() {
        let (producer, mut reader) = reader(4, 16);
        drop(producer);
        let mut out = [0.0f32; 4];
        assert!(matches!(
            reader.read_block(&mut out),
            Err(CoreError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn stream_error_flag_is_a_lost_source() {
        let (_producer, mut reader) = reader(4, 16);
        reader.failed.store(true, Ordering::Relaxed);
        let mut out = [0.0f32; 4];
        assert!(reader.read_block(&mut out).is_err());
    }
}
