//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input device and format, slices the incoming samples into
//! overlapping analysis frames, and exposes the microphone as a [`PitchSource`].
//!
//! ## Features
//! - Automatic audio device selection
//! - Mono downmix of multi-channel input
//! - Overlapping analysis frames (window and overlap are configurable)
//! - Frames dropped rather than queued when analysis falls behind

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::config::TunerConfig;
use crate::listener::PitchSource;
use crate::pitch::PitchDetector;

/// Number of analysis frames that may wait for the pitch detector.
const FRAME_QUEUE_DEPTH: usize = 4;

/// How long the microphone source waits for a frame before reporting "no pitch".
const FRAME_TIMEOUT: Duration = Duration::from_millis(100);

/// Capture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Requested sample rate in Hz
    pub sample_rate: u32,
    /// Samples per analysis frame
    pub frame_size: usize,
    /// Samples shared by consecutive frames
    pub overlap: usize,
}

impl CaptureSettings {
    /// Samples the window advances between frames.
    pub fn hop_size(&self) -> usize {
        self.frame_size.saturating_sub(self.overlap).max(1)
    }
}

/// Accumulates mono samples and cuts them into overlapping frames.
#[derive(Debug)]
pub struct FrameSlicer {
    frame_size: usize,
    hop_size: usize,
    buffer: Vec<f32>,
}

impl FrameSlicer {
    pub fn new(settings: &CaptureSettings) -> Self {
        // An empty frame would never drain the buffer.
        let frame_size = settings.frame_size.max(1);
        Self {
            frame_size,
            hop_size: settings.hop_size().min(frame_size),
            buffer: Vec::with_capacity(frame_size * 2),
        }
    }

    /// Appends interleaved samples, averaging `channels` into one, and calls
    /// `emit` for every complete frame.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize, mut emit: impl FnMut(Vec<f32>)) {
        if channels <= 1 {
            self.buffer.extend_from_slice(data);
        } else {
            self.buffer.extend(
                data.chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
            );
        }

        // While we have enough data for a full frame, process it.
        while self.buffer.len() >= self.frame_size {
            emit(self.buffer[..self.frame_size].to_vec());
            // Keep the overlap for the next frame.
            self.buffer.drain(..self.hop_size);
        }
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks an f32 input format near the requested sample rate
/// 3. Sets up a callback that streams overlapping mono frames to `sender`
///
/// # Arguments
/// * `sender` - Channel sender for streaming frames to the analysis side
/// * `settings` - Requested rate and framing
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and actual sample rate
/// * `Err(e)` - Error if audio setup fails
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    settings: &CaptureSettings,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, settings.sample_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = settings.sample_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));

    let sample_rate_val = config.sample_rate().0;
    let channels = usize::from(config.channels());
    let config: cpal::StreamConfig = config.into();

    info!(
        "Selected {} Hz, {} channel(s), {}-sample frames with {} overlap",
        sample_rate_val, channels, settings.frame_size, settings.overlap
    );

    let err_fn = |err| error!("An error occurred on the audio stream: {}", err);

    let mut slicer = FrameSlicer::new(settings);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            slicer.push_interleaved(data, channels, |frame| {
                // Send the frame, ignoring errors if the channel is full.
                let _ = sender.try_send(frame);
            });
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float formats qualify. Mono is preferred; among equal channel
/// counts the range closest to the target rate wins.
///
/// # Arguments
/// * `configs` - List of supported audio configurations from the device
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Some(config)` - Best matching configuration
/// * `None` - No suitable configuration found
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_rate = c.min_sample_rate().0;
            let max_rate = c.max_sample_rate().0;
            let rate_diff = if (min_rate..=max_rate).contains(&target_rate) {
                0
            } else {
                min_rate.abs_diff(target_rate).min(max_rate.abs_diff(target_rate))
            };
            (c.channels(), rate_diff)
        })
}

/// The default microphone as a pitch feed.
///
/// Owns the capture stream, so it must stay on the thread that created it.
pub struct MicrophoneSource {
    stream: cpal::Stream,
    frames: Receiver<Vec<f32>>,
    detector: PitchDetector,
}

impl MicrophoneSource {
    /// Opens the default input device with the configured framing.
    pub fn open(config: &TunerConfig) -> Result<Self> {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_QUEUE_DEPTH);
        let (stream, sample_rate) = start_audio_capture(frame_tx, &config.capture_settings())?;
        Ok(Self {
            stream,
            frames: frame_rx,
            detector: PitchDetector {
                sample_rate,
                amplitude_threshold: config.amplitude_threshold,
                clarity_threshold: config.clarity_threshold,
            },
        })
    }
}

impl PitchSource for MicrophoneSource {
    fn next_pitch(&mut self) -> Result<Option<f32>> {
        match self.frames.recv_timeout(FRAME_TIMEOUT) {
            Ok(frame) => Ok(self.detector.detect(&frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => bail!("audio stream closed"),
        }
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        debug!("Stopping audio stream...");
        if let Err(e) = self.stream.pause() {
            error!("Error pausing stream: {}", e);
        }
    }
}
