//! # Pitch Detection Module
//!
//! Estimates the fundamental frequency of a single audio frame. The estimate
//! is only a candidate: the tuning module still decides whether it is a
//! musically meaningful note.
//!
//! ## Features
//! - YIN pitch detection with a noise gate and clarity check
//! - Parabolic interpolation for sub-sample accuracy
//! - Spectrum refinement for improved precision

use crate::fft;

/// A robust implementation of the YIN pitch detection algorithm.
///
/// - Amplitude gating to filter out silence
/// - Cumulative mean normalized difference
/// - First dip under the threshold, followed down to its local minimum
/// - Clarity check to reject noise
/// - Parabolic interpolation for sub-sample accuracy
///
/// # Arguments
/// * `signal` - Input audio signal
/// * `sample_rate` - Sample rate in Hz
/// * `amplitude_threshold` - Minimum RMS amplitude for pitch detection
/// * `clarity_threshold` - Largest normalized difference accepted as periodic
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - No pitch detected (silence, noise, or invalid signal)
pub fn detect_pitch_yin(
    signal: &[f32],
    sample_rate: u32,
    amplitude_threshold: f32,
    clarity_threshold: f32,
) -> Option<f32> {
    let frame_size = signal.len();
    let half = frame_size / 2;
    if half < 3 {
        return None;
    }
    let mut yin_buffer = vec![0.0; half];

    // --- Noise Gate: Calculate RMS to filter out silence/noise ---
    let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32).sqrt();
    if rms < amplitude_threshold {
        return None;
    }

    // --- Step 1 & 2: Difference function and squared difference ---
    for tau in 1..half {
        let mut diff = 0.0;
        for i in 0..half {
            let delta = signal[i] - signal[i + tau];
            diff += delta * delta;
        }
        yin_buffer[tau] = diff;
    }

    // --- Step 3: Cumulative mean normalized difference ---
    let mut running_sum = 0.0;
    yin_buffer[0] = 1.0;
    for tau in 1..half {
        running_sum += yin_buffer[tau];
        if running_sum != 0.0 {
            yin_buffer[tau] *= tau as f32 / running_sum;
        } else {
            yin_buffer[tau] = 1.0;
        }
    }

    // --- Step 4: First significant dip, to avoid octave errors ---
    let min_val = yin_buffer
        .iter()
        .skip(1) // Skip tau = 0
        .cloned()
        .fold(f32::INFINITY, f32::min);

    let threshold = min_val + 0.05;
    let mut period = (2..half)
        .find(|&tau| yin_buffer[tau] < threshold && yin_buffer[tau] < yin_buffer[tau - 1])?;

    // Follow the dip down to the bottom of its valley.
    while period + 1 < half && yin_buffer[period + 1] < yin_buffer[period] {
        period += 1;
    }

    // --- Step 5: Clarity check to reject noise ---
    if yin_buffer[period] > clarity_threshold {
        return None;
    }

    // --- Step 6: Parabolic interpolation for better precision ---
    if period + 1 >= half {
        return None;
    }

    let y1 = yin_buffer[period - 1];
    let y2 = yin_buffer[period];
    let y3 = yin_buffer[period + 1];

    let period_float = if (y1 - 2.0 * y2 + y3) != 0.0 {
        let peak_shift = (y1 - y3) / (2.0 * (y1 - 2.0 * y2 + y3));
        period as f32 + peak_shift
    } else {
        period as f32
    };

    let frequency = sample_rate as f32 / period_float;

    // Only return valid, audible frequencies.
    if frequency.is_finite() && frequency > 20.0 {
        Some(frequency)
    } else {
        None
    }
}

/// Bins searched either side of the estimate when refining.
const REFINE_SEARCH_BINS: usize = 2;

/// Refines a frequency estimate using a pre-computed magnitude spectrum.
///
/// Bin width is `sample_rate / frame_len`, taken from the analysed frame
/// itself since odd frames have `(frame_len - 1) / 2` magnitude bins. The
/// strongest bin near the estimate is interpolated with a parabola through
/// the log magnitudes of it and its two neighbours.
///
/// # Arguments
/// * `magnitudes` - Magnitude spectrum of the frame (see [`fft::spectrum_to_magnitudes`])
/// * `frame_len` - Number of samples in the analysed frame
/// * `rough_freq` - Initial frequency estimate in Hz
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
/// * `Some(refined_freq)` - Refined estimate, or `rough_freq` when refinement is not possible
/// * `None` - The estimate was not positive or the frame was empty
pub fn refine_from_spectrum(
    magnitudes: &[f32],
    frame_len: usize,
    rough_freq: f32,
    sample_rate: u32,
) -> Option<f32> {
    if rough_freq <= 0.0 || frame_len == 0 {
        return None;
    }
    if magnitudes.len() < 3 {
        return Some(rough_freq);
    }

    let bin_width = sample_rate as f32 / frame_len as f32;
    let center = (rough_freq / bin_width).round() as usize;
    // Interior bins only, so the peak always has two neighbours.
    let low = center.saturating_sub(REFINE_SEARCH_BINS).max(1);
    let high = center
        .saturating_add(REFINE_SEARCH_BINS)
        .min(magnitudes.len() - 2);
    if low > high {
        return Some(rough_freq);
    }

    let Some(peak) = (low..=high).max_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b])) else {
        return Some(rough_freq);
    };

    let [below, at, above] = [peak - 1, peak, peak + 1].map(|bin| magnitudes[bin].ln());
    if !(below.is_finite() && at.is_finite() && above.is_finite()) {
        return Some(rough_freq);
    }

    let curvature = 2.0 * at - below - above;
    if curvature.abs() < 1e-6 {
        return Some(rough_freq);
    }

    let offset = (above - below) / (2.0 * curvature);
    let refined = (peak as f32 + offset) * bin_width;

    if refined.is_finite() && refined > 0.0 {
        Some(refined)
    } else {
        Some(rough_freq)
    }
}

/// YIN detection followed by spectrum refinement, with fixed settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchDetector {
    pub sample_rate: u32,
    pub amplitude_threshold: f32,
    pub clarity_threshold: f32,
}

impl PitchDetector {
    /// Estimates the pitch of one frame.
    pub fn detect(&self, frame: &[f32]) -> Option<f32> {
        let rough = detect_pitch_yin(
            frame,
            self.sample_rate,
            self.amplitude_threshold,
            self.clarity_threshold,
        )?;
        let magnitudes = fft::spectrum_to_magnitudes(&fft::perform_fft(frame));
        refine_from_spectrum(&magnitudes, frame.len(), rough, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    #[test]
    fn detects_a440() {
        let freq = detect_pitch_yin(&sine(440.0, 2048), SAMPLE_RATE, 0.01, 0.15).unwrap();
        assert!((freq - 440.0).abs() < 2.0, "{freq}");
    }

    #[test]
    fn detects_low_e() {
        let freq = detect_pitch_yin(&sine(82.41, 4096), SAMPLE_RATE, 0.01, 0.15).unwrap();
        assert!((freq - 82.41).abs() < 1.0, "{freq}");
    }

    #[test]
    fn silence_is_gated() {
        assert_eq!(detect_pitch_yin(&vec![0.0; 2048], SAMPLE_RATE, 0.01, 0.15), None);
        let quiet: Vec<f32> = sine(440.0, 2048).iter().map(|s| s * 0.001).collect();
        assert_eq!(detect_pitch_yin(&quiet, SAMPLE_RATE, 0.01, 0.15), None);
    }

    #[test]
    fn tiny_frames_are_ignored() {
        assert_eq!(detect_pitch_yin(&[0.5, -0.5, 0.5, -0.5], SAMPLE_RATE, 0.0, 1.0), None);
    }

    #[test]
    fn refinement_snaps_to_spectral_peak() {
        // 4410 samples at 44.1 kHz gives 10 Hz bins; 440 Hz is bin 44.
        let magnitudes = fft::spectrum_to_magnitudes(&fft::perform_fft(&sine(440.0, 4410)));
        let refined = refine_from_spectrum(&magnitudes, 4410, 437.0, SAMPLE_RATE).unwrap();
        assert!((refined - 440.0).abs() < 0.5, "{refined}");
    }

    #[test]
    fn refinement_uses_odd_frame_length() {
        // 129 samples at 12.9 kHz gives 100 Hz bins but only 64 magnitudes.
        // 3050 Hz sits halfway between bins 30 and 31, so the log parabola
        // through the symmetric neighbours lands back on it.
        let sample_rate = 12_900;
        let frame: Vec<f32> = (0..129)
            .map(|i| (2.0 * std::f32::consts::PI * 3050.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let magnitudes = fft::spectrum_to_magnitudes(&fft::perform_fft(&frame));
        assert_eq!(magnitudes.len(), 64);

        let refined = refine_from_spectrum(&magnitudes, frame.len(), 3040.0, sample_rate).unwrap();
        // A 128-sample bin width would put this near 3074 Hz.
        assert!((refined - 3050.0).abs() < 5.0, "{refined}");
    }

    #[test]
    fn detector_handles_odd_frames() {
        let detector = PitchDetector {
            sample_rate: SAMPLE_RATE,
            amplitude_threshold: 0.01,
            clarity_threshold: 0.15,
        };
        let freq = detector.detect(&sine(440.0, 6001)).unwrap();
        assert!((freq - 440.0).abs() < 1.5, "{freq}");
    }

    #[test]
    fn refinement_rejects_non_positive_estimates() {
        assert_eq!(refine_from_spectrum(&[1.0, 2.0, 1.0], 6, 0.0, SAMPLE_RATE), None);
        assert_eq!(refine_from_spectrum(&[1.0, 2.0, 1.0], 0, 100.0, SAMPLE_RATE), None);
        assert_eq!(refine_from_spectrum(&[1.0], 2, 100.0, SAMPLE_RATE), Some(100.0));
    }

    #[test]
    fn detector_combines_yin_and_refinement() {
        let detector = PitchDetector {
            sample_rate: SAMPLE_RATE,
            amplitude_threshold: 0.01,
            clarity_threshold: 0.15,
        };
        let freq = detector.detect(&sine(329.63, 6000)).unwrap();
        assert!((freq - 329.63).abs() < 1.5, "{freq}");
        assert_eq!(detector.detect(&vec![0.0; 6000]), None);
    }
}
