// dialtune-core/src/lib.rs

//! The core logic for the dial tuner.
//! This crate maps detected pitches onto the equal-tempered scale and
//! measures how far they deviate from true pitch. It also carries the
//! live (microphone) and simulated pitch feeds that drive it. It is
//! completely headless and contains no rendering code.

pub mod audio;
pub mod config;
pub mod fft;
pub mod listener;
pub mod pitch;
pub mod simulation;
pub mod tuning;

use serde::Serialize;

pub use config::TunerConfig;
pub use listener::{Listener, PitchSource};
pub use tuning::{NoteName, ReferenceNote, ReferenceTable};

/// Represents the mapping of a single pitch sample onto the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuningResult {
    /// The measured frequency in Hz.
    pub frequency: f32,
    /// The nearest note, or `None` when the frequency is outside the playable window.
    pub note: Option<NoteName>,
    /// Octave of `note`; 0 when there is no note.
    pub octave: i32,
    /// The closest reference frequency the deviation is measured against.
    pub reference_frequency: f32,
    /// `frequency - reference_frequency` in Hz.
    pub deviation_hz: f32,
    /// Signed distance from the reference in semitones.
    pub semitone_offset: f32,
    /// Signed distance from the reference in cents.
    pub cents: f32,
}

impl TuningResult {
    pub fn has_note(&self) -> bool {
        self.note.is_some()
    }

    /// Note and octave as one label, e.g. `"C#3"`.
    pub fn label(&self) -> Option<String> {
        self.note.map(|note| format!("{}{}", note, self.octave))
    }
}
