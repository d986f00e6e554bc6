//! # Musical Tuning Module
//!
//! This module maps detected frequencies onto the equal-tempered scale and
//! measures how far a pitch sits from the nearest reference note.
//!
//! ## Features
//! - Equal temperament reference table for any octave range (A4 = 440 Hz)
//! - Frequency to note name and octave conversion (A0 to G#8 window)
//! - Nearest reference note search by absolute Hz distance
//! - Hz, semitone and cent deviation calculations
//!
//! ## Note orderings
//! Two orderings of the same twelve pitch classes live here. The reference
//! table walks each octave from C ([`C_ROOTED_NOTES`]), while the converter
//! counts piano keys from A0 ([`A_ROOTED_NOTES`]). Both are legacy behavior
//! that displayed labels depend on, so they are kept side by side instead of
//! being derived from one another.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::TuningResult;

/// Frequency of A4, the reference pitch, in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Lowest frequency that maps to a note (A0).
pub const MIN_FREQUENCY: f32 = 27.5;

/// Highest frequency that maps to a note.
///
/// Together with [`MIN_FREQUENCY`] this filters spurious pitch detector output.
pub const MAX_FREQUENCY: f32 = 6644.88;

/// Reference used for deviation math when the table has no entries.
pub const DEFAULT_REFERENCE_FREQUENCY: f32 = 440.0;

/// Piano key number of A4 when A0 is key 1.
const A4_KEY_NUMBER: f32 = 49.0;

/// One of the twelve chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

impl NoteName {
    /// Display label, e.g. `"C#"`.
    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semitone order within an octave, starting at C. Used by the table generator.
pub const C_ROOTED_NOTES: [NoteName; 12] = [
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
];

/// Piano key order starting at A0. Used by [`freq_to_note`].
pub const A_ROOTED_NOTES: [NoteName; 12] = [
    NoteName::A,
    NoteName::ASharp,
    NoteName::B,
    NoteName::C,
    NoteName::CSharp,
    NoteName::D,
    NoteName::DSharp,
    NoteName::E,
    NoteName::F,
    NoteName::FSharp,
    NoteName::G,
    NoteName::GSharp,
];

/// A single equal-tempered pitch in the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceNote {
    /// Frequency in Hz
    pub frequency: f32,
    /// Pitch class
    pub note: NoteName,
    /// Octave number (C-based, so C4 is middle C)
    pub octave: i32,
}

/// Equal-tempered reference notes for an inclusive octave range.
///
/// The table is built once and only read afterwards; share it by reference
/// (or through an `Arc`) with every thread that maps pitches. Entries are kept
/// in generation order, which is also ascending frequency order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    notes: Vec<ReferenceNote>,
    start_octave: i32,
    end_octave: i32,
}

impl ReferenceTable {
    /// A table with no entries. Deviation math falls back to
    /// [`DEFAULT_REFERENCE_FREQUENCY`] against it.
    pub fn empty() -> Self {
        Self {
            notes: Vec::new(),
            start_octave: 0,
            end_octave: -1,
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// The octave range this table was generated for.
    pub fn octave_range(&self) -> RangeInclusive<i32> {
        self.start_octave..=self.end_octave
    }

    pub fn notes(&self) -> &[ReferenceNote] {
        &self.notes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceNote> {
        self.notes.iter()
    }

    /// Looks up the entry for a note in a given octave.
    pub fn find(&self, note: NoteName, octave: i32) -> Option<&ReferenceNote> {
        self.notes
            .iter()
            .find(|n| n.note == note && n.octave == octave)
    }

    /// Finds the reference note closest to `freq` in absolute Hz.
    ///
    /// When two entries are equally close the first one in table order, i.e.
    /// the lower frequency, wins.
    ///
    /// # Returns
    /// * `None` - the table is empty
    pub fn nearest(&self, freq: f32) -> Option<&ReferenceNote> {
        self.notes.iter().min_by(|a, b| {
            let diff_a = (a.frequency - freq).abs();
            let diff_b = (b.frequency - freq).abs();
            diff_a.total_cmp(&diff_b)
        })
    }
}

impl<'a> IntoIterator for &'a ReferenceTable {
    type Item = &'a ReferenceNote;
    type IntoIter = std::slice::Iter<'a, ReferenceNote>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

/// Builds the equal-tempered reference table for `[start_octave, end_octave]`.
///
/// Each octave contributes twelve notes in C-rooted order with
/// `f = 440 * 2^((octave - 4) + (i - 9) / 12)`, where `i - 9` is the
/// semitone distance from A inside the octave. The exponent is evaluated in
/// `f64` so that A4 comes out as exactly 440 Hz and octaves double exactly
/// before rounding to `f32`.
///
/// The bounds are not validated. An inverted range produces an empty table.
///
/// # Arguments
/// * `start_octave` - First octave to include
/// * `end_octave` - Last octave to include
///
/// # Returns
/// * `ReferenceTable` - `12 * (end_octave - start_octave + 1)` entries
pub fn generate_reference_table(start_octave: i32, end_octave: i32) -> ReferenceTable {
    let octave_count = (i64::from(end_octave) - i64::from(start_octave) + 1).max(0) as usize;
    let mut notes = Vec::with_capacity(octave_count.saturating_mul(C_ROOTED_NOTES.len()));

    for octave in start_octave..=end_octave {
        for (i, &note) in C_ROOTED_NOTES.iter().enumerate() {
            let exponent = (f64::from(octave) - 4.0) + (i as f64 - 9.0) / 12.0;
            let frequency = f64::from(A4_FREQUENCY) * 2.0_f64.powf(exponent);
            notes.push(ReferenceNote {
                frequency: frequency as f32,
                note,
                octave,
            });
        }
    }

    ReferenceTable {
        notes,
        start_octave,
        end_octave,
    }
}

/// Returns true when `freq` lies inside the playable window
/// `[MIN_FREQUENCY, MAX_FREQUENCY]`. NaN is never in range.
pub fn is_in_range(freq: f32) -> bool {
    (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&freq)
}

/// Converts a frequency to its note name and octave.
///
/// The frequency is rounded to the nearest piano key (A0 = key 1,
/// A4 = key 49, ties to even) and labelled with the A-rooted ordering.
///
/// # Arguments
/// * `freq` - Frequency in Hz
///
/// # Returns
/// * `Some((note, octave))` - For `27.5 <= freq <= 6644.88`
/// * `None` - Anything else, including NaN and infinities. This means "no
///   note", not a fault.
pub fn freq_to_note(freq: f32) -> Option<(NoteName, i32)> {
    if !is_in_range(freq) {
        return None;
    }

    let key_number = (12.0 * (freq / A4_FREQUENCY).log2() + A4_KEY_NUMBER).round_ties_even() as i32;
    let note = A_ROOTED_NOTES[(key_number - 1).rem_euclid(12) as usize];
    let octave = (key_number + 8).div_euclid(12);

    Some((note, octave))
}

/// Distance from `target_freq` to `freq` in (fractional) semitones.
pub fn semitone_offset(freq: f32, target_freq: f32) -> f32 {
    12.0 * (freq / target_freq).log2()
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are hundredths of a semitone:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `target_freq` - Target frequency in Hz
///
/// # Returns
/// * Cent deviation (positive = sharp, negative = flat)
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    100.0 * semitone_offset(freq, target_freq)
}

/// Maps a measured frequency onto the reference table.
///
/// 1. Converts the frequency to a note and octave ([`freq_to_note`])
/// 2. Picks the nearest reference frequency by absolute Hz distance, or
///    [`DEFAULT_REFERENCE_FREQUENCY`] when the table is empty
/// 3. Computes the Hz, semitone and cent deviation from that reference
///
/// Non-finite and non-positive frequencies are treated as out of range: the
/// result has no note, uses the default reference and reports zero
/// deviation, so NaN never leaks into the deviation fields.
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `table` - Reference table to search
///
/// # Returns
/// * `TuningResult` - Always fully populated
pub fn compute_tuning_result(freq: f32, table: &ReferenceTable) -> TuningResult {
    if !freq.is_finite() || freq <= 0.0 {
        return TuningResult {
            frequency: freq,
            note: None,
            octave: 0,
            reference_frequency: DEFAULT_REFERENCE_FREQUENCY,
            deviation_hz: 0.0,
            semitone_offset: 0.0,
            cents: 0.0,
        };
    }

    let (note, octave) = match freq_to_note(freq) {
        Some((note, octave)) => (Some(note), octave),
        None => (None, 0),
    };

    let reference_frequency = table
        .nearest(freq)
        .map_or(DEFAULT_REFERENCE_FREQUENCY, |n| n.frequency);

    let semitones = semitone_offset(freq, reference_frequency);

    TuningResult {
        frequency: freq,
        note,
        octave,
        reference_frequency,
        deviation_hz: freq - reference_frequency,
        semitone_offset: semitones,
        cents: 100.0 * semitones,
    }
}
