//! Property-based tests for the note mapper using proptest.
//!
//! ```bash
//! cargo test -p dialtune-core --test note_mapper
//! ```

use proptest::prelude::*;

use dialtune_core::simulation::{create_rng, simulate_tuning_result};
use dialtune_core::tuning::{
    self, A_ROOTED_NOTES, MAX_FREQUENCY, MIN_FREQUENCY, NoteName, ReferenceTable,
    compute_tuning_result, freq_to_note, generate_reference_table,
};

fn playable_frequency() -> impl Strategy<Value = f32> {
    MIN_FREQUENCY..=MAX_FREQUENCY
}

proptest! {
    /// Cents are always a hundred times the semitone offset.
    #[test]
    fn cents_track_semitones(freq in 1.0f32..20_000.0, start in -2i32..5, span in 0i32..6) {
        let table = generate_reference_table(start, start + span);
        let result = compute_tuning_result(freq, &table);
        prop_assert!((result.cents - 100.0 * result.semitone_offset).abs() < 1e-3);
        prop_assert_eq!(result.deviation_hz, freq - result.reference_frequency);
    }

    /// The chosen reference is at least as close as every other entry.
    #[test]
    fn reference_is_nearest(freq in playable_frequency()) {
        let table = generate_reference_table(0, 8);
        let result = compute_tuning_result(freq, &table);
        let best = (result.reference_frequency - freq).abs();
        for entry in &table {
            prop_assert!(best <= (entry.frequency - freq).abs());
        }
    }

    /// Every playable frequency maps to a note, and the note sits within
    /// half a semitone of the input.
    #[test]
    fn playable_frequencies_have_notes(freq in playable_frequency()) {
        let (note, octave) = freq_to_note(freq).expect("in range");
        prop_assert!((0..=8).contains(&octave));

        let table = generate_reference_table(0, 8);
        let reference = table.find(note, octave).expect("note in table");
        let semitones = tuning::semitone_offset(freq, reference.frequency);
        prop_assert!(semitones.abs() <= 0.5 + 1e-3, "{} -> {}{} ({})", freq, note, octave, semitones);
    }

    /// Anything outside the window is "no note", never a panic.
    #[test]
    fn out_of_window_has_no_note(freq in prop_oneof![
        -1.0e6f32..MIN_FREQUENCY - 0.01,
        MAX_FREQUENCY + 0.01..1.0e6f32,
    ]) {
        prop_assert_eq!(freq_to_note(freq), None);
        let result = compute_tuning_result(freq, &generate_reference_table(0, 8));
        prop_assert!(result.note.is_none());
        prop_assert_eq!(result.octave, 0);
    }

    /// Octaves double for every note, whatever the range.
    #[test]
    fn octaves_double(start in -4i32..6, span in 1i32..5) {
        let table = generate_reference_table(start, start + span);
        prop_assert_eq!(table.len(), 12 * (span as usize + 1));
        for entry in &table {
            if let Some(above) = table.find(entry.note, entry.octave + 1) {
                let ratio = above.frequency / entry.frequency;
                prop_assert!((ratio - 2.0).abs() / 2.0 < 1e-4);
            }
        }
    }

    /// Seeded simulations stay inside the window.
    #[test]
    fn simulations_stay_in_window(seed in any::<u64>()) {
        let table = generate_reference_table(0, 8);
        let mut rng = create_rng(seed);
        for _ in 0..100 {
            let result = simulate_tuning_result(&mut rng, &table);
            prop_assert!((MIN_FREQUENCY..=MAX_FREQUENCY).contains(&result.frequency));
        }
    }
}

#[test]
fn every_key_of_the_piano_is_labelled() {
    // Walk A0..=G#8 key by key and check the A-rooted label cycle.
    for key in 1..=96 {
        let freq = 440.0 * 2.0_f32.powf((key as f32 - 49.0) / 12.0);
        let (note, octave) = freq_to_note(freq).expect("in range");
        assert_eq!(note, A_ROOTED_NOTES[(key - 1) % 12], "key {key}");
        assert_eq!(octave, (key as i32 + 8) / 12, "key {key}");
    }
}

#[test]
fn converter_and_table_agree_on_labels() {
    let table = generate_reference_table(0, 8);
    for entry in &table {
        if let Some((note, octave)) = freq_to_note(entry.frequency) {
            assert_eq!((note, octave), (entry.note, entry.octave), "{entry:?}");
        }
    }
}

#[test]
fn empty_table_uses_default_reference() {
    let result = compute_tuning_result(500.0, &ReferenceTable::empty());
    assert_eq!(result.reference_frequency, tuning::DEFAULT_REFERENCE_FREQUENCY);
    assert_eq!(result.note, Some(NoteName::B));
}
