//! Note, frequency and cents readout shown beside the dial.

use colored::Colorize;
use dialtune_core::TuningResult;

use super::dial::{self, DeviationBand};

/// Whole cents as shown to the user, truncated toward zero.
pub fn display_cents(result: &TuningResult) -> i32 {
    result.cents as i32
}

/// One-line plain readout, e.g. `A  A4  440.00 Hz  +0 cents`.
pub fn format_readout(result: &TuningResult) -> String {
    let note = result.note.map_or("-", |n| n.as_str());
    let label = result.label().unwrap_or_else(|| "--".to_string());
    format!(
        "{:<2} {:<4} {:>8.2} Hz {:>+4} cents",
        note,
        label,
        result.frequency,
        display_cents(result)
    )
}

/// Readout and dial, colored by deviation band.
pub fn render_line(result: &TuningResult) -> String {
    let band = DeviationBand::classify(result.cents);
    format!(
        "{}  {}",
        format_readout(result).color(band.color()).bold(),
        dial::colored_gauge(Some(result.cents))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialtune_core::tuning::{compute_tuning_result, generate_reference_table};

    #[test]
    fn readout_for_a440() {
        let result = compute_tuning_result(440.0, &generate_reference_table(0, 8));
        assert_eq!(format_readout(&result), "A  A4     440.00 Hz   +0 cents");
    }

    #[test]
    fn cents_truncate_toward_zero() {
        let table = generate_reference_table(0, 8);
        let sharp = compute_tuning_result(445.0, &table);
        assert_eq!(display_cents(&sharp), 19);
        let flat = compute_tuning_result(435.0, &table);
        assert_eq!(display_cents(&flat), -19);
    }

    #[test]
    fn readout_without_note() {
        let result = compute_tuning_result(10.0, &generate_reference_table(0, 8));
        assert!(format_readout(&result).starts_with("-  --"));
    }
}
