//! # Simulation Module
//!
//! Drives the tuner without a microphone. Frequencies are drawn uniformly
//! from the playable window and pushed through the same note mapping as live
//! audio; only the randomness source is swapped in.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::{
    TuningResult,
    listener::PitchSource,
    tuning::{self, ReferenceTable},
};

/// Draws a frequency uniformly from `[MIN_FREQUENCY, MAX_FREQUENCY]`.
pub fn random_frequency<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(tuning::MIN_FREQUENCY..=tuning::MAX_FREQUENCY)
}

/// Produces a tuning result for a random frequency.
///
/// # Arguments
/// * `rng` - Randomness source
/// * `table` - Reference table to map against
///
/// # Returns
/// * `TuningResult` - Mapping of a frequency inside the playable window
pub fn simulate_tuning_result<R: Rng + ?Sized>(rng: &mut R, table: &ReferenceTable) -> TuningResult {
    tuning::compute_tuning_result(random_frequency(rng), table)
}

/// Creates a deterministic random generator for a seed.
pub fn create_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Pitch feed that emits random frequencies at a fixed cadence.
#[derive(Debug)]
pub struct SimulatedSource<R = Pcg32> {
    rng: R,
    interval: Duration,
}

impl SimulatedSource<Pcg32> {
    /// Seeded simulated feed.
    pub fn seeded(seed: u64, interval: Duration) -> Self {
        Self::new(create_rng(seed), interval)
    }
}

impl<R: Rng> SimulatedSource<R> {
    pub fn new(rng: R, interval: Duration) -> Self {
        Self { rng, interval }
    }
}

impl<R: Rng> PitchSource for SimulatedSource<R> {
    fn next_pitch(&mut self) -> Result<Option<f32>> {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        Ok(Some(random_frequency(&mut self.rng)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{MAX_FREQUENCY, MIN_FREQUENCY, generate_reference_table};

    #[test]
    fn simulated_frequencies_stay_in_window() {
        let table = generate_reference_table(0, 8);
        let mut rng = create_rng(7);
        for _ in 0..10_000 {
            let result = simulate_tuning_result(&mut rng, &table);
            assert!(
                (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&result.frequency),
                "{}",
                result.frequency
            );
            assert!(result.has_note());
            assert!((result.cents - 100.0 * result.semitone_offset).abs() < 1e-3);
        }
    }

    #[test]
    fn same_seed_same_results() {
        let table = generate_reference_table(0, 8);
        let mut a = create_rng(42);
        let mut b = create_rng(42);
        for _ in 0..100 {
            assert_eq!(
                simulate_tuning_result(&mut a, &table),
                simulate_tuning_result(&mut b, &table)
            );
        }
    }

    #[test]
    fn simulation_matches_direct_mapping() {
        let table = generate_reference_table(0, 8);
        let mut draw = create_rng(3);
        let mut simulate = create_rng(3);
        let freq = random_frequency(&mut draw);
        assert_eq!(
            simulate_tuning_result(&mut simulate, &table),
            tuning::compute_tuning_result(freq, &table)
        );
    }

    #[test]
    fn simulated_source_yields_in_range_pitches() {
        let mut source = SimulatedSource::seeded(11, Duration::ZERO);
        for _ in 0..50 {
            let pitch = source.next_pitch().unwrap().expect("always produces a pitch");
            assert!(tuning::is_in_range(pitch));
        }
    }
}
