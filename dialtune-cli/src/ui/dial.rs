//! # Dial Widget
//!
//! Text rendering of the tuning dial: a half circle of tick marks with a
//! needle that swings left when flat and right when sharp.
//!
//! ## Features
//! - Color bands by cent deviation (green when in tune, red when far off)
//! - Needle angle of +-90 degrees at +-50 cents
//! - Fixed marker at twelve o'clock

use colored::{Color, ColoredString, Colorize};

/// Cent deviation that swings the needle to the edge of the dial.
pub const METER_RANGE: f32 = 50.0;

/// Number of tick marks across the half dial.
pub const TICK_COUNT: usize = 71;

/// Color class for a cent deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviationBand {
    /// Under 1 cent
    InTune,
    /// 1 to 5 cents
    Close,
    /// 5 to 15 cents
    Near,
    /// 15 to 25 cents
    Off,
    /// Over 25 cents
    Far,
}

impl DeviationBand {
    /// Classifies a deviation by magnitude. NaN counts as in tune.
    pub fn classify(cents: f32) -> Self {
        let magnitude = cents.abs();
        if magnitude > 25.0 {
            DeviationBand::Far
        } else if magnitude >= 15.0 {
            DeviationBand::Off
        } else if magnitude >= 5.0 {
            DeviationBand::Near
        } else if magnitude >= 1.0 {
            DeviationBand::Close
        } else {
            DeviationBand::InTune
        }
    }

    pub fn color(self) -> Color {
        match self {
            DeviationBand::InTune => Color::Green,
            DeviationBand::Close => Color::TrueColor { r: 0x9B, g: 0xFF, b: 0x00 },
            DeviationBand::Near => Color::Yellow,
            DeviationBand::Off => Color::TrueColor { r: 0xFF, g: 0xA5, b: 0x00 },
            DeviationBand::Far => Color::Red,
        }
    }
}

/// Needle angle in degrees from twelve o'clock, positive when sharp.
///
/// Not clamped: deviations beyond [`METER_RANGE`] point past the dial edge.
pub fn needle_angle_degrees(cents: f32) -> f32 {
    (cents / METER_RANGE) * 90.0
}

/// Tick the needle points at, clamped to the dial.
pub fn needle_tick(cents: f32) -> usize {
    let angle = needle_angle_degrees(cents);
    if angle.is_nan() {
        return TICK_COUNT / 2;
    }
    let fraction = (angle.clamp(-90.0, 90.0) + 90.0) / 180.0;
    (fraction * (TICK_COUNT - 1) as f32).round() as usize
}

/// Draws the dial as plain characters.
///
/// `|` marks twelve o'clock, `^` the needle. With no deviation only the ticks
/// and the fixed marker are drawn.
pub fn render_gauge(cents: Option<f32>) -> String {
    let center = TICK_COUNT / 2;
    let needle = cents.map(needle_tick);
    (0..TICK_COUNT)
        .map(|tick| {
            if Some(tick) == needle {
                '^'
            } else if tick == center {
                '|'
            } else {
                '·'
            }
        })
        .collect()
}

/// The dial colored by deviation band.
pub fn colored_gauge(cents: Option<f32>) -> ColoredString {
    let gauge = render_gauge(cents);
    match cents {
        Some(c) => gauge.color(DeviationBand::classify(c).color()),
        None => gauge.normal(),
    }
}
