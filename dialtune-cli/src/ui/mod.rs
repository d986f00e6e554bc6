//! # UI Module
//!
//! Terminal rendering of tuning results.

pub mod dial;
pub mod readout;
