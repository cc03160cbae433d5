//! Risk module
//!
//! Fractional Kelly position sizing

mod kelly;

pub use kelly::{kelly_fraction, KellySizer};
