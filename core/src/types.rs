//! Shared primitive types used across the entire engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Months in a forecast plan. One slot per calendar month.
pub const PLAN_MONTHS: usize = 12;

/// Days covered by a forecast plan.
pub const PLAN_DAYS: f64 = 365.0;

/// Average month length used for bucketing events.
pub const DAYS_PER_MONTH: f64 = PLAN_DAYS / PLAN_MONTHS as f64;

/// A device serial number, unique within a fleet snapshot.
pub type Serial = String;

/// The customer (monitor account) a device belongs to.
pub type CustomerId = String;

/// One consumable channel. Mono devices only carry `Black`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Black,
    Cyan,
    Magenta,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Black, Color::Cyan, Color::Magenta, Color::Yellow];

    /// Title-case name, as used in the flat record field names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Black   => "Black",
            Self::Cyan    => "Cyan",
            Self::Magenta => "Magenta",
            Self::Yellow  => "Yellow",
        }
    }

    pub fn is_chromatic(&self) -> bool {
        !matches!(self, Self::Black)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A forecast window in months, always within [1, 12].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Horizon(u8);

impl Horizon {
    pub const FULL_YEAR: Horizon = Horizon(PLAN_MONTHS as u8);

    /// Clamp any requested month count into [1, 12].
    pub fn new(months: u32) -> Self {
        Self(months.clamp(1, PLAN_MONTHS as u32) as u8)
    }

    pub fn months(&self) -> usize {
        self.0 as usize
    }

    /// Fraction of a year this window covers.
    pub fn year_fraction(&self) -> f64 {
        self.0 as f64 / PLAN_MONTHS as f64
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::FULL_YEAR
    }
}

impl From<u32> for Horizon {
    fn from(months: u32) -> Self {
        Self::new(months)
    }
}

impl From<Horizon> for u32 {
    fn from(h: Horizon) -> Self {
        h.0 as u32
    }
}

/// Divide, returning 0 instead of NaN or infinity when the denominator is not positive.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && numerator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}
