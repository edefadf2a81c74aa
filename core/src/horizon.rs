//! Horizon aggregator: collapse a 12-month plan to a forecast window.

use crate::{
    depletion::ForecastPlan,
    types::{Color, Horizon},
};
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Replacement events inside a window, per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowTotals {
    pub black:   u32,
    pub cyan:    u32,
    pub magenta: u32,
    pub yellow:  u32,
    pub total:   u32,
}

impl WindowTotals {
    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::Black   => self.black,
            Color::Cyan    => self.cyan,
            Color::Magenta => self.magenta,
            Color::Yellow  => self.yellow,
        }
    }
}

impl Add for WindowTotals {
    type Output = WindowTotals;

    fn add(self, rhs: WindowTotals) -> WindowTotals {
        WindowTotals {
            black:   self.black + rhs.black,
            cyan:    self.cyan + rhs.cyan,
            magenta: self.magenta + rhs.magenta,
            yellow:  self.yellow + rhs.yellow,
            total:   self.total + rhs.total,
        }
    }
}

/// Sum the first `months` slots of one channel.
pub fn channel_total(slots: &[u32], horizon: Horizon) -> u32 {
    slots.iter().take(horizon.months()).sum()
}

/// Sum the first `months` entries of every channel. `months` is clamped to [1, 12].
pub fn window_total(plan: &ForecastPlan, months: u32) -> WindowTotals {
    window(plan, Horizon::new(months))
}

pub fn window(plan: &ForecastPlan, horizon: Horizon) -> WindowTotals {
    let black   = channel_total(&plan.black, horizon);
    let cyan    = channel_total(&plan.cyan, horizon);
    let magenta = channel_total(&plan.magenta, horizon);
    let yellow  = channel_total(&plan.yellow, horizon);
    WindowTotals {
        black,
        cyan,
        magenta,
        yellow,
        total: black + cyan + magenta + yellow,
    }
}
