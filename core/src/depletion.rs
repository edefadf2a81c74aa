//! Depletion simulator: when will each cartridge run out?
//!
//! For each channel a device consumes, the current cartridge empties after
//! `days_left` days. Every replacement after that lasts for the rated yield,
//! scaled to the device's real coverage, divided by daily page demand.
//! Each exhaustion is one replacement event in the month it lands in.
//!
//! A channel with unusable telemetry forecasts nothing. That is a normal
//! outcome, not an error.

use crate::{
    config::EngineConfig,
    record::DeviceRecord,
    resolver::{self, Field, Variant},
    types::{Color, DAYS_PER_MONTH, PLAN_DAYS, PLAN_MONTHS},
};
use serde::{Deserialize, Serialize};

/// Replacement events per month, one row per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForecastPlan {
    pub black:   [u32; PLAN_MONTHS],
    pub cyan:    [u32; PLAN_MONTHS],
    pub magenta: [u32; PLAN_MONTHS],
    pub yellow:  [u32; PLAN_MONTHS],
}

impl ForecastPlan {
    pub fn channel(&self, color: Color) -> &[u32; PLAN_MONTHS] {
        match color {
            Color::Black   => &self.black,
            Color::Cyan    => &self.cyan,
            Color::Magenta => &self.magenta,
            Color::Yellow  => &self.yellow,
        }
    }

    fn channel_mut(&mut self, color: Color) -> &mut [u32; PLAN_MONTHS] {
        match color {
            Color::Black   => &mut self.black,
            Color::Cyan    => &mut self.cyan,
            Color::Magenta => &mut self.magenta,
            Color::Yellow  => &mut self.yellow,
        }
    }

    pub fn is_empty(&self) -> bool {
        Color::ALL.iter().all(|&c| self.channel(c).iter().all(|&n| n == 0))
    }
}

/// Why a channel produced no forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingTelemetry,
    NoDemand,
    NoYield,
}

/// Everything the simulation needs for one channel, already validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelInputs {
    /// Day on which the installed cartridge runs out.
    pub first_event_day: f64,
    /// Pages per day.
    pub daily_demand:    f64,
    /// Pages per replacement cartridge at measured coverage.
    pub adjusted_yield:  f64,
}

impl ChannelInputs {
    pub fn interval_days(&self) -> f64 {
        self.adjusted_yield / self.daily_demand
    }
}

/// Scale a rated yield from reference coverage to measured coverage.
///
/// Missing, zero or non-finite coverage counts as the reference value.
pub fn adjusted_yield(rated_yield: f64, coverage: Option<f64>, reference_coverage: f64) -> f64 {
    let actual = match coverage {
        Some(c) if c.is_finite() && c > 0.0 => c,
        _ => reference_coverage,
    };
    rated_yield * (reference_coverage / actual)
}

pub fn channel_inputs(
    record: &DeviceRecord,
    color: Color,
    variant: Variant,
    config: &EngineConfig,
) -> Result<ChannelInputs, SkipReason> {
    let telemetry = record.telemetry(color);
    let (pages_left, days_left) = match (telemetry.pages_left, telemetry.days_left) {
        (Some(p), Some(d)) if p >= 0.0 && d >= 0.0 => (p, d),
        _ => return Err(SkipReason::MissingTelemetry),
    };

    let annual = record.annual_volume(color);
    let daily_demand = if annual > 0.0 {
        annual / PLAN_DAYS
    } else if days_left > 0.0 {
        pages_left / days_left
    } else {
        0.0
    };
    if !(daily_demand.is_finite() && daily_demand > 0.0) {
        return Err(SkipReason::NoDemand);
    }

    let rated = resolver::resolve_number(record, Field::YieldEstimate(color), variant);
    let coverage = telemetry.coverage.map(|raw| config.coverage_unit.to_fraction(raw));
    let adjusted = adjusted_yield(rated, coverage, config.reference_coverage);
    if !(adjusted.is_finite() && adjusted > 0.0) {
        return Err(SkipReason::NoYield);
    }

    Ok(ChannelInputs {
        first_event_day: days_left,
        daily_demand,
        adjusted_yield: adjusted,
    })
}

/// Walk a day pointer through the year, one event per exhausted cartridge.
pub fn simulate_channel(inputs: &ChannelInputs, max_events: u32) -> [u32; PLAN_MONTHS] {
    let mut counts = [0u32; PLAN_MONTHS];
    let interval = inputs.interval_days();
    if !(interval.is_finite() && interval > 0.0) {
        return counts;
    }

    let mut day = inputs.first_event_day;
    let mut events = 0u32;
    while day < PLAN_DAYS && events < max_events {
        let bucket = ((day / DAYS_PER_MONTH).floor() as usize).min(PLAN_MONTHS - 1);
        counts[bucket] += 1;
        events += 1;
        day += interval;
    }

    if events == max_events && day < PLAN_DAYS {
        log::warn!(
            "depletion: event cap {max_events} reached with {:.1} days left in the year",
            PLAN_DAYS - day
        );
    }
    counts
}

/// Simulate every channel the device consumes under `variant`.
pub fn simulate(record: &DeviceRecord, variant: Variant, config: &EngineConfig) -> ForecastPlan {
    let mut plan = ForecastPlan::default();
    for &color in record.channels() {
        match channel_inputs(record, color, variant, config) {
            Ok(inputs) => {
                *plan.channel_mut(color) = simulate_channel(&inputs, config.max_events_per_channel);
            }
            Err(reason) => {
                log::debug!("depletion: {} {color} not forecast ({reason:?})", record.serial);
            }
        }
    }
    plan
}
