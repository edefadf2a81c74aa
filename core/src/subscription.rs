//! Subscription pricing engine.
//!
//! Prices a recurring plan for a cohort of transactional devices:
//!   annual fee = fulfillment cost × (1 + markup) + add-ons + ESW surcharge
//!
//! Markup is a step function of the cohort's transactional revenue with an
//! additive manual override. Add-ons and the warranty surcharge pass
//! through at cost.
//!
//! RULE: the class × risk warranty model refuses to price a cohort with
//! any device missing its class or risk tag. It never guesses a rate.

use crate::{
    config::{EngineConfig, EswConfig, MarkupConfig},
    error::{ForecastError, ForecastResult},
    horizon,
    margin::DeviceRow,
    pricing,
    record::DeviceRecord,
    resolver::Variant,
    risk::{self, FleetRisk},
    types::{ratio_or_zero, Horizon, PLAN_MONTHS},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggles {
    pub dca:           bool,
    pub jitr:          bool,
    pub contract_mgmt: bool,
    pub qr:            bool,
    pub esw:           bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EswModel {
    /// One rate per risk level.
    #[default]
    Flat,
    /// Rate per (device class, risk level).
    ClassRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionOptions {
    pub toggles:         Toggles,
    /// Added to the tiered markup. May be negative.
    pub markup_override: f64,
    pub esw_model:       EswModel,
}

/// Tiered markup for a cohort's annual transactional revenue.
pub fn default_markup(revenue: f64, markup: &MarkupConfig) -> f64 {
    markup
        .tiers
        .iter()
        .find(|tier| revenue < tier.below)
        .map(|tier| tier.markup)
        .unwrap_or(markup.top_markup)
}

/// Tiered markup plus override, never below zero.
pub fn applied_markup(revenue: f64, override_delta: f64, markup: &MarkupConfig) -> f64 {
    (default_markup(revenue, markup) + override_delta).max(0.0)
}

pub fn addon_total(enabled: bool, device_count: usize, annual_rate: f64) -> f64 {
    if enabled {
        device_count as f64 * annual_rate
    } else {
        0.0
    }
}

/// Annual warranty surcharge for the cohort.
///
/// `ClassRisk` refuses when any device lacks its class *or* a known risk
/// level, not only when both are missing: either gap leaves no cell of the
/// class × risk table to read.
pub fn esw_surcharge(records: &[&DeviceRecord], model: EswModel, rates: &EswConfig) -> ForecastResult<f64> {
    let months = PLAN_MONTHS as f64;
    match model {
        EswModel::Flat => Ok(records.iter().map(|r| rates.flat.rate(r.risk) * months).sum()),
        EswModel::ClassRisk => {
            let missing: Vec<String> = records
                .iter()
                .filter(|r| r.device_class.is_none() || !r.risk.is_known())
                .map(|r| r.serial.clone())
                .collect();
            if !missing.is_empty() {
                log::warn!("subscription: class x risk ESW blocked by {} device(s)", missing.len());
                return Err(ForecastError::IncompleteWarrantyData { serials: missing });
            }
            Ok(records
                .iter()
                .filter_map(|r| r.device_class.map(|c| rates.by_class.for_class(c).rate(r.risk) * months))
                .sum())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardrails {
    pub volume_lower: u64,
    pub volume_upper: u64,
    pub device_lower: u64,
    pub device_upper: u64,
}

/// Bounds within which the plan price holds: average monthly volume
/// ± `fraction` to the nearest thousand pages, device count ± `fraction`
/// to the nearest device.
pub fn guardrails(avg_monthly_volume: f64, device_count: usize, fraction: f64) -> Guardrails {
    let to_thousand = |v: f64| ((v / 1000.0).round() * 1000.0).max(0.0) as u64;
    let devices = device_count as f64;
    Guardrails {
        volume_lower: to_thousand(avg_monthly_volume * (1.0 - fraction)),
        volume_upper: to_thousand(avg_monthly_volume * (1.0 + fraction)),
        device_lower: (devices * (1.0 - fraction)).round().max(0.0) as u64,
        device_upper: (devices * (1.0 + fraction)).round() as u64,
    }
}

/// Per-page equivalent of the cohort at benchmark rates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CppBenchmark {
    pub mono_pages:  f64,
    pub color_pages: f64,
    pub annual:      f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriptionBreakdown {
    pub fulfillment_cost: f64,
    pub markup_rate:      f64,
    pub markup:           f64,
    pub dca:              f64,
    pub jitr:             f64,
    pub contract_mgmt:    f64,
    pub qr:               f64,
    pub esw:              f64,
}

impl SubscriptionBreakdown {
    pub fn annual_total(&self) -> f64 {
        self.fulfillment_cost + self.markup + self.dca + self.jitr + self.contract_mgmt + self.qr + self.esw
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub devices:               usize,
    pub variant:               Variant,
    /// Annual transactional sell price of the cohort. Drives the markup tier.
    pub transactional_revenue: f64,
    pub options:               SubscriptionOptions,
    pub breakdown:             SubscriptionBreakdown,
    pub annual_fee:            f64,
    pub monthly_fee:           f64,
    pub monthly_per_device:    f64,
    pub guardrails:            Guardrails,
    pub fleet_risk:            FleetRisk,
    pub benchmark:             CppBenchmark,
}

/// Price a subscription for `cohort`. Each row's full 12-month plan is
/// repriced so the result is annual whatever horizon the rows were built at.
pub fn build_plan(
    cohort: &[(&DeviceRecord, &DeviceRow)],
    variant: Variant,
    options: &SubscriptionOptions,
    config: &EngineConfig,
) -> ForecastResult<SubscriptionPlan> {
    let records: Vec<&DeviceRecord> = cohort.iter().map(|(r, _)| *r).collect();
    let count = records.len();

    let (fulfillment_cost, transactional_revenue) =
        cohort.iter().fold((0.0, 0.0), |(cost, sell), (record, row)| {
            let year = horizon::window(&row.plan, Horizon::FULL_YEAR);
            let priced = pricing::price_window(record, &year, variant);
            (cost + priced.cost, sell + priced.sell_price)
        });

    let toggles = options.toggles;
    let markup_rate = applied_markup(transactional_revenue, options.markup_override, &config.markup);
    let esw = if toggles.esw {
        esw_surcharge(&records, options.esw_model, &config.esw)?
    } else {
        0.0
    };

    let breakdown = SubscriptionBreakdown {
        fulfillment_cost,
        markup_rate,
        markup:        fulfillment_cost * markup_rate,
        dca:           addon_total(toggles.dca, count, config.addons.dca),
        jitr:          addon_total(toggles.jitr, count, config.addons.jitr),
        contract_mgmt: addon_total(toggles.contract_mgmt, count, config.addons.contract_mgmt),
        qr:            addon_total(toggles.qr, count, config.addons.qr),
        esw,
    };

    let mono_pages: f64 = records.iter().map(|r| r.black_annual_volume).sum();
    let color_pages: f64 = records.iter().map(|r| r.color_annual_volume).sum();
    let benchmark = CppBenchmark {
        mono_pages,
        color_pages,
        annual: mono_pages * config.benchmark_cpp.mono + color_pages * config.benchmark_cpp.color,
    };

    let annual_fee = breakdown.annual_total();
    let monthly_fee = annual_fee / PLAN_MONTHS as f64;
    let avg_monthly_volume = (mono_pages + color_pages) / PLAN_MONTHS as f64;

    log::info!(
        "subscription: {count} device(s), revenue {transactional_revenue:.2}, markup {:.1}%, annual fee {annual_fee:.2}",
        markup_rate * 100.0
    );

    Ok(SubscriptionPlan {
        devices: count,
        variant,
        transactional_revenue,
        options: *options,
        breakdown,
        annual_fee,
        monthly_fee,
        monthly_per_device: ratio_or_zero(monthly_fee, count as f64),
        guardrails: guardrails(avg_monthly_volume, count, config.guardrail_fraction),
        fleet_risk: risk::fleet_risk(records.iter().copied()),
        benchmark,
    })
}
