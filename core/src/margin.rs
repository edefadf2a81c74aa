//! Revenue/cost aggregator: device rows and their customer and fleet rollups.
//!
//! RULE: aggregate GM% is always recomputed from summed cost and revenue.
//! Never average per-device percentages.

use crate::{
    clock,
    config::EngineConfig,
    depletion::ForecastPlan,
    horizon::{self, WindowTotals},
    pricing::{self, ChannelPricing},
    record::{ContractStatus, ContractTerms, DeviceClass, DeviceRecord, DeviceType},
    resolver::Variant,
    risk::{self, CoverageFlag, RiskLevel},
    types::{ratio_or_zero, Color, Horizon},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// (SP − Cost) / SP, or 0 when SP ≤ 0.
pub fn transactional_gm(sell_price: f64, cost: f64) -> f64 {
    ratio_or_zero(sell_price - cost, sell_price)
}

/// (Revenue − Cost) / Revenue, or 0 when Revenue ≤ 0.
pub fn contract_gm(contract_revenue: f64, cost: f64) -> f64 {
    ratio_or_zero(contract_revenue - cost, contract_revenue)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRow {
    pub customer:            String,
    pub serial:              String,
    pub model:               String,
    pub manufacturer:        String,
    pub device_type:         DeviceType,
    pub device_class:        Option<DeviceClass>,
    pub contract_status:     ContractStatus,
    pub risk:                RiskLevel,
    /// Annual volumes scaled to the window and rounded.
    pub black_volume:        f64,
    pub color_volume:        f64,
    pub plan:                ForecastPlan,
    pub cartridges:          WindowTotals,
    pub cost:                f64,
    pub sell_price:          f64,
    pub contract_revenue:    f64,
    pub reported_cost:       f64,
    pub reported_sell_price: f64,
    pub transactional_gm:    f64,
    pub contract_gm:         f64,
    pub stale:               bool,
    pub last_updated:        Option<DateTime<Utc>>,
    pub coverage_flags:      Vec<(Color, CoverageFlag)>,
    pub channels:            Vec<ChannelPricing>,
    pub terms:               ContractTerms,
}

impl DeviceRow {
    pub fn build(
        record: &DeviceRecord,
        plan: ForecastPlan,
        variant: Variant,
        horizon: Horizon,
        as_of: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Self {
        let cartridges = horizon::window(&plan, horizon);
        let priced = pricing::price_window(record, &cartridges, variant);
        let (reported_cost, reported_sell_price) = pricing::reported_window(record, variant, horizon);
        let scale = horizon.year_fraction();
        let contract_revenue = record.contract_revenue * scale;

        Self {
            customer:         record.customer.clone(),
            serial:           record.serial.clone(),
            model:            record.model_label().to_string(),
            manufacturer:     record.manufacturer.clone().unwrap_or_default(),
            device_type:      record.device_type,
            device_class:     record.device_class,
            contract_status:  record.contract_status,
            risk:             record.risk,
            black_volume:     (record.black_annual_volume * scale).round(),
            color_volume:     (record.color_annual_volume * scale).round(),
            plan,
            cartridges,
            cost:             priced.cost,
            sell_price:       priced.sell_price,
            contract_revenue,
            reported_cost,
            reported_sell_price,
            transactional_gm: transactional_gm(priced.sell_price, priced.cost),
            contract_gm:      contract_gm(contract_revenue, priced.cost),
            stale:            clock::is_stale(record.last_updated, as_of, config.stale_after_days),
            last_updated:     record.last_updated.and_then(clock::excel_serial_to_datetime),
            coverage_flags:   risk::coverage_flags(record, config),
            channels:         priced.channels,
            terms:            record.terms.clone(),
        }
    }
}

/// Summable figures for any group of devices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MarginTotals {
    pub devices:            usize,
    pub black_volume:       f64,
    pub color_volume:       f64,
    pub cartridges:         WindowTotals,
    pub cost:               f64,
    pub sell_price:         f64,
    pub contract_revenue:   f64,
    pub base_charge_annual: f64,
    pub included_mono:      f64,
    pub included_color:     f64,
    pub billable_mono:      f64,
    pub billable_color:     f64,
}

impl MarginTotals {
    pub fn add_row(&mut self, row: &DeviceRow) {
        self.devices            += 1;
        self.black_volume       += row.black_volume;
        self.color_volume       += row.color_volume;
        self.cartridges          = self.cartridges + row.cartridges;
        self.cost               += row.cost;
        self.sell_price         += row.sell_price;
        self.contract_revenue   += row.contract_revenue;
        self.base_charge_annual += row.terms.base_charge_annual;
        self.included_mono      += row.terms.included_mono;
        self.included_color     += row.terms.included_color;
        self.billable_mono      += row.terms.billable_mono;
        self.billable_color     += row.terms.billable_color;
    }

    /// Combine two partial totals. Order does not matter.
    pub fn merge(mut self, other: &MarginTotals) -> MarginTotals {
        self.devices            += other.devices;
        self.black_volume       += other.black_volume;
        self.color_volume       += other.color_volume;
        self.cartridges          = self.cartridges + other.cartridges;
        self.cost               += other.cost;
        self.sell_price         += other.sell_price;
        self.contract_revenue   += other.contract_revenue;
        self.base_charge_annual += other.base_charge_annual;
        self.included_mono      += other.included_mono;
        self.included_color     += other.included_color;
        self.billable_mono      += other.billable_mono;
        self.billable_color     += other.billable_color;
        self
    }

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a DeviceRow>) -> Self {
        let mut totals = Self::default();
        for row in rows {
            totals.add_row(row);
        }
        totals
    }

    pub fn transactional_gm(&self) -> f64 {
        transactional_gm(self.sell_price, self.cost)
    }

    pub fn contract_gm(&self) -> f64 {
        contract_gm(self.contract_revenue, self.cost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label:            String,
    pub totals:           MarginTotals,
    pub transactional_gm: f64,
    pub contract_gm:      f64,
}

impl GroupSummary {
    pub fn new(label: impl Into<String>, totals: MarginTotals) -> Self {
        Self {
            label: label.into(),
            transactional_gm: totals.transactional_gm(),
            contract_gm: totals.contract_gm(),
            totals,
        }
    }
}

/// One subtotal per customer, ordered by customer name.
pub fn rollup_by_customer(rows: &[DeviceRow]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<&str, MarginTotals> = BTreeMap::new();
    for row in rows {
        groups.entry(row.customer.as_str()).or_default().add_row(row);
    }
    groups
        .into_iter()
        .map(|(customer, totals)| GroupSummary::new(customer, totals))
        .collect()
}

pub fn grand_totals(rows: &[DeviceRow]) -> GroupSummary {
    GroupSummary::new("Grand Totals", MarginTotals::from_rows(rows))
}
