//! The forecast engine: runs a request against a fleet snapshot.
//!
//! PIPELINE (fixed order):
//!   1. Select records (customer + contract filters)
//!   2. Depletion simulation per device, under the requested variant
//!   3. Horizon window, pricing, device rows (margin + staleness + coverage)
//!   4. Customer subtotals and grand totals
//!   5. Vendor rollup across the variant priority chain
//!   6. Risk/margin rows, filtered by offline state
//!   7. Subscription plan over the transactional cohort
//!
//! RULES:
//!   - Every result is a pure function of (snapshot, request, config).
//!   - Batching never changes results; `run` is built from `batches`.

use crate::{
    config::EngineConfig,
    contract::{self, ContractPayload},
    depletion,
    error::ForecastError,
    margin::{self, DeviceRow, GroupSummary},
    record::{ContractStatus, DeviceRecord},
    request::ForecastRequest,
    resolver::Variant,
    risk::{self, FleetRisk, RiskMarginRow, RiskMarginTotals},
    snapshot::FleetSnapshot,
    subscription::{self, SubscriptionPlan},
    types::Horizon,
    vendor::{self, VendorRollup},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscriptionOutcome {
    Priced(SubscriptionPlan),
    /// The class x risk warranty model refused the cohort.
    Blocked { reason: String, serials: Vec<String> },
    /// No transactional devices in the selection.
    Empty,
}

impl SubscriptionOutcome {
    pub fn plan(&self) -> Option<&SubscriptionPlan> {
        match self {
            Self::Priced(plan) => Some(plan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetReport {
    pub variant:      Variant,
    pub horizon:      Horizon,
    pub as_of:        DateTime<Utc>,
    pub devices:      Vec<DeviceRow>,
    pub customers:    Vec<GroupSummary>,
    pub grand_totals: GroupSummary,
    pub vendors:      VendorRollup,
    pub risk_rows:    Vec<RiskMarginRow>,
    pub risk_totals:  RiskMarginTotals,
    pub fleet_risk:   FleetRisk,
    pub subscription: SubscriptionOutcome,
    pub contract:     Option<ContractPayload>,
}

pub struct ForecastEngine {
    config: EngineConfig,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forecast, window and price one device.
    pub fn device_row(&self, record: &DeviceRecord, request: &ForecastRequest, as_of: DateTime<Utc>) -> DeviceRow {
        let plan = depletion::simulate(record, request.variant, &self.config);
        DeviceRow::build(record, plan, request.variant, request.horizon, as_of, &self.config)
    }

    /// Device rows for the selected records, `batch_size` at a time.
    /// The caller drives the iterator and may stop between batches.
    pub fn batches<'a>(&'a self, snapshot: &'a FleetSnapshot, request: &'a ForecastRequest) -> ForecastBatches<'a> {
        ForecastBatches {
            engine:  self,
            records: select(snapshot, request),
            request,
            as_of:   snapshot.as_of,
            cursor:  0,
        }
    }

    pub fn run(&self, snapshot: &FleetSnapshot, request: &ForecastRequest) -> FleetReport {
        let records = select(snapshot, request);
        let devices: Vec<DeviceRow> = self.batches(snapshot, request).flatten().collect();
        log::info!(
            "engine: {} device(s), variant {}, {} month(s)",
            devices.len(),
            request.variant,
            request.horizon.months()
        );

        let customers = margin::rollup_by_customer(&devices);
        let grand_totals = margin::grand_totals(&devices);
        let vendors = vendor::rollup(records.iter().copied(), request.variant, request.horizon, &self.config);
        let risk_rows = risk::risk_margin_rows(&devices, request.offline);
        let risk_totals = risk::risk_margin_totals(&risk_rows);
        let fleet_risk = risk::fleet_risk(records.iter().copied());

        let cohort: Vec<(&DeviceRecord, &DeviceRow)> = records
            .iter()
            .copied()
            .zip(devices.iter())
            .filter(|(r, _)| r.contract_status == ContractStatus::Transactional)
            .collect();
        let subscription = self.price_subscription(&cohort, request);

        let contract = match (&request.parties, subscription.plan()) {
            (Some(parties), Some(plan)) => {
                Some(contract::build_payload(parties, plan, cohort.iter().map(|(r, _)| *r), &self.config))
            }
            _ => None,
        };

        FleetReport {
            variant: request.variant,
            horizon: request.horizon,
            as_of: snapshot.as_of,
            devices,
            customers,
            grand_totals,
            vendors,
            risk_rows,
            risk_totals,
            fleet_risk,
            subscription,
            contract,
        }
    }

    fn price_subscription(
        &self,
        cohort: &[(&DeviceRecord, &DeviceRow)],
        request: &ForecastRequest,
    ) -> SubscriptionOutcome {
        if cohort.is_empty() {
            return SubscriptionOutcome::Empty;
        }
        match subscription::build_plan(cohort, request.variant, &request.subscription, &self.config) {
            Ok(plan) => SubscriptionOutcome::Priced(plan),
            Err(e) => {
                let serials = match &e {
                    ForecastError::IncompleteWarrantyData { serials } => serials.clone(),
                    _ => Vec::new(),
                };
                SubscriptionOutcome::Blocked { reason: e.to_string(), serials }
            }
        }
    }
}

fn select<'a>(snapshot: &'a FleetSnapshot, request: &'a ForecastRequest) -> Vec<&'a DeviceRecord> {
    snapshot.filtered(request.customer.as_deref(), request.contract).collect()
}

pub struct ForecastBatches<'a> {
    engine:  &'a ForecastEngine,
    records: Vec<&'a DeviceRecord>,
    request: &'a ForecastRequest,
    as_of:   DateTime<Utc>,
    cursor:  usize,
}

impl ForecastBatches<'_> {
    pub fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }
}

impl Iterator for ForecastBatches<'_> {
    type Item = Vec<DeviceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.records.len() {
            return None;
        }
        let end = (self.cursor + self.engine.config.batch_size.max(1)).min(self.records.len());
        let batch = self.records[self.cursor..end]
            .iter()
            .map(|r| self.engine.device_row(r, self.request, self.as_of))
            .collect();
        log::debug!("engine: batch {}..{end} of {}", self.cursor, self.records.len());
        self.cursor = end;
        Some(batch)
    }
}
