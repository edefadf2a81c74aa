//! Fleet snapshot: the in-memory set of device records a request runs against.
//!
//! A snapshot is supplied wholesale. Every derived figure is recomputed
//! from it; nothing is written back.

use crate::{
    error::ForecastResult,
    record::{ContractStatus, DeviceRecord},
    types::CustomerId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Customer filter value meaning "no filter".
pub const ALL_CUSTOMERS: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractFilter {
    #[default]
    All,
    /// `C` devices only.
    Contract,
    /// `T` devices only.
    Transactional,
}

impl ContractFilter {
    pub fn admits(&self, status: ContractStatus) -> bool {
        match self {
            Self::All           => true,
            Self::Contract      => status == ContractStatus::Contract,
            Self::Transactional => status == ContractStatus::Transactional,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    /// Instant staleness is measured against.
    pub as_of:   DateTime<Utc>,
    pub records: Vec<DeviceRecord>,
}

impl FleetSnapshot {
    pub fn new(as_of: DateTime<Utc>, records: Vec<DeviceRecord>) -> Self {
        Self { as_of, records }
    }

    /// Parse a JSON array of flat device objects. Non-object entries are skipped.
    pub fn from_json(content: &str, as_of: DateTime<Utc>) -> ForecastResult<Self> {
        let values: Vec<Value> = serde_json::from_str(content)?;
        Ok(Self::from_values(&values, as_of))
    }

    pub fn from_values(values: &[Value], as_of: DateTime<Utc>) -> Self {
        let records: Vec<DeviceRecord> = values.iter().filter_map(DeviceRecord::from_value).collect();
        let skipped = values.len() - records.len();
        if skipped > 0 {
            log::warn!("snapshot: skipped {skipped} non-object entr(ies)");
        }
        log::info!("snapshot: loaded {} device(s)", records.len());
        Self { as_of, records }
    }

    pub fn load(path: impl AsRef<Path>, as_of: DateTime<Utc>) -> ForecastResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content, as_of)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted unique customer names.
    pub fn customers(&self) -> Vec<CustomerId> {
        self.records
            .iter()
            .map(|r| r.customer.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Records matching a customer (`None` or "All" = every customer) and contract filter.
    pub fn filtered<'a>(
        &'a self,
        customer: Option<&'a str>,
        contract: ContractFilter,
    ) -> impl Iterator<Item = &'a DeviceRecord> + 'a {
        let customer = customer.filter(|c| !c.eq_ignore_ascii_case(ALL_CUSTOMERS));
        self.records.iter().filter(move |r| {
            customer.map_or(true, |c| r.customer == c) && contract.admits(r.contract_status)
        })
    }
}
