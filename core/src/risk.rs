//! Risk & staleness classification.
//!
//! Runs independently of the forecast. Produces the margin-at-risk view:
//! devices ordered worst margin first, riskiest first among equals.

use crate::{
    config::{CoverageBand, EngineConfig},
    margin::DeviceRow,
    record::{ContractStatus, DeviceRecord},
    types::Color,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
    Unknown,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low"                => Self::Low,
            "moderate" | "medium" => Self::Moderate,
            "high"               => Self::High,
            "critical"           => Self::Critical,
            _                    => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low      => "Low",
            Self::Moderate => "Moderate",
            Self::High     => "High",
            Self::Critical => "Critical",
            Self::Unknown  => "Unknown",
        }
    }

    /// Sort rank: Critical=4 … Low=1, unknown=0.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High     => 3,
            Self::Moderate => 2,
            Self::Low      => 1,
            Self::Unknown  => 0,
        }
    }

    /// Scoring ordinal: Low=0 … Critical=3. Unknown has none.
    pub fn ordinal(&self) -> Option<f64> {
        match self {
            Self::Low      => Some(0.0),
            Self::Moderate => Some(1.0),
            Self::High     => Some(2.0),
            Self::Critical => Some(3.0),
            Self::Unknown  => None,
        }
    }

    /// Map a weighted ordinal back to a label.
    pub fn from_score(score: f64) -> Self {
        if score >= 2.5 {
            Self::Critical
        } else if score >= 1.5 {
            Self::High
        } else if score >= 0.5 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FleetRisk {
    pub score: f64,
    pub level: RiskLevel,
    /// Devices that contributed a known risk level.
    pub rated_devices: usize,
}

/// Volume-weighted average risk ordinal across devices with a known level.
/// Falls back to equal weights when the rated devices report no volume.
pub fn fleet_risk<'a>(records: impl IntoIterator<Item = &'a DeviceRecord>) -> FleetRisk {
    let rated: Vec<(f64, f64)> = records
        .into_iter()
        .filter_map(|r| r.risk.ordinal().map(|o| (o, r.total_annual_volume().max(0.0))))
        .collect();

    if rated.is_empty() {
        return FleetRisk { score: 0.0, level: RiskLevel::Low, rated_devices: 0 };
    }

    let total_weight: f64 = rated.iter().map(|(_, w)| w).sum();
    let score = if total_weight > 0.0 {
        rated.iter().map(|(o, w)| o * w).sum::<f64>() / total_weight
    } else {
        rated.iter().map(|(o, _)| o).sum::<f64>() / rated.len() as f64
    };

    FleetRisk { score, level: RiskLevel::from_score(score), rated_devices: rated.len() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageFlag {
    Low,
    Normal,
    High,
}

pub fn coverage_flag(coverage: f64, band: &CoverageBand) -> CoverageFlag {
    if coverage > band.high {
        CoverageFlag::High
    } else if coverage < band.low {
        CoverageFlag::Low
    } else {
        CoverageFlag::Normal
    }
}

/// Coverage flags for the channels a device consumes. Channels without a
/// reading are skipped; mono devices never report chromatic flags.
pub fn coverage_flags(record: &DeviceRecord, config: &EngineConfig) -> Vec<(Color, CoverageFlag)> {
    let unit = config.coverage_unit;
    record
        .channels()
        .iter()
        .filter_map(|&c| {
            let raw = record.telemetry(c).coverage?;
            Some((c, coverage_flag(unit.to_fraction(raw), &config.coverage_band)))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfflineFilter {
    #[default]
    All,
    Offline,
    Online,
}

impl OfflineFilter {
    pub fn admits(&self, offline: bool) -> bool {
        match self {
            Self::All     => true,
            Self::Offline => offline,
            Self::Online  => !offline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMarginRow {
    pub customer:     String,
    pub serial:       String,
    pub model:        String,
    pub status:       String,
    pub black_volume: f64,
    pub color_volume: f64,
    pub revenue:      f64,
    pub cost:         f64,
    pub gm_dollar:    f64,
    pub risk:         RiskLevel,
    pub offline:      bool,
}

impl RiskMarginRow {
    /// Revenue is sell price for transactional devices, contract revenue otherwise.
    pub fn from_device(row: &DeviceRow) -> Self {
        let revenue = match row.contract_status {
            ContractStatus::Transactional => row.sell_price,
            _                             => row.contract_revenue,
        };
        Self {
            customer:     row.customer.clone(),
            serial:       row.serial.clone(),
            model:        row.model.clone(),
            status:       row.contract_status.code().to_string(),
            black_volume: row.black_volume,
            color_volume: row.color_volume,
            revenue,
            cost:         row.cost,
            gm_dollar:    revenue - row.cost,
            risk:         row.risk,
            offline:      row.stale,
        }
    }
}

/// Ascending GM dollars, zero-GM rows last, riskiest first among ties.
pub fn margin_order(a: &RiskMarginRow, b: &RiskMarginRow) -> Ordering {
    let a_zero = a.gm_dollar == 0.0;
    let b_zero = b.gm_dollar == 0.0;
    match (a_zero, b_zero) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a
            .gm_dollar
            .total_cmp(&b.gm_dollar)
            .then_with(|| b.risk.rank().cmp(&a.risk.rank())),
    }
}

/// Build the margin-at-risk table from device rows.
pub fn risk_margin_rows(rows: &[DeviceRow], filter: OfflineFilter) -> Vec<RiskMarginRow> {
    let mut out: Vec<RiskMarginRow> = rows
        .iter()
        .filter(|r| filter.admits(r.stale))
        .map(RiskMarginRow::from_device)
        .collect();
    out.sort_by(margin_order);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RiskMarginTotals {
    pub black_volume: f64,
    pub color_volume: f64,
    pub revenue:      f64,
    pub cost:         f64,
    pub gm_dollar:    f64,
}

pub fn risk_margin_totals(rows: &[RiskMarginRow]) -> RiskMarginTotals {
    rows.iter().fold(RiskMarginTotals::default(), |acc, r| RiskMarginTotals {
        black_volume: acc.black_volume + r.black_volume,
        color_volume: acc.color_volume + r.color_volume,
        revenue:      acc.revenue + r.revenue,
        cost:         acc.cost + r.cost,
        gm_dollar:    acc.gm_dollar + r.gm_dollar,
    })
}
