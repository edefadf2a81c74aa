//! Contract document payload.
//!
//! The document service renders a subscription agreement from a flat JSON
//! object. Key names are fixed by its templates and must not change.

use crate::{
    config::EngineConfig,
    record::DeviceRecord,
    resolver::Variant,
    subscription::SubscriptionPlan,
    types::Horizon,
    vendor::{self, ChannelSourcer},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Who the agreement is between. Supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractParties {
    pub customer_name: String,
    pub dealer_name:   String,
    pub rep_name:      String,
    pub start_date:    Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDevice {
    #[serde(rename = "Model")]
    pub model:               String,
    #[serde(rename = "Serial")]
    pub serial:              String,
    #[serde(rename = "Black_Annual_Volume")]
    pub black_annual_volume: f64,
    #[serde(rename = "Color_Annual_Volume")]
    pub color_annual_volume: f64,
    #[serde(rename = "Volume")]
    pub volume:              f64,
    /// Origin label per channel the device consumes, keyed by color name.
    #[serde(rename = "Sourcing")]
    pub sourcing:            BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractPayload {
    #[serde(rename = "Payload_Id")]
    pub payload_id:               Uuid,
    #[serde(rename = "Customer_Name")]
    pub customer_name:            String,
    #[serde(rename = "Dealer_Name")]
    pub dealer_name:              String,
    #[serde(rename = "Rep_Name")]
    pub rep_name:                 String,
    #[serde(rename = "Start_Date")]
    pub start_date:               String,
    #[serde(rename = "Contract_Effective_Date")]
    pub effective_date:           String,
    #[serde(rename = "Monthly_Subscription_Fee")]
    pub monthly_fee:              String,
    #[serde(rename = "includeDCA")]
    pub include_dca:              bool,
    #[serde(rename = "includeJITR")]
    pub include_jitr:             bool,
    #[serde(rename = "includeContractMgmt")]
    pub include_contract_mgmt:    bool,
    #[serde(rename = "includeQR")]
    pub include_qr:               bool,
    #[serde(rename = "includeESW")]
    pub include_esw:              bool,
    #[serde(rename = "Devices_Table")]
    pub devices:                  Vec<ContractDevice>,
    #[serde(rename = "Guardrails_Table")]
    pub guardrails:               Vec<(String, String)>,
}

/// Origin label for each channel: the style of the candidate the vendor
/// rollup sources it from over a full year. A channel no candidate covers
/// reports the selected variant's own origin.
pub fn sourcing_labels(record: &DeviceRecord, variant: Variant, config: &EngineConfig) -> BTreeMap<String, String> {
    let mut sourcer = ChannelSourcer::new(record, Horizon::FULL_YEAR, config);
    record
        .channels()
        .iter()
        .map(|&color| {
            let label = match sourcer.source(color, variant) {
                Some(sourced) => sourced.style,
                None => vendor::candidate_origin(record, color, variant)
                    .unwrap_or_else(|| variant.origin_label().to_string()),
            };
            (color.label().to_string(), label)
        })
        .collect()
}

/// Devices ordered by descending total annual volume, serial as tie-break.
pub fn device_table<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    variant: Variant,
    config: &EngineConfig,
) -> Vec<ContractDevice> {
    let mut devices: Vec<ContractDevice> = records
        .into_iter()
        .map(|r| ContractDevice {
            model:               r.model_label().to_string(),
            serial:              r.serial.clone(),
            black_annual_volume: r.black_annual_volume,
            color_annual_volume: r.color_annual_volume,
            volume:              r.total_annual_volume(),
            sourcing:            sourcing_labels(r, variant, config),
        })
        .collect();
    devices.sort_by(|a, b| b.volume.total_cmp(&a.volume).then_with(|| a.serial.cmp(&b.serial)));
    devices
}

pub fn build_payload<'a>(
    parties: &ContractParties,
    plan: &SubscriptionPlan,
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    config: &EngineConfig,
) -> ContractPayload {
    let start = parties.start_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let toggles = plan.options.toggles;
    let g = plan.guardrails;

    ContractPayload {
        payload_id:            Uuid::new_v4(),
        customer_name:         parties.customer_name.clone(),
        dealer_name:           parties.dealer_name.clone(),
        rep_name:              parties.rep_name.clone(),
        effective_date:        start.clone(),
        start_date:            start,
        monthly_fee:           format!("{:.2}", plan.monthly_fee),
        include_dca:           toggles.dca,
        include_jitr:          toggles.jitr,
        include_contract_mgmt: toggles.contract_mgmt,
        include_qr:            toggles.qr,
        include_esw:           toggles.esw,
        devices:               device_table(records, plan.variant, config),
        guardrails: vec![
            ("Fleet Output Avg. Mth. Lower Limit:".to_string(), g.volume_lower.to_string()),
            ("Fleet Output Avg. Mth. Upper Limit:".to_string(), g.volume_upper.to_string()),
            ("Device Lower Limit:".to_string(), g.device_lower.to_string()),
            ("Device Upper Limit:".to_string(), g.device_upper.to_string()),
        ],
    }
}
