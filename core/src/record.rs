//! Device records: one physical device from a fleet snapshot.
//!
//! Records arrive as flat JSON objects with inconsistent typing: numbers
//! may be strings, fields may be null or absent. Ingestion is lenient;
//! anything unparseable is simply not stored, so downstream code sees
//! `None` or a resolver fallback rather than an error.

use crate::{
    resolver::{Field, FieldKind, FieldValue, Variant},
    risk::RiskLevel,
    types::{Color, CustomerId, Serial},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Mono,
    Color,
}

impl DeviceType {
    pub fn channels(&self) -> &'static [Color] {
        match self {
            Self::Mono  => &[Color::Black],
            Self::Color => &Color::ALL,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mono  => "Mono",
            Self::Color => "Color",
        }
    }
}

/// Device class tier used by the class x risk warranty table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceClass {
    #[serde(rename = "Class 1")]
    One,
    #[serde(rename = "Class 2")]
    Two,
}

impl DeviceClass {
    pub fn parse(raw: &str) -> Option<Self> {
        let t = raw.trim().to_ascii_lowercase();
        match t.trim_start_matches("class").trim() {
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            _   => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::One => "Class 1",
            Self::Two => "Class 2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Covered by a cost-per-page contract (`C`).
    Contract,
    /// Billed per cartridge shipped (`T`).
    Transactional,
    Unknown,
}

impl ContractStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "C" | "CONTRACT"      => Self::Contract,
            "T" | "TRANSACTIONAL" => Self::Transactional,
            _                     => Self::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Contract      => "C",
            Self::Transactional => "T",
            Self::Unknown       => "",
        }
    }
}

/// Live consumable state for one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelTelemetry {
    pub pages_left: Option<f64>,
    pub days_left:  Option<f64>,
    pub fill_level: Option<f64>,
    /// Measured coverage as exported. `EngineConfig::coverage_unit` says how to read it.
    pub coverage:   Option<f64>,
}

/// Cost-per-page contract terms. Only meaningful for `ContractStatus::Contract`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractTerms {
    pub mono_cpp:           f64,
    pub color_cpp:          f64,
    pub base_charge_annual: f64,
    pub included_mono:      f64,
    pub included_color:     f64,
    pub billable_mono:      f64,
    pub billable_color:     f64,
    pub contract_end:       Option<String>,
    pub age_years:          Option<f64>,
    pub usage_percent:      Option<f64>,
    pub engine_cycles:      Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct DeviceRecord {
    pub customer:            CustomerId,
    pub serial:              Serial,
    pub manufacturer:        Option<String>,
    pub model:               Option<String>,
    pub device_type:         DeviceType,
    pub device_class:        Option<DeviceClass>,
    pub contract_status:     ContractStatus,
    pub contract_revenue:    f64,
    pub black_annual_volume: f64,
    pub color_annual_volume: f64,
    /// Excel serial date of the last telemetry report.
    pub last_updated:        Option<f64>,
    pub risk:                RiskLevel,
    pub terms:               ContractTerms,
    channels:                [ChannelTelemetry; 4],
    fields:                  HashMap<(Field, Variant), FieldValue>,
}

impl DeviceRecord {
    /// Build a record from one flat JSON object.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let color_annual_volume = number(map, "Color_Annual_Volume").unwrap_or(0.0);
        let device_type = match text(map, "Device_Type").map(|s| s.to_ascii_lowercase()) {
            Some(t) if t.starts_with("mono") => DeviceType::Mono,
            Some(t) if t.starts_with("colo") => DeviceType::Color,
            _ if color_annual_volume > 0.0   => DeviceType::Color,
            _                                => DeviceType::Mono,
        };

        let channels = Color::ALL.map(|c| ChannelTelemetry {
            pages_left: number(map, &format!("{c}_Pages_Left")),
            days_left:  number(map, &format!("{c}_Days_Left")),
            fill_level: number(map, &format!("{c}_Fill_Level")),
            coverage:   number(map, &format!("{c}_Page_Coverage_Percent")),
        });

        let mut fields = HashMap::new();
        for field in Field::all() {
            for variant in Variant::ALL {
                let found = field.base_names().iter().find_map(|base| {
                    let key = format!("{}{}", variant.prefix(), base);
                    match field.kind() {
                        FieldKind::Numeric     => number(map, &key).map(FieldValue::Number),
                        FieldKind::Descriptive => text(map, &key).map(FieldValue::Text),
                    }
                });
                if let Some(value) = found {
                    fields.insert((field, variant), value);
                }
            }
        }

        Self {
            customer:            text(map, "Monitor").unwrap_or_default(),
            serial:              text(map, "Serial_Number").unwrap_or_default(),
            manufacturer:        text(map, "Manufacturer"),
            model:               text(map, "Printer_Model"),
            device_type,
            device_class:        text(map, "Device_Class").and_then(|s| DeviceClass::parse(&s)),
            contract_status:     text(map, "Contract_Status")
                                     .map(|s| ContractStatus::parse(&s))
                                     .unwrap_or(ContractStatus::Unknown),
            contract_revenue:    number(map, "Contract_Total_Revenue").unwrap_or(0.0),
            black_annual_volume: number(map, "Black_Annual_Volume").unwrap_or(0.0),
            color_annual_volume,
            last_updated:        number(map, "Last_Updated"),
            risk:                text(map, "Final_Risk_Level")
                                     .map(|s| RiskLevel::parse(&s))
                                     .unwrap_or(RiskLevel::Unknown),
            terms: ContractTerms {
                mono_cpp:           number(map, "Contract_Mono_CPP").unwrap_or(0.0),
                color_cpp:          number(map, "Contract_Color_CPP").unwrap_or(0.0),
                base_charge_annual: number(map, "Contract_Base_Charge_Annual").unwrap_or(0.0),
                included_mono:      number(map, "Included_Mono_Volume").unwrap_or(0.0),
                included_color:     number(map, "Included_Color_Volume").unwrap_or(0.0),
                billable_mono:      number(map, "Billable_Mono_Pages").unwrap_or(0.0),
                billable_color:     number(map, "Billable_Color_Pages").unwrap_or(0.0),
                contract_end:       text(map, "contract_end"),
                age_years:          number(map, "Recalculated_Age_Years"),
                usage_percent:      number(map, "Usage_Percent"),
                engine_cycles:      number(map, "Engine_Cycles"),
            },
            channels,
            fields,
        }
    }

    /// Parse a JSON value that should be an object. Anything else yields None.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_map)
    }

    pub fn is_color(&self) -> bool {
        self.device_type == DeviceType::Color
    }

    /// Channels this device actually consumes.
    pub fn channels(&self) -> &'static [Color] {
        self.device_type.channels()
    }

    pub fn telemetry(&self, color: Color) -> &ChannelTelemetry {
        &self.channels[color as usize]
    }

    /// Forecast annual page volume driving a channel.
    pub fn annual_volume(&self, color: Color) -> f64 {
        if color.is_chromatic() {
            self.color_annual_volume
        } else {
            self.black_annual_volume
        }
    }

    pub fn total_annual_volume(&self) -> f64 {
        self.black_annual_volume + self.color_annual_volume
    }

    /// Raw stored value for exactly this `(field, variant)`.
    pub fn value(&self, field: Field, variant: Variant) -> Option<&FieldValue> {
        self.fields.get(&(field, variant))
    }

    pub fn model_label(&self) -> &str {
        self.model.as_deref().unwrap_or("")
    }
}

impl From<Map<String, Value>> for DeviceRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(&map)
    }
}

/// Lenient numeric read: JSON numbers, or strings that parse after trimming
/// currency symbols, thousands separators and a trailing percent sign.
fn number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match map.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .trim_end_matches('%')
            .replace(',', "")
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
