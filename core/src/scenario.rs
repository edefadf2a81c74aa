//! Synthetic fleet generation for demos and determinism checks.
//!
//! Produces flat device objects in the same shape a telemetry export
//! delivers, so a generated fleet goes through normal ingestion.
//! Same seed = same fleet, byte for byte.

use crate::{
    clock,
    rng::{ScenarioRng, Stream},
    snapshot::FleetSnapshot,
    types::{Color, PLAN_DAYS},
};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

struct ModelSpec {
    manufacturer: &'static str,
    model:        &'static str,
    code:         &'static str,
    color:        bool,
    class:        u8,
    black_yield:  f64,
    color_yield:  f64,
    black_cost:   f64,
    color_cost:   f64,
}

const MODELS: &[ModelSpec] = &[
    ModelSpec { manufacturer: "HP",      model: "LaserJet Pro M404n",         code: "HP404",  color: false, class: 1, black_yield: 3000.0,  color_yield: 0.0,    black_cost: 89.0,  color_cost: 0.0 },
    ModelSpec { manufacturer: "HP",      model: "LaserJet Enterprise M507",   code: "HP507",  color: false, class: 2, black_yield: 11000.0, color_yield: 0.0,    black_cost: 189.0, color_cost: 0.0 },
    ModelSpec { manufacturer: "HP",      model: "Color LaserJet M479fdw",     code: "HP479",  color: true,  class: 1, black_yield: 2400.0,  color_yield: 2100.0, black_cost: 85.0,  color_cost: 99.0 },
    ModelSpec { manufacturer: "Canon",   model: "imageRUNNER ADV C3530i",     code: "CN3530", color: true,  class: 2, black_yield: 35000.0, color_yield: 19000.0, black_cost: 62.0, color_cost: 128.0 },
    ModelSpec { manufacturer: "Brother", model: "HL-L6200DW",                 code: "BRL6200", color: false, class: 1, black_yield: 8000.0, color_yield: 0.0,    black_cost: 118.0, color_cost: 0.0 },
    ModelSpec { manufacturer: "Lexmark", model: "CS521dn",                    code: "LXC521", color: true,  class: 1, black_yield: 3500.0,  color_yield: 3500.0, black_cost: 104.0, color_cost: 142.0 },
    ModelSpec { manufacturer: "Xerox",   model: "VersaLink C405",             code: "XVC405", color: true,  class: 2, black_yield: 10500.0, color_yield: 8000.0, black_cost: 171.0, color_cost: 236.0 },
    ModelSpec { manufacturer: "Kyocera", model: "ECOSYS P3155dn",             code: "KYP3155", color: false, class: 2, black_yield: 25000.0, color_yield: 0.0,   black_cost: 152.0, color_cost: 0.0 },
];

const CUSTOMER_PREFIXES: &[&str] = &[
    "Summit", "Harbor", "Granite", "Cedar", "Northwind", "Bluewater", "Ironwood",
    "Lakeside", "Redstone", "Silverline", "Meridian", "Pioneer",
];

const CUSTOMER_INDUSTRIES: &[&str] = &[
    "Legal", "Dental", "Logistics", "Accounting", "Insurance", "Realty",
    "Engineering", "Medical", "Freight", "Architecture",
];

const CUSTOMER_SUFFIXES: &[&str] = &["Group", "Partners", "LLC", "Inc.", "Associates", "Co."];

const RISK_LEVELS: &[&str] = &["Low", "Low", "Moderate", "Moderate", "High", "Critical"];

/// (variant prefix, supplier, origin tag, cost factor, yield factor)
const SOURCES: &[(&str, &str, &str, f64, f64)] = &[
    ("",   "Supplies Network", "OEM",       1.00, 1.00),
    ("R_", "Clover Imaging",   "Reman",     0.68, 0.95),
    ("N_", "Katun",            "New Build", 0.55, 0.90),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioSpec {
    pub devices: usize,
    pub seed:    u64,
}

impl ScenarioSpec {
    pub fn new(devices: usize, seed: u64) -> Self {
        Self { devices, seed }
    }

    fn customer_count(&self) -> usize {
        (self.devices / 8).clamp(1, 40)
    }
}

fn customer_name(rng: &mut ScenarioRng) -> String {
    format!(
        "{} {} {}",
        rng.pick(CUSTOMER_PREFIXES),
        rng.pick(CUSTOMER_INDUSTRIES),
        rng.pick(CUSTOMER_SUFFIXES)
    )
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Generate flat device objects for `spec`, stamped relative to `as_of`.
pub fn generate(spec: ScenarioSpec, as_of: DateTime<Utc>) -> Vec<Value> {
    let mut customer_rng  = ScenarioRng::new(spec.seed, Stream::Customers);
    let mut device_rng    = ScenarioRng::new(spec.seed, Stream::Devices);
    let mut telemetry_rng = ScenarioRng::new(spec.seed, Stream::Telemetry);
    let mut pricing_rng   = ScenarioRng::new(spec.seed, Stream::Pricing);

    let customers: Vec<String> = (0..spec.customer_count()).map(|_| customer_name(&mut customer_rng)).collect();
    let as_of_serial = clock::datetime_to_excel_serial(as_of);

    (0..spec.devices)
        .map(|i| {
            let model = device_rng.pick(MODELS);
            let mut map = Map::new();

            map.insert("Monitor".into(), json!(device_rng.pick(&customers)));
            map.insert("Serial_Number".into(), json!(format!("{}-{:05}", model.code, i + 1)));
            map.insert("Manufacturer".into(), json!(model.manufacturer));
            map.insert("Printer_Model".into(), json!(model.model));
            map.insert("Device_Type".into(), json!(if model.color { "Color" } else { "Mono" }));
            if !device_rng.chance(0.05) {
                map.insert("Device_Class".into(), json!(format!("Class {}", model.class)));
            }
            if !device_rng.chance(0.08) {
                map.insert("Final_Risk_Level".into(), json!(device_rng.pick(RISK_LEVELS)));
            }

            let transactional = device_rng.chance(0.6);
            map.insert("Contract_Status".into(), json!(if transactional { "T" } else { "C" }));

            let black_volume = (device_rng.range(4_000.0, 90_000.0) / 100.0).round() * 100.0;
            let color_volume = if model.color {
                (device_rng.range(2_000.0, 30_000.0) / 100.0).round() * 100.0
            } else {
                0.0
            };
            map.insert("Black_Annual_Volume".into(), json!(black_volume));
            map.insert("Color_Annual_Volume".into(), json!(color_volume));

            let age = telemetry_rng.range(0.0, 9.0);
            map.insert("Last_Updated".into(), json!(round2(as_of_serial - age)));

            let colors: &[Color] = if model.color { &Color::ALL } else { &[Color::Black] };
            for &color in colors {
                let (rated, annual) = if color.is_chromatic() {
                    (model.color_yield, color_volume)
                } else {
                    (model.black_yield, black_volume)
                };
                let fill = telemetry_rng.range(0.03, 1.0);
                let pages_left = (rated * fill).round();
                let days_left = (pages_left / (annual / PLAN_DAYS)).round();
                map.insert(format!("{color}_Pages_Left"), json!(pages_left));
                map.insert(format!("{color}_Days_Left"), json!(days_left));
                map.insert(format!("{color}_Fill_Level"), json!(round2(fill * 100.0)));
                map.insert(format!("{color}_Page_Coverage_Percent"), json!(round2(telemetry_rng.range(3.5, 7.0)) / 100.0));
            }

            let mut twelve_month_cost = 0.0;
            let mut twelve_month_sp = 0.0;
            for &(prefix, supplier, origin, cost_factor, yield_factor) in SOURCES {
                for &color in colors {
                    let (base_cost, base_yield, annual) = if color.is_chromatic() {
                        (model.color_cost, model.color_yield, color_volume)
                    } else {
                        (model.black_cost, model.black_yield, black_volume)
                    };
                    let cost = round2(base_cost * cost_factor * pricing_rng.range(0.95, 1.05));
                    let sell = round2(cost * pricing_rng.range(1.2, 1.6));
                    let (cost_key, sell_key) = match color {
                        Color::Black => ("Buy_Price".to_string(), "Sell_Price".to_string()),
                        _ => (format!("{color}_Cartridge_Cost"), format!("{color}_Cartridge_SP")),
                    };
                    map.insert(format!("{prefix}{cost_key}"), json!(cost));
                    map.insert(format!("{prefix}{sell_key}"), json!(sell));
                    map.insert(format!("{prefix}{color}_Yield_Estimate"), json!((base_yield * yield_factor).round()));
                    map.insert(format!("{prefix}{color}_SKU"), json!(format!("{prefix}{}-{}", model.code, &color.label()[..1])));
                    map.insert(format!("{prefix}{color}_Cartridge"), json!(format!("{} {color} Toner", model.model)));
                    map.insert(format!("{prefix}Supplier_{color}"), json!(supplier));
                    map.insert(format!("{prefix}{color}_Origin"), json!(origin));
                    if prefix.is_empty() {
                        let cartridges = (annual / base_yield).ceil();
                        twelve_month_cost += cartridges * cost;
                        twelve_month_sp += cartridges * sell;
                    }
                }
            }
            map.insert("Twelve_Month_Fulfillment_Cost".into(), json!(round2(twelve_month_cost)));
            map.insert("Twelve_Month_Transactional_SP".into(), json!(round2(twelve_month_sp)));

            if !transactional {
                let mono_cpp = round2(pricing_rng.range(0.8, 1.5)) / 100.0;
                let color_cpp = if model.color { round2(pricing_rng.range(4.0, 8.0)) / 100.0 } else { 0.0 };
                let base = (pricing_rng.range(300.0, 1_500.0) / 10.0).round() * 10.0;
                map.insert("Contract_Mono_CPP".into(), json!(mono_cpp));
                map.insert("Contract_Color_CPP".into(), json!(color_cpp));
                map.insert("Contract_Base_Charge_Annual".into(), json!(base));
                map.insert("Included_Mono_Volume".into(), json!(black_volume * 0.5));
                map.insert("Included_Color_Volume".into(), json!(color_volume * 0.5));
                map.insert("Billable_Mono_Pages".into(), json!(black_volume * 0.5));
                map.insert("Billable_Color_Pages".into(), json!(color_volume * 0.5));
                map.insert(
                    "Contract_Total_Revenue".into(),
                    json!(round2(base + black_volume * mono_cpp + color_volume * color_cpp)),
                );
            }

            Value::Object(map)
        })
        .collect()
}

pub fn generate_snapshot(spec: ScenarioSpec, as_of: DateTime<Utc>) -> FleetSnapshot {
    let values = generate(spec, as_of);
    log::info!("scenario: generated {} device(s) from seed {}", values.len(), spec.seed);
    FleetSnapshot::from_values(&values, as_of)
}
