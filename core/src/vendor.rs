//! Vendor rollup: projected cartridge spend grouped by supplier.
//!
//! For every device channel, candidates are tried in the selected variant's
//! priority order. The first candidate with a named supplier, a positive
//! quantity, a positive unit cost and a usable origin tag wins; the rest of
//! the chain is ignored for that channel.

use crate::{
    config::EngineConfig,
    depletion::{self, ForecastPlan},
    horizon,
    record::DeviceRecord,
    resolver::{self, Field, FieldValue, Variant},
    types::{Color, Horizon},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One winning candidate for a device channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedChannel {
    pub variant:    Variant,
    pub supplier:   String,
    pub sku:        String,
    pub cartridge:  String,
    /// Origin tag, or the variant's implied origin when none is recorded.
    pub style:      String,
    pub quantity:   u32,
    pub unit_price: f64,
}

impl SourcedChannel {
    pub fn spend(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorLine {
    pub supplier:   String,
    /// Models this line supplies.
    pub equipment:  BTreeSet<String>,
    pub sku:        String,
    pub cartridge:  String,
    pub style:      String,
    pub color:      Color,
    pub quantity:   u32,
    /// Merged spend over merged quantity.
    pub unit_price: f64,
    pub spend:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorSummary {
    pub supplier:   String,
    pub cartridges: u32,
    pub spend:      f64,
    pub lines:      Vec<VendorLine>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VendorRollup {
    /// Highest spend first.
    pub vendors:          Vec<VendorSummary>,
    pub total_cartridges: u32,
    pub total_spend:      f64,
}

impl VendorRollup {
    pub fn lines(&self) -> impl Iterator<Item = &VendorLine> {
        self.vendors.iter().flat_map(|v| v.lines.iter())
    }
}

/// Origin for a candidate: the recorded tag, the implied label when the
/// field is absent, or None when the record explicitly marks it unusable.
pub fn candidate_origin(record: &DeviceRecord, color: Color, variant: Variant) -> Option<String> {
    match record.value(Field::Origin(color), variant) {
        None => Some(variant.origin_label().to_string()),
        Some(FieldValue::Text(s)) if !resolver::is_sentinel(s) => Some(s.trim().to_string()),
        Some(_) => None,
    }
}

fn exact_text(record: &DeviceRecord, field: Field, variant: Variant) -> String {
    resolver::exact(record, field, variant)
        .and_then(|r| r.as_text())
        .unwrap_or("")
        .to_string()
}

/// Walks the chain for one device, simulating each variant at most once.
pub struct ChannelSourcer<'a> {
    record:  &'a DeviceRecord,
    horizon: Horizon,
    config:  &'a EngineConfig,
    plans:   BTreeMap<Variant, ForecastPlan>,
}

impl<'a> ChannelSourcer<'a> {
    pub fn new(record: &'a DeviceRecord, horizon: Horizon, config: &'a EngineConfig) -> Self {
        Self { record, horizon, config, plans: BTreeMap::new() }
    }

    fn quantity(&mut self, color: Color, variant: Variant) -> u32 {
        let (record, config) = (self.record, self.config);
        let plan = self
            .plans
            .entry(variant)
            .or_insert_with(|| depletion::simulate(record, variant, config));
        horizon::window(plan, self.horizon).get(color)
    }

    /// First valid candidate for `color`, if any.
    pub fn source(&mut self, color: Color, variant: Variant) -> Option<SourcedChannel> {
        for candidate in variant.priority() {
            let supplier = match resolver::exact(self.record, Field::Supplier(color), candidate)
                .and_then(|r| r.as_text())
            {
                Some(s) => s.to_string(),
                None => continue,
            };
            let unit_price = resolver::exact(self.record, Field::UnitCost(color), candidate)
                .map(|r| r.as_number())
                .unwrap_or(0.0);
            if unit_price <= 0.0 {
                continue;
            }
            let Some(style) = candidate_origin(self.record, color, candidate) else {
                continue;
            };
            let quantity = self.quantity(color, candidate);
            if quantity == 0 {
                continue;
            }
            return Some(SourcedChannel {
                variant: candidate,
                supplier,
                sku: exact_text(self.record, Field::Sku(color), candidate),
                cartridge: exact_text(self.record, Field::Cartridge(color), candidate),
                style,
                quantity,
                unit_price,
            });
        }
        None
    }
}

type LineKey = (String, String, String, Color);

/// Group every sourced channel in `records` by supplier.
pub fn rollup<'a>(
    records: impl IntoIterator<Item = &'a DeviceRecord>,
    variant: Variant,
    horizon: Horizon,
    config: &EngineConfig,
) -> VendorRollup {
    let mut lines: BTreeMap<LineKey, VendorLine> = BTreeMap::new();

    for record in records {
        let mut sourcer = ChannelSourcer::new(record, horizon, config);
        for &color in record.channels() {
            let Some(sourced) = sourcer.source(color, variant) else {
                continue;
            };
            let spend = sourced.spend();
            let key = (sourced.supplier.clone(), sourced.sku.clone(), sourced.style.clone(), color);
            let line = lines.entry(key).or_insert_with(|| VendorLine {
                supplier:   sourced.supplier.clone(),
                equipment:  BTreeSet::new(),
                sku:        sourced.sku.clone(),
                cartridge:  sourced.cartridge.clone(),
                style:      sourced.style.clone(),
                color,
                quantity:   0,
                unit_price: 0.0,
                spend:      0.0,
            });
            if !record.model_label().is_empty() {
                line.equipment.insert(record.model_label().to_string());
            }
            line.quantity += sourced.quantity;
            line.spend += spend;
            line.unit_price = line.spend / line.quantity as f64;
        }
    }

    let mut vendors: BTreeMap<String, VendorSummary> = BTreeMap::new();
    for line in lines.into_values() {
        let summary = vendors.entry(line.supplier.clone()).or_insert_with(|| VendorSummary {
            supplier:   line.supplier.clone(),
            cartridges: 0,
            spend:      0.0,
            lines:      Vec::new(),
        });
        summary.cartridges += line.quantity;
        summary.spend += line.spend;
        summary.lines.push(line);
    }

    let mut vendors: Vec<VendorSummary> = vendors.into_values().collect();
    vendors.sort_by(|a, b| b.spend.total_cmp(&a.spend).then_with(|| a.supplier.cmp(&b.supplier)));

    let total_cartridges: u32 = vendors.iter().map(|v| v.cartridges).sum();
    let total_spend: f64 = vendors.iter().map(|v| v.spend).sum();
    log::debug!("vendor: {} supplier(s), {total_cartridges} cartridge(s)", vendors.len());

    VendorRollup { vendors, total_cartridges, total_spend }
}
