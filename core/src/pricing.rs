//! Pricing resolver: unit prices per channel, extended by forecast quantity.
//!
//! Black prices live in the generic `Buy_Price` / `Sell_Price` fields;
//! chromatic channels use `<Color>_Cartridge_Cost` / `<Color>_Cartridge_SP`.
//! Both go through the field resolver, so a missing variant price falls
//! back to the default price and then to zero.

use crate::{
    horizon::WindowTotals,
    record::DeviceRecord,
    resolver::{self, Field, Variant},
    types::{Color, Horizon},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn field(&self, color: Color) -> Field {
        match self {
            Self::Buy  => Field::UnitCost(color),
            Self::Sell => Field::UnitSell(color),
        }
    }
}

/// Per-cartridge price for one channel.
pub fn price(record: &DeviceRecord, color: Color, direction: Direction, variant: Variant) -> f64 {
    resolver::resolve_number(record, direction.field(color), variant)
}

pub fn extend(quantity: u32, unit_price: f64) -> f64 {
    quantity as f64 * unit_price
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelPricing {
    pub color:     Color,
    pub quantity:  u32,
    pub unit_cost: f64,
    pub unit_sell: f64,
    pub cost:      f64,
    pub sell:      f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DevicePricing {
    /// Fulfillment cost of the windowed cartridges.
    pub cost:       f64,
    /// Transactional sell price of the same cartridges.
    pub sell_price: f64,
    pub channels:   Vec<ChannelPricing>,
}

/// Price every channel the device consumes for the windowed quantities.
pub fn price_window(record: &DeviceRecord, totals: &WindowTotals, variant: Variant) -> DevicePricing {
    let channels: Vec<ChannelPricing> = record
        .channels()
        .iter()
        .map(|&color| {
            let quantity = totals.get(color);
            let unit_cost = price(record, color, Direction::Buy, variant);
            let unit_sell = price(record, color, Direction::Sell, variant);
            ChannelPricing {
                color,
                quantity,
                unit_cost,
                unit_sell,
                cost: extend(quantity, unit_cost),
                sell: extend(quantity, unit_sell),
            }
        })
        .collect();

    DevicePricing {
        cost:       channels.iter().map(|c| c.cost).sum(),
        sell_price: channels.iter().map(|c| c.sell).sum(),
        channels,
    }
}

/// The export's own twelve-month cost and sell price, scaled to the window.
/// Reported beside the forecast figures for reconciliation.
pub fn reported_window(record: &DeviceRecord, variant: Variant, horizon: Horizon) -> (f64, f64) {
    let scale = horizon.year_fraction();
    (
        resolver::resolve_number(record, Field::FulfillmentCost, variant) * scale,
        resolver::resolve_number(record, Field::TransactionalSp, variant) * scale,
    )
}
