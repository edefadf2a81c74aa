//! Field resolver: typed access to variant-specific record fields.
//!
//! Every priced or sourced value on a device exists once per supply-source
//! variant. The flat JSON spells these as `Buy_Price`, `R_Buy_Price`,
//! `N_Buy_Price`; ingestion folds them into a table keyed by
//! `(Field, Variant)` so nothing downstream builds field names by hand.
//!
//! RULE: resolution never fails. A missing or sentinel value falls back to
//! the default variant, then to a contextual zero.

use crate::{record::DeviceRecord, types::Color};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values that mean "nothing here" in descriptive fields.
const SENTINELS: [&str; 3] = ["not reqd", "not required", "n/a"];

/// One of the three interchangeable sourcing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    /// First-party cartridges. Fields carry no prefix.
    #[serde(rename = "O", alias = "primary")]
    Primary,
    /// Remanufactured cartridges, `R_` prefix.
    #[serde(rename = "R", alias = "refurbished")]
    Refurbished,
    /// Third-party new-build cartridges, `N_` prefix.
    #[serde(rename = "N", alias = "third_party")]
    ThirdParty,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Primary, Variant::Refurbished, Variant::ThirdParty];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Primary     => "",
            Self::Refurbished => "R_",
            Self::ThirdParty  => "N_",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Primary     => "O",
            Self::Refurbished => "R",
            Self::ThirdParty  => "N",
        }
    }

    /// Parse the single-letter code used by callers. Unknown codes yield None.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "O" => Some(Self::Primary),
            "R" => Some(Self::Refurbished),
            "N" => Some(Self::ThirdParty),
            _   => None,
        }
    }

    /// Sourcing label reported when a record carries no explicit origin tag.
    pub fn origin_label(&self) -> &'static str {
        match self {
            Self::Primary     => "OEM",
            Self::Refurbished => "Reman",
            Self::ThirdParty  => "New Build",
        }
    }

    /// Order in which variants are tried when walking the whole chain.
    pub fn priority(&self) -> [Variant; 3] {
        match self {
            Self::Primary     => [Self::Primary, Self::Refurbished, Self::ThirdParty],
            Self::Refurbished => [Self::Refurbished, Self::ThirdParty, Self::Primary],
            Self::ThirdParty  => [Self::ThirdParty, Self::Refurbished, Self::Primary],
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::Primary
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Descriptive,
}

/// A logical field that exists once per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    UnitCost(Color),
    UnitSell(Color),
    YieldEstimate(Color),
    Sku(Color),
    Cartridge(Color),
    Supplier(Color),
    Origin(Color),
    FulfillmentCost,
    TransactionalSp,
}

impl Field {
    /// Every variant-bearing field, in ingestion order.
    pub fn all() -> Vec<Field> {
        let mut fields = Vec::with_capacity(Color::ALL.len() * 7 + 2);
        for color in Color::ALL {
            fields.extend([
                Field::UnitCost(color),
                Field::UnitSell(color),
                Field::YieldEstimate(color),
                Field::Sku(color),
                Field::Cartridge(color),
                Field::Supplier(color),
                Field::Origin(color),
            ]);
        }
        fields.push(Field::FulfillmentCost);
        fields.push(Field::TransactionalSp);
        fields
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::UnitCost(_)
            | Self::UnitSell(_)
            | Self::YieldEstimate(_)
            | Self::FulfillmentCost
            | Self::TransactionalSp => FieldKind::Numeric,
            Self::Sku(_)
            | Self::Cartridge(_)
            | Self::Supplier(_)
            | Self::Origin(_) => FieldKind::Descriptive,
        }
    }

    /// Unprefixed source names, canonical first. Later entries are accepted
    /// aliases from older exports.
    pub fn base_names(&self) -> &'static [&'static str] {
        use Color::*;
        match self {
            Self::UnitCost(Black)        => &["Buy_Price", "Black_Cartridge_Cost"],
            Self::UnitCost(Cyan)         => &["Cyan_Cartridge_Cost"],
            Self::UnitCost(Magenta)      => &["Magenta_Cartridge_Cost"],
            Self::UnitCost(Yellow)       => &["Yellow_Cartridge_Cost"],
            Self::UnitSell(Black)        => &["Sell_Price", "Black_Cartridge_SP"],
            Self::UnitSell(Cyan)         => &["Cyan_Cartridge_SP"],
            Self::UnitSell(Magenta)      => &["Magenta_Cartridge_SP"],
            Self::UnitSell(Yellow)       => &["Yellow_Cartridge_SP"],
            Self::YieldEstimate(Black)   => &["Black_Yield_Estimate"],
            Self::YieldEstimate(Cyan)    => &["Cyan_Yield_Estimate"],
            Self::YieldEstimate(Magenta) => &["Magenta_Yield_Estimate"],
            Self::YieldEstimate(Yellow)  => &["Yellow_Yield_Estimate"],
            Self::Sku(Black)             => &["Black_SKU"],
            Self::Sku(Cyan)              => &["Cyan_SKU"],
            Self::Sku(Magenta)           => &["Magenta_SKU"],
            Self::Sku(Yellow)            => &["Yellow_SKU"],
            Self::Cartridge(Black)       => &["Black_Cartridge"],
            Self::Cartridge(Cyan)        => &["Cyan_Cartridge"],
            Self::Cartridge(Magenta)     => &["Magenta_Cartridge"],
            Self::Cartridge(Yellow)      => &["Yellow_Cartridge"],
            Self::Supplier(Black)        => &["Supplier_Black"],
            Self::Supplier(Cyan)         => &["Supplier_Cyan"],
            Self::Supplier(Magenta)      => &["Supplier_Magenta"],
            Self::Supplier(Yellow)       => &["Supplier_Yellow"],
            Self::Origin(Black)          => &["Black_Origin"],
            Self::Origin(Cyan)           => &["Cyan_Origin"],
            Self::Origin(Magenta)        => &["Magenta_Origin"],
            Self::Origin(Yellow)         => &["Yellow_Origin"],
            Self::FulfillmentCost        => &["Twelve_Month_Fulfillment_Cost", "12_Mth_Fulfillment_Cost"],
            Self::TransactionalSp        => &["Twelve_Month_Transactional_SP", "12_Mth_Transactional_SP"],
        }
    }
}

/// A stored field value, already parsed to the field's kind at ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// The outcome of a resolution. `NotRequired` is the descriptive zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Number(f64),
    Text(&'a str),
    NotRequired,
}

impl<'a> Resolved<'a> {
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(*s),
            _ => None,
        }
    }
}

pub fn is_sentinel(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || SENTINELS.iter().any(|s| t.eq_ignore_ascii_case(s))
}

/// The value stored for exactly this variant, if it is usable.
pub fn exact<'a>(record: &'a DeviceRecord, field: Field, variant: Variant) -> Option<Resolved<'a>> {
    match (field.kind(), record.value(field, variant)?) {
        (FieldKind::Numeric, FieldValue::Number(n)) if n.is_finite() => Some(Resolved::Number(*n)),
        (FieldKind::Descriptive, FieldValue::Text(s)) if !is_sentinel(s) => Some(Resolved::Text(s.trim())),
        _ => None,
    }
}

/// Resolve `field` for `variant`, falling back to the default (unprefixed)
/// value and finally to a contextual zero.
pub fn resolve<'a>(record: &'a DeviceRecord, field: Field, variant: Variant) -> Resolved<'a> {
    exact(record, field, variant)
        .or_else(|| exact(record, field, Variant::Primary))
        .unwrap_or(match field.kind() {
            FieldKind::Numeric     => Resolved::Number(0.0),
            FieldKind::Descriptive => Resolved::NotRequired,
        })
}

pub fn resolve_number(record: &DeviceRecord, field: Field, variant: Variant) -> f64 {
    resolve(record, field, variant).as_number()
}

pub fn resolve_text<'a>(record: &'a DeviceRecord, field: Field, variant: Variant) -> Option<&'a str> {
    resolve(record, field, variant).as_text()
}

/// Walk every variant in `variant`'s priority order and return the first
/// usable value along with the variant that supplied it.
pub fn resolve_chain<'a>(
    record: &'a DeviceRecord,
    field: Field,
    variant: Variant,
) -> Option<(Variant, Resolved<'a>)> {
    variant
        .priority()
        .into_iter()
        .find_map(|v| exact(record, field, v).map(|r| (v, r)))
}
