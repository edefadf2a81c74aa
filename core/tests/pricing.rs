use chrono::{TimeZone, Utc};
use fleet_forecast_core::{
    clock,
    config::EngineConfig,
    depletion::ForecastPlan,
    horizon::WindowTotals,
    margin::{self, DeviceRow},
    pricing::{self, Direction},
    record::DeviceRecord,
    resolver::Variant,
    types::{Color, Horizon},
};
use serde_json::json;

fn record(value: serde_json::Value) -> DeviceRecord {
    DeviceRecord::from_value(&value).expect("test record must be an object")
}

fn color_device() -> DeviceRecord {
    record(json!({
        "Monitor": "Acme",
        "Serial_Number": "CLR-1",
        "Device_Type": "Color",
        "Buy_Price": 80, "Sell_Price": 100,
        "Cyan_Cartridge_Cost": 50, "Cyan_Cartridge_SP": 70,
        "R_Cyan_Cartridge_Cost": 30,
    }))
}

#[test]
fn black_uses_generic_price_fields() {
    let r = color_device();
    assert_eq!(pricing::price(&r, Color::Black, Direction::Buy, Variant::Primary), 80.0);
    assert_eq!(pricing::price(&r, Color::Black, Direction::Sell, Variant::Primary), 100.0);
    assert_eq!(pricing::price(&r, Color::Cyan, Direction::Sell, Variant::Primary), 70.0);
    assert_eq!(pricing::price(&r, Color::Yellow, Direction::Buy, Variant::Primary), 0.0);
}

#[test]
fn window_pricing_extends_each_channel() {
    let r = color_device();
    let totals = WindowTotals { black: 2, cyan: 1, magenta: 0, yellow: 0, total: 3 };

    let primary = pricing::price_window(&r, &totals, Variant::Primary);
    assert_eq!(primary.cost, 210.0);
    assert_eq!(primary.sell_price, 270.0);
    assert_eq!(primary.channels.len(), 4);

    let reman = pricing::price_window(&r, &totals, Variant::Refurbished);
    assert_eq!(reman.cost, 190.0, "R cyan cost applies, black falls back");
    assert_eq!(reman.sell_price, 270.0);
}

#[test]
fn mono_device_prices_black_only() {
    let r = record(json!({ "Device_Type": "Mono", "Buy_Price": 40, "Cyan_Cartridge_Cost": 999 }));
    let totals = WindowTotals { black: 3, cyan: 5, magenta: 0, yellow: 0, total: 8 };
    let priced = pricing::price_window(&r, &totals, Variant::Primary);
    assert_eq!(priced.channels.len(), 1);
    assert_eq!(priced.cost, 120.0);
}

#[test]
fn gm_percent_is_zero_for_non_positive_denominators() {
    assert_eq!(margin::transactional_gm(100.0, 80.0), 0.2);
    assert_eq!(margin::transactional_gm(0.0, 50.0), 0.0);
    assert_eq!(margin::transactional_gm(-10.0, 50.0), 0.0);
    assert_eq!(margin::contract_gm(0.0, 10.0), 0.0);
    assert_eq!(margin::contract_gm(200.0, 250.0), -0.25);
    assert!(margin::transactional_gm(100.0, 0.0) <= 1.0);
}

fn as_of() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("valid date")
}

fn contract_device(customer: &str, serial: &str, black_price: f64, sell_price: f64) -> DeviceRecord {
    record(json!({
        "Monitor": customer,
        "Serial_Number": serial,
        "Device_Type": "Mono",
        "Contract_Status": "C",
        "Contract_Total_Revenue": 1200,
        "Black_Annual_Volume": 10000,
        "Buy_Price": black_price,
        "Sell_Price": sell_price,
        "Twelve_Month_Fulfillment_Cost": 480,
        "Last_Updated": clock::datetime_to_excel_serial(as_of()) - 1.0,
    }))
}

fn one_per_month() -> ForecastPlan {
    ForecastPlan { black: [1; 12], ..ForecastPlan::default() }
}

#[test]
fn device_row_scales_to_horizon() {
    let r = contract_device("Acme", "C-1", 40.0, 50.0);
    let config = EngineConfig::default();
    let row = DeviceRow::build(&r, one_per_month(), Variant::Primary, Horizon::new(6), as_of(), &config);

    assert_eq!(row.cartridges.black, 6);
    assert_eq!(row.cost, 240.0);
    assert_eq!(row.sell_price, 300.0);
    assert_eq!(row.contract_revenue, 600.0, "annual revenue scaled by 6/12");
    assert_eq!(row.black_volume, 5000.0);
    assert_eq!(row.reported_cost, 240.0);
    assert!((row.transactional_gm - 0.2).abs() < 1e-12);
    assert!((row.contract_gm - 0.6).abs() < 1e-12);
    assert!(!row.stale, "reported a day ago");
}

#[test]
fn device_without_timestamp_is_stale() {
    let r = record(json!({ "Serial_Number": "NO-TS", "Buy_Price": 10 }));
    let row = DeviceRow::build(&r, ForecastPlan::default(), Variant::Primary, Horizon::FULL_YEAR, as_of(), &EngineConfig::default());
    assert!(row.stale);
    assert_eq!(row.transactional_gm, 0.0);
}

#[test]
fn aggregate_gm_is_recomputed_from_sums() {
    let config = EngineConfig::default();
    let rows = vec![
        // 12 × (50 cost, 100 sell): GM 50%
        DeviceRow::build(&contract_device("Acme", "A-1", 50.0, 100.0), one_per_month(), Variant::Primary, Horizon::FULL_YEAR, as_of(), &config),
        // 12 × (900 cost, 1000 sell): GM 10%
        DeviceRow::build(&contract_device("Acme", "A-2", 900.0, 1000.0), one_per_month(), Variant::Primary, Horizon::FULL_YEAR, as_of(), &config),
        DeviceRow::build(&contract_device("Beta", "B-1", 10.0, 20.0), one_per_month(), Variant::Primary, Horizon::FULL_YEAR, as_of(), &config),
    ];

    let customers = margin::rollup_by_customer(&rows);
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0].label, "Acme");
    assert_eq!(customers[0].totals.devices, 2);
    let expected = (12_000.0 + 1_200.0 - 10_800.0 - 600.0) / 13_200.0;
    assert!(
        (customers[0].transactional_gm - expected).abs() < 1e-12,
        "expected {expected}, got {} (averaging percentages would give 0.30)",
        customers[0].transactional_gm
    );

    let grand = margin::grand_totals(&rows);
    let merged = customers
        .iter()
        .fold(margin::MarginTotals::default(), |acc, c| acc.merge(&c.totals));
    assert_eq!(grand.totals.devices, 3);
    assert!((grand.totals.cost - merged.cost).abs() < 1e-9);
    assert!((grand.totals.sell_price - merged.sell_price).abs() < 1e-9);
    assert_eq!(grand.totals.contract_revenue, 3600.0);
}
