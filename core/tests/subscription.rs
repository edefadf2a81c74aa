use chrono::{TimeZone, Utc};
use fleet_forecast_core::{
    config::EngineConfig,
    depletion::ForecastPlan,
    error::ForecastError,
    margin::DeviceRow,
    record::DeviceRecord,
    resolver::Variant,
    risk::RiskLevel,
    subscription::{self, EswModel, SubscriptionOptions, Toggles},
    types::Horizon,
};
use serde_json::json;

fn record(value: serde_json::Value) -> DeviceRecord {
    DeviceRecord::from_value(&value).expect("test record must be an object")
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn markup_tiers_step_on_revenue() {
    let m = EngineConfig::default().markup;
    assert_eq!(subscription::default_markup(0.0, &m), 0.25);
    assert_eq!(subscription::default_markup(999.0, &m), 0.25);
    assert_eq!(subscription::default_markup(1000.0, &m), 0.20, "tier bound is exclusive");
    assert_eq!(subscription::default_markup(1999.99, &m), 0.20);
    assert_eq!(subscription::default_markup(2500.0, &m), 0.15);
    assert_eq!(subscription::default_markup(3999.99, &m), 0.10);
    assert_eq!(subscription::default_markup(4000.0, &m), 0.075);
    assert_eq!(subscription::default_markup(1e9, &m), 0.075);
}

#[test]
fn override_is_additive_and_floored_at_zero() {
    let m = EngineConfig::default().markup;
    assert!(close(subscription::applied_markup(1500.0, -0.05, &m), 0.15));
    assert!(close(subscription::applied_markup(1500.0, 0.05, &m), 0.25));
    assert_eq!(subscription::applied_markup(1500.0, -1.0, &m), 0.0);
}

#[test]
fn guardrails_round_to_thousands_and_devices() {
    let g = subscription::guardrails(10_000.0, 47, 0.10);
    assert_eq!(g.volume_lower, 9_000);
    assert_eq!(g.volume_upper, 11_000);
    assert_eq!(g.device_lower, 42);
    assert_eq!(g.device_upper, 52);

    let empty = subscription::guardrails(0.0, 0, 0.10);
    assert_eq!((empty.volume_lower, empty.device_upper), (0, 0));
}

#[test]
fn addons_charge_per_device_when_enabled() {
    assert_eq!(subscription::addon_total(true, 10, 3.0), 30.0);
    assert_eq!(subscription::addon_total(false, 10, 3.0), 0.0);
}

#[test]
fn flat_esw_annualizes_monthly_rates() {
    let low = record(json!({ "Serial_Number": "L", "Final_Risk_Level": "Low" }));
    let critical = record(json!({ "Serial_Number": "C", "Final_Risk_Level": "critical" }));
    let unknown = record(json!({ "Serial_Number": "U" }));
    let rates = EngineConfig::default().esw;

    let total = subscription::esw_surcharge(&[&low, &critical], EswModel::Flat, &rates).expect("flat never fails");
    assert_eq!(total, (6.0 + 10.0) * 12.0);
    let unknown_total = subscription::esw_surcharge(&[&unknown], EswModel::Flat, &rates).expect("flat never fails");
    assert_eq!(unknown_total, 7.5 * 12.0);
}

#[test]
fn class_risk_esw_refuses_incomplete_devices() {
    let complete = record(json!({ "Serial_Number": "OK-1", "Device_Class": "Class 2", "Final_Risk_Level": "High" }));
    let no_class = record(json!({ "Serial_Number": "NOCLASS", "Final_Risk_Level": "Low" }));
    let no_risk = record(json!({ "Serial_Number": "NORISK", "Device_Class": "Class 1" }));
    let rates = EngineConfig::default().esw;

    let ok = subscription::esw_surcharge(&[&complete], EswModel::ClassRisk, &rates).expect("complete device prices");
    assert_eq!(ok, 10.0 * 12.0);

    match subscription::esw_surcharge(&[&complete, &no_class, &no_risk], EswModel::ClassRisk, &rates) {
        Err(ForecastError::IncompleteWarrantyData { serials }) => {
            assert_eq!(serials, vec!["NOCLASS".to_string(), "NORISK".to_string()]);
        }
        other => panic!("expected IncompleteWarrantyData, got {other:?}"),
    }
}

fn transactional(serial: &str, buy: f64, sell: f64, volume: f64, risk: &str) -> DeviceRecord {
    record(json!({
        "Serial_Number": serial,
        "Device_Type": "Mono",
        "Contract_Status": "T",
        "Black_Annual_Volume": volume,
        "Buy_Price": buy,
        "Sell_Price": sell,
        "Final_Risk_Level": risk,
    }))
}

#[test]
fn plan_prices_full_year_with_addons_and_warranty() {
    let config = EngineConfig::default();
    let as_of = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).single().expect("valid date");
    let a = transactional("T-1", 50.0, 100.0, 12_000.0, "Low");
    let b = transactional("T-2", 25.0, 40.0, 6_000.0, "High");
    let plan = ForecastPlan { black: [1; 12], ..ForecastPlan::default() };
    // Rows at a 3-month horizon; the plan still reprices all 12 months.
    let row_a = DeviceRow::build(&a, plan, Variant::Primary, Horizon::new(3), as_of, &config);
    let row_b = DeviceRow::build(&b, plan, Variant::Primary, Horizon::new(3), as_of, &config);

    let options = SubscriptionOptions {
        toggles: Toggles { dca: true, esw: true, ..Toggles::default() },
        markup_override: 0.0,
        esw_model: EswModel::Flat,
    };
    let sub = subscription::build_plan(&[(&a, &row_a), (&b, &row_b)], Variant::Primary, &options, &config)
        .expect("flat model prices");

    assert_eq!(sub.devices, 2);
    assert!(close(sub.transactional_revenue, 1_680.0));
    assert_eq!(sub.breakdown.markup_rate, 0.20);
    assert!(close(sub.breakdown.fulfillment_cost, 900.0));
    assert!(close(sub.breakdown.markup, 180.0));
    assert!(close(sub.breakdown.dca, 6.0));
    assert_eq!(sub.breakdown.jitr, 0.0);
    assert!(close(sub.breakdown.esw, (6.0 + 8.5) * 12.0));
    assert!(close(sub.annual_fee, 1_260.0));
    assert!(close(sub.monthly_fee, 105.0));
    assert!(close(sub.monthly_per_device, 52.5));
    assert_eq!(sub.guardrails.volume_lower, 1_000);
    assert_eq!(sub.guardrails.volume_upper, 2_000);
    assert_eq!((sub.guardrails.device_lower, sub.guardrails.device_upper), (2, 2));
    assert!(close(sub.benchmark.annual, 18_000.0 * 0.02));
    assert_eq!(sub.fleet_risk.rated_devices, 2);
}

#[test]
fn fleet_risk_label_uses_volume_weights() {
    use fleet_forecast_core::risk;
    let heavy_low = transactional("H", 1.0, 1.0, 90_000.0, "Low");
    let light_critical = transactional("L", 1.0, 1.0, 10_000.0, "Critical");
    let unknown = transactional("U", 1.0, 1.0, 500_000.0, "");

    let fleet = risk::fleet_risk([&heavy_low, &light_critical, &unknown]);
    assert!(close(fleet.score, 0.3), "0.9×0 + 0.1×3, unknown excluded");
    assert_eq!(fleet.level, RiskLevel::Low);
    assert_eq!(fleet.rated_devices, 2);
}
