use fleet_forecast_core::{config::EngineConfig, risk::RiskLevel, record::DeviceClass};

#[test]
fn partial_config_keeps_defaults() {
    let config = EngineConfig::from_json(r#"{ "stale_after_days": 7, "batch_size": 50 }"#).expect("valid config");
    assert_eq!(config.stale_after_days, 7.0);
    assert_eq!(config.batch_size, 50);
    assert_eq!(config.reference_coverage, 0.05);
    assert_eq!(config.markup.top_markup, 0.075);
}

#[test]
fn default_rates_match_published_tables() {
    let config = EngineConfig::default();
    assert_eq!(config.esw.flat.rate(RiskLevel::High), 8.5);
    assert_eq!(config.esw.flat.rate(RiskLevel::Unknown), 7.5);
    assert_eq!(config.esw.by_class.for_class(DeviceClass::One).rate(RiskLevel::Critical), 9.0);
    assert_eq!(config.esw.by_class.for_class(DeviceClass::Two).rate(RiskLevel::Low), 7.0);
    assert_eq!(config.benchmark_cpp.color, 0.06);
    assert_eq!(config.markup.tiers.len(), 4);
}

#[test]
fn invalid_configs_are_rejected() {
    assert!(EngineConfig::from_json(r#"{ "reference_coverage": 0 }"#).is_err());
    assert!(EngineConfig::from_json(r#"{ "batch_size": 0 }"#).is_err());
    assert!(EngineConfig::from_json(r#"{ "guardrail_fraction": 1.5 }"#).is_err());
    assert!(EngineConfig::from_json(
        r#"{ "markup": { "tiers": [ {"below": 2000, "markup": 0.2}, {"below": 1000, "markup": 0.25} ], "top_markup": 0.05 } }"#
    )
    .is_err());
    assert!(EngineConfig::from_json("not json").is_err());
}

#[test]
fn missing_file_reports_path() {
    let err = EngineConfig::load("/nonexistent/fleet-config.json").expect_err("file does not exist");
    assert!(err.to_string().contains("/nonexistent/fleet-config.json"));
}
