use fleet_forecast_core::{
    config::{CoverageUnit, EngineConfig},
    depletion::{self, SkipReason},
    record::DeviceRecord,
    resolver::Variant,
    types::Color,
};
use proptest::prelude::*;
use serde_json::json;

fn record(value: serde_json::Value) -> DeviceRecord {
    DeviceRecord::from_value(&value).expect("test record must be an object")
}

/// 40,000 pages a year against a 5,000-page cartridge at reference coverage:
/// one replacement every 45.625 days, first one on day 10.
fn e2e_mono() -> DeviceRecord {
    record(json!({
        "Serial_Number": "E2E-1",
        "Device_Type": "Mono",
        "Black_Annual_Volume": 40000,
        "Black_Pages_Left": 1096,
        "Black_Days_Left": 10,
        "Black_Yield_Estimate": 5000,
        "Black_Page_Coverage_Percent": 0.05,
    }))
}

#[test]
fn end_to_end_black_events_land_in_expected_months() {
    let plan = depletion::simulate(&e2e_mono(), Variant::Primary, &EngineConfig::default());
    // Events on days 10, 55.6, 101.3, 146.9, 192.5, 238.1, 283.8, 329.4
    assert_eq!(plan.black, [1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0]);
    assert_eq!(plan.black.iter().sum::<u32>(), 8);
}

#[test]
fn color_device_black_channel_forecasts_eight_events() {
    // 24,000 mono pages a year = 65.75/day; a 3,000-page cartridge lasts 45.625 days
    let r = record(json!({
        "Serial_Number": "E2E-2",
        "Device_Type": "Color",
        "Black_Annual_Volume": 24000,
        "Black_Pages_Left": 200,
        "Black_Days_Left": 10,
        "Black_Yield_Estimate": 3000,
        "Black_Page_Coverage_Percent": 0.05,
    }));
    let plan = depletion::simulate(&r, Variant::Primary, &EngineConfig::default());
    assert_eq!(plan.black.iter().sum::<u32>(), 8);
    assert_eq!(plan.black, [1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0]);
    for color in [Color::Cyan, Color::Magenta, Color::Yellow] {
        assert_eq!(plan.channel(color), &[0u32; 12], "{color} has no telemetry and must stay zero");
    }
}

#[test]
fn percent_coverage_unit_applies_to_every_channel() {
    let percent = EngineConfig { coverage_unit: CoverageUnit::Percent, ..EngineConfig::default() };
    let device = |black: f64, cyan: f64| {
        record(json!({
            "Device_Type": "Color",
            "Black_Annual_Volume": 24000,
            "Color_Annual_Volume": 24000,
            "Black_Pages_Left": 200, "Black_Days_Left": 10, "Black_Yield_Estimate": 3000,
            "Cyan_Pages_Left": 200,  "Cyan_Days_Left": 10,  "Cyan_Yield_Estimate": 3000,
            "Black_Page_Coverage_Percent": black,
            "Cyan_Page_Coverage_Percent": cyan,
        }))
    };

    let plan = depletion::simulate(&device(5.2, 0.8), Variant::Primary, &percent);
    let black: u32 = plan.black.iter().sum();
    let cyan: u32 = plan.cyan.iter().sum();
    // 0.8% stretches a 3,000-page cartridge to 18,750 pages: days 10 and 295
    assert_eq!(cyan, 2, "light cyan coverage should need few cartridges");
    assert_eq!(black, 9);
    assert!(cyan < black, "0.8% must not be read as 80%");

    let fraction = depletion::simulate(&device(0.052, 0.008), Variant::Primary, &EngineConfig::default());
    assert_eq!(fraction, plan, "the same readings in fraction units give the same plan");
}

#[test]
fn mono_device_never_forecasts_chromatic_channels() {
    let r = record(json!({
        "Device_Type": "Mono",
        "Black_Annual_Volume": 20000,
        "Color_Annual_Volume": 9000,
        "Black_Pages_Left": 500, "Black_Days_Left": 12, "Black_Yield_Estimate": 3000,
        "Cyan_Pages_Left": 500,  "Cyan_Days_Left": 12,  "Cyan_Yield_Estimate": 3000,
    }));
    let plan = depletion::simulate(&r, Variant::Primary, &EngineConfig::default());
    assert!(plan.black.iter().sum::<u32>() > 0, "black should be forecast");
    for color in [Color::Cyan, Color::Magenta, Color::Yellow] {
        assert_eq!(plan.channel(color), &[0u32; 12], "{color} must stay zero on a mono device");
    }
}

#[test]
fn present_rate_used_when_annual_volume_missing() {
    // 1000 pages over 20 days = 50/day; 3000-page yield = every 60 days
    let r = record(json!({
        "Black_Pages_Left": 1000,
        "Black_Days_Left": 20,
        "Black_Yield_Estimate": 3000,
    }));
    let plan = depletion::simulate(&r, Variant::Primary, &EngineConfig::default());
    // days 20, 80, 140, 200, 260, 320
    assert_eq!(plan.black.iter().sum::<u32>(), 6);
    assert_eq!(plan.black[0], 1);
    assert_eq!(plan.black[10], 1);
}

#[test]
fn unusable_channels_are_skipped_not_errors() {
    let config = EngineConfig::default();
    let no_yield = record(json!({ "Black_Pages_Left": 100, "Black_Days_Left": 5, "Black_Annual_Volume": 1000 }));
    let no_days = record(json!({ "Black_Pages_Left": 100, "Black_Yield_Estimate": 2000 }));
    let no_demand = record(json!({ "Black_Pages_Left": 0, "Black_Days_Left": 0, "Black_Yield_Estimate": 2000 }));

    assert_eq!(
        depletion::channel_inputs(&no_yield, Color::Black, Variant::Primary, &config),
        Err(SkipReason::NoYield)
    );
    assert_eq!(
        depletion::channel_inputs(&no_days, Color::Black, Variant::Primary, &config),
        Err(SkipReason::MissingTelemetry)
    );
    assert_eq!(
        depletion::channel_inputs(&no_demand, Color::Black, Variant::Primary, &config),
        Err(SkipReason::NoDemand)
    );
    assert!(depletion::simulate(&no_yield, Variant::Primary, &config).is_empty());
}

#[test]
fn coverage_scales_yield_against_reference() {
    assert_eq!(depletion::adjusted_yield(5000.0, Some(0.10), 0.05), 2500.0);
    assert_eq!(depletion::adjusted_yield(5000.0, Some(0.025), 0.05), 10000.0);
    assert_eq!(depletion::adjusted_yield(5000.0, None, 0.05), 5000.0);
    assert_eq!(depletion::adjusted_yield(5000.0, Some(0.0), 0.05), 5000.0);
}

#[test]
fn heavier_coverage_means_more_replacements() {
    let config = EngineConfig::default();
    let mut heavy = json!({
        "Black_Annual_Volume": 40000,
        "Black_Pages_Left": 1096,
        "Black_Days_Left": 10,
        "Black_Yield_Estimate": 5000,
    });
    heavy["Black_Page_Coverage_Percent"] = json!(0.10);
    let normal = depletion::simulate(&e2e_mono(), Variant::Primary, &config);
    let heavy = depletion::simulate(&record(heavy), Variant::Primary, &config);
    assert!(
        heavy.black.iter().sum::<u32>() > normal.black.iter().sum::<u32>(),
        "double coverage should roughly double the events"
    );
}

#[test]
fn variant_yield_drives_variant_plan() {
    let r = record(json!({
        "Black_Annual_Volume": 36500,
        "Black_Pages_Left": 100,
        "Black_Days_Left": 1,
        "Black_Yield_Estimate": 10000,
        "R_Black_Yield_Estimate": 5000,
    }));
    let config = EngineConfig::default();
    let primary = depletion::simulate(&r, Variant::Primary, &config);
    let reman = depletion::simulate(&r, Variant::Refurbished, &config);
    // 100 pages/day: every 100 days vs every 50 days
    assert_eq!(primary.black.iter().sum::<u32>(), 4);
    assert_eq!(reman.black.iter().sum::<u32>(), 8);
}

#[test]
fn event_cap_bounds_runaway_channels() {
    let config = EngineConfig { max_events_per_channel: 3, ..EngineConfig::default() };
    let r = record(json!({
        "Black_Annual_Volume": 1_000_000,
        "Black_Pages_Left": 10,
        "Black_Days_Left": 0,
        "Black_Yield_Estimate": 100,
    }));
    let plan = depletion::simulate(&r, Variant::Primary, &config);
    assert_eq!(plan.black.iter().sum::<u32>(), 3);
}

proptest! {
    #[test]
    fn events_never_exceed_cap_or_leave_the_year(
        pages in 0.0f64..20_000.0,
        days in 0.0f64..400.0,
        annual in 0.0f64..500_000.0,
        rated in 0.0f64..50_000.0,
        coverage in 0.0f64..0.2,
    ) {
        let r = record(json!({
            "Device_Type": "Color",
            "Black_Annual_Volume": annual,
            "Black_Pages_Left": pages,
            "Black_Days_Left": days,
            "Black_Yield_Estimate": rated,
            "Black_Page_Coverage_Percent": coverage,
        }));
        let config = EngineConfig::default();
        let plan = depletion::simulate(&r, Variant::Primary, &config);
        let total: u32 = plan.black.iter().sum();
        prop_assert!(total <= config.max_events_per_channel);
        if days >= 365.0 {
            prop_assert_eq!(total, 0);
        }
        prop_assert_eq!(plan.cyan, [0u32; 12], "no cyan telemetry, no cyan events");
    }
}
