//! fleet-runner: headless forecast runner.
//!
//! Usage:
//!   fleet-runner --input fleet.json --variant R --months 6
//!   fleet-runner --synthetic 200 --seed 12345 --vendor-csv vendors.csv
//!   fleet-runner --input fleet.json --ipc-mode

use anyhow::{anyhow, Result};
use chrono::Utc;
use fleet_forecast_core::{
    config::EngineConfig,
    engine::{FleetReport, ForecastEngine, SubscriptionOutcome},
    export,
    request::{ForecastRequest, RunnerCommand},
    resolver::Variant,
    scenario::{self, ScenarioSpec},
    snapshot::FleetSnapshot,
};
use std::env;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let months = parse_arg(&args, "--months", 12u32);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let variant_code = flag_value(&args, "--variant").unwrap_or("O");
    let variant = Variant::from_code(variant_code).ok_or_else(|| anyhow!("Unknown variant {variant_code}"))?;

    let config = match flag_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let as_of = Utc::now();
    let snapshot = match (flag_value(&args, "--input"), flag_value(&args, "--synthetic")) {
        (Some(path), _) => FleetSnapshot::load(path, as_of)?,
        (None, Some(count)) => {
            let count: usize = count.parse().map_err(|e| anyhow!("Invalid --synthetic {count}: {e}"))?;
            scenario::generate_snapshot(ScenarioSpec::new(count, seed), as_of)
        }
        (None, None) => scenario::generate_snapshot(ScenarioSpec::new(50, seed), as_of),
    };

    let engine = ForecastEngine::new(config);

    if ipc_mode {
        return run_ipc_loop(&engine, &snapshot);
    }

    let mut request = ForecastRequest::default().with_variant(variant).with_months(months);
    request.customer = flag_value(&args, "--customer").map(str::to_string);

    println!("fleet-runner");
    println!("  devices:   {}", snapshot.len());
    println!("  customers: {}", snapshot.customers().len());
    println!("  variant:   {variant}");
    println!("  months:    {}", request.horizon.months());
    println!();

    let report = engine.run(&snapshot, &request);
    print_summary(&report);

    if let Some(path) = flag_value(&args, "--vendor-csv") {
        export::vendor_csv_file(&report.vendors, path)?;
    }
    if let Some(path) = flag_value(&args, "--risk-csv") {
        export::risk_csv_file(&report.risk_rows, path)?;
    }
    Ok(())
}

fn run_ipc_loop(engine: &ForecastEngine, snapshot: &FleetSnapshot) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    log::info!("runner: ipc mode, {} device(s) loaded", snapshot.len());

    loop {
        buffer.clear();
        if handle.read_line(&mut buffer)? == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: RunnerCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("runner: bad command: {e}");
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            RunnerCommand::Quit => break,
            RunnerCommand::Customers => {
                writeln!(stdout, "{}", serde_json::to_string(&snapshot.customers())?)?;
            }
            RunnerCommand::Forecast(request) => {
                let report = engine.run(snapshot, &request);
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(report: &FleetReport) {
    let totals = &report.grand_totals;
    println!("=== FLEET SUMMARY ===");
    println!("  devices:          {}", totals.totals.devices);
    println!("  cartridges:       {}", totals.totals.cartridges.total);
    println!("  fulfillment cost: ${:.2}", totals.totals.cost);
    println!("  sell price:       ${:.2}", totals.totals.sell_price);
    println!("  contract revenue: ${:.2}", totals.totals.contract_revenue);
    println!("  transactional GM: {:.1}%", totals.transactional_gm * 100.0);
    println!("  contract GM:      {:.1}%", totals.contract_gm * 100.0);
    println!("  fleet risk:       {} ({:.2})", report.fleet_risk.level, report.fleet_risk.score);

    println!();
    println!("=== CUSTOMERS ===");
    for c in &report.customers {
        println!(
            "  {:<36} {:>4} dev | Cost ${:>10.2} | SP ${:>10.2} | GM {:>5.1}%",
            c.label,
            c.totals.devices,
            c.totals.cost,
            c.totals.sell_price,
            c.transactional_gm * 100.0
        );
    }

    println!();
    println!("=== VENDORS ===");
    for v in &report.vendors.vendors {
        println!("  {:<24} {:>6} cartridges | ${:.2}", v.supplier, v.cartridges, v.spend);
    }
    println!("  {:<24} {:>6} cartridges | ${:.2}", "Total", report.vendors.total_cartridges, report.vendors.total_spend);

    println!();
    println!("=== SUBSCRIPTION ===");
    match &report.subscription {
        SubscriptionOutcome::Priced(plan) => {
            let g = plan.guardrails;
            println!("  devices:        {}", plan.devices);
            println!("  markup:         {:.1}%", plan.breakdown.markup_rate * 100.0);
            println!("  annual fee:     ${:.2}", plan.annual_fee);
            println!("  monthly fee:    ${:.2}", plan.monthly_fee);
            println!("  per device/mo:  ${:.2}", plan.monthly_per_device);
            println!("  CPP benchmark:  ${:.2}", plan.benchmark.annual);
            println!("  volume limits:  {} - {}", g.volume_lower, g.volume_upper);
            println!("  device limits:  {} - {}", g.device_lower, g.device_upper);
        }
        SubscriptionOutcome::Blocked { reason, .. } => println!("  blocked: {reason}"),
        SubscriptionOutcome::Empty => println!("  (no transactional devices)"),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
