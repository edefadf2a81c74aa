use crate::{clock::DEFAULT_STALE_DAYS, record::DeviceClass, risk::RiskLevel};
use serde::{Deserialize, Serialize};

/// Unit of the exported `*_Page_Coverage_Percent` fields. One unit holds
/// for the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageUnit {
    /// 0.05 = 5%.
    #[default]
    Fraction,
    /// 5.0 = 5%.
    Percent,
}

impl CoverageUnit {
    pub fn to_fraction(self, raw: f64) -> f64 {
        match self {
            Self::Fraction => raw,
            Self::Percent  => raw / 100.0,
        }
    }
}

/// One step of the markup schedule: revenue strictly below `below` earns `markup`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkupTier {
    pub below:  f64,
    pub markup: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Ascending by `below`.
    pub tiers:      Vec<MarkupTier>,
    /// Markup once revenue clears every tier.
    pub top_markup: f64,
}

/// Flat add-on fees, annual per device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddOnRates {
    pub dca:           f64,
    pub jitr:          f64,
    pub contract_mgmt: f64,
    pub qr:            f64,
}

/// Monthly per-device warranty rate by risk level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskRates {
    pub low:      f64,
    pub moderate: f64,
    pub high:     f64,
    pub critical: f64,
    pub unknown:  f64,
}

impl RiskRates {
    pub fn rate(&self, risk: RiskLevel) -> f64 {
        match risk {
            RiskLevel::Low      => self.low,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::High     => self.high,
            RiskLevel::Critical => self.critical,
            RiskLevel::Unknown  => self.unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassRiskRates {
    pub class_1: RiskRates,
    pub class_2: RiskRates,
}

impl ClassRiskRates {
    pub fn for_class(&self, class: DeviceClass) -> &RiskRates {
        match class {
            DeviceClass::One => &self.class_1,
            DeviceClass::Two => &self.class_2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EswConfig {
    pub flat:     RiskRates,
    pub by_class: ClassRiskRates,
}

/// Per-page rates used for the subscription benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CppRates {
    pub mono:  f64,
    pub color: f64,
}

/// Coverage outside [low, high] is flagged on device rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageBand {
    pub low:  f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Coverage at which rated yields are quoted, as a fraction.
    pub reference_coverage:     f64,
    pub coverage_unit:          CoverageUnit,
    pub stale_after_days:       f64,
    /// Hard cap on simulated events per channel per year.
    pub max_events_per_channel: u32,
    /// Devices per batch when the caller drives `ForecastEngine::batches`.
    pub batch_size:             usize,
    pub markup:                 MarkupConfig,
    pub addons:                 AddOnRates,
    pub esw:                    EswConfig,
    /// Guardrail half-width as a fraction of the cohort basis.
    pub guardrail_fraction:     f64,
    pub benchmark_cpp:          CppRates,
    pub coverage_band:          CoverageBand,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_coverage:     0.05,
            coverage_unit:          CoverageUnit::Fraction,
            stale_after_days:       DEFAULT_STALE_DAYS,
            max_events_per_channel: 400,
            batch_size:             250,
            markup: MarkupConfig {
                tiers: vec![
                    MarkupTier { below: 1000.0, markup: 0.25 },
                    MarkupTier { below: 2000.0, markup: 0.20 },
                    MarkupTier { below: 3000.0, markup: 0.15 },
                    MarkupTier { below: 4000.0, markup: 0.10 },
                ],
                top_markup: 0.075,
            },
            // $0.25 / $0.42 / $0.55 / $0.14 per device per month
            addons: AddOnRates {
                dca:           3.00,
                jitr:          5.04,
                contract_mgmt: 6.60,
                qr:            1.68,
            },
            esw: EswConfig {
                flat: RiskRates {
                    low:      6.0,
                    moderate: 7.0,
                    high:     8.5,
                    critical: 10.0,
                    unknown:  7.5,
                },
                by_class: ClassRiskRates {
                    class_1: RiskRates {
                        low:      5.0,
                        moderate: 6.0,
                        high:     7.5,
                        critical: 9.0,
                        unknown:  7.5,
                    },
                    class_2: RiskRates {
                        low:      7.0,
                        moderate: 8.5,
                        high:     10.0,
                        critical: 12.0,
                        unknown:  10.0,
                    },
                },
            },
            guardrail_fraction: 0.10,
            benchmark_cpp: CppRates { mono: 0.02, color: 0.06 },
            coverage_band: CoverageBand { low: 0.045, high: 0.055 },
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file. Keys left out fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the engine cannot compute against.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.reference_coverage > 0.0 && self.reference_coverage <= 1.0) {
            anyhow::bail!("reference_coverage must be in (0, 1], got {}", self.reference_coverage);
        }
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be at least 1");
        }
        if self.markup.tiers.windows(2).any(|w| w[0].below >= w[1].below) {
            anyhow::bail!("markup tiers must be strictly ascending");
        }
        if !(0.0..1.0).contains(&self.guardrail_fraction) {
            anyhow::bail!("guardrail_fraction must be in [0, 1), got {}", self.guardrail_fraction);
        }
        Ok(())
    }
}
