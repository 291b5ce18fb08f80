use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::Benefit;
use crate::util::read_json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeLoad {
    pub min_age: u32,
    pub max_age: u32,
    pub multiplier: f64,
}

/// Rating tables for the quote builder. Loaded once and passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_premium: f64,
    pub rate_per_day: f64,
    pub rate_per_1000_medical: f64,
    pub cancellation_rate_of_trip_cost: f64,
    pub age_loads: Vec<AgeLoad>,
    pub destination_risk_loads: BTreeMap<String, f64>,
    pub plan_tier_loads: BTreeMap<String, f64>,
    pub gst_rate: f64,
    pub minimum_premium: f64,
    pub round_to: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let age_loads = [
            (0, 17, 0.90),
            (18, 59, 1.00),
            (60, 69, 1.40),
            (70, 74, 1.90),
            (75, 200, 2.80),
        ]
        .into_iter()
        .map(|(min_age, max_age, multiplier)| AgeLoad {
            min_age,
            max_age,
            multiplier,
        })
        .collect();

        Self {
            base_premium: 8.00,
            rate_per_day: 1.80,
            rate_per_1000_medical: 0.20,
            cancellation_rate_of_trip_cost: 0.035,
            age_loads,
            destination_risk_loads: labeled(&[("low", 0.95), ("standard", 1.00), ("high", 1.20)]),
            plan_tier_loads: labeled(&[("base", 1.00), ("plus", 1.10), ("elite", 1.25)]),
            gst_rate: 0.09,
            minimum_premium: 25.00,
            round_to: 0.05,
        }
    }
}

impl PricingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        if config.age_loads.is_empty() {
            bail!("pricing config {} has no age loads", path.display());
        }
        Ok(config)
    }

    fn age_multiplier(&self, age: Option<u32>) -> f64 {
        let Some(age) = age else {
            return 1.0;
        };
        self.age_loads
            .iter()
            .find(|load| load.min_age <= age && age <= load.max_age)
            .or(self.age_loads.last())
            .map_or(1.0, |load| load.multiplier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub trip_days: u32,
    pub age: Option<u32>,
    pub destination_risk: String,
    pub plan_tier: String,
    pub include_cancellation: bool,
    pub trip_cost: f64,
}

impl Default for QuoteRequest {
    fn default() -> Self {
        Self {
            trip_days: 0,
            age: None,
            destination_risk: "standard".to_string(),
            plan_tier: "base".to_string(),
            include_cancellation: false,
            trip_cost: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBreakdown {
    pub base_premium: f64,
    pub rate_per_day: f64,
    pub rate_per_1000_medical: f64,
    pub age_multiplier: f64,
    pub destination_multiplier: f64,
    pub plan_tier_multiplier: f64,
    pub pretax_core: f64,
    pub cancellation_premium: f64,
    pub pretax_total_after_floor: f64,
    pub tax_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub product: String,
    pub currency: String,
    pub trip_days: u32,
    pub medical_limit: f64,
    pub include_cancellation: bool,
    pub trip_cost: f64,
    pub age: Option<u32>,
    pub destination_risk: String,
    pub plan_tier: String,
    pub gst_rate: f64,
    pub minimum_premium_floor: f64,
    pub premium: f64,
    pub breakdown: QuoteBreakdown,
}

pub fn build_quote(
    product: &str,
    benefit: &Benefit,
    request: &QuoteRequest,
    config: &PricingConfig,
) -> Quote {
    let medical_limit = benefit.effective_limit().unwrap_or(0.0).max(0.0);

    let pretax_core = config.base_premium
        + config.rate_per_day * f64::from(request.trip_days)
        + config.rate_per_1000_medical * (medical_limit / 1000.0);

    let age_multiplier = config.age_multiplier(request.age);
    let destination_multiplier = lookup_load(&config.destination_risk_loads, &request.destination_risk);
    let plan_tier_multiplier = lookup_load(&config.plan_tier_loads, &request.plan_tier);
    let loaded = pretax_core * age_multiplier * destination_multiplier * plan_tier_multiplier;

    let cancellation_premium = if request.include_cancellation && request.trip_cost > 0.0 {
        request.trip_cost * config.cancellation_rate_of_trip_cost
    } else {
        0.0
    };

    let pretax_total = (loaded + cancellation_premium).max(config.minimum_premium);
    let tax_amount = pretax_total * config.gst_rate.max(0.0);
    let total = pretax_total + tax_amount;

    Quote {
        product: product.to_string(),
        currency: benefit.currency.clone(),
        trip_days: request.trip_days,
        medical_limit,
        include_cancellation: request.include_cancellation,
        trip_cost: request.trip_cost,
        age: request.age,
        destination_risk: request.destination_risk.clone(),
        plan_tier: request.plan_tier.clone(),
        gst_rate: config.gst_rate,
        minimum_premium_floor: config.minimum_premium,
        premium: round_to_step(total, config.round_to),
        breakdown: QuoteBreakdown {
            base_premium: config.base_premium,
            rate_per_day: config.rate_per_day,
            rate_per_1000_medical: config.rate_per_1000_medical,
            age_multiplier,
            destination_multiplier,
            plan_tier_multiplier,
            pretax_core: round_cents(pretax_core),
            cancellation_premium: round_cents(cancellation_premium),
            pretax_total_after_floor: round_to_step(pretax_total, config.round_to),
            tax_amount: round_to_step(tax_amount, config.round_to),
        },
    }
}

fn lookup_load(loads: &BTreeMap<String, f64>, label: &str) -> f64 {
    loads
        .get(&label.trim().to_lowercase())
        .copied()
        .unwrap_or(1.0)
}

fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return round_cents(value);
    }
    round_cents((value / step).round() * step)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn labeled(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(label, value)| (label.to_string(), *value))
        .collect()
}
