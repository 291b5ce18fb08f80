use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const MEDICAL_CATEGORY: &str = "medical";

/// Evidence for one extracted fact: where it was found and the text around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub pdf: String,
    pub page: u32,
    pub text_snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenefitUnit {
    Trip,
    Day,
    Person,
    Family,
}

impl BenefitUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trip => "trip",
            Self::Day => "day",
            Self::Person => "person",
            Self::Family => "family",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub currency: String,
    pub max_limit: Option<f64>,
    pub per: Option<BenefitUnit>,
    #[serde(default)]
    pub sublimits: BTreeMap<String, f64>,
    pub deductible: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub age_bands: BTreeMap<String, f64>,
}

impl Benefit {
    pub fn empty(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
            max_limit: None,
            per: None,
            sublimits: BTreeMap::new(),
            deductible: None,
            notes: None,
            citations: Vec::new(),
            age_bands: BTreeMap::new(),
        }
    }

    /// The main limit, or the highest age-band limit when no main limit was found.
    pub fn effective_limit(&self) -> Option<f64> {
        self.max_limit.or_else(|| {
            self.age_bands
                .values()
                .copied()
                .fold(None, |best: Option<f64>, value| {
                    Some(best.map_or(value, |current| current.max(value)))
                })
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eligibility {
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub residency: Option<String>,
    pub trip_duration_max_days: Option<u32>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exclusions {
    pub pre_existing: Option<String>,
    pub high_risk_activities: Option<String>,
    pub war_terrorism: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub product_name: String,
    pub version: Option<String>,
    pub eligibility: Eligibility,
    pub benefits: BTreeMap<String, Benefit>,
    pub exclusions: Exclusions,
}

impl Policy {
    pub fn medical(&self) -> Option<&Benefit> {
        self.benefits.get(MEDICAL_CATEGORY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEntry {
    pub product_name: String,
    pub source: String,
    pub sha256: String,
    pub page_count: usize,
    pub table_count: usize,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub out_dir: String,
    pub policy_count: usize,
    pub policies: Vec<ExportEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_policy() -> Policy {
        let mut medical = Benefit::empty("SGD");
        medical.max_limit = Some(100_000.0);
        medical.per = Some(BenefitUnit::Trip);
        medical.sublimits.insert("tcm".to_string(), 750.0);
        medical.age_bands.insert("70-74".to_string(), 50_000.0);
        medical.age_bands.insert("<12".to_string(), 30_000.0);
        medical.citations.push(Citation {
            pdf: "docs/TravelEasy Policy QTD032212.pdf".to_string(),
            page: 3,
            text_snippet: "Medical expenses whilst overseas SGD 100,000".to_string(),
        });

        let mut benefits = BTreeMap::new();
        benefits.insert(MEDICAL_CATEGORY.to_string(), medical);

        Policy {
            product_name: "TravelEasy".to_string(),
            version: None,
            eligibility: Eligibility {
                min_age: Some(1),
                max_age: Some(74),
                residency: None,
                trip_duration_max_days: Some(183),
                citations: Vec::new(),
            },
            benefits,
            exclusions: Exclusions {
                war_terrorism: Some("war, invasion, act of foreign enemy".to_string()),
                ..Exclusions::default()
            },
        }
    }

    #[test]
    fn policy_round_trips_through_json_without_loss() {
        let policy = sample_policy();
        let raw = serde_json::to_string_pretty(&policy).expect("policy should serialize");
        let restored: Policy = serde_json::from_str(&raw).expect("policy should deserialize");
        assert_eq!(restored, policy);
    }

    #[test]
    fn benefit_serializes_with_interchange_field_names() {
        let policy = sample_policy();
        let value = serde_json::to_value(&policy).expect("policy should serialize");
        let medical = &value["benefits"]["medical"];

        assert_eq!(medical["max_limit"], serde_json::json!(100000.0));
        assert_eq!(medical["per"], serde_json::json!("trip"));
        assert_eq!(medical["deductible"], serde_json::Value::Null);
        assert_eq!(medical["age_bands"]["<12"], serde_json::json!(30000.0));
        assert_eq!(medical["citations"][0]["page"], serde_json::json!(3));
        assert!(medical["citations"][0]["text_snippet"].is_string());
        assert_eq!(value["version"], serde_json::Value::Null);
    }

    #[test]
    fn effective_limit_falls_back_to_highest_age_band() {
        let mut benefit = Benefit::empty("SGD");
        assert_eq!(benefit.effective_limit(), None);

        benefit.age_bands.insert("70-74".to_string(), 50_000.0);
        benefit.age_bands.insert("12-69".to_string(), 150_000.0);
        assert_eq!(benefit.effective_limit(), Some(150_000.0));

        benefit.max_limit = Some(100_000.0);
        assert_eq!(benefit.effective_limit(), Some(100_000.0));
    }
}
