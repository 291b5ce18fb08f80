use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::{NormalizeConfig, parse_numeric_token};

#[derive(Parser, Debug)]
#[command(
    name = "policybrain",
    version,
    about = "Travel insurance policy wording normalization tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Normalize(NormalizeArgs),
    Export(ExportArgs),
    Compare(CompareArgs),
    Quote(QuoteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SanityArgs {
    /// Main medical limits below this are annotated for review.
    #[arg(long, default_value_t = 10_000.0)]
    pub low_limit_threshold: f64,

    /// Sub-limits above this multiple of the main limit are dropped.
    #[arg(long = "sublimit-ratio", default_value_t = 1.2)]
    pub sublimit_overshoot_ratio: f64,

    #[arg(long, default_value = "SGD")]
    pub fallback_currency: String,
}

impl SanityArgs {
    pub fn to_config(&self) -> NormalizeConfig {
        NormalizeConfig {
            low_limit_threshold: self.low_limit_threshold,
            sublimit_overshoot_ratio: self.sublimit_overshoot_ratio,
            fallback_currency: self.fallback_currency.clone(),
            ..NormalizeConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub include_tables: bool,

    #[command(flatten)]
    pub sanity: SanityArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDocument {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Product name and document path as NAME=PATH; repeatable.
    #[arg(long = "document", value_parser = parse_named_document, required = true)]
    pub documents: Vec<NamedDocument>,

    #[arg(long, default_value = "exports")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub include_tables: bool,

    #[command(flatten)]
    pub sanity: SanityArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub left: PathBuf,

    #[arg(long)]
    pub right: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    /// Exported policy JSON.
    #[arg(long)]
    pub policy: PathBuf,

    #[arg(long)]
    pub trip_days: u32,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long, default_value = "standard")]
    pub destination_risk: String,

    #[arg(long, default_value = "base")]
    pub plan_tier: String,

    #[arg(long, default_value_t = false)]
    pub include_cancellation: bool,

    /// Declared trip cost, e.g. "2500" or "2.5k".
    #[arg(long, value_parser = parse_trip_cost, requires = "include_cancellation")]
    pub trip_cost: Option<f64>,

    #[arg(long)]
    pub pricing_config: Option<PathBuf>,
}

pub fn parse_named_document(raw: &str) -> Result<NamedDocument, String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got `{raw}`"))?;
    let name = name.trim();
    let path = path.trim();

    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got `{raw}`"));
    }

    Ok(NamedDocument {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}

fn parse_trip_cost(raw: &str) -> Result<f64, String> {
    match parse_numeric_token(raw) {
        Some(value) if value >= 0.0 => Ok(value),
        _ => Err(format!("invalid trip cost `{raw}`")),
    }
}
