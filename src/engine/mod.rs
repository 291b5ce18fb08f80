mod assemble;
mod benefits;
mod citation;
mod clauses;
mod config;
mod numeric;
mod product;
mod rules;
mod sanity;
mod text;

pub(crate) use assemble::{NormalizedDocument, normalize_document};
pub(crate) use config::NormalizeConfig;
pub(crate) use numeric::parse_numeric_token;
pub(crate) use rules::RuleSet;
