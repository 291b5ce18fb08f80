use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::document::{DocumentError, DocumentReader, PageText};
use crate::model::{MEDICAL_CATEGORY, Policy};

use super::benefits::extract_medical;
use super::clauses::{extract_eligibility, extract_exclusions};
use super::config::NormalizeConfig;
use super::product::resolve_product;
use super::rules::RuleSet;
use super::sanity::sanitize_benefit;
use super::text::canonicalize_page_text;

#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    pub policy: Policy,
    pub page_count: usize,
    pub table_count: usize,
}

/// Builds one Policy from already-extracted page texts. Pure: no I/O and no
/// state shared between calls.
pub fn normalize_pages(
    pages: &[PageText],
    source: &str,
    product_name: &str,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Policy {
    let mut canonical = pages
        .iter()
        .map(|page| PageText {
            page: page.page,
            text: canonicalize_page_text(&page.text),
        })
        .collect::<Vec<PageText>>();
    canonical.sort_by_key(|page| page.page);

    let product = resolve_product(source, product_name);

    let medical = sanitize_benefit(
        extract_medical(&canonical, source, product, rules, config),
        config,
    );
    let eligibility = extract_eligibility(&canonical, source, rules, config);
    let exclusions = extract_exclusions(&canonical, source, rules, config);

    let mut benefits = BTreeMap::new();
    benefits.insert(MEDICAL_CATEGORY.to_string(), medical);

    Policy {
        product_name: product_name.to_string(),
        version: None,
        eligibility,
        benefits,
        exclusions,
    }
}

/// Reads a document through `reader` and normalizes it. A document that
/// cannot be read produces no Policy.
pub fn normalize_document(
    reader: &dyn DocumentReader,
    path: &Path,
    product_name: &str,
    include_tables: bool,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Result<NormalizedDocument, DocumentError> {
    let document = reader.read(path, include_tables)?;
    let pages = if include_tables {
        document.pages_with_tables()
    } else {
        document.pages.clone()
    };

    let policy = normalize_pages(&pages, &document.source, product_name, rules, config);

    info!(
        product = %policy.product_name,
        source = %document.source,
        pages = document.pages.len(),
        tables = document.tables.len(),
        max_limit = ?policy.medical().and_then(|benefit| benefit.max_limit),
        "normalized policy"
    );

    Ok(NormalizedDocument {
        page_count: document.pages.len(),
        table_count: document.tables.len(),
        policy,
    })
}
