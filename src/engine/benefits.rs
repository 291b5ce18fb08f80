use tracing::debug;

use crate::document::PageText;
use crate::model::{Benefit, BenefitUnit};

use super::citation::CitationTracker;
use super::config::NormalizeConfig;
use super::product::ProductVariant;
use super::rules::RuleSet;
use super::sanity::resolve_currency;

/// Raw medical benefit before the sanity filter runs. `pages` must already
/// be canonical and in ascending page order.
pub fn extract_medical(
    pages: &[PageText],
    source: &str,
    product: ProductVariant,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Benefit {
    let mut tracker = CitationTracker::new(source, config);
    let mut benefit = Benefit::empty(&config.fallback_currency);
    benefit.per = Some(BenefitUnit::Trip);

    let limit = rules
        .limit_rules_for(product)
        .find_map(|rule| rule.find(pages).map(|hit| (rule, hit)));

    let mut limit_currency = None;
    if let Some((rule, hit)) = limit {
        debug!(
            rule = rule.name,
            product = product.as_str(),
            page = hit.page.page,
            limit = hit.value.value,
            "medical limit matched"
        );
        benefit.max_limit = Some(hit.value.value);
        benefit.per = Some(rules.resolve_unit(rule.unit, &hit.page.text, hit.start, hit.end));
        limit_currency = hit.value.currency;
        tracker.record(hit.page, hit.start, hit.end);
    }

    for band in &rules.age_bands {
        if let Some(hit) = band.find(pages) {
            debug!(band = band.label, page = hit.page.page, limit = hit.value.value, "age band matched");
            benefit.age_bands.insert(band.label.to_string(), hit.value.value);
            tracker.record(hit.page, hit.start, hit.end);
        }
    }

    for sublimit in &rules.sublimits {
        if let Some(hit) = sublimit.find_where(pages, |amount| amount.value > 0.0) {
            debug!(
                sublimit = sublimit.label,
                page = hit.page.page,
                limit = hit.value.value,
                "sub-limit matched"
            );
            benefit.sublimits.insert(sublimit.label.to_string(), hit.value.value);
            tracker.record(hit.page, hit.start, hit.end);
        }
    }

    let full_text = pages
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<&str>>()
        .join("\n");
    benefit.currency = resolve_currency(
        limit_currency,
        rules.document_currency(&full_text),
        &config.fallback_currency,
    );
    benefit.citations = tracker.into_citations();

    benefit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<PageText> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| PageText {
                page: (index + 1) as u32,
                text: text.to_string(),
            })
            .collect()
    }

    fn extract(texts: &[&str], source: &str, product: ProductVariant) -> Benefit {
        let rules = RuleSet::new().expect("rule set should compile");
        extract_medical(
            &pages(texts),
            source,
            product,
            &rules,
            &NormalizeConfig::default(),
        )
    }

    #[test]
    fn no_recognizable_phrase_leaves_limit_unset_without_citations() {
        let benefit = extract(
            &["This page describes how to make a claim.", "Contact us at 6333 0000."],
            "claims.pdf",
            ProductVariant::Unknown,
        );

        assert_eq!(benefit.max_limit, None);
        assert!(benefit.citations.is_empty());
        assert!(benefit.sublimits.is_empty());
        assert!(benefit.age_bands.is_empty());
        assert_eq!(benefit.currency, "SGD");
        assert_eq!(benefit.per, Some(BenefitUnit::Trip));
    }

    #[test]
    fn specialised_row_wins_over_generic_match_on_an_earlier_page() {
        let benefit = extract(
            &[
                "Medical benefits are described below. Claims up to S$ 100 need no receipt.",
                "Medical expenses whilst overseas S$ 250,000 per day cover",
            ],
            "TravelEasy Policy QTD032212.pdf",
            ProductVariant::TravelEasy,
        );

        assert_eq!(benefit.max_limit, Some(250_000.0));
        assert_eq!(benefit.per, Some(BenefitUnit::Trip));
        assert_eq!(benefit.citations[0].page, 2);
    }

    #[test]
    fn amounts_after_in_excess_of_are_not_read_as_a_deductible() {
        let benefit = extract(
            &["Medical expenses SGD 100,000. Bills in excess of S$ 100,000 are not payable. Excess S$ 250"],
            "acme.pdf",
            ProductVariant::Unknown,
        );

        assert_eq!(benefit.max_limit, Some(100_000.0));
        assert_eq!(benefit.deductible, None);
        assert_eq!(benefit.citations.len(), 1);
    }

    #[test]
    fn generic_fallback_applies_when_specialised_rule_finds_nothing() {
        let benefit = extract(
            &["Overseas Medical Expenses SGD 150,000 per person"],
            "TravelEasy Policy QTD032212.pdf",
            ProductVariant::TravelEasy,
        );

        assert_eq!(benefit.max_limit, Some(150_000.0));
        assert_eq!(benefit.per, Some(BenefitUnit::Person));
    }

    #[test]
    fn scootsurance_adult_band_sets_daily_unit_only_when_nearby() {
        let benefit = extract(
            &["12 to 69 years old S$ 200 per day for hospital stays"],
            "Scootsurance QSR022206_updated.pdf",
            ProductVariant::Scootsurance,
        );
        assert_eq!(benefit.max_limit, Some(200.0));
        assert_eq!(benefit.per, Some(BenefitUnit::Day));
        assert_eq!(benefit.age_bands.get("12-69"), Some(&200.0));
        assert_eq!(benefit.citations.len(), 2);
    }

    #[test]
    fn first_page_match_wins_even_when_a_later_page_is_more_specific() {
        // Observed tie-break: page 2 is never inspected once page 1 matches.
        let benefit = extract(
            &[
                "Medical expenses SGD 5,000",
                "Medical expenses whilst overseas SGD 500,000",
            ],
            "acme.pdf",
            ProductVariant::Unknown,
        );

        assert_eq!(benefit.max_limit, Some(5_000.0));
        assert_eq!(benefit.citations.len(), 1);
        assert_eq!(benefit.citations[0].page, 1);
    }

    #[test]
    fn sublimits_are_captured_with_their_own_citations() {
        let benefit = extract(
            &[
                "Medical expenses SGD 200,000",
                "TCM treatment up to S$ 1,000\nEmergency Dental Expenses S$ 500",
            ],
            "acme.pdf",
            ProductVariant::Unknown,
        );

        assert_eq!(benefit.sublimits.get("tcm"), Some(&1_000.0));
        assert_eq!(benefit.sublimits.get("dental"), Some(&500.0));
        assert_eq!(benefit.citations.len(), 3);
        assert_eq!(benefit.citations[1].page, 2);
        assert_eq!(benefit.citations[2].page, 2);
    }

    #[test]
    fn currency_comes_from_limit_marker_then_document_then_fallback() {
        let explicit = extract(&["Medical expenses US$ 50,000"], "a.pdf", ProductVariant::Unknown);
        assert_eq!(explicit.currency, "USD");

        let document = extract(
            &["All amounts in GBP.", "Medical expenses $ 50,000"],
            "a.pdf",
            ProductVariant::Unknown,
        );
        assert_eq!(document.currency, "GBP");

        let fallback = extract(&["Medical expenses $ 50,000"], "a.pdf", ProductVariant::Unknown);
        assert_eq!(fallback.currency, "SGD");
    }
}
