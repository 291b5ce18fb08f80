use regex::{Captures, Regex};
use tracing::debug;

use crate::document::PageText;
use crate::model::{Eligibility, Exclusions};

use super::citation::CitationTracker;
use super::config::NormalizeConfig;
use super::rules::{RuleSet, SINGAPORE_RESIDENT, first_hit, first_hit_in};

const MAX_PLAUSIBLE_AGE: u32 = 120;

pub fn extract_eligibility(
    pages: &[PageText],
    source: &str,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Eligibility {
    let mut tracker = CitationTracker::new(source, config);
    let mut eligibility = Eligibility::default();

    if let Some(hit) = first_hit_in(&rules.eligibility.age_range, pages, age_range) {
        let (min_age, max_age) = hit.value;
        debug!(min_age, max_age, page = hit.page.page, "age range matched");
        eligibility.min_age = Some(min_age);
        eligibility.max_age = Some(max_age);
        tracker.record(hit.page, hit.start, hit.end);
    }

    if let Some(hit) = first_hit_in(&rules.eligibility.trip_duration, pages, trip_days) {
        debug!(days = hit.value, page = hit.page.page, "trip duration matched");
        eligibility.trip_duration_max_days = Some(hit.value);
        tracker.record(hit.page, hit.start, hit.end);
    }

    if let Some(hit) = first_hit_in(&rules.eligibility.residency, pages, |_| {
        Some(SINGAPORE_RESIDENT)
    }) {
        eligibility.residency = Some(hit.value.to_string());
        tracker.record(hit.page, hit.start, hit.end);
    }

    eligibility.citations = tracker.into_citations();
    eligibility
}

/// Exclusion clauses are kept as the bounded snippet around the match.
pub fn extract_exclusions(
    pages: &[PageText],
    source: &str,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Exclusions {
    let mut tracker = CitationTracker::new(source, config);
    let patterns = &rules.exclusions;

    let mut clause = |pattern: &Regex| {
        first_hit(pattern, pages, |_| Some(()))
            .map(|hit| tracker.record(hit.page, hit.start, hit.end))
    };

    let pre_existing = clause(&patterns.pre_existing);
    let high_risk_activities = clause(&patterns.high_risk_activities);
    let war_terrorism = clause(&patterns.war_terrorism);

    Exclusions {
        pre_existing,
        high_risk_activities,
        war_terrorism,
        citations: tracker.into_citations(),
    }
}

fn age_range(captures: &Captures<'_>) -> Option<(u32, u32)> {
    let min_age = captures.name("min")?.as_str().parse::<u32>().ok()?;
    let max_age = captures.name("max")?.as_str().parse::<u32>().ok()?;
    (min_age <= max_age && max_age <= MAX_PLAUSIBLE_AGE).then_some((min_age, max_age))
}

fn trip_days(captures: &Captures<'_>) -> Option<u32> {
    captures
        .name("days")?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|days| *days > 0)
}
