use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::document::PageText;
use crate::model::BenefitUnit;

use super::numeric::parse_amount;
use super::product::ProductVariant;
use super::text::char_window;

const NUM: &str = r"(?:\d{1,3}(?:[,\x{00A0}\x{2009}\x{202F}' ]\d{3})+|\d+)(?:\.\d+)?";
const CURRENCY: &str = r"(?P<currency>SGD|S\$|USD|US\$|EUR|GBP|€|£|\$)";
const UNIT: &str = r"(?:\s*(?P<unit>million|thousand|m|k)\b)?";
const CURRENCY_MARKER: &str = r"\bSGD\b|S\$|\bUSD\b|US\$|\bEUR\b|€|\bGBP\b|£";

pub const SINGAPORE_RESIDENT: &str = "Singapore resident";

pub const SCOOTSURANCE_UNIT_WINDOW: usize = 60;
pub const GENERIC_UNIT_WINDOW: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount {
    pub value: f64,
    pub currency: Option<&'static str>,
}

/// A satisfying match: the page it was found on, its byte span and the parsed value.
#[derive(Debug, Clone)]
pub struct PageHit<'p, T> {
    pub page: &'p PageText,
    pub start: usize,
    pub end: usize,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGate {
    Fixed(BenefitUnit),
    /// Unit keywords count only within this many characters of the match.
    Proximity(usize),
}

#[derive(Debug)]
pub struct LimitRule {
    pub name: &'static str,
    pub product: Option<ProductVariant>,
    pub unit: UnitGate,
    pattern: Regex,
}

impl LimitRule {
    pub fn find<'p>(&self, pages: &'p [PageText]) -> Option<PageHit<'p, Amount>> {
        first_hit(&self.pattern, pages, amount_from)
    }
}

#[derive(Debug)]
pub struct LabeledAmountRule {
    pub label: &'static str,
    pattern: Regex,
}

impl LabeledAmountRule {
    pub fn find<'p>(&self, pages: &'p [PageText]) -> Option<PageHit<'p, Amount>> {
        first_hit(&self.pattern, pages, amount_from)
    }

    pub fn find_where<'p>(
        &self,
        pages: &'p [PageText],
        predicate: impl Fn(&Amount) -> bool,
    ) -> Option<PageHit<'p, Amount>> {
        first_hit(&self.pattern, pages, |captures| {
            amount_from(captures).filter(|amount| predicate(amount))
        })
    }
}

#[derive(Debug)]
pub struct EligibilityRules {
    pub age_range: Vec<Regex>,
    pub trip_duration: Vec<Regex>,
    pub residency: Vec<Regex>,
}

#[derive(Debug)]
pub struct ExclusionRules {
    pub pre_existing: Regex,
    pub high_risk_activities: Regex,
    pub war_terrorism: Regex,
}

#[derive(Debug)]
pub struct RuleSet {
    pub medical_limits: Vec<LimitRule>,
    pub age_bands: Vec<LabeledAmountRule>,
    pub sublimits: Vec<LabeledAmountRule>,
    pub eligibility: EligibilityRules,
    pub exclusions: ExclusionRules,
    unit_tokens: Vec<(BenefitUnit, Regex)>,
    currency_marker: Regex,
}

impl RuleSet {
    pub fn new() -> Result<Self> {
        let amount = format!("{CURRENCY}\\s*(?P<amount>{NUM}){UNIT}");
        let row = |label: &str| format!("(?is){label}.*?{amount}");
        let nearby = |label: &str, gap: usize| format!("(?i){label}[^.\\n\\r]{{0,{gap}}}?{amount}");

        Ok(Self {
            medical_limits: vec![
                LimitRule {
                    name: "traveleasy_medical_row",
                    product: Some(ProductVariant::TravelEasy),
                    unit: UnitGate::Fixed(BenefitUnit::Trip),
                    pattern: compile(
                        "traveleasy medical row",
                        &row(r"Medical\s+expenses\s+whilst\s+overseas"),
                    )?,
                },
                LimitRule {
                    name: "scootsurance_adult_band",
                    product: Some(ProductVariant::Scootsurance),
                    unit: UnitGate::Proximity(SCOOTSURANCE_UNIT_WINDOW),
                    pattern: compile(
                        "scootsurance adult band",
                        &row(r"(?:12\s*to\s*69\s*years\s*old|adult)"),
                    )?,
                },
                LimitRule {
                    name: "generic_medical_row",
                    product: None,
                    unit: UnitGate::Proximity(GENERIC_UNIT_WINDOW),
                    pattern: compile(
                        "generic medical row",
                        &row(r"Medical\s+(?:expenses|benefits?)"),
                    )?,
                },
            ],
            age_bands: vec![
                LabeledAmountRule {
                    label: "12-69",
                    pattern: compile(
                        "adult age band",
                        &row(r"(?:12\s*to\s*69\s*years\s*old|adult)"),
                    )?,
                },
                LabeledAmountRule {
                    label: "70-74",
                    pattern: compile("senior age band", &row(r"70\s*to\s*74\s*years\s*old"))?,
                },
                LabeledAmountRule {
                    label: "<12",
                    pattern: compile(
                        "child age band",
                        &row(r"(?:below|under)\s*12\s*years\s*old"),
                    )?,
                },
            ],
            sublimits: vec![
                LabeledAmountRule {
                    label: "tcm",
                    pattern: compile(
                        "tcm sub-limit",
                        &nearby(r"(?:\bTCM\b|Traditional\s+Chinese\s+medicine)", 80),
                    )?,
                },
                LabeledAmountRule {
                    label: "dental",
                    pattern: compile(
                        "dental sub-limit",
                        &nearby(r"(?:Emergency\s+Dental\s+Expenses|Dental\s+Expenses)", 80),
                    )?,
                },
            ],
            eligibility: EligibilityRules {
                age_range: vec![
                    compile(
                        "age range",
                        r"(?i)\b(?:age|aged)\s*(?:from|between)?\s*(?P<min>\d{1,2})[^\d\n]{1,20}?(?P<max>\d{1,3})\s*years",
                    )?,
                    compile(
                        "between ages",
                        r"(?i)\bbetween\s+(?:the\s+)?ages?\s+(?:of\s+)?(?P<min>\d{1,2})\s*(?:and|to|-)\s*(?P<max>\d{1,3})\b",
                    )?,
                ],
                trip_duration: vec![
                    compile(
                        "trip duration",
                        r"(?i)trip\s*(?:duration|length).{0,40}?(?:up\s+to|maximum|max\.?).{0,10}?(?P<days>\d{1,3})\s*days?\b",
                    )?,
                    compile(
                        "maximum trip duration",
                        r"(?i)\b(?:maximum|max\.?)\s+(?:trip\s*(?:duration|length)|period\s+of\s+(?:insurance|cover))\s*(?:of|is|:)?\s*(?P<days>\d{1,3})\s*(?:consecutive\s+)?days?\b",
                    )?,
                ],
                residency: vec![
                    compile(
                        "residency",
                        r"(?i)\b(?:residents?|residency)\b.{0,20}?\b(?:singapore|sg)\b",
                    )?,
                    compile(
                        "singapore citizen",
                        r"(?i)\bsingapore\s+(?:citizens?|permanent\s+residents?|residents?)\b",
                    )?,
                ],
            },
            exclusions: ExclusionRules {
                pre_existing: compile(
                    "pre-existing exclusion",
                    r"(?is)pre-?\s*existing.{0,300}?(?:excluded|not\s+covered|no\s+cover|exclusion|and\s+its\s+complications)",
                )?,
                high_risk_activities: compile(
                    "high-risk exclusion",
                    r"(?is)(?:high[-\s]*risk|hazardous).{0,120}?(?:activities|sports)|\b(?:off[-\s]*piste|mountaineering|scuba|ultra[-\s]*marathon)",
                )?,
                war_terrorism: compile(
                    "war exclusion",
                    r"(?i)\b(?:war|invasion|act\s+of\s+foreign\s+enemy|terrorism|terrorist|civil\s+commotion|riot)s?\b",
                )?,
            },
            unit_tokens: vec![
                (BenefitUnit::Day, compile("per day", r"(?i)\bper\s+day\b")?),
                (
                    BenefitUnit::Trip,
                    compile("per trip", r"(?i)\bper\s+(?:trip|journey)\b")?,
                ),
                (
                    BenefitUnit::Person,
                    compile(
                        "per person",
                        r"(?i)\bper\s+(?:insured\s+)?(?:person|traveller|traveler)\b",
                    )?,
                ),
                (BenefitUnit::Family, compile("per family", r"(?i)\bper\s+family\b")?),
            ],
            currency_marker: compile("currency marker", CURRENCY_MARKER)?,
        })
    }

    /// Rules for `product` in priority order: specialised ones, then generic fallbacks.
    pub fn limit_rules_for(&self, product: ProductVariant) -> impl Iterator<Item = &LimitRule> {
        let specialised = self
            .medical_limits
            .iter()
            .filter(move |rule| rule.product == Some(product));
        let generic = self
            .medical_limits
            .iter()
            .filter(|rule| rule.product.is_none());
        specialised.chain(generic)
    }

    pub fn resolve_unit(&self, gate: UnitGate, text: &str, start: usize, end: usize) -> BenefitUnit {
        let window = match gate {
            UnitGate::Fixed(unit) => return unit,
            UnitGate::Proximity(chars) => char_window(text, start, end, chars),
        };

        self.unit_tokens
            .iter()
            .find(|(_, pattern)| pattern.is_match(window))
            .map(|(unit, _)| *unit)
            .unwrap_or(BenefitUnit::Trip)
    }

    /// First explicit currency marker in `text`; a bare `$` does not count.
    pub fn document_currency(&self, text: &str) -> Option<&'static str> {
        self.currency_marker
            .find(text)
            .and_then(|marker| currency_code(marker.as_str()))
    }
}

pub fn currency_code(marker: &str) -> Option<&'static str> {
    match marker.trim().to_ascii_uppercase().as_str() {
        "SGD" | "S$" => Some("SGD"),
        "USD" | "US$" => Some("USD"),
        "EUR" | "€" => Some("EUR"),
        "GBP" | "£" => Some("GBP"),
        _ => None,
    }
}

/// Scans pages in order and returns the first match that `accept` turns into a value.
pub fn first_hit<'p, T>(
    pattern: &Regex,
    pages: &'p [PageText],
    mut accept: impl FnMut(&Captures<'p>) -> Option<T>,
) -> Option<PageHit<'p, T>> {
    pages
        .iter()
        .find_map(|page| hit_on_page(pattern, page, &mut accept))
}

/// Equivalent phrasings of one field. Page order decides first; on a single
/// page the earlier pattern wins.
pub fn first_hit_in<'p, T>(
    patterns: &[Regex],
    pages: &'p [PageText],
    mut accept: impl FnMut(&Captures<'p>) -> Option<T>,
) -> Option<PageHit<'p, T>> {
    pages.iter().find_map(|page| {
        patterns
            .iter()
            .find_map(|pattern| hit_on_page(pattern, page, &mut accept))
    })
}

fn hit_on_page<'p, T>(
    pattern: &Regex,
    page: &'p PageText,
    accept: &mut impl FnMut(&Captures<'p>) -> Option<T>,
) -> Option<PageHit<'p, T>> {
    pattern.captures_iter(&page.text).find_map(|captures| {
        let value = accept(&captures)?;
        let whole = captures.get(0)?;
        Some(PageHit {
            page,
            start: whole.start(),
            end: whole.end(),
            value,
        })
    })
}

fn amount_from(captures: &Captures<'_>) -> Option<Amount> {
    let number = captures.name("amount")?.as_str();
    let unit = captures.name("unit").map(|unit| unit.as_str());
    let value = parse_amount(number, unit)?;

    Some(Amount {
        value,
        currency: captures
            .name("currency")
            .and_then(|marker| currency_code(marker.as_str())),
    })
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("failed to compile {name} regex"))
}
