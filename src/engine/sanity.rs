use tracing::{info, warn};

use crate::model::Benefit;

use super::config::NormalizeConfig;

pub const LOW_LIMIT_NOTE: &str = "Low medical limit detected; verify against Schedule of Benefits.";
const NOTE_SEPARATOR: &str = " | ";

/// Plausibility corrections applied after raw extraction. Applying it twice
/// gives the same result as applying it once.
pub fn sanitize_benefit(mut benefit: Benefit, config: &NormalizeConfig) -> Benefit {
    if benefit.currency.trim().is_empty() {
        benefit.currency = config.fallback_currency.clone();
    }

    let Some(limit) = benefit.max_limit else {
        return benefit;
    };

    if limit < config.low_limit_threshold {
        info!(
            limit,
            threshold = config.low_limit_threshold,
            "medical limit below review threshold"
        );
        append_note(&mut benefit.notes, LOW_LIMIT_NOTE);
    }

    let ceiling = config.sublimit_overshoot_ratio * limit;
    benefit.sublimits.retain(|name, value| {
        let plausible = *value <= ceiling;
        if !plausible {
            warn!(
                sublimit = %name,
                value = *value,
                limit,
                "dropping sub-limit that exceeds main limit"
            );
        }
        plausible
    });

    benefit
}

pub fn resolve_currency(
    limit_currency: Option<&str>,
    document_currency: Option<&str>,
    fallback: &str,
) -> String {
    limit_currency
        .or(document_currency)
        .unwrap_or(fallback)
        .to_string()
}

fn append_note(notes: &mut Option<String>, note: &str) {
    match notes {
        Some(existing) if existing.split(NOTE_SEPARATOR).any(|entry| entry == note) => {}
        Some(existing) => {
            existing.push_str(NOTE_SEPARATOR);
            existing.push_str(note);
        }
        None => *notes = Some(note.to_string()),
    }
}
