pub const DEFAULT_LOW_LIMIT_THRESHOLD: f64 = 10_000.0;
pub const DEFAULT_SUBLIMIT_OVERSHOOT_RATIO: f64 = 1.2;
pub const DEFAULT_FALLBACK_CURRENCY: &str = "SGD";
pub const DEFAULT_SNIPPET_PAD_CHARS: usize = 80;
pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 400;

/// Tunables shared by every stage of one normalization run.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Main limits below this are kept but annotated for review.
    pub low_limit_threshold: f64,
    /// Sub-limits above `ratio * max_limit` are dropped.
    pub sublimit_overshoot_ratio: f64,
    pub fallback_currency: String,
    pub snippet_pad_chars: usize,
    pub snippet_max_chars: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            low_limit_threshold: DEFAULT_LOW_LIMIT_THRESHOLD,
            sublimit_overshoot_ratio: DEFAULT_SUBLIMIT_OVERSHOOT_RATIO,
            fallback_currency: DEFAULT_FALLBACK_CURRENCY.to_string(),
            snippet_pad_chars: DEFAULT_SNIPPET_PAD_CHARS,
            snippet_max_chars: DEFAULT_SNIPPET_MAX_CHARS,
        }
    }
}
