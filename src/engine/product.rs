#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductVariant {
    TravelEasy,
    Scootsurance,
    Unknown,
}

impl ProductVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TravelEasy => "traveleasy",
            Self::Scootsurance => "scootsurance",
            Self::Unknown => "unknown",
        }
    }
}

/// Classifies a product from a document path or product name. Only the file
/// name part of a path is inspected; case, spaces and punctuation are ignored.
pub fn classify_product(identifier: &str) -> ProductVariant {
    let file_name = identifier
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(identifier);
    let normalized = file_name
        .chars()
        .filter(|character| character.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    if normalized.contains("traveleasy") || normalized.contains("qtd") {
        ProductVariant::TravelEasy
    } else if normalized.contains("scootsurance")
        || normalized.contains("scoot")
        || normalized.contains("qsr")
    {
        ProductVariant::Scootsurance
    } else {
        ProductVariant::Unknown
    }
}

/// The source identifier decides first; the product name is consulted only
/// when the identifier is not recognised.
pub fn resolve_product(source: &str, product_name: &str) -> ProductVariant {
    match classify_product(source) {
        ProductVariant::Unknown => classify_product(product_name),
        variant => variant,
    }
}
