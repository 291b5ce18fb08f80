use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::QuoteArgs;
use crate::model::Policy;
use crate::pricing::{PricingConfig, QuoteRequest, build_quote};
use crate::util::{read_json, to_json_pretty};

pub fn run(args: QuoteArgs) -> Result<()> {
    let policy: Policy = read_json(&args.policy)?;
    let Some(medical) = policy.medical() else {
        bail!("policy {} has no medical benefit", args.policy.display());
    };

    let config = match &args.pricing_config {
        Some(path) => {
            let config = PricingConfig::load(path)?;
            info!(path = %path.display(), "loaded pricing config");
            config
        }
        None => PricingConfig::default(),
    };

    if medical.effective_limit().is_none() {
        warn!(
            product = %policy.product_name,
            "policy has no medical limit; pricing without medical component"
        );
    }

    let request = QuoteRequest {
        trip_days: args.trip_days,
        age: args.age,
        destination_risk: args.destination_risk,
        plan_tier: args.plan_tier,
        include_cancellation: args.include_cancellation,
        trip_cost: args.trip_cost.unwrap_or(0.0),
    };

    let quote = build_quote(&policy.product_name, medical, &request, &config);
    info!(
        product = %quote.product,
        premium = quote.premium,
        currency = %quote.currency,
        "quote built"
    );
    println!("{}", to_json_pretty(&quote)?);

    Ok(())
}
