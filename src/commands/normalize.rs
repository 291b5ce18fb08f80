use anyhow::{Context, Result};
use tracing::info;

use crate::cli::NormalizeArgs;
use crate::document::reader_for;
use crate::engine::{RuleSet, normalize_document};
use crate::util::{to_json_pretty, write_json_pretty};

pub fn run(args: NormalizeArgs) -> Result<()> {
    let rules = RuleSet::new()?;
    let config = args.sanity.to_config();
    let reader = reader_for(&args.document)?;

    let normalized = normalize_document(
        reader.as_ref(),
        &args.document,
        &args.product,
        args.include_tables,
        &rules,
        &config,
    )
    .with_context(|| format!("failed to normalize {}", args.document.display()))?;

    match args.out {
        Some(out) => {
            write_json_pretty(&out, &normalized.policy)?;
            info!(path = %out.display(), "wrote policy json");
        }
        None => println!("{}", to_json_pretty(&normalized.policy)?),
    }

    Ok(())
}
