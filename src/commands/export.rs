use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use tracing::info;

use crate::cli::{ExportArgs, NamedDocument};
use crate::document::reader_for;
use crate::engine::{NormalizeConfig, NormalizedDocument, RuleSet, normalize_document};
use crate::model::{ExportEntry, ExportManifest};
use crate::util::{ensure_directory, now_utc_string, sha256_file, write_json_pretty};

const MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE_NAME: &str = "export_manifest.json";

pub fn run(args: ExportArgs) -> Result<()> {
    let rules = RuleSet::new()?;
    let config = args.sanity.to_config();

    let manifest = export_policies(
        &args.documents,
        &args.out_dir,
        args.include_tables,
        &rules,
        &config,
    )?;

    let manifest_path = args.out_dir.join(MANIFEST_FILE_NAME);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote export manifest");
    info!(policy_count = manifest.policy_count, "export completed");

    Ok(())
}

/// Normalizes every document in parallel and writes one policy file per
/// document. Any document that fails aborts the export.
pub fn export_policies(
    documents: &[NamedDocument],
    out_dir: &Path,
    include_tables: bool,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Result<ExportManifest> {
    let mut stems = HashSet::new();
    for document in documents {
        let stem = safe_file_stem(&document.name);
        if !stems.insert(stem.clone()) {
            bail!("duplicate output name `{stem}` for {}", document.path.display());
        }
    }

    ensure_directory(out_dir)?;

    let policies = documents
        .par_iter()
        .map(|document| export_one(document, out_dir, include_tables, rules, config))
        .collect::<Result<Vec<ExportEntry>>>()?;

    Ok(ExportManifest {
        manifest_version: MANIFEST_VERSION,
        generated_at: now_utc_string(),
        out_dir: out_dir.display().to_string(),
        policy_count: policies.len(),
        policies,
    })
}

fn export_one(
    document: &NamedDocument,
    out_dir: &Path,
    include_tables: bool,
    rules: &RuleSet,
    config: &NormalizeConfig,
) -> Result<ExportEntry> {
    let reader = reader_for(&document.path)?;
    let NormalizedDocument {
        policy,
        page_count,
        table_count,
    } = normalize_document(
        reader.as_ref(),
        &document.path,
        &document.name,
        include_tables,
        rules,
        config,
    )
    .with_context(|| format!("failed to normalize {}", document.path.display()))?;

    let sha256 = sha256_file(&document.path)?;
    let output_path = out_dir.join(format!("{}.json", safe_file_stem(&document.name)));
    write_json_pretty(&output_path, &policy)?;

    info!(
        product = %document.name,
        path = %output_path.display(),
        pages = page_count,
        "wrote policy json"
    );

    Ok(ExportEntry {
        product_name: policy.product_name,
        source: document.path.display().to_string(),
        sha256,
        page_count,
        table_count,
        output_path: output_path.display().to_string(),
    })
}

/// File-name-safe form of a product name: anything other than ASCII
/// letters, digits, `-` and `_` becomes `_`.
pub fn safe_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for character in name.trim().chars() {
        let keep = character.is_ascii_alphanumeric() || character == '-' || character == '_';
        if keep {
            stem.push(character);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "policy".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::model::Policy;
    use crate::util::read_json;

    fn named(name: &str, path: PathBuf) -> NamedDocument {
        NamedDocument {
            name: name.to_string(),
            path,
        }
    }

    #[test]
    fn safe_file_stem_replaces_separators() {
        assert_eq!(safe_file_stem("TravelEasy"), "TravelEasy");
        assert_eq!(safe_file_stem("Scoot / Insurance (2024)"), "Scoot_Insurance_2024");
        assert_eq!(safe_file_stem("../../etc"), "etc");
        assert_eq!(safe_file_stem("   "), "policy");
    }

    #[test]
    fn export_writes_one_policy_per_document_and_a_manifest() {
        let input = tempfile::tempdir().expect("temp dir should be created");
        let out = tempfile::tempdir().expect("temp dir should be created");
        let first = input.path().join("first.txt");
        let second = input.path().join("second.txt");
        fs::write(&first, "Medical expenses SGD 100,000").expect("fixture should be written");
        fs::write(&second, "Overseas Medical Benefits S$ 250,000 per person")
            .expect("fixture should be written");

        let documents = vec![named("Acme Basic", first), named("Acme Plus", second)];
        let manifest = export_policies(
            &documents,
            out.path(),
            false,
            &RuleSet::new().expect("rule set should compile"),
            &NormalizeConfig::default(),
        )
        .expect("export should succeed");

        assert_eq!(manifest.policy_count, 2);
        assert_eq!(manifest.policies[0].product_name, "Acme Basic");
        assert_eq!(manifest.policies[1].product_name, "Acme Plus");
        assert_eq!(manifest.policies[0].page_count, 1);
        assert_eq!(manifest.policies[0].sha256.len(), 64);

        let policy: Policy =
            read_json(&out.path().join("Acme_Plus.json")).expect("policy json should parse");
        let medical = policy.medical().expect("medical benefit always present");
        assert_eq!(medical.max_limit, Some(250_000.0));
        assert_eq!(medical.citations.len(), 1);
    }

    #[test]
    fn one_unreadable_document_fails_the_export() {
        let input = tempfile::tempdir().expect("temp dir should be created");
        let out = tempfile::tempdir().expect("temp dir should be created");
        let present = input.path().join("present.txt");
        fs::write(&present, "Medical expenses SGD 100,000").expect("fixture should be written");

        let documents = vec![
            named("Present", present),
            named("Missing", input.path().join("missing.txt")),
        ];
        let result = export_policies(
            &documents,
            out.path(),
            false,
            &RuleSet::new().expect("rule set should compile"),
            &NormalizeConfig::default(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn colliding_output_names_are_rejected() {
        let out = tempfile::tempdir().expect("temp dir should be created");
        let documents = vec![
            named("Acme Plus", PathBuf::from("a.txt")),
            named("Acme/Plus", PathBuf::from("b.txt")),
        ];
        let result = export_policies(
            &documents,
            out.path(),
            false,
            &RuleSet::new().expect("rule set should compile"),
            &NormalizeConfig::default(),
        );

        assert!(result.is_err());
    }
}
