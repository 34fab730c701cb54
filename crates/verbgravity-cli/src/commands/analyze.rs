//! The `verbgravity analyze` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use verbgravity_backend::load_config_from;
use verbgravity_core::parser;
use verbgravity_core::traits::PassageAnalyzer;

pub async fn execute(
    text: Option<String>,
    file: Option<PathBuf>,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let Some(backend) = config.backend()? else {
        anyhow::bail!("no API configured: set api_base_url in verbgravity.toml or VERBGRAVITY_API_URL");
    };

    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read passage text: {}", path.display()))?,
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "passage text is empty");

    eprintln!("Analysing passage via {} ...", backend.base_url());
    let passage = backend.analyze(text).await?;

    for warning in parser::validate_passage(&passage) {
        eprintln!("  WARNING: {warning}");
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&passage)?;
    std::fs::write(&output, json)
        .with_context(|| format!("failed to write passage to {}", output.display()))?;

    println!(
        "Analysed {} sentences ({}). Saved to: {}",
        passage.sentences.len(),
        passage.meta.model,
        output.display()
    );
    Ok(())
}
