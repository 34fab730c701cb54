//! The `verbgravity validate` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use verbgravity_core::parser;

pub fn execute(passage_path: PathBuf) -> Result<()> {
    let files = if passage_path.is_dir() {
        passage_files(&passage_path)?
    } else {
        vec![passage_path]
    };

    let mut total_warnings = 0;

    for file in &files {
        let passage = parser::parse_passage(file)?;
        println!(
            "Passage: {} ({} sentences)",
            file.display(),
            passage.sentences.len()
        );

        let warnings = parser::validate_passage(&passage);
        for w in &warnings {
            println!("  WARNING: {w}");
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All passages valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

/// `*.json` files directly inside `dir`, sorted by name.
fn passage_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    anyhow::ensure!(
        !files.is_empty(),
        "no passage files found in {}",
        dir.display()
    );
    Ok(files)
}
