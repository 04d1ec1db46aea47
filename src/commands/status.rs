use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::ChunkRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args
        .output_root
        .join("manifests")
        .join("chunk_run_latest.json");

    info!(output_root = %args.output_root.display(), "status requested");

    if !manifest_path.exists() {
        warn!(path = %manifest_path.display(), "no run manifest found");
        return Ok(());
    }

    let raw = fs::read(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: ChunkRunManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        source_pdf = %manifest.paths.source_pdf,
        source_sha256 = %manifest.source_sha256,
        total_pages = manifest.counts.total_pages,
        text_pages = manifest.counts.text_pages,
        ocr_pages = manifest.counts.ocr_pages,
        total_words = manifest.counts.total_words,
        chunks = manifest.counts.chunk_count,
        "latest chunk run"
    );

    for chunk in &manifest.chunks {
        info!(
            chunk_id = chunk.chunk_id,
            pages = %format!("{}-{}", chunk.start_page, chunk.end_page),
            words = chunk.word_count,
            file = %chunk.file_name,
            "chunk"
        );
    }

    for entry in &manifest.page_sources {
        info!(
            page = entry.page_number,
            source = entry.source.as_str(),
            "page source"
        );
    }

    report_audit_log(&manifest)?;

    for warning in &manifest.warnings {
        warn!(warning = %warning, "run warning");
    }

    Ok(())
}

fn report_audit_log(manifest: &ChunkRunManifest) -> Result<()> {
    let audit_log_path = Path::new(&manifest.paths.audit_log_path);

    if !audit_log_path.exists() {
        warn!(path = %audit_log_path.display(), "page source log missing");
        return Ok(());
    }

    let contents = fs::read_to_string(audit_log_path)
        .with_context(|| format!("failed to read {}", audit_log_path.display()))?;
    let recorded_rows = audit_row_count(&contents);

    info!(
        path = %audit_log_path.display(),
        pages = recorded_rows,
        "page source log"
    );

    if recorded_rows != manifest.page_sources.len() {
        warn!(
            expected = manifest.page_sources.len(),
            found = recorded_rows,
            "page source log row count does not match manifest"
        );
    }

    Ok(())
}

// The log carries a two-line header before the per-page rows.
fn audit_row_count(contents: &str) -> usize {
    contents
        .lines()
        .skip(2)
        .filter(|line| !line.trim().is_empty())
        .count()
}
