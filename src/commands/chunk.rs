use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use tracing::info;

use crate::cli::ChunkArgs;
use crate::error::ChunkerError;
use crate::model::{
    Chunk, ChunkLimits, ChunkRunManifest, ChunkSummary, PageAuditEntry, PageSource, RunCounts,
    RunPaths, ToolVersions,
};
use crate::partition::partition;
use crate::pdf::{PageReader, PopplerDocument};
use crate::pipeline::{PipelineOptions, audit_entries, process_document};
use crate::util::{ensure_directory, sha256_file, write_manifest};

const MANIFEST_VERSION: u32 = 1;
const LANG_SPEC_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]*(\+[A-Za-z][A-Za-z0-9_]*)*$";

const PROOFREAD_INSTRUCTIONS: &str = "\
Proofread the following Arabic text:
- Correct spelling, grammar, punctuation, hamza, and spacing.
- Preserve the exact meaning and tone.
- Preserve headings, bullet points, numbering, and formatting as much as possible.
- Do NOT summarize, shorten, or remove content.
- Do NOT add explanations inside the text.
- Return:
  1. The fully corrected text only.
  2. A short bullet list of recurring issues you fixed (in Arabic).";

pub fn run(args: ChunkArgs) -> Result<()> {
    validate_args(&args)?;

    let started_ts = Utc::now();
    let started_at = started_ts.to_rfc3339_opts(SecondsFormat::Secs, true);
    let run_stamp = started_ts.format("%Y%m%dT%H%M%SZ").to_string();
    let run_id = format!("run-{run_stamp}");

    let chunks_dir = args.output_root.join("chunks");
    let logs_dir = args.output_root.join("logs");
    let manifest_dir = args.output_root.join("manifests");
    for directory in [&args.output_root, &chunks_dir, &logs_dir, &manifest_dir] {
        ensure_directory(directory)?;
    }
    let audit_log_path = logs_dir.join("page_sources.txt");
    let manifest_path = manifest_dir.join(format!("chunk_run_{run_stamp}.json"));
    let latest_manifest_path = manifest_dir.join("chunk_run_latest.json");

    info!(
        pdf = %args.pdf_path.display(),
        run_id = %run_id,
        max_words = args.max_words,
        max_pages = args.max_pages,
        ocr_lang = %args.ocr_lang,
        min_text_chars = args.min_text_chars,
        "starting chunk run"
    );

    let tool_versions = collect_tool_versions()?;
    let document = PopplerDocument::open(&args.pdf_path)?;
    let total_pages = document.page_count();
    info!(pages = total_pages, "opened document");

    let source_sha256 = sha256_file(&args.pdf_path)?;

    let options = PipelineOptions {
        ocr_lang: args.ocr_lang.clone(),
        min_text_chars: args.min_text_chars,
    };
    let processed = process_document(&document, &options, |record| {
        info!(
            page = record.page_number,
            total = total_pages,
            source = record.source.as_str(),
            words = record.word_count(),
            "processed page"
        );
    })?;

    let limits = ChunkLimits {
        max_words: args.max_words,
        max_pages: args.max_pages,
    };
    let chunks = partition(&processed.records, &limits);

    let mut chunk_summaries = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let file_name = chunk_file_name(chunk);
        let chunk_path = chunks_dir.join(&file_name);
        fs::write(&chunk_path, render_chunk_markdown(chunk))
            .with_context(|| format!("failed to write chunk file: {}", chunk_path.display()))?;
        info!(
            file = %file_name,
            pages = chunk.page_count(),
            words = chunk.word_count,
            "wrote chunk"
        );

        chunk_summaries.push(ChunkSummary {
            chunk_id: chunk.chunk_id,
            start_page: chunk.start_page,
            end_page: chunk.end_page,
            page_count: chunk.page_count(),
            word_count: chunk.word_count,
            file_name,
        });
    }

    let audit = audit_entries(&processed.records);
    write_audit_log(&audit_log_path, &audit)?;
    info!(path = %audit_log_path.display(), "wrote page source log");

    let text_pages = processed
        .records
        .iter()
        .filter(|record| record.source == PageSource::Text)
        .count();
    let ocr_pages = processed.records.len() - text_pages;
    let counts = RunCounts {
        total_pages: processed.records.len(),
        text_pages,
        ocr_pages,
        total_words: processed
            .records
            .iter()
            .map(|record| record.word_count())
            .sum(),
        chunk_count: chunks.len(),
    };

    let manifest = ChunkRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        command: render_chunk_command(&args),
        source_sha256,
        tool_versions,
        paths: RunPaths {
            source_pdf: args.pdf_path.display().to_string(),
            output_root: args.output_root.display().to_string(),
            chunks_dir: chunks_dir.display().to_string(),
            logs_dir: logs_dir.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            audit_log_path: audit_log_path.display().to_string(),
        },
        counts,
        chunks: chunk_summaries,
        page_sources: audit,
        warnings: processed.warnings,
    };
    write_manifest(&manifest_path, &manifest)?;
    write_manifest(&latest_manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    info!(
        total_pages = manifest.counts.total_pages,
        text_pages = manifest.counts.text_pages,
        ocr_pages = manifest.counts.ocr_pages,
        chunks = manifest.counts.chunk_count,
        "chunk run completed"
    );

    Ok(())
}

fn validate_args(args: &ChunkArgs) -> Result<(), ChunkerError> {
    if args.max_words == 0 {
        return Err(ChunkerError::Configuration(
            "max-words must be greater than zero".to_string(),
        ));
    }
    if args.max_pages == 0 {
        return Err(ChunkerError::Configuration(
            "max-pages must be greater than zero".to_string(),
        ));
    }
    if args.min_text_chars == 0 {
        return Err(ChunkerError::Configuration(
            "min-text-chars must be greater than zero".to_string(),
        ));
    }

    let lang_spec_regex = Regex::new(LANG_SPEC_PATTERN).map_err(|error| {
        ChunkerError::Configuration(format!("language spec pattern failed to compile: {error}"))
    })?;
    if !lang_spec_regex.is_match(&args.ocr_lang) {
        return Err(ChunkerError::Configuration(format!(
            "malformed OCR language spec '{}'; expected codes like 'ara' or 'ara+eng'",
            args.ocr_lang
        )));
    }

    Ok(())
}

fn chunk_file_name(chunk: &Chunk) -> String {
    format!(
        "chunk_{:03}_p{:03}-p{:03}.md",
        chunk.chunk_id, chunk.start_page, chunk.end_page
    )
}

fn render_chunk_markdown(chunk: &Chunk) -> String {
    let sections = chunk
        .pages
        .iter()
        .map(|page| format!("---- [Page {}] ----\n{}\n", page.page_number, page.text))
        .collect::<Vec<String>>();

    format!(
        "### CHUNK_META\nCHUNK_ID: {:03}\nPAGES: {}-{}\n\n### INSTRUCTIONS_FOR_CHATGPT\n{}\n\n### TEXT\n{}",
        chunk.chunk_id,
        chunk.start_page,
        chunk.end_page,
        PROOFREAD_INSTRUCTIONS,
        sections.join("\n")
    )
}

fn write_audit_log(path: &Path, entries: &[PageAuditEntry]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create page source log: {}", path.display()))?;

    writeln!(file, "Page Number | Source Type")
        .with_context(|| format!("failed to write page source log: {}", path.display()))?;
    writeln!(file, "{}", "-".repeat(30))
        .with_context(|| format!("failed to write page source log: {}", path.display()))?;
    for entry in entries {
        writeln!(file, "{:6}      | {}", entry.page_number, entry.source.as_str())
            .with_context(|| format!("failed to write page source log: {}", path.display()))?;
    }

    Ok(())
}

fn render_chunk_command(args: &ChunkArgs) -> String {
    let command = vec![
        "proofchunk".to_string(),
        "chunk".to_string(),
        args.pdf_path.display().to_string(),
        "--output-root".to_string(),
        args.output_root.display().to_string(),
        "--max-words".to_string(),
        args.max_words.to_string(),
        "--max-pages".to_string(),
        args.max_pages.to_string(),
        "--ocr-lang".to_string(),
        args.ocr_lang.clone(),
        "--min-text-chars".to_string(),
        args.min_text_chars.to_string(),
    ];

    command.join(" ")
}

fn collect_tool_versions() -> Result<ToolVersions> {
    Ok(ToolVersions {
        pdfinfo: command_version("pdfinfo", &["-v"])?,
        pdftotext: command_version("pdftotext", &["-v"])?,
        pdftoppm: command_version_optional("pdftoppm", &["-v"]),
        tesseract: command_version_optional("tesseract", &["--version"]),
    })
}

fn command_version(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program, args.join(" ")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    let version_line = source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::PageRecord;

    fn args() -> ChunkArgs {
        ChunkArgs {
            pdf_path: PathBuf::from("input/kitab.pdf"),
            output_root: PathBuf::from("output"),
            max_words: 25_000,
            max_pages: 80,
            ocr_lang: "ara+eng".to_string(),
            min_text_chars: 40,
        }
    }

    fn sample_chunk() -> Chunk {
        Chunk {
            chunk_id: 2,
            start_page: 4,
            end_page: 5,
            word_count: 7,
            pages: vec![
                PageRecord {
                    page_number: 4,
                    text: "نص الصفحة الرابعة".to_string(),
                    source: PageSource::Text,
                },
                PageRecord {
                    page_number: 5,
                    text: "نص الصفحة الخامسة هنا".to_string(),
                    source: PageSource::Ocr,
                },
            ],
        }
    }

    #[test]
    fn validate_args_rejects_non_positive_limits() {
        let mut zero_words = args();
        zero_words.max_words = 0;
        assert!(matches!(
            validate_args(&zero_words),
            Err(ChunkerError::Configuration(_))
        ));

        let mut zero_pages = args();
        zero_pages.max_pages = 0;
        assert!(matches!(
            validate_args(&zero_pages),
            Err(ChunkerError::Configuration(_))
        ));

        let mut zero_threshold = args();
        zero_threshold.min_text_chars = 0;
        assert!(matches!(
            validate_args(&zero_threshold),
            Err(ChunkerError::Configuration(_))
        ));
    }

    #[test]
    fn validate_args_rejects_malformed_language_spec() {
        let mut bad_lang = args();
        bad_lang.ocr_lang = "ara++eng".to_string();
        assert!(matches!(
            validate_args(&bad_lang),
            Err(ChunkerError::Configuration(_))
        ));

        let mut empty_lang = args();
        empty_lang.ocr_lang = String::new();
        assert!(matches!(
            validate_args(&empty_lang),
            Err(ChunkerError::Configuration(_))
        ));
    }

    #[test]
    fn validate_args_accepts_single_and_joined_language_codes() {
        let mut single = args();
        single.ocr_lang = "ara".to_string();
        assert!(validate_args(&single).is_ok());

        let mut triple = args();
        triple.ocr_lang = "ara+eng+fra".to_string();
        assert!(validate_args(&triple).is_ok());
    }

    #[test]
    fn chunk_file_name_is_zero_padded() {
        assert_eq!(chunk_file_name(&sample_chunk()), "chunk_002_p004-p005.md");
    }

    #[test]
    fn rendered_markdown_carries_meta_instructions_and_page_tags() {
        let rendered = render_chunk_markdown(&sample_chunk());

        assert!(rendered.starts_with("### CHUNK_META\nCHUNK_ID: 002\nPAGES: 4-5\n"));
        assert!(rendered.contains("### INSTRUCTIONS_FOR_CHATGPT"));
        assert!(rendered.contains("Proofread the following Arabic text:"));
        assert!(rendered.contains("---- [Page 4] ----\nنص الصفحة الرابعة"));
        assert!(rendered.contains("---- [Page 5] ----\nنص الصفحة الخامسة هنا"));
    }

    #[test]
    fn render_chunk_command_includes_every_flag() {
        let command = render_chunk_command(&args());

        assert!(command.starts_with("proofchunk chunk input/kitab.pdf"));
        assert!(command.contains("--max-words 25000"));
        assert!(command.contains("--max-pages 80"));
        assert!(command.contains("--ocr-lang ara+eng"));
        assert!(command.contains("--min-text-chars 40"));
    }

    #[test]
    fn audit_log_lists_one_line_per_page() {
        let temp = tempfile::tempdir().expect("temp dir");
        let log_path = temp.path().join("page_sources.txt");
        let entries = vec![
            PageAuditEntry {
                page_number: 1,
                source: PageSource::Text,
            },
            PageAuditEntry {
                page_number: 2,
                source: PageSource::Ocr,
            },
        ];

        write_audit_log(&log_path, &entries).expect("log written");

        let contents = fs::read_to_string(&log_path).expect("log readable");
        let lines = contents.lines().collect::<Vec<&str>>();
        assert_eq!(lines[0], "Page Number | Source Type");
        assert!(lines[2].contains("1") && lines[2].ends_with("TEXT"));
        assert!(lines[3].contains("2") && lines[3].ends_with("OCR"));
    }
}
