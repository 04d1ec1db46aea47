use tracing::{info, warn};

use crate::error::ChunkerError;
use crate::model::{PageAuditEntry, PageRecord, PageSource};
use crate::pdf::PageReader;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub ocr_lang: String,
    pub min_text_chars: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PageKind {
    Text,
    Scan,
}

// Threshold must stay above zero so pages carrying only a stray page number
// or watermark are still sent to OCR.
pub fn classify_text_layer(text: &str, min_text_chars: usize) -> PageKind {
    if non_whitespace_char_count(text) >= min_text_chars {
        PageKind::Text
    } else {
        PageKind::Scan
    }
}

pub fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

#[derive(Debug, Default)]
pub struct ProcessedDocument {
    pub records: Vec<PageRecord>,
    pub warnings: Vec<String>,
}

pub fn process_document<R: PageReader>(
    document: &R,
    options: &PipelineOptions,
    mut progress: impl FnMut(&PageRecord),
) -> Result<ProcessedDocument, ChunkerError> {
    let page_count = document.page_count();
    let mut processed = ProcessedDocument {
        records: Vec::with_capacity(page_count),
        warnings: Vec::new(),
    };

    for page_number in 1..=page_count {
        let record = match document.extract_text(page_number) {
            Ok(text) if classify_text_layer(&text, options.min_text_chars) == PageKind::Text => {
                PageRecord {
                    page_number,
                    text,
                    source: PageSource::Text,
                }
            }
            Ok(_) => {
                info!(
                    page = page_number,
                    total = page_count,
                    "text layer below threshold, running OCR"
                );
                let text = document.ocr_page(page_number, &options.ocr_lang)?;
                PageRecord {
                    page_number,
                    text,
                    source: PageSource::Ocr,
                }
            }
            Err(ChunkerError::Extraction { page, reason }) => {
                warn!(page, reason = %reason, "text layer unreadable, falling back to OCR");
                processed.warnings.push(format!(
                    "page {page}: text layer unreadable ({reason}), used OCR fallback"
                ));
                let text = document.ocr_page(page_number, &options.ocr_lang)?;
                PageRecord {
                    page_number,
                    text,
                    source: PageSource::Ocr,
                }
            }
            Err(error) => return Err(error),
        };

        progress(&record);
        processed.records.push(record);
    }

    Ok(processed)
}

pub fn audit_entries(records: &[PageRecord]) -> Vec<PageAuditEntry> {
    records
        .iter()
        .map(|record| PageAuditEntry {
            page_number: record.page_number,
            source: record.source,
        })
        .collect()
}
