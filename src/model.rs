use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSource {
    Text,
    Ocr,
}

impl PageSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Ocr => "OCR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: usize,
    pub text: String,
    pub source: PageSource,
}

impl PageRecord {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone)]
pub struct ChunkLimits {
    pub max_words: usize,
    pub max_pages: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub chunk_id: usize,
    pub start_page: usize,
    pub end_page: usize,
    pub word_count: usize,
    pub pages: Vec<PageRecord>,
}

impl Chunk {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageAuditEntry {
    pub page_number: usize,
    pub source: PageSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdfinfo: String,
    pub pdftotext: String,
    pub pdftoppm: Option<String>,
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPaths {
    pub source_pdf: String,
    pub output_root: String,
    pub chunks_dir: String,
    pub logs_dir: String,
    pub manifest_dir: String,
    pub audit_log_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCounts {
    pub total_pages: usize,
    pub text_pages: usize,
    pub ocr_pages: usize,
    pub total_words: usize,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_id: usize,
    pub start_page: usize,
    pub end_page: usize,
    pub page_count: usize,
    pub word_count: usize,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub source_sha256: String,
    pub tool_versions: ToolVersions,
    pub paths: RunPaths,
    pub counts: RunCounts,
    pub chunks: Vec<ChunkSummary>,
    pub page_sources: Vec<PageAuditEntry>,
    pub warnings: Vec<String>,
}
