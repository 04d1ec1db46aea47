use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;

use crate::error::ChunkerError;

const OCR_RENDER_DPI: u32 = 300;

pub trait PageReader {
    fn page_count(&self) -> usize;
    fn extract_text(&self, page_number: usize) -> Result<String, ChunkerError>;
    fn ocr_page(&self, page_number: usize, lang_spec: &str) -> Result<String, ChunkerError>;
}

pub struct PopplerDocument {
    pdf_path: PathBuf,
    page_count: usize,
}

impl PopplerDocument {
    pub fn open(pdf_path: &Path) -> Result<Self, ChunkerError> {
        if !pdf_path.exists() {
            return Err(open_error(pdf_path, "file not found"));
        }
        if !pdf_path.is_file() {
            return Err(open_error(pdf_path, "path is not a file"));
        }

        let output = Command::new("pdfinfo")
            .arg(pdf_path)
            .output()
            .map_err(|error| {
                open_error(pdf_path, &format!("failed to execute pdfinfo: {error}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(open_error(
                pdf_path,
                &format!(
                    "pdfinfo returned non-zero exit status: {}",
                    stderr.trim()
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let page_count = stdout
            .lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .ok_or_else(|| open_error(pdf_path, "pdfinfo output did not include a page count"))?;

        Ok(Self {
            pdf_path: pdf_path.to_path_buf(),
            page_count,
        })
    }
}

impl PageReader for PopplerDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn extract_text(&self, page_number: usize) -> Result<String, ChunkerError> {
        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(&self.pdf_path)
            .arg("-")
            .output()
            .map_err(|error| ChunkerError::Extraction {
                page: page_number,
                reason: format!("failed to execute pdftotext: {error}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChunkerError::Extraction {
                page: page_number,
                reason: format!(
                    "pdftotext returned non-zero exit status: {}",
                    stderr.trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .replace('\u{0000}', "")
            .trim_end_matches('\u{000C}')
            .trim()
            .to_string())
    }

    fn ocr_page(&self, page_number: usize, lang_spec: &str) -> Result<String, ChunkerError> {
        let pdf_stem = self
            .pdf_path
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("pdf");
        let safe_stem = pdf_stem
            .chars()
            .map(|character| {
                if character.is_ascii_alphanumeric() {
                    character
                } else {
                    '_'
                }
            })
            .collect::<String>();

        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let output_root = std::env::temp_dir().join(format!(
            "proofchunk_ocr_{}_{}_{}_{}",
            safe_stem,
            std::process::id(),
            page_number,
            stamp
        ));
        let png_path = PathBuf::from(format!("{}.png", output_root.display()));

        let pdftoppm_output = Command::new("pdftoppm")
            .arg("-r")
            .arg(OCR_RENDER_DPI.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg("-singlefile")
            .arg("-png")
            .arg(&self.pdf_path)
            .arg(&output_root)
            .output()
            .map_err(|error| ocr_error(page_number, format!("failed to execute pdftoppm: {error}")))?;

        if !pdftoppm_output.status.success() {
            let stderr = String::from_utf8_lossy(&pdftoppm_output.stderr);
            return Err(ocr_error(
                page_number,
                format!(
                    "pdftoppm returned non-zero exit status: {}",
                    stderr.trim()
                ),
            ));
        }

        if !png_path.exists() {
            return Err(ocr_error(
                page_number,
                "pdftoppm did not produce the expected image".to_string(),
            ));
        }

        let tesseract_output = Command::new("tesseract")
            .arg(&png_path)
            .arg("stdout")
            .arg("-l")
            .arg(lang_spec)
            .output();

        let _ = fs::remove_file(&png_path);

        let tesseract_output = tesseract_output.map_err(|error| {
            ocr_error(page_number, format!("failed to execute tesseract: {error}"))
        })?;

        if !tesseract_output.status.success() {
            let stderr = String::from_utf8_lossy(&tesseract_output.stderr);
            return Err(ocr_error(
                page_number,
                format!(
                    "tesseract returned non-zero exit status: {}",
                    stderr.trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&tesseract_output.stdout)
            .replace('\u{0000}', "")
            .trim()
            .to_string())
    }
}

fn open_error(path: &Path, reason: &str) -> ChunkerError {
    ChunkerError::DocumentOpen {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn ocr_error(page: usize, reason: String) -> ChunkerError {
    ChunkerError::OcrEngine { page, reason }
}
