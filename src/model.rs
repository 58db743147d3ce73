// Copyright 2026 Docscan Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared domain types used across enumeration, extraction, and the scan loop.

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ScanError;
use crate::normalize::normalize_text;

pub const DEFAULT_OCR_LANG: &str = "guj+eng";
pub const DEFAULT_DPI: u32 = 250;
pub const DEFAULT_THRESHOLD: u8 = 70;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    root: PathBuf,
    terms: Vec<String>,
    threshold: u8,
    lang: String,
    dpi: u32,
    tesseract_cmd: PathBuf,
    pdftoppm_cmd: PathBuf,
    ignore: Vec<String>,
    jobs: usize,
}

/// Everything `ScanRequest::new` needs. Plain data so the CLI and tests can
/// fill it field by field before validation.
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub root: PathBuf,
    pub terms: Vec<String>,
    pub threshold: i64,
    pub lang: String,
    pub dpi: u32,
    pub tesseract_cmd: PathBuf,
    pub pdftoppm_cmd: PathBuf,
    pub ignore: Vec<String>,
    pub jobs: usize,
}

impl ScanParams {
    pub fn new(root: impl Into<PathBuf>, terms: Vec<String>) -> Self {
        Self {
            root: root.into(),
            terms,
            threshold: DEFAULT_THRESHOLD as i64,
            lang: DEFAULT_OCR_LANG.to_string(),
            dpi: DEFAULT_DPI,
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            ignore: Vec::new(),
            jobs: 1,
        }
    }
}

impl ScanRequest {
    pub fn new(params: ScanParams) -> Result<Self, ScanError> {
        validate_root(&params.root)?;
        let terms = distinct_terms(params.terms);
        if terms.is_empty() {
            return Err(ScanError::InvalidRequest(
                "at least one non-empty search term is required".into(),
            ));
        }
        if params.lang.trim().is_empty() {
            return Err(ScanError::InvalidRequest("ocr language is empty".into()));
        }
        Ok(Self {
            root: params.root,
            terms,
            threshold: clamp_threshold(params.threshold),
            lang: params.lang.trim().to_string(),
            dpi: if params.dpi == 0 { DEFAULT_DPI } else { params.dpi },
            tesseract_cmd: params.tesseract_cmd,
            pdftoppm_cmd: params.pdftoppm_cmd,
            ignore: params.ignore,
            jobs: params.jobs.max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn tesseract_cmd(&self) -> &Path {
        &self.tesseract_cmd
    }

    pub fn pdftoppm_cmd(&self) -> &Path {
        &self.pdftoppm_cmd
    }

    pub fn ignore(&self) -> &[String] {
        &self.ignore
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }
}

pub(crate) fn validate_root(root: &Path) -> Result<(), ScanError> {
    if root.as_os_str().is_empty() {
        return Err(ScanError::InvalidRequest("root directory is missing".into()));
    }
    if !root.is_dir() {
        return Err(ScanError::InvalidRequest(format!(
            "root {} is not a directory",
            root.display()
        )));
    }
    std::fs::read_dir(root).map_err(|err| {
        ScanError::InvalidRequest(format!("root {} is not readable: {err}", root.display()))
    })?;
    Ok(())
}

/// Out-of-range thresholds are clamped: anything below zero behaves like 0
/// (every line passes), anything above 100 behaves like 100.
pub fn clamp_threshold(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn distinct_terms(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for term in raw {
        let trimmed = term.trim();
        let key = normalize_text(trimmed).to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannableFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

impl ScannableFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    Native,
    Ocr,
}

impl ExtractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Ocr => "ocr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub mode: ExtractionMode,
}

impl PageText {
    pub fn empty(mode: ExtractionMode) -> Self {
        Self {
            text: String::new(),
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub file: String,
    pub page: Option<u32>,
    pub term: String,
    pub line: String,
    pub context: String,
    pub mode: ExtractionMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanIssue {
    pub path: String,
    pub page: Option<u32>,
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ScanError> for ScanIssue {
    fn from(err: &ScanError) -> Self {
        Self {
            path: err
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            page: err.page(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Completed,
    Cancelled,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub files_total: usize,
    pub files_scanned: usize,
    pub files_failed: usize,
    pub pages_scanned: usize,
    pub pages_native: usize,
    pub pages_ocr: usize,
    pub pages_empty: usize,
    pub matches: usize,
    pub issues: usize,
    pub took_ms: i64,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub records: Vec<MatchRecord>,
    pub issues: Vec<ScanIssue>,
    pub stats: ScanStats,
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn terms_are_trimmed_and_deduplicated_case_insensitively() {
        let dir = tempdir().expect("tempdir");
        let params = ScanParams::new(
            dir.path(),
            vec![
                " World ".into(),
                "world".into(),
                "".into(),
                "\u{200d}".into(),
                "test".into(),
            ],
        );
        let req = ScanRequest::new(params).expect("request");
        assert_eq!(req.terms(), ["World".to_string(), "test".to_string()]);
    }

    #[test]
    fn request_rejects_missing_root_and_empty_terms() {
        let err = ScanRequest::new(ScanParams::new("/definitely/not/here", vec!["a".into()]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let dir = tempdir().expect("tempdir");
        let err = ScanRequest::new(ScanParams::new(dir.path(), vec!["  ".into()])).unwrap_err();
        assert!(err.to_string().contains("search term"));
    }

    #[test]
    fn request_clamps_threshold_and_fixes_zero_values() {
        let dir = tempdir().expect("tempdir");
        let mut params = ScanParams::new(dir.path(), vec!["a".into()]);
        params.threshold = 250;
        params.dpi = 0;
        params.jobs = 0;
        let req = ScanRequest::new(params).expect("request");
        assert_eq!(req.threshold(), 100);
        assert_eq!(req.dpi(), DEFAULT_DPI);
        assert_eq!(req.jobs(), 1);
        assert_eq!(clamp_threshold(-5), 0);
    }

    #[test]
    fn record_serializes_in_export_field_order() {
        let record = MatchRecord {
            file: "a.pdf".into(),
            page: Some(1),
            term: "world".into(),
            line: "hello world".into(),
            context: "hello world".into(),
            mode: ExtractionMode::Native,
        };
        let text = serde_json::to_string(&record).expect("json");
        assert_eq!(
            text,
            r#"{"file":"a.pdf","page":1,"term":"world","line":"hello world","context":"hello world","mode":"native"}"#
        );
    }
}
