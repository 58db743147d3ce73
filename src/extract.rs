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

//! Per-page text: the PDF text layer when it has something to say, OCR of a
//! rendered page otherwise. Flat images always go straight to OCR.

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::error::ScanError;
use crate::model::ExtractionMode;
use crate::model::PageText;
use crate::model::ScanRequest;
use crate::normalize::normalize_text;
use crate::scan::CancelToken;

/// Why a PDF could not be opened. Unreadable files are skipped; files that
/// read fine but do not parse still get OCR of their rendered pages.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0:#}")]
    Parse(anyhow::Error),
}

pub trait PdfReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, OpenError>;
}

pub trait PdfDocument {
    fn page_count(&self) -> u32;

    /// Raw text layer of a 1-based page.
    fn page_text(&self, page: u32) -> Result<String>;
}

pub trait Renderer: Send + Sync {
    /// Page count as seen by the rendering side, for PDFs the text reader
    /// could not parse.
    fn page_count(&self, pdf: &Path) -> Result<u32>;

    /// Rasterizes one 1-based page into `out_dir` and returns the image path.
    fn render_page(&self, pdf: &Path, page: u32, dpi: u32, out_dir: &Path) -> Result<PathBuf>;
}

pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &Path, lang: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct Toolchain {
    pub reader: Arc<dyn PdfReader>,
    pub renderer: Arc<dyn Renderer>,
    pub ocr: Arc<dyn OcrEngine>,
}

impl Toolchain {
    pub fn external(request: &ScanRequest) -> Self {
        Self {
            reader: Arc::new(LopdfReader),
            renderer: Arc::new(Pdftoppm::new(request.pdftoppm_cmd())),
            ocr: Arc::new(Tesseract::new(request.tesseract_cmd())),
        }
    }
}

pub struct LopdfReader;

struct LopdfDocument {
    doc: lopdf::Document,
    pages: u32,
}

impl PdfReader for LopdfReader {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, OpenError> {
        let bytes = std::fs::read(path)?;
        let doc = lopdf::Document::load_mem(&bytes)
            .with_context(|| format!("parse {}", path.display()))
            .map_err(OpenError::Parse)?;
        let pages = doc.get_pages().len() as u32;
        Ok(Box::new(LopdfDocument { doc, pages }))
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages
    }

    fn page_text(&self, page: u32) -> Result<String> {
        Ok(self.doc.extract_text(&[page])?)
    }
}

/// Renders with `pdftoppm` and counts pages with the `pdfinfo` installed
/// next to it.
pub struct Pdftoppm {
    cmd: PathBuf,
    info_cmd: PathBuf,
}

impl Pdftoppm {
    pub fn new(cmd: &Path) -> Self {
        let info_cmd = cmd
            .parent()
            .map(|dir| dir.join("pdfinfo"))
            .unwrap_or_else(|| PathBuf::from("pdfinfo"));
        Self {
            cmd: cmd.to_path_buf(),
            info_cmd,
        }
    }
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|value| value.trim().parse().ok())
}

impl Renderer for Pdftoppm {
    fn page_count(&self, pdf: &Path) -> Result<u32> {
        let output = Command::new(&self.info_cmd)
            .arg(pdf)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run {}", self.info_cmd.display()))?;
        check_status(&self.info_cmd, &output)?;
        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("{} reported no page count", self.info_cmd.display()))
    }

    fn render_page(&self, pdf: &Path, page: u32, dpi: u32, out_dir: &Path) -> Result<PathBuf> {
        let prefix = out_dir.join(format!("page-{page}"));
        let page_arg = page.to_string();
        let output = Command::new(&self.cmd)
            .args(["-f", &page_arg, "-l", &page_arg])
            .args(["-r", &dpi.to_string()])
            .args(["-png", "-singlefile"])
            .arg(pdf)
            .arg(&prefix)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run {}", self.cmd.display()))?;
        check_status(&self.cmd, &output)?;

        let image = prefix.with_extension("png");
        if !image.is_file() {
            anyhow::bail!("{} produced no image", self.cmd.display());
        }
        Ok(image)
    }
}

pub struct Tesseract {
    cmd: PathBuf,
}

impl Tesseract {
    pub fn new(cmd: &Path) -> Self {
        Self {
            cmd: cmd.to_path_buf(),
        }
    }
}

impl OcrEngine for Tesseract {
    fn recognize(&self, image: &Path, lang: &str) -> Result<String> {
        let output = Command::new(&self.cmd)
            .arg(image)
            .arg("stdout")
            .args(["-l", lang])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("run {}", self.cmd.display()))?;
        check_status(&self.cmd, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn check_status(cmd: &Path, output: &std::process::Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!(
        "{} exited with {}: {}",
        cmd.display(),
        output.status,
        stderr.trim()
    )
}

pub struct PageTextProvider<'a> {
    tools: &'a Toolchain,
    lang: &'a str,
    dpi: u32,
    cancel: &'a CancelToken,
}

impl<'a> PageTextProvider<'a> {
    pub fn new(tools: &'a Toolchain, request: &'a ScanRequest, cancel: &'a CancelToken) -> Self {
        Self {
            tools,
            lang: request.lang(),
            dpi: request.dpi(),
            cancel,
        }
    }

    /// Text of one PDF page. Failures are pushed to `issues`; the page then
    /// yields whatever the next step produced, possibly nothing. `None` means
    /// cancellation skipped the OCR fallback and the page was not scanned.
    pub fn pdf_page(
        &self,
        path: &Path,
        doc: &dyn PdfDocument,
        page: u32,
        issues: &mut Vec<ScanError>,
    ) -> Option<PageText> {
        match doc.page_text(page) {
            Ok(raw) => {
                let text = normalize_text(&raw);
                if !text.is_empty() {
                    debug!(path = %path.display(), page, "native text layer");
                    return Some(PageText {
                        text,
                        mode: ExtractionMode::Native,
                    });
                }
                debug!(path = %path.display(), page, "empty text layer, falling back to ocr");
            }
            Err(err) => issues.push(ScanError::Extraction {
                path: path.to_path_buf(),
                page: Some(page),
                message: format!("{err:#}"),
            }),
        }
        self.ocr_pdf_page(path, page, issues)
    }

    pub fn ocr_pdf_page(
        &self,
        path: &Path,
        page: u32,
        issues: &mut Vec<ScanError>,
    ) -> Option<PageText> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let render_err = |message: String| ScanError::Render {
            path: path.to_path_buf(),
            page,
            message,
        };

        let scratch = match tempfile::Builder::new().prefix("docscan-").tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                issues.push(render_err(format!("create scratch dir: {err}")));
                return Some(PageText::empty(ExtractionMode::Ocr));
            }
        };
        let image = match self
            .tools
            .renderer
            .render_page(path, page, self.dpi, scratch.path())
        {
            Ok(image) => image,
            Err(err) => {
                issues.push(render_err(format!("{err:#}")));
                return Some(PageText::empty(ExtractionMode::Ocr));
            }
        };
        Some(self.recognize(path, &image, Some(page), issues))
    }

    /// OCR text of a flat image, or `None` when cancellation came first.
    pub fn image(&self, path: &Path, issues: &mut Vec<ScanError>) -> Option<PageText> {
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(self.recognize(path, path, None, issues))
    }

    fn recognize(
        &self,
        source: &Path,
        image: &Path,
        page: Option<u32>,
        issues: &mut Vec<ScanError>,
    ) -> PageText {
        match self.tools.ocr.recognize(image, self.lang) {
            Ok(raw) => PageText {
                text: normalize_text(&raw),
                mode: ExtractionMode::Ocr,
            },
            Err(err) => {
                issues.push(ScanError::Ocr {
                    path: source.to_path_buf(),
                    page,
                    message: format!("{err:#}"),
                });
                PageText::empty(ExtractionMode::Ocr)
            }
        }
    }
}
