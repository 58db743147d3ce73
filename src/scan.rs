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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::context::split_lines;
use crate::context::window;
use crate::enumerate::FileEnumerator;
use crate::error::ScanError;
use crate::extract::OpenError;
use crate::extract::PageTextProvider;
use crate::extract::PdfDocument;
use crate::extract::Toolchain;
use crate::fuzzy::fold;
use crate::fuzzy::matches_folded;
use crate::model::ExtractionMode;
use crate::model::FileKind;
use crate::model::MatchRecord;
use crate::model::PageText;
use crate::model::ScanIssue;
use crate::model::ScanReport;
use crate::model::ScanRequest;
use crate::model::ScanStats;
use crate::model::ScanStatus;
use crate::model::ScannableFile;
use crate::model::validate_root;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
    pub file: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub enum ScanEvent {
    Progress(Progress),
    Match(MatchRecord),
    Issue(ScanIssue),
}

struct Term {
    original: String,
    folded: String,
}

/// A PDF ready for page-by-page scanning.
enum OpenedPdf {
    Parsed(Box<dyn PdfDocument>),
    /// The text layer is unusable; every page goes through OCR.
    OcrOnly(u32),
}

#[derive(Default)]
struct FileOutcome {
    records: Vec<MatchRecord>,
    issues: Vec<ScanError>,
    pages: usize,
    native: usize,
    ocr: usize,
    empty: usize,
    complete: bool,
}

impl FileOutcome {
    fn add_page(
        &mut self,
        file: &str,
        page: Option<u32>,
        text: &PageText,
        terms: &[Term],
        threshold: u8,
    ) {
        self.pages += 1;
        match text.mode {
            ExtractionMode::Native => self.native += 1,
            ExtractionMode::Ocr => self.ocr += 1,
        }
        if text.is_empty() {
            self.empty += 1;
            return;
        }
        self.records
            .extend(match_page(file, page, text, terms, threshold));
    }
}

/// Every (line, term) hit on one page, in line order then term order.
fn match_page(
    file: &str,
    page: Option<u32>,
    text: &PageText,
    terms: &[Term],
    threshold: u8,
) -> Vec<MatchRecord> {
    let lines = split_lines(&text.text);
    let mut records = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let folded = fold(line);
        for term in terms {
            if !matches_folded(&folded, &term.folded, threshold) {
                continue;
            }
            records.push(MatchRecord {
                file: file.to_string(),
                page,
                term: term.original.clone(),
                line: line.to_string(),
                context: window(&lines, idx),
                mode: text.mode,
            });
        }
    }
    records
}

/// Single owner of the result set. Outcomes arrive here in file order and
/// are turned into events for the consumer.
struct Aggregator<'a, F: FnMut(ScanEvent)> {
    on_event: &'a mut F,
    records: Vec<MatchRecord>,
    issues: Vec<ScanIssue>,
    stats: ScanStats,
}

impl<'a, F: FnMut(ScanEvent)> Aggregator<'a, F> {
    fn new(on_event: &'a mut F) -> Self {
        Self {
            on_event,
            records: Vec::new(),
            issues: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    fn issue(&mut self, err: ScanError) {
        warn!("{err}");
        let issue = ScanIssue::from(&err);
        (self.on_event)(ScanEvent::Issue(issue.clone()));
        self.issues.push(issue);
    }

    fn absorb(&mut self, index: usize, file: &ScannableFile, outcome: FileOutcome) {
        if !outcome.issues.is_empty() {
            self.stats.files_failed += 1;
        }
        for err in outcome.issues {
            self.issue(err);
        }
        for record in outcome.records {
            (self.on_event)(ScanEvent::Match(record.clone()));
            self.records.push(record);
        }
        self.stats.pages_scanned += outcome.pages;
        self.stats.pages_native += outcome.native;
        self.stats.pages_ocr += outcome.ocr;
        self.stats.pages_empty += outcome.empty;

        if outcome.complete {
            self.stats.files_scanned += 1;
            let total = self.stats.files_total;
            let name = file.file_name();
            (self.on_event)(ScanEvent::Progress(Progress {
                index,
                total,
                status: format!("Scanning: {name} ({index}/{total})"),
                file: name,
            }));
        }
    }
}

pub struct Scanner {
    request: ScanRequest,
    tools: Toolchain,
}

impl Scanner {
    pub fn new(request: ScanRequest, tools: Toolchain) -> Self {
        Self { request, tools }
    }

    /// Runs the whole scan on the calling thread. Only a malformed request is
    /// an error; per-file and per-page failures end up in the report.
    pub fn run<F: FnMut(ScanEvent)>(
        &self,
        cancel: &CancelToken,
        mut on_event: F,
    ) -> Result<ScanReport, ScanError> {
        validate_root(self.request.root())?;
        let enumerator = FileEnumerator::new(self.request.root(), self.request.ignore())?;
        let started = Instant::now();
        info!(
            root = %self.request.root().display(),
            terms = self.request.terms().len(),
            threshold = self.request.threshold(),
            jobs = self.request.jobs(),
            "scan started"
        );

        let terms: Vec<Term> = self
            .request
            .terms()
            .iter()
            .map(|t| Term {
                original: t.clone(),
                folded: fold(t),
            })
            .collect();

        let mut agg = Aggregator::new(&mut on_event);
        let mut files = Vec::new();
        for item in enumerator.iter() {
            match item {
                Ok(file) => files.push(file),
                Err(err) => agg.issue(err),
            }
        }
        agg.stats.files_total = files.len();

        if self.request.jobs() > 1 && files.len() > 1 {
            self.run_parallel(&files, &terms, cancel, &mut agg);
        } else {
            self.run_sequential(&files, &terms, cancel, &mut agg);
        }

        let status = if agg.stats.files_scanned < files.len() && cancel.is_cancelled() {
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };
        let mut stats = agg.stats;
        stats.matches = agg.records.len();
        stats.issues = agg.issues.len();
        stats.took_ms = started.elapsed().as_millis() as i64;
        info!(
            %status,
            matches = stats.matches,
            issues = stats.issues,
            files = stats.files_scanned,
            "scan finished"
        );

        Ok(ScanReport {
            status,
            records: agg.records,
            issues: agg.issues,
            stats,
        })
    }

    fn run_sequential<F: FnMut(ScanEvent)>(
        &self,
        files: &[ScannableFile],
        terms: &[Term],
        cancel: &CancelToken,
        agg: &mut Aggregator<'_, F>,
    ) {
        for (idx, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = self.scan_file(file, terms, cancel);
            let complete = outcome.complete;
            agg.absorb(idx + 1, file, outcome);
            if !complete {
                break;
            }
        }
    }

    /// Workers pull file indices from a shared cursor; the calling thread
    /// re-orders their outcomes so records come out in enumeration order.
    fn run_parallel<F: FnMut(ScanEvent)>(
        &self,
        files: &[ScannableFile],
        terms: &[Term],
        cancel: &CancelToken,
        agg: &mut Aggregator<'_, F>,
    ) {
        let workers = self.request.jobs().min(files.len());
        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, FileOutcome)>();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let cursor = &cursor;
                scope.spawn(move || {
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let idx = cursor.fetch_add(1, Ordering::SeqCst);
                        let Some(file) = files.get(idx) else {
                            break;
                        };
                        let outcome = self.scan_file(file, terms, cancel);
                        if tx.send((idx, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            let mut pending: BTreeMap<usize, FileOutcome> = BTreeMap::new();
            let mut next = 0usize;
            for (idx, outcome) in rx {
                pending.insert(idx, outcome);
                while let Some(outcome) = pending.remove(&next) {
                    agg.absorb(next + 1, &files[next], outcome);
                    next += 1;
                }
            }
            // Only reachable after cancellation left a gap in the sequence.
            for (idx, outcome) in pending {
                agg.absorb(idx + 1, &files[idx], outcome);
            }
        });
    }

    fn scan_file(&self, file: &ScannableFile, terms: &[Term], cancel: &CancelToken) -> FileOutcome {
        let provider = PageTextProvider::new(&self.tools, &self.request, cancel);
        let threshold = self.request.threshold();
        let name = file.file_name();
        let mut outcome = FileOutcome::default();
        debug!(path = %file.path.display(), kind = ?file.kind, "scanning file");

        // A unit skipped by cancellation leaves the outcome incomplete.
        match file.kind {
            FileKind::Image => {
                let Some(text) = provider.image(&file.path, &mut outcome.issues) else {
                    return outcome;
                };
                outcome.add_page(&name, None, &text, terms, threshold);
            }
            FileKind::Pdf => {
                let Some(pdf) = self.open_pdf(file, &mut outcome.issues) else {
                    outcome.complete = true;
                    return outcome;
                };
                let pages = match &pdf {
                    OpenedPdf::Parsed(doc) => doc.page_count(),
                    OpenedPdf::OcrOnly(pages) => *pages,
                };
                for page in 1..=pages {
                    if cancel.is_cancelled() {
                        return outcome;
                    }
                    let text = match &pdf {
                        OpenedPdf::Parsed(doc) => {
                            provider.pdf_page(&file.path, doc.as_ref(), page, &mut outcome.issues)
                        }
                        OpenedPdf::OcrOnly(_) => {
                            provider.ocr_pdf_page(&file.path, page, &mut outcome.issues)
                        }
                    };
                    let Some(text) = text else {
                        return outcome;
                    };
                    outcome.add_page(&name, Some(page), &text, terms, threshold);
                }
            }
        }
        outcome.complete = true;
        outcome
    }

    /// `None` when the file has to be skipped: it cannot be read, or it does
    /// not parse and the renderer cannot count its pages either.
    fn open_pdf(&self, file: &ScannableFile, issues: &mut Vec<ScanError>) -> Option<OpenedPdf> {
        let parse_err = match self.tools.reader.open(&file.path) {
            Ok(doc) => return Some(OpenedPdf::Parsed(doc)),
            Err(OpenError::Io(err)) => {
                issues.push(ScanError::file_access(&file.path, err));
                return None;
            }
            Err(OpenError::Parse(err)) => err,
        };
        match self.tools.renderer.page_count(&file.path) {
            Ok(pages) => {
                debug!(path = %file.path.display(), pages, "unparseable pdf, using ocr for every page");
                issues.push(ScanError::Extraction {
                    path: file.path.clone(),
                    page: None,
                    message: format!("{parse_err:#}"),
                });
                Some(OpenedPdf::OcrOnly(pages))
            }
            Err(count_err) => {
                issues.push(ScanError::file_access(
                    &file.path,
                    format!("{parse_err:#}; page count unavailable: {count_err:#}"),
                ));
                None
            }
        }
    }
}

/// A scan running on its own thread. Events stream through `events`; the
/// final report comes from [`ScanHandle::join`].
pub struct ScanHandle {
    pub events: mpsc::Receiver<ScanEvent>,
    worker: JoinHandle<Result<ScanReport, ScanError>>,
}

impl ScanHandle {
    pub fn join(self) -> anyhow::Result<ScanReport> {
        match self.worker.join() {
            Ok(result) => Ok(result?),
            Err(_) => anyhow::bail!("scan worker panicked"),
        }
    }
}

/// Starts a scan on a worker thread. `cancel` may already be set, in which
/// case the scan ends immediately with a cancelled report.
pub fn spawn(
    request: ScanRequest,
    tools: Toolchain,
    cancel: CancelToken,
) -> std::io::Result<ScanHandle> {
    let (tx, rx) = mpsc::channel();
    let worker = std::thread::Builder::new()
        .name("docscan-worker".to_string())
        .spawn(move || {
            let scanner = Scanner::new(request, tools);
            scanner.run(&cancel, |event| {
                // A consumer that hung up only loses the live feed; the
                // report is still returned through join.
                let _ = tx.send(event);
            })
        })?;
    Ok(ScanHandle { events: rx, worker })
}
