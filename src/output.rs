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

use anyhow::Result;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::MatchRecord;
use crate::model::ScanIssue;
use crate::model::ScanReport;
use crate::model::ScanRequest;
use crate::model::ScanStats;
use crate::model::ScanStatus;

pub const SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct StatsOut {
    pub status: ScanStatus,
    pub started_at: String,
    #[serde(flatten)]
    pub scan: ScanStats,
}

impl StatsOut {
    pub fn new(report: &ScanReport, started_at: OffsetDateTime) -> Self {
        Self {
            status: report.status,
            started_at: format_timestamp(started_at),
            scan: report.stats.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOut {
    pub root: String,
    pub terms: Vec<String>,
    pub threshold: u8,
    pub lang: String,
    pub dpi: u32,
}

impl From<&ScanRequest> for QueryOut {
    fn from(request: &ScanRequest) -> Self {
        Self {
            root: request.root().display().to_string(),
            terms: request.terms().to_vec(),
            threshold: request.threshold(),
            lang: request.lang().to_string(),
            dpi: request.dpi(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorOut {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct JsonResponse {
    pub ok: bool,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<MatchRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<ScanIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOut>,
}

impl JsonResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            schema_version: SCHEMA_VERSION.to_string(),
            ..Default::default()
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            schema_version: SCHEMA_VERSION.to_string(),
            error: Some(ErrorOut {
                code: code.to_string(),
                message: message.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, request: &ScanRequest) -> Self {
        self.query = Some(QueryOut::from(request));
        self
    }

    /// Records, issues and stats of a finished scan.
    pub fn with_report(mut self, report: ScanReport, started_at: OffsetDateTime) -> Self {
        self.stats = Some(StatsOut::new(&report, started_at));
        self.results = Some(report.records);
        self.issues = Some(report.issues);
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn print_json(resp: &JsonResponse) -> Result<()> {
    let text = serde_json::to_string_pretty(resp)?;
    println!("{text}");
    Ok(())
}

/// `file  page  term  mode  line  context`, tab separated; images show `-`
/// for the page.
pub fn plain_line(record: &MatchRecord) -> String {
    let page = record
        .page
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        record.file,
        page,
        record.term,
        record.mode.as_str(),
        record.line,
        record.context
    )
}

pub fn summary_line(report: &ScanReport) -> String {
    format!(
        "{}: {} matches in {} files ({} failed, {} errors)",
        report.status,
        report.stats.matches,
        report.stats.files_scanned,
        report.stats.files_failed,
        report.stats.issues
    )
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::model::ExtractionMode;

    fn record(page: Option<u32>) -> MatchRecord {
        MatchRecord {
            file: "a.pdf".to_string(),
            page,
            term: "invoice".to_string(),
            line: "Invoice 42".to_string(),
            context: "Header | Invoice 42".to_string(),
            mode: ExtractionMode::Native,
        }
    }

    fn report() -> ScanReport {
        ScanReport {
            status: ScanStatus::Completed,
            records: vec![record(Some(1))],
            issues: Vec::new(),
            stats: ScanStats {
                files_total: 2,
                files_scanned: 2,
                files_failed: 1,
                matches: 1,
                issues: 3,
                ..ScanStats::default()
            },
        }
    }

    #[test]
    fn plain_lines_use_dash_for_images() {
        assert_eq!(
            plain_line(&record(Some(3))),
            "a.pdf\t3\tinvoice\tnative\tInvoice 42\tHeader | Invoice 42"
        );
        assert!(plain_line(&record(None)).starts_with("a.pdf\t-\t"));
    }

    #[test]
    fn summary_reports_matches_failures_and_errors() {
        assert_eq!(
            summary_line(&report()),
            "completed: 1 matches in 2 files (1 failed, 3 errors)"
        );
    }

    #[test]
    fn stats_are_flattened_next_to_status() {
        let resp = JsonResponse::ok().with_report(report(), datetime!(2026-01-02 03:04:05 UTC));
        let value = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(value["stats"]["status"], "completed");
        assert_eq!(value["stats"]["started_at"], "2026-01-02T03:04:05Z");
        assert_eq!(value["stats"]["files_failed"], 1);
        assert_eq!(value["results"][0]["mode"], "native");
        assert_eq!(value["issues"], serde_json::json!([]));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn error_response_has_code_and_message() {
        let value = serde_json::to_value(JsonResponse::error("invalid_request", "no terms"))
            .expect("serialize");
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["code"], "invalid_request");
        assert!(value.get("results").is_none());
    }
}
