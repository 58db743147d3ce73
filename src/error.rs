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

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("cannot open {}: {message}", .path.display())]
    FileAccess { path: PathBuf, message: String },

    /// `page` is `None` when the whole document failed to parse.
    #[error("native extraction failed for {}{}: {message}", .path.display(), page_suffix(.page))]
    Extraction {
        path: PathBuf,
        page: Option<u32>,
        message: String,
    },

    #[error("render failed for {} page {page}: {message}", .path.display())]
    Render {
        path: PathBuf,
        page: u32,
        message: String,
    },

    #[error("ocr failed for {}{}: {message}", .path.display(), page_suffix(.page))]
    Ocr {
        path: PathBuf,
        page: Option<u32>,
        message: String,
    },
}

fn page_suffix(page: &Option<u32>) -> String {
    page.map(|p| format!(" page {p}")).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    FileAccess,
    Extraction,
    Render,
    Ocr,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::FileAccess => "file_access",
            Self::Extraction => "extraction",
            Self::Render => "render",
            Self::Ocr => "ocr",
        }
    }
}

impl ScanError {
    pub fn file_access(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::FileAccess {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::FileAccess { .. } => ErrorKind::FileAccess,
            Self::Extraction { .. } => ErrorKind::Extraction,
            Self::Render { .. } => ErrorKind::Render,
            Self::Ocr { .. } => ErrorKind::Ocr,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::FileAccess { path, .. }
            | Self::Extraction { path, .. }
            | Self::Render { path, .. }
            | Self::Ocr { path, .. } => Some(path),
        }
    }

    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Render { page, .. } => Some(*page),
            Self::Extraction { page, .. } | Self::Ocr { page, .. } => *page,
            _ => None,
        }
    }

    /// Everything except a malformed request is a per-file or per-page failure
    /// that the scan records and moves past.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_request_is_fatal() {
        let fatal = ScanError::InvalidRequest("no terms".into());
        assert!(!fatal.is_recoverable());
        assert_eq!(fatal.path(), None);

        let render = ScanError::Render {
            path: PathBuf::from("/tmp/a.pdf"),
            page: 3,
            message: "exit status 1".into(),
        };
        assert!(render.is_recoverable());
        assert_eq!(render.kind(), ErrorKind::Render);
        assert_eq!(render.page(), Some(3));
        assert_eq!(render.path(), Some(Path::new("/tmp/a.pdf")));
    }

    #[test]
    fn display_includes_path_and_page() {
        let err = ScanError::Extraction {
            path: PathBuf::from("docs/b.pdf"),
            page: Some(2),
            message: "bad stream".into(),
        };
        assert_eq!(
            err.to_string(),
            "native extraction failed for docs/b.pdf page 2: bad stream"
        );

        let whole = ScanError::Extraction {
            path: PathBuf::from("docs/b.pdf"),
            page: None,
            message: "invalid xref".into(),
        };
        assert_eq!(
            whole.to_string(),
            "native extraction failed for docs/b.pdf: invalid xref"
        );
    }

    #[test]
    fn ocr_display_names_the_page_when_known() {
        let page = ScanError::Ocr {
            path: PathBuf::from("docs/c.pdf"),
            page: Some(4),
            message: "tesseract exited with 1".into(),
        };
        assert_eq!(
            page.to_string(),
            "ocr failed for docs/c.pdf page 4: tesseract exited with 1"
        );

        let image = ScanError::Ocr {
            path: PathBuf::from("scan.png"),
            page: None,
            message: "tesseract exited with 1".into(),
        };
        assert_eq!(
            image.to_string(),
            "ocr failed for scan.png: tesseract exited with 1"
        );
    }
}
