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

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::model::FileKind;
use crate::model::ScannableFile;

#[derive(Debug, Clone)]
pub struct FileEnumerator {
    root: PathBuf,
    ignore: GlobSet,
}

impl FileEnumerator {
    pub fn new(root: &Path, ignore: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            root: root.to_path_buf(),
            ignore: build_ignore_set(ignore)?,
        })
    }

    /// Walks the tree in file-name order within each directory, so the
    /// sequence is sorted by path. Each call starts a fresh walk.
    pub fn iter(&self) -> impl Iterator<Item = Result<ScannableFile, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let path = entry.path();
                    if !self.ignore.is_empty() && self.ignore.is_match(path) {
                        return None;
                    }
                    classify(path).map(|kind| {
                        Ok(ScannableFile {
                            path: path.to_path_buf(),
                            kind,
                        })
                    })
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    Some(Err(ScanError::file_access(&path, err)))
                }
            })
    }
}

pub fn classify(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "pdf" => Some(FileKind::Pdf),
        "png" | "jpg" | "jpeg" => Some(FileKind::Image),
        _ => None,
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .map_err(|err| ScanError::InvalidRequest(format!("ignore glob {pat:?}: {err}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| ScanError::InvalidRequest(format!("ignore globs: {err}")))
}
