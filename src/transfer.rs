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

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;

use crate::model::MatchRecord;

/// Writes one JSON object per record, in result-set order.
pub fn export_records(records: &[MatchRecord], mut writer: impl Write) -> Result<usize> {
    for record in records {
        let line = serde_json::to_string(record)?;
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(records.len())
}

pub fn export_to_file(records: &[MatchRecord], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    export_records(records, std::io::BufWriter::new(file))
        .with_context(|| format!("write {}", path.display()))
}
