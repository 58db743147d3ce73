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

use unicode_normalization::UnicodeNormalization;

const ZWNJ: char = '\u{200c}';
const ZWJ: char = '\u{200d}';

/// Canonical form used for every comparison: joiners removed, NFC, trimmed.
/// Joiners go before composition, which keeps the output a fixed point.
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let composed: String = raw
        .chars()
        .filter(|c| *c != ZWNJ && *c != ZWJ)
        .nfc()
        .collect();
    composed.trim().to_string()
}

pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize_text).unwrap_or_default()
}
