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

use crate::model::clamp_threshold;
use crate::normalize::normalize_text;

/// Normalized, lowercased form that both sides of a comparison go through.
pub fn fold(text: &str) -> String {
    normalize_text(text).to_lowercase()
}

/// True when `term` is a substring of `line`, or when the best partial
/// alignment of the two scores at least `threshold` (clamped to 0..=100).
pub fn matches(line: &str, term: &str, threshold: i64) -> bool {
    matches_folded(&fold(line), &fold(term), clamp_threshold(threshold))
}

/// Same as [`matches`] for inputs that already went through [`fold`].
pub fn matches_folded(line: &str, term: &str, threshold: u8) -> bool {
    if line.contains(term) {
        return true;
    }
    partial_ratio(term, line) >= f64::from(threshold)
}

/// Best indel similarity (0..=100) between the shorter string and any
/// same-length window of the longer one. Windows may hang over either end of
/// the longer string, in which case they are cut short.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if short.is_empty() {
        return 0.0;
    }

    let m = short.len() as isize;
    let n = long.len() as isize;
    let mut best = 0.0f64;
    for start in (1 - m)..n {
        let lo = start.max(0) as usize;
        let hi = (start + m).min(n) as usize;
        let score = ratio(short, &long[lo..hi]);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
