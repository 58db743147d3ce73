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

pub const CONTEXT_SEPARATOR: &str = " | ";

pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// The line at `idx` plus one neighbour on each side, where they exist.
pub fn window(lines: &[&str], idx: usize) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let last = lines.len() - 1;
    let idx = idx.min(last);
    let low = idx.saturating_sub(1);
    let high = (idx + 1).min(last);
    lines[low..=high].join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_drops_blank_lines_and_trims() {
        let text = "  first  \n\n\t\nsecond\r\n   third";
        assert_eq!(split_lines(text), vec!["first", "second", "third"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn window_in_the_middle_has_three_lines() {
        let lines = ["a", "b", "c", "d"];
        assert_eq!(window(&lines, 1), "a | b | c");
        assert_eq!(window(&lines, 2), "b | c | d");
    }

    #[test]
    fn window_at_the_edges_has_two_lines() {
        let lines = ["a", "b", "c"];
        assert_eq!(window(&lines, 0), "a | b");
        assert_eq!(window(&lines, 2), "b | c");
    }

    #[test]
    fn window_of_single_line_is_the_line() {
        assert_eq!(window(&["only"], 0), "only");
        assert_eq!(window(&[], 0), "");
    }
}
