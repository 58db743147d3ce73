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

use std::path::PathBuf;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Fuzzy keyword search across PDFs and scanned images"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file to use instead of the global one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory tree for search terms
    Scan(ScanArgs),

    /// Show the effective configuration
    Config {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan
    pub root: PathBuf,

    /// Search terms; each may be a comma-separated list
    pub terms: Vec<String>,

    /// Additional search term (repeatable)
    #[arg(long = "term")]
    pub term: Vec<String>,

    /// Fuzzy match threshold, 0-100
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// OCR language code, e.g. guj+eng
    #[arg(long)]
    pub lang: Option<String>,

    /// Resolution for rendering PDF pages before OCR
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Path to the tesseract executable
    #[arg(long)]
    pub tesseract: Option<PathBuf>,

    /// Path to the pdftoppm executable
    #[arg(long)]
    pub pdftoppm: Option<PathBuf>,

    /// Ignore globs
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Number of files scanned concurrently
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Cancel the scan after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write matches as JSON lines to this file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

impl ScanArgs {
    /// Positional terms followed by `--term` values, split on commas.
    pub fn all_terms(&self) -> Vec<String> {
        self.terms
            .iter()
            .chain(self.term.iter())
            .flat_map(|raw| raw.split(','))
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect()
    }
}
