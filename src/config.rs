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

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::model::DEFAULT_DPI;
use crate::model::DEFAULT_OCR_LANG;
use crate::model::DEFAULT_THRESHOLD;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tesseract_cmd: PathBuf,
    pub pdftoppm_cmd: PathBuf,
    pub ocr_lang: String,
    pub dpi: u32,
    pub fuzzy_threshold: i64,
    pub jobs: usize,
    pub ignore: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            ocr_lang: DEFAULT_OCR_LANG.to_string(),
            dpi: DEFAULT_DPI,
            fuzzy_threshold: DEFAULT_THRESHOLD as i64,
            jobs: 1,
            ignore: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigCtx {
    /// File the settings came from; `None` when running on defaults.
    pub source: Option<PathBuf>,
    pub config: Config,
}

impl ConfigCtx {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self {
                source: Some(path.to_path_buf()),
                config: read_config(path)?,
            });
        }
        match global_config_path() {
            Some(path) if path.exists() => Ok(Self {
                config: read_config(&path)?,
                source: Some(path),
            }),
            _ => Ok(Self {
                source: None,
                config: Config::default(),
            }),
        }
    }
}

fn config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Some(PathBuf::from(appdata));
        }
        if let Ok(profile) = std::env::var("USERPROFILE") {
            return Some(PathBuf::from(profile).join("AppData").join("Roaming"));
        }
        return None;
    }

    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").ok()?;
        return Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support"),
        );
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config"))
}

pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("docscan").join("docscan.toml"))
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut config: Config =
        toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    if config.dpi == 0 {
        config.dpi = DEFAULT_DPI;
    }
    if config.jobs == 0 {
        config.jobs = 1;
    }
    if config.ocr_lang.trim().is_empty() {
        config.ocr_lang = DEFAULT_OCR_LANG.to_string();
    }
    Ok(config)
}

pub fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("serialize config")
}
