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

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use lopdf::Document;
use lopdf::Object;
use lopdf::Stream;
use lopdf::content::Content;
use lopdf::content::Operation;
use lopdf::dictionary;
use serde_json::Value;
use serde_json::json;

pub const MISSING_TESSERACT: &str = "/nonexistent/docscan-test/tesseract";
pub const MISSING_PDFTOPPM: &str = "/nonexistent/docscan-test/pdftoppm";

pub fn docscan_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("docscan"))
}

/// A command isolated from the user's global config.
pub fn docscan_cmd_with_env(config_root: &Path) -> Command {
    let mut cmd = docscan_cmd();
    cmd.env("XDG_CONFIG_HOME", config_root);
    cmd.env("HOME", config_root);
    cmd.env("APPDATA", config_root);
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Writes a PDF with a real text layer, one `BT ... ET` block per line.
/// A page with no lines has an empty content stream.
pub fn write_pdf(path: &Path, pages: &[&[&str]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            let y = 720 - 20 * idx as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save pdf");
}

/// docs/corrupt.pdf, docs/invoice.pdf (3 pages, the middle one blank),
/// docs/notes.txt, drafts/old.pdf and scan.png.
pub fn seed_tree(root: &Path) {
    fs::create_dir_all(root.join("docs")).expect("docs dir");
    fs::create_dir_all(root.join("drafts")).expect("drafts dir");
    write_pdf(
        &root.join("docs/invoice.pdf"),
        &[
            &["ACME Supplies", "Invoice 2024-17", "Total due 450"],
            &[],
            &["Ledger summary", "Tax invoce paid"],
        ],
    );
    write_pdf(&root.join("drafts/old.pdf"), &[&["Invoice draft"]]);
    fs::write(root.join("docs/corrupt.pdf"), b"%PDF-1.4 this is not a pdf").expect("corrupt");
    fs::write(root.join("docs/notes.txt"), "invoice total\n").expect("notes");
    fs::write(root.join("scan.png"), b"\x89PNG not really").expect("png");
}

pub fn run_json(cmd: &mut Command, cwd: &Path) -> Value {
    let output = cmd.current_dir(cwd).output().expect("run command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("parse json")
}

/// Blanks out timing fields and makes paths relative to `root`.
pub fn normalize_json(mut value: Value, root: &Path) -> Value {
    if let Some(stats) = value.get_mut("stats")
        && let Some(obj) = stats.as_object_mut()
    {
        obj.insert("took_ms".to_string(), json!(0));
        obj.insert("started_at".to_string(), json!(""));
    }
    let prefix = root.display().to_string();
    strip_root(&mut value, &prefix);
    value
}

fn strip_root(value: &mut Value, prefix: &str) {
    match value {
        Value::String(text) => {
            if let Some(rest) = text.strip_prefix(prefix) {
                *text = rest.trim_start_matches(['/', '\\']).replace('\\', "/");
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                strip_root(v, prefix);
            }
        }
        Value::Array(items) => {
            for v in items {
                strip_root(v, prefix);
            }
        }
        _ => {}
    }
}
