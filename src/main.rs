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

mod cli;
mod config;
mod context;
mod enumerate;
mod error;
mod extract;
mod fuzzy;
mod model;
mod normalize;
mod output;
mod scan;
mod transfer;

use std::path::Path;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context as _;
use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use time::OffsetDateTime;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::ScanArgs;
use crate::config::Config;
use crate::config::ConfigCtx;
use crate::error::ScanError;
use crate::extract::Toolchain;
use crate::model::ScanParams;
use crate::model::ScanRequest;
use crate::model::ScanStatus;
use crate::output::JsonResponse;
use crate::output::print_json;
use crate::scan::CancelToken;
use crate::scan::ScanEvent;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Keep stdout clean for records and JSON.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Scan(args) => {
            let json = args.json;
            handle_result(cmd_scan(args, config_path), json)
        }
        Commands::Config { json } => handle_result(cmd_config(config_path, json), json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "docscan", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn handle_result(result: Result<()>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let code = err
                    .downcast_ref::<ScanError>()
                    .map(|scan_err| scan_err.kind().as_str())
                    .unwrap_or("error");
                let resp = JsonResponse::error(code, &format!("{err:#}"));
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn scan_params(args: &ScanArgs, config: &Config) -> ScanParams {
    let mut params = ScanParams::new(args.root.clone(), args.all_terms());
    params.threshold = args.threshold.unwrap_or(config.fuzzy_threshold);
    params.lang = args.lang.clone().unwrap_or_else(|| config.ocr_lang.clone());
    params.dpi = args.dpi.unwrap_or(config.dpi);
    params.tesseract_cmd = args
        .tesseract
        .clone()
        .unwrap_or_else(|| config.tesseract_cmd.clone());
    params.pdftoppm_cmd = args
        .pdftoppm
        .clone()
        .unwrap_or_else(|| config.pdftoppm_cmd.clone());
    params.ignore = config
        .ignore
        .iter()
        .chain(args.ignore.iter())
        .cloned()
        .collect();
    params.jobs = args.jobs.unwrap_or(config.jobs);
    params
}

fn cmd_scan(args: ScanArgs, config_path: Option<&Path>) -> Result<()> {
    let ctx = ConfigCtx::load(config_path)?;
    let request = ScanRequest::new(scan_params(&args, &ctx.config))?;
    let started_at = OffsetDateTime::now_utc();

    let tools = Toolchain::external(&request);
    let cancel = CancelToken::new();
    let show_progress = !args.quiet && !args.json;
    let mut deadline = args
        .timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut timed_out = false;
    if let Some(at) = deadline
        && at <= Instant::now()
    {
        warn!("timeout reached before start, cancelling scan");
        cancel.cancel();
        timed_out = true;
        deadline = None;
    }
    let handle =
        scan::spawn(request.clone(), tools, cancel.clone()).context("start scan worker")?;

    loop {
        let event = match deadline {
            Some(at) => match handle
                .events
                .recv_timeout(at.saturating_duration_since(Instant::now()))
            {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    warn!("timeout reached, cancelling scan");
                    cancel.cancel();
                    timed_out = true;
                    deadline = None;
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match handle.events.recv() {
                Ok(event) => event,
                Err(_) => break,
            },
        };
        if let ScanEvent::Progress(progress) = event
            && show_progress
        {
            eprintln!("[{}/{}] {}", progress.index, progress.total, progress.file);
        }
    }

    let report = handle.join()?;

    if let Some(out) = &args.out {
        let written = transfer::export_to_file(&report.records, out)?;
        info!(path = %out.display(), records = written, "exported records");
    }

    let mut warnings = Vec::new();
    if timed_out && report.status == ScanStatus::Cancelled {
        warnings.push(format!(
            "scan cancelled after {} seconds; results are partial",
            args.timeout_secs.unwrap_or_default()
        ));
    }

    if args.json {
        let resp = JsonResponse::ok()
            .with_query(&request)
            .with_report(report, started_at)
            .with_warnings(warnings);
        print_json(&resp)?;
    } else {
        for record in &report.records {
            println!("{}", output::plain_line(record));
        }
        for warning in warnings {
            eprintln!("warning: {warning}");
        }
        println!("{}", output::summary_line(&report));
    }

    Ok(())
}

fn cmd_config(config_path: Option<&Path>, json: bool) -> Result<()> {
    let ctx = ConfigCtx::load(config_path)?;
    let source = ctx
        .source
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());

    if json {
        let mut value = serde_json::to_value(&ctx.config)?;
        if let Some(map) = value.as_object_mut() {
            map.insert("source".to_string(), serde_json::Value::String(source));
        }
        print_json(&JsonResponse::ok().with_config(value))?;
    } else {
        println!("# source: {source}");
        print!("{}", config::render_config(&ctx.config)?);
    }
    Ok(())
}
