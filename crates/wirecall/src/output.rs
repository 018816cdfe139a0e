use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of one client call, in every output flavor.
#[derive(Serialize)]
pub struct CallOutput {
    pub op: &'static str,
    pub transport: &'static str,
    pub addr: String,
    pub result: String,
    pub payload_size: usize,
    pub elapsed_ms: f64,
    pub timestamp: String,
}

impl CallOutput {
    pub fn new(
        op: &'static str,
        transport: &'static str,
        addr: String,
        result: String,
        payload_size: usize,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            op,
            transport,
            addr,
            result,
            payload_size,
            elapsed_ms,
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_call(out: &CallOutput, raw_payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OP", "TRANSPORT", "ADDR", "RESULT", "SIZE", "MS"])
                .add_row(vec![
                    out.op.to_string(),
                    out.transport.to_string(),
                    out.addr.clone(),
                    out.result.clone(),
                    out.payload_size.to_string(),
                    format!("{:.2}", out.elapsed_ms),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} via {} to {}: {} ({} bytes, {:.2} ms)",
                out.op, out.transport, out.addr, out.result, out.payload_size, out.elapsed_ms
            );
        }
        OutputFormat::Raw => {
            print_raw(raw_payload);
        }
    }
}

/// Aggregate of a concurrent call volley.
#[derive(Serialize)]
pub struct BlastOutput {
    pub transport: &'static str,
    pub addr: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: f64,
    pub timestamp: String,
}

pub fn print_blast(out: &BlastOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TRANSPORT", "ADDR", "TOTAL", "OK", "FAILED", "MS"])
                .add_row(vec![
                    out.transport.to_string(),
                    out.addr.clone(),
                    out.total.to_string(),
                    out.succeeded.to_string(),
                    out.failed.to_string(),
                    format!("{:.2}", out.elapsed_ms),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "{}/{} calls succeeded via {} to {} in {:.2} ms",
                out.succeeded, out.total, out.transport, out.addr, out.elapsed_ms
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
