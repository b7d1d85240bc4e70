//! Output formatting helpers for the CLI.

use chrono::{DateTime, Local, Utc};
use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

use recordvault_core::records::{DecryptedRecord, PayloadOutcome, RecordView};

const SUMMARY_CHARS: usize = 48;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| anyhow::anyhow!("Failed to encode JSON output: {}", e))?;
    println!("{}", text);
    Ok(())
}

/// One-line rendering of a payload: strings as-is, anything else as compact
/// JSON, cut to a fixed width.
pub fn payload_summary(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= SUMMARY_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SUMMARY_CHARS - 3).collect();
    format!("{}...", cut)
}

/// Timestamp in the operator's local zone.
pub fn local_time(at: &DateTime<Utc>, pattern: &str) -> String {
    at.with_timezone(&Local).format(pattern).to_string()
}

/// Borderless table of listed records.
pub fn record_table(views: &[RecordView]) -> String {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["ID", "NAME", "EMAIL", "UPDATED", "DATA"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Dim)),
    );
    for i in 0..5 {
        if let Some(column) = table.column_mut(i) {
            column.set_padding((0, 2));
        }
    }

    for view in views {
        let data = match &view.payload {
            PayloadOutcome::Decrypted(value) => payload_summary(value),
            PayloadOutcome::Failed(_) => "<unable to decrypt>".to_string(),
        };
        table.add_row(vec![
            view.record.id.to_string(),
            view.record.name.clone(),
            view.record.email.clone(),
            local_time(&view.record.updated_at, "%Y-%m-%d %H:%M"),
            data,
        ]);
    }
    table.to_string()
}

pub fn print_record(record: &DecryptedRecord, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("ID: {}", record.record.id);
        println!("Name: {}", record.record.name);
        println!("Email: {}", record.record.email);
        println!("Created: {}", local_time(&record.record.created_at, "%Y-%m-%d %H:%M:%S %Z"));
        println!("Updated: {}", local_time(&record.record.updated_at, "%Y-%m-%d %H:%M:%S %Z"));
        println!();
    }
    match &record.sensitive_data {
        Value::String(s) => println!("{}", s),
        other => print_json(other)?,
    }
    Ok(())
}
