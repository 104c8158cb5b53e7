//! Rendering of device snapshots in the formats the CLI offers.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracer_an_lib::registers::{Category, Value};
use tracer_an_lib::snapshot::DeviceSnapshot;

use crate::commandline::OutputFormat;

/// Display order of categories in human output. Categories not listed
/// here (e.g. unknown registers) sort last.
const CATEGORY_ORDER: [Category; 7] = [
    Category::Pv,
    Category::Battery,
    Category::Load,
    Category::System,
    Category::Status,
    Category::Statistics,
    Category::Config,
];

pub fn category_rank(category: Category) -> usize {
    CATEGORY_ORDER
        .iter()
        .position(|c| *c == category)
        .unwrap_or(CATEGORY_ORDER.len())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("{n:.2}"),
        Value::Text(s) => s.clone(),
    }
}

fn render_human(snapshot: &DeviceSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} on {} (slave {}, {} baud) at {}\n",
        snapshot.device_info.model,
        snapshot.device_info.device,
        snapshot.device_info.slave_id,
        snapshot.device_info.baudrate,
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
    ));

    let mut readings: Vec<_> = snapshot.parameters.iter().collect();
    readings.sort_by_key(|r| (category_rank(r.category), r.address));

    let mut current: Option<Category> = None;
    for reading in readings {
        if current != Some(reading.category) {
            out.push_str(&format!("\n[{}]\n", reading.category));
            current = Some(reading.category);
        }
        let rendered = format_value(&reading.value);
        if reading.unit.is_empty() {
            out.push_str(&format!("  {:<28} {}\n", reading.description, rendered));
        } else {
            out.push_str(&format!(
                "  {:<28} {} {}\n",
                reading.description, rendered, reading.unit
            ));
        }
    }
    out
}

fn render_json(snapshot: &DeviceSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot to JSON")
}

/// Quotes a CSV field when it contains a delimiter, quote or newline;
/// embedded quotes are doubled per RFC 4180. Decoded bitfield values
/// carry commas ("Normal, Low Temperature"), so the Value column needs
/// this on every status row.
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_csv(snapshot: &DeviceSnapshot) -> String {
    let mut out = String::from("Address,Name,Description,Value,Unit,Category,Raw Value\n");
    for reading in &snapshot.parameters {
        out.push_str(&format!(
            "0x{:04X},{},{},{},{},{},{}\n",
            reading.address,
            csv_field(&reading.name),
            csv_field(&reading.description),
            csv_field(&format_value(&reading.value)),
            csv_field(&reading.unit),
            reading.category,
            reading.raw_value,
        ));
    }
    out
}

/// JSON export document: the snapshot fields wrapped together with an
/// `export_timestamp` header, the shape the backup tooling expects.
pub fn render_export(snapshot: &DeviceSnapshot) -> Result<String> {
    let mut envelope = serde_json::Map::new();
    envelope.insert(
        "export_timestamp".to_string(),
        serde_json::Value::String(snapshot.timestamp.to_rfc3339()),
    );
    let body =
        serde_json::to_value(snapshot).context("Failed to serialize snapshot to JSON")?;
    if let serde_json::Value::Object(fields) = body {
        for (key, value) in fields {
            envelope.insert(key, value);
        }
    }
    serde_json::to_string_pretty(&serde_json::Value::Object(envelope))
        .context("Failed to serialize export document")
}

pub fn render(snapshot: &DeviceSnapshot, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Human => render_human(snapshot),
        OutputFormat::Json => render_json(snapshot)?,
        OutputFormat::Csv => render_csv(snapshot),
    })
}

/// Writes rendered output to the given file, or to stdout when no file
/// is configured.
pub fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            println!("Output written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracer_an_lib::registers::{Bank, RegisterMap};
    use tracer_an_lib::snapshot::{self, DeviceInfo};

    fn status_snapshot() -> DeviceSnapshot {
        snapshot::assemble(
            &RegisterMap::new(),
            DeviceInfo::new("/dev/ttyUSB0", 1, 115200),
            &[
                (Bank::Input, 0x3104, 2456),
                // battery_status bits 0 and 2: decodes with an embedded comma.
                (Bank::Input, 0x3200, 0b0000_0101),
            ],
        )
    }

    fn field_count(line: &str) -> usize {
        let mut count = 1;
        let mut in_quotes = false;
        for c in line.chars() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => count += 1,
                _ => {}
            }
        }
        count
    }

    #[test]
    fn csv_field_quotes_delimiters_and_doubles_quotes() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_rows_keep_column_count_with_comma_values() {
        let csv = render_csv(&status_snapshot());
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert_eq!(field_count(header), 7);
        for line in lines {
            assert_eq!(field_count(line), 7, "misaligned row: {line}");
        }
        assert!(csv.contains("\"Normal, Low Temperature\""));
    }

    #[test]
    fn export_document_carries_timestamp_and_snapshot_fields() {
        let doc = render_export(&status_snapshot()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert!(value["export_timestamp"].is_string());
        assert!(value["parameters"].is_array());
        assert_eq!(value["device_info"]["slave_id"], 1);
    }
}
