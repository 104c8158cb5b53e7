//! Tracer AN Solar Controller CLI
//!
//! A command-line interface (CLI) application for reading telemetry from
//! and configuring EPEVER Tracer AN series solar charge controllers
//! (tested with the Tracer3210AN) over Modbus RTU.
//!
//! This tool allows users to:
//! - Probe a serial port for a responding controller.
//! - Read all known parameters, or a chosen subset, in human, JSON, or
//!   CSV form.
//! - Continuously monitor live values at a fixed interval.
//! - List the known register catalog, including the writable subset.
//! - Write individual configuration parameters with validation and
//!   read-back verification.
//! - Apply battery presets or whole configuration files in one batch.
//! - Back up every writable parameter to a JSON file and restore it.
//!
//! The CLI leverages the `tracer_an_lib` crate for the protocol engine,
//! the register catalog, and client operations.

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::Confirm;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{panic, thread};
use tracer_an_lib::backup::ConfigBackup;
use tracer_an_lib::registers::{
    self, Bank, Category, READ_BLOCKS, RegisterDef, RegisterMap, Value,
};
use tracer_an_lib::serial_client::{Client, INTER_WRITE_DELAY, WriteOutcome};
use tracer_an_lib::snapshot::{self, DeviceInfo, DeviceSnapshot};
use tracer_an_lib::validate;

mod commandline;
mod output;

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown_file>", 0, 0)); // Provide defaults

        let cause_str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown_panic_cause>"
        };

        error!(
            target: "panic", // Optional target for filtering
            "Thread '{}' panicked at '{}': {}:{} - Cause: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            filename,
            line,
            column,
            cause_str
        );
    }));
    log_handle
}

/// Settling time between consecutive block reads.
const INTER_READ_DELAY: Duration = Duration::from_millis(50);

fn parse_category(input: Option<&str>) -> Result<Option<Category>> {
    match input {
        None => Ok(None),
        Some(s) => match Category::parse(s) {
            Some(category) => Ok(Some(category)),
            None => bail!(
                "Unknown category '{s}'; expected one of: pv, battery, load, system, status, statistics, config"
            ),
        },
    }
}

fn connect(args: &commandline::CliArgs) -> Result<Client> {
    info!(
        "Connecting to {} (slave {}, {} baud)...",
        args.device, args.slave_id, args.baud_rate
    );
    let mut client = Client::open(&args.device, args.baud_rate, args.slave_id, args.timeout)
        .with_context(|| format!("Cannot open serial port {}", args.device))?;
    client.set_strict_crc(args.strict_crc);
    Ok(client)
}

fn device_info(args: &commandline::CliArgs) -> DeviceInfo {
    DeviceInfo::new(&args.device, args.slave_id, args.baud_rate)
}

/// Reads the low word of a parameter, plus the high word for 32-bit
/// pairs, appending raw pairs suitable for [`snapshot::assemble`].
fn read_parameter_raw(
    client: &mut Client,
    def: &RegisterDef,
    reads: &mut Vec<(Bank, u16, u16)>,
) -> Result<()> {
    let low = client.read_single(def.bank, def.address)?;
    reads.push((def.bank, def.address, low));
    if let Some(high_addr) = def.high_address {
        let high = client.read_single(def.bank, high_addr)?;
        reads.push((def.bank, high_addr, high));
    }
    Ok(())
}

/// Reads every register block in one request each. A failed block is
/// logged and skipped so the remaining blocks still produce readings.
/// `include_holding` drops the configuration blocks for telemetry-only
/// captures.
fn read_blocks(client: &mut Client, include_holding: bool) -> Result<Vec<(Bank, u16, u16)>> {
    let mut reads = Vec::new();
    for block in READ_BLOCKS {
        if !include_holding && block.bank == Bank::Holding {
            continue;
        }
        match client.read_block(block.bank, block.start, block.count) {
            Ok(values) => {
                reads.extend(values.into_iter().map(|(addr, value)| (block.bank, addr, value)));
            }
            Err(err) => {
                warn!(
                    "Skipping block {} (0x{:04X}, {} registers): {err}",
                    block.description, block.start, block.count
                );
            }
        }
        thread::sleep(INTER_READ_DELAY);
    }
    if reads.is_empty() {
        bail!("No register block produced a response; is the controller connected?");
    }
    Ok(reads)
}

/// Reads every known parameter one at a time. Slower than block reads
/// but a single unsupported register only loses itself.
fn read_individually(
    client: &mut Client,
    map: &RegisterMap,
    category: Option<Category>,
) -> Vec<(Bank, u16, u16)> {
    let mut reads = Vec::new();
    for def in map.iter() {
        if let Some(wanted) = category {
            if def.category != wanted {
                continue;
            }
        }
        if let Err(err) = read_parameter_raw(client, def, &mut reads) {
            warn!("Skipping {}: {err}", def.name);
        }
        thread::sleep(INTER_READ_DELAY);
    }
    reads
}

fn filter_snapshot(mut snapshot: DeviceSnapshot, category: Option<Category>) -> DeviceSnapshot {
    if let Some(wanted) = category {
        snapshot.parameters.retain(|r| r.category == wanted);
    }
    snapshot
}

fn handle_read_all(
    args: &commandline::CliArgs,
    category: Option<&str>,
    efficient: bool,
) -> Result<()> {
    let category = parse_category(category)?;
    let map = RegisterMap::new();
    let mut client = connect(args)?;

    let reads = if efficient {
        read_blocks(&mut client, true)?
    } else {
        read_individually(&mut client, &map, category)
    };
    let snapshot = filter_snapshot(snapshot::assemble(&map, device_info(args), &reads), category);
    if snapshot.parameters.is_empty() {
        bail!("No parameters could be read from the controller");
    }

    let rendered = output::render(&snapshot, args.format)?;
    output::emit(&rendered, args.output.as_deref())
}

/// A requested read: a cataloged parameter, or a bare register address
/// given as hex that is read from the telemetry bank.
#[derive(Debug)]
enum ReadTarget {
    Def(&'static RegisterDef),
    Raw(u16),
}

fn resolve_read_target(map: &RegisterMap, input: &str) -> Result<ReadTarget> {
    if let Some(def) = map.by_name(input) {
        return Ok(ReadTarget::Def(def));
    }
    if let Ok(address) = clap_num::maybe_hex::<u16>(input) {
        for bank in [Bank::Input, Bank::Holding] {
            if let Some(def) = map.by_address(bank, address) {
                return Ok(ReadTarget::Def(def));
            }
            // A bare high-word address resolves to its 32-bit parameter
            // so the read never comes back empty.
            if let Some(def) = map.high_word_of(bank, address) {
                return Ok(ReadTarget::Def(def));
            }
        }
        return Ok(ReadTarget::Raw(address));
    }
    bail!("Unknown parameter '{input}'; see `list-parameters` (or give a hex address)")
}

fn handle_read(args: &commandline::CliArgs, parameters: &[String]) -> Result<()> {
    let map = RegisterMap::new();
    let mut targets = Vec::with_capacity(parameters.len());
    for input in parameters {
        targets.push(resolve_read_target(&map, input)?);
    }

    let mut client = connect(args)?;
    let mut reads = Vec::new();
    for target in targets {
        match target {
            ReadTarget::Def(def) => {
                read_parameter_raw(&mut client, def, &mut reads)
                    .with_context(|| format!("Cannot read parameter '{}'", def.name))?;
            }
            ReadTarget::Raw(address) => {
                let value = client
                    .read_single(Bank::Input, address)
                    .with_context(|| format!("Cannot read register 0x{address:04X}"))?;
                reads.push((Bank::Input, address, value));
            }
        }
        thread::sleep(INTER_READ_DELAY);
    }

    let snapshot = snapshot::assemble(&map, device_info(args), &reads);
    let rendered = output::render(&snapshot, args.format)?;
    output::emit(&rendered, args.output.as_deref())
}

fn handle_monitor(
    args: &commandline::CliArgs,
    interval: Duration,
    count: Option<u64>,
    category: Option<&str>,
) -> Result<()> {
    let category = parse_category(category)?;
    let map = RegisterMap::new();
    let mut client = connect(args)?;

    let mut cycles = 0u64;
    loop {
        let reads = read_blocks(&mut client, true)?;
        let snapshot = snapshot::assemble(&map, device_info(args), &reads);
        let stamp = snapshot.timestamp.format("%H:%M:%S");

        match category {
            Some(wanted) => {
                println!("--- {stamp} [{wanted}] ---");
                for reading in snapshot.get_by_category(wanted) {
                    match &reading.value {
                        Value::Number(n) => {
                            println!("  {:<28} {n:.2} {}", reading.description, reading.unit)
                        }
                        Value::Text(s) => println!("  {:<28} {s}", reading.description),
                    }
                }
            }
            None => {
                let line: Vec<String> = snapshot
                    .summary()
                    .iter()
                    .map(|entry| match &entry.value {
                        Value::Number(n) => format!("{}={n:.2}{}", entry.name, entry.unit),
                        Value::Text(s) => format!("{}={s}", entry.name),
                    })
                    .collect();
                println!("{stamp}  {}", line.join("  "));
            }
        }

        cycles += 1;
        if let Some(limit) = count {
            if cycles >= limit {
                break;
            }
        }
        thread::sleep(interval);
    }
    Ok(())
}

fn format_range(def: &RegisterDef) -> String {
    match def.write {
        Some(spec) => match (spec.min, spec.max) {
            (Some(min), Some(max)) => format!("{min}..{max}"),
            (Some(min), None) => format!(">= {min}"),
            (None, Some(max)) => format!("<= {max}"),
            (None, None) => String::from("-"),
        },
        None => String::from("-"),
    }
}

fn print_parameter_list(
    defs: Vec<&'static RegisterDef>,
    detailed: bool,
    writable_only: bool,
) {
    let mut current: Option<Category> = None;
    for def in defs {
        if current != Some(def.category) {
            println!("\n[{}]", def.category);
            current = Some(def.category);
        }
        if detailed {
            let mut line = format!(
                "  {:<26} 0x{:04X}  scale {:<6} {:<6}",
                def.name, def.address, def.scale, def.unit
            );
            if writable_only || def.is_writable() {
                line.push_str(&format!("  range {}", format_range(def)));
            }
            if let Some(labels) = def.enum_labels() {
                line.push_str(&format!("  values: {}", labels.join(", ")));
            }
            println!("{line}");
            println!("      {}", def.description);
        } else if def.unit.is_empty() {
            println!("  {:<26} {}", def.name, def.description);
        } else {
            println!("  {:<26} {} ({})", def.name, def.description, def.unit);
        }
    }
}

fn handle_list(category: Option<&str>, detailed: bool, writable_only: bool) -> Result<()> {
    let category = parse_category(category)?;
    let map = RegisterMap::new();
    let mut defs: Vec<&'static RegisterDef> = if writable_only {
        map.writable().collect()
    } else {
        map.iter().collect()
    };
    if let Some(wanted) = category {
        defs.retain(|def| def.category == wanted);
    }
    if defs.is_empty() {
        bail!("No parameters match the given filter");
    }
    defs.sort_by_key(|def| (output::category_rank(def.category), def.address));
    print_parameter_list(defs, detailed, writable_only);
    Ok(())
}

fn confirm_write(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .show_default(true)
        .interact()
        .context("Failed to get user confirmation.")
}

fn describe_written(def: &RegisterDef, raw: u16) -> String {
    let decoded = registers::decode(def, raw, None);
    if def.unit.is_empty() {
        format!("{} = {decoded} (raw {raw})", def.name)
    } else {
        format!("{} = {decoded} {} (raw {raw})", def.name, def.unit)
    }
}

fn handle_write(
    args: &commandline::CliArgs,
    parameter: &str,
    value: &str,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let map = RegisterMap::new();
    let def = map
        .by_name(parameter)
        .with_context(|| format!("Unknown parameter '{parameter}'; see `list-writable`"))?;
    let raw = validate::validate_value(def, value)
        .with_context(|| format!("Invalid value '{value}' for parameter '{parameter}'"))?;

    if let Some(spec) = &def.write {
        if let Some(warning) = spec.warning {
            println!("WARNING: {warning}");
        }
    }

    if dry_run {
        println!("Dry run: would write {}", describe_written(def, raw));
        return Ok(());
    }

    let mut client = connect(args)?;
    match client.read_single(Bank::Holding, def.address) {
        Ok(current) => println!("Current value: {}", describe_written(def, current)),
        Err(err) => warn!("Cannot read current value of {}: {err}", def.name),
    }

    if !force && !confirm_write(&format!("Write {}?", describe_written(def, raw)))? {
        info!("Write aborted by user.");
        return Ok(());
    }

    match client.write_verified(def.address, raw)? {
        WriteOutcome::Verified => {
            println!("Wrote and verified {}", describe_written(def, raw));
        }
        WriteOutcome::Mismatch { expected, actual } => {
            println!(
                "Wrote {} but the device reports raw {actual} instead of {expected}. \
                 The controller may clamp or reject this value.",
                def.name
            );
        }
    }
    Ok(())
}

/// One planned entry of a batch write.
struct PlannedWrite {
    def: &'static RegisterDef,
    raw: u16,
}

fn plan_from_config_file(
    map: &RegisterMap,
    path: &Path,
    plan: &mut Vec<PlannedWrite>,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file {}", path.display()))?;
    let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("Config file {} is not a JSON object", path.display()))?;

    for (name, value) in entries {
        let def = map
            .by_name(&name)
            .with_context(|| format!("Unknown parameter '{name}' in config file"))?;
        let raw = match &value {
            serde_json::Value::Number(n) => {
                let number = n
                    .as_f64()
                    .with_context(|| format!("Value of '{name}' is not a finite number"))?;
                registers::encode(def, number)
            }
            serde_json::Value::String(s) => validate::validate_value(def, s),
            other => bail!("Value of '{name}' must be a number or string, got {other}"),
        }
        .with_context(|| format!("Invalid value for '{name}' in config file"))?;

        // File entries override any preset value planned earlier.
        plan.retain(|p| p.def.name != def.name);
        plan.push(PlannedWrite { def, raw });
    }
    Ok(())
}

fn handle_write_config(
    args: &commandline::CliArgs,
    battery_type: Option<&str>,
    battery_capacity: Option<f64>,
    config_file: Option<&Path>,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let map = RegisterMap::new();
    let mut plan: Vec<PlannedWrite> = Vec::new();

    if let Some(label) = battery_type {
        let preset = validate::battery_type_preset(label).with_context(|| {
            format!("Unknown battery type '{label}'; expected Sealed, GEL, Flooded or LiFePO4")
        })?;
        let type_def = map
            .by_name("battery_type")
            .context("Register catalog is missing battery_type")?;
        plan.push(PlannedWrite {
            def: type_def,
            raw: registers::encode_label(type_def, preset.battery_type)?,
        });
        for (name, value) in preset.settings {
            let def = map
                .by_name(name)
                .with_context(|| format!("Register catalog is missing preset parameter '{name}'"))?;
            plan.push(PlannedWrite {
                def,
                raw: registers::encode(def, *value)?,
            });
        }
        println!("Applying {} battery preset.", preset.battery_type);
    }

    if let Some(capacity) = battery_capacity {
        let def = map
            .by_name("battery_capacity")
            .context("Register catalog is missing battery_capacity")?;
        plan.retain(|p| p.def.name != def.name);
        plan.push(PlannedWrite {
            def,
            raw: registers::encode(def, capacity)
                .context("Invalid battery capacity")?,
        });
    }

    if let Some(path) = config_file {
        plan_from_config_file(&map, path, &mut plan)?;
    }

    if plan.is_empty() {
        bail!("Nothing to write: give --battery-type, --battery-capacity or --config-file");
    }

    // Advisory cross-parameter check over the voltage ladder.
    let engineering: Vec<(&str, f64)> = plan
        .iter()
        .map(|p| (p.def.name, p.raw as f64 * p.def.scale))
        .collect();
    for warning in validate::validate_voltage_sequence(&engineering) {
        println!("WARNING: {warning}");
    }
    for p in &plan {
        if let Some(spec) = &p.def.write {
            if let Some(warning) = spec.warning {
                println!("WARNING: {warning}");
            }
        }
    }

    println!("Planned writes:");
    for p in &plan {
        println!("  {}", describe_written(p.def, p.raw));
    }
    if dry_run {
        println!("Dry run: nothing written.");
        return Ok(());
    }
    if !force && !confirm_write(&format!("Write these {} parameter(s)?", plan.len()))? {
        info!("Batch write aborted by user.");
        return Ok(());
    }

    let mut client = connect(args)?;
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for p in &plan {
        match client.write_register(p.def.address, p.raw) {
            Ok(()) => {
                succeeded += 1;
                info!("Wrote {}", describe_written(p.def, p.raw));
            }
            Err(err) => {
                failed += 1;
                warn!("Failed to write {}: {err}", p.def.name);
            }
        }
        thread::sleep(INTER_WRITE_DELAY);
    }

    // Verification pass after all writes have settled.
    thread::sleep(Duration::from_millis(200));
    let mut mismatched = 0usize;
    for p in &plan {
        match client.read_single(Bank::Holding, p.def.address) {
            Ok(actual) if actual == p.raw => {}
            Ok(actual) => {
                mismatched += 1;
                warn!(
                    "{}: device reports raw {actual} instead of {}",
                    p.def.name, p.raw
                );
            }
            Err(err) => warn!("Cannot verify {}: {err}", p.def.name),
        }
        thread::sleep(INTER_READ_DELAY);
    }

    println!(
        "Batch write complete: {succeeded} written, {failed} failed, {mismatched} verification mismatch(es)."
    );
    if failed > 0 {
        bail!("{failed} parameter(s) could not be written");
    }
    Ok(())
}

fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "tracer_export_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn handle_export(args: &commandline::CliArgs, include_config: bool) -> Result<()> {
    let map = RegisterMap::new();
    let mut client = connect(args)?;
    let reads = read_blocks(&mut client, include_config)?;
    let snapshot = snapshot::assemble(&map, device_info(args), &reads);

    let document = output::render_export(&snapshot)?;
    let path = args.output.clone().unwrap_or_else(default_export_path);
    std::fs::write(&path, document)
        .with_context(|| format!("Cannot write export file {}", path.display()))?;
    println!(
        "Exported {} parameters to {}",
        snapshot.parameters.len(),
        path.display()
    );
    Ok(())
}

fn default_backup_path() -> PathBuf {
    PathBuf::from(format!(
        "tracer_backup_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn handle_backup(args: &commandline::CliArgs, output_path: Option<&Path>) -> Result<()> {
    let map = RegisterMap::new();
    let mut client = connect(args)?;
    let mut backup = ConfigBackup::new(device_info(args));

    for def in map.writable() {
        backup.metadata.total_parameters += 1;
        match client.read_single(Bank::Holding, def.address) {
            Ok(raw) => backup.add(def, raw),
            Err(err) => {
                backup.metadata.failed_reads += 1;
                warn!("Cannot back up {}: {err}", def.name);
            }
        }
        thread::sleep(INTER_READ_DELAY);
    }

    if backup.metadata.successful_reads == 0 {
        bail!("No writable parameter could be read; backup not written");
    }

    let path = output_path.map(Path::to_path_buf).unwrap_or_else(default_backup_path);
    let json = serde_json::to_string_pretty(&backup).context("Cannot serialize backup")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Cannot write backup file {}", path.display()))?;
    println!(
        "Backed up {} of {} parameters to {}",
        backup.metadata.successful_reads,
        backup.metadata.total_parameters,
        path.display()
    );
    Ok(())
}

fn handle_restore(args: &commandline::CliArgs, backup_file: &Path, force: bool) -> Result<()> {
    let text = std::fs::read_to_string(backup_file)
        .with_context(|| format!("Cannot read backup file {}", backup_file.display()))?;
    let backup: ConfigBackup = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid backup file", backup_file.display()))?;

    let map = RegisterMap::new();
    let mut plan: Vec<PlannedWrite> = Vec::new();
    let mut skipped = 0usize;
    for (name, param) in &backup.parameters {
        match map.by_name(name) {
            Some(def) if def.is_writable() => plan.push(PlannedWrite {
                def,
                raw: param.raw_value,
            }),
            Some(_) | None => {
                skipped += 1;
                warn!("Skipping '{name}': not a writable parameter of this controller");
            }
        }
    }
    if plan.is_empty() {
        bail!("Backup file contains no restorable parameters");
    }

    println!(
        "Restoring {} parameter(s) from backup taken {} ({} skipped).",
        plan.len(),
        backup.backup_timestamp,
        skipped
    );
    for p in &plan {
        println!("  {}", describe_written(p.def, p.raw));
    }
    if !force && !confirm_write("Write these parameters to the controller?")? {
        info!("Restore aborted by user.");
        return Ok(());
    }

    let mut client = connect(args)?;
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for p in &plan {
        match client.write_register(p.def.address, p.raw) {
            Ok(()) => succeeded += 1,
            Err(err) => {
                failed += 1;
                warn!("Failed to restore {}: {err}", p.def.name);
            }
        }
        thread::sleep(INTER_WRITE_DELAY);
    }
    println!("Restore complete: {succeeded} written, {failed} failed, {skipped} skipped.");
    if failed > 0 {
        bail!("{failed} parameter(s) could not be restored");
    }
    Ok(())
}

fn handle_discover(args: &commandline::CliArgs) -> Result<()> {
    let mut client = connect(args)?;
    if client.test_connection() {
        println!(
            "Controller responding on {} (slave {}, {} baud).",
            args.device, args.slave_id, args.baud_rate
        );
        Ok(())
    } else {
        bail!(
            "No controller responded on {} (slave {}, {} baud). \
             Check wiring, slave ID and baud rate.",
            args.device,
            args.slave_id,
            args.baud_rate
        );
    }
}

fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    // Initialize logging as early as possible.
    let _log_handle = logging_init(args.verbose.log_level_filter());
    info!(
        "solarctl started. Log level: {}",
        args.verbose.log_level_filter()
    );

    match args.command.clone() {
        commandline::CliCommands::Discover => handle_discover(&args),
        commandline::CliCommands::ReadAll {
            category,
            efficient,
        } => handle_read_all(&args, category.as_deref(), efficient),
        commandline::CliCommands::Read { parameters } => handle_read(&args, &parameters),
        commandline::CliCommands::Monitor {
            interval,
            count,
            category,
        } => handle_monitor(&args, interval, count, category.as_deref()),
        commandline::CliCommands::ListParameters { category, detailed } => {
            handle_list(category.as_deref(), detailed, false)
        }
        commandline::CliCommands::ListWritable { category, detailed } => {
            handle_list(category.as_deref(), detailed, true)
        }
        commandline::CliCommands::Write {
            parameter,
            value,
            force,
            dry_run,
        } => handle_write(&args, &parameter, &value, force, dry_run),
        commandline::CliCommands::WriteConfig {
            battery_type,
            battery_capacity,
            config_file,
            force,
            dry_run,
        } => handle_write_config(
            &args,
            battery_type.as_deref(),
            battery_capacity,
            config_file.as_deref(),
            force,
            dry_run,
        ),
        commandline::CliCommands::Export { include_config } => {
            handle_export(&args, include_config)
        }
        commandline::CliCommands::BackupConfig => handle_backup(&args, args.output.as_deref()),
        commandline::CliCommands::RestoreConfig { backup_file, force } => {
            handle_restore(&args, &backup_file, force)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn read_target_resolves_names_and_addresses() {
        let map = RegisterMap::new();
        assert_matches!(
            resolve_read_target(&map, "battery_voltage"),
            Ok(ReadTarget::Def(def)) if def.name == "battery_voltage"
        );
        assert_matches!(
            resolve_read_target(&map, "0x3104"),
            Ok(ReadTarget::Def(def)) if def.name == "battery_voltage"
        );
        assert_matches!(
            resolve_read_target(&map, "0x9008"),
            Ok(ReadTarget::Def(def)) if def.name == "float_voltage"
        );
    }

    #[test]
    fn high_word_address_resolves_to_its_parameter() {
        let map = RegisterMap::new();
        assert_matches!(
            resolve_read_target(&map, "0x3103"),
            Ok(ReadTarget::Def(def)) if def.name == "pv_power"
        );
    }

    #[test]
    fn unmapped_address_reads_raw() {
        let map = RegisterMap::new();
        assert_matches!(resolve_read_target(&map, "0x3FFF"), Ok(ReadTarget::Raw(0x3FFF)));
    }

    #[test]
    fn garbage_input_is_rejected() {
        let map = RegisterMap::new();
        assert!(resolve_read_target(&map, "no_such_parameter").is_err());
    }
}
