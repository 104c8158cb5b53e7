use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;
use std::time::Duration;
use tracer_an_lib::protocol as proto;

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1") // Common default for Windows, though may vary.
    } else {
        String::from("/dev/ttyUSB0") // Common default for USB-to-serial adapters on Linux.
    }
}

const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

fn parse_baud_rate(s: &str) -> Result<u32, String> {
    let rate = s
        .parse::<u32>()
        .map_err(|e| format!("Invalid baud rate number format: {e}"))?;
    if SUPPORTED_BAUD_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!(
            "Unsupported baud rate {rate}; supported: 9600, 19200, 38400, 57600, 115200"
        ))
    }
}

fn parse_slave_id(s: &str) -> Result<u8, String> {
    let id = clap_num::maybe_hex::<u8>(s).map_err(|e| format!("Invalid slave ID format: {e}"))?;
    if (proto::SLAVE_ID_MIN..=proto::SLAVE_ID_MAX).contains(&id) {
        Ok(id)
    } else {
        Err(format!(
            "Slave ID {id} out of range ({}-{})",
            proto::SLAVE_ID_MIN,
            proto::SLAVE_ID_MAX
        ))
    }
}

/// Output format for read results.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Grouped, human-readable table.
    #[default]
    Human,
    /// Full snapshot as a JSON document.
    Json,
    /// Flat comma-separated rows.
    Csv,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Probe the configured serial port and report whether a controller responds.
    Discover,

    /// Read and display all known parameters from the controller.
    ReadAll {
        /// Restrict output to one category
        /// (pv, battery, load, system, status, statistics, config).
        #[arg(short, long)]
        category: Option<String>,

        /// Read registers in contiguous blocks instead of one at a time.
        /// Much faster, but a single failed block loses all registers in it.
        #[arg(long)]
        efficient: bool,
    },

    /// Read and display specific parameters by name.
    Read {
        /// Parameter names, e.g. "battery_voltage pv_power".
        #[arg(required = true)]
        parameters: Vec<String>,
    },

    /// Continuously poll a summary of live values at a fixed interval.
    Monitor {
        /// Interval between polls (e.g., "5s", "1m").
        #[arg(value_parser = humantime::parse_duration, short, long, default_value = "5sec")]
        interval: Duration,

        /// Stop after this many polls. Runs until interrupted when omitted.
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Restrict output to one category.
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List all known parameters without touching the device.
    ListParameters {
        /// Restrict output to one category.
        #[arg(short, long)]
        category: Option<String>,

        /// Include addresses, scaling, and value ranges.
        #[arg(short, long)]
        detailed: bool,
    },

    /// List the parameters that can be written, with their allowed ranges.
    ListWritable {
        /// Restrict output to one category.
        #[arg(short, long)]
        category: Option<String>,

        /// Include addresses, scaling, and value ranges.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Write a single configuration parameter.
    /// The value is validated against the parameter's allowed range, written,
    /// and read back after a settling delay to confirm the device accepted it.
    #[clap(verbatim_doc_comment)]
    Write {
        /// Parameter name, e.g. "boost_voltage".
        parameter: String,

        /// New value: a number for numeric parameters
        /// (e.g. "14.4"), or a label for enum parameters (e.g. "LiFePO4").
        value: String,

        /// Skip the interactive confirmation prompt.
        #[arg(short, long)]
        force: bool,

        /// Validate and show what would be written without touching the device.
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a batch of configuration parameters.
    /// Values come from a battery type preset, a JSON config file, or both;
    /// explicit file entries override preset values.
    #[clap(verbatim_doc_comment)]
    WriteConfig {
        /// Apply the factory preset for this battery type
        /// (Sealed, GEL, Flooded, LiFePO4).
        #[arg(long)]
        battery_type: Option<String>,

        /// Battery capacity in Ah to write alongside the preset.
        #[arg(long)]
        battery_capacity: Option<f64>,

        /// JSON file of parameter name/value pairs to write.
        #[arg(long)]
        config_file: Option<PathBuf>,

        /// Skip the interactive confirmation prompt.
        #[arg(short, long)]
        force: bool,

        /// Validate and show what would be written without touching the device.
        #[arg(long)]
        dry_run: bool,
    },

    /// Read all parameters and save them to a timestamped JSON document.
    /// Writes to --output, or to a timestamped name in the current
    /// directory when --output is not given.
    #[clap(verbatim_doc_comment)]
    Export {
        /// Also include the writable configuration registers.
        #[arg(long)]
        include_config: bool,
    },

    /// Read every writable parameter and save it to a JSON backup file.
    /// The file goes to --output, or to a timestamped name in the current
    /// directory when --output is not given.
    #[clap(verbatim_doc_comment)]
    BackupConfig,

    /// Write the parameters from a backup file back to the controller.
    /// Parameters that are no longer writable are skipped with a warning.
    #[clap(verbatim_doc_comment)]
    RestoreConfig {
        /// Backup file produced by `backup-config`.
        backup_file: PathBuf,

        /// Skip the interactive confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

const fn about_text() -> &'static str {
    "Tracer AN Solar Controller CLI - Read telemetry and manage configuration of EPEVER Tracer AN charge controllers via Modbus RTU."
}

#[derive(Parser, Debug)]
#[command(name="solarctl", author, version, about=about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace. Default is off.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub command: CliCommands,

    /// Serial port device name.
    /// Examples: "/dev/ttyUSB0" (Linux), "COM3" (Windows).
    #[arg(global = true, long, default_value_t = default_device_name())]
    pub device: String,

    /// Baud rate for serial communication.
    /// Must match the controller's configured baud rate.
    /// Supported values: 9600, 19200, 38400, 57600, 115200.
    #[arg(global = true, long, default_value_t = 115200, value_parser = parse_baud_rate, verbatim_doc_comment)]
    pub baud_rate: u32,

    /// The Modbus RTU slave ID of the controller (1 to 247).
    /// Can be specified in decimal or hexadecimal (e.g., "0x01").
    #[arg(global = true, long, default_value_t = 1, value_parser = parse_slave_id)]
    pub slave_id: u8,

    /// Serial I/O timeout for read/write operations.
    /// Examples: "1s", "500ms".
    #[arg(global = true, long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Verify the CRC of every response frame and reject mismatches.
    /// Off by default because some USB-to-RS485 adapters corrupt the
    /// trailing bytes while the payload is intact.
    #[arg(global = true, long, verbatim_doc_comment)]
    pub strict_crc: bool,

    /// Output format for read results.
    #[arg(global = true, long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Write output to this file instead of standard output.
    #[arg(global = true, long)]
    pub output: Option<PathBuf>,
}
