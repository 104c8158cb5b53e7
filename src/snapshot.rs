//! Snapshot assembly: raw register batches to coherent reading sets.
//!
//! A [`DeviceSnapshot`] is built atomically from one batch of raw reads
//! (possibly several discontiguous address blocks) and never mutated
//! afterwards; summaries and category views are computed on demand.

use crate::registers::{combined_raw, decode, Bank, Category, RegisterMap, Value};
use chrono::{DateTime, Local};

/// Identity of the controller a snapshot was captured from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    pub model: String,
    pub device: String,
    pub slave_id: u8,
    pub baudrate: u32,
}

impl DeviceInfo {
    pub fn new(device: &str, slave_id: u8, baudrate: u32) -> Self {
        Self {
            model: "Tracer3210AN".to_string(),
            device: device.to_string(),
            slave_id,
            baudrate,
        }
    }
}

#[cfg(feature = "serde")]
fn hex_address<S>(address: &u16, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("0x{address:04X}"))
}

#[cfg(feature = "serde")]
fn category_str<S>(category: &Category, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(category.as_str())
}

/// One decoded parameter, immutable once created.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParameterReading {
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex_address"))]
    pub address: u16,
    pub name: String,
    pub description: String,
    /// Combined raw integer (32-bit for register pairs).
    pub raw_value: u32,
    pub value: Value,
    pub unit: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "category_str"))]
    pub category: Category,
    pub timestamp: DateTime<Local>,
}

/// An ordered reading set captured together.
///
/// Readings keep the insertion order of the underlying raw reads;
/// grouping and sorting are presentation concerns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceSnapshot {
    pub timestamp: DateTime<Local>,
    pub device_info: DeviceInfo,
    pub parameters: Vec<ParameterReading>,
}

/// Parameter names the summary view looks for, in display order.
const SUMMARY_NAMES: &[&str] = &[
    "pv_voltage",
    "pv_current",
    "battery_voltage",
    "battery_current",
    "load_voltage",
    "load_current",
    "battery_soc",
    "battery_temp",
    "battery_status",
    "charging_status",
];

/// One line of the key-parameter summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub name: &'static str,
    pub value: Value,
    pub unit: String,
}

impl DeviceSnapshot {
    pub fn get_by_name(&self, name: &str) -> Option<&ParameterReading> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn get_by_category(&self, category: Category) -> Vec<&ParameterReading> {
        self.parameters
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Key well-known parameters, silently skipping any that were not read.
    pub fn summary(&self) -> Vec<SummaryEntry> {
        SUMMARY_NAMES
            .iter()
            .copied()
            .filter_map(|name| {
                self.get_by_name(name).map(|p| SummaryEntry {
                    name,
                    value: p.value.clone(),
                    unit: p.unit.clone(),
                })
            })
            .collect()
    }
}

/// Builds a snapshot from one batch of raw reads.
///
/// `reads` is the raw `(bank, address, value)` sequence in read order.
/// Known addresses decode through the register map; the high word of a
/// 32-bit pair is folded into its low-word parameter instead of showing
/// up on its own. Addresses outside the map are kept visible as
/// `unknown_0xXXXX` readings with the raw value passed through unscaled.
///
/// Pure with respect to its inputs (apart from the capture timestamp):
/// assembling the same reads twice yields identical readings.
pub fn assemble(
    map: &RegisterMap,
    device_info: DeviceInfo,
    reads: &[(Bank, u16, u16)],
) -> DeviceSnapshot {
    let timestamp = Local::now();
    let mut parameters = Vec::with_capacity(reads.len());

    for (bank, address, low) in reads {
        // Consumed by the low word of its 32-bit parameter.
        if map.high_word_of(*bank, *address).is_some() {
            continue;
        }
        match map.by_address(*bank, *address) {
            Some(def) => {
                let high = def.high_address.and_then(|high_addr| {
                    reads
                        .iter()
                        .find(|(b, a, _)| b == bank && *a == high_addr)
                        .map(|(_, _, v)| *v)
                });
                parameters.push(ParameterReading {
                    address: *address,
                    name: def.name.to_string(),
                    description: def.description.to_string(),
                    raw_value: combined_raw(def, *low, high),
                    value: decode(def, *low, high),
                    unit: def.unit.to_string(),
                    category: def.category,
                    timestamp,
                });
            }
            None => parameters.push(ParameterReading {
                address: *address,
                name: format!("unknown_0x{address:04x}"),
                description: format!("Unknown register 0x{address:04X}"),
                raw_value: *low as u32,
                value: Value::Number(*low as f64),
                unit: String::new(),
                category: Category::Unknown,
                timestamp,
            }),
        }
    }

    DeviceSnapshot {
        timestamp,
        device_info,
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> DeviceInfo {
        DeviceInfo::new("/dev/ttyUSB0", 1, 115200)
    }

    fn sample_reads() -> Vec<(Bank, u16, u16)> {
        vec![
            (Bank::Input, 0x3100, 1850),          // pv_voltage 18.50
            (Bank::Input, 0x3102, 0x1234),        // pv_power low
            (Bank::Input, 0x3103, 0x0001),        // pv_power high
            (Bank::Input, 0x3104, 2456),          // battery_voltage 24.56
            (Bank::Input, 0x311A, 87),            // battery_soc
            (Bank::Input, 0x3200, 0),             // battery_status Normal
            (Bank::Input, 0x3FFF, 42),            // unmapped
            (Bank::Holding, 0x9000, 4),           // battery_type LiFePO4
        ]
    }

    #[test]
    fn assemble_decodes_known_registers() {
        let snapshot = assemble(&RegisterMap::new(), info(), &sample_reads());

        let pv = snapshot.get_by_name("pv_voltage").unwrap();
        assert_eq!(pv.value, Value::Number(18.5));
        assert_eq!(pv.unit, "V");

        let power = snapshot.get_by_name("pv_power").unwrap();
        assert_eq!(power.raw_value, 70196);
        assert_eq!(power.value, Value::Number(701.96));

        let battery_type = snapshot.get_by_name("battery_type").unwrap();
        assert_eq!(battery_type.value, Value::Text("LiFePO4".into()));
        assert_eq!(battery_type.category, Category::Config);
    }

    #[test]
    fn high_word_is_folded_not_reported() {
        let snapshot = assemble(&RegisterMap::new(), info(), &sample_reads());
        assert!(snapshot.get_by_name("unknown_0x3103").is_none());
        // 8 reads, one folded into pv_power.
        assert_eq!(snapshot.parameters.len(), 7);
    }

    #[test]
    fn unknown_address_passes_through() {
        let snapshot = assemble(&RegisterMap::new(), info(), &sample_reads());
        let unknown = snapshot.get_by_name("unknown_0x3fff").unwrap();
        assert_eq!(unknown.raw_value, 42);
        assert_eq!(unknown.value, Value::Number(42.0));
        assert_eq!(unknown.category, Category::Unknown);
    }

    #[test]
    fn insertion_order_preserved() {
        let snapshot = assemble(&RegisterMap::new(), info(), &sample_reads());
        let names: Vec<&str> = snapshot.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "pv_voltage",
                "pv_power",
                "battery_voltage",
                "battery_soc",
                "battery_status",
                "unknown_0x3fff",
                "battery_type",
            ]
        );
    }

    #[test]
    fn summary_skips_missing_parameters() {
        let snapshot = assemble(&RegisterMap::new(), info(), &sample_reads());
        let summary = snapshot.summary();
        let names: Vec<&str> = summary.iter().map(|e| e.name).collect();
        // Only the present subset, in the fixed order.
        assert_eq!(
            names,
            vec!["pv_voltage", "battery_voltage", "battery_soc", "battery_status"]
        );
    }

    #[test]
    fn assembly_is_idempotent() {
        let map = RegisterMap::new();
        let reads = sample_reads();
        let a = assemble(&map, info(), &reads);
        let b = assemble(&map, info(), &reads);
        for (x, y) in a.parameters.iter().zip(&b.parameters) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.raw_value, y.raw_value);
            assert_eq!(x.value, y.value);
        }
    }
}
