//! The fixed register map of the Tracer AN controller family.
//!
//! Input registers (0x3100-0x331E) carry real-time telemetry, status
//! bitfields and daily/lifetime statistics; holding registers
//! (0x9000-0x900E) carry the writable battery configuration. Every entry
//! declares how its raw 16-bit content becomes a typed value: a linear
//! scale/offset transform, an enum lookup or a status bitfield. 32-bit
//! quantities (powers, energies) span two registers combined as
//! `(high << 16) | low`.
//!
//! The map is a static table wrapped in an immutable [`RegisterMap`]
//! lookup; decoding has no hidden state, so the same raw words always
//! produce the same values.

use crate::Error;

/// The two register banks of the device.
///
/// An address is only meaningful together with its bank: 0x3100 in the
/// input bank is PV voltage, while holding addresses live in a disjoint
/// 0x9000 region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Read-only telemetry, function code 0x04.
    Input,
    /// Read-write configuration, function code 0x03.
    Holding,
}

impl Bank {
    pub const fn function_code(self) -> u8 {
        match self {
            Bank::Input => crate::protocol::FC_READ_INPUT,
            Bank::Holding => crate::protocol::FC_READ_HOLDING,
        }
    }
}

/// Display/grouping category of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pv,
    Battery,
    Load,
    System,
    Status,
    Statistics,
    Config,
    Unknown,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Pv => "pv",
            Category::Battery => "battery",
            Category::Load => "load",
            Category::System => "system",
            Category::Status => "status",
            Category::Statistics => "statistics",
            Category::Config => "config",
            Category::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pv" => Some(Category::Pv),
            "battery" => Some(Category::Battery),
            "load" => Some(Category::Load),
            "system" => Some(Category::System),
            "status" => Some(Category::Status),
            "statistics" => Some(Category::Statistics),
            "config" => Some(Category::Config),
            "unknown" => Some(Category::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a raw register word becomes a typed value. Exactly one kind per
/// definition.
#[derive(Debug, Clone, Copy)]
pub enum DecodeKind {
    /// `raw * scale (+ offset)`, rounded to 2 decimals.
    Linear,
    /// Raw integer to label lookup.
    Enum(&'static [(u16, &'static str)]),
    /// Each set bit signals an independent condition; bit position to label.
    Bitfield(&'static [(u8, &'static str)]),
}

/// Bounds and caveats for a writable parameter.
#[derive(Debug, Clone, Copy)]
pub struct WriteSpec {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Shown to the operator before the write is confirmed.
    pub warning: Option<&'static str>,
}

/// Static metadata for one named parameter of the device map.
#[derive(Debug, Clone, Copy)]
pub struct RegisterDef {
    pub name: &'static str,
    pub description: &'static str,
    pub address: u16,
    pub bank: Bank,
    /// Multiplicative factor applied to the raw integer.
    pub scale: f64,
    /// Additive term applied after scaling (Kelvin to Celsius).
    pub offset: Option<f64>,
    /// Present on 32-bit values: the partner register holding the high word.
    pub high_address: Option<u16>,
    pub kind: DecodeKind,
    pub category: Category,
    pub unit: &'static str,
    pub write: Option<WriteSpec>,
}

impl RegisterDef {
    const fn telemetry(
        name: &'static str,
        description: &'static str,
        address: u16,
        scale: f64,
        unit: &'static str,
        category: Category,
    ) -> Self {
        Self {
            name,
            description,
            address,
            bank: Bank::Input,
            scale,
            offset: None,
            high_address: None,
            kind: DecodeKind::Linear,
            category,
            unit,
            write: None,
        }
    }

    const fn with_high(mut self, high_address: u16) -> Self {
        self.high_address = Some(high_address);
        self
    }

    const fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    const fn bitfield(
        name: &'static str,
        description: &'static str,
        address: u16,
        bits: &'static [(u8, &'static str)],
    ) -> Self {
        Self {
            name,
            description,
            address,
            bank: Bank::Input,
            scale: 1.0,
            offset: None,
            high_address: None,
            kind: DecodeKind::Bitfield(bits),
            category: Category::Status,
            unit: "",
            write: None,
        }
    }

    const fn config(
        name: &'static str,
        description: &'static str,
        address: u16,
        scale: f64,
        unit: &'static str,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            name,
            description,
            address,
            bank: Bank::Holding,
            scale,
            offset: None,
            high_address: None,
            kind: DecodeKind::Linear,
            category: Category::Config,
            unit,
            write: Some(WriteSpec {
                min: Some(min),
                max: Some(max),
                warning: None,
            }),
        }
    }

    const fn with_warning(mut self, warning: &'static str) -> Self {
        self.write = match self.write {
            Some(spec) => Some(WriteSpec {
                min: spec.min,
                max: spec.max,
                warning: Some(warning),
            }),
            None => Some(WriteSpec {
                min: None,
                max: None,
                warning: Some(warning),
            }),
        };
        self
    }

    /// Whether this parameter accepts writes.
    pub fn is_writable(&self) -> bool {
        self.bank == Bank::Holding && self.write.is_some()
    }

    /// Labels of an enum parameter, in table order.
    pub fn enum_labels(&self) -> Option<Vec<&'static str>> {
        match self.kind {
            DecodeKind::Enum(table) => Some(table.iter().map(|(_, label)| *label).collect()),
            _ => None,
        }
    }
}

/// Battery chemistry selector at 0x9000.
pub const BATTERY_TYPES: &[(u16, &str)] = &[
    (0, "User Defined"),
    (1, "Sealed"),
    (2, "GEL"),
    (3, "Flooded"),
    (4, "LiFePO4"),
];

/// Battery condition bits at 0x3200.
pub const BATTERY_STATUS_BITS: &[(u8, &str)] = &[
    (0, "Normal"),
    (1, "Over Temperature"),
    (2, "Low Temperature"),
    (3, "Over Voltage"),
    (4, "Under Voltage"),
    (5, "Over Current"),
    (6, "Over Discharge"),
    (7, "Battery Inner Resistance Abnormal"),
    (8, "Wrong Identification for Rated Voltage"),
];

/// Charging equipment bits at 0x3201.
pub const CHARGING_STATUS_BITS: &[(u8, &str)] = &[
    (0, "Charging Deactivated"),
    (1, "Charging Activated"),
    (2, "MPPT Charging Mode"),
    (3, "Equalizing Charging Mode"),
    (4, "Boost Charging Mode"),
    (5, "Floating Charging Mode"),
    (6, "Current Limiting"),
];

/// Load/discharging equipment bits at 0x3202.
pub const LOAD_STATUS_BITS: &[(u8, &str)] = &[
    (0, "Load Disconnected"),
    (1, "Load Connected"),
    (2, "Output Over Voltage"),
    (3, "Boost Over Voltage"),
    (4, "High Voltage Side Short Circuit"),
    (5, "Input Over Voltage"),
    (6, "Output Over Current"),
    (7, "Input Over Current"),
];

const KELVIN_OFFSET: f64 = -273.15;

// Voltage thresholds are stored as centivolts; the device accepts the
// 12V-system window (automatically doubled for 24V systems).
const VOLT_MIN: f64 = 9.0;
const VOLT_MAX: f64 = 17.0;

/// The fixed Tracer AN register table.
pub const REGISTERS: &[RegisterDef] = &[
    // Real-time telemetry.
    RegisterDef::telemetry("pv_voltage", "PV Voltage", 0x3100, 0.01, "V", Category::Pv),
    RegisterDef::telemetry("pv_current", "PV Current", 0x3101, 0.01, "A", Category::Pv),
    RegisterDef::telemetry("pv_power", "PV Power", 0x3102, 0.01, "W", Category::Pv)
        .with_high(0x3103),
    RegisterDef::telemetry(
        "battery_voltage",
        "Battery Voltage",
        0x3104,
        0.01,
        "V",
        Category::Battery,
    ),
    RegisterDef::telemetry(
        "battery_current",
        "Battery Current",
        0x3105,
        0.01,
        "A",
        Category::Battery,
    ),
    RegisterDef::telemetry(
        "battery_power",
        "Battery Power",
        0x3106,
        0.01,
        "W",
        Category::Battery,
    )
    .with_high(0x3107),
    RegisterDef::telemetry("load_power", "Load Power", 0x310A, 0.01, "W", Category::Load)
        .with_high(0x310B),
    RegisterDef::telemetry(
        "load_voltage",
        "Load Voltage",
        0x310C,
        0.01,
        "V",
        Category::Load,
    ),
    RegisterDef::telemetry(
        "load_current",
        "Load Current",
        0x310D,
        0.01,
        "A",
        Category::Load,
    ),
    RegisterDef::telemetry(
        "battery_temp",
        "Battery Temperature",
        0x3110,
        0.01,
        "°C",
        Category::Battery,
    )
    .with_offset(KELVIN_OFFSET),
    RegisterDef::telemetry(
        "device_temp",
        "Device Temperature",
        0x3111,
        0.01,
        "°C",
        Category::System,
    )
    .with_offset(KELVIN_OFFSET),
    RegisterDef::telemetry(
        "heat_sink_temp",
        "Heat Sink Temperature",
        0x3113,
        0.01,
        "°C",
        Category::System,
    )
    .with_offset(KELVIN_OFFSET),
    RegisterDef::telemetry(
        "battery_soc",
        "Battery State of Charge",
        0x311A,
        1.0,
        "%",
        Category::Battery,
    ),
    // Status bitfields.
    RegisterDef::bitfield(
        "battery_status",
        "Battery Status",
        0x3200,
        BATTERY_STATUS_BITS,
    ),
    RegisterDef::bitfield(
        "charging_status",
        "Charging Status",
        0x3201,
        CHARGING_STATUS_BITS,
    ),
    RegisterDef::bitfield("load_status", "Load Status", 0x3202, LOAD_STATUS_BITS),
    // Daily and lifetime statistics.
    RegisterDef::telemetry(
        "max_pv_voltage_today",
        "Max PV Voltage Today",
        0x3300,
        0.01,
        "V",
        Category::Statistics,
    ),
    RegisterDef::telemetry(
        "min_pv_voltage_today",
        "Min PV Voltage Today",
        0x3301,
        0.01,
        "V",
        Category::Statistics,
    ),
    RegisterDef::telemetry(
        "max_battery_voltage_today",
        "Max Battery Voltage Today",
        0x3302,
        0.01,
        "V",
        Category::Statistics,
    ),
    RegisterDef::telemetry(
        "min_battery_voltage_today",
        "Min Battery Voltage Today",
        0x3303,
        0.01,
        "V",
        Category::Statistics,
    ),
    RegisterDef::telemetry(
        "energy_consumed_today",
        "Energy Consumed Today",
        0x3304,
        0.01,
        "kWh",
        Category::Statistics,
    )
    .with_high(0x3305),
    RegisterDef::telemetry(
        "energy_generated_today",
        "Energy Generated Today",
        0x3306,
        0.01,
        "kWh",
        Category::Statistics,
    )
    .with_high(0x3307),
    RegisterDef::telemetry(
        "energy_generated_total",
        "Total Energy Generated",
        0x3308,
        0.01,
        "kWh",
        Category::Statistics,
    )
    .with_high(0x3309),
    RegisterDef::telemetry(
        "operating_days",
        "Operating Days",
        0x330A,
        1.0,
        "days",
        Category::Statistics,
    ),
    RegisterDef::telemetry(
        "battery_full_charges",
        "Battery Full Charges",
        0x330C,
        1.0,
        "cycles",
        Category::Statistics,
    ),
    // Writable configuration.
    RegisterDef {
        name: "battery_type",
        description: "Battery Type",
        address: 0x9000,
        bank: Bank::Holding,
        scale: 1.0,
        offset: None,
        high_address: None,
        kind: DecodeKind::Enum(BATTERY_TYPES),
        category: Category::Config,
        unit: "",
        write: Some(WriteSpec {
            min: None,
            max: None,
            warning: Some(
                "Changing the battery type changes the whole charging profile. \
                 Make sure it matches the connected battery chemistry.",
            ),
        }),
    },
    RegisterDef::config(
        "battery_capacity",
        "Battery Capacity",
        0x9001,
        1.0,
        "Ah",
        1.0,
        9999.0,
    ),
    RegisterDef::config(
        "temp_compensation",
        "Temperature Compensation Coefficient",
        0x9002,
        0.01,
        "mV/°C/2V",
        0.0,
        9.0,
    ),
    RegisterDef::config(
        "high_voltage_disconnect",
        "High Voltage Disconnect",
        0x9003,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    )
    .with_warning("Protects against over-voltage. Must stay above the charging limit voltage."),
    RegisterDef::config(
        "charging_limit_voltage",
        "Charging Limit Voltage",
        0x9004,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "over_voltage_reconnect",
        "Over Voltage Reconnect",
        0x9005,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "equalization_voltage",
        "Equalization Voltage",
        0x9006,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    )
    .with_warning("Equalization can damage GEL and lithium batteries. Check the battery manual."),
    RegisterDef::config(
        "boost_voltage",
        "Boost Voltage",
        0x9007,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "float_voltage",
        "Float Voltage",
        0x9008,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "boost_reconnect_voltage",
        "Boost Reconnect Voltage",
        0x9009,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "low_voltage_reconnect",
        "Low Voltage Reconnect",
        0x900A,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "under_voltage_recover",
        "Under Voltage Recover",
        0x900B,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "under_voltage_warning",
        "Under Voltage Warning",
        0x900C,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
    RegisterDef::config(
        "low_voltage_disconnect",
        "Low Voltage Disconnect",
        0x900D,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    )
    .with_warning("Setting this too low allows deep discharge and shortens battery life."),
    RegisterDef::config(
        "discharging_limit_voltage",
        "Discharging Limit Voltage",
        0x900E,
        0.01,
        "V",
        VOLT_MIN,
        VOLT_MAX,
    ),
];

/// A contiguous register block the device answers in one read request.
#[derive(Debug, Clone, Copy)]
pub struct ReadBlock {
    pub bank: Bank,
    pub start: u16,
    pub count: u16,
    pub description: &'static str,
}

/// Discontiguous blocks covering the whole map with seven requests.
pub const READ_BLOCKS: &[ReadBlock] = &[
    ReadBlock {
        bank: Bank::Input,
        start: 0x3100,
        count: 16,
        description: "Core real-time data (PV, battery, load)",
    },
    ReadBlock {
        bank: Bank::Input,
        start: 0x3110,
        count: 16,
        description: "Extended real-time data (temperatures, SOC)",
    },
    ReadBlock {
        bank: Bank::Input,
        start: 0x3200,
        count: 3,
        description: "System status registers",
    },
    ReadBlock {
        bank: Bank::Input,
        start: 0x3300,
        count: 16,
        description: "Daily statistics",
    },
    ReadBlock {
        bank: Bank::Input,
        start: 0x3310,
        count: 15,
        description: "Extended statistics",
    },
    ReadBlock {
        bank: Bank::Holding,
        start: 0x9000,
        count: 8,
        description: "Core voltage configuration",
    },
    ReadBlock {
        bank: Bank::Holding,
        start: 0x9008,
        count: 8,
        description: "Extended configuration",
    },
];

/// A decoded register value: a scaled number or a human label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Combines the raw word(s) of a definition into one integer.
///
/// For 32-bit parameters `high` is the content of `high_address`; a
/// missing high word degrades to the low word alone.
pub fn combined_raw(def: &RegisterDef, low: u16, high: Option<u16>) -> u32 {
    match (def.high_address, high) {
        (Some(_), Some(high)) => ((high as u32) << 16) | low as u32,
        _ => low as u32,
    }
}

/// Decodes a raw register word (pair) into a typed value.
pub fn decode(def: &RegisterDef, low: u16, high: Option<u16>) -> Value {
    let raw = combined_raw(def, low, high);
    match def.kind {
        DecodeKind::Enum(table) => {
            let label = table
                .iter()
                .find(|(value, _)| *value as u32 == raw)
                .map(|(_, label)| (*label).to_string())
                .unwrap_or_else(|| format!("Unknown ({raw})"));
            Value::Text(label)
        }
        DecodeKind::Bitfield(bits) => {
            let labels: Vec<&str> = bits
                .iter()
                .filter(|(bit, _)| raw & (1 << bit) != 0)
                .map(|(_, label)| *label)
                .collect();
            if labels.is_empty() {
                Value::Text("Normal".to_string())
            } else {
                Value::Text(labels.join(", "))
            }
        }
        DecodeKind::Linear => {
            let mut value = raw as f64 * def.scale;
            if let Some(offset) = def.offset {
                value += offset;
            }
            Value::Number(round2(value))
        }
    }
}

/// Converts a user-facing numeric value back to a raw register word.
///
/// Inverse of the linear transform, checked against the declared bounds
/// before any conversion. Enum parameters go through
/// [`encode_label`] instead.
pub fn encode(def: &RegisterDef, value: f64) -> Result<u16, Error> {
    let spec = def
        .write
        .as_ref()
        .ok_or_else(|| Error::NotWritable(def.name.to_string()))?;
    let min = spec.min.unwrap_or(f64::NEG_INFINITY);
    let max = spec.max.unwrap_or(f64::INFINITY);
    if value < min || value > max {
        return Err(Error::OutOfRange { value, min, max });
    }
    let raw = ((value - def.offset.unwrap_or(0.0)) / def.scale).round();
    if !(0.0..=u16::MAX as f64).contains(&raw) {
        return Err(Error::OutOfRange { value, min, max });
    }
    Ok(raw as u16)
}

/// Matches a label against an enum parameter's table, case-insensitively.
pub fn encode_label(def: &RegisterDef, label: &str) -> Result<u16, Error> {
    let table = match def.kind {
        DecodeKind::Enum(table) => table,
        _ => return Err(Error::NotWritable(def.name.to_string())),
    };
    table
        .iter()
        .find(|(_, candidate)| candidate.eq_ignore_ascii_case(label))
        .map(|(value, _)| *value)
        .ok_or_else(|| Error::UnknownEnumLabel {
            label: label.to_string(),
            expected: table
                .iter()
                .map(|(_, l)| *l)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Immutable lookup over the static register table.
///
/// Constructed once at startup and passed by reference into whatever
/// needs to resolve names or addresses; there is no process-wide mutable
/// state behind it.
#[derive(Debug, Clone, Copy)]
pub struct RegisterMap {
    defs: &'static [RegisterDef],
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterMap {
    pub fn new() -> Self {
        Self { defs: REGISTERS }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static RegisterDef> {
        self.defs.iter()
    }

    pub fn by_name(&self, name: &str) -> Option<&'static RegisterDef> {
        self.defs.iter().find(|def| def.name == name)
    }

    pub fn by_address(&self, bank: Bank, address: u16) -> Option<&'static RegisterDef> {
        self.defs
            .iter()
            .find(|def| def.bank == bank && def.address == address)
    }

    /// The definition whose 32-bit high word lives at `address`, if any.
    pub fn high_word_of(&self, bank: Bank, address: u16) -> Option<&'static RegisterDef> {
        self.defs
            .iter()
            .find(|def| def.bank == bank && def.high_address == Some(address))
    }

    pub fn writable(&self) -> impl Iterator<Item = &'static RegisterDef> {
        self.defs.iter().filter(|def| def.is_writable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn def(name: &str) -> &'static RegisterDef {
        RegisterMap::new().by_name(name).expect(name)
    }

    #[test]
    fn addresses_and_names_are_unique() {
        for (i, a) in REGISTERS.iter().enumerate() {
            for b in &REGISTERS[i + 1..] {
                assert_ne!(a.name, b.name);
                assert!(
                    a.bank != b.bank || a.address != b.address,
                    "duplicate address {:#06x} ({} / {})",
                    a.address,
                    a.name,
                    b.name
                );
            }
        }
    }

    #[test]
    fn linear_scale() {
        let value = decode(def("battery_voltage"), 2456, None);
        assert_eq!(value, Value::Number(24.56));
    }

    #[test]
    fn kelvin_offset() {
        // 300.00 K - 273.15 = 26.85 °C
        assert_eq!(decode(def("battery_temp"), 30000, None), Value::Number(26.85));
        // 20.00 K - 273.15 = -253.15 °C
        assert_eq!(decode(def("battery_temp"), 2000, None), Value::Number(-253.15));
    }

    #[test]
    fn thirty_two_bit_combine() {
        assert_eq!(combined_raw(def("pv_power"), 0x1234, Some(0x0001)), 70196);
        assert_eq!(
            decode(def("pv_power"), 0x1234, Some(0x0001)),
            Value::Number(701.96)
        );
        // Missing high word degrades to the low word.
        assert_eq!(combined_raw(def("pv_power"), 0x1234, None), 0x1234);
    }

    #[test]
    fn bitfield_decode() {
        assert_eq!(
            decode(def("battery_status"), 0, None),
            Value::Text("Normal".into())
        );
        // Bits 0 and 2 set, labels joined in ascending bit order.
        assert_eq!(
            decode(def("battery_status"), 0b0000_0101, None),
            Value::Text("Normal, Low Temperature".into())
        );
        assert_eq!(
            decode(def("charging_status"), 0b0000_0110, None),
            Value::Text("Charging Activated, MPPT Charging Mode".into())
        );
    }

    #[test]
    fn enum_decode() {
        assert_eq!(
            decode(def("battery_type"), 4, None),
            Value::Text("LiFePO4".into())
        );
        assert_eq!(
            decode(def("battery_type"), 99, None),
            Value::Text("Unknown (99)".into())
        );
    }

    #[test]
    fn encode_inverse_scale() {
        assert_matches!(encode(def("float_voltage"), 13.8), Ok(1380));
        assert_matches!(encode(def("battery_capacity"), 200.0), Ok(200));
    }

    #[test]
    fn encode_bounds() {
        assert_matches!(
            encode(def("float_voltage"), 20.0),
            Err(Error::OutOfRange { .. })
        );
        assert_matches!(
            encode(def("battery_capacity"), 0.0),
            Err(Error::OutOfRange { .. })
        );
    }

    #[test]
    fn encode_not_writable() {
        assert_matches!(
            encode(def("battery_voltage"), 12.0),
            Err(Error::NotWritable(_))
        );
    }

    #[test]
    fn encode_enum_label() {
        assert_matches!(encode_label(def("battery_type"), "LiFePO4"), Ok(4));
        assert_matches!(encode_label(def("battery_type"), "lifepo4"), Ok(4));
        assert_matches!(
            encode_label(def("battery_type"), "Plutonium"),
            Err(Error::UnknownEnumLabel { .. })
        );
    }

    #[test]
    fn lookup_by_address_and_bank() {
        let map = RegisterMap::new();
        assert_eq!(map.by_address(Bank::Input, 0x3104).unwrap().name, "battery_voltage");
        assert!(map.by_address(Bank::Holding, 0x3104).is_none());
        assert_eq!(
            map.high_word_of(Bank::Input, 0x3103).unwrap().name,
            "pv_power"
        );
    }

    #[test]
    fn writable_subset_is_holding_only() {
        for def in RegisterMap::new().writable() {
            assert_eq!(def.bank, Bank::Holding);
        }
    }
}
