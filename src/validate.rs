//! Pre-flight validation for writes.
//!
//! Every write goes through [`validate_value`] before a single byte hits
//! the serial line: invalid input never reaches the device. The
//! cross-parameter [`validate_voltage_sequence`] check is advisory only;
//! some orderings are legitimately device-specific, so it returns
//! warnings instead of failing the batch.

use crate::registers::{encode, encode_label, DecodeKind, RegisterDef};
use crate::Error;

/// Validates raw user input against a parameter definition and converts
/// it to the raw register word.
///
/// Numeric parameters: parse ([`Error::NotANumber`]), check the declared
/// inclusive bounds ([`Error::OutOfRange`]), then apply the inverse
/// scale/offset transform rounded to the nearest integer. Enum
/// parameters: case-insensitive label match ([`Error::UnknownEnumLabel`]).
pub fn validate_value(def: &RegisterDef, input: &str) -> Result<u16, Error> {
    if !def.is_writable() {
        return Err(Error::NotWritable(def.name.to_string()));
    }
    match def.kind {
        DecodeKind::Enum(_) => encode_label(def, input.trim()),
        _ => {
            let value: f64 = input.trim().parse().map_err(|_| Error::NotANumber {
                input: input.to_string(),
            })?;
            encode(def, value)
        }
    }
}

/// One `a >= b` (or strict `a > b`) constraint of the charge staging.
struct Ordering {
    upper: &'static str,
    lower: &'static str,
    strict: bool,
}

const VOLTAGE_ORDERINGS: &[Ordering] = &[
    Ordering {
        upper: "high_voltage_disconnect",
        lower: "charging_limit_voltage",
        strict: true,
    },
    Ordering {
        upper: "charging_limit_voltage",
        lower: "equalization_voltage",
        strict: false,
    },
    Ordering {
        upper: "equalization_voltage",
        lower: "boost_voltage",
        strict: false,
    },
    Ordering {
        upper: "boost_voltage",
        lower: "float_voltage",
        strict: false,
    },
    Ordering {
        upper: "float_voltage",
        lower: "boost_reconnect_voltage",
        strict: true,
    },
    Ordering {
        upper: "low_voltage_reconnect",
        lower: "low_voltage_disconnect",
        strict: true,
    },
    Ordering {
        upper: "low_voltage_disconnect",
        lower: "discharging_limit_voltage",
        strict: false,
    },
    Ordering {
        upper: "under_voltage_recover",
        lower: "under_voltage_warning",
        strict: true,
    },
];

/// Checks the partial ordering between battery voltage thresholds written
/// together in one batch.
///
/// Only pairs where both parameters are present in `settings` are
/// checked. Returns human-readable warnings; the caller shows them and
/// proceeds anyway.
pub fn validate_voltage_sequence(settings: &[(&str, f64)]) -> Vec<String> {
    let get = |name: &str| {
        settings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    };

    let mut warnings = Vec::new();
    for ordering in VOLTAGE_ORDERINGS {
        if let (Some(upper), Some(lower)) = (get(ordering.upper), get(ordering.lower)) {
            let violated = if ordering.strict {
                upper <= lower
            } else {
                upper < lower
            };
            if violated {
                warnings.push(format!(
                    "{} ({upper} V) should be {} {} ({lower} V)",
                    ordering.upper,
                    if ordering.strict { "above" } else { "at or above" },
                    ordering.lower,
                ));
            }
        }
    }
    warnings
}

/// Recommended voltage thresholds applied together with a battery type.
#[derive(Debug, Clone, Copy)]
pub struct BatteryPreset {
    pub battery_type: &'static str,
    /// `(parameter name, value in volts)` pairs for a 12V system.
    pub settings: &'static [(&'static str, f64)],
}

/// Per-chemistry presets used by `write-config --battery-type`.
pub const BATTERY_TYPE_PRESETS: &[BatteryPreset] = &[
    BatteryPreset {
        battery_type: "Sealed",
        settings: &[
            ("equalization_voltage", 14.6),
            ("boost_voltage", 14.4),
            ("float_voltage", 13.8),
            ("boost_reconnect_voltage", 13.2),
            ("low_voltage_disconnect", 11.1),
        ],
    },
    BatteryPreset {
        battery_type: "GEL",
        settings: &[
            ("equalization_voltage", 14.2),
            ("boost_voltage", 14.2),
            ("float_voltage", 13.8),
            ("boost_reconnect_voltage", 13.2),
            ("low_voltage_disconnect", 11.1),
        ],
    },
    BatteryPreset {
        battery_type: "Flooded",
        settings: &[
            ("equalization_voltage", 14.8),
            ("boost_voltage", 14.6),
            ("float_voltage", 13.8),
            ("boost_reconnect_voltage", 13.2),
            ("low_voltage_disconnect", 11.1),
        ],
    },
    BatteryPreset {
        battery_type: "LiFePO4",
        settings: &[
            ("equalization_voltage", 14.4),
            ("boost_voltage", 14.4),
            ("float_voltage", 13.8),
            ("boost_reconnect_voltage", 13.2),
            ("low_voltage_disconnect", 11.0),
        ],
    },
];

/// Finds the preset for a battery type label, case-insensitively.
pub fn battery_type_preset(label: &str) -> Option<&'static BatteryPreset> {
    BATTERY_TYPE_PRESETS
        .iter()
        .find(|preset| preset.battery_type.eq_ignore_ascii_case(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::RegisterMap;
    use assert_matches::assert_matches;

    fn def(name: &str) -> &'static crate::registers::RegisterDef {
        RegisterMap::new().by_name(name).expect(name)
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_matches!(
            validate_value(def("battery_capacity"), "abc"),
            Err(Error::NotANumber { .. })
        );
    }

    #[test]
    fn rejects_out_of_range() {
        assert_matches!(
            validate_value(def("float_voltage"), "42.0"),
            Err(Error::OutOfRange { .. })
        );
    }

    #[test]
    fn accepts_valid_numeric_write() {
        assert_matches!(validate_value(def("battery_capacity"), "200"), Ok(200));
        assert_matches!(validate_value(def("float_voltage"), "13.8"), Ok(1380));
    }

    #[test]
    fn enum_labels_match_case_insensitively() {
        assert_matches!(validate_value(def("battery_type"), "GEL"), Ok(2));
        assert_matches!(validate_value(def("battery_type"), "gel"), Ok(2));
        assert_matches!(
            validate_value(def("battery_type"), "NiCd"),
            Err(Error::UnknownEnumLabel { .. })
        );
    }

    #[test]
    fn telemetry_is_not_writable() {
        assert_matches!(
            validate_value(def("pv_voltage"), "12.0"),
            Err(Error::NotWritable(_))
        );
    }

    #[test]
    fn consistent_sequence_yields_no_warnings() {
        let settings = [
            ("boost_voltage", 14.4),
            ("float_voltage", 13.8),
            ("low_voltage_disconnect", 11.1),
            ("low_voltage_reconnect", 12.6),
        ];
        assert!(validate_voltage_sequence(&settings).is_empty());
    }

    #[test]
    fn inverted_boost_float_is_flagged() {
        let settings = [("boost_voltage", 13.0), ("float_voltage", 13.8)];
        let warnings = validate_voltage_sequence(&settings);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("boost_voltage"));
    }

    #[test]
    fn unrelated_pairs_are_not_checked() {
        // Only one side of each ordering present.
        let settings = [("float_voltage", 13.8)];
        assert!(validate_voltage_sequence(&settings).is_empty());
    }

    #[test]
    fn presets_resolve_by_label() {
        let preset = battery_type_preset("lifepo4").unwrap();
        assert_eq!(preset.battery_type, "LiFePO4");
        assert!(battery_type_preset("Plutonium").is_none());
    }

    #[test]
    fn presets_pass_their_own_sequence_check() {
        for preset in BATTERY_TYPE_PRESETS {
            let settings: Vec<(&str, f64)> = preset.settings.to_vec();
            assert!(
                validate_voltage_sequence(&settings).is_empty(),
                "{} preset inconsistent",
                preset.battery_type
            );
        }
    }
}
