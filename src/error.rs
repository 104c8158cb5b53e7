use crate::protocol::ExceptionCode;

/// All error conditions surfaced by this crate.
///
/// Callers branch on the variant, never on the message text. The
/// communication variants mirror the failure taxonomy of the Tracer
/// serial link: an empty read after the device turnaround is
/// [`Error::NoResponse`] and may be retried by the caller, while a
/// device-reported Modbus exception ([`Error::Protocol`]) usually means
/// the request itself was invalid and retrying will not help.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The serial port could not be opened.
    #[cfg(feature = "serialport")]
    #[error("cannot open serial port {port}: {source}")]
    Connect {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Port control failure on an already open port.
    #[cfg(feature = "serialport")]
    #[error(transparent)]
    Serial(#[from] serialport::Error),

    /// I/O failure while talking to an already open port.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The device returned nothing within the configured timeout.
    #[error("no response from device")]
    NoResponse,

    /// Fewer than the minimum 5 bytes of a Modbus RTU response arrived.
    #[error("response frame too short ({len} bytes)")]
    ShortFrame { len: usize },

    /// Trailing CRC did not match (only raised in strict CRC mode).
    #[error("response CRC mismatch (expected {expected:#06x}, got {got:#06x})")]
    CrcMismatch { expected: u16, got: u16 },

    /// The device answered with a Modbus exception.
    #[error("device reported Modbus exception: {0}")]
    Protocol(ExceptionCode),

    /// A structurally valid frame that does not answer the request we sent.
    #[error("unexpected response (function code {function:#04x})")]
    UnexpectedResponse { function: u8 },

    /// The value given for a numeric parameter is not a number.
    #[error("'{input}' is not a number")]
    NotANumber { input: String },

    /// The value lies outside the parameter's declared bounds.
    #[error("value {value} out of range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    /// The label does not match any valid value of an enum parameter.
    #[error("'{label}' is not a valid value (expected one of: {expected})")]
    UnknownEnumLabel { label: String, expected: String },

    /// No register with this name exists in the map.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// The register exists but carries no write specification.
    #[error("parameter '{0}' is not writable")]
    NotWritable(String),
}
