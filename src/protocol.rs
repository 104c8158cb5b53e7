//! Modbus RTU frame codec for the Tracer AN charge controllers.
//!
//! This module carries the protocol correctness burden of the crate: it
//! builds the four request shapes the controller understands (read
//! holding/input registers, write single register, write multiple
//! registers), computes the CRC16 trailer and classifies responses into
//! register payloads, write acknowledgements and device exceptions.
//!
//! The codec is pure: it never touches the serial line. The
//! [`crate::serial_client`] module drives it.

use crate::Error;

/// Read holding registers (configuration, 0x9000 region).
pub const FC_READ_HOLDING: u8 = 0x03;
/// Read input registers (telemetry, 0x3100 region).
pub const FC_READ_INPUT: u8 = 0x04;
/// Write a single holding register.
pub const FC_WRITE_SINGLE: u8 = 0x06;
/// Write multiple holding registers.
pub const FC_WRITE_MULTIPLE: u8 = 0x10;

/// Lowest valid Modbus slave id on a shared bus.
pub const SLAVE_ID_MIN: u8 = 1;
/// Highest valid Modbus slave id on a shared bus.
pub const SLAVE_ID_MAX: u8 = 247;

/// Minimum length of any well-formed RTU response
/// (slave id + function code + one payload byte + CRC16).
const MIN_RESPONSE_LEN: usize = 5;

/// Computes the Modbus RTU CRC16 over `data`.
///
/// Init 0xFFFF, polynomial 0xA001 (reflected 0x8005), emitted low byte
/// first as it appears on the wire. The device validates this checksum,
/// so the algorithm is bit-exact against the reference table.
pub fn crc16(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0xFFFF;
    for byte in data {
        crc ^= *byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc.to_le_bytes()
}

fn push_crc(frame: &mut Vec<u8>) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc);
}

/// Builds a read request frame for `count` registers starting at `addr`.
///
/// `function` must be [`FC_READ_HOLDING`] or [`FC_READ_INPUT`]; all
/// multi-byte fields are big-endian except the trailing CRC.
pub fn build_read_request(slave_id: u8, function: u8, addr: u16, count: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8);
    frame.push(slave_id);
    frame.push(function);
    frame.extend_from_slice(&addr.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    push_crc(&mut frame);
    frame
}

/// Builds a write-single-register request (function code 0x06).
pub fn build_write_single(slave_id: u8, addr: u16, value: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8);
    frame.push(slave_id);
    frame.push(FC_WRITE_SINGLE);
    frame.extend_from_slice(&addr.to_be_bytes());
    frame.extend_from_slice(&value.to_be_bytes());
    push_crc(&mut frame);
    frame
}

/// Builds a write-multiple-registers request (function code 0x10).
pub fn build_write_multiple(slave_id: u8, addr: u16, values: &[u16]) -> Vec<u8> {
    let count = values.len() as u16;
    let byte_count = (values.len() * 2) as u8;
    let mut frame = Vec::with_capacity(9 + values.len() * 2);
    frame.push(slave_id);
    frame.push(FC_WRITE_MULTIPLE);
    frame.extend_from_slice(&addr.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    frame.push(byte_count);
    for value in values {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    push_crc(&mut frame);
    frame
}

/// A Modbus exception code as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    SlaveDeviceFailure,
    Acknowledge,
    SlaveDeviceBusy,
    MemoryParityError,
    Unknown(u8),
}

impl ExceptionCode {
    pub const fn from_u8(code: u8) -> Self {
        match code {
            1 => Self::IllegalFunction,
            2 => Self::IllegalDataAddress,
            3 => Self::IllegalDataValue,
            4 => Self::SlaveDeviceFailure,
            5 => Self::Acknowledge,
            6 => Self::SlaveDeviceBusy,
            8 => Self::MemoryParityError,
            other => Self::Unknown(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => 1,
            Self::IllegalDataAddress => 2,
            Self::IllegalDataValue => 3,
            Self::SlaveDeviceFailure => 4,
            Self::Acknowledge => 5,
            Self::SlaveDeviceBusy => 6,
            Self::MemoryParityError => 8,
            Self::Unknown(code) => code,
        }
    }
}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalFunction => write!(f, "Illegal Function"),
            Self::IllegalDataAddress => write!(f, "Illegal Data Address"),
            Self::IllegalDataValue => write!(f, "Illegal Data Value"),
            Self::SlaveDeviceFailure => write!(f, "Slave Device Failure"),
            Self::Acknowledge => write!(f, "Acknowledge"),
            Self::SlaveDeviceBusy => write!(f, "Slave Device Busy"),
            Self::MemoryParityError => write!(f, "Memory Parity Error"),
            Self::Unknown(code) => write!(f, "Unknown Error ({code})"),
        }
    }
}

/// A classified Modbus RTU response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Successful read (function 0x03/0x04) with the decoded register words.
    Registers {
        slave_id: u8,
        function: u8,
        values: Vec<u16>,
    },
    /// Successful write acknowledgement (function 0x06/0x10). The echoed
    /// address/value fields are not re-validated; the Tracer occasionally
    /// pads them and the write has already taken effect at this point.
    WriteAck { slave_id: u8, function: u8 },
    /// Device-reported exception (function code with bit 7 set).
    Exception {
        slave_id: u8,
        function: u8,
        code: ExceptionCode,
    },
    /// A frame that matches none of the shapes above. Preserved verbatim
    /// instead of failing hard so diagnostics keep the raw bytes.
    Unrecognized { raw: Vec<u8> },
}

/// Checks the trailing CRC16 of a received frame.
///
/// The default parse path does not call this: the original tooling
/// trusted transport framing, and some USB adapters mangle the trailer
/// while the payload is fine. Strict mode on the client opts in.
pub fn verify_crc(frame: &[u8]) -> Result<(), Error> {
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(Error::ShortFrame { len: frame.len() });
    }
    let (payload, trailer) = frame.split_at(frame.len() - 2);
    let expected = u16::from_le_bytes(crc16(payload));
    let got = u16::from_le_bytes([trailer[0], trailer[1]]);
    if expected != got {
        return Err(Error::CrcMismatch { expected, got });
    }
    Ok(())
}

/// Parses a raw RTU response frame.
///
/// Frames shorter than 5 bytes fail with [`Error::ShortFrame`]. Read
/// responses decode their register payload as big-endian u16 words; a
/// trailing odd byte is dropped rather than treated as corruption, which
/// matches the device's observed behavior on partial reads.
pub fn parse_response(frame: &[u8]) -> Result<Response, Error> {
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(Error::ShortFrame { len: frame.len() });
    }

    let slave_id = frame[0];
    let function = frame[1];

    if function & 0x80 != 0 {
        return Ok(Response::Exception {
            slave_id,
            function: function & 0x7F,
            code: ExceptionCode::from_u8(frame[2]),
        });
    }

    match function {
        FC_READ_HOLDING | FC_READ_INPUT => {
            let byte_count = frame[2] as usize;
            let end = (3 + byte_count).min(frame.len());
            let data = &frame[3..end];
            let values = data
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            Ok(Response::Registers {
                slave_id,
                function,
                values,
            })
        }
        FC_WRITE_SINGLE | FC_WRITE_MULTIPLE => Ok(Response::WriteAck { slave_id, function }),
        _ => Ok(Response::Unrecognized {
            raw: frame.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn crc16_fixed_literals() {
        // Read one input register at 0x3104 (battery voltage).
        assert_eq!(crc16(&[0x01, 0x04, 0x31, 0x04, 0x00, 0x01]), [0x7E, 0xF7]);
        // Canonical reference vector.
        assert_eq!(
            u16::from_le_bytes(crc16(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A])),
            0xCDC5
        );
    }

    #[test]
    fn build_read_request_frame() {
        let frame = build_read_request(1, FC_READ_INPUT, 0x3104, 1);
        assert_eq!(frame, vec![0x01, 0x04, 0x31, 0x04, 0x00, 0x01, 0x7E, 0xF7]);
    }

    #[test]
    fn build_write_single_frame() {
        let frame = build_write_single(1, 0x9001, 200);
        assert_eq!(frame, vec![0x01, 0x06, 0x90, 0x01, 0x00, 0xC8, 0xF4, 0x9C]);
    }

    #[test]
    fn build_write_multiple_frame() {
        let frame = build_write_multiple(1, 0x9006, &[0x05DC, 0x05C6]);
        assert_eq!(
            frame,
            vec![0x01, 0x10, 0x90, 0x06, 0x00, 0x02, 0x04, 0x05, 0xDC, 0x05, 0xC6, 0x9D, 0xB7]
        );
    }

    #[test]
    fn parse_read_response() {
        // Battery voltage 24.56 V: raw 2456 = 0x0998.
        let frame = [0x01, 0x04, 0x02, 0x09, 0x98, 0xBE, 0xCA];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::Registers { slave_id: 1, function: FC_READ_INPUT, values }) if values == vec![2456]
        );
    }

    #[test]
    fn parse_multi_register_response() {
        let frame = [0x01, 0x04, 0x04, 0x12, 0x34, 0x00, 0x01, 0x7E, 0xF2];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::Registers { values, .. }) if values == vec![0x1234, 0x0001]
        );
    }

    #[test]
    fn trailing_odd_byte_is_dropped() {
        // Byte count claims 3; the odd trailing byte must not corrupt the
        // decoded registers.
        let frame = [0x01, 0x04, 0x03, 0x09, 0x98, 0xFF, 0x00, 0x00];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::Registers { values, .. }) if values == vec![2456]
        );
    }

    #[test]
    fn parse_exception_response() {
        // Out-of-range address NACK: exception code 2.
        let frame = [0x01, 0x84, 0x02, 0xC2, 0xC1];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::Exception {
                slave_id: 1,
                function: 0x04,
                code: ExceptionCode::IllegalDataAddress,
            })
        );
    }

    #[test]
    fn parse_unknown_exception_code() {
        let frame = [0x01, 0x83, 0x63, 0x00, 0x00];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::Exception { code: ExceptionCode::Unknown(0x63), .. })
        );
    }

    #[test]
    fn parse_write_ack() {
        let frame = [0x01, 0x06, 0x90, 0x01, 0x00, 0xC8, 0xF4, 0x9C];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::WriteAck { slave_id: 1, function: FC_WRITE_SINGLE })
        );
    }

    #[test]
    fn short_frame_rejected() {
        assert_matches!(
            parse_response(&[0x01, 0x04, 0x02, 0x09]),
            Err(crate::Error::ShortFrame { len: 4 })
        );
    }

    #[test]
    fn unrecognized_function_kept_raw() {
        let frame = [0x01, 0x2B, 0x02, 0xB1, 0xE4];
        assert_matches!(
            parse_response(&frame),
            Ok(Response::Unrecognized { raw }) if raw == frame.to_vec()
        );
    }

    #[test]
    fn verify_crc_strict() {
        let good = [0x01, 0x04, 0x02, 0x09, 0x98, 0xBE, 0xCA];
        assert_matches!(verify_crc(&good), Ok(()));
        let bad = [0x01, 0x04, 0x02, 0x09, 0x98, 0xBE, 0xCB];
        assert_matches!(verify_crc(&bad), Err(crate::Error::CrcMismatch { .. }));
    }

    #[test]
    fn exception_message_text() {
        assert_eq!(ExceptionCode::from_u8(2).to_string(), "Illegal Data Address");
        assert_eq!(ExceptionCode::from_u8(99).to_string(), "Unknown Error (99)");
    }
}
