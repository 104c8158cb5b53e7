//! Blocking serial client for the Tracer AN controller.
//!
//! Owns the serial connection lifecycle and the raw byte exchange; the
//! frame codec in [`crate::protocol`] stays pure. Every transaction
//! follows the same sequence the device expects: flush the input
//! buffer, write the request frame, sleep a fixed turnaround delay, then
//! read whatever the device produced. The fixed delay is a protocol
//! necessity for this slow RS-485-class device, not an optimization.
//!
//! The client is strictly one request/response pair at a time: no
//! pipelining, no internal locking, no retries. Callers that poll must
//! run each cycle to completion before starting the next.

use crate::protocol::{self, Response};
use crate::registers::Bank;
use crate::Error;
use std::io::{Read, Write};
use std::time::Duration;

/// Device turnaround before reading a read-request response.
pub const READ_TURNAROUND: Duration = Duration::from_millis(50);
/// Device turnaround before reading a write-request response.
pub const WRITE_TURNAROUND: Duration = Duration::from_millis(100);
/// Apply latency between a write and its verification read.
pub const VERIFY_DELAY: Duration = Duration::from_millis(500);
/// Settling time between consecutive writes in a batch.
pub const INTER_WRITE_DELAY: Duration = Duration::from_millis(100);

/// Register probed by [`Client::test_connection`]: battery voltage.
const TEST_REGISTER: u16 = 0x3104;

/// Outcome of a verified write.
///
/// A mismatch is reported alongside the successful acknowledgment, not
/// escalated to an error: the write itself succeeded at the protocol
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Verified,
    Mismatch { expected: u16, actual: u16 },
}

/// Blocking Modbus RTU client over a serial port.
///
/// Dropping the client closes the port, so release happens on every
/// exit path.
pub struct Client {
    port: Box<dyn serialport::SerialPort>,
    slave_id: u8,
    strict_crc: bool,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("slave_id", &self.slave_id)
            .field("strict_crc", &self.strict_crc)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Opens the serial port with the device's fixed 8N1 framing.
    pub fn open(path: &str, baud_rate: u32, slave_id: u8, timeout: Duration) -> Result<Self, Error> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|source| Error::Connect {
                port: path.to_string(),
                source,
            })?;
        log::debug!("connected to {path} at {baud_rate} baud (slave {slave_id})");
        Ok(Self {
            port,
            slave_id,
            strict_crc: false,
        })
    }

    /// Enables response CRC verification (off by default for
    /// compatibility with adapters that mangle the trailer).
    pub fn set_strict_crc(&mut self, strict: bool) {
        self.strict_crc = strict;
    }

    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    /// One full request/response cycle: flush, write, fixed turnaround
    /// delay, read what is available.
    fn transact(
        &mut self,
        frame: &[u8],
        turnaround: Duration,
        expected_len: usize,
    ) -> Result<Response, Error> {
        self.port.clear(serialport::ClearBuffer::Input)?;
        self.port.write_all(frame)?;
        self.port.flush()?;
        log::trace!("tx {frame:02X?}");

        std::thread::sleep(turnaround);

        let available = self.port.bytes_to_read()? as usize;
        let mut buffer = vec![0u8; available.max(expected_len)];
        let received = match self.port.read(&mut buffer) {
            Ok(0) => return Err(Error::NoResponse),
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::TimedOut => {
                return Err(Error::NoResponse)
            }
            Err(err) => return Err(err.into()),
        };
        buffer.truncate(received);
        log::trace!("rx {buffer:02X?}");

        if self.strict_crc {
            protocol::verify_crc(&buffer)?;
        }
        protocol::parse_response(&buffer)
    }

    /// Reads `count` registers starting at `addr` from the given bank.
    pub fn read_registers(&mut self, bank: Bank, addr: u16, count: u16) -> Result<Vec<u16>, Error> {
        let frame = protocol::build_read_request(self.slave_id, bank.function_code(), addr, count);
        let expected_len = 5 + count as usize * 2;
        let response = self
            .transact(&frame, READ_TURNAROUND, expected_len)
            .map_err(|err| {
                log::warn!("read of {count} register(s) at 0x{addr:04X} failed: {err}");
                err
            })?;
        match response {
            Response::Registers { values, .. } => Ok(values),
            Response::Exception { code, .. } => {
                log::warn!("device NACKed read at 0x{addr:04X}: {code}");
                Err(Error::Protocol(code))
            }
            Response::WriteAck { function, .. } => {
                Err(Error::UnexpectedResponse { function })
            }
            Response::Unrecognized { raw } => {
                log::warn!("unrecognized response to read at 0x{addr:04X}: {raw:02X?}");
                Err(Error::UnexpectedResponse {
                    function: raw.get(1).copied().unwrap_or(0),
                })
            }
        }
    }

    /// Reads a single register word.
    pub fn read_single(&mut self, bank: Bank, addr: u16) -> Result<u16, Error> {
        let values = self.read_registers(bank, addr, 1)?;
        values.first().copied().ok_or(Error::NoResponse)
    }

    /// Reads a block of consecutive registers as `(address, value)` pairs.
    pub fn read_block(
        &mut self,
        bank: Bank,
        start: u16,
        count: u16,
    ) -> Result<Vec<(u16, u16)>, Error> {
        let values = self.read_registers(bank, start, count)?;
        Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, value)| (start + i as u16, value))
            .collect())
    }

    fn expect_write_ack(&mut self, frame: &[u8], addr: u16) -> Result<(), Error> {
        let response = self
            .transact(frame, WRITE_TURNAROUND, 8)
            .map_err(|err| {
                log::warn!("write at 0x{addr:04X} failed: {err}");
                err
            })?;
        match response {
            // Any non-error response of sufficient length acknowledges the
            // write; echoed fields are not cross-checked (device quirk).
            Response::WriteAck { .. } | Response::Registers { .. } | Response::Unrecognized { .. } => {
                Ok(())
            }
            Response::Exception { code, .. } => {
                log::warn!("device NACKed write at 0x{addr:04X}: {code}");
                Err(Error::Protocol(code))
            }
        }
    }

    /// Writes a single holding register (function code 0x06).
    pub fn write_register(&mut self, addr: u16, value: u16) -> Result<(), Error> {
        let frame = protocol::build_write_single(self.slave_id, addr, value);
        self.expect_write_ack(&frame, addr)
    }

    /// Writes consecutive holding registers (function code 0x10).
    pub fn write_registers(&mut self, addr: u16, values: &[u16]) -> Result<(), Error> {
        let frame = protocol::build_write_multiple(self.slave_id, addr, values);
        self.expect_write_ack(&frame, addr)
    }

    /// Writes a register, waits out the device apply latency, then reads
    /// the value back.
    pub fn write_verified(&mut self, addr: u16, value: u16) -> Result<WriteOutcome, Error> {
        self.write_register(addr, value)?;
        std::thread::sleep(VERIFY_DELAY);
        let actual = self.read_single(Bank::Holding, addr)?;
        if actual == value {
            Ok(WriteOutcome::Verified)
        } else {
            log::warn!(
                "verification at 0x{addr:04X}: expected {value}, device reports {actual}"
            );
            Ok(WriteOutcome::Mismatch {
                expected: value,
                actual,
            })
        }
    }

    /// Probes the link by reading the battery voltage register.
    pub fn test_connection(&mut self) -> bool {
        self.read_single(Bank::Input, TEST_REGISTER).is_ok()
    }
}
