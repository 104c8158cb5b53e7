//! A library for reading and configuring the EPEVER Tracer3210AN solar
//! charge controller over Modbus RTU.
//!
//! The crate is layered so that everything except the serial transport is
//! pure and testable on any machine:
//!
//! 1.  **Protocol**: CRC-16 engine, request frame builders, and the
//!     response parser. See [`protocol`].
//! 2.  **Register map**: the full catalog of telemetry and configuration
//!     registers with scaling, offsets, enum and bitfield decoding, and
//!     32-bit combination. See [`registers`].
//! 3.  **Snapshot and validation**: assembling raw register reads into
//!     decoded device snapshots, and checking values before they are
//!     written. See [`snapshot`] and [`validate`].
//! 4.  **Transport**: a blocking serial client that drives the protocol
//!     over an RS-485 adapter. See [`serial_client`] (requires the
//!     `serialport` feature).
//!
//! ## Quick Start
//!
//! ```no_run
//! use tracer_an_lib::registers::{self, RegisterMap};
//! use tracer_an_lib::serial_client::Client;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let map = RegisterMap::new();
//!     let mut client = Client::open("/dev/ttyUSB0", 115200, 1, Duration::from_secs(1))?;
//!
//!     let def = map.by_name("battery_voltage").unwrap();
//!     let raw = client.read_single(def.bank, def.address)?;
//!     let value = registers::decode(def, raw, None);
//!     println!("battery voltage: {value} {}", def.unit);
//!
//!     Ok(())
//! }
//! ```

mod error;
pub use error::Error;

pub mod protocol;
pub mod registers;
pub mod snapshot;
pub mod validate;

#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
#[cfg(feature = "serde")]
pub mod backup;

#[cfg_attr(docsrs, doc(cfg(feature = "serialport")))]
#[cfg(feature = "serialport")]
pub mod serial_client;
