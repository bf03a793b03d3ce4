#![cfg_attr(docsrs, feature(doc_cfg))]
//! # zonetouch3_lib
//!
//! This crate provides a library for talking to a ZoneTouch 3 ducted
//! air-conditioning zone console over its proprietary binary TCP protocol.
//! It builds request frames, exchanges them synchronously with the console,
//! decodes the response snapshot into system metadata and per-zone state,
//! and encodes zone-control commands (power on/off, damper percentage).
//!
//! The protocol layer ([`protocol`], [`checksum`], [`hexfield`]) is pure:
//! it operates on caller-supplied buffers and performs no I/O. The
//! [`tcp`] module adds a blocking client that opens one TCP connection per
//! request/response exchange.
//!
//! ## Features
//!
//! This crate uses a feature-based system to keep dependencies minimal.
//!
//! - `default`: Enables `bin-dependencies`, which is intended for compiling
//!   the `zonetouch3` command-line tool.
//! - `tcp`: Enables the **synchronous** TCP client.
//! - `protocol_serde`: Enables `serde` support for the protocol data
//!   structures.
//! - `bin-dependencies`: Enables all features required by the `zonetouch3`
//!   binary executable.

/// Contains error types for the library.
mod error;
/// CRC-16/Modbus checksum used by the console's command frames.
pub mod checksum;
/// Byte-offset field extraction over hex-encoded response buffers.
pub mod hexfield;
/// Frame construction and response decoding for the ZoneTouch 3 console.
pub mod protocol;

pub use error::Error;

/// Synchronous TCP client for the ZoneTouch 3 console.
#[cfg_attr(docsrs, doc(cfg(feature = "tcp")))]
#[cfg(feature = "tcp")]
pub mod tcp;
