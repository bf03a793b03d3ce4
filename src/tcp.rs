//! Synchronous TCP client for the ZoneTouch 3 console.
//!
//! Every exchange opens a fresh blocking connection, writes one fully
//! formed frame, performs a single bounded read and closes the socket.
//! There is no pooling, no retry and no caching here: callers own the
//! [`Snapshot`] lifetime and any refresh or backoff policy.

use crate::protocol::*;
use crate::{hexfield, Error};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Applied to connect, read and write unless overridden with
/// [`ZoneTouch3::set_timeout`]. The reference behavior had no timeout at
/// all; a bounded exchange is strictly safer against a wedged console.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const RX_BUFFER_LENGTH: usize = 1024;

/// Which retrieval codec the client uses for per-zone state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVariant {
    /// Canonical: one request-all-information exchange, 22-byte zone
    /// records inside the snapshot.
    #[default]
    Snapshot,
    /// Older firmware: dedicated zone-state request with 8-byte records
    /// and a bit-packed percentage.
    PerZone,
}

/// A client for one console endpoint. The endpoint is fixed for the
/// lifetime of the instance.
#[derive(Debug)]
pub struct ZoneTouch3 {
    endpoint: SocketAddr,
    timeout: Duration,
    variant: ProtocolVariant,
}

impl ZoneTouch3 {
    /// Resolves `address:port` once and keeps the first resulting socket
    /// address for all subsequent exchanges.
    pub fn new(address: &str, port: u16) -> Result<Self, Error> {
        let endpoint = (address, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                Error::Transport(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no address found for '{address}:{port}'"),
                ))
            })?;
        Ok(Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            variant: ProtocolVariant::default(),
        })
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_variant(&mut self, variant: ProtocolVariant) {
        self.variant = variant;
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Performs one request/response exchange: connect, write the frame,
    /// one bounded read, disconnect. Returns whatever bytes arrived as
    /// upper-case hex; the response is not validated (the caller trusts
    /// the console), though a missing preamble is logged.
    pub fn exchange(&self, frame: &[u8]) -> Result<String, Error> {
        let mut stream = TcpStream::connect_timeout(&self.endpoint, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        log::trace!("send_bytes: {frame:02X?}");
        stream.write_all(frame)?;

        let mut rx_buffer = [0u8; RX_BUFFER_LENGTH];
        let received = stream.read(&mut rx_buffer)?;
        log::trace!("receive_bytes: {:02X?}", &rx_buffer[..received]);

        let response = hexfield::encode_upper(&rx_buffer[..received]);
        if !response.starts_with("555555") {
            // Observed preambles differ in length between firmware
            // variants, so the client stays permissive and only warns.
            log::warn!(
                "Response from {} does not start with the 55 55 55 preamble",
                self.endpoint
            );
        }
        Ok(response)
    }

    /// Fetches a fresh snapshot from the console. One network exchange;
    /// the returned value is caller-owned and never refreshed implicitly.
    pub fn fetch_snapshot(&self) -> Result<Snapshot, Error> {
        Ok(Snapshot::new(self.exchange(&AllInformation::request())?))
    }

    /// Fetches and decodes the system metadata block.
    pub fn get_system_info(&self) -> Result<SystemInfo, Error> {
        SystemInfo::decode(&self.fetch_snapshot()?)
    }

    /// Full status of a single zone. Always uses the snapshot codec; zone
    /// names are not carried by the legacy per-zone response.
    pub fn get_zone(&self, zone: u8) -> Result<ZoneStatus, Error> {
        ZoneStatus::decode(&self.fetch_snapshot()?, zone)
    }

    /// Status of zones `0..count` decoded from a single snapshot.
    pub fn get_zones(&self, count: u8) -> Result<Vec<ZoneStatus>, Error> {
        let snapshot = self.fetch_snapshot()?;
        (0..count)
            .map(|zone| ZoneStatus::decode(&snapshot, zone))
            .collect()
    }

    /// Power state of one zone via the configured retrieval codec.
    pub fn get_zone_power(&self, zone: u8) -> Result<ZonePower, Error> {
        match self.variant {
            ProtocolVariant::Snapshot => self.fetch_snapshot()?.zone_power(zone),
            ProtocolVariant::PerZone => {
                legacy::zone_power(&self.exchange(&legacy::ZoneState::request())?, zone)
            }
        }
    }

    /// Damper percentage of one zone via the configured retrieval codec.
    pub fn get_zone_percentage(&self, zone: u8) -> Result<u8, Error> {
        match self.variant {
            ProtocolVariant::Snapshot => self.fetch_snapshot()?.zone_percentage(zone),
            ProtocolVariant::PerZone => {
                legacy::zone_percentage(&self.exchange(&legacy::ZoneState::request())?, zone)
            }
        }
    }

    /// Turns a zone on or off. The console's acknowledgment is read and
    /// discarded.
    pub fn set_zone_power(&self, zone: u8, on: bool) -> Result<(), Error> {
        let command = if on {
            PowerCommand::On
        } else {
            PowerCommand::Off
        };
        let frame = ZoneUpdate::request(zone, command, POWER_TOGGLE_PERCENTAGE)?;
        self.exchange(&frame)?;
        Ok(())
    }

    /// Sets a zone's damper percentage (0-100).
    pub fn set_zone_percentage(&self, zone: u8, percentage: u8) -> Result<(), Error> {
        let frame = ZoneUpdate::request(zone, PowerCommand::SetPercentage, percentage)?;
        self.exchange(&frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serves exactly one exchange on localhost, returning the request
    /// bytes the server saw.
    fn one_shot_server(response: Vec<u8>) -> (u16, std::thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![0u8; 64];
            let received = stream.read(&mut request).unwrap();
            request.truncate(received);
            stream.write_all(&response).unwrap();
            request
        });
        (port, handle)
    }

    #[test]
    fn exchange_hex_encodes_response() {
        let (port, server) = one_shot_server(vec![0x55, 0x55, 0x55, 0xAA, 0xB0, 0x01]);
        let client = ZoneTouch3::new("127.0.0.1", port).unwrap();
        let response = client.exchange(&AllInformation::request()).unwrap();
        assert_eq!(response, "555555AAB001");
        assert_eq!(server.join().unwrap(), AllInformation::request());
    }

    #[test]
    fn fetch_snapshot_decodes_zone_state() {
        let mut bytes = vec![0u8; 200];
        bytes[..4].copy_from_slice(&[0x55, 0x55, 0x55, 0xAA]);
        bytes[123] = 0x40;
        bytes[124] = 75;
        bytes[133..139].copy_from_slice(b"Living");
        let (port, server) = one_shot_server(bytes);

        let client = ZoneTouch3::new("127.0.0.1", port).unwrap();
        let snapshot = client.fetch_snapshot().unwrap();
        assert_eq!(snapshot.zone_power(0).unwrap(), ZonePower::On);
        assert_eq!(snapshot.zone_percentage(0).unwrap(), 75);
        assert_eq!(snapshot.zone_name(0).unwrap(), "Living");
        server.join().unwrap();
    }

    #[test]
    fn set_zone_power_sends_checksummed_frame() {
        let (port, server) = one_shot_server(vec![0x55, 0x55, 0x55, 0xAA]);
        let client = ZoneTouch3::new("127.0.0.1", port).unwrap();
        client.set_zone_power(2, true).unwrap();

        let sent = server.join().unwrap();
        assert_eq!(sent.len(), 24);
        assert_eq!(sent[18], 2);
        assert_eq!(sent[19], 0x03);
        assert_eq!(sent[20], POWER_TOGGLE_PERCENTAGE);
        assert_eq!(
            &sent[22..],
            &crate::checksum::crc16_hex_pairs(&sent[4..22])
        );
    }

    #[test]
    fn connection_refused_is_a_transport_error() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ZoneTouch3::new("127.0.0.1", port).unwrap();
        assert!(matches!(
            client.fetch_snapshot(),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn invalid_percentage_fails_before_any_io() {
        // Unroutable endpoint: the validation error must win, proving no
        // connection is attempted for a bad argument.
        let client = ZoneTouch3::new("127.0.0.1", 1).unwrap();
        assert!(matches!(
            client.set_zone_percentage(0, 150),
            Err(Error::InvalidArgument(_))
        ));
    }
}
