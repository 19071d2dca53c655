//! Incremental HCI packet framer.
//!
//! The transport delivers bytes with no packet alignment whatsoever: a
//! readiness event may carry a single byte or several packets' worth. The
//! framer performs exactly one read per event and accumulates state across
//! events, so a packet is completed exactly once no matter how the stream
//! is fragmented.

use crate::constants::PREAMBLE_SIZE_MAX;
use crate::error::HalError;
use crate::packet::{HciPacket, HciPacketType};
use bytes::BytesMut;
use std::io::{self, Read};
use tracing::trace;

/// Where the framer is within the current packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserPhase {
    /// Between packets; no partial data is held.
    Idle,
    /// The type octet has been consumed; reading the fixed preamble.
    Preamble(HciPacketType),
    /// The preamble (and thus the payload length) is known; reading payload.
    Payload(HciPacketType),
}

/// Reassembles framed HCI packets from an arbitrarily fragmented byte
/// stream.
///
/// `on_data_ready` is meant to be called once per readiness notification;
/// partial packets are carried across calls. Exactly one packet is in
/// flight at a time and packets complete in arrival order.
#[derive(Debug)]
pub struct HciFramer {
    phase: ParserPhase,
    packet: BytesMut,
    bytes_remaining: usize,
    bytes_read: usize,
}

impl Default for HciFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl HciFramer {
    pub fn new() -> Self {
        Self {
            phase: ParserPhase::Idle,
            packet: BytesMut::new(),
            bytes_remaining: 0,
            bytes_read: 0,
        }
    }

    /// True when no partial packet is held.
    pub fn is_idle(&self) -> bool {
        self.phase == ParserPhase::Idle
    }

    /// Discard any partial packet and return to idle.
    ///
    /// Owners that recover from a framing error by resynchronizing the
    /// link call this before resuming reads.
    pub fn reset(&mut self) {
        self.phase = ParserPhase::Idle;
        self.packet = BytesMut::new();
        self.bytes_remaining = 0;
        self.bytes_read = 0;
    }

    /// Advance the parser by one step against `reader`.
    ///
    /// Performs at most one successful `read`. Returns `Ok(Some(_))` when
    /// that step completed a packet, `Ok(None)` when more bytes are needed
    /// (or the readiness event was spurious and the read would block).
    ///
    /// # Errors
    ///
    /// - [`HalError::InvalidPacketType`] if the type octet is out of range,
    ///   before any preamble byte is consumed.
    /// - [`HalError::TransportClosed`] on end-of-stream between packets.
    /// - [`HalError::ShortRead`] on end-of-stream with a partial packet.
    /// - [`HalError::Io`] for any other read failure.
    pub fn on_data_ready<R: Read>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<HciPacket>, HalError> {
        match self.phase {
            ParserPhase::Idle => {
                let mut type_octet = [0u8; 1];
                match read_retrying_interrupt(reader, &mut type_octet)? {
                    None => return Ok(None),
                    Some(0) => return Err(HalError::TransportClosed),
                    Some(_) => {}
                }
                let packet_type = HciPacketType::from_wire(type_octet[0])?;
                trace!(?packet_type, "packet start");
                self.packet.resize(PREAMBLE_SIZE_MAX, 0);
                self.bytes_remaining = packet_type.preamble_size();
                self.bytes_read = 0;
                self.phase = ParserPhase::Preamble(packet_type);
                Ok(None)
            }

            ParserPhase::Preamble(packet_type) => {
                let window = self.bytes_read..self.bytes_read + self.bytes_remaining;
                let bytes_read =
                    match read_retrying_interrupt(reader, &mut self.packet[window])? {
                        None => return Ok(None),
                        Some(0) => return Err(HalError::ShortRead),
                        Some(n) => n,
                    };
                self.bytes_remaining -= bytes_read;
                self.bytes_read += bytes_read;
                if self.bytes_remaining > 0 {
                    return Ok(None);
                }

                let payload_length = packet_type.payload_length(&self.packet);
                self.packet
                    .resize(packet_type.preamble_size() + payload_length, 0);
                self.bytes_remaining = payload_length;
                self.bytes_read = 0;
                self.phase = ParserPhase::Payload(packet_type);

                // A zero-length payload never gets another readiness event.
                if payload_length == 0 {
                    return Ok(Some(self.complete(packet_type)));
                }
                Ok(None)
            }

            ParserPhase::Payload(packet_type) => {
                let offset = packet_type.preamble_size() + self.bytes_read;
                let window = offset..offset + self.bytes_remaining;
                let bytes_read =
                    match read_retrying_interrupt(reader, &mut self.packet[window])? {
                        None => return Ok(None),
                        Some(0) => return Err(HalError::ShortRead),
                        Some(n) => n,
                    };
                self.bytes_remaining -= bytes_read;
                self.bytes_read += bytes_read;
                if self.bytes_remaining > 0 {
                    return Ok(None);
                }
                Ok(Some(self.complete(packet_type)))
            }
        }
    }

    fn complete(&mut self, packet_type: HciPacketType) -> HciPacket {
        let data = std::mem::take(&mut self.packet).freeze();
        trace!(?packet_type, len = data.len(), "packet complete");
        self.phase = ParserPhase::Idle;
        self.bytes_remaining = 0;
        self.bytes_read = 0;
        HciPacket { packet_type, data }
    }
}

/// One read attempt: retries `Interrupted`, maps `WouldBlock` (a spurious
/// readiness event on a non-blocking descriptor) to `None`.
fn read_retrying_interrupt<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<Option<usize>, io::Error> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}
