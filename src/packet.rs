use crate::constants::*;
use crate::error::HalError;
use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// H4 packet indicator values, as they appear on the wire.
///
/// `Command` on the inbound path announces a command-status/complete
/// exchange; the other three are ordinary controller-to-host traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum HciPacketType {
    Command = 0x01,
    AclData = 0x02,
    ScoData = 0x03,
    Event = 0x04,
}

impl HciPacketType {
    /// Bytes of fixed header before the length field completes.
    pub fn preamble_size(&self) -> usize {
        match self {
            HciPacketType::Command => COMMAND_PREAMBLE_SIZE,
            HciPacketType::AclData => ACL_PREAMBLE_SIZE,
            HciPacketType::ScoData => SCO_PREAMBLE_SIZE,
            HciPacketType::Event => EVENT_PREAMBLE_SIZE,
        }
    }

    /// Byte offset of the payload-length indicator within the preamble.
    pub fn length_field_offset(&self) -> usize {
        match self {
            HciPacketType::Command => COMMAND_LENGTH_OFFSET,
            HciPacketType::AclData => ACL_LENGTH_OFFSET,
            HciPacketType::ScoData => SCO_LENGTH_OFFSET,
            HciPacketType::Event => EVENT_LENGTH_OFFSET,
        }
    }

    /// Derive the payload length from a fully read preamble.
    ///
    /// ACL data carries a 16-bit little-endian length; every other type a
    /// single length byte.
    pub fn payload_length(&self, preamble: &[u8]) -> usize {
        let offset = self.length_field_offset();
        match self {
            HciPacketType::AclData => {
                u16::from_le_bytes([preamble[offset], preamble[offset + 1]]) as usize
            }
            _ => preamble[offset] as usize,
        }
    }

    /// Validate a wire type octet, rejecting anything outside the four
    /// defined indicator values.
    pub fn from_wire(byte: u8) -> Result<Self, HalError> {
        Self::try_from(byte).map_err(|_| HalError::InvalidPacketType(byte))
    }
}

/// A fully framed inbound packet: the type indicator plus the complete
/// preamble+payload bytes (the H4 indicator itself is not included).
#[derive(Debug, Clone, PartialEq)]
pub struct HciPacket {
    pub packet_type: HciPacketType,
    pub data: Bytes,
}

impl HciPacket {
    /// The variable-length portion that follows the preamble.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.packet_type.preamble_size()..]
    }
}
