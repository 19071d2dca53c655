// HCI wire-format constants (Bluetooth Core Spec Vol 4, Part E / Part A)

/// Size of the H4 packet indicator byte that precedes every packet
pub const H4_HEADER_SIZE: usize = 1;

/// Command preamble: opcode (2 bytes) + parameter length (1 byte)
pub const COMMAND_PREAMBLE_SIZE: usize = 3;

/// Offset of the parameter-length byte in a command preamble
pub const COMMAND_LENGTH_OFFSET: usize = 2;

/// ACL data preamble: handle/flags (2 bytes) + data length (2 bytes)
pub const ACL_PREAMBLE_SIZE: usize = 4;

/// Offset of the 16-bit little-endian data length in an ACL preamble
pub const ACL_LENGTH_OFFSET: usize = 2;

/// SCO data preamble: handle/flags (2 bytes) + data length (1 byte)
pub const SCO_PREAMBLE_SIZE: usize = 3;

/// Offset of the data-length byte in a SCO preamble
pub const SCO_LENGTH_OFFSET: usize = 2;

/// Event preamble: event code (1 byte) + parameter length (1 byte)
pub const EVENT_PREAMBLE_SIZE: usize = 2;

/// Offset of the parameter-length byte in an event preamble
pub const EVENT_LENGTH_OFFSET: usize = 1;

/// Largest preamble across all packet types (ACL data)
pub const PREAMBLE_SIZE_MAX: usize = ACL_PREAMBLE_SIZE;

/// Bluetooth device addresses (BD_ADDR) are 6 bytes
pub const BD_ADDR_SIZE: usize = 6;
