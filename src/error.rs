use std::io;
use thiserror::Error;

/// The primary error type for the `hci-vendor-hal` library.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("invalid HCI packet type byte: 0x{0:02x}")]
    InvalidPacketType(u8),

    #[error("transport closed mid-packet")]
    ShortRead,

    #[error("transport closed")]
    TransportClosed,

    #[error("transport is not open")]
    NotOpen,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("vendor driver init failed with status {0}")]
    InitFailed(i32),

    #[error("expected exactly one transport channel, driver returned {0}")]
    TransportChannelCount(usize),

    #[error("vendor driver error: {0}")]
    Driver(String),

    #[error("invalid Bluetooth address: {0}")]
    InvalidAddress(String),
}
