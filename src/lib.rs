//! Bluetooth vendor HCI transport layer.
//!
//! Owns the byte-oriented link to the controller, drives the vendor driver
//! through its power-up and firmware-configuration sequence, and
//! incrementally reassembles framed HCI packets from a non-blocking byte
//! stream.

pub mod constants;
pub mod error;
pub mod framer;
pub mod hal;
pub mod packet;
pub mod transport;
pub mod vendor;

pub use error::HalError;
pub use framer::HciFramer;
pub use hal::{PacketCallback, VendorHci};
pub use packet::{HciPacket, HciPacketType};
pub use transport::Transport;
pub use vendor::{BdAddr, PowerState, VendorDriver, VendorOpResult};
