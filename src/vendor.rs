//! Driver boundary: the capability surface of the vendor-supplied hardware
//! driver (power control, UART acquisition, firmware load).

use crate::constants::BD_ADDR_SIZE;
use crate::error::HalError;
use crate::transport::Transport;
use std::fmt;
use std::str::FromStr;

/// A 6-byte Bluetooth device address (BD_ADDR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BdAddr(pub [u8; BD_ADDR_SIZE]);

impl BdAddr {
    pub const LEN: usize = BD_ADDR_SIZE;

    pub fn as_bytes(&self) -> &[u8; BD_ADDR_SIZE] {
        &self.0
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for BdAddr {
    type Err = HalError;

    /// Parses the canonical colon-separated form, e.g. `22:33:44:55:66:77`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; BD_ADDR_SIZE];
        let mut octets = s.split(':');
        for byte in bytes.iter_mut() {
            let octet = octets
                .next()
                .ok_or_else(|| HalError::InvalidAddress(s.to_string()))?;
            if octet.len() != 2 {
                return Err(HalError::InvalidAddress(s.to_string()));
            }
            *byte = u8::from_str_radix(octet, 16)
                .map_err(|_| HalError::InvalidAddress(s.to_string()))?;
        }
        if octets.next().is_some() {
            return Err(HalError::InvalidAddress(s.to_string()));
        }
        Ok(BdAddr(bytes))
    }
}

/// Chip power states (BT_VND_PWR_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
}

/// Result of an asynchronous vendor operation, delivered through the
/// driver's completion callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorOpResult {
    Success,
    Fail,
}

/// The vendor driver boundary.
///
/// This replaces the classic `bt_vendor_interface_t` opcode/argument table
/// with one method per operation the transport actually uses. The driver's
/// asynchronous notifications (firmware-configuration completion, internal
/// command transmit requests) are forwarded by the composition layer into
/// [`crate::hal::VendorHci::on_firmware_configured`] and
/// [`crate::hal::VendorHci::send_internal_command`].
pub trait VendorDriver {
    /// Initialize the driver with the local device address. Called once,
    /// before any other operation.
    fn init(&mut self, local_addr: &BdAddr) -> Result<(), HalError>;

    /// Chip power control (BT_VND_OP_POWER_CTRL).
    fn set_power(&mut self, state: PowerState) -> Result<(), HalError>;

    /// Acquire the byte-stream channels to the controller
    /// (BT_VND_OP_USERIAL_OPEN). The host requires exactly one channel;
    /// any other count fails [`crate::hal::VendorHci::open`].
    fn open_transport(&mut self) -> Result<Vec<Box<dyn Transport>>, HalError>;

    /// Release the byte-stream channels (BT_VND_OP_USERIAL_CLOSE).
    fn close_transport(&mut self) -> Result<(), HalError>;

    /// Kick off firmware configuration (BT_VND_OP_FW_CFG). Completion is
    /// asynchronous.
    fn configure_firmware(&mut self) -> Result<(), HalError>;
}
