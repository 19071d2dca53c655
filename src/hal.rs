//! Vendor interface controller: link lifecycle, the firmware-configuration
//! window, outbound command queueing and inbound packet dispatch.

use crate::error::HalError;
use crate::framer::HciFramer;
use crate::packet::{HciPacket, HciPacketType};
use crate::transport::Transport;
use crate::vendor::{BdAddr, PowerState, VendorDriver, VendorOpResult};
use bytes::{Bytes, BytesMut};
use std::io::ErrorKind;
use tracing::{debug, error, info, warn};

/// Callback invoked once per fully framed inbound packet.
pub type PacketCallback = Box<dyn FnMut(HciPacketType, Bytes) + Send>;

/// Whether inbound packets belong to the startup exchange or to the
/// external consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Firmware configuration in progress: outbound data queues, inbound
    /// packets answer internal configuration commands.
    AwaitingFirmwareConfig,
    /// Steady state: outbound data transmits, inbound packets go to the
    /// consumer.
    Operational,
}

/// Owns the vendor driver, the transport channel, the packet framer and
/// the outbound command queue.
///
/// The controller is single-threaded and callback-driven: the event loop
/// that owns it watches the transport for readability and calls
/// [`on_data_ready`](Self::on_data_ready) per readiness event; the driver's
/// asynchronous notifications arrive through
/// [`on_firmware_configured`](Self::on_firmware_configured) and
/// [`send_internal_command`](Self::send_internal_command). Lifecycle is
/// caller-managed: [`open`](Self::open) builds a fully wired controller or
/// nothing at all, [`close`](Self::close) (also run on drop) tears it down.
pub struct VendorHci<D: VendorDriver> {
    driver: Option<D>,
    transport: Option<Box<dyn Transport>>,
    framer: HciFramer,
    queued: BytesMut,
    mode: Mode,
    consumer: PacketCallback,
    internal_cb: Option<PacketCallback>,
}

impl<D: VendorDriver> VendorHci<D> {
    /// Bring the link up: initialize the driver with the local address,
    /// power-cycle the chip, acquire the transport channel and start
    /// firmware configuration.
    ///
    /// The driver must yield exactly one transport channel; any other
    /// count fails with [`HalError::TransportChannelCount`]. On any
    /// failure the half-built controller is dropped and nothing stays
    /// registered.
    pub fn open(
        mut driver: D,
        local_addr: BdAddr,
        consumer: PacketCallback,
    ) -> Result<Self, HalError> {
        driver.init(&local_addr)?;
        debug!(%local_addr, "vendor driver initialized");

        driver.set_power(PowerState::Off)?;
        driver.set_power(PowerState::On)?;

        let mut channels = driver.open_transport()?;
        if channels.len() != 1 {
            error!(count = channels.len(), "unexpected transport channel count");
            return Err(HalError::TransportChannelCount(channels.len()));
        }
        let transport = channels.remove(0);

        driver.configure_firmware()?;
        info!("vendor link open, awaiting firmware configuration");

        Ok(Self {
            driver: Some(driver),
            transport: Some(transport),
            framer: HciFramer::new(),
            queued: BytesMut::new(),
            mode: Mode::AwaitingFirmwareConfig,
            consumer,
            internal_cb: None,
        })
    }

    /// True once firmware configuration has completed.
    pub fn is_operational(&self) -> bool {
        self.mode == Mode::Operational
    }

    /// Tear the link down: drop the transport channel (which ends
    /// readiness delivery), close the driver's serial channel and power
    /// the chip off. Any in-flight partial packet and queued outbound
    /// data are discarded. Repeated calls are no-ops.
    pub fn close(&mut self) {
        self.transport = None;
        if let Some(mut driver) = self.driver.take() {
            if let Err(e) = driver.close_transport() {
                warn!("closing vendor transport failed: {e}");
            }
            if let Err(e) = driver.set_power(PowerState::Off) {
                warn!("powering chip off failed: {e}");
            }
            info!("vendor link closed");
        }
        self.framer.reset();
        self.queued.clear();
        self.internal_cb = None;
        self.mode = Mode::AwaitingFirmwareConfig;
    }

    /// Send `data` to the controller, honoring the firmware-configuration
    /// window.
    ///
    /// While unconfigured, `data` is appended to the command queue and the
    /// queued length is returned; nothing is transmitted yet. Once
    /// configured, any queued bytes are flushed in order before `data`
    /// itself goes out. Returns the number of bytes accepted (queued or
    /// transmitted); a short count signals a transport fault and a closed
    /// link accepts nothing.
    pub fn send(&mut self, data: &[u8]) -> usize {
        if self.transport.is_none() {
            debug!("send on a closed link, dropping {} bytes", data.len());
            return 0;
        }

        if self.mode == Mode::Operational && self.queued.is_empty() {
            return self.send_private(data);
        }

        if self.mode == Mode::AwaitingFirmwareConfig {
            debug!(len = data.len(), "queueing outbound data until firmware is configured");
            self.queued.extend_from_slice(data);
            return data.len();
        }

        debug!(len = self.queued.len(), "flushing queued outbound data");
        let queued = std::mem::take(&mut self.queued);
        self.send_private(&queued);
        self.send_private(data)
    }

    /// Transmit a firmware-configuration command on behalf of the vendor
    /// driver, registering `callback` for its response.
    ///
    /// Writes the H4 `Command` indicator followed by `command`, bypassing
    /// the queue. Inbound packets framed while unconfigured are handed to
    /// `callback`. Returns the number of command bytes transmitted.
    pub fn send_internal_command(&mut self, command: &[u8], callback: PacketCallback) -> usize {
        debug!(len = command.len(), "transmitting internal vendor command");
        self.internal_cb = Some(callback);
        let indicator = [u8::from(HciPacketType::Command)];
        self.send_private(&indicator);
        self.send_private(command)
    }

    /// The driver finished configuring firmware: leave the startup window
    /// and flush anything queued behind it.
    pub fn on_firmware_configured(&mut self, result: VendorOpResult) {
        if result != VendorOpResult::Success {
            warn!(?result, "firmware configuration reported failure");
        }
        info!(?result, "firmware configured");
        self.mode = Mode::Operational;
        // Empty payload: runs the flush path in `send` and nothing else.
        self.send(&[]);
    }

    /// One readiness event on the transport: advance the framer a step
    /// and dispatch the packet it may have completed.
    ///
    /// Framing errors are returned to the caller, which decides whether
    /// to [`close`](Self::close) the link or reset and resynchronize.
    pub fn on_data_ready(&mut self) -> Result<(), HalError> {
        let transport = self.transport.as_mut().ok_or(HalError::NotOpen)?;
        match self.framer.on_data_ready(transport)? {
            Some(packet) => {
                self.dispatch(packet);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, packet: HciPacket) {
        match self.mode {
            Mode::AwaitingFirmwareConfig => match self.internal_cb.as_mut() {
                Some(callback) => callback(packet.packet_type, packet.data),
                None => warn!(
                    packet_type = ?packet.packet_type,
                    len = packet.data.len(),
                    "dropping packet framed before firmware configuration; no internal callback"
                ),
            },
            Mode::Operational => (self.consumer)(packet.packet_type, packet.data),
        }
    }

    /// The only function that writes to the transport. Loops until every
    /// byte is out or a non-retryable error occurs; interrupts and
    /// would-block are retried (writes are small, busy-spin is acceptable
    /// on this link). The returned count is short only on a transport
    /// fault.
    fn send_private(&mut self, data: &[u8]) -> usize {
        let Some(transport) = self.transport.as_mut() else {
            debug!("send on a closed link, dropping {} bytes", data.len());
            return 0;
        };

        let mut transmitted = 0;
        while transmitted < data.len() {
            match transport.write(&data[transmitted..]) {
                Ok(0) => {
                    error!("zero-length write to transport");
                    break;
                }
                Ok(n) => transmitted += n,
                Err(e)
                    if e.kind() == ErrorKind::Interrupted
                        || e.kind() == ErrorKind::WouldBlock =>
                {
                    continue;
                }
                Err(e) => {
                    error!("error writing to transport: {e}");
                    break;
                }
            }
        }
        transmitted
    }
}

impl<D: VendorDriver> Drop for VendorHci<D> {
    fn drop(&mut self) {
        self.close();
    }
}
