//! Common test utilities and shared fakes

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hci_vendor_hal::{
    BdAddr, HalError, HciFramer, HciPacket, HciPacketType, PacketCallback, PowerState, Transport,
    VendorDriver, VendorHci, VendorOpResult,
};

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("Failed to decode hex")
}

/// Local address used by the lifecycle tests
#[allow(dead_code)]
pub fn test_addr() -> BdAddr {
    "22:33:44:55:66:77".parse().expect("valid test address")
}

/// Install a tracing subscriber honoring `RUST_LOG`, once per test binary.
#[allow(dead_code)]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What a `ChunkedReader` reports once its bytes run out.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBehavior {
    /// Non-blocking descriptor with nothing buffered.
    WouldBlock,
    /// Peer closed the stream.
    Eof,
}

/// A reader that serves a prearranged byte stream at most `max_per_read`
/// bytes per call, to exercise every fragmentation the transport can
/// produce (including 1-byte-at-a-time delivery).
#[allow(dead_code)]
pub struct ChunkedReader {
    data: VecDeque<u8>,
    max_per_read: usize,
    end: EndBehavior,
}

#[allow(dead_code)]
impl ChunkedReader {
    pub fn new(data: &[u8], max_per_read: usize, end: EndBehavior) -> Self {
        assert!(max_per_read > 0);
        Self {
            data: data.iter().copied().collect(),
            max_per_read,
            end,
        }
    }

    /// Append more bytes, as if the peer wrote again later.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.data.extend(bytes.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return match self.end {
                EndBehavior::WouldBlock => Err(io::ErrorKind::WouldBlock.into()),
                EndBehavior::Eof => Ok(0),
            };
        }
        let n = buf.len().min(self.max_per_read).min(self.data.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.data.pop_front().expect("len checked above");
        }
        Ok(n)
    }
}

/// Step the framer until the reader is drained, collecting every packet
/// completed along the way.
#[allow(dead_code)]
pub fn pump(
    framer: &mut HciFramer,
    reader: &mut ChunkedReader,
) -> Result<Vec<HciPacket>, HalError> {
    let mut packets = Vec::new();
    loop {
        let drained = reader.is_empty();
        match framer.on_data_ready(reader)? {
            Some(packet) => packets.push(packet),
            None if drained => return Ok(packets),
            None => {}
        }
    }
}

#[allow(dead_code)]
#[derive(Default)]
struct LinkState {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    accepted: usize,
    /// Largest write accepted per call; forces partial writes.
    write_cap: Option<usize>,
    /// Total bytes accepted before the link reports a broken pipe.
    write_limit: Option<usize>,
}

/// A bidirectional in-memory transport with non-blocking read semantics.
/// Cloning yields another handle to the same link, so a test can keep one
/// while the fake driver hands the other to the controller.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct TestLink {
    state: Arc<Mutex<LinkState>>,
}

#[allow(dead_code)]
impl TestLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the controller's read path.
    pub fn feed_rx(&self, bytes: &[u8]) {
        self.state.lock().unwrap().rx.extend(bytes.iter().copied());
    }

    /// Every write call the controller made, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().writes.clone()
    }

    /// All written bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().writes.concat()
    }

    pub fn set_write_cap(&self, cap: usize) {
        self.state.lock().unwrap().write_cap = Some(cap);
    }

    pub fn set_write_limit(&self, limit: usize) {
        self.state.lock().unwrap().write_limit = Some(limit);
    }
}

impl Read for TestLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.rx.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = buf.len().min(state.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = state.rx.pop_front().expect("len checked above");
        }
        Ok(n)
    }
}

impl Write for TestLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let mut n = buf.len();
        if let Some(limit) = state.write_limit {
            if state.accepted >= limit {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            n = n.min(limit - state.accepted);
        }
        if let Some(cap) = state.write_cap {
            n = n.min(cap);
        }
        if n > 0 {
            state.writes.push(buf[..n].to_vec());
            state.accepted += n;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Driver operations in the order the controller issued them.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOp {
    Init,
    PowerOff,
    PowerOn,
    OpenTransport,
    CloseTransport,
    ConfigureFirmware,
}

/// A scriptable vendor driver: records the operation sequence, can fail at
/// a chosen step and can yield any number of transport channels.
#[allow(dead_code)]
pub struct FakeDriver {
    link: TestLink,
    ops: Arc<Mutex<Vec<DriverOp>>>,
    pub channel_count: usize,
    pub fail_on: Option<DriverOp>,
}

#[allow(dead_code)]
impl FakeDriver {
    /// A driver plus the test-side handles: the shared link and the
    /// recorded operation log.
    pub fn new() -> (Self, TestLink, Arc<Mutex<Vec<DriverOp>>>) {
        let link = TestLink::new();
        let ops: Arc<Mutex<Vec<DriverOp>>> = Arc::default();
        let driver = Self {
            link: link.clone(),
            ops: ops.clone(),
            channel_count: 1,
            fail_on: None,
        };
        (driver, link, ops)
    }

    fn record(&self, op: DriverOp) -> Result<(), HalError> {
        self.ops.lock().unwrap().push(op);
        if self.fail_on == Some(op) {
            return Err(HalError::Driver(format!("injected failure at {op:?}")));
        }
        Ok(())
    }
}

impl VendorDriver for FakeDriver {
    fn init(&mut self, _local_addr: &BdAddr) -> Result<(), HalError> {
        self.record(DriverOp::Init)
    }

    fn set_power(&mut self, state: PowerState) -> Result<(), HalError> {
        self.record(match state {
            PowerState::Off => DriverOp::PowerOff,
            PowerState::On => DriverOp::PowerOn,
        })
    }

    fn open_transport(&mut self) -> Result<Vec<Box<dyn Transport>>, HalError> {
        self.record(DriverOp::OpenTransport)?;
        Ok((0..self.channel_count)
            .map(|_| Box::new(self.link.clone()) as Box<dyn Transport>)
            .collect())
    }

    fn close_transport(&mut self) -> Result<(), HalError> {
        self.record(DriverOp::CloseTransport)
    }

    fn configure_firmware(&mut self) -> Result<(), HalError> {
        self.record(DriverOp::ConfigureFirmware)
    }
}

/// Packets a callback has delivered so far.
#[allow(dead_code)]
pub type Collected = Arc<Mutex<Vec<(HciPacketType, Bytes)>>>;

/// A consumer callback that appends everything it receives to a shared log.
#[allow(dead_code)]
pub fn packet_collector() -> (Collected, PacketCallback) {
    let collected: Collected = Arc::default();
    let sink = collected.clone();
    let callback: PacketCallback = Box::new(move |packet_type, data| {
        sink.lock().unwrap().push((packet_type, data));
    });
    (collected, callback)
}
