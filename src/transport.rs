//! Byte-stream transport abstraction.

use std::io;

/// A readable/writable byte channel to the controller, typically the UART
/// descriptor handed out by the vendor driver.
///
/// Reads are expected to follow non-blocking semantics: a descriptor with
/// no bytes available returns [`io::ErrorKind::WouldBlock`] rather than
/// blocking. Readiness notification is not part of this trait; the event
/// loop that owns the channel calls [`crate::hal::VendorHci::on_data_ready`]
/// whenever the descriptor becomes readable.
///
/// Partial reads and writes are the norm: `read`/`write` may transfer fewer
/// bytes than requested and callers must loop.
pub trait Transport: io::Read + io::Write + Send {}

impl<T: io::Read + io::Write + Send> Transport for T {}
