//! HID transport capability: trait seam between the protocol core and the
//! native HID library.
//!
//! The core only needs five operations: enumerate, open, write, read with a
//! timeout, and close (drop). [`native::HidApiTransport`] implements them on
//! real hardware; [`mock::MockTransport`] is an in-memory robot for tests.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::protocol::FRAME_LEN;

#[doc(hidden)]
pub mod mock;
pub mod native;

// ── Error type ──

/// HID transport errors.
///
/// String payloads follow the convention **"context: details"** where
/// *context* names the operation or device path and *details* describes what
/// went wrong.
#[derive(Debug)]
pub enum TransportError {
    Init(String),
    Enumerate(String),
    Open(String),
    Read(String),
    Write(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Init(e) => write!(f, "HID init failed: {e}"),
            TransportError::Enumerate(e) => write!(f, "HID enumeration failed: {e}"),
            TransportError::Open(e) => write!(f, "Failed to open device: {e}"),
            TransportError::Read(e) => write!(f, "HID read failed: {e}"),
            TransportError::Write(e) => write!(f, "HID write failed: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

// ── Device path ──

/// Opaque identifier of one attached robot, as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DevicePath(String);

impl DevicePath {
    pub fn new(path: impl Into<String>) -> Self {
        DevicePath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DevicePath {
    fn from(s: &str) -> Self {
        DevicePath(s.to_string())
    }
}

// ── Traits ──

/// Discovery and open half of the HID capability.
pub trait HidTransport: Send + Sync {
    /// All currently attached devices matching the ids, as a fresh snapshot.
    fn enumerate(&self, vendor_id: u16, product_id: u16) -> Result<Vec<DevicePath>>;

    /// Open a device by path. Dropping the returned handle closes it.
    fn open(&self, path: &DevicePath) -> Result<Box<dyn HidHandle>>;
}

/// An open device. Dropping the handle releases it.
pub trait HidHandle: Send {
    /// Write one report. Returns the number of bytes accepted; `Ok(0)` means
    /// the device did not take the report and the write may be retried.
    fn write(&mut self, report: &[u8; FRAME_LEN]) -> Result<usize>;

    /// Read one report, waiting at most `timeout`. `Ok(None)` on timeout.
    fn read(&mut self, timeout: Duration) -> Result<Option<[u8; FRAME_LEN]>>;
}

/// List the paths of all attached Finch robots (or any `vendor_id`/`product_id` pair).
///
/// Returns an empty list when nothing is attached. No caching: each call
/// asks the transport again.
pub fn list_paths(
    transport: &dyn HidTransport,
    vendor_id: u16,
    product_id: u16,
) -> Result<Vec<DevicePath>> {
    let paths = transport.enumerate(vendor_id, product_id)?;
    log::debug!(
        "enumerated {} device(s) for {vendor_id:04X}:{product_id:04X}",
        paths.len()
    );
    Ok(paths)
}
