//! hidapi-backed transport for real hardware.
//!
//! hidapi allows one `HidApi` context per process, so every caller shares the
//! instance returned by [`HidApiTransport::shared`].

use std::ffi::CString;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hidapi::{HidApi, HidDevice};

use super::{DevicePath, HidHandle, HidTransport, Result, TransportError};
use crate::protocol::FRAME_LEN;

static SHARED: Mutex<Option<Arc<HidApiTransport>>> = Mutex::new(None);

pub struct HidApiTransport {
    api: Mutex<HidApi>,
}

impl HidApiTransport {
    /// Process-wide transport, created on first use.
    pub fn shared() -> Result<Arc<HidApiTransport>> {
        let mut slot = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ref transport) = *slot {
            return Ok(Arc::clone(transport));
        }
        let api = HidApi::new().map_err(|e| TransportError::Init(format!("hidapi: {e}")))?;
        let transport = Arc::new(HidApiTransport {
            api: Mutex::new(api),
        });
        *slot = Some(Arc::clone(&transport));
        Ok(transport)
    }
}

impl HidTransport for HidApiTransport {
    fn enumerate(&self, vendor_id: u16, product_id: u16) -> Result<Vec<DevicePath>> {
        let mut api = self.api.lock().unwrap_or_else(PoisonError::into_inner);
        api.refresh_devices()
            .map_err(|e| TransportError::Enumerate(format!("refresh: {e}")))?;
        // Copy paths out of hidapi's device list before the lock is released.
        Ok(api
            .device_list()
            .filter(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .map(|d| DevicePath::new(d.path().to_string_lossy()))
            .collect())
    }

    fn open(&self, path: &DevicePath) -> Result<Box<dyn HidHandle>> {
        let c_path = CString::new(path.as_str())
            .map_err(|e| TransportError::Open(format!("{path}: {e}")))?;
        let api = self.api.lock().unwrap_or_else(PoisonError::into_inner);
        let device = api
            .open_path(&c_path)
            .map_err(|e| TransportError::Open(format!("{path}: {e}")))?;
        Ok(Box::new(HidApiHandle { device }))
    }
}

struct HidApiHandle {
    device: HidDevice,
}

impl HidHandle for HidApiHandle {
    fn write(&mut self, report: &[u8; FRAME_LEN]) -> Result<usize> {
        self.device
            .write(report)
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    fn read(&mut self, timeout: Duration) -> Result<Option<[u8; FRAME_LEN]>> {
        let mut buf = [0u8; FRAME_LEN];
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let n = self
            .device
            .read_timeout(&mut buf, timeout_ms)
            .map_err(|e| TransportError::Read(e.to_string()))?;
        Ok(widen_report(buf, n))
    }
}

/// Normalize a raw read into a 9-byte frame.
///
/// A full read is 9 bytes with the command id at index 8, which is what the
/// reply matcher compares. Some backends strip the leading report id and
/// return 8 bytes; the last byte read is then taken as the id and mirrored
/// into index 8. That placement is unconfirmed on hardware. The id sync on
/// open reads the ping reply's first byte and does not depend on it.
fn widen_report(mut buf: [u8; FRAME_LEN], n: usize) -> Option<[u8; FRAME_LEN]> {
    match n {
        0 => None,
        n if n >= FRAME_LEN => Some(buf),
        n => {
            buf[FRAME_LEN - 1] = buf[n - 1];
            Some(buf)
        }
    }
}
