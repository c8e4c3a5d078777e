//! Finch connection: open/close lifecycle, framing, and request/reply matching.
//!
//! A [`FinchConnection`] is a cheap, cloneable handle onto one robot. All
//! handles share a single I/O lock that guards the transport handle, the
//! last-frame buffer, the rolling command id and the last-command timestamp,
//! so a command and its reply are never interleaved with another command.
//! While open, a keep-alive thread pings the robot whenever it has been idle
//! past the ping threshold.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use crate::codec::commands::{self, QUERY_COMMAND_ID};
use crate::error::{FinchError, Result};
use crate::keepalive::{KeepAlive, KeepAliveTarget, PingOutcome};
use crate::protocol::{
    self, CMD_PING, Frame, KEEPALIVE_TICK, PING_THRESHOLD, PRODUCT_ID, READ_TIMEOUT,
    REPLY_DEADLINE, VENDOR_ID,
};
use crate::registry::ConnectionRegistry;
use crate::retry::{self, RetryConfig};
use crate::transport::{self, DevicePath, HidHandle, HidTransport};

/// Runtime timing and retry parameters of a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Idle time after which the keep-alive task pings.
    pub ping_threshold: Duration,
    /// Keep-alive wake-up interval.
    pub keepalive_tick: Duration,
    /// Timeout of one HID read attempt.
    pub read_timeout: Duration,
    /// Overall deadline for a matching reply.
    pub reply_deadline: Duration,
    /// Write retry policy.
    pub retry: RetryConfig,
    /// Close the connection when a keep-alive ping fails.
    pub close_on_keepalive_failure: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ping_threshold: PING_THRESHOLD,
            keepalive_tick: KEEPALIVE_TICK,
            read_timeout: READ_TIMEOUT,
            reply_deadline: REPLY_DEADLINE,
            retry: RetryConfig::default(),
            close_on_keepalive_failure: true,
        }
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Open => write!(f, "open"),
        }
    }
}

/// Connection to one Finch robot.
#[derive(Clone)]
pub struct FinchConnection {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    transport: Arc<dyn HidTransport>,
    registry: Arc<ConnectionRegistry>,
    config: ConnectionConfig,
    link: Mutex<Link>,
    keepalive: Mutex<Option<KeepAlive>>,
}

/// Everything guarded by the per-connection I/O lock.
struct Link {
    handle: Option<Box<dyn HidHandle>>,
    path: Option<DevicePath>,
    command_id: u8,
    buffer: Frame,
    last_sent: Instant,
}

impl FinchConnection {
    /// A closed connection that will open robots through `transport` and
    /// claim paths in `registry`.
    pub fn new(
        transport: Arc<dyn HidTransport>,
        registry: Arc<ConnectionRegistry>,
        config: ConnectionConfig,
    ) -> Self {
        FinchConnection {
            inner: Arc::new(Inner {
                transport,
                registry,
                config,
                link: Mutex::new(Link::fresh()),
                keepalive: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        FinchConnection { inner }
    }

    pub fn state(&self) -> ConnectionState {
        if self.inner.link().handle.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Path of the robot this connection holds, if open.
    pub fn path(&self) -> Option<DevicePath> {
        self.inner.link().path.clone()
    }

    /// Current command id.
    pub fn command_id(&self) -> u8 {
        self.inner.link().command_id
    }

    /// Whether the keep-alive thread is still running.
    pub fn keepalive_running(&self) -> bool {
        self.inner
            .keepalive()
            .as_ref()
            .is_some_and(|ka| !ka.is_finished())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Connect to the first robot not already claimed by another connection.
    ///
    /// Reopening an open connection closes it first. On success the
    /// connection knows the robot's command counter and its keep-alive
    /// thread is running.
    pub fn open(&self) -> Result<()> {
        if self.is_open() {
            self.close();
        }
        let inner = &self.inner;
        let paths = transport::list_paths(inner.transport.as_ref(), VENDOR_ID, PRODUCT_ID)?;
        let path = paths
            .into_iter()
            .find(|p| inner.registry.claim(p))
            .ok_or_else(|| FinchError::DeviceNotFound {
                in_use: inner.registry.len(),
            })?;

        let command_id = match inner.connect(&path) {
            Ok(id) => id,
            Err(e) => {
                inner.registry.release(&path);
                return Err(e);
            }
        };
        inner.registry.attach(&path, Arc::downgrade(inner));

        let target: Weak<dyn KeepAliveTarget> = Arc::downgrade(inner) as Weak<dyn KeepAliveTarget>;
        match KeepAlive::spawn(
            target,
            inner.config.keepalive_tick,
            inner.config.ping_threshold,
            inner.config.close_on_keepalive_failure,
        ) {
            Ok(ka) => *inner.keepalive() = Some(ka),
            Err(e) => {
                self.close();
                return Err(FinchError::Connection(format!("keep-alive thread: {e}")));
            }
        }

        log::info!("opened Finch at {path} (command id {command_id})");
        Ok(())
    }

    /// Return the robot to idle, release its handle and path.
    ///
    /// Waits for the keep-alive thread to exit first. Safe to call any
    /// number of times.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Send one command.
    ///
    /// A command without payload is a query: the command id advances
    /// (wrapping) before framing and the reply is matched against the new
    /// id. Commands with a payload reuse the current id.
    pub fn send(&self, code: u8, payload: &[u8]) -> Result<()> {
        self.inner.link().send(&self.inner.config, code, payload)
    }

    /// Read the reply to the last query, discarding stale reports.
    pub fn receive(&self) -> Result<Frame> {
        self.inner.link().receive(&self.inner.config, true)
    }

    /// Send a query and read its reply without releasing the I/O lock in between.
    pub fn request(&self, code: u8) -> Result<Frame> {
        let mut link = self.inner.link();
        link.send(&self.inner.config, code, &[])?;
        link.receive(&self.inner.config, true)
    }

    /// Ask the robot for its command counter and adopt it.
    pub fn read_command_id(&self) -> Result<u8> {
        let mut link = self.inner.link();
        let id = link.sync_command_id(&self.inner.config)?;
        link.command_id = id;
        Ok(id)
    }
}

impl fmt::Debug for FinchConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = self.inner.link();
        f.debug_struct("FinchConnection")
            .field("path", &link.path)
            .field("open", &link.handle.is_some())
            .field("command_id", &link.command_id)
            .finish()
    }
}

impl Inner {
    fn link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn keepalive(&self) -> MutexGuard<'_, Option<KeepAlive>> {
        self.keepalive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the transport handle for a claimed path and sync the command id.
    fn connect(&self, path: &DevicePath) -> Result<u8> {
        let handle = self
            .transport
            .open(path)
            .map_err(|e| FinchError::Connection(e.to_string()))?;

        let mut link = self.link();
        link.handle = Some(handle);
        link.path = Some(path.clone());
        match link.sync_command_id(&self.config) {
            Ok(id) => {
                link.command_id = id;
                Ok(id)
            }
            Err(e) => {
                *link = Link::fresh();
                Err(FinchError::Connection(format!(
                    "{path}: command id sync failed: {e}"
                )))
            }
        }
    }

    fn close(&self) {
        let keepalive = self.keepalive().take();
        if let Some(ka) = keepalive {
            ka.stop();
        }
        let path = self.link().teardown();
        if let Some(path) = path {
            self.registry.release(&path);
            log::info!("closed Finch at {path}");
        }
    }
}

impl KeepAliveTarget for Inner {
    fn ping_if_idle(&self, threshold: Duration) -> Result<PingOutcome> {
        let mut link = self.link();
        if link.handle.is_none() {
            return Ok(PingOutcome::Closed);
        }
        if link.last_sent.elapsed() < threshold {
            return Ok(PingOutcome::Idle);
        }
        link.send(&self.config, CMD_PING, &[])?;
        link.receive(&self.config, true)?;
        Ok(PingOutcome::Pinged)
    }

    fn abandon(&self) {
        let path = self.link().teardown();
        if let Some(path) = path {
            self.registry.release(&path);
            log::warn!("abandoned Finch at {path}");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.close();
    }
}

impl Link {
    fn fresh() -> Self {
        Link {
            handle: None,
            path: None,
            command_id: 0,
            buffer: Frame::from_bytes([0; protocol::FRAME_LEN]),
            last_sent: Instant::now(),
        }
    }

    fn send(&mut self, config: &ConnectionConfig, code: u8, payload: &[u8]) -> Result<()> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(FinchError::NotOpen);
        };
        let command_id = if payload.is_empty() {
            self.command_id.wrapping_add(1)
        } else {
            self.command_id
        };
        let frame = Frame::command(code, payload, command_id)?;
        self.command_id = command_id;
        self.buffer = frame;

        let accepted = retry::retry(
            &config.retry,
            || match handle.write(frame.as_bytes()) {
                Ok(n) if n > 0 => Some(()),
                Ok(_) => None,
                Err(e) => {
                    log::debug!("write '{}': {e}", code as char);
                    None
                }
            },
            |n| log::debug!("write '{}' not accepted (attempt {n})", code as char),
        );
        if accepted.is_none() {
            return Err(FinchError::Connection(format!(
                "write '{}' not accepted after {} attempts",
                code as char,
                config.retry.max_attempts.max(1)
            )));
        }
        self.last_sent = Instant::now();
        log::trace!("sent {frame:?}");
        Ok(())
    }

    /// Read until a report arrives (with the current command id, when
    /// `match_id` is set) or the reply deadline passes.
    fn receive(&mut self, config: &ConnectionConfig, match_id: bool) -> Result<Frame> {
        let expected = self.command_id;
        let Some(handle) = self.handle.as_mut() else {
            return Err(FinchError::NotOpen);
        };
        let started = Instant::now();
        let deadline = started + config.reply_deadline;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(FinchError::ProtocolTimeout {
                    command_id: expected,
                    waited: now - started,
                });
            }
            let wait = config.read_timeout.min(deadline - now);
            match handle.read(wait) {
                Ok(Some(bytes)) => {
                    let frame = Frame::from_bytes(bytes);
                    if !match_id || frame.command_id() == expected {
                        log::trace!("received {frame:?}");
                        self.buffer = frame;
                        return Ok(frame);
                    }
                    log::debug!("discarding stale report {frame:?} (want id {expected})");
                }
                Ok(None) => {}
                Err(e) => return Err(FinchError::Connection(e.to_string())),
            }
        }
    }

    /// Discard reports already buffered by the OS, so the next read is a
    /// reply to something this connection sent.
    fn drain(&mut self, config: &ConnectionConfig) -> Result<usize> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(FinchError::NotOpen);
        };
        let deadline = Instant::now() + config.reply_deadline;
        let mut discarded = 0;
        while Instant::now() < deadline {
            match handle.read(config.read_timeout) {
                Ok(Some(bytes)) => {
                    discarded += 1;
                    log::debug!("discarding buffered report {:?}", Frame::from_bytes(bytes));
                }
                Ok(None) => break,
                Err(e) => return Err(FinchError::Connection(e.to_string())),
            }
        }
        Ok(discarded)
    }

    /// Drain stale input, ping, and take the counter from the reply.
    fn sync_command_id(&mut self, config: &ConnectionConfig) -> Result<u8> {
        self.drain(config)?;
        self.send(config, QUERY_COMMAND_ID, &[])?;
        let reply = self.receive(config, false)?;
        let id = commands::decode_command_id(&reply);
        if reply.command_id() != id {
            log::debug!(
                "ping reply id byte {} differs from counter {id}",
                reply.command_id()
            );
        }
        Ok(id)
    }

    /// Best-effort reset to idle, then drop the handle. Returns the path
    /// that was held, if any.
    fn teardown(&mut self) -> Option<DevicePath> {
        if let Some(handle) = self.handle.as_mut() {
            // Single attempt: the robot may already be gone.
            let reset = commands::reset();
            match Frame::command(reset.code, &reset.payload, self.command_id) {
                Ok(frame) => match handle.write(frame.as_bytes()) {
                    Ok(n) if n > 0 => {}
                    Ok(_) => log::debug!("reset on close not accepted"),
                    Err(e) => log::warn!("reset on close failed: {e}"),
                },
                Err(e) => log::warn!("reset on close: {e}"),
            }
        }
        let path = self.path.take();
        *self = Link::fresh();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CMD_LED, CMD_LIGHT, CMD_RESET, CMD_TEMPERATURE};
    use crate::transport::mock::{INITIAL_COUNTER, MockTransport};

    fn fast_config() -> ConnectionConfig {
        ConnectionConfig {
            ping_threshold: Duration::from_secs(60),
            keepalive_tick: Duration::from_millis(5),
            read_timeout: Duration::from_millis(2),
            reply_deadline: Duration::from_millis(100),
            retry: RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                multiplier: 2.0,
            },
            close_on_keepalive_failure: true,
        }
    }

    fn setup(robots: usize) -> (Arc<MockTransport>, Arc<ConnectionRegistry>) {
        (
            Arc::new(MockTransport::new(robots)),
            Arc::new(ConnectionRegistry::new()),
        )
    }

    fn connection(t: &Arc<MockTransport>, r: &Arc<ConnectionRegistry>) -> FinchConnection {
        FinchConnection::new(
            Arc::clone(t) as Arc<dyn HidTransport>,
            Arc::clone(r),
            fast_config(),
        )
    }

    #[test]
    fn starts_closed() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.path().is_none());
        assert!(!conn.keepalive_running());
    }

    #[test]
    fn open_syncs_command_id() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        assert!(conn.is_open());
        assert_eq!(conn.command_id(), INITIAL_COUNTER + 1);
        assert_eq!(t.robot(0).count(CMD_PING), 1);
        assert!(conn.keepalive_running());
        conn.close();
    }

    #[test]
    fn open_discards_reports_buffered_before_sync() {
        let (t, r) = setup(1);
        let robot = t.robot(0);
        robot.inject_report([9, 9, 9, 9, 9, 9, 9, 9, INITIAL_COUNTER]);
        robot.set_sensor(CMD_TEMPERATURE, [127, 0, 0, 0, 0, 0, 0, 0]);
        robot.set_sensor(CMD_LIGHT, [255, 0, 0, 0, 0, 0, 0, 0]);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        assert_eq!(conn.command_id(), robot.counter());

        assert_eq!(conn.request(CMD_TEMPERATURE).unwrap().byte(0), 127);
        let light = conn.request(CMD_LIGHT).unwrap();
        assert_eq!((light.byte(0), light.byte(1)), (255, 0));
        assert_eq!(conn.request(CMD_TEMPERATURE).unwrap().byte(0), 127);
        assert_eq!(conn.command_id(), robot.counter());
        conn.close();
    }

    #[test]
    fn send_requires_open() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        assert!(matches!(conn.send(CMD_LED, &[1, 2, 3]), Err(FinchError::NotOpen)));
        assert!(matches!(conn.receive(), Err(FinchError::NotOpen)));
        assert!(matches!(conn.request(CMD_TEMPERATURE), Err(FinchError::NotOpen)));
    }

    #[test]
    fn payload_keeps_id_and_query_advances_it() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        let id = conn.command_id();

        conn.send(CMD_LED, &[1, 2, 3]).unwrap();
        assert_eq!(conn.command_id(), id);
        let last = *t.robot(0).written().last().unwrap();
        assert_eq!(last.as_bytes(), &[0, b'O', 1, 2, 3, 0, 0, 0, id]);

        conn.request(CMD_TEMPERATURE).unwrap();
        assert_eq!(conn.command_id(), id.wrapping_add(1));
        conn.close();
    }

    #[test]
    fn command_id_wraps() {
        let (t, r) = setup(1);
        t.robot(0).set_counter(0xFE);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        assert_eq!(conn.command_id(), 0xFF);
        let reply = conn.request(CMD_TEMPERATURE).unwrap();
        assert_eq!(conn.command_id(), 0x00);
        assert_eq!(reply.command_id(), 0x00);
        conn.close();
    }

    #[test]
    fn consecutive_queries_track_counter_across_wrap() {
        let (t, r) = setup(1);
        let robot = t.robot(0);
        robot.set_counter(0xC0);
        robot.set_sensor(CMD_TEMPERATURE, [127, 0, 0, 0, 0, 0, 0, 0]);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        let start = conn.command_id();

        for n in 1..=300u32 {
            if n == 150 {
                // Echoes the current id, which the next query moves past.
                robot.inject_report([1, 1, 1, 1, 1, 1, 1, 1, conn.command_id()]);
            }
            let reply = conn.request(CMD_TEMPERATURE).unwrap();
            let expected = ((u32::from(start) + n) % 256) as u8;
            assert_eq!(conn.command_id(), expected);
            assert_eq!(reply.command_id(), expected);
            assert_eq!(reply.byte(0), 127);
        }
        assert_eq!(conn.command_id(), ((u32::from(start) + 300) % 256) as u8);
        assert_eq!(conn.command_id(), robot.counter());
        conn.close();
    }

    #[test]
    fn oversized_payload_does_not_touch_id() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        let id = conn.command_id();
        assert!(matches!(
            conn.send(CMD_LED, &[0; 7]),
            Err(FinchError::InvalidArgument(_))
        ));
        assert_eq!(conn.command_id(), id);
        conn.close();
    }

    #[test]
    fn stale_report_is_discarded() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        let robot = t.robot(0);
        robot.set_sensor(CMD_TEMPERATURE, [200, 0, 0, 0, 0, 0, 0, 0]);
        robot.inject_report([1, 0, 0, 0, 0, 0, 0, 0, conn.command_id()]);

        let reply = conn.request(CMD_TEMPERATURE).unwrap();
        assert_eq!(reply.byte(0), 200);
        assert_eq!(reply.command_id(), conn.command_id());
        conn.close();
    }

    #[test]
    fn missing_reply_times_out() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        t.robot(0).set_silent(true);
        let err = conn.request(CMD_TEMPERATURE).unwrap_err();
        assert!(matches!(err, FinchError::ProtocolTimeout { .. }));
        conn.close();
    }

    #[test]
    fn write_retried_then_accepted() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        let robot = t.robot(0);
        robot.fail_next_writes(2);
        conn.send(CMD_LED, &[9, 9, 9]).unwrap();
        assert_eq!(robot.count(CMD_LED), 1);
        conn.close();
    }

    #[test]
    fn write_gives_up_after_bounded_attempts() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        t.robot(0).fail_next_writes(10);
        let err = conn.send(CMD_LED, &[9, 9, 9]).unwrap_err();
        assert!(matches!(err, FinchError::Connection(_)));
        conn.close();
    }

    #[test]
    fn close_resets_and_releases() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        let robot = t.robot(0);
        conn.close();

        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(robot.open_handles(), 0);
        let last = *robot.written().last().unwrap();
        assert_eq!(last.code(), CMD_RESET);
        assert_eq!(last.payload()[0], 0);
        assert!(r.is_empty());
        assert!(!conn.keepalive_running());
    }

    #[test]
    fn close_is_idempotent() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.close();
        conn.open().unwrap();
        conn.close();
        conn.close();
        assert_eq!(t.robot(0).count(CMD_RESET), 1);
        assert_eq!(conn.command_id(), 0);
    }

    #[test]
    fn reopen_closes_first() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        conn.open().unwrap();
        let robot = t.robot(0);
        assert_eq!(robot.opens_total(), 2);
        assert_eq!(robot.open_handles(), 1);
        assert_eq!(robot.count(CMD_RESET), 1);
        conn.close();
    }

    #[test]
    fn open_failure_leaves_closed_and_unclaimed() {
        let (t, r) = setup(1);
        t.robot(0).fail_open(true);
        let conn = connection(&t, &r);
        let err = conn.open().unwrap_err();
        assert!(matches!(err, FinchError::Connection(_)));
        assert!(!conn.is_open());
        assert!(r.is_empty());
    }

    #[test]
    fn silent_robot_fails_open() {
        let (t, r) = setup(1);
        t.robot(0).set_silent(true);
        let conn = connection(&t, &r);
        let err = conn.open().unwrap_err();
        assert!(matches!(err, FinchError::Connection(_)));
        assert!(!conn.is_open());
        assert!(r.is_empty());
        assert_eq!(t.robot(0).open_handles(), 0);
    }

    #[test]
    fn enumeration_failure_is_transport_error() {
        let (t, r) = setup(1);
        t.fail_enumeration(true);
        let conn = connection(&t, &r);
        assert!(matches!(conn.open(), Err(FinchError::Transport(_))));
    }

    #[test]
    fn no_robot_is_not_found() {
        let (t, r) = setup(0);
        let conn = connection(&t, &r);
        assert!(matches!(
            conn.open(),
            Err(FinchError::DeviceNotFound { in_use: 0 })
        ));
    }

    #[test]
    fn dropping_last_handle_closes() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        drop(conn);
        // The keep-alive thread may hold the last reference for one tick.
        let robot = t.robot(0);
        let deadline = Instant::now() + Duration::from_secs(2);
        while robot.open_handles() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(robot.open_handles(), 0);
        assert_eq!(robot.count(CMD_RESET), 1);
        assert!(r.is_empty());
    }

    #[test]
    fn read_command_id_resyncs() {
        let (t, r) = setup(1);
        let conn = connection(&t, &r);
        conn.open().unwrap();
        t.robot(0).set_counter(0x10);
        assert_eq!(conn.read_command_id().unwrap(), 0x11);
        assert_eq!(conn.command_id(), 0x11);
        conn.close();
    }
}
