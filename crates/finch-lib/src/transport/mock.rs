//! In-memory robots for unit and integration tests.
//!
//! Always compiled, hidden from public docs. Each [`MockRobot`] mirrors the
//! firmware's behaviour closely enough to exercise the protocol core: query
//! commands bump its command counter and queue a reply stamped with the new
//! counter, write-only commands are recorded and produce no reply.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{DevicePath, HidHandle, HidTransport, Result, TransportError};
use crate::protocol::{CMD_PING, FRAME_LEN, Frame, PRODUCT_ID, VENDOR_ID, is_query};

/// Counter value a fresh mock robot starts from. Non-zero, so a connection
/// that skips the id sync is caught.
pub const INITIAL_COUNTER: u8 = 0x40;

/// A bus of mock robots.
pub struct MockTransport {
    bus: Mutex<Bus>,
}

struct Bus {
    robots: Vec<(DevicePath, Arc<MockRobot>)>,
    fail_enumeration: bool,
}

impl MockTransport {
    /// A bus with `count` robots at `mock://finch-0`, `mock://finch-1`, …
    pub fn new(count: usize) -> Self {
        let robots = (0..count)
            .map(|i| {
                (
                    DevicePath::new(format!("mock://finch-{i}")),
                    Arc::new(MockRobot::new()),
                )
            })
            .collect();
        MockTransport {
            bus: Mutex::new(Bus {
                robots,
                fail_enumeration: false,
            }),
        }
    }

    fn bus(&self) -> MutexGuard<'_, Bus> {
        self.bus.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plug in another robot.
    pub fn attach(&self, path: DevicePath) -> Arc<MockRobot> {
        let robot = Arc::new(MockRobot::new());
        self.bus().robots.push((path, Arc::clone(&robot)));
        robot
    }

    /// Robot by bus position.
    pub fn robot(&self, index: usize) -> Arc<MockRobot> {
        Arc::clone(&self.bus().robots[index].1)
    }

    /// Robot by path.
    pub fn robot_at(&self, path: &DevicePath) -> Option<Arc<MockRobot>> {
        self.bus()
            .robots
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, r)| Arc::clone(r))
    }

    /// Make `enumerate` fail.
    pub fn fail_enumeration(&self, fail: bool) {
        self.bus().fail_enumeration = fail;
    }
}

impl HidTransport for MockTransport {
    fn enumerate(&self, vendor_id: u16, product_id: u16) -> Result<Vec<DevicePath>> {
        let bus = self.bus();
        if bus.fail_enumeration {
            return Err(TransportError::Enumerate(
                "mock: enumeration failure injected".into(),
            ));
        }
        if vendor_id != VENDOR_ID || product_id != PRODUCT_ID {
            return Ok(Vec::new());
        }
        Ok(bus.robots.iter().map(|(p, _)| p.clone()).collect())
    }

    fn open(&self, path: &DevicePath) -> Result<Box<dyn HidHandle>> {
        let robot = self
            .robot_at(path)
            .ok_or_else(|| TransportError::Open(format!("{path}: no such device")))?;
        {
            let mut state = robot.state();
            if state.fail_open {
                return Err(TransportError::Open(format!(
                    "{path}: mock open failure injected"
                )));
            }
            state.open_handles += 1;
            state.opens_total += 1;
        }
        Ok(Box::new(MockHandle { robot }))
    }
}

/// One simulated robot.
pub struct MockRobot {
    state: Mutex<RobotState>,
}

struct RobotState {
    counter: u8,
    /// Queued reports; the flag marks genuine replies (as opposed to injected stale ones).
    pending: VecDeque<([u8; FRAME_LEN], bool)>,
    written: Vec<Frame>,
    sensors: HashMap<u8, [u8; 8]>,
    fail_writes: usize,
    fail_open: bool,
    silent: bool,
    unplugged: bool,
    open_handles: usize,
    opens_total: usize,
    interleaved: usize,
}

impl MockRobot {
    fn new() -> Self {
        MockRobot {
            state: Mutex::new(RobotState {
                counter: INITIAL_COUNTER,
                pending: VecDeque::new(),
                written: Vec::new(),
                sensors: HashMap::new(),
                fail_writes: 0,
                fail_open: false,
                silent: false,
                unplugged: false,
                open_handles: 0,
                opens_total: 0,
                interleaved: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RobotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the data bytes (reply indices 0..8) returned for a query code.
    pub fn set_sensor(&self, code: u8, data: [u8; 8]) {
        self.state().sensors.insert(code, data);
    }

    /// Queue a report ahead of any genuine reply (a stale buffered report).
    pub fn inject_report(&self, report: [u8; FRAME_LEN]) {
        self.state().pending.push_back((report, false));
    }

    /// Reject the next `n` writes with a zero-length write.
    pub fn fail_next_writes(&self, n: usize) {
        self.state().fail_writes = n;
    }

    /// Make `open` fail.
    pub fn fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    /// Accept commands but never reply.
    pub fn set_silent(&self, silent: bool) {
        self.state().silent = silent;
    }

    /// Every write and read fails from now on.
    pub fn unplug(&self) {
        self.state().unplugged = true;
    }

    /// The device's current command counter.
    pub fn counter(&self) -> u8 {
        self.state().counter
    }

    pub fn set_counter(&self, counter: u8) {
        self.state().counter = counter;
    }

    /// Every frame written so far, in order.
    pub fn written(&self) -> Vec<Frame> {
        self.state().written.clone()
    }

    /// Number of written frames with the given command code.
    pub fn count(&self, code: u8) -> usize {
        self.state().written.iter().filter(|f| f.code() == code).count()
    }

    /// Handles currently open on this robot.
    pub fn open_handles(&self) -> usize {
        self.state().open_handles
    }

    /// Total successful opens over the robot's lifetime.
    pub fn opens_total(&self) -> usize {
        self.state().opens_total
    }

    /// Queries written while a previous reply was still unread.
    pub fn interleaved(&self) -> usize {
        self.state().interleaved
    }
}

struct MockHandle {
    robot: Arc<MockRobot>,
}

impl HidHandle for MockHandle {
    fn write(&mut self, report: &[u8; FRAME_LEN]) -> Result<usize> {
        let mut state = self.robot.state();
        if state.unplugged {
            return Err(TransportError::Write("mock: device unplugged".into()));
        }
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Ok(0);
        }
        let frame = Frame::from_bytes(*report);
        state.written.push(frame);
        let code = frame.code();
        if !is_query(code) {
            return Ok(FRAME_LEN);
        }
        if state.pending.iter().any(|(_, genuine)| *genuine) {
            state.interleaved += 1;
        }
        state.counter = state.counter.wrapping_add(1);
        if !state.silent {
            let mut reply = [0u8; FRAME_LEN];
            if let Some(data) = state.sensors.get(&code) {
                reply[..8].copy_from_slice(data);
            }
            if code == CMD_PING {
                reply[0] = state.counter;
            }
            reply[FRAME_LEN - 1] = state.counter;
            state.pending.push_back((reply, true));
        }
        Ok(FRAME_LEN)
    }

    fn read(&mut self, timeout: Duration) -> Result<Option<[u8; FRAME_LEN]>> {
        for attempt in 0..2 {
            {
                let mut state = self.robot.state();
                if state.unplugged {
                    return Err(TransportError::Read("mock: device unplugged".into()));
                }
                if let Some((report, _)) = state.pending.pop_front() {
                    return Ok(Some(report));
                }
            }
            if attempt == 0 {
                std::thread::sleep(timeout);
            }
        }
        Ok(None)
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let mut state = self.robot.state();
        state.open_handles = state.open_handles.saturating_sub(1);
        state.pending.clear();
    }
}
