//! Background keep-alive: pings an idle robot so it does not time out.
//!
//! One thread per open connection. It wakes every tick, and when the
//! connection has been idle for longer than the ping threshold it issues a
//! ping under the connection's I/O lock. Stopping drops the channel sender,
//! which wakes the thread immediately; [`KeepAlive::stop`] then joins it.

use std::sync::Weak;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Result;

/// What a keep-alive tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    /// The connection was used recently; nothing sent.
    Idle,
    /// A ping was sent and its reply read.
    Pinged,
    /// The connection is closed; the task should exit.
    Closed,
}

/// The connection side of the keep-alive task.
pub(crate) trait KeepAliveTarget: Send + Sync {
    /// Ping if the last command is older than `threshold`.
    fn ping_if_idle(&self, threshold: Duration) -> Result<PingOutcome>;

    /// Tear the connection down after a failed ping. Must not join the
    /// keep-alive thread.
    fn abandon(&self);
}

/// Handle to a running keep-alive thread.
#[derive(Debug)]
pub(crate) struct KeepAlive {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl KeepAlive {
    pub(crate) fn spawn(
        target: Weak<dyn KeepAliveTarget>,
        tick: Duration,
        threshold: Duration,
        abandon_on_failure: bool,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("finch-keepalive".into())
            .spawn(move || {
                loop {
                    match rx.recv_timeout(tick) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    let Some(target) = target.upgrade() else {
                        break;
                    };
                    match target.ping_if_idle(threshold) {
                        Ok(PingOutcome::Closed) => break,
                        Ok(PingOutcome::Pinged) => log::trace!("keep-alive ping"),
                        Ok(PingOutcome::Idle) => {}
                        Err(e) => {
                            if abandon_on_failure {
                                log::warn!("keep-alive ping failed, closing connection: {e}");
                                target.abandon();
                                break;
                            }
                            log::warn!("keep-alive ping failed: {e}");
                        }
                    }
                }
                log::debug!("keep-alive stopped");
            })?;
        Ok(KeepAlive {
            stop: Some(tx),
            thread: Some(thread),
        })
    }

    /// Signal the thread and wait for it to exit.
    ///
    /// When called from the keep-alive thread itself (the last connection
    /// handle was dropped there) the join is skipped; the thread is already
    /// on its way out.
    pub(crate) fn stop(mut self) {
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                log::warn!("keep-alive thread panicked");
            }
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinchError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    struct FakeTarget {
        pings: AtomicUsize,
        open: AtomicBool,
        fail: AtomicBool,
        abandoned: AtomicBool,
    }

    impl FakeTarget {
        fn new() -> Arc<Self> {
            Arc::new(FakeTarget {
                pings: AtomicUsize::new(0),
                open: AtomicBool::new(true),
                fail: AtomicBool::new(false),
                abandoned: AtomicBool::new(false),
            })
        }
    }

    impl KeepAliveTarget for FakeTarget {
        fn ping_if_idle(&self, _threshold: Duration) -> Result<PingOutcome> {
            if !self.open.load(Ordering::SeqCst) {
                return Ok(PingOutcome::Closed);
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(FinchError::NotOpen);
            }
            self.pings.fetch_add(1, Ordering::SeqCst);
            Ok(PingOutcome::Pinged)
        }

        fn abandon(&self) {
            self.abandoned.store(true, Ordering::SeqCst);
        }
    }

    fn spawn(target: &Arc<FakeTarget>, abandon: bool) -> KeepAlive {
        let weak: Weak<dyn KeepAliveTarget> = Arc::downgrade(target) as Weak<dyn KeepAliveTarget>;
        KeepAlive::spawn(
            weak,
            Duration::from_millis(5),
            Duration::from_millis(0),
            abandon,
        )
        .unwrap()
    }

    fn wait_until(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn ticks_until_stopped() {
        let target = FakeTarget::new();
        let ka = spawn(&target, true);
        assert!(wait_until(|| target.pings.load(Ordering::SeqCst) >= 3));
        ka.stop();
        let after = target.pings.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(target.pings.load(Ordering::SeqCst), after);
    }

    #[test]
    fn exits_when_target_closes() {
        let target = FakeTarget::new();
        let ka = spawn(&target, true);
        target.open.store(false, Ordering::SeqCst);
        assert!(wait_until(|| ka.is_finished()));
        ka.stop();
    }

    #[test]
    fn exits_when_target_dropped() {
        let target = FakeTarget::new();
        let ka = spawn(&target, true);
        drop(target);
        assert!(wait_until(|| ka.is_finished()));
        ka.stop();
    }

    #[test]
    fn failure_abandons_target() {
        let target = FakeTarget::new();
        target.fail.store(true, Ordering::SeqCst);
        let ka = spawn(&target, true);
        assert!(wait_until(|| ka.is_finished()));
        assert!(target.abandoned.load(Ordering::SeqCst));
        ka.stop();
    }

    #[test]
    fn failure_tolerated_when_not_abandoning() {
        let target = FakeTarget::new();
        target.fail.store(true, Ordering::SeqCst);
        let ka = spawn(&target, false);
        thread::sleep(Duration::from_millis(30));
        assert!(!ka.is_finished());
        assert!(!target.abandoned.load(Ordering::SeqCst));
        ka.stop();
    }
}
