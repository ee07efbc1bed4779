//! Link-health supervision.
//!
//! The remote controller publishes a periodic heartbeat carrying its
//! wall-clock time. [`HeartbeatListener`] records the local arrival time
//! of each beat and, when remote and local wall clocks disagree by more
//! than the configured skew, fires one best-effort clock correction.
//! [`LinkWatchdog`] polls the recorded arrival time on a coarse cadence
//! and reopens the transport session once per stale tick. The two
//! cadences are deliberately independent: transient clock skew must not
//! trigger reconnect storms, and a dead link must not block clock
//! corrections that are already in flight.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};

use crate::config::LinkConfig;
use crate::publish::TransportError;

/// Milliseconds since the Unix epoch on the local wall clock.
pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Local arrival time of the most recent remote heartbeat.
///
/// Single writer (the heartbeat listener), single reader (the watchdog);
/// a plain atomic is all the synchronization this needs.
#[derive(Debug, Default)]
pub struct HeartbeatState {
    last_seen_ms: AtomicI64,
}

impl HeartbeatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, now_ms: i64) {
        self.last_seen_ms.store(now_ms, Ordering::Relaxed);
    }

    /// `None` until the first heartbeat arrives.
    pub fn last_seen_ms(&self) -> Option<i64> {
        match self.last_seen_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }
}

/// Best-effort local clock correction; failures are logged and dropped.
pub trait ClockAdjuster: Send + Sync {
    /// Shift the local clock by `offset_ms` (positive means the local
    /// clock is ahead and should move back).
    fn adjust(&self, offset_ms: i64) -> std::io::Result<()>;
}

/// Callback side of the heartbeat subscription.
pub struct HeartbeatListener<C: ClockAdjuster + 'static> {
    state: Arc<HeartbeatState>,
    clock: Arc<C>,
    max_skew_ms: i64,
}

impl<C: ClockAdjuster + 'static> HeartbeatListener<C> {
    pub fn new(state: Arc<HeartbeatState>, clock: Arc<C>, config: &LinkConfig) -> Self {
        Self {
            state,
            clock,
            max_skew_ms: config.max_clock_skew_ms as i64,
        }
    }

    /// Invoked by the transport whenever the remote liveness value
    /// updates; `remote_epoch_ms` is the wall-clock time it encodes.
    ///
    /// The clock correction runs on a throwaway thread so a slow or
    /// hanging adjustment can never delay heartbeat accounting or
    /// publication. It is fired at most once per beat and never retried
    /// synchronously.
    pub fn on_heartbeat(&self, remote_epoch_ms: i64) {
        let now = epoch_ms();
        self.state.mark(now);

        let skew = now - remote_epoch_ms;
        if skew.abs() <= self.max_skew_ms {
            return;
        }

        debug!("wall clock skew {skew} ms exceeds limit of {} ms", self.max_skew_ms);
        let clock = Arc::clone(&self.clock);
        thread::spawn(move || match clock.adjust(skew) {
            Ok(()) => info!("local clock adjusted by {} ms", -skew),
            Err(err) => warn!("clock adjustment failed: {err}"),
        });
    }
}

/// Link health as the watchdog sees it. There is no terminal state; the
/// watchdog runs for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Stale,
    Reconnecting,
}

/// Teardown/reopen handle on the transport session.
pub trait SessionControl {
    fn reopen(&mut self) -> Result<(), TransportError>;
}

/// Coarse polling loop that recovers a lost transport link.
pub struct LinkWatchdog<S: SessionControl> {
    heartbeat: Arc<HeartbeatState>,
    session: S,
    stale_after_ms: i64,
    poll_interval: Duration,
    started_ms: i64,
    state: LinkState,
}

impl<S: SessionControl> LinkWatchdog<S> {
    pub fn new(heartbeat: Arc<HeartbeatState>, session: S, config: &LinkConfig) -> Self {
        Self {
            heartbeat,
            session,
            stale_after_ms: config.stale_after_ms as i64,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            started_ms: epoch_ms(),
            state: LinkState::Connected,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// One poll tick: at most one reopen attempt, however long the link
    /// has been stale. Reopen failure is logged and retried on the next
    /// tick, never propagated.
    pub fn poll(&mut self, now_ms: i64) {
        let last = self.heartbeat.last_seen_ms().unwrap_or(self.started_ms);
        let elapsed = now_ms - last;

        if elapsed <= self.stale_after_ms {
            if self.state != LinkState::Connected {
                info!("remote heartbeat restored after {elapsed} ms");
                self.state = LinkState::Connected;
            }
            return;
        }

        if self.state == LinkState::Connected {
            warn!("remote link stale: no heartbeat for {elapsed} ms");
            self.state = LinkState::Stale;
        }

        match self.session.reopen() {
            Ok(()) => {
                info!("transport session reopened; waiting for heartbeat");
                self.state = LinkState::Reconnecting;
            }
            Err(err) => warn!("session reopen failed: {err}; retrying next tick"),
        }
    }

    /// Poll until shutdown is signalled.
    pub fn run(&mut self, shutdown: &Receiver<()>) {
        loop {
            match shutdown.recv_timeout(self.poll_interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("watchdog shutting down");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => self.poll(epoch_ms()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    struct CountingSession {
        attempts: usize,
        fail: bool,
    }

    impl SessionControl for CountingSession {
        fn reopen(&mut self) -> Result<(), TransportError> {
            self.attempts += 1;
            if self.fail {
                Err(TransportError::Reopen("refused".into()))
            } else {
                Ok(())
            }
        }
    }

    fn watchdog(heartbeat: Arc<HeartbeatState>, fail: bool) -> LinkWatchdog<CountingSession> {
        LinkWatchdog::new(
            heartbeat,
            CountingSession { attempts: 0, fail },
            &LinkConfig::default(),
        )
    }

    #[test]
    fn fresh_heartbeat_keeps_link_connected() {
        let hb = Arc::new(HeartbeatState::new());
        let mut wd = watchdog(Arc::clone(&hb), false);
        hb.mark(10_000);
        wd.poll(10_500);
        assert_eq!(wd.state(), LinkState::Connected);
        assert_eq!(wd.session.attempts, 0);
    }

    #[test]
    fn one_reconnect_per_stale_tick() {
        let hb = Arc::new(HeartbeatState::new());
        hb.mark(10_000);
        let mut wd = watchdog(Arc::clone(&hb), false);

        // Five seconds stale, one tick: exactly one attempt.
        wd.poll(15_000);
        assert_eq!(wd.session.attempts, 1);
        assert_eq!(wd.state(), LinkState::Reconnecting);

        // Still stale on the next tick: one more attempt, not thousands.
        wd.poll(16_000);
        assert_eq!(wd.session.attempts, 2);
    }

    #[test]
    fn reopen_failure_is_retried_next_tick() {
        let hb = Arc::new(HeartbeatState::new());
        hb.mark(10_000);
        let mut wd = watchdog(Arc::clone(&hb), true);

        wd.poll(15_000);
        assert_eq!(wd.state(), LinkState::Stale);
        wd.poll(16_000);
        assert_eq!(wd.session.attempts, 2);
    }

    #[test]
    fn heartbeat_return_restores_connected() {
        let hb = Arc::new(HeartbeatState::new());
        hb.mark(10_000);
        let mut wd = watchdog(Arc::clone(&hb), false);
        wd.poll(15_000);
        assert_eq!(wd.state(), LinkState::Reconnecting);

        hb.mark(15_500);
        wd.poll(16_000);
        assert_eq!(wd.state(), LinkState::Connected);
    }

    #[test]
    fn never_seen_heartbeat_counts_from_watchdog_start() {
        let hb = Arc::new(HeartbeatState::new());
        let mut wd = watchdog(Arc::clone(&hb), false);
        let start = wd.started_ms;

        wd.poll(start + 500);
        assert_eq!(wd.session.attempts, 0);
        wd.poll(start + 1_500);
        assert_eq!(wd.session.attempts, 1);
    }

    struct ChannelClock(crossbeam::channel::Sender<i64>);

    impl ClockAdjuster for ChannelClock {
        fn adjust(&self, offset_ms: i64) -> std::io::Result<()> {
            self.0.send(offset_ms).ok();
            Ok(())
        }
    }

    #[test]
    fn large_skew_spawns_one_clock_adjustment() {
        let (tx, rx) = unbounded();
        let hb = Arc::new(HeartbeatState::new());
        let listener =
            HeartbeatListener::new(Arc::clone(&hb), Arc::new(ChannelClock(tx)), &LinkConfig::default());

        // Remote clock 10 seconds behind local.
        listener.on_heartbeat(epoch_ms() - 10_000);

        let offset = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("adjustment fired");
        assert!(offset >= 9_000, "offset was {offset}");
        assert!(hb.last_seen_ms().is_some());
        // Exactly one adjustment per beat.
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn small_skew_only_marks_the_heartbeat() {
        let (tx, rx) = unbounded();
        let hb = Arc::new(HeartbeatState::new());
        let listener =
            HeartbeatListener::new(Arc::clone(&hb), Arc::new(ChannelClock(tx)), &LinkConfig::default());

        listener.on_heartbeat(epoch_ms() - 100);
        assert!(hb.last_seen_ms().is_some());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn watchdog_run_stops_on_shutdown() {
        let hb = Arc::new(HeartbeatState::new());
        let mut wd = watchdog(hb, false);
        let (tx, rx) = unbounded::<()>();
        tx.send(()).expect("signal");
        wd.run(&rx);
    }
}
