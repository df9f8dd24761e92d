//! Move Deadline Supervision
//!
//! One deadline is armed per outstanding move request. A sleeper task
//! waits for the soft and hard instants and reports them on a channel; the
//! session consumes the reports under its own lock and asks
//! [`TimeoutSupervisor::accept`] whether a report still applies.
//!
//! Every arm produces a fresh [`DeadlineToken`]. Re-arming or disarming
//! aborts the sleeper, and reports carrying an old token are rejected, so
//! a move accepted before a report is processed always wins.
//!
//! The clock is pause-aware: a frozen deadline does not consume time.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::game::player::{ActionTimeout, Team};

/// Identity of one armed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeadlineToken(u64);

/// Deadline stage that elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePhase {
    /// Warning only
    Soft,
    /// Forfeit
    Hard,
}

/// Report sent by a sleeper task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineFired {
    /// Deadline the report belongs to
    pub token: DeadlineToken,
    /// Team the deadline was armed for
    pub team: Team,
    /// Elapsed stage
    pub phase: DeadlinePhase,
}

// =============================================================================
// MOVE CLOCK
// =============================================================================

/// Stopwatch that can be frozen and thawed.
#[derive(Debug, Clone, Copy)]
pub struct MoveClock {
    consumed: Duration,
    running_since: Option<Instant>,
}

impl MoveClock {
    /// Start a running clock at zero.
    pub fn start() -> Self {
        Self {
            consumed: Duration::ZERO,
            running_since: Some(Instant::now()),
        }
    }

    /// Time consumed so far, excluding frozen periods.
    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.consumed + since.elapsed(),
            None => self.consumed,
        }
    }

    /// Stop consuming time.
    pub fn freeze(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.consumed += since.elapsed();
        }
    }

    /// Continue consuming time.
    pub fn thaw(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Whether the clock is stopped.
    pub fn is_frozen(&self) -> bool {
        self.running_since.is_none()
    }
}

// =============================================================================
// SUPERVISOR
// =============================================================================

struct ArmedDeadline {
    token: DeadlineToken,
    team: Team,
    timeout: ActionTimeout,
    clock: MoveClock,
    soft_reported: bool,
    sleeper: Option<JoinHandle<()>>,
}

impl ArmedDeadline {
    fn stop_sleeper(&mut self) {
        if let Some(handle) = self.sleeper.take() {
            handle.abort();
        }
    }
}

/// Arms, freezes and invalidates move deadlines of one session.
///
/// Must be used from within a tokio runtime.
pub struct TimeoutSupervisor {
    tx: mpsc::UnboundedSender<DeadlineFired>,
    next_token: u64,
    armed: Option<ArmedDeadline>,
}

impl TimeoutSupervisor {
    /// Create a supervisor and the receiver of its reports.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeadlineFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            tx,
            next_token: 0,
            armed: None,
        };
        (supervisor, rx)
    }

    /// Arm a fresh deadline for `team`, replacing any armed one.
    pub fn arm(&mut self, team: Team, timeout: ActionTimeout) -> DeadlineToken {
        self.disarm();

        let token = DeadlineToken(self.next_token);
        self.next_token += 1;

        let mut armed = ArmedDeadline {
            token,
            team,
            timeout,
            clock: MoveClock::start(),
            soft_reported: false,
            sleeper: None,
        };
        armed.sleeper = Some(self.spawn_sleeper(&armed));
        debug!(?token, %team, hard_ms = timeout.hard_timeout.as_millis() as u64, "deadline armed");
        self.armed = Some(armed);
        token
    }

    /// Invalidate the armed deadline.
    pub fn disarm(&mut self) {
        if let Some(mut armed) = self.armed.take() {
            armed.stop_sleeper();
        }
    }

    /// Stop the clock of the armed deadline.
    pub fn freeze(&mut self) {
        if let Some(armed) = self.armed.as_mut() {
            armed.clock.freeze();
            armed.stop_sleeper();
        }
    }

    /// Restart the clock of the armed deadline with its remaining budget.
    pub fn thaw(&mut self) {
        let Some(mut armed) = self.armed.take() else {
            return;
        };
        if armed.clock.is_frozen() {
            armed.clock.thaw();
            armed.sleeper = Some(self.spawn_sleeper(&armed));
        }
        self.armed = Some(armed);
    }

    /// Armed deadline, if any.
    pub fn current(&self) -> Option<(DeadlineToken, Team)> {
        self.armed.as_ref().map(|a| (a.token, a.team))
    }

    /// Whether the armed deadline is frozen.
    pub fn is_frozen(&self) -> bool {
        self.armed.as_ref().map_or(false, |a| a.clock.is_frozen())
    }

    /// Time left before the hard deadline of the armed deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|a| a.timeout.hard_timeout.saturating_sub(a.clock.elapsed()))
    }

    /// Decide whether a report still applies.
    ///
    /// Rejects reports of replaced deadlines, repeated soft reports and
    /// reports whose stage has not been reached on the pause-aware clock.
    pub fn accept(&mut self, fired: &DeadlineFired) -> bool {
        let Some(armed) = self.armed.as_mut() else {
            return false;
        };
        if armed.token != fired.token || armed.team != fired.team {
            return false;
        }
        let elapsed = armed.clock.elapsed();
        match fired.phase {
            DeadlinePhase::Soft => {
                let due = armed.timeout.soft_deadline().map_or(false, |soft| elapsed >= soft);
                if due && !armed.soft_reported {
                    armed.soft_reported = true;
                    true
                } else {
                    false
                }
            }
            DeadlinePhase::Hard => elapsed >= armed.timeout.hard_timeout,
        }
    }

    fn spawn_sleeper(&self, armed: &ArmedDeadline) -> JoinHandle<()> {
        let now = Instant::now();
        let elapsed = armed.clock.elapsed();
        let soft_at = armed
            .timeout
            .soft_deadline()
            .filter(|_| !armed.soft_reported)
            .map(|soft| now + soft.saturating_sub(elapsed));
        let hard_at = now + armed.timeout.hard_timeout.saturating_sub(elapsed);

        let tx = self.tx.clone();
        let (token, team) = (armed.token, armed.team);
        tokio::spawn(async move {
            if let Some(soft_at) = soft_at {
                sleep_until(soft_at).await;
                let _ = tx.send(DeadlineFired { token, team, phase: DeadlinePhase::Soft });
            }
            sleep_until(hard_at).await;
            let _ = tx.send(DeadlineFired { token, team, phase: DeadlinePhase::Hard });
        })
    }
}

impl Drop for TimeoutSupervisor {
    fn drop(&mut self) {
        self.disarm();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    fn timeouts() -> ActionTimeout {
        ActionTimeout::new(Duration::from_secs(2), Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_then_hard() {
        let (mut supervisor, mut rx) = TimeoutSupervisor::new();
        let token = supervisor.arm(Team::One, timeouts());

        let soft = rx.recv().await.unwrap();
        assert_eq!(soft, DeadlineFired { token, team: Team::One, phase: DeadlinePhase::Soft });
        assert!(supervisor.accept(&soft));
        assert!(!supervisor.accept(&soft));
        assert_eq!(supervisor.remaining(), Some(Duration::from_secs(8)));

        let hard = rx.recv().await.unwrap();
        assert_eq!(hard.phase, DeadlinePhase::Hard);
        assert!(supervisor.accept(&hard));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_invalidates_old_token() {
        let (mut supervisor, mut rx) = TimeoutSupervisor::new();
        let first = supervisor.arm(Team::One, ActionTimeout::hard_only(Duration::from_secs(1)));
        let second = supervisor.arm(Team::Two, ActionTimeout::hard_only(Duration::from_secs(1)));
        assert_ne!(first, second);

        let stale = DeadlineFired { token: first, team: Team::One, phase: DeadlinePhase::Hard };
        assert!(!supervisor.accept(&stale));

        // Only the live sleeper reports
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.token, second);
        assert!(supervisor.accept(&fired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_silences_sleeper() {
        let (mut supervisor, mut rx) = TimeoutSupervisor::new();
        let token = supervisor.arm(Team::One, timeouts());
        supervisor.disarm();
        assert_eq!(supervisor.current(), None);

        let waited = timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(waited.is_err(), "disarmed deadline reported");

        let late = DeadlineFired { token, team: Team::One, phase: DeadlinePhase::Hard };
        assert!(!supervisor.accept(&late));
    }

    #[tokio::test(start_paused = true)]
    async fn test_freeze_stops_clock() {
        let (mut supervisor, mut rx) = TimeoutSupervisor::new();
        supervisor.arm(Team::Two, ActionTimeout::hard_only(Duration::from_secs(10)));

        advance(Duration::from_secs(4)).await;
        supervisor.freeze();
        assert!(supervisor.is_frozen());

        let waited = timeout(Duration::from_secs(100), rx.recv()).await;
        assert!(waited.is_err(), "frozen deadline reported");
        assert_eq!(supervisor.remaining(), Some(Duration::from_secs(6)));

        supervisor.thaw();
        let start = Instant::now();
        let fired = rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert!(supervisor.accept(&fired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_clock() {
        let mut clock = MoveClock::start();
        advance(Duration::from_secs(3)).await;
        clock.freeze();
        advance(Duration::from_secs(5)).await;
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
        clock.thaw();
        advance(Duration::from_secs(1)).await;
        assert_eq!(clock.elapsed(), Duration::from_secs(4));
    }
}
