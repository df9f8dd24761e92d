//! Players, Teams and Move Timeouts
//!
//! A [`Player`] is one seat of a session. Its identity is the pair
//! `(team, display_name)`; the runtime flags tracked by [`PlayerStatus`]
//! never take part in equality, so a snapshot of a seat still compares
//! equal to the live seat after it has timed out or left.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use serde::{Serialize, Deserialize};

// =============================================================================
// TEAM
// =============================================================================

/// One of the two sides of a duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// First seat
    One,
    /// Second seat
    Two,
}

impl Team {
    /// Both teams in seat order.
    pub const ALL: [Team; 2] = [Team::One, Team::Two];

    /// The other team.
    #[inline]
    pub fn opponent(self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    /// Seat index (0 or 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Team::One => 0,
            Team::Two => 1,
        }
    }

    /// Team for a seat index.
    pub fn from_index(index: usize) -> Option<Team> {
        match index {
            0 => Some(Team::One),
            1 => Some(Team::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::One => write!(f, "ONE"),
            Team::Two => write!(f, "TWO"),
        }
    }
}

// =============================================================================
// PLAYER STATUS
// =============================================================================

/// Why a player left the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectCause {
    /// Client asked to leave.
    Exit,
    /// Transport lost the connection.
    ConnectionLost,
    /// Client sent something the transport could not decode.
    ProtocolError,
    /// No cause reported.
    Unknown,
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DisconnectCause::Exit => "exit",
            DisconnectCause::ConnectionLost => "connection lost",
            DisconnectCause::ProtocolError => "protocol error",
            DisconnectCause::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// Connection and rule standing of a player.
///
/// `HardTimeout`, `Left` and `Violated` are terminal; only `Left` may still
/// overwrite another terminal state.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Connected and in good standing.
    #[default]
    Active,
    /// Missed the soft deadline of the current move request.
    SoftTimeout,
    /// Missed the hard deadline; forfeits the game.
    HardTimeout,
    /// Disconnected.
    Left {
        /// Reported cause
        cause: DisconnectCause,
    },
    /// Submitted a move the rules rejected.
    Violated {
        /// Rule explanation
        reason: String,
    },
}

impl PlayerStatus {
    /// Whether no further transition except leaving is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlayerStatus::HardTimeout | PlayerStatus::Left { .. } | PlayerStatus::Violated { .. }
        )
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// A seat in a session.
///
/// Equality and hashing only consider `team` and `display_name`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    team: Team,
    display_name: String,
    can_timeout: bool,
    status: PlayerStatus,
}

impl Player {
    /// Create an active player that is subject to move timeouts.
    pub fn new(team: Team, display_name: impl Into<String>) -> Self {
        Self {
            team,
            display_name: display_name.into(),
            can_timeout: true,
            status: PlayerStatus::Active,
        }
    }

    /// Enable or disable move timeouts for this seat.
    pub fn with_can_timeout(mut self, can_timeout: bool) -> Self {
        self.can_timeout = can_timeout;
        self
    }

    /// Bound team.
    #[inline]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Name shown to other clients.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether move deadlines apply to this seat.
    #[inline]
    pub fn can_timeout(&self) -> bool {
        self.can_timeout
    }

    /// Current standing.
    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    /// Still connected and not disqualified.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Missed a soft deadline during the current move request.
    pub fn has_soft_timeout(&self) -> bool {
        self.status == PlayerStatus::SoftTimeout
    }

    /// Missed a hard deadline.
    pub fn has_hard_timeout(&self) -> bool {
        self.status == PlayerStatus::HardTimeout
    }

    /// Why the player left, if they did.
    pub fn left_cause(&self) -> Option<DisconnectCause> {
        match self.status {
            PlayerStatus::Left { cause } => Some(cause),
            _ => None,
        }
    }

    /// Rule violation reason, if any.
    pub fn violation_reason(&self) -> Option<&str> {
        match &self.status {
            PlayerStatus::Violated { reason } => Some(reason),
            _ => None,
        }
    }

    /// `Active -> SoftTimeout`. Returns whether the transition happened.
    pub(crate) fn mark_soft_timeout(&mut self) -> bool {
        if self.status == PlayerStatus::Active {
            self.status = PlayerStatus::SoftTimeout;
            true
        } else {
            false
        }
    }

    /// `Active | SoftTimeout -> HardTimeout`.
    pub(crate) fn mark_hard_timeout(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = PlayerStatus::HardTimeout;
        true
    }

    /// Any state `-> Left`.
    pub(crate) fn mark_left(&mut self, cause: DisconnectCause) {
        self.status = PlayerStatus::Left { cause };
    }

    /// `Active | SoftTimeout -> Violated`.
    pub(crate) fn mark_violated(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = PlayerStatus::Violated { reason: reason.into() };
        true
    }

    /// A move arrived in time: a pending soft warning is cleared.
    pub(crate) fn acknowledge_move(&mut self) {
        if self.status == PlayerStatus::SoftTimeout {
            self.status = PlayerStatus::Active;
        }
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.team == other.team && self.display_name == other.display_name
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.team.hash(state);
        self.display_name.hash(state);
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.team, self.display_name)
    }
}

// =============================================================================
// ACTION TIMEOUT
// =============================================================================

/// Default soft deadline for a move.
pub const DEFAULT_SOFT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default hard deadline for a move.
pub const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Time budget for answering one move request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTimeout {
    /// Whether the soft warning phase is used.
    pub soft: bool,
    /// Elapsed time after which a warning is sent.
    pub soft_timeout: Duration,
    /// Elapsed time after which the player forfeits.
    pub hard_timeout: Duration,
}

impl Default for ActionTimeout {
    fn default() -> Self {
        Self {
            soft: true,
            soft_timeout: DEFAULT_SOFT_TIMEOUT,
            hard_timeout: DEFAULT_HARD_TIMEOUT,
        }
    }
}

impl ActionTimeout {
    /// Create a timeout with both phases.
    pub fn new(soft_timeout: Duration, hard_timeout: Duration) -> Self {
        Self {
            soft: true,
            soft_timeout,
            hard_timeout,
        }
    }

    /// Create a timeout without warning phase.
    pub fn hard_only(hard_timeout: Duration) -> Self {
        Self {
            soft: false,
            soft_timeout: hard_timeout,
            hard_timeout,
        }
    }

    /// Read deadlines from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let millis = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let defaults = Self::default();
        Self {
            soft: defaults.soft,
            soft_timeout: millis("ROOM_SOFT_TIMEOUT_MS").unwrap_or(defaults.soft_timeout),
            hard_timeout: millis("ROOM_HARD_TIMEOUT_MS").unwrap_or(defaults.hard_timeout),
        }
    }

    /// Soft deadline, if the warning phase applies.
    ///
    /// A soft deadline at or after the hard deadline never fires.
    pub fn soft_deadline(&self) -> Option<Duration> {
        (self.soft && self.soft_timeout < self.hard_timeout).then_some(self.soft_timeout)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_opponent() {
        assert_eq!(Team::One.opponent(), Team::Two);
        assert_eq!(Team::Two.opponent(), Team::One);
        for team in Team::ALL {
            assert_eq!(Team::from_index(team.index()), Some(team));
        }
        assert_eq!(Team::from_index(2), None);
    }

    #[test]
    fn test_equality_ignores_runtime_flags() {
        let live = Player::new(Team::One, "alice");
        let mut timed_out = live.clone();
        assert!(timed_out.mark_hard_timeout());
        assert_eq!(live, timed_out);
        assert_ne!(live, Player::new(Team::Two, "alice"));
        assert_ne!(live, Player::new(Team::One, "bob"));
    }

    #[test]
    fn test_timeout_transitions() {
        let mut player = Player::new(Team::Two, "bob");
        assert!(player.mark_soft_timeout());
        assert!(player.has_soft_timeout());
        assert!(!player.mark_soft_timeout());

        player.acknowledge_move();
        assert_eq!(player.status(), &PlayerStatus::Active);

        assert!(player.mark_soft_timeout());
        assert!(player.mark_hard_timeout());
        assert!(player.has_hard_timeout());
        assert!(!player.is_active());

        // Terminal states stick
        assert!(!player.mark_violated("late"));
        assert!(!player.mark_soft_timeout());
        player.acknowledge_move();
        assert!(player.has_hard_timeout());
    }

    #[test]
    fn test_left_overrides_any_state() {
        let mut player = Player::new(Team::One, "carol");
        assert!(player.mark_violated("illegal placement"));
        assert_eq!(player.violation_reason(), Some("illegal placement"));

        player.mark_left(DisconnectCause::ConnectionLost);
        assert_eq!(player.left_cause(), Some(DisconnectCause::ConnectionLost));
        assert_eq!(player.violation_reason(), None);
    }

    #[test]
    fn test_soft_deadline() {
        let timeout = ActionTimeout::new(Duration::from_secs(1), Duration::from_secs(3));
        assert_eq!(timeout.soft_deadline(), Some(Duration::from_secs(1)));

        let hard_only = ActionTimeout::hard_only(Duration::from_secs(3));
        assert_eq!(hard_only.soft_deadline(), None);

        let inverted = ActionTimeout::new(Duration::from_secs(5), Duration::from_secs(3));
        assert_eq!(inverted.soft_deadline(), None);
    }

    #[test]
    fn test_player_display() {
        let player = Player::new(Team::Two, "dave");
        assert_eq!(player.to_string(), "TWO(dave)");
    }
}
