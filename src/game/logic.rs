//! Game Rule Capability
//!
//! A session knows nothing about a specific game. Rules are plugged in
//! through [`GameLogic`]: the session asks it for the opening position, has
//! it apply each move, and asks it after every move whether somebody won.
//!
//! The turn counter, the last move and the seats belong to the session.
//! [`apply_move`] wraps a plugin's `apply` and restores those fields, so a
//! plugin can only change the board.

use std::fmt;
use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;

use crate::game::player::{ActionTimeout, DisconnectCause, Player, Team};
use crate::game::state::GameState;

/// State type used by a game plugin.
pub type StateOf<G> = GameState<<G as GameLogic>::Piece, <G as GameLogic>::Move>;

// =============================================================================
// ERRORS
// =============================================================================

/// Rule explanation for a rejected move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MoveMistake {
    /// Human-readable rule that was broken
    pub message: String,
}

impl MoveMistake {
    /// Create a mistake from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by a game plugin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
    /// The player broke a rule. Terminal for that player.
    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveMistake),

    /// The plugin itself failed. Aborts the session.
    #[error("internal game logic fault: {0}")]
    Internal(String),
}

// =============================================================================
// WIN CONDITION
// =============================================================================

/// Why a game ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    /// A game rule decided, with the plugin's explanation.
    Rule(String),
    /// The loser missed the hard deadline.
    HardTimeout,
    /// The loser submitted an illegal move.
    Violation(String),
    /// The loser disconnected.
    Left(DisconnectCause),
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinReason::Rule(text) => write!(f, "{}", text),
            WinReason::HardTimeout => write!(f, "hard timeout"),
            WinReason::Violation(reason) => write!(f, "rule violation: {}", reason),
            WinReason::Left(cause) => write!(f, "opponent left ({})", cause),
        }
    }
}

/// Decided outcome of a game. `winner == None` is a draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinCondition {
    /// Winning team, if any
    pub winner: Option<Team>,
    /// Why the game ended
    pub reason: WinReason,
}

impl WinCondition {
    /// `team` wins.
    pub fn win(team: Team, reason: WinReason) -> Self {
        Self {
            winner: Some(team),
            reason,
        }
    }

    /// Nobody wins.
    pub fn draw(reason: WinReason) -> Self {
        Self {
            winner: None,
            reason,
        }
    }

    /// Whether nobody won.
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

impl fmt::Display for WinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner {
            Some(team) => write!(f, "{} wins: {}", team, self.reason),
            None => write!(f, "draw: {}", self.reason),
        }
    }
}

// =============================================================================
// GAME LOGIC
// =============================================================================

/// Pluggable rules of one board game.
///
/// Implementations must be deterministic: applying the same moves to the
/// same setup always yields the same states. The session calls every
/// method while holding its lock, so none of them may block.
pub trait GameLogic: Send + Sync + 'static {
    /// Piece kind placed on the board.
    type Piece: Copy + fmt::Debug + Eq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// A player action.
    type Move: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Game name for logs.
    fn name(&self) -> &str;

    /// Opening position at turn 0, without seated players.
    fn setup(&self) -> StateOf<Self>;

    /// Apply `mv` for the current team and return the resulting state.
    ///
    /// Only the board of the returned state is kept. Rule breaches are
    /// reported as [`LogicError::InvalidMove`].
    fn apply(&self, state: &StateOf<Self>, mv: &Self::Move) -> Result<StateOf<Self>, LogicError>;

    /// Decided outcome, or `None` while the game continues.
    fn check_win_condition(&self, state: &StateOf<Self>) -> Option<WinCondition>;

    /// Move deadlines for `player`. Not consulted for seats that cannot
    /// time out.
    fn timeout_for(&self, _player: &Player) -> ActionTimeout {
        ActionTimeout::default()
    }
}

/// Apply a move through the plugin and advance the turn.
///
/// Seats are carried over from `state` unchanged; a plugin that tampers
/// with the turn counter or the opening team is reported as an internal
/// fault.
pub fn apply_move<G: GameLogic>(
    logic: &G,
    state: &StateOf<G>,
    mv: &G::Move,
) -> Result<StateOf<G>, LogicError> {
    let mut next = logic.apply(state, mv)?;
    if next.turn() != state.turn() {
        return Err(LogicError::Internal(format!(
            "{} changed the turn counter from {} to {}",
            logic.name(),
            state.turn(),
            next.turn()
        )));
    }
    if next.start_team() != state.start_team() {
        return Err(LogicError::Internal(format!(
            "{} changed the opening team from {} to {}",
            logic.name(),
            state.start_team(),
            next.start_team()
        )));
    }
    next.replace_players(state.players().to_vec());
    next.record_move(mv.clone());
    Ok(next)
}

// =============================================================================
// TESTS
// =============================================================================
