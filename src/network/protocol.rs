//! Room Protocol Messages
//!
//! Events a session delivers to the listeners of a seat, and the commands a
//! transport forwards from a client. The transport itself is out of scope;
//! these types only fix the JSON shape it carries.

use serde::{Serialize, Deserialize};

use crate::game::logic::{GameLogic, StateOf};
use crate::game::player::{DisconnectCause, Team};
use crate::network::session::GameResult;

// =============================================================================
// SESSION -> PLAYER MESSAGES
// =============================================================================

/// Events delivered to a seat's listeners.
///
/// `S` is the snapshot type of the game being played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomMessage<S> {
    /// Seat assigned after joining.
    Welcome {
        /// Assigned team
        team: Team,
        /// Name shown to the opponent
        display_name: String,
    },

    /// Deep snapshot of the game after start and after every move.
    Memento {
        /// Snapshot
        state: S,
    },

    /// The receiving seat must send a move now.
    MoveRequest {
        /// Turn the move will be applied at
        turn: u32,
    },

    /// The soft deadline passed; the hard deadline is still ahead.
    SoftTimeoutWarning {
        /// Time left before forfeiting
        remaining_ms: u64,
    },

    /// Session was paused or resumed.
    Paused {
        /// New pause flag
        paused: bool,
    },

    /// A request from this seat was rejected.
    Error(RoomError),

    /// Session reached a terminal state. Sent once.
    GameOver(GameResult),
}

/// Message type delivered by a session running game `G`.
pub type GameMessage<G> = RoomMessage<StateOf<G>>;

impl<S: Serialize> RoomMessage<S> {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<S: for<'de> Deserialize<'de>> RoomMessage<S> {
    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Machine-readable rejection reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Both seats are taken.
    TooManyPlayers,
    /// Move sent outside the sender's turn.
    NotYourTurn,
    /// Session is not accepting moves.
    SessionNotRunning,
    /// Sender has no seat in this session.
    UnknownPlayer,
    /// Rules rejected the move.
    InvalidMove,
    /// Session aborted on a server fault.
    InternalFault,
}

/// Rejection notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl RoomError {
    /// Create a notice.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// =============================================================================
// PLAYER -> SESSION COMMANDS
// =============================================================================

/// Commands a transport decodes from a client and forwards to its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomCommand<M> {
    /// Submit a move.
    Move {
        /// The move
        mv: M,
    },
    /// Leave the session.
    Leave {
        /// Reported cause
        cause: DisconnectCause,
    },
}

/// Command type accepted by a session running game `G`.
pub type GameCommand<G> = RoomCommand<<G as GameLogic>::Move>;

impl<M: Serialize> RoomCommand<M> {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<M: for<'de> Deserialize<'de>> RoomCommand<M> {
    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::game::logic::{WinCondition, WinReason};
    use crate::network::session::SessionOutcome;

    type Message = RoomMessage<Vec<u8>>;

    #[test]
    fn test_message_json_roundtrip() {
        let msg = Message::Welcome {
            team: Team::Two,
            display_name: "bob".into(),
        };
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"welcome""#));
        assert!(json.contains(r#""team":"two""#));
        assert_eq!(Message::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_error_message_shape() {
        let msg = Message::Error(RoomError::new(ErrorCode::NotYourTurn, "wait"));
        let json = msg.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"type":"error","code":"not_your_turn","message":"wait"}"#
        );
        assert_eq!(Message::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_game_over_roundtrip() {
        let msg = Message::GameOver(GameResult {
            outcome: SessionOutcome::Finished(WinCondition::win(Team::One, WinReason::HardTimeout)),
            turn: 12,
            final_state_hash: Some([7; 32]),
            finished_at: Utc::now(),
        });
        let json = msg.to_json().unwrap();
        assert!(json.contains(r#""type":"game_over""#));
        assert_eq!(Message::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_command_parse() {
        let cmd: RoomCommand<u32> = RoomCommand::from_json(r#"{"type":"move","mv":4}"#).unwrap();
        assert_eq!(cmd, RoomCommand::Move { mv: 4 });

        let leave = RoomCommand::<u32>::Leave { cause: DisconnectCause::Exit };
        let json = leave.to_json().unwrap();
        assert_eq!(json, r#"{"type":"leave","cause":"exit"}"#);
        assert!(RoomCommand::<u32>::from_json(r#"{"type":"dance"}"#).is_err());
    }
}
