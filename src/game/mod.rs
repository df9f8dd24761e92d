//! Game Model Module
//!
//! Everything a session needs to know about a game, independent of how
//! players are connected.
//!
//! ## Module Structure
//!
//! - `player`: Teams, seats, player status and move timeouts
//! - `board`: Fields, piece stacks and board shapes
//! - `state`: Game state snapshots
//! - `logic`: Pluggable rule capability and win conditions
//! - `replay`: Move log and deterministic re-application
//! - `hexstack`: Reference game on a hexagonal board

pub mod player;
pub mod board;
pub mod state;
pub mod logic;
pub mod replay;
pub mod hexstack;

// Re-export key types
pub use player::{ActionTimeout, DisconnectCause, Player, PlayerStatus, Team};
pub use board::{Board, BoardError, Field, Piece};
pub use state::GameState;
pub use logic::{apply_move, GameLogic, LogicError, MoveMistake, StateOf, WinCondition, WinReason};
pub use replay::MoveLog;
pub use hexstack::{HexStack, HexStackConfig, StackMove, StackPiece};
