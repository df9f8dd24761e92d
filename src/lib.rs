//! # Duel Room Server
//!
//! Session engine for turn-based two-player board games: admits two
//! players into a room, drives the move protocol, enforces move deadlines,
//! validates moves through a pluggable rule set and hands out detached
//! snapshots of the game state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DUEL ROOM SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Value primitives                          │
//! │  ├── coords.rs   - Coordinates, vectors, doubled-hex         │
//! │  └── hash.rs     - State fingerprints                        │
//! │                                                              │
//! │  game/           - Game model (deterministic)                │
//! │  ├── player.rs   - Teams, seats, timeouts                    │
//! │  ├── board.rs    - Fields and piece stacks                   │
//! │  ├── state.rs    - Game state snapshots                      │
//! │  ├── logic.rs    - GameLogic capability                      │
//! │  ├── replay.rs   - Move log and replay                       │
//! │  └── hexstack.rs - Reference game                            │
//! │                                                              │
//! │  network/        - Sessions (non-deterministic)              │
//! │  ├── protocol.rs - Room messages and commands                │
//! │  ├── listener.rs - Snapshot-then-notify listeners            │
//! │  ├── timeout.rs  - Move deadline supervision                 │
//! │  └── session.rs  - Session state machine and manager         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules do not read clocks or randomness:
//! - BTreeMap everywhere iteration order matters
//! - Turn order derived from the turn counter only
//! - Replaying a move log reproduces the live state fingerprint

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::coords::{Coordinates, Vector};
pub use game::logic::{GameLogic, WinCondition};
pub use game::player::{Player, Team};
pub use game::state::GameState;
pub use network::session::{GameSession, SessionConfig, SessionManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
