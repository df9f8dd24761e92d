//! Session Layer
//!
//! Runs games between two remote players. The transport that carries
//! messages is a collaborator: it registers listeners on seats and
//! forwards decoded commands into a [`GameSession`].
//! This layer is **non-deterministic** (clocks, tasks); rules run through `game/`.

pub mod protocol;
pub mod listener;
pub mod timeout;
pub mod session;

pub use protocol::{ErrorCode, GameCommand, GameMessage, RoomCommand, RoomError, RoomMessage};
pub use listener::{ChannelListener, ListenerId, ListenerSet, PlayerListener};
pub use timeout::{DeadlineFired, DeadlinePhase, DeadlineToken, MoveClock, TimeoutSupervisor};
pub use session::{
    GameResult, GameSession, JoinedPlayer, MoveOutcome, SessionConfig, SessionError,
    SessionId, SessionManager, SessionOutcome, SessionState, SlotDescriptor,
};
