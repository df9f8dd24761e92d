//! Game Session Management
//!
//! A [`GameSession`] runs one two-player game from the first join to a
//! terminal state:
//!
//! ```text
//! WaitingForPlayers ──(2nd join)──► Running ◄──► Paused
//!        │                            │
//!        │ (leave)                    ├──(win / violation / timeout / leave)──► Finished
//!        ▼                            │
//!     Aborted ◄───────(internal fault)┘
//! ```
//!
//! All session state sits behind one `tokio::sync::Mutex`. Moves, joins,
//! disconnects and deadline reports all take that lock, so a move and a
//! deadline that race are strictly ordered: whichever runs second sees
//! the outcome of the first.
//!
//! Events to players are delivered through each seat's [`ListenerSet`]
//! while the lock is held; listeners must not block.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::core::hash::{short_hex, StateHash};
use crate::game::logic::{apply_move, GameLogic, LogicError, StateOf, WinCondition, WinReason};
use crate::game::player::{DisconnectCause, Player, Team};
use crate::game::replay::MoveLog;
use crate::network::listener::{ListenerSet, PlayerListener};
use crate::network::protocol::{ErrorCode, GameCommand, GameMessage, RoomCommand, RoomError, RoomMessage};
use crate::network::timeout::{DeadlineFired, DeadlinePhase, TimeoutSupervisor};

/// Unique session identifier.
pub type SessionId = uuid::Uuid;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Preset for one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDescriptor {
    /// Replaces the name given on join.
    pub display_name: Option<String>,
    /// Whether move deadlines apply.
    pub can_timeout: bool,
}

impl Default for SlotDescriptor {
    fn default() -> Self {
        Self {
            display_name: None,
            can_timeout: true,
        }
    }
}

/// Configuration for a game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seat presets in team order.
    pub slots: [SlotDescriptor; 2],
    /// Enter `Paused` instead of `Running` once both seats are taken.
    pub start_paused: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            slots: [SlotDescriptor::default(), SlotDescriptor::default()],
            start_paused: false,
        }
    }
}

impl SessionConfig {
    /// Read overrides from environment variables.
    pub fn from_env() -> Self {
        let flag = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        };
        let name = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(paused) = flag("ROOM_START_PAUSED") {
            config.start_paused = paused;
        }
        if let Some(can_timeout) = flag("ROOM_CAN_TIMEOUT") {
            for slot in &mut config.slots {
                slot.can_timeout = can_timeout;
            }
        }
        config.slots[0].display_name = name("ROOM_SLOT_ONE_NAME");
        config.slots[1].display_name = name("ROOM_SLOT_TWO_NAME");
        config
    }
}

// =============================================================================
// STATES, RESULTS, ERRORS
// =============================================================================

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Fewer than two players joined.
    WaitingForPlayers,
    /// Game in progress.
    Running,
    /// Game in progress, clock frozen, move requests held back.
    Paused,
    /// Game decided.
    Finished,
    /// Game stopped without a fair winner.
    Aborted,
}

impl SessionState {
    /// `Running` or `Paused`.
    pub fn is_running(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }

    /// `Finished` or `Aborted`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Finished | SessionState::Aborted)
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Decided by rules, violation, timeout or disconnect.
    Finished(WinCondition),
    /// Stopped without a winner.
    Aborted {
        /// Fault description
        reason: String,
    },
}

/// Final record of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Outcome
    pub outcome: SessionOutcome,
    /// Turn counter at the end
    pub turn: u32,
    /// Fingerprint of the final state
    pub final_state_hash: Option<StateHash>,
    /// When the session ended
    pub finished_at: DateTime<Utc>,
}

impl GameResult {
    /// Winning team, if the game was decided in someone's favour.
    pub fn winner(&self) -> Option<Team> {
        match &self.outcome {
            SessionOutcome::Finished(win) => win.winner,
            SessionOutcome::Aborted { .. } => None,
        }
    }
}

/// Result of submitting a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Move applied; the game continues at `turn`.
    Accepted {
        /// Turn counter after the move
        turn: u32,
    },
    /// The move ended the session.
    Terminated(GameResult),
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Both seats are taken.
    #[error("Session is full")]
    TooManyPlayers,

    /// Move from the team that is not to move.
    #[error("Not your turn: {expected} is to move, got {actual}")]
    NotYourTurn {
        /// Team to move
        expected: Team,
        /// Sender
        actual: Team,
    },

    /// Session is not accepting the request in its current state.
    #[error("Session not running ({0:?})")]
    SessionNotRunning(SessionState),

    /// No seat is bound to this team.
    #[error("No player for team {0}")]
    UnknownPlayer(Team),

    /// The game plugin failed; the session was aborted.
    #[error("Internal fault: {0}")]
    InternalFault(String),
}

impl SessionError {
    /// Protocol error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::TooManyPlayers => ErrorCode::TooManyPlayers,
            SessionError::NotYourTurn { .. } => ErrorCode::NotYourTurn,
            SessionError::SessionNotRunning(_) => ErrorCode::SessionNotRunning,
            SessionError::UnknownPlayer(_) => ErrorCode::UnknownPlayer,
            SessionError::InternalFault(_) => ErrorCode::InternalFault,
        }
    }

    /// Protocol notice for the sender.
    pub fn to_room_error(&self) -> RoomError {
        RoomError::new(self.code(), self.to_string())
    }
}

/// Handle given to a player after joining.
pub struct JoinedPlayer<G: GameLogic> {
    /// Assigned team
    pub team: Team,
    /// Seat as created on join
    pub player: Player,
    /// The seat's listeners; more can be added or removed at any time.
    pub listeners: ListenerSet<GameMessage<G>>,
}

// =============================================================================
// SESSION INTERNALS
// =============================================================================

struct Seat<G: GameLogic> {
    team: Team,
    listeners: ListenerSet<GameMessage<G>>,
}

struct SessionInner<G: GameLogic> {
    id: SessionId,
    logic: Arc<G>,
    config: SessionConfig,
    state: SessionState,
    game: StateOf<G>,
    seats: Vec<Seat<G>>,
    supervisor: TimeoutSupervisor,
    /// Team with an outstanding move request.
    awaiting: Option<Team>,
    /// A move request is due but held back by a pause.
    request_pending: bool,
    log: MoveLog<G::Piece, G::Move>,
    result: Option<GameResult>,
}

/// Run a plugin call, turning a panic into an internal fault.
fn guarded<T>(call: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        format!("game logic panicked: {}", text)
    } else if let Some(text) = payload.downcast_ref::<String>() {
        format!("game logic panicked: {}", text)
    } else {
        "game logic panicked".to_string()
    }
}

impl<G: GameLogic> SessionInner<G> {
    fn seat(&self, team: Team) -> Option<&Seat<G>> {
        self.seats.iter().find(|s| s.team == team)
    }

    fn send(&self, team: Team, message: GameMessage<G>) {
        if let Some(seat) = self.seat(team) {
            seat.listeners.notify(&message);
        }
    }

    fn broadcast(&self, message: GameMessage<G>) {
        for seat in &self.seats {
            seat.listeners.notify(&message);
        }
    }

    fn reject(&self, team: Team, err: SessionError) -> SessionError {
        debug!(session = %self.id, %team, error = %err, "request rejected");
        self.send(team, RoomMessage::Error(err.to_room_error()));
        err
    }

    fn join(
        &mut self,
        display_name: String,
        listener: Arc<dyn PlayerListener<GameMessage<G>>>,
    ) -> Result<JoinedPlayer<G>, SessionError> {
        if self.state != SessionState::WaitingForPlayers {
            return Err(if self.seats.len() >= Team::ALL.len() {
                SessionError::TooManyPlayers
            } else {
                SessionError::SessionNotRunning(self.state)
            });
        }
        let team = Team::from_index(self.seats.len()).ok_or(SessionError::TooManyPlayers)?;

        let slot = &self.config.slots[team.index()];
        let name = slot.display_name.clone().unwrap_or(display_name);
        let player = Player::new(team, name).with_can_timeout(slot.can_timeout);

        let listeners = ListenerSet::new();
        listeners.add(listener);
        self.game.add_player(player.clone());
        self.seats.push(Seat {
            team,
            listeners: listeners.clone(),
        });
        info!(session = %self.id, %player, "player joined");

        self.send(
            team,
            RoomMessage::Welcome {
                team,
                display_name: player.display_name().to_string(),
            },
        );

        if self.seats.len() == Team::ALL.len() {
            self.start()?;
        }

        Ok(JoinedPlayer {
            team,
            player,
            listeners,
        })
    }

    fn start(&mut self) -> Result<(), SessionError> {
        self.log = MoveLog::new(&self.game);
        self.state = if self.config.start_paused {
            SessionState::Paused
        } else {
            SessionState::Running
        };
        info!(session = %self.id, game = self.logic.name(), state = ?self.state, "game started");

        self.broadcast(RoomMessage::Memento {
            state: self.game.snapshot(),
        });
        self.request_next_move()
    }

    /// Ask the team to move, or hold the request back while paused.
    fn request_next_move(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Paused {
            self.request_pending = true;
            Ok(())
        } else {
            self.issue_move_request()
        }
    }

    /// Send the move request and arm its deadline. A failing deadline
    /// lookup aborts the session.
    fn issue_move_request(&mut self) -> Result<(), SessionError> {
        let team = self.game.current_team();
        self.request_pending = false;
        self.awaiting = Some(team);

        if let Some(player) = self.game.player(team).filter(|p| p.can_timeout()) {
            let logic = Arc::clone(&self.logic);
            match guarded(|| logic.timeout_for(player)) {
                Ok(timeout) => {
                    self.supervisor.arm(team, timeout);
                }
                Err(reason) => return Err(self.fault(reason)),
            }
        }

        debug!(session = %self.id, %team, turn = self.game.turn(), "move requested");
        self.send(
            team,
            RoomMessage::MoveRequest {
                turn: self.game.turn(),
            },
        );
        Ok(())
    }

    fn on_move(&mut self, team: Team, mv: G::Move) -> Result<MoveOutcome, SessionError> {
        if self.seat(team).is_none() {
            return Err(SessionError::UnknownPlayer(team));
        }
        if !self.state.is_running() {
            return Err(self.reject(team, SessionError::SessionNotRunning(self.state)));
        }
        if self.awaiting != Some(team) {
            let expected = self.game.current_team();
            let err = if expected != team {
                SessionError::NotYourTurn {
                    expected,
                    actual: team,
                }
            } else {
                SessionError::SessionNotRunning(self.state)
            };
            return Err(self.reject(team, err));
        }

        // The deadline is resolved together with the move
        self.awaiting = None;
        self.supervisor.disarm();
        if let Some(player) = self.game.player_mut(team) {
            player.acknowledge_move();
        }

        let logic = Arc::clone(&self.logic);
        let applied = match guarded(|| apply_move(logic.as_ref(), &self.game, &mv)) {
            Ok(applied) => applied,
            Err(reason) => return Err(self.fault(reason)),
        };

        match applied {
            Ok(next) => {
                self.game = next;
                self.log.record(mv);
            }
            Err(LogicError::InvalidMove(mistake)) => {
                warn!(session = %self.id, %team, %mistake, "invalid move");
                if let Some(player) = self.game.player_mut(team) {
                    player.mark_violated(mistake.message.clone());
                }
                self.send(
                    team,
                    RoomMessage::Error(RoomError::new(ErrorCode::InvalidMove, mistake.message.clone())),
                );
                let result = self.forfeit(team, WinReason::Violation(mistake.message));
                return Ok(MoveOutcome::Terminated(result));
            }
            Err(LogicError::Internal(reason)) => return Err(self.fault(reason)),
        }

        debug!(session = %self.id, %team, turn = self.game.turn(), "move accepted");
        self.broadcast(RoomMessage::Memento {
            state: self.game.snapshot(),
        });

        let win = match guarded(|| logic.check_win_condition(&self.game)) {
            Ok(win) => win,
            Err(reason) => return Err(self.fault(reason)),
        };
        if let Some(win) = win {
            return Ok(MoveOutcome::Terminated(self.finish(win)));
        }

        self.request_next_move()?;
        Ok(MoveOutcome::Accepted {
            turn: self.game.turn(),
        })
    }

    fn on_deadline(&mut self, fired: DeadlineFired) {
        if !self.state.is_running() || self.awaiting != Some(fired.team) {
            return;
        }
        if !self.supervisor.accept(&fired) {
            debug!(session = %self.id, ?fired, "stale deadline report ignored");
            return;
        }

        match fired.phase {
            DeadlinePhase::Soft => {
                let warned = self
                    .game
                    .player_mut(fired.team)
                    .map_or(false, |p| p.mark_soft_timeout());
                if warned {
                    let remaining_ms = self
                        .supervisor
                        .remaining()
                        .map_or(0, |d| d.as_millis() as u64);
                    warn!(session = %self.id, team = %fired.team, remaining_ms, "soft timeout");
                    self.send(fired.team, RoomMessage::SoftTimeoutWarning { remaining_ms });
                }
            }
            DeadlinePhase::Hard => {
                warn!(session = %self.id, team = %fired.team, "hard timeout");
                self.awaiting = None;
                self.supervisor.disarm();
                if let Some(player) = self.game.player_mut(fired.team) {
                    player.mark_hard_timeout();
                }
                self.forfeit(fired.team, WinReason::HardTimeout);
            }
        }
    }

    fn on_disconnect(&mut self, team: Team, cause: DisconnectCause) -> Result<Option<GameResult>, SessionError> {
        if self.seat(team).is_none() {
            return Err(SessionError::UnknownPlayer(team));
        }
        if let Some(player) = self.game.player_mut(team) {
            player.mark_left(cause);
        }
        info!(session = %self.id, %team, %cause, "player left");

        Ok(match self.state {
            SessionState::WaitingForPlayers => {
                Some(self.abort(format!("{} left before the game started", team)))
            }
            SessionState::Running | SessionState::Paused => {
                Some(self.forfeit(team, WinReason::Left(cause)))
            }
            SessionState::Finished | SessionState::Aborted => None,
        })
    }

    fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Paused;
                self.supervisor.freeze();
                info!(session = %self.id, "paused");
                self.broadcast(RoomMessage::Paused { paused: true });
                Ok(())
            }
            SessionState::Paused => Ok(()),
            state => Err(SessionError::SessionNotRunning(state)),
        }
    }

    fn resume(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Paused => {
                self.state = SessionState::Running;
                self.supervisor.thaw();
                info!(session = %self.id, "resumed");
                self.broadcast(RoomMessage::Paused { paused: false });
                if self.request_pending {
                    self.issue_move_request()?;
                }
                Ok(())
            }
            SessionState::Running => Ok(()),
            state => Err(SessionError::SessionNotRunning(state)),
        }
    }

    fn step(&mut self) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Paused if self.request_pending => {
                self.issue_move_request()?;
                self.supervisor.freeze();
                Ok(true)
            }
            SessionState::Paused | SessionState::Running => Ok(false),
            state => Err(SessionError::SessionNotRunning(state)),
        }
    }

    /// Unrecoverable plugin failure.
    fn fault(&mut self, reason: String) -> SessionError {
        error!(session = %self.id, %reason, "internal fault");
        self.abort(reason.clone());
        SessionError::InternalFault(reason)
    }

    fn forfeit(&mut self, loser: Team, reason: WinReason) -> GameResult {
        self.finish(WinCondition::win(loser.opponent(), reason))
    }

    fn finish(&mut self, win: WinCondition) -> GameResult {
        self.terminate(SessionState::Finished, SessionOutcome::Finished(win))
    }

    fn abort(&mut self, reason: String) -> GameResult {
        self.terminate(SessionState::Aborted, SessionOutcome::Aborted { reason })
    }

    /// Single exit of every session. Later calls return the first result.
    fn terminate(&mut self, state: SessionState, outcome: SessionOutcome) -> GameResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        self.supervisor.disarm();
        self.awaiting = None;
        self.request_pending = false;
        self.state = state;

        let final_state_hash = match self.game.compute_hash() {
            Ok(hash) => Some(hash),
            Err(err) => {
                error!(session = %self.id, error = %err, "failed to fingerprint final state");
                None
            }
        };
        let result = GameResult {
            outcome,
            turn: self.game.turn(),
            final_state_hash,
            finished_at: Utc::now(),
        };
        info!(
            session = %self.id,
            ?state,
            outcome = ?result.outcome,
            turn = result.turn,
            hash = %final_state_hash.as_ref().map(short_hex).unwrap_or_default(),
            "session ended"
        );

        self.result = Some(result.clone());
        self.broadcast(RoomMessage::GameOver(result.clone()));
        result
    }
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// Shared handle to one session.
///
/// Clones refer to the same session. Creating a session spawns a task that
/// feeds deadline reports into it, so it must happen inside a tokio
/// runtime.
pub struct GameSession<G: GameLogic> {
    id: SessionId,
    inner: Arc<Mutex<SessionInner<G>>>,
}

impl<G: GameLogic> Clone for GameSession<G> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GameLogic> GameSession<G> {
    /// Create a session waiting for two players.
    pub fn new(id: SessionId, logic: Arc<G>, config: SessionConfig) -> Self {
        let (supervisor, mut deadlines) = TimeoutSupervisor::new();
        let game = logic.setup();
        let log = MoveLog::new(&game);

        let inner = Arc::new(Mutex::new(SessionInner {
            id,
            logic,
            config,
            state: SessionState::WaitingForPlayers,
            game,
            seats: Vec::with_capacity(Team::ALL.len()),
            supervisor,
            awaiting: None,
            request_pending: false,
            log,
            result: None,
        }));

        let weak: Weak<Mutex<SessionInner<G>>> = Arc::downgrade(&inner);
        tokio::spawn(async move {
            while let Some(fired) = deadlines.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.lock().await.on_deadline(fired);
            }
        });

        Self { id, inner }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Take the next free seat.
    ///
    /// The second join starts the game.
    #[instrument(skip(self, display_name, listener), fields(session = %self.id))]
    pub async fn join(
        &self,
        display_name: impl Into<String>,
        listener: Arc<dyn PlayerListener<GameMessage<G>>>,
    ) -> Result<JoinedPlayer<G>, SessionError> {
        self.inner.lock().await.join(display_name.into(), listener)
    }

    /// Submit a move for `team`.
    #[instrument(skip(self, mv), fields(session = %self.id))]
    pub async fn on_move_received(&self, team: Team, mv: G::Move) -> Result<MoveOutcome, SessionError> {
        self.inner.lock().await.on_move(team, mv)
    }

    /// Report that `team`'s connection is gone.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn on_player_disconnected(
        &self,
        team: Team,
        cause: DisconnectCause,
    ) -> Result<Option<GameResult>, SessionError> {
        self.inner.lock().await.on_disconnect(team, cause)
    }

    /// Route a decoded client command.
    pub async fn handle_command(&self, team: Team, command: GameCommand<G>) -> Result<(), SessionError> {
        match command {
            RoomCommand::Move { mv } => self.on_move_received(team, mv).await.map(|_| ()),
            RoomCommand::Leave { cause } => self.on_player_disconnected(team, cause).await.map(|_| ()),
        }
    }

    /// Freeze the clock and hold back further move requests.
    pub async fn pause(&self) -> Result<(), SessionError> {
        self.inner.lock().await.pause()
    }

    /// Unfreeze the clock and issue a held-back move request.
    pub async fn resume(&self) -> Result<(), SessionError> {
        self.inner.lock().await.resume()
    }

    /// Issue one held-back move request while staying paused.
    ///
    /// Returns whether a request was issued.
    pub async fn step(&self) -> Result<bool, SessionError> {
        self.inner.lock().await.step()
    }

    /// Current session state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Deep copy of the game state.
    pub async fn snapshot(&self) -> StateOf<G> {
        self.inner.lock().await.game.snapshot()
    }

    /// Seat bound to `team`.
    pub async fn player(&self, team: Team) -> Option<Player> {
        self.inner.lock().await.game.player(team).cloned()
    }

    /// Number of taken seats.
    pub async fn player_count(&self) -> usize {
        self.inner.lock().await.seats.len()
    }

    /// Final record, once terminal.
    pub async fn result(&self) -> Option<GameResult> {
        self.inner.lock().await.result.clone()
    }

    /// Copy of the accepted moves so far.
    pub async fn move_log(&self) -> MoveLog<G::Piece, G::Move> {
        self.inner.lock().await.log.clone()
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Manages all sessions of one game.
pub struct SessionManager<G: GameLogic> {
    logic: Arc<G>,
    config: SessionConfig,
    /// Active sessions.
    sessions: RwLock<BTreeMap<SessionId, GameSession<G>>>,
}

impl<G: GameLogic> SessionManager<G> {
    /// Create new session manager.
    pub fn new(logic: G, config: SessionConfig) -> Self {
        Self {
            logic: Arc::new(logic),
            config,
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a new session.
    pub async fn create_session(&self) -> GameSession<G> {
        let mut sessions = self.sessions.write().await;
        self.insert_session(&mut sessions)
    }

    fn insert_session(&self, sessions: &mut BTreeMap<SessionId, GameSession<G>>) -> GameSession<G> {
        let id = uuid::Uuid::new_v4();
        let session = GameSession::new(id, Arc::clone(&self.logic), self.config.clone());
        sessions.insert(id, session.clone());
        info!(session = %id, "session created");
        session
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Option<GameSession<G>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Remove a session.
    pub async fn remove_session(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }

    /// Get session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Join the oldest session waiting for a player, or open a new one.
    pub async fn join_or_create(
        &self,
        display_name: impl Into<String>,
        listener: Arc<dyn PlayerListener<GameMessage<G>>>,
    ) -> Result<(SessionId, JoinedPlayer<G>), SessionError> {
        let display_name = display_name.into();
        let mut sessions = self.sessions.write().await;

        for (id, session) in sessions.iter() {
            let mut inner = session.inner.lock().await;
            if inner.state == SessionState::WaitingForPlayers {
                let joined = inner.join(display_name, listener)?;
                return Ok((*id, joined));
            }
        }

        let session = self.insert_session(&mut sessions);
        let joined = session.inner.lock().await.join(display_name, listener)?;
        Ok((session.id, joined))
    }

    /// Remove finished and aborted sessions. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut to_remove = Vec::new();

        for (id, session) in sessions.iter() {
            if session.state().await.is_terminal() {
                to_remove.push(*id);
            }
        }

        for id in &to_remove {
            sessions.remove(id);
        }
        to_remove.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
