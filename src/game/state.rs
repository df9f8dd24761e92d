//! Game State Snapshots
//!
//! [`GameState`] aggregates everything a client needs to render or replay a
//! position: the board, both seats, the turn counter and the last move.
//! The team to move is never stored; it is derived from the turn counter.
//!
//! Cloning is a full deep copy. Snapshots handed out by a session share no
//! mutable data with the live state.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::board::Board;
use crate::game::player::{Player, Team};

/// Complete state of a two-player game.
///
/// `K` is the piece kind of the board, `M` the move type of the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState<K, M> {
    /// The board. Game rules mutate it while applying moves.
    pub board: Board<K>,

    /// Seats in join order.
    players: Vec<Player>,

    /// Number of moves applied so far.
    turn: u32,

    /// Team that moves at turn 0.
    start_team: Team,

    /// Most recently applied move.
    last_move: Option<M>,
}

impl<K, M> GameState<K, M> {
    /// Fresh state at turn 0 with no seated players.
    pub fn new(board: Board<K>) -> Self {
        Self {
            board,
            players: Vec::new(),
            turn: 0,
            start_team: Team::One,
            last_move: None,
        }
    }

    /// Let another team open the game.
    pub fn with_start_team(mut self, team: Team) -> Self {
        self.start_team = team;
        self
    }

    /// Moves applied so far.
    #[inline]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Full rounds completed (one move per team).
    #[inline]
    pub fn round(&self) -> u32 {
        self.turn / 2
    }

    /// Team that opened the game.
    #[inline]
    pub fn start_team(&self) -> Team {
        self.start_team
    }

    /// Team whose move it is. Pure function of the turn counter.
    #[inline]
    pub fn current_team(&self) -> Team {
        if self.turn % 2 == 0 {
            self.start_team
        } else {
            self.start_team.opponent()
        }
    }

    /// Team waiting for its next move.
    #[inline]
    pub fn other_team(&self) -> Team {
        self.current_team().opponent()
    }

    /// Seats in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Seat bound to `team`.
    pub fn player(&self, team: Team) -> Option<&Player> {
        self.players.iter().find(|p| p.team() == team)
    }

    /// Seat whose move it is.
    pub fn current_player(&self) -> Option<&Player> {
        self.player(self.current_team())
    }

    /// Most recently applied move.
    pub fn last_move(&self) -> Option<&M> {
        self.last_move.as_ref()
    }

    pub(crate) fn player_mut(&mut self, team: Team) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.team() == team)
    }

    pub(crate) fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub(crate) fn replace_players(&mut self, players: Vec<Player>) {
        self.players = players;
    }

    /// Record an applied move: stores it and passes the turn.
    pub(crate) fn record_move(&mut self, mv: M) {
        self.last_move = Some(mv);
        self.turn += 1;
    }
}

impl<K: Clone, M: Clone> GameState<K, M> {
    /// Deep, alias-free copy for transmission or inspection.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

/// Hashed view of a state. Seats contribute their identity only.
#[derive(Serialize)]
struct Fingerprint<'a, K, M> {
    board: &'a Board<K>,
    seats: Vec<(Team, &'a str, bool)>,
    start_team: Team,
    last_move: Option<&'a M>,
}

impl<K: Serialize, M: Serialize> GameState<K, M> {
    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Fingerprint of the position.
    ///
    /// Player standings (timeouts, violations, departures) are not part of
    /// it, so replaying the move log reproduces the fingerprint of the live
    /// game however that game ended.
    pub fn compute_hash(&self) -> Result<StateHash, bincode::Error> {
        let view = Fingerprint {
            board: &self.board,
            seats: self
                .players
                .iter()
                .map(|p| (p.team(), p.display_name(), p.can_timeout()))
                .collect(),
            start_team: self.start_team,
            last_move: self.last_move.as_ref(),
        };

        let mut hasher = StateHasher::for_game_state();
        hasher.update_u32(self.turn);
        hasher.update_bytes(&bincode::serialize(&view)?);
        Ok(hasher.finalize())
    }
}

impl<K, M> GameState<K, M>
where
    K: for<'de> Deserialize<'de>,
    M: for<'de> Deserialize<'de>,
{
    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coords::Coordinates;
    use crate::game::board::Piece;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    enum Kind {
        Stone,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Place(Coordinates);

    type TestState = GameState<Kind, Place>;

    fn seated_state() -> TestState {
        let mut state = TestState::new(Board::hexagon(1));
        state.add_player(Player::new(Team::One, "red"));
        state.add_player(Player::new(Team::Two, "blue"));
        state
    }

    #[test]
    fn test_current_team_follows_turn() {
        let mut state = seated_state();
        assert_eq!(state.current_team(), Team::One);
        state.record_move(Place(Coordinates::ORIGIN));
        assert_eq!(state.turn(), 1);
        assert_eq!(state.current_team(), Team::Two);
        assert_eq!(state.current_player().unwrap().display_name(), "blue");
        state.record_move(Place(Coordinates::ORIGIN));
        assert_eq!(state.current_team(), Team::One);
        assert_eq!(state.round(), 1);
    }

    #[test]
    fn test_start_team_override() {
        let state = TestState::new(Board::hexagon(0)).with_start_team(Team::Two);
        assert_eq!(state.current_team(), Team::Two);
        assert_eq!(state.other_team(), Team::One);
    }

    #[test]
    fn test_snapshot_independence() {
        let mut state = seated_state();
        state.record_move(Place(Coordinates::new(2, 0)));
        state
            .board
            .get_field_mut(Coordinates::new(2, 0))
            .unwrap()
            .push(Piece::new(Team::One, Kind::Stone));

        let mut clone = state.snapshot();
        assert_eq!(clone, state);
        assert_eq!(clone.current_team(), state.current_team());
        assert_eq!(clone.last_move(), state.last_move());
        assert!(!std::ptr::eq(
            clone.current_player().unwrap(),
            state.current_player().unwrap()
        ));

        // Mutating the clone leaves the original alone
        clone.record_move(Place(Coordinates::ORIGIN));
        clone
            .board
            .get_field_mut(Coordinates::ORIGIN)
            .unwrap()
            .push(Piece::new(Team::Two, Kind::Stone));
        assert_eq!(state.turn(), 1);
        assert!(state.board.get_field(Coordinates::ORIGIN).unwrap().is_empty());

        // ...and the other way round
        let frozen = state.snapshot();
        state.record_move(Place(Coordinates::new(-2, 0)));
        assert_eq!(frozen.turn(), 1);
        assert_eq!(frozen.current_team(), Team::Two);
        assert_eq!(state.current_team(), Team::One);
    }

    #[test]
    fn test_snapshot_player_equality_ignores_status() {
        let mut state = seated_state();
        let snapshot = state.snapshot();
        state.player_mut(Team::One).unwrap().mark_hard_timeout();
        assert_eq!(snapshot.players(), state.players());
        assert!(snapshot.player(Team::One).unwrap().is_active());
    }

    #[test]
    fn test_binary_round_trip_and_hash() {
        let mut state = seated_state();
        state.record_move(Place(Coordinates::new(1, 1)));

        let bytes = state.to_bytes().unwrap();
        let restored = TestState::from_bytes(&bytes).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.compute_hash().unwrap(), state.compute_hash().unwrap());

        state.record_move(Place(Coordinates::ORIGIN));
        assert_ne!(restored.compute_hash().unwrap(), state.compute_hash().unwrap());
    }

    #[test]
    fn test_hash_ignores_player_standing() {
        let mut state = seated_state();
        state.record_move(Place(Coordinates::ORIGIN));
        let before = state.compute_hash().unwrap();

        state.player_mut(Team::Two).unwrap().mark_violated("bad");
        assert_eq!(state.compute_hash().unwrap(), before);

        // Seat identity still counts
        let renamed = {
            let mut other = TestState::new(Board::hexagon(1));
            other.add_player(Player::new(Team::One, "red"));
            other.add_player(Player::new(Team::Two, "green"));
            other.record_move(Place(Coordinates::ORIGIN));
            other
        };
        assert_ne!(renamed.compute_hash().unwrap(), before);
    }
}
