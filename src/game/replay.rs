//! Move Log and Replay
//!
//! A session records the opening snapshot and every accepted move. Feeding
//! the log back through the same rules must reproduce the final state
//! bit for bit, which makes finished games verifiable from their moves.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, StateHasher};
use crate::game::logic::{apply_move, GameLogic, LogicError, StateOf};
use crate::game::state::GameState;

/// Opening position plus accepted moves in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveLog<K, M> {
    initial: GameState<K, M>,
    moves: Vec<M>,
}

impl<K: Clone, M: Clone> MoveLog<K, M> {
    /// Start a log from the opening snapshot.
    pub fn new(initial: &GameState<K, M>) -> Self {
        Self {
            initial: initial.snapshot(),
            moves: Vec::new(),
        }
    }

    /// Append an accepted move.
    pub fn record(&mut self, mv: M) {
        self.moves.push(mv);
    }

    /// Opening snapshot.
    pub fn initial(&self) -> &GameState<K, M> {
        &self.initial
    }

    /// Accepted moves in order.
    pub fn moves(&self) -> &[M] {
        &self.moves
    }

    /// Number of accepted moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// No move accepted yet.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Re-apply every move to the opening snapshot.
    pub fn replay<G>(&self, logic: &G) -> Result<StateOf<G>, LogicError>
    where
        G: GameLogic<Piece = K, Move = M>,
    {
        self.moves
            .iter()
            .try_fold(self.initial.snapshot(), |state, mv| apply_move(logic, &state, mv))
    }
}

impl<K: Serialize, M: Serialize> MoveLog<K, M> {
    /// Fingerprint of the opening snapshot and the move sequence.
    pub fn compute_hash(&self) -> Result<StateHash, bincode::Error> {
        let mut hasher = StateHasher::for_move_log();
        hasher.update_bytes(&self.initial.compute_hash()?);
        hasher.update_u32(self.moves.len() as u32);
        for mv in &self.moves {
            hasher.update_bytes(&bincode::serialize(mv)?);
        }
        Ok(hasher.finalize())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::hexstack::{HexStack, StackMove, StackPiece};
    use crate::game::player::{Player, Team};
    use crate::core::coords::Coordinates;

    fn seated(logic: &HexStack) -> StateOf<HexStack> {
        let mut state = logic.setup();
        state.add_player(Player::new(Team::One, "a"));
        state.add_player(Player::new(Team::Two, "b"));
        state
    }

    #[test]
    fn test_replay_reproduces_state() {
        let logic = HexStack::default();
        let mut state = seated(&logic);
        let mut log = MoveLog::new(&state);

        let moves = [
            StackMove::Place { to: Coordinates::ORIGIN, piece: StackPiece::Stone },
            StackMove::Place { to: Coordinates::new(2, 0), piece: StackPiece::Stone },
            StackMove::Place { to: Coordinates::new(-1, 1), piece: StackPiece::Capstone },
        ];
        for mv in moves {
            state = apply_move(&logic, &state, &mv).unwrap();
            log.record(mv);
        }

        let replayed = log.replay(&logic).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(replayed, state);
        assert_eq!(replayed.compute_hash().unwrap(), state.compute_hash().unwrap());
    }

    #[test]
    fn test_replay_surfaces_rule_breach() {
        let logic = HexStack::default();
        let state = seated(&logic);
        let mut log = MoveLog::new(&state);
        log.record(StackMove::Place { to: Coordinates::new(1, 0), piece: StackPiece::Stone });

        assert!(matches!(log.replay(&logic), Err(LogicError::InvalidMove(_))));
    }

    #[test]
    fn test_log_hash_tracks_moves() {
        let logic = HexStack::default();
        let mut log = MoveLog::new(&seated(&logic));
        let empty = log.compute_hash().unwrap();
        log.record(StackMove::Place { to: Coordinates::ORIGIN, piece: StackPiece::Stone });
        assert_ne!(log.compute_hash().unwrap(), empty);
    }
}
