//! HexStack Reference Game
//!
//! Small stacking game on a hexagonal board in doubled-hex coordinates.
//!
//! Rules:
//! - Each team owns a supply of stones and one capstone.
//! - On its turn a team either places a piece from its supply on any
//!   field, or climbs: moves the top piece of a stack it controls onto a
//!   hex neighbour.
//! - Nothing may be put on top of a capstone.
//! - A stack of `tower_height` pieces wins for the team on top. If a move
//!   completes towers for both teams, the mover wins.
//! - At the turn limit the team controlling more stacks wins; equal counts
//!   draw. A team without any legal move loses.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::core::coords::Coordinates;
use crate::game::board::{Board, Field, Piece};
use crate::game::logic::{GameLogic, LogicError, MoveMistake, StateOf, WinCondition, WinReason};
use crate::game::player::{ActionTimeout, Player, Team};
use crate::game::state::GameState;

// =============================================================================
// TYPES
// =============================================================================

/// HexStack piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPiece {
    /// Regular piece, can be covered
    Stone,
    /// Blocks its field
    Capstone,
}

impl StackPiece {
    /// Both kinds.
    pub const ALL: [StackPiece; 2] = [StackPiece::Stone, StackPiece::Capstone];
}

/// A HexStack action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackMove {
    /// Put a piece from the supply on a field.
    Place {
        /// Target field
        to: Coordinates,
        /// Piece kind taken from the supply
        piece: StackPiece,
    },
    /// Move the top piece of an owned stack to a hex neighbour.
    Climb {
        /// Source field
        from: Coordinates,
        /// Target field
        to: Coordinates,
    },
}

/// Game parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexStackConfig {
    /// Board radius in hex steps
    pub radius: i32,
    /// Stones per team
    pub stones: usize,
    /// Capstones per team
    pub capstones: usize,
    /// Stack height that wins
    pub tower_height: usize,
    /// Turn after which stacks are counted
    pub turn_limit: u32,
    /// Move deadlines
    pub timeout: ActionTimeout,
}

impl Default for HexStackConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            stones: 6,
            capstones: 1,
            tower_height: 3,
            turn_limit: 40,
            timeout: ActionTimeout::new(Duration::from_secs(2), Duration::from_secs(10)),
        }
    }
}

type StackState = GameState<StackPiece, StackMove>;

// =============================================================================
// GAME
// =============================================================================

/// HexStack rules.
#[derive(Clone, Debug, Default)]
pub struct HexStack {
    config: HexStackConfig,
}

impl HexStack {
    /// Create the game with custom parameters.
    pub fn new(config: HexStackConfig) -> Self {
        Self { config }
    }

    /// Game parameters.
    pub fn config(&self) -> &HexStackConfig {
        &self.config
    }

    /// Pieces of `kind` still in the supply of `team`.
    pub fn remaining(&self, state: &StackState, team: Team, kind: StackPiece) -> usize {
        let total = match kind {
            StackPiece::Stone => self.config.stones,
            StackPiece::Capstone => self.config.capstones,
        };
        let used = state
            .board
            .count_pieces(|p| p.team() == team && p.kind() == kind);
        total.saturating_sub(used)
    }

    /// Every legal move of the team to move, in board order.
    pub fn legal_moves(&self, state: &StackState) -> Vec<StackMove> {
        let team = state.current_team();
        let mut moves = Vec::new();

        for kind in StackPiece::ALL {
            if self.remaining(state, team, kind) == 0 {
                continue;
            }
            moves.extend(
                state
                    .board
                    .fields()
                    .filter(|f| accepts_piece(f))
                    .map(|f| StackMove::Place { to: f.coordinates(), piece: kind }),
            );
        }

        for field in state.board.fields().filter(|f| f.owner() == Some(team)) {
            let from = field.coordinates();
            for to in from.hex_neighbors() {
                if state.board.get_field(to).map(accepts_piece).unwrap_or(false) {
                    moves.push(StackMove::Climb { from, to });
                }
            }
        }

        moves
    }

    fn towers(&self, state: &StackState, team: Team) -> usize {
        state
            .board
            .fields()
            .filter(|f| f.height() >= self.config.tower_height && f.owner() == Some(team))
            .count()
    }
}

/// Whether a piece may be put on this field.
fn accepts_piece(field: &Field<StackPiece>) -> bool {
    field.top().map_or(true, |p| p.kind() != StackPiece::Capstone)
}

impl GameLogic for HexStack {
    type Piece = StackPiece;
    type Move = StackMove;

    fn name(&self) -> &str {
        "hexstack"
    }

    fn setup(&self) -> StateOf<Self> {
        GameState::new(Board::hexagon(self.config.radius))
    }

    fn apply(&self, state: &StateOf<Self>, mv: &StackMove) -> Result<StateOf<Self>, LogicError> {
        let team = state.current_team();
        let mut next = state.snapshot();

        match *mv {
            StackMove::Place { to, piece } => {
                if self.remaining(state, team, piece) == 0 {
                    return Err(MoveMistake::new(format!("no {:?} left in supply", piece)).into());
                }
                let field = next
                    .board
                    .get_field_mut(to)
                    .map_err(|e| MoveMistake::new(e.to_string()))?;
                if !accepts_piece(field) {
                    return Err(MoveMistake::new(format!("{} is capped", to)).into());
                }
                field.push(Piece::new(team, piece));
            }
            StackMove::Climb { from, to } => {
                if !from.hex_neighbors().contains(&to) {
                    return Err(MoveMistake::new(format!("{} is not next to {}", to, from)).into());
                }
                if !next
                    .board
                    .get_field(to)
                    .map_err(|e| MoveMistake::new(e.to_string()))
                    .map(accepts_piece)?
                {
                    return Err(MoveMistake::new(format!("{} is capped", to)).into());
                }
                let source = next
                    .board
                    .get_field_mut(from)
                    .map_err(|e| MoveMistake::new(e.to_string()))?;
                if source.owner() != Some(team) {
                    return Err(MoveMistake::new(format!("{} does not control {}", team, from)).into());
                }
                let piece = source
                    .pop()
                    .ok_or_else(|| LogicError::Internal(format!("owned field {} is empty", from)))?;
                next.board
                    .get_field_mut(to)
                    .map_err(|e| LogicError::Internal(e.to_string()))?
                    .push(piece);
            }
        }

        Ok(next)
    }

    fn check_win_condition(&self, state: &StateOf<Self>) -> Option<WinCondition> {
        if state.turn() == 0 {
            return None;
        }
        let mover = state.other_team();

        for team in [mover, mover.opponent()] {
            if self.towers(state, team) > 0 {
                return Some(WinCondition::win(team, WinReason::Rule("tower completed".into())));
            }
        }

        if state.turn() >= self.config.turn_limit {
            let stacks = |team: Team| state.board.fields().filter(|f| f.owner() == Some(team)).count();
            let (one, two) = (stacks(Team::One), stacks(Team::Two));
            let reason = WinReason::Rule(format!("turn limit, stacks {}:{}", one, two));
            return Some(match one.cmp(&two) {
                std::cmp::Ordering::Greater => WinCondition::win(Team::One, reason),
                std::cmp::Ordering::Less => WinCondition::win(Team::Two, reason),
                std::cmp::Ordering::Equal => WinCondition::draw(reason),
            });
        }

        if self.legal_moves(state).is_empty() {
            return Some(WinCondition::win(mover, WinReason::Rule("no legal move left".into())));
        }

        None
    }

    fn timeout_for(&self, _player: &Player) -> ActionTimeout {
        self.config.timeout
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::logic::apply_move;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn place(x: i32, y: i32, piece: StackPiece) -> StackMove {
        StackMove::Place { to: Coordinates::new(x, y), piece }
    }

    fn play(logic: &HexStack, moves: &[StackMove]) -> Result<StackState, LogicError> {
        moves
            .iter()
            .try_fold(logic.setup(), |state, mv| apply_move(logic, &state, mv))
    }

    #[test]
    fn test_setup_board() {
        let logic = HexStack::default();
        let state = logic.setup();
        assert_eq!(state.board.len(), 19);
        assert_eq!(state.turn(), 0);
        assert_eq!(logic.remaining(&state, Team::One, StackPiece::Stone), 6);
        assert_eq!(logic.check_win_condition(&state), None);
        // 19 stone + 19 capstone placements, no climbs
        assert_eq!(logic.legal_moves(&state).len(), 38);
    }

    #[test]
    fn test_capstone_blocks_field() {
        let logic = HexStack::default();
        let state = play(&logic, &[place(0, 0, StackPiece::Capstone)]).unwrap();
        let err = apply_move(&logic, &state, &place(0, 0, StackPiece::Stone)).unwrap_err();
        assert!(matches!(err, LogicError::InvalidMove(_)));
        assert!(!logic
            .legal_moves(&state)
            .contains(&place(0, 0, StackPiece::Stone)));
    }

    #[test]
    fn test_supply_runs_out() {
        let logic = HexStack::default();
        let state = play(
            &logic,
            &[place(0, 0, StackPiece::Capstone), place(2, 0, StackPiece::Stone)],
        )
        .unwrap();
        assert_eq!(logic.remaining(&state, Team::One, StackPiece::Capstone), 0);
        let err = apply_move(&logic, &state, &place(-2, 0, StackPiece::Capstone)).unwrap_err();
        assert!(matches!(err, LogicError::InvalidMove(_)));
    }

    #[test]
    fn test_climb_rules() {
        let logic = HexStack::default();
        let state = play(
            &logic,
            &[place(0, 0, StackPiece::Stone), place(2, 0, StackPiece::Stone)],
        )
        .unwrap();

        // Not a neighbour
        let far = StackMove::Climb { from: Coordinates::ORIGIN, to: Coordinates::new(4, 0) };
        assert!(apply_move(&logic, &state, &far).is_err());

        // Not owned
        let foreign = StackMove::Climb { from: Coordinates::new(2, 0), to: Coordinates::ORIGIN };
        assert!(apply_move(&logic, &state, &foreign).is_err());

        let climb = StackMove::Climb { from: Coordinates::ORIGIN, to: Coordinates::new(2, 0) };
        let next = apply_move(&logic, &state, &climb).unwrap();
        assert!(next.board.get_field(Coordinates::ORIGIN).unwrap().is_empty());
        let target = next.board.get_field(Coordinates::new(2, 0)).unwrap();
        assert_eq!(target.height(), 2);
        assert_eq!(target.owner(), Some(Team::One));
    }

    #[test]
    fn test_tower_wins() {
        let logic = HexStack::default();
        let state = play(
            &logic,
            &[
                place(0, 0, StackPiece::Stone),
                place(0, 0, StackPiece::Stone),
                place(0, 0, StackPiece::Stone),
            ],
        )
        .unwrap();
        let win = logic.check_win_condition(&state).unwrap();
        assert_eq!(win.winner, Some(Team::One));
    }

    #[test]
    fn test_turn_limit_draw() {
        let logic = HexStack::new(HexStackConfig {
            turn_limit: 2,
            ..HexStackConfig::default()
        });
        let state = play(
            &logic,
            &[place(0, 0, StackPiece::Stone), place(2, 0, StackPiece::Stone)],
        )
        .unwrap();
        let result = logic.check_win_condition(&state).unwrap();
        assert!(result.is_draw());
    }

    #[test]
    fn test_random_playout_terminates() {
        let logic = HexStack::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..20 {
            let mut state = logic.setup();
            let mut outcome = None;
            for _ in 0..=logic.config().turn_limit {
                let moves = logic.legal_moves(&state);
                assert!(!moves.is_empty());
                let mv = &moves[rng.gen_range(0..moves.len())];
                state = apply_move(&logic, &state, mv).unwrap();
                outcome = logic.check_win_condition(&state);
                if outcome.is_some() {
                    break;
                }
            }
            assert!(outcome.is_some(), "game did not end by the turn limit");
            assert!(state.turn() <= logic.config().turn_limit);
        }
    }

    #[test]
    fn test_move_json_shape() {
        let json = serde_json::to_string(&place(2, 0, StackPiece::Capstone)).unwrap();
        assert_eq!(json, r#"{"place":{"to":{"x":2,"y":0},"piece":"capstone"}}"#);
    }
}
