//! Board and Piece Model
//!
//! A board is a fixed set of fields addressed by [`Coordinates`]. Every
//! field holds a stack of pieces, bottom first. Pieces are plain values;
//! only the stacks change, so cloning a board copies every stack and never
//! shares one between the copies.
//!
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::coords::Coordinates;
use crate::game::player::Team;

// =============================================================================
// PIECE
// =============================================================================

/// An immutable game piece owned by a team.
///
/// `K` is the game-specific piece kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece<K> {
    team: Team,
    kind: K,
}

impl<K: Copy> Piece<K> {
    /// Create a piece.
    pub const fn new(team: Team, kind: K) -> Self {
        Self { team, kind }
    }

    /// Owning team.
    #[inline]
    pub fn team(&self) -> Team {
        self.team
    }

    /// Game-specific kind.
    #[inline]
    pub fn kind(&self) -> K {
        self.kind
    }
}

// =============================================================================
// FIELD
// =============================================================================

/// One cell of a board and the stack of pieces on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field<K> {
    coordinates: Coordinates,
    pieces: Vec<Piece<K>>,
}

impl<K: Copy> Field<K> {
    /// Create an empty field.
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            pieces: Vec::new(),
        }
    }

    /// Address of this field.
    #[inline]
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// The stack, bottom first.
    pub fn pieces(&self) -> &[Piece<K>] {
        &self.pieces
    }

    /// Topmost piece.
    pub fn top(&self) -> Option<Piece<K>> {
        self.pieces.last().copied()
    }

    /// Team controlling this field (owner of the top piece).
    pub fn owner(&self) -> Option<Team> {
        self.top().map(|p| p.team())
    }

    /// Stack height.
    #[inline]
    pub fn height(&self) -> usize {
        self.pieces.len()
    }

    /// No pieces on this field.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Put a piece on top of the stack.
    pub fn push(&mut self, piece: Piece<K>) {
        self.pieces.push(piece);
    }

    /// Take the top piece off the stack.
    pub fn pop(&mut self) -> Option<Piece<K>> {
        self.pieces.pop()
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// Board errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The coordinates are not part of this board's shape.
    #[error("{0} is outside the board")]
    OutOfBounds(Coordinates),
}

/// A fixed-shape grid of fields.
///
/// Serialized as a list of fields, since the coordinate keys are not
/// strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "K: Serialize", deserialize = "K: Deserialize<'de>"))]
pub struct Board<K> {
    #[serde(with = "field_list")]
    fields: BTreeMap<Coordinates, Field<K>>,
}

impl<K: Copy> Board<K> {
    /// Create an empty board with exactly the given cells.
    pub fn from_coordinates(cells: impl IntoIterator<Item = Coordinates>) -> Self {
        Self {
            fields: cells.into_iter().map(|c| (c, Field::new(c))).collect(),
        }
    }

    /// Rectangular board with cells `(0..width, 0..height)`.
    pub fn rectangle(width: i32, height: i32) -> Self {
        Self::from_coordinates(
            (0..height).flat_map(|y| (0..width).map(move |x| Coordinates::new(x, y))),
        )
    }

    /// Hexagon-shaped board in doubled-hex coordinates, centered on the
    /// origin. Radius 0 is a single cell; radius `r` has `3r(r+1)+1` cells.
    pub fn hexagon(radius: i32) -> Self {
        let radius = radius.max(0);
        Self::from_coordinates(
            (-radius..=radius)
                .flat_map(|y| (-2 * radius..=2 * radius).map(move |x| Coordinates::new(x, y)))
                .filter(|c| c.is_doubled_hex())
                .filter(|c| c.hex_distance(Coordinates::ORIGIN) <= radius),
        )
    }

    /// Field at `coordinates`.
    pub fn get_field(&self, coordinates: Coordinates) -> Result<&Field<K>, BoardError> {
        self.fields
            .get(&coordinates)
            .ok_or(BoardError::OutOfBounds(coordinates))
    }

    /// Mutable field at `coordinates`.
    pub fn get_field_mut(&mut self, coordinates: Coordinates) -> Result<&mut Field<K>, BoardError> {
        self.fields
            .get_mut(&coordinates)
            .ok_or(BoardError::OutOfBounds(coordinates))
    }

    /// Whether the coordinates belong to this board.
    pub fn contains(&self, coordinates: Coordinates) -> bool {
        self.fields.contains_key(&coordinates)
    }

    /// All fields in row-major order.
    pub fn fields(&self) -> impl Iterator<Item = &Field<K>> {
        self.fields.values()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Board without any field.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Count pieces on the board matching a predicate.
    pub fn count_pieces(&self, mut predicate: impl FnMut(&Piece<K>) -> bool) -> usize {
        self.fields
            .values()
            .flat_map(|f| f.pieces.iter())
            .filter(|p| predicate(p))
            .count()
    }
}

mod field_list {
    use std::collections::BTreeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Field;
    use crate::core::coords::Coordinates;

    pub fn serialize<S, K>(fields: &BTreeMap<Coordinates, Field<K>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
    {
        serializer.collect_seq(fields.values())
    }

    pub fn deserialize<'de, D, K>(deserializer: D) -> Result<BTreeMap<Coordinates, Field<K>>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de>,
    {
        let list = Vec::<Field<K>>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|f| (f.coordinates, f)).collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    enum Kind {
        Beetle,
        Ant,
    }

    #[test]
    fn test_rectangle_shape() {
        let board: Board<Kind> = Board::rectangle(4, 3);
        assert_eq!(board.len(), 12);
        assert!(board.contains(Coordinates::new(3, 2)));
        assert!(!board.contains(Coordinates::new(4, 0)));
    }

    #[test]
    fn test_hexagon_shape() {
        for (radius, cells) in [(0, 1), (1, 7), (2, 19), (3, 37)] {
            let board: Board<Kind> = Board::hexagon(radius);
            assert_eq!(board.len(), cells, "radius {}", radius);
            assert!(board.fields().all(|f| f.coordinates().is_doubled_hex()));
        }
    }

    #[test]
    fn test_get_field_out_of_bounds() {
        let board: Board<Kind> = Board::hexagon(1);
        assert!(board.get_field(Coordinates::new(2, 0)).is_ok());
        assert_eq!(
            board.get_field(Coordinates::new(1, 0)).unwrap_err(),
            BoardError::OutOfBounds(Coordinates::new(1, 0))
        );
    }

    #[test]
    fn test_stack_order() {
        let mut board: Board<Kind> = Board::rectangle(1, 1);
        let field = board.get_field_mut(Coordinates::ORIGIN).unwrap();
        field.push(Piece::new(Team::One, Kind::Ant));
        field.push(Piece::new(Team::Two, Kind::Beetle));

        let field = board.get_field(Coordinates::ORIGIN).unwrap();
        assert_eq!(field.height(), 2);
        assert_eq!(field.owner(), Some(Team::Two));
        assert_eq!(field.pieces()[0].kind(), Kind::Ant);
        assert_eq!(board.count_pieces(|p| p.team() == Team::One), 1);
    }

    #[test]
    fn test_clone_is_equal_but_independent() {
        let mut board: Board<Kind> = Board::hexagon(1);
        board
            .get_field_mut(Coordinates::ORIGIN)
            .unwrap()
            .push(Piece::new(Team::One, Kind::Beetle));

        let mut clone = board.clone();
        assert_eq!(clone, board);

        let original_stack = board.get_field(Coordinates::ORIGIN).unwrap().pieces();
        let cloned_stack = clone.get_field(Coordinates::ORIGIN).unwrap().pieces();
        assert!(!std::ptr::eq(original_stack, cloned_stack));
        assert!(!std::ptr::eq(
            board.get_field(Coordinates::ORIGIN).unwrap(),
            clone.get_field(Coordinates::ORIGIN).unwrap()
        ));

        clone
            .get_field_mut(Coordinates::ORIGIN)
            .unwrap()
            .push(Piece::new(Team::Two, Kind::Ant));
        assert_ne!(clone, board);
        assert_eq!(board.get_field(Coordinates::ORIGIN).unwrap().height(), 1);
    }

    #[test]
    fn test_json_round_trip_keeps_shape() {
        let mut board: Board<Kind> = Board::hexagon(1);
        board
            .get_field_mut(Coordinates::new(-1, 1))
            .unwrap()
            .push(Piece::new(Team::Two, Kind::Ant));

        let json = serde_json::to_string(&board).unwrap();
        let parsed: Board<Kind> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, board);
    }
}
