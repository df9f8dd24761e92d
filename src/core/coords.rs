//! Integer Grid Geometry
//!
//! Coordinates and displacement vectors on an integer lattice, shared by
//! board-based games. Hexagonal boards use the doubled-hex layout: odd rows
//! are shifted by half a cell, which becomes an integer offset once the
//! x axis is doubled.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

// =============================================================================
// COORDINATES
// =============================================================================

/// A cell address `(x, y)` on the lattice.
///
/// Ordered row-major (`y` first, then `x`) so boards iterate row by row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinates {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Coordinates {
    /// Origin of the lattice.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create new coordinates.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Map offset-hex coordinates `(x, y)` into the doubled-hex layout.
    ///
    /// Odd rows gain one column of offset. Uses euclidean remainder so
    /// negative rows map the same way as positive ones.
    ///
    /// `x` must lie within `i32::MIN / 2 ..= (i32::MAX - 1) / 2`; use
    /// [`Coordinates::checked_doubled_hex`] for untrusted input.
    #[inline]
    pub const fn doubled_hex(x: i32, y: i32) -> Self {
        Self {
            x: x * 2 + y.rem_euclid(2),
            y,
        }
    }

    /// Like [`Coordinates::doubled_hex`], but `None` when the doubled
    /// column does not fit into an `i32`.
    pub fn checked_doubled_hex(x: i32, y: i32) -> Option<Self> {
        let x = x.checked_mul(2)?.checked_add(y.rem_euclid(2))?;
        Some(Self { x, y })
    }

    /// Convert these offset-hex coordinates into doubled-hex coordinates.
    #[inline]
    pub const fn to_doubled_hex(self) -> Self {
        Self::doubled_hex(self.x, self.y)
    }

    /// Inverse of [`Coordinates::doubled_hex`].
    #[inline]
    pub const fn from_doubled_hex(self) -> Self {
        Self {
            x: self.x.div_euclid(2),
            y: self.y,
        }
    }

    /// Whether these coordinates address a cell of the doubled-hex layout.
    ///
    /// Doubled-hex cells always have `x + y` even.
    #[inline]
    pub const fn is_doubled_hex(self) -> bool {
        (self.x + self.y).rem_euclid(2) == 0
    }

    /// The four orthogonally adjacent cells.
    pub fn neighbors(self) -> [Coordinates; 4] {
        Vector::CARDINALS.map(|v| self + v)
    }

    /// The six adjacent cells in the doubled-hex layout.
    pub fn hex_neighbors(self) -> [Coordinates; 6] {
        DoubledHex::DIRECTIONS.map(|v| self + v)
    }

    /// Number of hex steps between two doubled-hex cells.
    pub fn hex_distance(self, other: Self) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dy + ((dx - dy) / 2).max(0)
    }

    /// Interpret the coordinates as a displacement from the origin.
    #[inline]
    pub const fn to_vector(self) -> Vector {
        Vector::new(self.x, self.y)
    }
}

impl Ord for Coordinates {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Coordinates {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<Vector> for Coordinates {
    type Output = Coordinates;
    #[inline]
    fn add(self, rhs: Vector) -> Coordinates {
        Coordinates::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl Sub<Vector> for Coordinates {
    type Output = Coordinates;
    #[inline]
    fn sub(self, rhs: Vector) -> Coordinates {
        Coordinates::new(self.x - rhs.dx, self.y - rhs.dy)
    }
}

impl Sub for Coordinates {
    type Output = Vector;
    #[inline]
    fn sub(self, rhs: Coordinates) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinates({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// VECTOR
// =============================================================================

/// Integer displacement between two [`Coordinates`].
///
/// Vectors are ordered by squared length. `Vector` itself is not `Ord`,
/// because vectors of equal length but different direction are not equal;
/// compare with [`Vector::cmp_length`] or sort through [`ByLength`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    /// Difference in x direction
    pub dx: i32,
    /// Difference in y direction
    pub dy: i32,
}

impl Vector {
    /// Zero displacement
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    /// The four orthogonal unit steps.
    pub const CARDINALS: [Vector; 4] = [
        Vector::new(-1, 0),
        Vector::new(0, -1),
        Vector::new(1, 0),
        Vector::new(0, 1),
    ];

    /// The four diagonal unit steps.
    pub const DIAGONALS: [Vector; 4] = [
        Vector::new(-1, -1),
        Vector::new(-1, 1),
        Vector::new(1, -1),
        Vector::new(1, 1),
    ];

    /// Create a new vector.
    #[inline]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Squared length. Exact, prefer this for comparisons.
    #[inline]
    pub const fn length_squared(self) -> i64 {
        let dx = self.dx as i64;
        let dy = self.dy as i64;
        dx * dx + dy * dy
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        (self.length_squared() as f64).sqrt()
    }

    /// Area of the axis-aligned rectangle spanned by this vector.
    #[inline]
    pub const fn area(self) -> i64 {
        (self.dx as i64 * self.dy as i64).abs()
    }

    /// Compare lengths without floating point.
    #[inline]
    pub fn cmp_length(&self, other: &Self) -> Ordering {
        self.length_squared().cmp(&other.length_squared())
    }

    /// Scale by an integer factor, keeping the direction.
    #[inline]
    pub const fn scale(self, factor: i32) -> Self {
        Self::new(self.dx * factor, self.dy * factor)
    }

    /// Whether this vector runs along one of the six hex axes of the
    /// doubled-hex layout.
    #[inline]
    pub const fn is_straight(self) -> bool {
        self.dx.abs() == self.dy.abs() || (self.dx % 2 == 0 && self.dy == 0)
    }

    /// Interpret the displacement as coordinates relative to the origin.
    #[inline]
    pub const fn to_coordinates(self) -> Coordinates {
        Coordinates::new(self.dx, self.dy)
    }
}

/// Sort key ordering vectors by squared length.
///
/// Ties between equally long vectors fall back to `(dx, dy)`, so the order
/// agrees with equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ByLength(pub Vector);

impl Ord for ByLength {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .cmp_length(&other.0)
            .then(self.0.dx.cmp(&other.0.dx))
            .then(self.0.dy.cmp(&other.0.dy))
    }
}

impl PartialOrd for ByLength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Vector {
    type Output = Vector;
    #[inline]
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl Sub for Vector {
    type Output = Vector;
    #[inline]
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

impl Neg for Vector {
    type Output = Vector;
    #[inline]
    fn neg(self) -> Vector {
        Vector::new(-self.dx, -self.dy)
    }
}

impl Mul<i32> for Vector {
    type Output = Vector;
    #[inline]
    fn mul(self, rhs: i32) -> Vector {
        self.scale(rhs)
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector({}, {})", self.dx, self.dy)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}>", self.dx, self.dy)
    }
}

// =============================================================================
// DOUBLED-HEX DIRECTIONS
// =============================================================================

/// Unit steps of the doubled-hex layout.
pub struct DoubledHex;

impl DoubledHex {
    /// One cell to the left
    pub const LEFT: Vector = Vector::new(-2, 0);
    /// One cell to the right
    pub const RIGHT: Vector = Vector::new(2, 0);
    /// Up and to the left
    pub const UP_LEFT: Vector = Vector::new(-1, -1);
    /// Up and to the right
    pub const UP_RIGHT: Vector = Vector::new(1, -1);
    /// Down and to the left
    pub const DOWN_LEFT: Vector = Vector::new(-1, 1);
    /// Down and to the right
    pub const DOWN_RIGHT: Vector = Vector::new(1, 1);

    /// All six directions, clockwise starting at `LEFT`.
    pub const DIRECTIONS: [Vector; 6] = [
        Self::LEFT,
        Self::UP_LEFT,
        Self::UP_RIGHT,
        Self::RIGHT,
        Self::DOWN_RIGHT,
        Self::DOWN_LEFT,
    ];
}

// Every hex direction must lie on a hex axis.
const _: () = {
    let mut i = 0;
    while i < DoubledHex::DIRECTIONS.len() {
        assert!(DoubledHex::DIRECTIONS[i].is_straight());
        i += 1;
    }
};

// =============================================================================
// TESTS
// =============================================================================
