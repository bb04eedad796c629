use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Side length of a map tile expressed in world units.
pub const TILE_SIZE: i32 = 32;

/// Number of world units covered by a single height step.
pub const HEIGHT_STEP: i32 = 8;

/// Amount of money expressed in cents.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Money(i32);

impl Money {
    /// No money at all.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from whole units and cents, e.g. `Money::new(10, 50)` is 10.50.
    #[must_use]
    pub const fn new(whole: i32, cents: i32) -> Self {
        Self(whole * 100 + cents)
    }

    /// Creates an amount from a raw number of cents.
    #[must_use]
    pub const fn from_cents(cents: i32) -> Self {
        Self(cents)
    }

    /// Raw number of cents.
    #[must_use]
    pub const fn cents(self) -> i32 {
        self.0
    }

    /// Amount expressed in tenths of a whole unit, truncated toward zero.
    #[must_use]
    pub const fn dimes(self) -> i32 {
        self.0 / 10
    }

    /// Reports whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Reports whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Sum of both amounts, saturating at the numeric bounds.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

/// Fixed-point ride rating with two decimal places (`550` reads as 5.50).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RideRating(i16);

impl RideRating {
    /// Creates a rating from its whole and hundredths parts.
    #[must_use]
    pub const fn new(whole: i16, hundredths: i16) -> Self {
        Self(whole * 100 + hundredths)
    }

    /// Creates a rating from its raw fixed-point value.
    #[must_use]
    pub const fn from_raw(raw: i16) -> Self {
        Self(raw)
    }

    /// Raw fixed-point value.
    #[must_use]
    pub const fn raw(self) -> i16 {
        self.0
    }
}

/// Excitement, intensity and nausea ratings of a ride once they have been computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RideRatings {
    /// How thrilling the ride is.
    pub excitement: RideRating,
    /// How intense the ride is.
    pub intensity: RideRating,
    /// How sickening the ride is.
    pub nausea: RideRating,
}

impl RideRatings {
    /// Creates a ratings triple from raw fixed-point values.
    #[must_use]
    pub const fn new(excitement: i16, intensity: i16, nausea: i16) -> Self {
        Self {
            excitement: RideRating::from_raw(excitement),
            intensity: RideRating::from_raw(intensity),
            nausea: RideRating::from_raw(nausea),
        }
    }
}

/// Peak forces measured on a ride, fixed point with two decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GForces {
    /// Highest positive vertical force.
    pub max_positive_vertical: i32,
    /// Lowest (most negative) vertical force.
    pub max_negative_vertical: i32,
    /// Highest lateral force.
    pub max_lateral: i32,
}

/// Position of an entity in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate along the x axis.
    pub x: i32,
    /// Horizontal coordinate along the y axis.
    pub y: i32,
    /// Elevation.
    pub z: i32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Tile containing the position.
    #[must_use]
    pub const fn tile(&self) -> TileCoords {
        TileCoords::from_world(self.x, self.y)
    }
}

/// Coordinates of a map tile.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoords {
    /// Tile column.
    pub x: i32,
    /// Tile row.
    pub y: i32,
}

impl TileCoords {
    /// Creates new tile coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing the provided world coordinates.
    #[must_use]
    pub const fn from_world(x: i32, y: i32) -> Self {
        Self {
            x: x.div_euclid(TILE_SIZE),
            y: y.div_euclid(TILE_SIZE),
        }
    }

    /// World coordinates of the tile's north-west corner.
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        (self.x * TILE_SIZE, self.y * TILE_SIZE)
    }

    /// World coordinates of the tile's centre.
    #[must_use]
    pub const fn centre(&self) -> (i32, i32) {
        (
            self.x * TILE_SIZE + TILE_SIZE / 2,
            self.y * TILE_SIZE + TILE_SIZE / 2,
        )
    }

    /// Manhattan distance between two tiles.
    #[must_use]
    pub const fn manhattan_distance(&self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// One of the four tile edge directions.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Direction(u8);

impl Direction {
    const UNIT_DELTAS: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

    /// Creates a direction, wrapping the value into `0..4`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value & 3)
    }

    /// Numeric representation in `0..4`.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Opposite direction.
    #[must_use]
    pub const fn reverse(&self) -> Self {
        Self(self.0 ^ 2)
    }

    /// Unit step along the direction.
    #[must_use]
    pub const fn delta(&self) -> (i32, i32) {
        Self::UNIT_DELTAS[self.0 as usize]
    }

    /// Step of a full tile along the direction.
    #[must_use]
    pub const fn tile_delta(&self) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (dx * TILE_SIZE, dy * TILE_SIZE)
    }
}

/// Tile, height and facing of an entrance or exit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileLocation {
    /// Tile holding the element.
    pub tile: TileCoords,
    /// Height of the element in height steps.
    pub z: i32,
    /// Facing of the element.
    pub direction: Direction,
}

impl TileLocation {
    /// Creates a new tile location.
    #[must_use]
    pub const fn new(tile: TileCoords, z: i32, direction: Direction) -> Self {
        Self { tile, z, direction }
    }

    /// World coordinates of the tile centre shifted `distance` units along the facing.
    #[must_use]
    pub const fn centre_offset(&self, distance: i32) -> (i32, i32) {
        let (x, y) = self.tile.centre();
        let (dx, dy) = self.direction.delta();
        (x + dx * distance, y + dy * distance)
    }
}

/// Relative offset in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    /// Offset along the x axis.
    pub x: i32,
    /// Offset along the y axis.
    pub y: i32,
}

impl Offset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
