//! Seams to the movement and tile storage subsystems owned outside this engine.

use serde::{Deserialize, Serialize};

use crate::{Direction, Guest, RideId, StationIndex, TileCoords, TileLocation};

/// Outcome of one movement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Advance {
    /// Still walking.
    Moving {
        /// Next x coordinate.
        x: i32,
        /// Next y coordinate.
        y: i32,
        /// Manhattan distance to the destination before the step.
        distance: i32,
    },
    /// Within the destination tolerance.
    Arrived,
}

/// Moves guests towards their destinations one bounded step at a time.
pub trait Movement {
    /// Computes the next step for `guest`. Never blocks.
    fn advance(&mut self, guest: &Guest) -> Advance;
}

/// Entrance, exit and start geometry of a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationGeometry {
    /// Entrance building.
    pub entrance: TileLocation,
    /// Exit building.
    pub exit: TileLocation,
    /// First track piece of the station.
    pub start: TileCoords,
    /// Base height of the station in height steps.
    pub height: i32,
    /// Direction of the first track piece.
    pub track_direction: Direction,
}

/// Element found on a tile at a given height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileElement {
    /// Track piece of a ride.
    Track {
        /// Owning ride.
        ride: RideId,
        /// Hedge bit mask for maze tiles.
        maze_entry: u16,
    },
    /// Exit building of a ride.
    RideExit {
        /// Owning ride.
        ride: RideId,
    },
    /// Footpath.
    Path,
}

/// Read access to ride geometry stored on the map.
pub trait TrackQuery {
    /// Geometry of `station` of `ride`.
    fn station_geometry(&self, ride: RideId, station: StationIndex) -> Option<StationGeometry>;

    /// Element on `tile` at `height` height steps.
    fn element_at(&self, tile: TileCoords, height: i32) -> Option<TileElement>;

    /// Rides with track on `tile`.
    fn rides_on_tile(&self, tile: TileCoords) -> Vec<RideId>;
}
