use std::collections::{BTreeMap, BTreeSet};

use park_sim_core::{RideId, StationGeometry, StationIndex, TileCoords, TileElement, TrackQuery};

/// In-memory tile store answering the track queries of the engagement engine.
///
/// Station geometry is keyed by ride and station; tile elements by tile and
/// height in height steps. Both maps iterate in key order so every query is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParkLayout {
    stations: BTreeMap<(RideId, StationIndex), StationGeometry>,
    elements: BTreeMap<(TileCoords, i32), TileElement>,
}

impl ParkLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the geometry of a station, replacing any previous entry.
    pub fn set_station(&mut self, ride: RideId, station: StationIndex, geometry: StationGeometry) {
        let _ = self.stations.insert((ride, station), geometry);
    }

    /// Places an element on a tile at `height`, replacing whatever stood there.
    pub fn place(&mut self, tile: TileCoords, height: i32, element: TileElement) {
        let _ = self.elements.insert((tile, height), element);
    }

    /// Removes every station and tile element owned by `ride`.
    pub fn remove_ride(&mut self, ride: RideId) {
        self.stations.retain(|(owner, _), _| *owner != ride);
        self.elements.retain(|_, element| match element {
            TileElement::Track { ride: owner, .. } | TileElement::RideExit { ride: owner } => {
                *owner != ride
            }
            TileElement::Path => true,
        });
    }
}

impl TrackQuery for ParkLayout {
    fn station_geometry(&self, ride: RideId, station: StationIndex) -> Option<StationGeometry> {
        self.stations.get(&(ride, station)).copied()
    }

    fn element_at(&self, tile: TileCoords, height: i32) -> Option<TileElement> {
        self.elements.get(&(tile, height)).copied()
    }

    fn rides_on_tile(&self, tile: TileCoords) -> Vec<RideId> {
        let rides: BTreeSet<RideId> = self
            .elements
            .range((tile, i32::MIN)..=(tile, i32::MAX))
            .filter_map(|(_, element)| match element {
                TileElement::Track { ride, .. } => Some(*ride),
                TileElement::RideExit { .. } | TileElement::Path => None,
            })
            .collect();
        rides.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{Direction, TileLocation};

    fn geometry() -> StationGeometry {
        StationGeometry {
            entrance: TileLocation::new(TileCoords::new(1, 0), 2, Direction::new(0)),
            exit: TileLocation::new(TileCoords::new(3, 0), 2, Direction::new(2)),
            start: TileCoords::new(2, 0),
            height: 2,
            track_direction: Direction::new(1),
        }
    }

    #[test]
    fn rides_on_tile_ignores_height_and_deduplicates() {
        let mut layout = ParkLayout::new();
        let tile = TileCoords::new(4, 4);
        layout.place(tile, 2, TileElement::Track { ride: RideId::new(3), maze_entry: 0 });
        layout.place(tile, 6, TileElement::Track { ride: RideId::new(3), maze_entry: 0 });
        layout.place(tile, 9, TileElement::Track { ride: RideId::new(1), maze_entry: 0 });
        layout.place(tile, 12, TileElement::RideExit { ride: RideId::new(8) });
        layout.place(TileCoords::new(4, 5), 2, TileElement::Track { ride: RideId::new(7), maze_entry: 0 });

        assert_eq!(layout.rides_on_tile(tile), vec![RideId::new(1), RideId::new(3)]);
    }

    #[test]
    fn removing_a_ride_clears_its_geometry_and_track() {
        let mut layout = ParkLayout::new();
        let ride = RideId::new(2);
        layout.set_station(ride, StationIndex::new(0), geometry());
        layout.place(TileCoords::new(2, 0), 2, TileElement::Track { ride, maze_entry: 0 });
        layout.place(TileCoords::new(3, 0), 2, TileElement::RideExit { ride });
        layout.place(TileCoords::new(0, 0), 2, TileElement::Path);

        layout.remove_ride(ride);

        assert_eq!(layout.station_geometry(ride, StationIndex::new(0)), None);
        assert_eq!(layout.element_at(TileCoords::new(2, 0), 2), None);
        assert_eq!(layout.element_at(TileCoords::new(3, 0), 2), None);
        assert_eq!(layout.element_at(TileCoords::new(0, 0), 2), Some(TileElement::Path));
    }
}
