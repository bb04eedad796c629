#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ride candidate search.
//!
//! Two shapes of question: [`pick_ride`] asks "what should I ride next" and
//! keeps the most exciting acceptable ride, [`head_for_nearest`] asks "where
//! is the closest ride that covers this need". Both only read the park; the
//! caller commits the guest to the returned choice.

use std::collections::{BTreeMap, BTreeSet};

use park_sim_core::{
    Guest, GuestState, LifecycleFlags, Need, Ride, RideId, RideMemory, SimulationContext,
    StationIndex, TileCoords, TrackQuery, TILE_SIZE,
};
use park_sim_system_desirability::{should_engage, Approach, Effect};
use rand::RngCore;

/// Tiles scanned in every direction around a guest without a park map.
pub const SEARCH_RADIUS_TILES: i32 = 10;
/// Edge length of the park in tiles.
pub const MAP_SIZE_TILES: i32 = 256;

/// Drop height that makes a ride visible from anywhere in the park.
const LANDMARK_DROP_HEIGHT: u8 = 66;
/// Excitement that makes a ride visible from anywhere in the park (8.00).
const LANDMARK_EXCITEMENT: i16 = 800;

/// Result of a search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Ride the guest should head for.
    pub choice: Option<RideId>,
    /// Evaluator side effects, tagged with the ride they concern, in order.
    pub effects: Vec<(RideId, Effect)>,
}

impl SearchOutcome {
    fn none() -> Self {
        Self::default()
    }
}

/// Rides with track inside the square window around `guest`.
#[must_use]
pub fn rides_in_window(guest: &Guest, track: &impl TrackQuery) -> BTreeSet<RideId> {
    let centre = guest.position.tile();
    let mut found = BTreeSet::new();
    for x in centre.x - SEARCH_RADIUS_TILES..=centre.x + SEARCH_RADIUS_TILES {
        for y in centre.y - SEARCH_RADIUS_TILES..=centre.y + SEARCH_RADIUS_TILES {
            if !(0..MAP_SIZE_TILES).contains(&x) || !(0..MAP_SIZE_TILES).contains(&y) {
                continue;
            }
            found.extend(track.rides_on_tile(TileCoords::new(x, y)));
        }
    }
    found
}

fn is_landmark(ride: &Ride) -> bool {
    ride.highest_drop_height > LANDMARK_DROP_HEIGHT
        || ride
            .ratings
            .map_or(false, |ratings| ratings.excitement.raw() >= LANDMARK_EXCITEMENT)
}

/// Runs the evaluator in thinking mode over `candidates`, collecting effects.
fn acceptable<'a>(
    guest: &Guest,
    candidates: impl Iterator<Item = &'a Ride>,
    context: &SimulationContext,
    rng: &mut impl RngCore,
    effects: &mut Vec<(RideId, Effect)>,
) -> Vec<&'a Ride> {
    let mut accepted = Vec::new();
    for ride in candidates {
        if ride.lifecycle.contains(LifecycleFlags::QUEUE_FULL) {
            continue;
        }
        let verdict = should_engage(guest, ride, Approach::thinking(), None, context, rng);
        effects.extend(verdict.effects.into_iter().map(|effect| (ride.id, effect)));
        if verdict.accepted {
            accepted.push(ride);
        }
    }
    accepted
}

/// Picks the most exciting ride the guest would go on.
///
/// Only walking guests that are not leaving, not already heading somewhere and
/// not busy with food search. A guest holding a map considers every ride not
/// yet ridden; otherwise the rides around them plus the landmark rides.
pub fn pick_ride(
    guest: &Guest,
    memory: &RideMemory,
    rides: &BTreeMap<RideId, Ride>,
    track: &impl TrackQuery,
    context: &SimulationContext,
    rng: &mut impl RngCore,
) -> SearchOutcome {
    if guest.state != GuestState::Walking
        || guest.heading_to.is_some()
        || guest.is_leaving_park()
        || guest.inventory.carrying_food_or_drink
    {
        return SearchOutcome::none();
    }

    let considered: BTreeSet<RideId> = if guest.inventory.has_map {
        rides
            .keys()
            .copied()
            .filter(|ride| !memory.has_ridden(*ride))
            .collect()
    } else {
        let mut nearby = rides_in_window(guest, track);
        nearby.extend(rides.values().filter(|ride| is_landmark(ride)).map(|ride| ride.id));
        nearby
    };

    let mut outcome = SearchOutcome::none();
    let accepted = acceptable(
        guest,
        considered.iter().filter_map(|id| rides.get(id)),
        context,
        rng,
        &mut outcome.effects,
    );

    let mut best: Option<(RideId, i16)> = None;
    for ride in accepted {
        let Some(ratings) = ride.ratings else {
            continue;
        };
        let excitement = ratings.excitement.raw();
        if best.map_or(true, |(_, top)| excitement > top) {
            best = Some((ride.id, excitement));
        }
    }
    outcome.choice = best.map(|(ride, _)| ride);
    if let Some(ride) = outcome.choice {
        log::debug!("guest {:?} picked ride {:?}", guest.id, ride);
    }
    outcome
}

/// Finds the closest ride covering `need` that the guest would use.
///
/// Distance is measured from the guest to the start of station 0. First aid
/// is always searched locally; other needs use the park map when the guest
/// has one.
pub fn head_for_nearest(
    guest: &Guest,
    need: Need,
    rides: &BTreeMap<RideId, Ride>,
    track: &impl TrackQuery,
    context: &SimulationContext,
    rng: &mut impl RngCore,
) -> SearchOutcome {
    if !matches!(guest.state, GuestState::Walking | GuestState::Sitting) || guest.is_leaving_park()
    {
        return SearchOutcome::none();
    }
    let capability = need.capability();
    let already_heading = guest
        .heading_to
        .and_then(|id| rides.get(&id))
        .is_some_and(|ride| ride.has(capability));
    if already_heading {
        return SearchOutcome::none();
    }
    if need == Need::Toilet && guest.inventory.carrying_food_or_drink {
        return SearchOutcome::none();
    }

    let considered: BTreeSet<RideId> = if guest.inventory.has_map && !need.only_close() {
        rides.keys().copied().collect()
    } else {
        rides_in_window(guest, track)
    };

    let mut outcome = SearchOutcome::none();
    let accepted = acceptable(
        guest,
        considered
            .iter()
            .filter_map(|id| rides.get(id))
            .filter(|ride| ride.has(capability)),
        context,
        rng,
        &mut outcome.effects,
    );

    let mut closest: Option<(RideId, i32)> = None;
    for ride in accepted {
        let Some(geometry) = track.station_geometry(ride.id, StationIndex::new(0)) else {
            continue;
        };
        let distance = (geometry.start.x * TILE_SIZE - guest.position.x).abs()
            + (geometry.start.y * TILE_SIZE - guest.position.y).abs();
        if closest.map_or(true, |(_, best)| distance < best) {
            closest = Some((ride.id, distance));
        }
    }
    outcome.choice = closest.map(|(ride, _)| ride);
    if let Some(ride) = outcome.choice {
        log::debug!("guest {:?} heads for {:?} to cover {:?}", guest.id, ride, need);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{
        GuestId, Position, RideKind, RideRatings, RideStatus, RideTypeDescriptor, RideTypeId,
        StationGeometry, TileElement,
    };
    use rand::rngs::mock::StepRng;

    #[derive(Default)]
    struct Tiles {
        tracks: BTreeMap<(i32, i32), Vec<RideId>>,
    }

    impl TrackQuery for Tiles {
        fn station_geometry(&self, _: RideId, _: StationIndex) -> Option<StationGeometry> {
            None
        }

        fn element_at(&self, _: TileCoords, _: i32) -> Option<TileElement> {
            None
        }

        fn rides_on_tile(&self, tile: TileCoords) -> Vec<RideId> {
            self.tracks.get(&(tile.x, tile.y)).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn window_spans_ten_tiles_each_way_and_stops_at_the_map_edge() {
        let mut tiles = Tiles::default();
        let _ = tiles.tracks.insert((0, 0), vec![RideId::new(1)]);
        let _ = tiles.tracks.insert((10, 10), vec![RideId::new(2)]);
        let _ = tiles.tracks.insert((11, 0), vec![RideId::new(3)]);
        let guest = Guest::new(GuestId::new(1), Position::new(16, 16, 0));

        let found = rides_in_window(&guest, &tiles);
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![RideId::new(1), RideId::new(2)]);
    }

    #[test]
    fn tall_or_thrilling_rides_are_landmarks() {
        let mut ride = Ride::new(
            RideId::new(1),
            "Tower",
            RideTypeDescriptor::new(RideTypeId::new(1), RideKind::Tracked),
        );
        assert!(!is_landmark(&ride));
        ride.highest_drop_height = 67;
        assert!(is_landmark(&ride));
        ride.highest_drop_height = 0;
        ride.ratings = Some(RideRatings::new(800, 0, 0));
        assert!(is_landmark(&ride));
    }

    #[test]
    fn full_queues_are_skipped_without_asking() {
        let mut ride = Ride::new(
            RideId::new(1),
            "Busy",
            RideTypeDescriptor::new(RideTypeId::new(1), RideKind::Tracked),
        );
        ride.status = RideStatus::Open;
        ride.ratings = Some(RideRatings::new(500, 100, 100));
        ride.lifecycle.insert(LifecycleFlags::QUEUE_FULL);
        let guest = Guest::new(GuestId::new(1), Position::default());
        let mut effects = Vec::new();
        let accepted = acceptable(
            &guest,
            std::iter::once(&ride),
            &SimulationContext::default(),
            &mut StepRng::new(0, 0),
            &mut effects,
        );
        assert!(accepted.is_empty());
        assert!(effects.is_empty());
    }
}
