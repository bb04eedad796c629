#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Vehicle and seat assignment.
//!
//! Finding a vehicle is read-only; [`occupy`] is the single place where a
//! car's seat table changes hands, so callers can keep the seat bookkeeping
//! consistent with the guest record they update alongside it.

use park_sim_core::{
    Car, CarFlags, CarType, GuestId, LifecycleFlags, Offset, Position, Ride, RideCapabilities,
    RideKind, StationIndex, TrainStatus,
};
use rand::RngCore;

/// Vehicle found for a guest at the front of the queue.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VehicleChoice {
    /// Cars of `train` with a seat available, in train order.
    Cars {
        /// Train loading at the station.
        train: u8,
        /// Candidate cars.
        cars: Vec<u8>,
    },
    /// A paired car already holds one guest; the newcomer takes the partner seat.
    JoinPartner {
        /// Train loading at the station.
        train: u8,
        /// Car with the waiting partner.
        car: u8,
    },
    /// Nothing to board yet.
    None,
}

/// Seat that faces the platform on a rotating car.
#[must_use]
pub const fn rotation_seat(car: &Car) -> u8 {
    ((car.orientation.wrapping_neg() >> 3) & 0xF) * 2
}

/// Finds the train and cars a guest at `station` could board.
#[must_use]
pub fn find_vehicle(ride: &Ride, station: StationIndex) -> VehicleChoice {
    if ride.mode.boards_any_waiting_vehicle() {
        if ride.lifecycle.contains(LifecycleFlags::PASS_STATION_NO_STOPPING) {
            return VehicleChoice::None;
        }
        for (index, train) in ride.trains.iter().enumerate() {
            let Ok(index) = u8::try_from(index) else {
                break;
            };
            let Some(car) = train.cars.first() else {
                continue;
            };
            if car.is_full() || !matches!(train.status, TrainStatus::WaitingForPassengers { .. }) {
                continue;
            }
            return VehicleChoice::Cars {
                train: index,
                cars: vec![0],
            };
        }
        return VehicleChoice::None;
    }

    let Some(train_index) = ride.station(station).and_then(|station| station.train_at_station)
    else {
        return VehicleChoice::None;
    };
    let Some(train) = ride.trains.get(usize::from(train_index)) else {
        return VehicleChoice::None;
    };

    let rotation = ride.mode.is_rotation();
    let mut cars = Vec::new();
    for (index, car) in train.cars.iter().enumerate() {
        let Ok(index) = u8::try_from(index) else {
            break;
        };
        if car.paired && car.next_free_seat & 1 == 1 {
            return VehicleChoice::JoinPartner {
                train: train_index,
                car: index,
            };
        }
        if car.is_full() {
            continue;
        }
        if rotation {
            let facing = car.seats.get(usize::from(rotation_seat(car)));
            if facing.map_or(true, Option::is_some) {
                continue;
            }
        }
        cars.push(index);
    }

    if cars.is_empty() {
        VehicleChoice::None
    } else {
        VehicleChoice::Cars {
            train: train_index,
            cars,
        }
    }
}

/// Picks one of `cars`; thrill rides favour the front and back cars.
pub fn choose_car(ride: &Ride, cars: &[u8], rng: &mut impl RngCore) -> Option<u8> {
    let last = cars.len().checked_sub(1)?;
    let roll = rng.next_u32() as u8;
    let index = if ride.has(RideCapabilities::HAS_G_FORCES) && roll & 0xC != 0xC {
        if rng.next_u32() & 1 == 1 {
            0
        } else {
            last
        }
    } else {
        (usize::from(roll) * cars.len()) >> 8
    };
    cars.get(index).copied()
}

/// Seat the next boarding guest takes in `car`.
#[must_use]
pub fn choose_seat(ride: &Ride, car: &Car) -> u8 {
    if ride.mode.is_rotation() {
        rotation_seat(car) + (car.next_free_seat & 1)
    } else {
        car.next_free_seat
    }
}

/// Hands `seat` of `car` to `guest`. Returns `false` when the seat does not exist.
pub fn occupy(car: &mut Car, seat: u8, guest: GuestId, colour: u8) -> bool {
    let index = usize::from(seat);
    let Some(slot) = car.seats.get_mut(index) else {
        return false;
    };
    *slot = Some(guest);
    if let Some(shirt) = car.seat_colours.get_mut(index) {
        *shirt = colour;
    }
    car.next_free_seat = car.next_free_seat.saturating_add(1);
    true
}

/// Gives up a seat that was handed out but never boarded.
pub fn release(car: &mut Car, seat: u8) {
    if let Some(slot) = car.seats.get_mut(usize::from(seat)) {
        *slot = None;
    }
    car.next_free_seat = car.next_free_seat.saturating_sub(1);
}

/// Seat location used to pick a boarding waypoint set.
///
/// Seats are split into eight segments around the ride base; the station
/// direction rotates the segment. Enterprise wheels use all eight, other
/// rides four. Car types without segments send everyone to the same spot.
#[must_use]
pub fn waypoint_seat_location(kind: RideKind, car_type: &CarType, seat: u8, track_direction: u8) -> u8 {
    let mut segment = seat & 0x7;
    let mut fixed = seat & 0xF8;
    let mut direction = track_direction;
    if kind != RideKind::Enterprise {
        direction *= 2;
    }
    if car_type.waypoint_segments == 0 {
        direction /= 2;
        segment = 0;
        fixed = 0;
    }
    ((segment + direction) & 0x7) + fixed
}

/// Index of the boarding waypoint set for an entrance direction and seat location.
#[must_use]
pub const fn waypoint_set(direction: u8, seat_location: u8) -> u8 {
    (direction & 3) | seat_location.wrapping_mul(4)
}

/// Waypoint `waypoint` of `set`, relative to the ride base.
#[must_use]
pub fn waypoint(car_type: &CarType, set: u8, waypoint: u8) -> Option<Offset> {
    car_type
        .loading_waypoints
        .get(usize::from(set))
        .and_then(|points| points.get(usize::from(waypoint)))
        .copied()
}

/// Platform point beside `car` where the guest in `seat` boards.
#[must_use]
pub fn loading_point(car_type: &CarType, car: &Car, seat: u8, fallback: (i32, i32)) -> (i32, i32) {
    let positions = &car_type.loading_positions;
    let offset = match positions.len() {
        0 => 0,
        len => i32::from(positions[usize::from(seat).min(len - 1)]),
    };
    let (mut x, mut y) = fallback;
    match car.sprite_direction / 8 {
        0 => x = car.position.x - offset,
        1 => y = car.position.y + offset,
        2 => x = car.position.x + offset,
        _ => y = car.position.y - offset,
    }
    (x, y)
}

/// Reports whether the car type boards by walking straight to the car.
#[must_use]
pub const fn boards_at_car(car_type: &CarType) -> bool {
    car_type.flags.contains(CarFlags::DODGEM_PLACEMENT)
}

/// Position of a car, used by rides that load around the vehicle itself.
#[must_use]
pub fn car_position(ride: &Ride, train: u8, car: u8) -> Option<Position> {
    ride.car(train, car).map(|car| car.position)
}
