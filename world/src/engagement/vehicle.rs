use park_sim_core::{
    Advance, CarFlags, CommandError, Direction, Event, Guest, GuestFlags, GuestId, GuestState,
    Position, RideId, RideKind, RideMemory, RideSubState, SeatAssignment, StationIndex,
    TrainStatus, WaypointCursor, HEIGHT_STEP,
};
use park_sim_system_boarding as boarding;
use park_sim_system_satisfaction::{
    becomes_favourite, favourite_rating, nausea_growth, satisfaction, satisfaction_bucket,
};

use super::{head_to, head_to_within, World};

/// Distance from the car to the platform spot a dismounting guest appears on.
const PLATFORM_SHIFT: i32 = 12;
/// Same distance for go-karts, which sit lower and closer to the kerb.
const GO_KART_SHIFT: i32 = 9;

/// Moves a platform point along the car's loading edge.
fn shift_along_car(sprite_direction: u8, (x, y): (i32, i32), offset: i32) -> (i32, i32) {
    match sprite_direction / 8 {
        0 => (x - offset, y),
        1 => (x, y + offset),
        2 => (x + offset, y),
        _ => (x, y - offset),
    }
}

impl World {
    pub(super) fn update_approach_vehicle(&mut self, guest: &mut Guest) {
        if self.walk(guest) == Advance::Arrived {
            self.set_sub_state(guest, RideSubState::EnterVehicle);
        }
    }

    pub(super) fn update_vehicle_waypoints(&mut self, guest: &mut Guest, cursor: WaypointCursor) {
        let (Some(ride_id), Some(geometry), Some(seat)) =
            (guest.current_ride, self.station_geometry(guest), guest.seat)
        else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let kind = ride.descriptor.kind;

        if let Advance::Moving { distance, .. } = self.walk(guest) {
            if kind == RideKind::MotionSimulator {
                // Climbing the steps up to the simulator door.
                guest.position.z = geometry.height * HEIGHT_STEP + 2;
                if cursor.waypoint == 2 {
                    let remaining = (distance - 12).max(0);
                    if remaining <= 15 {
                        guest.position.z += 15 - remaining;
                    }
                }
            }
            return;
        }

        if cursor.waypoint == 2 {
            self.set_sub_state(guest, RideSubState::EnterVehicle);
            return;
        }

        let waypoint = cursor.waypoint + 1;
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let base = if kind == RideKind::Enterprise {
            boarding::car_position(ride, seat.train, 0).map(|at| (at.x, at.y))
        } else {
            Some(geometry.start.centre())
        };
        let offset = self
            .seat_car_type(guest)
            .and_then(|car_type| boarding::waypoint(car_type, cursor.set, waypoint));
        let (Some((x, y)), Some(offset)) = (base, offset) else {
            return;
        };
        head_to(guest, (x + offset.x, y + offset.y));
        self.set_sub_state(
            guest,
            RideSubState::ApproachVehicleWaypoints(WaypointCursor {
                set: cursor.set,
                waypoint,
            }),
        );
    }

    pub(super) fn update_enter_vehicle(&mut self, guest: &mut Guest) {
        let (Some(ride_id), Some(seat)) = (guest.current_ride, guest.seat) else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let Some(car) = ride.car(seat.train, seat.car) else {
            return;
        };

        // Seats fill in order unless the car turns to face the platform.
        if !ride.mode.is_rotation() && seat.seat != car.occupants {
            return;
        }

        let partner = if car.paired {
            car.seats
                .get(usize::from(seat.seat ^ 1))
                .copied()
                .flatten()
        } else {
            None
        };

        if let Some(partner_id) = partner {
            let Some(mut partner) = self.guests.remove(&partner_id) else {
                return;
            };
            if partner.sub_state != RideSubState::EnterVehicle {
                let _ = self.guests.insert(partner_id, partner);
                return;
            }
            if let Some(partner_seat) = partner.seat {
                self.board(&mut partner, ride_id, partner_seat);
            }
            let _ = self.guests.insert(partner_id, partner);
        }

        self.board(guest, ride_id, seat);
    }

    fn board(&mut self, guest: &mut Guest, ride_id: RideId, seat: SeatAssignment) {
        if let Some(ride) = self.rides.get_mut(&ride_id) {
            ride.current_customers = ride.current_customers.saturating_add(1);
            if let Some(car) = ride.car_mut(seat.train, seat.car) {
                car.occupants = car.occupants.saturating_add(1);
                car.mass = car.mass.saturating_add(u16::from(guest.mass));
            }
        }
        self.set_state(guest, GuestState::OnRide);
        guest.time_on_ride = 0;
        self.set_sub_state(guest, RideSubState::OnRide);
        self.on_enter_ride(guest, ride_id);
    }

    /// Scores the visit and records it, as the guest boards or walks in.
    pub(super) fn on_enter_ride(&mut self, guest: &mut Guest, ride_id: RideId) {
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let empty = RideMemory::new();
        let memory = self.memories.get(&guest.id).unwrap_or(&empty);
        let score = satisfaction(guest, ride, memory, &self.context);
        let ratings = ride.ratings;
        let ride_type = ride.descriptor.type_id;

        self.record_satisfaction(ride_id, satisfaction_bucket(score));
        guest.rides_ridden = guest.rides_ridden.saturating_add(1);
        self.memories
            .entry(guest.id)
            .or_default()
            .record(ride_id, ride_type);

        guest.flags.remove(GuestFlags::FAVOURITE_PENDING);
        if becomes_favourite(guest, ratings) {
            guest.favourite_ride_rating = favourite_rating(guest, ratings);
            guest.flags.insert(GuestFlags::FAVOURITE_PENDING);
        }
        guest.adjust_happiness_target(score);
        guest.nausea_target = nausea_growth(guest, ratings);

        log::debug!("guest {:?} entered {ride_id:?} (satisfaction {score})", guest.id);
        self.emit(Event::GuestEnteredRide {
            guest: guest.id,
            ride: ride_id,
            satisfaction: score,
        });
        guest.pending_exit = Some(ride_id);
    }

    pub(crate) fn set_train_status(
        &mut self,
        ride: RideId,
        train: u8,
        status: TrainStatus,
    ) -> Result<(), CommandError> {
        let target = self.rides.get_mut(&ride).ok_or(CommandError::UnknownRide(ride))?;
        let riders: Vec<GuestId> = {
            let entry = target
                .trains
                .get_mut(usize::from(train))
                .ok_or(CommandError::UnknownTrain { ride, train })?;
            entry.status = status;
            entry
                .cars
                .iter()
                .flat_map(|car| car.seats.iter().flatten().copied())
                .collect()
        };

        match status {
            TrainStatus::WaitingForPassengers { station } => {
                if let Some(stop) = target.station_mut(station) {
                    stop.train_at_station = Some(train);
                }
            }
            TrainStatus::Travelling | TrainStatus::ReadyToDepart { .. } => {
                for stop in &mut target.stations {
                    if stop.train_at_station == Some(train) {
                        stop.train_at_station = None;
                    }
                }
            }
            TrainStatus::Unloading { .. } => {}
        }
        self.emit(Event::TrainStatusChanged {
            ride,
            train,
            status,
        });

        if let TrainStatus::Unloading { .. } = status {
            for id in riders {
                let _ = self.with_guest(id, |world, guest| {
                    if guest.current_ride == Some(ride)
                        && guest.state == GuestState::OnRide
                        && guest.sub_state == RideSubState::OnRide
                    {
                        world.set_state(guest, GuestState::LeavingRide);
                        world.set_sub_state(guest, RideSubState::LeaveVehicle);
                    }
                    Ok(())
                });
            }
        }
        Ok(())
    }

    pub(super) fn update_leave_vehicle(&mut self, guest: &mut Guest) {
        let (Some(ride_id), Some(seat)) = (guest.current_ride, guest.seat) else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let Some(car) = ride.car(seat.train, seat.car) else {
            return;
        };
        if !ride.mode.is_rotation() && car.occupants.checked_sub(1) != Some(seat.seat) {
            return;
        }

        guest.dismount_frame = guest.dismount_frame.wrapping_add(1);
        if guest.dismount_frame & 3 != 0 {
            return;
        }
        guest.dismount_frame = 0;

        let mass = u16::from(guest.mass);
        let Some(target) = self.rides.get_mut(&ride_id) else {
            return;
        };
        target.current_customers = target.current_customers.saturating_sub(1);
        let Some(car) = target.car_mut(seat.train, seat.car) else {
            return;
        };
        car.occupants = car.occupants.saturating_sub(1);
        car.mass = car.mass.saturating_sub(mass);
        if let Some(slot) = car.seats.get_mut(usize::from(seat.seat)) {
            *slot = None;
        }
        if car.occupants == 0 {
            car.next_free_seat = 0;
        }
        let station = car.current_station.unwrap_or(StationIndex::new(0));
        guest.current_station = station;

        let Some(geometry) = self.station_geometry(guest) else {
            log::warn!("guest {:?} left {ride_id:?} at a station without geometry", guest.id);
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let Some(car) = ride.car(seat.train, seat.car) else {
            return;
        };
        let Some(car_type) = ride.car_type_of(car) else {
            return;
        };
        let platform = ride.descriptor.platform_height;

        if !car_type.flags.contains(CarFlags::LOADING_WAYPOINTS) {
            let platform_direction = geometry.exit.direction.reverse();
            let default_flags = ride
                .default_car_type()
                .map_or(CarFlags::empty(), |default| default.flags);
            let spot = if default_flags.intersects(CarFlags::CHAIRLIFT.union(CarFlags::GO_KART)) {
                let shift = if default_flags.contains(CarFlags::GO_KART) {
                    GO_KART_SHIFT
                } else {
                    PLATFORM_SHIFT
                };
                let side = Direction::new((car.sprite_direction.wrapping_add(3) / 8).wrapping_add(1));
                let (dx, dy) = side.delta();
                (car.position.x + dx * shift, car.position.y + dy * shift)
            } else {
                let (dx, dy) = platform_direction.delta();
                let beside = (
                    car.position.x + dx * PLATFORM_SHIFT,
                    car.position.y + dy * PLATFORM_SHIFT,
                );
                match car_type.loading_positions.get(usize::from(seat.seat)) {
                    Some(offset) => shift_along_car(car.sprite_direction, beside, i32::from(*offset)),
                    None => beside,
                }
            };
            let wide = ride
                .default_car_type()
                .is_some_and(|default| default.has_wide_entrance());

            guest.position = Position::new(spot.0, spot.1, geometry.height * HEIGHT_STEP + platform);
            head_to_within(guest, geometry.exit.centre_offset(if wide { 32 } else { 20 }), 2);
            guest.sprite_direction = platform_direction.get() * 8;
            self.set_sub_state(guest, RideSubState::ApproachExit);
            return;
        }

        let kind = ride.descriptor.kind;
        let location = boarding::waypoint_seat_location(
            kind,
            car_type,
            seat.seat,
            geometry.track_direction.get(),
        );
        let set = boarding::waypoint_set(geometry.exit.direction.get(), location);
        let base = if kind == RideKind::Enterprise {
            boarding::car_position(ride, seat.train, 0).map(|at| (at.x, at.y))
        } else {
            Some(geometry.start.centre())
        };
        let (Some((x, y)), Some(first), Some(stand)) = (
            base,
            boarding::waypoint(car_type, set, 1),
            boarding::waypoint(car_type, set, 2),
        ) else {
            log::warn!("car type of {ride_id:?} has no exit waypoint set {set}");
            return;
        };

        let mut z = geometry.exit.z * HEIGHT_STEP + platform;
        if kind == RideKind::MotionSimulator {
            z += 15;
        }
        guest.position = Position::new(x + stand.x, y + stand.y, z);
        head_to_within(guest, (x + first.x, y + first.y), 2);
        self.set_sub_state(
            guest,
            RideSubState::ApproachExitWaypoints(WaypointCursor { set, waypoint: 1 }),
        );
    }
}
