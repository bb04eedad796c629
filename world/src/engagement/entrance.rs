use park_sim_core::{
    Advance, CarFlags, Event, Guest, NewsKind, RideCapabilities, RideId, RideKind, RideSubState,
    StationGeometry, TrainStatus, WaypointCursor, HEIGHT_STEP,
};
use park_sim_system_boarding as boarding;

use super::{head_to, head_to_within, World};

/// Ticks between two reports of guests stuck on the same ride.
const STUCK_REPORT_INTERVAL: u64 = 3000;

/// Where a guest stepping off the entrance platform walks next.
enum Boarding {
    Waypoints { target: (i32, i32), set: u8 },
    Car { target: (i32, i32), tolerance: Option<u8> },
}

/// Counts one more tick of waiting; `true` once the counter wraps.
fn waited_too_long(guest: &mut Guest) -> bool {
    guest.rejoin_queue_timeout = guest.rejoin_queue_timeout.wrapping_add(1);
    guest.rejoin_queue_timeout == 0
}

impl World {
    pub(super) fn update_through_entrance(&mut self, guest: &mut Guest) {
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };

        let wide = self
            .ride_car_type(guest)
            .is_some_and(|car_type| car_type.has_wide_entrance());
        let threshold = if wide { 28 } else { 16 };
        let platform = self
            .rides
            .get(&ride_id)
            .map_or(0, |ride| ride.descriptor.platform_height);
        let entering = guest.sub_state == RideSubState::InEntrance;
        if let Advance::Moving { distance, .. } = self.walk(guest) {
            if entering && distance < threshold {
                self.set_sub_state(guest, RideSubState::FreeVehicleCheck);
            }
            guest.position.z = geometry.height * HEIGHT_STEP;
            if distance < threshold + 4 {
                guest.position.z += platform;
            }
            return;
        }

        if entering {
            self.set_sub_state(guest, RideSubState::FreeVehicleCheck);
            return;
        }
        self.leave_entrance(guest, geometry);
    }

    fn leave_entrance(&mut self, guest: &mut Guest, geometry: StationGeometry) {
        let Some(ride_id) = guest.current_ride else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };

        if ride.has(RideCapabilities::NO_VEHICLES) {
            match ride.descriptor.kind {
                RideKind::Maze => self.enter_maze(guest, geometry),
                RideKind::SpiralSlide => self.enter_slide(guest, geometry),
                _ => self.report_stuck(guest, ride_id),
            }
            return;
        }

        let Some(seat) = guest.seat else {
            log::warn!("guest {:?} left the entrance of {ride_id:?} without a seat", guest.id);
            return;
        };
        let Some(car) = ride.car(seat.train, seat.car) else {
            return;
        };
        let Some(car_type) = ride.car_type_of(car) else {
            return;
        };

        let next = if car_type.flags.contains(CarFlags::LOADING_WAYPOINTS) {
            let location = boarding::waypoint_seat_location(
                ride.descriptor.kind,
                car_type,
                seat.seat,
                geometry.track_direction.get(),
            );
            let set = boarding::waypoint_set(geometry.entrance.direction.get(), location);
            let base = if ride.descriptor.kind == RideKind::Enterprise {
                boarding::car_position(ride, seat.train, 0).map(|at| (at.x, at.y))
            } else {
                Some(geometry.start.centre())
            };
            match (base, boarding::waypoint(car_type, set, 0)) {
                (Some((x, y)), Some(offset)) => Boarding::Waypoints {
                    target: (x + offset.x, y + offset.y),
                    set,
                },
                _ => {
                    log::warn!("car type of {ride_id:?} has no boarding waypoint set {set}");
                    return;
                }
            }
        } else if boarding::boards_at_car(car_type) {
            let Some(at) = boarding::car_position(ride, seat.train, seat.car) else {
                return;
            };
            Boarding::Car {
                target: (at.x, at.y),
                tolerance: Some(15),
            }
        } else {
            let current = (guest.destination.x, guest.destination.y);
            Boarding::Car {
                target: boarding::loading_point(car_type, car, seat.seat, current),
                tolerance: None,
            }
        };

        match next {
            Boarding::Waypoints { target, set } => {
                head_to(guest, target);
                self.set_sub_state(
                    guest,
                    RideSubState::ApproachVehicleWaypoints(WaypointCursor { set, waypoint: 0 }),
                );
            }
            Boarding::Car { target, tolerance } => {
                match tolerance {
                    Some(tolerance) => head_to_within(guest, target, tolerance),
                    None => head_to(guest, target),
                }
                self.set_sub_state(guest, RideSubState::ApproachVehicle);
            }
        }
    }

    /// Warns the player about a walk-through ride the engine has no path for.
    fn report_stuck(&mut self, guest: &Guest, ride: RideId) {
        let tick = self.tick;
        let due = self
            .stuck_reports
            .get(&ride)
            .map_or(true, |last| tick.saturating_sub(*last) > STUCK_REPORT_INTERVAL);
        if !due {
            return;
        }
        let _ = self.stuck_reports.insert(ride, tick);
        log::warn!("guests are getting stuck on {ride:?}");
        self.announce(guest, NewsKind::GuestsStuckOnRide, ride);
    }

    pub(super) fn update_free_vehicle_check(&mut self, guest: &mut Guest) {
        let Some(ride_id) = guest.current_ride else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };

        if ride.has(RideCapabilities::NO_VEHICLES) {
            let closed = !ride.is_open() || ride.vehicle_change_timeout != 0;
            if closed || waited_too_long(guest) {
                self.rejoin_queue(guest);
            } else {
                self.enter_ride(guest);
            }
            return;
        }

        let Some(seat) = guest.seat else {
            self.rejoin_queue(guest);
            return;
        };
        let Some(car) = ride.car(seat.train, seat.car) else {
            self.rejoin_queue(guest);
            return;
        };

        if !car.paired {
            self.enter_ride(guest);
            return;
        }
        let rotation = ride.mode.is_rotation();
        if rotation {
            if seat.seat & 1 == 1 || car.next_free_seat & 1 == 0 {
                self.enter_ride(guest);
                return;
            }
        } else if (seat.seat | 1) < car.next_free_seat {
            self.enter_ride(guest);
            return;
        }

        // Waiting for a partner to fill the other half of the pair.
        let departing = ride
            .trains
            .get(usize::from(seat.train))
            .is_some_and(|train| matches!(train.status, TrainStatus::ReadyToDepart { .. }));
        if ride.is_open() && !waited_too_long(guest) && !departing {
            return;
        }
        if !rotation && car.next_free_seat.wrapping_sub(1) != seat.seat {
            return;
        }

        if let Some(car) = self
            .rides
            .get_mut(&ride_id)
            .and_then(|target| target.car_mut(seat.train, seat.car))
        {
            boarding::release(car, seat.seat);
        }
        guest.seat = None;
        self.rejoin_queue(guest);
    }

    fn enter_ride(&mut self, guest: &mut Guest) {
        let Some(ride_id) = guest.current_ride else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let price = self.admission(ride);
        let in_ride = ride.has(RideCapabilities::IN_RIDE);
        let slide = ride.descriptor.kind == RideKind::SpiralSlide;

        if !price.is_zero() {
            if guest.has_voucher_for(ride_id) {
                guest.inventory.voucher = None;
                self.emit(Event::VoucherRedeemed {
                    guest: guest.id,
                    ride: ride_id,
                });
            } else {
                if let Some(target) = self.rides.get_mut(&ride_id) {
                    target.income += price;
                }
                guest.paid_on_rides += price;
                guest.spend(price);
                self.emit(Event::FarePaid {
                    guest: guest.id,
                    ride: ride_id,
                    amount: price,
                });
            }
        }

        self.set_sub_state(guest, RideSubState::LeaveEntrance);
        let mut queue_time = guest.days_in_queue;
        if queue_time < 253 {
            queue_time += 3;
        }
        if let Some(station) = self
            .rides
            .get_mut(&ride_id)
            .and_then(|target| target.station_mut(guest.current_station))
        {
            station.queue_time = queue_time / 2;
        }

        let news = if in_ride {
            NewsKind::GuestInRide
        } else {
            NewsKind::GuestOnRide
        };
        self.announce(guest, news, ride_id);
        if slide {
            guest.special_sprite = 1;
        }

        self.update_through_entrance(guest);
    }
}
