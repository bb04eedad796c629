use park_sim_core::{
    Advance, CommandError, Event, Guest, GuestId, GuestState, NewsKind, RideCapabilities, RideId,
    RideSubState, SeatAssignment, StationIndex, Thought, ThoughtKind, HEIGHT_STEP,
};
use park_sim_system_boarding::{self as boarding, VehicleChoice};
use park_sim_system_desirability::{should_engage, Approach, QueueTail};
use rand::RngCore;

use super::{head_to_within, World};
use crate::queue;

/// Distance in front of the entrance where the queue ends.
const QUEUE_END_OFFSET: i32 = -20;
/// Gap kept behind the guest ahead.
const FOLLOW_TOLERANCE: u8 = 8;
/// Ticks of queuing before the guest starts complaining.
const COMPLAIN_AFTER: u16 = 3500;
/// Ticks of queuing before an unhappy guest may give up.
const GIVE_UP_AFTER: u16 = 4300;

impl World {
    pub(crate) fn arrive_at_ride(
        &mut self,
        id: GuestId,
        ride: RideId,
        station: StationIndex,
        via_queue: bool,
    ) -> Result<(), CommandError> {
        self.with_guest(id, |world, guest| world.arrive(guest, ride, station, via_queue))
    }

    fn arrive(
        &mut self,
        guest: &mut Guest,
        ride_id: RideId,
        station: StationIndex,
        via_queue: bool,
    ) -> Result<(), CommandError> {
        let ride = self
            .rides
            .get(&ride_id)
            .ok_or(CommandError::UnknownRide(ride_id))?;
        if ride.has(RideCapabilities::IS_SHOP) {
            return Err(CommandError::IsAShop(ride_id));
        }
        let waiting = ride
            .station(station)
            .ok_or(CommandError::UnknownStation {
                ride: ride_id,
                station,
            })?
            .queue;
        if !matches!(guest.state, GuestState::Walking | GuestState::Sitting) {
            return Err(CommandError::GuestBusy(guest.id));
        }

        let tail = waiting
            .last
            .and_then(|last| self.guests.get(&last))
            .map(|last| QueueTail {
                position: last.position,
                time_in_queue: last.time_in_queue,
            });
        let verdict = should_engage(
            guest,
            ride,
            Approach::present(station, via_queue),
            tail,
            &self.context,
            &mut self.rng,
        );
        self.apply_effects(guest, ride_id, verdict.effects);
        self.emit(Event::EngagementDecided {
            guest: guest.id,
            ride: ride_id,
            accepted: verdict.accepted,
        });
        if verdict.accepted {
            self.join_queue(guest, ride_id, station, via_queue);
        }
        Ok(())
    }

    fn join_queue(&mut self, guest: &mut Guest, ride: RideId, station: StationIndex, via_queue: bool) {
        let Some(waiting) = self
            .rides
            .get_mut(&ride)
            .and_then(|target| target.station_mut(station))
            .map(|target| &mut target.queue)
        else {
            return;
        };
        queue::enqueue(waiting, guest);
        let length = waiting.length;

        guest.current_ride = Some(ride);
        guest.current_station = station;
        guest.time_in_queue = 0;
        guest.days_in_queue = 0;
        guest.destination.tolerance = 2;
        self.set_state(guest, GuestState::Queuing);
        let step = if via_queue {
            RideSubState::InQueue
        } else {
            RideSubState::AtEntrance
        };
        self.set_sub_state(guest, step);
        log::debug!("guest {:?} joined queue of {ride:?} ({length} waiting)", guest.id);
        self.emit(Event::QueueJoined {
            guest: guest.id,
            ride,
            station,
            length,
        });
        self.announce(guest, NewsKind::GuestJoinedQueue, ride);
    }

    /// Unlinks the guest from the queue of its current station.
    pub(crate) fn leave_queue(&mut self, guest: &mut Guest) {
        let Some(ride) = guest.current_ride else {
            return;
        };
        let station = guest.current_station;
        let Some(waiting) = self
            .rides
            .get_mut(&ride)
            .and_then(|target| target.station_mut(station))
            .map(|target| &mut target.queue)
        else {
            guest.next_in_queue = None;
            return;
        };
        if queue::remove(waiting, &mut self.guests, guest) {
            let length = waiting.length;
            self.emit(Event::QueueLeft {
                guest: guest.id,
                ride,
                station,
                length,
            });
        }
    }

    pub(super) fn update_queuing(&mut self, guest: &mut Guest) {
        let Some(ride) = guest.current_ride else {
            self.release(guest, GuestState::Falling);
            return;
        };
        if !self.rides.get(&ride).is_some_and(|target| target.is_open()) {
            self.leave_queue(guest);
            self.release(guest, GuestState::Falling);
            return;
        }

        guest.time_in_queue = guest.time_in_queue.saturating_add(1);
        if self.tick % self.tuning.ticks_per_day.max(1) == 0 {
            guest.days_in_queue = guest.days_in_queue.saturating_add(1);
        }

        if guest.sub_state != RideSubState::InQueue {
            if !queue::is_front(guest, &self.guests) {
                return;
            }
            if guest.next_in_queue.is_some() {
                log::warn!(
                    "guest {:?} treated as front of {ride:?} although its queue link is set",
                    guest.id
                );
                self.emit(Event::QueueFrontRepaired {
                    guest: guest.id,
                    ride,
                });
            }
            guest.destination.tolerance = 0;
            self.set_state(guest, GuestState::QueuingFront);
            self.set_sub_state(guest, RideSubState::AtEntrance);
            return;
        }

        self.follow_queue(guest);

        if guest.time_in_queue >= COMPLAIN_AFTER && self.rng.next_u32() & 0xFFFF <= 93 {
            self.think(guest, Thought::new(ThoughtKind::QueuingAges, Some(ride)));
        }
        if guest.time_in_queue >= GIVE_UP_AFTER
            && guest.happiness <= 65
            && self.rng.next_u32() & 0xFFFF < 2184
        {
            log::debug!("guest {:?} gave up queuing for {ride:?}", guest.id);
            guest.sprite_direction ^= 16;
            self.leave_queue(guest);
            self.release(guest, GuestState::Falling);
        }
    }

    /// Walks behind the guest ahead, or up to the entrance when nobody is.
    fn follow_queue(&mut self, guest: &mut Guest) {
        let ahead = guest
            .next_in_queue
            .and_then(|id| self.guests.get(&id))
            .map(|ahead| (ahead.position.x, ahead.position.y));
        match ahead {
            Some(target) => head_to_within(guest, target, FOLLOW_TOLERANCE),
            None => {
                let Some(geometry) = self.station_geometry(guest) else {
                    return;
                };
                head_to_within(guest, geometry.entrance.centre_offset(QUEUE_END_OFFSET), 2);
            }
        }
        if self.walk(guest) == Advance::Arrived && ahead.is_none() {
            self.set_sub_state(guest, RideSubState::AtEntrance);
        }
    }

    /// Gives up at the entrance, but only once the guest stands right at it.
    fn try_leave(&mut self, guest: &mut Guest) {
        if guest.destination.tolerance == 0 {
            self.leave_queue(guest);
            self.release(guest, GuestState::Falling);
        }
    }

    pub(super) fn update_at_entrance(&mut self, guest: &mut Guest) {
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };

        if guest.destination.tolerance != 0 {
            match self.walk(guest) {
                Advance::Moving { distance, .. } => {
                    if distance < 16 {
                        guest.position.z = geometry.entrance.z * HEIGHT_STEP + 2;
                    }
                }
                Advance::Arrived => {
                    guest.destination.tolerance = 0;
                    guest.sprite_direction ^= 16;
                }
            }
        }

        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let no_vehicles = ride.has(RideCapabilities::NO_VEHICLES);
        let vehicle = if no_vehicles {
            if ride.num_riders >= u16::from(ride.operation_option) {
                return;
            }
            VehicleChoice::None
        } else {
            match boarding::find_vehicle(ride, guest.current_station) {
                VehicleChoice::None => return,
                found => found,
            }
        };

        if !ride.is_open() || ride.vehicle_change_timeout != 0 {
            self.try_leave(guest);
            return;
        }
        if ride.is_broken_down() {
            return;
        }

        let price = self.admission(ride);
        if !price.is_zero() {
            if !guest.has_voucher_for(ride_id) {
                if !guest.cash.is_positive() && self.context.money_enabled() {
                    self.think(guest, Thought::new(ThoughtKind::SpentMoney, None));
                    self.try_leave(guest);
                    return;
                }
                if price > guest.cash {
                    if guest.destination.tolerance == 0 {
                        self.think(guest, Thought::new(ThoughtKind::CantAffordRide, Some(ride_id)));
                    }
                    self.try_leave(guest);
                    return;
                }
            }
            if ride
                .value
                .is_some_and(|value| value.cents() * 2 < price.cents())
            {
                self.think(guest, Thought::new(ThoughtKind::BadValue, Some(ride_id)));
                self.try_leave(guest);
                return;
            }
        }

        if !no_vehicles {
            // Joining a partner still rolls for the car, keeping the draw sequence fixed.
            let (train, cars) = match vehicle {
                VehicleChoice::Cars { train, cars } => (train, cars),
                VehicleChoice::JoinPartner { train, car } => (train, vec![car]),
                VehicleChoice::None => return,
            };
            let pick = boarding::choose_car(ride, &cars, &mut self.rng).map(|car| (train, car));
            let Some((train, car)) = pick else {
                return;
            };
            let Some(seat) = ride
                .car(train, car)
                .map(|chosen| boarding::choose_seat(ride, chosen))
            else {
                return;
            };
            let colour = guest.tshirt_colour;
            let seated = self
                .rides
                .get_mut(&ride_id)
                .and_then(|target| target.car_mut(train, car))
                .is_some_and(|chosen| boarding::occupy(chosen, seat, guest.id, colour));
            if !seated {
                log::warn!("seat {seat} of car {car} on {ride_id:?} does not exist");
                return;
            }
            guest.seat = Some(SeatAssignment { train, car, seat });
        }

        self.go_to_ride_entrance(guest);
    }

    fn go_to_ride_entrance(&mut self, guest: &mut Guest) {
        let Some(geometry) = self.station_geometry(guest) else {
            return;
        };
        let wide = self
            .seat_car_type(guest)
            .is_some_and(|car_type| car_type.has_wide_entrance());
        let shift = if wide { 32 } else { 21 };
        head_to_within(guest, geometry.entrance.centre_offset(shift), 2);
        self.set_state(guest, GuestState::EnteringRide);
        self.set_sub_state(guest, RideSubState::InEntrance);
        guest.rejoin_queue_timeout = 0;
        guest.time_on_ride = 0;
        self.leave_queue(guest);
    }

    /// Sends a guest that found no vehicle back to the front of its queue.
    pub(super) fn rejoin_queue(&mut self, guest: &mut Guest) {
        let Some(geometry) = self.station_geometry(guest) else {
            return;
        };
        let (Some(ride), station) = (guest.current_ride, guest.current_station) else {
            return;
        };
        head_to_within(guest, geometry.entrance.centre_offset(QUEUE_END_OFFSET), 2);
        self.set_state(guest, GuestState::QueuingFront);
        self.set_sub_state(guest, RideSubState::AtEntrance);

        let Some(waiting) = self
            .rides
            .get_mut(&ride)
            .and_then(|target| target.station_mut(station))
            .map(|target| &mut target.queue)
        else {
            return;
        };
        queue::insert_at_front(waiting, &mut self.guests, guest);
        let length = waiting.length;
        log::debug!("guest {:?} found no vehicle on {ride:?} and rejoined the queue", guest.id);
        self.emit(Event::QueueJoined {
            guest: guest.id,
            ride,
            station,
            length,
        });
    }
}
