//! Ride engagement state machine.
//!
//! A guest's top-level state picks the update routine and its ride sub-state
//! picks the step within it. Every routine runs to completion within the
//! guest's slot of the tick; a guest still walking simply re-enters the same
//! sub-state next tick.

mod entrance;
mod exit;
mod maze;
mod queuing;
mod shop;
mod slide;
mod vehicle;

use park_sim_core::{
    Advance, CarType, CommandError, Destination, Event, Guest, GuestFlags, GuestId, GuestState,
    LifecycleFlags, Money, Need, NewsKind, Ride, RideId, RideMemory, RideSubState,
    StationGeometry, Thought, TrackQuery,
};
use park_sim_system_desirability::Effect;
use park_sim_system_ride_search::{self as ride_search, SearchOutcome};

use crate::World;

/// Points the guest at `(x, y)` keeping the current tolerance.
fn head_to(guest: &mut Guest, (x, y): (i32, i32)) {
    guest.destination.x = x;
    guest.destination.y = y;
}

/// Points the guest at `(x, y)` with a new arrival tolerance.
fn head_to_within(guest: &mut Guest, (x, y): (i32, i32), tolerance: u8) {
    guest.destination = Destination::new(x, y, tolerance);
}

impl World {
    /// Runs one tick of the guest's current activity.
    pub(crate) fn update_guest(&mut self, guest: &mut Guest) {
        match guest.state {
            GuestState::Walking | GuestState::Sitting => {}
            GuestState::Falling => self.set_state(guest, GuestState::Walking),
            GuestState::Queuing => self.update_queuing(guest),
            GuestState::QueuingFront
            | GuestState::EnteringRide
            | GuestState::OnRide
            | GuestState::LeavingRide
            | GuestState::UsingShop => self.update_ride(guest),
        }
    }

    fn update_ride(&mut self, guest: &mut Guest) {
        match guest.sub_state {
            RideSubState::AtEntrance => self.update_at_entrance(guest),
            RideSubState::InEntrance | RideSubState::LeaveEntrance => {
                self.update_through_entrance(guest);
            }
            RideSubState::FreeVehicleCheck => self.update_free_vehicle_check(guest),
            RideSubState::ApproachVehicle => self.update_approach_vehicle(guest),
            RideSubState::EnterVehicle => self.update_enter_vehicle(guest),
            RideSubState::OnRide => guest.time_on_ride = guest.time_on_ride.saturating_add(1),
            RideSubState::LeaveVehicle => self.update_leave_vehicle(guest),
            RideSubState::ApproachExit => self.update_approach_exit(guest),
            RideSubState::InExit => self.update_in_exit(guest),
            RideSubState::LeaveExit => self.update_leave_exit(guest),
            RideSubState::ApproachVehicleWaypoints(cursor) => {
                self.update_vehicle_waypoints(guest, cursor);
            }
            RideSubState::ApproachExitWaypoints(cursor) => {
                self.update_exit_waypoints(guest, cursor);
            }
            RideSubState::ApproachSpiralSlide(cursor) => self.update_approach_slide(guest, cursor),
            RideSubState::OnSpiralSlide(run) => self.update_on_slide(guest, run),
            RideSubState::LeaveSpiralSlide(cursor) => self.update_leave_slide(guest, cursor),
            RideSubState::MazePathfinding(cursor) => self.update_maze(guest, cursor),
            RideSubState::ApproachShop => self.update_approach_shop(guest),
            RideSubState::InteractShop => self.update_interact_shop(guest),
            RideSubState::LeaveShop => self.update_leave_shop(guest),
            RideSubState::None | RideSubState::InQueue => {
                log::warn!(
                    "guest {:?} in {:?} has no ride sub-state to run",
                    guest.id,
                    guest.state
                );
            }
        }
    }

    /// Changes the top-level state, keeping the ride's rider count in step.
    pub(crate) fn set_state(&mut self, guest: &mut Guest, state: GuestState) {
        let was_rider = guest.state.counts_as_rider();
        let is_rider = state.counts_as_rider();
        if was_rider != is_rider {
            if let Some(ride) = guest.current_ride.and_then(|id| self.rides.get_mut(&id)) {
                ride.num_riders = if is_rider {
                    ride.num_riders.saturating_add(1)
                } else {
                    ride.num_riders.saturating_sub(1)
                };
            }
        }
        log::trace!("guest {:?} {:?} -> {:?}", guest.id, guest.state, state);
        guest.state = state;
    }

    /// Moves to another sub-state, reporting changes of step.
    pub(crate) fn set_sub_state(&mut self, guest: &mut Guest, to: RideSubState) {
        let from = guest.sub_state;
        guest.sub_state = to;
        if std::mem::discriminant(&from) != std::mem::discriminant(&to) {
            log::debug!("guest {:?} {:?} -> {:?}", guest.id, from, to);
            self.emit(Event::SubStateChanged {
                guest: guest.id,
                from,
                to,
            });
        }
    }

    /// Drops every ride reference and hands the guest back to the footpath.
    pub(crate) fn release(&mut self, guest: &mut Guest, state: GuestState) {
        self.set_state(guest, state);
        self.set_sub_state(guest, RideSubState::None);
        guest.current_ride = None;
        guest.seat = None;
        guest.next_in_queue = None;
    }

    /// Takes one movement step towards the destination.
    pub(crate) fn walk(&mut self, guest: &mut Guest) -> Advance {
        let advance = self.movement.advance(guest);
        if let Advance::Moving { x, y, .. } = advance {
            guest.position.x = x;
            guest.position.y = y;
        }
        advance
    }

    pub(crate) fn think(&mut self, guest: &mut Guest, thought: Thought) {
        guest.thoughts.insert(thought);
        self.emit(Event::ThoughtAdded {
            guest: guest.id,
            thought,
        });
    }

    pub(crate) fn record_popularity(&mut self, ride: RideId, sample: u8) {
        let Some(target) = self.rides.get_mut(&ride) else {
            return;
        };
        let _ = target.popularity.record(sample);
        self.emit(Event::PopularityRecorded { ride, sample });
    }

    pub(crate) fn record_satisfaction(&mut self, ride: RideId, bucket: u8) {
        let Some(target) = self.rides.get_mut(&ride) else {
            return;
        };
        let _ = target.satisfaction.record(bucket);
        self.emit(Event::SatisfactionRecorded { ride, bucket });
    }

    /// Applies one evaluator effect concerning `ride`.
    pub(crate) fn apply_effect(&mut self, guest: &mut Guest, ride: RideId, effect: Effect) {
        match effect {
            Effect::Thought(thought) => self.think(guest, thought),
            Effect::LowerHappinessTarget { amount, floor } => {
                guest.lower_happiness_target(amount, floor);
            }
            Effect::Cheer(amount) => {
                guest.happiness_target = guest.happiness_target.saturating_add(amount);
                guest.happiness = guest.happiness.saturating_add(amount);
            }
            Effect::Popularity(sample) => self.record_popularity(ride, sample),
            Effect::Satisfaction(bucket) => self.record_satisfaction(ride, bucket),
            Effect::RememberPreviousRide => {
                guest.previous_ride = Some(ride);
                guest.previous_ride_timeout = 0;
            }
            Effect::ClearHeading => {
                if guest.heading_to == Some(ride) {
                    guest.heading_to = None;
                    self.emit(Event::HeadingChanged {
                        guest: guest.id,
                        ride: None,
                    });
                }
            }
            Effect::MarkQueueFull | Effect::ClearQueueFull => {
                if let Some(target) = self.rides.get_mut(&ride) {
                    target.lifecycle.set(
                        LifecycleFlags::QUEUE_FULL,
                        effect == Effect::MarkQueueFull,
                    );
                }
            }
        }
    }

    pub(crate) fn apply_effects(&mut self, guest: &mut Guest, ride: RideId, effects: Vec<Effect>) {
        for effect in effects {
            self.apply_effect(guest, ride, effect);
        }
    }

    /// Raises a news item when the player asked for it.
    pub(crate) fn announce(&mut self, guest: &Guest, kind: NewsKind, ride: RideId) {
        let notifications = self.context.notifications;
        let tracked = guest.flags.contains(GuestFlags::TRACKING);
        let wanted = match kind {
            NewsKind::GuestOnRide | NewsKind::GuestInRide => {
                tracked && notifications.guest_on_ride
            }
            NewsKind::GuestLeftRide => tracked && notifications.guest_left_ride,
            NewsKind::GuestJoinedQueue => tracked && notifications.guest_queuing_for_ride,
            NewsKind::GuestsStuckOnRide => notifications.ride_stalled_vehicles,
        };
        if wanted {
            self.emit(Event::News {
                kind,
                guest: (kind != NewsKind::GuestsStuckOnRide).then_some(guest.id),
                ride,
            });
        }
    }

    /// Geometry of the station the guest is engaged with.
    pub(crate) fn station_geometry(&self, guest: &Guest) -> Option<StationGeometry> {
        let ride = guest.current_ride?;
        self.layout.station_geometry(ride, guest.current_station)
    }

    /// Car type of the car holding the guest's seat.
    pub(crate) fn seat_car_type(&self, guest: &Guest) -> Option<&CarType> {
        let seat = guest.seat?;
        let ride = self.rides.get(&guest.current_ride?)?;
        ride.car(seat.train, seat.car)
            .and_then(|car| ride.car_type_of(car))
    }

    /// Car type describing the guest's current ride as a whole.
    pub(crate) fn ride_car_type(&self, guest: &Guest) -> Option<&CarType> {
        self.rides
            .get(&guest.current_ride?)
            .and_then(Ride::default_car_type)
    }

    /// Admission actually charged; nothing when the park runs without money.
    pub(crate) fn admission(&self, ride: &Ride) -> Money {
        if self.context.money_enabled() {
            ride.price
        } else {
            Money::ZERO
        }
    }

    fn take_guest(&mut self, id: GuestId) -> Result<Guest, CommandError> {
        self.guests.remove(&id).ok_or(CommandError::UnknownGuest(id))
    }

    /// Runs `action` on a guest lifted out of the arena, putting it back afterwards.
    pub(crate) fn with_guest(
        &mut self,
        id: GuestId,
        action: impl FnOnce(&mut Self, &mut Guest) -> Result<(), CommandError>,
    ) -> Result<(), CommandError> {
        let mut guest = self.take_guest(id)?;
        let outcome = action(self, &mut guest);
        let _ = self.guests.insert(id, guest);
        outcome
    }

    pub(crate) fn pick_ride(&mut self, id: GuestId) -> Result<(), CommandError> {
        self.with_guest(id, |world, guest| {
            let empty = RideMemory::new();
            let memory = world.memories.get(&guest.id).unwrap_or(&empty);
            let outcome = ride_search::pick_ride(
                guest,
                memory,
                &world.rides,
                &world.layout,
                &world.context,
                &mut world.rng,
            );
            world.commit_search(guest, outcome, false);
            Ok(())
        })
    }

    pub(crate) fn head_for_nearest(&mut self, id: GuestId, need: Need) -> Result<(), CommandError> {
        self.with_guest(id, |world, guest| {
            let outcome = ride_search::head_for_nearest(
                guest,
                need,
                &world.rides,
                &world.layout,
                &world.context,
                &mut world.rng,
            );
            world.commit_search(guest, outcome, true);
            Ok(())
        })
    }

    fn commit_search(&mut self, guest: &mut Guest, outcome: SearchOutcome, reset_lost: bool) {
        for (ride, effect) in outcome.effects {
            self.apply_effect(guest, ride, effect);
        }
        let Some(ride) = outcome.choice else {
            return;
        };
        guest.heading_to = Some(ride);
        guest.lost_countdown = self.tuning.lost_countdown;
        if reset_lost {
            guest.time_lost = 0;
        }
        self.emit(Event::HeadingChanged {
            guest: guest.id,
            ride: Some(ride),
        });
        self.emit(Event::PathfindGoalReset { guest: guest.id });
    }
}
