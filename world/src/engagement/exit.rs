use park_sim_core::{
    Advance, Event, Guest, GuestFlags, GuestState, LifecycleFlags, Money, NewsKind, RideId,
    RideKind, RideSubState, SoundCue, Thought, ThoughtKind, WaypointCursor, HEIGHT_STEP,
};
use park_sim_system_boarding as boarding;
use park_sim_system_desirability::{decide_purchase, Item, Purchase};
use park_sim_system_satisfaction::{really_liked, should_raise_intensity, should_ride_again};
use rand::RngCore;

use super::{head_to, head_to_within, World};

impl World {
    /// Distance the exit walk reaches past the exit tile centre.
    fn exit_shift(&self, guest: &Guest) -> i32 {
        let wide = self
            .ride_car_type(guest)
            .is_some_and(|car_type| car_type.has_wide_exit());
        if wide {
            32
        } else {
            20
        }
    }

    pub(super) fn prepare_for_exit(&mut self, guest: &mut Guest) {
        let Some(geometry) = self.station_geometry(guest) else {
            return;
        };
        let shift = self.exit_shift(guest);
        head_to_within(guest, geometry.exit.centre_offset(-shift), 2);
        self.set_sub_state(guest, RideSubState::InExit);
    }

    pub(super) fn update_approach_exit(&mut self, guest: &mut Guest) {
        if self.walk(guest) == Advance::Arrived {
            self.prepare_for_exit(guest);
        }
    }

    pub(super) fn update_in_exit(&mut self, guest: &mut Guest) {
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };
        if let Advance::Moving { distance, .. } = self.walk(guest) {
            if distance >= 16 {
                let platform = self
                    .rides
                    .get(&ride_id)
                    .map_or(0, |ride| ride.descriptor.platform_height);
                guest.position.z = geometry.height * HEIGHT_STEP + platform;
                return;
            }
            guest.special_sprite = 0;
        }

        self.offer_photo(guest, ride_id);
        self.set_sub_state(guest, RideSubState::LeaveExit);
    }

    fn offer_photo(&mut self, guest: &mut Guest, ride_id: RideId) {
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        if !ride.lifecycle.contains(LifecycleFlags::ON_RIDE_PHOTO) {
            return;
        }
        let Some(slot) = ride.descriptor.photo_slot else {
            return;
        };
        let price = if self.context.money_enabled() {
            ride.secondary_price
        } else {
            Money::ZERO
        };
        let offer = Purchase {
            seller: ride_id,
            item: Item::Photo { slot },
            price,
        };
        let mut effects = Vec::new();
        let bought = decide_purchase(guest, offer, &self.context, &mut self.rng, &mut effects);
        self.apply_effects(guest, ride_id, effects);
        if !bought {
            return;
        }

        self.sell(guest, ride_id, price);
        if let Some(photo) = guest.inventory.photos.get_mut(usize::from(slot)) {
            *photo = Some(ride_id);
        }
        if let Some(target) = self.rides.get_mut(&ride_id) {
            target.secondary_items_sold = target.secondary_items_sold.saturating_add(1);
        }
    }

    pub(super) fn update_exit_waypoints(&mut self, guest: &mut Guest, cursor: WaypointCursor) {
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };
        let Some(kind) = self.rides.get(&ride_id).map(|ride| ride.descriptor.kind) else {
            return;
        };

        if let Advance::Moving { distance, .. } = self.walk(guest) {
            if kind == RideKind::MotionSimulator {
                // Walking down the simulator steps.
                guest.position.z = geometry.height * HEIGHT_STEP + 2;
                if cursor.waypoint == 1 {
                    guest.position.z += distance.min(15);
                }
            }
            return;
        }

        match cursor.waypoint {
            3 => self.prepare_for_exit(guest),
            0 => {
                let shift = self.exit_shift(guest);
                head_to(guest, geometry.exit.centre_offset(shift));
                self.set_sub_state(
                    guest,
                    RideSubState::ApproachExitWaypoints(WaypointCursor {
                        set: cursor.set,
                        waypoint: 3,
                    }),
                );
            }
            current => {
                let waypoint = current - 1;
                let (Some(ride), Some(seat)) = (self.rides.get(&ride_id), guest.seat) else {
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
                    RideSubState::ApproachExitWaypoints(WaypointCursor {
                        set: cursor.set,
                        waypoint,
                    }),
                );
            }
        }
    }

    pub(super) fn update_leave_exit(&mut self, guest: &mut Guest) {
        let height = self
            .station_geometry(guest)
            .map(|geometry| geometry.height * HEIGHT_STEP);
        if let Advance::Moving { .. } = self.walk(guest) {
            if let Some(z) = height {
                guest.position.z = z;
            }
            return;
        }

        if let Some(ride) = guest.current_ride {
            if guest.pending_exit == Some(ride) {
                guest.pending_exit = None;
                self.on_exit_ride(guest, ride);
            }
            self.announce(guest, NewsKind::GuestLeftRide, ride);
        }
        self.release(guest, GuestState::Falling);
    }

    /// Settles the visit as the guest steps back onto the footpath.
    ///
    /// Runs at most once per boarding; `pending_exit` is cleared by the caller.
    pub(super) fn on_exit_ride(&mut self, guest: &mut Guest, ride_id: RideId) {
        if guest.flags.contains(GuestFlags::FAVOURITE_PENDING) {
            guest.flags.remove(GuestFlags::FAVOURITE_PENDING);
            guest.favourite_ride = Some(ride_id);
        }
        guest.happiness = guest.happiness_target;
        guest.nausea = guest.nausea_target;
        if guest.is_leaving_park() {
            guest.flags.remove(GuestFlags::PARK_ENTRANCE_CHOSEN);
        }

        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };
        let ride_again = should_ride_again(guest, ride, &self.context, &mut self.rng);
        if ride_again {
            guest.heading_to = Some(ride_id);
            guest.lost_countdown = self.tuning.lost_countdown;
        }
        if should_raise_intensity(guest, &self.context, &mut self.rng) {
            guest.intensity = guest.intensity.raised();
        }
        let liked = really_liked(guest, ride, &self.context);

        if ride_again {
            self.emit(Event::HeadingChanged {
                guest: guest.id,
                ride: Some(ride_id),
            });
            self.emit(Event::PathfindGoalReset { guest: guest.id });
        }
        if liked {
            self.think(guest, Thought::new(ThoughtKind::WasGreat, Some(ride_id)));
            let laugh = (self.rng.next_u32() & 7) as u8;
            if laugh < 3 {
                self.emit(Event::Sound {
                    cue: SoundCue::Laugh(laugh),
                    position: guest.position,
                });
            }
        }

        if let Some(target) = self.rides.get_mut(&ride_id) {
            target.total_customers = target.total_customers.saturating_add(1);
        }
        log::debug!("guest {:?} left {ride_id:?} (ride again: {ride_again})", guest.id);
        self.emit(Event::GuestExitedRide {
            guest: guest.id,
            ride: ride_id,
            ride_again,
        });
    }
}
