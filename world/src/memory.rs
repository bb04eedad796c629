//! Cleanup when rides or guests leave the park.
//!
//! Guests hold plain ride ids in many places: the vouchers and photos they
//! carry, their thoughts, the ride they head for, their favourite and the ride
//! they just turned down. Deleting a ride sweeps all of them so no guest keeps
//! a dangling reference.

use park_sim_core::{CommandError, Event, Guest, GuestId, GuestState, RideId, RideSubState};
use park_sim_system_boarding as boarding;

use crate::World;

/// Drops every reference `guest` holds to `ride` apart from the engagement itself.
fn forget_ride(guest: &mut Guest, ride: RideId) -> bool {
    let inventory = &mut guest.inventory;
    if inventory.voucher == Some(ride) {
        inventory.voucher = None;
    }
    for photo in &mut inventory.photos {
        if *photo == Some(ride) {
            *photo = None;
        }
    }
    guest.thoughts.forget_ride(ride);
    if guest.favourite_ride == Some(ride) {
        guest.favourite_ride = None;
        guest.favourite_ride_rating = 0;
    }
    if guest.previous_ride == Some(ride) {
        guest.previous_ride = None;
        guest.previous_ride_timeout = 0;
    }
    let was_heading = guest.heading_to == Some(ride);
    if was_heading {
        guest.heading_to = None;
    }
    was_heading
}

/// Reports whether the guest counts among the ride's current customers
/// without holding a vehicle seat.
fn inside_without_seat(guest: &Guest) -> bool {
    matches!(
        guest.sub_state,
        RideSubState::MazePathfinding(_)
            | RideSubState::ApproachSpiralSlide(_)
            | RideSubState::OnSpiralSlide(_)
            | RideSubState::LeaveSpiralSlide(_)
            | RideSubState::ApproachShop
            | RideSubState::InteractShop
            | RideSubState::LeaveShop
    )
}

impl World {
    pub(crate) fn delete_ride(&mut self, ride: RideId) -> Result<(), CommandError> {
        if !self.rides.contains_key(&ride) {
            return Err(CommandError::UnknownRide(ride));
        }

        let mut redirected = Vec::new();
        let mut ejected = Vec::new();
        for guest in self.guests.values_mut() {
            if forget_ride(guest, ride) {
                redirected.push(guest.id);
            }
            if guest.current_ride == Some(ride) {
                ejected.push(guest.id);
                guest.state = GuestState::Walking;
                guest.sub_state = RideSubState::None;
                guest.current_ride = None;
                guest.seat = None;
                guest.next_in_queue = None;
                guest.pending_exit = None;
            }
        }
        for memory in self.memories.values_mut() {
            memory.forget(ride);
        }

        for guest in redirected {
            self.emit(Event::HeadingChanged { guest, ride: None });
        }
        for guest in ejected {
            log::info!("guest {guest:?} ejected from deleted ride {ride:?}");
            self.emit(Event::GuestEjected { guest, ride });
        }

        let _ = self.rides.remove(&ride);
        let _ = self.stuck_reports.remove(&ride);
        self.layout.remove_ride(ride);
        log::debug!("ride {ride:?} deleted");
        self.emit(Event::RideDeleted { ride });
        Ok(())
    }

    pub(crate) fn remove_guest(&mut self, id: GuestId) -> Result<(), CommandError> {
        let mut guest = self
            .guests
            .remove(&id)
            .ok_or(CommandError::UnknownGuest(id))?;

        if matches!(guest.state, GuestState::Queuing | GuestState::QueuingFront) {
            self.leave_queue(&mut guest);
        }

        if let Some(ride) = guest.current_ride.and_then(|ride| self.rides.get_mut(&ride)) {
            if ride.slide.occupant == Some(id) {
                ride.slide.occupant = None;
                ride.slide.progress = 0;
            }
            if inside_without_seat(&guest) {
                ride.current_customers = ride.current_customers.saturating_sub(1);
            }
            let boarded = matches!(
                guest.sub_state,
                RideSubState::OnRide | RideSubState::LeaveVehicle
            );
            if let Some(seat) = guest.seat {
                if let Some(car) = ride.car_mut(seat.train, seat.car) {
                    let holds = car.seats.get(usize::from(seat.seat)) == Some(&Some(id));
                    if holds {
                        boarding::release(car, seat.seat);
                        if boarded {
                            car.occupants = car.occupants.saturating_sub(1);
                            car.mass = car.mass.saturating_sub(u16::from(guest.mass));
                            ride.current_customers = ride.current_customers.saturating_sub(1);
                        }
                    }
                }
            }
        }

        self.release(&mut guest, GuestState::Walking);
        let _ = self.memories.remove(&id);
        log::debug!("guest {id:?} removed");
        self.emit(Event::GuestRemoved { guest: id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{Position, Thought, ThoughtKind};

    #[test]
    fn forgetting_a_ride_clears_every_reference() {
        let ride = RideId::new(7);
        let other = RideId::new(8);
        let mut guest = Guest::new(GuestId::new(1), Position::default());
        guest.inventory.voucher = Some(ride);
        guest.inventory.photos = [Some(ride), Some(other), None, Some(ride)];
        guest.favourite_ride = Some(ride);
        guest.favourite_ride_rating = 90;
        guest.previous_ride = Some(other);
        guest.heading_to = Some(ride);
        guest.thoughts.insert(Thought::new(ThoughtKind::BadValue, Some(ride)));

        assert!(forget_ride(&mut guest, ride));
        assert_eq!(guest.inventory.voucher, None);
        assert_eq!(guest.inventory.photos, [None, Some(other), None, None]);
        assert_eq!(guest.favourite_ride, None);
        assert_eq!(guest.previous_ride, Some(other));
        assert_eq!(guest.heading_to, None);
        assert!(!guest.thoughts.contains(ThoughtKind::BadValue, Some(ride)));
    }

    #[test]
    fn item_thoughts_about_a_stall_are_forgotten_with_it() {
        let stall = RideId::new(42);
        let mut guest = Guest::new(GuestId::new(1), Position::default());
        guest.thoughts.insert(Thought::new(ThoughtKind::AlreadyGot, Some(stall)));
        guest.thoughts.insert(Thought::new(ThoughtKind::CantAffordItem, Some(stall)));
        guest.thoughts.insert(Thought::new(ThoughtKind::HaventFinished, Some(stall)));
        guest.thoughts.insert(Thought::new(ThoughtKind::Hungry, None));

        assert!(!forget_ride(&mut guest, stall));
        assert!(guest.thoughts.iter().all(|thought| thought.ride != Some(stall)));
        assert_eq!(guest.thoughts.len(), 1);
    }
}
