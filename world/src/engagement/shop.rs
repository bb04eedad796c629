use park_sim_core::{
    Advance, CommandError, Event, Guest, GuestId, GuestState, Money, RideCapabilities, RideId,
    RideSubState, SoundCue, StationIndex, ThoughtKind, TileCoords, TrackQuery,
};
use park_sim_system_desirability::{
    decide_purchase, should_engage, should_use_cash_machine, Approach, Item, Purchase,
};

use super::{head_to_within, World};

/// Happiness gained from a finished toilet or first aid visit.
const RELIEF: i32 = 30;
/// Nausea at which the first aid room lets the guest go.
const NAUSEA_TREATED: u8 = 35;

/// Need thought a purchase from a shop with `capabilities` settles.
fn settled_thought(capabilities: RideCapabilities) -> Option<ThoughtKind> {
    if capabilities.contains(RideCapabilities::SELLS_FOOD) {
        Some(ThoughtKind::Hungry)
    } else if capabilities.contains(RideCapabilities::SELLS_DRINKS) {
        Some(ThoughtKind::Thirsty)
    } else if capabilities.contains(RideCapabilities::IS_CASH_MACHINE) {
        Some(ThoughtKind::RunningOut)
    } else if capabilities.contains(RideCapabilities::IS_TOILET) {
        Some(ThoughtKind::Toilet)
    } else {
        None
    }
}

impl World {
    pub(crate) fn visit_shop(&mut self, id: GuestId, ride: RideId) -> Result<(), CommandError> {
        self.with_guest(id, |world, guest| world.visit(guest, ride))
    }

    fn visit(&mut self, guest: &mut Guest, ride_id: RideId) -> Result<(), CommandError> {
        let ride = self
            .rides
            .get(&ride_id)
            .ok_or(CommandError::UnknownRide(ride_id))?;
        if !ride.has(RideCapabilities::IS_SHOP) {
            return Err(CommandError::NotAShop(ride_id));
        }
        if !matches!(guest.state, GuestState::Walking | GuestState::Sitting) {
            return Err(CommandError::GuestBusy(guest.id));
        }

        let verdict = should_engage(
            guest,
            ride,
            Approach::present(StationIndex::new(0), false),
            None,
            &self.context,
            &mut self.rng,
        );
        let capabilities = ride.descriptor.capabilities;
        let price = self.admission(ride);
        self.apply_effects(guest, ride_id, verdict.effects);
        self.emit(Event::EngagementDecided {
            guest: guest.id,
            ride: ride_id,
            accepted: verdict.accepted,
        });
        if !verdict.accepted {
            return Ok(());
        }

        guest.time_lost = 0;
        let facility = RideCapabilities::IS_TOILET.union(RideCapabilities::IS_FIRST_AID);
        if capabilities.intersects(facility) {
            self.go_inside(guest, ride_id, price);
        } else {
            self.serve(guest, ride_id, capabilities, price);
        }
        Ok(())
    }

    /// Charges the guest for something bought from `ride`.
    pub(super) fn sell(&mut self, guest: &mut Guest, ride: RideId, price: Money) {
        if !price.is_zero() {
            guest.spend(price);
            if let Some(target) = self.rides.get_mut(&ride) {
                target.income += price;
            }
        }
        self.emit(Event::ItemPurchased {
            guest: guest.id,
            ride,
            amount: price,
        });
    }

    fn go_inside(&mut self, guest: &mut Guest, ride_id: RideId, price: Money) {
        if !price.is_zero() {
            self.sell(guest, ride_id, price);
        }
        let station = StationIndex::new(0);
        let inside = self
            .layout
            .station_geometry(ride_id, station)
            .map_or_else(
                || TileCoords::from_world(guest.position.x, guest.position.y).centre(),
                |geometry| geometry.start.centre(),
            );

        guest.current_ride = Some(ride_id);
        guest.current_station = station;
        head_to_within(guest, inside, 3);
        self.set_state(guest, GuestState::UsingShop);
        self.set_sub_state(guest, RideSubState::ApproachShop);
        guest.time_on_ride = 0;
        if let Some(target) = self.rides.get_mut(&ride_id) {
            target.current_customers = target.current_customers.saturating_add(1);
        }
    }

    /// Serves a counter shop on the spot; the guest never leaves the footpath.
    fn serve(
        &mut self,
        guest: &mut Guest,
        ride_id: RideId,
        capabilities: RideCapabilities,
        price: Money,
    ) {
        if guest.heading_to == Some(ride_id) {
            guest.heading_to = None;
            self.emit(Event::HeadingChanged {
                guest: guest.id,
                ride: None,
            });
        }

        let item = if capabilities.contains(RideCapabilities::SELLS_FOOD) {
            Some(Item::Food)
        } else if capabilities.contains(RideCapabilities::SELLS_DRINKS) {
            Some(Item::Drink)
        } else {
            None
        };

        let served = if let Some(item) = item {
            let offer = Purchase {
                seller: ride_id,
                item,
                price,
            };
            let mut effects = Vec::new();
            let bought = decide_purchase(guest, offer, &self.context, &mut self.rng, &mut effects);
            self.apply_effects(guest, ride_id, effects);
            if bought {
                self.sell(guest, ride_id, price);
                guest.inventory.carrying_food_or_drink = true;
            }
            bought
        } else if capabilities.contains(RideCapabilities::IS_CASH_MACHINE) {
            if guest.previous_ride == Some(ride_id) {
                return;
            }
            let withdraw = should_use_cash_machine(guest, &self.context, &mut self.rng);
            if withdraw {
                let amount = self.tuning.cash_withdrawal;
                guest.cash += amount;
                self.emit(Event::CashWithdrawn {
                    guest: guest.id,
                    ride: ride_id,
                    amount,
                });
                self.record_satisfaction(ride_id, guest.happiness >> 6);
            }
            guest.previous_ride = Some(ride_id);
            guest.previous_ride_timeout = 0;
            withdraw
        } else {
            log::debug!("{ride_id:?} has nothing to sell");
            false
        };

        if !served {
            return;
        }
        if let Some(kind) = settled_thought(capabilities) {
            guest.thoughts.remove_kind(kind);
        }
        if let Some(target) = self.rides.get_mut(&ride_id) {
            target.total_customers = target.total_customers.saturating_add(1);
        }
    }

    pub(super) fn update_approach_shop(&mut self, guest: &mut Guest) {
        if self.walk(guest) == Advance::Arrived {
            self.set_sub_state(guest, RideSubState::InteractShop);
        }
    }

    pub(super) fn update_interact_shop(&mut self, guest: &mut Guest) {
        let Some(ride_id) = guest.current_ride else {
            return;
        };
        let Some(capabilities) = self
            .rides
            .get(&ride_id)
            .map(|ride| ride.descriptor.capabilities)
        else {
            return;
        };

        if capabilities.contains(RideCapabilities::IS_FIRST_AID) {
            if guest.nausea > NAUSEA_TREATED {
                guest.nausea -= 1;
                guest.nausea_target = guest.nausea;
                return;
            }
            guest.thoughts.remove_kind(ThoughtKind::Sick);
        } else {
            if guest.toilet != 0 {
                guest.toilet -= 1;
                return;
            }
            if !self.context.title_screen {
                self.emit(Event::Sound {
                    cue: SoundCue::ToiletFlush,
                    position: guest.position,
                });
            }
            guest.thoughts.remove_kind(ThoughtKind::Toilet);
        }

        let outside = self
            .station_geometry(guest)
            .map_or_else(
                || TileCoords::from_world(guest.position.x, guest.position.y).centre(),
                |geometry| geometry.entrance.tile.centre(),
            );
        head_to_within(guest, outside, 3);
        guest.adjust_happiness_target(RELIEF);
        guest.happiness = guest.happiness_target;
        self.set_sub_state(guest, RideSubState::LeaveShop);
    }

    pub(super) fn update_leave_shop(&mut self, guest: &mut Guest) {
        if let Advance::Moving { .. } = self.walk(guest) {
            return;
        }
        let Some(ride_id) = guest.current_ride else {
            self.release(guest, GuestState::Falling);
            return;
        };
        if let Some(target) = self.rides.get_mut(&ride_id) {
            target.current_customers = target.current_customers.saturating_sub(1);
            target.total_customers = target.total_customers.saturating_add(1);
        }
        self.record_satisfaction(ride_id, guest.happiness >> 6);
        self.release(guest, GuestState::Falling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchases_settle_the_matching_need() {
        assert_eq!(
            settled_thought(RideCapabilities::IS_SHOP.union(RideCapabilities::SELLS_DRINKS)),
            Some(ThoughtKind::Thirsty)
        );
        assert_eq!(
            settled_thought(RideCapabilities::IS_CASH_MACHINE),
            Some(ThoughtKind::RunningOut)
        );
        assert_eq!(settled_thought(RideCapabilities::IS_FIRST_AID), None);
    }
}
