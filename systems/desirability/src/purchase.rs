use park_sim_core::{Guest, Money, ParkFlags, RideId, SimulationContext, Thought, ThoughtKind};
use rand::RngCore;

use crate::Effect;

/// Item on sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Item {
    /// Something to eat.
    Food,
    /// Something to drink.
    Drink,
    /// On-ride photo kept in one of the four photo slots.
    Photo {
        /// Slot `0..4`.
        slot: u8,
    },
}

impl Item {
    /// What guests consider the item worth.
    #[must_use]
    pub const fn value(self) -> Money {
        match self {
            Self::Food => Money::new(1, 90),
            Self::Drink => Money::new(1, 20),
            Self::Photo { .. } => Money::new(3, 0),
        }
    }

    const fn is_souvenir(self) -> bool {
        matches!(self, Self::Photo { .. })
    }
}

/// Offer made to a guest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Purchase {
    /// Ride or stall selling the item.
    pub seller: RideId,
    /// Item offered.
    pub item: Item,
    /// Asking price.
    pub price: Money,
}

fn already_holds(guest: &Guest, item: Item) -> bool {
    match item {
        Item::Food | Item::Drink => guest.inventory.carrying_food_or_drink,
        Item::Photo { slot } => guest
            .inventory
            .photos
            .get(usize::from(slot))
            .is_some_and(Option::is_some),
    }
}

/// Decides whether the guest buys the offered item.
///
/// On `true` the caller charges the price and hands the item over; the effects
/// (thoughts, happiness, ride satisfaction samples) apply either way.
pub fn decide_purchase(
    guest: &Guest,
    offer: Purchase,
    context: &SimulationContext,
    rng: &mut impl RngCore,
    effects: &mut Vec<Effect>,
) -> bool {
    let seller = Some(offer.seller);
    let item = offer.item;

    if already_holds(guest, item) {
        let kind = if item.is_souvenir() {
            ThoughtKind::AlreadyGot
        } else {
            ThoughtKind::HaventFinished
        };
        effects.push(Effect::Thought(Thought::new(kind, seller)));
        return false;
    }

    match item {
        Item::Food | Item::Drink if guest.nausea >= 145 => return false,
        Item::Food if guest.hunger > 75 => {
            effects.push(Effect::Thought(Thought::new(ThoughtKind::NotHungry, None)));
            return false;
        }
        Item::Drink if guest.thirst > 75 => {
            effects.push(Effect::Thought(Thought::new(ThoughtKind::NotThirsty, None)));
            return false;
        }
        _ => {}
    }

    if item.is_souvenir() {
        let whim = (rng.next_u32() & 0x7F) + 0x73;
        if whim > u32::from(guest.happiness) || guest.rides_ridden < 3 {
            return false;
        }
    }

    let money_enabled = !context.park.contains(ParkFlags::NO_MONEY);
    if !offer.price.is_zero() && money_enabled {
        if guest.cash.is_zero() {
            effects.push(Effect::Thought(Thought::new(ThoughtKind::SpentMoney, None)));
            return false;
        }
        if offer.price > guest.cash {
            effects.push(Effect::Thought(Thought::new(ThoughtKind::CantAffordItem, seller)));
            return false;
        }
    }

    let value = item.value().dimes();
    let price = offer.price.dimes();
    if value < price {
        let mut excess = price - value;
        if guest.happiness >= 128 {
            excess /= 2;
            if guest.happiness >= 180 {
                excess /= 2;
            }
        }
        if excess > i32::try_from(rng.next_u32() & 0x07).unwrap_or(0) {
            effects.push(Effect::Thought(Thought::new(ThoughtKind::NotPaying, seller)));
            return false;
        }
    } else {
        let surplus = (value - price).max(8);
        if money_enabled && surplus >= i32::try_from(rng.next_u32() & 0x07).unwrap_or(0) {
            effects.push(Effect::Thought(Thought::new(ThoughtKind::GoodValue, seller)));
        }
        effects.push(Effect::Cheer(u8::try_from((surplus * 4).min(255)).unwrap_or(u8::MAX)));
    }

    let margin = value - price;
    let sample = if margin > 3 {
        3
    } else if margin > -3 {
        2
    } else if margin > -8 {
        1
    } else {
        0
    };
    effects.push(Effect::Satisfaction(sample));
    true
}

/// Decides whether the guest withdraws money from a cash machine.
pub fn should_use_cash_machine(
    guest: &Guest,
    context: &SimulationContext,
    rng: &mut impl RngCore,
) -> bool {
    if !context.money_enabled() || guest.is_leaving_park() {
        return false;
    }
    if guest.cash > Money::new(20, 0) {
        return false;
    }
    if 115 + rng.next_u32() % 128 > u32::from(guest.happiness) {
        return false;
    }
    guest.energy >= 80
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{GuestId, Position};
    use rand::rngs::mock::StepRng;

    fn happy_guest() -> Guest {
        let mut guest = Guest::new(GuestId::new(1), Position::default());
        guest.happiness = 250;
        guest.happiness_target = 200;
        guest.rides_ridden = 5;
        guest.cash = Money::new(10, 0);
        guest
    }

    #[test]
    fn fairly_priced_photo_is_bought_and_cheers() {
        let guest = happy_guest();
        let offer = Purchase {
            seller: RideId::new(3),
            item: Item::Photo { slot: 0 },
            price: Money::new(2, 0),
        };
        let mut effects = Vec::new();
        let bought = decide_purchase(
            &guest,
            offer,
            &SimulationContext::default(),
            &mut StepRng::new(0, 0),
            &mut effects,
        );
        assert!(bought);
        assert_eq!(
            effects,
            vec![
                Effect::Thought(Thought::new(ThoughtKind::GoodValue, Some(RideId::new(3)))),
                Effect::Cheer(40),
                Effect::Satisfaction(3),
            ]
        );
    }

    #[test]
    fn duplicate_photo_is_refused() {
        let mut guest = happy_guest();
        guest.inventory.photos[1] = Some(RideId::new(8));
        let offer = Purchase {
            seller: RideId::new(3),
            item: Item::Photo { slot: 1 },
            price: Money::new(2, 0),
        };
        let mut effects = Vec::new();
        assert!(!decide_purchase(
            &guest,
            offer,
            &SimulationContext::default(),
            &mut StepRng::new(0, 0),
            &mut effects,
        ));
        assert_eq!(
            effects,
            vec![Effect::Thought(Thought::new(
                ThoughtKind::AlreadyGot,
                Some(RideId::new(3))
            ))]
        );
    }

    #[test]
    fn cash_machine_needs_low_funds_and_good_mood() {
        let mut guest = happy_guest();
        guest.energy = 100;
        let context = SimulationContext::default();
        assert!(should_use_cash_machine(&guest, &context, &mut StepRng::new(0, 0)));

        guest.cash = Money::new(25, 0);
        assert!(!should_use_cash_machine(&guest, &context, &mut StepRng::new(0, 0)));

        guest.cash = Money::ZERO;
        guest.happiness = 114;
        assert!(!should_use_cash_machine(&guest, &context, &mut StepRng::new(0, 0)));
    }
}
