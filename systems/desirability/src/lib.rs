#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure ride desirability evaluator.
//!
//! [`should_engage`] decides whether a guest goes on a ride, either while
//! standing at its queue ([`Approach::present`]) or while choosing a target from
//! afar ([`Approach::thinking`]). It never mutates the guest or the ride; the
//! caller replays the returned [`Effect`] list in order.

mod purchase;

use park_sim_core::{
    Guest, GuestFlags, Money, Position, Ride, RideCapabilities, SimulationContext,
    StationIndex, Thought, ThoughtKind,
};
use rand::RngCore;

pub use purchase::{decide_purchase, should_use_cash_machine, Item, Purchase};

/// Nausea rating from which sick guests only accept gentle rides (1.40).
const GENTLE_RIDE_NAUSEA: i16 = 140;

/// How and where the decision is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Approach {
    /// Station whose queue the guest stands at.
    pub station: StationIndex,
    /// The guest arrived along the queue path.
    pub at_queue: bool,
    /// The guest is only thinking about the ride from afar.
    pub thinking: bool,
}

impl Approach {
    /// Guest standing at `station`.
    #[must_use]
    pub const fn present(station: StationIndex, at_queue: bool) -> Self {
        Self {
            station,
            at_queue,
            thinking: false,
        }
    }

    /// Guest considering the ride from afar.
    #[must_use]
    pub const fn thinking() -> Self {
        Self {
            station: StationIndex::new(0),
            at_queue: false,
            thinking: true,
        }
    }

    const fn at_ride(&self) -> bool {
        !self.thinking
    }
}

/// Last guest in the station queue, as seen by the arriving guest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueTail {
    /// Where the tail guest stands.
    pub position: Position,
    /// How long the tail guest has been queuing.
    pub time_in_queue: u16,
}

/// Side effect of a decision, applied by the caller in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Guest has a thought.
    Thought(Thought),
    /// Happiness target drops by `amount` when it is at least `floor`.
    LowerHappinessTarget {
        /// Amount lost.
        amount: u8,
        /// Smallest target that still loses happiness.
        floor: u8,
    },
    /// Happiness and its target each rise by the amount, capped.
    Cheer(u8),
    /// Ride popularity window receives a sample.
    Popularity(u8),
    /// Ride satisfaction window receives a sample.
    Satisfaction(u8),
    /// Ride becomes the guest's previous ride and its timeout restarts.
    RememberPreviousRide,
    /// Guest stops heading for the ride.
    ClearHeading,
    /// Ride's queue is marked full.
    MarkQueueFull,
    /// Ride's queue-full marker is cleared.
    ClearQueueFull,
}

/// Outcome of a decision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the guest accepted.
    pub accepted: bool,
    /// Effects to apply, in order.
    pub effects: Vec<Effect>,
}

struct Decision<'a> {
    guest: &'a Guest,
    ride: &'a Ride,
    at_ride: bool,
    effects: Vec<Effect>,
}

impl<'a> Decision<'a> {
    fn new(guest: &'a Guest, ride: &'a Ride, at_ride: bool) -> Self {
        Self {
            guest,
            ride,
            at_ride,
            effects: Vec::new(),
        }
    }

    fn think(&mut self, kind: ThoughtKind) {
        self.effects
            .push(Effect::Thought(Thought::new(kind, Some(self.ride.id))));
    }

    fn think_without_ride(&mut self, kind: ThoughtKind) {
        self.effects.push(Effect::Thought(Thought::new(kind, None)));
    }

    /// Thought, happiness penalty and popularity drop, only when present.
    fn complain(&mut self, kind: ThoughtKind, amount: u8, floor: u8) {
        if self.at_ride {
            self.think(kind);
            self.effects
                .push(Effect::LowerHappinessTarget { amount, floor });
            self.effects.push(Effect::Popularity(0));
        }
    }

    fn clear_heading_if_matched(&mut self) {
        if self.guest.heading_to == Some(self.ride.id) {
            self.effects.push(Effect::ClearHeading);
        }
    }

    fn decline(mut self, remember: bool) -> Verdict {
        if self.at_ride && remember {
            self.effects.push(Effect::RememberPreviousRide);
        }
        self.clear_heading_if_matched();
        log::trace!(
            "guest {:?} declined ride {:?}",
            self.guest.id,
            self.ride.id
        );
        Verdict {
            accepted: false,
            effects: self.effects,
        }
    }

    fn queue_full(mut self) -> Verdict {
        self.effects.push(Effect::MarkQueueFull);
        self.effects.push(Effect::RememberPreviousRide);
        self.clear_heading_if_matched();
        Verdict {
            accepted: false,
            effects: self.effects,
        }
    }

    fn accept(mut self, clear_queue_full: bool) -> Verdict {
        if self.at_ride {
            self.effects.push(Effect::Popularity(1));
        }
        self.clear_heading_if_matched();
        if clear_queue_full {
            self.effects.push(Effect::ClearQueueFull);
        }
        Verdict {
            accepted: true,
            effects: self.effects,
        }
    }

    /// Shops only drop the heading once the guest stands at the counter.
    fn accept_shop(mut self) -> Verdict {
        if self.at_ride {
            self.effects.push(Effect::Popularity(1));
            self.clear_heading_if_matched();
        }
        Verdict {
            accepted: true,
            effects: self.effects,
        }
    }

    fn cannot_afford(&mut self) {
        if self.at_ride {
            if self.guest.cash.is_positive() {
                self.think(ThoughtKind::CantAffordRide);
            } else {
                self.think_without_ride(ThoughtKind::SpentMoney);
            }
        }
    }
}

/// Decides whether `guest` goes on `ride`.
///
/// `queue_tail` is the last guest queuing at the approached station, if any.
/// The generator is drawn from only on the unrated-ride and rain branches.
pub fn should_engage(
    guest: &Guest,
    ride: &Ride,
    approach: Approach,
    queue_tail: Option<QueueTail>,
    context: &SimulationContext,
    rng: &mut impl RngCore,
) -> Verdict {
    let mut decision = Decision::new(guest, ride, approach.at_ride());

    if !ride.is_open() || ride.is_broken_down() {
        return decision.decline(false);
    }

    let free_transport = ride.is_free_transport();
    if !free_transport && guest.is_leaving_park() {
        return decision.decline(false);
    }

    if ride.has(RideCapabilities::IS_SHOP) {
        return shop_decision(decision, context);
    }

    if approach.at_ride() && queue_is_full(guest, approach, queue_tail) {
        log::debug!("guest {:?} found the queue of {:?} full", guest.id, ride.id);
        return decision.queue_full();
    }

    if free_transport {
        return decision.accept(true);
    }

    if guest.previous_ride == Some(ride.id) {
        return decision.decline(false);
    }

    let money_enabled = context.money_enabled();
    let has_voucher = guest.has_voucher_for(ride.id);
    if !ride.price.is_zero() && !has_voucher && money_enabled && ride.price > guest.cash {
        decision.cannot_afford();
        return decision.decline(true);
    }

    if ride.last_crash.is_some() && guest.happiness < 225 {
        decision.complain(ThoughtKind::NotSafe, 8, 64);
        return decision.decline(true);
    }

    if let Some(ratings) = ride.ratings {
        let intensity = i32::from(ratings.intensity.raw());
        let ignore_intensity = context.cheats.ignore_ride_intensity;
        if guest.heading_to == Some(ride.id) {
            if intensity > 1000 && !ignore_intensity {
                decision.complain(ThoughtKind::Intense, 8, 64);
                return decision.decline(true);
            }
        } else {
            if context.weather.raining && !shelters_from_rain(guest, ride, rng) {
                decision.complain(ThoughtKind::NotWhileRaining, 8, 64);
                return decision.decline(true);
            }

            // Shelter is rolled again; a sheltered ride in the rain skips the thrill checks.
            let sheltering = context.weather.raining && shelters_from_rain(guest, ride, rng);
            if !ignore_intensity && !sheltering {
                let happiness = i32::from(guest.happiness);
                let max_intensity = (i32::from(guest.intensity.max) * 100).min(1000) + happiness;
                let min_intensity = i32::from(guest.intensity.min) * 100 - happiness;
                if intensity < min_intensity {
                    decision.complain(ThoughtKind::MoreThrilling, 8, 64);
                    return decision.decline(true);
                }
                if intensity > max_intensity {
                    decision.complain(ThoughtKind::Intense, 8, 64);
                    return decision.decline(true);
                }

                let max_nausea = guest.nausea_tolerance.maximum_rating() + happiness;
                if i32::from(ratings.nausea.raw()) > max_nausea {
                    decision.complain(ThoughtKind::Sickening, 8, 64);
                    return decision.decline(true);
                }

                if ratings.nausea.raw() >= GENTLE_RIDE_NAUSEA && guest.nausea > 160 {
                    return decision.decline(false);
                }
            }
        }
    } else if ride.has(RideCapabilities::CHECK_G_FORCES) {
        if rng.next_u32() & 0xFFFF > 0x1999 {
            return decision.decline(false);
        }
        if !context.cheats.ignore_ride_intensity {
            let forces = ride.g_forces;
            if forces.max_positive_vertical > 500
                || forces.max_negative_vertical < -400
                || forces.max_lateral > 400
            {
                return decision.decline(false);
            }
        }
    }

    if let Some(value) = ride.value {
        if !has_voucher && money_enabled {
            let paid_entry = guest.flags.contains(GuestFlags::HAS_PAID_FOR_PARK_ENTRY);
            let mut value = value.cents();
            if paid_entry {
                value /= 4;
            }
            let price = ride.price;
            if price > Money::from_cents(value * 2) {
                decision.complain(ThoughtKind::BadValue, 16, 60);
                return decision.decline(true);
            }
            if price <= Money::from_cents(value / 2) && decision.at_ride && !paid_entry {
                decision.think(ThoughtKind::GoodValue);
            }
        }
    }

    decision.accept(true)
}

fn queue_is_full(guest: &Guest, approach: Approach, queue_tail: Option<QueueTail>) -> bool {
    let Some(tail) = queue_tail else {
        return false;
    };
    if !approach.at_queue {
        return true;
    }
    if (tail.position.z - guest.position.z).abs() > 6 {
        return false;
    }
    let dx = (tail.position.x - guest.position.x).abs();
    let dy = (tail.position.y - guest.position.y).abs();
    let separation = dx.max(dy);
    separation < 8 || (separation <= 13 && tail.time_in_queue > 10)
}

fn shelters_from_rain(guest: &Guest, ride: &Ride, rng: &mut impl RngCore) -> bool {
    if ride.sheltered_eighths >= 3 {
        return true;
    }
    guest.inventory.has_umbrella
        && ride.has(RideCapabilities::CAN_USE_UMBRELLA)
        && rng.next_u32() & 2 == 0
}

fn shop_decision(mut decision: Decision<'_>, context: &SimulationContext) -> Verdict {
    let guest = decision.guest;
    let ride = decision.ride;

    if guest.previous_ride == Some(ride.id) {
        return decision.decline(true);
    }

    if ride.has(RideCapabilities::IS_TOILET) {
        if guest.toilet < 70 {
            return decision.decline(true);
        }
        // Willingness to pay grows with need, between 0.10 and 0.60.
        if ride.price.cents() * 4 > i32::from(guest.toilet) {
            decision.complain(ThoughtKind::NotPaying, 16, 60);
            return decision.decline(true);
        }
    }

    if ride.has(RideCapabilities::IS_FIRST_AID) && guest.nausea < 128 {
        return decision.decline(true);
    }

    if !ride.price.is_zero() && context.money_enabled() && ride.price > guest.cash {
        decision.cannot_afford();
        return decision.decline(true);
    }

    decision.accept_shop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{
        GuestId, IntensityPreference, RideId, RideKind, RideRatings, RideStatus,
        RideTypeDescriptor, RideTypeId,
    };
    use rand::rngs::mock::StepRng;

    fn open_ride() -> Ride {
        let mut ride = Ride::new(
            RideId::new(4),
            "Twister",
            RideTypeDescriptor::new(RideTypeId::new(1), RideKind::Tracked),
        );
        ride.status = RideStatus::Open;
        ride.ratings = Some(RideRatings::new(500, 500, 200));
        ride
    }

    fn guest() -> Guest {
        let mut guest = Guest::new(GuestId::new(9), Position::new(100, 100, 16));
        guest.cash = Money::new(20, 0);
        guest.intensity = IntensityPreference::new(0, 10);
        guest
    }

    #[test]
    fn queue_tail_too_close_is_full() {
        let guest = guest();
        let approach = Approach::present(StationIndex::new(0), true);
        let tail = QueueTail {
            position: Position::new(105, 100, 16),
            time_in_queue: 0,
        };
        assert!(queue_is_full(&guest, approach, Some(tail)));

        let idle_tail = QueueTail {
            position: Position::new(112, 100, 16),
            time_in_queue: 11,
        };
        assert!(queue_is_full(&guest, approach, Some(idle_tail)));

        let moving_tail = QueueTail {
            position: Position::new(112, 100, 16),
            time_in_queue: 10,
        };
        assert!(!queue_is_full(&guest, approach, Some(moving_tail)));

        let other_level = QueueTail {
            position: Position::new(100, 100, 40),
            time_in_queue: 100,
        };
        assert!(!queue_is_full(&guest, approach, Some(other_level)));
    }

    #[test]
    fn single_file_entrance_rejects_any_tail() {
        let guest = guest();
        let tail = QueueTail {
            position: Position::new(900, 900, 0),
            time_in_queue: 0,
        };
        let approach = Approach::present(StationIndex::new(0), false);
        assert!(queue_is_full(&guest, approach, Some(tail)));
    }

    #[test]
    fn accepted_ride_at_queue_raises_popularity() {
        let guest = guest();
        let ride = open_ride();
        let verdict = should_engage(
            &guest,
            &ride,
            Approach::present(StationIndex::new(0), true),
            None,
            &SimulationContext::default(),
            &mut StepRng::new(0, 0),
        );
        assert!(verdict.accepted);
        assert_eq!(
            verdict.effects,
            vec![Effect::Popularity(1), Effect::ClearQueueFull]
        );
    }

    #[test]
    fn thinking_never_penalises() {
        let mut guest = guest();
        guest.intensity = IntensityPreference::new(0, 1);
        guest.happiness = 0;
        let ride = open_ride();
        let verdict = should_engage(
            &guest,
            &ride,
            Approach::thinking(),
            None,
            &SimulationContext::default(),
            &mut StepRng::new(0, 0),
        );
        assert!(!verdict.accepted);
        assert!(verdict.effects.is_empty());
    }

    #[test]
    fn toilet_price_scales_with_need() {
        let mut toilets = Ride::new(
            RideId::new(2),
            "Toilets",
            RideTypeDescriptor::new(RideTypeId::new(30), RideKind::Toilets),
        );
        toilets.status = RideStatus::Open;
        toilets.price = Money::from_cents(20);

        let mut guest = guest();
        guest.toilet = 79;
        let context = SimulationContext::default();
        let approach = Approach::present(StationIndex::new(0), false);
        let verdict = should_engage(
            &guest,
            &toilets,
            approach,
            None,
            &context,
            &mut StepRng::new(0, 0),
        );
        assert!(!verdict.accepted);
        assert!(verdict.effects.contains(&Effect::Thought(Thought::new(
            ThoughtKind::NotPaying,
            Some(toilets.id)
        ))));

        guest.toilet = 80;
        let verdict = should_engage(
            &guest,
            &toilets,
            approach,
            None,
            &context,
            &mut StepRng::new(0, 0),
        );
        assert!(verdict.accepted);
    }
    #[test]
    fn shop_heading_survives_until_the_counter() {
        let mut toilets = Ride::new(
            RideId::new(2),
            "Toilets",
            RideTypeDescriptor::new(RideTypeId::new(30), RideKind::Toilets),
        );
        toilets.status = RideStatus::Open;

        let mut guest = guest();
        guest.toilet = 200;
        guest.heading_to = Some(toilets.id);
        let context = SimulationContext::default();

        let from_afar = should_engage(
            &guest,
            &toilets,
            Approach::thinking(),
            None,
            &context,
            &mut StepRng::new(0, 0),
        );
        assert!(from_afar.accepted);
        assert!(from_afar.effects.is_empty());

        let at_counter = should_engage(
            &guest,
            &toilets,
            Approach::present(StationIndex::new(0), false),
            None,
            &context,
            &mut StepRng::new(0, 0),
        );
        assert!(at_counter.accepted);
        assert_eq!(
            at_counter.effects,
            vec![Effect::Popularity(1), Effect::ClearHeading]
        );
    }
}
