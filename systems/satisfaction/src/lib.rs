#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure scoring of ride visits.
//!
//! Every function here reads a guest, a single ride and the simulation
//! context. Nothing is mutated; the world applies the results. Random draws
//! come from the caller's generator so a seeded world replays exactly.

use park_sim_core::{
    clamp_u8, Guest, ParkFlags, Ride, RideCapabilities, RideMemory, RideRatings,
    SimulationContext,
};
use rand::RngCore;

/// Intensity above which guests refuse to repeat or rave about a ride (10.00).
pub const INTENSITY_CEILING: i32 = 1000;

/// Lowest score [`satisfaction`] can produce.
pub const MIN_SATISFACTION: i32 = -30 - 60 - 35;

/// Highest score [`satisfaction`] can produce.
pub const MAX_SATISFACTION: i32 = 70 + 10 + 10 + 10;

/// Scores a completed visit: value, intensity and nausea fit, queue time and familiarity.
#[must_use]
pub fn satisfaction(
    guest: &Guest,
    ride: &Ride,
    memory: &RideMemory,
    context: &SimulationContext,
) -> i32 {
    value_satisfaction(guest, ride, context)
        + intensity_nausea_satisfaction(guest, ride.ratings)
        + queue_time_adjustment(guest.time_in_queue)
        + repeat_visit_bonus(ride, memory)
}

/// Contribution of the ride's value for money.
#[must_use]
pub fn value_satisfaction(guest: &Guest, ride: &Ride, context: &SimulationContext) -> i32 {
    if context.park.contains(ParkFlags::NO_MONEY) {
        return -30;
    }
    let Some(value) = ride.value else {
        return -30;
    };
    let value = value.cents();
    let price = ride.price.cents();
    if value >= price {
        return -5;
    }
    if value + value * i32::from(guest.happiness) / 256 >= price {
        return -30;
    }
    0
}

/// Contribution of how well the ride's intensity and nausea match the guest.
#[must_use]
pub fn intensity_nausea_satisfaction(guest: &Guest, ratings: Option<RideRatings>) -> i32 {
    let Some(ratings) = ratings else {
        return 70;
    };

    let happiness = i32::from(guest.happiness);
    let intensity = comfort_level(
        i32::from(ratings.intensity.raw()),
        i32::from(guest.intensity.min) * 100,
        i32::from(guest.intensity.max) * 100,
        happiness,
    );
    let nausea = comfort_level(
        i32::from(ratings.nausea.raw()),
        guest.nausea_tolerance.comfortable_minimum(),
        guest.nausea_tolerance.maximum_rating(),
        happiness,
    );

    match (intensity.max(nausea), intensity.min(nausea)) {
        (0, _) => 70,
        (1, 0) => 50,
        (1, _) => 35,
        (2, 0) => 35,
        (2, 1) => 20,
        (2, _) => 10,
        (_, 0) => -35,
        (_, 1) => -50,
        _ => -60,
    }
}

/// Level from 0 (inside the tightest window) to 3 (outside every window).
fn comfort_level(rating: i32, mut low: i32, mut high: i32, happiness: i32) -> u8 {
    let mut level = 3;
    for _ in 0..3 {
        if low <= rating && rating <= high {
            level -= 1;
        }
        low -= happiness * 2;
        high += happiness;
    }
    level
}

/// Contribution of the time spent queuing, in ticks.
#[must_use]
pub const fn queue_time_adjustment(time_in_queue: u16) -> i32 {
    if time_in_queue >= 4500 {
        -35
    } else if time_in_queue >= 2250 {
        -10
    } else if time_in_queue <= 750 {
        10
    } else {
        0
    }
}

/// Bonus for having ridden this ride or one of its type before.
#[must_use]
pub fn repeat_visit_bonus(ride: &Ride, memory: &RideMemory) -> i32 {
    let mut bonus = 0;
    if memory.has_ridden_type(ride.descriptor.type_id) {
        bonus += 10;
    }
    if memory.has_ridden(ride.id) {
        bonus += 10;
    }
    bonus
}

/// Quantises a satisfaction score into the ride's 0-3 statistic sample.
#[must_use]
pub const fn satisfaction_bucket(satisfaction: i32) -> u8 {
    if satisfaction >= 40 {
        3
    } else if satisfaction >= 20 {
        2
    } else if satisfaction >= 0 {
        1
    } else {
        0
    }
}

/// Nausea target after riding, given the happiness target already updated for the visit.
#[must_use]
pub fn nausea_growth(guest: &Guest, ratings: Option<RideRatings>) -> u8 {
    let ride_nausea = ratings.map_or(0, |ratings| u32::from(ratings.nausea.raw().max(0).unsigned_abs()));
    let multiplier = (256 - u32::from(guest.happiness_target)).clamp(64, 200);
    let mut growth = ride_nausea * multiplier / 512;
    growth *= u32::from(guest.hunger.max(128)) / 64;
    growth >>= guest.nausea_tolerance.level();
    let target = (u32::from(guest.nausea_target) + growth).min(u32::from(u8::MAX));
    u8::try_from(target).unwrap_or(u8::MAX)
}

/// Rating the ride earns as a favourite candidate.
#[must_use]
pub fn favourite_rating(guest: &Guest, ratings: Option<RideRatings>) -> u8 {
    let excitement = ratings.map_or(0, |ratings| i32::from(ratings.excitement.raw()));
    clamp_u8(excitement / 4 + i32::from(guest.happiness))
}

/// Reports whether the ride becomes the favourite once the guest steps off.
#[must_use]
pub fn becomes_favourite(guest: &Guest, ratings: Option<RideRatings>) -> bool {
    favourite_rating(guest, ratings) >= guest.favourite_ride_rating
        && guest.happiness >= 160
        && guest.happiness_target >= 160
}

fn within_intensity_ceiling(ride: &Ride, context: &SimulationContext) -> bool {
    match ride.ratings {
        Some(ratings) => {
            i32::from(ratings.intensity.raw()) <= INTENSITY_CEILING
                || context.cheats.ignore_ride_intensity
        }
        None => false,
    }
}

/// Decides whether the guest heads straight back to the ride it just left.
///
/// Draws from `rng` only once every deterministic condition has passed.
pub fn should_ride_again(
    guest: &Guest,
    ride: &Ride,
    context: &SimulationContext,
    rng: &mut impl RngCore,
) -> bool {
    if !ride.has(RideCapabilities::WILL_RIDE_AGAIN) {
        return false;
    }
    if !within_intensity_ceiling(ride, context) {
        return false;
    }
    if guest.happiness < 180
        || guest.energy < 100
        || guest.nausea > 160
        || guest.hunger < 30
        || guest.thirst < 20
        || guest.toilet > 170
    {
        return false;
    }

    let roll = rng.next_u32() & 0xFF;
    if roll <= 128 && (guest.rides_ridden > 7 || roll > 64) {
        return false;
    }
    true
}

/// Decides whether a thrilled guest widens the preferred intensity range.
pub fn should_raise_intensity(
    guest: &Guest,
    context: &SimulationContext,
    rng: &mut impl RngCore,
) -> bool {
    if context.park.contains(ParkFlags::PREFER_LESS_INTENSE_RIDES) {
        return false;
    }
    if guest.happiness < 200 {
        return false;
    }
    rng.next_u32() & 0xFF >= u32::from(guest.intensity.packed())
}

/// Reports whether the guest enjoyed the ride enough to say so.
#[must_use]
pub fn really_liked(guest: &Guest, ride: &Ride, context: &SimulationContext) -> bool {
    guest.happiness >= 215 && guest.nausea <= 120 && within_intensity_ceiling(ride, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{GuestId, NauseaTolerance, Position, RideId, RideKind, RideTypeDescriptor, RideTypeId};
    use rand::rngs::mock::StepRng;

    fn guest() -> Guest {
        Guest::new(GuestId::new(1), Position::default())
    }

    fn ride_with(ratings: RideRatings) -> Ride {
        let mut ride = Ride::new(
            RideId::new(1),
            "Loop",
            RideTypeDescriptor::new(RideTypeId::new(2), RideKind::Tracked),
        );
        ride.ratings = Some(ratings);
        ride
    }

    #[test]
    fn comfort_level_counts_matching_windows() {
        assert_eq!(comfort_level(550, 200, 600, 200), 0);
        assert_eq!(comfort_level(100, 200, 800, 200), 1);
        assert_eq!(comfort_level(5_000, 200, 800, 0), 3);
    }

    #[test]
    fn lookup_combines_levels() {
        let mut guest = guest();
        guest.happiness = 0;
        guest.intensity = park_sim_core::IntensityPreference::new(0, 15);
        guest.nausea_tolerance = NauseaTolerance::High;
        // Intensity fits, nausea far outside every window.
        assert_eq!(intensity_nausea_satisfaction(&guest, Some(RideRatings::new(0, 500, 2_000))), -35);
        assert_eq!(intensity_nausea_satisfaction(&guest, None), 70);
    }

    #[test]
    fn queue_thresholds() {
        assert_eq!(queue_time_adjustment(4500), -35);
        assert_eq!(queue_time_adjustment(2250), -10);
        assert_eq!(queue_time_adjustment(751), 0);
        assert_eq!(queue_time_adjustment(750), 10);
    }

    #[test]
    fn buckets() {
        assert_eq!(satisfaction_bucket(40), 3);
        assert_eq!(satisfaction_bucket(39), 2);
        assert_eq!(satisfaction_bucket(0), 1);
        assert_eq!(satisfaction_bucket(-1), 0);
    }

    #[test]
    fn nausea_growth_scales_with_hunger_and_tolerance() {
        let mut guest = guest();
        guest.happiness_target = 200;
        guest.hunger = 200;
        guest.nausea_target = 10;
        guest.nausea_tolerance = NauseaTolerance::Low;
        // 512 * 64 / 512 = 64, * (200 / 64 = 3) = 192, >> 1 = 96.
        let grown = nausea_growth(&guest, Some(RideRatings::new(0, 0, 512)));
        assert_eq!(grown, 106);

        guest.nausea_target = 250;
        assert_eq!(nausea_growth(&guest, Some(RideRatings::new(0, 0, 512))), 255);
    }

    #[test]
    fn ride_again_needs_a_lucky_roll_once_seasoned() {
        let mut guest = guest();
        guest.happiness = 200;
        guest.energy = 120;
        guest.hunger = 100;
        guest.thirst = 100;
        guest.rides_ridden = 9;
        let ride = ride_with(RideRatings::new(500, 500, 300));
        let context = SimulationContext::default();

        assert!(!should_ride_again(&guest, &ride, &context, &mut StepRng::new(40, 0)));
        assert!(should_ride_again(&guest, &ride, &context, &mut StepRng::new(200, 0)));
        guest.rides_ridden = 2;
        assert!(should_ride_again(&guest, &ride, &context, &mut StepRng::new(40, 0)));
        assert!(!should_ride_again(&guest, &ride, &context, &mut StepRng::new(100, 0)));
    }

    #[test]
    fn intense_rides_are_not_repeated_without_cheat() {
        let mut guest = guest();
        guest.happiness = 255;
        guest.energy = 255;
        let ride = ride_with(RideRatings::new(500, 1_001, 300));
        let mut context = SimulationContext::default();
        assert!(!should_ride_again(&guest, &ride, &context, &mut StepRng::new(255, 0)));
        context.cheats.ignore_ride_intensity = true;
        assert!(should_ride_again(&guest, &ride, &context, &mut StepRng::new(255, 0)));
    }

    #[test]
    fn intensity_rises_only_on_high_roll() {
        let mut guest = guest();
        guest.happiness = 220;
        guest.intensity = park_sim_core::IntensityPreference::new(1, 5);
        let context = SimulationContext::default();
        assert!(!should_raise_intensity(&guest, &context, &mut StepRng::new(0x50, 0)));
        assert!(should_raise_intensity(&guest, &context, &mut StepRng::new(0x51, 0)));
    }
}
