#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the park simulation engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! happened to guests and rides. Systems read guest and ride snapshots together
//! with the [`SimulationContext`] and answer with plain values that the world
//! applies in a stable order.

#[macro_use]
mod flags;

mod collaborators;
mod context;
mod guest;
mod ids;
mod ride;
mod thoughts;
mod units;

use serde::{Deserialize, Serialize};

pub use collaborators::{Advance, Movement, StationGeometry, TileElement, TrackQuery};
pub use context::{Cheats, NotificationConfig, ParkFlags, SimulationContext, Weather};
pub use guest::{
    clamp_u8, Destination, Guest, GuestFlags, GuestState, IntensityPreference, Inventory,
    MazeCursor, NauseaTolerance, RideMemory, RideSubState, SeatAssignment, SlideCursor,
    SlidePhase, SlideRun, WaypointCursor,
};
pub use ids::{GuestId, RideId, RideTypeId, StationIndex};
pub use ride::{
    Car, CarFlags, CarType, CrashKind, LifecycleFlags, Ride, RideCapabilities, RideKind,
    RideMode, RideStatus, RideTypeDescriptor, RollingCounter, SpiralSlideState, Station,
    StationQueue, Train, TrainStatus,
};
pub use thoughts::{Thought, ThoughtBuffer, ThoughtKind};
pub use units::{
    Direction, GForces, Money, Offset, Position, RideRating, RideRatings, TileCoords,
    TileLocation, HEIGHT_STEP, TILE_SIZE,
};

/// Canonical banner emitted when the simulation boots.
pub const WELCOME_BANNER: &str = "Welcome to the park.";

/// Facility a guest may go looking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Need {
    /// Toilets.
    Toilet,
    /// First aid room.
    FirstAid,
    /// Something to eat.
    Food,
    /// Something to drink.
    Drink,
    /// Cash machine.
    CashMachine,
}

impl Need {
    /// Capability a facility must carry to satisfy the need.
    #[must_use]
    pub const fn capability(self) -> RideCapabilities {
        match self {
            Self::Toilet => RideCapabilities::IS_TOILET,
            Self::FirstAid => RideCapabilities::IS_FIRST_AID,
            Self::Food => RideCapabilities::SELLS_FOOD,
            Self::Drink => RideCapabilities::SELLS_DRINKS,
            Self::CashMachine => RideCapabilities::IS_CASH_MACHINE,
        }
    }

    /// Reports whether only facilities close by are considered.
    #[must_use]
    pub const fn only_close(self) -> bool {
        matches!(self, Self::FirstAid)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the simulation-wide settings.
    ConfigureContext {
        /// New settings.
        context: SimulationContext,
    },
    /// Adds a ride under the identifier it carries.
    AddRide {
        /// Ride to add.
        ride: Box<Ride>,
    },
    /// Deletes a ride, ejecting its guests and purging guest memories.
    DeleteRide {
        /// Ride to delete.
        ride: RideId,
    },
    /// Changes a ride's operating status.
    SetRideStatus {
        /// Target ride.
        ride: RideId,
        /// New status.
        status: RideStatus,
    },
    /// Changes a ride's admission price.
    SetRidePrice {
        /// Target ride.
        ride: RideId,
        /// New price.
        price: Money,
    },
    /// Marks a ride broken down or repaired.
    SetBreakdown {
        /// Target ride.
        ride: RideId,
        /// Whether the ride is broken down.
        broken_down: bool,
    },
    /// Reports a train status change from the vehicle subsystem.
    SetTrainStatus {
        /// Target ride.
        ride: RideId,
        /// Train index.
        train: u8,
        /// New status.
        status: TrainStatus,
    },
    /// Adds a guest under the identifier it carries.
    AddGuest {
        /// Guest to add.
        guest: Box<Guest>,
    },
    /// Removes a guest, detaching them from queues, seats and memory.
    RemoveGuest {
        /// Guest to remove.
        guest: GuestId,
    },
    /// A walking guest reaches a ride's queue or entrance.
    ArriveAtRide {
        /// Arriving guest.
        guest: GuestId,
        /// Ride reached.
        ride: RideId,
        /// Station reached.
        station: StationIndex,
        /// The guest walked in along the queue path.
        via_queue: bool,
    },
    /// A walking guest reaches a shop or facility.
    VisitShop {
        /// Arriving guest.
        guest: GuestId,
        /// Facility reached.
        ride: RideId,
    },
    /// Asks a guest to choose the most exciting ride it knows about.
    PickRide {
        /// Deciding guest.
        guest: GuestId,
    },
    /// Asks a guest to head for the nearest facility satisfying a need.
    HeadForNearest {
        /// Deciding guest.
        guest: GuestId,
        /// Need to satisfy.
        need: Need,
    },
    /// Advances the simulation by one tick.
    Tick,
}

/// Reason a command could not be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum CommandError {
    /// No guest carries the identifier.
    #[error("unknown guest {0:?}")]
    UnknownGuest(GuestId),
    /// No ride carries the identifier.
    #[error("unknown ride {0:?}")]
    UnknownRide(RideId),
    /// The ride has no such station.
    #[error("ride {ride:?} has no station {station:?}")]
    UnknownStation {
        /// Ride addressed.
        ride: RideId,
        /// Station requested.
        station: StationIndex,
    },
    /// The ride has no such train.
    #[error("ride {ride:?} has no train {train}")]
    UnknownTrain {
        /// Ride addressed.
        ride: RideId,
        /// Train requested.
        train: u8,
    },
    /// A guest with the identifier already exists.
    #[error("guest {0:?} already exists")]
    DuplicateGuest(GuestId),
    /// A ride with the identifier already exists.
    #[error("ride {0:?} already exists")]
    DuplicateRide(RideId),
    /// The guest is engaged with a ride and cannot take a new intent.
    #[error("guest {0:?} is busy")]
    GuestBusy(GuestId),
    /// The ride is not a shop or facility.
    #[error("ride {0:?} is not a shop")]
    NotAShop(RideId),
    /// The ride is a shop or facility and has no queue.
    #[error("ride {0:?} is a shop")]
    IsAShop(RideId),
}

/// News item kinds raised for the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsKind {
    /// "<guest> is on <ride>".
    GuestOnRide,
    /// "<guest> is in <ride>".
    GuestInRide,
    /// "<guest> has left <ride>".
    GuestLeftRide,
    /// "<guest> is now in the queue for <ride>".
    GuestJoinedQueue,
    /// "Guests are stuck on <ride>".
    GuestsStuckOnRide,
}

/// Audio cue requested from the sound subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// One of three laughs, `0..3`.
    Laugh(u8),
    /// Toilet flush.
    ToiletFlush,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// The simulation advanced by one tick.
    TimeAdvanced {
        /// Tick just completed.
        tick: u64,
    },
    /// Settings were replaced.
    ContextConfigured,
    /// A ride was added.
    RideAdded {
        /// New ride.
        ride: RideId,
    },
    /// A ride was deleted.
    RideDeleted {
        /// Deleted ride.
        ride: RideId,
    },
    /// A ride changed status.
    RideStatusChanged {
        /// Ride affected.
        ride: RideId,
        /// New status.
        status: RideStatus,
    },
    /// A ride changed price.
    RidePriceChanged {
        /// Ride affected.
        ride: RideId,
        /// New price.
        price: Money,
    },
    /// A ride broke down or was repaired.
    BreakdownChanged {
        /// Ride affected.
        ride: RideId,
        /// Whether the ride is broken down.
        broken_down: bool,
    },
    /// A train changed status.
    TrainStatusChanged {
        /// Ride affected.
        ride: RideId,
        /// Train index.
        train: u8,
        /// New status.
        status: TrainStatus,
    },
    /// A guest was added.
    GuestAdded {
        /// New guest.
        guest: GuestId,
    },
    /// A guest was removed.
    GuestRemoved {
        /// Removed guest.
        guest: GuestId,
    },
    /// A guest joined a station queue.
    QueueJoined {
        /// Guest queued.
        guest: GuestId,
        /// Ride queued for.
        ride: RideId,
        /// Station queued at.
        station: StationIndex,
        /// Queue length after joining.
        length: u16,
    },
    /// A guest left a station queue.
    QueueLeft {
        /// Guest leaving.
        guest: GuestId,
        /// Ride left.
        ride: RideId,
        /// Station left.
        station: StationIndex,
        /// Queue length after leaving.
        length: u16,
    },
    /// A guest was treated as the front of the queue although its queue link said otherwise.
    QueueFrontRepaired {
        /// Guest promoted.
        guest: GuestId,
        /// Ride queued for.
        ride: RideId,
    },
    /// A guest moved between engagement sub-states.
    SubStateChanged {
        /// Guest affected.
        guest: GuestId,
        /// Previous sub-state.
        from: RideSubState,
        /// New sub-state.
        to: RideSubState,
    },
    /// A guest decided whether to engage with a ride.
    EngagementDecided {
        /// Deciding guest.
        guest: GuestId,
        /// Ride considered.
        ride: RideId,
        /// Whether the guest accepted.
        accepted: bool,
    },
    /// A guest had a thought.
    ThoughtAdded {
        /// Thinking guest.
        guest: GuestId,
        /// The thought.
        thought: Thought,
    },
    /// A ride's popularity window received a sample.
    PopularityRecorded {
        /// Ride affected.
        ride: RideId,
        /// Sample added, `0` or `1`.
        sample: u8,
    },
    /// A ride's satisfaction window received a sample.
    SatisfactionRecorded {
        /// Ride affected.
        ride: RideId,
        /// Sample added, `0..=3`.
        bucket: u8,
    },
    /// A guest paid admission.
    FarePaid {
        /// Paying guest.
        guest: GuestId,
        /// Ride paid for.
        ride: RideId,
        /// Amount paid.
        amount: Money,
    },
    /// A guest rode for free with a voucher.
    VoucherRedeemed {
        /// Guest redeeming.
        guest: GuestId,
        /// Ride redeemed for.
        ride: RideId,
    },
    /// A guest bought a shop item or an on-ride photo.
    ItemPurchased {
        /// Buying guest.
        guest: GuestId,
        /// Selling ride.
        ride: RideId,
        /// Amount paid.
        amount: Money,
    },
    /// A guest withdrew money from a cash machine.
    CashWithdrawn {
        /// Guest withdrawing.
        guest: GuestId,
        /// Cash machine used.
        ride: RideId,
        /// Amount withdrawn.
        amount: Money,
    },
    /// A guest boarded or entered a ride.
    GuestEnteredRide {
        /// Guest boarding.
        guest: GuestId,
        /// Ride boarded.
        ride: RideId,
        /// Satisfaction computed for the visit.
        satisfaction: i32,
    },
    /// A guest finished a ride.
    GuestExitedRide {
        /// Guest leaving.
        guest: GuestId,
        /// Ride left.
        ride: RideId,
        /// The guest wants to ride again.
        ride_again: bool,
    },
    /// A guest changed the ride it is heading for.
    HeadingChanged {
        /// Guest affected.
        guest: GuestId,
        /// New target, if any.
        ride: Option<RideId>,
    },
    /// The pathfinding goal of a guest must be recomputed.
    PathfindGoalReset {
        /// Guest affected.
        guest: GuestId,
    },
    /// A news item for the player.
    News {
        /// Kind of item.
        kind: NewsKind,
        /// Guest mentioned, if any.
        guest: Option<GuestId>,
        /// Ride mentioned.
        ride: RideId,
    },
    /// A sound should play.
    Sound {
        /// Cue to play.
        cue: SoundCue,
        /// Where the sound originates.
        position: Position,
    },
    /// A guest was forced off a ride.
    GuestEjected {
        /// Guest ejected.
        guest: GuestId,
        /// Ride left.
        ride: RideId,
    },
    /// A command could not be applied.
    CommandRejected {
        /// Reason for the rejection.
        error: CommandError,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        CommandError, GuestId, Money, RideCapabilities, RideId, RideKind, RideRatings,
        RideTypeDescriptor, RideTypeId, Thought, ThoughtBuffer, ThoughtKind, TileCoords,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TileCoords::new(1, 1);
        let destination = TileCoords::new(4, -3);
        assert_eq!(origin.manhattan_distance(destination), 7);
        assert_eq!(destination.manhattan_distance(origin), 7);
    }

    #[test]
    fn world_coordinates_map_to_tiles() {
        assert_eq!(TileCoords::from_world(33, 63), TileCoords::new(1, 1));
        assert_eq!(TileCoords::from_world(-1, 0), TileCoords::new(-1, 0));
        assert_eq!(TileCoords::new(2, 3).centre(), (80, 112));
    }

    #[test]
    fn money_displays_whole_and_cents() {
        assert_eq!(Money::new(10, 5).to_string(), "10.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
        assert_eq!(Money::new(3, 99).dimes(), 39);
    }

    #[test]
    fn ride_descriptor_round_trips_through_bincode() {
        let descriptor = RideTypeDescriptor::new(RideTypeId::new(4), RideKind::Maze);
        assert_round_trip(&descriptor);
        assert!(descriptor.has(RideCapabilities::NO_VEHICLES));
        assert!(!descriptor.has(RideCapabilities::IS_SHOP));
    }

    #[test]
    fn ratings_round_trip_through_bincode() {
        assert_round_trip(&RideRatings::new(650, 550, 100));
    }

    #[test]
    fn command_error_round_trips_through_bincode() {
        assert_round_trip(&CommandError::UnknownGuest(GuestId::new(7)));
    }

    #[test]
    fn thought_buffer_keeps_newest_five() {
        let mut buffer = ThoughtBuffer::new();
        for id in 0..7 {
            buffer.insert(Thought::new(ThoughtKind::BadValue, Some(RideId::new(id))));
        }
        assert_eq!(buffer.len(), ThoughtBuffer::CAPACITY);
        assert_eq!(
            buffer.latest(),
            Some(&Thought::new(ThoughtKind::BadValue, Some(RideId::new(6))))
        );
        assert!(!buffer.contains(ThoughtKind::BadValue, Some(RideId::new(1))));
    }

    #[test]
    fn repeated_thought_moves_to_front() {
        let mut buffer = ThoughtBuffer::new();
        let hungry = Thought::new(ThoughtKind::Hungry, None);
        let intense = Thought::new(ThoughtKind::Intense, Some(RideId::new(2)));
        buffer.insert(hungry);
        buffer.insert(intense);
        buffer.insert(hungry);
        let order: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(order, vec![hungry, intense]);
    }

    #[test]
    fn forgetting_a_ride_compacts_thoughts() {
        let ride = RideId::new(3);
        let mut buffer = ThoughtBuffer::new();
        buffer.insert(Thought::new(ThoughtKind::Intense, Some(ride)));
        buffer.insert(Thought::new(ThoughtKind::Hungry, None));
        buffer.insert(Thought::new(ThoughtKind::AlreadyGot, Some(ride)));
        buffer.insert(Thought::new(ThoughtKind::WasGreat, Some(ride)));
        buffer.insert(Thought::new(ThoughtKind::CantAffordItem, Some(RideId::new(4))));
        buffer.forget_ride(ride);
        let kinds: Vec<_> = buffer.iter().map(|thought| thought.kind).collect();
        assert_eq!(kinds, vec![ThoughtKind::CantAffordItem, ThoughtKind::Hungry]);
    }

    #[test]
    fn rolling_popularity_publishes_after_twenty_five_samples() {
        let mut counter = super::RollingCounter::popularity();
        for _ in 0..24 {
            assert_eq!(counter.record(1), None);
        }
        assert_eq!(counter.record(1), Some(25));
        assert_eq!(counter.value(), Some(25));
        assert_eq!(counter.samples(), 0);
    }

    #[test]
    fn rolling_satisfaction_is_scaled_down() {
        let mut counter = super::RollingCounter::satisfaction();
        let mut published = None;
        for _ in 0..20 {
            published = counter.record(3);
        }
        assert_eq!(published, Some(15));
    }
}
