#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative park state for the guest and ride simulation.
//!
//! The world owns every guest and ride, the station queues threaded through
//! them and the engagement state machine that walks a guest from the queue
//! onto a ride and back out again. Adapters drive it exclusively through
//! [`apply`] and observe it through [`query`].

mod engagement;
mod layout;
mod memory;
mod movement;
mod queue;

use std::{collections::BTreeMap, fmt};

use park_sim_core::{
    Command, CommandError, Event, Guest, GuestId, LifecycleFlags, Money, Movement, Ride, RideId,
    RideMemory, RideStatus, SimulationContext, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use layout::ParkLayout;
pub use movement::StepMovement;

const DEFAULT_SEED: u64 = 0x7061_726b_5f73_696d;

/// Construction parameters of a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    seed: u64,
    movement_step: i32,
    tuning: EngagementTuning,
}

impl WorldConfig {
    /// Creates a configuration seeding the random generator with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            movement_step: 1,
            tuning: EngagementTuning::default(),
        }
    }

    /// Sets how far the built-in movement walks a guest per tick.
    #[must_use]
    pub const fn with_movement_step(mut self, step: i32) -> Self {
        self.movement_step = step;
        self
    }

    /// Replaces the engagement tuning.
    #[must_use]
    pub const fn with_tuning(mut self, tuning: EngagementTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Seed of the random generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Units walked per tick by the built-in movement.
    #[must_use]
    pub const fn movement_step(&self) -> i32 {
        self.movement_step
    }

    /// Engagement tuning.
    #[must_use]
    pub const fn tuning(&self) -> EngagementTuning {
        self.tuning
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Tick-counted constants of the engagement state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngagementTuning {
    /// Ticks a guest searches for the ride it decided to ride again.
    pub lost_countdown: u8,
    /// Ticks in a park day, used for the days-in-queue counter.
    pub ticks_per_day: u64,
    /// Amount a cash machine pays out.
    pub cash_withdrawal: Money,
}

impl Default for EngagementTuning {
    fn default() -> Self {
        Self {
            lost_countdown: 200,
            ticks_per_day: 528,
            cash_withdrawal: Money::new(50, 0),
        }
    }
}

/// Authoritative state of the park.
pub struct World {
    banner: &'static str,
    context: SimulationContext,
    tuning: EngagementTuning,
    guests: BTreeMap<GuestId, Guest>,
    rides: BTreeMap<RideId, Ride>,
    memories: BTreeMap<GuestId, RideMemory>,
    layout: ParkLayout,
    movement: Box<dyn Movement>,
    rng: ChaCha8Rng,
    tick: u64,
    stuck_reports: BTreeMap<RideId, u64>,
    outbox: Vec<Event>,
}

impl World {
    /// Creates an empty park with no track on the map.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self::with_layout(config, ParkLayout::new())
    }

    /// Creates an empty park over the provided tile layout.
    #[must_use]
    pub fn with_layout(config: WorldConfig, layout: ParkLayout) -> Self {
        let movement = StepMovement::new(config.movement_step());
        Self::with_collaborators(config, layout, Box::new(movement))
    }

    /// Creates an empty park with a caller-supplied movement collaborator.
    #[must_use]
    pub fn with_collaborators(
        config: WorldConfig,
        layout: ParkLayout,
        movement: Box<dyn Movement>,
    ) -> Self {
        Self {
            banner: WELCOME_BANNER,
            context: SimulationContext::default(),
            tuning: config.tuning(),
            guests: BTreeMap::new(),
            rides: BTreeMap::new(),
            memories: BTreeMap::new(),
            layout,
            movement,
            rng: ChaCha8Rng::seed_from_u64(config.seed()),
            tick: 0,
            stuck_reports: BTreeMap::new(),
            outbox: Vec::new(),
        }
    }

    fn emit(&mut self, event: Event) {
        self.outbox.push(event);
    }

    fn ride_mut(&mut self, ride: RideId) -> Result<&mut Ride, CommandError> {
        self.rides.get_mut(&ride).ok_or(CommandError::UnknownRide(ride))
    }

    fn add_ride(&mut self, mut ride: Ride) -> Result<(), CommandError> {
        if self.rides.contains_key(&ride.id) {
            return Err(CommandError::DuplicateRide(ride.id));
        }
        if ride.is_open() {
            ride.lifecycle.insert(LifecycleFlags::EVER_OPENED);
        }
        let id = ride.id;
        let _ = self.rides.insert(id, ride);
        log::debug!("ride {id:?} added");
        self.emit(Event::RideAdded { ride: id });
        Ok(())
    }

    fn set_ride_status(&mut self, ride: RideId, status: RideStatus) -> Result<(), CommandError> {
        let target = self.ride_mut(ride)?;
        target.status = status;
        if status == RideStatus::Open {
            target.lifecycle.insert(LifecycleFlags::EVER_OPENED);
        }
        self.emit(Event::RideStatusChanged { ride, status });
        Ok(())
    }

    fn set_ride_price(&mut self, ride: RideId, price: Money) -> Result<(), CommandError> {
        self.ride_mut(ride)?.price = price;
        self.emit(Event::RidePriceChanged { ride, price });
        Ok(())
    }

    fn set_breakdown(&mut self, ride: RideId, broken_down: bool) -> Result<(), CommandError> {
        self.ride_mut(ride)?
            .lifecycle
            .set(LifecycleFlags::BROKEN_DOWN, broken_down);
        self.emit(Event::BreakdownChanged { ride, broken_down });
        Ok(())
    }

    fn add_guest(&mut self, guest: Guest) -> Result<(), CommandError> {
        if self.guests.contains_key(&guest.id) {
            return Err(CommandError::DuplicateGuest(guest.id));
        }
        let id = guest.id;
        let _ = self.guests.insert(id, guest);
        let _ = self.memories.insert(id, RideMemory::new());
        self.emit(Event::GuestAdded { guest: id });
        Ok(())
    }

    fn advance_time(&mut self) {
        self.tick = self.tick.saturating_add(1);
        self.emit(Event::TimeAdvanced { tick: self.tick });
        self.advance_slides();

        let ids: Vec<GuestId> = self.guests.keys().copied().collect();
        for id in ids {
            let Some(mut guest) = self.guests.remove(&id) else {
                continue;
            };
            self.update_guest(&mut guest);
            let _ = self.guests.insert(id, guest);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.tick)
            .field("guests", &self.guests.len())
            .field("rides", &self.rides.len())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::ConfigureContext { context } => {
            world.context = context;
            world.emit(Event::ContextConfigured);
            Ok(())
        }
        Command::AddRide { ride } => world.add_ride(*ride),
        Command::DeleteRide { ride } => world.delete_ride(ride),
        Command::SetRideStatus { ride, status } => world.set_ride_status(ride, status),
        Command::SetRidePrice { ride, price } => world.set_ride_price(ride, price),
        Command::SetBreakdown { ride, broken_down } => world.set_breakdown(ride, broken_down),
        Command::SetTrainStatus {
            ride,
            train,
            status,
        } => world.set_train_status(ride, train, status),
        Command::AddGuest { guest } => world.add_guest(*guest),
        Command::RemoveGuest { guest } => world.remove_guest(guest),
        Command::ArriveAtRide {
            guest,
            ride,
            station,
            via_queue,
        } => world.arrive_at_ride(guest, ride, station, via_queue),
        Command::VisitShop { guest, ride } => world.visit_shop(guest, ride),
        Command::PickRide { guest } => world.pick_ride(guest),
        Command::HeadForNearest { guest, need } => world.head_for_nearest(guest, need),
        Command::Tick => {
            world.advance_time();
            Ok(())
        }
    };

    if let Err(error) = outcome {
        log::debug!("command rejected: {error}");
        world.emit(Event::CommandRejected { error });
    }
    out_events.append(&mut world.outbox);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use park_sim_core::{
        Guest, GuestId, GuestState, Money, Ride, RideId, RideMemory, RideSubState,
        SimulationContext, StationIndex,
    };

    use super::{ParkLayout, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.tick
    }

    /// Simulation-wide settings currently in force.
    #[must_use]
    pub fn context(world: &World) -> &SimulationContext {
        &world.context
    }

    /// Tile layout the world reads track geometry from.
    #[must_use]
    pub fn layout(world: &World) -> &ParkLayout {
        &world.layout
    }

    /// Full record of a guest.
    #[must_use]
    pub fn guest(world: &World, guest: GuestId) -> Option<&Guest> {
        world.guests.get(&guest)
    }

    /// Full record of a ride.
    #[must_use]
    pub fn ride(world: &World, ride: RideId) -> Option<&Ride> {
        world.rides.get(&ride)
    }

    /// Rides a guest remembers riding.
    #[must_use]
    pub fn memory(world: &World, guest: GuestId) -> Option<&RideMemory> {
        world.memories.get(&guest)
    }

    /// Guests queued at a station, from the most recent arrival to the front.
    #[must_use]
    pub fn queue(world: &World, ride: RideId, station: StationIndex) -> Vec<GuestId> {
        world
            .rides
            .get(&ride)
            .and_then(|ride| ride.station(station))
            .map(|station| super::queue::chain(&station.queue, &world.guests))
            .unwrap_or_default()
    }

    /// Captures a read-only view of every guest.
    #[must_use]
    pub fn guest_view(world: &World) -> GuestView {
        let snapshots = world
            .guests
            .values()
            .map(|guest| GuestSnapshot {
                id: guest.id,
                state: guest.state,
                sub_state: guest.sub_state,
                current_ride: guest.current_ride,
                heading_to: guest.heading_to,
                happiness: guest.happiness,
                nausea: guest.nausea,
                cash: guest.cash,
                rides_ridden: guest.rides_ridden,
            })
            .collect();
        GuestView { snapshots }
    }

    /// Captures a read-only view of every ride.
    #[must_use]
    pub fn ride_view(world: &World) -> RideView {
        let snapshots = world
            .rides
            .values()
            .map(|ride| RideSnapshot {
                id: ride.id,
                name: ride.name.clone(),
                total_customers: ride.total_customers,
                num_riders: ride.num_riders,
                popularity: ride.popularity.value(),
                satisfaction: ride.satisfaction.value(),
                queue_lengths: ride.stations.iter().map(|station| station.queue.length).collect(),
                queue_times: ride.stations.iter().map(|station| station.queue_time).collect(),
                income: ride.income,
            })
            .collect();
        RideView { snapshots }
    }

    /// Read-only snapshot of all guests, ordered by id.
    #[derive(Clone, Debug)]
    pub struct GuestView {
        snapshots: Vec<GuestSnapshot>,
    }

    impl GuestView {
        /// Iterator over the captured guest snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &GuestSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<GuestSnapshot> {
            self.snapshots
        }
    }

    /// Immutable summary of one guest.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct GuestSnapshot {
        /// Identifier of the guest.
        pub id: GuestId,
        /// Top-level activity.
        pub state: GuestState,
        /// Engagement sub-state.
        pub sub_state: RideSubState,
        /// Ride being engaged with.
        pub current_ride: Option<RideId>,
        /// Ride the guest is heading for.
        pub heading_to: Option<RideId>,
        /// Current happiness.
        pub happiness: u8,
        /// Current nausea.
        pub nausea: u8,
        /// Cash in pocket.
        pub cash: Money,
        /// Rides ridden.
        pub rides_ridden: u8,
    }

    /// Read-only snapshot of all rides, ordered by id.
    #[derive(Clone, Debug)]
    pub struct RideView {
        snapshots: Vec<RideSnapshot>,
    }

    impl RideView {
        /// Iterator over the captured ride snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &RideSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<RideSnapshot> {
            self.snapshots
        }
    }

    /// Immutable summary of one ride.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct RideSnapshot {
        /// Identifier of the ride.
        pub id: RideId,
        /// Display name.
        pub name: String,
        /// Guests who completed a visit.
        pub total_customers: u32,
        /// Guests entering or on the ride.
        pub num_riders: u16,
        /// Published popularity.
        pub popularity: Option<u8>,
        /// Published satisfaction.
        pub satisfaction: Option<u8>,
        /// Queue length per station.
        pub queue_lengths: Vec<u16>,
        /// Queue time statistic per station.
        pub queue_times: Vec<u8>,
        /// Admission and item income.
        pub income: Money,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{Position, RideKind, RideTypeDescriptor, RideTypeId};

    fn carousel(id: u16) -> Ride {
        Ride::new(
            RideId::new(id),
            "Carousel",
            RideTypeDescriptor::new(RideTypeId::new(1), RideKind::Tracked),
        )
    }

    #[test]
    fn tick_advances_time_and_reports_it() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::Tick, &mut events);
        apply(&mut world, Command::Tick, &mut events);
        assert_eq!(query::tick(&world), 2);
        assert_eq!(
            events,
            vec![Event::TimeAdvanced { tick: 1 }, Event::TimeAdvanced { tick: 2 }]
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::AddRide { ride: Box::new(carousel(4)) }, &mut events);
        apply(&mut world, Command::AddRide { ride: Box::new(carousel(4)) }, &mut events);
        let guest = Guest::new(GuestId::new(1), Position::default());
        apply(&mut world, Command::AddGuest { guest: Box::new(guest.clone()) }, &mut events);
        apply(&mut world, Command::AddGuest { guest: Box::new(guest) }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::RideAdded { ride: RideId::new(4) },
                Event::CommandRejected {
                    error: CommandError::DuplicateRide(RideId::new(4))
                },
                Event::GuestAdded { guest: GuestId::new(1) },
                Event::CommandRejected {
                    error: CommandError::DuplicateGuest(GuestId::new(1))
                },
            ]
        );
        assert!(query::memory(&world, GuestId::new(1)).is_some());
    }

    #[test]
    fn opening_a_ride_marks_it_ever_opened() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(&mut world, Command::AddRide { ride: Box::new(carousel(2)) }, &mut events);
        apply(
            &mut world,
            Command::SetRideStatus {
                ride: RideId::new(2),
                status: RideStatus::Open,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetBreakdown {
                ride: RideId::new(2),
                broken_down: true,
            },
            &mut events,
        );
        let ride = query::ride(&world, RideId::new(2)).expect("ride");
        assert!(ride.lifecycle.contains(LifecycleFlags::EVER_OPENED));
        assert!(ride.is_broken_down());

        events.clear();
        apply(
            &mut world,
            Command::SetRidePrice {
                ride: RideId::new(9),
                price: Money::new(1, 0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                error: CommandError::UnknownRide(RideId::new(9))
            }]
        );
    }
}
