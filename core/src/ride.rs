use serde::{Deserialize, Serialize};

use crate::{
    GForces, GuestId, Money, Offset, Position, RideId, RideRatings, RideTypeId, StationIndex,
};

/// Closed set of ride behaviours that need their own engagement sub-path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideKind {
    /// Any ride boarded through a train of cars.
    Tracked,
    /// Hedge maze walked on foot.
    Maze,
    /// Single-occupant spiral slide.
    SpiralSlide,
    /// Rotating ring boarded through waypoints around the centre vehicle.
    Enterprise,
    /// Enclosed simulator boarded up a short flight of steps.
    MotionSimulator,
    /// Public toilets.
    Toilets,
    /// First aid room.
    FirstAid,
    /// Cash machine.
    CashMachine,
    /// Stall selling food.
    FoodStall,
    /// Stall selling drinks.
    DrinkStall,
    /// Stall selling souvenirs or services.
    Shop,
}

impl RideKind {
    /// Capability set a ride of this kind carries unless configured otherwise.
    #[must_use]
    pub const fn default_capabilities(self) -> RideCapabilities {
        match self {
            Self::Tracked => RideCapabilities::WILL_RIDE_AGAIN
                .union(RideCapabilities::HAS_G_FORCES)
                .union(RideCapabilities::CHECK_G_FORCES),
            Self::Maze => RideCapabilities::NO_VEHICLES
                .union(RideCapabilities::WILL_RIDE_AGAIN)
                .union(RideCapabilities::IN_RIDE),
            Self::SpiralSlide => {
                RideCapabilities::NO_VEHICLES.union(RideCapabilities::WILL_RIDE_AGAIN)
            }
            Self::Enterprise => RideCapabilities::WILL_RIDE_AGAIN
                .union(RideCapabilities::CHECK_G_FORCES)
                .union(RideCapabilities::EXIT_BESIDE_VEHICLE),
            Self::MotionSimulator => RideCapabilities::WILL_RIDE_AGAIN
                .union(RideCapabilities::IN_RIDE)
                .union(RideCapabilities::EXIT_BESIDE_VEHICLE),
            Self::Toilets => RideCapabilities::IS_SHOP.union(RideCapabilities::IS_TOILET),
            Self::FirstAid => RideCapabilities::IS_SHOP.union(RideCapabilities::IS_FIRST_AID),
            Self::CashMachine => {
                RideCapabilities::IS_SHOP.union(RideCapabilities::IS_CASH_MACHINE)
            }
            Self::FoodStall => RideCapabilities::IS_SHOP.union(RideCapabilities::SELLS_FOOD),
            Self::DrinkStall => RideCapabilities::IS_SHOP.union(RideCapabilities::SELLS_DRINKS),
            Self::Shop => RideCapabilities::IS_SHOP,
        }
    }
}

flag_set! {
    /// Typed capability set describing what a ride type can do.
    pub struct RideCapabilities(u32) {
        /// Guests walk the ride on foot instead of boarding vehicles.
        const NO_VEHICLES = 1 << 0;
        /// Ride carries guests between two points of the park.
        const TRANSPORT_RIDE = 1 << 1;
        /// Ride is a shop, stall or service facility.
        const IS_SHOP = 1 << 2;
        /// Ride exposes guests to vertical and lateral forces.
        const HAS_G_FORCES = 1 << 3;
        /// Guests inspect the forces before riding when no ratings exist yet.
        const CHECK_G_FORCES = 1 << 4;
        /// Guests may decide to ride again straight after leaving.
        const WILL_RIDE_AGAIN = 1 << 5;
        /// Guests holding an umbrella may ride in the rain.
        const CAN_USE_UMBRELLA = 1 << 6;
        /// Dismounting guests step onto the platform beside their car.
        const EXIT_BESIDE_VEHICLE = 1 << 7;
        /// Guests are "in" rather than "on" the ride.
        const IN_RIDE = 1 << 8;
        /// Facility sells food.
        const SELLS_FOOD = 1 << 9;
        /// Facility sells drinks.
        const SELLS_DRINKS = 1 << 10;
        /// Facility is a toilet block.
        const IS_TOILET = 1 << 11;
        /// Facility is a first aid room.
        const IS_FIRST_AID = 1 << 12;
        /// Facility is a cash machine.
        const IS_CASH_MACHINE = 1 << 13;
    }
}

/// Value object describing a ride type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RideTypeDescriptor {
    /// Identifier shared by every ride of this type.
    pub type_id: RideTypeId,
    /// Behaviour selecting the engagement sub-path.
    pub kind: RideKind,
    /// Capabilities of the type.
    pub capabilities: RideCapabilities,
    /// Elevation added to the station height while guests stand on the platform.
    pub platform_height: i32,
    /// Photo slot (0-3) sold at the exit, if the type takes on-ride photos.
    pub photo_slot: Option<u8>,
}

impl RideTypeDescriptor {
    /// Descriptor with the default capabilities of `kind`.
    #[must_use]
    pub const fn new(type_id: RideTypeId, kind: RideKind) -> Self {
        Self {
            type_id,
            kind,
            capabilities: kind.default_capabilities(),
            platform_height: 0,
            photo_slot: None,
        }
    }

    /// Replaces the capability set.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: RideCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Assigns the photo slot sold at the exit.
    #[must_use]
    pub const fn with_photo_slot(mut self, slot: u8) -> Self {
        self.photo_slot = Some(slot & 3);
        self
    }

    /// Reports whether the type carries every capability of `capability`.
    #[must_use]
    pub const fn has(&self, capability: RideCapabilities) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Operating status set by the park manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideStatus {
    /// Ride accepts no guests.
    #[default]
    Closed,
    /// Ride accepts guests.
    Open,
    /// Ride runs empty test cycles.
    Testing,
}

flag_set! {
    /// Lifecycle markers raised by this engine and by maintenance collaborators.
    pub struct LifecycleFlags(u32) {
        /// Ride is broken down awaiting a mechanic.
        const BROKEN_DOWN = 1 << 0;
        /// Ride has crashed and is out of action.
        const CRASHED = 1 << 1;
        /// Queue was too long for the last guest who arrived at it.
        const QUEUE_FULL = 1 << 5;
        /// Ride has opened at least once.
        const EVER_OPENED = 1 << 2;
        /// A camera sells photos at the exit.
        const ON_RIDE_PHOTO = 1 << 3;
        /// Trains pass the station without stopping.
        const PASS_STATION_NO_STOPPING = 1 << 4;
    }
}

/// Most recent crash suffered by a ride.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashKind {
    /// Vehicles crashed without guests aboard.
    NoFatalities,
    /// Guests were hurt.
    Fatalities,
}

/// Operating mode of a ride.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideMode {
    /// Trains load, run one circuit and unload.
    #[default]
    Normal,
    /// Trains run continuously through the station.
    ContinuousCircuit,
    /// Rotating vehicle turning forwards; seats follow the car orientation.
    ForwardRotation,
    /// Rotating vehicle turning backwards; seats follow the car orientation.
    BackwardRotation,
    /// Free roaming bumper cars.
    Dodgems,
    /// Vehicles race each other.
    Race,
    /// One descent per admission.
    SingleRidePerAdmission,
    /// Guests may repeat while they like.
    UnlimitedRidesPerAdmission,
}

impl RideMode {
    /// Reports whether seats are chosen by vehicle orientation.
    #[must_use]
    pub const fn is_rotation(self) -> bool {
        matches!(self, Self::ForwardRotation | Self::BackwardRotation)
    }

    /// Reports whether guests board any waiting vehicle rather than the one in the station.
    #[must_use]
    pub const fn boards_any_waiting_vehicle(self) -> bool {
        matches!(self, Self::Dodgems | Self::Race)
    }
}

/// Intrusive FIFO bookkeeping for a station queue.
///
/// `last` is the most recently enqueued guest. Every guest links through
/// `Guest::next_in_queue` to the guest queued just before them; the front
/// guest has no link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationQueue {
    /// Most recently enqueued guest.
    pub last: Option<GuestId>,
    /// Number of guests waiting.
    pub length: u16,
}

/// Boarding point of a ride.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Station {
    /// Guests waiting to board.
    pub queue: StationQueue,
    /// Displayed queue time in minutes.
    pub queue_time: u8,
    /// Train currently loading at the station.
    pub train_at_station: Option<u8>,
}

flag_set! {
    /// Loading behaviour of a car type.
    pub struct CarFlags(u16) {
        /// Guests walk a set of waypoints around the vehicle to board.
        const LOADING_WAYPOINTS = 1 << 0;
        /// Guests walk straight to a free roaming car.
        const DODGEM_PLACEMENT = 1 << 1;
        /// Mini golf ball and player.
        const MINI_GOLF = 1 << 2;
        /// Chairlift seat.
        const CHAIRLIFT = 1 << 3;
        /// Go-kart.
        const GO_KART = 1 << 4;
    }
}

/// Static boarding geometry of a car type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarType {
    /// Loading behaviour.
    pub flags: CarFlags,
    /// Platform offset per seat for straight boarding.
    pub loading_positions: Vec<i8>,
    /// Sets of three boarding waypoints, indexed by seat segment and entrance direction.
    pub loading_waypoints: Vec<[Offset; 3]>,
    /// Number of segments seats are split into for waypoint loading.
    pub waypoint_segments: u8,
}

impl CarType {
    /// Reports whether boarding uses the wider entrance approach.
    #[must_use]
    pub const fn has_wide_entrance(&self) -> bool {
        self.flags.intersects(
            CarFlags::MINI_GOLF
                .union(CarFlags::CHAIRLIFT)
                .union(CarFlags::GO_KART),
        )
    }

    /// Reports whether the exit walk is pushed a full tile out.
    #[must_use]
    pub const fn has_wide_exit(&self) -> bool {
        self.flags
            .intersects(CarFlags::CHAIRLIFT.union(CarFlags::GO_KART))
    }
}

/// Single car of a train.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Car {
    /// Index into the ride's car types.
    pub car_type: u8,
    /// Number of seats.
    pub capacity: u8,
    /// Two guests share the car and board together.
    pub paired: bool,
    /// Occupant of each seat.
    pub seats: Vec<Option<GuestId>>,
    /// Shirt colour shown in each seat.
    pub seat_colours: Vec<u8>,
    /// Next seat handed out by the boarding routine.
    pub next_free_seat: u8,
    /// Guests currently seated.
    pub occupants: u8,
    /// Mass carried, read by the physics collaborator.
    pub mass: u16,
    /// Position of the car.
    pub position: Position,
    /// Facing of the car sprite in 32 steps.
    pub sprite_direction: u8,
    /// Pitch of the car, used by rotation rides to place seats.
    pub orientation: u8,
    /// Station the car stopped at last.
    pub current_station: Option<StationIndex>,
}

impl Car {
    /// Creates an empty car.
    #[must_use]
    pub fn new(car_type: u8, capacity: u8, paired: bool) -> Self {
        Self {
            car_type,
            capacity,
            paired,
            seats: vec![None; usize::from(capacity)],
            seat_colours: vec![0; usize::from(capacity)],
            ..Self::default()
        }
    }

    /// Places the car.
    #[must_use]
    pub fn at(mut self, position: Position, sprite_direction: u8) -> Self {
        self.position = position;
        self.sprite_direction = sprite_direction;
        self
    }

    /// Reports whether every seat has been handed out.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.next_free_seat >= self.capacity
    }
}

/// Status of a train as reported by the vehicle collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainStatus {
    /// Train is out on the track.
    #[default]
    Travelling,
    /// Train is stopped in a station and loading.
    WaitingForPassengers {
        /// Station being served.
        station: StationIndex,
    },
    /// Train is about to leave; unmatched pairs give up their seats.
    ReadyToDepart {
        /// Station being left.
        station: StationIndex,
    },
    /// Train returned and its riders are stepping off.
    Unloading {
        /// Station being unloaded into.
        station: StationIndex,
    },
}

/// Chain of cars travelling together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Train {
    /// Cars from front to back.
    pub cars: Vec<Car>,
    /// Current status.
    pub status: TrainStatus,
}

impl Train {
    /// Creates a travelling train.
    #[must_use]
    pub fn new(cars: Vec<Car>) -> Self {
        Self {
            cars,
            status: TrainStatus::Travelling,
        }
    }
}

/// Windowed accumulator behind the ride popularity and satisfaction statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollingCounter {
    value: Option<u8>,
    next: u16,
    samples: u8,
    window: u8,
    shift: u8,
}

impl RollingCounter {
    /// Popularity statistic: 25 samples, published unscaled.
    #[must_use]
    pub const fn popularity() -> Self {
        Self::new(25, 0)
    }

    /// Satisfaction statistic: 20 samples, published divided by four.
    #[must_use]
    pub const fn satisfaction() -> Self {
        Self::new(20, 2)
    }

    const fn new(window: u8, shift: u8) -> Self {
        Self {
            value: None,
            next: 0,
            samples: 0,
            window,
            shift,
        }
    }

    /// Published value, or `None` until the first window closes.
    #[must_use]
    pub const fn value(&self) -> Option<u8> {
        self.value
    }

    /// Samples gathered in the open window.
    #[must_use]
    pub const fn samples(&self) -> u8 {
        self.samples
    }

    /// Adds a sample and returns the newly published value when the window closes.
    pub fn record(&mut self, amount: u8) -> Option<u8> {
        self.next = self.next.saturating_add(u16::from(amount));
        self.samples += 1;
        if self.samples < self.window {
            return None;
        }
        let published = u8::try_from(self.next >> self.shift).unwrap_or(u8::MAX);
        self.value = Some(published);
        self.next = 0;
        self.samples = 0;
        Some(published)
    }
}

/// Exclusive-use state of a spiral slide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpiralSlideState {
    /// Guest currently sliding.
    pub occupant: Option<GuestId>,
    /// Shirt colour drawn on the slide.
    pub occupant_colour: u8,
    /// Descent progress.
    pub progress: u8,
}

/// Ride, shop or facility placed in the park.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    /// Identifier of the ride.
    pub id: RideId,
    /// Display name.
    pub name: String,
    /// Ride type.
    pub descriptor: RideTypeDescriptor,
    /// Operating status.
    pub status: RideStatus,
    /// Lifecycle markers.
    pub lifecycle: LifecycleFlags,
    /// Operating mode.
    pub mode: RideMode,
    /// Stations in index order.
    pub stations: Vec<Station>,
    /// Ratings, `None` until computed.
    pub ratings: Option<RideRatings>,
    /// Peak forces.
    pub g_forces: GForces,
    /// Highest drop in height steps.
    pub highest_drop_height: u8,
    /// Covered share of the ride in eighths.
    pub sheltered_eighths: u8,
    /// Value for money, `None` until computed.
    pub value: Option<Money>,
    /// Admission price.
    pub price: Money,
    /// Price of the on-ride photo or the secondary item.
    pub secondary_price: Money,
    /// Most recent crash.
    pub last_crash: Option<CrashKind>,
    /// Rolling popularity.
    pub popularity: RollingCounter,
    /// Rolling satisfaction.
    pub satisfaction: RollingCounter,
    /// Capacity of vehicle-less rides.
    pub operation_option: u8,
    /// Guests entering or riding.
    pub num_riders: u16,
    /// Ticks left before a vehicle change completes.
    pub vehicle_change_timeout: u8,
    /// Car types used by the trains.
    pub car_types: Vec<CarType>,
    /// Car type describing the ride as a whole.
    pub default_car_type: u8,
    /// Trains.
    pub trains: Vec<Train>,
    /// Guests who completed a visit.
    pub total_customers: u32,
    /// Guests currently on board.
    pub current_customers: u16,
    /// Income from admissions and secondary sales.
    pub income: Money,
    /// Secondary items sold.
    pub secondary_items_sold: u32,
    /// Spiral slide exclusivity.
    pub slide: SpiralSlideState,
}

impl Ride {
    /// Creates a closed ride with one station and no trains.
    #[must_use]
    pub fn new(id: RideId, name: impl Into<String>, descriptor: RideTypeDescriptor) -> Self {
        Self {
            id,
            name: name.into(),
            descriptor,
            status: RideStatus::Closed,
            lifecycle: LifecycleFlags::empty(),
            mode: RideMode::Normal,
            stations: vec![Station::default()],
            ratings: None,
            g_forces: GForces::default(),
            highest_drop_height: 0,
            sheltered_eighths: 0,
            value: None,
            price: Money::ZERO,
            secondary_price: Money::ZERO,
            last_crash: None,
            popularity: RollingCounter::popularity(),
            satisfaction: RollingCounter::satisfaction(),
            operation_option: 0,
            num_riders: 0,
            vehicle_change_timeout: 0,
            car_types: vec![CarType::default()],
            default_car_type: 0,
            trains: Vec::new(),
            total_customers: 0,
            current_customers: 0,
            income: Money::ZERO,
            secondary_items_sold: 0,
            slide: SpiralSlideState::default(),
        }
    }

    /// Reports whether the ride type carries `capability`.
    #[must_use]
    pub const fn has(&self, capability: RideCapabilities) -> bool {
        self.descriptor.has(capability)
    }

    /// Reports whether ratings have been computed.
    #[must_use]
    pub const fn has_ratings(&self) -> bool {
        self.ratings.is_some()
    }

    /// Reports whether the ride is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == RideStatus::Open
    }

    /// Reports whether the ride is broken down.
    #[must_use]
    pub const fn is_broken_down(&self) -> bool {
        self.lifecycle.contains(LifecycleFlags::BROKEN_DOWN)
    }

    /// Reports whether the ride is a transport ride that costs nothing to use.
    #[must_use]
    pub fn is_free_transport(&self) -> bool {
        self.has(RideCapabilities::TRANSPORT_RIDE) && self.value.is_some() && self.price.is_zero()
    }

    /// Station at `index`.
    #[must_use]
    pub fn station(&self, index: StationIndex) -> Option<&Station> {
        self.stations.get(index.index())
    }

    /// Mutable station at `index`.
    pub fn station_mut(&mut self, index: StationIndex) -> Option<&mut Station> {
        self.stations.get_mut(index.index())
    }

    /// Car `car` of train `train`.
    #[must_use]
    pub fn car(&self, train: u8, car: u8) -> Option<&Car> {
        self.trains
            .get(usize::from(train))
            .and_then(|train| train.cars.get(usize::from(car)))
    }

    /// Mutable car `car` of train `train`.
    pub fn car_mut(&mut self, train: u8, car: u8) -> Option<&mut Car> {
        self.trains
            .get_mut(usize::from(train))
            .and_then(|train| train.cars.get_mut(usize::from(car)))
    }

    /// Car type describing the ride as a whole.
    #[must_use]
    pub fn default_car_type(&self) -> Option<&CarType> {
        self.car_types.get(usize::from(self.default_car_type))
    }

    /// Car type of a specific car.
    #[must_use]
    pub fn car_type_of(&self, car: &Car) -> Option<&CarType> {
        self.car_types.get(usize::from(car.car_type))
    }

    /// Iterator over the ride's stations with their indices.
    pub fn station_indices(&self) -> impl Iterator<Item = StationIndex> + '_ {
        (0..self.stations.len()).filter_map(|index| u8::try_from(index).ok().map(StationIndex::new))
    }
}
