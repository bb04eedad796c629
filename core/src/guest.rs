use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{GuestId, Money, Position, RideId, RideTypeId, StationIndex, ThoughtBuffer};

/// How well a guest stomachs nauseating rides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NauseaTolerance {
    /// Cannot stand any nausea.
    None,
    /// Tolerates gentle rides.
    Low,
    /// Tolerates most rides.
    #[default]
    Average,
    /// Tolerates anything.
    High,
}

impl NauseaTolerance {
    /// Numeric level in `0..4`.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Average => 2,
            Self::High => 3,
        }
    }

    /// Highest nausea rating the guest accepts before adding happiness.
    #[must_use]
    pub const fn maximum_rating(self) -> i32 {
        match self {
            Self::None => 300,
            Self::Low => 600,
            Self::Average => 800,
            Self::High => 1000,
        }
    }

    /// Lower bound of the comfortable nausea window.
    #[must_use]
    pub const fn comfortable_minimum(self) -> i32 {
        match self {
            Self::None | Self::Low => 0,
            Self::Average => 200,
            Self::High => 400,
        }
    }
}

/// Preferred intensity range in whole rating points, each bound within `0..16`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntensityPreference {
    /// Least intense rating the guest enjoys.
    pub min: u8,
    /// Most intense rating the guest enjoys.
    pub max: u8,
}

impl IntensityPreference {
    /// Creates a preference, clamping both bounds to `0..16`.
    #[must_use]
    pub const fn new(min: u8, max: u8) -> Self {
        Self {
            min: if min > 15 { 15 } else { min },
            max: if max > 15 { 15 } else { max },
        }
    }

    /// Both bounds packed into one byte, maximum in the high nibble.
    #[must_use]
    pub const fn packed(self) -> u8 {
        (self.max << 4) | self.min
    }

    /// Raises the upper bound by one point, saturating at 15.
    #[must_use]
    pub const fn raised(self) -> Self {
        Self::new(self.min, self.max + 1)
    }
}

/// Top-level activity of a guest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuestState {
    /// Wandering the footpaths.
    #[default]
    Walking,
    /// Sitting on a bench.
    Sitting,
    /// Waiting in a station queue.
    Queuing,
    /// At the front of the queue deciding whether to board.
    QueuingFront,
    /// Walking into the ride.
    EnteringRide,
    /// On board.
    OnRide,
    /// Walking out of the ride.
    LeavingRide,
    /// Dropped back onto the footpath; becomes walking next tick.
    Falling,
    /// Using a shop or facility.
    UsingShop,
}

impl GuestState {
    /// Reports whether the state counts towards a ride's riders.
    #[must_use]
    pub const fn counts_as_rider(self) -> bool {
        matches!(self, Self::EnteringRide | Self::OnRide)
    }
}

flag_set! {
    /// Status markers carried by a guest.
    pub struct GuestFlags(u32) {
        /// Guest is heading for the park exit.
        const LEAVING_PARK = 1 << 0;
        /// Guest has already chosen which park entrance to leave by.
        const PARK_ENTRANCE_CHOSEN = 1 << 1;
        /// Player follows the guest in the news feed.
        const TRACKING = 1 << 2;
        /// Guest paid to enter the park.
        const HAS_PAID_FOR_PARK_ENTRY = 1 << 3;
        /// Current ride will become the favourite when the guest steps off.
        const FAVOURITE_PENDING = 1 << 4;
    }
}

/// Items carried by a guest that matter to ride decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inventory {
    /// Park map.
    pub has_map: bool,
    /// Umbrella.
    pub has_umbrella: bool,
    /// Food or a drink still being consumed.
    pub carrying_food_or_drink: bool,
    /// Free ride voucher for one ride.
    pub voucher: Option<RideId>,
    /// On-ride photos by photo slot.
    pub photos: [Option<RideId>; 4],
}

/// Point the guest walks towards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// Target x coordinate.
    pub x: i32,
    /// Target y coordinate.
    pub y: i32,
    /// Distance at which the target counts as reached.
    pub tolerance: u8,
}

impl Destination {
    /// Creates a destination.
    #[must_use]
    pub const fn new(x: i32, y: i32, tolerance: u8) -> Self {
        Self { x, y, tolerance }
    }
}

/// Seat handed to a guest during boarding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatAssignment {
    /// Train index.
    pub train: u8,
    /// Car index within the train.
    pub car: u8,
    /// Seat index within the car.
    pub seat: u8,
}

/// Progress along a loading waypoint set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaypointCursor {
    /// Waypoint set, chosen from seat segment and entrance or exit direction.
    pub set: u8,
    /// Waypoint within the set, `0..=3`.
    pub waypoint: u8,
}

/// Progress along the spiral slide walking path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlideCursor {
    /// Entrance or exit direction selecting the path.
    pub direction: u8,
    /// Rotation of the slide's start piece.
    pub rotation: u8,
    /// Waypoint within the path, `0..=3`.
    pub waypoint: u8,
}

impl SlideCursor {
    /// Index into the sixteen-entry-per-rotation walking path table.
    #[must_use]
    pub const fn path_index(self) -> usize {
        (self.rotation as usize & 3) * 16 + (self.direction as usize & 3) * 4 + (self.waypoint as usize & 3)
    }
}

/// Phase of a guest going down the spiral slide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlidePhase {
    /// Climbing the tower stairs.
    Climbing {
        /// Ticks spent climbing.
        ticks: u8,
    },
    /// Waiting at the top for the slide to free up.
    AwaitingSlide,
    /// Going down.
    Sliding,
    /// Reached the bottom.
    Landing,
    /// Walking from the landing back to the platform.
    WalkingOff,
}

/// Spiral slide state while the guest is off the walking path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlideRun {
    /// Rotation of the slide's start piece.
    pub rotation: u8,
    /// Current phase.
    pub phase: SlidePhase,
}

/// Progress through a maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MazeCursor {
    /// Wandering between hedge cells.
    Wandering {
        /// Quadrant of the tile the guest stands in.
        quadrant: u8,
        /// Edge taken to reach the current cell.
        last_edge: u8,
    },
    /// Standing on the exit axis.
    ExitReached {
        /// Edge taken to reach the exit.
        last_edge: u8,
    },
}

/// Position of a guest within the ride engagement state machine.
///
/// Each variant carries only the scratch data meaningful in that sub-state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideSubState {
    /// Not engaged with any ride.
    #[default]
    None,
    /// Walking along the queue path.
    InQueue,
    /// At the front of the queue, walking up to the entrance.
    AtEntrance,
    /// Walking through the entrance building.
    InEntrance,
    /// Looking for a free vehicle.
    FreeVehicleCheck,
    /// Stepping out of the entrance onto the platform.
    LeaveEntrance,
    /// Walking to the assigned car.
    ApproachVehicle,
    /// Climbing into the car.
    EnterVehicle,
    /// Riding.
    OnRide,
    /// Climbing out of the car.
    LeaveVehicle,
    /// Walking to the exit building.
    ApproachExit,
    /// Walking through the exit building.
    InExit,
    /// Stepping out onto the footpath.
    LeaveExit,
    /// Walking boarding waypoints around the vehicle.
    ApproachVehicleWaypoints(WaypointCursor),
    /// Walking exit waypoints away from the vehicle.
    ApproachExitWaypoints(WaypointCursor),
    /// Walking the spiral slide path towards the tower.
    ApproachSpiralSlide(SlideCursor),
    /// Climbing, sliding or landing.
    OnSpiralSlide(SlideRun),
    /// Walking the spiral slide path towards the exit.
    LeaveSpiralSlide(SlideCursor),
    /// Walking the maze.
    MazePathfinding(MazeCursor),
    /// Walking up to a facility counter.
    ApproachShop,
    /// Using a facility.
    InteractShop,
    /// Walking away from a facility.
    LeaveShop,
}

/// Rides and ride types a guest has been on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RideMemory {
    rides: BTreeSet<RideId>,
    ride_types: BTreeSet<RideTypeId>,
}

impl RideMemory {
    /// Creates an empty memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rides: BTreeSet::new(),
            ride_types: BTreeSet::new(),
        }
    }

    /// Records a ride and its type.
    pub fn record(&mut self, ride: RideId, ride_type: RideTypeId) {
        let _ = self.rides.insert(ride);
        let _ = self.ride_types.insert(ride_type);
    }

    /// Reports whether the guest has been on `ride`.
    #[must_use]
    pub fn has_ridden(&self, ride: RideId) -> bool {
        self.rides.contains(&ride)
    }

    /// Reports whether the guest has been on a ride of `ride_type`.
    #[must_use]
    pub fn has_ridden_type(&self, ride_type: RideTypeId) -> bool {
        self.ride_types.contains(&ride_type)
    }

    /// Forgets `ride`. The type memory stays since other rides may share it.
    pub fn forget(&mut self, ride: RideId) {
        let _ = self.rides.remove(&ride);
    }

    /// Rides remembered, in id order.
    pub fn rides(&self) -> impl Iterator<Item = RideId> + '_ {
        self.rides.iter().copied()
    }
}

/// Simulated park visitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    /// Identifier of the guest.
    pub id: GuestId,
    /// Position in world units.
    pub position: Position,
    /// Point being walked to.
    pub destination: Destination,
    /// Top-level activity.
    pub state: GuestState,
    /// Engagement sub-state.
    pub sub_state: RideSubState,
    /// Ride being engaged with.
    pub current_ride: Option<RideId>,
    /// Station of the current ride.
    pub current_station: StationIndex,
    /// Seat held while boarding or riding.
    pub seat: Option<SeatAssignment>,
    /// Guest queued just before this one.
    pub next_in_queue: Option<GuestId>,
    /// Current happiness.
    pub happiness: u8,
    /// Happiness the guest drifts towards.
    pub happiness_target: u8,
    /// Current nausea.
    pub nausea: u8,
    /// Nausea the guest drifts towards.
    pub nausea_target: u8,
    /// Fullness; low values mean hungry.
    pub hunger: u8,
    /// Hydration; low values mean thirsty.
    pub thirst: u8,
    /// Need for a toilet.
    pub toilet: u8,
    /// Energy.
    pub energy: u8,
    /// Preferred ride intensity.
    pub intensity: IntensityPreference,
    /// Nausea tolerance.
    pub nausea_tolerance: NauseaTolerance,
    /// Cash in pocket.
    pub cash: Money,
    /// Cash spent in the park.
    pub cash_spent: Money,
    /// Cash spent on ride admissions.
    pub paid_on_rides: Money,
    /// Carried items.
    pub inventory: Inventory,
    /// Ticks spent in the current queue.
    pub time_in_queue: u16,
    /// Days spent in the current queue, saturating.
    pub days_in_queue: u8,
    /// Ride the guest has committed to.
    pub heading_to: Option<RideId>,
    /// Ticks before a lost guest gives up looking.
    pub lost_countdown: u8,
    /// Ticks spent lost.
    pub time_lost: u8,
    /// Favourite ride.
    pub favourite_ride: Option<RideId>,
    /// Rating that made the favourite ride the favourite.
    pub favourite_ride_rating: u8,
    /// Ride most recently declined or used.
    pub previous_ride: Option<RideId>,
    /// Ticks since the previous ride was set.
    pub previous_ride_timeout: u16,
    /// Rides ridden, capped at 255.
    pub rides_ridden: u8,
    /// Status markers.
    pub flags: GuestFlags,
    /// Recent thoughts.
    pub thoughts: ThoughtBuffer,
    /// Ticks spent waiting for a vehicle before returning to the queue.
    pub rejoin_queue_timeout: u8,
    /// Ticks on the current ride.
    pub time_on_ride: u8,
    /// Body mass, added to the car.
    pub mass: u8,
    /// Shirt colour shown in the seat.
    pub tshirt_colour: u8,
    /// Frame counter of the dismount animation.
    pub dismount_frame: u8,
    /// Facing in 32 steps.
    pub sprite_direction: u8,
    /// Special sprite shown on particular rides.
    pub special_sprite: u8,
    /// Descents completed on the current slide visit.
    pub slide_descents: u8,
    /// Ride whose exit hooks are still owed.
    pub pending_exit: Option<RideId>,
}

impl Guest {
    /// Creates a content, unremarkable walking guest.
    #[must_use]
    pub fn new(id: GuestId, position: Position) -> Self {
        Self {
            id,
            position,
            destination: Destination::new(position.x, position.y, 0),
            state: GuestState::Walking,
            sub_state: RideSubState::None,
            current_ride: None,
            current_station: StationIndex::default(),
            seat: None,
            next_in_queue: None,
            happiness: 128,
            happiness_target: 128,
            nausea: 0,
            nausea_target: 0,
            hunger: 128,
            thirst: 128,
            toilet: 0,
            energy: 128,
            intensity: IntensityPreference::new(0, 15),
            nausea_tolerance: NauseaTolerance::Average,
            cash: Money::ZERO,
            cash_spent: Money::ZERO,
            paid_on_rides: Money::ZERO,
            inventory: Inventory::default(),
            time_in_queue: 0,
            days_in_queue: 0,
            heading_to: None,
            lost_countdown: 0,
            time_lost: 0,
            favourite_ride: None,
            favourite_ride_rating: 0,
            previous_ride: None,
            previous_ride_timeout: 0,
            rides_ridden: 0,
            flags: GuestFlags::empty(),
            thoughts: ThoughtBuffer::new(),
            rejoin_queue_timeout: 0,
            time_on_ride: 0,
            mass: 60,
            tshirt_colour: 0,
            dismount_frame: 0,
            sprite_direction: 0,
            special_sprite: 0,
            slide_descents: 0,
            pending_exit: None,
        }
    }

    /// Reports whether the guest is leaving the park.
    #[must_use]
    pub const fn is_leaving_park(&self) -> bool {
        self.flags.contains(GuestFlags::LEAVING_PARK)
    }

    /// Reports whether the guest holds a voucher for `ride`.
    #[must_use]
    pub fn has_voucher_for(&self, ride: RideId) -> bool {
        self.inventory.voucher == Some(ride)
    }

    /// Moves the happiness target by `delta`, clamped to `0..=255`.
    pub fn adjust_happiness_target(&mut self, delta: i32) {
        self.happiness_target = clamp_u8(i32::from(self.happiness_target) + delta);
    }

    /// Lowers the happiness target by `amount` when it is at least `floor`.
    pub fn lower_happiness_target(&mut self, amount: u8, floor: u8) {
        if self.happiness_target >= floor {
            self.happiness_target = self.happiness_target.saturating_sub(amount);
        }
    }

    /// Raises current and target happiness together, capped at 255.
    pub fn cheer(&mut self, amount: u8) {
        self.happiness_target = self.happiness_target.saturating_add(amount);
        self.happiness = self.happiness_target;
    }

    /// Spends `amount` from the pocket.
    pub fn spend(&mut self, amount: Money) {
        self.cash -= amount;
        self.cash_spent += amount;
    }
}

/// Clamps an intermediate value into the `u8` range.
#[must_use]
pub fn clamp_u8(value: i32) -> u8 {
    u8::try_from(value.clamp(0, i32::from(u8::MAX))).unwrap_or(u8::MAX)
}
