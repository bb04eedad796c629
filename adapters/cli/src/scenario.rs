//! Scenario files describing the park a run starts from.
//!
//! A scenario lists the park rules, the rides with their station geometry and
//! trains, and the guests (optionally replicated with `count`). Rides are given
//! as `[[ride]]` tables and guests as `[[guest]]` tables.

use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use park_sim_core::{
    Car, Cheats, Command, Direction, Event, Guest, GuestId, IntensityPreference, LifecycleFlags,
    Money, NauseaTolerance, ParkFlags, Position, Ride, RideCapabilities, RideId, RideKind,
    RideMode, RideRatings, RideStatus, RideTypeDescriptor, RideTypeId, SimulationContext,
    StationGeometry, StationIndex, TileCoords, TileElement, TileLocation, Train, Weather,
};
use park_sim_world::{self as world, ParkLayout, World, WorldConfig};
use serde::{Deserialize, Serialize};

/// Complete description of a park to simulate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Park-wide rules.
    #[serde(default)]
    pub(crate) park: ParkSettings,
    /// Rides and facilities.
    #[serde(default, rename = "ride")]
    pub(crate) rides: Vec<RideSpec>,
    /// Guest groups.
    #[serde(default, rename = "guest")]
    pub(crate) guests: Vec<GuestSpec>,
}

/// Park rules and weather.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ParkSettings {
    pub(crate) no_money: bool,
    pub(crate) prefer_less_intense_rides: bool,
    pub(crate) ignore_ride_intensity: bool,
    pub(crate) raining: bool,
}

/// Tile reference with a facing, used for entrances and exits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TileSpec {
    pub(crate) x: i32,
    pub(crate) y: i32,
    #[serde(default)]
    pub(crate) direction: u8,
}

impl TileSpec {
    fn location(self, height: i32) -> TileLocation {
        TileLocation {
            tile: TileCoords::new(self.x, self.y),
            z: height,
            direction: Direction::new(self.direction),
        }
    }
}

/// One ride or facility. Prices are in cents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RideSpec {
    pub(crate) id: u16,
    pub(crate) name: String,
    pub(crate) kind: RideKind,
    #[serde(default)]
    pub(crate) type_id: Option<u8>,
    #[serde(default)]
    pub(crate) mode: RideMode,
    #[serde(default = "enabled")]
    pub(crate) open: bool,
    #[serde(default)]
    pub(crate) price: Money,
    #[serde(default)]
    pub(crate) value: Option<Money>,
    #[serde(default)]
    pub(crate) ratings: Option<RideRatings>,
    /// Guests allowed inside at once on rides without vehicles.
    #[serde(default)]
    pub(crate) max_guests: u8,
    #[serde(default)]
    pub(crate) photo_slot: Option<u8>,
    #[serde(default)]
    pub(crate) photo_price: Money,
    #[serde(default)]
    pub(crate) trains: u8,
    #[serde(default)]
    pub(crate) cars_per_train: u8,
    #[serde(default)]
    pub(crate) seats_per_car: u8,
    pub(crate) entrance: TileSpec,
    pub(crate) exit: TileSpec,
    pub(crate) start: [i32; 2],
    #[serde(default)]
    pub(crate) height: i32,
    #[serde(default)]
    pub(crate) track_direction: u8,
    /// Extra track tiles besides `start`.
    #[serde(default)]
    pub(crate) track: Vec<[i32; 2]>,
}

const fn enabled() -> bool {
    true
}

impl RideSpec {
    fn id(&self) -> RideId {
        RideId::new(self.id)
    }

    fn geometry(&self) -> StationGeometry {
        StationGeometry {
            entrance: self.entrance.location(self.height),
            exit: self.exit.location(self.height),
            start: TileCoords::new(self.start[0], self.start[1]),
            height: self.height,
            track_direction: Direction::new(self.track_direction),
        }
    }

    fn ride(&self) -> Ride {
        let type_id = self
            .type_id
            .unwrap_or_else(|| u8::try_from(self.id).unwrap_or(u8::MAX));
        let mut descriptor = RideTypeDescriptor::new(RideTypeId::new(type_id), self.kind);
        if let Some(slot) = self.photo_slot {
            descriptor = descriptor.with_photo_slot(slot);
        }

        let mut ride = Ride::new(self.id(), self.name.clone(), descriptor);
        ride.status = if self.open {
            RideStatus::Open
        } else {
            RideStatus::Closed
        };
        ride.mode = self.mode;
        ride.price = self.price;
        ride.secondary_price = self.photo_price;
        ride.value = self.value;
        ride.ratings = self.ratings;
        ride.operation_option = self.max_guests;
        if self.photo_slot.is_some() {
            ride.lifecycle.insert(LifecycleFlags::ON_RIDE_PHOTO);
        }
        ride.trains = (0..self.trains)
            .map(|_| {
                Train::new(
                    (0..self.cars_per_train)
                        .map(|_| Car::new(0, self.seats_per_car, false))
                        .collect(),
                )
            })
            .collect();
        ride
    }
}

/// A group of identical guests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GuestSpec {
    #[serde(default = "one")]
    pub(crate) count: u32,
    pub(crate) x: i32,
    pub(crate) y: i32,
    #[serde(default)]
    pub(crate) cash: Money,
    #[serde(default = "neutral")]
    pub(crate) happiness: u8,
    #[serde(default)]
    pub(crate) nausea: u8,
    #[serde(default = "neutral")]
    pub(crate) hunger: u8,
    #[serde(default = "neutral")]
    pub(crate) thirst: u8,
    #[serde(default)]
    pub(crate) toilet: u8,
    #[serde(default = "neutral")]
    pub(crate) energy: u8,
    #[serde(default = "full_intensity_range")]
    pub(crate) intensity: [u8; 2],
    #[serde(default)]
    pub(crate) nausea_tolerance: NauseaTolerance,
    #[serde(default = "enabled")]
    pub(crate) has_map: bool,
}

const fn one() -> u32 {
    1
}

const fn neutral() -> u8 {
    128
}

const fn full_intensity_range() -> [u8; 2] {
    [0, 15]
}

impl GuestSpec {
    fn guest(&self, id: GuestId, spacing: i32) -> Guest {
        let mut guest = Guest::new(id, Position::new(self.x + spacing, self.y, 0));
        guest.cash = self.cash;
        guest.happiness = self.happiness;
        guest.happiness_target = self.happiness;
        guest.nausea = self.nausea;
        guest.nausea_target = self.nausea;
        guest.hunger = self.hunger;
        guest.thirst = self.thirst;
        guest.toilet = self.toilet;
        guest.energy = self.energy;
        guest.intensity = IntensityPreference::new(self.intensity[0], self.intensity[1]);
        guest.nausea_tolerance = self.nausea_tolerance;
        guest.inventory.has_map = self.has_map;
        guest.tshirt_colour = u8::try_from(id.get() % 32).unwrap_or(0);
        guest
    }
}

impl Scenario {
    /// Reads and validates a TOML scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read scenario {}", path.display()))?;
        let scenario = Self::parse(&text)
            .with_context(|| format!("could not parse scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Parses and validates a TOML scenario.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Rejects scenarios the world could not run.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for ride in &self.rides {
            if !seen.insert(ride.id) {
                bail!("ride id {} is used more than once", ride.id);
            }
            let capabilities = ride.kind.default_capabilities();
            let needs_vehicles = !capabilities
                .intersects(RideCapabilities::NO_VEHICLES.union(RideCapabilities::IS_SHOP));
            if needs_vehicles && (ride.trains == 0 || ride.cars_per_train == 0) {
                bail!("ride '{}' needs at least one train with cars", ride.name);
            }
            if needs_vehicles && ride.seats_per_car == 0 {
                bail!("ride '{}' has cars without seats", ride.name);
            }
            if ride.kind == RideKind::Maze && ride.max_guests == 0 {
                bail!("maze '{}' must admit at least one guest", ride.name);
            }
        }
        if self.guests.iter().map(|group| u64::from(group.count)).sum::<u64>() > u64::from(u32::MAX)
        {
            bail!("too many guests");
        }
        Ok(())
    }

    /// Settings every decision in the run reads.
    pub(crate) fn context(&self) -> SimulationContext {
        let mut park = ParkFlags::empty();
        park.set(ParkFlags::NO_MONEY, self.park.no_money);
        park.set(
            ParkFlags::PREFER_LESS_INTENSE_RIDES,
            self.park.prefer_less_intense_rides,
        );
        SimulationContext {
            park,
            cheats: Cheats {
                ignore_ride_intensity: self.park.ignore_ride_intensity,
            },
            weather: Weather {
                raining: self.park.raining,
            },
            ..SimulationContext::default()
        }
    }

    /// Station geometry and track tiles of every ride.
    pub(crate) fn layout(&self) -> ParkLayout {
        let mut layout = ParkLayout::new();
        for spec in &self.rides {
            let ride = spec.id();
            layout.set_station(ride, StationIndex::new(0), spec.geometry());
            let start = std::iter::once(spec.start);
            for [x, y] in start.chain(spec.track.iter().copied()) {
                layout.place(
                    TileCoords::new(x, y),
                    spec.height,
                    TileElement::Track {
                        ride,
                        maze_entry: 0,
                    },
                );
            }
            if spec.kind == RideKind::Maze {
                layout.place(
                    TileCoords::new(spec.exit.x, spec.exit.y),
                    spec.height,
                    TileElement::RideExit { ride },
                );
            }
        }
        layout
    }

    /// Every guest of the scenario, numbered from one.
    pub(crate) fn guests(&self) -> Vec<Guest> {
        let mut guests = Vec::new();
        let mut next = 1_u32;
        for group in &self.guests {
            for index in 0..group.count {
                let spacing = i32::try_from(index).unwrap_or(i32::MAX / 16) * 16;
                guests.push(group.guest(GuestId::new(next), spacing));
                next = next.saturating_add(1);
            }
        }
        guests
    }

    /// Builds a world holding the scenario's park.
    pub(crate) fn build(&self, seed: u64) -> Result<World> {
        let mut world = World::with_layout(WorldConfig::new(seed), self.layout());
        let mut commands = vec![Command::ConfigureContext {
            context: self.context(),
        }];
        commands.extend(self.rides.iter().map(|spec| Command::AddRide {
            ride: Box::new(spec.ride()),
        }));
        commands.extend(
            self.guests()
                .into_iter()
                .map(|guest| Command::AddGuest {
                    guest: Box::new(guest),
                }),
        );

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut world, command, &mut events);
            for event in events.drain(..) {
                if let Event::CommandRejected { error } = event {
                    bail!("scenario could not be loaded: {error}");
                }
            }
        }
        log::info!(
            "loaded park with {} rides and {} guests",
            self.rides.len(),
            self.guests.iter().map(|group| group.count).sum::<u32>()
        );
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_world::query;

    const DEMO: &str = include_str!("../scenarios/demo.toml");

    #[test]
    fn demo_scenario_builds_a_world() {
        let scenario = Scenario::parse(DEMO).expect("demo parses");
        let world = scenario.build(7).expect("demo builds");

        let rides = query::ride_view(&world);
        assert_eq!(rides.iter().count(), scenario.rides.len());
        let guests = scenario.guests.iter().map(|group| group.count).sum::<u32>();
        assert_eq!(
            query::guest_view(&world).iter().count(),
            usize::try_from(guests).expect("fits")
        );
        let coaster = query::ride(&world, RideId::new(1)).expect("coaster loaded");
        assert_eq!(coaster.trains.len(), 2);
        assert_eq!(coaster.price, Money::new(2, 50));
    }

    #[test]
    fn duplicate_ride_ids_are_rejected() {
        let text = r#"
            [[ride]]
            id = 1
            name = "Toilets"
            kind = "Toilets"
            entrance = { x = 0, y = 0 }
            exit = { x = 0, y = 0 }
            start = [0, 1]

            [[ride]]
            id = 1
            name = "Cash Machine"
            kind = "CashMachine"
            entrance = { x = 2, y = 0 }
            exit = { x = 2, y = 0 }
            start = [2, 1]
        "#;
        let error = Scenario::parse(text).expect_err("duplicate id");
        assert!(error.to_string().contains("used more than once"));
    }

    #[test]
    fn tracked_rides_need_trains() {
        let text = r#"
            [[ride]]
            id = 3
            name = "Coaster"
            kind = "Tracked"
            entrance = { x = 0, y = 0 }
            exit = { x = 0, y = 2 }
            start = [1, 1]
        "#;
        let error = Scenario::parse(text).expect_err("no trains");
        assert!(error.to_string().contains("needs at least one train"));
    }

    #[test]
    fn park_settings_reach_the_context() {
        let scenario = Scenario {
            park: ParkSettings {
                no_money: true,
                raining: true,
                ..ParkSettings::default()
            },
            rides: Vec::new(),
            guests: Vec::new(),
        };
        let context = scenario.context();
        assert!(!context.money_enabled());
        assert!(context.weather.raining);
        assert!(!context.cheats.ignore_ride_intensity);
    }
}
