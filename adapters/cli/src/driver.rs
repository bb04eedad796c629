//! Stand-in for the pathfinding and vehicle subsystems the engine expects
//! around it.
//!
//! The driver turns trains through a fixed load/travel/unload cycle and gives
//! idle guests something to do: walking guests with a destination arrive at it
//! straight away, everyone else periodically looks after their needs or picks
//! a ride.

use std::collections::BTreeMap;

use park_sim_core::{
    Command, Event, GuestId, GuestState, Money, Need, RideCapabilities, RideId, StationIndex,
    TrainStatus,
};
use park_sim_world::{self as world, query, World};

/// Ticks a train waits in the station for passengers.
const LOADING_TICKS: u32 = 120;
/// Ticks between a train departing and it reaching the station again.
const CIRCUIT_TICKS: u32 = 300;
/// Ticks riders get to climb out before the next train pulls in.
const UNLOADING_TICKS: u32 = 60;
/// Ticks between two decisions of the same guest.
const DECISION_INTERVAL: u64 = 48;
/// Ticks between two attempts to reach the ride a guest heads for.
const ARRIVAL_INTERVAL: u64 = 8;

const STATION: StationIndex = StationIndex::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Loading,
    Departing,
    Circuit,
    Unloading,
}

/// One ride's trains taking turns in its only station.
#[derive(Clone, Debug)]
struct TrainCycle {
    trains: u8,
    train: u8,
    phase: Phase,
    remaining: u32,
}

impl TrainCycle {
    fn new(trains: u8) -> Self {
        Self {
            trains,
            train: 0,
            phase: Phase::Loading,
            remaining: LOADING_TICKS,
        }
    }

    fn status(ride: RideId, train: u8, status: TrainStatus) -> Command {
        Command::SetTrainStatus {
            ride,
            train,
            status,
        }
    }

    fn advance(&mut self, ride: RideId, commands: &mut Vec<Command>) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return;
        }

        match self.phase {
            Phase::Loading => {
                commands.push(Self::status(
                    ride,
                    self.train,
                    TrainStatus::ReadyToDepart { station: STATION },
                ));
                self.phase = Phase::Departing;
                self.remaining = 1;
            }
            Phase::Departing => {
                commands.push(Self::status(ride, self.train, TrainStatus::Travelling));
                self.phase = Phase::Circuit;
                self.remaining = CIRCUIT_TICKS;
            }
            Phase::Circuit => {
                commands.push(Self::status(
                    ride,
                    self.train,
                    TrainStatus::Unloading { station: STATION },
                ));
                self.phase = Phase::Unloading;
                self.remaining = UNLOADING_TICKS;
            }
            Phase::Unloading => {
                commands.push(Self::status(ride, self.train, TrainStatus::Travelling));
                self.train = (self.train + 1) % self.trains;
                commands.push(Self::status(
                    ride,
                    self.train,
                    TrainStatus::WaitingForPassengers { station: STATION },
                ));
                self.phase = Phase::Loading;
                self.remaining = LOADING_TICKS;
            }
        }
    }
}

/// Issues the commands a real park would get from its other subsystems.
#[derive(Debug)]
pub(crate) struct Driver {
    cycles: BTreeMap<RideId, TrainCycle>,
    pending: Vec<Command>,
}

impl Driver {
    /// Prepares a cycle for every ride with trains and calls the first train in.
    pub(crate) fn new(world: &World) -> Self {
        let mut cycles = BTreeMap::new();
        let mut pending = Vec::new();
        for snapshot in query::ride_view(world).iter() {
            let Some(ride) = query::ride(world, snapshot.id) else {
                continue;
            };
            let Ok(trains) = u8::try_from(ride.trains.len()) else {
                log::warn!("{} has too many trains to drive", ride.name);
                continue;
            };
            if trains == 0 {
                continue;
            }
            let _ = cycles.insert(ride.id, TrainCycle::new(trains));
            pending.push(TrainCycle::status(
                ride.id,
                0,
                TrainStatus::WaitingForPassengers { station: STATION },
            ));
        }
        Self { cycles, pending }
    }

    /// Applies this tick's commands, then advances the world by one tick.
    pub(crate) fn step(&mut self, world: &mut World, events: &mut Vec<Event>) {
        let mut commands = std::mem::take(&mut self.pending);
        for (ride, cycle) in &mut self.cycles {
            cycle.advance(*ride, &mut commands);
        }
        commands.extend(intents(world));

        for command in commands {
            world::apply(world, command, events);
        }
        world::apply(world, Command::Tick, events);
    }
}

/// What every idle guest wants to do this tick.
fn intents(world: &World) -> Vec<Command> {
    let tick = query::tick(world);
    let mut commands = Vec::new();
    for snapshot in query::guest_view(world).iter() {
        if snapshot.state != GuestState::Walking || snapshot.current_ride.is_some() {
            continue;
        }
        let turn = tick.wrapping_add(u64::from(snapshot.id.get()));

        if let Some(ride) = snapshot.heading_to {
            if turn % ARRIVAL_INTERVAL == 0 {
                commands.push(arrive(world, snapshot.id, ride));
            }
            continue;
        }
        if turn % DECISION_INTERVAL == 0 {
            commands.push(decide(world, snapshot.id));
        }
    }
    commands
}

fn arrive(world: &World, guest: GuestId, ride: RideId) -> Command {
    let is_shop = query::ride(world, ride).is_some_and(|ride| ride.has(RideCapabilities::IS_SHOP));
    if is_shop {
        Command::VisitShop { guest, ride }
    } else {
        Command::ArriveAtRide {
            guest,
            ride,
            station: STATION,
            via_queue: true,
        }
    }
}

fn decide(world: &World, id: GuestId) -> Command {
    let Some(guest) = query::guest(world, id) else {
        return Command::PickRide { guest: id };
    };
    let need = if guest.toilet >= 70 {
        Some(Need::Toilet)
    } else if guest.nausea >= 128 {
        Some(Need::FirstAid)
    } else if guest.cash < Money::new(5, 0) && query::context(world).money_enabled() {
        Some(Need::CashMachine)
    } else if guest.hunger <= 75 && !guest.inventory.carrying_food_or_drink {
        Some(Need::Food)
    } else if guest.thirst <= 75 && !guest.inventory.carrying_food_or_drink {
        Some(Need::Drink)
    } else {
        None
    };
    match need {
        Some(need) => Command::HeadForNearest { guest: id, need },
        None => Command::PickRide { guest: id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    const MAZE_PARK: &str = r#"
        [[ride]]
        id = 2
        name = "Hedge Maze"
        kind = "Maze"
        price = 80
        ratings = { excitement = 240, intensity = 60, nausea = 20 }
        max_guests = 2
        entrance = { x = 1, y = 1, direction = 2 }
        exit = { x = 4, y = 1, direction = 2 }
        start = [2, 1]
        track = [[3, 1]]

        [[guest]]
        count = 3
        x = 16
        y = 16
        cash = 2000
    "#;

    fn collect(cycle: &mut TrainCycle, ticks: u32) -> Vec<Command> {
        let mut commands = Vec::new();
        for _ in 0..ticks {
            cycle.advance(RideId::new(1), &mut commands);
        }
        commands
    }

    #[test]
    fn trains_take_turns_in_the_station() {
        let ride = RideId::new(1);
        let mut cycle = TrainCycle::new(2);
        let commands = collect(
            &mut cycle,
            LOADING_TICKS + 1 + CIRCUIT_TICKS + UNLOADING_TICKS,
        );

        assert_eq!(
            commands,
            vec![
                TrainCycle::status(ride, 0, TrainStatus::ReadyToDepart { station: STATION }),
                TrainCycle::status(ride, 0, TrainStatus::Travelling),
                TrainCycle::status(ride, 0, TrainStatus::Unloading { station: STATION }),
                TrainCycle::status(ride, 0, TrainStatus::Travelling),
                TrainCycle::status(
                    ride,
                    1,
                    TrainStatus::WaitingForPassengers { station: STATION }
                ),
            ]
        );
        assert_eq!(cycle.train, 1);
        assert_eq!(cycle.phase, Phase::Loading);
    }

    #[test]
    fn a_single_train_comes_back_to_load_again() {
        let mut cycle = TrainCycle::new(1);
        let commands = collect(
            &mut cycle,
            LOADING_TICKS + 1 + CIRCUIT_TICKS + UNLOADING_TICKS,
        );
        assert_eq!(
            commands.last(),
            Some(&TrainCycle::status(
                RideId::new(1),
                0,
                TrainStatus::WaitingForPassengers { station: STATION }
            ))
        );
    }

    #[test]
    fn guests_find_and_finish_the_maze() {
        let scenario = Scenario::parse(MAZE_PARK).expect("scenario parses");
        let mut world = scenario.build(3).expect("scenario builds");
        let mut driver = Driver::new(&world);
        let mut events = Vec::new();
        for _ in 0..6_000 {
            driver.step(&mut world, &mut events);
        }

        assert_eq!(query::tick(&world), 6_000);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::HeadingChanged { ride: Some(_), .. })));
        let maze = query::ride(&world, RideId::new(2)).expect("maze exists");
        assert!(maze.total_customers > 0, "nobody walked the maze");
        assert!(maze.num_riders <= u16::from(maze.operation_option));
        assert!(maze.income.is_positive());
    }
}
