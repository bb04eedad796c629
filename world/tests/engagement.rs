use park_sim_core::{
    Command, CommandError, Direction, Event, Guest, GuestId, GuestState, Money, Position, Ride,
    RideId, RideKind, RideRatings, RideStatus, RideTypeDescriptor, RideTypeId, SimulationContext,
    SoundCue, StationGeometry, StationIndex, Thought, ThoughtKind, TileCoords, TileElement,
    TileLocation,
};
use park_sim_world::{self as world, query, ParkLayout, World, WorldConfig};

const COASTER: RideId = RideId::new(1);
const MAZE: RideId = RideId::new(2);
const TOILETS: RideId = RideId::new(3);
const CASH_MACHINE: RideId = RideId::new(4);
const STATION: StationIndex = StationIndex::new(0);

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn tick(world: &mut World, ticks: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        world::apply(world, Command::Tick, &mut events);
    }
    events
}

fn guest_at(id: u32, x: i32, y: i32) -> Guest {
    let mut guest = Guest::new(GuestId::new(id), Position::new(x, y, 0));
    guest.cash = Money::new(20, 0);
    guest
}

fn arrive(guest: u32, ride: RideId, via_queue: bool) -> Command {
    Command::ArriveAtRide {
        guest: GuestId::new(guest),
        ride,
        station: STATION,
        via_queue,
    }
}

fn rated(id: RideId, name: &str, kind: RideKind) -> Ride {
    let mut ride = Ride::new(id, name, RideTypeDescriptor::new(RideTypeId::new(10), kind));
    ride.status = RideStatus::Open;
    ride.ratings = Some(RideRatings::new(250, 150, 50));
    ride
}

fn maze() -> Ride {
    let mut ride = rated(MAZE, "Hedge Maze", RideKind::Maze);
    ride.operation_option = 4;
    ride
}

fn facility(id: RideId, name: &str, kind: RideKind, price: Money) -> Ride {
    let mut ride = Ride::new(id, name, RideTypeDescriptor::new(RideTypeId::new(30), kind));
    ride.status = RideStatus::Open;
    ride.price = price;
    ride
}

fn tile(x: i32, y: i32, direction: u8) -> TileLocation {
    TileLocation {
        tile: TileCoords::new(x, y),
        z: 0,
        direction: Direction::new(direction),
    }
}

/// One open maze tile between an entrance to the west and the exit to the east.
fn park_layout() -> ParkLayout {
    let mut layout = ParkLayout::new();
    layout.set_station(
        MAZE,
        STATION,
        StationGeometry {
            entrance: tile(0, 1, 2),
            exit: tile(2, 1, 2),
            start: TileCoords::new(1, 1),
            height: 0,
            track_direction: Direction::new(2),
        },
    );
    layout.place(
        TileCoords::new(1, 1),
        0,
        TileElement::Track {
            ride: MAZE,
            maze_entry: 0,
        },
    );
    layout.place(TileCoords::new(2, 1), 0, TileElement::RideExit { ride: MAZE });
    layout.set_station(
        TOILETS,
        STATION,
        StationGeometry {
            entrance: tile(5, 4, 1),
            exit: tile(5, 4, 1),
            start: TileCoords::new(5, 5),
            height: 0,
            track_direction: Direction::new(1),
        },
    );
    layout
}

fn park() -> World {
    let mut world = World::with_layout(WorldConfig::new(11), park_layout());
    for ride in [
        rated(COASTER, "Wooden Coaster", RideKind::Tracked),
        maze(),
        facility(TOILETS, "Toilets", RideKind::Toilets, Money::new(0, 10)),
        facility(CASH_MACHINE, "Cash Machine", RideKind::CashMachine, Money::ZERO),
    ] {
        let _ = run(&mut world, Command::AddRide { ride: Box::new(ride) });
    }
    world
}

fn add_guest(world: &mut World, guest: Guest) {
    let events = run(world, Command::AddGuest { guest: Box::new(guest) });
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::CommandRejected { .. })),
        "guest rejected: {events:?}"
    );
}

fn guest(world: &World, id: u32) -> &Guest {
    query::guest(world, GuestId::new(id)).expect("guest exists")
}

fn ride(world: &World, id: RideId) -> &Ride {
    query::ride(world, id).expect("ride exists")
}

#[test]
fn removing_a_queued_guest_relinks_the_queue() {
    let mut world = park();
    for (id, x) in [(1, 0), (2, 100), (3, 200)] {
        add_guest(&mut world, guest_at(id, x, 0));
        let events = run(&mut world, arrive(id, COASTER, true));
        assert!(events.contains(&Event::QueueJoined {
            guest: GuestId::new(id),
            ride: COASTER,
            station: STATION,
            length: u16::try_from(id).expect("small id"),
        }));
    }
    assert_eq!(
        query::queue(&world, COASTER, STATION),
        vec![GuestId::new(3), GuestId::new(2), GuestId::new(1)]
    );

    let events = run(
        &mut world,
        Command::RemoveGuest {
            guest: GuestId::new(2),
        },
    );

    assert!(events.contains(&Event::QueueLeft {
        guest: GuestId::new(2),
        ride: COASTER,
        station: STATION,
        length: 2,
    }));
    assert!(events.contains(&Event::GuestRemoved {
        guest: GuestId::new(2)
    }));
    assert_eq!(
        query::queue(&world, COASTER, STATION),
        vec![GuestId::new(3), GuestId::new(1)]
    );
    assert_eq!(guest(&world, 3).next_in_queue, Some(GuestId::new(1)));
    assert!(query::memory(&world, GuestId::new(2)).is_none());
}

#[test]
fn unaffordable_ride_is_remembered_and_not_retried() {
    let mut world = park();
    let mut coaster = rated(RideId::new(9), "Looping Coaster", RideKind::Tracked);
    coaster.price = Money::new(5, 0);
    let _ = run(&mut world, Command::AddRide { ride: Box::new(coaster) });
    let mut poor = guest_at(1, 0, 0);
    poor.cash = Money::new(1, 0);
    add_guest(&mut world, poor);

    let events = run(&mut world, arrive(1, RideId::new(9), false));

    assert!(events.contains(&Event::EngagementDecided {
        guest: GuestId::new(1),
        ride: RideId::new(9),
        accepted: false,
    }));
    let poor = guest(&world, 1);
    assert_eq!(poor.previous_ride, Some(RideId::new(9)));
    assert_eq!(poor.state, GuestState::Walking);
    assert!(poor
        .thoughts
        .contains(ThoughtKind::CantAffordRide, Some(RideId::new(9))));

    let events = run(&mut world, arrive(1, RideId::new(9), false));
    assert!(events.contains(&Event::EngagementDecided {
        guest: GuestId::new(1),
        ride: RideId::new(9),
        accepted: false,
    }));
}

#[test]
fn busy_guests_reject_new_intents() {
    let mut world = park();
    add_guest(&mut world, guest_at(1, 0, 0));
    let _ = run(&mut world, arrive(1, COASTER, true));

    let events = run(&mut world, arrive(1, MAZE, false));

    assert_eq!(
        events,
        vec![Event::CommandRejected {
            error: CommandError::GuestBusy(GuestId::new(1))
        }]
    );
}

#[test]
fn shops_cannot_be_queued_for() {
    let mut world = park();
    add_guest(&mut world, guest_at(1, 0, 0));

    let events = run(&mut world, arrive(1, TOILETS, true));

    assert_eq!(
        events,
        vec![Event::CommandRejected {
            error: CommandError::IsAShop(TOILETS)
        }]
    );
}

#[test]
fn maze_visit_settles_exactly_once() {
    let mut world = park();
    add_guest(&mut world, guest_at(1, 16, 48));
    let events = run(&mut world, arrive(1, MAZE, false));
    assert!(events.contains(&Event::EngagementDecided {
        guest: GuestId::new(1),
        ride: MAZE,
        accepted: true,
    }));

    let mut log = Vec::new();
    for _ in 0..20_000 {
        log.extend(tick(&mut world, 1));
        let visitor = guest(&world, 1);
        if visitor.state == GuestState::Walking && visitor.current_ride.is_none() {
            break;
        }
    }
    log.extend(tick(&mut world, 50));

    let entered = log
        .iter()
        .filter(|event| matches!(event, Event::GuestEnteredRide { ride: MAZE, .. }))
        .count();
    let exited = log
        .iter()
        .filter(|event| matches!(event, Event::GuestExitedRide { ride: MAZE, .. }))
        .count();
    assert_eq!((entered, exited), (1, 1));

    let visitor = guest(&world, 1);
    assert_eq!(visitor.state, GuestState::Walking);
    assert_eq!(visitor.rides_ridden, 1);
    assert_eq!(visitor.pending_exit, None);
    let maze = ride(&world, MAZE);
    assert_eq!(maze.total_customers, 1);
    assert_eq!(maze.current_customers, 0);
    assert_eq!(maze.num_riders, 0);
    assert!(query::memory(&world, GuestId::new(1))
        .expect("memory kept")
        .has_ridden(MAZE));
}

#[test]
fn deleting_a_ride_ejects_and_forgets() {
    let mut world = park();
    add_guest(&mut world, guest_at(1, 16, 48));
    let mut fan = guest_at(2, 300, 300);
    fan.inventory.voucher = Some(MAZE);
    fan.inventory.photos[1] = Some(MAZE);
    fan.heading_to = Some(MAZE);
    fan.favourite_ride = Some(MAZE);
    fan.thoughts.insert(Thought::new(ThoughtKind::WasGreat, Some(MAZE)));
    add_guest(&mut world, fan);
    let _ = run(&mut world, arrive(1, MAZE, false));

    let events = run(&mut world, Command::DeleteRide { ride: MAZE });

    assert!(events.contains(&Event::GuestEjected {
        guest: GuestId::new(1),
        ride: MAZE,
    }));
    assert!(events.contains(&Event::HeadingChanged {
        guest: GuestId::new(2),
        ride: None,
    }));
    assert_eq!(events.last(), Some(&Event::RideDeleted { ride: MAZE }));
    assert!(query::ride(&world, MAZE).is_none());

    let ejected = guest(&world, 1);
    assert_eq!(ejected.state, GuestState::Walking);
    assert_eq!(ejected.current_ride, None);
    assert_eq!(ejected.next_in_queue, None);

    let fan = guest(&world, 2);
    assert_eq!(fan.inventory.voucher, None);
    assert_eq!(fan.inventory.photos, [None; 4]);
    assert_eq!(fan.heading_to, None);
    assert_eq!(fan.favourite_ride, None);
    assert!(!fan.thoughts.contains(ThoughtKind::WasGreat, Some(MAZE)));

    let later = tick(&mut world, 10);
    assert!(later
        .iter()
        .all(|event| matches!(event, Event::TimeAdvanced { .. })));
}

#[test]
fn deleting_a_stall_drops_item_thoughts_about_it() {
    let stall = RideId::new(42);
    let mut world = park();
    let _ = run(
        &mut world,
        Command::AddRide {
            ride: Box::new(facility(stall, "Burger Bar", RideKind::FoodStall, Money::new(1, 50))),
        },
    );
    let mut shopper = guest_at(1, 300, 300);
    shopper.thoughts.insert(Thought::new(ThoughtKind::AlreadyGot, Some(stall)));
    shopper.thoughts.insert(Thought::new(ThoughtKind::CantAffordItem, Some(stall)));
    shopper.thoughts.insert(Thought::new(ThoughtKind::WasGreat, Some(MAZE)));
    add_guest(&mut world, shopper);

    let events = run(&mut world, Command::DeleteRide { ride: stall });

    assert_eq!(events.last(), Some(&Event::RideDeleted { ride: stall }));
    let shopper = guest(&world, 1);
    assert!(shopper
        .thoughts
        .iter()
        .all(|thought| thought.ride != Some(stall)));
    assert!(shopper.thoughts.contains(ThoughtKind::WasGreat, Some(MAZE)));
}

#[test]
fn rain_sends_guests_to_covered_rides_only() {
    let ghost_train = RideId::new(7);
    let mut world = park();
    let mut covered = rated(ghost_train, "Ghost Train", RideKind::Tracked);
    covered.ratings = Some(RideRatings::new(500, 1200, 300));
    covered.sheltered_eighths = 8;
    let _ = run(&mut world, Command::AddRide { ride: Box::new(covered) });
    for id in 1..=3 {
        add_guest(&mut world, guest_at(id, 300, 300));
    }

    let dry = run(&mut world, arrive(1, ghost_train, false));
    assert!(dry.contains(&Event::EngagementDecided {
        guest: GuestId::new(1),
        ride: ghost_train,
        accepted: false,
    }));

    let mut wet = SimulationContext::default();
    wet.weather.raining = true;
    let _ = run(&mut world, Command::ConfigureContext { context: wet });

    let sheltered = run(&mut world, arrive(2, ghost_train, false));
    assert!(sheltered.contains(&Event::EngagementDecided {
        guest: GuestId::new(2),
        ride: ghost_train,
        accepted: true,
    }));
    assert_eq!(guest(&world, 2).state, GuestState::Queuing);

    let exposed = run(&mut world, arrive(3, COASTER, false));
    assert!(exposed.contains(&Event::EngagementDecided {
        guest: GuestId::new(3),
        ride: COASTER,
        accepted: false,
    }));
    assert!(guest(&world, 3)
        .thoughts
        .contains(ThoughtKind::NotWhileRaining, Some(COASTER)));
}

#[test]
fn toilet_visit_runs_the_facility_sub_path() {
    let mut world = park();
    let mut visitor = guest_at(1, 176, 144);
    visitor.toilet = 100;
    visitor.cash = Money::new(5, 0);
    visitor.thoughts.insert(Thought::new(ThoughtKind::Toilet, None));
    add_guest(&mut world, visitor);

    let events = run(
        &mut world,
        Command::VisitShop {
            guest: GuestId::new(1),
            ride: TOILETS,
        },
    );

    assert!(events.contains(&Event::ItemPurchased {
        guest: GuestId::new(1),
        ride: TOILETS,
        amount: Money::new(0, 10),
    }));
    assert_eq!(guest(&world, 1).state, GuestState::UsingShop);
    assert_eq!(ride(&world, TOILETS).current_customers, 1);

    let log = tick(&mut world, 400);

    let flushes = log
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::Sound {
                    cue: SoundCue::ToiletFlush,
                    ..
                }
            )
        })
        .count();
    assert_eq!(flushes, 1);
    let visitor = guest(&world, 1);
    assert_eq!(visitor.state, GuestState::Walking);
    assert_eq!(visitor.toilet, 0);
    assert_eq!(visitor.cash, Money::new(4, 90));
    assert_eq!(visitor.happiness, 158);
    assert!(!visitor.thoughts.contains(ThoughtKind::Toilet, None));
    let toilets = ride(&world, TOILETS);
    assert_eq!(toilets.total_customers, 1);
    assert_eq!(toilets.current_customers, 0);
    assert_eq!(toilets.income, Money::new(0, 10));
}

#[test]
fn cash_machine_is_used_once_in_a_row() {
    let mut world = park();
    let mut visitor = guest_at(1, 0, 0);
    visitor.cash = Money::new(1, 0);
    visitor.happiness = 255;
    add_guest(&mut world, visitor);
    let visit = Command::VisitShop {
        guest: GuestId::new(1),
        ride: CASH_MACHINE,
    };

    let events = run(&mut world, visit.clone());

    assert!(events.contains(&Event::CashWithdrawn {
        guest: GuestId::new(1),
        ride: CASH_MACHINE,
        amount: Money::new(50, 0),
    }));
    assert_eq!(guest(&world, 1).cash, Money::new(51, 0));

    let events = run(&mut world, visit);
    assert!(events.contains(&Event::EngagementDecided {
        guest: GuestId::new(1),
        ride: CASH_MACHINE,
        accepted: false,
    }));
    assert_eq!(guest(&world, 1).cash, Money::new(51, 0));
    assert_eq!(ride(&world, CASH_MACHINE).total_customers, 1);
}
