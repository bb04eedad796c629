use park_sim_core::{
    Command, Direction, Event, Guest, GuestId, GuestState, Money, Position, Ride, RideId, RideKind,
    RideRatings, RideStatus, RideSubState, RideTypeDescriptor, RideTypeId, SlidePhase,
    StationGeometry, StationIndex, TileCoords, TileLocation,
};
use park_sim_world::{self as world, query, ParkLayout, World, WorldConfig};

const SLIDE: RideId = RideId::new(6);
const STATION: StationIndex = StationIndex::new(0);

fn tile(x: i32, y: i32, direction: u8) -> TileLocation {
    TileLocation {
        tile: TileCoords::new(x, y),
        z: 0,
        direction: Direction::new(direction),
    }
}

/// Tower on tile (20, 2), entered from the north and left to the east.
fn layout() -> ParkLayout {
    let mut layout = ParkLayout::new();
    layout.set_station(
        SLIDE,
        STATION,
        StationGeometry {
            entrance: tile(20, 1, 1),
            exit: tile(22, 2, 0),
            start: TileCoords::new(20, 2),
            height: 0,
            track_direction: Direction::new(0),
        },
    );
    layout
}

fn slide() -> Ride {
    let mut ride = Ride::new(
        SLIDE,
        "Helter Skelter",
        RideTypeDescriptor::new(RideTypeId::new(40), RideKind::SpiralSlide),
    );
    ride.status = RideStatus::Open;
    ride.ratings = Some(RideRatings::new(150, 140, 90));
    ride.operation_option = 2;
    ride
}

fn slider(id: u32, y: i32) -> Guest {
    let mut guest = Guest::new(GuestId::new(id), Position::new(656, y, 0));
    guest.cash = Money::new(20, 0);
    guest
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn sliding(guest: &Guest) -> bool {
    matches!(
        guest.sub_state,
        RideSubState::OnSpiralSlide(run) if run.phase == SlidePhase::Sliding
    )
}

fn awaiting(guest: &Guest) -> bool {
    matches!(
        guest.sub_state,
        RideSubState::OnSpiralSlide(run) if run.phase == SlidePhase::AwaitingSlide
    )
}

struct Visit {
    events: Vec<Event>,
    waited_for_slide: bool,
}

/// Sends two guests up the tower one behind the other and runs until both have left.
fn visit(seed: u64) -> Visit {
    let mut world = World::with_layout(WorldConfig::new(seed), layout());
    let _ = run(&mut world, Command::AddRide { ride: Box::new(slide()) });
    let mut events = Vec::new();
    for (id, y, via_queue) in [(1, 26, false), (2, -14, true)] {
        world::apply(&mut world, Command::AddGuest { guest: Box::new(slider(id, y)) }, &mut events);
        world::apply(
            &mut world,
            Command::ArriveAtRide {
                guest: GuestId::new(id),
                ride: SLIDE,
                station: STATION,
                via_queue,
            },
            &mut events,
        );
    }
    assert!(
        events.contains(&Event::EngagementDecided {
            guest: GuestId::new(2),
            ride: SLIDE,
            accepted: true,
        }),
        "second guest did not queue: {events:?}"
    );

    let mut waited_for_slide = false;
    for _ in 0..20_000 {
        world::apply(&mut world, Command::Tick, &mut events);
        let guests = query::guest_view(&world).into_vec();
        let riders: Vec<&Guest> = [1, 2]
            .into_iter()
            .filter_map(|id| query::guest(&world, GuestId::new(id)))
            .collect();
        let on_slide = riders.iter().filter(|guest| sliding(guest)).count();
        assert!(on_slide <= 1, "two guests on the slide at once");
        let slide = query::ride(&world, SLIDE).expect("slide exists");
        if on_slide == 1 {
            assert!(slide.slide.occupant.is_some());
            waited_for_slide |= riders.iter().any(|guest| awaiting(guest));
        }
        let done = guests
            .iter()
            .all(|guest| guest.state == GuestState::Walking && guest.current_ride.is_none());
        if done {
            for _ in 0..50 {
                world::apply(&mut world, Command::Tick, &mut events);
            }
            let slide = query::ride(&world, SLIDE).expect("slide exists");
            assert_eq!(slide.total_customers, 2);
            assert_eq!(slide.current_customers, 0);
            assert_eq!(slide.num_riders, 0);
            assert_eq!(slide.slide.occupant, None);
            return Visit {
                events,
                waited_for_slide,
            };
        }
    }
    panic!("guests never came down from the slide (seed {seed})");
}

fn climbs(events: &[Event], guest: GuestId) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::SubStateChanged {
                    guest: who,
                    to: RideSubState::OnSpiralSlide(_),
                    ..
                } if *who == guest
            )
        })
        .count()
}

#[test]
fn slide_is_taken_one_guest_at_a_time() {
    let mut most_climbs = 0;
    for seed in [3, 11, 29, 64] {
        let visit = visit(seed);
        assert!(visit.waited_for_slide, "seed {seed}: nobody queued at the top");

        for id in [1, 2] {
            let guest = GuestId::new(id);
            let entered = visit
                .events
                .iter()
                .filter(|event| matches!(event, Event::GuestEnteredRide { guest: who, .. } if *who == guest))
                .count();
            let exited = visit
                .events
                .iter()
                .filter(|event| matches!(event, Event::GuestExitedRide { guest: who, .. } if *who == guest))
                .count();
            assert_eq!((entered, exited), (1, 1), "seed {seed}, guest {id}");

            let up = climbs(&visit.events, guest);
            assert!(up >= 1, "seed {seed}: guest {id} never climbed");
            most_climbs = most_climbs.max(up);
        }
        assert!(visit.events.iter().any(|event| matches!(
            event,
            Event::SubStateChanged {
                to: RideSubState::LeaveSpiralSlide(_),
                ..
            }
        )));
    }
    assert!(most_climbs >= 2, "nobody went down the slide twice");
}

#[test]
fn closed_slide_sends_guests_off_after_one_go() {
    let mut world = World::with_layout(WorldConfig::new(5), layout());
    let _ = run(&mut world, Command::AddRide { ride: Box::new(slide()) });
    let _ = run(&mut world, Command::AddGuest { guest: Box::new(slider(1, 26)) });
    let _ = run(
        &mut world,
        Command::ArriveAtRide {
            guest: GuestId::new(1),
            ride: SLIDE,
            station: STATION,
            via_queue: false,
        },
    );

    let mut events = Vec::new();
    for _ in 0..5_000 {
        world::apply(&mut world, Command::Tick, &mut events);
        let guest = query::guest(&world, GuestId::new(1)).expect("guest exists");
        if sliding(guest) {
            break;
        }
    }
    assert!(sliding(query::guest(&world, GuestId::new(1)).expect("guest exists")));
    let _ = run(
        &mut world,
        Command::SetRideStatus {
            ride: SLIDE,
            status: RideStatus::Closed,
        },
    );

    for _ in 0..5_000 {
        world::apply(&mut world, Command::Tick, &mut events);
        let guest = query::guest(&world, GuestId::new(1)).expect("guest exists");
        if guest.state == GuestState::Walking {
            break;
        }
    }

    assert_eq!(climbs(&events, GuestId::new(1)), 1);
    let exited = events
        .iter()
        .filter(|event| matches!(event, Event::GuestExitedRide { ride: SLIDE, .. }))
        .count();
    assert_eq!(exited, 1);
    let guest = query::guest(&world, GuestId::new(1)).expect("guest exists");
    assert_eq!(guest.state, GuestState::Walking);
    assert_eq!(guest.current_ride, None);
}
