use park_sim_core::{
    Advance, Guest, GuestId, RideId, RideKind, RideMode, RideSubState, SlideCursor, SlidePhase,
    SlideRun, StationGeometry,
};
use rand::RngCore;

use super::{head_to, World};

/// Walking path around the slide tower, relative to the station start tile.
///
/// Indexed by [`SlideCursor::path_index`]: rotation, then direction, then waypoint.
#[rustfmt::skip]
const WALKING_PATH: [(i32, i32); 64] = [
    (56, 8), (8, 8), (8, 32), (32, 32),
    (8, 8), (8, 8), (8, 32), (32, 32),
    (8, 32), (8, 32), (8, 32), (32, 32),
    (8, 56), (8, 32), (8, 32), (32, 32),
    (56, 24), (32, 24), (32, 24), (32, 0),
    (56, -24), (56, 24), (32, 24), (32, 0),
    (8, 24), (32, 24), (32, 24), (32, 0),
    (32, 24), (32, 24), (32, 24), (32, 0),
    (24, 0), (24, 0), (24, 0), (0, 0),
    (24, -24), (24, 0), (24, 0), (0, 0),
    (-24, -24), (24, -24), (24, 0), (0, 0),
    (24, 24), (24, 0), (24, 0), (0, 0),
    (24, 8), (0, 8), (0, 8), (0, 32),
    (0, 8), (0, 8), (0, 8), (0, 32),
    (-24, 8), (0, 8), (0, 8), (0, 32),
    (-24, 56), (-24, 8), (0, 8), (0, 32),
];

/// Where the slide deposits a guest, per rotation.
const SLIDE_END: [(i32, i32); 4] = [(25, 56), (56, 7), (7, -24), (-24, 25)];

/// First stop after landing, per rotation.
const SLIDE_END_WAYPOINT: [(i32, i32); 4] = [(8, 56), (56, 24), (24, -24), (-24, 8)];

/// Ticks spent climbing the tower stairs.
const CLIMB_TICKS: u8 = 30;
/// Progress steps from the top of the slide to the bottom.
const SLIDE_LENGTH: u8 = 48;
/// Ticks per progress step.
const SLIDE_STEP_TICKS: u64 = 4;

fn path_point(start: StationGeometry, cursor: SlideCursor) -> (i32, i32) {
    let (x, y) = start.start.origin();
    let (dx, dy) = WALKING_PATH[cursor.path_index()];
    (x + dx, y + dy)
}

impl World {
    pub(super) fn enter_slide(&mut self, guest: &mut Guest, geometry: StationGeometry) {
        let Some(ride) = guest.current_ride else {
            return;
        };
        let cursor = SlideCursor {
            direction: geometry.entrance.direction.get(),
            rotation: geometry.track_direction.get(),
            waypoint: 0,
        };
        head_to(guest, path_point(geometry, cursor));
        guest.slide_descents = 0;

        if let Some(target) = self.rides.get_mut(&ride) {
            target.current_customers = target.current_customers.saturating_add(1);
        }
        self.on_enter_ride(guest, ride);
        self.set_sub_state(guest, RideSubState::ApproachSpiralSlide(cursor));
    }

    pub(super) fn update_approach_slide(&mut self, guest: &mut Guest, cursor: SlideCursor) {
        if let Advance::Moving { .. } = self.walk(guest) {
            return;
        }
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };
        let Some(ride) = self.rides.get(&ride_id) else {
            return;
        };

        match cursor.waypoint {
            3 => {
                let run = SlideRun {
                    rotation: cursor.rotation,
                    phase: SlidePhase::Climbing { ticks: 0 },
                };
                self.set_sub_state(guest, RideSubState::OnSpiralSlide(run));
                return;
            }
            2 => {
                let mut last_go = !ride.is_open();
                if !last_go {
                    let descents = guest.slide_descents;
                    guest.slide_descents = descents.wrapping_add(1);
                    if descents != 0 {
                        let single = ride.mode == RideMode::SingleRidePerAdmission;
                        let tired = u32::from(descents) > self.rng.next_u32() & 0xF;
                        last_go = single || tired;
                    }
                }
                if last_go {
                    let leaving = SlideCursor {
                        direction: geometry.exit.direction.get(),
                        rotation: cursor.rotation,
                        waypoint: 1,
                    };
                    head_to(guest, path_point(geometry, leaving));
                    self.set_sub_state(guest, RideSubState::LeaveSpiralSlide(leaving));
                    return;
                }
            }
            _ => {}
        }

        let next = SlideCursor {
            waypoint: cursor.waypoint + 1,
            ..cursor
        };
        head_to(guest, path_point(geometry, next));
        self.set_sub_state(guest, RideSubState::ApproachSpiralSlide(next));
    }

    pub(super) fn update_on_slide(&mut self, guest: &mut Guest, run: SlideRun) {
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };
        let rotation = usize::from(run.rotation & 3);

        let phase = match run.phase {
            SlidePhase::Climbing { ticks } => {
                let ticks = ticks.saturating_add(1);
                if ticks >= CLIMB_TICKS {
                    SlidePhase::AwaitingSlide
                } else {
                    SlidePhase::Climbing { ticks }
                }
            }
            SlidePhase::AwaitingSlide => {
                let Some(ride) = self.rides.get_mut(&ride_id) else {
                    return;
                };
                if ride.slide.occupant.is_some() {
                    return;
                }
                ride.slide.occupant = Some(guest.id);
                ride.slide.occupant_colour = guest.tshirt_colour;
                ride.slide.progress = 0;
                SlidePhase::Sliding
            }
            SlidePhase::Sliding => return,
            SlidePhase::Landing => {
                let (x, y) = geometry.start.origin();
                let (wx, wy) = SLIDE_END_WAYPOINT[rotation];
                let (ex, ey) = SLIDE_END[rotation];
                head_to(guest, (x + wx, y + wy));
                guest.position.x = x + ex;
                guest.position.y = y + ey;
                guest.sprite_direction = run.rotation * 8;
                SlidePhase::WalkingOff
            }
            SlidePhase::WalkingOff => {
                if let Advance::Moving { .. } = self.walk(guest) {
                    return;
                }
                let back = SlideCursor {
                    direction: 0,
                    rotation: run.rotation,
                    waypoint: 2,
                };
                head_to(guest, path_point(geometry, back));
                self.set_sub_state(guest, RideSubState::ApproachSpiralSlide(back));
                return;
            }
        };
        self.set_sub_state(guest, RideSubState::OnSpiralSlide(SlideRun { phase, ..run }));
    }

    pub(super) fn update_leave_slide(&mut self, guest: &mut Guest, cursor: SlideCursor) {
        if let Advance::Moving { .. } = self.walk(guest) {
            return;
        }
        let (Some(ride_id), Some(geometry)) = (guest.current_ride, self.station_geometry(guest))
        else {
            return;
        };

        let next = match cursor.waypoint {
            3 => {
                if let Some(ride) = self.rides.get_mut(&ride_id) {
                    ride.current_customers = ride.current_customers.saturating_sub(1);
                }
                self.prepare_for_exit(guest);
                return;
            }
            0 => {
                head_to(guest, geometry.exit.centre_offset(20));
                SlideCursor {
                    waypoint: 3,
                    ..cursor
                }
            }
            current => {
                let next = SlideCursor {
                    waypoint: current - 1,
                    ..cursor
                };
                head_to(guest, path_point(geometry, next));
                next
            }
        };
        self.set_sub_state(guest, RideSubState::LeaveSpiralSlide(next));
    }

    /// Moves every occupied slide along; a guest reaching the bottom lands.
    pub(crate) fn advance_slides(&mut self) {
        if self.tick % SLIDE_STEP_TICKS != 0 {
            return;
        }
        let mut landed: Vec<(RideId, GuestId)> = Vec::new();
        for ride in self.rides.values_mut() {
            if ride.descriptor.kind != RideKind::SpiralSlide {
                continue;
            }
            let Some(occupant) = ride.slide.occupant else {
                continue;
            };
            ride.slide.progress = ride.slide.progress.saturating_add(1);
            if ride.slide.progress >= SLIDE_LENGTH {
                ride.slide.occupant = None;
                ride.slide.progress = 0;
                landed.push((ride.id, occupant));
            }
        }

        for (ride, id) in landed {
            let Some(guest) = self.guests.get_mut(&id) else {
                continue;
            };
            match guest.sub_state {
                RideSubState::OnSpiralSlide(run)
                    if guest.current_ride == Some(ride) && run.phase == SlidePhase::Sliding =>
                {
                    guest.sub_state = RideSubState::OnSpiralSlide(SlideRun {
                        phase: SlidePhase::Landing,
                        ..run
                    });
                }
                _ => log::warn!("slide occupant {id:?} of {ride:?} was not sliding"),
            }
        }
    }
}
