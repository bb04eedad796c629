use park_sim_core::{
    Advance, Direction, Guest, MazeCursor, RideSubState, StationGeometry, TileCoords, TileElement,
    TrackQuery,
};
use rand::RngCore;

use super::{head_to, head_to_within, World};

/// Hedge bit blocking each edge, per quadrant of the tile the guest stands in.
const OPEN_HEDGE: [[u8; 4]; 4] = [[1, 2, 14, 0], [4, 5, 6, 2], [6, 8, 9, 10], [14, 10, 12, 13]];

/// Quadrant code reached by leaving a quadrant through an edge.
const NEW_QUADRANT_FROM_EDGE: [[u8; 4]; 4] =
    [[15, 7, 15, 7], [11, 3, 11, 3], [7, 15, 7, 15], [3, 11, 3, 11]];

/// First stop inside the maze for each starting quadrant.
const ENTRANCE_START: [(i32, i32); 4] = [(8, 8), (8, 24), (24, 24), (24, 8)];

fn hedge_blocks(maze_entry: u16, quadrant: u8, edge: u8) -> bool {
    let bit = OPEN_HEDGE[usize::from(quadrant & 3)][usize::from(edge & 3)];
    maze_entry & (1 << bit) != 0
}

/// Edges the guest may take from `quadrant`, never doubling back unless stuck.
///
/// Empty when every edge, including the way back, is hedged in.
fn open_edges(maze_entry: u16, quadrant: u8, last_edge: u8) -> Vec<u8> {
    let back = Direction::new(last_edge).reverse().get();
    let open: Vec<u8> = (0..4)
        .filter(|edge| *edge != back && !hedge_blocks(maze_entry, quadrant, *edge))
        .collect();
    if !open.is_empty() || hedge_blocks(maze_entry, quadrant, back) {
        return open;
    }
    vec![back]
}

impl World {
    pub(super) fn enter_maze(&mut self, guest: &mut Guest, geometry: StationGeometry) {
        let Some(ride) = guest.current_ride else {
            return;
        };
        let facing = geometry.entrance.direction.get();
        let mut last_edge = facing + 1;
        let mut code = facing * 4 + 11;
        if self.rng.next_u32() & 0x40 != 0 {
            code += 4;
            last_edge += 2;
        }
        let quadrant = (code & 0xF) / 4;

        let (x, y) = geometry.entrance.tile.origin();
        let (dx, dy) = geometry.entrance.direction.tile_delta();
        let (sx, sy) = ENTRANCE_START[usize::from(quadrant)];
        head_to_within(guest, (x + dx + sx, y + dy + sy), 3);

        if let Some(target) = self.rides.get_mut(&ride) {
            target.current_customers = target.current_customers.saturating_add(1);
        }
        self.on_enter_ride(guest, ride);
        self.set_sub_state(
            guest,
            RideSubState::MazePathfinding(MazeCursor::Wandering {
                quadrant,
                last_edge: last_edge & 3,
            }),
        );
    }

    pub(super) fn update_maze(&mut self, guest: &mut Guest, cursor: MazeCursor) {
        if let Advance::Moving { .. } = self.walk(guest) {
            return;
        }
        let (Some(ride), Some(geometry)) = (guest.current_ride, self.station_geometry(guest)) else {
            return;
        };

        let (quadrant, last_edge) = match cursor {
            MazeCursor::ExitReached { .. } => {
                if let Some(target) = self.rides.get_mut(&ride) {
                    target.current_customers = target.current_customers.saturating_sub(1);
                }
                self.prepare_for_exit(guest);
                return;
            }
            MazeCursor::Wandering {
                quadrant,
                last_edge,
            } => (quadrant, last_edge),
        };

        let here = TileCoords::from_world(guest.destination.x, guest.destination.y);
        let Some(TileElement::Track { maze_entry, .. }) = self.layout.element_at(here, geometry.height)
        else {
            return;
        };
        let edges = open_edges(maze_entry, quadrant, last_edge);
        if edges.is_empty() {
            return;
        }
        let len = u32::try_from(edges.len()).unwrap_or(1);
        let chosen = edges[(self.rng.next_u32() % len) as usize];

        let (dx, dy) = Direction::new(chosen).tile_delta();
        let next = (guest.destination.x + dx / 2, guest.destination.y + dy / 2);
        let beyond = self
            .layout
            .element_at(TileCoords::from_world(next.0, next.1), geometry.height);

        let step = match beyond {
            Some(TileElement::Track { .. }) => {
                head_to(guest, next);
                MazeCursor::Wandering {
                    quadrant: NEW_QUADRANT_FROM_EDGE[usize::from(quadrant)][usize::from(chosen)] / 4,
                    last_edge: chosen,
                }
            }
            Some(TileElement::RideExit { .. }) => {
                let (cx, cy) = here.centre();
                let target = if chosen & 1 == 1 {
                    (cx, guest.destination.y)
                } else {
                    (guest.destination.x, cy)
                };
                head_to(guest, target);
                log::debug!("guest {:?} found the way out of {ride:?}", guest.id);
                MazeCursor::ExitReached { last_edge: chosen }
            }
            _ => {
                // Nothing walkable that way; try the next edge round next tick.
                let step = MazeCursor::Wandering {
                    quadrant,
                    last_edge: (last_edge + 1) & 3,
                };
                self.set_sub_state(guest, RideSubState::MazePathfinding(step));
                return;
            }
        };
        self.set_sub_state(guest, RideSubState::MazePathfinding(step));
        let _ = self.walk(guest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_doubles_back_while_another_edge_is_open() {
        // Only the hedge of edge 1 in quadrant 0 is present.
        let entry = 1 << 2;
        assert_eq!(open_edges(entry, 0, 0), vec![0, 3]);
    }

    #[test]
    fn turns_back_from_a_dead_end() {
        let entry = (1 << 1) | (1 << 2) | (1 << 14);
        assert_eq!(open_edges(entry, 0, 1), vec![3]);
    }

    #[test]
    fn fully_hedged_cell_offers_nothing() {
        let entry = (1 << 1) | (1 << 2) | (1 << 14) | 1;
        assert!(open_edges(entry, 0, 0).is_empty());
    }
}
