use park_sim_core::{Advance, Guest, Movement};

/// Walks guests in straight bounded steps, dominant axis first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepMovement {
    step: i32,
}

impl StepMovement {
    /// Creates a movement that covers at most `step` units per tick.
    #[must_use]
    pub const fn new(step: i32) -> Self {
        Self {
            step: if step < 1 { 1 } else { step },
        }
    }
}

impl Default for StepMovement {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Movement for StepMovement {
    fn advance(&mut self, guest: &Guest) -> Advance {
        let dx = guest.destination.x - guest.position.x;
        let dy = guest.destination.y - guest.position.y;
        let tolerance = i32::from(guest.destination.tolerance);
        if dx.abs() <= tolerance && dy.abs() <= tolerance {
            return Advance::Arrived;
        }

        let distance = dx.abs() + dy.abs();
        let (mut x, mut y) = (guest.position.x, guest.position.y);
        if dx.abs() >= dy.abs() {
            x += dx.signum() * self.step.min(dx.abs());
        } else {
            y += dy.signum() * self.step.min(dy.abs());
        }
        Advance::Moving { x, y, distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_sim_core::{Destination, GuestId, Position};

    fn guest_at(x: i32, y: i32, destination: Destination) -> Guest {
        let mut guest = Guest::new(GuestId::new(1), Position::new(x, y, 0));
        guest.destination = destination;
        guest
    }

    #[test]
    fn steps_along_the_longer_axis() {
        let mut movement = StepMovement::new(4);
        let guest = guest_at(0, 0, Destination::new(10, -3, 0));
        assert_eq!(
            movement.advance(&guest),
            Advance::Moving {
                x: 4,
                y: 0,
                distance: 13
            }
        );
    }

    #[test]
    fn never_overshoots() {
        let mut movement = StepMovement::new(8);
        let guest = guest_at(0, 0, Destination::new(0, 3, 0));
        assert_eq!(
            movement.advance(&guest),
            Advance::Moving {
                x: 0,
                y: 3,
                distance: 3
            }
        );
    }

    #[test]
    fn arrives_within_tolerance() {
        let mut movement = StepMovement::default();
        let guest = guest_at(30, 31, Destination::new(32, 32, 2));
        assert_eq!(movement.advance(&guest), Advance::Arrived);
    }
}
