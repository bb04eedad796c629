use serde::{Deserialize, Serialize};

flag_set! {
    /// Park-wide rules that change guest behaviour.
    pub struct ParkFlags(u32) {
        /// Money is disabled; nothing has a price.
        const NO_MONEY = 1 << 0;
        /// Guests prefer less intense rides and never raise their intensity preference.
        const PREFER_LESS_INTENSE_RIDES = 1 << 1;
    }
}

/// Cheats affecting guest decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cheats {
    /// Guests ignore intensity, nausea and g-force limits.
    pub ignore_ride_intensity: bool,
}

/// Current weather.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weather {
    /// Rain is falling.
    pub raining: bool,
}

/// Which news notifications the player wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Tracked guest boards a ride.
    pub guest_on_ride: bool,
    /// Tracked guest leaves a ride.
    pub guest_left_ride: bool,
    /// A breakdown strands guests on board.
    pub ride_stalled_vehicles: bool,
    /// Tracked guest joins a queue.
    pub guest_queuing_for_ride: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            guest_on_ride: false,
            guest_left_ride: false,
            ride_stalled_vehicles: true,
            guest_queuing_for_ride: false,
        }
    }
}

/// Read-only simulation-wide settings passed into every decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationContext {
    /// Park rules.
    pub park: ParkFlags,
    /// Active cheats.
    pub cheats: Cheats,
    /// Weather.
    pub weather: Weather,
    /// Simulation runs behind the title screen; sounds are muted.
    pub title_screen: bool,
    /// News toggles.
    pub notifications: NotificationConfig,
}

impl SimulationContext {
    /// Reports whether money is enabled in the park.
    #[must_use]
    pub const fn money_enabled(&self) -> bool {
        !self.park.contains(ParkFlags::NO_MONEY)
    }
}
