use serde::{Deserialize, Serialize};

use crate::RideId;

/// Kind of thought a guest can voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThoughtKind {
    /// "I've spent all my money".
    SpentMoney,
    /// "I can't afford <ride>".
    CantAffordRide,
    /// "I can't afford <item>".
    CantAffordItem,
    /// "I'm not going on <ride>, it isn't safe".
    NotSafe,
    /// "I'm not going on <ride> while it's raining".
    NotWhileRaining,
    /// "I want to go on something more thrilling than <ride>".
    MoreThrilling,
    /// "<ride> looks too intense for me".
    Intense,
    /// "Just looking at <ride> makes me feel sick".
    Sickening,
    /// "I'm not paying that much to go on <ride>".
    BadValue,
    /// "<ride> is really good value".
    GoodValue,
    /// "I'm not paying that much for <item>".
    NotPaying,
    /// "<ride> was great".
    WasGreat,
    /// "I need to find a toilet".
    Toilet,
    /// "I'm hungry".
    Hungry,
    /// "I'm thirsty".
    Thirsty,
    /// "I'm running out of cash".
    RunningOut,
    /// "I've been queuing for <ride> for ages".
    QueuingAges,
    /// "I already have <item>".
    AlreadyGot,
    /// "I haven't finished my <item> yet".
    HaventFinished,
    /// "I'm not hungry".
    NotHungry,
    /// "I'm not thirsty".
    NotThirsty,
    /// "I feel sick".
    Sick,
}

/// Single entry of a guest's thought buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Thought {
    /// What the guest thinks.
    pub kind: ThoughtKind,
    /// Ride the thought is about.
    pub ride: Option<RideId>,
}

impl Thought {
    /// Creates a thought.
    #[must_use]
    pub const fn new(kind: ThoughtKind, ride: Option<RideId>) -> Self {
        Self { kind, ride }
    }
}

/// Most recent thoughts of a guest, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThoughtBuffer {
    entries: Vec<Thought>,
}

impl ThoughtBuffer {
    /// Number of thoughts a guest keeps.
    pub const CAPACITY: usize = 5;

    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Places `thought` at the front; an identical thought moves forward instead of repeating.
    pub fn insert(&mut self, thought: Thought) {
        self.entries.retain(|existing| *existing != thought);
        self.entries.insert(0, thought);
        self.entries.truncate(Self::CAPACITY);
    }

    /// Drops every thought of `kind`.
    pub fn remove_kind(&mut self, kind: ThoughtKind) {
        self.entries.retain(|thought| thought.kind != kind);
    }

    /// Drops thoughts about `ride`, keeping the remainder contiguous and in order.
    ///
    /// Item thoughts name the stall that sold the item, so they go too.
    pub fn forget_ride(&mut self, ride: RideId) {
        self.entries.retain(|thought| thought.ride != Some(ride));
    }

    /// Thoughts from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Thought> + '_ {
        self.entries.iter()
    }

    /// Newest thought.
    #[must_use]
    pub fn latest(&self) -> Option<&Thought> {
        self.entries.first()
    }

    /// Number of thoughts held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the guest has no thoughts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reports whether the buffer holds `kind`, optionally about `ride`.
    #[must_use]
    pub fn contains(&self, kind: ThoughtKind, ride: Option<RideId>) -> bool {
        self.entries
            .iter()
            .any(|thought| thought.kind == kind && thought.ride == ride)
    }
}
