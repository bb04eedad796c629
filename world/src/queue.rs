//! Intrusive station queues.
//!
//! Each queued guest links to the guest queued just before them; the station
//! keeps the most recent arrival and the length. The guest being updated is
//! held outside the arena, so every function takes it separately from the
//! other guests.

use std::collections::BTreeMap;

use park_sim_core::{Guest, GuestId, StationQueue};

/// Spacing below which the guest ahead still blocks the way to the entrance.
const FRONT_SPACING: i32 = 32;

/// Appends `guest` behind the most recent arrival.
pub(crate) fn enqueue(queue: &mut StationQueue, guest: &mut Guest) {
    guest.next_in_queue = queue.last;
    queue.last = Some(guest.id);
    queue.length = queue.length.saturating_add(1);
}

/// Unlinks `guest` from `queue`, relinking whoever followed them.
///
/// Returns `false` when the guest could not be found in the chain; the queue is
/// left untouched apart from the guest's own link.
pub(crate) fn remove(
    queue: &mut StationQueue,
    guests: &mut BTreeMap<GuestId, Guest>,
    guest: &mut Guest,
) -> bool {
    let ahead = guest.next_in_queue.take();
    if queue.last == Some(guest.id) {
        queue.last = ahead;
        queue.length = queue.length.saturating_sub(1);
        return true;
    }

    let mut cursor = queue.last;
    for _ in 0..=guests.len() {
        let Some(follower) = cursor.and_then(|id| guests.get_mut(&id)) else {
            break;
        };
        if follower.next_in_queue == Some(guest.id) {
            follower.next_in_queue = ahead;
            queue.length = queue.length.saturating_sub(1);
            return true;
        }
        cursor = follower.next_in_queue;
    }

    log::warn!("guest {:?} missing from its queue chain", guest.id);
    false
}

/// Guest at the front of the chain.
fn front(queue: &StationQueue, guests: &BTreeMap<GuestId, Guest>) -> Option<GuestId> {
    let mut cursor = queue.last?;
    for _ in 0..=guests.len() {
        match guests.get(&cursor).and_then(|guest| guest.next_in_queue) {
            Some(ahead) => cursor = ahead,
            None => return Some(cursor),
        }
    }
    log::warn!("queue chain starting at {:?} loops", queue.last);
    None
}

/// Puts `guest` back at the very front, ahead of everyone waiting.
pub(crate) fn insert_at_front(
    queue: &mut StationQueue,
    guests: &mut BTreeMap<GuestId, Guest>,
    guest: &mut Guest,
) {
    guest.next_in_queue = None;
    match front(queue, guests).and_then(|head| guests.get_mut(&head)) {
        Some(head) => head.next_in_queue = Some(guest.id),
        None => queue.last = Some(guest.id),
    }
    queue.length = queue.length.saturating_add(1);
}

/// Reports whether nobody stands between `guest` and the entrance.
///
/// The guest ahead only counts while it is close by; a link to a guest far
/// away or missing entirely is a broken chain and the caller repairs it.
pub(crate) fn is_front(guest: &Guest, guests: &BTreeMap<GuestId, Guest>) -> bool {
    let Some(ahead) = guest.next_in_queue.and_then(|id| guests.get(&id)) else {
        return true;
    };
    (ahead.position.x - guest.position.x).abs() >= FRONT_SPACING
        || (ahead.position.y - guest.position.y).abs() >= FRONT_SPACING
}

/// Guests of `queue` from the most recent arrival to the front.
pub(crate) fn chain(queue: &StationQueue, guests: &BTreeMap<GuestId, Guest>) -> Vec<GuestId> {
    let mut members = Vec::new();
    let mut cursor = queue.last;
    while let Some(id) = cursor {
        if members.len() > guests.len() || members.contains(&id) {
            break;
        }
        members.push(id);
        cursor = guests.get(&id).and_then(|guest| guest.next_in_queue);
    }
    members
}
