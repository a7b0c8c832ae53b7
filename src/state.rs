//! Session registry state management.
//!
//! All state is ephemeral and held in memory. On restart, every pairing,
//! waiting-slot entry, and pending reveal is lost.
//!
//! Every public operation commits a complete transition under one lock, so
//! multi-entry updates (pairing two users, tearing down a pair, evicting the
//! waiter) are atomic with respect to each other. No operation holds the
//! lock across an await point; callers deliver notifications only after the
//! state change has committed.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Opaque identifier for a participant, stable per messaging-platform
/// account. This is the only thing the service knows about a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserHandle(pub i64);

impl fmt::Display for UserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for UserHandle {
    fn from(id: i64) -> Self {
        UserHandle(id)
    }
}

/// Result of placing a user into the waiting slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The user now occupies the waiting slot.
    Enqueued,
    /// The user already occupied the slot; nothing changed.
    AlreadyWaiting,
    /// The user has an active pairing; nothing changed.
    AlreadyPaired,
}

/// Result of attempting to pair a user with the current waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// The slot held another user; both are now paired and the slot is
    /// empty.
    Paired(UserHandle),
    /// No partner available. The slot was empty, or held the caller
    /// themselves (a user is never paired with itself).
    SlotEmpty,
    /// The caller already has an active pairing; nothing changed.
    AlreadyPaired,
}

/// Pending reveal requests are keyed by the pairing that spawned them.
///
/// The per-pairing state machine is `Idle -> Requested -> {Accepted |
/// Declined}`; the terminal states are momentary, so only `Requested`
/// entries are ever stored. An entry is valid only while the pairing still
/// links requester and target: resolution re-checks the live pairing, and
/// disconnect drops every entry touching either member.
type RevealKey = (UserHandle, UserHandle);

#[derive(Debug, Default)]
struct Inner {
    /// At most one unpaired user waiting for a partner, with the time they
    /// started waiting.
    waiting: Option<(UserHandle, Instant)>,
    /// Undirected pairings, stored as both directions. Invariant: if
    /// `a -> b` is present then so is `b -> a`, and neither occupies
    /// `waiting`.
    connections: HashMap<UserHandle, UserHandle>,
    /// Outstanding reveal requests, keyed `(requester, target)`.
    reveals: HashSet<RevealKey>,
    /// Every handle ever seen. Grows monotonically; membership does not
    /// imply an active session.
    known_users: HashSet<UserHandle>,
}

/// The service's ephemeral state: the waiting slot, the pairing map, the
/// pending-reveal table, and the known-users set.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a user exists. Idempotent.
    pub fn register(&self, user: UserHandle) {
        self.inner.lock().known_users.insert(user);
    }

    /// Snapshot of every handle ever seen, for broadcast fan-out.
    pub fn known_users(&self) -> Vec<UserHandle> {
        self.inner.lock().known_users.iter().copied().collect()
    }

    /// Place `user` into the waiting slot unless they are already waiting
    /// or already paired. Strictly idempotent: two racing calls from the
    /// same user can never double-enqueue.
    pub fn try_enqueue_waiting(&self, user: UserHandle, now: Instant) -> EnqueueOutcome {
        let mut inner = self.inner.lock();
        if inner.connections.contains_key(&user) {
            return EnqueueOutcome::AlreadyPaired;
        }
        if matches!(inner.waiting, Some((waiter, _)) if waiter == user) {
            return EnqueueOutcome::AlreadyWaiting;
        }
        inner.waiting = Some((user, now));
        EnqueueOutcome::Enqueued
    }

    /// Pair `user` with the current waiter, if there is one.
    ///
    /// On success the slot is cleared and both directions of the mapping
    /// are inserted in the same critical section, so no observer ever sees
    /// a half-written pairing.
    pub fn try_pair_with_waiting(&self, user: UserHandle) -> PairOutcome {
        let mut inner = self.inner.lock();
        if inner.connections.contains_key(&user) {
            return PairOutcome::AlreadyPaired;
        }
        match inner.waiting {
            Some((waiter, _)) if waiter != user => {
                inner.waiting = None;
                inner.connections.insert(user, waiter);
                inner.connections.insert(waiter, user);
                PairOutcome::Paired(waiter)
            }
            _ => PairOutcome::SlotEmpty,
        }
    }

    /// Tear down the pairing `user` belongs to, if any.
    ///
    /// Removes both directions of the mapping and every pending reveal
    /// touching either member. Idempotent under races: of two concurrent
    /// callers only the first observes `Some(partner)`.
    pub fn disconnect(&self, user: UserHandle) -> Option<UserHandle> {
        let mut inner = self.inner.lock();
        let partner = inner.connections.remove(&user)?;
        inner.connections.remove(&partner);
        inner
            .reveals
            .retain(|&(req, tgt)| req != user && tgt != user && req != partner && tgt != partner);
        Some(partner)
    }

    /// Read-only lookup of the user's current partner.
    pub fn partner_of(&self, user: UserHandle) -> Option<UserHandle> {
        self.inner.lock().connections.get(&user).copied()
    }

    /// Whether `user` currently occupies the waiting slot.
    pub fn is_waiting(&self, user: UserHandle) -> bool {
        matches!(self.inner.lock().waiting, Some((waiter, _)) if waiter == user)
    }

    /// Clear and return the waiting user, but only if they have been
    /// waiting longer than `timeout`. A waiter who was paired before this
    /// call is already gone from the slot, so the race favors pairing.
    pub fn evict_waiting_if_stale(&self, now: Instant, timeout: Duration) -> Option<UserHandle> {
        let mut inner = self.inner.lock();
        match inner.waiting {
            Some((user, since)) if now.duration_since(since) > timeout => {
                inner.waiting = None;
                Some(user)
            }
            _ => None,
        }
    }

    /// Open a reveal request from `requester` against their current
    /// partner. Returns the target, or `None` when the requester has no
    /// pairing. The partner lookup and the pending-entry insert happen in
    /// one critical section so the entry can never bind a stale partner.
    pub fn begin_reveal(&self, requester: UserHandle) -> Option<UserHandle> {
        let mut inner = self.inner.lock();
        let target = inner.connections.get(&requester).copied()?;
        inner.reveals.insert((requester, target));
        Some(target)
    }

    /// Consume the pending reveal `(requester, target)`, but only if it is
    /// still valid: the entry must exist and the pairing that spawned it
    /// must still link target back to requester. Returns `false` without
    /// any other effect when the request has gone stale; the entry, if
    /// present, is dropped either way (single-use).
    pub fn resolve_reveal(&self, requester: UserHandle, target: UserHandle) -> bool {
        let mut inner = self.inner.lock();
        let pending = inner.reveals.remove(&(requester, target));
        pending && inner.connections.get(&target) == Some(&requester)
    }

    /// Whether a reveal request from `requester` to `target` is pending.
    pub fn has_pending_reveal(&self, requester: UserHandle, target: UserHandle) -> bool {
        self.inner.lock().reveals.contains(&(requester, target))
    }
}
