//! Active run registry: at most one counting run per location.
//!
//! The registry is a compare-and-set over a per-location slot. It is not a
//! waiting lock: a caller that loses the race gets an immediate `Busy` outcome
//! carrying the current holder, and the transport layer turns that into a
//! "location already being counted" response.
//!
//! ## Concurrency
//!
//! State lives in a sharded [`DashMap`]. `acquire` goes through the `entry`
//! API, which holds the shard's write lock for the whole check-and-insert, and
//! `release` uses `remove_if`, which holds it for the whole compare-and-remove.
//! Both are therefore atomic per location, and operations on locations that
//! hash to different shards never contend.
//!
//! The registry is process-local. Running several coordinator processes
//! against the same locations needs an external lock service.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use countops_core::{LocationId, RunId};
use countops_inventory::ActiveRunRegistration;

/// Result of [`RunRegistry::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The location was free and is now held by the caller.
    Acquired,
    /// The caller's run already held the location; nothing changed.
    Reentered,
    /// Another run holds the location; nothing changed.
    Busy { holder: ActiveRunRegistration },
}

impl AcquireOutcome {
    /// `true` when the caller holds the location after the call.
    pub fn is_granted(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired | AcquireOutcome::Reentered)
    }
}

/// Process-wide map of location → run currently allowed to count it.
#[derive(Debug, Default)]
pub struct RunRegistry {
    active: DashMap<LocationId, ActiveRunRegistration>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an explicit shard count.
    ///
    /// `shards` must be a power of two greater than 1; `CoordinatorConfig`
    /// validates this before calling.
    pub fn with_shard_amount(shards: usize) -> Self {
        Self {
            active: DashMap::with_shard_amount(shards),
        }
    }

    /// Try to give `registration.run_id` exclusive counting rights on `location_id`.
    ///
    /// Re-acquiring with the run that already holds the location is a no-op
    /// success, so retried start requests are safe. The stored registration is
    /// left untouched in that case.
    pub fn acquire(
        &self,
        location_id: LocationId,
        registration: ActiveRunRegistration,
    ) -> AcquireOutcome {
        let run_id = registration.run_id;
        let outcome = match self.active.entry(location_id) {
            Entry::Occupied(held) => {
                if held.get().is_held_by(run_id) {
                    AcquireOutcome::Reentered
                } else {
                    AcquireOutcome::Busy {
                        holder: held.get().clone(),
                    }
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(registration);
                AcquireOutcome::Acquired
            }
        };

        debug!(%location_id, %run_id, ?outcome, "acquire");
        outcome
    }

    /// Drop the registration of `location_id` if, and only if, it belongs to `run_id`.
    ///
    /// Returns whether a registration was removed. A release by a run that does
    /// not hold the location, or of a free location, changes nothing.
    pub fn release(&self, location_id: LocationId, run_id: RunId) -> bool {
        let removed = self
            .active
            .remove_if(&location_id, |_, held| held.is_held_by(run_id))
            .is_some();

        debug!(%location_id, %run_id, removed, "release");
        removed
    }

    /// Current registration of a location, for status reads.
    ///
    /// Read-only and not part of the exclusion protocol: the answer can be
    /// stale by the time the caller looks at it.
    pub fn peek(&self, location_id: LocationId) -> Option<ActiveRunRegistration> {
        self.active.get(&location_id).map(|held| held.value().clone())
    }

    /// Number of locations currently being counted.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Point-in-time copy of every registration.
    pub fn snapshot(&self) -> Vec<(LocationId, ActiveRunRegistration)> {
        self.active
            .iter()
            .map(|held| (*held.key(), held.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Barrier};

    fn reg(run_id: RunId) -> ActiveRunRegistration {
        ActiveRunRegistration::new(run_id, Utc::now())
    }

    #[test]
    fn first_acquire_wins_and_others_are_busy() {
        let registry = RunRegistry::new();
        let location = LocationId::new();
        let r1 = RunId::new();
        let r2 = RunId::new();

        assert_eq!(registry.acquire(location, reg(r1)), AcquireOutcome::Acquired);

        match registry.acquire(location, reg(r2)) {
            AcquireOutcome::Busy { holder } => assert_eq!(holder.run_id, r1),
            other => panic!("expected busy, got {other:?}"),
        }
        assert_eq!(registry.peek(location).map(|r| r.run_id), Some(r1));
    }

    #[test]
    fn reacquire_by_holder_is_noop_success() {
        let registry = RunRegistry::new();
        let location = LocationId::new();
        let run = RunId::new();

        registry.acquire(location, reg(run).with_operator("alice"));
        let again = registry.acquire(location, reg(run).with_operator("someone else"));

        assert_eq!(again, AcquireOutcome::Reentered);
        assert!(again.is_granted());
        // Original registration is kept.
        assert_eq!(registry.peek(location).unwrap().busy_by.as_deref(), Some("alice"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_frees_location_for_any_run() {
        let registry = RunRegistry::new();
        let location = LocationId::new();
        let r1 = RunId::new();

        registry.acquire(location, reg(r1));
        assert!(registry.release(location, r1));
        assert!(registry.peek(location).is_none());

        let r2 = RunId::new();
        assert_eq!(registry.acquire(location, reg(r2)), AcquireOutcome::Acquired);
    }

    #[test]
    fn release_by_non_holder_is_noop() {
        let registry = RunRegistry::new();
        let location = LocationId::new();
        let holder = RunId::new();

        registry.acquire(location, reg(holder));
        assert!(!registry.release(location, RunId::new()));
        assert_eq!(registry.peek(location).map(|r| r.run_id), Some(holder));
    }

    #[test]
    fn release_of_free_location_is_noop() {
        let registry = RunRegistry::new();
        assert!(!registry.release(LocationId::new(), RunId::new()));
        assert!(registry.is_empty());
    }

    #[test]
    fn locations_are_independent() {
        let registry = RunRegistry::with_shard_amount(4);
        let a = LocationId::new();
        let b = LocationId::new();
        let run = RunId::new();

        assert!(registry.acquire(a, reg(run)).is_granted());
        assert!(registry.acquire(b, reg(RunId::new())).is_granted());
        assert_eq!(registry.snapshot().len(), 2);
    }

    #[test]
    fn concurrent_acquires_have_exactly_one_winner() {
        const THREADS: usize = 16;

        for _ in 0..20 {
            let registry = Arc::new(RunRegistry::new());
            let location = LocationId::new();
            let barrier = Arc::new(Barrier::new(THREADS));

            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let registry = registry.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        let run = RunId::new();
                        barrier.wait();
                        (run, registry.acquire(location, reg(run)))
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winners: Vec<_> = results
                .iter()
                .filter(|(_, outcome)| *outcome == AcquireOutcome::Acquired)
                .map(|(run, _)| *run)
                .collect();

            assert_eq!(winners.len(), 1);
            assert_eq!(registry.peek(location).map(|r| r.run_id), Some(winners[0]));
            for (_, outcome) in &results {
                if let AcquireOutcome::Busy { holder } = outcome {
                    assert_eq!(holder.run_id, winners[0]);
                }
            }
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire(usize, usize),
        Release(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..3, 0usize..4).prop_map(|(l, r)| Op::Acquire(l, r)),
            (0usize..3, 0usize..4).prop_map(|(l, r)| Op::Release(l, r)),
        ]
    }

    proptest! {
        /// Property: the registry behaves like a map with compare-and-set semantics.
        #[test]
        fn matches_compare_and_set_model(ops in prop::collection::vec(op(), 1..64)) {
            let locations: Vec<_> = (0..3).map(|_| LocationId::new()).collect();
            let runs: Vec<_> = (0..4).map(|_| RunId::new()).collect();
            let registry = RunRegistry::new();
            let mut model: HashMap<LocationId, RunId> = HashMap::new();

            for op in ops {
                match op {
                    Op::Acquire(l, r) => {
                        let (location, run) = (locations[l], runs[r]);
                        let outcome = registry.acquire(location, reg(run));
                        match model.get(&location).copied() {
                            None => {
                                prop_assert_eq!(outcome, AcquireOutcome::Acquired);
                                model.insert(location, run);
                            }
                            Some(held) if held == run => {
                                prop_assert_eq!(outcome, AcquireOutcome::Reentered);
                            }
                            Some(_) => prop_assert!(!outcome.is_granted()),
                        }
                    }
                    Op::Release(l, r) => {
                        let (location, run) = (locations[l], runs[r]);
                        let expected = model.get(&location) == Some(&run);
                        prop_assert_eq!(registry.release(location, run), expected);
                        if expected {
                            model.remove(&location);
                        }
                    }
                }

                for location in &locations {
                    prop_assert_eq!(
                        registry.peek(*location).map(|r| r.run_id),
                        model.get(location).copied()
                    );
                }
            }
        }
    }
}
