// sysdeps-core/src/model/flight.rs
//! Per-key memoization where concurrent requesters share one computation.
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::trace;

enum Slot<V> {
    InFlight(ThreadId),
    Ready(V),
}

struct FlightState<K, V> {
    slots: HashMap<K, Slot<V>>,
    /// Which key each blocked thread is waiting for.
    waiting: HashMap<ThreadId, K>,
}

pub struct SingleFlight<K, V> {
    state: Mutex<FlightState<K, V>>,
    ready: Condvar,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            state: Mutex::new(FlightState {
                slots: HashMap::new(),
                waiting: HashMap::new(),
            }),
            ready: Condvar::new(),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FlightState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `key`, computing it at most once.
    ///
    /// Fails with the chain of keys involved when waiting would never end:
    /// the calling thread is already computing `key`, or the computation it
    /// would wait for is itself waiting on the caller.
    pub fn get_or_compute<F>(&self, key: &K, compute: F) -> Result<V, Vec<K>>
    where
        F: FnOnce() -> V,
    {
        let me = thread::current().id();
        let mut state = self.lock();
        loop {
            match state.slots.get(key) {
                Some(Slot::Ready(value)) => return Ok(value.clone()),
                Some(Slot::InFlight(owner)) if *owner == me => {
                    return Err(vec![key.clone()]);
                }
                Some(Slot::InFlight(_)) => {
                    if let Some(chain) = state.cycle_through(me, key) {
                        return Err(chain);
                    }
                    trace!("Waiting for in-flight computation of {:?}", key);
                    state.waiting.insert(me, key.clone());
                    state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                    state.waiting.remove(&me);
                }
                None => {
                    state.slots.insert(key.clone(), Slot::InFlight(me));
                    break;
                }
            }
        }
        drop(state);

        let mut guard = InFlightGuard {
            flight: self,
            key: Some(key.clone()),
        };
        let value = compute();
        guard.complete(value.clone());
        Ok(value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        match self.lock().slots.get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<K, V> FlightState<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Follows owner -> awaited key edges starting at `key`.
    fn cycle_through(&self, me: ThreadId, key: &K) -> Option<Vec<K>> {
        let mut chain = vec![key.clone()];
        let mut current = key;
        while chain.len() <= self.slots.len() + 1 {
            let owner = match self.slots.get(current) {
                Some(Slot::InFlight(owner)) => *owner,
                _ => return None,
            };
            if owner == me {
                return Some(chain);
            }
            current = self.waiting.get(&owner)?;
            chain.push(current.clone());
        }
        None
    }
}

/// Publishes the result, or clears the slot if the computation unwinds.
struct InFlightGuard<'a, K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    flight: &'a SingleFlight<K, V>,
    key: Option<K>,
}

impl<K, V> InFlightGuard<'_, K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn complete(&mut self, value: V) {
        if let Some(key) = self.key.take() {
            self.flight.lock().slots.insert(key, Slot::Ready(value));
            self.flight.ready.notify_all();
        }
    }
}

impl<K, V> Drop for InFlightGuard<'_, K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.flight.lock().slots.remove(&key);
            self.flight.ready.notify_all();
        }
    }
}
