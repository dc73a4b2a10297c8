//! Event-id deduplication.
//!
//! A bounded, time-evicted set of recently processed event identifiers. It
//! guards against re-delivery of the exact same event (gateway retries,
//! manual replays); it is NOT the mechanism that prevents two *different*
//! concurrent triggers from double-awarding — per-account serialization in
//! the engine does that.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

pub struct EventDedup {
    horizon: Duration,
    seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl EventDedup {
    pub fn new(horizon_secs: i64) -> Self {
        Self {
            horizon: Duration::seconds(horizon_secs),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// True iff `event_id` was recorded within the horizon.
    pub fn contains(&self, event_id: &str, now: DateTime<Utc>) -> bool {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        match seen.get(event_id) {
            Some(at) => now.signed_duration_since(*at) < self.horizon,
            None => false,
        }
    }

    /// Record `event_id` as processed. Expired entries are evicted inline on
    /// every insert, which bounds memory to the ids seen within one horizon.
    pub fn record(&self, event_id: &str, now: DateTime<Utc>) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let horizon = self.horizon;
        seen.retain(|_, at| now.signed_duration_since(*at) < horizon);
        seen.insert(event_id.to_string(), now);
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
