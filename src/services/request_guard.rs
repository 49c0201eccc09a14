use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{QuotationError, Result};

/// Handle for one in-flight action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub action: String,
    id: u64,
    generation: u64,
}

#[derive(Debug, Default)]
struct GuardState {
    next_id: u64,
    generation: u64,
    in_flight: HashMap<String, u64>,
}

/// Double-submit guard. Only one request per action may be outstanding, and
/// a response is only accepted if its ticket is still current; calling
/// [`RequestGuard::invalidate`] (on navigation) makes every outstanding ticket stale.
#[derive(Debug, Default)]
pub struct RequestGuard {
    state: Mutex<GuardState>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, action: &str) -> Result<RequestTicket> {
        let mut state = self.lock()?;
        if state.in_flight.contains_key(action) {
            return Err(QuotationError::invariant(format!(
                "'{}' is already in progress; wait for it to finish",
                action
            )));
        }
        state.next_id += 1;
        let id = state.next_id;
        let generation = state.generation;
        state.in_flight.insert(action.to_string(), id);
        Ok(RequestTicket {
            action: action.to_string(),
            id,
            generation,
        })
    }

    /// Like [`RequestGuard::begin`], but the action is released when the
    /// returned handle is dropped, including when its future is cancelled.
    pub fn enter(&self, action: &str) -> Result<InFlight<'_>> {
        let ticket = self.begin(action)?;
        Ok(InFlight {
            guard: self,
            ticket,
        })
    }

    pub fn is_in_flight(&self, action: &str) -> bool {
        self.lock()
            .map(|state| state.in_flight.contains_key(action))
            .unwrap_or(false)
    }

    /// Releases the action and reports whether the response may be applied.
    pub fn complete(&self, ticket: &RequestTicket) -> bool {
        let Ok(mut state) = self.lock() else {
            return false;
        };
        let current = state.in_flight.get(&ticket.action) == Some(&ticket.id);
        if current {
            state.in_flight.remove(&ticket.action);
        }
        current && state.generation == ticket.generation
    }

    /// Marks every outstanding request stale and frees their actions.
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.lock() {
            state.generation += 1;
            state.in_flight.clear();
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, GuardState>> {
        self.state
            .lock()
            .map_err(|_| QuotationError::invariant("request guard is unavailable"))
    }
}

pub struct InFlight<'a> {
    guard: &'a RequestGuard,
    ticket: RequestTicket,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.guard.complete(&self.ticket);
    }
}
