//! Request-generation tokens.
//!
//! Every load issues a ticket; a response is applied only while its ticket is
//! still the latest one issued. A slow response for an old filter can then
//! never overwrite the state produced by a newer request.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Monotonic ticket counter.
#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket, superseding every ticket issued before.
    pub fn issue(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}

/// Holds the value of the most recent request only.
#[derive(Debug, Default)]
pub struct Latest<T> {
    generation: Generation,
    value: Option<T>,
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self {
            generation: Generation::new(),
            value: None,
        }
    }

    pub fn begin(&self) -> Ticket {
        self.generation.issue()
    }

    /// Stores `value` if `ticket` is still current. Returns whether it was
    /// applied.
    pub fn offer(&mut self, ticket: Ticket, value: T) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, "Dropping superseded response");
            return false;
        }
        self.value = Some(value);
        true
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let generation = Generation::new();
        let first = generation.issue();
        assert!(generation.is_current(first));

        let second = generation.issue();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn test_stale_response_does_not_overwrite_newer_one() {
        let mut latest: Latest<&str> = Latest::new();
        let last_30_days = latest.begin();
        let last_7_days = latest.begin();

        // The newer request resolves first, the older one afterwards
        assert!(latest.offer(last_7_days, "7d"));
        assert!(!latest.offer(last_30_days, "30d"));

        assert_eq!(latest.get(), Some(&"7d"));
    }
}
