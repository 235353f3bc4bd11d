//! Stale-result discarding for classification callers.

use std::sync::atomic::{AtomicU64, Ordering};

/// A ticket identifying one classification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    sequence: u64,
}

impl RequestTicket {
    /// The ticket's sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Orders classification requests so only the newest result applies.
///
/// Callers debounce keystrokes however they like; before dispatching a
/// classification they call [`RequestGate::begin`], and when the result
/// comes back they apply it only if [`RequestGate::is_current`] still
/// holds. Staleness is decided by sequence number, not by timestamp, so
/// responses reordered under variable latency cannot resurrect an old
/// result.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: AtomicU64,
}

impl RequestGate {
    /// Creates a gate with no requests issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issues a ticket for a new request, invalidating all earlier ones.
    pub fn begin(&self) -> RequestTicket {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket { sequence }
    }

    /// Whether no newer request has begun since this ticket was issued.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.sequence
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use super::*;

    #[test]
    fn first_ticket_is_current_until_the_next_begins() {
        let gate = RequestGate::new();
        let first = gate.begin();
        assert!(gate.is_current(first));

        let second = gate.begin();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn only_the_newest_of_many_is_current() {
        let gate = RequestGate::new();
        let tickets: Vec<_> = (0..10).map(|_| gate.begin()).collect();
        for ticket in &tickets[..9] {
            assert!(!gate.is_current(*ticket));
        }
        assert!(gate.is_current(tickets[9]));
    }

    #[test]
    fn out_of_order_responses_cannot_overwrite_the_newest() {
        let gate = RequestGate::new();
        let mut applied: Option<(u64, &str)> = None;

        let older = gate.begin();
        let newer = gate.begin();

        // The newer response arrives first and is applied.
        if gate.is_current(newer) {
            applied = Some((newer.sequence(), "newer"));
        }
        // The older response straggles in afterwards and is discarded.
        if gate.is_current(older) {
            applied = Some((older.sequence(), "older"));
        }

        assert_eq!(applied, Some((2, "newer")));
    }

    #[test]
    fn concurrent_begins_issue_distinct_tickets() {
        let gate = RequestGate::new();
        let tickets = Mutex::new(Vec::new());

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let ticket = gate.begin();
                        tickets.lock().unwrap().push(ticket.sequence());
                    }
                });
            }
        });

        let mut sequences = tickets.into_inner().unwrap();
        sequences.sort_unstable();
        sequences.dedup();
        assert_eq!(sequences.len(), 400);
        assert!(gate.is_current(RequestTicket { sequence: 400 }));
    }
}
