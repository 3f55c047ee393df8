use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued request. Only the most recently issued ticket is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Generation counter that lets overlapping async requests resolve in any order while
/// only the response to the latest request is applied.
#[derive(Debug, Default)]
pub struct GenerationGate {
    issued: AtomicU64,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every ticket issued before it.
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }

    /// Supersede any in-flight ticket without starting a new request.
    pub fn invalidate(&self) {
        self.issued.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_is_current() {
        let gate = GenerationGate::new();
        let first = gate.issue();
        assert!(gate.is_current(first));
        let second = gate.issue();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
        assert!(first < second);
    }

    #[test]
    fn invalidate_supersedes_in_flight() {
        let gate = GenerationGate::new();
        let ticket = gate.issue();
        gate.invalidate();
        assert!(!gate.is_current(ticket));
    }
}
