use std::cell::Cell;
use std::rc::Rc;

/// Generation issued to one run of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTicket(u64);

/// Cancellation handle shared between a poll loop and whoever stops it.
///
/// A loop captures the ticket returned by [`LoopGuard::start`] and checks it
/// before each request and again before applying the response. `cancel` or a
/// new `start` bumps the generation, so a late response from a stopped loop
/// is dropped instead of being applied.
#[derive(Debug, Clone, Default)]
pub struct LoopGuard {
    generation: Rc<Cell<u64>>,
    running: Rc<Cell<bool>>,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> LoopTicket {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        self.running.set(true);
        LoopTicket(next)
    }

    pub fn cancel(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.running.set(false);
    }

    pub fn is_current(&self, ticket: LoopTicket) -> bool {
        self.running.get() && self.generation.get() == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_invalidates_ticket() {
        let guard = LoopGuard::new();
        let ticket = guard.start();
        assert!(guard.is_current(ticket));
        guard.cancel();
        assert!(!guard.is_current(ticket));
    }

    #[test]
    fn restart_invalidates_previous_run() {
        let guard = LoopGuard::new();
        let first = guard.start();
        let shared = guard.clone();
        let second = shared.start();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }

    #[test]
    fn cancel_without_start_is_harmless() {
        let guard = LoopGuard::new();
        guard.cancel();
        let ticket = guard.start();
        assert!(guard.is_current(ticket));
    }
}
