//! Node id generation.
//!
//! Every session owns an isolated [`IdGenerator`] unless it opts into the
//! process-wide one. The process-wide generator lives in thread-local state
//! with explicit init/reset hooks so tests stay isolated.

use std::cell::RefCell;

use crate::types::NodeId;

// =============================================================================
// Generator
// =============================================================================

/// Monotonic `<prefix><n>` id source.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    next: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    /// Produce the next id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }

    /// Number of ids handed out since creation or the last reset.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("w")
    }
}

// =============================================================================
// Process-wide Generator
// =============================================================================

thread_local! {
    static SHARED_IDS: RefCell<IdGenerator> = RefCell::new(IdGenerator::default());
}

/// Replace the process-wide generator with a fresh one using `prefix`.
pub fn init_shared_ids(prefix: &str) {
    SHARED_IDS.with(|ids| *ids.borrow_mut() = IdGenerator::new(prefix));
}

/// Next id from the process-wide generator.
pub fn next_shared_id() -> NodeId {
    SHARED_IDS.with(|ids| ids.borrow_mut().next_id())
}

/// Restart the process-wide counter (for testing).
pub fn reset_shared_ids() {
    SHARED_IDS.with(|ids| ids.borrow_mut().reset());
}

/// Where a session draws its ids from.
#[derive(Debug, Clone)]
pub enum IdSource {
    Isolated(IdGenerator),
    Shared,
}

impl IdSource {
    pub fn next_id(&mut self) -> NodeId {
        match self {
            IdSource::Isolated(ids) => ids.next_id(),
            IdSource::Shared => next_shared_id(),
        }
    }
}
