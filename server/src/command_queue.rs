//! Per-player buffering of direction commands
//!
//! Connection handlers append headings as they arrive; the simulation tick pops at
//! most one per player. The queue itself is not synchronized: it lives inside the
//! [`World`](crate::game::World) and shares the world's lock.

use shared::Direction;
use std::collections::VecDeque;

/// FIFO of headings requested by one player and not yet applied
#[derive(Debug, Default, Clone)]
pub struct CommandQueue {
    pending: VecDeque<Direction>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a heading behind every heading already waiting
    pub fn push(&mut self, direction: Direction) {
        self.pending.push_back(direction);
    }

    /// Removes and returns the oldest pending heading
    pub fn pop(&mut self) -> Option<Direction> {
        self.pending.pop_front()
    }

    /// Drops everything still waiting, used when a round restarts
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
