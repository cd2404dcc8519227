// Single-consumer event queue fed by the timers and the input source.

use std::collections::VecDeque;

use super::host::{CellPicker, GameHost, Scheduler};
use super::{CellId, GameController, TimerTag};

/// Everything that can drive the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    StartRequested,
    Timer(TimerTag),
    CellActivated(CellId),
}

/// FIFO of pending events. Producers push, one consumer drains.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    /// Hand every queued event to the controller, one at a time in arrival
    /// order. Returns how many were delivered.
    pub fn drain_into<H, S, P>(&mut self, controller: &mut GameController<H, S, P>) -> usize
    where
        H: GameHost,
        S: Scheduler,
        P: CellPicker,
    {
        let mut delivered = 0;
        while let Some(event) = self.pop() {
            controller.handle(event);
            delivered += 1;
        }
        delivered
    }
}
