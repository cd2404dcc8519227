// Virtual-time scheduler: lets the controller run without a browser.

use std::cell::RefCell;
use std::rc::Rc;

use super::host::{CellPicker, GameHost, Scheduler};
use super::queue::{EventQueue, GameEvent};
use super::{GameController, TimerTag};

struct Interval {
    handle: u64,
    tag: TimerTag,
    period_ms: u64,
    next_due_ms: u64,
}

#[derive(Default)]
struct ClockState {
    now_ms: u64,
    next_handle: u64,
    intervals: Vec<Interval>,
}

impl ClockState {
    /// Earliest interval due at or before `until`; ties go to the one
    /// scheduled first. Advances `now_ms` to the firing instant.
    fn pop_due(&mut self, until: u64) -> Option<(u64, TimerTag)> {
        let iv = self
            .intervals
            .iter_mut()
            .filter(|iv| iv.next_due_ms <= until)
            .min_by_key(|iv| (iv.next_due_ms, iv.handle))?;
        let at = iv.next_due_ms;
        let tag = iv.tag;
        iv.next_due_ms += iv.period_ms;
        self.now_ms = at;
        Some((at, tag))
    }
}

/// Cloneable handle; every clone shares one timeline. Give one clone to the
/// controller and keep another to move time forward.
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Rc<RefCell<ClockState>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    pub fn active_timers(&self) -> usize {
        self.inner.borrow().intervals.len()
    }

    pub fn active_tags(&self) -> Vec<TimerTag> {
        self.inner.borrow().intervals.iter().map(|iv| iv.tag).collect()
    }

    /// Advance to the next firing at or before `now + within_ms` and return it.
    /// Time does not move if nothing is due.
    pub fn next_firing(&self, within_ms: u64) -> Option<GameEvent> {
        let mut st = self.inner.borrow_mut();
        let until = st.now_ms + within_ms;
        st.pop_due(until).map(|(_, tag)| GameEvent::Timer(tag))
    }

    /// Enqueue every firing in the next `ms` milliseconds, in time order,
    /// without delivering any. Cancellations made while the queue is later
    /// drained cannot retract events already queued.
    pub fn advance(&self, ms: u64, queue: &mut EventQueue) -> usize {
        let mut st = self.inner.borrow_mut();
        let until = st.now_ms + ms;
        let mut fired = 0;
        while let Some((_, tag)) = st.pop_due(until) {
            queue.push(GameEvent::Timer(tag));
            fired += 1;
        }
        st.now_ms = until;
        fired
    }

    /// Fire and deliver one event at a time for `ms` milliseconds, the way a
    /// browser event loop does. Returns the number of firings delivered.
    pub fn run_for<H, S, P>(&self, ms: u64, controller: &mut GameController<H, S, P>) -> usize
    where
        H: GameHost,
        S: Scheduler,
        P: CellPicker,
    {
        let until = self.now() + ms;
        let mut fired = 0;
        loop {
            // borrow released before the controller reschedules or cancels
            let next = self.inner.borrow_mut().pop_due(until);
            match next {
                Some((_, tag)) => {
                    controller.handle(GameEvent::Timer(tag));
                    fired += 1;
                }
                None => break,
            }
        }
        self.inner.borrow_mut().now_ms = until;
        fired
    }
}

impl Scheduler for VirtualClock {
    type Handle = u64;

    fn schedule(&mut self, tag: TimerTag, period_ms: u32) -> u64 {
        let mut st = self.inner.borrow_mut();
        st.next_handle += 1;
        let handle = st.next_handle;
        let period_ms = u64::from(period_ms.max(1));
        let next_due_ms = st.now_ms + period_ms;
        st.intervals.push(Interval {
            handle,
            tag,
            period_ms,
            next_due_ms,
        });
        handle
    }

    fn cancel(&mut self, handle: u64) {
        self.inner.borrow_mut().intervals.retain(|iv| iv.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TimerKind;

    fn tag(kind: TimerKind) -> TimerTag {
        TimerTag { kind, session: 1 }
    }

    #[test]
    fn intervals_fire_in_time_order() {
        let mut clock = VirtualClock::new();
        clock.schedule(tag(TimerKind::Countdown), 1000);
        clock.schedule(tag(TimerKind::Relocation), 400);
        let mut q = EventQueue::new();
        assert_eq!(clock.advance(1200, &mut q), 4);
        let kinds: Vec<TimerKind> = q
            .iter()
            .map(|e| match e {
                GameEvent::Timer(t) => t.kind,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        // relocations at 400, 800, 1200; countdown at 1000
        assert_eq!(
            kinds,
            vec![
                TimerKind::Relocation,
                TimerKind::Relocation,
                TimerKind::Countdown,
                TimerKind::Relocation
            ]
        );
        assert_eq!(clock.now(), 1200);
    }

    #[test]
    fn ties_go_to_first_scheduled() {
        let mut clock = VirtualClock::new();
        clock.schedule(tag(TimerKind::Countdown), 500);
        clock.schedule(tag(TimerKind::Relocation), 500);
        assert_eq!(clock.next_firing(500), Some(GameEvent::Timer(tag(TimerKind::Countdown))));
        assert_eq!(clock.next_firing(0), Some(GameEvent::Timer(tag(TimerKind::Relocation))));
        assert_eq!(clock.next_firing(0), None);
        assert_eq!(clock.now(), 500);
    }

    #[test]
    fn cancelled_interval_stops_firing() {
        let mut clock = VirtualClock::new();
        let h = clock.schedule(tag(TimerKind::Relocation), 100);
        clock.cancel(h);
        clock.cancel(h);
        assert_eq!(clock.active_timers(), 0);
        let mut q = EventQueue::new();
        assert_eq!(clock.advance(1000, &mut q), 0);
        assert!(q.is_empty());
    }
}
