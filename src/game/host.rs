// Seams between the controller and whatever hosts it (browser page, virtual clock, tests).

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::config::MoleDuration;
use super::{CellId, TimerTag};

/// Grid highlight state plus the two numeric read-outs.
pub trait RenderSurface {
    fn highlight_cell(&mut self, cell: CellId);
    fn clear_all_highlights(&mut self);
    /// Only one cell is ever lit, so clearing everything is equivalent by default.
    fn unhighlight_cell(&mut self, _cell: CellId) {
        self.clear_all_highlights();
    }
    fn set_score_display(&mut self, score: u32);
    fn set_time_display(&mut self, secs: u32);
}

/// The player's chosen mole duration, read once per start.
pub trait DurationSource {
    fn mole_duration(&self) -> MoleDuration;
}

/// Hit sound. Must restart from the beginning even if already playing.
pub trait AudioCue {
    fn play_cue(&mut self);
}

/// The start button (or whatever requests a start).
pub trait StartTrigger {
    fn set_start_enabled(&mut self, enabled: bool);
}

pub trait GameOverNotice {
    fn announce_game_over(&mut self, score: u32);
}

/// Everything the controller talks to apart from timers and randomness.
pub trait GameHost: RenderSurface + DurationSource + AudioCue + StartTrigger + GameOverNotice {}

impl<T> GameHost for T where
    T: RenderSurface + DurationSource + AudioCue + StartTrigger + GameOverNotice
{
}

/// Periodic timers. Each firing must be delivered back to the controller as
/// `GameEvent::Timer(tag)` with the tag given at scheduling time.
pub trait Scheduler {
    type Handle: Copy + std::fmt::Debug;

    fn schedule(&mut self, tag: TimerTag, period_ms: u32) -> Self::Handle;
    /// Cancelling an unknown or already cancelled handle is a no-op.
    fn cancel(&mut self, handle: Self::Handle);
}

/// Chooses where the mole pops up next.
pub trait CellPicker {
    fn pick(&mut self, cell_count: u8) -> CellId;
}

/// Uniform choice over all cells; repeats of the previous cell are allowed.
#[derive(Debug, Clone)]
pub struct RandomPicker<R>(pub R);

impl RandomPicker<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CellPicker for RandomPicker<R> {
    fn pick(&mut self, cell_count: u8) -> CellId {
        CellId(self.0.gen_range(0..cell_count.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_picker_stays_in_grid_and_covers_it() {
        let mut picker = RandomPicker::seeded(7);
        let mut hits = [0u32; 9];
        for _ in 0..2000 {
            let cell = picker.pick(9);
            assert!(cell.index() < 9);
            hits[cell.index()] += 1;
        }
        assert!(hits.iter().all(|&h| h > 0), "some cell never picked: {:?}", hits);
    }

    #[test]
    fn random_picker_handles_degenerate_grid() {
        let mut picker = RandomPicker::seeded(1);
        assert_eq!(picker.pick(0), CellId(0));
        assert_eq!(picker.pick(1), CellId(0));
    }
}
