// Shared native test doubles: a host that records everything the controller
// pushes to it, and a picker that replays a fixed sequence of cells.
#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};

use mole_grid::game::clock::VirtualClock;
use mole_grid::game::{
    AudioCue, CellId, CellPicker, DurationSource, GameConfig, GameController, GameOverNotice,
    MoleDuration, RenderSurface, StartTrigger,
};

#[derive(Debug)]
pub struct RecordingHost {
    pub highlighted: BTreeSet<CellId>,
    pub score_display: Option<u32>,
    pub time_history: Vec<u32>,
    pub start_enabled: bool,
    pub duration: MoleDuration,
    pub cues: u32,
    pub announcements: Vec<u32>,
}

impl RecordingHost {
    pub fn new(duration: MoleDuration) -> Self {
        Self {
            highlighted: BTreeSet::new(),
            score_display: None,
            time_history: Vec::new(),
            start_enabled: true,
            duration,
            cues: 0,
            announcements: Vec::new(),
        }
    }

    pub fn time_display(&self) -> Option<u32> {
        self.time_history.last().copied()
    }
}

impl RenderSurface for RecordingHost {
    fn highlight_cell(&mut self, cell: CellId) {
        self.highlighted.insert(cell);
    }

    fn unhighlight_cell(&mut self, cell: CellId) {
        self.highlighted.remove(&cell);
    }

    fn clear_all_highlights(&mut self) {
        self.highlighted.clear();
    }

    fn set_score_display(&mut self, score: u32) {
        self.score_display = Some(score);
    }

    fn set_time_display(&mut self, secs: u32) {
        self.time_history.push(secs);
    }
}

impl DurationSource for RecordingHost {
    fn mole_duration(&self) -> MoleDuration {
        self.duration
    }
}

impl AudioCue for RecordingHost {
    fn play_cue(&mut self) {
        self.cues += 1;
    }
}

impl StartTrigger for RecordingHost {
    fn set_start_enabled(&mut self, enabled: bool) {
        self.start_enabled = enabled;
    }
}

impl GameOverNotice for RecordingHost {
    fn announce_game_over(&mut self, score: u32) {
        self.announcements.push(score);
    }
}

/// Replays the given cell indices, then keeps answering cell 0.
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    pub next: VecDeque<u8>,
}

impl CellPicker for ScriptedPicker {
    fn pick(&mut self, cell_count: u8) -> CellId {
        CellId(self.next.pop_front().unwrap_or(0) % cell_count.max(1))
    }
}

pub type TestController = GameController<RecordingHost, VirtualClock, ScriptedPicker>;

pub fn scripted(duration: MoleDuration, cells: &[u8]) -> (TestController, VirtualClock) {
    let clock = VirtualClock::new();
    let picker = ScriptedPicker {
        next: cells.iter().copied().collect(),
    };
    let controller = GameController::new(
        GameConfig::default(),
        RecordingHost::new(duration),
        clock.clone(),
        picker,
    );
    (controller, clock)
}
