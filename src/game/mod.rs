//! Whack-a-mole game controller.
//!
//! A single cooperative state machine driven by three kinds of events: the 1s
//! countdown timer, the mole relocation timer (period = chosen mole duration),
//! and cell activations from the player. Timers are producers pushing
//! `GameEvent`s into one `EventQueue`; the controller is the only consumer and
//! the only writer of score, remaining time, the active cell and the grid
//! highlights.
//!
//! ```text
//! Idle --start--> Running --tick hits 0--> Ended
//! Running --start--> Running (restart, timers cancelled and rescheduled)
//! Ended --start--> Running
//! ```
//!
//! Nothing here touches the browser; `crate::dom` supplies web-sys backed
//! collaborators and `clock::VirtualClock` drives the same code natively.

use std::fmt;

pub mod clock;
pub mod config;
pub mod host;
pub mod queue;

pub use config::{GameConfig, MoleDuration, UnknownDuration};
pub use host::{
    AudioCue, CellPicker, DurationSource, GameHost, GameOverNotice, RandomPicker, RenderSurface,
    Scheduler, StartTrigger,
};
pub use queue::{EventQueue, GameEvent};

// --- Identifiers -------------------------------------------------------------

/// Index of a cell in the fixed, row-major grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u8);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell {}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Countdown,
    Relocation,
}

/// Identifies a timer firing: which timer, scheduled by which start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerTag {
    pub kind: TimerKind,
    pub session: u32,
}

/// Read-only copy of the controller's state, for hosts that cannot hold a borrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    pub score: u32,
    pub remaining_secs: u32,
    pub active_cell: Option<CellId>,
    pub run_state: RunState,
    pub mole_duration: MoleDuration,
    pub session: u32,
}

// --- Controller ----------------------------------------------------------------

pub struct GameController<H, S: Scheduler, P> {
    config: GameConfig,
    host: H,
    scheduler: S,
    picker: P,
    score: u32,
    remaining_secs: u32,
    active: Option<CellId>,
    state: RunState,
    duration: MoleDuration,
    // bumped on every start; timer events from older sessions are dropped
    session: u32,
    countdown: Option<S::Handle>,
    relocation: Option<S::Handle>,
}

impl<H, S, P> GameController<H, S, P>
where
    H: GameHost,
    S: Scheduler,
    P: CellPicker,
{
    pub fn new(config: GameConfig, host: H, scheduler: S, picker: P) -> Self {
        let remaining_secs = config.total_secs;
        let duration = config.default_duration;
        Self {
            config,
            host,
            scheduler,
            picker,
            score: 0,
            remaining_secs,
            active: None,
            state: RunState::Idle,
            duration,
            session: 0,
            countdown: None,
            relocation: None,
        }
    }

    /// Push the idle read-outs (score 0, full time) to the surface.
    pub fn render_idle(&mut self) {
        self.host.set_score_display(self.score);
        self.host.set_time_display(self.remaining_secs);
    }

    /// Single dispatch entry used by the event loop.
    pub fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::StartRequested => self.start(),
            GameEvent::Timer(tag) if tag.session != self.session => {
                log::trace!(
                    "dropping {:?} from session {} (now {})",
                    tag.kind,
                    tag.session,
                    self.session
                );
            }
            GameEvent::Timer(TimerTag { kind: TimerKind::Countdown, .. }) => self.tick(),
            GameEvent::Timer(TimerTag { kind: TimerKind::Relocation, .. }) => self.relocate_mole(),
            GameEvent::CellActivated(cell) => self.on_cell_activated(cell),
        }
    }

    /// (Re)start a round. Valid from any state.
    pub fn start(&mut self) {
        self.cancel_timers();

        self.score = 0;
        self.remaining_secs = self.config.total_secs;
        self.host.set_score_display(self.score);
        self.host.set_time_display(self.remaining_secs);
        self.active = None;
        self.host.clear_all_highlights();
        self.host.set_start_enabled(false);

        // Read once; a change mid-round only applies at the next start.
        self.duration = self.host.mole_duration();
        self.session = self.session.wrapping_add(1);

        let countdown = TimerTag {
            kind: TimerKind::Countdown,
            session: self.session,
        };
        let relocation = TimerTag {
            kind: TimerKind::Relocation,
            session: self.session,
        };
        self.countdown = Some(self.scheduler.schedule(countdown, self.config.tick_period_ms));
        self.relocation = Some(self.scheduler.schedule(relocation, self.duration.millis()));
        self.state = RunState::Running;

        log::info!(
            "round {} started: {}s, mole every {}",
            self.session,
            self.remaining_secs,
            self.duration
        );
    }

    /// Move the mole to a random cell. Deliberately not gated on `Running`: a
    /// relocation already queued when the countdown expires still lights a
    /// cell, which the next start clears.
    pub fn relocate_mole(&mut self) {
        self.host.clear_all_highlights();
        let cell = self.picker.pick(self.config.cell_count);
        self.active = Some(cell);
        self.host.highlight_cell(cell);
        if self.state != RunState::Running {
            log::debug!("mole moved to {} after round end", cell);
        } else {
            log::debug!("mole moved to {}", cell);
        }
    }

    /// One countdown second.
    pub fn tick(&mut self) {
        if self.state != RunState::Running {
            log::trace!("tick ignored in {:?}", self.state);
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.host.set_time_display(self.remaining_secs);

        if self.remaining_secs == 0 {
            self.cancel_timers();
            self.active = None;
            self.host.clear_all_highlights();
            self.state = RunState::Ended;
            self.host.set_start_enabled(true);
            log::info!("round {} over, final score {}", self.session, self.score);
            self.host.announce_game_over(self.score);
        }
    }

    /// Player clicked `cell`. Scores only on the live mole while running.
    pub fn on_cell_activated(&mut self, cell: CellId) {
        if self.state != RunState::Running || self.active != Some(cell) {
            log::trace!("miss on {} (mole at {:?}, {:?})", cell, self.active, self.state);
            return;
        }
        self.score += 1;
        self.host.set_score_display(self.score);
        self.host.play_cue();
        self.host.unhighlight_cell(cell);
        // The cell stays dead until the relocation timer fires again.
        self.active = None;
        log::debug!("hit on {}, score {}", cell, self.score);
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.countdown.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.relocation.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn active_cell(&self) -> Option<CellId> {
        self.active
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Duration read at the most recent start (config default before that).
    pub fn mole_duration(&self) -> MoleDuration {
        self.duration
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    /// True while both the countdown and the relocation timer are scheduled.
    pub fn has_active_timers(&self) -> bool {
        self.countdown.is_some() && self.relocation.is_some()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            score: self.score,
            remaining_secs: self.remaining_secs,
            active_cell: self.active,
            run_state: self.state,
            mole_duration: self.duration,
            session: self.session,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
