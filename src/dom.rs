//! Browser front end: web-sys backed collaborators for the game controller.
//!
//! `mount()` finds the page elements (or builds a minimal page when they are
//! missing), installs the click listeners and parks exactly one controller in
//! a thread-local. Interval callbacks and click listeners never touch the
//! controller directly: they push a `GameEvent` onto the pending queue and
//! pump it.

use std::cell::RefCell;
use std::collections::HashMap;

use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlAudioElement, HtmlButtonElement, HtmlOptionElement, HtmlSelectElement,
    window,
};

use crate::game::{
    AudioCue, CellId, DurationSource, EventQueue, GameConfig, GameController, GameEvent,
    GameOverNotice, GameSnapshot, MoleDuration, RandomPicker, RenderSurface, Scheduler,
    StartTrigger, TimerTag,
};

pub const CELL_SELECTOR: &str = ".cell";
pub const MOLE_CLASS: &str = "mole-visible";
pub const SCORE_ID: &str = "score";
pub const TIME_ID: &str = "time-left";
pub const START_BUTTON_ID: &str = "start-button";
pub const DURATION_SELECT_ID: &str = "visibility-time";
pub const HIT_SOUND_ID: &str = "hit-sound";
const HIT_SOUND_FALLBACK_SRC: &str = "hit.mp3";

type BrowserController = GameController<DomHost, BrowserScheduler, RandomPicker<StdRng>>;

thread_local! {
    static GAME: RefCell<Option<BrowserController>> = RefCell::new(None);
    static PENDING: RefCell<EventQueue> = RefCell::new(EventQueue::new());
}

// --- Event loop --------------------------------------------------------------

/// Queue an event and deliver everything pending. Events arriving before
/// `mount` are dropped.
pub fn dispatch(event: GameEvent) {
    GAME.with(|game| {
        PENDING.with(|pending| {
            if enqueue(game, pending, event) {
                pump(game, pending, |controller, event| controller.handle(event));
            }
        })
    });
}

/// Queue `event` unless nothing is mounted. A borrowed slot means a pump is
/// running further up the stack, so the controller exists.
fn enqueue<C>(
    game: &RefCell<Option<C>>,
    pending: &RefCell<EventQueue>,
    event: GameEvent,
) -> bool {
    let mounted = game.try_borrow().map(|g| g.is_some()).unwrap_or(true);
    if !mounted {
        log::warn!("{:?} before mount, dropped", event);
        return false;
    }
    pending.borrow_mut().push(event);
    true
}

/// Deliver pending events one at a time. Returns at once when re-entered;
/// the outer call picks up whatever was queued meanwhile.
fn pump<C>(
    game: &RefCell<Option<C>>,
    pending: &RefCell<EventQueue>,
    mut deliver: impl FnMut(&mut C, GameEvent),
) {
    let Ok(mut guard) = game.try_borrow_mut() else {
        return;
    };
    let Some(controller) = guard.as_mut() else {
        return;
    };
    loop {
        let next = pending.borrow_mut().pop();
        match next {
            Some(event) => deliver(controller, event),
            None => break,
        }
    }
}

/// State of the mounted game, if any.
pub fn snapshot() -> Option<GameSnapshot> {
    GAME.with(|cell| {
        cell.try_borrow()
            .ok()
            .and_then(|g| g.as_ref().map(|c| c.snapshot()))
    })
}

pub fn current_score() -> u32 {
    snapshot().map(|s| s.score).unwrap_or(0)
}

// --- Timers ------------------------------------------------------------------

/// `setInterval` based scheduler. Closures live here until cancelled.
#[derive(Default)]
pub struct BrowserScheduler {
    live: HashMap<i32, Closure<dyn FnMut()>>,
    // Cancelled from inside their own callback; freed on the next schedule.
    retired: Vec<Closure<dyn FnMut()>>,
}

impl Scheduler for BrowserScheduler {
    type Handle = i32;

    fn schedule(&mut self, tag: TimerTag, period_ms: u32) -> i32 {
        self.retired.clear();
        let closure = Closure::wrap(Box::new(move || {
            dispatch(GameEvent::Timer(tag));
        }) as Box<dyn FnMut()>);
        let Some(win) = window() else {
            log::error!("no window; {:?} timer not scheduled", tag.kind);
            return -1;
        };
        let timeout = i32::try_from(period_ms).unwrap_or(i32::MAX);
        match win.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            timeout,
        ) {
            Ok(id) => {
                self.live.insert(id, closure);
                id
            }
            Err(err) => {
                log::error!("setInterval failed for {:?}: {:?}", tag.kind, err);
                -1
            }
        }
    }

    fn cancel(&mut self, handle: i32) {
        if let Some(win) = window() {
            win.clear_interval_with_handle(handle);
        }
        if let Some(closure) = self.live.remove(&handle) {
            self.retired.push(closure);
        }
    }
}

// --- Page collaborators ------------------------------------------------------

/// Grid cells, read-outs, start button, duration select and hit sound.
pub struct DomHost {
    cells: Vec<Element>,
    score: Element,
    time: Element,
    start_button: HtmlButtonElement,
    duration_select: HtmlSelectElement,
    hit_sound: Option<HtmlAudioElement>,
    default_duration: MoleDuration,
}

impl RenderSurface for DomHost {
    fn highlight_cell(&mut self, cell: CellId) {
        if let Some(el) = self.cells.get(cell.index()) {
            el.class_list().add_1(MOLE_CLASS).ok();
        }
    }

    fn unhighlight_cell(&mut self, cell: CellId) {
        if let Some(el) = self.cells.get(cell.index()) {
            el.class_list().remove_1(MOLE_CLASS).ok();
        }
    }

    fn clear_all_highlights(&mut self) {
        for el in &self.cells {
            el.class_list().remove_1(MOLE_CLASS).ok();
        }
    }

    fn set_score_display(&mut self, score: u32) {
        self.score.set_text_content(Some(&score.to_string()));
    }

    fn set_time_display(&mut self, secs: u32) {
        self.time.set_text_content(Some(&secs.to_string()));
    }
}

impl DurationSource for DomHost {
    fn mole_duration(&self) -> MoleDuration {
        let raw = self.duration_select.value();
        raw.parse().unwrap_or_else(|err| {
            log::warn!("{}; using {}", err, self.default_duration);
            self.default_duration
        })
    }
}

impl AudioCue for DomHost {
    fn play_cue(&mut self) {
        if let Some(audio) = &self.hit_sound {
            audio.set_current_time(0.0);
            // Autoplay policies may reject; a silent hit is fine.
            let _ = audio.play();
        }
    }
}

impl StartTrigger for DomHost {
    fn set_start_enabled(&mut self, enabled: bool) {
        self.start_button.set_disabled(!enabled);
    }
}

impl GameOverNotice for DomHost {
    fn announce_game_over(&mut self, score: u32) {
        let msg = format!("Game Over! Your final score is {}.", score);
        if let Some(win) = window() {
            if win.alert_with_message(&msg).is_err() {
                log::warn!("{}", msg);
            }
        }
    }
}

// --- Mount -------------------------------------------------------------------

/// Wire the page with the default config.
pub fn mount() -> Result<(), JsValue> {
    mount_with(GameConfig::default())
}

/// Wire the page and create the controller. Calling it again is a no-op.
/// The grid size follows the number of cells actually on the page.
pub fn mount_with(config: GameConfig) -> Result<(), JsValue> {
    let already = GAME.with(|cell| cell.borrow().is_some());
    if already {
        log::warn!("mole grid already mounted");
        return Ok(());
    }

    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    ensure_style(&doc)?;
    let cells = find_or_build_cells(&doc, config.cell_count)?;
    if cells.is_empty() {
        return Err(JsValue::from_str("no cells to play on"));
    }
    let config = config.with_cell_count(cells.len());
    let hud = find_or_create(&doc, "mole-hud", "div", None)?;
    let score = find_or_create(&doc, SCORE_ID, "span", Some(&hud))?;
    let time = find_or_create(&doc, TIME_ID, "span", Some(&hud))?;
    let start_button: HtmlButtonElement =
        find_or_create(&doc, START_BUTTON_ID, "button", Some(&hud))?.dyn_into()?;
    if start_button.text_content().unwrap_or_default().is_empty() {
        start_button.set_text_content(Some("Start"));
    }
    let duration_select: HtmlSelectElement =
        find_or_create(&doc, DURATION_SELECT_ID, "select", Some(&hud))?.dyn_into()?;
    if duration_select.length() == 0 {
        for d in MoleDuration::ALL {
            let value = d.millis().to_string();
            let opt = HtmlOptionElement::new_with_text_and_value(d.label(), &value)?;
            duration_select.append_child(&opt)?;
        }
        duration_select.set_value(&config.default_duration.millis().to_string());
    }
    let hit_sound = match doc.get_element_by_id(HIT_SOUND_ID) {
        Some(el) => el.dyn_into::<HtmlAudioElement>().ok(),
        None => HtmlAudioElement::new_with_src(HIT_SOUND_FALLBACK_SRC).ok(),
    };

    // Start button listener
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            dispatch(GameEvent::StartRequested);
        }) as Box<dyn FnMut(_)>);
        start_button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    // Cell listeners
    for (idx, el) in cells.iter().enumerate() {
        let id = CellId(idx as u8);
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            dispatch(GameEvent::CellActivated(id));
        }) as Box<dyn FnMut(_)>);
        el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    let host = DomHost {
        cells,
        score,
        time,
        start_button,
        duration_select,
        hit_sound,
        default_duration: config.default_duration,
    };
    let mut controller = GameController::new(
        config,
        host,
        BrowserScheduler::default(),
        RandomPicker::from_entropy(),
    );
    controller.render_idle();
    GAME.with(|cell| cell.replace(Some(controller)));
    log::info!("mole grid mounted");
    Ok(())
}

fn find_or_create(
    doc: &Document,
    id: &str,
    tag: &str,
    parent: Option<&Element>,
) -> Result<Element, JsValue> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let el = doc.create_element(tag)?;
    el.set_id(id);
    match parent {
        Some(p) => {
            p.append_child(&el)?;
        }
        None => {
            let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
            body.append_child(&el)?;
        }
    }
    Ok(el)
}

/// Existing `.cell` elements in document order, or a fresh 3x3 grid.
fn find_or_build_cells(doc: &Document, count: u8) -> Result<Vec<Element>, JsValue> {
    let list = doc.query_selector_all(CELL_SELECTOR)?;
    let mut cells = Vec::with_capacity(count as usize);
    for i in 0..list.length() {
        if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            cells.push(el);
        }
    }
    if !cells.is_empty() {
        cells.truncate(count as usize);
        return Ok(cells);
    }

    let grid = find_or_create(doc, "mole-grid", "div", None)?;
    for i in 0..count {
        let cell = doc.create_element("div")?;
        cell.set_class_name("cell");
        cell.set_attribute("data-cell", &i.to_string())?;
        grid.append_child(&cell)?;
        cells.push(cell);
    }
    Ok(cells)
}

fn ensure_style(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id("mole-grid-style").is_some() {
        return Ok(());
    }
    let style = doc.create_element("style")?;
    style.set_id("mole-grid-style");
    style.set_text_content(Some(
        "#mole-grid{display:grid;grid-template-columns:repeat(3,96px);gap:8px;\
         margin:24px auto;width:304px;}\
         .cell{width:96px;height:96px;border-radius:12px;background:#3b2a1a;cursor:pointer;}\
         .cell.mole-visible{background:#8b5a2b \
         radial-gradient(circle at 50% 40%,#d9a066 0 30%,transparent 31%);}\
         #mole-hud{display:flex;gap:12px;justify-content:center;\
         font-family:'Fira Code',monospace;}",
    ));
    let head = doc.head().ok_or_else(|| JsValue::from_str("no head"))?;
    head.append_child(&style)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_before_mount_are_dropped() {
        dispatch(GameEvent::StartRequested);
        dispatch(GameEvent::CellActivated(CellId(3)));
        assert!(PENDING.with(|q| q.borrow().is_empty()));
        assert_eq!(snapshot(), None);
        assert_eq!(current_score(), 0);
    }

    #[test]
    fn enqueue_needs_a_controller() {
        let game: RefCell<Option<Vec<GameEvent>>> = RefCell::new(None);
        let pending = RefCell::new(EventQueue::new());
        assert!(!enqueue(&game, &pending, GameEvent::StartRequested));
        assert!(pending.borrow().is_empty());

        game.replace(Some(Vec::new()));
        assert!(enqueue(&game, &pending, GameEvent::StartRequested));
        assert_eq!(pending.borrow().len(), 1);
    }

    #[test]
    fn reentrant_pump_leaves_delivery_to_the_outer_loop() {
        let game: RefCell<Option<Vec<GameEvent>>> = RefCell::new(Some(Vec::new()));
        let pending = RefCell::new(EventQueue::new());
        assert!(enqueue(&game, &pending, GameEvent::StartRequested));
        pump(&game, &pending, |seen, event| {
            seen.push(event);
            if event == GameEvent::StartRequested {
                // a handler whose side effect raises another event
                assert!(enqueue(&game, &pending, GameEvent::CellActivated(CellId(2))));
                pump(&game, &pending, |_, e| panic!("inner pump delivered {:?}", e));
            }
        });
        let seen = game.borrow().clone().unwrap();
        assert_eq!(
            seen,
            vec![GameEvent::StartRequested, GameEvent::CellActivated(CellId(2))]
        );
        assert!(pending.borrow().is_empty());
    }
}
