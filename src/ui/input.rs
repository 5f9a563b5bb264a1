//! Keyboard and mouse state tracker.
//!
//! Tracks which keys are held so that walking continues while a key is
//! down, while one-shot actions (jump, mine, shop) fire on the initial
//! press only. Left mouse clicks are queued in terminal cell coordinates
//! for the renderer to translate into view pixels.
//!
//! Uses crossterm's keyboard enhancement for Release events when available
//! and falls back to timeout-based release detection otherwise.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

/// After this long without a Press/Repeat event, a key counts as released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Left clicks from the last drain, as (column, row).
    clicks: Vec<(u16, u16)>,

    /// Left button currently down, with its last known cell.
    drag: Option<(u16, u16)>,

    pub raw_events: Vec<KeyEvent>,

    /// Only true once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            clicks: Vec::with_capacity(4),
            drag: None,
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.clicks.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(m)) => match m.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        self.clicks.push((m.column, m.row));
                        self.drag = Some((m.column, m.row));
                    }
                    MouseEventKind::Drag(MouseButton::Left) => self.drag = Some((m.column, m.row)),
                    MouseEventKind::Up(MouseButton::Left) => self.drag = None,
                    _ => {}
                },
                _ => {}
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Edge trigger: pressed this frame.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Most recent left click this frame.
    pub fn clicked_cell(&self) -> Option<(u16, u16)> {
        self.clicks.last().copied()
    }

    /// Cell under the left button while it is held down.
    pub fn held_cell(&self) -> Option<(u16, u16)> {
        self.drag
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
