/// Input state tracker.
///
/// Every lane change is a discrete, edge-triggered action, so only fresh
/// presses matter: a key produces one directional event per press, never a
/// stream while held. The tracker drains all pending terminal events once
/// per frame and records which keys went down during the drain.

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use crate::domain::grid::Direction;

pub struct InputState {
    /// Keys that went down during the most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the
    /// simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                if key.kind != KeyEventKind::Release {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Was any key at all pressed this frame? (tap acknowledgment)
    pub fn any_pressed(&self) -> bool {
        !self.fresh_presses.is_empty()
    }

    /// Directional events in the order they arrived this frame.
    /// Arrow keys and WASD both map.
    pub fn directions(&self) -> Vec<Direction> {
        self.fresh_presses.iter()
            .filter_map(|code| match code {
                KeyCode::Up | KeyCode::Char('w') => Some(Direction::Up),
                KeyCode::Down | KeyCode::Char('s') => Some(Direction::Down),
                KeyCode::Left | KeyCode::Char('a') => Some(Direction::Left),
                KeyCode::Right | KeyCode::Char('d') => Some(Direction::Right),
                _ => None,
            })
            .collect()
    }

    /// Check if any raw event this frame has Ctrl+C.
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
