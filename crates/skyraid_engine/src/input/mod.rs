//! Input vocabulary and state tracking
//!
//! The window layer translates native messages into [`InputEvent`]s. Scenes
//! see both the raw events (for one-shot actions such as firing) and the
//! accumulated [`InputState`] (for held keys and mouse-drag steering).

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A key
    A,
    /// B key
    B,
    /// D key
    D,
    /// E key
    E,
    /// Q key
    Q,
    /// S key
    S,
    /// T key
    T,
    /// W key
    W,
    /// Space bar
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Control key
    Control,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// F1
    F1,
    /// F2
    F2,
    /// F3
    F3,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left button
    Left,
    /// Right button
    Right,
    /// Middle button
    Middle,
}

/// Raw input delivered by the window layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key went down
    KeyDown(Key),
    /// Key went up
    KeyUp(Key),
    /// Button pressed at a cursor position
    MouseDown {
        /// Button
        button: MouseButton,
        /// Cursor x in pixels
        x: f32,
        /// Cursor y in pixels
        y: f32,
    },
    /// Button released at a cursor position
    MouseUp {
        /// Button
        button: MouseButton,
        /// Cursor x in pixels
        x: f32,
        /// Cursor y in pixels
        y: f32,
    },
    /// Cursor moved
    MouseMove {
        /// Cursor x in pixels
        x: f32,
        /// Cursor y in pixels
        y: f32,
    },
}

bitflags! {
    /// Movement directions in the player's local frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Direction: u8 {
        /// Along +look
        const FORWARD = 1 << 0;
        /// Along -look
        const BACKWARD = 1 << 1;
        /// Along -right
        const LEFT = 1 << 2;
        /// Along +right
        const RIGHT = 1 << 3;
        /// Along +up
        const UP = 1 << 4;
        /// Along -up
        const DOWN = 1 << 5;
    }
}

/// Held keys
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<Key>,
}

impl KeyboardState {
    /// Nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as held or released
    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    /// Whether a key is held
    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Movement directions implied by the held keys
    ///
    /// Arrows and WASD steer in the horizontal plane, Page Up/Down climb and descend.
    pub fn direction(&self) -> Direction {
        const BINDINGS: [(Key, Direction); 10] = [
            (Key::W, Direction::FORWARD),
            (Key::Up, Direction::FORWARD),
            (Key::S, Direction::BACKWARD),
            (Key::Down, Direction::BACKWARD),
            (Key::A, Direction::LEFT),
            (Key::Left, Direction::LEFT),
            (Key::D, Direction::RIGHT),
            (Key::Right, Direction::RIGHT),
            (Key::PageUp, Direction::UP),
            (Key::PageDown, Direction::DOWN),
        ];

        BINDINGS
            .iter()
            .filter(|(key, _)| self.is_down(*key))
            .fold(Direction::empty(), |acc, (_, dir)| acc | *dir)
    }
}

/// Keyboard plus mouse-capture state
///
/// While the left button is held the cursor is "captured": every move adds
/// to a drag delta that the scene consumes once per frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Held keys
    pub keyboard: KeyboardState,
    captured_at: Option<(f32, f32)>,
    drag: (f32, f32),
}

impl InputState {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => self.keyboard.set(key, true),
            InputEvent::KeyUp(key) => self.keyboard.set(key, false),
            InputEvent::MouseDown { button: MouseButton::Left, x, y } => {
                self.captured_at = Some((x, y));
            }
            InputEvent::MouseUp { button: MouseButton::Left, .. } => self.captured_at = None,
            InputEvent::MouseMove { x, y } => {
                if let Some((cx, cy)) = self.captured_at {
                    self.drag.0 += x - cx;
                    self.drag.1 += y - cy;
                    self.captured_at = Some((x, y));
                }
            }
            InputEvent::MouseDown { .. } | InputEvent::MouseUp { .. } => {}
        }
    }

    /// Whether the cursor is captured
    pub const fn is_captured(&self) -> bool {
        self.captured_at.is_some()
    }

    /// Drag delta since the last call, then reset
    pub fn take_drag(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.drag)
    }
}
