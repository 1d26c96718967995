//! Input events as seen by the bind table.
//!
//! Events follow X11 conventions: the modifier state of a button press does
//! not yet include the pressed button, while a release still does. The
//! [`Translator`] turns `iced` mouse and keyboard events into this shape.
use core::fmt;

use iced::{keyboard, mouse};

/// Kind of an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ButtonPress,
    ButtonRelease,
    Motion,
    Enter,
    Leave,
    KeyPress,
    KeyRelease,
}

impl EventKind {
    pub fn is_key(self) -> bool {
        matches!(self, Self::KeyPress | Self::KeyRelease)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ButtonPress => "ButtonPress",
            Self::ButtonRelease => "ButtonRelease",
            Self::Motion => "Motion",
            Self::Enter => "Enter",
            Self::Leave => "Leave",
            Self::KeyPress => "KeyPress",
            Self::KeyRelease => "KeyRelease",
        };
        f.write_str(s)
    }
}

/// Detail of a crossing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossingDetail {
    #[default]
    Ancestor,
    Virtual,
    Inferior,
    Nonlinear,
}

/// Keyboard modifier and pointer button state, laid out like the X11 state mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierState(u32);

impl ModifierState {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const LOCK: Self = Self(1 << 1);
    pub const CONTROL: Self = Self(1 << 2);
    pub const ALT: Self = Self(1 << 3);
    pub const META: Self = Self(1 << 6);
    pub const BUTTON1: Self = Self(1 << 8);
    pub const BUTTON2: Self = Self(1 << 9);
    pub const BUTTON3: Self = Self(1 << 10);
    pub const BUTTON4: Self = Self(1 << 11);
    pub const BUTTON5: Self = Self(1 << 12);

    const ALL_BUTTONS: u32 = 0x1f << 8;

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Mask for pointer button `n` (1..=5); empty for anything else.
    pub const fn button(n: u8) -> Self {
        match n {
            1..=5 => Self(1 << (7 + n as u32)),
            _ => Self(0),
        }
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any of the five pointer buttons is down.
    pub const fn any_button(self) -> bool {
        self.0 & Self::ALL_BUTTONS != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn toggle(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl core::ops::BitOr for ModifierState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl From<keyboard::Modifiers> for ModifierState {
    fn from(m: keyboard::Modifiers) -> Self {
        let mut out = Self::NONE;
        if m.shift() {
            out = out | Self::SHIFT;
        }
        if m.control() {
            out = out | Self::CONTROL;
        }
        if m.alt() {
            out = out | Self::ALT;
        }
        if m.logo() {
            out = out | Self::META;
        }
        out
    }
}

/// A single input event in widget-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub x: f64,
    pub y: f64,
    pub state: ModifierState,
    /// Pointer button number for button events, 0 otherwise.
    pub button: u8,
    /// Key name for key events.
    pub key: Option<String>,
    pub time: u64,
    pub detail: CrossingDetail,
}

impl Event {
    fn new(kind: EventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            x,
            y,
            state: ModifierState::NONE,
            button: 0,
            key: None,
            time: 0,
            detail: CrossingDetail::Ancestor,
        }
    }

    pub fn motion(x: f64, y: f64) -> Self {
        Self::new(EventKind::Motion, x, y)
    }

    pub fn enter(x: f64, y: f64) -> Self {
        Self::new(EventKind::Enter, x, y)
    }

    pub fn leave(x: f64, y: f64) -> Self {
        Self::new(EventKind::Leave, x, y)
    }

    pub fn button_press(button: u8, x: f64, y: f64) -> Self {
        Self {
            button,
            ..Self::new(EventKind::ButtonPress, x, y)
        }
    }

    pub fn button_release(button: u8, x: f64, y: f64) -> Self {
        Self {
            button,
            ..Self::new(EventKind::ButtonRelease, x, y)
        }
    }

    pub fn key_press(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(EventKind::KeyPress, 0.0, 0.0)
        }
    }

    pub fn key_release(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(EventKind::KeyRelease, 0.0, 0.0)
        }
    }

    pub fn with_state(mut self, state: ModifierState) -> Self {
        self.state = state;
        self
    }

    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// A crossing event at the same position, time and state.
    pub(crate) fn crossing(&self, kind: EventKind) -> Self {
        Self {
            kind,
            x: self.x,
            y: self.y,
            state: self.state,
            button: 0,
            key: None,
            time: self.time,
            detail: CrossingDetail::Ancestor,
        }
    }
}

fn button_number(button: mouse::Button) -> u8 {
    match button {
        mouse::Button::Left => 1,
        mouse::Button::Middle => 2,
        mouse::Button::Right => 3,
        mouse::Button::Back => 4,
        mouse::Button::Forward => 5,
        mouse::Button::Other(_) => 0,
    }
}

fn key_name(key: &keyboard::Key) -> Option<String> {
    match key {
        keyboard::Key::Character(c) => Some(c.to_string()),
        keyboard::Key::Named(named) => Some(format!("{named:?}")),
        keyboard::Key::Unidentified => None,
    }
}

/// Converts `iced` events into bind-table events, tracking pointer position,
/// button state and modifiers across calls.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    position: (f64, f64),
    buttons: ModifierState,
    modifiers: ModifierState,
    time: u64,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> ModifierState {
        self.modifiers | self.buttons
    }

    fn stamp(&mut self, event: Event) -> Event {
        self.time += 1;
        event.with_time(self.time)
    }

    /// Translate one event. `origin` is the widget's top-left corner in window
    /// coordinates. Returns `None` for events the bind table does not use.
    pub fn translate(&mut self, event: &iced::Event, origin: iced::Point) -> Option<Event> {
        let (x, y) = self.position;
        let out = match event {
            iced::Event::Mouse(mouse_event) => match mouse_event {
                mouse::Event::CursorMoved { position } => {
                    self.position = (
                        (position.x - origin.x) as f64,
                        (position.y - origin.y) as f64,
                    );
                    let (x, y) = self.position;
                    Event::motion(x, y).with_state(self.state())
                }
                mouse::Event::CursorEntered => Event::enter(x, y).with_state(self.state()),
                mouse::Event::CursorLeft => Event::leave(x, y).with_state(self.state()),
                mouse::Event::ButtonPressed(button) => {
                    let n = button_number(*button);
                    if n == 0 {
                        return None;
                    }
                    let event = Event::button_press(n, x, y).with_state(self.state());
                    self.buttons = self.buttons | ModifierState::button(n);
                    event
                }
                mouse::Event::ButtonReleased(button) => {
                    let n = button_number(*button);
                    if n == 0 {
                        return None;
                    }
                    let event = Event::button_release(n, x, y).with_state(self.state());
                    self.buttons = self.buttons.without(ModifierState::button(n));
                    event
                }
                _ => return None,
            },
            iced::Event::Keyboard(keyboard_event) => match keyboard_event {
                keyboard::Event::KeyPressed { key, modifiers, .. } => {
                    self.modifiers = (*modifiers).into();
                    let mut event = Event::key_press(key_name(key)?).with_state(self.state());
                    event.x = x;
                    event.y = y;
                    event
                }
                keyboard::Event::KeyReleased { key, modifiers, .. } => {
                    self.modifiers = (*modifiers).into();
                    let mut event = Event::key_release(key_name(key)?).with_state(self.state());
                    event.x = x;
                    event.y = y;
                    event
                }
                keyboard::Event::ModifiersChanged(modifiers) => {
                    self.modifiers = (*modifiers).into();
                    return None;
                }
                _ => return None,
            },
            _ => return None,
        };
        Some(self.stamp(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_masks() {
        assert_eq!(ModifierState::button(1), ModifierState::BUTTON1);
        assert_eq!(ModifierState::button(5), ModifierState::BUTTON5);
        assert_eq!(ModifierState::button(9), ModifierState::NONE);
        assert!(ModifierState::BUTTON3.any_button());
        assert!(!(ModifierState::SHIFT | ModifierState::CONTROL).any_button());
        let s = ModifierState::SHIFT | ModifierState::BUTTON2;
        assert!(s.contains(ModifierState::SHIFT));
        assert_eq!(s.toggle(ModifierState::BUTTON2), ModifierState::SHIFT);
    }

    #[test]
    fn translator_follows_x_state_convention() {
        let mut t = Translator::new();
        let origin = iced::Point::new(10.0, 20.0);
        let moved = t
            .translate(
                &iced::Event::Mouse(mouse::Event::CursorMoved {
                    position: iced::Point::new(15.0, 30.0),
                }),
                origin,
            )
            .unwrap();
        assert_eq!((moved.kind, moved.x, moved.y), (EventKind::Motion, 5.0, 10.0));

        let press = t
            .translate(
                &iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)),
                origin,
            )
            .unwrap();
        assert_eq!(press.button, 1);
        assert!(!press.state.any_button());

        let release = t
            .translate(
                &iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)),
                origin,
            )
            .unwrap();
        assert!(release.state.contains(ModifierState::BUTTON1));
        assert!(release.time > press.time);
    }
}
