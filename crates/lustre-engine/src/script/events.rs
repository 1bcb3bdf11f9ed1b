//! Input events in the form scripts receive them.
//!
//! Keys and mouse buttons share one namespace of upper-case names
//! (`LEFTBUTTON`, `RETURN`, `CTRL`); letters and digits are lower-case
//! single characters.

use std::borrow::Cow;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::input::{InputEvent, Key, KeyState, Modifiers, MouseButton};

/// Two presses of the same button closer than this form a double click.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
/// ... and no further apart than this, in logical pixels.
const DOUBLE_CLICK_DISTANCE: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    KeyDown { key: String, double_click: bool },
    KeyUp { key: String },
    Char(String),
}

/// Script name of a keyboard key, if scripts can see it.
pub fn key_name(key: Key) -> Option<Cow<'static, str>> {
    let name = match key {
        Key::Escape => "ESCAPE",
        Key::Enter => "RETURN",
        Key::Tab => "TAB",
        Key::Backspace => "BACK",
        Key::Space => "SPACE",
        Key::Insert => "INSERT",
        Key::Delete => "DELETE",
        Key::Home => "HOME",
        Key::End => "END",
        Key::PageUp => "PAGEUP",
        Key::PageDown => "PAGEDOWN",
        Key::Up => "UP",
        Key::Down => "DOWN",
        Key::Left => "LEFT",
        Key::Right => "RIGHT",
        Key::Shift => "SHIFT",
        Key::Control => "CTRL",
        Key::Alt => "ALT",
        Key::Char(c) => return Some(Cow::Owned(c.to_string())),
        Key::Function(n) => return Some(Cow::Owned(format!("F{n}"))),
        Key::Meta | Key::Unknown(_) => return None,
    };
    Some(Cow::Borrowed(name))
}

pub fn button_name(button: MouseButton) -> Option<&'static str> {
    match button {
        MouseButton::Left => Some("LEFTBUTTON"),
        MouseButton::Right => Some("RIGHTBUTTON"),
        MouseButton::Middle => Some("MIDDLEBUTTON"),
        MouseButton::Other(_) => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Click {
    button: MouseButton,
    at: Instant,
    x: f32,
    y: f32,
}

/// Turns engine input events into script events and keeps the state that
/// `IsKeyDown` and `GetCursorPos` answer from.
#[derive(Debug, Default)]
pub struct InputTranslator {
    down: HashSet<String>,
    cursor: (f32, f32),
    modifiers: Modifiers,
    last_click: Option<Click>,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_down(&self, name: &str) -> bool {
        self.down.contains(name)
    }

    /// Last known pointer position in logical pixels.
    #[inline]
    pub fn cursor(&self) -> (f32, f32) {
        self.cursor
    }

    /// Folds `ev` into the tracked state and appends the resulting script
    /// events to `out`.
    pub fn translate(&mut self, ev: &InputEvent, now: Instant, out: &mut Vec<ScriptEvent>) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Key { key, state, modifiers, .. } => {
                self.modifiers = *modifiers;
                let Some(name) = key_name(*key) else { return };
                match state {
                    KeyState::Pressed => {
                        self.down.insert(name.to_string());
                        out.push(ScriptEvent::KeyDown { key: name.into_owned(), double_click: false });
                    }
                    KeyState::Released => {
                        self.down.remove(name.as_ref());
                        out.push(ScriptEvent::KeyUp { key: name.into_owned() });
                    }
                }
            }

            InputEvent::PointerMoved { x, y } => self.cursor = (*x, *y),

            InputEvent::PointerButton { button, pressed, x, y, modifiers } => {
                self.cursor = (*x, *y);
                self.modifiers = *modifiers;
                let Some(name) = button_name(*button) else { return };
                if *pressed {
                    let double_click = self.register_click(*button, now, *x, *y);
                    self.down.insert(name.to_string());
                    out.push(ScriptEvent::KeyDown { key: name.to_string(), double_click });
                } else {
                    self.down.remove(name);
                    out.push(ScriptEvent::KeyUp { key: name.to_string() });
                }
            }

            InputEvent::MouseWheel { delta, modifiers } => {
                self.modifiers = *modifiers;
                let key = match delta.steps() {
                    1 => "WHEELUP",
                    -1 => "WHEELDOWN",
                    _ => return,
                };
                out.push(ScriptEvent::KeyUp { key: key.to_string() });
            }

            InputEvent::Text(text) => {
                // Ctrl+letter is a shortcut, not typing.
                if self.modifiers.ctrl {
                    return;
                }
                for c in text.chars().filter(|c| !c.is_control()) {
                    out.push(ScriptEvent::Char(c.to_string()));
                }
            }

            InputEvent::Focused(false) => {
                self.down.clear();
                self.last_click = None;
            }

            InputEvent::Focused(true) | InputEvent::PointerLeft => {}
        }
    }

    fn register_click(&mut self, button: MouseButton, now: Instant, x: f32, y: f32) -> bool {
        let double = self.last_click.is_some_and(|c| {
            c.button == button
                && now.saturating_duration_since(c.at) <= DOUBLE_CLICK_TIME
                && (c.x - x).abs() <= DOUBLE_CLICK_DISTANCE
                && (c.y - y).abs() <= DOUBLE_CLICK_DISTANCE
        });
        // A double click does not start the next one.
        self.last_click = if double { None } else { Some(Click { button, at: now, x, y }) };
        double
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseWheelDelta;

    fn key(key: Key, state: KeyState, ctrl: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers { ctrl, ..Modifiers::default() },
            repeat: false,
        }
    }

    fn click(x: f32) -> InputEvent {
        InputEvent::PointerButton {
            button: MouseButton::Left,
            pressed: true,
            x,
            y: 0.0,
            modifiers: Modifiers::default(),
        }
    }

    fn run(t: &mut InputTranslator, evs: &[InputEvent], now: Instant) -> Vec<ScriptEvent> {
        let mut out = Vec::new();
        for ev in evs {
            t.translate(ev, now, &mut out);
        }
        out
    }

    #[test]
    fn names_keys_and_tracks_held_state() {
        let mut t = InputTranslator::new();
        let now = Instant::now();
        let out = run(&mut t, &[key(Key::Enter, KeyState::Pressed, false), key(Key::Control, KeyState::Pressed, true)], now);
        assert_eq!(out[0], ScriptEvent::KeyDown { key: "RETURN".into(), double_click: false });
        assert!(t.is_down("CTRL"));
        run(&mut t, &[key(Key::Control, KeyState::Released, false)], now);
        assert!(!t.is_down("CTRL"));
        assert_eq!(key_name(Key::Char('q')).as_deref(), Some("q"));
        assert_eq!(key_name(Key::Function(11)).as_deref(), Some("F11"));
    }

    #[test]
    fn detects_double_clicks() {
        let mut t = InputTranslator::new();
        let t0 = Instant::now();
        let first = run(&mut t, &[click(10.0)], t0);
        let second = run(&mut t, &[click(11.0)], t0 + Duration::from_millis(200));
        let third = run(&mut t, &[click(11.0)], t0 + Duration::from_millis(300));
        let late = run(&mut t, &[click(11.0)], t0 + Duration::from_secs(2));
        let dc = |v: &[ScriptEvent]| matches!(v[0], ScriptEvent::KeyDown { double_click: true, .. });
        assert!(!dc(&first));
        assert!(dc(&second));
        assert!(!dc(&third));
        assert!(!dc(&late));
        assert!(t.is_down("LEFTBUTTON"));
    }

    #[test]
    fn wheel_is_delivered_as_key_up() {
        let mut t = InputTranslator::new();
        let out = run(&mut t, &[InputEvent::MouseWheel {
            delta: MouseWheelDelta::Lines(-1.0),
            modifiers: Modifiers::default(),
        }], Instant::now());
        assert_eq!(out, vec![ScriptEvent::KeyUp { key: "WHEELDOWN".into() }]);
    }

    #[test]
    fn text_is_suppressed_while_ctrl_is_held() {
        let mut t = InputTranslator::new();
        let now = Instant::now();
        let typed = run(&mut t, &[InputEvent::Text("a\r".into())], now);
        assert_eq!(typed, vec![ScriptEvent::Char("a".into())]);

        let out = run(&mut t, &[key(Key::Control, KeyState::Pressed, true), InputEvent::Text("c".into())], now);
        assert_eq!(out.len(), 1);
    }
}
