use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState, Modifiers, MouseButton};

/// What is held down right now, and where the pointer is.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Logical pixels; `None` while the pointer is outside the window.
    pub pointer_pos: Option<(f32, f32)>,
    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Folds `ev` into the held-state sets.
    pub fn apply(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases are not delivered to unfocused windows.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => self.pointer_pos = Some((*x, *y)),
            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key { key, state, modifiers, .. } => {
                self.modifiers = *modifiers;
                match state {
                    KeyState::Pressed => self.keys_down.insert(*key),
                    KeyState::Released => self.keys_down.remove(key),
                };
            }

            InputEvent::PointerButton { button, pressed, x, y, modifiers } => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;
                if *pressed {
                    self.buttons_down.insert(*button);
                } else {
                    self.buttons_down.remove(button);
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => self.modifiers = *modifiers,
            InputEvent::Text(_) => {}
        }
    }

    #[inline]
    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    #[inline]
    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, modifiers: Modifiers::default(), repeat: false }
    }

    #[test]
    fn tracks_held_keys_and_buttons() {
        let mut s = InputState::default();
        s.apply(&key(Key::Char('a'), KeyState::Pressed));
        s.apply(&InputEvent::PointerButton {
            button: MouseButton::Left,
            pressed: true,
            x: 3.0,
            y: 4.0,
            modifiers: Modifiers::default(),
        });
        assert!(s.key_down(Key::Char('a')));
        assert!(s.button_down(MouseButton::Left));
        assert_eq!(s.pointer_pos, Some((3.0, 4.0)));

        s.apply(&key(Key::Char('a'), KeyState::Released));
        assert!(!s.key_down(Key::Char('a')));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::default();
        s.apply(&key(Key::Shift, KeyState::Pressed));
        s.apply(&InputEvent::Focused(false));
        assert!(s.keys_down.is_empty());
    }
}
