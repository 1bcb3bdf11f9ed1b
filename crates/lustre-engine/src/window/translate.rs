use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, Ime, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::Window;

use crate::input::{InputEvent, InputState, Key, KeyState, Modifiers, MouseButton, MouseWheelDelta};

/// Translates a winit `WindowEvent` into zero or more engine `InputEvent`s.
///
/// A key press carrying text yields the `Key` event followed by a `Text`
/// event.
pub(crate) fn translate_window_event(
    window: &Window,
    state: &InputState,
    event: &WindowEvent,
    out: &mut Vec<InputEvent>,
) {
    match event {
        // winit 0.30 wraps the state; `.state()` unwraps it.
        WindowEvent::ModifiersChanged(m) => {
            out.push(InputEvent::ModifiersChanged(map_modifiers(m.state())));
        }

        WindowEvent::Focused(f) => out.push(InputEvent::Focused(*f)),
        WindowEvent::CursorLeft { .. } => out.push(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            out.push(InputEvent::PointerMoved { x, y });
        }

        WindowEvent::MouseInput { state: st, button, .. } => {
            // winit has no cursor query; use the tracked position.
            let (x, y) = state.pointer_pos.unwrap_or((0.0, 0.0));
            out.push(InputEvent::PointerButton {
                button: map_mouse_button(*button),
                pressed: *st == ElementState::Pressed,
                x,
                y,
                modifiers: state.modifiers,
            });
        }

        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(_, y) => MouseWheelDelta::Lines(*y),
                MouseScrollDelta::PixelDelta(p) => MouseWheelDelta::Pixels(p.y as f32),
            };
            out.push(InputEvent::MouseWheel { delta, modifiers: state.modifiers });
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let pressed = event.state == ElementState::Pressed;
            out.push(InputEvent::Key {
                key: map_key(event.physical_key),
                state: if pressed { KeyState::Pressed } else { KeyState::Released },
                modifiers: state.modifiers,
                repeat: event.repeat,
            });
            if pressed {
                if let Some(text) = event.text.as_ref().filter(|t| !t.is_empty()) {
                    out.push(InputEvent::Text(text.to_string()));
                }
            }
        }

        WindowEvent::Ime(Ime::Commit(text)) if !text.is_empty() => {
            out.push(InputEvent::Text(text.clone()));
        }

        _ => {}
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let logical = pos.to_logical::<f64>(window.scale_factor());
    (logical.x as f32, logical.y as f32)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Unknown(0);
    };
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

        KeyCode::KeyA => Key::Char('a'),
        KeyCode::KeyB => Key::Char('b'),
        KeyCode::KeyC => Key::Char('c'),
        KeyCode::KeyD => Key::Char('d'),
        KeyCode::KeyE => Key::Char('e'),
        KeyCode::KeyF => Key::Char('f'),
        KeyCode::KeyG => Key::Char('g'),
        KeyCode::KeyH => Key::Char('h'),
        KeyCode::KeyI => Key::Char('i'),
        KeyCode::KeyJ => Key::Char('j'),
        KeyCode::KeyK => Key::Char('k'),
        KeyCode::KeyL => Key::Char('l'),
        KeyCode::KeyM => Key::Char('m'),
        KeyCode::KeyN => Key::Char('n'),
        KeyCode::KeyO => Key::Char('o'),
        KeyCode::KeyP => Key::Char('p'),
        KeyCode::KeyQ => Key::Char('q'),
        KeyCode::KeyR => Key::Char('r'),
        KeyCode::KeyS => Key::Char('s'),
        KeyCode::KeyT => Key::Char('t'),
        KeyCode::KeyU => Key::Char('u'),
        KeyCode::KeyV => Key::Char('v'),
        KeyCode::KeyW => Key::Char('w'),
        KeyCode::KeyX => Key::Char('x'),
        KeyCode::KeyY => Key::Char('y'),
        KeyCode::KeyZ => Key::Char('z'),

        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Char('0'),
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Char('1'),
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Char('2'),
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Char('3'),
        KeyCode::Digit4 | KeyCode::Numpad4 => Key::Char('4'),
        KeyCode::Digit5 | KeyCode::Numpad5 => Key::Char('5'),
        KeyCode::Digit6 | KeyCode::Numpad6 => Key::Char('6'),
        KeyCode::Digit7 | KeyCode::Numpad7 => Key::Char('7'),
        KeyCode::Digit8 | KeyCode::Numpad8 => Key::Char('8'),
        KeyCode::Digit9 | KeyCode::Numpad9 => Key::Char('9'),

        KeyCode::F1 => Key::Function(1),
        KeyCode::F2 => Key::Function(2),
        KeyCode::F3 => Key::Function(3),
        KeyCode::F4 => Key::Function(4),
        KeyCode::F5 => Key::Function(5),
        KeyCode::F6 => Key::Function(6),
        KeyCode::F7 => Key::Function(7),
        KeyCode::F8 => Key::Function(8),
        KeyCode::F9 => Key::Function(9),
        KeyCode::F10 => Key::Function(10),
        KeyCode::F11 => Key::Function(11),
        KeyCode::F12 => Key::Function(12),

        other => Key::Unknown(other as u32),
    }
}
