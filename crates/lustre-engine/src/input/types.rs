/// Keyboard key identifier, independent of the platform layer.
///
/// Letters and digits come from the physical key position so shortcuts
/// keep working across keyboard layouts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    Up,
    Down,
    Left,
    Right,

    Shift,
    Control,
    Alt,
    Meta,

    /// Letter or digit, lower-case.
    Char(char),
    /// `F1`..`F12`.
    Function(u8),

    /// Key not represented above, with its platform code.
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Modifier keys held while an event was produced.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Vertical wheel movement. Positive values scroll away from the user.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Lines(f32),
    Pixels(f32),
}

impl MouseWheelDelta {
    /// Direction of the movement: `1`, `-1` or `0`.
    pub fn steps(self) -> i32 {
        let v = match self {
            Self::Lines(v) | Self::Pixels(v) => v,
        };
        if v > 0.0 {
            1
        } else if v < 0.0 {
            -1
        } else {
            0
        }
    }
}

/// Platform-agnostic input events emitted by the window runtime.
///
/// Pointer coordinates are logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: Key,
        state: KeyState,
        modifiers: Modifiers,
        /// True when the event is an auto-repeat.
        repeat: bool,
    },

    PointerMoved {
        x: f32,
        y: f32,
    },

    PointerButton {
        button: MouseButton,
        pressed: bool,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    MouseWheel {
        delta: MouseWheelDelta,
        modifiers: Modifiers,
    },

    /// Committed text from a key press or an input method.
    Text(String),

    PointerLeft,

    Focused(bool),
}
