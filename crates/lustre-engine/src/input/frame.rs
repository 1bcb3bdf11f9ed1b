use super::types::InputEvent;

/// Events received since the previous frame, in arrival order.
#[derive(Debug, Default)]
pub struct InputFrame {
    pub events: Vec<InputEvent>,
}

impl InputFrame {
    #[inline]
    pub fn push(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
