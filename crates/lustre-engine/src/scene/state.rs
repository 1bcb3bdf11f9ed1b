use crate::paint::Color;

use super::LayerKey;

/// Implicit "current" layer and color read by drawing calls.
///
/// Reset to layer `(0, 0)` and opaque white at the start of every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawState {
    pub key: LayerKey,
    pub color: Color,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            key: LayerKey::default(),
            color: Color::white(),
        }
    }
}
