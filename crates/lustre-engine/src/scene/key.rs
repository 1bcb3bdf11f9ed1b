use core::cmp::Ordering;

/// Bucket key for buffered draw commands.
///
/// Ordering rules:
/// 1) `layer`: ascending (back-to-front)
/// 2) `sub_layer`: ascending within the same layer
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct LayerKey {
    pub layer: i32,
    pub sub_layer: i32,
}

impl LayerKey {
    #[inline]
    pub const fn new(layer: i32, sub_layer: i32) -> Self {
        Self { layer, sub_layer }
    }
}

impl Ord for LayerKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        match self.layer.cmp(&other.layer) {
            Ordering::Equal => self.sub_layer.cmp(&other.sub_layer),
            o => o,
        }
    }
}

impl PartialOrd for LayerKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_layer_then_sub_layer() {
        let mut keys = vec![
            LayerKey::new(1, -5),
            LayerKey::new(0, 3),
            LayerKey::new(-2, 9),
            LayerKey::new(0, -1),
        ];
        keys.sort();
        assert_eq!(keys, vec![
            LayerKey::new(-2, 9),
            LayerKey::new(0, -1),
            LayerKey::new(0, 3),
            LayerKey::new(1, -5),
        ]);
    }
}
