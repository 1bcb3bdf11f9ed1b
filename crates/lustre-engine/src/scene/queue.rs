use std::collections::BTreeMap;

use crate::error::DrawError;
use crate::paint::Color;
use crate::render::GraphicsContext;

use super::{DrawCmd, DrawState, LayerKey};

/// Commands recorded for one layer key.
#[derive(Debug, Default)]
struct Bucket {
    cmds: Vec<DrawCmd>,
    /// Color last recorded into `cmds` this frame.
    color: Option<Color>,
}

/// Deferred draw queue with layer-ordered compositing.
///
/// Recording is only open between [`begin_frame`](Self::begin_frame) and
/// [`end_frame`](Self::end_frame); every mutating call outside that window
/// fails with [`DrawError::OutsideFrame`] and leaves the queue untouched.
///
/// Buckets persist across frames so their allocations are reused; only their
/// contents are cleared.
///
/// Color handling: the current color is part of [`DrawState`], not of a
/// bucket. The first drawing command appended to a bucket (and any drawing
/// command after a color change) is preceded by a `SetColor` carrying the
/// state color, so a bucket never inherits the color of whichever bucket
/// happened to replay before it.
#[derive(Debug, Default)]
pub struct DrawQueue {
    buckets: BTreeMap<LayerKey, Bucket>,
    state: DrawState,
    recording: bool,
}

impl DrawQueue {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every bucket, resets the draw state and opens recording.
    pub fn begin_frame(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.cmds.clear();
            bucket.color = None;
        }
        self.state = DrawState::default();
        self.recording = true;
    }

    /// Closes recording. Replay may follow.
    #[inline]
    pub fn end_frame(&mut self) {
        self.recording = false;
    }

    #[inline]
    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Fails unless a frame is being recorded.
    #[inline]
    pub fn ensure_recording(&self) -> Result<(), DrawError> {
        if self.recording { Ok(()) } else { Err(DrawError::OutsideFrame) }
    }

    pub fn set_layer(&mut self, layer: i32, sub_layer: i32) -> Result<(), DrawError> {
        self.ensure_recording()?;
        self.state.key = LayerKey::new(layer, sub_layer);
        Ok(())
    }

    pub fn set_sub_layer(&mut self, sub_layer: i32) -> Result<(), DrawError> {
        self.ensure_recording()?;
        self.state.key.sub_layer = sub_layer;
        Ok(())
    }

    pub fn set_color(&mut self, color: Color) -> Result<(), DrawError> {
        self.ensure_recording()?;
        self.state.color = color;
        Ok(())
    }

    /// Appends `cmd` to the bucket of the current layer key.
    pub fn append(&mut self, cmd: DrawCmd) -> Result<(), DrawError> {
        self.ensure_recording()?;

        let color = self.state.color;
        let bucket = self.buckets.entry(self.state.key).or_default();

        if cmd.draws() && bucket.color != Some(color) {
            bucket.cmds.push(DrawCmd::SetColor(color));
            bucket.color = Some(color);
        }
        bucket.cmds.push(cmd);
        Ok(())
    }

    /// Executes every recorded command: buckets in ascending key order,
    /// commands in append order within a bucket.
    pub fn replay(&self, ctx: &mut dyn GraphicsContext) {
        for cmd in self.buckets.values().flat_map(|b| b.cmds.iter()) {
            cmd.execute(ctx);
        }
    }

    /// Recorded commands (including injected color changes) in replay order.
    pub fn iter_in_replay_order(&self) -> impl Iterator<Item = (LayerKey, &DrawCmd)> {
        self.buckets
            .iter()
            .flat_map(|(key, b)| b.cmds.iter().map(move |cmd| (*key, cmd)))
    }

    /// Total number of recorded commands.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.cmds.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::scene::QuadCmd;
    use crate::testing::{RecordedOp, RecordingContext};

    fn marker(x: f32) -> DrawCmd {
        DrawCmd::Quad(QuadCmd::image(None, x, 0.0, 1.0, 1.0, None))
    }

    fn drawn_xs(ctx: &RecordingContext) -> Vec<f32> {
        ctx.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Fan { positions, .. } => Some(positions[0].x),
                _ => None,
            })
            .collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn replays_buckets_in_key_order_and_fifo_within() {
        let mut q = DrawQueue::new();
        q.begin_frame();

        q.set_layer(5, 0).unwrap();
        q.append(marker(50.0)).unwrap();
        q.set_layer(-1, 2).unwrap();
        q.append(marker(-12.0)).unwrap();
        q.set_layer(5, 0).unwrap();
        q.append(marker(51.0)).unwrap();
        q.set_layer(-1, 0).unwrap();
        q.append(marker(-10.0)).unwrap();
        q.set_sub_layer(2).unwrap();
        q.append(marker(-13.0)).unwrap();
        q.end_frame();

        let mut ctx = RecordingContext::default();
        q.replay(&mut ctx);
        assert_eq!(drawn_xs(&ctx), vec![-10.0, -12.0, -13.0, 50.0, 51.0]);
    }

    #[test]
    fn keys_visited_are_non_decreasing() {
        let mut q = DrawQueue::new();
        q.begin_frame();
        for (i, layer) in [3, 1, 4, 1, 5, 9, 2, 6].into_iter().enumerate() {
            q.set_layer(layer, (i % 3) as i32).unwrap();
            q.append(marker(i as f32)).unwrap();
        }
        let keys: Vec<LayerKey> = q.iter_in_replay_order().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    // ── frame window ──────────────────────────────────────────────────────

    #[test]
    fn calls_outside_frame_fail_without_mutation() {
        let mut q = DrawQueue::new();
        assert_eq!(q.append(marker(0.0)), Err(DrawError::OutsideFrame));
        assert_eq!(q.set_layer(3, 1), Err(DrawError::OutsideFrame));
        assert_eq!(q.set_color(Color::black()), Err(DrawError::OutsideFrame));
        assert!(q.is_empty());
        assert_eq!(q.state(), DrawState::default());

        q.begin_frame();
        q.append(marker(0.0)).unwrap();
        q.end_frame();
        let before = q.len();
        assert_eq!(q.append(marker(1.0)), Err(DrawError::OutsideFrame));
        assert_eq!(q.set_sub_layer(7), Err(DrawError::OutsideFrame));
        assert_eq!(q.len(), before);
    }

    #[test]
    fn begin_frame_clears_contents_and_resets_state() {
        let mut q = DrawQueue::new();
        q.begin_frame();
        q.set_layer(2, 2).unwrap();
        q.set_color(Color::black()).unwrap();
        q.append(marker(0.0)).unwrap();
        q.end_frame();

        q.begin_frame();
        assert!(q.is_empty());
        assert_eq!(q.state(), DrawState::default());
    }

    // ── colors ────────────────────────────────────────────────────────────

    #[test]
    fn each_bucket_starts_with_the_state_color() {
        let red = Color::from_rgb([1.0, 0.0, 0.0]);
        let mut q = DrawQueue::new();
        q.begin_frame();

        q.set_layer(1, 0).unwrap();
        q.set_color(red).unwrap();
        q.append(marker(1.0)).unwrap();
        q.set_layer(0, 0).unwrap();
        q.append(marker(0.0)).unwrap();

        let mut ctx = RecordingContext::default();
        q.replay(&mut ctx);
        assert_eq!(ctx.fan_colors(), vec![red, red]);
    }

    #[test]
    fn color_change_within_a_bucket_is_recorded_once() {
        let mut q = DrawQueue::new();
        q.begin_frame();
        q.append(marker(0.0)).unwrap();
        q.append(marker(1.0)).unwrap();
        q.set_color(Color::black()).unwrap();
        q.append(marker(2.0)).unwrap();

        let set_colors = q
            .iter_in_replay_order()
            .filter(|(_, c)| matches!(c, DrawCmd::SetColor(_)))
            .count();
        assert_eq!(set_colors, 2);
    }

    #[test]
    fn viewport_commands_replay_in_place() {
        let mut q = DrawQueue::new();
        q.begin_frame();
        let vp = Rect::new(10.0, 10.0, 50.0, 50.0);
        q.append(DrawCmd::SetViewport(vp)).unwrap();
        q.append(marker(1.0)).unwrap();

        let mut ctx = RecordingContext::default();
        q.replay(&mut ctx);
        assert_eq!(ctx.ops[0], RecordedOp::Viewport(vp));
        match &ctx.ops.last() {
            Some(RecordedOp::Fan { positions, .. }) => assert_eq!(positions[0], Vec2::new(1.0, 0.0)),
            other => panic!("unexpected op {other:?}"),
        }
    }
}
