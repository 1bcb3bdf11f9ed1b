//! Shared GPU types and utilities for the quad renderer.

use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Viewport};

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

/// Minimum binding size for the viewport uniform buffer.
pub(super) fn viewport_ubo_min_binding_size() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64)
}

// ── scissor rect ──────────────────────────────────────────────────────────

/// Converts a logical-pixel clip rect to physical scissor rect arguments.
///
/// Returns `None` if the clipped rect is zero-area (the draw call is skipped).
pub(super) fn logical_clip_to_scissor(
    clip: Rect,
    viewport: Viewport,
    scale: f32,
) -> Option<(u32, u32, u32, u32)> {
    let phys_vw = (viewport.width * scale).max(1.0) as u32;
    let phys_vh = (viewport.height * scale).max(1.0) as u32;

    let x = ((clip.origin.x * scale).max(0.0) as u32).min(phys_vw);
    let y = ((clip.origin.y * scale).max(0.0) as u32).min(phys_vh);
    let x2 = (((clip.origin.x + clip.size.x) * scale).max(0.0).ceil() as u32).min(phys_vw);
    let y2 = (((clip.origin.y + clip.size.y) * scale).max(0.0).ceil() as u32).min(phys_vh);
    let (w, h) = (x2.saturating_sub(x), y2.saturating_sub(y));

    if w == 0 || h == 0 { None } else { Some((x, y, w, h)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scissor_scales_and_clamps() {
        let vp = Viewport::new(100.0, 50.0);
        assert_eq!(
            logical_clip_to_scissor(Rect::new(10.0, 5.0, 20.0, 10.0), vp, 2.0),
            Some((20, 10, 40, 20))
        );
        assert_eq!(
            logical_clip_to_scissor(Rect::new(90.0, 0.0, 50.0, 50.0), vp, 1.0),
            Some((90, 0, 10, 50))
        );
        assert_eq!(logical_clip_to_scissor(Rect::new(200.0, 0.0, 5.0, 5.0), vp, 1.0), None);
    }
}
