/// How the window's GPU surface is set up.
#[derive(Debug, Clone)]
pub struct GpuOptions {
    /// Wait for vertical blank. When off, the lowest-latency mode the surface
    /// offers is used, falling back to vsync.
    pub vsync: bool,

    /// Pick an sRGB surface format. Off by default: script colors and decoded
    /// images are already gamma-encoded and blend in that space.
    pub srgb: bool,

    /// Frames the presentation engine may queue. A hint only.
    pub max_frame_latency: u32,

    /// Device limits to request. Texture dimensions are raised to whatever
    /// the adapter supports so large images can still be uploaded.
    pub limits: wgpu::Limits,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            vsync: true,
            srgb: false,
            max_frame_latency: 2,
            limits: wgpu::Limits::default(),
        }
    }
}
