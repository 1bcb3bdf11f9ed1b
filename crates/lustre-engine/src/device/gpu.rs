use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::GpuOptions;

/// Failures opening the GPU or presenting to the window.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("window has zero size")]
    ZeroSize,
    #[error("failed to create a surface for the window")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no GPU adapter can present to the window")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open the GPU device")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("the window surface offers no texture formats")]
    NoSurfaceFormat,
    #[error("out of memory acquiring the next frame")]
    OutOfMemory,
}

/// Device, queue and configured surface for one window.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// False while the window is minimized; the surface is left as is.
    drawable: bool,
}

/// Surface texture, its view and the encoder recording into it.
///
/// Present it before acquiring the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, options: GpuOptions) -> Result<Self, GpuError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(GpuError::ZeroSize);
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = open_device(&adapter, &options).await?;

        let config = surface_config(&surface.get_capabilities(&adapter), size, &options)?;
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "rendering on {} ({:?}): {:?}, {:?}, textures up to {}px",
            info.name,
            info.backend,
            config.format,
            config.present_mode,
            device.limits().max_texture_dimension_2d
        );

        Ok(Self { surface, device, queue, config, drawable: true })
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Follows a window resize. A zero size (minimized) pauses drawing.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.drawable = size.width > 0 && size.height > 0;
        if !self.drawable {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquires the next frame.
    ///
    /// `Ok(None)` skips this redraw: the window is minimized, the surface
    /// timed out, or it was stale and has just been reconfigured.
    pub fn begin_frame(&mut self) -> Result<Option<GpuFrame>, GpuError> {
        if !self.drawable {
            return Ok(None);
        }
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(GpuError::OutOfMemory),
            Err(err) => {
                log::debug!("skipping frame: {err}");
                return Ok(None);
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lustre frame encoder"),
            });
        Ok(Some(GpuFrame { surface_texture, view, encoder }))
    }

    /// Submits the frame's commands and shows it.
    pub fn present(&self, frame: GpuFrame) {
        let GpuFrame { surface_texture, view, encoder } = frame;
        self.queue.submit([encoder.finish()]);
        drop(view);
        surface_texture.present();
    }
}

async fn open_device(
    adapter: &wgpu::Adapter,
    options: &GpuOptions,
) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
    let limits = options.limits.clone().using_resolution(adapter.limits());
    let pair = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("lustre device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok(pair)
}

/// Surface configuration for `size` from what the surface supports.
fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    size: PhysicalSize<u32>,
    options: &GpuOptions,
) -> Result<wgpu::SurfaceConfiguration, GpuError> {
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == options.srgb)
        .or_else(|| caps.formats.first().copied())
        .ok_or(GpuError::NoSurfaceFormat)?;

    // Fifo is the one mode every surface supports.
    let present_mode = if options.vsync {
        wgpu::PresentMode::Fifo
    } else {
        [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
            .into_iter()
            .find(|m| caps.present_modes.contains(m))
            .unwrap_or(wgpu::PresentMode::Fifo)
    };

    // The clear color is opaque; window transparency is not used.
    let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
        wgpu::CompositeAlphaMode::Opaque
    } else {
        caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto)
    };

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: options.max_frame_latency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode as Alpha, PresentMode, TextureFormat};

    fn caps(formats: Vec<TextureFormat>, present_modes: Vec<PresentMode>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes,
            alpha_modes: vec![Alpha::PreMultiplied, Alpha::Opaque],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    const SIZE: PhysicalSize<u32> = PhysicalSize::new(640, 480);

    #[test]
    fn prefers_a_linear_format_and_opaque_alpha() {
        let caps = caps(
            vec![TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm],
            vec![PresentMode::Fifo],
        );
        let config = surface_config(&caps, SIZE, &GpuOptions::default()).unwrap();
        assert_eq!(config.format, TextureFormat::Bgra8Unorm);
        assert_eq!(config.alpha_mode, Alpha::Opaque);
        assert_eq!(config.present_mode, PresentMode::Fifo);
        assert_eq!((config.width, config.height), (640, 480));

        let srgb = GpuOptions { srgb: true, ..GpuOptions::default() };
        let config = surface_config(&caps, SIZE, &srgb).unwrap();
        assert_eq!(config.format, TextureFormat::Bgra8UnormSrgb);
    }

    #[test]
    fn without_vsync_picks_the_fastest_offered_mode() {
        let options = GpuOptions { vsync: false, ..GpuOptions::default() };
        let formats = vec![TextureFormat::Rgba8Unorm];

        let immediate = caps(formats.clone(), vec![PresentMode::Fifo, PresentMode::Immediate]);
        let config = surface_config(&immediate, SIZE, &options).unwrap();
        assert_eq!(config.present_mode, PresentMode::Immediate);

        let fifo_only = caps(formats, vec![PresentMode::Fifo]);
        let config = surface_config(&fifo_only, SIZE, &options).unwrap();
        assert_eq!(config.present_mode, PresentMode::Fifo);
    }

    #[test]
    fn a_surface_without_formats_is_an_error() {
        let err = surface_config(&caps(vec![], vec![]), SIZE, &GpuOptions::default()).unwrap_err();
        assert!(matches!(err, GpuError::NoSurfaceFormat));
    }
}
