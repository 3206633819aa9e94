//! Device and queue ownership.

use pollster::FutureExt;

use crate::error::{RenderError, RenderResult};

/// Backends the headless context requests adapters from.
///
/// GL is excluded: there, storage writes to one mip of a texture are dropped
/// once another mip of it has been bound for sampling. The mip and filter
/// stages do exactly that.
pub const HEADLESS_BACKENDS: wgpu::Backends = wgpu::Backends::PRIMARY;

/// Whether the compute stages produce correct results on `backend`.
#[must_use]
pub fn supports_backend(backend: wgpu::Backend) -> bool {
    matches!(
        backend,
        wgpu::Backend::Vulkan
            | wgpu::Backend::Metal
            | wgpu::Backend::Dx12
            | wgpu::Backend::BrowserWebGpu
    )
}

/// The wgpu device and queue the probe pipeline runs on.
///
/// The context can be created headless, or wrap a device already owned by
/// a renderer so the probe textures live on the same device as the draws
/// that sample them.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    adapter_info: Option<wgpu::AdapterInfo>,
}

impl GpuContext {
    /// Creates a device with no surface.
    ///
    /// Only [`HEADLESS_BACKENDS`] are considered. A machine with nothing but
    /// a GL adapter gets [`RenderError::AdapterCreationFailed`].
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: HEADLESS_BACKENDS,
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let adapter_info = adapter.get_info();
        if !supports_backend(adapter_info.backend) {
            log::warn!(
                "Rejecting adapter {} ({:?}): backend cannot run the probe stages",
                adapter_info.name,
                adapter_info.backend
            );
            return Err(RenderError::AdapterCreationFailed);
        }
        log::info!(
            "Using adapter {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("volprobe device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self {
            device,
            queue,
            adapter_info: Some(adapter_info),
        })
    }

    /// Blocking variant of [`GpuContext::new_headless`].
    pub fn new_headless_blocking() -> RenderResult<Self> {
        Self::new_headless().block_on()
    }

    /// Wraps an existing device and queue.
    ///
    /// The caller is responsible for the device not being a GL one, see
    /// [`supports_backend`].
    #[must_use]
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            adapter_info: None,
        }
    }

    /// Adapter description, when this context created its own adapter.
    #[must_use]
    pub fn adapter_info(&self) -> Option<&wgpu::AdapterInfo> {
        self.adapter_info.as_ref()
    }

    /// Blocks until all submitted work has finished.
    pub fn wait_idle(&self) {
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gl_backend_is_rejected() {
        assert!(!supports_backend(wgpu::Backend::Gl));
        assert!(!HEADLESS_BACKENDS.contains(wgpu::Backends::GL));
    }

    #[test]
    fn test_primary_backends_are_supported() {
        assert!(supports_backend(wgpu::Backend::Vulkan));
        assert!(supports_backend(wgpu::Backend::Metal));
        assert!(supports_backend(wgpu::Backend::Dx12));
    }
}
