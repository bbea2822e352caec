//! Process-wide graphics backend bring-up
//!
//! The backend is initialized exactly once per process, lazily, when the
//! first surface context is created - the earliest point a surface exists to
//! select a compatible adapter against (capability queries are meaningless
//! before that). The bring-up logs the backend's identity and capability set
//! for diagnostics, then validates the capabilities later recorded
//! operations are assumed to depend on. A missing capability is fatal:
//! continuing without it would silently corrupt rendering, so the engine
//! reports and terminates instead.

use std::sync::OnceLock;

use crate::error::ReplayError;

static INSTANCE: OnceLock<wgpu::Instance> = OnceLock::new();
static GPU: OnceLock<Gpu> = OnceLock::new();

/// Capabilities recorded operations depend on.
///
/// Traces issue instanced draws with per-draw first-instance offsets; on
/// adapters where that is optional it must be present or replay is not
/// faithful.
const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::INDIRECT_FIRST_INSTANCE;

/// The shared wgpu instance. Cheap to create, needed before any surface.
pub(crate) fn instance() -> &'static wgpu::Instance {
    INSTANCE.get_or_init(|| {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    })
}

/// Process-wide adapter, device, and queue shared by all surface contexts.
pub struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Gpu {
    /// Initialize the backend, or return the already-initialized handle.
    ///
    /// Idempotent: the first call performs adapter selection, diagnostic
    /// logging, capability validation, and device creation; subsequent calls
    /// are no-ops returning the existing handle.
    pub(crate) fn init(surface: &wgpu::Surface<'_>) -> Result<&'static Gpu, ReplayError> {
        if let Some(gpu) = GPU.get() {
            return Ok(gpu);
        }

        let adapter =
            pollster::block_on(instance().request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            }))
            .map_err(|e| ReplayError::Adapter(e.to_string()))?;

        let info = adapter.get_info();
        tracing::info!(
            "graphics adapter: {} ({:?}, driver {} {})",
            info.name,
            info.backend,
            info.driver,
            info.driver_info
        );
        tracing::debug!("adapter features: {:?}", adapter.features());

        if !adapter.features().contains(REQUIRED_FEATURES) {
            return Err(ReplayError::Capability(format!(
                "adapter {} does not support {:?}",
                info.name, REQUIRED_FEATURES
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Replay Device"),
            required_features: REQUIRED_FEATURES,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        }))?;

        Ok(GPU.get_or_init(|| Gpu {
            adapter,
            device,
            queue,
        }))
    }

    /// The initialized backend, if any surface context exists yet.
    ///
    /// Recorded operations that issue backend work run after the trace has
    /// created a surface, so `None` here indicates a step-ordering bug in
    /// the trace.
    pub fn get() -> Option<&'static Gpu> {
        GPU.get()
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
