//! Surface contexts: one native window + graphics surface per trace surface
//!
//! A trace may render to several surfaces. Each [`SurfaceContext`] owns one
//! native window, the graphics surface configured against it, and the handle
//! table scoped to it. The native half sits behind the narrow
//! [`NativeSurface`] / [`SurfaceBackend`] traits; [`WindowSurface`] and
//! [`WinitBackend`] are the production implementations on winit + wgpu.

use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::error::ReplayError;
use crate::gpu::{self, Gpu};
use crate::handle::{HandleTable, NativeObject, ObjectHandle, SurfaceHandle};

/// Default pixel size of a newly created surface window.
///
/// Traces recorded against differently sized surfaces resize on the first
/// make-current that carries explicit dimensions.
pub const DEFAULT_SURFACE_WIDTH: u32 = 800;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 480;

/// The native window/graphics pair a surface context drives.
///
/// The engine needs only this much from the windowing and graphics backend;
/// everything above it (handle tables, currency, resize policy, present
/// ordering) is engine logic and testable against a mock implementation.
pub trait NativeSurface {
    /// Current drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resize the native window and its swapchain.
    fn set_size(&mut self, width: u32, height: u32);

    /// The render-target view for the current frame, acquiring it if needed.
    ///
    /// `None` when no frame can be acquired this iteration (transient
    /// backend condition, already logged).
    fn frame_view(&mut self) -> Option<&wgpu::TextureView>;

    /// Depth attachment matching the current drawable size.
    fn depth_view(&self) -> Option<&wgpu::TextureView>;

    /// Present the current frame, acquiring one first if no recorded
    /// operation did.
    fn present(&mut self);
}

/// Creates native surfaces. Production: [`WinitBackend`].
pub trait SurfaceBackend {
    fn create_surface(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn NativeSurface>, ReplayError>;
}

/// Production surface: a winit window plus its wgpu surface and depth buffer.
pub struct WindowSurface {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    depth_view: wgpu::TextureView,
    frame: Option<wgpu::SurfaceTexture>,
    frame_view: Option<wgpu::TextureView>,
}

impl WindowSurface {
    /// Build the graphics surface for an existing window, triggering backend
    /// bring-up if this is the first surface of the process.
    pub fn new(window: Arc<Window>) -> Result<Self, ReplayError> {
        let surface = gpu::instance().create_surface(window.clone())?;
        let gpu = Gpu::init(&surface)?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(gpu.adapter());
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // The orchestrator paces frames explicitly; the swapchain must
            // not impose its own pacing.
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &config);

        let depth_view = Self::create_depth_view(gpu.device(), config.width, config.height);

        tracing::info!(
            "surface ready: {}x{}, format {:?}",
            config.width,
            config.height,
            surface_format
        );

        Ok(Self {
            window,
            surface,
            config,
            device: gpu.device().clone(),
            depth_view,
            frame: None,
            frame_view: None,
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Surface Depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth24Plus,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn acquire(&mut self) {
        if self.frame.is_some() {
            return;
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                match self.surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("failed to acquire frame after reconfigure: {e:?}");
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("failed to acquire frame: {e:?}");
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(frame);
        self.frame_view = Some(view);
    }
}

impl NativeSurface for WindowSurface {
    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let _ = self.window.request_inner_size(PhysicalSize::new(width, height));
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Self::create_depth_view(&self.device, width, height);

        tracing::debug!("surface resized to {width}x{height}");
    }

    fn frame_view(&mut self) -> Option<&wgpu::TextureView> {
        self.acquire();
        self.frame_view.as_ref()
    }

    fn depth_view(&self) -> Option<&wgpu::TextureView> {
        Some(&self.depth_view)
    }

    fn present(&mut self) {
        // Every live surface swaps once per iteration, drawn on or not.
        self.acquire();
        if let Some(frame) = self.frame.take() {
            frame.present();
        }
        self.frame_view = None;
    }
}

/// Surface factory bound to the running event loop.
///
/// winit only allows window creation from inside the event loop, so the
/// orchestrator constructs one of these per frame callback and hands it to
/// recorded operations through their context.
pub struct WinitBackend<'a> {
    event_loop: &'a ActiveEventLoop,
}

impl<'a> WinitBackend<'a> {
    pub fn new(event_loop: &'a ActiveEventLoop) -> Self {
        Self { event_loop }
    }
}

impl SurfaceBackend for WinitBackend<'_> {
    fn create_surface(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn NativeSurface>, ReplayError> {
        let attributes = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(self.event_loop.create_window(attributes)?);
        Ok(Box::new(WindowSurface::new(window)?))
    }
}

/// One trace surface: window, graphics surface, and its handle table.
pub struct SurfaceContext {
    handle: SurfaceHandle,
    title: String,
    width: u32,
    height: u32,
    native: Box<dyn NativeSurface>,
    objects: HandleTable<NativeObject>,
}

impl SurfaceContext {
    /// Create the window and graphics surface for a trace surface handle.
    ///
    /// Creation failure is fatal to the run: there is no recovery path for a
    /// missing graphics capability.
    pub(crate) fn new(
        backend: &mut dyn SurfaceBackend,
        trace_name: &str,
        handle: SurfaceHandle,
    ) -> Result<Self, ReplayError> {
        let title = format!("{trace_name} : {}", handle.0);
        let native = backend.create_surface(&title, DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)?;
        // The backend reports the drawable's actual pixel size, which may
        // differ from the requested window size.
        let (width, height) = native.size();

        Ok(Self {
            handle,
            title,
            width,
            height,
            native,
            objects: HandleTable::new(),
        })
    }

    /// Apply a make-current with optional explicit dimensions.
    ///
    /// Dimensions that differ from the stored size resize the native window
    /// and swapchain to match - a trace recorded against a differently sized
    /// surface replaying into a resized window. Equal dimensions issue no
    /// native resize at all.
    pub fn make_current(&mut self, dimensions: Option<(u32, u32)>) {
        if let Some((width, height)) = dimensions
            && (width, height) != (self.width, self.height)
        {
            self.width = width;
            self.height = height;
            self.native.set_size(width, height);
        }
    }

    /// Present this surface's frame.
    pub fn present(&mut self) {
        self.native.present();
    }

    /// Resolve a trace object handle to the backend object bound to it.
    /// Handle 0 is always "no object".
    pub fn resolve_object(&self, handle: ObjectHandle) -> Option<NativeObject> {
        self.objects.resolve(handle)
    }

    /// Insert or overwrite the binding for a trace object handle.
    pub fn bind_object(&mut self, handle: ObjectHandle, object: NativeObject) {
        self.objects.bind(handle, object);
    }

    /// Render-target view for the current frame, acquiring it if needed.
    pub fn frame_view(&mut self) -> Option<&wgpu::TextureView> {
        self.native.frame_view()
    }

    /// Depth attachment matching the current drawable size.
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.native.depth_view()
    }

    pub fn handle(&self) -> SurfaceHandle {
        self.handle
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    enum MockCall {
        SetSize(u32, u32),
        Present,
    }

    struct MockNative {
        size: (u32, u32),
        calls: Rc<RefCell<Vec<MockCall>>>,
    }

    impl NativeSurface for MockNative {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.calls.borrow_mut().push(MockCall::SetSize(width, height));
        }

        fn frame_view(&mut self) -> Option<&wgpu::TextureView> {
            None
        }

        fn depth_view(&self) -> Option<&wgpu::TextureView> {
            None
        }

        fn present(&mut self) {
            self.calls.borrow_mut().push(MockCall::Present);
        }
    }

    struct MockBackend {
        calls: Rc<RefCell<Vec<MockCall>>>,
    }

    impl SurfaceBackend for MockBackend {
        fn create_surface(
            &mut self,
            _title: &str,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn NativeSurface>, ReplayError> {
            Ok(Box::new(MockNative {
                size: (width, height),
                calls: self.calls.clone(),
            }))
        }
    }

    fn mock_context() -> (SurfaceContext, Rc<RefCell<Vec<MockCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut backend = MockBackend {
            calls: calls.clone(),
        };
        let context = SurfaceContext::new(&mut backend, "trace", SurfaceHandle(1)).unwrap();
        (context, calls)
    }

    #[test]
    fn test_created_with_default_size_and_title() {
        let (context, _) = mock_context();
        assert_eq!(context.size(), (DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT));
        assert_eq!(context.title(), "trace : 1");
        assert_eq!(context.handle(), SurfaceHandle(1));
    }

    #[test]
    fn test_make_current_without_dimensions_never_resizes() {
        let (mut context, calls) = mock_context();
        context.make_current(None);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_make_current_same_size_is_noop() {
        let (mut context, calls) = mock_context();
        context.make_current(Some((DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)));
        assert!(calls.borrow().is_empty());
        assert_eq!(context.size(), (DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT));
    }

    #[test]
    fn test_make_current_new_size_resizes_once() {
        let (mut context, calls) = mock_context();
        context.make_current(Some((1024, 576)));
        assert_eq!(context.size(), (1024, 576));
        assert_eq!(*calls.borrow(), vec![MockCall::SetSize(1024, 576)]);

        // Repeating the same dimensions is a no-op again.
        context.make_current(Some((1024, 576)));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_fresh_context_resolves_nothing() {
        // Binding real backend objects needs a GPU; table semantics are
        // covered generically in handle.rs. Here: a fresh context starts
        // empty and zero never resolves.
        let (context, _) = mock_context();
        assert!(context.resolve_object(ObjectHandle::NONE).is_none());
        assert!(context.resolve_object(ObjectHandle(3)).is_none());
    }

    #[test]
    fn test_present_forwards_to_native() {
        let (mut context, calls) = mock_context();
        context.present();
        context.present();
        assert_eq!(*calls.borrow(), vec![MockCall::Present, MockCall::Present]);
    }
}
