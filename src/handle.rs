//! Trace handles and the per-surface handle table
//!
//! A trace identifies objects by arbitrary integers chosen at recording
//! time. During replay the backend assigns its own objects, which differ
//! between runs, so each surface context keeps a table mapping trace-time
//! handles to the backend objects actually created. Surface handles and
//! object handles are distinct namespaces.

use hashbrown::HashMap;

/// Trace-time identifier for a surface/context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u32);

/// Trace-time identifier for a backend object (buffer, texture, pipeline...).
///
/// Handle 0 is reserved and always resolves to "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u32);

impl ObjectHandle {
    /// The reserved "no object" handle.
    pub const NONE: ObjectHandle = ObjectHandle(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A backend object created during replay.
///
/// wgpu resources are internally reference-counted, so cloning a variant is
/// cheap and preserves the copy-around semantics recorded operations expect
/// from integer object names.
#[derive(Debug, Clone)]
pub enum NativeObject {
    Buffer(wgpu::Buffer),
    Texture(wgpu::Texture),
    Sampler(wgpu::Sampler),
    ShaderModule(wgpu::ShaderModule),
    RenderPipeline(wgpu::RenderPipeline),
    BindGroup(wgpu::BindGroup),
}

impl NativeObject {
    pub fn as_buffer(&self) -> Option<&wgpu::Buffer> {
        match self {
            NativeObject::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&wgpu::Texture> {
        match self {
            NativeObject::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_render_pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        match self {
            NativeObject::RenderPipeline(pipeline) => Some(pipeline),
            _ => None,
        }
    }
}

/// Mapping from trace-time object handles to backend objects.
///
/// One table per surface context; no cross-surface sharing. Entries are
/// inserted on first creation and overwritten if the trace reuses a handle
/// after deleting the underlying object - the table trusts the trace and
/// does not validate reuse.
#[derive(Debug, Default)]
pub struct HandleTable<T> {
    entries: HashMap<ObjectHandle, T>,
}

impl<T: Clone> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Resolve a trace handle to the most recently bound object.
    ///
    /// Handle 0 always resolves to `None` without a lookup. Resolving a
    /// non-zero handle that was never bound is a logic error in the trace;
    /// the table returns `None` rather than guarding further.
    pub fn resolve(&self, handle: ObjectHandle) -> Option<T> {
        if handle.is_none() {
            return None;
        }
        self.entries.get(&handle).cloned()
    }

    /// Insert or overwrite the mapping for `handle`.
    pub fn bind(&mut self, handle: ObjectHandle, object: T) {
        self.entries.insert(handle, object);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
