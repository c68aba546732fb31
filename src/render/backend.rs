use crate::{
    filter::{geometry::PassGeometry, uniforms::GlobalUniforms},
    foundation::core::{ProgramId, Rect, SurfaceId},
    foundation::error::FilterResult,
};

/// Blend equation selected for a filter pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source-over with premultiplied alpha.
    #[default]
    Normal,
    /// Additive.
    Add,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overwrite the destination, no blending.
    None,
}

/// Fixed-function state a filter pass draws with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DrawState {
    /// Blend equation.
    pub blend: BlendMode,
    /// Whether depth testing is enabled.
    pub depth_test: bool,
    /// Whether stencil testing is enabled.
    pub stencil_test: bool,
    /// Whether back faces are culled.
    pub culling: bool,
}

/// Primitive topology for a filter pass draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    /// Indexed triangle list.
    Triangles,
    /// Indexed triangle strip.
    TriangleStrip,
}

/// Where a filter pass writes.
///
/// `surface == None` is the backbuffer. `frame` scopes the binding to a sub-region of the surface;
/// `None` binds the whole surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassTarget {
    /// Target surface, or `None` for the backbuffer.
    pub surface: Option<SurfaceId>,
    /// Region of the target covered by this pass.
    pub frame: Option<Rect>,
}

impl PassTarget {
    /// The backbuffer, unscoped.
    pub const SCREEN: Self = Self {
        surface: None,
        frame: None,
    };
}

/// Inputs handed to the shader binder for one pass.
///
/// `globals` is borrowed for the duration of the call only: the block is overwritten by the next
/// pop, so backends must upload (copy) it before returning.
#[derive(Clone, Copy, Debug)]
pub struct ShaderInputs<'a> {
    /// Surface sampled as the filter's input texture.
    pub sampler: SurfaceId,
    /// Shared per-pop uniform block.
    pub globals: &'a GlobalUniforms,
}

/// Render-target side of the rendering backend.
pub trait SurfaceBackend {
    /// Allocate a surface of exactly `width x height` device pixels.
    fn create_surface(&mut self, width: u32, height: u32) -> FilterResult<SurfaceId>;

    /// Set the device-pixel ratio a surface is addressed with.
    fn set_surface_resolution(&mut self, surface: SurfaceId, resolution: f64);

    /// Release the backend resources of a surface.
    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Make `target` the active render target.
    fn bind_target(&mut self, target: PassTarget) -> FilterResult<()>;

    /// Clear the active render target to transparent.
    fn clear(&mut self) -> FilterResult<()>;

    /// The currently bound surface, `None` when rendering to the backbuffer.
    fn current_target(&self) -> Option<SurfaceId>;

    /// The source frame of the currently bound target, in CSS pixels.
    fn current_source_frame(&self) -> Rect;
}

/// Shader/geometry side of the rendering backend.
pub trait PassBackend {
    /// Apply fixed-function state.
    fn bind_state(&mut self, state: DrawState);

    /// Bind a filter program along with its input texture and the shared uniform block.
    fn bind_shader(&mut self, program: ProgramId, inputs: &ShaderInputs<'_>) -> FilterResult<()>;

    /// Bind the geometry for the next draw.
    fn bind_geometry(&mut self, geometry: PassGeometry<'_>) -> FilterResult<()>;

    /// Issue one draw with the bound state, shader and geometry.
    fn draw(&mut self, mode: DrawMode) -> FilterResult<()>;
}

/// Everything the filter system needs from a renderer.
pub trait FilterBackend: SurfaceBackend + PassBackend {}

impl<T: SurfaceBackend + PassBackend + ?Sized> FilterBackend for T {}
