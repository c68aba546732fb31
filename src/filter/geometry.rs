//! Full-screen quads filter passes draw with.
//!
//! Modern filters draw a unit quad in clip space and derive texture coordinates from the
//! [`crate::GlobalUniforms`] block in the shader. Legacy filters draw a quad in output space whose
//! texture coordinates are precomputed from the input texture and its filter frame.

use crate::{
    foundation::core::Rect,
    foundation::error::{FilterError, FilterResult},
    render::backend::DrawMode,
    render::texture::RenderTexture,
};

/// Clip-space unit quad, drawn as a triangle strip.
#[derive(Clone, Debug, PartialEq)]
pub struct Quad {
    /// `(x, y)` pairs.
    pub vertices: [f32; 8],
    /// Strip order.
    pub indices: [u16; 4],
}

impl Default for Quad {
    fn default() -> Self {
        Self {
            vertices: [-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0],
            indices: [0, 1, 3, 2],
        }
    }
}

/// Output-space quad with explicit texture coordinates, drawn as two triangles.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadUv {
    /// `(x, y)` pairs in output space.
    pub vertices: [f32; 8],
    /// `(u, v)` pairs in normalized input texture space.
    pub uvs: [f32; 8],
    /// Triangle list.
    pub indices: [u16; 6],
}

impl Default for QuadUv {
    fn default() -> Self {
        Self {
            vertices: [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            uvs: [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            indices: [0, 1, 2, 0, 2, 3],
        }
    }
}

impl QuadUv {
    /// Map the valid region `dest` of a texture whose full frame is `input_frame`.
    ///
    /// Texture coordinates cover `dest.size / input_frame.size` from the origin; vertices cover
    /// `dest` itself.
    pub fn map(&mut self, input_frame: Rect, dest: Rect) -> &Self {
        let u = (dest.width() / input_frame.width()) as f32;
        let v = (dest.height() / input_frame.height()) as f32;
        self.uvs = [0.0, 0.0, u, 0.0, u, v, 0.0, v];

        let (x0, y0) = (dest.x0 as f32, dest.y0 as f32);
        let (x1, y1) = (
            (dest.x0 + dest.width()) as f32,
            (dest.y0 + dest.height()) as f32,
        );
        self.vertices = [x0, y0, x1, y0, x1, y1, x0, y1];
        self
    }
}

/// Geometry bound for one filter pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassGeometry<'a> {
    /// Clip-space unit quad for modern filters.
    Unit(&'a Quad),
    /// Output-space mapped quad for legacy filters.
    Mapped(&'a QuadUv),
}

impl PassGeometry<'_> {
    /// Topology to draw the geometry with.
    pub fn draw_mode(&self) -> DrawMode {
        match self {
            Self::Unit(_) => DrawMode::TriangleStrip,
            Self::Mapped(_) => DrawMode::Triangles,
        }
    }

    /// Index buffer contents.
    pub fn indices(&self) -> &[u16] {
        match self {
            Self::Unit(q) => &q.indices,
            Self::Mapped(q) => &q.indices,
        }
    }
}

/// Owns both quads and picks one per pass.
#[derive(Clone, Debug, Default)]
pub(crate) struct PassGeometries {
    quad: Quad,
    quad_uv: QuadUv,
}

impl PassGeometries {
    pub(crate) fn for_pass(
        &mut self,
        legacy: bool,
        input: &RenderTexture,
    ) -> FilterResult<PassGeometry<'_>> {
        if !legacy {
            return Ok(PassGeometry::Unit(&self.quad));
        }
        let dest = input.filter_frame().ok_or_else(|| {
            FilterError::contract(format!(
                "legacy pass input {:?} has no filter frame",
                input.surface()
            ))
        })?;
        Ok(PassGeometry::Mapped(self.quad_uv.map(input.frame(), dest)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/geometry.rs"]
mod tests;
