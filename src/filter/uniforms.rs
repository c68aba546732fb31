use crate::{filter::state::FilterState, foundation::core::Rect};
use bytemuck::{Pod, Zeroable};

/// Uniform block shared by every filter pass of one pop.
///
/// Vectors are `[x, y, z, w]`. `input_size` is `(w, h, 1/w, 1/h)` of the destination frame in CSS
/// pixels, `input_pixel` the same in device pixels, and `input_clamp` the texture-space rectangle
/// (`min_x, min_y, max_x, max_y`) that stays half a texel inside the valid region.
///
/// There is one block per [`crate::FilterSystem`]. It is rewritten on every pop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalUniforms {
    /// Region of the parent target being written.
    pub output_frame: Rect,
    /// Resolution of the current chain.
    pub resolution: f64,
    /// Input texture size in CSS pixels and its reciprocals.
    pub input_size: [f64; 4],
    /// Input texture size in device pixels and its reciprocals.
    pub input_pixel: [f64; 4],
    /// Sampling bounds of the valid input region in normalized texture space.
    pub input_clamp: [f64; 4],
    /// Legacy: `(dest_w, dest_h, source_x, source_y)`.
    pub filter_area: [f64; 4],
    /// Legacy: same values as `input_clamp`.
    pub filter_clamp: [f64; 4],
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self {
            output_frame: Rect::ZERO,
            resolution: 1.0,
            input_size: [0.0; 4],
            input_pixel: [0.0; 4],
            input_clamp: [0.0; 4],
            filter_area: [0.0; 4],
            filter_clamp: [0.0; 4],
        }
    }
}

impl GlobalUniforms {
    /// Recompute the block for a popped state.
    ///
    /// The legacy rows are only written for legacy chains and keep their previous values otherwise.
    pub fn update(&mut self, state: &FilterState) {
        let source = state.source_frame;
        let dest = state.destination_frame;
        let res = state.resolution;

        self.output_frame = source;
        self.resolution = res;

        let (w, h) = (dest.width(), dest.height());
        self.input_size = [w, h, 1.0 / w, 1.0 / h];

        let (pw, ph) = (w * res, h * res);
        self.input_pixel = [pw, ph, 1.0 / pw, 1.0 / ph];

        let half_x = 0.5 * self.input_pixel[2];
        let half_y = 0.5 * self.input_pixel[3];
        self.input_clamp = [
            half_x,
            half_y,
            source.width() * self.input_size[2] - half_x,
            source.height() * self.input_size[3] - half_y,
        ];

        if state.legacy {
            self.filter_area = [w, h, source.x0, source.y0];
            self.filter_clamp = self.input_clamp;
        }
    }

    /// Pack into the `std140`-compatible layout shaders declare.
    pub fn to_gpu(&self) -> GpuFilterGlobals {
        fn f4(v: [f64; 4]) -> [f32; 4] {
            [v[0] as f32, v[1] as f32, v[2] as f32, v[3] as f32]
        }
        let o = self.output_frame;
        GpuFilterGlobals {
            output_frame: f4([o.x0, o.y0, o.width(), o.height()]),
            input_size: f4(self.input_size),
            input_pixel: f4(self.input_pixel),
            input_clamp: f4(self.input_clamp),
            filter_area: f4(self.filter_area),
            filter_clamp: f4(self.filter_clamp),
            resolution: [self.resolution as f32, 0.0, 0.0, 0.0],
        }
    }
}

/// GPU layout of [`GlobalUniforms`]; every row is 16 bytes.
// Keep field order in sync with the FilterGlobals block in filter shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuFilterGlobals {
    /// `(x, y, width, height)` of the output frame.
    pub output_frame: [f32; 4],
    /// See [`GlobalUniforms::input_size`].
    pub input_size: [f32; 4],
    /// See [`GlobalUniforms::input_pixel`].
    pub input_pixel: [f32; 4],
    /// See [`GlobalUniforms::input_clamp`].
    pub input_clamp: [f32; 4],
    /// See [`GlobalUniforms::filter_area`].
    pub filter_area: [f32; 4],
    /// See [`GlobalUniforms::filter_clamp`].
    pub filter_clamp: [f32; 4],
    /// Resolution in `x`; the rest is padding.
    pub resolution: [f32; 4],
}

#[cfg(test)]
#[path = "../../tests/unit/filter/uniforms.rs"]
mod tests;
