//! Filter plumbing for Wavyte's 2D renderer.
//!
//! A filtered subtree is rendered into a pooled offscreen texture, every filter in its chain runs
//! as a full-screen pass over that texture, and the result is composited back into the parent
//! target. This crate owns that plumbing; the effects themselves and the GPU are behind traits.
//!
//! # Flow
//!
//! 1. [`FilterSystem::push`] reduces the chain's parameters, computes the padded and pixel-snapped
//!    source frame, checks a texture out of the [`SurfacePool`] and binds it.
//! 2. The caller renders the subtree through its backend.
//! 3. [`FilterSystem::pop`] recomputes the [`GlobalUniforms`] block and runs the chain, ping-ponging
//!    between two pooled textures for chains longer than one, then returns the textures.
//!
//! Pushes and pops nest with the scene traversal. Everything is single-threaded.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod filter;
mod foundation;
mod render;

pub use filter::effect::{
    AutoFitPolicy, ChainParams, Filter, FilterPass, FilterTarget, SpriteSource,
};
pub use filter::geometry::{PassGeometry, Quad, QuadUv};
pub use filter::sprite::sprite_matrix;
pub use filter::state::FilterState;
pub use filter::system::{ActiveState, FilterContext, FilterSystem, FilterSystemOpts};
pub use filter::uniforms::{GlobalUniforms, GpuFilterGlobals};
pub use foundation::core::{Affine, PixelSize, Point, ProgramId, Rect, Size, SurfaceId, Vec2};
pub use foundation::error::{FilterError, FilterResult};
pub use foundation::frame::{ceil_rect, fit_rect, pad_rect};
pub use render::backend::{
    BlendMode, DrawMode, DrawState, FilterBackend, PassBackend, PassTarget, ShaderInputs,
    SurfaceBackend,
};
pub use render::surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats};
pub use render::texture::{BucketKey, RenderTexture};
