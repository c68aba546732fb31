use crate::{
    filter::{state::FilterState, system::FilterContext},
    foundation::core::{Affine, ProgramId, Rect, Size, Vec2},
    foundation::error::{FilterError, FilterResult},
    foundation::math::validate_resolution,
    render::backend::{DrawState, PassTarget},
    render::texture::RenderTexture,
};
use std::rc::Rc;

/// A scene-graph node that filters can be applied to.
pub trait FilterTarget {
    /// Explicit filter region overriding the computed bounds, in parent space.
    fn filter_area(&self) -> Option<Rect> {
        None
    }

    /// Bounds of the node's subtree, in parent space.
    fn bounds(&self) -> Rect;
}

/// A sprite-like node whose source texture a filter may sample directly.
pub trait SpriteSource {
    /// Local-to-world transform of the sprite.
    fn world_transform(&self) -> Affine;

    /// Anchor in normalized texture units (`(0.5, 0.5)` is centered).
    fn anchor(&self) -> Vec2;

    /// Untransformed size of the sprite's source texture, in CSS pixels.
    fn original_size(&self) -> Size;
}

/// What a single filter pass binds: program, fixed-function state, coordinate convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterPass {
    /// Filter program.
    pub program: ProgramId,
    /// Fixed-function state.
    pub state: DrawState,
    /// Whether the pass uses the legacy texture-coordinate convention.
    pub legacy: bool,
}

impl FilterPass {
    /// Describe the pass a filter runs.
    pub fn of<F: Filter + ?Sized>(filter: &F) -> Self {
        Self {
            program: filter.program(),
            state: filter.draw_state(),
            legacy: filter.legacy(),
        }
    }
}

/// A post-processing effect run as one or more full-screen passes.
///
/// Implementations only describe themselves; the frame and surface plumbing is done by
/// [`crate::FilterSystem`]. Multi-pass effects override [`Filter::apply`] and use the
/// [`FilterContext`] to grab scratch textures and run intermediate passes.
pub trait Filter {
    /// Backend program implementing the effect.
    fn program(&self) -> ProgramId;

    /// Device-pixel ratio the effect renders at.
    fn resolution(&self) -> f64 {
        1.0
    }

    /// Extra border, in CSS pixels, the effect needs around the target's bounds.
    fn padding(&self) -> f64 {
        0.0
    }

    /// Whether the filtered region may be clipped to the visible render region.
    fn auto_fit(&self) -> bool {
        true
    }

    /// Whether the effect expects the legacy texture-coordinate convention.
    fn legacy(&self) -> bool {
        false
    }

    /// Fixed-function state the effect draws with.
    fn draw_state(&self) -> DrawState {
        DrawState::default()
    }

    /// Run the effect from `input` into `output`.
    fn apply(
        &self,
        ctx: &mut dyn FilterContext,
        input: &RenderTexture,
        output: PassTarget,
        clear: bool,
        state: &FilterState,
    ) -> FilterResult<()> {
        let _ = state;
        ctx.apply_filter(FilterPass::of(self), input, output, clear)
    }
}

/// How the per-filter `auto_fit` flags combine across a chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFitPolicy {
    /// Fit when any filter asks for it.
    #[default]
    Any,
    /// Fit only when every filter asks for it.
    All,
}

/// Parameters shared by every filter in a chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainParams {
    /// Minimum resolution across the chain.
    pub resolution: f64,
    /// Maximum padding across the chain.
    pub padding: f64,
    /// Combined auto-fit flag.
    pub auto_fit: bool,
    /// Whether any filter is legacy.
    pub legacy: bool,
}

impl ChainParams {
    /// Reduce a non-empty filter chain to its shared parameters.
    pub fn reduce(filters: &[Rc<dyn Filter>], policy: AutoFitPolicy) -> FilterResult<Self> {
        let (first, rest) = filters
            .split_first()
            .ok_or_else(|| FilterError::validation("filter chain must not be empty"))?;

        let mut out = Self {
            resolution: first.resolution(),
            padding: first.padding(),
            auto_fit: first.auto_fit(),
            legacy: first.legacy(),
        };
        for f in rest {
            out.resolution = out.resolution.min(f.resolution());
            out.padding = out.padding.max(f.padding());
            out.auto_fit = match policy {
                AutoFitPolicy::Any => out.auto_fit || f.auto_fit(),
                AutoFitPolicy::All => out.auto_fit && f.auto_fit(),
            };
            out.legacy = out.legacy || f.legacy();
        }

        out.resolution = validate_resolution(out.resolution)?;
        if !out.padding.is_finite() {
            return Err(FilterError::validation(format!(
                "filter padding must be finite, got {}",
                out.padding
            )));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/effect.rs"]
mod tests;
